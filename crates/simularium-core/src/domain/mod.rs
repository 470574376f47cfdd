pub mod errors;

pub use errors::{ConversionError, ConversionResult, ErrorKind, SourceLocation};

use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum PipelineStage {
    #[default]
    Unstarted,
    ArchiveResolved,
    ModelExtracted,
    TrajectoryParsed,
    AgentsResolved,
    Converted,
}

impl PipelineStage {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unstarted => "Unstarted",
            Self::ArchiveResolved => "ArchiveResolved",
            Self::ModelExtracted => "ModelExtracted",
            Self::TrajectoryParsed => "TrajectoryParsed",
            Self::AgentsResolved => "AgentsResolved",
            Self::Converted => "Converted",
        }
    }

    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Unstarted => Some(Self::ArchiveResolved),
            Self::ArchiveResolved => Some(Self::ModelExtracted),
            Self::ModelExtracted => Some(Self::TrajectoryParsed),
            Self::TrajectoryParsed => Some(Self::AgentsResolved),
            Self::AgentsResolved => Some(Self::Converted),
            Self::Converted => None,
        }
    }
}

impl Display for PipelineStage {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str((*self).as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OutputEncoding {
    #[default]
    Json,
    Binary,
}

impl OutputEncoding {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Binary => "binary",
        }
    }
}

impl Display for OutputEncoding {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str((*self).as_str())
    }
}

impl FromStr for OutputEncoding {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "binary" | "bin" => Ok(Self::Binary),
            other => Err(format!(
                "unsupported encoding '{}'; expected 'json' or 'binary'",
                other
            )),
        }
    }
}

/// Smoldyn molecule state as written in `name(state)` tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SpeciesState {
    #[default]
    Solution,
    Front,
    Back,
    Up,
    Down,
    Bound,
    All,
}

impl SpeciesState {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Solution => "solution",
            Self::Front => "front",
            Self::Back => "back",
            Self::Up => "up",
            Self::Down => "down",
            Self::Bound => "bound",
            Self::All => "all",
        }
    }

    pub fn parse(token: &str) -> Option<Self> {
        match token.trim().to_ascii_lowercase().as_str() {
            "solution" | "soln" | "fsoln" | "bsoln" => Some(Self::Solution),
            "front" => Some(Self::Front),
            "back" => Some(Self::Back),
            "up" => Some(Self::Up),
            "down" => Some(Self::Down),
            "bound" => Some(Self::Bound),
            "all" => Some(Self::All),
            _ => None,
        }
    }
}

impl Display for SpeciesState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str((*self).as_str())
    }
}

/// Splits `red(front)` into `("red", Some(Front))`. Unknown states keep the full token as name.
pub fn split_species_token(token: &str) -> (&str, Option<SpeciesState>) {
    let trimmed = token.trim();
    if let Some(open) = trimmed.find('(')
        && trimmed.ends_with(')')
        && open > 0
    {
        let state = &trimmed[open + 1..trimmed.len() - 1];
        if let Some(parsed) = SpeciesState::parse(state) {
            return (&trimmed[..open], Some(parsed));
        }
    }
    (trimmed, None)
}

/// Lowercase `#rrggbb` color.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HexColor(String);

impl HexColor {
    pub fn parse(value: &str) -> Option<Self> {
        let digits = value.trim().strip_prefix('#')?;
        if !digits.chars().all(|character| character.is_ascii_hexdigit()) {
            return None;
        }
        match digits.len() {
            6 => Some(Self(format!("#{}", digits.to_ascii_lowercase()))),
            3 => {
                let expanded = digits
                    .chars()
                    .flat_map(|character| [character, character])
                    .collect::<String>();
                Some(Self(format!("#{}", expanded.to_ascii_lowercase())))
            }
            _ => None,
        }
    }

    /// Builds a color from channel fractions in `[0, 1]`.
    pub fn from_fractions(red: f64, green: f64, blue: f64) -> Option<Self> {
        let channel = |value: f64| -> Option<u8> {
            if value.is_finite() && (0.0..=1.0).contains(&value) {
                Some((value * 255.0).round() as u8)
            } else {
                None
            }
        };
        Some(Self(format!(
            "#{:02x}{:02x}{:02x}",
            channel(red)?,
            channel(green)?,
            channel(blue)?
        )))
    }

    pub fn white() -> Self {
        Self("#ffffff".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for HexColor {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where a resolved agent field came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueSource {
    Override,
    Derived,
    Model,
    Default,
}

impl ValueSource {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Override => "override",
            Self::Derived => "derived",
            Self::Model => "model",
            Self::Default => "default",
        }
    }
}

impl Display for ValueSource {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str((*self).as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AgentDefinition {
    pub name: String,
    pub type_id: u32,
    pub diffusion: Option<f64>,
    pub state: SpeciesState,
    pub color: HexColor,
    pub radius: f64,
    pub density: f64,
    pub molecular_mass: f64,
    pub radius_source: ValueSource,
    pub color_source: ValueSource,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputArtifact {
    pub path: PathBuf,
    pub encoding: OutputEncoding,
    pub registered: bool,
}
