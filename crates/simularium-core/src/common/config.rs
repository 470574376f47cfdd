use super::units::{SpatialUnit, TimeUnit};
use crate::domain::{ConversionError, ConversionResult, HexColor, OutputEncoding};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub const SIMULARIUM_EXTENSION: &str = "simularium";

/// Per-species display overrides. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AgentOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radius: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub density: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub molecular_mass: Option<f64>,
}

impl AgentOverride {
    pub fn validate(&self, name: &str) -> ConversionResult<()> {
        for (field, value) in [
            ("radius", self.radius),
            ("density", self.density),
            ("molecular_mass", self.molecular_mass),
        ] {
            if let Some(value) = value
                && !(value.is_finite() && value > 0.0)
            {
                return Err(ConversionError::unresolved_agent(
                    "RESOLVE.OVERRIDE_VALUE",
                    format!(
                        "override '{}' for agent '{}' must be finite and > 0, got {}",
                        field, name, value
                    ),
                ));
            }
        }
        if let Some(color) = &self.color
            && HexColor::parse(color).is_none()
        {
            return Err(ConversionError::unresolved_agent(
                "RESOLVE.OVERRIDE_COLOR",
                format!(
                    "override color '{}' for agent '{}' is not a #rrggbb or #rgb hex color",
                    color, name
                ),
            ));
        }
        Ok(())
    }
}

/// Overrides keyed by observed agent name (`red(solution)`) or base species name (`red`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentOverrides(BTreeMap<String, AgentOverride>);

impl AgentOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json_str(content: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(content)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: AgentOverride) {
        self.0.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&AgentOverride> {
        self.0.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &AgentOverride)> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl FromIterator<(String, AgentOverride)> for AgentOverrides {
    fn from_iter<T: IntoIterator<Item = (String, AgentOverride)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConversionConfig {
    pub archive_root: PathBuf,
    pub output_path: Option<PathBuf>,
    pub encoding: OutputEncoding,
    pub overrides: AgentOverrides,
    pub box_size: Option<f64>,
    pub spatial_unit: SpatialUnit,
    pub time_unit: TimeUnit,
    pub trajectory_file: Option<PathBuf>,
    pub center: bool,
    pub register_output: bool,
    pub overwrite: bool,
    pub title: Option<String>,
}

impl ConversionConfig {
    pub fn new(archive_root: impl Into<PathBuf>) -> Self {
        Self {
            archive_root: archive_root.into(),
            output_path: None,
            encoding: OutputEncoding::default(),
            overrides: AgentOverrides::default(),
            box_size: None,
            spatial_unit: SpatialUnit::default(),
            time_unit: TimeUnit::default(),
            trajectory_file: None,
            center: true,
            register_output: true,
            overwrite: true,
            title: None,
        }
    }

    pub fn with_output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_path = Some(path.into());
        self
    }

    pub fn with_encoding(mut self, encoding: OutputEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn with_overrides(mut self, overrides: AgentOverrides) -> Self {
        self.overrides = overrides;
        self
    }

    pub fn with_box_size(mut self, box_size: f64) -> Self {
        self.box_size = Some(box_size);
        self
    }

    pub fn validate(&self) -> ConversionResult<()> {
        if let Some(box_size) = self.box_size
            && !(box_size.is_finite() && box_size > 0.0)
        {
            return Err(ConversionError::archive_structure(
                "CONFIG.BOX_SIZE",
                format!("box size must be finite and > 0, got {}", box_size),
            ));
        }
        for (name, value) in self.overrides.iter() {
            value.validate(name)?;
        }
        Ok(())
    }

    /// Explicit output path, or `<root>/<root-dir-name>.simularium`.
    pub fn resolved_output_path(&self) -> PathBuf {
        if let Some(path) = &self.output_path {
            return path.clone();
        }
        let stem = archive_stem(&self.archive_root);
        self.archive_root
            .join(format!("{}.{}", stem, SIMULARIUM_EXTENSION))
    }

    pub fn resolved_title(&self) -> String {
        self.title
            .clone()
            .unwrap_or_else(|| archive_stem(&self.archive_root))
    }
}

fn archive_stem(root: &Path) -> String {
    root.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .or_else(|| {
            root.canonicalize()
                .ok()
                .and_then(|path| path.file_name().map(|name| name.to_string_lossy().into_owned()))
        })
        .unwrap_or_else(|| "trajectory".to_string())
}
