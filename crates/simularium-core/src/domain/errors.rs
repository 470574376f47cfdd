use super::PipelineStage;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

pub type ConversionResult<T> = Result<T, ConversionError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    ArchiveStructure,
    ModelParse,
    TrajectoryParse,
    UnresolvedAgent,
    Serialization,
}

impl ErrorKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ArchiveStructure => "ArchiveStructureError",
            Self::ModelParse => "ModelParseError",
            Self::TrajectoryParse => "TrajectoryParseError",
            Self::UnresolvedAgent => "UnresolvedAgentError",
            Self::Serialization => "SerializationError",
        }
    }

    pub const fn exit_code(self) -> i32 {
        match self {
            Self::ArchiveStructure => 2,
            Self::ModelParse => 3,
            Self::TrajectoryParse => 4,
            Self::UnresolvedAgent => 5,
            Self::Serialization => 6,
        }
    }

    /// Every kind except write failures can be fixed by re-running with corrected inputs.
    pub const fn is_recoverable(self) -> bool {
        !matches!(self, Self::Serialization)
    }
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str((*self).as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocation {
    pub path: Option<PathBuf>,
    pub line: Option<usize>,
}

impl Display for SourceLocation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match (&self.path, self.line) {
            (Some(path), Some(line)) => write!(f, "{}:{}", path.display(), line),
            (Some(path), None) => write!(f, "{}", path.display()),
            (None, Some(line)) => write!(f, "line {}", line),
            (None, None) => Ok(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} [{placeholder}] {message}{suffix}", suffix = location_suffix(.location.as_ref()))]
pub struct ConversionError {
    kind: ErrorKind,
    placeholder: &'static str,
    message: String,
    location: Option<SourceLocation>,
    stage: PipelineStage,
}

impl ConversionError {
    pub fn new(kind: ErrorKind, placeholder: &'static str, message: impl Into<String>) -> Self {
        Self {
            kind,
            placeholder,
            message: message.into(),
            location: None,
            stage: PipelineStage::Unstarted,
        }
    }

    pub fn archive_structure(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ArchiveStructure, placeholder, message)
    }

    pub fn model_parse(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ModelParse, placeholder, message)
    }

    pub fn trajectory_parse(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::TrajectoryParse, placeholder, message)
    }

    pub fn unresolved_agent(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnresolvedAgent, placeholder, message)
    }

    pub fn serialization(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Serialization, placeholder, message)
    }

    pub fn with_path(mut self, path: &Path) -> Self {
        let line = self.location.as_ref().and_then(|location| location.line);
        self.location = Some(SourceLocation {
            path: Some(path.to_path_buf()),
            line,
        });
        self
    }

    pub fn with_line(mut self, line: usize) -> Self {
        let path = self.location.take().and_then(|location| location.path);
        self.location = Some(SourceLocation {
            path,
            line: Some(line),
        });
        self
    }

    /// Records the last stage the pipeline completed before this error surfaced.
    pub fn at_stage(mut self, stage: PipelineStage) -> Self {
        self.stage = stage;
        self
    }

    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub const fn placeholder(&self) -> &'static str {
        self.placeholder
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn location(&self) -> Option<&SourceLocation> {
        self.location.as_ref()
    }

    pub fn line(&self) -> Option<usize> {
        self.location.as_ref().and_then(|location| location.line)
    }

    pub const fn stage(&self) -> PipelineStage {
        self.stage
    }

    pub const fn exit_code(&self) -> i32 {
        self.kind.exit_code()
    }

    pub fn diagnostic_line(&self) -> String {
        format!(
            "ERROR: [{}] {}{}",
            self.placeholder,
            self.message,
            location_suffix(self.location.as_ref())
        )
    }

    pub fn stage_line(&self) -> String {
        format!(
            "{} after stage {} (exit code {})",
            self.kind,
            self.stage,
            self.exit_code()
        )
    }
}

fn location_suffix(location: Option<&SourceLocation>) -> String {
    match location {
        Some(location) if location.path.is_some() || location.line.is_some() => {
            format!(" (at {})", location)
        }
        _ => String::new(),
    }
}
