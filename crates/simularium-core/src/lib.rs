//! Converts Smoldyn trajectory logs bundled in COMBINE archive directories into
//! Simularium JSON or binary trajectories.

pub mod archive;
pub mod common;
pub mod domain;
pub mod model;
pub mod pipeline;
pub mod resolve;
pub mod simularium;
pub mod trajectory;

pub use domain::{ConversionError, ConversionResult, ErrorKind, OutputEncoding, PipelineStage};
pub use pipeline::{ConversionReport, InspectionReport, convert_archive, inspect_archive};
