//! Simularium trajectory documents and their JSON and binary encodings.

pub mod binary;
pub mod builder;
pub mod json;
pub mod model;

pub use builder::{BuildOptions, build_document};
pub use model::{SimulariumDocument, SpatialFrame, TrajectoryInfo, TypeMapping};

use crate::common::serialization::{normalize_text_artifact, write_binary_artifact};
use crate::domain::{ConversionError, ConversionResult, OutputEncoding};
use std::fs;
use std::path::Path;

pub fn encode_document(
    document: &SimulariumDocument,
    encoding: OutputEncoding,
) -> ConversionResult<Vec<u8>> {
    match encoding {
        OutputEncoding::Json => {
            json::encode_json(document).map(|text| normalize_text_artifact(&text).into_bytes())
        }
        OutputEncoding::Binary => binary::encode_binary(document),
    }
}

pub fn write_document(
    document: &SimulariumDocument,
    path: &Path,
    encoding: OutputEncoding,
    overwrite: bool,
) -> ConversionResult<()> {
    let bytes = encode_document(document, encoding)?;
    write_binary_artifact(path, &bytes, overwrite)
}

/// Decodes either encoding, chosen by the binary signature.
pub fn decode_document(bytes: &[u8]) -> ConversionResult<(SimulariumDocument, OutputEncoding)> {
    if binary::is_binary(bytes) {
        binary::decode_binary(bytes).map(|document| (document, OutputEncoding::Binary))
    } else {
        json::decode_json(bytes).map(|document| (document, OutputEncoding::Json))
    }
}

pub fn read_document(path: &Path) -> ConversionResult<(SimulariumDocument, OutputEncoding)> {
    let bytes = fs::read(path).map_err(|source| {
        ConversionError::serialization(
            "SIMULARIUM.READ",
            format!("failed to read Simularium file: {}", source),
        )
        .with_path(path)
    })?;
    decode_document(&bytes).map_err(|error| error.with_path(path))
}
