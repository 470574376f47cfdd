use super::model::SimulariumDocument;
use crate::domain::{ConversionError, ConversionResult};

pub fn encode_json(document: &SimulariumDocument) -> ConversionResult<String> {
    serde_json::to_string(document).map_err(|source| {
        ConversionError::serialization(
            "SIMULARIUM.JSON_ENCODE",
            format!("failed to encode Simularium JSON: {}", source),
        )
    })
}

pub fn decode_json(bytes: &[u8]) -> ConversionResult<SimulariumDocument> {
    serde_json::from_slice(bytes).map_err(|source| {
        ConversionError::serialization(
            "SIMULARIUM.JSON_DECODE",
            format!("failed to decode Simularium JSON: {}", source),
        )
    })
}
