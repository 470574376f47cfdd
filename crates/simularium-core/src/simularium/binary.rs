//! Block-structured little-endian Simularium encoding.
//!
//! Layout: 16-byte signature, `u32` header length, `u32` format version, `u32` block
//! count and one `(offset, type, size)` triple per block. Every block starts with its
//! own `u32` type and `u32` size (both counted in `size`) and is zero padded to four
//! bytes. Frame offsets inside the spatial block are relative to the block start.

use super::model::{PlotData, SimulariumDocument, SpatialData, SpatialFrame, TrajectoryInfo};
use crate::domain::{ConversionError, ConversionResult};
use serde::Serialize;
use serde::de::DeserializeOwned;

pub const SIGNATURE: &[u8; 16] = b"SIMULARIUMBINARY";
pub const BINARY_VERSION: u32 = 2;
const BLOCK_HEADER_LEN: usize = 8;
const FRAME_HEADER_LEN: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockType {
    TrajectoryInfo,
    PlotData,
    SpatialData,
}

impl BlockType {
    pub const fn code(self) -> u32 {
        match self {
            Self::TrajectoryInfo => 1,
            Self::PlotData => 2,
            Self::SpatialData => 3,
        }
    }

    pub const fn from_code(code: u32) -> Option<Self> {
        match code {
            1 => Some(Self::TrajectoryInfo),
            2 => Some(Self::PlotData),
            3 => Some(Self::SpatialData),
            _ => None,
        }
    }
}

pub fn is_binary(bytes: &[u8]) -> bool {
    bytes.starts_with(SIGNATURE)
}

pub fn encode_binary(document: &SimulariumDocument) -> ConversionResult<Vec<u8>> {
    let blocks = [
        (BlockType::TrajectoryInfo, encode_json_payload(&document.trajectory_info)?),
        (BlockType::PlotData, encode_json_payload(&document.plot_data)?),
        (
            BlockType::SpatialData,
            encode_spatial_payload(&document.spatial_data)?,
        ),
    ];

    let header_len = SIGNATURE.len() + 12 + 12 * blocks.len();
    let mut header = Vec::with_capacity(header_len);
    header.extend_from_slice(SIGNATURE);
    push_u32(&mut header, to_u32(header_len)?);
    push_u32(&mut header, BINARY_VERSION);
    push_u32(&mut header, to_u32(blocks.len())?);

    let mut body = Vec::new();
    for (block_type, payload) in blocks {
        let block = encode_block(block_type, &payload)?;
        push_u32(&mut header, to_u32(header_len + body.len())?);
        push_u32(&mut header, block_type.code());
        push_u32(&mut header, to_u32(block.len())?);
        body.extend_from_slice(&block);
    }

    header.extend_from_slice(&body);
    Ok(header)
}

pub fn decode_binary(bytes: &[u8]) -> ConversionResult<SimulariumDocument> {
    if !is_binary(bytes) {
        return Err(decode_error("missing SIMULARIUMBINARY signature"));
    }
    let mut reader = ByteReader::new(bytes, SIGNATURE.len());
    let header_len = reader.read_u32()? as usize;
    let version = reader.read_u32()?;
    if version != BINARY_VERSION {
        return Err(decode_error(format!(
            "unsupported binary version {}; expected {}",
            version, BINARY_VERSION
        )));
    }
    let block_count = reader.read_u32()? as usize;
    if header_len != SIGNATURE.len() + 12 + 12 * block_count {
        return Err(decode_error(format!(
            "header length {} does not match {} blocks",
            header_len, block_count
        )));
    }

    let mut trajectory_info = None;
    let mut plot_data = None;
    let mut spatial_data = None;
    for _ in 0..block_count {
        let offset = reader.read_u32()? as usize;
        let code = reader.read_u32()?;
        let size = reader.read_u32()? as usize;

        let block = slice(bytes, offset, size)?;
        let mut block_reader = ByteReader::new(block, 0);
        let inner_code = block_reader.read_u32()?;
        let inner_size = block_reader.read_u32()? as usize;
        if inner_code != code || inner_size != size {
            return Err(decode_error(format!(
                "block at offset {} disagrees with header table",
                offset
            )));
        }
        let payload = &block[BLOCK_HEADER_LEN..];
        match BlockType::from_code(code) {
            Some(BlockType::TrajectoryInfo) => {
                trajectory_info = Some(decode_json_payload::<TrajectoryInfo>(payload)?);
            }
            Some(BlockType::PlotData) => {
                plot_data = Some(decode_json_payload::<PlotData>(payload)?);
            }
            Some(BlockType::SpatialData) => {
                spatial_data = Some(decode_spatial_block(block)?);
            }
            None => return Err(decode_error(format!("unknown block type {}", code))),
        }
    }

    Ok(SimulariumDocument {
        trajectory_info: trajectory_info
            .ok_or_else(|| decode_error("missing trajectory info block"))?,
        spatial_data: spatial_data.ok_or_else(|| decode_error("missing spatial data block"))?,
        plot_data: plot_data.unwrap_or_default(),
    })
}

fn encode_json_payload<T: Serialize>(value: &T) -> ConversionResult<Vec<u8>> {
    serde_json::to_vec(value).map_err(|source| {
        ConversionError::serialization(
            "SIMULARIUM.BINARY_ENCODE",
            format!("failed to encode JSON block: {}", source),
        )
    })
}

fn decode_json_payload<T: DeserializeOwned>(payload: &[u8]) -> ConversionResult<T> {
    let end = payload
        .iter()
        .rposition(|byte| *byte != 0)
        .map_or(0, |index| index + 1);
    serde_json::from_slice(&payload[..end])
        .map_err(|source| decode_error(format!("invalid JSON block: {}", source)))
}

fn encode_block(block_type: BlockType, payload: &[u8]) -> ConversionResult<Vec<u8>> {
    let padded_len = payload.len().next_multiple_of(4);
    let size = BLOCK_HEADER_LEN + padded_len;
    let mut block = Vec::with_capacity(size);
    push_u32(&mut block, block_type.code());
    push_u32(&mut block, to_u32(size)?);
    block.extend_from_slice(payload);
    block.resize(size, 0);
    Ok(block)
}

fn encode_spatial_payload(spatial: &SpatialData) -> ConversionResult<Vec<u8>> {
    let frames = &spatial.bundle_data;
    let table_len = 8 + 8 * frames.len();
    let mut payload = Vec::new();
    push_u32(&mut payload, spatial.version);
    push_u32(&mut payload, to_u32(frames.len())?);

    let mut frame_bytes = Vec::new();
    for frame in frames {
        let offset = BLOCK_HEADER_LEN + table_len + frame_bytes.len();
        let size = FRAME_HEADER_LEN + 4 * frame.data.len();
        push_u32(&mut payload, to_u32(offset)?);
        push_u32(&mut payload, to_u32(size)?);

        push_u32(&mut frame_bytes, frame.frame_number);
        push_f32(&mut frame_bytes, frame.time);
        push_u32(&mut frame_bytes, to_u32(frame.agent_count())?);
        for value in &frame.data {
            push_f32(&mut frame_bytes, *value);
        }
    }
    payload.extend_from_slice(&frame_bytes);
    Ok(payload)
}

fn decode_spatial_block(block: &[u8]) -> ConversionResult<SpatialData> {
    let mut reader = ByteReader::new(block, BLOCK_HEADER_LEN);
    let version = reader.read_u32()?;
    let frame_count = reader.read_u32()? as usize;

    let mut frames = Vec::with_capacity(frame_count.min(block.len() / FRAME_HEADER_LEN));
    for _ in 0..frame_count {
        let offset = reader.read_u32()? as usize;
        let size = reader.read_u32()? as usize;
        if size < FRAME_HEADER_LEN || (size - FRAME_HEADER_LEN) % 4 != 0 {
            return Err(decode_error(format!("invalid frame size {}", size)));
        }
        let mut frame_reader = ByteReader::new(slice(block, offset, size)?, 0);
        let frame_number = frame_reader.read_u32()?;
        let time = frame_reader.read_f32()?;
        let _agent_count = frame_reader.read_u32()?;
        let value_count = (size - FRAME_HEADER_LEN) / 4;
        let mut data = Vec::with_capacity(value_count);
        for _ in 0..value_count {
            data.push(frame_reader.read_f32()?);
        }
        frames.push(SpatialFrame {
            frame_number,
            time,
            data,
        });
    }

    let mut spatial = SpatialData::new(frames);
    spatial.version = version;
    Ok(spatial)
}

struct ByteReader<'a> {
    bytes: &'a [u8],
    position: usize,
}

impl<'a> ByteReader<'a> {
    fn new(bytes: &'a [u8], position: usize) -> Self {
        Self { bytes, position }
    }

    fn take(&mut self, len: usize) -> ConversionResult<&'a [u8]> {
        let taken = slice(self.bytes, self.position, len)?;
        self.position += len;
        Ok(taken)
    }

    fn read_u32(&mut self) -> ConversionResult<u32> {
        let mut raw = [0_u8; 4];
        raw.copy_from_slice(self.take(4)?);
        Ok(u32::from_le_bytes(raw))
    }

    fn read_f32(&mut self) -> ConversionResult<f32> {
        let mut raw = [0_u8; 4];
        raw.copy_from_slice(self.take(4)?);
        Ok(f32::from_le_bytes(raw))
    }
}

fn slice(bytes: &[u8], offset: usize, len: usize) -> ConversionResult<&[u8]> {
    offset
        .checked_add(len)
        .and_then(|end| bytes.get(offset..end))
        .ok_or_else(|| {
            decode_error(format!(
                "range {}..{} exceeds {} bytes",
                offset,
                offset.saturating_add(len),
                bytes.len()
            ))
        })
}

fn push_u32(target: &mut Vec<u8>, value: u32) {
    target.extend_from_slice(&value.to_le_bytes());
}

fn push_f32(target: &mut Vec<u8>, value: f32) {
    target.extend_from_slice(&value.to_le_bytes());
}

fn to_u32(value: usize) -> ConversionResult<u32> {
    u32::try_from(value).map_err(|_| {
        ConversionError::serialization(
            "SIMULARIUM.BINARY_ENCODE",
            format!("value {} does not fit the 32-bit binary layout", value),
        )
    })
}

fn decode_error(message: impl Into<String>) -> ConversionError {
    ConversionError::serialization("SIMULARIUM.BINARY_DECODE", message)
}
