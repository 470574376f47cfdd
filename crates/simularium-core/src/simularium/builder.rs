use super::model::{
    AGENT_STRIDE, AgentGeometry, CameraDefault, PlotData, SPHERE_VIS_TYPE, SimulariumDocument,
    SpatialData, SpatialFrame, TRAJECTORY_INFO_VERSION, TrajectoryInfo, TypeMapping,
    UnitDescriptor, Vector3,
};
use crate::domain::{AgentDefinition, ConversionError, ConversionResult};
use crate::trajectory::{Frame, Trajectory};
use std::collections::{BTreeMap, HashMap};
use tracing::warn;

pub const SPHERE_DISPLAY_TYPE: &str = "SPHERE";

/// Largest id an `f32` buffer slot holds exactly.
pub const MAX_EXACT_ID: u32 = 1 << 24;

/// Smoldyn serial, or the record's slot in its frame when the log carries no serial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum AgentKey {
    Serial(u64),
    Slot(usize),
}

/// Dense per-run unique ids, assigned in first-appearance order.
#[derive(Debug, Default)]
struct UniqueIds {
    assigned: BTreeMap<AgentKey, u32>,
}

impl UniqueIds {
    fn id_for(&mut self, key: AgentKey) -> ConversionResult<u32> {
        if let Some(id) = self.assigned.get(&key) {
            return Ok(*id);
        }
        let next = self.assigned.len() as u64;
        if next > u64::from(MAX_EXACT_ID) {
            return Err(ConversionError::serialization(
                "SIMULARIUM.ID_RANGE",
                format!(
                    "trajectory holds more than {} distinct agents; ids no longer fit an f32 slot",
                    MAX_EXACT_ID
                ),
            ));
        }
        let id = next as u32;
        self.assigned.insert(key, id);
        Ok(id)
    }
}

/// Indices of frames whose `f32` time equals the previous frame's.
pub fn collapsed_frame_times(frames: &[Frame]) -> Vec<usize> {
    frames
        .windows(2)
        .enumerate()
        .filter(|(_, pair)| pair[1].time as f32 <= pair[0].time as f32)
        .map(|(index, _)| index + 1)
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOptions {
    pub title: String,
    pub center: bool,
}

pub fn build_document(
    trajectory: &Trajectory,
    agents: &[AgentDefinition],
    options: &BuildOptions,
) -> ConversionResult<SimulariumDocument> {
    let by_name = agents
        .iter()
        .map(|agent| (agent.name.as_str(), agent))
        .collect::<HashMap<_, _>>();
    let translation = if options.center {
        trajectory.geometry.centering_translation()
    } else {
        [0.0; 3]
    };

    let collapsed = collapsed_frame_times(&trajectory.frames);
    if let Some(first) = collapsed.first() {
        warn!(
            frames = collapsed.len(),
            first_frame = *first,
            time = trajectory.frames[*first].time,
            "frame times collapse to equal values at f32 precision"
        );
    }

    let mut unique_ids = UniqueIds::default();
    let mut frames = Vec::with_capacity(trajectory.frames.len());
    for (frame_number, frame) in trajectory.frames.iter().enumerate() {
        let mut data = Vec::with_capacity(frame.records.len() * AGENT_STRIDE);
        for (index, record) in frame.records.iter().enumerate() {
            let agent = by_name.get(record.name.as_str()).ok_or_else(|| {
                ConversionError::unresolved_agent(
                    "SIMULARIUM.UNKNOWN_AGENT",
                    format!("record '{}' has no resolved agent definition", record.name),
                )
                .with_line(record.source_line)
            })?;
            let key = match record.serial {
                Some(serial) => AgentKey::Serial(serial),
                None => AgentKey::Slot(index),
            };
            let unique_id = unique_ids
                .id_for(key)
                .map_err(|error| error.with_line(record.source_line))?;
            let rotation = record.orientation.unwrap_or([0.0; 3]);
            data.extend_from_slice(&[
                SPHERE_VIS_TYPE,
                unique_id as f32,
                agent.type_id as f32,
                (record.position[0] + translation[0]) as f32,
                (record.position[1] + translation[1]) as f32,
                (record.position[2] + translation[2]) as f32,
                rotation[0] as f32,
                rotation[1] as f32,
                rotation[2] as f32,
                agent.radius as f32,
                0.0,
            ]);
        }
        frames.push(SpatialFrame {
            frame_number: frame_number as u32,
            time: frame.time as f32,
            data,
        });
    }

    let type_mapping = agents
        .iter()
        .map(|agent| {
            (
                agent.type_id,
                TypeMapping {
                    name: agent.name.clone(),
                    geometry: AgentGeometry {
                        display_type: SPHERE_DISPLAY_TYPE.to_string(),
                        color: agent.color.to_string(),
                    },
                },
            )
        })
        .collect::<BTreeMap<_, _>>();

    let trajectory_info = TrajectoryInfo {
        version: TRAJECTORY_INFO_VERSION,
        time_units: UnitDescriptor {
            magnitude: 1.0,
            name: trajectory.time_unit.as_str().to_string(),
        },
        time_step_size: trajectory.time_step(),
        total_steps: frames.len() as u32,
        spatial_units: UnitDescriptor {
            magnitude: 1.0,
            name: trajectory.spatial_unit.as_str().to_string(),
        },
        size: Vector3::from(trajectory.box_size()),
        camera_default: CameraDefault::default(),
        type_mapping,
        trajectory_title: options.title.clone(),
    };

    Ok(SimulariumDocument {
        trajectory_info,
        spatial_data: SpatialData::new(frames),
        plot_data: PlotData::default(),
    })
}
