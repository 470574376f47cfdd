use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const TRAJECTORY_INFO_VERSION: u32 = 3;
pub const SPATIAL_DATA_VERSION: u32 = 1;
pub const SPATIAL_MESSAGE_TYPE: u32 = 1;
pub const PLOT_DATA_VERSION: u32 = 1;
pub const SPHERE_VIS_TYPE: f32 = 1000.0;
/// Values per agent in a frame buffer: vis type, uid, type, position, rotation, radius, subpoints.
pub const AGENT_STRIDE: usize = 11;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vector3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vector3 {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

impl From<[f64; 3]> for Vector3 {
    fn from(value: [f64; 3]) -> Self {
        Self::new(value[0], value[1], value[2])
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitDescriptor {
    pub magnitude: f64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CameraDefault {
    pub position: Vector3,
    pub look_at_position: Vector3,
    pub up_vector: Vector3,
    pub fov_degrees: f64,
}

impl Default for CameraDefault {
    fn default() -> Self {
        Self {
            position: Vector3::new(0.0, 0.0, 120.0),
            look_at_position: Vector3::new(0.0, 0.0, 0.0),
            up_vector: Vector3::new(0.0, 1.0, 0.0),
            fov_degrees: 75.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentGeometry {
    pub display_type: String,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeMapping {
    pub name: String,
    pub geometry: AgentGeometry,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrajectoryInfo {
    pub version: u32,
    pub time_units: UnitDescriptor,
    pub time_step_size: f64,
    pub total_steps: u32,
    pub spatial_units: UnitDescriptor,
    pub size: Vector3,
    pub camera_default: CameraDefault,
    pub type_mapping: BTreeMap<u32, TypeMapping>,
    pub trajectory_title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpatialFrame {
    pub frame_number: u32,
    pub time: f32,
    pub data: Vec<f32>,
}

impl SpatialFrame {
    /// Number of agents, assuming every agent uses the sphere stride.
    pub fn agent_count(&self) -> usize {
        self.data.len() / AGENT_STRIDE
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpatialData {
    pub version: u32,
    pub msg_type: u32,
    pub bundle_start: u32,
    pub bundle_size: u32,
    pub bundle_data: Vec<SpatialFrame>,
}

impl SpatialData {
    pub fn new(frames: Vec<SpatialFrame>) -> Self {
        Self {
            version: SPATIAL_DATA_VERSION,
            msg_type: SPATIAL_MESSAGE_TYPE,
            bundle_start: 0,
            bundle_size: frames.len() as u32,
            bundle_data: frames,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlotData {
    pub version: u32,
    pub data: Vec<serde_json::Value>,
}

impl Default for PlotData {
    fn default() -> Self {
        Self {
            version: PLOT_DATA_VERSION,
            data: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulariumDocument {
    pub trajectory_info: TrajectoryInfo,
    pub spatial_data: SpatialData,
    pub plot_data: PlotData,
}

impl SimulariumDocument {
    pub fn frame_count(&self) -> usize {
        self.spatial_data.bundle_data.len()
    }

    pub fn agent_type_count(&self) -> usize {
        self.trajectory_info.type_mapping.len()
    }
}
