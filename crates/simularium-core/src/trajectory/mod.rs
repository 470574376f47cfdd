//! Smoldyn output log parsing into an ordered frame series.

pub mod bounds;
mod reader;

pub use bounds::{BoxGeometry, BoxSource, Extent, observed_extent, resolve_box};
pub use reader::TrajectoryReader;

use crate::common::{SpatialUnit, TimeUnit};
use crate::domain::{ConversionError, ConversionResult};
use std::collections::BTreeSet;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::warn;

#[derive(Debug, Clone, PartialEq)]
pub struct AgentRecord {
    /// Name as written in the log, including any `(state)` suffix.
    pub name: String,
    pub position: [f64; 3],
    pub orientation: Option<[f64; 3]>,
    pub serial: Option<u64>,
    pub source_line: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub time: f64,
    pub iteration: u64,
    pub records: Vec<AgentRecord>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Trajectory {
    pub frames: Vec<Frame>,
    pub geometry: BoxGeometry,
    pub time_unit: TimeUnit,
    pub spatial_unit: SpatialUnit,
    pub outside_count: usize,
}

impl Trajectory {
    /// Counts positions outside the box and warns about them.
    pub fn new(
        frames: Vec<Frame>,
        geometry: BoxGeometry,
        time_unit: TimeUnit,
        spatial_unit: SpatialUnit,
    ) -> Self {
        let outside_count = geometry.count_outside(&frames);
        if outside_count > 0 {
            warn!(
                outside = outside_count,
                box_size = ?geometry.size,
                box_source = geometry.source.as_str(),
                "agent positions fall outside the simulation box"
            );
        }
        Self {
            frames,
            geometry,
            time_unit,
            spatial_unit,
            outside_count,
        }
    }

    pub fn box_size(&self) -> [f64; 3] {
        self.geometry.size
    }

    pub fn observed_agents(&self) -> Vec<String> {
        observed_agent_names(&self.frames)
    }

    /// Mean spacing between consecutive frame times, or zero for a single frame.
    pub fn time_step(&self) -> f64 {
        match (self.frames.first(), self.frames.last()) {
            (Some(first), Some(last)) if self.frames.len() > 1 => {
                (last.time - first.time) / (self.frames.len() - 1) as f64
            }
            _ => 0.0,
        }
    }
}

/// Distinct record names in first-appearance order.
pub fn observed_agent_names(frames: &[Frame]) -> Vec<String> {
    let mut seen = BTreeSet::new();
    let mut names = Vec::new();
    for record in frames.iter().flat_map(|frame| frame.records.iter()) {
        if seen.insert(record.name.as_str()) {
            names.push(record.name.clone());
        }
    }
    names
}

pub fn open_trajectory(
    path: &Path,
    dimensionality: usize,
) -> ConversionResult<TrajectoryReader<BufReader<File>>> {
    let file = File::open(path).map_err(|source| {
        ConversionError::trajectory_parse(
            "TRAJECTORY.OPEN",
            format!("failed to open trajectory: {}", source),
        )
        .with_path(path)
    })?;
    Ok(TrajectoryReader::new(BufReader::new(file), dimensionality))
}

pub fn parse_trajectory_file(path: &Path, dimensionality: usize) -> ConversionResult<Vec<Frame>> {
    open_trajectory(path, dimensionality)?
        .map(|frame| frame.map_err(|error| error.with_path(path)))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TrajectorySummary {
    pub frame_count: usize,
    pub record_count: usize,
    pub first_time: Option<f64>,
    pub last_time: Option<f64>,
    pub agent_names: Vec<String>,
}

/// Streams the log once without keeping frames in memory.
pub fn scan_trajectory_file(path: &Path, dimensionality: usize) -> ConversionResult<TrajectorySummary> {
    let mut summary = TrajectorySummary::default();
    let mut seen = BTreeSet::new();
    for frame in open_trajectory(path, dimensionality)? {
        let frame = frame.map_err(|error| error.with_path(path))?;
        summary.frame_count += 1;
        summary.record_count += frame.records.len();
        summary.first_time.get_or_insert(frame.time);
        summary.last_time = Some(frame.time);
        for record in frame.records {
            if seen.insert(record.name.clone()) {
                summary.agent_names.push(record.name);
            }
        }
    }
    Ok(summary)
}
