use super::Frame;
use crate::model::ModelParameters;

const CONTAINMENT_TOLERANCE: f64 = 1.0e-9;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoxSource {
    Override,
    Model,
    Observed,
}

impl BoxSource {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Override => "override",
            Self::Model => "model",
            Self::Observed => "observed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extent {
    pub min: [f64; 3],
    pub max: [f64; 3],
}

impl Extent {
    pub fn size(&self) -> [f64; 3] {
        std::array::from_fn(|axis| self.max[axis] - self.min[axis])
    }

    pub fn center(&self) -> [f64; 3] {
        std::array::from_fn(|axis| 0.5 * (self.min[axis] + self.max[axis]))
    }
}

/// Simulation box in trajectory coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxGeometry {
    pub size: [f64; 3],
    pub center: [f64; 3],
    pub source: BoxSource,
}

impl BoxGeometry {
    /// Offset that moves the box center onto the origin.
    pub fn centering_translation(&self) -> [f64; 3] {
        self.center.map(|value| -value)
    }

    pub fn contains(&self, position: [f64; 3]) -> bool {
        (0..3).all(|axis| {
            let half = 0.5 * self.size[axis];
            let tolerance = CONTAINMENT_TOLERANCE * half.abs().max(1.0);
            (position[axis] - self.center[axis]).abs() <= half + tolerance
        })
    }

    pub fn count_outside(&self, frames: &[Frame]) -> usize {
        frames
            .iter()
            .flat_map(|frame| frame.records.iter())
            .filter(|record| !self.contains(record.position))
            .count()
    }
}

pub fn observed_extent(frames: &[Frame]) -> Option<Extent> {
    let mut positions = frames
        .iter()
        .flat_map(|frame| frame.records.iter())
        .map(|record| record.position);
    let first = positions.next()?;
    let mut extent = Extent {
        min: first,
        max: first,
    };
    for position in positions {
        for axis in 0..3 {
            extent.min[axis] = extent.min[axis].min(position[axis]);
            extent.max[axis] = extent.max[axis].max(position[axis]);
        }
    }
    Some(extent)
}

fn model_center(model: &ModelParameters) -> Option<[f64; 3]> {
    let mut center = [0.0; 3];
    for (axis, value) in center.iter_mut().enumerate().take(model.dimensionality()) {
        let bounds = model.bounds[axis];
        *value = 0.5 * (bounds.low? + bounds.high?);
    }
    Some(center)
}

/// Box precedence: user cube, then model walls, then the observed extent.
pub fn resolve_box(
    override_size: Option<f64>,
    model: &ModelParameters,
    frames: &[Frame],
) -> BoxGeometry {
    let observed = observed_extent(frames);
    let observed_center = observed.map(|extent| extent.center()).unwrap_or([0.0; 3]);

    if let Some(size) = override_size {
        let center = model_center(model).unwrap_or(observed_center);
        return BoxGeometry {
            size: [size; 3],
            center,
            source: BoxSource::Override,
        };
    }

    if let (Some(size), Some(center)) = (model.box_size(), model_center(model)) {
        return BoxGeometry {
            size,
            center,
            source: BoxSource::Model,
        };
    }

    BoxGeometry {
        size: observed.map(|extent| extent.size()).unwrap_or([0.0; 3]),
        center: observed_center,
        source: BoxSource::Observed,
    }
}
