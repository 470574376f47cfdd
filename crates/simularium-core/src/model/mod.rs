//! Parameters declared in a Smoldyn configuration file.

mod parser;

pub use parser::{ModelTokenLine, parse_model_source, tokenize_model};

use crate::domain::{ConversionError, ConversionResult, HexColor, SpeciesState};
use std::fs;
use std::path::Path;
use tracing::debug;

pub const DEFAULT_DIMENSIONALITY: usize = 3;
/// Species keyword that applies a directive to every species.
pub const ALL_SPECIES: &str = "all";

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SpeciesParameters {
    pub name: String,
    pub declared: bool,
    pub diffusion: Option<f64>,
    pub state_diffusion: Vec<(SpeciesState, f64)>,
    pub color: Option<HexColor>,
    pub display_size: Option<f64>,
    pub initial_count: u64,
}

impl SpeciesParameters {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// State-specific coefficient first, then the state-less one.
    pub fn diffusion_for(&self, state: Option<SpeciesState>) -> Option<f64> {
        state
            .and_then(|state| {
                self.state_diffusion
                    .iter()
                    .find(|(candidate, _)| *candidate == state)
                    .map(|(_, value)| *value)
            })
            .or(self.diffusion)
    }

    pub(crate) fn set_diffusion(&mut self, state: Option<SpeciesState>, value: f64) {
        match state {
            None | Some(SpeciesState::All) => self.diffusion = Some(value),
            Some(state) => {
                if let Some(existing) = self
                    .state_diffusion
                    .iter_mut()
                    .find(|(candidate, _)| *candidate == state)
                {
                    existing.1 = value;
                } else {
                    self.state_diffusion.push((state, value));
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AxisBounds {
    pub low: Option<f64>,
    pub high: Option<f64>,
}

impl AxisBounds {
    pub fn extent(&self) -> Option<f64> {
        match (self.low, self.high) {
            (Some(low), Some(high)) if high >= low => Some(high - low),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TimeSettings {
    pub start: Option<f64>,
    pub stop: Option<f64>,
    pub step: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedDirective {
    pub line: usize,
    pub keyword: String,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ModelParameters {
    pub dim: Option<usize>,
    pub species: Vec<SpeciesParameters>,
    /// Values set through the `all` species keyword.
    pub all_species: SpeciesParameters,
    pub bounds: [AxisBounds; 3],
    pub time: TimeSettings,
    pub skipped: Vec<SkippedDirective>,
}

impl ModelParameters {
    pub fn dimensionality(&self) -> usize {
        self.dim.unwrap_or(DEFAULT_DIMENSIONALITY)
    }

    pub fn species(&self, name: &str) -> Option<&SpeciesParameters> {
        self.species.iter().find(|species| species.name == name)
    }

    pub fn species_names(&self) -> impl Iterator<Item = &str> {
        self.species.iter().map(|species| species.name.as_str())
    }

    pub fn declared_species(&self) -> impl Iterator<Item = &SpeciesParameters> {
        self.species.iter().filter(|species| species.declared)
    }

    pub fn diffusion_for(&self, name: &str, state: Option<SpeciesState>) -> Option<f64> {
        self.species(name)
            .and_then(|species| species.diffusion_for(state))
            .or_else(|| self.all_species.diffusion_for(state))
    }

    pub fn color_for(&self, name: &str) -> Option<&HexColor> {
        self.species(name)
            .and_then(|species| species.color.as_ref())
            .or(self.all_species.color.as_ref())
    }

    pub fn display_size_for(&self, name: &str) -> Option<f64> {
        self.species(name)
            .and_then(|species| species.display_size)
            .or(self.all_species.display_size)
    }

    /// Box extent per axis when every active axis has both walls. Inactive axes are zero.
    pub fn box_size(&self) -> Option<[f64; 3]> {
        let mut size = [0.0; 3];
        for (axis, value) in size.iter_mut().enumerate().take(self.dimensionality()) {
            *value = self.bounds[axis].extent()?;
        }
        Some(size)
    }

    pub(crate) fn species_entry(&mut self, name: &str) -> &mut SpeciesParameters {
        if name == ALL_SPECIES {
            return &mut self.all_species;
        }
        let index = match self.species.iter().position(|species| species.name == name) {
            Some(index) => index,
            None => {
                self.species.push(SpeciesParameters::new(name));
                self.species.len() - 1
            }
        };
        &mut self.species[index]
    }
}

pub fn extract_model_parameters(path: &Path) -> ConversionResult<ModelParameters> {
    let source = fs::read_to_string(path).map_err(|source| {
        ConversionError::model_parse(
            "MODEL.READ",
            format!("failed to read Smoldyn model: {}", source),
        )
        .with_path(path)
    })?;
    let parameters = parse_model_source(&source).map_err(|error| error.with_path(path))?;
    for skipped in &parameters.skipped {
        debug!(
            line = skipped.line,
            keyword = %skipped.keyword,
            "skipped Smoldyn directive"
        );
    }
    Ok(parameters)
}

#[cfg(test)]
mod tests {
    use super::{AxisBounds, ModelParameters, SpeciesParameters, extract_model_parameters};
    use crate::domain::{ErrorKind, SpeciesState};
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn state_specific_diffusion_falls_back_to_general() {
        let mut species = SpeciesParameters::new("red");
        species.set_diffusion(None, 1.0);
        species.set_diffusion(Some(SpeciesState::Front), 0.2);

        assert_eq!(species.diffusion_for(Some(SpeciesState::Front)), Some(0.2));
        assert_eq!(species.diffusion_for(Some(SpeciesState::Back)), Some(1.0));
        assert_eq!(species.diffusion_for(None), Some(1.0));
    }

    #[test]
    fn box_size_requires_both_walls_on_active_axes() {
        let mut parameters = ModelParameters {
            dim: Some(2),
            ..ModelParameters::default()
        };
        parameters.bounds[0] = AxisBounds {
            low: Some(-5.0),
            high: Some(5.0),
        };
        assert_eq!(parameters.box_size(), None);

        parameters.bounds[1] = AxisBounds {
            low: Some(0.0),
            high: Some(20.0),
        };
        assert_eq!(parameters.box_size(), Some([10.0, 20.0, 0.0]));
    }

    #[test]
    fn all_keyword_values_act_as_fallback() {
        let mut parameters = ModelParameters::default();
        parameters.species_entry("all").display_size = Some(2.0);
        parameters.species_entry("red").display_size = Some(3.0);
        parameters.species_entry("green");

        assert_eq!(parameters.display_size_for("red"), Some(3.0));
        assert_eq!(parameters.display_size_for("green"), Some(2.0));
        assert_eq!(parameters.species.len(), 2);
    }

    #[test]
    fn extraction_errors_carry_file_path() {
        let temp = TempDir::new().expect("tempdir should be created");
        let path = temp.path().join("model.txt");
        fs::write(&path, "dim 3\ndifc red fast\n").expect("model should be written");

        let error = extract_model_parameters(&path).expect_err("should fail");
        assert_eq!(error.kind(), ErrorKind::ModelParse);
        assert_eq!(error.line(), Some(2));
        assert_eq!(
            error.location().and_then(|location| location.path.clone()),
            Some(path)
        );
    }
}
