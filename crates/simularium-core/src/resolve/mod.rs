//! Merges user overrides, model parameters and the default table into one
//! definition per observed agent.

pub mod defaults;
pub mod radius;

pub use defaults::DefaultTable;
pub use radius::{DALTON_KG, radius_from_mass};

use crate::common::{AgentOverride, AgentOverrides, SpatialUnit};
use crate::domain::{
    AgentDefinition, ConversionError, ConversionResult, HexColor, SpeciesState, ValueSource,
    split_species_token,
};
use crate::model::ModelParameters;
use tracing::{debug, warn};

const RESERVED_NAMES: [&str; 2] = ["all", "empty"];

#[derive(Debug, Clone)]
pub struct AgentResolver<'a> {
    model: &'a ModelParameters,
    overrides: &'a AgentOverrides,
    defaults: &'a DefaultTable,
    spatial_unit: SpatialUnit,
}

impl<'a> AgentResolver<'a> {
    pub fn new(
        model: &'a ModelParameters,
        overrides: &'a AgentOverrides,
        defaults: &'a DefaultTable,
        spatial_unit: SpatialUnit,
    ) -> Self {
        Self {
            model,
            overrides,
            defaults,
            spatial_unit,
        }
    }

    /// One definition per observed name, type ids assigned in input order.
    pub fn resolve(&self, observed: &[String]) -> ConversionResult<Vec<AgentDefinition>> {
        for (name, value) in self.overrides.iter() {
            value.validate(name)?;
        }
        self.warn_unmatched_overrides(observed);

        let mut definitions = Vec::with_capacity(observed.len());
        for (index, name) in observed.iter().enumerate() {
            let type_id = u32::try_from(index).map_err(|_| {
                ConversionError::unresolved_agent(
                    "RESOLVE.TOO_MANY_TYPES",
                    format!("agent type count exceeds {}", u32::MAX),
                )
            })?;
            definitions.push(self.resolve_one(name, type_id)?);
        }
        Ok(definitions)
    }

    fn resolve_one(&self, name: &str, type_id: u32) -> ConversionResult<AgentDefinition> {
        validate_agent_name(name)?;
        let (base, state) = split_species_token(name);
        let user = self.overrides.get(name).or_else(|| self.overrides.get(base));

        let density = user
            .and_then(|value| value.density)
            .unwrap_or(self.defaults.density);
        let molecular_mass = user
            .and_then(|value| value.molecular_mass)
            .unwrap_or(self.defaults.molecular_mass);

        let (radius, radius_source) = self.radius_for(base, user, density);
        let (color, color_source) = match user.and_then(|value| value.color.as_deref()) {
            Some(raw) => match HexColor::parse(raw) {
                Some(color) => (color, ValueSource::Override),
                None => {
                    return Err(ConversionError::unresolved_agent(
                        "RESOLVE.OVERRIDE_COLOR",
                        format!("override color '{}' for agent '{}' is invalid", raw, name),
                    ));
                }
            },
            None => match self.model.color_for(base) {
                Some(color) => (color.clone(), ValueSource::Model),
                None => (self.defaults.color_for(type_id), ValueSource::Default),
            },
        };

        let definition = AgentDefinition {
            name: name.to_string(),
            type_id,
            diffusion: self.model.diffusion_for(base, state),
            state: state.unwrap_or(SpeciesState::Solution),
            color,
            radius,
            density,
            molecular_mass,
            radius_source,
            color_source,
        };
        debug!(
            agent = %definition.name,
            type_id,
            radius = definition.radius,
            radius_source = %definition.radius_source,
            color = %definition.color,
            "resolved agent"
        );
        Ok(definition)
    }

    fn radius_for(
        &self,
        base: &str,
        user: Option<&AgentOverride>,
        density: f64,
    ) -> (f64, ValueSource) {
        if let Some(radius) = user.and_then(|value| value.radius) {
            return (radius, ValueSource::Override);
        }
        if let Some(mass) = user.and_then(|value| value.molecular_mass) {
            return (
                radius_from_mass(mass, density, self.spatial_unit),
                ValueSource::Derived,
            );
        }
        match self.model.display_size_for(base) {
            Some(size) if size > 0.0 => (size, ValueSource::Model),
            _ => (self.defaults.radius, ValueSource::Default),
        }
    }

    fn warn_unmatched_overrides(&self, observed: &[String]) {
        for (key, _) in self.overrides.iter() {
            let matched = observed
                .iter()
                .any(|name| name == key || split_species_token(name).0 == key);
            if !matched {
                warn!(agent = %key, "override names an agent that never appears in the trajectory");
            }
        }
    }
}

pub fn resolve_agents(
    observed: &[String],
    model: &ModelParameters,
    overrides: &AgentOverrides,
    defaults: &DefaultTable,
    spatial_unit: SpatialUnit,
) -> ConversionResult<Vec<AgentDefinition>> {
    AgentResolver::new(model, overrides, defaults, spatial_unit).resolve(observed)
}

fn validate_agent_name(name: &str) -> ConversionResult<()> {
    let (base, _) = split_species_token(name);
    if base.is_empty() {
        return Err(ConversionError::unresolved_agent(
            "RESOLVE.EMPTY_NAME",
            "observed agent has an empty name",
        ));
    }
    if RESERVED_NAMES.contains(&base) {
        return Err(ConversionError::unresolved_agent(
            "RESOLVE.RESERVED_NAME",
            format!("agent name '{}' is a reserved Smoldyn keyword", name),
        ));
    }
    if base.parse::<f64>().is_ok() {
        return Err(ConversionError::unresolved_agent(
            "RESOLVE.NUMERIC_NAME",
            format!("agent name '{}' is numeric and cannot name a species", name),
        ));
    }
    Ok(())
}
