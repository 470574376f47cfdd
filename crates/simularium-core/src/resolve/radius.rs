use crate::common::SpatialUnit;
use std::f64::consts::PI;

/// Unified atomic mass unit in kilograms.
pub const DALTON_KG: f64 = 1.660_539_066_60e-27;

/// Sphere radius for a particle of `molecular_mass` daltons at `density` kg/m³,
/// expressed in `unit`.
pub fn radius_from_mass(molecular_mass: f64, density: f64, unit: SpatialUnit) -> f64 {
    let mass_kg = molecular_mass * DALTON_KG;
    let volume = mass_kg / density;
    let radius_m = (3.0 * volume / (4.0 * PI)).cbrt();
    unit.from_meters(radius_m)
}
