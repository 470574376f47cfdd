use crate::domain::HexColor;

const V1_PALETTE: [&str; 12] = [
    "#0ba345", "#9267cb", "#ff9900", "#ee1717", "#0096c7", "#f4d35e", "#c1a786", "#5c80bc",
    "#e06c9f", "#6ac4a9", "#8c564b", "#7f7f7f",
];

/// Fallback agent attributes. Radius is in the output spatial unit, density in kg/m³ and
/// molecular mass in daltons.
#[derive(Debug, Clone, PartialEq)]
pub struct DefaultTable {
    pub version: u32,
    pub palette: Vec<HexColor>,
    pub radius: f64,
    pub density: f64,
    pub molecular_mass: f64,
}

impl DefaultTable {
    pub fn v1() -> Self {
        Self {
            version: 1,
            palette: V1_PALETTE
                .iter()
                .filter_map(|value| HexColor::parse(value))
                .collect(),
            radius: 1.0,
            density: 1350.0,
            molecular_mass: 50_000.0,
        }
    }

    /// Palette entry for `type_id`, cycling when there are more types than colors.
    pub fn color_for(&self, type_id: u32) -> HexColor {
        if self.palette.is_empty() {
            return HexColor::white();
        }
        self.palette[type_id as usize % self.palette.len()].clone()
    }
}

impl Default for DefaultTable {
    fn default() -> Self {
        Self::v1()
    }
}
