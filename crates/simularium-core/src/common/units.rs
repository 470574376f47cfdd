//! Spatial and time units carried into the Simularium trajectory info block.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SpatialUnit {
    Meter,
    Centimeter,
    Millimeter,
    Micrometer,
    #[default]
    Nanometer,
    Angstrom,
}

impl SpatialUnit {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Meter => "m",
            Self::Centimeter => "cm",
            Self::Millimeter => "mm",
            Self::Micrometer => "µm",
            Self::Nanometer => "nm",
            Self::Angstrom => "Å",
        }
    }

    /// Length of one unit expressed in metres.
    pub const fn meters(self) -> f64 {
        match self {
            Self::Meter => 1.0,
            Self::Centimeter => 1.0e-2,
            Self::Millimeter => 1.0e-3,
            Self::Micrometer => 1.0e-6,
            Self::Nanometer => 1.0e-9,
            Self::Angstrom => 1.0e-10,
        }
    }

    pub fn from_meters(self, value: f64) -> f64 {
        value / self.meters()
    }
}

impl Display for SpatialUnit {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str((*self).as_str())
    }
}

impl FromStr for SpatialUnit {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "m" | "meter" | "meters" => Ok(Self::Meter),
            "cm" | "centimeter" | "centimeters" => Ok(Self::Centimeter),
            "mm" | "millimeter" | "millimeters" => Ok(Self::Millimeter),
            "um" | "µm" | "μm" | "micrometer" | "micrometers" | "micron" => Ok(Self::Micrometer),
            "nm" | "nanometer" | "nanometers" => Ok(Self::Nanometer),
            "A" | "Å" | "angstrom" | "angstroms" => Ok(Self::Angstrom),
            other => Err(format!("unsupported spatial unit '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TimeUnit {
    #[default]
    Second,
    Millisecond,
    Microsecond,
    Nanosecond,
    Picosecond,
}

impl TimeUnit {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Second => "s",
            Self::Millisecond => "ms",
            Self::Microsecond => "µs",
            Self::Nanosecond => "ns",
            Self::Picosecond => "ps",
        }
    }
}

impl Display for TimeUnit {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str((*self).as_str())
    }
}

impl FromStr for TimeUnit {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "s" | "sec" | "second" | "seconds" => Ok(Self::Second),
            "ms" | "millisecond" | "milliseconds" => Ok(Self::Millisecond),
            "us" | "µs" | "μs" | "microsecond" | "microseconds" => Ok(Self::Microsecond),
            "ns" | "nanosecond" | "nanoseconds" => Ok(Self::Nanosecond),
            "ps" | "picosecond" | "picoseconds" => Ok(Self::Picosecond),
            other => Err(format!("unsupported time unit '{}'", other)),
        }
    }
}
