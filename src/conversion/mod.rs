//! Unit and currency conversion engine.
//!
//! A [`ConversionFamily`] is an ordered list of named units. Each unit is
//! either a [`Unit::Ratio`] (units per base unit) or a [`Unit::Formula`]
//! pair converting to and from the family's base unit. [`convert`] goes
//! through the base unit in both cases:
//!
//! ```rust
//! use startpage::conversion::{convert, families};
//!
//! let feet = convert(1.0, &families::length(), "meters", "feet").unwrap();
//! assert!((feet - 3.28084).abs() < 1e-9);
//!
//! let f = convert(100.0, &families::temperature(), "celsius", "fahrenheit").unwrap();
//! assert!((f - 212.0).abs() < 1e-9);
//! ```
//!
//! The engine never rounds; presentation rounding lives in
//! [`format_result`].

pub mod families;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::clients::RateTable;

/// How a unit relates to its family's base unit.
#[derive(Debug, Clone, Copy)]
pub enum Unit {
    /// Multiplicative: `factor` of this unit equal one base unit.
    Ratio { factor: f64 },
    /// Affine or otherwise non-multiplicative relationship.
    Formula {
        to_base: fn(f64) -> f64,
        from_base: fn(f64) -> f64,
    },
}

impl Unit {
    fn to_base(&self, value: f64) -> f64 {
        match self {
            Self::Ratio { factor } => value / factor,
            Self::Formula { to_base, .. } => to_base(value),
        }
    }

    fn from_base(&self, value: f64) -> f64 {
        match self {
            Self::Ratio { factor } => value * factor,
            Self::Formula { from_base, .. } => from_base(value),
        }
    }
}

/// A named group of mutually convertible units, in declaration order.
#[derive(Debug, Clone)]
pub struct ConversionFamily {
    label: String,
    units: Vec<(String, Unit)>,
}

impl ConversionFamily {
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            units: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_ratio(mut self, name: impl Into<String>, factor: f64) -> Self {
        self.units.push((name.into(), Unit::Ratio { factor }));
        self
    }

    #[must_use]
    pub fn with_formula(
        mut self,
        name: impl Into<String>,
        to_base: fn(f64) -> f64,
        from_base: fn(f64) -> f64,
    ) -> Self {
        self.units
            .push((name.into(), Unit::Formula { to_base, from_base }));
        self
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    #[must_use]
    pub fn unit(&self, name: &str) -> Option<&Unit> {
        self.units
            .iter()
            .find(|(unit, _)| unit == name)
            .map(|(_, unit)| unit)
    }

    pub fn unit_names(&self) -> impl Iterator<Item = &str> {
        self.units.iter().map(|(name, _)| name.as_str())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.units.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// The first two declared units, used as default selections.
    #[must_use]
    pub fn default_pair(&self) -> Option<(&str, &str)> {
        match self.units.as_slice() {
            [(a, _), (b, _), ..] => Some((a.as_str(), b.as_str())),
            _ => None,
        }
    }

    /// Names of the ratio units whose factor is exactly 1.
    #[allow(clippy::float_cmp)]
    pub fn base_units(&self) -> impl Iterator<Item = &str> {
        self.units.iter().filter_map(|(name, unit)| match unit {
            Unit::Ratio { factor } if *factor == 1.0 => Some(name.as_str()),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConversionError {
    #[error("invalid input")]
    InvalidInput,
    #[error("unknown unit: {0}")]
    UnknownUnit(String),
}

/// Convert `value` from one unit of `family` to another, at full precision.
pub fn convert(
    value: f64,
    family: &ConversionFamily,
    from: &str,
    to: &str,
) -> Result<f64, ConversionError> {
    if !value.is_finite() {
        return Err(ConversionError::InvalidInput);
    }
    let from_unit = family
        .unit(from)
        .ok_or_else(|| ConversionError::UnknownUnit(from.to_string()))?;
    let to_unit = family
        .unit(to)
        .ok_or_else(|| ConversionError::UnknownUnit(to.to_string()))?;

    Ok(to_unit.from_base(from_unit.to_base(value)))
}

/// Parse user-entered text as a finite number.
pub fn parse_value(input: &str) -> Result<f64, ConversionError> {
    input
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or(ConversionError::InvalidInput)
}

/// Fixed four-decimal presentation of a conversion result.
#[must_use]
pub fn format_result(value: f64) -> String {
    format!("{value:.4}")
}

/// Human-readable unit name (`metric_tons` → `metric tons`).
#[must_use]
pub fn display_name(unit: &str) -> String {
    unit.replace('_', " ")
}

/// Identifies one of the dashboard's conversion families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FamilyKind {
    Currency,
    Length,
    Temperature,
    Weight,
    Volume,
    Speed,
    Time,
}

impl FamilyKind {
    /// All families in display order.
    pub const ALL: [Self; 7] = [
        Self::Currency,
        Self::Length,
        Self::Temperature,
        Self::Weight,
        Self::Volume,
        Self::Speed,
        Self::Time,
    ];

    fn index(self) -> usize {
        match self {
            Self::Currency => 0,
            Self::Length => 1,
            Self::Temperature => 2,
            Self::Weight => 3,
            Self::Volume => 4,
            Self::Speed => 5,
            Self::Time => 6,
        }
    }
}

/// Every family the converter offers, with Currency refreshed from live rates.
#[derive(Debug, Clone)]
pub struct Catalog {
    families: [ConversionFamily; 7],
}

impl Default for Catalog {
    fn default() -> Self {
        Self::standard()
    }
}

impl Catalog {
    /// Static families plus an empty Currency family.
    #[must_use]
    pub fn standard() -> Self {
        Self {
            families: [
                families::empty_currency(),
                families::length(),
                families::temperature(),
                families::weight(),
                families::volume(),
                families::speed(),
                families::time(),
            ],
        }
    }

    #[must_use]
    pub fn family(&self, kind: FamilyKind) -> &ConversionFamily {
        &self.families[kind.index()]
    }

    /// Replace the Currency family with one built from `table`.
    pub fn set_rates(&mut self, table: &RateTable) {
        self.families[FamilyKind::Currency.index()] = families::currency(table);
    }
}
