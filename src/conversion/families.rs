//! Built-in unit families.
//!
//! Ratio factors are "units per base unit": one meter is 3.28084 feet, so
//! `feet` carries 3.28084 and the base unit `meters` carries 1.

use crate::clients::RateTable;

use super::{ConversionFamily, Unit};

fn celsius_identity(c: f64) -> f64 {
    c
}

fn fahrenheit_to_celsius(f: f64) -> f64 {
    (f - 32.0) * 5.0 / 9.0
}

fn celsius_to_fahrenheit(c: f64) -> f64 {
    c * 9.0 / 5.0 + 32.0
}

fn kelvin_to_celsius(k: f64) -> f64 {
    k - 273.15
}

fn celsius_to_kelvin(c: f64) -> f64 {
    c + 273.15
}

#[must_use]
pub fn length() -> ConversionFamily {
    ConversionFamily::new("Length")
        .with_ratio("meters", 1.0)
        .with_ratio("feet", 3.28084)
        .with_ratio("kilometers", 0.001)
        .with_ratio("miles", 0.000_621_371)
        .with_ratio("inches", 39.3701)
        .with_ratio("centimeters", 100.0)
}

/// Temperature is affine, so it uses formulas through Celsius.
#[must_use]
pub fn temperature() -> ConversionFamily {
    ConversionFamily::new("Temperature")
        .with_formula("celsius", celsius_identity, celsius_identity)
        .with_formula("fahrenheit", fahrenheit_to_celsius, celsius_to_fahrenheit)
        .with_formula("kelvin", kelvin_to_celsius, celsius_to_kelvin)
}

#[must_use]
pub fn weight() -> ConversionFamily {
    ConversionFamily::new("Weight")
        .with_ratio("kilograms", 1.0)
        .with_ratio("pounds", 2.20462)
        .with_ratio("grams", 1000.0)
        .with_ratio("ounces", 35.274)
        .with_ratio("metric_tons", 0.001)
}

#[must_use]
pub fn volume() -> ConversionFamily {
    ConversionFamily::new("Volume")
        .with_ratio("liters", 1.0)
        .with_ratio("gallons", 0.264_172)
        .with_ratio("quarts", 1.05669)
        .with_ratio("milliliters", 1000.0)
        .with_ratio("cubic_meters", 0.001)
}

#[must_use]
pub fn speed() -> ConversionFamily {
    ConversionFamily::new("Speed")
        .with_ratio("kph", 1.0)
        .with_ratio("mph", 0.621_371)
        .with_ratio("m_per_s", 0.277_778)
        .with_ratio("ft_per_s", 0.911_344)
}

#[must_use]
pub fn time() -> ConversionFamily {
    ConversionFamily::new("Time")
        .with_ratio("seconds", 1.0)
        .with_ratio("minutes", 0.016_666_7)
        .with_ratio("hours", 0.000_277_778)
        .with_ratio("days", 0.000_011_574)
}

/// Currency family built from live rates. The base currency comes first,
/// the rest follow in code order.
#[must_use]
pub fn currency(table: &RateTable) -> ConversionFamily {
    let mut family = ConversionFamily::new("Currency").with_ratio(table.base.clone(), 1.0);
    for (code, rate) in &table.rates {
        if *code != table.base && rate.is_finite() && *rate > 0.0 {
            family = family.with_ratio(code.clone(), *rate);
        }
    }
    family
}

/// Currency family before rates have loaded.
#[must_use]
pub fn empty_currency() -> ConversionFamily {
    ConversionFamily::new("Currency")
}
