//! Emissions domain types
//!
//! Activity input, the per-category emission factor table, the computed
//! breakdown and the shape check applied to client-supplied breakdowns.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use thiserror::Error;

// ============================================================================
// Errors
// ============================================================================

/// Bad or out-of-range input to the calculation engine.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("{field} must be a non-negative number (got {value})")]
    NegativeQuantity { field: &'static str, value: f64 },

    #[error("{field} must be a finite number")]
    NonFiniteQuantity { field: &'static str },

    #[error("Unknown travel type '{travel_type}' (expected one of: {known})")]
    UnknownTravelType { travel_type: String, known: String },

    #[error("{category} emission is too large to represent")]
    EmissionOverflow { category: &'static str },
}

/// A breakdown handed to `/recommend` is missing required category values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid request data: missing or non-numeric fields: {}", .fields.join(", "))]
pub struct MissingFieldError {
    pub fields: Vec<&'static str>,
}

/// Rejected coefficient table (raised while loading configuration).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoefficientError {
    #[error("emission factor for {name} must be finite and non-negative (got {value})")]
    InvalidFactor { name: String, value: f64 },

    #[error("travel emission factors must name at least one travel mode")]
    NoTravelModes,

    #[error("travel mode name must not be empty")]
    EmptyTravelMode,
}

// ============================================================================
// Coefficient Table
// ============================================================================

/// Built-in travel factors in kg CO2e per passenger-km.
pub const DEFAULT_TRAVEL_FACTORS: &[(&str, f64)] = &[
    ("car", 0.192),
    ("bus", 0.105),
    ("train", 0.041),
    ("flight", 0.255),
    ("bicycle", 0.0),
    ("walk", 0.0),
    ("none", 0.0),
];

/// kg CO2e per kWh of electricity.
pub const DEFAULT_ELECTRICITY_FACTOR: f64 = 0.475;

/// kg CO2e per kg of meat/dairy.
pub const DEFAULT_FOOD_FACTOR: f64 = 7.0;

/// kg CO2e per USD of shopping spend.
pub const DEFAULT_SHOPPING_FACTOR: f64 = 0.4;

/// Emission factors for each activity category.
///
/// Travel is keyed by travel mode (lowercase); the other categories carry a
/// single scalar. A table can only be built with finite, non-negative factors
/// and at least one travel mode.
#[derive(Debug, Clone, PartialEq)]
pub struct CoefficientTable {
    travel: BTreeMap<String, f64>,
    electricity: f64,
    food: f64,
    shopping: f64,
}

impl CoefficientTable {
    pub fn new(
        travel: impl IntoIterator<Item = (String, f64)>,
        electricity: f64,
        food: f64,
        shopping: f64,
    ) -> Result<Self, CoefficientError> {
        let mut modes = BTreeMap::new();
        for (mode, factor) in travel {
            let mode = normalize_mode(&mode);
            if mode.is_empty() {
                return Err(CoefficientError::EmptyTravelMode);
            }
            check_factor(&format!("travel mode '{}'", mode), factor)?;
            modes.insert(mode, factor);
        }
        if modes.is_empty() {
            return Err(CoefficientError::NoTravelModes);
        }

        check_factor("electricity", electricity)?;
        check_factor("food", food)?;
        check_factor("shopping", shopping)?;

        Ok(Self {
            travel: modes,
            electricity,
            food,
            shopping,
        })
    }

    /// Look up the per-km factor for a travel mode.
    ///
    /// Matching ignores case and surrounding whitespace. An unknown mode is an
    /// error, never a zero factor.
    pub fn travel_factor(&self, travel_type: &str) -> Result<f64, ValidationError> {
        self.travel
            .get(&normalize_mode(travel_type))
            .copied()
            .ok_or_else(|| ValidationError::UnknownTravelType {
                travel_type: travel_type.to_string(),
                known: self.travel_modes().join(", "),
            })
    }

    /// Known travel modes in sorted order.
    pub fn travel_modes(&self) -> Vec<&str> {
        self.travel.keys().map(String::as_str).collect()
    }

    /// Travel modes and their factors in sorted order.
    pub fn travel_factors(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.travel.iter().map(|(mode, factor)| (mode.as_str(), *factor))
    }

    pub fn electricity_factor(&self) -> f64 {
        self.electricity
    }

    pub fn food_factor(&self) -> f64 {
        self.food
    }

    pub fn shopping_factor(&self) -> f64 {
        self.shopping
    }
}

impl Default for CoefficientTable {
    fn default() -> Self {
        Self {
            travel: DEFAULT_TRAVEL_FACTORS
                .iter()
                .map(|(mode, factor)| (mode.to_string(), *factor))
                .collect(),
            electricity: DEFAULT_ELECTRICITY_FACTOR,
            food: DEFAULT_FOOD_FACTOR,
            shopping: DEFAULT_SHOPPING_FACTOR,
        }
    }
}

fn normalize_mode(mode: &str) -> String {
    mode.trim().to_lowercase()
}

fn check_factor(name: &str, value: f64) -> Result<(), CoefficientError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(CoefficientError::InvalidFactor {
            name: name.to_string(),
            value,
        })
    }
}

// ============================================================================
// Activity input and breakdown
// ============================================================================

/// One submission's raw activity measurements (`POST /calculate` body).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityInput {
    #[serde(rename = "travelType")]
    pub travel_type: String,
    /// Kilometres travelled.
    pub distance: f64,
    /// Kilowatt-hours consumed.
    pub electricity: f64,
    /// Kilograms of meat/dairy.
    pub food: f64,
    /// USD spent.
    pub shopping: f64,
}

impl ActivityInput {
    /// Quantities paired with their wire names, in category order.
    pub fn quantities(&self) -> [(&'static str, f64); 4] {
        [
            ("distance", self.distance),
            ("electricity", self.electricity),
            ("food", self.food),
            ("shopping", self.shopping),
        ]
    }
}

/// Per-category emissions plus their total, in kg CO2e.
///
/// Build with [`EmissionsBreakdown::from_parts`] so the total is always the
/// sum of the four categories.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EmissionsBreakdown {
    pub total_emission: f64,
    pub travel_emission: f64,
    pub energy_emission: f64,
    pub food_emission: f64,
    pub shopping_emission: f64,
}

impl EmissionsBreakdown {
    pub fn from_parts(travel: f64, energy: f64, food: f64, shopping: f64) -> Self {
        Self {
            total_emission: travel + energy + food + shopping,
            travel_emission: travel,
            energy_emission: energy,
            food_emission: food,
            shopping_emission: shopping,
        }
    }

    /// Category name and value pairs, in category order.
    pub fn categories(&self) -> [(&'static str, f64); 4] {
        [
            ("travel", self.travel_emission),
            ("energy", self.energy_emission),
            ("food", self.food_emission),
            ("shopping", self.shopping_emission),
        ]
    }

    /// First value (category or `total`) that is not a finite number.
    pub fn first_non_finite(&self) -> Option<&'static str> {
        self.categories()
            .into_iter()
            .chain([("total", self.total_emission)])
            .find(|(_, value)| !value.is_finite())
            .map(|(name, _)| name)
    }

    /// The category with the largest emission (first one wins on ties).
    pub fn largest_category(&self) -> (&'static str, f64) {
        self.categories()
            .into_iter()
            .fold(("travel", f64::MIN), |best, current| {
                if current.1 > best.1 {
                    current
                } else {
                    best
                }
            })
    }
}

// ============================================================================
// Breakdown validation
// ============================================================================

/// Keys every breakdown submitted for recommendations must carry.
pub const REQUIRED_BREAKDOWN_FIELDS: [&str; 4] = [
    "travel_emission",
    "energy_emission",
    "food_emission",
    "shopping_emission",
];

/// Check a client-supplied mapping has the four numeric category fields.
///
/// Only the shape is checked. Extra keys are ignored, and any supplied
/// `total_emission` is discarded in favour of the sum of the parts.
pub fn validate_breakdown(data: &Map<String, Value>) -> Result<EmissionsBreakdown, MissingFieldError> {
    let mut values = [0.0_f64; 4];
    let mut missing = Vec::new();

    for (slot, field) in values.iter_mut().zip(REQUIRED_BREAKDOWN_FIELDS) {
        match data.get(field).and_then(Value::as_f64) {
            Some(value) => *slot = value,
            None => missing.push(field),
        }
    }

    if !missing.is_empty() {
        return Err(MissingFieldError { fields: missing });
    }

    let [travel, energy, food, shopping] = values;
    Ok(EmissionsBreakdown::from_parts(travel, energy, food, shopping))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn as_map(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    #[test]
    fn default_table_resolves_known_modes() {
        let table = CoefficientTable::default();
        assert_eq!(table.travel_factor("car").unwrap(), 0.192);
        assert_eq!(table.travel_factor("  Train ").unwrap(), 0.041);
        assert_eq!(table.travel_factor("none").unwrap(), 0.0);
    }

    #[test]
    fn unknown_travel_mode_is_an_error() {
        let table = CoefficientTable::default();
        let err = table.travel_factor("spaceship").unwrap_err();
        match err {
            ValidationError::UnknownTravelType { travel_type, known } => {
                assert_eq!(travel_type, "spaceship");
                assert!(known.contains("car"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn table_rejects_negative_and_non_finite_factors() {
        let travel = vec![("car".to_string(), 0.2)];
        assert!(matches!(
            CoefficientTable::new(travel.clone(), -1.0, 1.0, 1.0),
            Err(CoefficientError::InvalidFactor { .. })
        ));
        assert!(matches!(
            CoefficientTable::new(travel, 1.0, f64::NAN, 1.0),
            Err(CoefficientError::InvalidFactor { .. })
        ));
        assert!(matches!(
            CoefficientTable::new(vec![("boat".to_string(), -0.5)], 1.0, 1.0, 1.0),
            Err(CoefficientError::InvalidFactor { .. })
        ));
    }

    #[test]
    fn table_requires_travel_modes() {
        assert_eq!(
            CoefficientTable::new(Vec::new(), 1.0, 1.0, 1.0),
            Err(CoefficientError::NoTravelModes)
        );
        assert_eq!(
            CoefficientTable::new(vec![(" ".to_string(), 1.0)], 1.0, 1.0, 1.0),
            Err(CoefficientError::EmptyTravelMode)
        );
    }

    #[test]
    fn custom_table_normalizes_mode_names() {
        let table =
            CoefficientTable::new(vec![("E-Scooter".to_string(), 0.035)], 0.3, 5.0, 0.2).unwrap();
        assert_eq!(table.travel_modes(), vec!["e-scooter"]);
        assert_eq!(table.travel_factor("e-scooter").unwrap(), 0.035);
        assert!(table.travel_factor("car").is_err());
    }

    #[test]
    fn activity_input_uses_camel_case_travel_type() {
        let input: ActivityInput = serde_json::from_value(json!({
            "travelType": "bus",
            "distance": 12,
            "electricity": 3.5,
            "food": 0,
            "shopping": 40
        }))
        .unwrap();
        assert_eq!(input.travel_type, "bus");
        assert_eq!(input.distance, 12.0);
    }

    #[test]
    fn breakdown_total_is_sum_of_parts() {
        let breakdown = EmissionsBreakdown::from_parts(1.5, 2.25, 3.0, 0.125);
        assert_eq!(breakdown.total_emission, 6.875);
        assert_eq!(breakdown.largest_category(), ("food", 3.0));
        assert_eq!(breakdown.first_non_finite(), None);
    }

    #[test]
    fn overflowing_total_is_reported() {
        let breakdown = EmissionsBreakdown::from_parts(f64::MAX, f64::MAX, 0.0, 0.0);
        assert_eq!(breakdown.first_non_finite(), Some("total"));
        let breakdown = EmissionsBreakdown::from_parts(1.0, f64::INFINITY, 0.0, 0.0);
        assert_eq!(breakdown.first_non_finite(), Some("energy"));
    }

    #[test]
    fn breakdown_serializes_with_snake_case_keys() {
        let value = serde_json::to_value(EmissionsBreakdown::from_parts(1.0, 2.0, 3.0, 4.0)).unwrap();
        assert_eq!(
            value,
            json!({
                "total_emission": 10.0,
                "travel_emission": 1.0,
                "energy_emission": 2.0,
                "food_emission": 3.0,
                "shopping_emission": 4.0
            })
        );
    }

    #[test]
    fn validate_accepts_complete_breakdown_and_recomputes_total() {
        let data = as_map(json!({
            "travel_emission": 19.2,
            "energy_emission": 23.75,
            "food_emission": 70,
            "shopping_emission": 2,
            "total_emission": 9999,
            "note": "extra keys are ignored"
        }));
        let breakdown = validate_breakdown(&data).unwrap();
        assert_eq!(breakdown.food_emission, 70.0);
        assert_eq!(breakdown.total_emission, 19.2 + 23.75 + 70.0 + 2.0);
    }

    #[test]
    fn validate_names_every_missing_or_non_numeric_field() {
        let data = as_map(json!({
            "travel_emission": "12",
            "energy_emission": 1.0,
            "food_emission": null
        }));
        let err = validate_breakdown(&data).unwrap_err();
        assert_eq!(
            err.fields,
            vec!["travel_emission", "food_emission", "shopping_emission"]
        );
        assert!(err.to_string().contains("shopping_emission"));
    }
}
