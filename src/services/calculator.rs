//! Emissions calculation engine.
//!
//! A pure linear model: each category's emission is its activity quantity
//! multiplied by the matching factor from the [`CoefficientTable`]. No
//! rounding is applied here; formatting is left to the caller.

use tracing::{debug, instrument};

use crate::domain::{ActivityInput, CoefficientTable, EmissionsBreakdown, ValidationError};

/// Calculator bound to one coefficient table.
#[derive(Debug, Clone, Default)]
pub struct Calculator {
    coefficients: CoefficientTable,
}

impl Calculator {
    pub fn new(coefficients: CoefficientTable) -> Self {
        Self { coefficients }
    }

    /// Compute the emissions breakdown for one submission.
    #[instrument(skip(self, input), fields(travel_type = %input.travel_type))]
    pub fn calculate(&self, input: &ActivityInput) -> Result<EmissionsBreakdown, ValidationError> {
        for (field, value) in input.quantities() {
            if !value.is_finite() {
                return Err(ValidationError::NonFiniteQuantity { field });
            }
            if value < 0.0 {
                return Err(ValidationError::NegativeQuantity { field, value });
            }
        }

        let travel_factor = self.coefficients.travel_factor(&input.travel_type)?;

        let breakdown = EmissionsBreakdown::from_parts(
            input.distance * travel_factor,
            input.electricity * self.coefficients.electricity_factor(),
            input.food * self.coefficients.food_factor(),
            input.shopping * self.coefficients.shopping_factor(),
        );

        // Finite inputs can still overflow once multiplied or summed.
        if let Some(category) = breakdown.first_non_finite() {
            return Err(ValidationError::EmissionOverflow { category });
        }

        debug!(total_emission = breakdown.total_emission, "Emissions calculated");

        Ok(breakdown)
    }
}
