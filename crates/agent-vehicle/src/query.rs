//! Vehicle identity and usage context

use crate::error::PipelineError;
use serde::{Deserialize, Serialize};

pub const DEFAULT_MILEAGE: u32 = 50_000;
pub const DEFAULT_CONDITION: &str = "good";
pub const DEFAULT_REGION: &str = "california";

const MIN_MODEL_YEAR: i32 = 1900;
const MAX_MODEL_YEAR: i32 = 2100;

/// Normalized registry key: trimmed, lower-cased `"make model"`
pub fn normalize_key(make: &str, model: &str) -> String {
    format!(
        "{} {}",
        make.trim().to_lowercase(),
        model.trim().to_lowercase()
    )
}

/// Title-case every alphabetic run (`"f-150"` -> `"F-150"`)
pub fn title_case(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut in_word = false;
    for c in value.chars() {
        if c.is_alphabetic() {
            if in_word {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(c);
            in_word = false;
        }
    }
    out
}

/// A validated request for one vehicle
///
/// Fields are private; a query cannot change once built. Deserializing goes
/// through [`VehicleQueryBuilder::build`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "VehicleQueryBuilder")]
pub struct VehicleQuery {
    make: String,
    model: String,
    year: i32,
    mileage: u32,
    condition: String,
    region: String,
}

impl VehicleQuery {
    /// Start building a query with default usage context
    pub fn builder(make: impl Into<String>, model: impl Into<String>, year: i32) -> VehicleQueryBuilder {
        VehicleQueryBuilder::new(make, model, year)
    }

    /// Build a query with default mileage, condition and region
    pub fn new(make: impl Into<String>, model: impl Into<String>, year: i32) -> Result<Self, PipelineError> {
        Self::builder(make, model, year).build()
    }

    pub fn make(&self) -> &str {
        &self.make
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn mileage(&self) -> u32 {
        self.mileage
    }

    pub fn condition(&self) -> &str {
        &self.condition
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    /// Key used for override registry lookups
    pub fn registry_key(&self) -> String {
        normalize_key(&self.make, &self.model)
    }

    /// Display form, e.g. `"2021 Tesla Model 3"`
    pub fn display_name(&self) -> String {
        format!(
            "{} {} {}",
            self.year,
            title_case(&self.make),
            title_case(&self.model)
        )
    }
}

/// Builder for [`VehicleQuery`]
#[derive(Debug, Deserialize)]
pub struct VehicleQueryBuilder {
    make: String,
    model: String,
    year: i32,
    mileage: Option<u32>,
    condition: Option<String>,
    region: Option<String>,
}

impl VehicleQueryBuilder {
    pub fn new(make: impl Into<String>, model: impl Into<String>, year: i32) -> Self {
        Self {
            make: make.into(),
            model: model.into(),
            year,
            mileage: None,
            condition: None,
            region: None,
        }
    }

    pub fn mileage(mut self, mileage: u32) -> Self {
        self.mileage = Some(mileage);
        self
    }

    pub fn condition(mut self, condition: impl Into<String>) -> Self {
        self.condition = Some(condition.into());
        self
    }

    pub fn region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    /// Validate identity fields and build the query
    pub fn build(self) -> Result<VehicleQuery, PipelineError> {
        let make = self.make.trim().to_string();
        if make.is_empty() {
            return Err(PipelineError::InvalidQuery {
                field: "make",
                reason: "must not be empty".to_string(),
            });
        }

        let model = self.model.trim().to_string();
        if model.is_empty() {
            return Err(PipelineError::InvalidQuery {
                field: "model",
                reason: "must not be empty".to_string(),
            });
        }

        if !(MIN_MODEL_YEAR..=MAX_MODEL_YEAR).contains(&self.year) {
            return Err(PipelineError::InvalidQuery {
                field: "year",
                reason: format!(
                    "{} is outside {MIN_MODEL_YEAR}..={MAX_MODEL_YEAR}",
                    self.year
                ),
            });
        }

        let condition = self
            .condition
            .map(|c| c.trim().to_lowercase())
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| DEFAULT_CONDITION.to_string());
        let region = self
            .region
            .map(|r| r.trim().to_lowercase())
            .filter(|r| !r.is_empty())
            .unwrap_or_else(|| DEFAULT_REGION.to_string());

        Ok(VehicleQuery {
            make,
            model,
            year: self.year,
            mileage: self.mileage.unwrap_or(DEFAULT_MILEAGE),
            condition,
            region,
        })
    }
}

impl TryFrom<VehicleQueryBuilder> for VehicleQuery {
    type Error = PipelineError;

    fn try_from(builder: VehicleQueryBuilder) -> Result<Self, Self::Error> {
        builder.build()
    }
}
