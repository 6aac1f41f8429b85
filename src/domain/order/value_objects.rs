use serde::Serialize;
use std::fmt;

use super::errors::{FieldViolation, OrderError, Violation};

// ============================================================================
// Order Value Objects
// ============================================================================

/// One of the three body measurements stored per custom size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeasureField {
    Chest,
    Waist,
    Hips,
}

impl MeasureField {
    pub const ALL: [MeasureField; 3] = [MeasureField::Chest, MeasureField::Waist, MeasureField::Hips];

    pub fn as_str(&self) -> &'static str {
        match self {
            MeasureField::Chest => "chest",
            MeasureField::Waist => "waist",
            MeasureField::Hips => "hips",
        }
    }
}

impl fmt::Display for MeasureField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated (chest, waist, hips) triple, in inches.
///
/// Records are reused by exact value equality, so no tolerance is applied
/// when comparing two triples.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Measurements {
    chest: f64,
    waist: f64,
    hips: f64,
}

impl Measurements {
    pub fn new(chest: f64, waist: f64, hips: f64) -> Result<Self, OrderError> {
        CustomSizeDraft::from_values(chest, waist, hips).validate()
    }

    pub fn chest(&self) -> f64 {
        self.chest
    }

    pub fn waist(&self) -> f64 {
        self.waist
    }

    pub fn hips(&self) -> f64 {
        self.hips
    }

    pub fn get(&self, field: MeasureField) -> f64 {
        match field {
            MeasureField::Chest => self.chest,
            MeasureField::Waist => self.waist,
            MeasureField::Hips => self.hips,
        }
    }
}

impl fmt::Display for Measurements {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.chest, self.waist, self.hips)
    }
}

/// A single submitted measurement before validation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RawMeasure {
    Missing,
    NotNumeric,
    Value(f64),
}

impl From<f64> for RawMeasure {
    fn from(value: f64) -> Self {
        RawMeasure::Value(value)
    }
}

impl From<Option<&serde_json::Value>> for RawMeasure {
    fn from(value: Option<&serde_json::Value>) -> Self {
        match value {
            None | Some(serde_json::Value::Null) => RawMeasure::Missing,
            Some(serde_json::Value::Number(n)) => n.as_f64().map_or(RawMeasure::NotNumeric, RawMeasure::Value),
            Some(_) => RawMeasure::NotNumeric,
        }
    }
}

impl RawMeasure {
    fn check(self, field: MeasureField) -> Result<f64, FieldViolation> {
        let problem = match self {
            RawMeasure::Missing => Violation::Missing,
            RawMeasure::NotNumeric => Violation::NotNumeric,
            RawMeasure::Value(v) if !v.is_finite() => Violation::NotNumeric,
            RawMeasure::Value(v) if v <= 0.0 => Violation::NotPositive,
            RawMeasure::Value(v) => return Ok(v),
        };
        Err(FieldViolation { field, problem })
    }
}

/// A submitted custom size, as received from a client.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CustomSizeDraft {
    pub chest: RawMeasure,
    pub waist: RawMeasure,
    pub hips: RawMeasure,
}

impl CustomSizeDraft {
    pub fn from_values(chest: f64, waist: f64, hips: f64) -> Self {
        Self {
            chest: chest.into(),
            waist: waist.into(),
            hips: hips.into(),
        }
    }

    /// Read the three fields out of a JSON object. Anything that is not an
    /// object yields a draft with every field missing.
    pub fn from_json(value: Option<&serde_json::Value>) -> Self {
        let field = |name: &str| RawMeasure::from(value.and_then(|v| v.get(name)));
        Self {
            chest: field(MeasureField::Chest.as_str()),
            waist: field(MeasureField::Waist.as_str()),
            hips: field(MeasureField::Hips.as_str()),
        }
    }

    /// Check every field, reporting all failing fields at once.
    pub fn validate(&self) -> Result<Measurements, OrderError> {
        let chest = self.chest.check(MeasureField::Chest);
        let waist = self.waist.check(MeasureField::Waist);
        let hips = self.hips.check(MeasureField::Hips);

        match (chest, waist, hips) {
            (Ok(chest), Ok(waist), Ok(hips)) => Ok(Measurements { chest, waist, hips }),
            (chest, waist, hips) => {
                let violations = [chest.err(), waist.err(), hips.err()]
                    .into_iter()
                    .flatten()
                    .collect();
                Err(OrderError::InvalidCustomSize(violations))
            }
        }
    }
}

impl From<Measurements> for CustomSizeDraft {
    fn from(m: Measurements) -> Self {
        Self::from_values(m.chest, m.waist, m.hips)
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
