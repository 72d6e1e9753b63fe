//! Log Records

use crate::ValidationError;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A stored tuning-parameter submission. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct ParameterSet {
    pub id: i64,
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
    pub setpoint: f64,
    /// Unix milliseconds, assigned by the store on insert.
    pub created_at: i64,
}

/// A stored telemetry sample. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Sample {
    pub id: i64,
    pub temperature: f64,
    pub output: f64,
    /// Unix milliseconds, assigned by the store on insert.
    pub created_at: i64,
}

/// Parameter fields as submitted by the operator, before id/timestamp
/// assignment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NewParameters {
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
    pub setpoint: f64,
}

impl NewParameters {
    /// All four gains must be finite reals. No range bounds: the operator
    /// is trusted once authenticated.
    pub fn validate(&self) -> Result<(), ValidationError> {
        finite("kp", self.kp)?;
        finite("ki", self.ki)?;
        finite("kd", self.kd)?;
        finite("setpoint", self.setpoint)?;
        Ok(())
    }
}

/// Sample fields as reported by the device.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NewSample {
    pub temperature: f64,
    pub output: f64,
}

impl NewSample {
    pub fn validate(&self) -> Result<(), ValidationError> {
        finite("temperature", self.temperature)?;
        finite("output", self.output)?;
        Ok(())
    }
}

fn finite(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ValidationError::NotFinite { field, value })
    }
}

pub(crate) fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn rejects_nan_and_infinite() {
        let mut params = NewParameters {
            kp: 1.0,
            ki: 0.5,
            kd: 0.1,
            setpoint: 60.0,
        };
        assert!(params.validate().is_ok());

        params.ki = f64::NAN;
        assert!(matches!(
            params.validate(),
            Err(ValidationError::NotFinite { field: "ki", .. })
        ));

        params.ki = 0.5;
        params.setpoint = f64::INFINITY;
        assert!(matches!(
            params.validate(),
            Err(ValidationError::NotFinite { field: "setpoint", .. })
        ));

        let sample = NewSample {
            temperature: f64::NEG_INFINITY,
            output: 0.0,
        };
        assert!(sample.validate().is_err());
    }

    proptest! {
        #[test]
        fn finite_values_always_accepted(
            kp in -1e12f64..1e12,
            ki in -1e12f64..1e12,
            kd in -1e12f64..1e12,
            setpoint in -1e12f64..1e12,
        ) {
            let params = NewParameters { kp, ki, kd, setpoint };
            prop_assert!(params.validate().is_ok());
            let sample = NewSample { temperature: kp, output: ki };
            prop_assert!(sample.validate().is_ok());
        }
    }
}
