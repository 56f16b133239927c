//! The eight-field health metrics record submitted for a risk prediction.
//!
//! Range validation belongs to the caller: [`HealthMetricsRecord::validate`] is run before the
//! prediction gateway is invoked, and the gateway itself never rejects a record.

use crate::{GlycoError, GlycoResult};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Inclusive valid range for one metric.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FieldRange {
    pub field: &'static str,
    pub min: f64,
    pub max: f64,
}

/// Documented ranges, in form order.
pub const FIELD_RANGES: [FieldRange; 8] = [
    FieldRange { field: "pregnancies", min: 0.0, max: 17.0 },
    FieldRange { field: "glucose", min: 0.0, max: 200.0 },
    FieldRange { field: "bloodPressure", min: 0.0, max: 122.0 },
    FieldRange { field: "skinThickness", min: 0.0, max: 99.0 },
    FieldRange { field: "insulin", min: 0.0, max: 846.0 },
    FieldRange { field: "bmi", min: 0.0, max: 67.1 },
    FieldRange { field: "diabetesPedigreeFunction", min: 0.078, max: 2.42 },
    FieldRange { field: "age", min: 21.0, max: 81.0 },
];

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HealthMetricsRecord {
    /// Number of times pregnant.
    pub pregnancies: f64,
    /// Plasma glucose concentration (mg/dL).
    pub glucose: f64,
    /// Diastolic blood pressure (mm Hg).
    pub blood_pressure: f64,
    /// Triceps skin fold thickness (mm).
    pub skin_thickness: f64,
    /// 2-hour serum insulin (mu U/ml).
    pub insulin: f64,
    /// Body mass index (kg/m²).
    pub bmi: f64,
    pub diabetes_pedigree_function: f64,
    /// Age in years.
    pub age: f64,
}

impl HealthMetricsRecord {
    /// Field values paired with their wire names, in form order.
    pub fn fields(&self) -> [(&'static str, f64); 8] {
        [
            ("pregnancies", self.pregnancies),
            ("glucose", self.glucose),
            ("bloodPressure", self.blood_pressure),
            ("skinThickness", self.skin_thickness),
            ("insulin", self.insulin),
            ("bmi", self.bmi),
            ("diabetesPedigreeFunction", self.diabetes_pedigree_function),
            ("age", self.age),
        ]
    }

    /// Checks every field against [`FIELD_RANGES`], reporting the first violation.
    ///
    /// NaN never satisfies a range and is reported as a violation.
    pub fn validate(&self) -> GlycoResult<()> {
        for (range, (_, value)) in FIELD_RANGES.iter().zip(self.fields()) {
            if !(range.min..=range.max).contains(&value) {
                return Err(GlycoError::Validation {
                    field: range.field,
                    min: range.min,
                    max: range.max,
                    value,
                });
            }
        }
        Ok(())
    }
}

impl Default for HealthMetricsRecord {
    /// The values the prediction form starts with.
    fn default() -> Self {
        Self {
            pregnancies: 0.0,
            glucose: 120.0,
            blood_pressure: 80.0,
            skin_thickness: 20.0,
            insulin: 80.0,
            bmi: 25.0,
            diabetes_pedigree_function: 0.5,
            age: 30.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::pima_sample;

    #[test]
    fn default_and_sample_records_are_valid() {
        HealthMetricsRecord::default().validate().expect("form defaults are in range");
        pima_sample().validate().expect("sample is in range");
    }

    #[test]
    fn range_boundaries_are_inclusive() {
        let mut record = pima_sample();
        record.bmi = 67.1;
        record.diabetes_pedigree_function = 0.078;
        record.age = 81.0;
        record.validate().expect("inclusive upper and lower bounds");
    }

    #[test]
    fn first_violation_is_reported_with_message() {
        let mut record = pima_sample();
        record.age = 20.0;
        record.glucose = 250.0;

        let err = record.validate().expect_err("out of range");
        assert!(matches!(err, GlycoError::Validation { field: "glucose", value, .. } if value == 250.0));
        assert_eq!(err.to_string(), "glucose must be between 0 and 200");
    }

    #[test]
    fn nan_is_rejected() {
        let mut record = pima_sample();
        record.insulin = f64::NAN;
        assert!(matches!(
            record.validate(),
            Err(GlycoError::Validation { field: "insulin", .. })
        ));
    }

    #[test]
    fn wire_names_are_camel_case() {
        let json = serde_json::to_value(pima_sample()).unwrap();
        assert_eq!(json["bloodPressure"], 72.0);
        assert_eq!(json["diabetesPedigreeFunction"], 0.627);
    }
}
