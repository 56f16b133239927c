//! Risk assessment output: probability, derived risk level and feature attributions.

use crate::ids::{PredictionId, UserId};
use crate::metrics::HealthMetricsRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

pub const ELEVATED_RISK_EXPLANATION: &str = "Based on your health metrics, there is an elevated risk of diabetes. Key contributing factors include glucose levels and BMI.";
pub const LOW_RISK_EXPLANATION: &str = "Your health metrics indicate a low risk of diabetes. Continue maintaining healthy lifestyle habits.";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
}

impl RiskLevel {
    /// Step function over probability: `low` up to 0.4, `moderate` up to 0.7, `high` above.
    pub fn from_probability(probability: f64) -> Self {
        if probability > 0.7 {
            RiskLevel::High
        } else if probability > 0.4 {
            RiskLevel::Moderate
        } else {
            RiskLevel::Low
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Moderate => "moderate",
            RiskLevel::High => "high",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One feature's signed contribution to a prediction.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct FeatureAttribution {
    pub feature: String,
    pub value: f64,
    pub impact: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RiskAssessment {
    #[schema(value_type = String)]
    pub id: PredictionId,
    #[schema(value_type = String)]
    pub user_id: UserId,
    pub input: HealthMetricsRecord,
    /// 1 when `probability` exceeds the decision threshold, else 0.
    pub prediction: u8,
    pub probability: f64,
    pub risk_level: RiskLevel,
    /// Unordered; use [`RiskAssessment::top_features`] for display.
    pub shap_values: Vec<FeatureAttribution>,
    pub model_used: String,
    pub created_at: DateTime<Utc>,
    pub explanation: String,
}

/// Inputs for [`RiskAssessment::assemble`] that are not derived from the probability.
#[derive(Clone, Debug)]
pub struct AssessmentParts {
    pub id: PredictionId,
    pub user_id: UserId,
    pub input: HealthMetricsRecord,
    pub shap_values: Vec<FeatureAttribution>,
    pub model_used: String,
    pub created_at: DateTime<Utc>,
}

impl RiskAssessment {
    /// Builds an assessment whose prediction, risk level and explanation all derive from the
    /// single `probability` value.
    pub fn assemble(parts: AssessmentParts, probability: f64, threshold: f64) -> Self {
        let prediction = u8::from(probability > threshold);
        let explanation = if prediction == 1 {
            ELEVATED_RISK_EXPLANATION
        } else {
            LOW_RISK_EXPLANATION
        };

        Self {
            id: parts.id,
            user_id: parts.user_id,
            input: parts.input,
            prediction,
            probability,
            risk_level: RiskLevel::from_probability(probability),
            shap_values: parts.shap_values,
            model_used: parts.model_used,
            created_at: parts.created_at,
            explanation: explanation.to_string(),
        }
    }

    /// Checks the cross-field invariants for an assessment received from elsewhere.
    pub fn is_consistent(&self, threshold: f64) -> bool {
        (0.0..=1.0).contains(&self.probability)
            && self.prediction == u8::from(self.probability > threshold)
            && self.risk_level == RiskLevel::from_probability(self.probability)
    }

    /// The `n` attributions with the largest absolute impact, largest first.
    pub fn top_features(&self, n: usize) -> Vec<&FeatureAttribution> {
        let mut sorted: Vec<&FeatureAttribution> = self.shap_values.iter().collect();
        sorted.sort_by(|a, b| b.impact.abs().total_cmp(&a.impact.abs()));
        sorted.truncate(n);
        sorted
    }

    /// Probability as a percentage with one decimal, e.g. `74.0%`.
    pub fn probability_percent(&self) -> String {
        format!("{:.1}%", self.probability * 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{parts, pima_sample};

    #[test]
    fn risk_level_thresholds() {
        assert_eq!(RiskLevel::from_probability(0.39), RiskLevel::Low);
        assert_eq!(RiskLevel::from_probability(0.4), RiskLevel::Low);
        assert_eq!(RiskLevel::from_probability(0.55), RiskLevel::Moderate);
        assert_eq!(RiskLevel::from_probability(0.7), RiskLevel::Moderate);
        assert_eq!(RiskLevel::from_probability(0.85), RiskLevel::High);
        assert_eq!(RiskLevel::from_probability(0.0), RiskLevel::Low);
        assert_eq!(RiskLevel::from_probability(1.0), RiskLevel::High);
    }

    #[test]
    fn pima_sample_at_074_is_high_risk() {
        let assessment = RiskAssessment::assemble(parts(pima_sample()), 0.74, 0.5);

        assert_eq!(assessment.risk_level, RiskLevel::High);
        assert_eq!(assessment.prediction, 1);
        assert_eq!(assessment.probability, 0.74);
        assert_eq!(assessment.explanation, ELEVATED_RISK_EXPLANATION);
        assert_eq!(assessment.probability_percent(), "74.0%");
        assert!(assessment.is_consistent(0.5));
    }

    #[test]
    fn prediction_uses_strict_threshold() {
        let at = RiskAssessment::assemble(parts(pima_sample()), 0.5, 0.5);
        assert_eq!(at.prediction, 0);
        assert_eq!(at.explanation, LOW_RISK_EXPLANATION);
        assert_eq!(at.risk_level, RiskLevel::Moderate);

        let above = RiskAssessment::assemble(parts(pima_sample()), 0.5000001, 0.5);
        assert_eq!(above.prediction, 1);
    }

    #[test]
    fn inconsistent_assessments_are_detected() {
        let mut assessment = RiskAssessment::assemble(parts(pima_sample()), 0.23, 0.5);
        assert!(assessment.is_consistent(0.5));

        assessment.risk_level = RiskLevel::High;
        assert!(!assessment.is_consistent(0.5));

        let mut out_of_range = RiskAssessment::assemble(parts(pima_sample()), 0.9, 0.5);
        out_of_range.probability = 1.2;
        assert!(!out_of_range.is_consistent(0.5));
    }

    #[test]
    fn top_features_sorts_by_absolute_impact() {
        let mut p = parts(pima_sample());
        p.shap_values = vec![
            FeatureAttribution { feature: "Age".into(), value: 50.0, impact: 0.15 },
            FeatureAttribution { feature: "Insulin".into(), value: 0.0, impact: -0.3 },
            FeatureAttribution { feature: "Glucose".into(), value: 148.0, impact: 0.25 },
        ];
        let assessment = RiskAssessment::assemble(p, 0.6, 0.5);

        let top: Vec<&str> = assessment
            .top_features(2)
            .into_iter()
            .map(|f| f.feature.as_str())
            .collect();
        assert_eq!(top, vec!["Insulin", "Glucose"]);
        assert_eq!(assessment.top_features(10).len(), 3);
    }

    #[test]
    fn serialises_with_reference_field_names() {
        let assessment = RiskAssessment::assemble(parts(pima_sample()), 0.74, 0.5);
        let json = serde_json::to_value(&assessment).unwrap();

        assert_eq!(json["riskLevel"], "high");
        assert_eq!(json["prediction"], 1);
        assert!(json["shapValues"].is_array());
        assert!(json.get("modelUsed").is_some());
        assert!(json.get("userId").is_some());
    }

    #[test]
    fn decodes_backend_assigned_ids() {
        let body = r#"{
            "id": "pred-001", "userId": "1",
            "input": {"pregnancies": 6, "glucose": 148, "bloodPressure": 72, "skinThickness": 35,
                      "insulin": 0, "bmi": 33.6, "diabetesPedigreeFunction": 0.627, "age": 50},
            "prediction": 1, "probability": 0.74, "riskLevel": "high", "shapValues": [],
            "modelUsed": "XGBoost Classifier v1.0", "createdAt": "2024-01-15T10:30:00Z",
            "explanation": "elevated"
        }"#;
        let assessment: RiskAssessment = serde_json::from_str(body).unwrap();

        assert_eq!(assessment.id.as_str(), "pred-001");
        assert_eq!(assessment.user_id.as_str(), "1");
        assert_eq!(assessment.input, pima_sample());
        assert!(assessment.is_consistent(0.5));
    }
}
