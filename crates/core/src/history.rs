//! Assessment history: the mock backend's record of past predictions, plus the search and CSV
//! export helpers used by the history view.

use crate::assessment::RiskAssessment;
use crate::ids::{PredictionId, UserId};
use chrono::NaiveDate;
use std::fmt::Write as _;
use std::sync::RwLock;

pub const CSV_HEADER: &str = "ID,Date,Risk Level,Probability,Glucose,BMI,Age";

/// In-memory assessment log, retained for the lifetime of the process.
#[derive(Debug, Default)]
pub struct AssessmentStore {
    records: RwLock<Vec<RiskAssessment>>,
}

impl AssessmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, assessment: RiskAssessment) {
        self.records
            .write()
            .unwrap_or_else(|p| p.into_inner())
            .push(assessment);
    }

    /// Assessments made for `user_id`, newest first.
    pub fn for_subject(&self, user_id: &UserId) -> Vec<RiskAssessment> {
        let records = self.records.read().unwrap_or_else(|p| p.into_inner());
        let mut found: Vec<RiskAssessment> = records
            .iter()
            .filter(|a| &a.user_id == user_id)
            .cloned()
            .collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
        found
    }

    pub fn get(&self, id: &PredictionId) -> Option<RiskAssessment> {
        self.records
            .read()
            .unwrap_or_else(|p| p.into_inner())
            .iter()
            .find(|a| &a.id == id)
            .cloned()
    }
}

/// Case-insensitive match of `term` against each assessment's id and risk level. A blank term
/// keeps everything.
pub fn filter_history<'a>(assessments: &'a [RiskAssessment], term: &str) -> Vec<&'a RiskAssessment> {
    let term = term.trim().to_lowercase();
    assessments
        .iter()
        .filter(|a| {
            term.is_empty()
                || a.id.as_str().to_lowercase().contains(&term)
                || a.risk_level.as_str().contains(&term)
        })
        .collect()
}

/// Renders assessments as CSV, one row per assessment in the given order.
pub fn export_csv<'a>(assessments: impl IntoIterator<Item = &'a RiskAssessment>) -> String {
    let mut out = String::from(CSV_HEADER);
    out.push('\n');
    for a in assessments {
        // Writing to a String cannot fail.
        let _ = writeln!(
            out,
            "{},{},{},{},{},{},{}",
            a.id,
            a.created_at.format("%Y-%m-%d"),
            a.risk_level,
            a.probability_percent(),
            a.input.glucose,
            a.input.bmi,
            a.input.age
        );
    }
    out
}

pub fn export_file_name(date: NaiveDate) -> String {
    format!("prediction-history-{}.csv", date.format("%Y-%m-%d"))
}
