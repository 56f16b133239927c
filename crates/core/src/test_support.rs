//! Fixtures shared by the unit tests in this crate.

use crate::assessment::AssessmentParts;
use crate::auth::AuthBackend;
use crate::constants::MOCK_MODEL_ID;
use crate::identity::{AuthGrant, Identity, Role, SessionToken};
use crate::ids::{PredictionId, UserId};
use crate::metrics::HealthMetricsRecord;
use crate::{GlycoError, GlycoResult};
use async_trait::async_trait;
use chrono::Utc;
use glyco_types::{EmailAddress, NonEmptyText};

pub(crate) fn identity(role: Role) -> Identity {
    Identity {
        id: UserId::generate().unwrap(),
        email: EmailAddress::parse("pat@example.com").unwrap(),
        name: NonEmptyText::new("Pat").unwrap(),
        role,
        created_at: Utc::now(),
    }
}

/// First row of the Pima Indians Diabetes dataset.
pub(crate) fn pima_sample() -> HealthMetricsRecord {
    HealthMetricsRecord {
        pregnancies: 6.0,
        glucose: 148.0,
        blood_pressure: 72.0,
        skin_thickness: 35.0,
        insulin: 0.0,
        bmi: 33.6,
        diabetes_pedigree_function: 0.627,
        age: 50.0,
    }
}

pub(crate) fn parts(input: HealthMetricsRecord) -> AssessmentParts {
    AssessmentParts {
        id: PredictionId::generate(None).unwrap().0,
        user_id: UserId::generate().unwrap(),
        input,
        shap_values: Vec::new(),
        model_used: MOCK_MODEL_ID.to_string(),
        created_at: Utc::now(),
    }
}

/// Auth backend that refuses every sign-in and cannot be reached for sign-out.
pub(crate) struct FailingAuth;

#[async_trait]
impl AuthBackend for FailingAuth {
    async fn login(&self, _email: &EmailAddress, _password: &str) -> GlycoResult<AuthGrant> {
        Err(GlycoError::Authentication("rejected".into()))
    }

    async fn register(
        &self,
        _email: &EmailAddress,
        _password: &str,
        _name: &NonEmptyText,
    ) -> GlycoResult<AuthGrant> {
        Err(GlycoError::Authentication("rejected".into()))
    }

    async fn logout(&self, _token: &SessionToken) -> GlycoResult<()> {
        Err(GlycoError::GatewayUnavailable("auth service unreachable".into()))
    }
}
