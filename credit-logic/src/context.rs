use std::sync::Arc;

use credit_api::service::{BureauService, PolicyService};
use credit_db::repository::{
    ApplicantRepository, AuditLogRepository, CreditScoreRepository, EqGradeMasterRepository,
    LoanApplicationRepository,
};

use crate::scoring::PdModelHandle;
use crate::settings::EngineSettings;

/// Explicit wiring for one decision engine instance.
///
/// Constructed once at start-up and handed to the engine; there is no
/// process-global state. The model handle is shared read-only across
/// workers and swapped atomically on reload.
#[derive(Clone)]
pub struct ScoringContext {
    pub policy: Arc<dyn PolicyService>,
    pub bureau: Arc<dyn BureauService>,
    pub model: Arc<PdModelHandle>,
    pub applicants: Arc<dyn ApplicantRepository>,
    pub applications: Arc<dyn LoanApplicationRepository>,
    pub credit_scores: Arc<dyn CreditScoreRepository>,
    pub eq_master: Arc<dyn EqGradeMasterRepository>,
    pub audit: Arc<dyn AuditLogRepository>,
    pub settings: EngineSettings,
}
