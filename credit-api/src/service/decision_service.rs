use async_trait::async_trait;
use uuid::Uuid;

use crate::{CreditResult, domain::ScoringResult};

/// Decision Engine Service
///
/// Single entry point to evaluate a loan application. One evaluation is
/// deterministic given a fixed regulation snapshot, non-blocking on the
/// happy path apart from the bureau call, and idempotent at the
/// `(application_id, scored_at)` grain.
#[async_trait]
pub trait DecisionService: Send + Sync {
    /// Run the full pipeline: resolve regulatory parameters, fetch the
    /// bureau report through the fallback chain, score, gate, price,
    /// explain, persist. Returns the immutable result.
    async fn evaluate(&self, application_id: Uuid) -> CreditResult<ScoringResult>;

    /// Latest persisted result for an application, by `scored_at`
    async fn latest_result(&self, application_id: Uuid) -> CreditResult<Option<ScoringResult>>;

    /// Early-warning suspension: terminal, reachable from any non-terminal
    /// status. Emits an audit record; refuses on terminal states.
    async fn suspend(&self, application_id: Uuid, reason: &str, actor: &str) -> CreditResult<()>;
}
