use async_trait::async_trait;

use crate::{CreditResult, domain::BureauReport};

/// Credit Bureau Gateway
///
/// Implementations run the NICE -> KCB -> cached -> conservative fallback
/// chain behind a bounded timeout. `fetch_report` is total: a fully failed
/// chain still returns the conservative default report, flagged as
/// fallback.
#[async_trait]
pub trait BureauService: Send + Sync {
    async fn fetch_report(&self, identity_token: &str) -> CreditResult<BureauReport>;
}
