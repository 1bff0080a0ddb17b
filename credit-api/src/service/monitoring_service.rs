use async_trait::async_trait;

use crate::{
    CreditResult,
    domain::{CalibrationReport, MonitoringReport, PsiReport, VintageReport},
};

/// Model Monitoring Service
///
/// Offline/batch computations over persisted scoring history. Reports
/// degrade to deterministic synthetic distributions when fewer than 100
/// realised outcomes exist, tagged with their data source.
#[async_trait]
pub trait MonitoringService: Send + Sync {
    /// Score-PSI on fixed 60-point bins over 300-900
    async fn score_psi(
        &self,
        model_version: Option<&str>,
        reference_days: i64,
        current_days: i64,
    ) -> CreditResult<PsiReport>;

    /// Per-feature PSI on percentile bins
    async fn feature_psi(
        &self,
        feature_names: &[&str],
        reference_days: i64,
        current_days: i64,
    ) -> CreditResult<Vec<(String, PsiReport)>>;

    /// Two-bin Bernoulli PSI of the realised bad rate
    async fn target_psi(&self, lookback_days: i64) -> CreditResult<PsiReport>;

    /// ECE and Brier over predicted probabilities vs realised defaults
    async fn calibration(
        &self,
        model_version: Option<&str>,
        n_bins: usize,
        lookback_days: i64,
    ) -> CreditResult<CalibrationReport>;

    /// Cohort curves at MOB {3, 6, 12} plus monthly roll rates
    async fn vintage(&self, mob_checkpoints: &[u32]) -> CreditResult<VintageReport>;

    /// Aggregate report across all indicators
    async fn full_report(
        &self,
        model_version: Option<&str>,
        feature_names: &[&str],
    ) -> CreditResult<MonitoringReport>;
}
