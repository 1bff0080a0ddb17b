use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use heapless::String as HeaplessString;

use credit_api::domain::{
    CalibrationReport, DataSource, MonitoringReport, PsiReport, PsiStatus, VintageReport,
};
use credit_api::service::MonitoringService;
use credit_api::{CreditError, CreditResult};
use credit_db::repository::CreditScoreRepository;

use super::calibration::compute_calibration;
use super::demo::DemoSampler;
use super::psi::{compute_psi, compute_score_psi, compute_target_psi};
use super::vintage::compute_vintage;

/// Minimum realised sample before a monitor trusts portfolio data;
/// below it the report degrades to the seeded synthetic distributions
const MIN_PORTFOLIO_SAMPLES: usize = 100;

const DEMO_SEED: u64 = 42;

/// Implementation of the MonitoringService trait over the persisted
/// scoring history.
pub struct MonitoringEngine<S: CreditScoreRepository> {
    scores: Arc<S>,
}

impl<S: CreditScoreRepository> MonitoringEngine<S> {
    pub fn new(scores: Arc<S>) -> Self {
        Self { scores }
    }

    fn demo_score_psi() -> PsiReport {
        let mut sampler = DemoSampler::new(DEMO_SEED);
        let reference = sampler.normal_vec(680.0, 80.0, 10_000, 300.0, 900.0);
        let current = sampler.normal_vec(665.0, 85.0, 3_000, 300.0, 900.0);
        let mut report = compute_score_psi(&reference, &current);
        report.data_source = DataSource::Demo;
        report
    }

    fn demo_feature_psi(feature_names: &[&str]) -> Vec<(String, PsiReport)> {
        let mut sampler = DemoSampler::new(DEMO_SEED);
        feature_names
            .iter()
            .map(|name| {
                let value = sampler.uniform(0.02, 0.18);
                let report = PsiReport {
                    value,
                    status: PsiStatus::from_value(value),
                    bins: Vec::new(),
                    n_reference: 0,
                    n_current: 0,
                    data_source: DataSource::Demo,
                };
                (name.to_string(), report)
            })
            .collect()
    }

    fn demo_calibration(n_bins: usize) -> CalibrationReport {
        let mut sampler = DemoSampler::new(DEMO_SEED);
        let n = 5_000;
        let mut y_true = Vec::with_capacity(n);
        let mut y_prob = Vec::with_capacity(n);
        for _ in 0..n {
            let bad = sampler.bernoulli(0.072);
            let noise = sampler.uniform(0.0, 1.0);
            // mild overconfidence, mirroring a freshly deployed scorecard
            let prob = (if bad { 0.85 } else { 0.0 } + 0.15 * noise * noise).clamp(0.0, 1.0);
            y_true.push(if bad { 1.0 } else { 0.0 });
            y_prob.push(prob);
        }
        let mut report = compute_calibration(&y_true, &y_prob, n_bins);
        report.data_source = DataSource::Demo;
        report
    }

    fn demo_target_psi() -> PsiReport {
        let mut report = compute_target_psi(0.072, 0.081, 10_000, 1_500);
        report.data_source = DataSource::Demo;
        report
    }

    fn demo_vintage(mob_checkpoints: &[u32]) -> VintageReport {
        let mut sampler = DemoSampler::new(DEMO_SEED);
        let mut rows = Vec::new();
        for (i, month) in ["2025-01", "2025-02", "2025-03", "2025-04"].iter().enumerate() {
            // older cohorts are more seasoned and slightly worse
            let mob = 16 - 2 * i as u32;
            let bad_rate = 0.05 + 0.01 * i as f64;
            for _ in 0..400 {
                rows.push(credit_db::models::VintageRow {
                    cohort_month: month.to_string(),
                    months_on_book: mob,
                    is_bad: sampler.bernoulli(bad_rate),
                });
            }
        }
        let mut report = compute_vintage(&rows, mob_checkpoints);
        report.data_source = DataSource::Demo;
        report
    }
}

#[async_trait]
impl<S: CreditScoreRepository> MonitoringService for MonitoringEngine<S> {
    async fn score_psi(
        &self,
        model_version: Option<&str>,
        reference_days: i64,
        current_days: i64,
    ) -> CreditResult<PsiReport> {
        let now = Utc::now();
        let reference = self
            .scores
            .list_scored_between(
                now - Duration::days(reference_days),
                now - Duration::days(current_days),
                model_version,
            )
            .await
            .map_err(CreditError::from)?;
        let current = self
            .scores
            .list_scored_between(now - Duration::days(current_days), now, model_version)
            .await
            .map_err(CreditError::from)?;

        if reference.len() < MIN_PORTFOLIO_SAMPLES || current.len() < MIN_PORTFOLIO_SAMPLES {
            tracing::warn!(
                n_reference = reference.len(),
                n_current = current.len(),
                "score PSI short on portfolio data, demo distributions in effect"
            );
            return Ok(Self::demo_score_psi());
        }

        let reference: Vec<f64> = reference.iter().map(|s| s.score as f64).collect();
        let current: Vec<f64> = current.iter().map(|s| s.score as f64).collect();
        Ok(compute_score_psi(&reference, &current))
    }

    async fn feature_psi(
        &self,
        feature_names: &[&str],
        reference_days: i64,
        current_days: i64,
    ) -> CreditResult<Vec<(String, PsiReport)>> {
        let now = Utc::now();
        let reference = self
            .scores
            .list_scored_between(
                now - Duration::days(reference_days),
                now - Duration::days(current_days),
                None,
            )
            .await
            .map_err(CreditError::from)?;
        let current = self
            .scores
            .list_scored_between(now - Duration::days(current_days), now, None)
            .await
            .map_err(CreditError::from)?;

        let mut reports = Self::demo_feature_psi(feature_names);

        // the decision mart persists the DSR ratio per row, so that one
        // feature monitors real data; the rest stay demo until their
        // columns land
        if feature_names.contains(&"dsr")
            && reference.len() >= MIN_PORTFOLIO_SAMPLES
            && current.len() >= MIN_PORTFOLIO_SAMPLES
        {
            let ref_dsr: Vec<f64> = reference.iter().map(|s| s.dsr).collect();
            let cur_dsr: Vec<f64> = current.iter().map(|s| s.dsr).collect();
            let report = compute_psi(&ref_dsr, &cur_dsr, 10, None);
            if let Some(slot) = reports.iter_mut().find(|(name, _)| name == "dsr") {
                slot.1 = report;
            }
        }

        Ok(reports)
    }

    async fn target_psi(&self, lookback_days: i64) -> CreditResult<PsiReport> {
        let now = Utc::now();
        let outcomes = self
            .scores
            .list_outcomes_since(now - Duration::days(lookback_days), None)
            .await
            .map_err(CreditError::from)?;
        if outcomes.len() < 2 * MIN_PORTFOLIO_SAMPLES {
            return Ok(Self::demo_target_psi());
        }

        // split the window in half: older half is the reference regime
        let midpoint = now - Duration::days(lookback_days / 2);
        let (reference, current): (Vec<_>, Vec<_>) =
            outcomes.iter().partition(|s| s.scored_at < midpoint);
        let bad_rate = |rows: &[&credit_db::models::CreditScoreModel]| {
            let bad = rows
                .iter()
                .filter(|s| s.actual_default.unwrap_or(false))
                .count();
            bad as f64 / rows.len().max(1) as f64
        };
        Ok(compute_target_psi(
            bad_rate(&reference),
            bad_rate(&current),
            reference.len(),
            current.len(),
        ))
    }

    async fn calibration(
        &self,
        model_version: Option<&str>,
        n_bins: usize,
        lookback_days: i64,
    ) -> CreditResult<CalibrationReport> {
        let now = Utc::now();
        let outcomes = self
            .scores
            .list_outcomes_since(now - Duration::days(lookback_days), model_version)
            .await
            .map_err(CreditError::from)?;
        if outcomes.len() < MIN_PORTFOLIO_SAMPLES {
            tracing::warn!(
                n_outcomes = outcomes.len(),
                "calibration short on realised outcomes, demo distributions in effect"
            );
            return Ok(Self::demo_calibration(n_bins));
        }

        let y_true: Vec<f64> = outcomes
            .iter()
            .map(|s| if s.actual_default.unwrap_or(false) { 1.0 } else { 0.0 })
            .collect();
        let y_prob: Vec<f64> = outcomes.iter().map(|s| s.raw_probability).collect();
        Ok(compute_calibration(&y_true, &y_prob, n_bins))
    }

    async fn vintage(&self, mob_checkpoints: &[u32]) -> CreditResult<VintageReport> {
        let rows = self
            .scores
            .vintage_rows(Utc::now())
            .await
            .map_err(CreditError::from)?;
        if rows.len() < MIN_PORTFOLIO_SAMPLES {
            return Ok(Self::demo_vintage(mob_checkpoints));
        }
        Ok(compute_vintage(&rows, mob_checkpoints))
    }

    async fn full_report(
        &self,
        model_version: Option<&str>,
        feature_names: &[&str],
    ) -> CreditResult<MonitoringReport> {
        let score_psi = self.score_psi(model_version, 180, 30).await?;
        let feature_psi = self.feature_psi(feature_names, 180, 30).await?;
        let calibration = self.calibration(model_version, 10, 365).await?;

        let max_psi = feature_psi
            .iter()
            .map(|(_, report)| report.value)
            .fold(score_psi.value, f64::max);
        let overall_status = PsiStatus::from_value(max_psi);

        Ok(MonitoringReport {
            computed_at: Utc::now(),
            model_version: model_version.and_then(|v| HeaplessString::try_from(v).ok()),
            overall_status,
            score_psi,
            feature_psi,
            calibration,
            rca_required: overall_status != PsiStatus::Green,
        })
    }
}
