use async_trait::async_trait;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;

use crate::{
    CreditResult,
    domain::{
        AreaType, EmploymentKind, EqGrade, EqGradeBenefit, IrgGrade, ParamValue, ProductKind,
        RateType, SegmentBenefit, SegmentCode, StressDsrRegion,
    },
};

/// Where a parameter resolution was ultimately answered from.
///
/// `CompiledDefault` marks a degraded store; callers record it on the
/// regulation snapshot but the evaluation proceeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamSource {
    Store,
    Cache,
    CompiledDefault,
}

/// A resolved regulatory value together with its provenance
#[derive(Debug, Clone)]
pub struct Resolved<T> {
    pub value: T,
    pub source: ParamSource,
}

impl<T> Resolved<T> {
    pub fn new(value: T, source: ParamSource) -> Self {
        Self { value, source }
    }

    pub fn degraded(&self) -> bool {
        self.source == ParamSource::CompiledDefault
    }
}

/// Regulatory Parameter Resolution Service
///
/// Every regulatory number consumed during an evaluation is resolved here:
/// time-windowed lookup against the versioned store, short-TTL cache in
/// front, and a compiled default table as the failure-safe floor. All
/// getters are total: a degraded backend yields the compiled default,
/// never an error.
#[async_trait]
pub trait PolicyService: Send + Sync {
    /// Generic resolution per the store query contract: active rows whose
    /// window contains `effective_at`, condition subset match, latest
    /// `effective_from` wins.
    async fn resolve(
        &self,
        param_key: &str,
        effective_at: DateTime<Utc>,
        condition: Option<&IndexMap<String, String>>,
    ) -> CreditResult<Option<Resolved<ParamValue>>>;

    /// Stress-DSR add-on in percentage points. Fixed-rate loans are zero by
    /// definition and never hit the store.
    async fn stress_dsr_rate(
        &self,
        region: StressDsrRegion,
        rate_type: RateType,
        effective_at: DateTime<Utc>,
    ) -> CreditResult<Resolved<f64>>;

    /// LTV ceiling in percent for the area, after the multi-owner penalty
    async fn ltv_limit(
        &self,
        area_type: AreaType,
        owned_property_count: u32,
        effective_at: DateTime<Utc>,
    ) -> CreditResult<Resolved<f64>>;

    /// DSR ceiling in percent for the product
    async fn dsr_limit(
        &self,
        product: ProductKind,
        effective_at: DateTime<Utc>,
    ) -> CreditResult<Resolved<f64>>;

    /// Statutory maximum interest rate in percent
    async fn max_interest_rate(&self, effective_at: DateTime<Utc>) -> CreditResult<Resolved<f64>>;

    async fn eq_grade_benefit(
        &self,
        grade: EqGrade,
        effective_at: DateTime<Utc>,
    ) -> CreditResult<Resolved<EqGradeBenefit>>;

    /// Multiplicative PD adjustment for the industry risk grade
    async fn irg_pd_adjustment(
        &self,
        grade: IrgGrade,
        effective_at: DateTime<Utc>,
    ) -> CreditResult<Resolved<f64>>;

    async fn segment_benefit(
        &self,
        segment: &SegmentCode,
        effective_at: DateTime<Utc>,
    ) -> CreditResult<Resolved<SegmentBenefit>>;

    /// Income multiplier for unsecured limits, scaled by the segment's
    /// limit multiplier when one applies
    async fn income_multiplier(
        &self,
        employment: EmploymentKind,
        segment: Option<&SegmentCode>,
        effective_at: DateTime<Utc>,
    ) -> CreditResult<Resolved<f64>>;

    /// Revolving credit-conversion factor
    async fn revolving_ccf(&self, effective_at: DateTime<Utc>) -> CreditResult<Resolved<f64>>;

    /// Drop cached entries for one key, or everything when None. Called by
    /// the admin service after every parameter write.
    async fn invalidate(&self, param_key: Option<&str>);
}
