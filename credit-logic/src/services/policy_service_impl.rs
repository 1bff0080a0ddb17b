use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use moka::future::Cache;

use credit_api::domain::{
    AreaType, EmploymentKind, EqGrade, EqGradeBenefit, IrgGrade, ParamValue, ProductKind,
    RateType, RegulationParam, SegmentBenefit, SegmentCode, StressDsrRegion,
};
use credit_api::service::{ParamSource, PolicyService, Resolved};
use credit_api::CreditResult;
use credit_db::repository::RegulationParamRepository;

use crate::mappers::RegulationMapper;
use crate::services::param_defaults::{compiled_default_params, resolve_from_rows};
use crate::settings::EngineSettings;

/// Parameter-store resolver with a short-TTL cache in front and the
/// compiled default table underneath.
///
/// Resolution never fails open: a dead store or cache degrades to the
/// compiled defaults with a rate-limited warning, and the provenance of
/// every answer is reported so the decision engine can record degradations
/// on the regulation snapshot.
pub struct PolicyEngine<R: RegulationParamRepository> {
    repository: Arc<R>,
    cache: Cache<String, ParamValue>,
    defaults: Vec<RegulationParam>,
    store_timeout: Duration,
    /// Last warn instant per key, to keep fallback logging at one line per
    /// key per minute
    warn_log: Mutex<HashMap<String, Instant>>,
}

const WARN_INTERVAL: Duration = Duration::from_secs(60);

impl<R: RegulationParamRepository> PolicyEngine<R> {
    pub fn new(repository: Arc<R>, settings: &EngineSettings) -> Self {
        let cache = Cache::builder()
            .max_capacity(10_000)
            .time_to_live(Duration::from_secs(settings.policy_cache_ttl_secs))
            .build();
        Self {
            repository,
            cache,
            defaults: compiled_default_params(),
            store_timeout: settings.store_timeout(),
            warn_log: Mutex::new(HashMap::new()),
        }
    }

    fn cache_key(
        param_key: &str,
        effective_at: DateTime<Utc>,
        condition: Option<&IndexMap<String, String>>,
    ) -> String {
        // minute-bucketed so one evaluation's repeated lookups and close
        // neighbours share entries
        let bucket = effective_at.format("%Y%m%d%H%M");
        match condition {
            None => format!("{param_key}|{bucket}"),
            Some(map) => {
                let mut pairs: Vec<String> =
                    map.iter().map(|(k, v)| format!("{k}={v}")).collect();
                pairs.sort();
                format!("{param_key}|{bucket}|{}", pairs.join(","))
            }
        }
    }

    fn warn_fallback(&self, param_key: &str, detail: &str) {
        let mut log = match self.warn_log.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let now = Instant::now();
        let due = log
            .get(param_key)
            .map(|last| now.duration_since(*last) >= WARN_INTERVAL)
            .unwrap_or(true);
        if due {
            log.insert(param_key.to_string(), now);
            tracing::warn!(param_key, detail, "parameter store degraded, compiled default used");
        }
    }

    fn resolve_default(
        &self,
        param_key: &str,
        effective_at: DateTime<Utc>,
        condition: Option<&IndexMap<String, String>>,
    ) -> Option<ParamValue> {
        resolve_from_rows(&self.defaults, param_key, effective_at, condition)
            .map(|row| row.value.clone())
    }

    async fn query_store(
        &self,
        param_key: &str,
        effective_at: DateTime<Utc>,
        condition: Option<&IndexMap<String, String>>,
    ) -> Result<Option<ParamValue>, String> {
        let candidates = tokio::time::timeout(
            self.store_timeout,
            self.repository.find_candidates(param_key, effective_at),
        )
        .await
        .map_err(|_| "store read timed out".to_string())?
        .map_err(|e| e.to_string())?;

        let mut rows = Vec::with_capacity(candidates.len());
        for model in &candidates {
            rows.push(RegulationMapper::from_model(model).map_err(|e| e.to_string())?);
        }
        Ok(resolve_from_rows(&rows, param_key, effective_at, condition).map(|r| r.value.clone()))
    }

    fn condition_of(pairs: &[(&str, &str)]) -> IndexMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }
}

#[async_trait]
impl<R: RegulationParamRepository> PolicyService for PolicyEngine<R> {
    async fn resolve(
        &self,
        param_key: &str,
        effective_at: DateTime<Utc>,
        condition: Option<&IndexMap<String, String>>,
    ) -> CreditResult<Option<Resolved<ParamValue>>> {
        let cache_key = Self::cache_key(param_key, effective_at, condition);
        if let Some(value) = self.cache.get(&cache_key).await {
            return Ok(Some(Resolved::new(value, ParamSource::Cache)));
        }

        match self.query_store(param_key, effective_at, condition).await {
            Ok(Some(value)) => {
                self.cache.insert(cache_key, value.clone()).await;
                Ok(Some(Resolved::new(value, ParamSource::Store)))
            }
            Ok(None) => {
                // a well-seeded store answers every regulatory key; absence
                // falls through to the compiled table
                match self.resolve_default(param_key, effective_at, condition) {
                    Some(value) => {
                        self.warn_fallback(param_key, "key absent from store");
                        Ok(Some(Resolved::new(value, ParamSource::CompiledDefault)))
                    }
                    None => Ok(None),
                }
            }
            Err(detail) => {
                self.warn_fallback(param_key, &detail);
                Ok(self
                    .resolve_default(param_key, effective_at, condition)
                    .map(|value| Resolved::new(value, ParamSource::CompiledDefault)))
            }
        }
    }

    async fn stress_dsr_rate(
        &self,
        region: StressDsrRegion,
        rate_type: RateType,
        effective_at: DateTime<Utc>,
    ) -> CreditResult<Resolved<f64>> {
        // fixed-rate loans carry no stress add-on by definition
        if rate_type == RateType::Fixed {
            return Ok(Resolved::new(0.0, ParamSource::Store));
        }
        let key = format!(
            "stress_dsr.{}.{}",
            region.as_param_suffix(),
            rate_type.as_param_suffix()
        );
        let condition = Self::condition_of(&[
            ("region", region.as_param_suffix()),
            ("rate_type", rate_type.as_param_suffix()),
        ]);
        let resolved = self.resolve(&key, effective_at, Some(&condition)).await?;
        Ok(match resolved {
            Some(r) => {
                let source = r.source;
                match r.value.as_rate_pp() {
                    Some(rate) => Resolved::new(rate, source),
                    None => {
                        self.warn_fallback(&key, "unexpected value shape");
                        Resolved::new(0.0, ParamSource::CompiledDefault)
                    }
                }
            }
            None => Resolved::new(0.0, ParamSource::CompiledDefault),
        })
    }

    async fn ltv_limit(
        &self,
        area_type: AreaType,
        owned_property_count: u32,
        effective_at: DateTime<Utc>,
    ) -> CreditResult<Resolved<f64>> {
        let key = format!("ltv.{}", area_type.as_param_suffix());
        let condition = Self::condition_of(&[("area_type", area_type.as_param_suffix())]);
        let resolved = self.resolve(&key, effective_at, Some(&condition)).await?;
        Ok(match resolved {
            Some(r) => {
                let source = r.source;
                match r.value {
                    ParamValue::Ratio {
                        max_ratio_pct,
                        multi_owner_deduction_pp,
                    } => {
                        let mut limit = max_ratio_pct;
                        if owned_property_count >= 2 {
                            if let Some(deduction) = multi_owner_deduction_pp {
                                limit -= deduction;
                            }
                        }
                        Resolved::new(limit, source)
                    }
                    _ => {
                        self.warn_fallback(&key, "unexpected value shape");
                        Resolved::new(70.0, ParamSource::CompiledDefault)
                    }
                }
            }
            None => Resolved::new(70.0, ParamSource::CompiledDefault),
        })
    }

    async fn dsr_limit(
        &self,
        product: ProductKind,
        effective_at: DateTime<Utc>,
    ) -> CreditResult<Resolved<f64>> {
        let condition = Self::condition_of(&[("product", product.code())]);
        let resolved = self
            .resolve("dsr.max_ratio", effective_at, Some(&condition))
            .await?;
        Ok(match resolved {
            Some(r) => {
                let source = r.source;
                match r.value.as_max_ratio_pct() {
                    Some(limit) => Resolved::new(limit, source),
                    None => {
                        self.warn_fallback("dsr.max_ratio", "unexpected value shape");
                        Resolved::new(40.0, ParamSource::CompiledDefault)
                    }
                }
            }
            None => Resolved::new(40.0, ParamSource::CompiledDefault),
        })
    }

    async fn max_interest_rate(&self, effective_at: DateTime<Utc>) -> CreditResult<Resolved<f64>> {
        let resolved = self.resolve("rate.max_interest", effective_at, None).await?;
        Ok(match resolved {
            Some(r) => {
                let source = r.source;
                match r.value.as_max_ratio_pct() {
                    Some(cap) => Resolved::new(cap, source),
                    None => {
                        self.warn_fallback("rate.max_interest", "unexpected value shape");
                        Resolved::new(20.0, ParamSource::CompiledDefault)
                    }
                }
            }
            None => Resolved::new(20.0, ParamSource::CompiledDefault),
        })
    }

    async fn eq_grade_benefit(
        &self,
        grade: EqGrade,
        effective_at: DateTime<Utc>,
    ) -> CreditResult<Resolved<EqGradeBenefit>> {
        let key = format!("eq_grade.benefit.{}", grade.code());
        let resolved = self.resolve(&key, effective_at, None).await?;
        Ok(match resolved {
            Some(r) => {
                let source = r.source;
                match r.value {
                    ParamValue::EqBenefit {
                        limit_multiplier,
                        rate_adjustment_pp,
                    } => Resolved::new(
                        EqGradeBenefit {
                            limit_multiplier,
                            rate_adjustment_pp,
                        },
                        source,
                    ),
                    _ => {
                        self.warn_fallback(&key, "unexpected value shape");
                        Resolved::new(
                            EqGradeBenefit {
                                limit_multiplier: 1.0,
                                rate_adjustment_pp: 0.0,
                            },
                            ParamSource::CompiledDefault,
                        )
                    }
                }
            }
            None => Resolved::new(
                EqGradeBenefit {
                    limit_multiplier: 1.0,
                    rate_adjustment_pp: 0.0,
                },
                ParamSource::CompiledDefault,
            ),
        })
    }

    async fn irg_pd_adjustment(
        &self,
        grade: IrgGrade,
        effective_at: DateTime<Utc>,
    ) -> CreditResult<Resolved<f64>> {
        let key = format!("irg.pd_adjustment.{}", grade.code());
        let resolved = self.resolve(&key, effective_at, None).await?;
        Ok(match resolved {
            Some(r) => {
                let source = r.source;
                match r.value {
                    ParamValue::PdAdjustment { adjustment } => Resolved::new(adjustment, source),
                    _ => {
                        self.warn_fallback(&key, "unexpected value shape");
                        Resolved::new(0.0, ParamSource::CompiledDefault)
                    }
                }
            }
            None => Resolved::new(0.0, ParamSource::CompiledDefault),
        })
    }

    async fn segment_benefit(
        &self,
        segment: &SegmentCode,
        effective_at: DateTime<Utc>,
    ) -> CreditResult<Resolved<SegmentBenefit>> {
        // SEG-MOU-{code} collapses onto the shared SEG-MOU row; the MOU
        // master may still override the discount downstream
        let key = format!("segment.benefit.{}", segment.as_param_suffix());
        let resolved = self.resolve(&key, effective_at, None).await?;
        Ok(match resolved {
            Some(r) => {
                let source = r.source;
                match r.value {
                    ParamValue::Segment(benefit) => Resolved::new(benefit, source),
                    _ => {
                        self.warn_fallback(&key, "unexpected value shape");
                        Resolved::new(SegmentBenefit::default(), ParamSource::CompiledDefault)
                    }
                }
            }
            None => Resolved::new(SegmentBenefit::default(), ParamSource::CompiledDefault),
        })
    }

    async fn income_multiplier(
        &self,
        employment: EmploymentKind,
        segment: Option<&SegmentCode>,
        effective_at: DateTime<Utc>,
    ) -> CreditResult<Resolved<f64>> {
        let key = format!("credit_loan.income_multiplier.{}", employment.as_param_suffix());
        let condition = Self::condition_of(&[("employment_kind", employment.as_param_suffix())]);
        let resolved = self.resolve(&key, effective_at, Some(&condition)).await?;
        let (base, mut source) = match resolved {
            Some(Resolved {
                value: ParamValue::Multiplier { times },
                source,
            }) => (times, source),
            Some(_) => {
                self.warn_fallback(&key, "unexpected value shape");
                (1.0, ParamSource::CompiledDefault)
            }
            // no multiplier row for this employment kind: conservative 1.0
            None => (1.0, ParamSource::Store),
        };

        let multiplier = match segment {
            Some(code) => {
                let benefit = self.segment_benefit(code, effective_at).await?;
                if benefit.source == ParamSource::CompiledDefault {
                    source = ParamSource::CompiledDefault;
                }
                base * benefit.value.limit_multiplier.unwrap_or(1.0)
            }
            None => base,
        };

        Ok(Resolved::new(multiplier, source))
    }

    async fn revolving_ccf(&self, effective_at: DateTime<Utc>) -> CreditResult<Resolved<f64>> {
        let resolved = self.resolve("ccf.revolving.default", effective_at, None).await?;
        Ok(match resolved {
            Some(r) => {
                let source = r.source;
                match r.value {
                    ParamValue::Ccf { ratio } => Resolved::new(ratio, source),
                    _ => {
                        self.warn_fallback("ccf.revolving.default", "unexpected value shape");
                        Resolved::new(
                            crate::constants::DEFAULT_REVOLVING_CCF,
                            ParamSource::CompiledDefault,
                        )
                    }
                }
            }
            None => Resolved::new(
                crate::constants::DEFAULT_REVOLVING_CCF,
                ParamSource::CompiledDefault,
            ),
        })
    }

    async fn invalidate(&self, param_key: Option<&str>) {
        // cache keys are minute-bucketed and condition-qualified, so a
        // targeted invalidation buys nothing; writes are rare enough that a
        // full flush is the simple correct move
        self.cache.invalidate_all();
        tracing::info!(param_key = param_key.unwrap_or("ALL"), "policy cache invalidated");
    }
}
