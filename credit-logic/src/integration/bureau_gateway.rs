use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use heapless::String as HeaplessString;
use moka::future::Cache;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use credit_api::domain::{BureauReport, BureauSource};
use credit_api::service::BureauService;
use credit_api::{CreditError, CreditResult};

use crate::settings::EngineSettings;

/// Credit bureau gateway with the NICE -> KCB -> cached -> conservative
/// fallback chain.
///
/// Every upstream call is timeout-bounded; a fully failed chain still
/// yields the conservative default report, so bureau outages degrade the
/// evaluation instead of blocking it.
#[derive(Clone)]
pub struct BureauGateway {
    http_client: Client,
    base_url: String,
    /// Last known good report per identity, kept longer than the upstream
    /// freshness window so it can serve as the third fallback tier
    last_good: Cache<String, BureauReport>,
}

#[derive(Debug, Serialize)]
struct ScoreRequest<'a> {
    identity_token: &'a str,
}

/// Wire shape shared by the NICE and KCB score endpoints
#[derive(Debug, Deserialize)]
struct ScoreResponse {
    credit_score: i32,
    credit_grade: String,
    #[serde(default)]
    delinquency_count_12m: u32,
    #[serde(default)]
    worst_delinquency_status: u8,
    #[serde(default)]
    open_loan_count: u32,
    #[serde(default)]
    total_loan_balance: i64,
    #[serde(default)]
    inquiry_count_3m: u32,
    #[serde(default)]
    inquiry_count_6m: u32,
    #[serde(default = "default_true")]
    telecom_no_delinquency: bool,
    #[serde(default = "default_paid_months")]
    health_insurance_paid_months_12m: u32,
}

fn default_true() -> bool {
    true
}

fn default_paid_months() -> u32 {
    12
}

impl BureauGateway {
    pub fn new(settings: &EngineSettings) -> CreditResult<Self> {
        let last_good = Cache::builder()
            .max_capacity(100_000)
            .time_to_live(Duration::from_secs(settings.bureau_cache_ttl_secs))
            .build();
        Ok(Self {
            http_client: Client::builder()
                .timeout(settings.bureau_timeout())
                .build()
                .map_err(|e| CreditError::Internal(e.to_string()))?,
            base_url: settings.bureau_base_url.clone(),
            last_good,
        })
    }

    fn cache_key(identity_token: &str) -> String {
        // a token prefix is enough to key the cache and keeps full digests
        // out of any cache diagnostics
        format!("cb:{}", &identity_token[..identity_token.len().min(16)])
    }

    async fn query_endpoint(
        &self,
        path: &str,
        source: BureauSource,
        identity_token: &str,
    ) -> Result<BureauReport, String> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .http_client
            .post(&url)
            .json(&ScoreRequest { identity_token })
            .send()
            .await
            .map_err(|e| e.to_string())?
            .error_for_status()
            .map_err(|e| e.to_string())?;

        let payload: ScoreResponse = response.json().await.map_err(|e| e.to_string())?;
        let credit_grade = HeaplessString::try_from(payload.credit_grade.as_str())
            .map_err(|_| format!("credit grade exceeds 10 bytes: {:?}", payload.credit_grade))?;
        Ok(BureauReport {
            source,
            cb_score: payload.credit_score,
            credit_grade,
            delinquency_count_12m: payload.delinquency_count_12m,
            worst_delinquency_status: payload.worst_delinquency_status,
            open_loan_count: payload.open_loan_count,
            total_loan_balance: Decimal::from(payload.total_loan_balance),
            inquiry_count_3m: payload.inquiry_count_3m,
            inquiry_count_6m: payload.inquiry_count_6m,
            telecom_no_delinquency: payload.telecom_no_delinquency,
            health_insurance_paid_months_12m: payload.health_insurance_paid_months_12m,
            queried_at: Utc::now(),
            is_fallback: false,
            error_message: None,
        })
    }
}

#[async_trait]
impl BureauService for BureauGateway {
    async fn fetch_report(&self, identity_token: &str) -> CreditResult<BureauReport> {
        let cache_key = Self::cache_key(identity_token);

        // 1. primary bureau
        match self
            .query_endpoint("/cb/nice/score", BureauSource::Nice, identity_token)
            .await
        {
            Ok(report) => {
                self.last_good.insert(cache_key, report.clone()).await;
                tracing::info!(source = "nice", score = report.cb_score, "bureau report fetched");
                return Ok(report);
            }
            Err(err) => {
                tracing::warn!(%err, "NICE bureau failed, trying KCB");
            }
        }

        // 2. secondary bureau
        match self
            .query_endpoint("/cb/kcb/score", BureauSource::Kcb, identity_token)
            .await
        {
            Ok(report) => {
                self.last_good.insert(cache_key, report.clone()).await;
                tracing::info!(source = "kcb", score = report.cb_score, "bureau report fetched");
                return Ok(report);
            }
            Err(err) => {
                tracing::warn!(%err, "KCB bureau failed, trying cache");
            }
        }

        // 3. last known good
        if let Some(mut cached) = self.last_good.get(&cache_key).await {
            cached.source = BureauSource::Cached;
            tracing::warn!(score = cached.cb_score, "serving cached bureau report");
            return Ok(cached);
        }

        // 4. conservative default
        tracing::error!("all bureau sources unusable, conservative default report in effect");
        Ok(BureauReport::conservative(
            Utc::now(),
            "NICE, KCB and cache all unavailable",
        ))
    }
}
