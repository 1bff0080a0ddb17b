use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Datelike, Utc};
use uuid::Uuid;

use credit_db::models::{CreditScoreModel, VintageRow};
use credit_db::repository::CreditScoreRepository;
use credit_db::RepositoryError;

use super::{poisoned_read, poisoned_write};

/// In-memory credit-score store.
///
/// Enforces the write-once `(application_id, scored_at)` uniqueness so a
/// racing duplicate evaluation loses with `Conflict`, matching the SQL
/// constraint.
#[derive(Default)]
pub struct InMemoryCreditScoreRepository {
    by_id: RwLock<HashMap<Uuid, CreditScoreModel>>,
    evaluation_keys: RwLock<HashSet<(Uuid, DateTime<Utc>)>>,
}

impl InMemoryCreditScoreRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn whole_months_between(from: DateTime<Utc>, to: DateTime<Utc>) -> u32 {
    if to <= from {
        return 0;
    }
    let months =
        (to.year() - from.year()) * 12 + (to.month() as i32 - from.month() as i32);
    let months = if to.day() < from.day() { months - 1 } else { months };
    months.max(0) as u32
}

#[async_trait]
impl CreditScoreRepository for InMemoryCreditScoreRepository {
    async fn create(
        &self,
        score: &CreditScoreModel,
    ) -> Result<CreditScoreModel, RepositoryError> {
        let mut keys = self.evaluation_keys.write().map_err(poisoned_write)?;
        let key = (score.application_id, score.scored_at);
        if keys.contains(&key) {
            return Err(RepositoryError::Conflict {
                constraint: "uq_credit_scores_application_scored_at".to_string(),
                details: format!("{} @ {}", score.application_id, score.scored_at),
            });
        }
        let mut store = self.by_id.write().map_err(poisoned_write)?;
        if store.contains_key(&score.id) {
            return Err(RepositoryError::Conflict {
                constraint: "credit_scores_pkey".to_string(),
                details: score.id.to_string(),
            });
        }
        keys.insert(key);
        store.insert(score.id, score.clone());
        Ok(score.clone())
    }

    async fn find_latest_by_application(
        &self,
        application_id: Uuid,
    ) -> Result<Option<CreditScoreModel>, RepositoryError> {
        let store = self.by_id.read().map_err(poisoned_read)?;
        Ok(store
            .values()
            .filter(|s| s.application_id == application_id)
            .max_by_key(|s| s.scored_at)
            .cloned())
    }

    async fn list_scored_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        model_version: Option<&str>,
    ) -> Result<Vec<CreditScoreModel>, RepositoryError> {
        let store = self.by_id.read().map_err(poisoned_read)?;
        let mut rows: Vec<_> = store
            .values()
            .filter(|s| s.scored_at >= from && s.scored_at < to)
            .filter(|s| model_version.map(|v| s.model_version == v).unwrap_or(true))
            .cloned()
            .collect();
        rows.sort_by_key(|s| s.scored_at);
        Ok(rows)
    }

    async fn list_outcomes_since(
        &self,
        from: DateTime<Utc>,
        model_version: Option<&str>,
    ) -> Result<Vec<CreditScoreModel>, RepositoryError> {
        let store = self.by_id.read().map_err(poisoned_read)?;
        let mut rows: Vec<_> = store
            .values()
            .filter(|s| s.scored_at >= from && s.actual_default.is_some())
            .filter(|s| model_version.map(|v| s.model_version == v).unwrap_or(true))
            .cloned()
            .collect();
        rows.sort_by_key(|s| s.scored_at);
        Ok(rows)
    }

    async fn record_outcome(
        &self,
        score_id: Uuid,
        actual_default: bool,
        observed_at: DateTime<Utc>,
    ) -> Result<CreditScoreModel, RepositoryError> {
        let mut store = self.by_id.write().map_err(poisoned_write)?;
        let row = store
            .get_mut(&score_id)
            .ok_or_else(|| RepositoryError::NotFound(format!("credit score {score_id}")))?;
        row.actual_default = Some(actual_default);
        row.outcome_observed_at = Some(observed_at);
        Ok(row.clone())
    }

    async fn vintage_rows(
        &self,
        as_of: DateTime<Utc>,
    ) -> Result<Vec<VintageRow>, RepositoryError> {
        let store = self.by_id.read().map_err(poisoned_read)?;
        Ok(store
            .values()
            .filter_map(|s| {
                let is_bad = s.actual_default?;
                Some(VintageRow {
                    cohort_month: format!("{:04}-{:02}", s.scored_at.year(), s.scored_at.month()),
                    months_on_book: whole_months_between(s.scored_at, as_of),
                    is_bad,
                })
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_whole_months_between() {
        let from = Utc.with_ymd_and_hms(2025, 1, 15, 0, 0, 0).unwrap();
        let same_day = Utc.with_ymd_and_hms(2025, 4, 15, 0, 0, 0).unwrap();
        let one_short = Utc.with_ymd_and_hms(2025, 4, 14, 0, 0, 0).unwrap();
        assert_eq!(whole_months_between(from, same_day), 3);
        assert_eq!(whole_months_between(from, one_short), 2);
        assert_eq!(whole_months_between(same_day, from), 0);
    }
}
