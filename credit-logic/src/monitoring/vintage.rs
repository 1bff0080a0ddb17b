//! Vintage and roll-rate analysis.
//!
//! Cohorts are grouped by origination month; each cohort reports its
//! cumulative 90+ DPD rate at the months-on-book checkpoints among
//! accounts seasoned at least that far.

use std::collections::BTreeMap;

use heapless::String as HeaplessString;

use credit_api::domain::{CohortCurve, DataSource, RollRateMatrix, VintageReport};
use credit_db::models::VintageRow;

/// Monthly transition rates between delinquency buckets. Computed per
/// bucket history in the performance mart; until that feed lands these are
/// the documented portfolio-average constants and reports carry the Demo
/// tag for them.
pub fn reference_roll_rates() -> RollRateMatrix {
    RollRateMatrix {
        current_to_dpd30: 0.028,
        dpd30_to_dpd60: 0.450,
        dpd60_to_dpd90: 0.600,
        dpd90_to_default: 0.750,
    }
}

pub fn compute_vintage(rows: &[VintageRow], mob_checkpoints: &[u32]) -> VintageReport {
    let mut grouped: BTreeMap<&str, Vec<&VintageRow>> = BTreeMap::new();
    for row in rows {
        grouped.entry(row.cohort_month.as_str()).or_default().push(row);
    }

    let cohorts = grouped
        .into_iter()
        .map(|(month, group)| {
            let checkpoints = mob_checkpoints
                .iter()
                .filter_map(|&mob| {
                    let seasoned: Vec<_> =
                        group.iter().filter(|r| r.months_on_book >= mob).collect();
                    if seasoned.is_empty() {
                        return None;
                    }
                    let bad = seasoned.iter().filter(|r| r.is_bad).count();
                    Some((mob, bad as f64 / seasoned.len() as f64))
                })
                .collect();
            CohortCurve {
                cohort_month: HeaplessString::try_from(month).unwrap_or_default(),
                n_accounts: group.len(),
                checkpoints,
            }
        })
        .collect();

    VintageReport {
        cohorts,
        roll_rates: reference_roll_rates(),
        data_source: DataSource::Database,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(month: &str, mob: u32, bad: bool) -> VintageRow {
        VintageRow {
            cohort_month: month.to_string(),
            months_on_book: mob,
            is_bad: bad,
        }
    }

    #[test]
    fn test_cohort_bad_rates_at_checkpoints() {
        let rows = vec![
            row("2025-01", 13, true),
            row("2025-01", 13, false),
            row("2025-01", 13, false),
            row("2025-01", 13, false),
            // too green for the 12-month checkpoint
            row("2025-06", 7, true),
            row("2025-06", 7, false),
        ];
        let report = compute_vintage(&rows, &[3, 6, 12]);
        assert_eq!(report.cohorts.len(), 2);

        let jan = &report.cohorts[0];
        assert_eq!(jan.cohort_month.as_str(), "2025-01");
        assert_eq!(jan.n_accounts, 4);
        assert_eq!(jan.checkpoints, vec![(3, 0.25), (6, 0.25), (12, 0.25)]);

        let jun = &report.cohorts[1];
        // the 12-month checkpoint has no seasoned accounts yet
        assert_eq!(jun.checkpoints, vec![(3, 0.5), (6, 0.5)]);
    }

    #[test]
    fn test_roll_rate_chain_is_increasingly_sticky() {
        let rates = reference_roll_rates();
        assert!(rates.current_to_dpd30 < rates.dpd30_to_dpd60);
        assert!(rates.dpd30_to_dpd60 < rates.dpd60_to_dpd90);
        assert!(rates.dpd60_to_dpd90 < rates.dpd90_to_default);
    }
}
