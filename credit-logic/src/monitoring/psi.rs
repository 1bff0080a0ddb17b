//! Population Stability Index.
//!
//! PSI = sum over bins of (cur% - ref%) * ln(cur% / ref%), with
//! Laplace-smoothed bin proportions so empty bins never divide by zero.
//! Bands: < 0.10 green, < 0.20 yellow, >= 0.20 red.

use credit_api::domain::{DataSource, PsiBin, PsiReport, PsiStatus};

/// Linear-interpolated percentile of a sorted slice
fn percentile(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    if sorted.len() == 1 {
        return sorted[0];
    }
    let rank = q / 100.0 * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    if lower == upper {
        sorted[lower]
    } else {
        let weight = rank - lower as f64;
        sorted[lower] * (1.0 - weight) + sorted[upper] * weight
    }
}

/// Breakpoints from the reference distribution's percentiles, outer edges
/// clamped to +/- infinity
pub fn percentile_breakpoints(reference: &[f64], n_bins: usize) -> Vec<f64> {
    let mut sorted = reference.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mut edges = Vec::with_capacity(n_bins + 1);
    edges.push(f64::NEG_INFINITY);
    for i in 1..n_bins {
        edges.push(percentile(&sorted, 100.0 * i as f64 / n_bins as f64));
    }
    edges.push(f64::INFINITY);
    edges
}

fn histogram(values: &[f64], edges: &[f64]) -> Vec<usize> {
    let n_bins = edges.len() - 1;
    let mut counts = vec![0usize; n_bins];
    for &v in values {
        // first bin whose (lower, upper] range takes the value; ties on an
        // inner edge go to the lower bin, matching half-open convention
        let mut idx = n_bins - 1;
        for b in 0..n_bins {
            if v <= edges[b + 1] {
                idx = b;
                break;
            }
        }
        counts[idx] += 1;
    }
    counts
}

/// PSI over an explicit or percentile-derived binning
pub fn compute_psi(reference: &[f64], current: &[f64], n_bins: usize, edges: Option<Vec<f64>>) -> PsiReport {
    if reference.is_empty() || current.is_empty() {
        return PsiReport {
            value: 0.0,
            status: PsiStatus::Green,
            bins: Vec::new(),
            n_reference: reference.len(),
            n_current: current.len(),
            data_source: DataSource::Database,
        };
    }

    let edges = edges.unwrap_or_else(|| percentile_breakpoints(reference, n_bins));
    let n_bins = edges.len() - 1;

    let ref_counts = histogram(reference, &edges);
    let cur_counts = histogram(current, &edges);

    let ref_total = reference.len() as f64 + 0.5 * n_bins as f64;
    let cur_total = current.len() as f64 + 0.5 * n_bins as f64;

    let mut psi = 0.0;
    let mut bins = Vec::with_capacity(n_bins);
    for b in 0..n_bins {
        let ref_pct = (ref_counts[b] as f64 + 0.5) / ref_total;
        let cur_pct = (cur_counts[b] as f64 + 0.5) / cur_total;
        let contribution = (cur_pct - ref_pct) * (cur_pct / ref_pct).ln();
        psi += contribution;
        bins.push(PsiBin {
            bin: b + 1,
            lower: edges[b].is_finite().then_some(edges[b]),
            upper: edges[b + 1].is_finite().then_some(edges[b + 1]),
            ref_pct,
            cur_pct,
            psi_contribution: contribution,
        });
    }

    PsiReport {
        value: psi,
        status: PsiStatus::from_value(psi),
        bins,
        n_reference: reference.len(),
        n_current: current.len(),
        data_source: DataSource::Database,
    }
}

/// Score PSI on fixed 60-point bins spanning 300-900
pub fn compute_score_psi(reference: &[f64], current: &[f64]) -> PsiReport {
    let mut edges: Vec<f64> = vec![f64::NEG_INFINITY];
    edges.extend((1..10).map(|i| 300.0 + 60.0 * i as f64));
    edges.push(f64::INFINITY);
    compute_psi(reference, current, edges.len() - 1, Some(edges))
}

/// Target PSI: two-bin Bernoulli stability of the realised bad rate
pub fn compute_target_psi(
    bad_rate_reference: f64,
    bad_rate_current: f64,
    n_reference: usize,
    n_current: usize,
) -> PsiReport {
    let clip = |p: f64| p.clamp(1e-6, 1.0 - 1e-6);
    let (ref_bad, cur_bad) = (clip(bad_rate_reference), clip(bad_rate_current));
    let (ref_good, cur_good) = (1.0 - ref_bad, 1.0 - cur_bad);

    let psi = (cur_bad - ref_bad) * (cur_bad / ref_bad).ln()
        + (cur_good - ref_good) * (cur_good / ref_good).ln();
    let psi = psi.abs();

    PsiReport {
        value: psi,
        status: PsiStatus::from_value(psi),
        bins: vec![
            PsiBin {
                bin: 1,
                lower: None,
                upper: None,
                ref_pct: ref_bad,
                cur_pct: cur_bad,
                psi_contribution: (cur_bad - ref_bad) * (cur_bad / ref_bad).ln(),
            },
            PsiBin {
                bin: 2,
                lower: None,
                upper: None,
                ref_pct: ref_good,
                cur_pct: cur_good,
                psi_contribution: (cur_good - ref_good) * (cur_good / ref_good).ln(),
            },
        ],
        n_reference,
        n_current,
        data_source: DataSource::Database,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitoring::demo::DemoSampler;

    #[test]
    fn test_psi_zero_on_identical_distributions() {
        let mut sampler = DemoSampler::new(42);
        let values = sampler.normal_vec(680.0, 80.0, 5_000, 300.0, 900.0);
        let report = compute_score_psi(&values, &values);
        assert!(report.value.abs() < 1e-9, "psi was {}", report.value);
        assert_eq!(report.status, PsiStatus::Green);
    }

    #[test]
    fn test_psi_monotone_in_location_shift() {
        let mut sampler = DemoSampler::new(42);
        let reference = sampler.normal_vec(680.0, 80.0, 5_000, 300.0, 900.0);
        let mut last_psi = 0.0;
        for shift in [10.0, 40.0, 80.0, 130.0] {
            let mut drift = DemoSampler::new(7);
            let current = drift.normal_vec(680.0 - shift, 80.0, 2_000, 300.0, 900.0);
            let report = compute_score_psi(&reference, &current);
            assert!(
                report.value > last_psi,
                "psi must grow with shift {shift}: {} <= {last_psi}",
                report.value
            );
            last_psi = report.value;
        }
    }

    #[test]
    fn test_psi_bands_match_thresholds() {
        assert_eq!(PsiStatus::from_value(0.05), PsiStatus::Green);
        assert_eq!(PsiStatus::from_value(0.15), PsiStatus::Yellow);
        assert_eq!(PsiStatus::from_value(0.25), PsiStatus::Red);
    }

    #[test]
    fn test_spec_drift_scenario() {
        // reference N(680, 80^2) vs current N(550, 100^2) must alarm red;
        // same-distribution current stays green
        let mut sampler = DemoSampler::new(42);
        let reference = sampler.normal_vec(680.0, 80.0, 5_000, 300.0, 900.0);

        let mut same = DemoSampler::new(42);
        let _ = same.normal_vec(680.0, 80.0, 5_000, 300.0, 900.0);
        let current_same = same.normal_vec(680.0, 80.0, 2_000, 300.0, 900.0);
        let green = compute_score_psi(&reference, &current_same);
        assert!(green.value < 0.05, "psi {}", green.value);
        assert_eq!(green.status, PsiStatus::Green);

        let mut shifted = DemoSampler::new(42);
        let current_shifted = shifted.normal_vec(550.0, 100.0, 2_000, 300.0, 900.0);
        let red = compute_score_psi(&reference, &current_shifted);
        assert!(red.value > 0.20, "psi {}", red.value);
        assert_eq!(red.status, PsiStatus::Red);
    }

    #[test]
    fn test_target_psi_zero_when_bad_rate_stable() {
        let report = compute_target_psi(0.072, 0.072, 1_000, 500);
        assert!(report.value.abs() < 1e-12);
        let drifted = compute_target_psi(0.072, 0.150, 1_000, 500);
        assert!(drifted.value > report.value);
    }

    #[test]
    fn test_percentile_breakpoints_cover_the_line() {
        let values: Vec<f64> = (0..100).map(|i| i as f64).collect();
        let edges = percentile_breakpoints(&values, 10);
        assert_eq!(edges.len(), 11);
        assert!(edges[0].is_infinite() && edges[0] < 0.0);
        assert!(edges[10].is_infinite() && edges[10] > 0.0);
        for pair in edges[1..10].windows(2) {
            assert!(pair[0] <= pair[1]);
        }
    }
}
