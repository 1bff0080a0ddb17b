//! Calibration metrics: Expected Calibration Error and Brier score.
//!
//! ECE = sum over probability bins of (|B_k| / n) * |accuracy_k -
//! confidence_k|; Brier = mean squared error of the predicted
//! probabilities. Pass thresholds: ECE <= 0.02, Brier <= 0.07.

use credit_api::domain::{CalibrationReport, DataSource, ReliabilityBin};

/// ECE and Brier over predicted probabilities vs realised outcomes,
/// equal-width bins on [0, 1]
pub fn compute_calibration(y_true: &[f64], y_prob: &[f64], n_bins: usize) -> CalibrationReport {
    let n = y_true.len().min(y_prob.len());
    if n == 0 || n_bins == 0 {
        return CalibrationReport {
            ece: 0.0,
            brier_score: 0.0,
            ece_status: CalibrationReport::status_for(0.0),
            n_bins,
            n_samples: 0,
            reliability_diagram: Vec::new(),
            data_source: DataSource::Database,
        };
    }

    let brier = y_true
        .iter()
        .zip(y_prob.iter())
        .take(n)
        .map(|(y, p)| (p - y) * (p - y))
        .sum::<f64>()
        / n as f64;

    let bin_of = |p: f64| ((p.clamp(0.0, 1.0) * n_bins as f64) as usize).min(n_bins - 1);

    let mut sum_prob = vec![0.0; n_bins];
    let mut sum_true = vec![0.0; n_bins];
    let mut counts = vec![0usize; n_bins];
    for i in 0..n {
        let b = bin_of(y_prob[i]);
        sum_prob[b] += y_prob[i];
        sum_true[b] += y_true[i];
        counts[b] += 1;
    }

    let mut ece = 0.0;
    let mut reliability_diagram = Vec::with_capacity(n_bins);
    for b in 0..n_bins {
        let lower = b as f64 / n_bins as f64;
        let upper = (b + 1) as f64 / n_bins as f64;
        if counts[b] == 0 {
            reliability_diagram.push(ReliabilityBin {
                bin: b + 1,
                lower,
                upper,
                mean_predicted_prob: None,
                fraction_of_positives: None,
                n_samples: 0,
                calibration_gap: None,
            });
            continue;
        }
        let confidence = sum_prob[b] / counts[b] as f64;
        let accuracy = sum_true[b] / counts[b] as f64;
        let gap = (confidence - accuracy).abs();
        ece += counts[b] as f64 / n as f64 * gap;
        reliability_diagram.push(ReliabilityBin {
            bin: b + 1,
            lower,
            upper,
            mean_predicted_prob: Some(confidence),
            fraction_of_positives: Some(accuracy),
            n_samples: counts[b],
            calibration_gap: Some(gap),
        });
    }

    CalibrationReport {
        ece,
        brier_score: brier,
        ece_status: CalibrationReport::status_for(ece),
        n_bins,
        n_samples: n,
        reliability_diagram,
        data_source: DataSource::Database,
    }
}
