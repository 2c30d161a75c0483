use crate::types::{AlignmentOp, Metrics, OpCounts};

/// Word-error-rate estimate and coverage ratio against the reference length.
///
/// Both the numerator and denominator follow the reading task's scoring rule:
/// insertions count as errors but the denominator is the reference length
/// only, so the raw ratio can exceed 1 before clamping.
pub fn compute_metrics(ops: &[AlignmentOp], reference_len: usize) -> Metrics {
    metrics_from_counts(&OpCounts::from_ops(ops), reference_len)
}

pub fn metrics_from_counts(counts: &OpCounts, reference_len: usize) -> Metrics {
    let denom = reference_len.max(1) as f64;
    Metrics {
        word_error_rate_estimate: ratio(counts.errors(), denom),
        coverage_ratio: ratio(counts.matches, denom),
    }
}

fn ratio(count: u32, denom: f64) -> f64 {
    (count as f64 / denom).clamp(0.0, 1.0)
}
