use std::cmp::Ordering;

use serde::Serialize;

use crate::error::AnalysisError;
use crate::types::{AnalysisResult, Metrics};

const OUTLIER_TOP_N: usize = 20;
const LOW_COVERAGE_THRESHOLD: f64 = 0.8;

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub schema_version: u32,
    pub meta: Meta,
    pub cases: Vec<CaseReport>,
    pub aggregates: AggregateReport,
}

#[derive(Debug, Clone, Serialize)]
pub struct Meta {
    pub generated_at: String,
    pub config_path: Option<String>,
    pub silence_threshold_ms: u64,
    pub case_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct CaseReport {
    pub id: String,
    pub has_timestamps: bool,
    pub reference_word_count: u32,
    pub transcript_word_count: u32,
    pub counts: CaseCounts,
    pub metrics: Metrics,
    pub hesitations_per_100_words: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub words_per_minute: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pause_ratio: Option<f32>,
    pub summary: Vec<String>,
    pub notes: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CaseCounts {
    pub missing_phrases: u32,
    pub extra_phrases: u32,
    pub substitutions: u32,
    pub hesitations: u32,
    pub repetitions: u32,
    pub long_pauses: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct AggregateReport {
    pub counts: AggregateCounts,
    pub global: AggregateMetrics,
    pub outliers: OutlierReport,
}

#[derive(Debug, Clone, Serialize)]
pub struct AggregateCounts {
    pub total: u32,
    pub with_timestamps: u32,
    pub without_timestamps: u32,
    pub low_coverage: u32,
}

#[derive(Debug, Clone, Serialize, Default)]
pub struct AggregateMetrics {
    pub word_error_rate_estimate: Option<MetricDistribution>,
    pub coverage_ratio: Option<MetricDistribution>,
    pub hesitations_per_100_words: Option<MetricDistribution>,
    pub words_per_minute: Option<MetricDistribution>,
    pub pause_ratio: Option<MetricDistribution>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricDistribution {
    pub mean: f32,
    pub p50: f32,
    pub p90: f32,
    pub p95: f32,
    pub p99: f32,
}

#[derive(Debug, Clone, Serialize)]
pub struct OutlierReport {
    pub worst_word_error_rate: Vec<OutlierEntry>,
    pub lowest_coverage: Vec<OutlierEntry>,
    pub most_hesitations_per_100_words: Option<Vec<OutlierEntry>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OutlierEntry {
    pub id: String,
    pub value: f32,
}

pub fn compute_case_report(
    id: &str,
    result: &AnalysisResult,
    has_timestamps: bool,
) -> Result<CaseReport, AnalysisError> {
    let mut notes = Vec::new();
    let reference_word_count = result.counts.reference_len();
    let transcript_word_count = result.counts.user_len();

    if reference_word_count == 0 {
        notes.push("reference_empty".to_string());
    }
    if transcript_word_count == 0 {
        notes.push("transcript_empty".to_string());
    }
    if !has_timestamps {
        notes.push("timestamps_missing".to_string());
    } else if result.fluency.tempo.is_none() {
        notes.push("tempo_unavailable".to_string());
    }
    if result.metrics.coverage_ratio < LOW_COVERAGE_THRESHOLD && reference_word_count > 0 {
        notes.push(format!(
            "low_coverage={:.2}",
            result.metrics.coverage_ratio
        ));
    }

    let hesitations = result.fluency.hesitation_total();
    let hesitations_per_100_words = if transcript_word_count == 0 {
        0.0
    } else {
        hesitations as f64 * 100.0 / transcript_word_count as f64
    };
    let tempo = result.fluency.tempo.as_ref();

    Ok(CaseReport {
        id: id.to_string(),
        has_timestamps,
        reference_word_count,
        transcript_word_count,
        counts: CaseCounts {
            missing_phrases: to_u32(result.alignment.missing_phrases.len()),
            extra_phrases: to_u32(result.alignment.extra_phrases.len()),
            substitutions: to_u32(result.alignment.substitutions.len()),
            hesitations,
            repetitions: result.fluency.repetition_total(),
            long_pauses: to_u32(result.fluency.long_pauses.len()),
        },
        metrics: result.metrics,
        hesitations_per_100_words: checked_f32(
            hesitations_per_100_words,
            "case.hesitations_per_100_words",
        )?,
        words_per_minute: tempo
            .map(|t| checked_f32(t.words_per_minute, "case.words_per_minute"))
            .transpose()?,
        pause_ratio: tempo
            .map(|t| checked_f32(t.pause_ratio, "case.pause_ratio"))
            .transpose()?,
        summary: result.summary.clone(),
        notes,
    })
}

pub fn aggregate_reports(cases: &[CaseReport]) -> AggregateReport {
    let with_timestamps = cases.iter().filter(|case| case.has_timestamps).count();
    let low_coverage = cases
        .iter()
        .filter(|case| {
            case.reference_word_count > 0 && case.metrics.coverage_ratio < LOW_COVERAGE_THRESHOLD
        })
        .count();

    AggregateReport {
        counts: AggregateCounts {
            total: to_u32(cases.len()),
            with_timestamps: to_u32(with_timestamps),
            without_timestamps: to_u32(cases.len() - with_timestamps),
            low_coverage: to_u32(low_coverage),
        },
        global: aggregate_metrics(cases),
        outliers: build_outliers(cases, OUTLIER_TOP_N),
    }
}

fn aggregate_metrics(cases: &[CaseReport]) -> AggregateMetrics {
    let mut word_error_rate = Vec::with_capacity(cases.len());
    let mut coverage = Vec::with_capacity(cases.len());
    let mut hesitations = Vec::with_capacity(cases.len());
    let mut words_per_minute = Vec::new();
    let mut pause_ratio = Vec::new();

    for case in cases {
        word_error_rate.push(case.metrics.word_error_rate_estimate);
        coverage.push(case.metrics.coverage_ratio);
        hesitations.push(case.hesitations_per_100_words as f64);
        if let Some(value) = case.words_per_minute {
            words_per_minute.push(value as f64);
        }
        if let Some(value) = case.pause_ratio {
            pause_ratio.push(value as f64);
        }
    }

    AggregateMetrics {
        word_error_rate_estimate: distribution_or_none(&word_error_rate),
        coverage_ratio: distribution_or_none(&coverage),
        hesitations_per_100_words: distribution_or_none(&hesitations),
        words_per_minute: distribution_or_none(&words_per_minute),
        pause_ratio: distribution_or_none(&pause_ratio),
    }
}

fn build_outliers(cases: &[CaseReport], top_n: usize) -> OutlierReport {
    let worst_word_error_rate = ranked_outliers(cases, top_n, |case| {
        Some(case.metrics.word_error_rate_estimate)
    });
    // Negated so the shared descending ranking puts the lowest coverage first.
    let lowest_coverage = ranked_outliers(cases, top_n, |case| {
        (case.reference_word_count > 0).then_some(-case.metrics.coverage_ratio)
    })
    .into_iter()
    .map(|entry| OutlierEntry {
        id: entry.id,
        value: -entry.value,
    })
    .collect();
    let most_hesitations_per_100_words = {
        let values = ranked_outliers(cases, top_n, |case| {
            (case.hesitations_per_100_words > 0.0).then_some(case.hesitations_per_100_words as f64)
        });
        (!values.is_empty()).then_some(values)
    };

    OutlierReport {
        worst_word_error_rate,
        lowest_coverage,
        most_hesitations_per_100_words,
    }
}

fn ranked_outliers(
    cases: &[CaseReport],
    top_n: usize,
    metric: impl Fn(&CaseReport) -> Option<f64>,
) -> Vec<OutlierEntry> {
    let mut entries: Vec<OutlierEntry> = cases
        .iter()
        .filter_map(|case| {
            metric(case).map(|value| OutlierEntry {
                id: case.id.clone(),
                value: value as f32,
            })
        })
        .collect();

    entries.sort_by(|a, b| {
        b.value
            .partial_cmp(&a.value)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.id.cmp(&b.id))
    });
    entries.truncate(top_n);
    entries
}

fn distribution_or_none(values: &[f64]) -> Option<MetricDistribution> {
    if values.is_empty() {
        return None;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));

    Some(MetricDistribution {
        mean: checked_f32(mean(&sorted), "aggregate.mean").ok()?,
        p50: checked_f32(percentile_sorted(&sorted, 0.5), "aggregate.p50").ok()?,
        p90: checked_f32(percentile_sorted(&sorted, 0.9), "aggregate.p90").ok()?,
        p95: checked_f32(percentile_sorted(&sorted, 0.95), "aggregate.p95").ok()?,
        p99: checked_f32(percentile_sorted(&sorted, 0.99), "aggregate.p99").ok()?,
    })
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

fn percentile_sorted(sorted_values: &[f64], percentile: f64) -> f64 {
    if sorted_values.is_empty() {
        return 0.0;
    }
    if sorted_values.len() == 1 {
        return sorted_values[0];
    }

    let clamped = percentile.clamp(0.0, 1.0);
    let max_index = (sorted_values.len() - 1) as f64;
    let rank = clamped * max_index;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    if lower == upper {
        sorted_values[lower]
    } else {
        let weight = rank - lower as f64;
        sorted_values[lower] * (1.0 - weight) + sorted_values[upper] * weight
    }
}

fn to_u32(value: usize) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

fn checked_f32(value: f64, metric_name: &str) -> Result<f32, AnalysisError> {
    if !value.is_finite() {
        return Err(AnalysisError::invalid_argument(format!(
            "metric '{metric_name}' produced non-finite value: {value}"
        )));
    }
    if value < f32::MIN as f64 || value > f32::MAX as f64 {
        return Err(AnalysisError::invalid_argument(format!(
            "metric '{metric_name}' out of f32 range: {value}"
        )));
    }
    Ok(value as f32)
}
