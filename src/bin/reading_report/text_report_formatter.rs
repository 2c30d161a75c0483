use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use voxidria_reading::alignment::report::MetricDistribution;
use voxidria_reading::Report;

pub fn render_report(report: &Report) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "reading report v{} generated {} ({} case(s), silence threshold {} ms)",
        report.schema_version,
        report.meta.generated_at,
        report.meta.case_count,
        report.meta.silence_threshold_ms
    );

    for case in &report.cases {
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "[{}] coverage {:.2} wer {:.2}",
            case.id, case.metrics.coverage_ratio, case.metrics.word_error_rate_estimate
        );
        for line in &case.summary {
            let _ = writeln!(out, "  - {line}");
        }
        if !case.notes.is_empty() {
            let _ = writeln!(out, "  notes: {}", case.notes.join(", "));
        }
    }

    let aggregates = &report.aggregates;
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "aggregate: {} case(s), {} with timestamps, {} low coverage",
        aggregates.counts.total, aggregates.counts.with_timestamps, aggregates.counts.low_coverage
    );
    write_distribution(&mut out, "wer", aggregates.global.word_error_rate_estimate.as_ref());
    write_distribution(&mut out, "coverage", aggregates.global.coverage_ratio.as_ref());
    write_distribution(
        &mut out,
        "hesitations/100w",
        aggregates.global.hesitations_per_100_words.as_ref(),
    );
    write_distribution(&mut out, "wpm", aggregates.global.words_per_minute.as_ref());
    write_distribution(&mut out, "pause ratio", aggregates.global.pause_ratio.as_ref());
    out
}

fn write_distribution(out: &mut String, label: &str, distribution: Option<&MetricDistribution>) {
    let Some(d) = distribution else {
        return;
    };
    let _ = writeln!(
        out,
        "  {label:<18} mean {:.3} p50 {:.3} p90 {:.3} p95 {:.3} p99 {:.3}",
        d.mean, d.p50, d.p90, d.p95, d.p99
    );
}

pub fn write_report(path: &Path, rendered: &str) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|err| {
            format!(
                "Failed to create report output directory '{}': {err}",
                parent.display()
            )
        })?;
    }
    fs::write(path, rendered)
        .map_err(|err| format!("Failed to write report file '{}': {err}", path.display()))
}
