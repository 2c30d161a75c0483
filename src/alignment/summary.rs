use crate::types::{FluencyReport, Metrics, OpCounts};

/// Three to five plain-language bullets built from computed fields only.
///
/// Always: coverage, accuracy, hesitations. Repetitions only when present.
/// Pauses only when the caller supplied timestamps.
pub fn build_summary(
    metrics: &Metrics,
    counts: &OpCounts,
    fluency: &FluencyReport,
    reference_len: usize,
    timestamps_supplied: bool,
    silence_threshold_ms: u64,
) -> Vec<String> {
    let mut bullets = Vec::with_capacity(5);

    if reference_len == 0 {
        bullets.push("The passage was empty, so coverage could not be measured.".to_string());
    } else {
        bullets.push(format!(
            "The reader covered {:.0}% of the passage ({} of {} word(s) read as written).",
            metrics.coverage_ratio * 100.0,
            counts.matches,
            reference_len
        ));
    }

    if counts.errors() == 0 {
        bullets.push("No missing, extra, or substituted words were detected.".to_string());
    } else {
        bullets.push(format!(
            "{} word(s) were missed, {} extra word(s) were added, and {} word(s) were substituted (estimated word error rate {:.0}%).",
            counts.deletions,
            counts.insertions,
            counts.substitutions,
            metrics.word_error_rate_estimate * 100.0
        ));
    }

    let hesitation_total = fluency.hesitation_total();
    if hesitation_total == 0 {
        bullets.push("No hesitation markers were detected.".to_string());
    } else {
        let listed = fluency
            .hesitation_markers
            .iter()
            .map(|m| format!("\"{}\" x{}", m.token, m.count))
            .collect::<Vec<_>>()
            .join(", ");
        bullets.push(format!(
            "{hesitation_total} hesitation marker(s) were detected: {listed}."
        ));
    }

    if !fluency.repetitions.is_empty() {
        let listed = fluency
            .repetitions
            .iter()
            .map(|r| format!("\"{}\" x{}", r.phrase, r.count))
            .collect::<Vec<_>>()
            .join(", ");
        bullets.push(format!(
            "{} repetition(s) were detected: {listed}.",
            fluency.repetition_total()
        ));
    }

    if timestamps_supplied {
        if fluency.long_pauses.is_empty() {
            bullets.push(format!(
                "No pauses longer than {silence_threshold_ms} ms were detected."
            ));
        } else {
            let longest = fluency
                .long_pauses
                .iter()
                .map(|p| p.duration_ms)
                .max()
                .unwrap_or(0);
            bullets.push(format!(
                "{} pause(s) longer than {silence_threshold_ms} ms were detected (longest {longest} ms).",
                fluency.long_pauses.len()
            ));
        }
    }

    debug_assert!((3..=5).contains(&bullets.len()), "summary bullet count");
    bullets
}
