use crate::alignment::tokenization::{join_text, normalize_word};
use crate::config::AnalysisConfig;
use crate::types::{
    FluencyReport, HesitationMarker, Pause, Repetition, SpeechTempo, Token, WordTimestamp,
};

/// Normalized hesitation vocabulary and repetition limits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FluencyRules {
    /// Each entry is a normalized word sequence, longest first.
    vocabulary: Vec<Vec<String>>,
    max_repetition_phrase_len: usize,
}

impl FluencyRules {
    pub fn new(vocabulary: &[String], max_repetition_phrase_len: usize) -> Self {
        let mut entries: Vec<Vec<String>> = Vec::with_capacity(vocabulary.len());
        for entry in vocabulary {
            let words: Vec<String> = entry
                .split_whitespace()
                .map(normalize_word)
                .filter(|w| !w.is_empty())
                .collect();
            if !words.is_empty() && !entries.contains(&words) {
                entries.push(words);
            }
        }
        // Stable sort keeps configured order among equal lengths.
        entries.sort_by(|a, b| b.len().cmp(&a.len()));
        Self {
            vocabulary: entries,
            max_repetition_phrase_len: max_repetition_phrase_len.max(1),
        }
    }

    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self::new(
            &config.hesitation_vocabulary,
            config.max_repetition_phrase_len,
        )
    }

    pub fn analyze(
        &self,
        user: &[Token],
        timestamps: Option<&[WordTimestamp]>,
        silence_threshold_ms: u64,
    ) -> FluencyReport {
        let hesitation_markers = self.detect_hesitations(user);
        let repetitions = detect_repetitions(user, self.max_repetition_phrase_len);
        let (long_pauses, tempo) = match timestamps {
            Some(timestamps) => {
                let valid = sanitize_timestamps(timestamps);
                let pauses = detect_pauses(&valid, silence_threshold_ms);
                let tempo = compute_tempo(&valid, user, &pauses);
                (pauses, tempo)
            }
            None => (Vec::new(), None),
        };

        tracing::debug!(
            hesitations = hesitation_markers.len(),
            repetitions = repetitions.len(),
            long_pauses = long_pauses.len(),
            "fluency: analysis complete"
        );
        FluencyReport {
            hesitation_markers,
            repetitions,
            long_pauses,
            tempo,
        }
    }

    /// Counts vocabulary hits in the user sequence. Multi-word entries are
    /// tried first and consume their tokens. Output follows first occurrence.
    pub fn detect_hesitations(&self, user: &[Token]) -> Vec<HesitationMarker> {
        let mut markers: Vec<HesitationMarker> = Vec::new();
        let mut i = 0;
        while i < user.len() {
            let hit = self.vocabulary.iter().find(|entry| {
                i + entry.len() <= user.len()
                    && entry
                        .iter()
                        .zip(&user[i..i + entry.len()])
                        .all(|(word, token)| *word == token.text)
            });
            let Some(entry) = hit else {
                i += 1;
                continue;
            };

            let key = entry.join(" ");
            match markers.iter_mut().find(|m| m.token == key) {
                Some(marker) => marker.count += 1,
                None => markers.push(HesitationMarker {
                    token: key,
                    count: 1,
                }),
            }
            i += entry.len();
        }
        markers
    }
}

impl Default for FluencyRules {
    fn default() -> Self {
        Self::from_config(&AnalysisConfig::default())
    }
}

/// Back-to-back repeats of 1..=`max_phrase_len` token phrases.
///
/// At each position the shortest repeating phrase wins; `count` is the number
/// of extra copies, so "the the" counts 1. The last copy of a run stays in play
/// as the possible start of the next run.
pub fn detect_repetitions(user: &[Token], max_phrase_len: usize) -> Vec<Repetition> {
    let mut repetitions: Vec<Repetition> = Vec::new();
    let n = user.len();
    let mut i = 0;
    while i < n {
        let repeat = (1..=max_phrase_len)
            .take_while(|&len| i + 2 * len <= n)
            .find(|&len| same_text(&user[i..i + len], &user[i + len..i + 2 * len]));
        let Some(len) = repeat else {
            i += 1;
            continue;
        };

        let mut extra_copies = 1usize;
        while i + (extra_copies + 2) * len <= n
            && same_text(
                &user[i..i + len],
                &user[i + (extra_copies + 1) * len..i + (extra_copies + 2) * len],
            )
        {
            extra_copies += 1;
        }

        let phrase = join_text(&user[i..i + len]);
        let count = u32::try_from(extra_copies).unwrap_or(u32::MAX);
        match repetitions.iter_mut().find(|r| r.phrase == phrase) {
            Some(existing) => existing.count = existing.count.saturating_add(count),
            None => repetitions.push(Repetition { phrase, count }),
        }
        i += extra_copies * len;
    }
    repetitions
}

fn same_text(a: &[Token], b: &[Token]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.text == y.text)
}

/// Drops entries with `end_ms < start_ms` or with a start earlier than the
/// previously kept entry.
pub fn sanitize_timestamps(timestamps: &[WordTimestamp]) -> Vec<WordTimestamp> {
    let mut kept: Vec<WordTimestamp> = Vec::with_capacity(timestamps.len());
    for (idx, ts) in timestamps.iter().enumerate() {
        if ts.end_ms < ts.start_ms {
            tracing::warn!(
                index = idx,
                word = ts.word.as_str(),
                start_ms = ts.start_ms,
                end_ms = ts.end_ms,
                "fluency: skipping timestamp with negative duration"
            );
            continue;
        }
        if kept.last().is_some_and(|prev| ts.start_ms < prev.start_ms) {
            tracing::warn!(
                index = idx,
                word = ts.word.as_str(),
                start_ms = ts.start_ms,
                "fluency: skipping out-of-order timestamp"
            );
            continue;
        }
        kept.push(ts.clone());
    }
    kept
}

/// Gaps strictly longer than the threshold between consecutive (sanitized) words.
pub fn detect_pauses(timestamps: &[WordTimestamp], silence_threshold_ms: u64) -> Vec<Pause> {
    let threshold = i64::try_from(silence_threshold_ms).unwrap_or(i64::MAX);
    timestamps
        .windows(2)
        .filter_map(|pair| {
            let (current, next) = (&pair[0], &pair[1]);
            let gap = next.start_ms.saturating_sub(current.end_ms);
            (gap > threshold).then(|| {
                tracing::debug!(
                    after_word = current.word.as_str(),
                    before_word = next.word.as_str(),
                    gap_ms = gap,
                    "fluency: long pause"
                );
                Pause {
                    start_ms: current.end_ms,
                    end_ms: next.start_ms,
                    duration_ms: gap,
                }
            })
        })
        .collect()
}

/// `None` when no sanitized timestamp spans a positive duration.
pub fn compute_tempo(
    timestamps: &[WordTimestamp],
    user: &[Token],
    pauses: &[Pause],
) -> Option<SpeechTempo> {
    let first_start = timestamps.first()?.start_ms;
    let last_end = timestamps.iter().map(|ts| ts.end_ms).max()?;
    let spoken_duration_ms = last_end.saturating_sub(first_start);
    if spoken_duration_ms <= 0 {
        return None;
    }

    let seconds = spoken_duration_ms as f64 / 1000.0;
    let minutes = seconds / 60.0;
    let char_count = user
        .iter()
        .flat_map(|token| token.text.chars())
        .filter(|c| c.is_alphanumeric())
        .count();
    let pause_ms: i64 = pauses.iter().map(|p| p.duration_ms).sum();

    Some(SpeechTempo {
        spoken_duration_ms,
        words_per_minute: round_to(timestamps.len() as f64 / minutes, 2),
        reading_speed_cps: round_to(char_count as f64 / seconds, 3),
        pause_ratio: round_to((pause_ms as f64 / spoken_duration_ms as f64).clamp(0.0, 1.0), 3),
    })
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}
