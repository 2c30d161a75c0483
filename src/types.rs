use serde::{Deserialize, Serialize};

/// One word of a reference passage or a spoken transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// Lowercased, with leading/trailing punctuation stripped. Never empty.
    pub text: String,
    /// The whitespace-delimited source substring, casing and punctuation intact.
    pub original: String,
    /// Position in the produced token sequence, not in the raw word split.
    /// Punctuation-only words are dropped, so indices stay dense and
    /// `tokens[i].index == i` always holds.
    pub index: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpKind {
    Match,
    Substitute,
    Insert,
    Delete,
}

impl OpKind {
    pub fn consumes_reference(self) -> bool {
        matches!(self, Self::Match | Self::Substitute | Self::Delete)
    }

    pub fn consumes_user(self) -> bool {
        matches!(self, Self::Match | Self::Substitute | Self::Insert)
    }
}

/// One aligned position. `ref_token` is set for match/substitute/delete,
/// `user_token` for match/substitute/insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlignmentOp {
    pub kind: OpKind,
    pub ref_token: Option<Token>,
    pub user_token: Option<Token>,
}

impl AlignmentOp {
    pub fn matched(reference: Token, user: Token) -> Self {
        Self {
            kind: OpKind::Match,
            ref_token: Some(reference),
            user_token: Some(user),
        }
    }

    pub fn substitute(reference: Token, user: Token) -> Self {
        Self {
            kind: OpKind::Substitute,
            ref_token: Some(reference),
            user_token: Some(user),
        }
    }

    pub fn delete(reference: Token) -> Self {
        Self {
            kind: OpKind::Delete,
            ref_token: Some(reference),
            user_token: None,
        }
    }

    pub fn insert(user: Token) -> Self {
        Self {
            kind: OpKind::Insert,
            ref_token: None,
            user_token: Some(user),
        }
    }
}

/// Maximal run of deleted (missing) or inserted (extra) tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Phrase {
    pub tokens: Vec<Token>,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Substitution {
    pub expected: Token,
    pub said: Token,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HesitationMarker {
    pub token: String,
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Repetition {
    pub phrase: String,
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pause {
    pub start_ms: i64,
    pub end_ms: i64,
    pub duration_ms: i64,
}

/// Word-level timing from a speech-to-text provider. Missing or null bounds
/// default to 0, which usually leaves the entry to be skipped as malformed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordTimestamp {
    pub word: String,
    #[serde(default, deserialize_with = "null_as_zero")]
    pub start_ms: i64,
    #[serde(default, deserialize_with = "null_as_zero")]
    pub end_ms: i64,
}

fn null_as_zero<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Option::<i64>::deserialize(deserializer).map(Option::unwrap_or_default)
}

impl WordTimestamp {
    pub fn new(word: impl Into<String>, start_ms: i64, end_ms: i64) -> Self {
        Self {
            word: word.into(),
            start_ms,
            end_ms,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnalysisInput {
    pub reference_text: String,
    pub user_transcript: String,
    pub word_timestamps: Option<Vec<WordTimestamp>>,
}

impl AnalysisInput {
    pub fn new(reference_text: impl Into<String>, user_transcript: impl Into<String>) -> Self {
        Self {
            reference_text: reference_text.into(),
            user_transcript: user_transcript.into(),
            word_timestamps: None,
        }
    }

    pub fn with_timestamps(mut self, word_timestamps: Vec<WordTimestamp>) -> Self {
        self.word_timestamps = Some(word_timestamps);
        self
    }
}

/// JSON request shape. `silence_threshold_ms` overrides the analyzer config when set.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRequest {
    pub reference_text: String,
    pub user_transcript: String,
    #[serde(default)]
    pub word_timestamps: Option<Vec<WordTimestamp>>,
    #[serde(default)]
    pub silence_threshold_ms: Option<i64>,
}

impl From<AnalysisRequest> for AnalysisInput {
    fn from(request: AnalysisRequest) -> Self {
        Self {
            reference_text: request.reference_text,
            user_transcript: request.user_transcript,
            word_timestamps: request.word_timestamps,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubstitutionEntry {
    pub expected: String,
    pub said: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlignmentReport {
    pub missing_phrases: Vec<String>,
    pub extra_phrases: Vec<String>,
    pub substitutions: Vec<SubstitutionEntry>,
}

/// Tempo derived from word timestamps.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeechTempo {
    pub spoken_duration_ms: i64,
    pub words_per_minute: f64,
    pub reading_speed_cps: f64,
    /// Long-pause time over spoken duration, in [0, 1].
    pub pause_ratio: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FluencyReport {
    pub hesitation_markers: Vec<HesitationMarker>,
    pub repetitions: Vec<Repetition>,
    pub long_pauses: Vec<Pause>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tempo: Option<SpeechTempo>,
}

impl FluencyReport {
    pub fn hesitation_total(&self) -> u32 {
        self.hesitation_markers.iter().map(|marker| marker.count).sum()
    }

    pub fn repetition_total(&self) -> u32 {
        self.repetitions.iter().map(|repetition| repetition.count).sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct OpCounts {
    pub matches: u32,
    pub substitutions: u32,
    pub insertions: u32,
    pub deletions: u32,
}

impl OpCounts {
    pub fn from_ops(ops: &[AlignmentOp]) -> Self {
        let mut counts = Self::default();
        for op in ops {
            match op.kind {
                OpKind::Match => counts.matches += 1,
                OpKind::Substitute => counts.substitutions += 1,
                OpKind::Insert => counts.insertions += 1,
                OpKind::Delete => counts.deletions += 1,
            }
        }
        counts
    }

    pub fn errors(&self) -> u32 {
        self.substitutions + self.insertions + self.deletions
    }

    pub fn reference_len(&self) -> u32 {
        self.matches + self.substitutions + self.deletions
    }

    pub fn user_len(&self) -> u32 {
        self.matches + self.substitutions + self.insertions
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Metrics {
    /// (insertions + deletions + substitutions) / max(reference length, 1), clamped to [0, 1].
    pub word_error_rate_estimate: f64,
    /// matches / max(reference length, 1), clamped to [0, 1].
    pub coverage_ratio: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResult {
    pub alignment: AlignmentReport,
    pub fluency: FluencyReport,
    pub metrics: Metrics,
    pub counts: OpCounts,
    pub summary: Vec<String>,
}
