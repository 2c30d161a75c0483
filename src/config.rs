use std::path::Path;

use serde::Deserialize;

use crate::error::AnalysisError;

pub const DEFAULT_HESITATION_VOCABULARY: [&str; 9] = [
    "um", "uh", "ah", "er", "hmm", "uh-huh", "like", "so", "you know",
];

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalysisConfig {
    /// Gaps strictly longer than this between adjacent words are long pauses.
    pub silence_threshold_ms: u64,
    /// Single words or space-separated phrases counted as hesitation markers.
    pub hesitation_vocabulary: Vec<String>,
    pub max_repetition_phrase_len: usize,
}

impl AnalysisConfig {
    pub const DEFAULT_SILENCE_THRESHOLD_MS: u64 = 700;
    pub const DEFAULT_MAX_REPETITION_PHRASE_LEN: usize = 3;

    pub fn load(path: &Path) -> Result<Self, AnalysisError> {
        let data = std::fs::read_to_string(path)
            .map_err(|e| AnalysisError::io("read analysis config", e))?;
        let config: Self = serde_json::from_str(&data)
            .map_err(|e| AnalysisError::json("parse analysis config", e))?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_silence_threshold_ms(mut self, silence_threshold_ms: u64) -> Self {
        self.silence_threshold_ms = silence_threshold_ms;
        self
    }

    pub fn validate(&self) -> Result<(), AnalysisError> {
        if self.max_repetition_phrase_len == 0 {
            return Err(AnalysisError::invalid_argument(
                "max_repetition_phrase_len must be >= 1",
            ));
        }
        if let Some(entry) = self
            .hesitation_vocabulary
            .iter()
            .find(|entry| entry.trim().is_empty())
        {
            return Err(AnalysisError::invalid_argument(format!(
                "hesitation vocabulary entry {entry:?} is blank"
            )));
        }
        Ok(())
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            silence_threshold_ms: Self::DEFAULT_SILENCE_THRESHOLD_MS,
            hesitation_vocabulary: DEFAULT_HESITATION_VOCABULARY
                .iter()
                .map(|entry| entry.to_string())
                .collect(),
            max_repetition_phrase_len: Self::DEFAULT_MAX_REPETITION_PHRASE_LEN,
        }
    }
}

/// Converts a caller-supplied threshold, rejecting negative values.
pub fn silence_threshold_from_i64(silence_threshold_ms: i64) -> Result<u64, AnalysisError> {
    u64::try_from(silence_threshold_ms).map_err(|_| {
        AnalysisError::invalid_argument(format!(
            "silence threshold must be non-negative, got {silence_threshold_ms} ms"
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn analysis_config_default() {
        let config = AnalysisConfig::default();
        assert_eq!(config.silence_threshold_ms, 700);
        assert_eq!(config.max_repetition_phrase_len, 3);
        assert_eq!(config.hesitation_vocabulary.len(), 9);
        assert!(config.hesitation_vocabulary.iter().any(|e| e == "you know"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_json_keeps_field_defaults() {
        let config: AnalysisConfig =
            serde_json::from_str(r#"{ "silenceThresholdMs": 500 }"#).expect("valid config json");
        assert_eq!(config.silence_threshold_ms, 500);
        assert_eq!(config.max_repetition_phrase_len, 3);
        assert_eq!(
            config.hesitation_vocabulary,
            AnalysisConfig::default().hesitation_vocabulary
        );
    }

    #[test]
    fn zero_repetition_len_is_invalid() {
        let config = AnalysisConfig {
            max_repetition_phrase_len: 0,
            ..AnalysisConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn blank_vocabulary_entry_is_invalid() {
        let config = AnalysisConfig {
            hesitation_vocabulary: vec!["um".to_string(), "  ".to_string()],
            ..AnalysisConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn negative_threshold_is_rejected() {
        assert_eq!(silence_threshold_from_i64(700).unwrap(), 700);
        assert!(silence_threshold_from_i64(-1).unwrap_err().is_invalid_argument());
    }

    #[test]
    fn load_reads_json_file() {
        let path = std::env::temp_dir().join("voxidria_reading_config_load.json");
        std::fs::write(
            &path,
            r#"{ "hesitationVocabulary": ["um", "erm"], "maxRepetitionPhraseLen": 2 }"#,
        )
        .expect("write config");
        let config = AnalysisConfig::load(&path).expect("load config");
        assert_eq!(config.hesitation_vocabulary, ["um", "erm"]);
        assert_eq!(config.max_repetition_phrase_len, 2);
        assert_eq!(config.silence_threshold_ms, 700);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn load_fails_on_missing_file() {
        let result = AnalysisConfig::load(Path::new("/nonexistent/analysis.json"));
        assert!(matches!(result, Err(AnalysisError::Io { .. })));
    }
}
