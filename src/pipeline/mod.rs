use crate::config::{silence_threshold_from_i64, AnalysisConfig};
use crate::error::AnalysisError;
use crate::types::{AnalysisInput, AnalysisRequest, AnalysisResult, WordTimestamp};

pub mod builder;
pub mod defaults;
pub mod runtime;
pub mod traits;

use builder::ReadingAnalyzerBuilder;

/// One-shot analysis with the default stages and vocabulary.
pub fn analyze_reading(
    reference_text: &str,
    user_transcript: &str,
    word_timestamps: Option<&[WordTimestamp]>,
    silence_threshold_ms: i64,
) -> Result<AnalysisResult, AnalysisError> {
    let silence_threshold_ms = silence_threshold_from_i64(silence_threshold_ms)?;
    let analyzer = ReadingAnalyzerBuilder::new(
        AnalysisConfig::default().with_silence_threshold_ms(silence_threshold_ms),
    )
    .build()?;
    let input = AnalysisInput {
        reference_text: reference_text.to_string(),
        user_transcript: user_transcript.to_string(),
        word_timestamps: word_timestamps.map(<[WordTimestamp]>::to_vec),
    };
    analyzer.analyze(&input)
}

/// Parses a camelCase JSON request and analyzes it with `config`.
///
/// Missing, null or non-string text fields are reported as invalid arguments.
pub fn analyze_request_json(
    json: &str,
    config: &AnalysisConfig,
) -> Result<AnalysisResult, AnalysisError> {
    let request: AnalysisRequest = serde_json::from_str(json)
        .map_err(|e| AnalysisError::invalid_argument(format!("malformed analysis request: {e}")))?;
    let threshold = match request.silence_threshold_ms {
        Some(value) => silence_threshold_from_i64(value)?,
        None => config.silence_threshold_ms,
    };
    let analyzer = ReadingAnalyzerBuilder::new(config.clone()).build()?;
    analyzer.analyze_with_threshold(&AnalysisInput::from(request), threshold)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_threshold_is_invalid() {
        let err = analyze_reading("a", "a", None, -5).unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn json_request_round_trip() {
        let json = r#"{
            "referenceText": "a b",
            "userTranscript": "a c",
            "wordTimestamps": [
                {"word": "a", "endMs": 1000},
                {"word": "c", "startMs": 2100, "endMs": 2400}
            ]
        }"#;
        let result = analyze_request_json(json, &AnalysisConfig::default()).expect("analyze");
        assert_eq!(result.alignment.substitutions[0].expected, "b");
        assert_eq!(result.fluency.long_pauses[0].duration_ms, 1100);
    }

    #[test]
    fn json_request_threshold_overrides_config() {
        let json = r#"{
            "referenceText": "a b",
            "userTranscript": "a b",
            "wordTimestamps": [
                {"word": "a", "startMs": 0, "endMs": 100},
                {"word": "b", "startMs": 400, "endMs": 500}
            ],
            "silenceThresholdMs": 200
        }"#;
        let result = analyze_request_json(json, &AnalysisConfig::default()).expect("analyze");
        assert_eq!(result.fluency.long_pauses.len(), 1);
    }

    #[test]
    fn null_timestamp_bound_is_skipped_not_rejected() {
        let json = r#"{
            "referenceText": "a b c",
            "userTranscript": "a b c",
            "wordTimestamps": [
                {"word": "a", "startMs": null, "endMs": 100},
                {"word": "b", "startMs": 900, "endMs": null},
                {"word": "c", "startMs": 1000, "endMs": 1200}
            ]
        }"#;
        let result = analyze_request_json(json, &AnalysisConfig::default()).expect("analyze");
        assert_eq!(result.fluency.long_pauses.len(), 1);
        assert_eq!(result.fluency.long_pauses[0].start_ms, 100);
        assert_eq!(result.fluency.long_pauses[0].duration_ms, 900);
    }

    #[test]
    fn null_or_non_string_fields_are_invalid_arguments() {
        let config = AnalysisConfig::default();
        for json in [
            r#"{"referenceText": null, "userTranscript": "a"}"#,
            r#"{"referenceText": 5, "userTranscript": "a"}"#,
            r#"{"userTranscript": "a"}"#,
            r#"not json"#,
            r#"{"referenceText": "a", "userTranscript": "a", "silenceThresholdMs": -1}"#,
        ] {
            let err = analyze_request_json(json, &config).unwrap_err();
            assert!(err.is_invalid_argument(), "{json}: {err}");
        }
    }
}
