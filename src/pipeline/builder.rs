use crate::config::AnalysisConfig;
use crate::error::AnalysisError;
use crate::pipeline::defaults::{RuleBasedFluencyAnalyzer, WagnerFischerAligner, WhitespaceTokenizer};
use crate::pipeline::runtime::{ReadingAnalyzer, ReadingAnalyzerParts};
use crate::pipeline::traits::{FluencyAnalyzer, SequenceAligner, Tokenizer};

pub struct ReadingAnalyzerBuilder {
    config: AnalysisConfig,
    tokenizer: Option<Box<dyn Tokenizer>>,
    sequence_aligner: Option<Box<dyn SequenceAligner>>,
    fluency_analyzer: Option<Box<dyn FluencyAnalyzer>>,
}

impl ReadingAnalyzerBuilder {
    pub fn new(config: AnalysisConfig) -> Self {
        Self {
            config,
            tokenizer: None,
            sequence_aligner: None,
            fluency_analyzer: None,
        }
    }

    pub fn with_silence_threshold_ms(mut self, silence_threshold_ms: u64) -> Self {
        self.config.silence_threshold_ms = silence_threshold_ms;
        self
    }

    pub fn with_tokenizer(mut self, tokenizer: Box<dyn Tokenizer>) -> Self {
        self.tokenizer = Some(tokenizer);
        self
    }

    pub fn with_sequence_aligner(mut self, sequence_aligner: Box<dyn SequenceAligner>) -> Self {
        self.sequence_aligner = Some(sequence_aligner);
        self
    }

    pub fn with_fluency_analyzer(mut self, fluency_analyzer: Box<dyn FluencyAnalyzer>) -> Self {
        self.fluency_analyzer = Some(fluency_analyzer);
        self
    }

    pub fn build(self) -> Result<ReadingAnalyzer, AnalysisError> {
        self.config.validate()?;
        let fluency_analyzer = match self.fluency_analyzer {
            Some(fluency_analyzer) => fluency_analyzer,
            None => Box::new(RuleBasedFluencyAnalyzer::from_config(&self.config)),
        };

        Ok(ReadingAnalyzer::from_parts(ReadingAnalyzerParts {
            silence_threshold_ms: self.config.silence_threshold_ms,
            tokenizer: self
                .tokenizer
                .unwrap_or_else(|| Box::new(WhitespaceTokenizer)),
            sequence_aligner: self
                .sequence_aligner
                .unwrap_or_else(|| Box::new(WagnerFischerAligner)),
            fluency_analyzer,
        }))
    }
}

impl Default for ReadingAnalyzerBuilder {
    fn default() -> Self {
        Self::new(AnalysisConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AnalysisInput, FluencyReport, Token, WordTimestamp};

    struct UppercaseOnlyTokenizer;

    impl Tokenizer for UppercaseOnlyTokenizer {
        fn tokenize(&self, text: &str) -> Vec<Token> {
            crate::alignment::tokenization::tokenize_text(text)
                .into_iter()
                .filter(|t| t.original.chars().next().is_some_and(char::is_uppercase))
                .enumerate()
                .map(|(index, t)| Token { index, ..t })
                .collect()
        }
    }

    struct SilentFluency;

    impl FluencyAnalyzer for SilentFluency {
        fn analyze_fluency(
            &self,
            _user: &[Token],
            _timestamps: Option<&[WordTimestamp]>,
            _silence_threshold_ms: u64,
        ) -> FluencyReport {
            FluencyReport::default()
        }
    }

    #[test]
    fn builder_defaults() {
        let builder = ReadingAnalyzerBuilder::default();
        assert!(builder.tokenizer.is_none());
        assert!(builder.sequence_aligner.is_none());
        assert!(builder.fluency_analyzer.is_none());
        let analyzer = builder.build().expect("build should succeed");
        assert_eq!(analyzer.silence_threshold_ms(), 700);
    }

    #[test]
    fn silence_threshold_can_be_overridden() {
        let analyzer = ReadingAnalyzerBuilder::default()
            .with_silence_threshold_ms(250)
            .build()
            .expect("build should succeed");
        assert_eq!(analyzer.silence_threshold_ms(), 250);
    }

    #[test]
    fn build_fails_on_invalid_config() {
        let config = AnalysisConfig {
            max_repetition_phrase_len: 0,
            ..AnalysisConfig::default()
        };
        let result = ReadingAnalyzerBuilder::new(config).build();
        assert!(result.is_err_and(|err| err.is_invalid_argument()));
    }

    #[test]
    fn custom_stages_are_used() {
        let analyzer = ReadingAnalyzerBuilder::default()
            .with_tokenizer(Box::new(UppercaseOnlyTokenizer))
            .with_fluency_analyzer(Box::new(SilentFluency))
            .build()
            .expect("build should succeed");
        let result = analyzer
            .analyze(&AnalysisInput::new("Alice met Bob", "um Alice um Bob"))
            .expect("analyze");
        assert_eq!(result.metrics.coverage_ratio, 1.0);
        assert!(result.fluency.hesitation_markers.is_empty());
    }
}
