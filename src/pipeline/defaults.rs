use crate::alignment::edit_distance::align_sequences;
use crate::alignment::fluency::FluencyRules;
use crate::alignment::tokenization::tokenize_text;
use crate::config::AnalysisConfig;
use crate::pipeline::traits::{FluencyAnalyzer, SequenceAligner, Tokenizer};
use crate::types::{AlignmentOp, FluencyReport, Token, WordTimestamp};

pub struct WhitespaceTokenizer;

impl Tokenizer for WhitespaceTokenizer {
    fn tokenize(&self, text: &str) -> Vec<Token> {
        tokenize_text(text)
    }
}

pub struct WagnerFischerAligner;

impl SequenceAligner for WagnerFischerAligner {
    fn align(&self, reference: &[Token], user: &[Token]) -> Vec<AlignmentOp> {
        align_sequences(reference, user)
    }
}

pub struct RuleBasedFluencyAnalyzer {
    rules: FluencyRules,
}

impl RuleBasedFluencyAnalyzer {
    pub fn new(rules: FluencyRules) -> Self {
        Self { rules }
    }

    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self::new(FluencyRules::from_config(config))
    }
}

impl Default for RuleBasedFluencyAnalyzer {
    fn default() -> Self {
        Self::new(FluencyRules::default())
    }
}

impl FluencyAnalyzer for RuleBasedFluencyAnalyzer {
    fn analyze_fluency(
        &self,
        user: &[Token],
        timestamps: Option<&[WordTimestamp]>,
        silence_threshold_ms: u64,
    ) -> FluencyReport {
        self.rules.analyze(user, timestamps, silence_threshold_ms)
    }
}
