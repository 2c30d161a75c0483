use crate::types::{AlignmentOp, FluencyReport, Token, WordTimestamp};

pub trait Tokenizer: Send + Sync {
    fn tokenize(&self, text: &str) -> Vec<Token>;
}

pub trait SequenceAligner: Send + Sync {
    /// Ops in forward order; reference-bearing ops must replay `reference`
    /// and user-bearing ops must replay `user`.
    fn align(&self, reference: &[Token], user: &[Token]) -> Vec<AlignmentOp>;
}

pub trait FluencyAnalyzer: Send + Sync {
    fn analyze_fluency(
        &self,
        user: &[Token],
        timestamps: Option<&[WordTimestamp]>,
        silence_threshold_ms: u64,
    ) -> FluencyReport;
}
