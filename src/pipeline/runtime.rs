use crate::alignment::grouping::group_ops;
use crate::alignment::metrics::metrics_from_counts;
use crate::alignment::summary::build_summary;
use crate::error::AnalysisError;
use crate::pipeline::traits::{FluencyAnalyzer, SequenceAligner, Tokenizer};
use crate::types::{
    AlignmentOp, AlignmentReport, AnalysisInput, AnalysisResult, OpCounts, OpKind,
    SubstitutionEntry, Token,
};

pub struct ReadingAnalyzer {
    silence_threshold_ms: u64,
    tokenizer: Box<dyn Tokenizer>,
    sequence_aligner: Box<dyn SequenceAligner>,
    fluency_analyzer: Box<dyn FluencyAnalyzer>,
}

pub(crate) struct ReadingAnalyzerParts {
    pub silence_threshold_ms: u64,
    pub tokenizer: Box<dyn Tokenizer>,
    pub sequence_aligner: Box<dyn SequenceAligner>,
    pub fluency_analyzer: Box<dyn FluencyAnalyzer>,
}

impl ReadingAnalyzer {
    pub(crate) fn from_parts(parts: ReadingAnalyzerParts) -> Self {
        Self {
            silence_threshold_ms: parts.silence_threshold_ms,
            tokenizer: parts.tokenizer,
            sequence_aligner: parts.sequence_aligner,
            fluency_analyzer: parts.fluency_analyzer,
        }
    }

    pub fn silence_threshold_ms(&self) -> u64 {
        self.silence_threshold_ms
    }

    pub fn analyze(&self, input: &AnalysisInput) -> Result<AnalysisResult, AnalysisError> {
        self.analyze_with_threshold(input, self.silence_threshold_ms)
    }

    pub fn analyze_with_threshold(
        &self,
        input: &AnalysisInput,
        silence_threshold_ms: u64,
    ) -> Result<AnalysisResult, AnalysisError> {
        let reference = self.tokenizer.tokenize(&input.reference_text);
        let user = self.tokenizer.tokenize(&input.user_transcript);

        let ops = self.sequence_aligner.align(&reference, &user);
        check_replay(&ops, &reference, &user)?;
        let counts = OpCounts::from_ops(&ops);
        tracing::debug!(
            reference_tokens = reference.len(),
            user_tokens = user.len(),
            edit_distance = counts.errors(),
            matches = counts.matches,
            substitutions = counts.substitutions,
            insertions = counts.insertions,
            deletions = counts.deletions,
            "analysis: alignment complete"
        );

        let grouped = group_ops(&ops);
        let fluency = self.fluency_analyzer.analyze_fluency(
            &user,
            input.word_timestamps.as_deref(),
            silence_threshold_ms,
        );
        let metrics = metrics_from_counts(&counts, reference.len());
        let summary = build_summary(
            &metrics,
            &counts,
            &fluency,
            reference.len(),
            input.word_timestamps.is_some(),
            silence_threshold_ms,
        );

        Ok(AnalysisResult {
            alignment: AlignmentReport {
                missing_phrases: grouped
                    .missing_phrases
                    .into_iter()
                    .map(|phrase| phrase.text)
                    .collect(),
                extra_phrases: grouped
                    .extra_phrases
                    .into_iter()
                    .map(|phrase| phrase.text)
                    .collect(),
                substitutions: grouped
                    .substitutions
                    .into_iter()
                    .map(|sub| SubstitutionEntry {
                        expected: sub.expected.original,
                        said: sub.said.original,
                    })
                    .collect(),
            },
            fluency,
            metrics,
            counts,
            summary,
        })
    }
}

/// Rejects ops that do not replay `reference` and `user` in order, or whose
/// kind disagrees with the texts it pairs.
fn check_replay(
    ops: &[AlignmentOp],
    reference: &[Token],
    user: &[Token],
) -> Result<(), AnalysisError> {
    let mismatch = |position: usize, message: String| {
        AnalysisError::runtime("alignment", format!("op {position}: {message}"))
    };
    let (mut next_ref, mut next_user) = (0usize, 0usize);

    for (position, op) in ops.iter().enumerate() {
        match (op.kind.consumes_reference(), op.ref_token.as_ref()) {
            (true, Some(token)) => {
                if reference.get(next_ref) != Some(token) {
                    return Err(mismatch(
                        position,
                        format!("reference token {:?} is out of sequence", token.original),
                    ));
                }
                next_ref += 1;
            }
            (false, None) => {}
            (true, None) => {
                let message = format!("{:?} without a reference token", op.kind);
                return Err(mismatch(position, message));
            }
            (false, Some(_)) => {
                let message = format!("{:?} carries a reference token", op.kind);
                return Err(mismatch(position, message));
            }
        }
        match (op.kind.consumes_user(), op.user_token.as_ref()) {
            (true, Some(token)) => {
                if user.get(next_user) != Some(token) {
                    return Err(mismatch(
                        position,
                        format!("user token {:?} is out of sequence", token.original),
                    ));
                }
                next_user += 1;
            }
            (false, None) => {}
            (true, None) => {
                let message = format!("{:?} without a user token", op.kind);
                return Err(mismatch(position, message));
            }
            (false, Some(_)) => {
                let message = format!("{:?} carries a user token", op.kind);
                return Err(mismatch(position, message));
            }
        }
        if let (Some(expected), Some(said)) = (op.ref_token.as_ref(), op.user_token.as_ref()) {
            let same = expected.text == said.text;
            match op.kind {
                OpKind::Match if !same => {
                    return Err(mismatch(
                        position,
                        format!("Match pairs {:?} with {:?}", expected.text, said.text),
                    ));
                }
                OpKind::Substitute if same => {
                    return Err(mismatch(
                        position,
                        format!("Substitute pairs equal texts {:?}", expected.text),
                    ));
                }
                _ => {}
            }
        }
    }

    if next_ref != reference.len() || next_user != user.len() {
        return Err(AnalysisError::runtime(
            "alignment",
            format!(
                "ops do not cover their inputs: reference {next_ref}/{} user {next_user}/{}",
                reference.len(),
                user.len()
            ),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnalysisConfig;
    use crate::pipeline::builder::ReadingAnalyzerBuilder;
    use crate::types::WordTimestamp;

    struct DroppingAligner;

    impl SequenceAligner for DroppingAligner {
        fn align(&self, reference: &[Token], _user: &[Token]) -> Vec<AlignmentOp> {
            reference.iter().cloned().map(AlignmentOp::delete).collect()
        }
    }

    /// Pairs the reference with the reversed user sequence, all as matches.
    struct ReversedMatchAligner;

    impl SequenceAligner for ReversedMatchAligner {
        fn align(&self, reference: &[Token], user: &[Token]) -> Vec<AlignmentOp> {
            reference
                .iter()
                .zip(user.iter().rev())
                .map(|(r, u)| AlignmentOp::matched(r.clone(), u.clone()))
                .collect()
        }
    }

    /// Keeps the order but labels every pair a match.
    struct AllMatchAligner;

    impl SequenceAligner for AllMatchAligner {
        fn align(&self, reference: &[Token], user: &[Token]) -> Vec<AlignmentOp> {
            reference
                .iter()
                .zip(user)
                .map(|(r, u)| AlignmentOp::matched(r.clone(), u.clone()))
                .collect()
        }
    }

    /// Marks a pair of equal words as a substitution.
    struct EqualSubstituteAligner;

    impl SequenceAligner for EqualSubstituteAligner {
        fn align(&self, reference: &[Token], user: &[Token]) -> Vec<AlignmentOp> {
            reference
                .iter()
                .zip(user)
                .map(|(r, u)| AlignmentOp::substitute(r.clone(), u.clone()))
                .collect()
        }
    }

    fn analyze_with(
        aligner: Box<dyn SequenceAligner>,
        reference: &str,
        user: &str,
    ) -> Result<AnalysisResult, AnalysisError> {
        ReadingAnalyzerBuilder::new(AnalysisConfig::default())
            .with_sequence_aligner(aligner)
            .build()
            .expect("build")
            .analyze(&AnalysisInput::new(reference, user))
    }

    #[test]
    fn analyze_runs_all_stages() {
        let analyzer = ReadingAnalyzerBuilder::new(AnalysisConfig::default())
            .build()
            .expect("build");
        let result = analyzer
            .analyze(&AnalysisInput::new("the quick fox", "the the slow fox um"))
            .expect("analyze");
        assert_eq!(result.alignment.substitutions.len(), 1);
        assert_eq!(result.alignment.extra_phrases, ["the", "um"]);
        assert_eq!(result.fluency.repetitions.len(), 1);
        assert_eq!(result.fluency.hesitation_markers[0].token, "um");
        assert!((3..=5).contains(&result.summary.len()));
    }

    #[test]
    fn threshold_override_applies_to_pauses() {
        let analyzer = ReadingAnalyzerBuilder::new(AnalysisConfig::default())
            .build()
            .expect("build");
        let input = AnalysisInput::new("a b", "a b").with_timestamps(vec![
            WordTimestamp::new("a", 0, 100),
            WordTimestamp::new("b", 600, 700),
        ]);
        assert!(analyzer.analyze(&input).unwrap().fluency.long_pauses.is_empty());
        let result = analyzer.analyze_with_threshold(&input, 400).unwrap();
        assert_eq!(result.fluency.long_pauses.len(), 1);
    }

    #[test]
    fn inconsistent_aligner_is_rejected() {
        let analyzer = ReadingAnalyzerBuilder::new(AnalysisConfig::default())
            .with_sequence_aligner(Box::new(DroppingAligner))
            .build()
            .expect("build");
        let err = analyzer
            .analyze(&AnalysisInput::new("a b", "a b"))
            .unwrap_err();
        assert!(matches!(err, AnalysisError::Runtime { .. }));
    }

    #[test]
    fn out_of_order_pairing_is_rejected() {
        let err = analyze_with(Box::new(ReversedMatchAligner), "the quick fox", "a lazy dog")
            .unwrap_err();
        assert!(matches!(err, AnalysisError::Runtime { .. }), "{err}");
    }

    #[test]
    fn match_between_different_words_is_rejected() {
        let err = analyze_with(Box::new(AllMatchAligner), "the quick fox", "the slow fox")
            .unwrap_err();
        assert!(matches!(err, AnalysisError::Runtime { .. }), "{err}");
    }

    #[test]
    fn substitution_between_equal_words_is_rejected() {
        let err = analyze_with(Box::new(EqualSubstituteAligner), "read aloud", "read aloud")
            .unwrap_err();
        assert!(matches!(err, AnalysisError::Runtime { .. }), "{err}");
    }

    #[test]
    fn consistent_custom_aligner_is_accepted() {
        let result = analyze_with(Box::new(AllMatchAligner), "the quick fox", "The quick, fox")
            .expect("analyze");
        assert_eq!(result.metrics.coverage_ratio, 1.0);
    }
}
