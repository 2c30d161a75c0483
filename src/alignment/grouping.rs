use crate::alignment::tokenization::join_original;
use crate::types::{AlignmentOp, OpKind, Phrase, Substitution, Token};

/// Alignment ops folded into reportable differences.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupedAlignment {
    pub missing_phrases: Vec<Phrase>,
    pub extra_phrases: Vec<Phrase>,
    pub substitutions: Vec<Substitution>,
}

/// Groups maximal runs of DELETE ops into missing phrases and maximal runs of
/// INSERT ops into extra phrases. Every SUBSTITUTE op is its own entry, and any
/// op of another kind closes the current run.
pub fn group_ops(ops: &[AlignmentOp]) -> GroupedAlignment {
    let mut grouped = GroupedAlignment::default();
    let mut run_kind: Option<OpKind> = None;
    let mut run: Vec<Token> = Vec::new();

    for op in ops {
        let continues_run = run_kind == Some(op.kind);
        if !continues_run {
            flush(&mut run, run_kind, &mut grouped);
            run_kind = None;
        }

        match op.kind {
            OpKind::Delete => {
                if let Some(token) = op.ref_token.as_ref() {
                    run.push(token.clone());
                    run_kind = Some(OpKind::Delete);
                }
            }
            OpKind::Insert => {
                if let Some(token) = op.user_token.as_ref() {
                    run.push(token.clone());
                    run_kind = Some(OpKind::Insert);
                }
            }
            OpKind::Substitute => {
                if let (Some(expected), Some(said)) = (op.ref_token.as_ref(), op.user_token.as_ref())
                {
                    grouped.substitutions.push(Substitution {
                        expected: expected.clone(),
                        said: said.clone(),
                    });
                }
            }
            OpKind::Match => {}
        }
    }
    flush(&mut run, run_kind, &mut grouped);

    debug_assert!(
        grouped
            .missing_phrases
            .iter()
            .chain(grouped.extra_phrases.iter())
            .all(|phrase| !phrase.tokens.is_empty()),
        "empty phrase emitted"
    );
    grouped
}

fn flush(run: &mut Vec<Token>, kind: Option<OpKind>, out: &mut GroupedAlignment) {
    if run.is_empty() {
        return;
    }
    let tokens = std::mem::take(run);
    let phrase = Phrase {
        text: join_original(&tokens),
        tokens,
    };
    match kind {
        Some(OpKind::Delete) => out.missing_phrases.push(phrase),
        Some(OpKind::Insert) => out.extra_phrases.push(phrase),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alignment::edit_distance::align_sequences;
    use crate::alignment::tokenization::tokenize_text;

    fn grouped(reference: &str, user: &str) -> GroupedAlignment {
        group_ops(&align_sequences(
            &tokenize_text(reference),
            &tokenize_text(user),
        ))
    }

    fn texts(phrases: &[Phrase]) -> Vec<&str> {
        phrases.iter().map(|p| p.text.as_str()).collect()
    }

    #[test]
    fn identical_reading_has_no_differences() {
        let g = grouped("a cat sat", "a cat sat");
        assert_eq!(g, GroupedAlignment::default());
    }

    #[test]
    fn contiguous_deletions_form_one_phrase() {
        let g = grouped("she walked to the old mill today", "she walked today");
        assert_eq!(texts(&g.missing_phrases), ["to the old mill"]);
        assert!(g.extra_phrases.is_empty());
        assert_eq!(g.missing_phrases[0].tokens.len(), 4);
    }

    #[test]
    fn separated_deletions_form_separate_phrases() {
        let g = grouped("one two three four five", "one three five");
        assert_eq!(texts(&g.missing_phrases), ["two", "four"]);
    }

    #[test]
    fn phrases_keep_original_text() {
        let g = grouped("Hello, dear World!", "hello");
        assert_eq!(texts(&g.missing_phrases), ["dear World!"]);
    }

    #[test]
    fn insertions_form_extra_phrases() {
        let g = grouped("the end", "the very very end");
        assert_eq!(texts(&g.extra_phrases), ["very very"]);
    }

    #[test]
    fn substitutions_are_never_merged() {
        let g = grouped("the big red ball", "the small blue ball");
        assert_eq!(g.substitutions.len(), 2);
        assert_eq!(g.substitutions[0].expected.text, "big");
        assert_eq!(g.substitutions[0].said.text, "small");
        assert_eq!(g.substitutions[1].expected.text, "red");
        assert_eq!(g.substitutions[1].said.text, "blue");
        assert!(g.missing_phrases.is_empty());
    }

    #[test]
    fn substitution_splits_a_deletion_run() {
        let ops = vec![
            AlignmentOp::delete(tokenize_text("a").remove(0)),
            AlignmentOp::substitute(tokenize_text("b").remove(0), tokenize_text("x").remove(0)),
            AlignmentOp::delete(tokenize_text("c").remove(0)),
        ];
        let g = group_ops(&ops);
        assert_eq!(texts(&g.missing_phrases), ["a", "c"]);
        assert_eq!(g.substitutions.len(), 1);
    }

    #[test]
    fn disjoint_reading_is_one_missing_and_one_extra_phrase() {
        let g = grouped("alpha beta", "gamma delta");
        assert_eq!(texts(&g.missing_phrases), ["alpha beta"]);
        assert_eq!(texts(&g.extra_phrases), ["gamma delta"]);
        assert!(g.substitutions.is_empty());
    }
}
