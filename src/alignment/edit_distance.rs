use std::collections::HashSet;

use crate::types::{AlignmentOp, Token};

/// Uniform-cost word-level alignment of `user` against `reference`.
///
/// Backtrace tie-break order: match > substitution > deletion > insertion.
/// When the two sequences share no word at all, nothing anchors the
/// substitutions to the passage, so the result is re-expressed as every
/// reference token deleted followed by every user token inserted.
pub fn align_sequences(reference: &[Token], user: &[Token]) -> Vec<AlignmentOp> {
    if reference.is_empty() || user.is_empty() || shares_any_word(reference, user) {
        return wagner_fischer_ops(reference, user);
    }

    tracing::debug!(
        reference_len = reference.len(),
        user_len = user.len(),
        "alignment: sequences share no word, reporting them as disjoint"
    );
    reference
        .iter()
        .cloned()
        .map(AlignmentOp::delete)
        .chain(user.iter().cloned().map(AlignmentOp::insert))
        .collect()
}

fn shares_any_word(reference: &[Token], user: &[Token]) -> bool {
    let reference_words: HashSet<&str> = reference.iter().map(|t| t.text.as_str()).collect();
    user.iter().any(|t| reference_words.contains(t.text.as_str()))
}

/// Plain Wagner–Fischer alignment with the fixed backtrace tie-break order.
pub fn wagner_fischer_ops(reference: &[Token], user: &[Token]) -> Vec<AlignmentOp> {
    let n = reference.len();
    let m = user.len();
    let table = cost_table(reference, user);
    let cols = m + 1;
    let at = |i: usize, j: usize| table[i * cols + j];

    let mut ops = Vec::with_capacity(n.max(m));
    let (mut i, mut j) = (n, m);
    while i > 0 || j > 0 {
        let cost = at(i, j);
        if i > 0 && j > 0 {
            let diag = at(i - 1, j - 1);
            let same = reference[i - 1].text == user[j - 1].text;
            if same && cost == diag {
                ops.push(AlignmentOp::matched(
                    reference[i - 1].clone(),
                    user[j - 1].clone(),
                ));
                i -= 1;
                j -= 1;
                continue;
            }
            if !same && cost == diag + 1 {
                ops.push(AlignmentOp::substitute(
                    reference[i - 1].clone(),
                    user[j - 1].clone(),
                ));
                i -= 1;
                j -= 1;
                continue;
            }
        }
        if i > 0 && cost == at(i - 1, j) + 1 {
            ops.push(AlignmentOp::delete(reference[i - 1].clone()));
            i -= 1;
            continue;
        }
        debug_assert!(j > 0 && cost == at(i, j - 1) + 1, "broken edit-distance backtrace");
        ops.push(AlignmentOp::insert(user[j - 1].clone()));
        j -= 1;
    }
    ops.reverse();
    ops
}

/// Minimum number of word edits turning `reference` into `user`.
pub fn edit_distance(reference: &[Token], user: &[Token]) -> u32 {
    let table = cost_table(reference, user);
    table[table.len() - 1]
}

/// Row-major (|reference| + 1) x (|user| + 1) cost table.
fn cost_table(reference: &[Token], user: &[Token]) -> Vec<u32> {
    let n = reference.len();
    let m = user.len();
    let cols = m + 1;
    let mut table = vec![0u32; (n + 1) * cols];

    for j in 0..=m {
        table[j] = j as u32;
    }
    for i in 1..=n {
        let row = i * cols;
        let prev_row = (i - 1) * cols;
        table[row] = i as u32;
        for j in 1..=m {
            let sub_cost = u32::from(reference[i - 1].text != user[j - 1].text);
            let diag = table[prev_row + j - 1] + sub_cost;
            let up = table[prev_row + j] + 1;
            let left = table[row + j - 1] + 1;
            table[row + j] = diag.min(up).min(left);
        }
    }
    table
}
