//! Hybrid score fusion: merging two independently-ranked candidate lists.
//!
//! # Algorithm
//!
//! Each input list is normalized by its own maximum score, bounding every
//! score in a list to at most 1.0 so neither retrieval method's score range
//! dominates the other:
//!
//! ```text
//! normalized = raw_score / max(raw_score over the list)
//! ```
//!
//! The normalized lists are unioned. When an item appears in both lists its
//! larger normalized score wins — best evidence, never the sum, so presence
//! in both lists is not consensus-boosted. The union is sorted by score
//! descending (ties break on ascending key for determinism) and truncated to
//! `k`.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use crate::types::RagError;

/// An item paired with a retrieval score.
#[derive(Debug, Clone, PartialEq)]
pub struct Scored<T> {
    pub item: T,
    pub score: f32,
}

impl<T> Scored<T> {
    pub fn new(item: T, score: f32) -> Self {
        Self { item, score }
    }
}

/// Fuses two scored candidate lists into one ranked list of at most `k` items.
///
/// Both lists are expected to already be capped at `k` entries by their
/// upstream retrieval methods. `key` extracts the identity used to detect the
/// same item appearing in both lists.
///
/// An empty list contributes nothing to the union. A non-empty list whose
/// maximum score is zero, negative, or non-finite cannot be normalized and is
/// rejected with [`RagError::DegenerateScoreSet`].
///
/// # Examples
///
/// ```
/// use ragweld::fusion::{Scored, fuse};
///
/// let dense = vec![Scored::new("a", 0.9), Scored::new("b", 0.3)];
/// let lexical = vec![Scored::new("b", 7.0), Scored::new("c", 2.0)];
/// let fused = fuse(dense, lexical, 3, |item| *item).unwrap();
///
/// // "a" and "b" both normalize to 1.0 in their best list; "a" wins the tie
/// // on key order.
/// assert_eq!(fused[0].item, "a");
/// assert_eq!(fused[1].item, "b");
/// assert_eq!(fused[1].score, 1.0);
/// ```
pub fn fuse<T, K, F>(
    primary: Vec<Scored<T>>,
    secondary: Vec<Scored<T>>,
    k: usize,
    key: F,
) -> Result<Vec<Scored<T>>, RagError>
where
    K: Ord,
    F: Fn(&T) -> K,
{
    let mut best: BTreeMap<K, Scored<T>> = BTreeMap::new();

    for list in [primary, secondary] {
        for entry in normalize(list)? {
            match best.entry(key(&entry.item)) {
                Entry::Vacant(slot) => {
                    slot.insert(entry);
                }
                Entry::Occupied(mut slot) => {
                    if entry.score > slot.get().score {
                        slot.insert(entry);
                    }
                }
            }
        }
    }

    // BTreeMap iteration is key-ascending and the sort is stable, so equal
    // scores keep ascending key order.
    let mut fused: Vec<Scored<T>> = best.into_values().collect();
    fused.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    fused.truncate(k);
    Ok(fused)
}

/// Divides every score in a list by the list's maximum.
fn normalize<T>(list: Vec<Scored<T>>) -> Result<Vec<Scored<T>>, RagError> {
    if list.is_empty() {
        return Ok(list);
    }
    let max = list
        .iter()
        .map(|scored| scored.score)
        .fold(f32::NEG_INFINITY, f32::max);
    if !max.is_finite() || max <= 0.0 {
        return Err(RagError::DegenerateScoreSet(format!(
            "maximum score {max} cannot normalize a {}-entry list",
            list.len()
        )));
    }
    Ok(list
        .into_iter()
        .map(|mut scored| {
            scored.score /= max;
            scored
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scored(pairs: &[(&'static str, f32)]) -> Vec<Scored<&'static str>> {
        pairs
            .iter()
            .map(|&(item, score)| Scored::new(item, score))
            .collect()
    }

    #[test]
    fn top_items_of_each_list_lead_the_fused_ranking() {
        let dense = scored(&[("x", 0.8), ("m", 0.2)]);
        let lexical = scored(&[("y", 12.0), ("m", 3.0)]);
        let fused = fuse(dense, lexical, 2, |item| *item).unwrap();

        let top: Vec<&str> = fused.iter().map(|s| s.item).collect();
        assert_eq!(top.len(), 2);
        assert!(top.contains(&"x"));
        assert!(top.contains(&"y"));
        assert_eq!(fused[0].score, 1.0);
        assert_eq!(fused[1].score, 1.0);
    }

    #[test]
    fn shared_item_takes_the_larger_normalized_score_not_the_sum() {
        // "b" normalizes to 0.9 in the dense list and 0.4 in the lexical one.
        let dense = scored(&[("a", 1.0), ("b", 0.9)]);
        let lexical = scored(&[("c", 10.0), ("b", 4.0)]);
        let fused = fuse(dense, lexical, 4, |item| *item).unwrap();

        let b = fused.iter().find(|s| s.item == "b").unwrap();
        assert_eq!(b.score, 0.9);
    }

    #[test]
    fn fusing_a_list_with_itself_preserves_order_and_normalizes() {
        let list = scored(&[("first", 8.0), ("second", 4.0), ("third", 2.0)]);
        let fused = fuse(list.clone(), list, 3, |item| *item).unwrap();

        let items: Vec<&str> = fused.iter().map(|s| s.item).collect();
        assert_eq!(items, vec!["first", "second", "third"]);
        assert_eq!(fused[0].score, 1.0);
        assert_eq!(fused[1].score, 0.5);
        assert_eq!(fused[2].score, 0.25);
    }

    #[test]
    fn result_is_truncated_to_k() {
        let dense = scored(&[("a", 3.0), ("b", 2.0), ("c", 1.0)]);
        let lexical = scored(&[("d", 9.0), ("e", 6.0)]);
        let fused = fuse(dense, lexical, 2, |item| *item).unwrap();
        assert_eq!(fused.len(), 2);
    }

    #[test]
    fn empty_lists_contribute_nothing() {
        let dense = scored(&[("only", 2.0)]);
        let fused = fuse(dense, Vec::new(), 5, |item| *item).unwrap();
        assert_eq!(fused.len(), 1);
        assert_eq!(fused[0].item, "only");
        assert_eq!(fused[0].score, 1.0);

        let fused: Vec<Scored<&str>> = fuse(Vec::new(), Vec::new(), 5, |item| *item).unwrap();
        assert!(fused.is_empty());
    }

    #[test]
    fn single_entry_list_normalizes_to_one() {
        let fused = fuse(scored(&[("solo", 0.37)]), Vec::new(), 1, |item| *item).unwrap();
        assert_eq!(fused[0].score, 1.0);
    }

    #[test]
    fn zero_or_negative_maximum_is_degenerate() {
        for bad in [scored(&[("a", 0.0), ("b", 0.0)]), scored(&[("a", -1.0)])] {
            let err = fuse(bad, Vec::new(), 2, |item| *item).unwrap_err();
            assert!(matches!(err, RagError::DegenerateScoreSet(_)));
        }
    }

    #[test]
    fn equal_scores_break_ties_on_ascending_key() {
        let dense = scored(&[("beta", 5.0), ("alpha", 5.0)]);
        let fused = fuse(dense, Vec::new(), 2, |item| *item).unwrap();
        let items: Vec<&str> = fused.iter().map(|s| s.item).collect();
        assert_eq!(items, vec!["alpha", "beta"]);
    }
}
