//! Term → resource resolution.
//!
//! Users refer to resources by whatever they remember: a name fragment, a full
//! IP address, a fingerprint or the numeric ID. Commands fetch the current list
//! from the API and resolve the typed term against it here. Nothing in this
//! module performs I/O.

use std::fmt;

use tracing::debug;

use crate::error::CliError;

/// Number of candidates quoted in an ambiguity error.
const AMBIGUITY_SAMPLE: usize = 3;

/// A resource that can be addressed by any of several identifying strings.
///
/// `keys` must include the numeric ID in its decimal form so that a purely
/// numeric term always has an exact target. `Display` is the short form used
/// when listing conflicting candidates.
pub trait Keyed: fmt::Display {
    /// Human-readable resource kind, used in error messages.
    const KIND: &'static str;

    fn keys(&self) -> Vec<String>;
}

/// Outcome of comparing one entity's keys against a term.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MatchKind {
    NoMatch,
    PartialMatch,
    ExactMatch,
}

/// Compare `item`'s keys against `term`, ignoring case.
pub fn match_kind<T: Keyed + ?Sized>(item: &T, term: &str) -> MatchKind {
    let term = term.to_lowercase();
    let mut best = MatchKind::NoMatch;
    for key in item.keys() {
        let key = key.to_lowercase();
        if key == term {
            return MatchKind::ExactMatch;
        }
        if key.contains(&term) {
            best = MatchKind::PartialMatch;
        }
    }
    best
}

/// All items with at least one key containing `term`, in input order.
///
/// An empty term is a substring of every key and therefore matches everything;
/// callers that need a term must check for one themselves.
pub fn find<'a, T: Keyed>(items: &'a [T], term: &str) -> Vec<&'a T> {
    items
        .iter()
        .filter(|item| match_kind(*item, term) != MatchKind::NoMatch)
        .collect()
}

/// Resolve `term` to exactly one item.
///
/// A single candidate wins outright. Among several candidates, the one whose
/// key equals the term wins if it is the only such candidate; otherwise the
/// term is ambiguous. Items that appear twice in `items` are treated as two
/// candidates.
pub fn find_one<'a, T: Keyed>(items: &'a [T], term: &str) -> Result<&'a T, CliError> {
    let candidates = find(items, term);
    debug!(
        kind = T::KIND,
        term,
        total = items.len(),
        candidates = candidates.len(),
        "Resolving term"
    );

    match candidates.as_slice() {
        [] => Err(CliError::NoMatch {
            kind: T::KIND,
            term: term.to_string(),
        }),
        [only] => Ok(*only),
        many => {
            let exact: Vec<&T> = many
                .iter()
                .copied()
                .filter(|item| match_kind(*item, term) == MatchKind::ExactMatch)
                .collect();
            match exact.as_slice() {
                [winner] => Ok(*winner),
                _ => Err(CliError::Ambiguous {
                    kind: T::KIND,
                    term: term.to_string(),
                    sample: sample(many),
                }),
            }
        }
    }
}

fn sample<T: fmt::Display>(candidates: &[&T]) -> String {
    let mut shown: Vec<String> = candidates
        .iter()
        .take(AMBIGUITY_SAMPLE)
        .map(ToString::to_string)
        .collect();
    if candidates.len() > AMBIGUITY_SAMPLE {
        shown.push("...".to_string());
    }
    shown.join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    #[derive(Debug, Clone, PartialEq)]
    struct Item {
        id: u64,
        name: String,
    }

    impl Item {
        fn new(id: u64, name: &str) -> Self {
            Self {
                id,
                name: name.to_string(),
            }
        }
    }

    impl fmt::Display for Item {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(&self.name)
        }
    }

    impl Keyed for Item {
        const KIND: &'static str = "item";

        fn keys(&self) -> Vec<String> {
            vec![self.id.to_string(), self.name.clone()]
        }
    }

    fn webs() -> Vec<Item> {
        vec![Item::new(1, "web-1"), Item::new(2, "web-2")]
    }

    #[rstest]
    #[case("web-1", MatchKind::ExactMatch)]
    #[case("WEB-1", MatchKind::ExactMatch)]
    #[case("1", MatchKind::ExactMatch)]
    #[case("eb", MatchKind::PartialMatch)]
    #[case("db", MatchKind::NoMatch)]
    fn classifies_match(#[case] term: &str, #[case] expected: MatchKind) {
        assert_eq!(match_kind(&Item::new(1, "web-1"), term), expected);
    }

    #[test]
    fn find_preserves_order_and_ignores_case() {
        let items = vec![
            Item::new(1, "Web-A"),
            Item::new(2, "db"),
            Item::new(3, "web-b"),
        ];
        let found: Vec<u64> = find(&items, "WEB").iter().map(|i| i.id).collect();
        assert_eq!(found, vec![1, 3]);
    }

    #[test]
    fn empty_term_matches_everything() {
        assert_eq!(find(&webs(), "").len(), 2);
    }

    #[test]
    fn partial_collision_is_ambiguous() {
        let items = webs();
        let err = find_one(&items, "web").unwrap_err();
        match &err {
            CliError::Ambiguous { sample, .. } => {
                assert!(sample.contains("web-1"));
                assert!(sample.contains("web-2"));
            }
            other => panic!("expected ambiguity, got {other:?}"),
        }
    }

    #[test]
    fn single_candidate_wins() {
        let items = webs();
        assert_eq!(find_one(&items, "web-1").unwrap().id, 1);
    }

    #[test]
    fn exact_match_beats_partial_matches() {
        let items = vec![Item::new(1, "alpha"), Item::new(2, "alpha-2")];
        assert_eq!(find_one(&items, "alpha").unwrap().id, 1);
    }

    #[test]
    fn numeric_id_resolves_exactly() {
        let items = vec![Item::new(1, "one"), Item::new(11, "eleven")];
        assert_eq!(find_one(&items, "1").unwrap().id, 1);
        assert_eq!(find_one(&items, "11").unwrap().id, 11);
    }

    #[test]
    fn no_candidates_is_no_match() {
        let items = webs();
        assert!(matches!(
            find_one(&items, "db"),
            Err(CliError::NoMatch { kind: "item", .. })
        ));
    }

    #[test]
    fn two_exact_matches_are_ambiguous() {
        let items = vec![Item::new(1, "api"), Item::new(2, "api")];
        assert!(matches!(
            find_one(&items, "api"),
            Err(CliError::Ambiguous { .. })
        ));
    }

    #[test]
    fn duplicate_entries_are_ambiguous() {
        let items = vec![Item::new(5, "cache"), Item::new(5, "cache")];
        assert!(matches!(
            find_one(&items, "cache"),
            Err(CliError::Ambiguous { .. })
        ));
    }

    #[test]
    fn ambiguity_sample_is_truncated() {
        let items: Vec<Item> = (1..=5).map(|i| Item::new(i, &format!("node-{i}"))).collect();
        let err = find_one(&items, "node").unwrap_err();
        match err {
            CliError::Ambiguous { sample, .. } => {
                assert_eq!(sample, "node-1, node-2, node-3, ...");
            }
            other => panic!("expected ambiguity, got {other:?}"),
        }
    }

    #[test]
    fn ambiguity_sample_without_overflow_has_no_ellipsis() {
        let items: Vec<Item> = (1..=3).map(|i| Item::new(i, &format!("node-{i}"))).collect();
        let err = find_one(&items, "node").unwrap_err();
        match err {
            CliError::Ambiguous { sample, .. } => assert!(!sample.contains("...")),
            other => panic!("expected ambiguity, got {other:?}"),
        }
    }

    fn arb_items() -> impl Strategy<Value = Vec<Item>> {
        prop::collection::vec((0u64..50, "[a-cA-C-]{1,5}"), 0..8).prop_map(|pairs| {
            pairs
                .into_iter()
                .map(|(id, name)| Item { id, name })
                .collect()
        })
    }

    fn position(items: &[Item], item: &Item) -> Option<usize> {
        items.iter().position(|candidate| std::ptr::eq(candidate, item))
    }

    proptest! {
        #[test]
        fn find_returns_matching_subsequence(items in arb_items(), term in "[a-c0-9]{0,3}") {
            let found = find(&items, &term);
            let positions: Vec<usize> = found
                .iter()
                .map(|item| position(&items, item).expect("item from input"))
                .collect();
            prop_assert!(positions.windows(2).all(|w| w[0] < w[1]));
            let lowered = term.to_lowercase();
            for item in found {
                prop_assert!(item.keys().iter().any(|k| k.to_lowercase().contains(&lowered)));
            }
        }

        #[test]
        fn find_one_returns_input_item(items in arb_items(), term in "[a-c0-9]{0,3}") {
            if let Ok(item) = find_one(&items, &term) {
                prop_assert!(position(&items, item).is_some());
                prop_assert!(match_kind(item, &term) != MatchKind::NoMatch);
            }
        }

        #[test]
        fn single_matching_item_always_resolves(id in 0u64..1000, name in "[a-z]{1,8}") {
            let items = vec![Item { id, name: name.clone() }];
            let term = name[..1].to_string();
            prop_assert_eq!(find_one(&items, &term).unwrap().id, id);
        }
    }
}
