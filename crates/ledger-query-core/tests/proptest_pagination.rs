// crates/ledger-query-core/tests/proptest_pagination.rs
// ============================================================================
// Module: Pagination Property-Based Tests
// Description: Property tests for cursor pagination invariants.
// Purpose: Detect window and cursor violations across wide input ranges.
// ============================================================================

//! Property-based tests for pagination invariants.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    clippy::cast_possible_truncation,
    reason = "Test-only assertions and helpers are permitted."
)]

use ledger_query_core::AccountId;
use ledger_query_core::BlockHeight;
use ledger_query_core::MAX_PAGE_SIZE;
use ledger_query_core::TxHash;
use ledger_query_core::TxLocation;
use ledger_query_core::TxPageRequest;
use ledger_query_core::TxRef;
use ledger_query_core::runtime::paginate_transactions;
use proptest::prelude::*;

/// Builds a canonically ordered candidate set of `count` refs, one per block.
fn candidate_set(count: usize) -> Vec<TxRef> {
    (0..count)
        .map(|position| TxRef {
            hash: TxHash::new(format!("tx-{position:04}")),
            creator_id: AccountId::new("alice@wonderland"),
            location: TxLocation {
                height: BlockHeight::from_raw(position as u64 + 1).expect("nonzero height"),
                index: 0,
            },
        })
        .collect()
}

proptest! {
    #[test]
    fn window_never_exceeds_effective_page_size(
        count in 0usize..64,
        page_size in 0u32..(MAX_PAGE_SIZE * 2),
    ) {
        let candidates = candidate_set(count);
        let page = TxPageRequest::new(None, page_size);
        let resolved = paginate_transactions(&candidates, &page).expect("no cursor supplied");
        prop_assert!(resolved.refs.len() <= page.effective_page_size() as usize);
        prop_assert_eq!(resolved.total, count as u64);
    }

    #[test]
    fn next_cursor_present_iff_candidates_remain(
        count in 0usize..64,
        page_size in 1u32..16,
    ) {
        let candidates = candidate_set(count);
        let page = TxPageRequest::new(None, page_size);
        let resolved = paginate_transactions(&candidates, &page).expect("no cursor supplied");
        if (page_size as usize) < count {
            let last = resolved.refs.last().expect("non-empty window");
            prop_assert_eq!(resolved.next_tx_hash.as_ref(), Some(&last.hash));
        } else {
            prop_assert!(resolved.next_tx_hash.is_none());
        }
    }

    #[test]
    fn cursor_walk_visits_every_candidate_once(
        count in 1usize..48,
        page_size in 1u32..8,
    ) {
        let candidates = candidate_set(count);
        let mut cursor: Option<TxHash> = None;
        let mut visited: Vec<TxHash> = Vec::new();
        loop {
            let page = TxPageRequest::new(cursor.clone(), page_size);
            let resolved = paginate_transactions(&candidates, &page)
                .expect("cursor always comes from the previous page");
            visited.extend(resolved.refs.iter().map(|tx_ref| tx_ref.hash.clone()));
            match resolved.next_tx_hash {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }
        let expected: Vec<TxHash> =
            candidates.iter().map(|tx_ref| tx_ref.hash.clone()).collect();
        prop_assert_eq!(visited, expected);
    }

    #[test]
    fn unknown_cursor_always_errors(
        count in 0usize..32,
        page_size in 1u32..8,
    ) {
        let candidates = candidate_set(count);
        let page = TxPageRequest::new(Some(TxHash::new("absent")), page_size);
        prop_assert!(paginate_transactions(&candidates, &page).is_err());
    }
}
