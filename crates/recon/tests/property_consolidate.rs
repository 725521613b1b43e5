// Property-based tests for frame range consolidation and the join.
// CI: 256 cases (default). Soak: PROPTEST_CASES=10000 cargo test --release

use std::collections::BTreeSet;

use framefix_recon::consolidate::{consolidate, consolidate_unsorted, expand, ConsolidatedRange};
use framefix_recon::join::{join, Available, AvailableLocation};
use framefix_recon::translate::PathTranslator;
use proptest::prelude::*;

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

fn config_256() -> ProptestConfig {
    ProptestConfig {
        cases: std::env::var("PROPTEST_CASES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(256),
        failure_persistence: None,
        ..ProptestConfig::default()
    }
}

// ---------------------------------------------------------------------------
// Generators
// ---------------------------------------------------------------------------

/// Frames clustered in a small window so runs actually form.
fn arb_frames() -> impl Strategy<Value = Vec<u64>> {
    prop::collection::vec(0u64..400, 0..80)
}

fn arb_location() -> impl Strategy<Value = String> {
    prop_oneof![
        3 => r"/hpsans1[0-9]/production/[A-Z][a-z]{2,5}/reel[1-4]",
        1 => r"/local/[a-z]{1,6}",
    ]
}

// ---------------------------------------------------------------------------
// Consolidation
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(config_256())]

    #[test]
    fn expand_inverts_consolidate(frames in arb_frames()) {
        let set: BTreeSet<u64> = frames.iter().copied().collect();
        prop_assert_eq!(expand(&consolidate(&set)), set);
    }

    #[test]
    fn input_order_and_duplicates_do_not_matter(frames in arb_frames()) {
        let mut reversed = frames.clone();
        reversed.reverse();
        let mut doubled = frames.clone();
        doubled.extend(frames.iter().copied());
        let a = consolidate_unsorted(&frames);
        prop_assert_eq!(&a, &consolidate_unsorted(&reversed));
        prop_assert_eq!(&a, &consolidate_unsorted(&doubled));
    }

    #[test]
    fn ranges_are_maximal_and_ascending(frames in arb_frames()) {
        let result = consolidate_unsorted(&frames);
        let ranges = result.ranges();
        for r in ranges {
            prop_assert!(r.start <= r.end);
        }
        for pair in ranges.windows(2) {
            // A gap of at least one frame separates neighbours.
            prop_assert!(pair[0].end + 1 < pair[1].start);
        }
        prop_assert_eq!(result.is_no_data(), frames.is_empty());
    }

    #[test]
    fn rendered_text_parses_back(frames in arb_frames()) {
        let result = consolidate_unsorted(&frames);
        let parsed = ConsolidatedRange::parse(&result.to_string()).unwrap();
        prop_assert_eq!(parsed, result);
    }

    #[test]
    fn consolidate_is_idempotent(frames in arb_frames()) {
        let once = consolidate_unsorted(&frames);
        let twice = consolidate(&expand(&once));
        prop_assert_eq!(once, twice);
    }
}

// ---------------------------------------------------------------------------
// Join
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(config_256())]

    #[test]
    fn every_available_location_is_reported_once(
        declared in prop::collection::vec(arb_location(), 0..12),
        found in prop::collection::vec(arb_location(), 0..12),
    ) {
        let translator = PathTranslator::new(vec!["production".into()], "/facility/storage");
        let available: Available = found
            .iter()
            .map(|loc| {
                (
                    translator.translate(loc),
                    AvailableLocation {
                        frames: consolidate_unsorted(&[1, 2]),
                        sources: vec![loc.clone()],
                    },
                )
            })
            .collect();

        let out = join(&declared, &available, &translator);

        let distinct_declared: BTreeSet<String> =
            declared.iter().map(|d| translator.translate(d)).collect();
        prop_assert_eq!(out.rows.len(), distinct_declared.len());

        let mut reported: Vec<&str> = out
            .rows
            .iter()
            .filter(|r| !r.frames.is_no_data())
            .chain(&out.unmatched)
            .map(|r| r.canonical.as_str())
            .collect();
        reported.sort_unstable();
        let expected: Vec<&str> = available.keys().map(String::as_str).collect();
        prop_assert_eq!(reported, expected);
    }
}
