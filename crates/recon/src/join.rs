use std::collections::{BTreeMap, BTreeSet, HashSet};

use crate::consolidate::{consolidate, expand, ConsolidatedRange};
use crate::model::{LocationFrames, ReportRow, ScriptRunRecord};
use crate::translate::PathTranslator;

/// Consolidated frames for one canonical location, ready to join.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvailableLocation {
    pub frames: ConsolidatedRange,
    pub sources: Vec<String>,
}

/// Keyed by canonical path.
pub type Available = BTreeMap<String, AvailableLocation>;

#[derive(Debug, Default)]
pub struct JoinOutcome {
    /// One row per distinct declared location, in work-order order.
    pub rows: Vec<ReportRow>,
    /// Available locations no declared location translated onto.
    pub unmatched: Vec<ReportRow>,
}

/// Consolidate every grouped frame set.
pub fn consolidate_locations(grouped: &LocationFrames) -> Available {
    grouped
        .iter()
        .map(|(path, set)| {
            (
                path.clone(),
                AvailableLocation {
                    frames: consolidate(&set.frames),
                    sources: set.sources.iter().cloned().collect(),
                },
            )
        })
        .collect()
}

/// Merge stored runs back into joinable locations: every stored range is
/// expanded, unioned per canonical path and consolidated again.
pub fn available_from_runs(runs: &[ScriptRunRecord]) -> Available {
    let mut merged: BTreeMap<String, (BTreeSet<u64>, BTreeSet<String>)> = BTreeMap::new();
    for row in runs.iter().flat_map(|run| &run.rows) {
        let (frames, sources) = merged.entry(row.canonical.clone()).or_default();
        frames.extend(expand(&row.frames));
        sources.extend(row.sources.iter().cloned());
    }
    merged
        .into_iter()
        .map(|(path, (frames, sources))| {
            (
                path,
                AvailableLocation {
                    frames: consolidate(&frames),
                    sources: sources.into_iter().collect(),
                },
            )
        })
        .collect()
}

/// Join available locations against the declared list.
///
/// Declared entries are translated before lookup. Entries that translate to
/// an already-emitted location are skipped, so duplicates in the work order
/// produce one row at their first position.
pub fn join(declared: &[String], available: &Available, translator: &PathTranslator) -> JoinOutcome {
    let mut rows = Vec::with_capacity(declared.len());
    let mut seen: HashSet<String> = HashSet::new();

    for location in declared {
        let canonical = translator.translate(location);
        if !seen.insert(canonical.clone()) {
            log::debug!("duplicate declared location '{location}'");
            continue;
        }

        match available.get(&canonical) {
            Some(found) => rows.push(ReportRow {
                location: location.clone(),
                canonical,
                frames: found.frames.clone(),
                sources: found.sources.clone(),
            }),
            None => {
                log::debug!("no frame data for declared location '{location}'");
                rows.push(ReportRow::no_data(location.clone(), canonical));
            }
        }
    }

    let unmatched = available
        .iter()
        .filter(|(canonical, _)| !seen.contains(*canonical))
        .map(|(canonical, found)| undeclared_row(canonical, found))
        .collect();

    JoinOutcome { rows, unmatched }
}

/// Without a work order every available location becomes a row, in
/// ascending canonical order.
pub fn rows_without_work_order(available: &Available) -> Vec<ReportRow> {
    available
        .iter()
        .map(|(canonical, found)| undeclared_row(canonical, found))
        .collect()
}

fn undeclared_row(canonical: &str, found: &AvailableLocation) -> ReportRow {
    ReportRow {
        location: canonical.to_string(),
        canonical: canonical.to_string(),
        frames: found.frames.clone(),
        sources: found.sources.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consolidate::FrameRange;

    fn translator() -> PathTranslator {
        PathTranslator::new(vec!["production".into()], "/facility/storage")
    }

    fn avail(entries: &[(&str, Option<(u64, u64)>)]) -> Available {
        entries
            .iter()
            .map(|(path, range)| {
                let frames = match range {
                    Some((a, b)) => ConsolidatedRange::Ranges(vec![FrameRange::new(*a, *b)]),
                    None => ConsolidatedRange::NoData,
                };
                (
                    path.to_string(),
                    AvailableLocation {
                        frames,
                        sources: vec![format!("/local{path}")],
                    },
                )
            })
            .collect()
    }

    #[test]
    fn declared_order_with_no_data_and_unmatched() {
        let available = avail(&[("A", Some((1, 3))), ("C", Some((7, 7)))]);
        let declared = vec!["A".to_string(), "B".to_string()];
        let out = join(&declared, &available, &translator());

        assert_eq!(out.rows.len(), 2);
        assert_eq!(out.rows[0].location, "A");
        assert_eq!(out.rows[0].frames.to_string(), "1-3");
        assert_eq!(out.rows[1].location, "B");
        assert!(out.rows[1].frames.is_no_data());
        assert!(out.rows[1].sources.is_empty());

        assert_eq!(out.unmatched.len(), 1);
        assert_eq!(out.unmatched[0].canonical, "C");
        assert_eq!(out.unmatched[0].frames.to_string(), "7");
    }

    #[test]
    fn declared_paths_are_translated() {
        let available = avail(&[("/facility/storage/production/Dune/reel1", Some((10, 12)))]);
        let declared = vec!["/hpsans13/production/Dune/reel1/".to_string()];
        let out = join(&declared, &available, &translator());
        assert_eq!(out.rows[0].location, "/hpsans13/production/Dune/reel1/");
        assert_eq!(out.rows[0].canonical, "/facility/storage/production/Dune/reel1");
        assert_eq!(out.rows[0].frames.to_string(), "10-12");
        assert!(out.unmatched.is_empty());
    }

    #[test]
    fn duplicate_declared_emits_once() {
        let available = avail(&[("A", Some((1, 1)))]);
        let declared = vec!["A".to_string(), "B".to_string(), "A".to_string()];
        let out = join(&declared, &available, &translator());
        let locations: Vec<_> = out.rows.iter().map(|r| r.location.as_str()).collect();
        assert_eq!(locations, vec!["A", "B"]);
    }

    #[test]
    fn matched_location_with_only_sentinels_reports_no_data() {
        let available = avail(&[("A", None)]);
        let out = join(&["A".to_string()], &available, &translator());
        assert!(out.rows[0].frames.is_no_data());
        assert_eq!(out.rows[0].sources, vec!["/localA"]);
    }

    #[test]
    fn stored_runs_merge_per_location() {
        use crate::consolidate::consolidate_unsorted;
        use crate::model::{SourceTool, WorkOrderHeader};

        let run = |user: &str, frames: &[u64]| ScriptRunRecord {
            user: user.into(),
            date: chrono::NaiveDate::from_ymd_opt(2023, 3, 23).unwrap(),
            tool: SourceTool::Baselight,
            source_file: format!("Baselight_{user}_20230323.txt"),
            header: WorkOrderHeader::default(),
            submitted_by: None,
            submitted_at: chrono::Utc::now(),
            rows: vec![ReportRow {
                location: "/hpsans13/production/a".into(),
                canonical: "/facility/storage/production/a".into(),
                frames: consolidate_unsorted(frames),
                sources: vec![format!("/{user}/production/a")],
            }],
        };
        let available = available_from_runs(&[run("u1", &[1, 2, 3]), run("u2", &[4, 9])]);
        let merged = &available["/facility/storage/production/a"];
        assert_eq!(merged.frames.to_string(), "1-4,9");
        assert_eq!(merged.sources, vec!["/u1/production/a", "/u2/production/a"]);
    }

    #[test]
    fn no_work_order_lists_everything_sorted() {
        let available = avail(&[("/b", Some((1, 2))), ("/a", None)]);
        let rows = rows_without_work_order(&available);
        let canon: Vec<_> = rows.iter().map(|r| r.canonical.as_str()).collect();
        assert_eq!(canon, vec!["/a", "/b"]);
    }
}
