//! Resume position tracking
//!
//! A resumed crawl replays the listing from the first partition and skips
//! items until it reaches the recorded resume target. [`ResumeState`] makes
//! that skip/resume boundary an explicit state machine that can be driven
//! without any I/O.
//!
//! Where the crawl starts is decided once, before any store is opened for
//! writing, by [`plan_resume`].

use crate::store::{CheckpointStore, CrawlCursor, CursorStore};
use crate::HarvestError;
use std::fmt;
use std::path::Path;

/// Where a run starts
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResumeStart {
    /// `--fresh`: saved positions are ignored
    Fresh,

    /// Nothing harvested yet
    ColdStart,

    /// Resume after the item the cursor records as complete
    AfterCursor(String),

    /// Reprocess this item, then continue after it
    AtItem(String),
}

impl ResumeStart {
    /// Initial skip/resume state for this start
    pub fn initial_state(&self) -> ResumeState {
        match self {
            Self::Fresh | Self::ColdStart => ResumeState::Active,
            Self::AfterCursor(id) => ResumeState::resume_from(id.clone(), Boundary::AfterTarget),
            Self::AtItem(id) => ResumeState::resume_from(id.clone(), Boundary::AtTarget),
        }
    }
}

impl fmt::Display for ResumeStart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fresh => write!(f, "fresh crawl from the first partition"),
            Self::ColdStart => write!(f, "cold start (no previous output)"),
            Self::AfterCursor(id) => write!(f, "resume after item {} (crawl cursor)", id),
            Self::AtItem(id) => write!(f, "resume at item {} (reprocessed)", id),
        }
    }
}

/// Startup decision: where to resume and which partial rows to discard
#[derive(Debug, Clone)]
pub struct ResumePlan {
    pub start: ResumeStart,

    /// Item whose review rows must be removed before the run starts
    pub discard: Option<String>,

    /// Cursor to continue from; must be persisted before `discard` is purged
    pub cursor: CrawlCursor,
}

/// Decides where the run starts, without modifying anything on disk
///
/// 1. A cursor's in-progress item was interrupted mid-write: discard its rows.
/// 2. `fresh` ignores every saved position.
/// 3. A cursor with a resume point reprocesses that item.
/// 4. Otherwise a cursor resumes after its last completed item.
/// 5. Without a cursor, the item on the review store's last row is discarded
///    and reprocessed, since nothing says whether it finished. The returned
///    cursor records that item as both in progress and the resume point, so
///    an interrupted recovery resumes at the same item.
pub fn plan_resume(
    reviews_path: &Path,
    cursor_path: &Path,
    fresh: bool,
) -> Result<ResumePlan, HarvestError> {
    let saved = CursorStore::load(cursor_path)?;
    let has_cursor = saved.is_some();
    let mut cursor = saved.unwrap_or_default();
    let mut discard = cursor.in_progress_item_id.clone();

    let start = if fresh {
        ResumeStart::Fresh
    } else if let Some(id) = &cursor.resume_at_item_id {
        ResumeStart::AtItem(id.clone())
    } else if let Some(id) = &cursor.last_completed_item_id {
        ResumeStart::AfterCursor(id.clone())
    } else if has_cursor {
        ResumeStart::ColdStart
    } else {
        let checkpoint = CheckpointStore::load(reviews_path)?;
        match checkpoint.last_processed_item_id() {
            Some(last) => {
                let last = last.to_string();
                discard = Some(last.clone());
                cursor.in_progress_item_id = Some(last.clone());
                cursor.resume_at_item_id = Some(last.clone());
                ResumeStart::AtItem(last)
            }
            None => ResumeStart::ColdStart,
        }
    };

    Ok(ResumePlan {
        start,
        discard,
        cursor,
    })
}

/// How the resume target itself is treated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Boundary {
    /// The target finished in an earlier run; skip it and resume after it
    AfterTarget,

    /// The target may be incomplete; process it again
    AtTarget,
}

/// Whether the driver should work on an item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemDisposition {
    /// Already handled by an earlier run: no fetch, no write
    Skip,

    /// Eligible for processing
    Process,
}

/// Skip/resume state of the crawl
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResumeState {
    /// Skipping items until `target` is seen
    Skipping { target: String, boundary: Boundary },

    /// The target was just seen; the next item starts active processing
    Resumed,

    /// Every item is eligible
    Active,
}

impl ResumeState {
    /// Starts skipping towards `target`
    pub fn resume_from(target: impl Into<String>, boundary: Boundary) -> Self {
        Self::Skipping {
            target: target.into(),
            boundary,
        }
    }

    /// Feeds the next listed item and returns what to do with it
    pub fn observe(&mut self, item_id: &str) -> ItemDisposition {
        match self {
            Self::Skipping { target, boundary } => {
                if target.as_str() != item_id {
                    return ItemDisposition::Skip;
                }
                let disposition = match boundary {
                    Boundary::AfterTarget => ItemDisposition::Skip,
                    Boundary::AtTarget => ItemDisposition::Process,
                };
                *self = Self::Resumed;
                disposition
            }
            Self::Resumed => {
                *self = Self::Active;
                ItemDisposition::Process
            }
            Self::Active => ItemDisposition::Process,
        }
    }

    /// Returns true while the resume target has not been reached
    pub fn is_skipping(&self) -> bool {
        matches!(self, Self::Skipping { .. })
    }

    /// Resume target still being searched for, if any
    pub fn pending_target(&self) -> Option<&str> {
        match self {
            Self::Skipping { target, .. } => Some(target.as_str()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dispositions(state: &mut ResumeState, ids: &[&str]) -> Vec<ItemDisposition> {
        ids.iter().map(|id| state.observe(id)).collect()
    }

    #[test]
    fn test_active_processes_everything() {
        let mut state = ResumeState::Active;
        assert_eq!(
            dispositions(&mut state, &["1", "2"]),
            vec![ItemDisposition::Process, ItemDisposition::Process]
        );
    }

    #[test]
    fn test_after_target_skips_target() {
        let mut state = ResumeState::resume_from("3", Boundary::AfterTarget);
        let result = dispositions(&mut state, &["1", "2", "3", "4", "5"]);

        use ItemDisposition::*;
        assert_eq!(result, vec![Skip, Skip, Skip, Process, Process]);
        assert_eq!(state, ResumeState::Active);
    }

    #[test]
    fn test_at_target_reprocesses_target() {
        let mut state = ResumeState::resume_from("3", Boundary::AtTarget);
        let result = dispositions(&mut state, &["1", "2", "3", "4"]);

        use ItemDisposition::*;
        assert_eq!(result, vec![Skip, Skip, Process, Process]);
    }

    #[test]
    fn test_resumed_is_the_boundary_state() {
        let mut state = ResumeState::resume_from("a", Boundary::AfterTarget);
        state.observe("a");
        assert_eq!(state, ResumeState::Resumed);
        assert!(!state.is_skipping());

        state.observe("b");
        assert_eq!(state, ResumeState::Active);
    }

    mod planning {
        use super::super::*;
        use std::fs;
        use tempfile::TempDir;

        fn paths(dir: &TempDir) -> (std::path::PathBuf, std::path::PathBuf) {
            (dir.path().join("reviews.csv"), dir.path().join("cursor.json"))
        }

        #[test]
        fn test_cold_start_without_files() {
            let dir = TempDir::new().unwrap();
            let (reviews, cursor) = paths(&dir);

            let plan = plan_resume(&reviews, &cursor, false).unwrap();
            assert_eq!(plan.start, ResumeStart::ColdStart);
            assert_eq!(plan.discard, None);
            assert_eq!(plan.start.initial_state(), ResumeState::Active);
        }

        #[test]
        fn test_cursor_takes_precedence_over_review_store() {
            let dir = TempDir::new().unwrap();
            let (reviews, cursor) = paths(&dir);
            fs::write(&reviews, "Id,Comment,Label\n7,a,1\n9,b,0\n").unwrap();
            fs::write(
                &cursor,
                r#"{"last_completed_item_id":"7","in_progress_item_id":"9","updated_at":null}"#,
            )
            .unwrap();

            let plan = plan_resume(&reviews, &cursor, false).unwrap();
            assert_eq!(plan.start, ResumeStart::AfterCursor("7".to_string()));
            assert_eq!(plan.discard.as_deref(), Some("9"));
        }

        #[test]
        fn test_last_review_row_without_cursor() {
            let dir = TempDir::new().unwrap();
            let (reviews, cursor) = paths(&dir);
            fs::write(&reviews, "Id,Comment,Label\n7,a,1\n9,b,0\n").unwrap();

            let plan = plan_resume(&reviews, &cursor, false).unwrap();
            assert_eq!(plan.start, ResumeStart::AtItem("9".to_string()));
            assert_eq!(plan.discard.as_deref(), Some("9"));
            assert_eq!(plan.cursor.in_progress_item_id.as_deref(), Some("9"));
            assert_eq!(plan.cursor.resume_at_item_id.as_deref(), Some("9"));
            assert_eq!(
                plan.start.initial_state(),
                ResumeState::resume_from("9", Boundary::AtTarget)
            );
            // Planning alone writes nothing
            assert!(!cursor.exists());
        }

        #[test]
        fn test_saved_resume_point_is_reprocessed() {
            let dir = TempDir::new().unwrap();
            let (reviews, cursor) = paths(&dir);
            fs::write(&reviews, "Id,Comment,Label\n7,a,1\n").unwrap();
            fs::write(&cursor, r#"{"resume_at_item_id":"9"}"#).unwrap();

            let plan = plan_resume(&reviews, &cursor, false).unwrap();
            assert_eq!(plan.start, ResumeStart::AtItem("9".to_string()));
            assert_eq!(plan.discard, None);
        }

        #[test]
        fn test_fresh_ignores_positions_but_discards_interrupted_item() {
            let dir = TempDir::new().unwrap();
            let (reviews, cursor) = paths(&dir);
            fs::write(&reviews, "Id,Comment,Label\n7,a,1\n").unwrap();
            fs::write(
                &cursor,
                r#"{"last_completed_item_id":"3","in_progress_item_id":"7","updated_at":null}"#,
            )
            .unwrap();

            let plan = plan_resume(&reviews, &cursor, true).unwrap();
            assert_eq!(plan.start, ResumeStart::Fresh);
            assert_eq!(plan.discard.as_deref(), Some("7"));
        }

        #[test]
        fn test_cursor_without_completed_item_starts_cold() {
            let dir = TempDir::new().unwrap();
            let (reviews, cursor) = paths(&dir);
            fs::write(&reviews, "Id,Comment,Label\n7,a,1\n").unwrap();
            fs::write(
                &cursor,
                r#"{"last_completed_item_id":null,"in_progress_item_id":"7","updated_at":null}"#,
            )
            .unwrap();

            let plan = plan_resume(&reviews, &cursor, false).unwrap();
            assert_eq!(plan.start, ResumeStart::ColdStart);
            assert_eq!(plan.discard.as_deref(), Some("7"));
        }
    }

    #[test]
    fn test_missing_target_keeps_skipping() {
        let mut state = ResumeState::resume_from("gone", Boundary::AfterTarget);
        let result = dispositions(&mut state, &["1", "2"]);

        assert!(result.iter().all(|d| *d == ItemDisposition::Skip));
        assert_eq!(state.pending_target(), Some("gone"));
    }
}
