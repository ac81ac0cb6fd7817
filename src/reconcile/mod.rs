// Keymerge - Reconcile Module
//
// Pure merge of keychain-sourced credential records with database-sourced
// metadata records. No I/O, no shared state.

mod merge;

pub use merge::{is_merge_candidate, match_for_merge, merge, MergeMatch, MergeOutcome};
