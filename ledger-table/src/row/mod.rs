//! Per-row state: snapshots supplied by the parent, locally owned drafts and
//! the reconciler that keeps the two apart.

mod draft;
mod reconciler;
mod snapshot;

pub use draft::{CellDraft, RowDraft, RowMode};
pub use reconciler::{CellChange, CommitOutcome, RefreshOutcome, RowCommit, RowReconciler};
pub use snapshot::{IdAllocator, RowId, RowKey, RowSnapshot};
