use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use serde::{Deserialize, Serialize};

/// Identity of a row draft.
///
/// Positive ids come from the parent's persistence layer. Zero and negative
/// ids mark rows that have not been saved yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RowId(pub i64);

impl RowId {
    pub fn get(self) -> i64 {
        self.0
    }

    pub fn is_persisted(self) -> bool {
        self.0 > 0
    }
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Allocates ids for unsaved rows: -1, -2, -3, ...
///
/// Clones share the same counter, so ids stay unique across every table
/// holding a clone.
#[derive(Debug, Clone)]
pub struct IdAllocator {
    next: Arc<AtomicI64>,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self {
            next: Arc::new(AtomicI64::new(-1)),
        }
    }

    pub fn next_id(&self) -> RowId {
        RowId(self.next.fetch_sub(1, Ordering::SeqCst))
    }
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

/// The parent's last-known-good state of one row.
///
/// Cells are aligned to the column schema. Missing trailing cells and `None`
/// entries fall back to the column default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowSnapshot {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub cells: Vec<Option<String>>,
    #[serde(default)]
    pub is_new: bool,
}

impl RowSnapshot {
    /// A persisted row.
    pub fn saved<I, S>(id: i64, cells: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id: Some(id),
            cells: cells.into_iter().map(|c| Some(c.into())).collect(),
            is_new: false,
        }
    }

    /// A row the parent has not persisted yet.
    pub fn unsaved<I, S>(cells: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id: None,
            cells: cells.into_iter().map(|c| Some(c.into())).collect(),
            is_new: false,
        }
    }

    /// Mark the snapshot as a new row (starts in editing mode).
    pub fn flagged_new(mut self) -> Self {
        self.is_new = true;
        self
    }

    /// The parent-assigned id, if it is a real one.
    pub fn persisted_id(&self) -> Option<RowId> {
        self.id.filter(|id| *id > 0).map(RowId)
    }

    pub fn is_unsaved(&self) -> bool {
        self.persisted_id().is_none()
    }

    pub fn cell(&self, index: usize) -> Option<&str> {
        self.cells.get(index).and_then(|c| c.as_deref())
    }
}

/// Key the table uses to match snapshots to reconcilers across renders.
///
/// Rows carrying an id are matched by id; id-less rows fall back to their
/// position in the list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RowKey {
    Id(i64),
    Position(usize),
}

impl RowKey {
    pub fn of(snapshot: &RowSnapshot, position: usize) -> Self {
        match snapshot.id {
            Some(id) => Self::Id(id),
            None => Self::Position(position),
        }
    }
}
