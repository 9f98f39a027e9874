//! Suggestion (autocomplete) lists for cells whose column offers suggestions.
//!
//! A list closes a short while after its cell loses focus rather than
//! immediately, so a pointer pick inside the list can land first. The pending
//! close runs on the tokio runtime and is cancelled when the list is reopened,
//! picked from, or dropped.

mod filter;

pub use filter::{FilterMatch, fuzzy_filter};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock, Weak};
use std::time::Duration;

use log::{debug, trace};
use tokio_util::sync::CancellationToken;

use crate::table::CellFocus;

#[derive(Debug, Default)]
struct SuggestInner {
    /// Cell the list is bound to.
    target: Option<CellFocus>,
    options: Vec<String>,
    filtered: Vec<FilterMatch>,
    highlight: usize,
    /// The user moved the highlight since the last refilter.
    navigated: bool,
    open: bool,
    limit: usize,
    /// Generation and token of the armed deferred close.
    pending_close: Option<(u64, CancellationToken)>,
    generation: u64,
}

impl SuggestInner {
    fn visible(&self) -> impl Iterator<Item = &String> {
        self.filtered
            .iter()
            .take(self.limit)
            .filter_map(|m| self.options.get(m.index))
    }

    fn visible_len(&self) -> usize {
        self.filtered.len().min(self.limit)
    }

    fn cancel_pending(&mut self) {
        if let Some((_, token)) = self.pending_close.take() {
            token.cancel();
        }
    }

    fn close(&mut self) {
        self.cancel_pending();
        self.open = false;
        self.target = None;
        self.filtered.clear();
        self.highlight = 0;
        self.navigated = false;
    }
}

/// An autocomplete list bound to at most one cell at a time.
#[derive(Debug)]
pub struct SuggestionList {
    inner: Arc<RwLock<SuggestInner>>,
    dirty: Arc<AtomicBool>,
}

impl SuggestionList {
    /// Create a closed list showing at most `limit` suggestions.
    pub fn new(limit: usize) -> Self {
        Self {
            inner: Arc::new(RwLock::new(SuggestInner {
                limit: limit.max(1),
                ..Default::default()
            })),
            dirty: Arc::new(AtomicBool::new(false)),
        }
    }

    // -------------------------------------------------------------------------
    // Read methods
    // -------------------------------------------------------------------------

    pub fn is_open(&self) -> bool {
        self.inner.read().map(|g| g.open).unwrap_or(false)
    }

    /// A deferred close is waiting to fire.
    pub fn is_closing(&self) -> bool {
        self.inner
            .read()
            .map(|g| g.pending_close.is_some())
            .unwrap_or(false)
    }

    pub fn target(&self) -> Option<CellFocus> {
        self.inner.read().ok().and_then(|g| g.target)
    }

    /// Labels currently shown, best match first.
    pub fn visible(&self) -> Vec<String> {
        self.inner
            .read()
            .map(|g| g.visible().cloned().collect())
            .unwrap_or_default()
    }

    pub fn highlight_index(&self) -> usize {
        self.inner.read().map(|g| g.highlight).unwrap_or(0)
    }

    pub fn highlighted(&self) -> Option<String> {
        self.inner
            .read()
            .ok()
            .and_then(|g| g.visible().nth(g.highlight).cloned())
    }

    /// The user picked a row in the list with the keyboard.
    pub fn has_navigated(&self) -> bool {
        self.inner.read().map(|g| g.navigated).unwrap_or(false)
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::SeqCst)
    }

    pub fn clear_dirty(&self) {
        self.dirty.store(false, Ordering::SeqCst);
    }

    // -------------------------------------------------------------------------
    // Write methods
    // -------------------------------------------------------------------------

    /// Open the list for `target`, filtered by the cell's current value.
    pub fn open_for(&self, target: CellFocus, options: Vec<String>, query: &str) {
        if let Ok(mut guard) = self.inner.write() {
            guard.cancel_pending();
            guard.target = Some(target);
            guard.options = options;
            guard.filtered = fuzzy_filter(query, &guard.options);
            guard.highlight = 0;
            guard.navigated = false;
            guard.open = !guard.filtered.is_empty();
            trace!("suggestions for {target:?}: {} match(es)", guard.filtered.len());
            self.dirty.store(true, Ordering::SeqCst);
        }
    }

    /// Refilter after the bound cell's value changed.
    pub fn refilter(&self, query: &str) {
        if let Ok(mut guard) = self.inner.write() {
            if guard.target.is_none() {
                return;
            }
            guard.filtered = fuzzy_filter(query, &guard.options);
            guard.highlight = 0;
            guard.navigated = false;
            guard.open = !guard.filtered.is_empty();
            self.dirty.store(true, Ordering::SeqCst);
        }
    }

    /// Move the highlight, clamped to the visible entries.
    pub fn move_highlight(&self, delta: isize) {
        if let Ok(mut guard) = self.inner.write() {
            let len = guard.visible_len();
            if !guard.open || len == 0 {
                return;
            }
            let next = (guard.highlight as isize + delta).clamp(0, len as isize - 1);
            guard.highlight = next as usize;
            guard.navigated = true;
            self.dirty.store(true, Ordering::SeqCst);
        }
    }

    /// Pick a visible entry. Closes the list and returns the bound cell with
    /// the chosen value.
    ///
    /// Works while a deferred close is pending, which is what the delay is for.
    pub fn pick(&self, index: usize) -> Option<(CellFocus, String)> {
        let mut guard = self.inner.write().ok()?;
        if !guard.open {
            return None;
        }
        let value = guard.visible().nth(index).cloned()?;
        let target = guard.target?;
        guard.close();
        self.dirty.store(true, Ordering::SeqCst);
        debug!("suggestion picked for {target:?}: {value}");
        Some((target, value))
    }

    pub fn pick_highlighted(&self) -> Option<(CellFocus, String)> {
        let index = self.highlight_index();
        self.pick(index)
    }

    /// Close immediately.
    pub fn close(&self) {
        if let Ok(mut guard) = self.inner.write() {
            if guard.open || guard.target.is_some() {
                self.dirty.store(true, Ordering::SeqCst);
            }
            guard.close();
        }
    }

    /// Close after `delay` unless reopened, picked from, or dropped first.
    ///
    /// Without a tokio runtime the list closes immediately.
    pub fn close_deferred(&self, delay: Duration) {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            self.close();
            return;
        };

        let token = CancellationToken::new();
        let generation = match self.inner.write() {
            Ok(mut guard) => {
                if !guard.open {
                    guard.close();
                    return;
                }
                guard.cancel_pending();
                guard.generation += 1;
                let generation = guard.generation;
                guard.pending_close = Some((generation, token.clone()));
                generation
            }
            Err(_) => return,
        };

        let inner: Weak<RwLock<SuggestInner>> = Arc::downgrade(&self.inner);
        let dirty = Arc::downgrade(&self.dirty);
        handle.spawn(async move {
            tokio::select! {
                biased;
                _ = token.cancelled() => {}
                _ = tokio::time::sleep(delay) => {
                    let Some(inner) = inner.upgrade() else { return };
                    if let Ok(mut guard) = inner.write() {
                        // A newer close may have been armed since.
                        if guard.pending_close.as_ref().is_some_and(|(g, _)| *g == generation) {
                            guard.pending_close = None;
                            guard.close();
                            trace!("suggestions closed after blur");
                        }
                    }
                    if let Some(dirty) = dirty.upgrade() {
                        dirty.store(true, Ordering::SeqCst);
                    }
                }
            }
        });
    }
}

impl Drop for SuggestionList {
    fn drop(&mut self) {
        if let Ok(mut guard) = self.inner.write() {
            guard.cancel_pending();
        }
    }
}
