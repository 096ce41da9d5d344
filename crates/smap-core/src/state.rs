//! Per-run generation state: emitted URL set and entry budget.
//!
//! A [`GenerationState`] is created by exactly one run, threaded by mutable
//! reference through the walker and expander, and dropped when the run ends.
//! It is never shared between runs.
//!
//! Invariants:
//!
//! - `emitted_urls` holds no duplicate (it is a set)
//! - `emitted_count` never exceeds the ceiling
//! - once `exceeded_cap` is set, nothing more is reserved or emitted
//!
//! `emitted_count` and the size of `emitted_urls` may differ: virtual children
//! share the budget but are inserted without a prior existence check.

use std::collections::HashSet;

/// Maximum number of entries in one sitemap document.
pub const MAX_SITEMAP_ENTRIES: usize = 50_000;

/// Outcome of offering a canonical URL to the state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// The URL was recorded and one unit of budget reserved.
    Admitted,
    /// The URL was emitted before; nothing changed.
    Duplicate,
    /// The ceiling was reached; the run must stop.
    CapReached,
}

/// Mutable state owned by a single generation run.
#[derive(Debug)]
pub struct GenerationState {
    emitted_urls: HashSet<String>,
    emitted_count: usize,
    exceeded_cap: bool,
    host_language: Option<String>,
    ceiling: usize,
}

impl GenerationState {
    /// Fresh state for a run on a host with the given default language.
    #[must_use]
    pub fn new(host_language: Option<String>) -> Self {
        Self::with_ceiling(host_language, MAX_SITEMAP_ENTRIES)
    }

    pub(crate) fn with_ceiling(host_language: Option<String>, ceiling: usize) -> Self {
        Self {
            emitted_urls: HashSet::new(),
            emitted_count: 0,
            exceeded_cap: false,
            host_language,
            ceiling,
        }
    }

    /// Language bound to the requested host, used for language filtering only.
    #[must_use]
    pub fn host_language(&self) -> Option<&str> {
        self.host_language.as_deref()
    }

    /// Whether `url` has already been emitted (exact string comparison).
    #[must_use]
    pub fn contains(&self, url: &str) -> bool {
        self.emitted_urls.contains(url)
    }

    /// Insert `url` if it is new. Returns `false` for a repeat.
    pub fn try_add(&mut self, url: &str) -> bool {
        if self.emitted_urls.contains(url) {
            return false;
        }
        self.emitted_urls.insert(url.to_string())
    }

    /// Insert `url` without checking for an earlier emission.
    pub fn add_unchecked(&mut self, url: String) {
        self.emitted_urls.insert(url);
    }

    /// Reserve budget for one entry.
    ///
    /// Returns `false` once the ceiling has been reached; the first refusal
    /// marks the run as having exceeded the cap.
    pub fn try_reserve(&mut self) -> bool {
        if self.exceeded_cap || self.emitted_count >= self.ceiling {
            self.exceeded_cap = true;
            return false;
        }
        self.emitted_count += 1;
        true
    }

    /// Whether the budget is spent, checked before more content is looked at.
    ///
    /// A spent budget with content still to come marks the run as having
    /// exceeded the cap.
    pub fn close_if_full(&mut self) -> bool {
        if self.emitted_count >= self.ceiling {
            self.exceeded_cap = true;
        }
        self.exceeded_cap
    }

    /// Deduplicate, then reserve budget, then record `url`.
    ///
    /// A duplicate consumes no budget. A URL refused at the ceiling is not
    /// recorded.
    pub fn admit(&mut self, url: &str) -> Admission {
        if self.contains(url) {
            return Admission::Duplicate;
        }
        if !self.try_reserve() {
            return Admission::CapReached;
        }
        let added = self.try_add(url);
        debug_assert!(added);
        Admission::Admitted
    }

    /// Entries reserved so far.
    #[must_use]
    pub const fn emitted_count(&self) -> usize {
        self.emitted_count
    }

    /// Whether an eligible entry was refused at the ceiling.
    #[must_use]
    pub const fn exceeded_cap(&self) -> bool {
        self.exceeded_cap
    }

    /// Distinct URLs recorded so far.
    #[must_use]
    pub fn distinct_urls(&self) -> usize {
        self.emitted_urls.len()
    }
}
