//! Ordered page slots with reservations.
//!
//! Sources finish preparing in any order, but their pages must land in
//! file list order. Every slot is tagged with the list position (the
//! *owner*) of the file it belongs to, and slots are kept sorted by owner.
//! When a file at position `o` is inserted, every earlier position that
//! has not shown up yet gets a [`Slot::Reserved`] placeholder, so the
//! target index of a one-page file is its list position whenever all
//! earlier files contributed a single page.
//!
//! Reservations never reach the output: [`SlotSequence::pages`] skips them.

use std::ops::Range;

/// A position in the output page sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Slot<P> {
    /// Placeholder kept for a file that has not been inserted yet.
    Reserved {
        /// List position of the file the slot is kept for.
        owner: usize,
    },
    /// A real page.
    Occupied {
        /// List position of the file the page came from.
        owner: usize,
        /// The page itself.
        page: P,
    },
}

impl<P> Slot<P> {
    /// List position of the file this slot belongs to.
    pub fn owner(&self) -> usize {
        match self {
            Self::Reserved { owner } | Self::Occupied { owner, .. } => *owner,
        }
    }

    /// Whether this slot is a placeholder.
    pub fn is_reserved(&self) -> bool {
        matches!(self, Self::Reserved { .. })
    }

    /// The page held by this slot, if any.
    pub fn page(&self) -> Option<&P> {
        match self {
            Self::Reserved { .. } => None,
            Self::Occupied { page, .. } => Some(page),
        }
    }
}

/// Sequence of slots sorted by owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotSequence<P> {
    slots: Vec<Slot<P>>,
}

impl<P> Default for SlotSequence<P> {
    fn default() -> Self {
        Self { slots: Vec::new() }
    }
}

impl<P> SlotSequence<P> {
    /// Create an empty sequence.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of slots, reservations included.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether the sequence has no slots at all.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Number of real pages.
    pub fn page_count(&self) -> usize {
        self.slots.iter().filter(|s| !s.is_reserved()).count()
    }

    /// Slot at `index`.
    pub fn get(&self, index: usize) -> Option<&Slot<P>> {
        self.slots.get(index)
    }

    /// Whether the slot at `index` is a placeholder.
    pub fn is_reserved(&self, index: usize) -> bool {
        self.slots.get(index).is_some_and(Slot::is_reserved)
    }

    /// Find the index the next page of `owner` goes to.
    ///
    /// Reserves slots for earlier owners that have none and releases the
    /// reservation held for `owner`, if any. The returned index is free:
    /// inserting there keeps the sequence sorted and places the page after
    /// pages `owner` already has.
    pub fn resolve(&mut self, owner: usize) -> usize {
        for earlier in 0..owner {
            let at = self.lower_bound(earlier);
            if self.slots.get(at).is_none_or(|s| s.owner() != earlier) {
                self.slots.insert(at, Slot::Reserved { owner: earlier });
            }
        }

        if let Some(at) = self.reservation_of(owner) {
            self.slots.remove(at);
            return at;
        }

        self.upper_bound(owner)
    }

    /// Insert one page for `owner` and return its index.
    pub fn insert(&mut self, owner: usize, page: P) -> usize {
        let at = self.resolve(owner);
        self.slots.insert(at, Slot::Occupied { owner, page });
        at
    }

    /// Insert a run of pages for `owner`, contiguously and in order.
    ///
    /// Returns the range of indices the pages now occupy. An empty run
    /// leaves the sequence untouched.
    pub fn insert_run<I>(&mut self, owner: usize, pages: I) -> Range<usize>
    where
        I: IntoIterator<Item = P>,
    {
        let mut pages = pages.into_iter().peekable();
        if pages.peek().is_none() {
            let at = self.upper_bound(owner);
            return at..at;
        }

        let start = self.resolve(owner);
        let mut end = start;
        for page in pages {
            self.slots.insert(end, Slot::Occupied { owner, page });
            end += 1;
        }
        start..end
    }

    /// Drop the reservation held for `owner`, if any.
    ///
    /// Returns `true` if a reservation was released.
    pub fn release(&mut self, owner: usize) -> bool {
        match self.reservation_of(owner) {
            Some(at) => {
                self.slots.remove(at);
                true
            }
            None => false,
        }
    }

    /// Remove the slot at `index`, returning its page if it held one.
    pub fn remove(&mut self, index: usize) -> Option<P> {
        if index >= self.slots.len() {
            return None;
        }
        match self.slots.remove(index) {
            Slot::Occupied { page, .. } => Some(page),
            Slot::Reserved { .. } => None,
        }
    }

    /// Real pages in output order.
    pub fn pages(&self) -> impl Iterator<Item = &P> {
        self.slots.iter().filter_map(Slot::page)
    }

    /// Consume the sequence, returning the real pages in output order.
    pub fn into_pages(self) -> Vec<P> {
        self.slots
            .into_iter()
            .filter_map(|slot| match slot {
                Slot::Occupied { page, .. } => Some(page),
                Slot::Reserved { .. } => None,
            })
            .collect()
    }

    fn reservation_of(&self, owner: usize) -> Option<usize> {
        let at = self.lower_bound(owner);
        match self.slots.get(at) {
            Some(Slot::Reserved { owner: o }) if *o == owner => Some(at),
            _ => None,
        }
    }

    fn lower_bound(&self, owner: usize) -> usize {
        self.slots.partition_point(|s| s.owner() < owner)
    }

    fn upper_bound(&self, owner: usize) -> usize {
        self.slots.partition_point(|s| s.owner() <= owner)
    }
}
