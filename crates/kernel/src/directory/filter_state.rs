//! Mutable filter state for one directory view.

use super::types::{IdFilter, ListingFilter, ListingSort};
use crate::config::ListingLimits;

/// Current filter plus a generation that advances on every mutation.
///
/// Each setter is a refetch trigger; the generation lets the fetch
/// controller tell which response belongs to the latest filter.
#[derive(Debug, Clone)]
pub struct FilterState {
    filter: ListingFilter,
    limits: ListingLimits,
    generation: u64,
}

impl FilterState {
    pub fn new(limits: ListingLimits) -> Self {
        Self {
            filter: ListingFilter::new(&limits),
            limits,
            generation: 0,
        }
    }

    /// Start from an existing filter (e.g. parsed from a query string).
    pub fn from_filter(mut filter: ListingFilter, limits: ListingLimits) -> Self {
        filter.limit = limits.clamp(filter.limit);
        Self {
            filter,
            limits,
            generation: 0,
        }
    }

    pub fn filter(&self) -> &ListingFilter {
        &self.filter
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn limits(&self) -> ListingLimits {
        self.limits
    }

    pub fn set_category(&mut self, category: IdFilter) -> u64 {
        self.filter.category = category;
        self.filter.offset = 0;
        self.bump()
    }

    pub fn set_market(&mut self, market: IdFilter) -> u64 {
        self.filter.market = market;
        self.filter.offset = 0;
        self.bump()
    }

    /// Blank text clears the search.
    pub fn set_search(&mut self, text: Option<String>) -> u64 {
        self.filter.search_text = text
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());
        self.filter.offset = 0;
        self.bump()
    }

    pub fn set_sort(&mut self, sort: ListingSort) -> u64 {
        self.filter.sort = sort;
        self.filter.offset = 0;
        self.bump()
    }

    pub fn set_offset(&mut self, offset: u64) -> u64 {
        self.filter.offset = offset;
        self.bump()
    }

    pub fn set_limit(&mut self, limit: u32) -> u64 {
        self.filter.limit = self.limits.clamp(limit);
        self.bump()
    }

    pub fn next_page(&mut self) -> u64 {
        self.filter.offset = self
            .filter
            .offset
            .saturating_add(u64::from(self.filter.limit));
        self.bump()
    }

    /// Steps back one page, stopping at offset 0.
    pub fn prev_page(&mut self) -> u64 {
        self.filter.offset = self
            .filter
            .offset
            .saturating_sub(u64::from(self.filter.limit));
        self.bump()
    }

    pub fn reset(&mut self) -> u64 {
        self.filter = ListingFilter::new(&self.limits);
        self.bump()
    }

    /// Replace the whole filter in one mutation.
    pub fn replace(&mut self, mut filter: ListingFilter) -> u64 {
        filter.limit = self.limits.clamp(filter.limit);
        self.filter = filter;
        self.bump()
    }

    /// Advance the generation without changing the filter (manual refresh).
    pub fn touch(&mut self) -> u64 {
        self.bump()
    }

    fn bump(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> FilterState {
        FilterState::new(ListingLimits::default())
    }

    #[test]
    fn mount_defaults() {
        let state = state();
        assert_eq!(state.generation(), 0);
        assert_eq!(state.filter().category, IdFilter::All);
        assert_eq!(state.filter().limit, 20);
        assert_eq!(state.filter().offset, 0);
    }

    #[test]
    fn every_setter_bumps_generation() {
        let mut state = state();
        assert_eq!(state.set_category(IdFilter::Id(1)), 1);
        assert_eq!(state.set_market(IdFilter::Id(2)), 2);
        assert_eq!(state.set_search(Some("honey".into())), 3);
        assert_eq!(state.set_sort(ListingSort::Name), 4);
        assert_eq!(state.set_offset(40), 5);
        assert_eq!(state.set_limit(10), 6);
        assert_eq!(state.next_page(), 7);
        assert_eq!(state.prev_page(), 8);
        assert_eq!(state.touch(), 9);
        assert_eq!(state.reset(), 10);
    }

    #[test]
    fn filter_changes_reset_offset() {
        let mut state = state();
        state.set_offset(40);
        state.set_market(IdFilter::Id(3));
        assert_eq!(state.filter().offset, 0);

        state.set_offset(40);
        state.set_search(Some("baskets".into()));
        assert_eq!(state.filter().offset, 0);
    }

    #[test]
    fn paging_stays_non_negative() {
        let mut state = state();
        state.prev_page();
        assert_eq!(state.filter().offset, 0);

        state.next_page();
        state.next_page();
        assert_eq!(state.filter().offset, 40);
        state.prev_page();
        assert_eq!(state.filter().offset, 20);
    }

    #[test]
    fn limit_is_clamped() {
        let mut state = state();
        state.set_limit(0);
        assert_eq!(state.filter().limit, 1);
        state.set_limit(5_000);
        assert_eq!(state.filter().limit, 100);
    }

    #[test]
    fn blank_search_clears() {
        let mut state = state();
        state.set_search(Some("  ".into()));
        assert_eq!(state.filter().search_text, None);
    }

    #[test]
    fn reset_keeps_generation_monotonic() {
        let mut state = state();
        state.set_category(IdFilter::Id(9));
        state.reset();
        assert_eq!(state.filter().category, IdFilter::All);
        assert_eq!(state.generation(), 2);
    }
}
