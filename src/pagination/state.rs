//! Controller state and phases

use crate::types::{ArticleRecord, FilterParams, PageResult};
use serde::{Deserialize, Serialize};

/// Phase of the loading state machine
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadPhase {
    /// Nothing in flight
    Idle,
    /// First page of a new query in flight
    LoadingInitial,
    /// Next page in flight
    LoadingMore,
    /// Refresh of the current query in flight
    Refreshing,
    /// Last fetch failed; previous items are still shown
    Error,
}

/// Why a fetch was started
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum FetchReason {
    Initial,
    FilterChange,
    Refresh,
    LoadMore,
}

impl FetchReason {
    /// Page-1 fetches replace the list, everything else appends
    pub(crate) fn replaces(self) -> bool {
        !matches!(self, FetchReason::LoadMore)
    }

    pub(crate) fn phase(self) -> LoadPhase {
        match self {
            FetchReason::Initial | FetchReason::FilterChange => LoadPhase::LoadingInitial,
            FetchReason::Refresh => LoadPhase::Refreshing,
            FetchReason::LoadMore => LoadPhase::LoadingMore,
        }
    }
}

/// Snapshot of everything the presentation layer renders
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControllerState {
    /// Articles in page order, then in-page order
    pub accumulated_items: Vec<ArticleRecord>,
    /// A fetch is in flight
    pub is_loading: bool,
    /// A page-1 fetch is in flight
    pub is_initial_loading: bool,
    /// Message of the last failed fetch, cleared when a new fetch starts
    pub last_error: Option<String>,
    /// `active_params.page < total_pages`
    pub has_more: bool,
    /// Total matching articles reported by the server
    pub total_items: u64,
    /// Total pages reported by the server
    pub total_pages: u32,
    /// Parameters of the last applied page
    pub active_params: FilterParams,
    /// Page-1 query requested but not applied yet
    ///
    /// Survives a failed fetch, so refresh retries what the user asked for.
    pub requested_params: Option<FilterParams>,
    /// State machine phase
    pub phase: LoadPhase,
}

impl ControllerState {
    /// Empty state for a query that has not been fetched yet
    pub fn new(params: FilterParams) -> Self {
        Self {
            accumulated_items: Vec::new(),
            is_loading: false,
            is_initial_loading: false,
            last_error: None,
            has_more: false,
            total_items: 0,
            total_pages: 0,
            active_params: params.at_page(1),
            requested_params: None,
            phase: LoadPhase::Idle,
        }
    }

    /// Every page has been loaded and shown
    ///
    /// Drives the "no more news" footer.
    pub fn is_exhausted(&self) -> bool {
        !self.is_loading && !self.accumulated_items.is_empty() && !self.has_more
    }

    pub(crate) fn begin(&mut self, reason: FetchReason, params: &FilterParams) {
        self.is_loading = true;
        if params.page == 1 {
            self.is_initial_loading = true;
        }
        if reason.replaces() {
            self.requested_params = Some(params.clone());
        }
        self.last_error = None;
        self.phase = reason.phase();
    }

    /// Merge a fetched page; the server's `pages` is authoritative
    pub(crate) fn apply(&mut self, reason: FetchReason, params: FilterParams, page: PageResult) {
        if reason.replaces() {
            self.accumulated_items = page.items;
            self.requested_params = None;
        } else {
            self.accumulated_items.extend(page.items);
        }
        self.total_items = page.total_items;
        self.total_pages = page.total_pages;
        self.active_params = params;
        self.has_more = self.active_params.page < self.total_pages;
        self.phase = LoadPhase::Idle;
        self.finish_loading();
    }

    pub(crate) fn fail(&mut self, message: String) {
        self.last_error = Some(message);
        self.phase = LoadPhase::Error;
        self.finish_loading();
    }

    /// Live fetch ended without a result (cancelled by its own source)
    pub(crate) fn abandon(&mut self) {
        self.phase = LoadPhase::Idle;
        self.finish_loading();
    }

    fn finish_loading(&mut self) {
        self.is_loading = false;
        self.is_initial_loading = false;
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn page(page_number: u32, total_pages: u32, count: usize) -> PageResult {
        PageResult {
            items: (0..count)
                .map(|i| ArticleRecord {
                    title: format!("p{page_number}-{i}"),
                    link_url: format!("https://example.com/{page_number}/{i}"),
                    location: String::new(),
                    datetime: String::new(),
                    image_url: String::new(),
                    category: String::new(),
                    summary: String::new(),
                })
                .collect(),
            total_items: u64::from(total_pages) * count as u64,
            page_number,
            page_size: count as u32,
            total_pages,
        }
    }

    #[test]
    fn test_has_more_follows_pages() {
        let params = FilterParams::new(6);
        let mut state = ControllerState::new(params.clone());

        state.apply(FetchReason::LoadMore, params.at_page(2), page(2, 5, 6));
        assert!(state.has_more);

        state.apply(FetchReason::LoadMore, params.at_page(5), page(5, 5, 6));
        assert!(!state.has_more);
        assert!(state.is_exhausted());
    }

    #[test]
    fn test_pages_authoritative_over_item_count() {
        let params = FilterParams::new(6);
        let mut state = ControllerState::new(params.clone());
        // short page, but the server says there are more
        state.apply(FetchReason::Initial, params, page(1, 3, 2));
        assert!(state.has_more);
    }

    #[test]
    fn test_replace_versus_append() {
        let params = FilterParams::new(6);
        let mut state = ControllerState::new(params.clone());

        state.apply(FetchReason::Initial, params.clone(), page(1, 7, 6));
        state.apply(FetchReason::LoadMore, params.at_page(2), page(2, 7, 6));
        assert_eq!(state.accumulated_items.len(), 12);
        assert_eq!(state.accumulated_items[6].title, "p2-0");

        state.apply(FetchReason::Refresh, params.clone(), page(1, 7, 6));
        assert_eq!(state.accumulated_items.len(), 6);
        assert_eq!(state.active_params.page, 1);
    }

    #[test]
    fn test_begin_and_fail_flags() {
        let params = FilterParams::new(6);
        let mut state = ControllerState::new(params.clone());
        state.apply(FetchReason::Initial, params.clone(), page(1, 7, 6));

        state.begin(FetchReason::LoadMore, &params.at_page(2));
        assert!(state.is_loading);
        assert!(!state.is_initial_loading);
        assert_eq!(state.phase, LoadPhase::LoadingMore);

        state.fail("db down".into());
        assert!(!state.is_loading);
        assert_eq!(state.phase, LoadPhase::Error);
        assert_eq!(state.last_error.as_deref(), Some("db down"));
        assert_eq!(state.accumulated_items.len(), 6);

        state.begin(FetchReason::Refresh, &params);
        assert!(state.is_initial_loading);
        assert_eq!(state.last_error, None);
        assert_eq!(state.phase, LoadPhase::Refreshing);
    }

    #[test]
    fn test_requested_query_survives_failure() {
        let params = FilterParams::new(6);
        let mut state = ControllerState::new(params.clone());
        state.apply(FetchReason::Initial, params.clone(), page(1, 7, 6));

        let science = params.clone().with_category("science");
        state.begin(FetchReason::FilterChange, &science);
        state.fail("db down".into());

        assert_eq!(state.requested_params.as_ref(), Some(&science));
        assert_eq!(state.active_params, params);
        assert_eq!(state.has_more, state.active_params.page < state.total_pages);

        state.begin(FetchReason::Refresh, &science);
        state.apply(FetchReason::Refresh, science.clone(), page(1, 2, 6));
        assert_eq!(state.requested_params, None);
        assert_eq!(state.active_params, science);
    }

    #[test]
    fn test_load_more_does_not_touch_requested_query() {
        let params = FilterParams::new(6);
        let mut state = ControllerState::new(params.clone());
        state.apply(FetchReason::Initial, params.clone(), page(1, 7, 6));

        state.begin(FetchReason::LoadMore, &params.at_page(2));
        assert_eq!(state.requested_params, None);
    }
}
