//! Paging and sorting state for a bounded list view.
//!
//! A [`ListingController`] owns one [`ListingState`] and the items of the
//! current page. Navigation never fetches by itself: every operation that
//! changes a fetch dependency (page size, sort, page) hands back a
//! [`FetchTicket`], and the caller loads it. Tickets carry a generation
//! number; only the newest ticket's response is applied, so overlapping
//! fetches can complete in any order.

use async_trait::async_trait;

use crate::gateway::QueryGateway;
use crate::types::{
    AccessError, AccessResult, Archive, Collection, Listing, SortField, SortOption,
};

/// Page sizes offered to the user.
pub const PAGE_SIZE_OPTIONS: [u32; 3] = [10, 20, 50];

/// Page size when a view mounts.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Paging and sorting state of one listing view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingState {
    pub sort: SortOption,
    pub page: u32,
    pub limit: u32,
    pub total_pages: u32,
    pub total: u64,
    /// Continuation tokens indexed by page; page 0 never needs one.
    pub page_tokens: Vec<Option<String>>,
}

impl Default for ListingState {
    fn default() -> Self {
        Self {
            sort: SortOption::default(),
            page: 0,
            limit: DEFAULT_PAGE_SIZE,
            total_pages: 1,
            total: 0,
            page_tokens: vec![None],
        }
    }
}

impl ListingState {
    /// Offset of the first item on the current page.
    pub fn offset(&self) -> u64 {
        u64::from(self.page) * u64::from(self.limit)
    }

    /// Continuation token for the current page, if one was recorded.
    pub fn current_token(&self) -> Option<&str> {
        self.page_tokens
            .get(self.page as usize)
            .and_then(|t| t.as_deref())
    }

    /// Index of the last page (0 when nothing is known).
    pub fn last_page(&self) -> u32 {
        self.total_pages.saturating_sub(1)
    }

    fn reset_paging(&mut self) {
        self.page = 0;
        self.page_tokens = vec![None];
    }

    fn record_total(&mut self, total: u64) {
        self.total = total;
        self.total_pages = total_pages(total, self.limit);
    }

    fn record_next_token(&mut self, token: Option<String>) {
        let next = self.page as usize + 1;
        if self.page_tokens.len() <= next {
            self.page_tokens.resize(next + 1, None);
        }
        self.page_tokens[next] = token;
    }

    /// Pull `page` back inside `[0, last_page]` after the total changed.
    fn clamp_page(&mut self) {
        let last = self.last_page();
        if self.page > last {
            self.page = last;
        }
    }
}

/// `ceil(total / limit)`, saturated into `u32`.
pub fn total_pages(total: u64, limit: u32) -> u32 {
    if limit == 0 {
        return 0;
    }
    u32::try_from(total.div_ceil(u64::from(limit))).unwrap_or(u32::MAX)
}

/// What a source needs to produce one page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub limit: u32,
    pub offset: u64,
    pub sort: SortOption,
    pub token: Option<String>,
}

/// A refetch triggered by a state change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    pub generation: u64,
    pub request: PageRequest,
}

/// Whether a fetch is outstanding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchStatus {
    #[default]
    Idle,
    Fetching,
}

/// Something that produces pages of items. Implementations are expected
/// to be fail-safe and return an empty listing instead of an error.
#[async_trait]
pub trait ListingSource: Send + Sync {
    type Item: Send;

    /// Fields this listing can be sorted on.
    const SORT_FIELDS: &'static [SortField];

    /// Whether pages past the first need a continuation token from the
    /// previous page, rather than an offset.
    const NEEDS_TOKENS: bool = false;

    async fn fetch_page(&self, request: &PageRequest) -> Listing<Self::Item>;
}

/// Items of one collection, paged by offset.
#[derive(Clone)]
pub struct CollectionItems {
    gateway: QueryGateway,
    collection_id: String,
}

impl CollectionItems {
    pub fn new(gateway: QueryGateway, collection_id: impl Into<String>) -> Self {
        Self {
            gateway,
            collection_id: collection_id.into(),
        }
    }

    pub fn collection_id(&self) -> &str {
        &self.collection_id
    }
}

#[async_trait]
impl ListingSource for CollectionItems {
    type Item = Archive;

    const SORT_FIELDS: &'static [SortField] = &SortField::ALL;

    async fn fetch_page(&self, request: &PageRequest) -> Listing<Archive> {
        self.gateway
            .list_collection_items_sorted(
                &self.collection_id,
                request.limit,
                request.offset,
                request.sort,
            )
            .await
    }
}

/// Top-level collections, paged by continuation token.
#[derive(Clone)]
pub struct TopLevelCollections {
    gateway: QueryGateway,
}

impl TopLevelCollections {
    pub fn new(gateway: QueryGateway) -> Self {
        Self { gateway }
    }
}

#[async_trait]
impl ListingSource for TopLevelCollections {
    type Item = Collection;

    // Collections carry `date`, not `start_date`.
    const SORT_FIELDS: &'static [SortField] =
        &[SortField::Title, SortField::Identifier, SortField::CreatedAt];
    const NEEDS_TOKENS: bool = true;

    async fn fetch_page(&self, request: &PageRequest) -> Listing<Collection> {
        self.gateway
            .list_top_level_collections(request.sort, request.limit, request.token.as_deref())
            .await
    }
}

/// Paging/sorting controller for one listing view.
pub struct ListingController<S: ListingSource> {
    source: S,
    state: ListingState,
    items: Option<Vec<S::Item>>,
    status: FetchStatus,
    generation: u64,
}

impl<S: ListingSource> ListingController<S> {
    /// A controller with default state (title ascending, page 0, 10 per page).
    pub fn new(source: S) -> Self {
        Self::with_state(source, ListingState::default())
    }

    pub fn with_state(source: S, state: ListingState) -> Self {
        Self {
            source,
            state,
            items: None,
            status: FetchStatus::Idle,
            generation: 0,
        }
    }

    pub fn state(&self) -> &ListingState {
        &self.state
    }

    /// Items of the current page; `None` until the first load completes.
    pub fn items(&self) -> Option<&[S::Item]> {
        self.items.as_deref()
    }

    pub fn status(&self) -> FetchStatus {
        self.status
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Change the page size. Restarts at page 0 and drops recorded tokens.
    pub fn set_page_size(&mut self, limit: u32) -> AccessResult<FetchTicket> {
        if !PAGE_SIZE_OPTIONS.contains(&limit) {
            return Err(AccessError::InvalidInput(format!(
                "page size {limit} not one of {PAGE_SIZE_OPTIONS:?}"
            )));
        }
        self.state.limit = limit;
        self.state.reset_paging();
        Ok(self.begin_fetch())
    }

    /// Change the sort order. Restarts at page 0 and drops recorded tokens.
    /// Fields the source cannot sort on are rejected with state untouched.
    pub fn set_sort(&mut self, sort: SortOption) -> AccessResult<FetchTicket> {
        if !S::SORT_FIELDS.contains(&sort.field) {
            let allowed: Vec<&str> = S::SORT_FIELDS.iter().map(|f| f.as_str()).collect();
            return Err(AccessError::InvalidInput(format!(
                "cannot sort this listing by '{}' (use one of {})",
                sort.field,
                allowed.join(", ")
            )));
        }
        self.state.sort = sort;
        self.state.reset_paging();
        Ok(self.begin_fetch())
    }

    /// Advance one page. `None` when already on the last page.
    pub fn next_page(&mut self) -> Option<FetchTicket> {
        if self.state.page >= self.state.last_page() {
            return None;
        }
        self.go_to(self.state.page + 1)
    }

    /// Go back one page. `None` when already on the first page.
    pub fn prev_page(&mut self) -> Option<FetchTicket> {
        let prev = self.state.page.saturating_sub(1);
        self.go_to(prev)
    }

    /// Jump straight to `page` (0-based). Token-paged sources can only
    /// reach pages whose token has already been recorded. A page past the
    /// end is pulled back to the last page when the response arrives.
    pub fn jump_to(&mut self, page: u32) -> AccessResult<FetchTicket> {
        let has_token = self
            .state
            .page_tokens
            .get(page as usize)
            .is_some_and(Option::is_some);
        if S::NEEDS_TOKENS && page > 0 && !has_token {
            return Err(AccessError::InvalidInput(format!(
                "page {} has not been reached yet",
                page + 1
            )));
        }
        self.state.page = page;
        Ok(self.begin_fetch())
    }

    fn go_to(&mut self, page: u32) -> Option<FetchTicket> {
        if page == self.state.page {
            return None;
        }
        self.state.page = page;
        Some(self.begin_fetch())
    }

    /// Issue a ticket for the current state and supersede older ones.
    pub fn begin_fetch(&mut self) -> FetchTicket {
        self.generation += 1;
        self.status = FetchStatus::Fetching;
        FetchTicket {
            generation: self.generation,
            request: PageRequest {
                limit: self.state.limit,
                offset: self.state.offset(),
                sort: self.state.sort,
                token: self.state.current_token().map(str::to_string),
            },
        }
    }

    /// Apply a response. Returns `false` and leaves state untouched when
    /// the ticket has been superseded.
    pub fn apply(&mut self, ticket: &FetchTicket, listing: Listing<S::Item>) -> bool {
        if ticket.generation != self.generation {
            tracing::debug!(
                "Discarding stale listing response (generation {} < {})",
                ticket.generation,
                self.generation
            );
            return false;
        }

        self.state.record_total(listing.total);
        self.state.record_next_token(listing.next_token);
        self.state.clamp_page();
        self.items = Some(listing.items);
        self.status = FetchStatus::Idle;
        true
    }

    /// Fetch the page a ticket describes without applying it.
    pub async fn fetch(&self, ticket: &FetchTicket) -> Listing<S::Item> {
        self.source.fetch_page(&ticket.request).await
    }

    /// Fetch and apply a ticket.
    pub async fn load(&mut self, ticket: FetchTicket) -> bool {
        let listing = self.fetch(&ticket).await;
        self.apply(&ticket, listing)
    }

    /// Load the current state, e.g. when the view mounts.
    pub async fn refresh(&mut self) -> bool {
        let ticket = self.begin_fetch();
        self.load(ticket).await
    }

    /// Load the ticket if there is one. Returns whether anything was applied.
    pub async fn load_if(&mut self, ticket: Option<FetchTicket>) -> bool {
        match ticket {
            Some(ticket) => self.load(ticket).await,
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SortDirection;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Mutex;

    /// Serves `total` numbered items and records every request.
    struct Numbers {
        total: AtomicU64,
        requests: Mutex<Vec<PageRequest>>,
    }

    impl Numbers {
        fn new(total: u64) -> Self {
            Self {
                total: AtomicU64::new(total),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn shrink_to(&self, total: u64) {
            self.total.store(total, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl ListingSource for Numbers {
        type Item = u64;

        const SORT_FIELDS: &'static [SortField] = &[SortField::Title, SortField::StartDate];

        async fn fetch_page(&self, request: &PageRequest) -> Listing<u64> {
            self.requests.lock().unwrap().push(request.clone());
            let total = self.total.load(Ordering::SeqCst);
            let end = (request.offset + u64::from(request.limit)).min(total);
            Listing {
                items: (request.offset.min(end)..end).collect(),
                total,
                next_token: (end < total).then(|| format!("after-{end}")),
            }
        }
    }

    /// Token-paged variant of [`Numbers`].
    struct Tokens(Numbers);

    #[async_trait]
    impl ListingSource for Tokens {
        type Item = u64;

        const SORT_FIELDS: &'static [SortField] = &[SortField::Title];
        const NEEDS_TOKENS: bool = true;

        async fn fetch_page(&self, request: &PageRequest) -> Listing<u64> {
            self.0.fetch_page(request).await
        }
    }

    #[test]
    fn test_default_state() {
        let state = ListingState::default();
        assert_eq!(state.sort.field, SortField::Title);
        assert_eq!(state.sort.direction, SortDirection::Asc);
        assert_eq!(state.page, 0);
        assert_eq!(state.limit, 10);
        assert_eq!(state.page_tokens, vec![None]);
    }

    #[test]
    fn test_offset_is_page_times_limit() {
        for limit in PAGE_SIZE_OPTIONS {
            for page in [0u32, 1, 2, 7, 1000] {
                let state = ListingState {
                    page,
                    limit,
                    ..Default::default()
                };
                assert_eq!(state.offset(), u64::from(page) * u64::from(limit));
            }
        }
    }

    #[test]
    fn test_total_pages_is_ceiling() {
        assert_eq!(total_pages(0, 10), 0);
        assert_eq!(total_pages(1, 10), 1);
        assert_eq!(total_pages(10, 10), 1);
        assert_eq!(total_pages(11, 10), 2);
        assert_eq!(total_pages(25, 10), 3);
        assert_eq!(total_pages(25, 0), 0);
    }

    #[tokio::test]
    async fn test_refresh_loads_first_page() {
        let mut controller = ListingController::new(Numbers::new(25));
        assert!(controller.items().is_none());

        assert!(controller.refresh().await);
        assert_eq!(controller.items().unwrap(), &(0..10).collect::<Vec<_>>()[..]);
        assert_eq!(controller.state().total, 25);
        assert_eq!(controller.state().total_pages, 3);
        assert_eq!(controller.status(), FetchStatus::Idle);
        assert_eq!(
            controller.state().page_tokens,
            vec![None, Some("after-10".to_string())]
        );
    }

    #[tokio::test]
    async fn test_next_page_saturates_at_last_page() {
        let mut controller = ListingController::new(Numbers::new(25));
        controller.refresh().await;

        let ticket = controller.next_page().unwrap();
        assert_eq!(ticket.request.offset, 10);
        assert_eq!(ticket.request.token.as_deref(), Some("after-10"));
        controller.load(ticket).await;

        let ticket = controller.next_page().unwrap();
        assert_eq!(ticket.request.offset, 20);
        controller.load(ticket).await;
        assert_eq!(controller.state().page, 2);
        assert_eq!(controller.items().unwrap(), &[20, 21, 22, 23, 24]);

        assert!(controller.next_page().is_none());
        assert_eq!(controller.state().page, 2);
    }

    #[tokio::test]
    async fn test_prev_page_saturates_at_first_page() {
        let mut controller = ListingController::new(Numbers::new(25));
        controller.refresh().await;
        assert!(controller.prev_page().is_none());

        let ticket = controller.next_page().unwrap();
        controller.load(ticket).await;
        let ticket = controller.prev_page().unwrap();
        assert_eq!(ticket.request.offset, 0);
        assert_eq!(ticket.request.token, None);
        controller.load(ticket).await;
        assert_eq!(controller.state().page, 0);
    }

    #[test]
    fn test_navigation_before_first_load() {
        // Before totals are known there is a single page.
        let mut controller = ListingController::new(Numbers::new(25));
        assert!(controller.next_page().is_none());
        assert!(controller.prev_page().is_none());
    }

    #[tokio::test]
    async fn test_empty_listing_keeps_page_at_zero() {
        let mut controller = ListingController::new(Numbers::new(0));
        controller.refresh().await;
        assert_eq!(controller.state().total_pages, 0);
        assert!(controller.next_page().is_none());
        assert_eq!(controller.state().page, 0);
        assert_eq!(controller.items().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_page_size_change_resets_paging() {
        let mut controller = ListingController::new(Numbers::new(100));
        controller.refresh().await;
        let ticket = controller.next_page().unwrap();
        controller.load(ticket).await;
        assert_eq!(controller.state().page_tokens.len(), 3);

        let ticket = controller.set_page_size(20).unwrap();
        assert_eq!(controller.state().page, 0);
        assert_eq!(controller.state().page_tokens, vec![None]);
        assert_eq!(ticket.request.limit, 20);
        assert_eq!(ticket.request.offset, 0);
        controller.load(ticket).await;
        assert_eq!(controller.state().total_pages, 5);
    }

    #[tokio::test]
    async fn test_invalid_page_size_rejected() {
        let mut controller = ListingController::new(Numbers::new(100));
        controller.refresh().await;
        let before = controller.state().clone();
        let generation = controller.generation();

        assert!(controller.set_page_size(0).is_err());
        assert!(controller.set_page_size(15).is_err());
        assert_eq!(controller.state(), &before);
        assert_eq!(controller.generation(), generation);
    }

    #[tokio::test]
    async fn test_unsortable_field_rejected() {
        let mut controller = ListingController::new(Numbers::new(100));
        controller.refresh().await;
        let ticket = controller.next_page().unwrap();
        controller.load(ticket).await;
        let before = controller.state().clone();
        let generation = controller.generation();

        let err = controller
            .set_sort(SortOption::new(SortField::Identifier, SortDirection::Asc))
            .unwrap_err();
        assert!(err.to_string().contains("identifier"));
        assert_eq!(controller.state(), &before);
        assert_eq!(controller.generation(), generation);
        assert_eq!(controller.status(), FetchStatus::Idle);
    }

    #[test]
    fn test_top_level_collections_cannot_sort_by_start_date() {
        assert!(!TopLevelCollections::SORT_FIELDS.contains(&SortField::StartDate));
        assert!(TopLevelCollections::SORT_FIELDS.contains(&SortField::Title));
        assert!(CollectionItems::SORT_FIELDS.contains(&SortField::StartDate));
    }

    #[tokio::test]
    async fn test_shrinking_total_pulls_page_back() {
        let mut controller = ListingController::new(Numbers::new(25));
        controller.refresh().await;
        for _ in 0..2 {
            let ticket = controller.next_page();
            controller.load_if(ticket).await;
        }
        assert_eq!(controller.state().page, 2);

        controller.source().shrink_to(12);
        controller.refresh().await;
        assert_eq!(controller.state().total_pages, 2);
        assert_eq!(controller.state().page, 1);
        assert!(controller.state().page < controller.state().total_pages);
        assert!(controller.next_page().is_none());
        assert_eq!(controller.state().page, 1);
    }

    #[tokio::test]
    async fn test_empty_response_on_later_page_resets_to_first() {
        let mut controller = ListingController::new(Numbers::new(25));
        controller.refresh().await;
        for _ in 0..2 {
            let ticket = controller.next_page();
            controller.load_if(ticket).await;
        }

        // A failed fetch arrives as the empty listing.
        let ticket = controller.begin_fetch();
        assert!(controller.apply(&ticket, Listing::default()));
        assert_eq!(controller.state().total_pages, 0);
        assert_eq!(controller.state().page, 0);
        assert!(controller.next_page().is_none());
        assert!(controller.prev_page().is_none());
        assert_eq!(controller.state().page, 0);
    }

    #[tokio::test]
    async fn test_jump_to_offset_page_fetches_once() {
        let mut controller = ListingController::new(Numbers::new(25));
        let ticket = controller.jump_to(2).unwrap();
        assert_eq!(ticket.request.offset, 20);
        controller.load(ticket).await;
        assert_eq!(controller.items().unwrap(), &[20, 21, 22, 23, 24]);
        assert_eq!(controller.source().requests.lock().unwrap().len(), 1);

        // Past the end: the page is pulled back once the total is known.
        let ticket = controller.jump_to(9).unwrap();
        controller.load(ticket).await;
        assert_eq!(controller.state().page, 2);
    }

    #[tokio::test]
    async fn test_jump_to_token_page_needs_recorded_token() {
        let mut controller = ListingController::new(Tokens(Numbers::new(25)));
        assert!(controller.jump_to(1).is_err());
        assert_eq!(controller.generation(), 0);

        controller.refresh().await;
        let ticket = controller.jump_to(1).unwrap();
        assert_eq!(ticket.request.token.as_deref(), Some("after-10"));
        assert!(controller.jump_to(2).is_err());
    }

    #[tokio::test]
    async fn test_sort_change_resets_paging() {
        let mut controller = ListingController::new(Numbers::new(100));
        controller.refresh().await;
        let ticket = controller.next_page().unwrap();
        controller.load(ticket).await;
        assert_eq!(controller.state().page, 1);

        let sort = SortOption::new(SortField::StartDate, SortDirection::Desc);
        let ticket = controller.set_sort(sort).unwrap();
        assert_eq!(controller.state().page, 0);
        assert_eq!(controller.state().page_tokens, vec![None]);
        assert_eq!(ticket.request.sort, sort);
        assert_eq!(ticket.request.offset, 0);

        controller.load(ticket).await;
        let requests = controller.source().requests.lock().unwrap();
        assert_eq!(requests.last().unwrap().sort, sort);
    }

    #[tokio::test]
    async fn test_stale_response_is_discarded() {
        let mut controller = ListingController::new(Numbers::new(100));
        controller.refresh().await;

        let stale = controller.next_page().unwrap();
        let current = controller
            .set_sort(SortOption::new(SortField::Title, SortDirection::Desc))
            .unwrap();
        assert!(current.generation > stale.generation);
        assert_eq!(controller.status(), FetchStatus::Fetching);

        let stale_listing = controller.fetch(&stale).await;
        let current_listing = controller.fetch(&current).await;

        // The newer response lands first, the older one afterwards.
        assert!(controller.apply(&current, current_listing));
        assert!(!controller.apply(&stale, stale_listing));

        assert_eq!(controller.state().page, 0);
        assert_eq!(controller.items().unwrap()[0], 0);
        assert_eq!(controller.status(), FetchStatus::Idle);
    }

    #[tokio::test]
    async fn test_stale_response_does_not_clear_fetching() {
        let mut controller = ListingController::new(Numbers::new(100));
        let first = controller.begin_fetch();
        let second = controller.begin_fetch();

        let listing = controller.fetch(&first).await;
        assert!(!controller.apply(&first, listing));
        assert_eq!(controller.status(), FetchStatus::Fetching);
        assert!(controller.items().is_none());

        assert!(controller.load(second).await);
        assert_eq!(controller.status(), FetchStatus::Idle);
    }

    #[tokio::test]
    async fn test_page_two_of_three_end_to_end() {
        let state = ListingState {
            page: 2,
            ..Default::default()
        };
        let mut controller = ListingController::with_state(Numbers::new(25), state);
        controller.refresh().await;
        assert_eq!(controller.state().total_pages, 3);
        assert_eq!(controller.state().offset(), 20);
        assert!(controller.next_page().is_none());
        assert_eq!(controller.state().page, 2);
    }
}
