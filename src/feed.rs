//! Paginated list controllers.
//!
//! [`PaginatedList`] holds the accumulated items and paging state of an
//! infinite-scroll list. [`Feed`] drives one from an async page fetcher, the
//! same way the UI loop polls any background query: spawn the fetch, then
//! `poll()` on each tick until the result arrives.
//!
//! ```ignore
//! let api = api.clone();
//! let mut feed = Feed::new(config.feed.page_size, move |page, per_page| {
//!   let api = api.clone();
//!   let query = ResourceQuery { per_page, ..query.at_page(page) };
//!   async move { api.list_resources(&query).await }
//! });
//!
//! feed.refresh();
//! // In event loop tick
//! if feed.poll() {
//!   // Items or status changed, re-render
//! }
//! ```

use futures::future::{BoxFuture, FutureExt};
use std::future::Future;
use tokio::sync::mpsc;
use tracing::debug;

use crate::api::{ApiError, Page};

/// Loading state of a paginated list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListStatus {
  /// Nothing requested yet
  Idle,
  /// Fetching the first page (initial load or refresh)
  LoadingInitial,
  /// Fetching a further page
  LoadingMore,
  Ready,
  /// Last load failed; items loaded before are still there
  Failed(String),
}

impl ListStatus {
  pub fn is_loading(&self) -> bool {
    matches!(self, ListStatus::LoadingInitial | ListStatus::LoadingMore)
  }

  pub fn error(&self) -> Option<&str> {
    match self {
      ListStatus::Failed(e) => Some(e),
      _ => None,
    }
  }
}

/// Items accumulated across pages, in server order.
#[derive(Debug, Clone)]
pub struct PaginatedList<T> {
  items: Vec<T>,
  page: u32,
  page_size: u32,
  has_more: bool,
  status: ListStatus,
}

impl<T> PaginatedList<T> {
  pub fn new(page_size: u32) -> Self {
    Self {
      items: Vec::new(),
      page: 0,
      page_size,
      has_more: false,
      status: ListStatus::Idle,
    }
  }

  pub fn items(&self) -> &[T] {
    &self.items
  }

  /// Mutable access for optimistic updates of individual items.
  pub fn items_mut(&mut self) -> &mut Vec<T> {
    &mut self.items
  }

  /// Last page merged into the list, 0 before the first load.
  pub fn page(&self) -> u32 {
    self.page
  }

  pub fn page_size(&self) -> u32 {
    self.page_size
  }

  pub fn has_more(&self) -> bool {
    self.has_more
  }

  pub fn status(&self) -> &ListStatus {
    &self.status
  }

  /// Mark a load as started.
  pub fn begin(&mut self, reset: bool) {
    self.status = if reset {
      ListStatus::LoadingInitial
    } else {
      ListStatus::LoadingMore
    };
  }

  /// Merge a fetched page. A reset replaces everything, otherwise the items are
  /// appended as-is (duplicates across pages are kept).
  pub fn apply(&mut self, page: u32, reset: bool, fetched: Page<T>) {
    let returned = fetched.items.len();
    if reset {
      self.items = fetched.items;
      self.page = 1;
    } else {
      self.items.extend(fetched.items);
      self.page = page;
    }

    let loaded = u64::from(self.page) * u64::from(self.page_size);
    self.has_more = returned == self.page_size as usize && fetched.total > loaded;
    self.status = ListStatus::Ready;
  }

  pub fn fail(&mut self, message: impl Into<String>) {
    self.status = ListStatus::Failed(message.into());
  }
}

/// Produces the future fetching `(page, page_size)`
type FetcherFn<T> =
  Box<dyn Fn(u32, u32) -> BoxFuture<'static, Result<Page<T>, ApiError>> + Send + Sync>;

/// A load that was started and has not been merged yet
#[derive(Debug, Clone, Copy)]
struct Request {
  page: u32,
  reset: bool,
}

/// A [`PaginatedList`] fed by a background fetcher.
pub struct Feed<T> {
  list: PaginatedList<T>,
  fetcher: FetcherFn<T>,
  receiver: Option<mpsc::UnboundedReceiver<Result<Page<T>, ApiError>>>,
  /// In flight, or the one that failed last
  request: Option<Request>,
}

impl<T: Send + 'static> Feed<T> {
  pub fn new<F, Fut>(page_size: u32, fetcher: F) -> Self
  where
    F: Fn(u32, u32) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Page<T>, ApiError>> + Send + 'static,
  {
    Self {
      list: PaginatedList::new(page_size),
      fetcher: Box::new(move |page, per_page| fetcher(page, per_page).boxed()),
      receiver: None,
      request: None,
    }
  }

  pub fn list(&self) -> &PaginatedList<T> {
    &self.list
  }

  pub fn list_mut(&mut self) -> &mut PaginatedList<T> {
    &mut self.list
  }

  pub fn items(&self) -> &[T] {
    self.list.items()
  }

  pub fn status(&self) -> &ListStatus {
    self.list.status()
  }

  pub fn is_loading(&self) -> bool {
    self.receiver.is_some()
  }

  /// Start loading `page`.
  ///
  /// A reset drops whatever load is pending and fetches page 1; its response is
  /// never merged. A non-reset load while another is pending does nothing.
  pub fn load(&mut self, page: u32, reset: bool) {
    if self.receiver.is_some() && !reset {
      debug!("Load of page {} skipped, another load is pending", page);
      return;
    }
    let page = if reset { 1 } else { page };
    self.start(Request { page, reset });
  }

  /// Reload from page 1, replacing the list on success.
  pub fn refresh(&mut self) {
    self.load(1, true);
  }

  /// Fetch the next page if there is one.
  pub fn load_more(&mut self) {
    if !self.list.has_more() || self.is_loading() {
      return;
    }
    self.load(self.list.page() + 1, false);
  }

  /// Repeat the last failed load.
  pub fn retry(&mut self) {
    if self.receiver.is_some() || self.list.status().error().is_none() {
      return;
    }
    match self.request {
      Some(request) => self.start(request),
      None => self.refresh(),
    }
  }

  /// Poll for the result of the pending load.
  ///
  /// Returns `true` if the list changed. Call this on every tick.
  pub fn poll(&mut self) -> bool {
    let Some(receiver) = &mut self.receiver else {
      return false;
    };

    let result = match receiver.try_recv() {
      Ok(result) => result,
      Err(mpsc::error::TryRecvError::Empty) => return false,
      Err(mpsc::error::TryRecvError::Disconnected) => {
        self.receiver = None;
        self.list.fail("Request was cancelled");
        return true;
      }
    };

    self.receiver = None;
    let Some(request) = self.request else {
      return false;
    };
    match result {
      Ok(page) => {
        debug!(
          "Loaded page {} ({} items, {} total)",
          request.page,
          page.items.len(),
          page.total
        );
        self.list.apply(request.page, request.reset, page);
      }
      Err(err) => {
        self.list.fail(err.to_string());
      }
    }
    true
  }

  fn start(&mut self, request: Request) {
    // Replacing the receiver discards the response of a superseded load
    let (tx, rx) = mpsc::unbounded_channel();
    self.receiver = Some(rx);
    self.request = Some(request);
    self.list.begin(request.reset);

    let future = (self.fetcher)(request.page, self.list.page_size());
    tokio::spawn(async move {
      let _ = tx.send(future.await);
    });
  }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Feed<T> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Feed")
      .field("list", &self.list)
      .field("request", &self.request)
      .finish_non_exhaustive()
  }
}
