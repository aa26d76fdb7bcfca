use crate::api::types::Resource;
use crate::api::{CachedApi, ResourceQuery};
use crate::cache::QueryKey;
use crate::error::ClientError;
use crate::event::{Event, EventHandler};
use crate::feed::{Feed, ListStatus};
use crate::notify::Notifications;
use crate::optimistic::{Mutation, Optimistic, Pending, ToggleSave, ToggleUpvote};
use crate::ui;
use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{
  disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::prelude::*;
use ratatui::widgets::ListState;
use std::io::stdout;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Resource feed screen state
pub struct App {
  api: CachedApi,
  optimistic: Optimistic,

  /// Feed query without paging; pages are derived from it
  query: ResourceQuery,
  feed: Feed<Resource>,
  list_state: ListState,

  notifications: Notifications,

  /// Event sender for async tasks
  event_tx: mpsc::UnboundedSender<Event>,

  /// Whether to quit
  should_quit: bool,
}

impl App {
  pub fn new(api: CachedApi, query: ResourceQuery) -> Self {
    let (tx, _rx) = mpsc::unbounded_channel();

    let fetch_api = api.clone();
    let base = query.clone();
    let feed = Feed::new(query.per_page, move |page, per_page| {
      let api = fetch_api.clone();
      let query = ResourceQuery {
        per_page,
        ..base.at_page(page)
      };
      async move { api.list_resources(&query).await }
    });

    Self {
      api,
      optimistic: Optimistic::new(),
      query,
      feed,
      list_state: ListState::default(),
      notifications: Notifications::new(),
      event_tx: tx,
      should_quit: false,
    }
  }

  pub async fn run(&mut self) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let mut events = EventHandler::new(Duration::from_millis(250));
    self.event_tx = events.sender();

    self.feed.refresh();

    let result = self.event_loop(&mut terminal, &mut events).await;

    // Cleanup terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
  }

  async fn event_loop<B: Backend>(
    &mut self,
    terminal: &mut Terminal<B>,
    events: &mut EventHandler,
  ) -> Result<()> {
    while !self.should_quit {
      terminal.draw(|frame| ui::draw(frame, self))?;

      if let Some(event) = events.next().await {
        self.handle_event(event);
      }
    }
    Ok(())
  }

  pub fn handle_event(&mut self, event: Event) {
    match event {
      Event::Key(key) => self.handle_key(key),
      Event::Tick => self.tick(),
      Event::Upvoted(pending, result) => self.settle(pending, result, "upvote"),
      Event::Saved(pending, result) => self.settle(pending, result, "save"),
    }
  }

  fn handle_key(&mut self, key: KeyEvent) {
    match key.code {
      KeyCode::Char('q') => self.should_quit = true,
      KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
        self.should_quit = true;
      }

      // Navigation
      KeyCode::Up | KeyCode::Char('k') => self.move_selection(-1),
      KeyCode::Down | KeyCode::Char('j') => {
        self.move_selection(1);
        // Reaching the end of the list pulls in the next page
        if self.selected() + 1 == self.feed.items().len() {
          self.feed.load_more();
        }
      }

      KeyCode::Char('u') => self.toggle_upvote(),
      KeyCode::Char('s') => self.toggle_save(),
      KeyCode::Char('n') => self.feed.load_more(),
      KeyCode::Char('r') => self.reload(),
      _ => {}
    }
  }

  fn tick(&mut self) {
    if self.feed.poll() {
      if let ListStatus::Failed(e) = self.feed.status() {
        self.notifications.error(format!("Could not load resources: {}", e));
      }
    }
    self.notifications.prune(Instant::now());
  }

  /// Retry a failed load where it left off, otherwise start over from page 1.
  fn reload(&mut self) {
    if self.feed.status().error().is_some() {
      debug!("Retrying failed load of {}", self.query.description());
      self.feed.retry();
    } else {
      self.refresh();
    }
  }

  fn refresh(&mut self) {
    // Page 1 must come from the server, later pages are reloaded as scrolled to
    self.api.cache().invalidate(&self.query.at_page(1));
    debug!("Refreshing feed {}", self.query.description());
    self.feed.refresh();
    self.list_state.select(Some(0));
  }

  fn toggle_upvote(&mut self) {
    let index = self.selected();
    let Some(resource) = self.feed.list_mut().items_mut().get_mut(index) else {
      return;
    };
    let id = resource.id;

    match self.optimistic.begin(ToggleUpvote::new(id), resource) {
      Ok(pending) => {
        let api = self.api.clone();
        let tx = self.event_tx.clone();
        tokio::spawn(async move {
          let result = api.toggle_resource_upvote(id).await;
          let _ = tx.send(Event::Upvoted(pending, result));
        });
      }
      Err(e) => self.report(e),
    }
  }

  fn toggle_save(&mut self) {
    let index = self.selected();
    let Some(resource) = self.feed.list_mut().items_mut().get_mut(index) else {
      return;
    };
    let id = resource.id;

    match self.optimistic.begin(ToggleSave::new(id), resource) {
      Ok(pending) => {
        let api = self.api.clone();
        let tx = self.event_tx.clone();
        tokio::spawn(async move {
          let result = api.toggle_resource_save(id).await;
          let _ = tx.send(Event::Saved(pending, result));
        });
      }
      Err(e) => self.report(e),
    }
  }

  fn settle<M>(
    &mut self,
    pending: Pending<M>,
    result: std::result::Result<M::Response, crate::api::ApiError>,
    action: &str,
  ) where
    M: Mutation<Target = Resource> + ResourceMutation,
  {
    let id = pending.mutation().resource_id();
    let Some(resource) = self.feed.list_mut().items_mut().iter_mut().find(|r| r.id == id) else {
      // The list was reloaded meanwhile and no longer shows this resource
      debug!("Dropping {} result for resource {}", action, id);
      return;
    };

    match pending.settle(resource, result) {
      Ok(_) => info!("Resource {} {} confirmed", id, action),
      Err(e) => self
        .notifications
        .error(format!("Could not {} resource: {}", action, e)),
    }
  }

  fn report(&mut self, err: ClientError) {
    match err {
      ClientError::Busy(_) => self.notifications.info(err.to_string()),
      _ => self.notifications.error(err.to_string()),
    }
  }

  fn move_selection(&mut self, delta: i32) {
    let len = self.feed.items().len();
    if len > 0 {
      let selected = (self.selected() as i32 + delta).clamp(0, len as i32 - 1) as usize;
      self.list_state.select(Some(selected));
    }
  }

  fn selected(&self) -> usize {
    self.list_state.selected().unwrap_or(0)
  }

  // Accessors for UI rendering
  pub fn feed(&self) -> &Feed<Resource> {
    &self.feed
  }

  /// Feed plus the selection state the list widget renders into
  pub fn feed_with_state(&mut self) -> (&Feed<Resource>, &mut ListState) {
    (&self.feed, &mut self.list_state)
  }

  pub fn notifications(&self) -> &Notifications {
    &self.notifications
  }

  pub fn base_url(&self) -> &str {
    self.api.client().base_url()
  }

  pub fn search(&self) -> Option<&str> {
    self.query.search.as_deref()
  }

  pub fn should_quit(&self) -> bool {
    self.should_quit
  }
}

/// Mutations on a single resource in the feed
pub trait ResourceMutation {
  fn resource_id(&self) -> i64;
}

impl ResourceMutation for ToggleUpvote {
  fn resource_id(&self) -> i64 {
    ToggleUpvote::resource_id(self)
  }
}

impl ResourceMutation for ToggleSave {
  fn resource_id(&self) -> i64 {
    ToggleSave::resource_id(self)
  }
}
