mod renderfns;
mod views;

use crate::app::App;
use ratatui::prelude::*;
use std::time::Instant;

/// Main draw function
pub fn draw(frame: &mut Frame, app: &mut App) {
  let chunks = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Length(1), // Header
      Constraint::Min(1),    // Feed
      Constraint::Length(1), // Notification / hints
    ])
    .split(frame.area());

  renderfns::draw_header(frame, chunks[0], app.base_url(), app.search());
  views::feed::draw_feed(frame, chunks[1], app);

  let notification = app.notifications().latest(Instant::now()).cloned();
  renderfns::draw_footer(frame, chunks[2], notification.as_ref());
}
