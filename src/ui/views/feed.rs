use crate::api::types::Resource;
use crate::app::App;
use crate::feed::ListStatus;
use crate::ui::renderfns::truncate;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};

/// Draw the resource feed with its loading state in the title
pub fn draw_feed(frame: &mut Frame, area: Rect, app: &mut App) {
  let (feed, list_state) = app.feed_with_state();
  let resources = feed.items();
  ensure_valid_selection(list_state, resources.len());

  let more = if feed.list().has_more() { "+" } else { "" };
  let title = match feed.status() {
    ListStatus::LoadingInitial => " Resources (loading...) ".to_string(),
    ListStatus::LoadingMore => format!(" Resources ({}, loading more...) ", resources.len()),
    ListStatus::Failed(_) => format!(" Resources ({}{}, failed, r to retry) ", resources.len(), more),
    _ => format!(" Resources ({}{}) ", resources.len(), more),
  };

  let block = Block::default()
    .title(title)
    .title_alignment(Alignment::Center)
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::Blue));

  if resources.is_empty() {
    let content = match feed.status() {
      ListStatus::Idle | ListStatus::LoadingInitial => "Loading...",
      ListStatus::Failed(_) => "Failed to load resources. Press 'r' to retry.",
      _ => "No resources found.",
    };
    let paragraph = Paragraph::new(content)
      .block(block)
      .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(paragraph, area);
    return;
  }

  let items: Vec<ListItem> = resources.iter().map(resource_line).map(ListItem::new).collect();

  let list = List::new(items)
    .block(block)
    .highlight_style(
      Style::default()
        .bg(Color::DarkGray)
        .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("> ");

  frame.render_stateful_widget(list, area, list_state);
}

fn resource_line(resource: &Resource) -> Line<'static> {
  let upvote_style = if resource.is_upvoted {
    Style::default().fg(Color::Green).bold()
  } else {
    Style::default().fg(Color::DarkGray)
  };
  let saved = if resource.is_saved { "★" } else { " " };

  Line::from(vec![
    Span::styled(
      format!("▲{:<4}", resource.upvote_count),
      upvote_style,
    ),
    Span::styled(saved, Style::default().fg(Color::Yellow)),
    Span::raw(" "),
    Span::raw(truncate(&resource.title, 60)),
    Span::raw("  "),
    Span::styled(
      truncate(resource.author(), 20),
      Style::default().fg(Color::Cyan),
    ),
    Span::styled(
      format!("  {} comments", resource.comments_count),
      Style::default().fg(Color::DarkGray),
    ),
  ])
}

/// Keep the selection inside the list after it shrank or first filled
fn ensure_valid_selection(state: &mut ListState, len: usize) {
  match state.selected() {
    _ if len == 0 => state.select(None),
    None => state.select(Some(0)),
    Some(i) if i >= len => state.select(Some(len - 1)),
    Some(_) => {}
  }
}
