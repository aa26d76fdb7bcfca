use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

use crate::notify::{Level, Notification};

/// Draw the bottom line: the latest notification, or key hints when there is none
pub fn draw_footer(frame: &mut Frame, area: Rect, notification: Option<&Notification>) {
  let line = match notification {
    Some(n) => {
      let style = match n.level {
        Level::Info => Style::default().fg(Color::Green),
        Level::Error => Style::default().fg(Color::Red).bold(),
      };
      Line::from(vec![Span::raw(" "), Span::styled(n.message.clone(), style)])
    }
    None => Line::from(Span::styled(
      " j/k:nav  u:upvote  s:save  n:load more  r:refresh  q:quit",
      Style::default().fg(Color::DarkGray),
    )),
  };

  let paragraph = Paragraph::new(line).style(Style::default().bg(Color::Black));

  frame.render_widget(paragraph, area);
}
