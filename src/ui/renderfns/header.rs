use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

/// Draw the header bar with logo, server, active search and shortcuts
pub fn draw_header(frame: &mut Frame, area: Rect, base_url: &str, search: Option<&str>) {
  let domain = extract_domain(base_url);

  let mut spans = vec![
    Span::styled(" campushub ", Style::default().fg(Color::Cyan).bold()),
    Span::styled("│", Style::default().fg(Color::DarkGray)),
    Span::styled(format!(" {} ", domain), Style::default().fg(Color::White)),
  ];
  if let Some(search) = search {
    spans.push(Span::styled("│", Style::default().fg(Color::DarkGray)));
    spans.push(Span::styled(
      format!(" \"{}\" ", search),
      Style::default().fg(Color::Yellow).bold(),
    ));
  }
  spans.push(Span::raw("  "));

  // Shortcuts - keys highlighted, descriptions dimmed
  for (key, label) in [
    ("<u>", " upvote"),
    ("<s>", " save"),
    ("<n>", " more"),
    ("<r>", " refresh"),
    ("<q>", " quit"),
  ] {
    spans.push(Span::styled(key, Style::default().fg(Color::Cyan)));
    spans.push(Span::styled(label, Style::default().fg(Color::DarkGray)));
    spans.push(Span::raw("   "));
  }

  let paragraph = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::Black));

  frame.render_widget(paragraph, area);
}

/// Extract host (and port) from the API base URL
fn extract_domain(url: &str) -> &str {
  url
    .strip_prefix("https://")
    .or_else(|| url.strip_prefix("http://"))
    .unwrap_or(url)
    .split('/')
    .next()
    .unwrap_or(url)
}
