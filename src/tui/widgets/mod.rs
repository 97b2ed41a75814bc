pub mod dashboard;
pub mod deck;
pub mod history;
pub mod trouble;

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};

use crate::models::{DEFAULT_EASE_FACTOR, MIN_EASE_FACTOR};
use crate::truncate;

/// Render a bordered, selectable list with a column header on its first inner row.
pub fn draw_table(
    f: &mut Frame,
    area: Rect,
    title: String,
    title_color: Color,
    header: Vec<(String, usize)>,
    items: Vec<ListItem>,
    selected: Option<usize>,
) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .title_style(Style::default().fg(title_color));

    let header_style = Style::default()
        .fg(Color::DarkGray)
        .add_modifier(Modifier::BOLD);
    let header = Line::from(
        header
            .into_iter()
            .map(|(label, width)| Span::styled(pad(&label, width), header_style))
            .collect::<Vec<_>>(),
    );

    let list = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    let mut state = ListState::default();
    state.select(selected);

    let header_area = Rect {
        x: area.x + 3,
        y: area.y + 1,
        width: area.width.saturating_sub(4),
        height: 1,
    };
    f.render_widget(Paragraph::new(header), header_area);

    let list_area = Rect {
        x: area.x,
        y: area.y + 1,
        width: area.width,
        height: area.height.saturating_sub(1),
    };
    f.render_stateful_widget(list, list_area, &mut state);
}

/// Five-cell bar placing the ease factor between the floor and a little above the default.
pub fn ease_bar(ease: f64) -> String {
    let span = DEFAULT_EASE_FACTOR + 0.5 - MIN_EASE_FACTOR;
    let ratio = ((ease - MIN_EASE_FACTOR) / span).clamp(0.0, 1.0);
    let filled = (ratio * 5.0).round() as usize;
    format!("{}{}", "█".repeat(filled), "░".repeat(5 - filled))
}

/// Left-align to `width` columns by char count, truncating if needed.
pub fn pad(s: &str, width: usize) -> String {
    let s = truncate(s, width.saturating_sub(1));
    let fill = width.saturating_sub(s.chars().count());
    format!("{}{}", s, " ".repeat(fill))
}
