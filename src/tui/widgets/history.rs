use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::ListItem,
    Frame,
};

use super::{draw_table, pad};
use crate::tui::App;

pub fn draw(f: &mut Frame, app: &App, area: Rect) {
    let items: Vec<ListItem> = app
        .history
        .items
        .iter()
        .map(|entry| {
            let filled = (entry.accuracy / 10.0).round().clamp(0.0, 10.0) as usize;
            let bar = format!("{}{}", "█".repeat(filled), "░".repeat(10 - filled));

            ListItem::new(Line::from(vec![
                Span::styled(
                    pad(&entry.date.format("%Y-%m-%d").to_string(), 12),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::styled(
                    pad(&entry.total.to_string(), 8),
                    Style::default().fg(Color::White),
                ),
                Span::styled(
                    pad(&entry.correct.to_string(), 9),
                    Style::default().fg(Color::Green),
                ),
                Span::styled(
                    pad(&entry.incorrect.to_string(), 11),
                    Style::default().fg(Color::Red),
                ),
                Span::styled(format!("{} ", bar), Style::default().fg(Color::Cyan)),
                Span::styled(
                    format!("{:.1}%", entry.accuracy),
                    Style::default().fg(Color::White),
                ),
            ]))
        })
        .collect();

    let header = vec![
        ("Date".to_string(), 12),
        ("Total".to_string(), 8),
        ("Correct".to_string(), 9),
        ("Incorrect".to_string(), 11),
        ("Accuracy".to_string(), 11),
    ];

    draw_table(
        f,
        area,
        format!(" Progress History ({} sessions) ", app.history.items.len()),
        Color::Magenta,
        header,
        items,
        app.history.selected,
    );
}
