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
        .trouble
        .items
        .iter()
        .map(|word| {
            let lapse_color = match word.lapses {
                1 => Color::Yellow,
                _ => Color::Red,
            };

            ListItem::new(Line::from(vec![
                Span::styled(pad(&word.front, 16), Style::default().fg(Color::White)),
                Span::styled(pad(&word.phonetic, 16), Style::default().fg(Color::Gray)),
                Span::styled(pad(&word.meaning, 20), Style::default().fg(Color::White)),
                Span::styled(
                    pad(&word.lapses.to_string(), 8),
                    Style::default().fg(lapse_color),
                ),
                Span::styled(
                    word.last_lapse.format("%Y-%m-%d").to_string(),
                    Style::default().fg(Color::DarkGray),
                ),
            ]))
        })
        .collect();

    let header = vec![
        ("Word".to_string(), 16),
        ("Transliteration".to_string(), 16),
        ("Meaning".to_string(), 20),
        ("Lapses".to_string(), 8),
        ("Last Lapse".to_string(), 10),
    ];

    draw_table(
        f,
        area,
        format!(" Trouble Words ({}) ", app.trouble.items.len()),
        Color::Red,
        header,
        items,
        app.trouble.selected,
    );
}
