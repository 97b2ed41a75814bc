use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::ListItem,
    Frame,
};

use super::{draw_table, ease_bar, pad};
use crate::scheduler;
use crate::tui::App;

pub fn draw(f: &mut Frame, app: &App, area: Rect) {
    let title = match &app.filter {
        Some(filter) => format!(" Deck (filter: {}) ", filter),
        None => format!(" Deck ({}) ", app.deck.items.len()),
    };

    let items: Vec<ListItem> = app
        .deck
        .items
        .iter()
        .map(|card| {
            let days = scheduler::days_until_due(card, app.today);
            let (due_text, due_color) = match days {
                d if d < 0 => (format!("{}d overdue", -d), Color::Red),
                0 => ("today".to_string(), Color::Yellow),
                1 => ("tomorrow".to_string(), Color::White),
                d => (format!("in {}d", d), Color::White),
            };

            ListItem::new(Line::from(vec![
                Span::styled(pad(&card.front, 16), Style::default().fg(Color::White)),
                Span::styled(pad(&card.phonetic, 16), Style::default().fg(Color::Gray)),
                Span::styled(pad(&card.meaning, 20), Style::default().fg(Color::White)),
                Span::styled(
                    format!("{} ", ease_bar(card.ease_factor)),
                    Style::default().fg(Color::Green),
                ),
                Span::styled(
                    pad(card.stage_label(), 13),
                    Style::default().fg(Color::Cyan),
                ),
                Span::styled(due_text, Style::default().fg(due_color)),
            ]))
        })
        .collect();

    let header = vec![
        ("Word".to_string(), 16),
        ("Transliteration".to_string(), 16),
        ("Meaning".to_string(), 20),
        ("Ease".to_string(), 6),
        ("Stage".to_string(), 13),
        ("Due".to_string(), 10),
    ];

    draw_table(
        f,
        area,
        title,
        Color::Cyan,
        header,
        items,
        app.deck.selected,
    );
}
