use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};

use super::{ease_bar, truncate};
use crate::tui::App;

pub fn draw(f: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(9), // Stats + due cards row
            Constraint::Min(0),    // Recent sessions
        ])
        .split(area);

    let top_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(chunks[0]);

    draw_stats(f, app, top_chunks[0]);
    draw_due_cards(f, app, top_chunks[1]);
    draw_recent_sessions(f, app, chunks[1]);
}

fn stat_line(label: &str, value: String, color: Color) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("{}: ", label), Style::default().fg(Color::Gray)),
        Span::styled(value, Style::default().fg(color)),
    ])
}

fn draw_stats(f: &mut Frame, app: &App, area: Rect) {
    let stats = &app.stats;

    let text = vec![
        Line::from(vec![
            Span::styled("Cards: ", Style::default().fg(Color::Gray)),
            Span::styled(
                stats.total_cards.to_string(),
                Style::default()
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD),
            ),
        ]),
        stat_line(
            "Due today",
            stats.due_today.to_string(),
            if stats.due_today > 0 {
                Color::Yellow
            } else {
                Color::White
            },
        ),
        stat_line("New", stats.new_cards.to_string(), Color::Cyan),
        stat_line(
            "Trouble words",
            stats.trouble_words.to_string(),
            if stats.trouble_words > 0 {
                Color::Red
            } else {
                Color::White
            },
        ),
        stat_line(
            "Sessions",
            format!("{} ({} reviews)", stats.sessions, stats.total_reviews),
            Color::White,
        ),
        stat_line(
            "Accuracy",
            stats
                .lifetime_accuracy
                .map(|a| format!("{:.1}%", a))
                .unwrap_or_else(|| "-".to_string()),
            Color::Green,
        ),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Stats ")
        .title_style(Style::default().fg(Color::Cyan));

    f.render_widget(Paragraph::new(text).block(block), area);
}

fn draw_due_cards(f: &mut Frame, app: &App, area: Rect) {
    let items: Vec<ListItem> = app
        .due_cards
        .iter()
        .enumerate()
        .map(|(i, card)| {
            let style = if card.repetitions == 0 {
                Style::default().fg(Color::Red)
            } else {
                Style::default().fg(Color::Yellow)
            };

            ListItem::new(Line::from(vec![
                Span::styled(format!("{}. ", i + 1), Style::default().fg(Color::DarkGray)),
                Span::styled(truncate(&card.front, 16), style),
                Span::raw(" "),
                Span::styled(ease_bar(card.ease_factor), Style::default().fg(Color::Green)),
            ]))
        })
        .collect();

    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" Due Today ({}) ", app.due_cards.len()))
        .title_style(Style::default().fg(Color::Yellow));

    f.render_widget(List::new(items).block(block), area);
}

fn draw_recent_sessions(f: &mut Frame, app: &App, area: Rect) {
    let items: Vec<ListItem> = app
        .history
        .items
        .iter()
        .take(area.height.saturating_sub(2) as usize)
        .map(|entry| {
            let color = if entry.accuracy >= 80.0 {
                Color::Green
            } else if entry.accuracy >= 50.0 {
                Color::Yellow
            } else {
                Color::Red
            };

            ListItem::new(Line::from(vec![
                Span::styled(
                    format!("{:<10}", entry.date.format("%b %d")),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::styled(
                    format!("{:>3} cards  ", entry.total),
                    Style::default().fg(Color::White),
                ),
                Span::styled(
                    format!("{:>3} ✓ {:>3} ✗  ", entry.correct, entry.incorrect),
                    Style::default().fg(Color::Cyan),
                ),
                Span::styled(format!("{:.1}%", entry.accuracy), Style::default().fg(color)),
            ]))
        })
        .collect();

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Recent Sessions ")
        .title_style(Style::default().fg(Color::Magenta));

    f.render_widget(List::new(items).block(block), area);
}
