mod ui;
mod widgets;

use chrono::NaiveDate;
use std::io;
use std::time::Duration;

use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};

use crate::models::{Card, DeckStats, ProgressEntry};
use crate::scheduler;
use crate::store::{CsvStore, StoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Dashboard,
    Deck,
    Trouble,
    History,
}

impl View {
    fn next(&self) -> Self {
        match self {
            View::Dashboard => View::Deck,
            View::Deck => View::Trouble,
            View::Trouble => View::History,
            View::History => View::Dashboard,
        }
    }

    fn prev(&self) -> Self {
        match self {
            View::Dashboard => View::History,
            View::Deck => View::Dashboard,
            View::Trouble => View::Deck,
            View::History => View::Trouble,
        }
    }
}

pub struct StatefulList<T> {
    pub items: Vec<T>,
    pub selected: Option<usize>,
}

impl<T> StatefulList<T> {
    fn with_items(items: Vec<T>) -> Self {
        let selected = if items.is_empty() { None } else { Some(0) };
        Self { items, selected }
    }

    fn next(&mut self) {
        if self.items.is_empty() {
            return;
        }
        let i = match self.selected {
            Some(i) if i + 1 < self.items.len() => i + 1,
            _ => 0,
        };
        self.selected = Some(i);
    }

    fn previous(&mut self) {
        if self.items.is_empty() {
            return;
        }
        let i = match self.selected {
            Some(0) | None => self.items.len() - 1,
            Some(i) => i - 1,
        };
        self.selected = Some(i);
    }

    fn first(&mut self) {
        if !self.items.is_empty() {
            self.selected = Some(0);
        }
    }

    fn last(&mut self) {
        if !self.items.is_empty() {
            self.selected = Some(self.items.len() - 1);
        }
    }
}

/// A trouble-log word with every logged lapse folded together.
#[derive(Debug, Clone, PartialEq)]
pub struct TroubleWord {
    pub front: String,
    pub phonetic: String,
    pub meaning: String,
    pub lapses: usize,
    pub last_lapse: NaiveDate,
}

pub fn group_trouble(entries: Vec<Card>) -> Vec<TroubleWord> {
    let mut words: Vec<TroubleWord> = Vec::new();
    for entry in entries {
        match words.iter_mut().find(|w| w.front == entry.front) {
            Some(word) => {
                word.lapses += 1;
                word.last_lapse = word.last_lapse.max(entry.last_reviewed);
            }
            None => words.push(TroubleWord {
                front: entry.front,
                phonetic: entry.phonetic,
                meaning: entry.meaning,
                lapses: 1,
                last_lapse: entry.last_reviewed,
            }),
        }
    }
    words.sort_by(|a, b| b.lapses.cmp(&a.lapses).then_with(|| a.front.cmp(&b.front)));
    words
}

fn matches_filter(card: &Card, filter: &str) -> bool {
    let needle = filter.to_lowercase();
    [&card.front, &card.phonetic, &card.meaning]
        .iter()
        .any(|field| field.to_lowercase().contains(&needle))
}

pub struct App {
    store: CsvStore,
    pub today: NaiveDate,
    pub view: View,
    pub deck: StatefulList<Card>,
    pub trouble: StatefulList<TroubleWord>,
    pub history: StatefulList<ProgressEntry>,
    pub due_cards: Vec<Card>,
    pub stats: DeckStats,
    pub filter: Option<String>,
    pub filter_input: String,
    pub filter_mode: bool,
    pub should_quit: bool,
}

impl App {
    pub fn new(store: CsvStore, today: NaiveDate) -> Result<Self, StoreError> {
        let mut app = Self {
            store,
            today,
            view: View::Dashboard,
            deck: StatefulList::with_items(Vec::new()),
            trouble: StatefulList::with_items(Vec::new()),
            history: StatefulList::with_items(Vec::new()),
            due_cards: Vec::new(),
            stats: DeckStats::default(),
            filter: None,
            filter_input: String::new(),
            filter_mode: false,
            should_quit: false,
        };
        app.refresh_data()?;
        Ok(app)
    }

    pub fn user(&self) -> &str {
        self.store.user()
    }

    pub fn refresh_data(&mut self) -> Result<(), StoreError> {
        let cards = self.store.load_cards(self.today)?;
        let trouble = group_trouble(self.store.load_trouble_cards(self.today)?);
        let mut history = self.store.load_progress()?;
        history.reverse();

        self.due_cards = cards
            .iter()
            .filter(|c| scheduler::is_due(c, self.today))
            .cloned()
            .collect();
        self.stats = DeckStats::compute(&cards, self.due_cards.len(), trouble.len(), &history);

        let visible = match &self.filter {
            Some(f) => cards.into_iter().filter(|c| matches_filter(c, f)).collect(),
            None => cards,
        };
        self.deck = StatefulList::with_items(visible);
        self.trouble = StatefulList::with_items(trouble);
        self.history = StatefulList::with_items(history);
        Ok(())
    }

    fn apply_filter(&mut self) -> Result<(), StoreError> {
        self.filter = if self.filter_input.is_empty() {
            None
        } else {
            Some(self.filter_input.clone())
        };
        self.refresh_data()
    }

    fn handle_key(&mut self, key: KeyCode, modifiers: KeyModifiers) -> Result<(), StoreError> {
        if self.filter_mode {
            match key {
                KeyCode::Esc => {
                    self.filter_mode = false;
                    self.filter_input.clear();
                }
                KeyCode::Enter => {
                    self.filter_mode = false;
                    self.apply_filter()?;
                }
                KeyCode::Backspace => {
                    self.filter_input.pop();
                }
                KeyCode::Char(c) => self.filter_input.push(c),
                _ => {}
            }
            return Ok(());
        }

        match key {
            KeyCode::Char('q') => self.should_quit = true,

            KeyCode::Char('r') if modifiers.contains(KeyModifiers::CONTROL) => {
                self.refresh_data()?;
            }

            KeyCode::Char('/') if self.view == View::Deck => {
                self.filter_mode = true;
                self.filter_input.clear();
            }

            KeyCode::Esc if self.view == View::Deck && self.filter.is_some() => {
                self.filter_input.clear();
                self.apply_filter()?;
            }

            KeyCode::Char('h') | KeyCode::Left | KeyCode::BackTab => self.view = self.view.prev(),
            KeyCode::Char('l') | KeyCode::Right | KeyCode::Tab => self.view = self.view.next(),

            KeyCode::Char('j') | KeyCode::Down => match self.view {
                View::Deck => self.deck.next(),
                View::Trouble => self.trouble.next(),
                View::History => self.history.next(),
                View::Dashboard => {}
            },
            KeyCode::Char('k') | KeyCode::Up => match self.view {
                View::Deck => self.deck.previous(),
                View::Trouble => self.trouble.previous(),
                View::History => self.history.previous(),
                View::Dashboard => {}
            },

            KeyCode::Char('g') => match self.view {
                View::Deck => self.deck.first(),
                View::Trouble => self.trouble.first(),
                View::History => self.history.first(),
                View::Dashboard => {}
            },
            KeyCode::Char('G') => match self.view {
                View::Deck => self.deck.last(),
                View::Trouble => self.trouble.last(),
                View::History => self.history.last(),
                View::Dashboard => {}
            },

            _ => {}
        }
        Ok(())
    }
}

pub fn run(store: CsvStore, today: NaiveDate) -> Result<(), Box<dyn std::error::Error>> {
    let mut app = App::new(store, today)?;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        terminal.draw(|f| ui::draw(f, app))?;

        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                app.handle_key(key.code, key.modifiers)?;
            }
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::ReviewLog;
    use tempfile::TempDir;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 10, d).unwrap()
    }

    fn setup_app() -> (TempDir, App) {
        let dir = TempDir::new().unwrap();
        let mut store = CsvStore::new(dir.path(), "joe");
        store.init().unwrap();
        store.add_card("بيت", "bayt", "house", day(1)).unwrap();
        store.add_card("كلب", "kalb", "dog", day(5)).unwrap();
        store
            .append_trouble_entry(&Card::new("كلب", "kalb", "dog", day(5)), day(3))
            .unwrap();
        (dir, App::new(store, day(5)).unwrap())
    }

    mod list_tests {
        use super::*;

        #[test]
        fn next_and_previous_wrap() {
            let mut list = StatefulList::with_items(vec![1, 2, 3]);
            list.previous();
            assert_eq!(list.selected, Some(2));
            list.next();
            assert_eq!(list.selected, Some(0));
        }

        #[test]
        fn empty_list_has_no_selection() {
            let mut list: StatefulList<i32> = StatefulList::with_items(vec![]);
            list.next();
            list.last();
            assert_eq!(list.selected, None);
        }
    }

    mod trouble_tests {
        use super::*;

        #[test]
        fn group_trouble_counts_lapses() {
            let entries = vec![
                Card::new("a", "aa", "one", day(1)),
                Card::new("b", "bb", "two", day(2)),
                Card::new("a", "aa", "one", day(4)),
            ];
            let words = group_trouble(entries);
            assert_eq!(words.len(), 2);
            assert_eq!(words[0].front, "a");
            assert_eq!(words[0].lapses, 2);
            assert_eq!(words[0].last_lapse, day(4));
            assert_eq!(words[1].lapses, 1);
        }
    }

    mod app_tests {
        use super::*;

        #[test]
        fn app_loads_deck_and_stats() {
            let (_dir, app) = setup_app();
            assert_eq!(app.user(), "JOE");
            assert_eq!(app.deck.items.len(), 2);
            assert_eq!(app.due_cards.len(), 1);
            assert_eq!(app.stats.trouble_words, 1);
            assert_eq!(app.trouble.items[0].front, "كلب");
        }

        #[test]
        fn view_navigation_cycles() {
            let (_dir, mut app) = setup_app();
            app.handle_key(KeyCode::Char('l'), KeyModifiers::NONE).unwrap();
            assert_eq!(app.view, View::Deck);
            app.handle_key(KeyCode::Char('h'), KeyModifiers::NONE).unwrap();
            app.handle_key(KeyCode::Char('h'), KeyModifiers::NONE).unwrap();
            assert_eq!(app.view, View::History);
        }

        #[test]
        fn filter_narrows_deck() {
            let (_dir, mut app) = setup_app();
            app.view = View::Deck;
            app.handle_key(KeyCode::Char('/'), KeyModifiers::NONE).unwrap();
            for c in "DOG".chars() {
                app.handle_key(KeyCode::Char(c), KeyModifiers::NONE).unwrap();
            }
            app.handle_key(KeyCode::Enter, KeyModifiers::NONE).unwrap();
            assert_eq!(app.deck.items.len(), 1);
            assert_eq!(app.deck.items[0].meaning, "dog");

            app.handle_key(KeyCode::Esc, KeyModifiers::NONE).unwrap();
            assert!(app.filter.is_none());
            assert_eq!(app.deck.items.len(), 2);
        }

        #[test]
        fn q_quits() {
            let (_dir, mut app) = setup_app();
            app.handle_key(KeyCode::Char('q'), KeyModifiers::NONE).unwrap();
            assert!(app.should_quit);
        }
    }
}
