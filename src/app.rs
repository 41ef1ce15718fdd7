use chrono::{DateTime, Local};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;
use std::time::Instant;
use tracing::debug;

use crate::clipboard::{deliver_summary, Delivery, SummarySink};
use crate::config::Config;
use crate::session::{ClickOutcome, Phase, Session, Transition};
use crate::ui::{screen_layout, BoardGeometry};

/// Cell briefly highlighted after a wrong pick. Cosmetic only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorFlash {
    pub index: usize,
    pub until: Instant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Continue,
    Quit,
}

#[derive(Debug)]
pub struct App {
    pub session: Session,
    pub config: Config,
    /// Keyboard selection, row-major cell index
    pub selected: usize,
    pub flashes: Vec<ErrorFlash>,
    pub delivery: Option<Delivery>,
    pub finished_at: Option<DateTime<Local>>,
    /// Time of the last handled event; rendering reads the clock from here
    pub now: Instant,
}

impl App {
    pub fn new(config: Config) -> Self {
        Self {
            session: Session::new(config.session_config()),
            config,
            selected: 0,
            flashes: Vec::new(),
            delivery: None,
            finished_at: None,
            now: Instant::now(),
        }
    }

    pub fn start(&mut self, now: Instant) -> bool {
        self.now = now;
        if !self.session.start(now) {
            return false;
        }
        self.selected = 0;
        self.flashes.clear();
        self.delivery = None;
        self.finished_at = None;
        true
    }

    /// Single dispatch point for selecting a cell, whatever the input device.
    pub fn click_cell(&mut self, index: usize, now: Instant) -> ClickOutcome {
        self.now = now;
        let value = match self.session.grid().cell(index) {
            Some(cell) => cell.value,
            None => return ClickOutcome::Ignored,
        };

        let outcome = self.session.click(value, now);
        if let ClickOutcome::Mismatch { .. } = outcome {
            self.flashes.retain(|f| f.index != index);
            self.flashes.push(ErrorFlash {
                index,
                until: now + self.config.error_flash(),
            });
        }
        outcome
    }

    pub fn on_tick(&mut self, now: Instant, sink: &mut dyn SummarySink) -> Option<Transition> {
        self.now = now;
        self.flashes.retain(|f| f.until > now);

        let transition = self.session.tick(now);
        match transition {
            Some(Transition::NextRound { .. }) => {
                self.selected = 0;
                self.flashes.clear();
            }
            Some(Transition::Finished(summary)) => {
                self.flashes.clear();
                self.finished_at = Some(Local::now());
                self.delivery = Some(deliver_summary(sink, &summary));
            }
            None => {}
        }
        transition
    }

    pub fn on_key(&mut self, key: KeyEvent, now: Instant) -> Control {
        self.now = now;
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Control::Quit;
        }

        let size = self.session.grid().size();
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => return Control::Quit,
            KeyCode::Char('s') => {
                self.start(now);
            }
            KeyCode::Left | KeyCode::Char('h') => {
                if self.selected % size > 0 {
                    self.selected -= 1;
                }
            }
            KeyCode::Right | KeyCode::Char('l') => {
                if self.selected % size + 1 < size {
                    self.selected += 1;
                }
            }
            KeyCode::Up | KeyCode::Char('k') => {
                if self.selected >= size {
                    self.selected -= size;
                }
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if self.selected + size < self.session.grid().total() {
                    self.selected += size;
                }
            }
            KeyCode::Enter | KeyCode::Char(' ') => {
                let outcome = self.click_cell(self.selected, now);
                debug!(?outcome, index = self.selected, "keyboard pick");
            }
            _ => {}
        }
        Control::Continue
    }

    /// Left clicks on a cell pick it; a click on the start line starts a
    /// session when one may be started.
    pub fn on_mouse(&mut self, mouse: MouseEvent, area: Rect, now: Instant) -> Option<ClickOutcome> {
        self.now = now;
        if mouse.kind != MouseEventKind::Down(MouseButton::Left) {
            return None;
        }

        let layout = screen_layout(area);
        let geometry = BoardGeometry::new(layout.board, self.session.grid().size());
        if let Some(index) = geometry.cell_at(mouse.column, mouse.row) {
            self.selected = index;
            let outcome = self.click_cell(index, now);
            debug!(?outcome, index, "mouse pick");
            return Some(outcome);
        }

        if self.can_start() && layout.start_button().contains((mouse.column, mouse.row).into()) {
            self.start(now);
        }
        None
    }

    pub fn can_start(&self) -> bool {
        matches!(self.session.phase(), Phase::Idle | Phase::Finished)
    }

    pub fn is_flashing(&self, index: usize) -> bool {
        self.flashes
            .iter()
            .any(|f| f.index == index && f.until > self.now)
    }

    pub fn elapsed_secs(&self) -> u64 {
        self.session.elapsed_secs(self.now)
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clipboard::{DisabledClipboard, MemoryClipboard};
    use crate::session::ROUND_SIZES;
    use std::time::Duration;

    fn app() -> App {
        App::new(Config {
            seed: Some(17),
            ..Config::default()
        })
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn left_click(column: u16, row: u16) -> MouseEvent {
        MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column,
            row,
            modifiers: KeyModifiers::NONE,
        }
    }

    fn index_of(app: &App, value: usize) -> usize {
        app.session.grid().position_of(value).unwrap()
    }

    #[test]
    fn test_quit_keys() {
        let mut app = app();
        let now = Instant::now();
        assert_eq!(app.on_key(key(KeyCode::Esc), now), Control::Quit);
        assert_eq!(app.on_key(key(KeyCode::Char('q')), now), Control::Quit);
        assert_eq!(
            app.on_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL), now),
            Control::Quit
        );
        assert_eq!(app.on_key(key(KeyCode::Char('x')), now), Control::Continue);
    }

    #[test]
    fn test_start_key_and_cursor_movement() {
        let mut app = app();
        let now = Instant::now();
        app.on_key(key(KeyCode::Char('s')), now);
        assert!(app.session.in_progress());

        app.on_key(key(KeyCode::Left), now);
        app.on_key(key(KeyCode::Up), now);
        assert_eq!(app.selected, 0);

        app.on_key(key(KeyCode::Right), now);
        app.on_key(key(KeyCode::Right), now);
        app.on_key(key(KeyCode::Right), now);
        assert_eq!(app.selected, 2);

        app.on_key(key(KeyCode::Char('j')), now);
        app.on_key(key(KeyCode::Down), now);
        app.on_key(key(KeyCode::Down), now);
        assert_eq!(app.selected, 8);

        app.on_key(key(KeyCode::Char('h')), now);
        app.on_key(key(KeyCode::Char('k')), now);
        assert_eq!(app.selected, 4);
    }

    #[test]
    fn test_enter_picks_selected_cell() {
        let mut app = app();
        let now = Instant::now();
        app.start(now);

        app.selected = index_of(&app, 1);
        app.on_key(key(KeyCode::Enter), now);
        assert_eq!(app.session.expected_next(), 2);

        app.selected = index_of(&app, 5);
        app.on_key(key(KeyCode::Char(' ')), now);
        assert_eq!(app.session.error_count(), 1);
    }

    #[test]
    fn test_mismatch_flash_expires_on_tick() {
        let mut app = app();
        let mut sink = DisabledClipboard;
        let t0 = Instant::now();
        app.start(t0);

        let wrong = index_of(&app, 4);
        app.click_cell(wrong, t0);
        assert!(app.is_flashing(wrong));
        assert_eq!(app.session.error_count(), 1);

        app.on_tick(t0 + Duration::from_millis(200), &mut sink);
        assert!(app.is_flashing(wrong));

        app.on_tick(t0 + Duration::from_millis(600), &mut sink);
        assert!(!app.is_flashing(wrong));
        assert!(app.flashes.is_empty());
        assert_eq!(app.session.error_count(), 1);
    }

    #[test]
    fn test_click_outside_grid_is_ignored() {
        let mut app = app();
        let now = Instant::now();
        app.start(now);
        assert_eq!(app.click_cell(99, now), ClickOutcome::Ignored);
        assert_eq!(app.session.error_count(), 0);
    }

    #[test]
    fn test_mouse_picks_cell_under_pointer() {
        let mut app = app();
        let area = Rect::new(0, 0, 80, 30);
        let now = Instant::now();
        app.start(now);

        let geometry = BoardGeometry::new(screen_layout(area).board, 3);
        let target = index_of(&app, 1);
        let cell = geometry.cell_rect(target);

        let outcome = app.on_mouse(left_click(cell.x + 1, cell.y + 1), area, now);
        assert_eq!(outcome, Some(ClickOutcome::Matched { value: 1 }));
        assert_eq!(app.selected, target);

        let right = MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Right),
            ..left_click(cell.x, cell.y)
        };
        assert_eq!(app.on_mouse(right, area, now), None);
        assert_eq!(app.on_mouse(left_click(0, 0), area, now), None);
    }

    #[test]
    fn test_mouse_start_button() {
        let mut app = app();
        let area = Rect::new(0, 0, 80, 30);
        let button = screen_layout(area).start_button();

        app.on_mouse(left_click(button.x, button.y), area, Instant::now());
        assert!(app.session.in_progress());
    }

    #[test]
    fn test_full_run_delivers_summary() {
        let mut app = app();
        let mut sink = MemoryClipboard::default();
        let mut now = Instant::now();
        app.start(now);

        for _ in ROUND_SIZES {
            for v in 1..=app.session.grid().total() {
                let idx = index_of(&app, v);
                app.click_cell(idx, now);
            }
            now += Duration::from_millis(app.config.completion_delay_ms);
            app.on_tick(now, &mut sink);
        }

        assert!(app.session.is_finished());
        assert_eq!(app.delivery, Some(Delivery::Copied));
        assert!(app.finished_at.is_some());
        assert_eq!(sink.contents, Some(app.session.summary().encode()));
        assert!(app.can_start());

        app.on_key(key(KeyCode::Char('s')), now);
        assert!(app.delivery.is_none());
        assert_eq!(app.session.phase(), Phase::Active { size: 3 });
    }
}
