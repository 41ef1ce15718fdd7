use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
};

use crate::{app::App, clipboard::Delivery, session::Phase, ui::format_secs};

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum ScreenKind {
    Ready,
    Playing,
    Cleared,
    Results,
}

impl ScreenKind {
    pub fn for_phase(phase: Phase) -> Self {
        match phase {
            Phase::Idle => ScreenKind::Ready,
            Phase::Active { .. } => ScreenKind::Playing,
            Phase::Cleared { .. } => ScreenKind::Cleared,
            Phase::Finished => ScreenKind::Results,
        }
    }
}

/// Per-phase text below the board
pub trait Screen {
    fn message(&self, app: &App) -> Vec<Line<'static>>;
    fn legend(&self) -> &'static str {
        "(s)tart / (q)uit"
    }
}

fn button(label: &'static str) -> Line<'static> {
    Line::from(Span::styled(
        label,
        Style::default()
            .fg(Color::Black)
            .bg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    ))
}

pub struct ReadyScreen;

impl Screen for ReadyScreen {
    fn message(&self, _app: &App) -> Vec<Line<'static>> {
        vec![
            button("[ Start ]"),
            Line::from("Pick 1, 2, 3 ... in order as fast as you can."),
            Line::from("Three grids: 3×3, 4×4, 5×5."),
        ]
    }
}

pub struct PlayingScreen;

impl Screen for PlayingScreen {
    fn message(&self, app: &App) -> Vec<Line<'static>> {
        let total = app.session.grid().total();
        vec![
            Line::from(""),
            Line::from(Span::styled(
                format!("Find {} of {}", app.session.expected_next(), total),
                Style::default().add_modifier(Modifier::BOLD),
            )),
        ]
    }

    fn legend(&self) -> &'static str {
        "click a cell or move with ←↑↓→/hjkl and press enter / (q)uit"
    }
}

pub struct ClearedScreen;

impl Screen for ClearedScreen {
    fn message(&self, app: &App) -> Vec<Line<'static>> {
        let size = app.session.current_size();
        let stats = app.session.stats().get(&size).copied().unwrap_or_default();
        vec![
            Line::from(""),
            Line::from(Span::styled(
                format!(
                    "{size}×{size} cleared in {} with {} error(s)",
                    format_secs(stats.elapsed_secs),
                    stats.error_count
                ),
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
            )),
        ]
    }

    fn legend(&self) -> &'static str {
        "get ready... / (q)uit"
    }
}

pub struct ResultsScreen;

impl Screen for ResultsScreen {
    fn message(&self, app: &App) -> Vec<Line<'static>> {
        let code = app.session.summary().encode();
        let finished = app
            .finished_at
            .map(|t| t.format("%H:%M:%S").to_string())
            .unwrap_or_default();
        let status = match &app.delivery {
            Some(Delivery::Copied) => Line::from(Span::styled(
                format!("Finished {finished}, code copied to clipboard"),
                Style::default().fg(Color::Green),
            )),
            Some(Delivery::Fallback { reason }) => Line::from(Span::styled(
                format!("Finished {finished}, {reason}: copy the code by hand"),
                Style::default().fg(Color::Yellow),
            )),
            None => Line::from(format!("Finished {finished}")),
        };

        vec![
            button("[ Play again ]"),
            Line::from(vec![
                Span::raw("Code: "),
                Span::styled(code, Style::default().add_modifier(Modifier::BOLD)),
            ]),
            status,
        ]
    }
}

/// Helper to construct the screen for the current phase
pub fn current_screen(kind: ScreenKind) -> Box<dyn Screen> {
    match kind {
        ScreenKind::Ready => Box::new(ReadyScreen),
        ScreenKind::Playing => Box::new(PlayingScreen),
        ScreenKind::Cleared => Box::new(ClearedScreen),
        ScreenKind::Results => Box::new(ResultsScreen),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clipboard::DisabledClipboard;
    use crate::config::Config;
    use std::time::{Duration, Instant};

    fn text(lines: &[Line<'_>]) -> String {
        lines
            .iter()
            .map(|l| l.spans.iter().map(|s| s.content.as_ref()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn screen_kind_follows_phase() {
        let now = Instant::now();
        assert_eq!(ScreenKind::for_phase(Phase::Idle), ScreenKind::Ready);
        assert_eq!(
            ScreenKind::for_phase(Phase::Active { size: 4 }),
            ScreenKind::Playing
        );
        assert_eq!(
            ScreenKind::for_phase(Phase::Cleared {
                size: 4,
                advance_at: now
            }),
            ScreenKind::Cleared
        );
        assert_eq!(ScreenKind::for_phase(Phase::Finished), ScreenKind::Results);
        assert_eq!(ScreenKind::Results.to_string(), "Results");
    }

    #[test]
    fn results_screen_shows_code_and_fallback() {
        let mut app = App::new(Config {
            seed: Some(8),
            completion_delay_ms: 0,
            ..Config::default()
        });
        let mut sink = DisabledClipboard;
        let mut now = Instant::now();
        app.start(now);
        while !app.session.is_finished() {
            for v in 1..=app.session.grid().total() {
                let idx = app.session.grid().position_of(v).unwrap();
                app.click_cell(idx, now);
            }
            now += Duration::from_millis(1);
            app.on_tick(now, &mut sink);
        }

        let screen = current_screen(ScreenKind::for_phase(app.session.phase()));
        let msg = text(&screen.message(&app));
        assert!(msg.contains("Play again"));
        assert!(msg.contains(&app.session.summary().encode()));
        assert!(msg.contains("clipboard disabled"));
    }

    #[test]
    fn playing_screen_names_the_next_value() {
        let mut app = App::default();
        app.start(Instant::now());
        let msg = text(&PlayingScreen.message(&app));
        assert!(msg.contains("Find 1 of 9"));
    }
}
