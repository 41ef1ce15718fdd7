pub mod screen;

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Paragraph, Widget},
};
use unicode_width::UnicodeWidthStr;

use crate::{
    app::App,
    session::{Phase, ROUND_SIZES},
    ui::screen::{current_screen, ScreenKind},
};

const HORIZONTAL_MARGIN: u16 = 2;
const VERTICAL_MARGIN: u16 = 1;

/// Preferred cell footprint; cells shrink on small terminals
pub const CELL_WIDTH: u16 = 6;
pub const CELL_HEIGHT: u16 = 3;

/// Screen regions. Rendering and mouse hit-testing both derive from this so
/// a click always lands on the cell that was drawn there.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenLayout {
    pub title: Rect,
    pub status: Rect,
    pub board: Rect,
    pub stats: Rect,
    pub message: Rect,
    pub legend: Rect,
}

impl ScreenLayout {
    /// First line of the message area doubles as the start button
    pub fn start_button(&self) -> Rect {
        Rect {
            height: self.message.height.min(1),
            ..self.message
        }
    }
}

pub fn screen_layout(area: Rect) -> ScreenLayout {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Length(1), // title
            Constraint::Length(1), // errors / time
            Constraint::Min(3),    // board
            Constraint::Length(4), // per-size results
            Constraint::Length(3), // message / start button
            Constraint::Length(1), // legend
        ])
        .split(area);

    ScreenLayout {
        title: chunks[0],
        status: chunks[1],
        board: chunks[2],
        stats: chunks[3],
        message: chunks[4],
        legend: chunks[5],
    }
}

/// Placement of an n×n board centred inside its area
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoardGeometry {
    origin_x: u16,
    origin_y: u16,
    cell_width: u16,
    cell_height: u16,
    size: u16,
}

impl BoardGeometry {
    pub fn new(area: Rect, size: usize) -> Self {
        let n = size.max(1) as u16;
        let cell_width = (area.width / n).clamp(1, CELL_WIDTH);
        let cell_height = (area.height / n).clamp(1, CELL_HEIGHT);

        Self {
            origin_x: area.x + area.width.saturating_sub(cell_width * n) / 2,
            origin_y: area.y + area.height.saturating_sub(cell_height * n) / 2,
            cell_width,
            cell_height,
            size: n,
        }
    }

    pub fn cell_rect(&self, index: usize) -> Rect {
        let n = self.size as usize;
        let (row, col) = ((index / n) as u16, (index % n) as u16);
        Rect::new(
            self.origin_x + col * self.cell_width,
            self.origin_y + row * self.cell_height,
            self.cell_width,
            self.cell_height,
        )
    }

    /// Row-major index of the cell under a terminal position
    pub fn cell_at(&self, column: u16, row: u16) -> Option<usize> {
        if column < self.origin_x || row < self.origin_y {
            return None;
        }
        let col = (column - self.origin_x) / self.cell_width;
        let line = (row - self.origin_y) / self.cell_height;
        if col >= self.size || line >= self.size {
            return None;
        }
        Some(line as usize * self.size as usize + col as usize)
    }
}

pub fn format_secs(secs: u64) -> String {
    format!("{secs}s")
}

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let session = &self.session;
        let layout = screen_layout(area);
        let kind = ScreenKind::for_phase(session.phase());
        let screen = current_screen(kind);

        let bold_style = Style::default().add_modifier(Modifier::BOLD);
        let dim_style = Style::default().add_modifier(Modifier::DIM);
        let italic_style = Style::default().add_modifier(Modifier::ITALIC);

        let size = session.grid().size();
        Paragraph::new(Line::from(vec![
            Span::styled("schulte", bold_style.fg(Color::Cyan)),
            Span::raw(format!("  {size}×{size}  ")),
            Span::styled(kind.to_string(), dim_style),
        ]))
        .alignment(Alignment::Center)
        .render(layout.title, buf);

        let next = if session.in_progress() {
            session.expected_next().to_string()
        } else {
            "-".to_string()
        };
        Paragraph::new(Span::styled(
            format!(
                "Next: {}   Errors: {}   Time: {}",
                next,
                session.error_count(),
                format_secs(self.elapsed_secs())
            ),
            bold_style,
        ))
        .alignment(Alignment::Center)
        .render(layout.status, buf);

        render_board(self, layout.board, buf);

        let mut stat_lines = vec![Line::from(Span::styled(
            format!("{:<6}{:>8}{:>8}", "grid", "time", "errors"),
            bold_style.add_modifier(Modifier::UNDERLINED),
        ))];
        for s in ROUND_SIZES {
            let line = match session.stats().get(&s) {
                Some(r) => format!(
                    "{:<6}{:>8}{:>8}",
                    format!("{s}×{s}"),
                    format_secs(r.elapsed_secs),
                    r.error_count
                ),
                None => format!("{:<6}{:>8}{:>8}", format!("{s}×{s}"), "--", "--"),
            };
            stat_lines.push(Line::from(line));
        }
        Paragraph::new(stat_lines)
            .alignment(Alignment::Center)
            .render(layout.stats, buf);

        Paragraph::new(screen.message(self))
            .alignment(Alignment::Center)
            .render(layout.message, buf);

        Paragraph::new(Span::styled(screen.legend(), italic_style))
            .alignment(Alignment::Center)
            .render(layout.legend, buf);
    }
}

fn render_board(app: &App, area: Rect, buf: &mut Buffer) {
    let grid = app.session.grid();
    let geometry = BoardGeometry::new(area, grid.size());
    let phase = app.session.phase();
    let live = matches!(phase, Phase::Active { .. } | Phase::Cleared { .. });

    for (index, cell) in grid.cells().iter().enumerate() {
        let rect = geometry.cell_rect(index).intersection(area);
        if rect.is_empty() {
            continue;
        }

        let mut style = Style::default().add_modifier(Modifier::BOLD);
        if !live {
            style = style.add_modifier(Modifier::DIM);
        } else if app.is_flashing(index) {
            style = style.fg(Color::White).bg(Color::Red);
        } else if cell.matched {
            style = style.fg(Color::Green).add_modifier(Modifier::DIM);
        }
        if app.session.in_progress() && index == app.selected {
            style = style.add_modifier(Modifier::REVERSED);
        }

        let label = cell.value.to_string();
        let bordered = rect.height >= 3 && rect.width as usize >= label.width() + 2;
        let paragraph = Paragraph::new(Span::styled(label, style)).alignment(Alignment::Center);
        if bordered {
            paragraph
                .block(Block::bordered().border_style(style.remove_modifier(Modifier::REVERSED)))
                .render(rect, buf);
        } else {
            paragraph.render(rect, buf);
        }
    }
}
