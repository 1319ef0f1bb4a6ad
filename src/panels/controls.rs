use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Gauge, Paragraph},
    Frame,
};

use super::util::panel_block;
use crate::interval::{format_secs, IntervalRange, UPPER_LIMIT_SECS};
use crate::util::Shortcut;

const FINE_STEP: i64 = 1;
const COARSE_STEP: i64 = 10;
const PAGE_STEP: i64 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Control {
    #[default]
    MinSlider,
    MaxSlider,
    Toggle,
}

impl Control {
    const ALL: [Self; 3] = [Self::MinSlider, Self::MaxSlider, Self::Toggle];

    fn index(self) -> usize {
        Self::ALL.iter().position(|&c| c == self).unwrap_or(0)
    }

    fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    fn previous(self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlAction {
    Consumed,
    Ignored,
    SetInterval(IntervalRange),
    Toggle,
}

#[derive(Default)]
pub struct ControlsPanel {
    pub focus: Control,
}

impl ControlsPanel {
    pub fn handle_key(&mut self, key: KeyEvent, interval: IntervalRange) -> ControlAction {
        match key.code {
            KeyCode::Tab if key.modifiers.contains(KeyModifiers::SHIFT) => {
                self.focus = self.focus.previous();
                ControlAction::Consumed
            }
            KeyCode::Tab | KeyCode::Down | KeyCode::Char('j') => {
                self.focus = self.focus.next();
                ControlAction::Consumed
            }
            KeyCode::BackTab | KeyCode::Up | KeyCode::Char('k') => {
                self.focus = self.focus.previous();
                ControlAction::Consumed
            }
            KeyCode::Left | KeyCode::Char('h') => self.adjust(interval, -FINE_STEP),
            KeyCode::Right | KeyCode::Char('l') => self.adjust(interval, FINE_STEP),
            KeyCode::Char('H') => self.adjust(interval, -COARSE_STEP),
            KeyCode::Char('L') => self.adjust(interval, COARSE_STEP),
            KeyCode::PageDown => self.adjust(interval, -PAGE_STEP),
            KeyCode::PageUp => self.adjust(interval, PAGE_STEP),
            KeyCode::Char(' ') | KeyCode::Enter if self.focus == Control::Toggle => {
                ControlAction::Toggle
            }
            _ => ControlAction::Ignored,
        }
    }

    fn adjust(&self, interval: IntervalRange, delta: i64) -> ControlAction {
        let step = |value: u32| {
            u32::try_from((i64::from(value) + delta).max(0)).unwrap_or(UPPER_LIMIT_SECS)
        };
        let updated = match self.focus {
            Control::MinSlider => interval.with_min(step(interval.min_secs())),
            Control::MaxSlider => interval.with_max(step(interval.max_secs())),
            Control::Toggle => return ControlAction::Ignored,
        };

        if updated == interval {
            ControlAction::Consumed
        } else {
            ControlAction::SetInterval(updated)
        }
    }

    pub fn shortcuts(&self) -> Vec<Shortcut> {
        vec![
            Shortcut {
                key: "Tab/j/k",
                description: "Next/Prev Control",
            },
            Shortcut {
                key: "h/l",
                description: "Adjust 1s",
            },
            Shortcut {
                key: "H/L",
                description: "Adjust 10s",
            },
            Shortcut {
                key: "PgUp/PgDn",
                description: "Adjust 1m",
            },
            Shortcut {
                key: "Space",
                description: "Press Button",
            },
        ]
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, interval: IntervalRange, running: bool) {
        let block = panel_block(" Controls ", true);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let rows = Layout::vertical([
            Constraint::Length(3), // min slider
            Constraint::Length(3), // max slider
            Constraint::Length(3), // start/stop
            Constraint::Min(0),
        ])
        .split(inner);

        self.render_slider(
            frame,
            rows[0],
            " Shortest gap ",
            interval.min_secs(),
            Control::MinSlider,
        );
        self.render_slider(
            frame,
            rows[1],
            " Longest gap ",
            interval.max_secs(),
            Control::MaxSlider,
        );
        self.render_button(frame, rows[2], running);
    }

    fn render_slider(
        &self,
        frame: &mut Frame,
        area: Rect,
        title: &str,
        value: u32,
        control: Control,
    ) {
        let focused = self.focus == control;
        let color = if focused { Color::Yellow } else { Color::Blue };

        let gauge = Gauge::default()
            .block(control_block(title, focused))
            .gauge_style(Style::default().fg(color).bg(Color::Black))
            .ratio(slider_ratio(value))
            .label(format!("{} ({value}s)", format_secs(u64::from(value))));
        frame.render_widget(gauge, area);
    }

    fn render_button(&self, frame: &mut Frame, area: Rect, running: bool) {
        let focused = self.focus == Control::Toggle;
        let (label, color) = if running {
            ("[ Stop ]", Color::Red)
        } else {
            ("[ Start ]", Color::Green)
        };

        let mut style = Style::default().fg(color);
        if focused {
            style = style.add_modifier(Modifier::BOLD | Modifier::REVERSED);
        }

        let button = Paragraph::new(label)
            .style(style)
            .alignment(Alignment::Center)
            .block(control_block("", focused));
        frame.render_widget(button, area);
    }
}

fn control_block(title: &str, focused: bool) -> Block<'_> {
    let color = if focused {
        Color::Cyan
    } else {
        Color::DarkGray
    };
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(color))
        .title(title)
}

/// Log-scaled slider position so short gaps get usable resolution.
pub fn slider_ratio(value: u32) -> f64 {
    let value = f64::from(value.max(1)).ln();
    (value / f64::from(UPPER_LIMIT_SECS).ln()).clamp(0.0, 1.0)
}
