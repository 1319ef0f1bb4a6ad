use std::time::Instant;

use crossbeam_channel::{Receiver, TryRecvError};
use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind};
use rand::rngs::StdRng;
use tracing::{error, info};

use crate::notifications::{NotificationCenter, RequestId};
use crate::panels::{ControlAction, ControlsPanel, StatusPanel, StatusView};
use crate::scheduler::ChimeScheduler;
use crate::util::Shortcut;

pub struct App<N> {
    pub should_quit: bool,
    pub scheduler: ChimeScheduler<N, StdRng>,
    pub controls: ControlsPanel,
    pub status: StatusPanel,
    pub help_visible: bool,
    pub error: Option<String>,
    /// False while the terminal window is unfocused.
    pub foreground: bool,
    deliveries: Receiver<RequestId>,
    notifier_lost: bool,
    tick_count: u32,
}

impl<N: NotificationCenter> App<N> {
    pub fn new(scheduler: ChimeScheduler<N, StdRng>, deliveries: Receiver<RequestId>) -> Self {
        Self {
            should_quit: false,
            scheduler,
            controls: ControlsPanel::default(),
            status: StatusPanel,
            help_visible: false,
            error: None,
            foreground: true,
            deliveries,
            notifier_lost: false,
            tick_count: 0,
        }
    }

    pub fn show_error(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
    }

    pub fn handle_event(&mut self, event: Event, now: Instant) {
        match event {
            Event::Key(key) if key.kind == KeyEventKind::Press => self.handle_key(key, now),
            Event::FocusGained => {
                info!("returned to foreground");
                self.foreground = true;
                self.drain_deliveries(now);
                self.scheduler.on_resume(now);
            }
            Event::FocusLost => {
                info!("moved to background");
                self.foreground = false;
            }
            _ => {}
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent, now: Instant) {
        // Any key dismisses the error overlay
        if self.error.take().is_some() {
            return;
        }

        if self.help_visible {
            match key.code {
                KeyCode::Char('q') => self.should_quit = true,
                KeyCode::Char('?') | KeyCode::Esc => self.help_visible = false,
                _ => {}
            }
            return;
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Char('?') => self.help_visible = true,
            KeyCode::Char('s' | 'S') => {
                self.drain_deliveries(now);
                self.scheduler.toggle(now);
            }
            _ => match self.controls.handle_key(key, self.scheduler.interval()) {
                ControlAction::SetInterval(interval) => {
                    self.drain_deliveries(now);
                    self.scheduler.set_interval(interval, now);
                }
                ControlAction::Toggle => {
                    self.drain_deliveries(now);
                    self.scheduler.toggle(now);
                }
                ControlAction::Consumed | ControlAction::Ignored => {}
            },
        }
    }

    pub fn tick(&mut self, now: Instant) {
        self.drain_deliveries(now);
        self.tick_count = self.tick_count.wrapping_add(1);
    }

    /// Forward deliveries from the notifier to the scheduler. Runs before
    /// anything that clears the scheduler's tracking so rung chimes still
    /// count.
    fn drain_deliveries(&mut self, now: Instant) {
        loop {
            match self.deliveries.try_recv() {
                Ok(id) => self.scheduler.on_delivered(id, now),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    if !self.notifier_lost {
                        self.notifier_lost = true;
                        error!("background notifier disconnected");
                        self.show_error("Background notifier stopped; chimes will not sound");
                    }
                    break;
                }
            }
        }
    }

    pub fn status_view(&self, now: Instant) -> StatusView<'_> {
        StatusView {
            running: self.scheduler.is_running(),
            interval: self.scheduler.interval(),
            outstanding: self.scheduler.outstanding(),
            queued: self.scheduler.queued(),
            delivered: self.scheduler.delivered(),
            next_in: self
                .scheduler
                .next_fire()
                .map(|at| at.saturating_duration_since(now)),
            foreground: self.foreground,
            last_error: self.scheduler.last_error(),
            tick_count: self.tick_count,
        }
    }

    pub fn shortcuts(&self) -> Vec<Shortcut> {
        self.controls.shortcuts()
    }
}
