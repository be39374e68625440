use crate::help::KeyHelp;
use crate::pipeline::{Pipeline, RunOutcome};
use crate::preview::PagePreview;
use crate::render::RunCache;
use crate::scheduler::{Scheduler, SchedulerState, Trigger};
use crate::surface::MemorySurface;
use crate::theme::{BASE_STYLE, STATUS_STYLE};
use crossterm::event::{poll, read, Event, KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    backend::Backend,
    buffer::Buffer,
    layout::{Constraint, Layout, Rect},
    text::Line,
    widgets::Widget,
    Terminal,
};
use std::fmt::Write as _;
use std::io::{self, Write};
use std::time::Instant;

/// Interactive preview: the page is redrawn whenever the scheduler says the
/// calendar is due, and the terminal stands in for the browser window.
#[derive(Debug)]
pub(crate) struct App<'a> {
    pipeline: Pipeline<'a>,
    page: MemorySurface,
    cache: RunCache,
    scheduler: Scheduler,
    outcome: Option<RunOutcome>,
    runs: usize,
    state: AppState,
}

impl<'a> App<'a> {
    pub(crate) fn new(pipeline: Pipeline<'a>, page: MemorySurface) -> App<'a> {
        App {
            pipeline,
            page,
            cache: RunCache::default(),
            scheduler: Scheduler::new(),
            outcome: None,
            runs: 0,
            state: AppState::Preview,
        }
    }

    pub(crate) fn run<B: Backend>(mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        self.start(Instant::now());
        while !self.quitting() {
            self.run_due(Instant::now());
            self.draw(terminal)?;
            self.handle_input()?;
        }
        Ok(())
    }

    /// Reports the page as ready and loaded, plus the page builder's own
    /// ready signal if the snapshot says it has one
    fn start(&mut self, now: Instant) {
        self.scheduler.trigger(Trigger::Ready, now);
        self.scheduler.trigger(Trigger::Load, now);
        if self.page.framework_hook() {
            self.scheduler.trigger(Trigger::FrameworkReady, now);
        }
    }

    fn run_due(&mut self, now: Instant) {
        if self.scheduler.take_due(now) {
            self.runs += 1;
            self.outcome = Some(self.pipeline.run(&mut self.page, &mut self.cache));
        }
    }

    fn draw<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        terminal.draw(|frame| frame.render_widget(self, frame.area()))?;
        Ok(())
    }

    fn handle_input(&mut self) -> io::Result<()> {
        // Block indefinitely only when no run is pending
        let ready = match self.scheduler.timeout(Instant::now()) {
            Some(wait) => poll(wait)?,
            None => true,
        };
        if !ready {
            return Ok(());
        }
        let event = read()?;
        if let Event::Resize(..) = event {
            self.scheduler.trigger(Trigger::Resize, Instant::now());
        } else if let Some(KeyEvent {
            code, modifiers, ..
        }) = event.as_key_press_event()
        {
            let normal_modifiers = KeyModifiers::NONE | KeyModifiers::SHIFT;
            if modifiers == KeyModifiers::CONTROL && code == KeyCode::Char('c') {
                self.state = AppState::Quitting;
            } else if !normal_modifiers.contains(modifiers) || !self.handle_key(code) {
                self.beep()?;
            }
        }
        Ok(())
    }

    // Returns `false` if the user pressed an invalid key
    fn handle_key(&mut self, key: KeyCode) -> bool {
        match self.state {
            AppState::Preview => match key {
                KeyCode::Char('r') => {
                    self.scheduler.trigger(Trigger::Ready, Instant::now());
                    true
                }
                KeyCode::Char('q') | KeyCode::Esc => {
                    self.state = AppState::Quitting;
                    true
                }
                KeyCode::Char('?') => {
                    self.state = AppState::Helping;
                    true
                }
                _ => false,
            },
            AppState::Helping => {
                self.state = AppState::Preview;
                true
            }
            AppState::Quitting => false,
        }
    }

    fn beep(&self) -> io::Result<()> {
        io::stdout().write_all(b"\x07")
    }

    fn quitting(&self) -> bool {
        self.state == AppState::Quitting
    }

    fn status(&self) -> String {
        let mut s = format!(" #{} ", self.runs);
        match &self.outcome {
            None => s.push_str("waiting for layout"),
            Some(RunOutcome::Skipped(reason)) => {
                let _ = write!(s, "skipped: {reason}");
            }
            Some(RunOutcome::Rendered(report)) => {
                let _ = write!(
                    s,
                    "{}: {} cells, {} rows",
                    report.target,
                    report.assignment.len(),
                    report.row_lengths.len()
                );
                if !report.accepted {
                    s.push_str(" (uneven)");
                }
                if report.failures > 0 {
                    let _ = write!(s, ", {} failed", report.failures);
                }
            }
        }
        if self.scheduler.state() == SchedulerState::Scheduled {
            s.push_str(" ...");
        }
        s
    }
}

impl Widget for &mut App<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        buf.set_style(area, BASE_STYLE);
        let [page_area, status_area] =
            Layout::vertical([Constraint::Fill(1), Constraint::Length(1)]).areas(area);
        PagePreview::new(&self.page).render(page_area, buf);
        buf.set_style(status_area, STATUS_STYLE);
        Line::raw(self.status()).render(status_area, buf);
        if self.state == AppState::Helping {
            KeyHelp::new(BASE_STYLE).render(area, buf);
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum AppState {
    Preview,
    Helping,
    Quitting,
}
