use ratatui::{
    buffer::Buffer,
    crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    layout::{Constraint, Flex, Layout, Rect},
    style::{
        palette::tailwind::{FUCHSIA, PINK, PURPLE, SLATE}, Color, Style, Stylize
    },
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Padding, Paragraph, Widget, Wrap},
    DefaultTerminal
};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, TryRecvError};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::warn;

use crate::{
    components::{LogView, TextField},
    error::Result,
    runner::{ChannelObserver, RunnerEvent, TaskOutcome, TaskRunner},
    session::Session,
};

const BORDER_STYLE: Style = Style::new().fg(FUCHSIA.c900);
const FOCUSED_STYLE: Style = Style::new().fg(PINK.c400);
const LABEL_STYLE: Style = Style::new().fg(PINK.c300);
const TEXT_FG_COLOR: Color = SLATE.c200;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Focus {
    Input,
    Output,
    Format,
    Quality,
    Convert,
}

impl Focus {
    fn next(self) -> Self {
        match self {
            Focus::Input => Focus::Output,
            Focus::Output => Focus::Format,
            Focus::Format => Focus::Quality,
            Focus::Quality => Focus::Convert,
            Focus::Convert => Focus::Input,
        }
    }

    fn prev(self) -> Self {
        match self {
            Focus::Input => Focus::Convert,
            Focus::Output => Focus::Input,
            Focus::Format => Focus::Output,
            Focus::Quality => Focus::Format,
            Focus::Convert => Focus::Quality,
        }
    }

    fn is_text(self) -> bool {
        matches!(self, Focus::Input | Focus::Output)
    }
}

/// The interactive conversion screen. The session lives on this thread;
/// the runner's thread only talks to it through `events`.
pub struct App {
    session: Session,
    runner: TaskRunner,
    stop: Arc<AtomicBool>,
    events: Option<Receiver<RunnerEvent>>,
    task: Option<JoinHandle<TaskOutcome>>,
    input_field: TextField,
    output_field: TextField,
    focus: Focus,
    tick: usize,
}

impl App {
    pub fn new(session: Session, stop: Arc<AtomicBool>) -> Self {
        let input_field = TextField::new(&session.input.as_ref().map(|p| p.display().to_string()).unwrap_or_default());
        let output_field = TextField::new(&session.output_dir.as_ref().map(|p| p.display().to_string()).unwrap_or_default());
        App {
            session,
            stop,
            input_field,
            output_field,
            runner: TaskRunner::new(),
            events: None,
            task: None,
            focus: Focus::Input,
            tick: 0,
        }
    }

    pub fn run(mut self, mut terminal: DefaultTerminal) -> Result<()> {
        while !self.should_stop() {
            self.drain_runner_events();
            terminal.draw(|frame| frame.render_widget(&mut self, frame.area()))?;
            if event::poll(Duration::from_millis(100))? {
                if let Event::Key(key) = event::read()? {
                    self.handle_key(key);
                }
            }
            self.tick = self.tick.wrapping_add(1);
        }

        if self.session.is_busy() {
            warn!("exiting while the encoder is still running");
        }
        Ok(())
    }

    fn should_stop(&self) -> bool { self.stop.load(Ordering::Relaxed) }

    fn trigger_stop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
    }

    /// Applies whatever the runner has sent since the last tick, in order.
    fn drain_runner_events(&mut self) {
        let Some(rx) = self.events.as_ref() else { return };
        let mut received = vec![];
        let disconnected = loop {
            match rx.try_recv() {
                Ok(ev) => received.push(ev),
                Err(TryRecvError::Empty) => break false,
                Err(TryRecvError::Disconnected) => break true,
            }
        };

        for ev in received {
            self.session.apply(ev);
        }

        if disconnected && self.session.is_busy() {
            // the runner thread went away without reporting an outcome
            self.session.apply(RunnerEvent::Finished(TaskOutcome::not_started()));
        }

        if !self.session.is_busy() {
            self.events = None;
            if let Some(handle) = self.task.take() {
                if handle.join().is_err() {
                    warn!("runner thread panicked");
                }
            }
        }
    }

    fn start_conversion(&mut self) {
        if self.session.is_busy() {
            return;
        }
        self.commit_input();
        self.commit_output();

        if let Ok(command) = self.session.start() {
            let (observer, rx) = ChannelObserver::channel();
            let working_dir = command.working_dir().to_path_buf();
            self.task = Some(self.runner.spawn(command, working_dir, observer));
            self.events = Some(rx);
        }
    }

    /// Pushes the input field into the session. A new input moves the output
    /// folder to the input's folder.
    fn commit_input(&mut self) {
        let text = self.input_field.value().trim();
        let path = (!text.is_empty()).then(|| PathBuf::from(text));
        if path == self.session.input {
            return;
        }
        match path {
            Some(p) => {
                self.session.select_input(p);
                if let Some(dir) = &self.session.output_dir {
                    self.output_field.set(&dir.display().to_string());
                }
            },
            None => self.session.input = None,
        }
    }

    fn commit_output(&mut self) {
        let text = self.output_field.value().trim();
        if text.is_empty() {
            self.session.clear_output_dir();
        } else {
            self.session.select_output_dir(PathBuf::from(text));
        }
    }

    fn move_focus(&mut self, to: Focus) {
        match self.focus {
            Focus::Input => self.commit_input(),
            Focus::Output => self.commit_output(),
            _ => {},
        }
        self.focus = to;
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }

        if self.session.notification.is_some() {
            self.session.dismiss_notification();
            return;
        }

        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Esc => self.trigger_stop(),
            KeyCode::Char('c') if ctrl => self.trigger_stop(),
            KeyCode::Char('r') if ctrl => self.start_conversion(),
            KeyCode::Tab => self.move_focus(self.focus.next()),
            KeyCode::BackTab => self.move_focus(self.focus.prev()),
            _ if self.focus.is_text() => self.handle_text_key(key),
            KeyCode::Char('q') => self.trigger_stop(),
            KeyCode::Char('j') | KeyCode::Down => self.move_focus(self.focus.next()),
            KeyCode::Char('k') | KeyCode::Up => self.move_focus(self.focus.prev()),
            KeyCode::Char('l') | KeyCode::Right => self.cycle(true),
            KeyCode::Char('h') | KeyCode::Left => self.cycle(false),
            KeyCode::Enter | KeyCode::Char(' ') if self.focus == Focus::Convert => self.start_conversion(),
            _ => {},
        }
    }

    fn handle_text_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Enter | KeyCode::Down => return self.move_focus(self.focus.next()),
            KeyCode::Up => return self.move_focus(self.focus.prev()),
            _ => {},
        }

        let field = match self.focus {
            Focus::Input => &mut self.input_field,
            _ => &mut self.output_field,
        };
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Char('u') if ctrl => field.clear(),
            KeyCode::Char(c) if !ctrl => field.push(c),
            KeyCode::Backspace => field.backspace(),
            _ => {},
        }
    }

    fn cycle(&mut self, forward: bool) {
        match (self.focus, forward) {
            (Focus::Format, true) => self.session.format = self.session.format.next(),
            (Focus::Format, false) => self.session.format = self.session.format.prev(),
            (Focus::Quality, true) => self.session.quality = self.session.quality.next(),
            (Focus::Quality, false) => self.session.quality = self.session.quality.prev(),
            _ => {},
        }
    }
}

impl Widget for &mut App {
    fn render(self, area: Rect, buf: &mut Buffer)
        where Self: Sized {
        let [header_area, input_area, output_area, options_area, action_area, status_area, log_area, footer_area] = Layout::vertical([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(1),
            Constraint::Fill(1),
            Constraint::Length(1),
        ])
        .areas(area);

        self.render_header(header_area, buf);
        self.input_field
            .widget("INPUT", "Select a file (type or paste a path)", self.focus == Focus::Input)
            .render(input_area, buf);
        self.output_field
            .widget("OUTPUT FOLDER", "", self.focus == Focus::Output)
            .render(output_area, buf);
        self.render_options(options_area, buf);
        self.render_action(action_area, buf);
        Paragraph::new(self.session.status_text.as_str())
            .fg(PINK.c200)
            .render(status_area, buf);
        LogView::new(&self.session.log).widget(log_area).render(log_area, buf);
        App::render_footer(footer_area, buf);

        if self.session.notification.is_some() {
            self.render_notification(area, buf);
        }
    }
}

impl App {
    fn render_header(&self, area: Rect, buf: &mut Buffer) {
        let [title_area, count_area] = Layout::horizontal([
            Constraint::Fill(1),
            Constraint::Length(34),
        ]).areas(area);

        Paragraph::new(Text::from(vec![
                Line::styled("MEDIA CONVERTER", LABEL_STYLE.bold()),
                Line::styled(format!("{} / {}", self.session.format.extension().to_uppercase(), self.session.quality), Style::new().fg(PINK.c400)),
            ]))
            .render(title_area, buf);

        Paragraph::new(Text::from(vec![
                Line::styled("FILES CONVERTED THIS SESSION", LABEL_STYLE),
                Line::styled(self.session.converted.to_string(), Style::new().fg(PINK.c400).bold()),
            ]))
            .right_aligned()
            .render(count_area, buf);
    }

    fn render_options(&self, area: Rect, buf: &mut Buffer) {
        let [format_area, quality_area] = Layout::horizontal([
            Constraint::Fill(1),
            Constraint::Fill(1),
        ]).areas(area);

        selector("FORMAT", self.session.format.extension(), self.focus == Focus::Format).render(format_area, buf);
        selector("QUALITY", self.session.quality.label(), self.focus == Focus::Quality).render(quality_area, buf);
    }

    fn render_action(&self, area: Rect, buf: &mut Buffer) {
        let [button_area, busy_area] = Layout::horizontal([
            Constraint::Fill(1),
            Constraint::Fill(2),
        ]).areas(area);

        let busy = self.session.is_busy();
        let button_style = if busy {
            Style::new().fg(PURPLE.c400).bg(PURPLE.c950)
        } else if self.focus == Focus::Convert {
            Style::new().fg(SLATE.c950).bg(PINK.c300).bold()
        } else {
            Style::new().fg(SLATE.c950).bg(PINK.c500).bold()
        };
        Paragraph::new(if busy { "CONVERTING" } else { "CONVERT" })
            .centered()
            .style(button_style)
            .block(Block::new().borders(Borders::ALL).border_style(if self.focus == Focus::Convert { FOCUSED_STYLE } else { BORDER_STYLE }))
            .render(button_area, buf);

        Paragraph::new(busy_track(busy, self.tick, busy_area.width.saturating_sub(4) as usize))
            .fg(PINK.c400)
            .block(Block::new().borders(Borders::ALL).border_style(BORDER_STYLE).padding(Padding::horizontal(1)))
            .render(busy_area, buf);
    }

    fn render_footer(area: Rect, buf: &mut Buffer) {
        Paragraph::new("tab/shift-tab move · ←/→ change format and quality · enter on CONVERT or ctrl-r starts · esc quits")
            .fg(SLATE.c500)
            .centered()
            .render(area, buf);
    }

    fn render_notification(&self, area: Rect, buf: &mut Buffer) {
        let Some(notification) = &self.session.notification else { return };
        let popup = popup_area(area, 50, 6);
        Clear.render(popup, buf);
        Paragraph::new(Text::from(vec![
                Line::raw(notification.message.as_str()),
                Line::raw(""),
                Line::styled("press any key", Style::new().fg(SLATE.c500)),
            ]))
            .wrap(Wrap { trim: true })
            .fg(TEXT_FG_COLOR)
            .block(Block::new()
                .title(Line::raw(notification.title.as_str()).centered())
                .borders(Borders::ALL)
                .border_style(FOCUSED_STYLE)
                .bg(SLATE.c950)
                .padding(Padding::horizontal(1)))
            .render(popup, buf);
    }
}

fn selector<'a>(title: &'a str, value: &'a str, focused: bool) -> Paragraph<'a> {
    let arrow_style = if focused { FOCUSED_STYLE } else { BORDER_STYLE };
    Paragraph::new(Line::from(vec![
            Span::styled("◀ ", arrow_style),
            Span::styled(value, Style::new().fg(TEXT_FG_COLOR)),
            Span::styled(" ▶", arrow_style),
        ]))
        .block(Block::new()
            .title(Line::raw(title))
            .borders(Borders::ALL)
            .border_style(if focused { FOCUSED_STYLE } else { BORDER_STYLE })
            .padding(Padding::horizontal(1)))
}

/// An indeterminate indicator: a block bouncing along the track while busy.
fn busy_track(busy: bool, tick: usize, width: usize) -> String {
    if !busy || width == 0 {
        return " ".repeat(width);
    }
    let block = (width / 4).max(1);
    let span = width - block;
    let pos = if span == 0 {
        0
    } else {
        let phase = tick % (span * 2);
        if phase <= span { phase } else { span * 2 - phase }
    };
    format!("{}{}{}", " ".repeat(pos), "█".repeat(block), " ".repeat(width - block - pos))
}

fn popup_area(area: Rect, width: u16, height: u16) -> Rect {
    let [area] = Layout::vertical([Constraint::Length(height)]).flex(Flex::Center).areas(area);
    let [area] = Layout::horizontal([Constraint::Length(width)]).flex(Flex::Center).areas(area);
    area
}
