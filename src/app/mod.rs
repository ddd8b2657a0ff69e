use std::io::Stdout;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    KeyModifiers,
};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;

use crate::config::AppConfig;
use crate::dispatch::NoteDispatch;
use crate::form::{Mode, NoteForm};
use crate::ui;

mod input;

pub use input::LineEditor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Title,
    Item(i64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormOutcome {
    Submitted,
    Deleted,
    Canceled,
}

/// Interactive wrapper around one `NoteForm`. Owns the terminal for the
/// lifetime of the form and translates key events into the typed form
/// handlers; the redirect flag ends the event loop.
pub struct App {
    config: Arc<AppConfig>,
    form: NoteForm,
    dispatch: Box<dyn NoteDispatch>,
    focus: Focus,
    editor: LineEditor,
    outcome: FormOutcome,
    should_quit: bool,
    tick_rate: Duration,
}

impl App {
    pub fn new(config: Arc<AppConfig>, form: NoteForm, dispatch: Box<dyn NoteDispatch>) -> Self {
        let editor = LineEditor::from_value(&form.note().title);
        Self {
            config,
            form,
            dispatch,
            focus: Focus::Title,
            editor,
            outcome: FormOutcome::Canceled,
            should_quit: false,
            tick_rate: Duration::from_millis(250),
        }
    }

    pub fn run(&mut self) -> Result<FormOutcome> {
        let mut terminal = setup_terminal()?;
        let result = self.event_loop(&mut terminal);
        restore_terminal(&mut terminal)?;
        result?;
        Ok(self.outcome)
    }

    fn event_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
        loop {
            terminal
                .draw(|frame| ui::draw_form(frame, &self.form, self.focus, &self.editor))
                .context("rendering frame")?;

            if self.should_quit {
                break;
            }

            if event::poll(self.tick_rate).context("polling for terminal events")? {
                match event::read().context("reading terminal event")? {
                    Event::Key(key) => self.handle_key(key),
                    Event::Resize(_, _) => {
                        // no-op: next draw will naturally adapt to the new size
                    }
                    _ => {}
                }
            }
        }
        Ok(())
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }

        if key.modifiers.contains(KeyModifiers::CONTROL) {
            match key.code {
                KeyCode::Char('t') => self.toggle_focused_item(),
                KeyCode::Char('d') => self.remove_focused_item(),
                KeyCode::Char('x') => self.delete_note(),
                KeyCode::Char('c') => {
                    self.outcome = FormOutcome::Canceled;
                    self.should_quit = true;
                }
                _ => {}
            }
            return;
        }

        match key.code {
            KeyCode::Esc => {
                self.outcome = FormOutcome::Canceled;
                self.should_quit = true;
            }
            KeyCode::Enter => self.submit(),
            KeyCode::Tab | KeyCode::Down => self.focus_next(),
            KeyCode::BackTab | KeyCode::Up => self.focus_previous(),
            KeyCode::Backspace => {
                if self.editor.backspace() {
                    self.commit_focused_value();
                }
            }
            KeyCode::Delete => {
                if self.editor.delete() {
                    self.commit_focused_value();
                }
            }
            KeyCode::Left => {
                self.editor.move_left();
            }
            KeyCode::Right => {
                self.editor.move_right();
            }
            KeyCode::Home => {
                self.editor.move_home();
            }
            KeyCode::End => {
                self.editor.move_end();
            }
            KeyCode::Char(ch)
                if !key
                    .modifiers
                    .intersects(KeyModifiers::ALT | KeyModifiers::SUPER) =>
            {
                if self.editor.value().len() < self.focused_limit() && self.editor.insert_char(ch) {
                    self.commit_focused_value();
                }
            }
            _ => {}
        }
    }

    fn submit(&mut self) {
        self.form.submit(self.dispatch.as_ref());
        if self.form.redirect() {
            self.outcome = FormOutcome::Submitted;
            self.should_quit = true;
        }
    }

    fn delete_note(&mut self) {
        if self.form.mode() != Mode::Edit {
            return;
        }
        self.form.delete_note(self.dispatch.as_ref());
        self.outcome = FormOutcome::Deleted;
        self.should_quit = true;
    }

    fn commit_focused_value(&mut self) {
        let value = self.editor.value().to_string();
        match self.focus {
            Focus::Title => self.form.set_title(&value),
            Focus::Item(id) => self.form.edit_item(id, &value),
        }
    }

    fn toggle_focused_item(&mut self) {
        if let Focus::Item(id) = self.focus {
            self.form.toggle_item(id);
        }
    }

    fn remove_focused_item(&mut self) {
        let Focus::Item(id) = self.focus else {
            return;
        };
        let items = self.form.items();
        let Some(index) = items.iter().position(|item| item.id == id) else {
            return;
        };
        self.focus = if index == 0 {
            Focus::Title
        } else {
            Focus::Item(items[index - 1].id)
        };
        self.form.remove_item(id);
        self.sync_editor();
    }

    fn focus_next(&mut self) {
        let order = self.focus_order();
        let current = order.iter().position(|focus| *focus == self.focus).unwrap_or(0);
        self.focus = order[(current + 1) % order.len()];
        self.sync_editor();
    }

    fn focus_previous(&mut self) {
        let order = self.focus_order();
        let current = order.iter().position(|focus| *focus == self.focus).unwrap_or(0);
        self.focus = order[(current + order.len() - 1) % order.len()];
        self.sync_editor();
    }

    fn focus_order(&self) -> Vec<Focus> {
        let mut order = Vec::with_capacity(1 + self.form.items().len());
        order.push(Focus::Title);
        order.extend(self.form.items().iter().map(|item| Focus::Item(item.id)));
        order
    }

    fn focused_limit(&self) -> usize {
        match self.focus {
            Focus::Title => self.config.form.max_title_len,
            Focus::Item(_) => self.config.form.max_description_len,
        }
    }

    fn sync_editor(&mut self) {
        let value = match self.focus {
            Focus::Title => self.form.note().title.clone(),
            Focus::Item(id) => self
                .form
                .items()
                .iter()
                .find(|item| item.id == id)
                .map(|item| item.description.clone())
                .unwrap_or_default(),
        };
        self.editor = LineEditor::from_value(&value);
    }
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode().context("enabling raw mode")?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)
        .context("switching to alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("creating terminal backend")?;
    terminal.hide_cursor().context("hiding cursor")?;
    Ok(terminal)
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    terminal.show_cursor().ok();
    disable_raw_mode().context("disabling raw mode")?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )
    .context("restoring screen state")?;
    Ok(())
}
