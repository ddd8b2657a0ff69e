use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use unicode_width::UnicodeWidthStr;

use crate::app::{Focus, LineEditor};
use crate::form::{Item, Mode, NoteForm};

const ITEM_MARKER_WIDTH: u16 = 6; // "▸ [x] "

pub fn draw_form(frame: &mut Frame, form: &NoteForm, focus: Focus, editor: &LineEditor) {
    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(3),
            Constraint::Min(3),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(frame.size());

    draw_header(frame, form, sections[0]);
    draw_title_field(frame, form, focus, editor, sections[1]);
    draw_checklist(frame, form, focus, editor, sections[2]);
    draw_message(frame, form, sections[3]);
    draw_footer(frame, form, sections[4]);
}

fn draw_header(frame: &mut Frame, form: &NoteForm, area: Rect) {
    let label = match form.mode() {
        Mode::Create => "New note".to_string(),
        Mode::Edit => format!(
            "Editing note #{} · created {}",
            form.note().id,
            format_timestamp(form.note().timestamp)
        ),
    };
    let header = Paragraph::new(Line::from(Span::styled(
        label,
        Style::default().fg(Color::Gray),
    )));
    frame.render_widget(header, area);
}

fn draw_title_field(
    frame: &mut Frame,
    form: &NoteForm,
    focus: Focus,
    editor: &LineEditor,
    area: Rect,
) {
    let focused = matches!(focus, Focus::Title);
    let block_style = if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };
    let title = Paragraph::new(form.note().title.as_str()).block(
        Block::default()
            .title("Title")
            .borders(Borders::ALL)
            .border_style(block_style),
    );
    frame.render_widget(title, area);

    if focused {
        set_field_cursor(frame, area, 1, editor, 0);
    }
}

fn draw_checklist(
    frame: &mut Frame,
    form: &NoteForm,
    focus: Focus,
    editor: &LineEditor,
    area: Rect,
) {
    let focused_pane = matches!(focus, Focus::Item(_));
    let block_style = if focused_pane {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };

    let mut lines = Vec::with_capacity(form.items().len());
    for item in form.items() {
        let is_focused = focus == Focus::Item(item.id);
        let marker = if is_focused { "▸ " } else { "  " };
        let checkbox = if item.is_completed { "[x] " } else { "[ ] " };

        let mut spans = vec![
            Span::styled(
                marker,
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw(checkbox),
        ];
        if item.is_blank() && !is_focused {
            spans.push(Span::styled(
                "(new item)",
                Style::default()
                    .fg(Color::Gray)
                    .add_modifier(Modifier::ITALIC),
            ));
        } else {
            spans.push(Span::styled(
                item.description.clone(),
                item_style(item, is_focused),
            ));
        }
        lines.push(Line::from(spans));
    }
    if lines.is_empty() {
        lines.push(Line::from(Span::styled(
            "Start typing a title to add checklist items.",
            Style::default().fg(Color::Gray),
        )));
    }

    let checklist = Paragraph::new(lines).block(
        Block::default()
            .title("Checklist")
            .borders(Borders::ALL)
            .border_style(block_style),
    );
    frame.render_widget(checklist, area);

    if let Focus::Item(id) = focus {
        if let Some(index) = form.items().iter().position(|item| item.id == id) {
            let row = index as u16;
            if row + 2 < area.height {
                set_field_cursor(frame, area, 1 + row, editor, ITEM_MARKER_WIDTH);
            }
        }
    }
}

fn draw_message(frame: &mut Frame, form: &NoteForm, area: Rect) {
    if form.error_message().is_empty() {
        return;
    }
    let message = Paragraph::new(Line::from(Span::styled(
        form.error_message(),
        Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
    )));
    frame.render_widget(message, area);
}

fn draw_footer(frame: &mut Frame, form: &NoteForm, area: Rect) {
    let mut help =
        String::from("Enter save • Esc cancel • Tab/↓ next • Shift-Tab/↑ prev • Ctrl-T toggle • Ctrl-D remove item");
    if form.mode() == Mode::Edit {
        help.push_str(" • Ctrl-X delete note");
    }
    let footer = Paragraph::new(Line::from(Span::styled(
        help,
        Style::default().fg(Color::Gray),
    )));
    frame.render_widget(footer, area);
}

fn item_style(item: &Item, focused: bool) -> Style {
    let mut style = Style::default();
    if item.is_completed {
        style = style.fg(Color::Gray).add_modifier(Modifier::CROSSED_OUT);
    }
    if focused {
        style = style.add_modifier(Modifier::BOLD);
    }
    style
}

fn set_field_cursor(
    frame: &mut Frame,
    area: Rect,
    row_offset: u16,
    editor: &LineEditor,
    indent: u16,
) {
    let x = area.x + 1 + indent + editor.prefix().width() as u16;
    let y = area.y + row_offset;
    if x < area.right().saturating_sub(1) && y < area.bottom() {
        frame.set_cursor(x, y);
    }
}

fn format_timestamp(epoch_millis: i64) -> String {
    OffsetDateTime::from_unix_timestamp(epoch_millis / 1_000)
        .map(|dt| dt.format(&Rfc3339).unwrap_or_else(|_| epoch_millis.to_string()))
        .unwrap_or_else(|_| epoch_millis.to_string())
}
