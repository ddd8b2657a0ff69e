use serde::{Deserialize, Serialize};

use crate::dispatch::NoteDispatch;
use crate::providers::{Clock, IdSource};

pub const EMPTY_TITLE_MESSAGE: &str = "Please provide a title";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: i64,
    pub title: String,
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: i64,
    pub description: String,
    pub is_completed: bool,
    #[serde(rename = "noteID")]
    pub note_id: i64,
    pub timestamp: i64,
}

impl Item {
    pub fn is_blank(&self) -> bool {
        self.description.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Create,
    Edit,
}

/// In-memory draft of one note and its checklist. All handlers are
/// synchronous mutations; the dispatch boundary is only touched on
/// submit/delete, after which `redirect` signals that the form is done.
pub struct NoteForm {
    mode: Mode,
    note: Note,
    items: Vec<Item>,
    redirect: bool,
    error_message: String,
    ids: Box<dyn IdSource>,
    clock: Box<dyn Clock>,
}

impl NoteForm {
    pub fn create(note: Note, ids: Box<dyn IdSource>, clock: Box<dyn Clock>) -> Self {
        Self::seeded(Mode::Create, note, Vec::new(), ids, clock)
    }

    pub fn edit(
        note: Note,
        items: Vec<Item>,
        ids: Box<dyn IdSource>,
        clock: Box<dyn Clock>,
    ) -> Self {
        Self::seeded(Mode::Edit, note, items, ids, clock)
    }

    fn seeded(
        mode: Mode,
        note: Note,
        items: Vec<Item>,
        ids: Box<dyn IdSource>,
        clock: Box<dyn Clock>,
    ) -> Self {
        Self {
            mode,
            note,
            items,
            redirect: false,
            error_message: String::new(),
            ids,
            clock,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn note(&self) -> &Note {
        &self.note
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn redirect(&self) -> bool {
        self.redirect
    }

    pub fn error_message(&self) -> &str {
        &self.error_message
    }

    pub fn blank_item_id(&self) -> Option<i64> {
        self.items.iter().find(|item| item.is_blank()).map(|item| item.id)
    }

    /// Assigns the note title. The first keystroke of a non-empty title
    /// opens a blank checklist slot; an empty title never touches items.
    pub fn set_title(&mut self, value: &str) {
        self.note.title = value.to_string();
        if !self.note.title.is_empty() {
            self.ensure_blank_slot();
        }
    }

    /// Rewrites the matched item's description in place. Committing the
    /// blank slot (empty -> non-empty) re-opens a fresh one so exactly one
    /// pending slot is available. Unmatched ids are ignored.
    pub fn edit_item(&mut self, item_id: i64, value: &str) {
        let Some(item) = self.items.iter_mut().find(|item| item.id == item_id) else {
            return;
        };
        let was_blank = item.is_blank();
        item.description = value.to_string();
        if was_blank && !value.is_empty() {
            self.ensure_blank_slot();
        }
    }

    pub fn toggle_item(&mut self, item_id: i64) {
        if let Some(item) = self.items.iter_mut().find(|item| item.id == item_id) {
            item.is_completed = !item.is_completed;
        }
    }

    pub fn remove_item(&mut self, item_id: i64) {
        self.items.retain(|item| item.id != item_id);
    }

    /// Validates the draft and hands it to the dispatch boundary. The full
    /// item sequence is forwarded, trailing blank slot included.
    pub fn submit(&mut self, dispatch: &dyn NoteDispatch) {
        if self.note.title.is_empty() {
            self.error_message = EMPTY_TITLE_MESSAGE.to_string();
            return;
        }
        self.error_message.clear();
        match self.mode {
            Mode::Create => dispatch.create(&self.note, &self.items),
            Mode::Edit => dispatch.update(&self.note, &self.items),
        }
        self.redirect = true;
    }

    pub fn delete_note(&mut self, dispatch: &dyn NoteDispatch) {
        dispatch.delete(&self.note);
        self.redirect = true;
    }

    fn ensure_blank_slot(&mut self) {
        if self.items.iter().any(|item| item.is_blank()) {
            return;
        }
        self.items.push(Item {
            id: self.ids.next_id(),
            description: String::new(),
            is_completed: false,
            note_id: self.note.id,
            timestamp: self.clock.now(),
        });
    }
}
