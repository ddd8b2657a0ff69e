use unicode_segmentation::UnicodeSegmentation;

/// Single-line input buffer for the focused form field. Cursor positions
/// are byte offsets that always land on a grapheme boundary.
#[derive(Debug, Clone, Default)]
pub struct LineEditor {
    value: String,
    cursor: usize,
}

impl LineEditor {
    pub fn from_value(value: &str) -> Self {
        Self {
            value: value.to_string(),
            cursor: value.len(),
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn insert_char(&mut self, ch: char) -> bool {
        if ch.is_control() {
            return false;
        }
        let mut scratch = [0u8; 4];
        let encoded = ch.encode_utf8(&mut scratch);
        self.value.insert_str(self.cursor, encoded);
        self.cursor += encoded.len();
        true
    }

    pub fn backspace(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        let prev = prev_grapheme_boundary(&self.value, self.cursor);
        self.value.drain(prev..self.cursor);
        self.cursor = prev;
        true
    }

    pub fn delete(&mut self) -> bool {
        if self.cursor >= self.value.len() {
            return false;
        }
        let next = next_grapheme_boundary(&self.value, self.cursor);
        if next == self.cursor {
            return false;
        }
        self.value.drain(self.cursor..next);
        true
    }

    pub fn move_left(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        self.cursor = prev_grapheme_boundary(&self.value, self.cursor);
        true
    }

    pub fn move_right(&mut self) -> bool {
        if self.cursor >= self.value.len() {
            return false;
        }
        let next = next_grapheme_boundary(&self.value, self.cursor);
        if next == self.cursor {
            return false;
        }
        self.cursor = next;
        true
    }

    pub fn move_home(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        self.cursor = 0;
        true
    }

    pub fn move_end(&mut self) -> bool {
        if self.cursor == self.value.len() {
            return false;
        }
        self.cursor = self.value.len();
        true
    }

    /// Text before the cursor, for on-screen cursor placement.
    pub fn prefix(&self) -> &str {
        &self.value[..self.cursor]
    }
}

fn prev_grapheme_boundary(text: &str, cursor: usize) -> usize {
    if cursor == 0 {
        return 0;
    }
    let mut last = 0;
    for (idx, _) in text[..cursor].grapheme_indices(true) {
        last = idx;
    }
    last
}

fn next_grapheme_boundary(text: &str, cursor: usize) -> usize {
    if cursor >= text.len() {
        return text.len();
    }
    let mut iter = text[cursor..].graphemes(true);
    if let Some(grapheme) = iter.next() {
        cursor + grapheme.len()
    } else {
        text.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_and_backspace_round_trip() {
        let mut editor = LineEditor::default();
        assert!(editor.insert_char('m'));
        assert!(editor.insert_char('i'));
        assert!(editor.insert_char('l'));
        assert!(editor.insert_char('k'));
        assert_eq!(editor.value(), "milk");
        assert!(editor.backspace());
        assert_eq!(editor.value(), "mil");
    }

    #[test]
    fn control_characters_are_rejected() {
        let mut editor = LineEditor::from_value("milk");
        assert!(!editor.insert_char('\n'));
        assert!(!editor.insert_char('\t'));
        assert_eq!(editor.value(), "milk");
    }

    #[test]
    fn backspace_removes_whole_graphemes() {
        let mut editor = LineEditor::from_value("cafe\u{301}");
        assert!(editor.backspace());
        assert_eq!(editor.value(), "caf");
    }

    #[test]
    fn cursor_moves_stay_on_grapheme_boundaries() {
        let mut editor = LineEditor::from_value("héllo");
        editor.move_home();
        assert!(editor.move_right());
        assert!(editor.move_right());
        assert_eq!(editor.prefix(), "hé");

        assert!(editor.move_left());
        assert_eq!(editor.prefix(), "h");
    }

    #[test]
    fn insert_in_the_middle_respects_the_cursor() {
        let mut editor = LineEditor::from_value("mik");
        editor.move_left();
        assert!(editor.insert_char('l'));
        assert_eq!(editor.value(), "milk");
        assert_eq!(editor.prefix(), "mil");
    }

    #[test]
    fn delete_at_end_is_a_no_op() {
        let mut editor = LineEditor::from_value("milk");
        assert!(!editor.delete());
        editor.move_home();
        assert!(editor.delete());
        assert_eq!(editor.value(), "ilk");
    }
}
