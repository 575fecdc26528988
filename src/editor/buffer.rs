use tracing::trace;

use crate::list::{List, Pos};

/// A text buffer with a single cursor that tracks its own row, column and
/// absolute index.
///
/// The cursor denotes the slot in front of which the next inserted character
/// lands: it sits on a character, or past-the-end. `row` (1-based), `column`
/// (0-based) and `index` (0-based) are a cache of that position, kept in step
/// by every operation instead of being recomputed from the start of the text.
#[derive(Clone)]
pub struct TextBuffer {
    text: List<char>,
    cursor: Pos,
    row: usize,
    column: usize,
    index: usize,
    /// Mutation counter for sampling debug assertions (debug builds only).
    #[cfg(debug_assertions)]
    debug_mutation_count: u64,
}

impl TextBuffer {
    /// Create an empty buffer: row 1, column 0, index 0, cursor past-the-end.
    pub const fn new() -> Self {
        Self {
            text: List::new(),
            cursor: Pos::END,
            row: 1,
            column: 0,
            index: 0,
            #[cfg(debug_assertions)]
            debug_mutation_count: 0,
        }
    }

    /// Create a buffer holding `text`, as if every character had been
    /// inserted in order. The cursor ends past-the-end.
    pub fn from_text(text: &str) -> Self {
        let mut buffer = Self::new();
        buffer.insert_str(text);
        buffer
    }

    // --- Queries ---

    /// Current row, 1-based.
    pub const fn row(&self) -> usize {
        self.row
    }

    /// Offset of the cursor from the start of its row, 0-based.
    pub const fn column(&self) -> usize {
        self.column
    }

    /// Offset of the cursor from the start of the buffer, 0-based.
    pub const fn index(&self) -> usize {
        self.index
    }

    /// Total number of characters.
    pub const fn len(&self) -> usize {
        self.text.len()
    }

    pub const fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Whether the cursor is past the last character.
    pub const fn is_at_end(&self) -> bool {
        self.cursor.is_end()
    }

    /// The character under the cursor.
    ///
    /// # Panics
    ///
    /// Panics if the cursor is past-the-end; check [`Self::is_at_end`] first.
    pub fn character_at_cursor(&self) -> char {
        match self.text.get(self.cursor) {
            Some(&c) => c,
            None => panic!("character_at_cursor called with the cursor past-the-end"),
        }
    }

    /// The full buffer contents. The cursor position has no effect.
    pub fn text(&self) -> String {
        self.text.iter().collect()
    }

    /// Recompute `(row, column, index)` by walking from the start of the
    /// buffer to the cursor.
    pub fn rescan(&self) -> (usize, usize, usize) {
        let (mut row, mut column, mut index) = (1, 0, 0);
        let mut pos = self.text.begin();
        while pos != self.cursor {
            let Some(&c) = self.text.get(pos) else {
                break;
            };
            if c == '\n' {
                row += 1;
                column = 0;
            } else {
                column += 1;
            }
            index += 1;
            match self.text.next(pos) {
                Some(next) => pos = next,
                None => break,
            }
        }
        (row, column, index)
    }

    // --- Navigation ---

    /// Step the cursor over the character it sits on.
    ///
    /// Returns `false` without changing anything when already past-the-end.
    pub fn forward(&mut self) -> bool {
        let Some(c) = self.step_forward() else {
            trace!(index = self.index, "forward at end of buffer");
            return false;
        };
        if c == '\n' {
            self.row += 1;
            self.column = 0;
        } else {
            self.column += 1;
        }
        true
    }

    /// Step the cursor back onto the previous character.
    ///
    /// Returns `false` without changing anything at the start of the buffer.
    pub fn backward(&mut self) -> bool {
        let Some(c) = self.step_backward() else {
            trace!("backward at start of buffer");
            return false;
        };
        if c == '\n' {
            self.row -= 1;
            self.column = self.compute_column();
        } else {
            self.column -= 1;
        }
        true
    }

    /// Move to the first character of the current row.
    pub fn move_to_row_start(&mut self) {
        while self.char_before_cursor().is_some_and(|c| c != '\n') {
            self.step_backward();
        }
        self.column = 0;
    }

    /// Move onto the newline ending the current row, or past-the-end on the
    /// last row.
    pub fn move_to_row_end(&mut self) {
        while self.char_at_cursor().is_some_and(|c| c != '\n') {
            self.step_forward();
        }
        self.column = self.compute_column();
    }

    /// Move to `target` within the current row, clamped to the row's end.
    pub fn move_to_column(&mut self, target: usize) {
        self.move_to_row_start();
        let mut column = 0;
        while column < target && self.char_at_cursor().is_some_and(|c| c != '\n') {
            self.step_forward();
            column += 1;
        }
        self.column = column;
    }

    /// Move to the same column of the previous row, clamped to its length.
    ///
    /// Returns `false` without changing anything on the first row.
    pub fn up(&mut self) -> bool {
        if self.row == 1 {
            trace!("up on first row");
            return false;
        }
        let saved = self.save();
        let target = self.column;
        self.move_to_row_start();
        if self.text.prev(self.cursor).is_none() {
            self.restore(saved);
            return false;
        }
        // Step back over the newline separating the two rows.
        self.step_backward();
        self.row -= 1;
        self.move_to_column(target);
        true
    }

    /// Move to the next row, at the column of the current row's end, clamped
    /// to the next row's length.
    ///
    /// Returns `false` without changing anything on the last row.
    pub fn down(&mut self) -> bool {
        let saved = self.save();
        self.move_to_row_end();
        if self.is_at_end() {
            trace!(row = self.row, "down on last row");
            self.restore(saved);
            return false;
        }
        let target = self.column;
        self.step_forward();
        self.row += 1;
        self.column = 0;
        self.move_to_column(target);
        true
    }

    // --- Mutation ---

    /// Insert `c` in front of the cursor. The cursor stays on the character
    /// it was on, so `c` ends up just before it.
    pub fn insert(&mut self, c: char) {
        self.text.insert(self.cursor, c);
        if c == '\n' {
            self.row += 1;
            self.column = 0;
        } else {
            self.column += 1;
        }
        self.index += 1;
        self.assert_consistent();
    }

    /// Insert every character of `s` in order.
    pub fn insert_str(&mut self, s: &str) {
        for c in s.chars() {
            self.insert(c);
        }
    }

    /// Remove the character under the cursor. The cursor moves onto the
    /// character that followed it.
    ///
    /// Returns `false` without changing anything when past-the-end.
    pub fn remove(&mut self) -> bool {
        let Some((removed, next)) = self.text.remove(self.cursor) else {
            trace!(index = self.index, "remove at end of buffer");
            return false;
        };
        self.cursor = next;
        // A removed newline was after the cursor, so `row` still counts the
        // newlines before it.
        if removed == '\n' {
            self.column = self.compute_column();
        }
        if self.is_at_end() {
            self.index = self.text.len();
        }
        self.assert_consistent();
        true
    }

    // --- Private helpers ---

    fn char_at_cursor(&self) -> Option<char> {
        self.text.get(self.cursor).copied()
    }

    fn char_before_cursor(&self) -> Option<char> {
        let prev = self.text.prev(self.cursor)?;
        self.text.get(prev).copied()
    }

    /// Advance the cursor and `index`; returns the character stepped over.
    fn step_forward(&mut self) -> Option<char> {
        let c = self.char_at_cursor()?;
        self.cursor = self.text.next(self.cursor)?;
        self.index += 1;
        Some(c)
    }

    /// Retreat the cursor and `index`; returns the character now under it.
    fn step_backward(&mut self) -> Option<char> {
        let prev = self.text.prev(self.cursor)?;
        let c = self.text.get(prev).copied()?;
        self.cursor = prev;
        self.index -= 1;
        Some(c)
    }

    /// Distance from the cursor back to the preceding newline or buffer start.
    fn compute_column(&self) -> usize {
        let mut column = 0;
        let mut pos = self.cursor;
        while let Some(prev) = self.text.prev(pos) {
            if self.text.get(prev) == Some(&'\n') {
                break;
            }
            column += 1;
            pos = prev;
        }
        column
    }

    const fn save(&self) -> Saved {
        Saved {
            cursor: self.cursor,
            row: self.row,
            column: self.column,
            index: self.index,
        }
    }

    const fn restore(&mut self, saved: Saved) {
        self.cursor = saved.cursor;
        self.row = saved.row;
        self.column = saved.column;
        self.index = saved.index;
    }

    /// Sampled check that the cached coordinates match a full rescan.
    #[cfg(debug_assertions)]
    fn assert_consistent(&mut self) {
        self.debug_mutation_count += 1;
        if self.debug_mutation_count % 64 != 0 {
            return;
        }
        let cached = (self.row, self.column, self.index);
        debug_assert_eq!(
            cached,
            self.rescan(),
            "cursor cache drifted after {} mutations (len {})",
            self.debug_mutation_count,
            self.text.len(),
        );
    }

    #[cfg(not(debug_assertions))]
    #[allow(clippy::unused_self)]
    const fn assert_consistent(&mut self) {}
}

/// Cursor state captured before a move that may have to be undone.
#[derive(Clone, Copy)]
struct Saved {
    cursor: Pos,
    row: usize,
    column: usize,
    index: usize,
}

impl Default for TextBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TextBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use std::fmt::Write;
        self.text.iter().try_for_each(|&c| f.write_char(c))
    }
}

impl std::fmt::Debug for TextBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextBuffer")
            .field("text", &format_args!("List({} chars)", self.text.len()))
            .field("row", &self.row)
            .field("column", &self.column)
            .field("index", &self.index)
            .finish()
    }
}
