use zeroize::{Zeroize, Zeroizing};

/// Single-line text field with a character-indexed cursor.
///
/// Masked buffers hold secrets (passwords, auth keys): they render as `*`
/// and wipe their memory whenever the content is replaced or dropped.
#[derive(Default, Clone)]
pub struct InputBuffer {
    content: String,
    cursor: usize,
    masked: bool,
}

impl InputBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn masked() -> Self {
        let mut buffer = Self::default();
        buffer.masked = true;
        buffer
    }

    /// Pre-filled buffer with the cursor at the end.
    pub fn with_value(value: &str) -> Self {
        let mut buffer = Self::new();
        buffer.set(value);
        buffer
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// Copy of the content that is wiped once the caller drops it.
    pub fn secret(&self) -> Zeroizing<String> {
        Zeroizing::new(self.content.clone())
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_masked(&self) -> bool {
        self.masked
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    pub fn len(&self) -> usize {
        self.content.chars().count()
    }

    /// What the field shows on screen.
    pub fn display(&self) -> String {
        if self.masked {
            "*".repeat(self.len())
        } else {
            self.content.clone()
        }
    }

    pub fn insert(&mut self, c: char) {
        let at = self.byte_offset(self.cursor);
        self.content.insert(at, c);
        self.cursor += 1;
    }

    pub fn delete_back(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        self.cursor -= 1;
        self.remove_at_cursor();
        true
    }

    pub fn delete_forward(&mut self) -> bool {
        if self.cursor >= self.len() {
            return false;
        }
        self.remove_at_cursor();
        true
    }

    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        if self.cursor < self.len() {
            self.cursor += 1;
        }
    }

    pub fn move_start(&mut self) {
        self.cursor = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor = self.len();
    }

    pub fn clear(&mut self) {
        self.content.zeroize();
        self.cursor = 0;
    }

    pub fn set(&mut self, value: &str) {
        self.content.zeroize();
        self.content.push_str(value);
        self.cursor = self.len();
    }

    fn remove_at_cursor(&mut self) {
        let start = self.byte_offset(self.cursor);
        let end = self.byte_offset(self.cursor + 1);
        self.content.replace_range(start..end, "");
    }

    fn byte_offset(&self, chars: usize) -> usize {
        self.content
            .char_indices()
            .nth(chars)
            .map(|(i, _)| i)
            .unwrap_or(self.content.len())
    }
}

impl Drop for InputBuffer {
    fn drop(&mut self) {
        if self.masked {
            self.content.zeroize();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edits_at_the_cursor() {
        let mut buf = InputBuffer::with_value("srv");
        buf.move_left();
        buf.insert('e');
        assert_eq!(buf.content(), "srev");
        assert_eq!(buf.cursor(), 3);

        buf.move_start();
        assert!(!buf.delete_back());
        assert!(buf.delete_forward());
        assert_eq!(buf.content(), "rev");
    }

    #[test]
    fn multibyte_characters() {
        let mut buf = InputBuffer::new();
        for c in "Grüße".chars() {
            buf.insert(c);
        }
        assert_eq!(buf.len(), 5);
        buf.move_left();
        assert!(buf.delete_back());
        assert_eq!(buf.content(), "Grüe");
    }

    #[test]
    fn masked_display_hides_content() {
        let mut buf = InputBuffer::masked();
        buf.set("hunter2");
        assert_eq!(buf.display(), "*******");
        assert_eq!(buf.secret().as_str(), "hunter2");

        buf.clear();
        assert!(buf.is_empty());
        assert_eq!(buf.cursor(), 0);
    }

    #[test]
    fn masked_buffer_starts_empty() {
        let mut buf = InputBuffer::masked();
        assert!(buf.is_masked());
        assert!(buf.is_empty());
        assert_eq!(buf.cursor(), 0);

        buf.insert('x');
        assert_eq!(buf.display(), "*");
        assert!(!InputBuffer::new().is_masked());
    }
}
