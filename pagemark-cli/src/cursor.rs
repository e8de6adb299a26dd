/// Cursor over the rendered lines of the mounted pages
/// Columns count chars, matching the offsets of the document tree
#[derive(Debug, Clone, Default)]
pub struct CursorState {
    pub row: usize,
    pub col: usize,
    /// Char length of each line
    lengths: Vec<usize>,
    /// Lines as shown, used for word motions
    lines: Vec<Vec<char>>,
}

impl CursorState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the lines, keeping the cursor inside them
    pub fn set_lines(&mut self, lines: &[String]) {
        self.lines = lines.iter().map(|l| l.chars().collect()).collect();
        self.lengths = self.lines.iter().map(Vec::len).collect();
        self.row = self.row.min(self.lengths.len().saturating_sub(1));
        self.col = self.col.min(self.line_len(self.row));
    }

    /// Get current cursor position as (row, col)
    pub fn cursor(&self) -> (usize, usize) {
        (self.row, self.col)
    }

    pub fn line_len(&self, row: usize) -> usize {
        self.lengths.get(row).copied().unwrap_or(0)
    }

    pub fn line_count(&self) -> usize {
        self.lengths.len()
    }

    // Cursor movement methods

    pub fn move_up(&mut self) {
        if self.row > 0 {
            self.row -= 1;
            self.col = self.col.min(self.line_len(self.row));
        }
    }

    pub fn move_down(&mut self) {
        if self.row + 1 < self.lengths.len() {
            self.row += 1;
            self.col = self.col.min(self.line_len(self.row));
        }
    }

    pub fn move_left(&mut self) {
        if self.col > 0 {
            self.col -= 1;
        } else if self.row > 0 {
            // Move to end of previous line
            self.row -= 1;
            self.col = self.line_len(self.row);
        }
    }

    pub fn move_right(&mut self) {
        if self.col < self.line_len(self.row) {
            self.col += 1;
        } else if self.row + 1 < self.lengths.len() {
            // Move to start of next line
            self.row += 1;
            self.col = 0;
        }
    }

    pub fn move_to_start(&mut self) {
        self.col = 0;
    }

    pub fn move_to_end(&mut self) {
        self.col = self.line_len(self.row);
    }

    pub fn move_to_top(&mut self) {
        self.row = 0;
        self.col = 0;
    }

    pub fn move_to_bottom(&mut self) {
        if !self.lengths.is_empty() {
            self.row = self.lengths.len() - 1;
            self.col = 0;
        }
    }

    pub fn move_word_forward(&mut self) {
        if let Some(chars) = self.lines.get(self.row) {
            let mut col = self.col;

            // Skip current word (non-whitespace)
            while col < chars.len() && !chars[col].is_whitespace() {
                col += 1;
            }
            // Skip whitespace
            while col < chars.len() && chars[col].is_whitespace() {
                col += 1;
            }

            if col >= chars.len() && self.row + 1 < self.lines.len() {
                self.row += 1;
                self.col = 0;
            } else {
                self.col = col;
            }
        }
    }

    pub fn move_word_back(&mut self) {
        if self.col == 0 {
            if self.row > 0 {
                self.row -= 1;
                self.col = self.line_len(self.row);
            }
            return;
        }

        if let Some(chars) = self.lines.get(self.row) {
            let mut col = self.col;

            // Skip whitespace backwards
            while col > 0 && chars.get(col - 1).is_some_and(|c| c.is_whitespace()) {
                col -= 1;
            }
            // Skip word backwards
            while col > 0 && chars.get(col - 1).is_some_and(|c| !c.is_whitespace()) {
                col -= 1;
            }

            self.col = col;
        }
    }
}
