//! Text formatting utilities for generated documents.
//!
//! Indentation management for block-structured output.

/// Indentation style for emitted text.
#[derive(Debug, Clone)]
pub enum Indent {
    Tabs,
    Spaces(usize),
}

impl Default for Indent {
    fn default() -> Self {
        Indent::Spaces(2)
    }
}

impl Indent {
    fn to_string_owned(&self) -> String {
        match self {
            Indent::Tabs => "\t".to_string(),
            Indent::Spaces(n) => " ".repeat(*n),
        }
    }
}

/// A writer that manages indentation for generated text.
pub struct IndentWriter {
    buffer: String,
    indent_str: String,
    comment_prefix: &'static str,
    current_indent: usize,
}

impl IndentWriter {
    /// Create a writer using `//` line comments.
    #[must_use]
    pub fn new(indent: Indent) -> Self {
        Self {
            buffer: String::new(),
            indent_str: indent.to_string_owned(),
            comment_prefix: "//",
            current_indent: 0,
        }
    }

    /// Use a different line-comment marker (`#` for GraphQL SDL).
    #[must_use]
    pub fn with_comment_prefix(mut self, prefix: &'static str) -> Self {
        self.comment_prefix = prefix;
        self
    }

    pub fn indent(&mut self) {
        self.current_indent += 1;
    }

    pub fn dedent(&mut self) {
        self.current_indent = self.current_indent.saturating_sub(1);
    }

    /// Write a complete line (with newline at end).
    pub fn write_line(&mut self, s: &str) {
        for _ in 0..self.current_indent {
            self.buffer.push_str(&self.indent_str);
        }
        self.buffer.push_str(s);
        self.buffer.push('\n');
    }

    /// Write a blank line.
    pub fn blank_line(&mut self) {
        self.buffer.push('\n');
    }

    /// Write a comment line.
    pub fn write_comment(&mut self, comment: &str) {
        self.write_line(&format!("{} {}", self.comment_prefix, comment));
    }

    /// Write `header {`, the indented body, then `}`.
    ///
    /// A block whose body writes nothing comes out as `header {\n}`.
    pub fn block(&mut self, header: &str, body: impl FnOnce(&mut Self)) {
        self.write_line(&format!("{header} {{"));
        self.indent();
        body(self);
        self.dedent();
        self.write_line("}");
    }

    /// Consume the writer and return the final string.
    #[must_use]
    pub fn into_string(self) -> String {
        self.buffer
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.buffer
    }
}

impl Default for IndentWriter {
    fn default() -> Self {
        Self::new(Indent::default())
    }
}
