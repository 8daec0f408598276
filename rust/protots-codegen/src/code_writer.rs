//! Append-only text buffer with scoped indentation.
//!
//! Every renderer in this crate writes through a [`CodeWriter`]. Indentation
//! is held by an [`IndentGuard`]: the level goes up when the guard is created
//! and comes back down when it is dropped, so an early `?` return from a
//! nested renderer can never leave the writer mis-indented.
//!
//! ```
//! use protots_codegen::code_writer::CodeWriter;
//! use protots_codegen::cw_writeln;
//!
//! let mut out = String::new();
//! let mut w = CodeWriter::with_indent_spaces(&mut out, 2);
//!
//! w.block("export interface User", |w| {
//!     cw_writeln!(w, "id: {};", "string")?;
//!     w.writeln("name?: string;")
//! })
//! .unwrap();
//!
//! assert_eq!(out, "export interface User {\n  id: string;\n  name?: string;\n}\n");
//! ```

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

pub struct CodeWriter<W> {
    writer: W,
    indent_level: Rc<Cell<usize>>,
    indent_string: String,
    at_line_start: bool,
}

impl<W: fmt::Write> CodeWriter<W> {
    pub fn new(writer: W, indent_string: String) -> Self {
        Self {
            writer,
            indent_level: Rc::new(Cell::new(0)),
            indent_string,
            at_line_start: true,
        }
    }

    pub fn with_indent_spaces(writer: W, spaces: usize) -> Self {
        Self::new(writer, " ".repeat(spaces))
    }

    /// Write text without a newline. Indents if at the start of a line.
    pub fn write(&mut self, text: &str) -> fmt::Result {
        if text.is_empty() {
            return Ok(());
        }

        if self.at_line_start && !text.trim().is_empty() {
            for _ in 0..self.indent_level.get() {
                self.writer.write_str(&self.indent_string)?;
            }
            self.at_line_start = false;
        }

        self.writer.write_str(text)
    }

    pub fn writeln(&mut self, text: &str) -> fmt::Result {
        self.write(text)?;
        self.writer.write_char('\n')?;
        self.at_line_start = true;
        Ok(())
    }

    /// Write an empty line (never indented).
    pub fn blank_line(&mut self) -> fmt::Result {
        self.writer.write_char('\n')?;
        self.at_line_start = true;
        Ok(())
    }

    /// Raise the indent level until the returned guard is dropped.
    pub fn indent(&mut self) -> IndentGuard {
        self.indent_level.set(self.indent_level.get() + 1);
        IndentGuard {
            indent_level: Rc::clone(&self.indent_level),
        }
    }

    pub fn indent_level(&self) -> usize {
        self.indent_level.get()
    }

    /// `header {`, indented body, `}`.
    pub fn block<F>(&mut self, header: &str, body: F) -> fmt::Result
    where
        F: FnOnce(&mut Self) -> fmt::Result,
    {
        self.delimited(&format!("{header} {{"), "}", body)
    }

    /// An opening line, an indented body and a closing line.
    ///
    /// Used for shapes `block` cannot express, like `= {` ... `};`.
    pub fn delimited<F>(&mut self, open: &str, close: &str, body: F) -> fmt::Result
    where
        F: FnOnce(&mut Self) -> fmt::Result,
    {
        self.writeln(open)?;
        {
            let _indent = self.indent();
            body(self)?;
        }
        self.writeln(close)
    }

    /// Write items with `separator` between them, each via `write_item`.
    pub fn write_separated<I, F>(
        &mut self,
        items: I,
        separator: &str,
        mut write_item: F,
    ) -> fmt::Result
    where
        I: IntoIterator,
        F: FnMut(&mut Self, I::Item) -> fmt::Result,
    {
        let mut first = true;
        for item in items {
            if !first {
                self.write(separator)?;
            }
            write_item(self, item)?;
            first = false;
        }
        Ok(())
    }

    #[doc(hidden)]
    pub fn write_fmt(&mut self, args: fmt::Arguments<'_>) -> fmt::Result {
        let formatted = format!("{args}");
        self.write(&formatted)
    }

    #[doc(hidden)]
    pub fn writeln_fmt(&mut self, args: fmt::Arguments<'_>) -> fmt::Result {
        let formatted = format!("{args}");
        self.writeln(&formatted)
    }
}

/// Keeps the writer one level deeper for as long as it lives.
pub struct IndentGuard {
    indent_level: Rc<Cell<usize>>,
}

impl Drop for IndentGuard {
    fn drop(&mut self) {
        let current = self.indent_level.get();
        self.indent_level.set(current.saturating_sub(1));
    }
}

/// `write!` for a [`CodeWriter`].
#[macro_export]
macro_rules! cw_write {
    ($writer:expr, $($arg:tt)*) => {
        $writer.write_fmt(format_args!($($arg)*))
    };
}

/// `writeln!` for a [`CodeWriter`].
#[macro_export]
macro_rules! cw_writeln {
    ($writer:expr, $($arg:tt)*) => {
        $writer.writeln_fmt(format_args!($($arg)*))
    };
}
