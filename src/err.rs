//! Error interface for this crate.
//!
//! Each pipeline stage has its own error type:
//! - [`LexErr`] from tokenizing source text,
//! - [`ParseErr`] from parsing a token sequence,
//! - [`LinkErr`] from linking instruction records into machine words.
//!
//! [`AsmErr`] wraps all three so the whole pipeline can be driven with `?`.
//!
//! Every error implements this module's [`Error`] trait, which exposes
//! where in the source the error occurred and an optional help message.
//! [`report`] renders both into a human-readable diagnostic.

use std::borrow::Cow;
use std::fmt::Write as _;

pub use crate::asm::{AsmErr, LinkErr, LinkErrKind};
pub use crate::parse::lex::{LexErr, LexErrKind};
pub use crate::parse::{ParseErr, ParseErrKind};

/// A position in the source text.
///
/// Both fields are 1-based. `col` counts words within the line, not characters,
/// so `ADD %0 %1` places `%1` at column 3.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub struct Pos {
    /// The line number.
    pub line: u8,
    /// The word number within the line.
    pub col: u8,
}
impl Pos {
    /// Creates a new position.
    pub fn new(line: u8, col: u8) -> Self {
        Pos { line, col }
    }
}
impl std::fmt::Display for Pos {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

/// Unified error interface for all errors in this crate.
///
/// Note that the [`Display`] implementation is used for a brief message,
/// where as [`Error::help`] is used for any clarifying messages.
///
/// [`Display`]: std::fmt::Display
pub trait Error: std::error::Error {
    /// The position where this error occurs in source.
    ///
    /// `None` means the error applies to the whole program.
    fn pos(&self) -> Option<Pos> {
        None
    }

    /// A clarifying message to help aid someone in how to fix the message.
    fn help(&self) -> Option<Cow<str>> {
        None
    }
}

/// Renders an error into a diagnostic, quoting the source line it points at.
///
/// ```
/// use pico_asm::asm::assemble;
/// use pico_asm::err::report;
/// use pico_asm::isa::Catalog;
///
/// let src = "LOAD %0 !d5\nADD %0 %16\n";
/// let err = assemble(src, &Catalog::standard()).unwrap_err();
/// let diag = report(&err, src);
/// assert!(diag.starts_with("error: register index out of bounds"));
/// assert!(diag.contains("ADD %0 %16"));
/// ```
pub fn report(err: &dyn Error, src: &str) -> String {
    fn _report(err: &dyn Error, src: &str) -> Result<String, std::fmt::Error> {
        let mut buf = String::new();
        writeln!(buf, "error: {err}")?;

        if let Some(pos) = err.pos() {
            let line = src.lines().nth(usize::from(pos.line).saturating_sub(1));
            let gutter = pos.line.to_string().len();

            writeln!(buf, "{:gutter$}--> {pos}", "")?;
            if let Some(line) = line {
                writeln!(buf, "{:gutter$} |", "")?;
                writeln!(buf, "{} | {}", pos.line, line.trim_end())?;
                writeln!(buf, "{:gutter$} |", "")?;
            }
        }
        if let Some(help) = err.help() {
            writeln!(buf, "help: {help}")?;
        }

        Ok(buf)
    }

    _report(err, src).unwrap_or_else(|_| err.to_string())
}
