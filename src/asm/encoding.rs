//! Formatters which render assembled words as text.
//!
//! The [`WordFormat`] trait describes an implementation of rendering a program's words.
//! This module provides these implementations of the trait:
//! - [`VhdlHex`]: A VHDL array aggregate with hexadecimal literals
//! - [`VhdlBin`]: A VHDL array aggregate with binary literals
//! - [`DebugTable`]: An annotated table of bits, for reading by hand

use std::fmt::Write;

/// A trait defining output formats.
pub trait WordFormat {
    /// Writes the entry for a single word at the given address.
    fn write_word(&self, buf: &mut String, addr: usize, word: u16) -> std::fmt::Result;

    /// Renders every word, in address order.
    ///
    /// ## Example
    /// ```
    /// use pico_asm::asm::encoding::{VhdlHex, WordFormat};
    ///
    /// let out = VhdlHex.render(&[0x0005, 0xC014]).unwrap();
    /// assert_eq!(out, " \"0\" => x\"0005\",\n \"1\" => x\"C014\",\n");
    /// ```
    fn render(&self, words: &[u16]) -> Result<String, std::fmt::Error> {
        let mut buf = String::new();
        for (addr, &word) in words.iter().enumerate() {
            self.write_word(&mut buf, addr, word)?;
        }
        Ok(buf)
    }
}

/// A VHDL aggregate of hexadecimal words (` "3" => x"C014",`).
#[derive(Debug, Clone, Copy, Default)]
pub struct VhdlHex;
impl WordFormat for VhdlHex {
    fn write_word(&self, buf: &mut String, addr: usize, word: u16) -> std::fmt::Result {
        writeln!(buf, " \"{addr}\" => x\"{word:04X}\",")
    }
}

/// A VHDL aggregate of binary words (` "3" => b"1100000000010100",`).
#[derive(Debug, Clone, Copy, Default)]
pub struct VhdlBin;
impl WordFormat for VhdlBin {
    fn write_word(&self, buf: &mut String, addr: usize, word: u16) -> std::fmt::Result {
        writeln!(buf, " \"{addr}\" => b\"{word:016b}\",")
    }
}

/// A table of words split into nibbles,
/// with a bit-position header before every tenth word.
///
/// ```text
///        FEDC BA98 7654 3210
/// 000 => 0000 0000 0000 0101
/// 001 => 1100 0000 0001 0100
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct DebugTable;

const DEBUG_HEADER: &str = "      FEDC BA98 7654 3210";
impl WordFormat for DebugTable {
    fn write_word(&self, buf: &mut String, addr: usize, word: u16) -> std::fmt::Result {
        if addr % 10 == 0 {
            writeln!(buf, " {DEBUG_HEADER}")?;
        }

        write!(buf, "{addr:03} =>")?;
        for shift in [12, 8, 4, 0] {
            write!(buf, " {:04b}", (word >> shift) & 0xF)?;
        }
        writeln!(buf)
    }
}
