//! Data types shared by every stage of the assembler.
//!
//! - [`Token`]: a classified source word, produced by [`crate::parse::lex`].
//! - [`InstructionDefinition`]: a catalog entry describing how a mnemonic is encoded.
//! - [`Instruction`]: a work record built by the parser and completed by the linker.

use crate::err::Pos;

/// The lexical class of a [`Token`].
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum TokenKind {
    /// A label definition (e.g., `#LOOP`).
    Label,
    /// An instruction name or a label reference (e.g., `ADD`, `LOOP`).
    ///
    /// These are only told apart by whether the name is in the instruction catalog.
    Mnemonic,
    /// A register (e.g., `%0` - `%15`).
    Register,
    /// An 8-bit immediate (e.g., `!d200`, `!b1010`, `0`).
    Number,
}
impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenKind::Label    => f.write_str("label"),
            TokenKind::Mnemonic => f.write_str("identifier"),
            TokenKind::Register => f.write_str("register"),
            TokenKind::Number   => f.write_str("immediate"),
        }
    }
}

/// A classified word of source code.
///
/// Tokens are created once by the tokenizer and only borrowed afterwards.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Token {
    /// The token's text, without its sigil for labels (`#`) and immediates (`!b`/`!d`).
    pub name: String,
    /// The token's class.
    pub kind: TokenKind,
    /// The register number or immediate value (0 for labels and mnemonics).
    pub value: u8,
    /// The 1-based line of the token.
    pub line: u8,
    /// The 1-based word number of the token within its line.
    pub col: u8,
}
impl Token {
    /// Creates a new token at the given position.
    pub fn new(name: impl Into<String>, kind: TokenKind, value: u8, pos: Pos) -> Self {
        Token { name: name.into(), kind, value, line: pos.line, col: pos.col }
    }

    /// The position of this token in source.
    pub fn pos(&self) -> Pos {
        Pos::new(self.line, self.col)
    }
}

/// The operand pattern of an instruction.
///
/// This determines how many operands the parser consumes after a mnemonic
/// and how the linker composes the final word.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum Shape {
    /// No operands (e.g., `RET`).
    None,
    /// One register (e.g., `SR0 %1`).
    Reg,
    /// One label reference (e.g., `JMP LOOP`).
    Addr,
    /// Two registers (e.g., `INPUT %1 %2`).
    RegReg,
    /// A register and an immediate (e.g., `OUTPUTP %1 !d4`).
    RegImm,
    /// A register, then either a register or an immediate (e.g., `ADD %1 %2`, `ADD %1 !d2`).
    RegOrImm,
}
impl std::fmt::Display for Shape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Shape::None     => f.write_str("no operands"),
            Shape::Reg      => f.write_str("register"),
            Shape::Addr     => f.write_str("address"),
            Shape::RegReg   => f.write_str("register, register"),
            Shape::RegImm   => f.write_str("register, immediate"),
            Shape::RegOrImm => f.write_str("register, register or immediate"),
        }
    }
}

/// How a mnemonic is encoded.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub struct InstructionDefinition {
    /// The template bits of the instruction.
    pub mask: u16,
    /// The operands the instruction accepts.
    pub shape: Shape,
    /// Bit position of the first operand.
    pub arg1_offset: u8,
    /// Bit position of the second operand.
    pub arg2_offset: u8,
}
impl InstructionDefinition {
    /// Creates a new instruction definition.
    pub const fn new(mask: u16, shape: Shape, arg1_offset: u8, arg2_offset: u8) -> Self {
        InstructionDefinition { mask, shape, arg1_offset, arg2_offset }
    }
}

/// An instruction record.
///
/// The parser fills `definition`, `arg1`, and `arg2`.
/// The linker fills `raw`.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub struct Instruction<'a> {
    /// The catalog entry of this instruction.
    pub definition: Option<&'a InstructionDefinition>,
    /// The first operand, if the shape has one.
    pub arg1: Option<&'a Token>,
    /// The second operand, if the shape has one.
    pub arg2: Option<&'a Token>,
    /// The encoded machine word (0 until linked).
    pub raw: u16,
}
impl<'a> Instruction<'a> {
    /// Creates an unlinked instruction record.
    pub fn new(definition: &'a InstructionDefinition, arg1: Option<&'a Token>, arg2: Option<&'a Token>) -> Self {
        Instruction { definition: Some(definition), arg1, arg2, raw: 0 }
    }
}
