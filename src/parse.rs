//! Parsing assembly source code.
//!
//! This module consists of:
//! - [`lex`]: the tokenizer, which converts source text into [`Token`]s
//! - [`parse_tokens`]: the parser, which converts tokens into [`Instruction`] records
//!     and binds every label to its address in the [`SymbolTable`]
//!
//! The parser is a single left-to-right pass. A label may be referenced before
//! it is defined, because addresses are only resolved later, by [`crate::asm::link`].

pub mod lex;

use crate::asm::SymbolTable;
use crate::ast::{Instruction, InstructionDefinition, Shape, Token, TokenKind};
use crate::err::Pos;
use crate::isa::Catalog;
use crate::store::InsertErr;

/// The maximum number of instructions in a program.
pub const MAX_INSTRUCTIONS: usize = 255;

/// The kind of operand an instruction expects.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum Operand {
    /// A register.
    Register,
    /// An immediate.
    Number,
    /// A reference to a label.
    Address,
    /// A register or an immediate.
    RegisterOrNumber,
}
impl Operand {
    /// Whether a token can be used as this operand.
    fn accepts(self, token: &Token, catalog: &Catalog) -> bool {
        match (self, token.kind) {
            (Operand::Register, TokenKind::Register) => true,
            (Operand::Number, TokenKind::Number) => true,
            (Operand::RegisterOrNumber, TokenKind::Register | TokenKind::Number) => true,
            // Instruction names can't double as labels
            (Operand::Address, TokenKind::Mnemonic) => !catalog.contains(&token.name),
            (Operand::Address, TokenKind::Label) => true,
            _ => false,
        }
    }
}
impl std::fmt::Display for Operand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operand::Register         => f.write_str("register"),
            Operand::Number           => f.write_str("immediate"),
            Operand::Address          => f.write_str("address"),
            Operand::RegisterOrNumber => f.write_str("register or immediate"),
        }
    }
}

/// Kinds of errors that can occur from parsing tokens.
///
/// See [`ParseErr`] for this error type with position information included.
#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub enum ParseErrKind {
    /// Input ended before an instruction received all of its operands.
    ArgCount {
        /// The instruction.
        mnemonic: String,
        /// Which operand was missing (1 or 2).
        index: u8,
        /// What the missing operand should have been.
        expected: Operand,
    },
    /// An instruction's operand had the wrong kind.
    ArgType {
        /// The instruction.
        mnemonic: String,
        /// Which operand was mistyped (1 or 2).
        index: u8,
        /// What the operand should have been.
        expected: Operand,
        /// The kind of token that was found.
        found: TokenKind,
        /// The text of the token that was found.
        text: String,
    },
    /// A label was defined more than once.
    DupSymbol(String),
    /// The symbol table has no room for another label.
    SymbolTableFull(String),
    /// The program has more than [`MAX_INSTRUCTIONS`] instructions.
    TooManyInstructions,
    /// There were no tokens to parse (internal).
    EmptyProgram,
    /// A register or immediate appeared outside of an instruction (internal).
    StrayOperand(TokenKind, String),
}
impl std::fmt::Display for ParseErrKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ArgCount { mnemonic, index, expected } => {
                write!(f, "at '{mnemonic}': expected {expected} as arg{index}, reached end of input")
            },
            Self::ArgType { mnemonic, index, expected, found: TokenKind::Mnemonic, text } if *expected == Operand::Address => {
                write!(f, "at '{mnemonic}': expected {expected} as arg{index}, received instruction '{text}'")
            },
            Self::ArgType { mnemonic, index, expected, found, text } => {
                write!(f, "at '{mnemonic}': expected {expected} as arg{index}, received {found} '{text}'")
            },
            Self::DupSymbol(label)       => write!(f, "symbol '{label}' is already defined"),
            Self::SymbolTableFull(label) => write!(f, "no room in symbol table for '{label}'"),
            Self::TooManyInstructions    => write!(f, "program contains more than {MAX_INSTRUCTIONS} instructions"),
            Self::EmptyProgram           => f.write_str("program contains no tokens"),
            Self::StrayOperand(kind, text) => write!(f, "unexpected {kind} '{text}' outside of an instruction"),
        }
    }
}

/// Error from parsing tokens.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct ParseErr {
    /// The kind of error.
    pub kind: ParseErrKind,
    /// The position associated with this error (`None` if it applies to the whole program).
    pub pos: Option<Pos>,
}
impl ParseErr {
    /// Creates a new [`ParseErr`].
    pub fn new(kind: ParseErrKind, pos: Option<Pos>) -> Self {
        ParseErr { kind, pos }
    }
}
impl std::fmt::Display for ParseErr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.kind)
    }
}
impl std::error::Error for ParseErr {}
impl crate::err::Error for ParseErr {
    fn pos(&self) -> Option<Pos> {
        self.pos
    }

    fn help(&self) -> Option<std::borrow::Cow<str>> {
        match &self.kind {
            ParseErrKind::ArgCount { .. } => Some("add the missing operand".into()),
            ParseErrKind::ArgType { expected: Operand::Address, found: TokenKind::Mnemonic, .. } => {
                Some("instruction names cannot be used as labels".into())
            },
            ParseErrKind::ArgType { expected, .. } => Some(match expected {
                Operand::Register         => "registers are written %0-%15".into(),
                Operand::Number           => "immediates are written !d<decimal> or !b<binary>".into(),
                Operand::Address          => "this operand should be a label name".into(),
                Operand::RegisterOrNumber => "this operand should be %0-%15, !d<decimal>, or !b<binary>".into(),
            }),
            ParseErrKind::DupSymbol(_) => Some("labels must be unique within a program, try renaming one of the labels".into()),
            ParseErrKind::SymbolTableFull(_) => None,
            ParseErrKind::TooManyInstructions => Some(format!("program memory holds {MAX_INSTRUCTIONS} instructions").into()),
            ParseErrKind::EmptyProgram => Some("the source file has no instructions".into()),
            ParseErrKind::StrayOperand(..) => Some("check the operand count of the preceding instruction".into()),
        }
    }
}

/// Consumes the operands of an instruction.
///
/// `operands` are the tokens following the mnemonic.
/// On success, this returns the instruction record and the number of operands consumed.
pub fn consume_args<'a>(
    catalog: &Catalog,
    def: &'a InstructionDefinition,
    mnemonic: &Token,
    operands: &'a [Token],
) -> Result<(Instruction<'a>, usize), ParseErr> {
    let take = |index: u8, expected: Operand| -> Result<&'a Token, ParseErr> {
        let Some(token) = operands.get(usize::from(index - 1)) else {
            let kind = ParseErrKind::ArgCount { mnemonic: mnemonic.name.clone(), index, expected };
            return Err(ParseErr::new(kind, Some(mnemonic.pos())));
        };

        match expected.accepts(token, catalog) {
            true  => Ok(token),
            false => {
                let kind = ParseErrKind::ArgType {
                    mnemonic: mnemonic.name.clone(),
                    index,
                    expected,
                    found: token.kind,
                    text: token.name.clone(),
                };
                Err(ParseErr::new(kind, Some(token.pos())))
            }
        }
    };

    let (arg1, arg2) = match def.shape {
        Shape::None     => (None, None),
        Shape::Reg      => (Some(take(1, Operand::Register)?), None),
        Shape::Addr     => (Some(take(1, Operand::Address)?), None),
        Shape::RegReg   => (Some(take(1, Operand::Register)?), Some(take(2, Operand::Register)?)),
        Shape::RegImm   => (Some(take(1, Operand::Register)?), Some(take(2, Operand::Number)?)),
        Shape::RegOrImm => (Some(take(1, Operand::Register)?), Some(take(2, Operand::RegisterOrNumber)?)),
    };

    let consumed = usize::from(arg1.is_some()) + usize::from(arg2.is_some());
    Ok((Instruction::new(def, arg1, arg2), consumed))
}

/// Parses a token sequence into instruction records.
///
/// Every label definition is bound in `symbols` to the address of the instruction that follows it.
/// The returned records are in program address order.
///
/// ## Example
/// ```
/// use pico_asm::asm::SymbolTable;
/// use pico_asm::isa::Catalog;
/// use pico_asm::parse::lex::tokenize;
/// use pico_asm::parse::parse_tokens;
///
/// let tokens = tokenize("
///     JMP END   ; forward reference
///     LOAD %1 !d2
/// #END
///     RET
/// ").unwrap();
/// let catalog = Catalog::standard();
/// let mut symbols = SymbolTable::new();
///
/// let instrs = parse_tokens(&tokens, &catalog, &mut symbols).unwrap();
/// assert_eq!(instrs.len(), 3);
/// assert_eq!(symbols.lookup_label("END"), Some(2));
/// ```
pub fn parse_tokens<'a>(
    tokens: &'a [Token],
    catalog: &'a Catalog,
    symbols: &mut SymbolTable,
) -> Result<Vec<Instruction<'a>>, ParseErr> {
    if tokens.is_empty() {
        return Err(ParseErr::new(ParseErrKind::EmptyProgram, None));
    }

    let mut instrs = Vec::with_capacity(MAX_INSTRUCTIONS);
    let mut cursor = 0;
    while let Some(token) = tokens.get(cursor) {
        match token.kind {
            TokenKind::Mnemonic => {
                let Some(def) = catalog.lookup(&token.name) else {
                    // Label reference, consumed by an instruction elsewhere.
                    tracing::trace!("skipping label reference {} at {}", token.name, token.pos());
                    cursor += 1;
                    continue;
                };
                if instrs.len() >= MAX_INSTRUCTIONS {
                    return Err(ParseErr::new(ParseErrKind::TooManyInstructions, Some(token.pos())));
                }

                let (instr, consumed) = consume_args(catalog, def, token, &tokens[cursor + 1..])?;
                instrs.push(instr);
                cursor += 1 + consumed;
            },
            TokenKind::Label => {
                let Ok(lc) = u8::try_from(instrs.len()) else {
                    unreachable!("location counter should not exceed {MAX_INSTRUCTIONS}");
                };

                symbols.define(&token.name, lc).map_err(|e| {
                    let kind = match e {
                        InsertErr::Full => ParseErrKind::SymbolTableFull(token.name.clone()),
                        InsertErr::AlreadyPresent | InsertErr::SizeMismatch => ParseErrKind::DupSymbol(token.name.clone()),
                    };
                    ParseErr::new(kind, Some(token.pos()))
                })?;
                cursor += 1;
            },
            TokenKind::Register | TokenKind::Number => {
                let kind = ParseErrKind::StrayOperand(token.kind, token.name.clone());
                return Err(ParseErr::new(kind, Some(token.pos())));
            },
        }
    }

    tracing::debug!("parsed {} instructions, {} labels", instrs.len(), symbols.len());
    Ok(instrs)
}

#[cfg(test)]
mod tests {
    use super::{parse_tokens, Operand, ParseErr, ParseErrKind, MAX_INSTRUCTIONS};
    use crate::asm::SymbolTable;
    use crate::ast::{Instruction, Shape, TokenKind};
    use crate::err::Pos;
    use crate::isa::Catalog;
    use crate::parse::lex::tokenize;

    fn parse_src(src: &str) -> Result<(usize, SymbolTable), ParseErr> {
        let tokens = tokenize(src).unwrap();
        let catalog = Catalog::standard();
        let mut symbols = SymbolTable::new();
        let instrs = parse_tokens(&tokens, &catalog, &mut symbols)?;
        Ok((instrs.len(), symbols))
    }
    fn assert_parse_fail(src: &str, kind: ParseErrKind, pos: Option<Pos>) {
        let err = parse_src(src).unwrap_err();
        assert_eq!(err.kind, kind, "unexpected error for {src:?}");
        assert_eq!(err.pos, pos, "unexpected position for {src:?}");
    }
    fn operand_names<'a>(instr: &Instruction<'a>) -> (Option<&'a str>, Option<&'a str>) {
        (instr.arg1.map(|t| t.name.as_str()), instr.arg2.map(|t| t.name.as_str()))
    }

    #[test]
    fn test_each_shape() {
        let tokens = tokenize("
            RET
            SR0 %3
            JMP LOOP
            INPUT %1 %2
            OUTPUTP %1 !d7
            ADD %1 %2
            ADD %1 !b11
            #LOOP
        ").unwrap();
        let catalog = Catalog::standard();
        let mut symbols = SymbolTable::new();
        let instrs = parse_tokens(&tokens, &catalog, &mut symbols).unwrap();

        let shapes: Vec<_> = instrs.iter()
            .map(|i| i.definition.unwrap().shape)
            .collect();
        assert_eq!(shapes, [
            Shape::None, Shape::Reg, Shape::Addr, Shape::RegReg,
            Shape::RegImm, Shape::RegOrImm, Shape::RegOrImm
        ]);

        let operands: Vec<_> = instrs.iter().map(operand_names).collect();
        assert_eq!(operands, [
            (None, None),
            (Some("%3"), None),
            (Some("LOOP"), None),
            (Some("%1"), Some("%2")),
            (Some("%1"), Some("7")),
            (Some("%1"), Some("%2")),
            (Some("%1"), Some("11")),
        ]);

        // Observed kind of the register-or-immediate operand is kept for the linker
        assert_eq!(instrs[5].arg2.unwrap().kind, TokenKind::Register);
        assert_eq!(instrs[6].arg2.unwrap().kind, TokenKind::Number);
        // Nothing is encoded yet
        assert!(instrs.iter().all(|i| i.raw == 0));

        assert_eq!(symbols.lookup_label("LOOP"), Some(7));
    }

    #[test]
    fn test_label_addresses() {
        let (count, sym) = parse_src("
            #A
            #B
                LOAD %0 0
            #C
                ADD %0 !d1
                JMP C
            #D
        ").unwrap();

        assert_eq!(count, 3);
        assert_eq!(sym.lookup_label("A"), Some(0));
        assert_eq!(sym.lookup_label("B"), Some(0));
        assert_eq!(sym.lookup_label("C"), Some(1));
        assert_eq!(sym.lookup_label("D"), Some(3));
        assert_eq!(sym.lookup_label("E"), None);
    }

    #[test]
    fn test_label_reference_skipped() {
        // A bare label reference is not an instruction
        let (count, _) = parse_src("SOMEWHERE\nRET\n").unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_dup_symbol() {
        assert_parse_fail(
            "#L\nRET\n  RET #L\n",
            ParseErrKind::DupSymbol("L".to_string()),
            Some(Pos::new(3, 2))
        );
    }

    #[test]
    fn test_arg_count() {
        assert_parse_fail(
            "RET\nADD %1",
            ParseErrKind::ArgCount { mnemonic: "ADD".to_string(), index: 2, expected: Operand::RegisterOrNumber },
            Some(Pos::new(2, 1))
        );
        assert_parse_fail(
            "JMP",
            ParseErrKind::ArgCount { mnemonic: "JMP".to_string(), index: 1, expected: Operand::Address },
            Some(Pos::new(1, 1))
        );
    }

    #[test]
    fn test_arg_type() {
        assert_parse_fail(
            "SR0 !d1",
            ParseErrKind::ArgType {
                mnemonic: "SR0".to_string(), index: 1, expected: Operand::Register,
                found: TokenKind::Number, text: "1".to_string()
            },
            Some(Pos::new(1, 2))
        );
        assert_parse_fail(
            "INPUTP %1 %2",
            ParseErrKind::ArgType {
                mnemonic: "INPUTP".to_string(), index: 2, expected: Operand::Number,
                found: TokenKind::Register, text: "%2".to_string()
            },
            Some(Pos::new(1, 3))
        );
        assert_parse_fail(
            "INPUT %1\n!d2",
            ParseErrKind::ArgType {
                mnemonic: "INPUT".to_string(), index: 2, expected: Operand::Register,
                found: TokenKind::Number, text: "2".to_string()
            },
            Some(Pos::new(2, 1))
        );
        assert_parse_fail(
            "ADD %1 LOOP",
            ParseErrKind::ArgType {
                mnemonic: "ADD".to_string(), index: 2, expected: Operand::RegisterOrNumber,
                found: TokenKind::Mnemonic, text: "LOOP".to_string()
            },
            Some(Pos::new(1, 3))
        );
    }

    #[test]
    fn test_addr_rejects_instruction_name() {
        let err = parse_src("JMP RET").unwrap_err();
        assert_eq!(err.pos, Some(Pos::new(1, 2)));
        assert_eq!(err.to_string(), "at 'JMP': expected address as arg1, received instruction 'RET'");
    }

    #[test]
    fn test_addr_accepts_label_token() {
        let tokens = tokenize("#END\nJMP #END").unwrap();
        let catalog = Catalog::standard();
        let mut symbols = SymbolTable::new();
        let instrs = parse_tokens(&tokens, &catalog, &mut symbols).unwrap();

        assert_eq!(instrs.len(), 1);
        assert_eq!(operand_names(&instrs[0]), (Some("END"), None));
        // the reference is an operand, not a second definition
        assert_eq!(symbols.len(), 1);
    }

    #[test]
    fn test_addr_consumes_following_label() {
        // An operand-less JMP takes the next label as its operand,
        // so the repeated `#L` is a reference rather than a duplicate.
        let tokens = tokenize("#L\nJMP\n#L\nRET").unwrap();
        let catalog = Catalog::standard();
        let mut symbols = SymbolTable::new();
        let instrs = parse_tokens(&tokens, &catalog, &mut symbols).unwrap();

        assert_eq!(instrs.len(), 2);
        assert_eq!(operand_names(&instrs[0]), (Some("L"), None));
        assert_eq!(instrs[0].arg1.unwrap().pos(), Pos::new(3, 1));
        assert_eq!(symbols.lookup_label("L"), Some(0));
        assert_eq!(symbols.len(), 1);
    }

    #[test]
    fn test_symbol_table_full() {
        let labels: Vec<_> = (0..600).map(|i| format!("#L{i}")).collect();
        let src = labels.chunks(40)
            .map(|line| line.join(" "))
            .collect::<Vec<_>>()
            .join("\n");

        // The 513th label does not fit the 512 buckets
        assert_parse_fail(
            &src,
            ParseErrKind::SymbolTableFull("L512".to_string()),
            Some(Pos::new(13, 33))
        );
    }

    #[test]
    fn test_stray_operand() {
        assert_parse_fail(
            "INPUT %1 %2 %3",
            ParseErrKind::StrayOperand(TokenKind::Register, "%3".to_string()),
            Some(Pos::new(1, 4))
        );
    }

    #[test]
    fn test_empty_program() {
        assert_parse_fail("", ParseErrKind::EmptyProgram, None);
        assert_parse_fail("; just a comment\n", ParseErrKind::EmptyProgram, None);
    }

    #[test]
    fn test_instruction_limit() {
        // Two per line, so the source stays within the line limit
        let full = "RET RET\n".repeat(127) + "RET\n#LAST\n";
        let (count, sym) = parse_src(&full).unwrap();
        assert_eq!(count, MAX_INSTRUCTIONS);
        assert_eq!(sym.lookup_label("LAST"), Some(255));

        let over = "RET RET\n".repeat(128);
        assert_parse_fail(&over, ParseErrKind::TooManyInstructions, Some(Pos::new(128, 2)));
    }
}
