//! Linking instruction records into machine words.
//!
//! This module is used to convert parsed [`Instruction`] records into the final 16-bit words
//! of a program.
//!
//! The assembler module notably consists of:
//! - [`assemble`]: the main function, which runs the whole pipeline on source text.
//! - [`link`]: the second pass, which resolves labels and encodes each instruction.
//! - [`SymbolTable`]: a struct holding the symbol table, which stores the address of each label after parsing.
//! - [`Program`]: a struct holding the assembled words.

pub mod encoding;

use crate::ast::{Instruction, Shape, TokenKind};
use crate::err::{Error as _, Pos};
use crate::isa::Catalog;
use crate::parse::lex::{tokenize, LexErr};
use crate::parse::{parse_tokens, ParseErr, MAX_INSTRUCTIONS};
use crate::store::{InsertErr, Store};

/// Assembles source code into a program.
///
/// This tokenizes, parses, and links the source,
/// stopping at the first error of any stage.
///
/// # Example
/// ```
/// use pico_asm::asm::assemble;
/// use pico_asm::isa::Catalog;
///
/// let src = "
///     LOAD %0 !d5
///     ADD %0 %1
/// #END
///     JMP #END
/// ";
/// let program = assemble(src, &Catalog::standard()).unwrap();
/// assert_eq!(program.words(), [0x0005, 0xC014, 0x8102]);
/// assert_eq!(program.symbol_table().lookup_label("END"), Some(2));
/// ```
pub fn assemble(src: &str, catalog: &Catalog) -> Result<Program, AsmErr> {
    let tokens = tokenize(src)?;
    let mut symbols = SymbolTable::new();
    let mut instrs = parse_tokens(&tokens, catalog, &mut symbols)?;
    let words = link(&mut instrs, &symbols)?;

    Ok(Program { words, symbols })
}

/// Kinds of errors that can occur from linking instructions.
///
/// See [`LinkErr`] for this error type with position information included.
#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub enum LinkErrKind {
    /// An address operand names a label which was never defined.
    SymbolUndefined(String),
    /// An instruction record has no definition (internal).
    MissingInstruction {
        /// The address of the record.
        addr: u8,
    },
    /// An instruction record's operands do not fit its shape (internal).
    UnknownArgType {
        /// The address of the record.
        addr: u8,
        /// The shape of the record's definition.
        shape: Shape,
    },
    /// More instruction records were given than program memory can address.
    ProgramTooLarge {
        /// The number of records.
        len: usize,
    },
}
impl std::fmt::Display for LinkErrKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SymbolUndefined(label)          => write!(f, "undefined symbol '{label}'"),
            Self::MissingInstruction { addr }     => write!(f, "missing instruction at address {addr}"),
            Self::UnknownArgType { addr, shape }  => write!(f, "unknown arguments for shape '{shape}' at address {addr}"),
            Self::ProgramTooLarge { len }         => write!(f, "cannot link {len} instructions, the limit is {MAX_INSTRUCTIONS}"),
        }
    }
}

/// Error from linking instructions.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct LinkErr {
    /// The kind of error.
    pub kind: LinkErrKind,
    /// The position associated with this error (`None` for internal errors).
    pub pos: Option<Pos>,
}
impl LinkErr {
    /// Creates a new [`LinkErr`].
    pub fn new(kind: LinkErrKind, pos: Option<Pos>) -> Self {
        LinkErr { kind, pos }
    }
}
impl std::fmt::Display for LinkErr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.kind)
    }
}
impl std::error::Error for LinkErr {}
impl crate::err::Error for LinkErr {
    fn pos(&self) -> Option<Pos> {
        self.pos
    }

    fn help(&self) -> Option<std::borrow::Cow<str>> {
        match &self.kind {
            LinkErrKind::SymbolUndefined(label) => Some(format!("try adding #{label} before an instruction").into()),
            LinkErrKind::MissingInstruction { .. } => None,
            LinkErrKind::UnknownArgType { .. } => None,
            LinkErrKind::ProgramTooLarge { .. } => None,
        }
    }
}

/// Error from any stage of assembling source code.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum AsmErr {
    /// Error from tokenizing.
    Lex(LexErr),
    /// Error from parsing.
    Parse(ParseErr),
    /// Error from linking.
    Link(LinkErr),
}
impl AsmErr {
    /// The name of the stage which raised this error.
    pub fn stage(&self) -> &'static str {
        match self {
            AsmErr::Lex(_)   => "tokenize",
            AsmErr::Parse(_) => "parse",
            AsmErr::Link(_)  => "link",
        }
    }

    fn inner(&self) -> &dyn crate::err::Error {
        match self {
            AsmErr::Lex(e)   => e,
            AsmErr::Parse(e) => e,
            AsmErr::Link(e)  => e,
        }
    }
}
impl From<LexErr> for AsmErr {
    fn from(value: LexErr) -> Self {
        AsmErr::Lex(value)
    }
}
impl From<ParseErr> for AsmErr {
    fn from(value: ParseErr) -> Self {
        AsmErr::Parse(value)
    }
}
impl From<LinkErr> for AsmErr {
    fn from(value: LinkErr) -> Self {
        AsmErr::Link(value)
    }
}
impl std::fmt::Display for AsmErr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.inner())
    }
}
impl std::error::Error for AsmErr {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AsmErr::Lex(e)   => Some(e),
            AsmErr::Parse(e) => Some(e),
            AsmErr::Link(e)  => Some(e),
        }
    }
}
impl crate::err::Error for AsmErr {
    fn pos(&self) -> Option<Pos> {
        self.inner().pos()
    }

    fn help(&self) -> Option<std::borrow::Cow<str>> {
        self.inner().help()
    }
}

/// The symbol table created while parsing,
/// which maps each label to the address of the instruction following it.
///
/// ## Example
/// ```
/// use pico_asm::asm::SymbolTable;
///
/// let mut sym = SymbolTable::new();
/// sym.define("LOOP", 3).unwrap();
///
/// assert_eq!(sym.lookup_label("LOOP"), Some(3));
/// assert_eq!(sym.rev_lookup_label(3), Some("LOOP"));
/// assert_eq!(sym.lookup_label("LOOP_DE_LOOP"), None);
/// assert!(sym.define("LOOP", 4).is_err());
/// ```
#[derive(Debug, Default)]
pub struct SymbolTable {
    labels: Store,
}
impl SymbolTable {
    /// Creates an empty symbol table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds a label to an address.
    ///
    /// A label can only be bound once.
    pub fn define(&mut self, label: &str, addr: u8) -> Result<(), InsertErr> {
        self.labels.insert(label, addr)
    }

    /// Gets the address of a given label (if it exists).
    pub fn lookup_label(&self, label: &str) -> Option<u8> {
        self.labels.get(label).ok().copied()
    }

    /// Gets a label at a given address (if one exists).
    ///
    /// If multiple labels share the address, any one of them may be returned.
    pub fn rev_lookup_label(&self, addr: u8) -> Option<&str> {
        self.label_iter()
            .find(|&(_, a)| a == addr)
            .map(|(label, _)| label)
    }

    /// Gets an iterable of the mapping from labels to addresses.
    pub fn label_iter(&self) -> impl Iterator<Item=(&str, u8)> + '_ {
        self.labels.iter::<u8>()
            .map(|(label, &addr)| (label, addr))
    }

    /// The number of labels.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Whether no labels are defined.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Places an operand's value at a bit offset.
fn place(value: u8, offset: u8) -> u16 {
    u16::from(value)
        .checked_shl(u32::from(offset))
        .unwrap_or(0)
}

impl Instruction<'_> {
    /// Encodes this instruction record into a machine word,
    /// resolving its address operand (if any) from the symbol table.
    ///
    /// Parameters:
    /// - `addr`: The address of this instruction (for diagnostics)
    /// - `sym`: The symbol table
    pub fn encode(&self, addr: u8, sym: &SymbolTable) -> Result<u16, LinkErr> {
        let Some(def) = self.definition else {
            return Err(LinkErr::new(LinkErrKind::MissingInstruction { addr }, None));
        };
        let unknown = || LinkErr::new(LinkErrKind::UnknownArgType { addr, shape: def.shape }, None);

        match (def.shape, self.arg1, self.arg2) {
            // The opcode is entirely in the mask.
            (Shape::None, _, _) => Ok(def.mask),
            (Shape::Reg, Some(reg), _) => Ok(def.mask | place(reg.value, def.arg1_offset)),
            (Shape::Addr, Some(label), _) => {
                let target = sym.lookup_label(&label.name).ok_or_else(|| {
                    LinkErr::new(LinkErrKind::SymbolUndefined(label.name.clone()), Some(label.pos()))
                })?;
                Ok(def.mask | place(target, def.arg1_offset))
            },
            (Shape::RegReg | Shape::RegImm, Some(a1), Some(a2)) => {
                Ok(def.mask | place(a1.value, def.arg1_offset) | place(a2.value, def.arg2_offset))
            },
            (Shape::RegOrImm, Some(a1), Some(a2)) => match a2.kind {
                // Register-register opcode
                TokenKind::Register => Ok(def.mask | place(a1.value, def.arg1_offset) | place(a2.value, def.arg2_offset)),
                // Register-immediate opcode: the mask's low nibble becomes the top nibble
                TokenKind::Number => Ok((def.mask << 12) ^ place(a1.value, def.arg1_offset) ^ u16::from(a2.value)),
                TokenKind::Label | TokenKind::Mnemonic => Err(unknown()),
            },
            _ => Err(unknown()),
        }
    }
}

/// Links instruction records, filling in each record's `raw` word.
///
/// Records are processed in program address order.
/// This returns the encoded words, in the same order.
/// At most [`MAX_INSTRUCTIONS`] records can be linked.
///
/// ## Example
/// ```
/// use pico_asm::asm::{link, SymbolTable};
/// use pico_asm::isa::Catalog;
/// use pico_asm::parse::lex::tokenize;
/// use pico_asm::parse::parse_tokens;
///
/// let tokens = tokenize("#TOP\nSR0 %2\nJMP TOP").unwrap();
/// let catalog = Catalog::standard();
/// let mut symbols = SymbolTable::new();
/// let mut instrs = parse_tokens(&tokens, &catalog, &mut symbols).unwrap();
///
/// let words = link(&mut instrs, &symbols).unwrap();
/// assert_eq!(words, [0xD20E, 0x8100]);
/// assert_eq!(instrs[0].raw, 0xD20E);
/// ```
pub fn link(instrs: &mut [Instruction<'_>], symbols: &SymbolTable) -> Result<Vec<u16>, LinkErr> {
    if instrs.len() > MAX_INSTRUCTIONS {
        return Err(LinkErr::new(LinkErrKind::ProgramTooLarge { len: instrs.len() }, None));
    }

    let words = instrs.iter_mut()
        .zip(0..=u8::MAX)
        .map(|(instr, addr)| {
            instr.raw = instr.encode(addr, symbols)?;
            tracing::trace!("{addr:03}: {:04X}", instr.raw);
            Ok(instr.raw)
        })
        .collect::<Result<Vec<_>, _>>()?;

    tracing::debug!("linked {} words", words.len());
    Ok(words)
}

/// An assembled program.
///
/// This is the final product after assembly source code is fully assembled.
#[derive(Debug)]
pub struct Program {
    words: Vec<u16>,
    symbols: SymbolTable,
}
impl Program {
    /// The machine words of this program, in address order.
    pub fn words(&self) -> &[u16] {
        &self.words
    }

    /// The symbol table of this program.
    pub fn symbol_table(&self) -> &SymbolTable {
        &self.symbols
    }

    /// The number of words in this program.
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Whether this program has no words.
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}
