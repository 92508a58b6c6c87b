//! Tokenizing assembly source.
//!
//! Source is split into lines and each line is split into words
//! (delimited by spaces, commas, and tabs).
//! Each word is then classified into a [`Token`] by [`classify`].
//!
//! Classification is driven by the [`Lexeme`] enum, which matches a word by its sigil:
//! - `#name`: a label definition
//! - `%n`: a register (`%0` - `%15`)
//! - `!bXXXX`, `!dNNN`, `0`: an 8-bit immediate
//! - `;...`: a comment, which ends the line
//! - anything else: a mnemonic (an instruction name or label reference)

use std::num::IntErrorKind;

use logos::{Lexer, Logos};

use crate::ast::{Token, TokenKind};
use crate::err::Pos;

/// The longest line (in bytes, excluding the newline) that can be tokenized.
pub const MAX_LINE_LEN: usize = 254;

const WORD_DELIMITERS: [char; 4] = [' ', ',', '\t', '\r'];

/// The lexical class of a single word.
#[derive(Debug, Logos, PartialEq, Eq)]
#[logos(error = LexErrKind)]
pub enum Lexeme {
    // Like the delimiters, these regexes span over words that are technically invalid
    // (e.g., `%1x` matches a register).
    // This is intended.
    // Each regex collects one word and the callback validates it.

    /// A label definition (e.g., `#LOOP`).
    #[regex(r"#[^ \t,\r\n]*", lex_label)]
    Label(String),

    /// A register (i.e., `%0`-`%15`).
    #[regex(r"%[^ \t,\r\n]*", lex_reg)]
    Reg(u8),

    /// An 8-bit unsigned immediate (e.g., `!d255`, `!b1010`, `0`).
    #[regex(r"![^ \t,\r\n]*", lex_imm)]
    #[token("0", |_| 0u8, priority = 5)]
    Imm(u8),

    /// An identifier.
    ///
    /// This can refer to either:
    /// - an instruction (e.g., `ADD`, `JMP`)
    /// - a label reference (e.g., `LOOP`)
    #[regex(r"[^#%!; \t,\r\n][^ \t,\r\n]*", |lx| lx.slice().to_string())]
    Ident(String),

    /// A comment, which starts with a semicolon and spans the remaining part of the line.
    #[regex(r";[^\n]*")]
    Comment,
}

/// Kinds of errors raised in attempting to tokenize source.
///
/// See [`LexErr`] for this error type with position information included.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, Default)]
pub enum LexErrKind {
    /// Label sigil (`#`) was not followed by a name.
    LabelDefinition,
    /// Register sigil (`%`) was not followed by a decimal number.
    RegIndex,
    /// Register index was greater than 15.
    RegBounds,
    /// Immediate value was greater than 255.
    ImmBounds,
    /// Immediate sigil (`!`) was not followed by `b` + binary digits or `d` + decimal digits.
    InvalidImmFormat,
    /// Line was longer than [`MAX_LINE_LEN`] bytes.
    LineTooLong,
    /// Source had tokens past line 255.
    TooManyLines,
    /// Line had more than 255 words.
    TooManyWords,
    /// A symbol was used which is not allowed in assembly files
    #[default]
    InvalidSymbol,
}
impl std::fmt::Display for LexErrKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LexErrKind::LabelDefinition  => f.write_str("bad label definition"),
            LexErrKind::RegIndex         => f.write_str("bad register index"),
            LexErrKind::RegBounds        => f.write_str("register index out of bounds"),
            LexErrKind::ImmBounds        => f.write_str("immediate does not fit 8-bit unsigned integer"),
            LexErrKind::InvalidImmFormat => f.write_str("invalid immediate format"),
            LexErrKind::LineTooLong      => write!(f, "line is longer than {MAX_LINE_LEN} bytes"),
            LexErrKind::TooManyLines     => f.write_str("source has more than 255 lines"),
            LexErrKind::TooManyWords     => f.write_str("line has more than 255 words"),
            LexErrKind::InvalidSymbol    => f.write_str("unrecognized symbol"),
        }
    }
}

/// Error from tokenizing source.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct LexErr {
    /// The kind of error.
    pub kind: LexErrKind,
    /// The position of the offending word (`None` if it cannot be represented).
    pub pos: Option<Pos>,
    /// The offending word.
    pub word: String,
}
impl LexErr {
    /// Creates a new [`LexErr`].
    pub fn new(kind: LexErrKind, pos: Option<Pos>, word: impl Into<String>) -> Self {
        LexErr { kind, pos, word: word.into() }
    }
}
impl std::fmt::Display for LexErr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.word.is_empty() {
            true  => write!(f, "{}", self.kind),
            false => write!(f, "{}: '{}'", self.kind, self.word),
        }
    }
}
impl std::error::Error for LexErr {}
impl crate::err::Error for LexErr {
    fn pos(&self) -> Option<Pos> {
        self.pos
    }

    fn help(&self) -> Option<std::borrow::Cow<str>> {
        match self.kind {
            LexErrKind::LabelDefinition  => Some("a label (#) must be immediately followed by a name".into()),
            LexErrKind::RegIndex         => Some("a register index must be a decimal number".into()),
            LexErrKind::RegBounds        => Some("this must be %0-%15".into()),
            LexErrKind::ImmBounds        => Some(format!("the range for an immediate is [{}, {}]", u8::MIN, u8::MAX).into()),
            LexErrKind::InvalidImmFormat => Some("an immediate is either !b followed by binary digits or !d followed by decimal digits".into()),
            LexErrKind::LineTooLong      => Some("try splitting this line".into()),
            LexErrKind::TooManyLines     => Some("try removing blank lines or comments".into()),
            LexErrKind::TooManyWords     => Some("try splitting this line".into()),
            LexErrKind::InvalidSymbol    => Some("this char does not occur in any token in assembly".into()),
        }
    }
}

/// Helper that converts an int error kind to its corresponding LexErrKind.
fn convert_int_error(e: &IntErrorKind, invalid_err: LexErrKind, overflow_err: LexErrKind) -> LexErrKind {
    match e {
        IntErrorKind::Empty        => invalid_err,
        IntErrorKind::InvalidDigit => invalid_err,
        IntErrorKind::PosOverflow  => overflow_err,
        _ => invalid_err,
    }
}
fn lex_label(lx: &Lexer<'_, Lexeme>) -> Result<String, LexErrKind> {
    match &lx.slice()[1..] {
        "" => Err(LexErrKind::LabelDefinition),
        name => Ok(name.to_string()),
    }
}
fn lex_reg(lx: &Lexer<'_, Lexeme>) -> Result<u8, LexErrKind> {
    let index = &lx.slice()[1..];
    // `parse` would also accept a leading `+`
    if !index.bytes().all(|b| b.is_ascii_digit()) {
        return Err(LexErrKind::RegIndex);
    }

    index.parse::<u8>()
        .map_err(|e| convert_int_error(e.kind(), LexErrKind::RegIndex, LexErrKind::RegBounds))
        .and_then(|r| match r {
            0..=15 => Ok(r),
            _ => Err(LexErrKind::RegBounds),
        })
}
fn lex_imm(lx: &Lexer<'_, Lexeme>) -> Result<u8, LexErrKind> {
    let body = &lx.slice()[1..];
    let (radix, digits) = if let Some(digits) = body.strip_prefix('b') {
        (2, digits)
    } else if let Some(digits) = body.strip_prefix('d') {
        (10, digits)
    } else {
        return Err(LexErrKind::InvalidImmFormat);
    };
    if !digits.chars().all(|c| c.is_digit(radix)) {
        return Err(LexErrKind::InvalidImmFormat);
    }

    u8::from_str_radix(digits, radix)
        .map_err(|e| convert_int_error(e.kind(), LexErrKind::InvalidImmFormat, LexErrKind::ImmBounds))
}

/// Classifies one source word into a token.
///
/// This returns `None` if the word starts a comment,
/// in which case the rest of the line should be ignored.
///
/// ## Example
/// ```
/// use pico_asm::ast::TokenKind;
/// use pico_asm::parse::lex::classify;
///
/// let token = classify("%15", 1, 2).unwrap().unwrap();
/// assert_eq!(token.kind, TokenKind::Register);
/// assert_eq!(token.value, 15);
///
/// assert!(classify(";comment", 1, 3).unwrap().is_none());
/// assert!(classify("%16", 1, 2).is_err());
/// ```
pub fn classify(word: &str, line: u8, col: u8) -> Result<Option<Token>, LexErr> {
    let pos = Pos::new(line, col);
    let mut lexer = Lexeme::lexer(word);

    let lexeme = match lexer.next() {
        Some(Ok(lexeme)) => lexeme,
        Some(Err(kind)) => return Err(LexErr::new(kind, Some(pos), word)),
        None => return Err(LexErr::new(LexErrKind::InvalidSymbol, Some(pos), word)),
    };
    // A word never contains a delimiter, so the first lexeme spans all of it.
    if lexer.span().end != word.len() {
        return Err(LexErr::new(LexErrKind::InvalidSymbol, Some(pos), word));
    }

    let token = match lexeme {
        Lexeme::Label(name) => Token::new(name, TokenKind::Label, 0, pos),
        Lexeme::Reg(r)      => Token::new(word, TokenKind::Register, r, pos),
        Lexeme::Imm(v)      => {
            // strip `!b`/`!d` (validated by the lexer), keep `0` as is
            let digits = word.strip_prefix('!').map_or(word, |s| &s[1..]);
            Token::new(digits, TokenKind::Number, v, pos)
        },
        Lexeme::Ident(name) => Token::new(name, TokenKind::Mnemonic, 0, pos),
        Lexeme::Comment     => return Ok(None),
    };
    Ok(Some(token))
}

/// Splits source into words and classifies each of them, preserving source order.
///
/// ## Example
/// ```
/// use pico_asm::ast::TokenKind;
/// use pico_asm::parse::lex::tokenize;
///
/// let tokens = tokenize("#START\nLOAD %1, !d10 ; set up\n").unwrap();
/// let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
/// assert_eq!(kinds, [TokenKind::Label, TokenKind::Mnemonic, TokenKind::Register, TokenKind::Number]);
/// assert_eq!((tokens[3].line, tokens[3].col), (2, 3));
/// ```
pub fn tokenize(src: &str) -> Result<Vec<Token>, LexErr> {
    let mut tokens = vec![];

    for (lno, line) in src.split('\n').enumerate() {
        let line = line.strip_suffix('\r').unwrap_or(line);
        let line_no = u8::try_from(lno + 1).ok();
        if line.len() > MAX_LINE_LEN {
            return Err(LexErr::new(LexErrKind::LineTooLong, line_no.map(|l| Pos::new(l, 1)), ""));
        }

        let words = line.split(WORD_DELIMITERS).filter(|w| !w.is_empty());
        for (cno, word) in words.enumerate() {
            let Some(line_no) = line_no else {
                if word.starts_with(';') { break; }
                return Err(LexErr::new(LexErrKind::TooManyLines, None, word));
            };
            let Ok(col_no) = u8::try_from(cno + 1) else {
                return Err(LexErr::new(LexErrKind::TooManyWords, Some(Pos::new(line_no, u8::MAX)), word));
            };

            match classify(word, line_no, col_no)? {
                Some(token) => tokens.push(token),
                None => break,
            }
        }
    }

    tracing::trace!("tokenized {} tokens", tokens.len());
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use logos::Logos;

    use crate::ast::{Token, TokenKind};
    use crate::err::Pos;
    use crate::parse::lex::{classify, tokenize, LexErrKind, Lexeme, MAX_LINE_LEN};

    fn kind_of(word: &str) -> Result<Option<TokenKind>, LexErrKind> {
        classify(word, 1, 1)
            .map(|t| t.map(|t| t.kind))
            .map_err(|e| e.kind)
    }
    fn value_of(word: &str) -> Result<u8, LexErrKind> {
        classify(word, 1, 1)
            .map(|t| t.unwrap().value)
            .map_err(|e| e.kind)
    }

    #[test]
    fn test_lexemes() {
        assert_eq!(Lexeme::lexer("#LOOP").next(), Some(Ok(Lexeme::Label("LOOP".to_string()))));
        assert_eq!(Lexeme::lexer("%7").next(), Some(Ok(Lexeme::Reg(7))));
        assert_eq!(Lexeme::lexer("!d42").next(), Some(Ok(Lexeme::Imm(42))));
        assert_eq!(Lexeme::lexer("0").next(), Some(Ok(Lexeme::Imm(0))));
        assert_eq!(Lexeme::lexer("00").next(), Some(Ok(Lexeme::Ident("00".to_string()))));
        assert_eq!(Lexeme::lexer("ADD").next(), Some(Ok(Lexeme::Ident("ADD".to_string()))));
        assert_eq!(Lexeme::lexer(";; hi").next(), Some(Ok(Lexeme::Comment)));
    }

    #[test]
    fn test_labels() {
        let token = classify("#LOOP", 4, 1).unwrap().unwrap();
        assert_eq!(token, Token::new("LOOP", TokenKind::Label, 0, Pos::new(4, 1)));

        // Anything after the sigil is part of the name
        assert_eq!(classify("#a#b", 1, 1).unwrap().unwrap().name, "a#b");
        assert_eq!(kind_of("#"), Err(LexErrKind::LabelDefinition));
    }

    #[test]
    fn test_regs() {
        for r in 0..=15 {
            assert_eq!(value_of(&format!("%{r}")), Ok(r));
        }
        assert_eq!(classify("%3", 1, 1).unwrap().unwrap().name, "%3");

        assert_eq!(value_of("%16"), Err(LexErrKind::RegBounds));
        assert_eq!(value_of("%255"), Err(LexErrKind::RegBounds));
        assert_eq!(value_of("%99999999999"), Err(LexErrKind::RegBounds));
        assert_eq!(value_of("%"), Err(LexErrKind::RegIndex));
        assert_eq!(value_of("%a"), Err(LexErrKind::RegIndex));
        assert_eq!(value_of("%+1"), Err(LexErrKind::RegIndex));
        assert_eq!(value_of("%-1"), Err(LexErrKind::RegIndex));
    }

    #[test]
    fn test_imm_dec() {
        assert_eq!(value_of("!d0"), Ok(0));
        assert_eq!(value_of("!d5"), Ok(5));
        assert_eq!(value_of("!d255"), Ok(255));
        assert_eq!(value_of("!d0255"), Ok(255));
        assert_eq!(value_of("!d256"), Err(LexErrKind::ImmBounds));
        assert_eq!(value_of("!d99999999999999"), Err(LexErrKind::ImmBounds));

        let token = classify("!d42", 1, 1).unwrap().unwrap();
        assert_eq!((token.name.as_str(), token.kind), ("42", TokenKind::Number));
    }

    #[test]
    fn test_imm_bin() {
        assert_eq!(value_of("!b0"), Ok(0));
        assert_eq!(value_of("!b1010"), Ok(0b1010));
        assert_eq!(value_of("!b11111111"), Ok(255));
        assert_eq!(value_of("!b100000000"), Err(LexErrKind::ImmBounds));

        let token = classify("!b101", 1, 1).unwrap().unwrap();
        assert_eq!(token.name, "101");
    }

    #[test]
    fn test_imm_invalid() {
        assert_eq!(value_of("!"), Err(LexErrKind::InvalidImmFormat));
        assert_eq!(value_of("!x1F"), Err(LexErrKind::InvalidImmFormat));
        assert_eq!(value_of("!d"), Err(LexErrKind::InvalidImmFormat));
        assert_eq!(value_of("!b"), Err(LexErrKind::InvalidImmFormat));
        assert_eq!(value_of("!b102"), Err(LexErrKind::InvalidImmFormat));
        assert_eq!(value_of("!d1a"), Err(LexErrKind::InvalidImmFormat));
        assert_eq!(value_of("!d+1"), Err(LexErrKind::InvalidImmFormat));
    }

    #[test]
    fn test_zero_shorthand() {
        let token = classify("0", 2, 3).unwrap().unwrap();
        assert_eq!(token, Token::new("0", TokenKind::Number, 0, Pos::new(2, 3)));

        // only the single digit is special
        assert_eq!(kind_of("1"), Ok(Some(TokenKind::Mnemonic)));
        assert_eq!(kind_of("01"), Ok(Some(TokenKind::Mnemonic)));
    }

    #[test]
    fn test_mnemonics() {
        assert_eq!(kind_of("ADD"), Ok(Some(TokenKind::Mnemonic)));
        assert_eq!(kind_of("loop_2"), Ok(Some(TokenKind::Mnemonic)));
        // a semicolon only starts a comment at the start of a word
        assert_eq!(kind_of("ADD;x"), Ok(Some(TokenKind::Mnemonic)));
        assert_eq!(kind_of(";x"), Ok(None));
        assert_eq!(kind_of(";"), Ok(None));
    }

    #[test]
    fn test_tokenize_positions() {
        let src = "\
            ; header comment\n\
            #START\n\
            LOAD %1,!d10\n\
            \tADD\t%1, %2 ;comment %3\n";
        let tokens = tokenize(src).unwrap();

        let summary: Vec<_> = tokens.iter()
            .map(|t| (t.name.as_str(), t.kind, t.value, t.line, t.col))
            .collect();
        assert_eq!(summary, [
            ("START", TokenKind::Label,    0,  2, 1),
            ("LOAD",  TokenKind::Mnemonic, 0,  3, 1),
            ("%1",    TokenKind::Register, 1,  3, 2),
            ("10",    TokenKind::Number,   10, 3, 3),
            ("ADD",   TokenKind::Mnemonic, 0,  4, 1),
            ("%1",    TokenKind::Register, 1,  4, 2),
            ("%2",    TokenKind::Register, 2,  4, 3),
        ]);
    }

    #[test]
    fn test_tokenize_crlf() {
        let tokens = tokenize("RET\r\nRETE\r\n").unwrap();
        let names: Vec<_> = tokens.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, ["RET", "RETE"]);
    }

    #[test]
    fn test_tokenize_error_pos() {
        let err = tokenize("LOAD %0 !d5\nADD %0 %16\n").unwrap_err();
        assert_eq!(err.kind, LexErrKind::RegBounds);
        assert_eq!(err.pos, Some(Pos::new(2, 3)));
        assert_eq!(err.word, "%16");

        let err = tokenize("RET\n  #  \n").unwrap_err();
        assert_eq!(err.kind, LexErrKind::LabelDefinition);
        assert_eq!(err.pos, Some(Pos::new(2, 1)));
    }

    #[test]
    fn test_line_too_long() {
        let ok = format!("RET ;{}", "x".repeat(MAX_LINE_LEN - 5));
        assert_eq!(ok.len(), MAX_LINE_LEN);
        assert!(tokenize(&ok).is_ok());

        let long = format!("RET ;{}", "x".repeat(MAX_LINE_LEN - 4));
        let err = tokenize(&long).unwrap_err();
        assert_eq!(err.kind, LexErrKind::LineTooLong);
        assert_eq!(err.pos, Some(Pos::new(1, 1)));

        // a CRLF line ending is not part of the line
        let crlf = format!("{ok}\r\nRET\r\n");
        assert_eq!(tokenize(&crlf).unwrap().len(), 2);
        let crlf = format!("{long}\r\n");
        assert_eq!(tokenize(&crlf).unwrap_err().kind, LexErrKind::LineTooLong);
    }

    #[test]
    fn test_widest_line() {
        // the longest line holds 127 single-character words
        let src = vec!["0"; 127].join(" ");
        assert_eq!(src.len(), 253);

        let tokens = tokenize(&src).unwrap();
        assert_eq!(tokens.len(), 127);
        assert_eq!(tokens[126].pos(), Pos::new(1, 127));
        assert!(tokens.iter().all(|t| t.kind == TokenKind::Number));
    }

    #[test]
    fn test_too_many_lines() {
        // blank and comment lines past the limit are fine...
        let src = format!("{}RET\n\n; trailing comment\n", "\n".repeat(254));
        assert_eq!(tokenize(&src).unwrap()[0].line, 255);

        // ...but tokens are not
        let src = format!("{}RET\n", "\n".repeat(255));
        let err = tokenize(&src).unwrap_err();
        assert_eq!(err.kind, LexErrKind::TooManyLines);
        assert_eq!(err.pos, None);
    }

    #[test]
    fn test_empty() {
        assert_eq!(tokenize(""), Ok(vec![]));
        assert_eq!(tokenize("\n ; only comments\n,,\t\n"), Ok(vec![]));
    }
}
