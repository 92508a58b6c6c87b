//! A two-pass assembler for a PicoBlaze-style 8-bit microcontroller.
//!
//! Source text is assembled into 16-bit machine words in three stages:
//! 1. [`parse::lex::tokenize`] splits the source into classified [`ast::Token`]s,
//! 2. [`parse::parse_tokens`] resolves mnemonics and records label addresses,
//! 3. [`asm::link`] resolves label references and encodes each word.
//!
//! # Usage
//!
//! The whole pipeline can be run with [`asm::assemble`]:
//! ```
//! use pico_asm::asm::assemble;
//! use pico_asm::asm::encoding::{VhdlHex, WordFormat};
//! use pico_asm::isa::Catalog;
//!
//! let code = "
//!     LOAD %0 !d5   ; counter
//! #LOOP
//!     SUB %0 !d1
//!     JNZ LOOP
//!     RET
//! ";
//! let catalog = Catalog::standard();
//! let program = assemble(code, &catalog).unwrap();
//! assert_eq!(program.symbol_table().lookup_label("LOOP"), Some(1));
//!
//! // Render for a VHDL ROM:
//! let vhdl = VhdlHex.render(program.words()).unwrap();
//! assert!(vhdl.starts_with(" \"0\" => x\"0005\",\n"));
//! ```
//!
//! Errors from any stage can be rendered with their source line using [`err::report`].
#![warn(missing_docs)]

pub mod parse;
pub mod ast;
pub mod asm;
pub mod err;
pub mod isa;
pub mod store;
