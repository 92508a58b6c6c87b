//! The instruction catalog.
//!
//! A [`Catalog`] maps mnemonics to their [`InstructionDefinition`]s.
//! It is built once before parsing and is read-only afterwards.
//!
//! [`Catalog::standard`] holds the instruction set of the target CPU,
//! a PicoBlaze-style core with sixteen 8-bit registers and 256 words of program memory.

use crate::ast::{InstructionDefinition, Shape};
use crate::store::{InsertErr, Store};

macro_rules! catalog_table {
    ($($name:literal => $mask:literal, $shape:ident $(, $a1:literal $(, $a2:literal)?)?);+ $(;)?) => {
        &[
            $(($name, InstructionDefinition::new($mask, Shape::$shape, catalog_table!(@off $($a1)?), catalog_table!(@off $($($a2)?)?)))),+
        ]
    };
    (@off $off:literal) => { $off };
    (@off) => { 0 };
}

/// Every instruction of the target CPU.
const STANDARD: &[(&str, InstructionDefinition)] = catalog_table! {
    // Jump
    "JMP"    => 0b1000_0001_0000_0000, Addr, 0;
    "JZ"     => 0b1001_0001_0000_0000, Addr, 0;
    "JNZ"    => 0b1001_0101_0000_0000, Addr, 0;
    "JC"     => 0b1001_1001_0000_0000, Addr, 0;
    "JNC"    => 0b1001_1101_0000_0000, Addr, 0;
    // Call
    "CALL"   => 0b1000_0011_0000_0000, Addr, 0;
    "CALLZ"  => 0b1001_0011_0000_0000, Addr, 0;
    "CALLNZ" => 0b1001_0111_0000_0000, Addr, 0;
    "CALLC"  => 0b1001_1011_0000_0000, Addr, 0;
    "CALLNC" => 0b1001_1111_0000_0000, Addr, 0;
    // Return
    "RET"    => 0b1000_0000_1000_0000, None;
    "RETZ"   => 0b1001_0000_1000_0000, None;
    "RETNZ"  => 0b1001_0100_1000_0000, None;
    "RETC"   => 0b1001_1000_1000_0000, None;
    "RETNC"  => 0b1001_1100_1000_0000, None;

    // Logical
    "LOAD"   => 0b1100_0000_0000_0000, RegOrImm, 8, 4;
    "AND"    => 0b1100_0000_0000_0001, RegOrImm, 8, 4;
    "OR"     => 0b1100_0000_0000_0010, RegOrImm, 8, 4;
    "XOR"    => 0b1100_0000_0000_0011, RegOrImm, 8, 4;
    // Arithmetic
    "ADD"    => 0b1100_0000_0000_0100, RegOrImm, 8, 4;
    "ADDCY"  => 0b1100_0000_0000_0101, RegOrImm, 8, 4;
    "SUB"    => 0b1100_0000_0000_0110, RegOrImm, 8, 4;
    "SUBCY"  => 0b1100_0000_0000_0111, RegOrImm, 8, 4;

    // Shift and rotate right
    "SR0"    => 0b1101_0000_0000_1110, Reg, 8;
    "SR1"    => 0b1101_0000_0000_1111, Reg, 8;
    "SRX"    => 0b1101_0000_0000_1010, Reg, 8;
    "SRA"    => 0b1101_0000_0000_1000, Reg, 8;
    "RR"     => 0b1101_0000_0000_1100, Reg, 8;
    // Shift and rotate left
    "SL0"    => 0b1101_0000_0000_0110, Reg, 8;
    "SL1"    => 0b1101_0000_0000_0111, Reg, 8;
    "SLX"    => 0b1101_0000_0000_0010, Reg, 8;
    "SLA"    => 0b1101_0000_0000_0000, Reg, 8;
    "RL"     => 0b1101_0000_0000_0100, Reg, 8;

    // Input
    "INPUT"  => 0b1011_0000_0000_0000, RegReg, 8, 4;
    "INPUTP" => 0b1010_0000_0000_0000, RegImm, 8, 0;
    // Output
    "OUTPUT"  => 0b1111_0000_0000_0000, RegReg, 8, 4;
    "OUTPUTP" => 0b1110_0000_0000_0000, RegImm, 8, 0;

    // Interrupts
    "RETE"   => 0b1000_0000_1111_1000, None;
    "RETD"   => 0b1000_0000_1101_1000, None;
    "INTE"   => 0b1000_0000_1111_0000, None;
    "INTD"   => 0b1000_0000_1101_0000, None;
};

/// A table of instruction definitions, keyed by mnemonic.
///
/// Mnemonics are case-sensitive.
///
/// ## Example
/// ```
/// use pico_asm::ast::Shape;
/// use pico_asm::isa::Catalog;
///
/// let catalog = Catalog::standard();
/// assert_eq!(catalog.lookup("ADD").map(|d| d.shape), Some(Shape::RegOrImm));
/// assert_eq!(catalog.lookup("add"), None);
/// ```
#[derive(Debug, Default)]
pub struct Catalog {
    defs: Store,
}
impl Catalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a catalog holding the standard instruction set.
    pub fn standard() -> Self {
        let mut catalog = Self::new();
        for (name, def) in STANDARD {
            if let Err(e) = catalog.define(name, *def) {
                unreachable!("standard catalog should have unique mnemonics ({name}: {e})");
            }
        }
        catalog
    }

    /// Adds an instruction to the catalog.
    ///
    /// This fails if the mnemonic is already defined.
    pub fn define(&mut self, name: &str, def: InstructionDefinition) -> Result<(), InsertErr> {
        self.defs.insert(name, def)
    }

    /// Gets the definition of a mnemonic (if it exists).
    pub fn lookup(&self, name: &str) -> Option<&InstructionDefinition> {
        self.defs.get(name).ok()
    }

    /// Whether the name is an instruction mnemonic.
    pub fn contains(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }

    /// The number of instructions in this catalog.
    pub fn len(&self) -> usize {
        self.defs.len()
    }

    /// Whether this catalog has no instructions.
    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }
}
