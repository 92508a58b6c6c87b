//! A fixed-capacity, string-keyed associative store.
//!
//! The [`Store`] backs both the instruction catalog ([`crate::isa::Catalog`])
//! and the symbol table ([`crate::asm::SymbolTable`]).
//!
//! The store uses open addressing with linear probing over a power-of-two number of buckets,
//! keyed by the 32-bit FNV-1a hash of the key. It never resizes and never removes entries:
//! - inserting an existing key fails instead of overwriting,
//! - inserting into a full store fails instead of growing,
//! - a lookup can stop at the first empty bucket it probes, because no bucket is ever emptied.
//!
//! Values are stored type-erased along with their size, so a lookup
//! with the wrong value type is rejected rather than misread.

use std::any::Any;

/// The number of buckets of a store created with [`Store::new`].
pub const DEFAULT_CAPACITY: usize = 512;

const FNV_OFFSET: u32 = 2166136261;
const FNV_PRIME: u32 = 16777619;

/// Computes the 32-bit FNV-1a hash of a key.
pub fn fnv1a32(key: &str) -> u32 {
    key.bytes().fold(FNV_OFFSET, |hash, b| (hash ^ u32::from(b)).wrapping_mul(FNV_PRIME))
}

/// Errors from allocating a store.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum AllocErr {
    /// The capacity was zero or not a power of two.
    InvalidCapacity(usize),
}
impl std::fmt::Display for AllocErr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AllocErr::InvalidCapacity(n) => write!(f, "store capacity must be a non-zero power of two, got {n}"),
        }
    }
}
impl std::error::Error for AllocErr {}

/// Reasons an insertion into a [`Store`] can fail.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum InsertErr {
    /// The key is already present with a value of the same size.
    AlreadyPresent,
    /// The key is already present with a value of a different size.
    SizeMismatch,
    /// Every bucket was probed and none were empty.
    Full,
}
impl std::fmt::Display for InsertErr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InsertErr::AlreadyPresent => f.write_str("key is already present"),
            InsertErr::SizeMismatch   => f.write_str("key is already present with a value of a different size"),
            InsertErr::Full           => f.write_str("store is full"),
        }
    }
}
impl std::error::Error for InsertErr {}

/// Reasons a lookup in a [`Store`] can fail.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum LookupErr {
    /// The key is not present.
    NotFound,
    /// The key is present, but its value's size differs from the requested type's size.
    SizeMismatch,
    /// The key is present with a same-sized value of a different type.
    TypeMismatch,
}
impl std::fmt::Display for LookupErr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LookupErr::NotFound     => f.write_str("key not found"),
            LookupErr::SizeMismatch => f.write_str("stored value has a different size than requested"),
            LookupErr::TypeMismatch => f.write_str("stored value has a different type than requested"),
        }
    }
}
impl std::error::Error for LookupErr {}

struct Slot {
    key: Box<str>,
    hash: u32,
    value: Box<dyn Any>,
    value_size: usize,
}
impl Slot {
    fn matches(&self, key: &str, hash: u32) -> bool {
        self.hash == hash && &*self.key == key
    }
}

/// Result of probing for a key.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
enum Probe {
    /// The key is in this bucket.
    Found { index: usize, probes: usize },
    /// The key is absent; this is the first empty bucket on its probe sequence.
    Vacant { index: usize, probes: usize },
    /// The key is absent and every bucket is occupied.
    Exhausted,
}

/// A fixed-capacity hash table mapping strings to values of any type.
///
/// ## Example
/// ```
/// use pico_asm::store::{InsertErr, LookupErr, Store};
///
/// let mut store = Store::new();
/// store.insert("LOOP", 3u8).unwrap();
///
/// assert_eq!(store.get::<u8>("LOOP"), Ok(&3));
/// assert_eq!(store.get::<u8>("END"), Err(LookupErr::NotFound));
/// assert_eq!(store.get::<u16>("LOOP"), Err(LookupErr::SizeMismatch));
/// assert_eq!(store.insert("LOOP", 4u8), Err(InsertErr::AlreadyPresent));
/// ```
pub struct Store {
    slots: Box<[Option<Slot>]>,
    len: usize,
}

impl Store {
    /// Creates a store with [`DEFAULT_CAPACITY`] buckets.
    pub fn new() -> Self {
        Self::alloc(DEFAULT_CAPACITY)
    }

    /// Creates a store with the given number of buckets.
    ///
    /// The capacity must be a non-zero power of two.
    /// It should also be well above the number of entries expected,
    /// since the store never grows.
    pub fn with_capacity(capacity: usize) -> Result<Self, AllocErr> {
        match capacity.is_power_of_two() {
            true  => Ok(Self::alloc(capacity)),
            false => Err(AllocErr::InvalidCapacity(capacity)),
        }
    }

    fn alloc(capacity: usize) -> Self {
        let slots = std::iter::repeat_with(|| None)
            .take(capacity)
            .collect();

        Store { slots, len: 0 }
    }

    /// The number of buckets.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// The number of entries.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the store has no entries.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn mask(&self) -> usize {
        self.capacity() - 1
    }

    /// Walks the probe sequence of `key` from its home bucket.
    fn probe(&self, key: &str, hash: u32) -> Probe {
        let mut index = hash as usize & self.mask();

        for probes in 1..=self.capacity() {
            match &self.slots[index] {
                None => return Probe::Vacant { index, probes },
                Some(slot) if slot.matches(key, hash) => return Probe::Found { index, probes },
                Some(_) => index = (index + 1) & self.mask(),
            }
        }

        Probe::Exhausted
    }

    /// Inserts a value at the given key.
    ///
    /// This fails if the key is already present (the stored value is left untouched)
    /// or if the store is full.
    pub fn insert<V: Any>(&mut self, key: &str, value: V) -> Result<(), InsertErr> {
        let hash = fnv1a32(key);
        let value_size = std::mem::size_of::<V>();

        match self.probe(key, hash) {
            Probe::Vacant { index, .. } => {
                self.slots[index] = Some(Slot {
                    key: key.into(),
                    hash,
                    value: Box::new(value),
                    value_size,
                });
                self.len += 1;
                Ok(())
            },
            Probe::Found { index, .. } => match &self.slots[index] {
                Some(slot) if slot.value_size != value_size => Err(InsertErr::SizeMismatch),
                _ => Err(InsertErr::AlreadyPresent),
            },
            Probe::Exhausted => Err(InsertErr::Full),
        }
    }

    /// Gets a reference to the value at the given key.
    pub fn get<V: Any>(&self, key: &str) -> Result<&V, LookupErr> {
        let Probe::Found { index, .. } = self.probe(key, fnv1a32(key)) else {
            return Err(LookupErr::NotFound);
        };
        let Some(slot) = &self.slots[index] else {
            unreachable!("probe should only return occupied buckets as found");
        };

        if slot.value_size != std::mem::size_of::<V>() {
            return Err(LookupErr::SizeMismatch);
        }
        slot.value.downcast_ref().ok_or(LookupErr::TypeMismatch)
    }

    /// Whether the key is present.
    pub fn contains_key(&self, key: &str) -> bool {
        matches!(self.probe(key, fnv1a32(key)), Probe::Found { .. })
    }

    /// Iterates over every entry whose value is of type `V`, in bucket order.
    pub fn iter<V: Any>(&self) -> impl Iterator<Item=(&str, &V)> + '_ {
        self.slots.iter()
            .flatten()
            .filter_map(|slot| Some((&*slot.key, slot.value.downcast_ref()?)))
    }
}
impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}
impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("capacity", &self.capacity())
            .field("len", &self.len)
            .finish_non_exhaustive()
    }
}
