//! Opcode tables shared by both cores.
//!
//! A table is an ordered list of [`OpcodeEntry`] records. Each record couples a [`Pattern`] (the
//! bits that must be set, and which bits are looked at) with the kind of instruction it selects.
//! Resolution is a linear scan that returns the first record whose pattern matches, so the order
//! records are inserted in is their priority.

use std::fmt;

/// A bitmask pattern. An opcode matches when `opcode & mask == value`.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, derive_more::Display)]
#[display("{value:0>4X}/{mask:0>4X}")]
pub struct Pattern {
    pub mask: u16,
    pub value: u16,
}

impl Pattern {
    /// Constructs a pattern. The match value can not have bits outside of the mask, as such a
    /// pattern could never match anything.
    pub const fn new(mask: u16, value: u16) -> Self {
        assert!(value & !mask == 0, "pattern value has bits outside of its mask");
        Self { mask, value }
    }

    pub const fn matches(&self, opcode: u16) -> bool {
        opcode & self.mask == self.value
    }

    /// Returns if there is at least one opcode that both patterns match. This is the case when
    /// the patterns agree on every bit that both of them look at.
    pub const fn overlaps(&self, other: &Pattern) -> bool {
        let shared = self.mask & other.mask;
        self.value & shared == other.value & shared
    }
}

/// One record in an [`OpcodeTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpcodeEntry<K> {
    pub pattern: Pattern,
    pub kind: K,
}

/// An ordered, immutable list of opcode patterns. Tables are built once through [`TableBuilder`]
/// and are typically stored in a `LazyLock` static by the core that owns them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpcodeTable<K> {
    entries: Vec<OpcodeEntry<K>>,
}

impl<K: Copy> OpcodeTable<K> {
    pub fn builder() -> TableBuilder<K> {
        TableBuilder::new()
    }

    /// Resolves an opcode to the kind of the first entry whose pattern matches it. `None` means
    /// the opcode is not part of the instruction set.
    pub fn fetch(&self, opcode: u16) -> Option<K> {
        self.entry_for(opcode).map(|entry| entry.kind)
    }

    /// Like [`OpcodeTable::fetch`], but returns the whole matching record.
    pub fn entry_for(&self, opcode: u16) -> Option<&OpcodeEntry<K>> {
        self.entries.iter().find(|entry| entry.pattern.matches(opcode))
    }

    pub fn entries(&self) -> &[OpcodeEntry<K>] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Lists the index pairs `(earlier, later)` of every two entries that can match the same
    /// opcode. For those pairs, the earlier entry always wins.
    pub fn overlaps(&self) -> Vec<(usize, usize)> {
        let mut digest = Vec::new();
        for (i, a) in self.entries.iter().enumerate() {
            for (j, b) in self.entries.iter().enumerate().skip(i + 1) {
                if a.pattern.overlaps(&b.pattern) {
                    digest.push((i, j));
                }
            }
        }
        digest
    }
}

impl<K: fmt::Display> fmt::Display for OpcodeTable<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, entry) in self.entries.iter().enumerate() {
            writeln!(f, "{i:>3} | {} | {}", entry.pattern, entry.kind)?;
        }
        Ok(())
    }
}

/// Builds an [`OpcodeTable`]. Entries keep their insertion order.
#[derive(Debug, Clone)]
pub struct TableBuilder<K> {
    entries: Vec<OpcodeEntry<K>>,
}

impl<K> Default for TableBuilder<K> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<K> TableBuilder<K> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entry(mut self, mask: u16, value: u16, kind: K) -> Self {
        self.entries.push(OpcodeEntry {
            pattern: Pattern::new(mask, value),
            kind,
        });
        self
    }

    pub fn build(self) -> OpcodeTable<K> {
        OpcodeTable {
            entries: self.entries,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Kind {
        Halt,
        Load,
        Anything,
    }

    fn table() -> OpcodeTable<Kind> {
        OpcodeTable::builder()
            .entry(0xFF, 0x76, Kind::Halt)
            .entry(0xC0, 0x40, Kind::Load)
            .entry(0x00, 0x00, Kind::Anything)
            .build()
    }

    #[test]
    fn first_match_wins() {
        let table = table();
        assert_eq!(table.fetch(0x76), Some(Kind::Halt));
        assert_eq!(table.fetch(0x77), Some(Kind::Load));
        assert_eq!(table.fetch(0x40), Some(Kind::Load));
        assert_eq!(table.fetch(0x00), Some(Kind::Anything));
    }

    #[test]
    fn no_match_is_none() {
        let table = OpcodeTable::builder().entry(0xFF, 0x00, Kind::Halt).build();
        assert_eq!(table.fetch(0x01), None);
        assert!(!table.is_empty());
    }

    #[test]
    fn overlap_detection() {
        let table = table();
        assert_eq!(table.overlaps(), vec![(0, 1), (0, 2), (1, 2)]);
        let a = Pattern::new(0xF00F, 0x8004);
        let b = Pattern::new(0xF00F, 0x8005);
        assert!(!a.overlaps(&b));
        assert!(a.overlaps(&Pattern::new(0xF000, 0x8000)));
    }

    #[test]
    #[should_panic]
    fn value_outside_mask() {
        let _ = Pattern::new(0xF000, 0x0001);
    }
}
