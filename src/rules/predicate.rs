//! Per-kind guard attributes, stored two bits per kind.
//!
//! A `Predicate` holds one `Attribute` for every background (or sprite)
//! kind in the project. Storage is already in wire form: four kinds per
//! byte, kind `i` in byte `i / 4` at bit offset `2 * (i % 4)`, so packing a
//! predicate is a raw byte copy.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Requirement a guard places on one entity kind at a tile.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Attribute {
    /// No constraint.
    #[default]
    DontCare = 0,
    /// The kind must be present.
    Include = 1,
    /// Member of the alternate inclusion set.
    Include2 = 2,
    /// The kind must be absent.
    Exclude = 3,
}

impl Attribute {
    pub const ALL: [Attribute; 4] = [
        Attribute::DontCare,
        Attribute::Include,
        Attribute::Include2,
        Attribute::Exclude,
    ];

    /// Decode from the low two bits.
    #[must_use]
    pub const fn from_bits(bits: u8) -> Self {
        match bits & 0x3 {
            0 => Self::DontCare,
            1 => Self::Include,
            2 => Self::Include2,
            _ => Self::Exclude,
        }
    }

    #[must_use]
    pub const fn bits(self) -> u8 {
        self as u8
    }

    /// Short label used in rule dumps.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::DontCare => "ok",
            Self::Include => "include",
            Self::Include2 => "include2",
            Self::Exclude => "exclude",
        }
    }
}

/// Bytes needed to pack `kinds` two-bit attributes.
#[must_use]
pub const fn packed_len(kinds: usize) -> usize {
    (kinds + 3) / 4
}

/// Attributes for every kind of one family (backgrounds or sprites).
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Predicate {
    len: usize,
    bytes: SmallVec<[u8; 4]>,
}

impl Predicate {
    /// A predicate over `len` kinds, all `DontCare`.
    #[must_use]
    pub fn new(len: usize) -> Self {
        Self {
            len,
            bytes: SmallVec::from_elem(0, packed_len(len)),
        }
    }

    /// Rebuild a predicate from its packed bytes.
    ///
    /// Padding bits past the last kind are cleared so that equality only
    /// reflects real attributes.
    ///
    /// Panics if `bytes` is not exactly `packed_len(len)` long.
    #[must_use]
    pub fn from_bytes(bytes: &[u8], len: usize) -> Self {
        assert_eq!(
            bytes.len(),
            packed_len(len),
            "predicate over {len} kinds needs {} bytes",
            packed_len(len)
        );
        let mut bytes: SmallVec<[u8; 4]> = SmallVec::from_slice(bytes);
        let used = len % 4;
        if used != 0 {
            if let Some(last) = bytes.last_mut() {
                *last &= (1u8 << (used * 2)) - 1;
            }
        }
        Self { len, bytes }
    }

    /// Number of kinds covered.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Attribute for `kind`, or `None` if out of range.
    #[must_use]
    pub fn get(&self, kind: usize) -> Option<Attribute> {
        if kind >= self.len {
            return None;
        }
        let shift = (kind % 4) * 2;
        Some(Attribute::from_bits(self.bytes[kind / 4] >> shift))
    }

    /// Set the attribute for `kind`, returning the previous one.
    ///
    /// Returns `None` and changes nothing if `kind` is out of range.
    pub fn set(&mut self, kind: usize, attr: Attribute) -> Option<Attribute> {
        let previous = self.get(kind)?;
        let shift = (kind % 4) * 2;
        let byte = &mut self.bytes[kind / 4];
        *byte = (*byte & !(0x3 << shift)) | (attr.bits() << shift);
        Some(previous)
    }

    /// Iterate over attributes in ascending kind order.
    pub fn iter(&self) -> impl Iterator<Item = Attribute> + '_ {
        (0..self.len).filter_map(move |kind| self.get(kind))
    }

    /// Kinds carrying `attr`, ascending.
    pub fn kinds_with(&self, attr: Attribute) -> impl Iterator<Item = usize> + '_ {
        self.iter()
            .enumerate()
            .filter(move |(_, a)| *a == attr)
            .map(|(kind, _)| kind)
    }

    /// Whether every kind is `DontCare`.
    #[must_use]
    pub fn is_vacuous(&self) -> bool {
        self.bytes.iter().all(|&b| b == 0)
    }

    /// Number of kinds with a constraint.
    #[must_use]
    pub fn constrained(&self) -> usize {
        self.iter().filter(|a| *a != Attribute::DontCare).count()
    }

    /// Packed wire bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packed_len() {
        assert_eq!(packed_len(0), 0);
        assert_eq!(packed_len(1), 1);
        assert_eq!(packed_len(4), 1);
        assert_eq!(packed_len(5), 2);
        assert_eq!(packed_len(12), 3);
    }

    #[test]
    fn test_get_set() {
        let mut pred = Predicate::new(6);
        assert!(pred.is_vacuous());
        assert_eq!(pred.set(5, Attribute::Exclude), Some(Attribute::DontCare));
        assert_eq!(pred.set(1, Attribute::Include), Some(Attribute::DontCare));
        assert_eq!(pred.get(5), Some(Attribute::Exclude));
        assert_eq!(pred.get(1), Some(Attribute::Include));
        assert_eq!(pred.get(0), Some(Attribute::DontCare));
        assert!(!pred.is_vacuous());
        assert_eq!(pred.constrained(), 2);
    }

    #[test]
    fn test_out_of_range() {
        let mut pred = Predicate::new(3);
        assert_eq!(pred.get(3), None);
        assert_eq!(pred.set(3, Attribute::Include), None);
        assert!(pred.is_vacuous());
    }

    #[test]
    fn test_bit_layout_is_low_bits_first() {
        let mut pred = Predicate::new(4);
        pred.set(0, Attribute::Include);
        pred.set(3, Attribute::Exclude);
        assert_eq!(pred.as_bytes(), &[0b1100_0001]);
    }

    #[test]
    fn test_from_bytes_clears_padding() {
        let pred = Predicate::from_bytes(&[0xFF], 2);
        assert_eq!(pred.as_bytes(), &[0x0F]);
        assert_eq!(pred, {
            let mut p = Predicate::new(2);
            p.set(0, Attribute::Exclude);
            p.set(1, Attribute::Exclude);
            p
        });
    }

    #[test]
    fn test_kinds_with() {
        let mut pred = Predicate::new(8);
        pred.set(2, Attribute::Include2);
        pred.set(6, Attribute::Include2);
        pred.set(4, Attribute::Include);
        let kinds: Vec<_> = pred.kinds_with(Attribute::Include2).collect();
        assert_eq!(kinds, vec![2, 6]);
    }
}
