use std::fmt;

use heapless::Vec as InlineVec;
use serde::{de::Error, ser::SerializeSeq, Deserialize, Deserializer, Serializer};

/// Serializes a set of same-sized memory banks as one sequence of banks.
pub(crate) fn serialize_slices_as_one<Sl: AsRef<[u8]>, Se: Serializer>(
    slices: &[Sl],
    ser: Se,
) -> Result<Se::Ok, Se::Error> {
    let mut seq = ser.serialize_seq(Some(slices.len()))?;
    slices
        .iter()
        .map(AsRef::as_ref)
        .try_for_each(|b| seq.serialize_element(b))
        .and_then(|()| seq.end())
}

/// The inverse of [`serialize_slices_as_one`]. Fails unless there are exactly `M` banks of exactly
/// `N` bytes.
pub(crate) fn deserialize_slices_as_one<
    'de,
    const N: usize,
    const M: usize,
    De: Deserializer<'de>,
>(
    de: De,
) -> Result<[[u8; N]; M], De::Error> {
    let banks = InlineVec::<InlineVec<u8, N>, M>::deserialize(de)?;
    if banks.len() != M {
        return Err(De::Error::invalid_length(banks.len(), &"a full set of banks"));
    }
    let mut digest = [[0; N]; M];
    for (dst, bank) in digest.iter_mut().zip(banks) {
        if bank.len() != N {
            return Err(De::Error::invalid_length(bank.len(), &"a full bank"));
        }
        dst.copy_from_slice(&bank);
    }
    Ok(digest)
}

/// Formats a byte slice as a hex dump, sixteen bytes per row, each row prefixed by its offset.
///
/// ```
/// # use phantom::utils::HexDump;
/// let dump = HexDump(&[0xDE, 0xAD, 0xBE, 0xEF]).to_string();
/// assert_eq!(dump, "000000 | DE AD BE EF\n");
/// ```
#[derive(Debug, Clone, Copy)]
pub struct HexDump<'a>(pub &'a [u8]);

impl fmt::Display for HexDump<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (row, chunk) in self.0.chunks(16).enumerate() {
            write!(f, "{:0>6X} |", row * 16)?;
            for byte in chunk {
                write!(f, " {byte:0>2X}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Returns if the bit `B` is set in the given byte.
pub(crate) const fn check_bit_const<const B: u8>(val: u8) -> bool {
    val & (1 << B) != 0
}

pub(crate) const fn check_bit(val: u8, bit: u8) -> bool {
    val & (1 << bit) != 0
}

/// Returns `1 << B` if the flag is set, otherwise `0`.
pub(crate) const fn bool_to_mask<const B: u8>(flag: bool) -> u8 {
    (flag as u8) << B
}
