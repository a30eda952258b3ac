// Copyright 2024 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! Core allocation bitmaps.
//!
//! A job credential carries one bitmap over the *global* bit space obtained by
//! walking the run-length shape arrays node by node; projection slices out the
//! half-open interval belonging to a single node and re-bases it at zero.

use core::ops::Range;

use packable::{
    error::{UnpackError, UnpackErrorExt},
    packer::Packer,
    unpacker::Unpacker,
    Packable,
};
use roaring::RoaringBitmap;

use crate::error::Error;

/// A fixed-width bitmap of allocated cores.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CoreBitmap {
    bits: RoaringBitmap,
    len: u32,
}

impl CoreBitmap {
    /// Creates an empty bitmap over `len` bits.
    pub fn new(len: u32) -> Self {
        Self {
            bits: RoaringBitmap::new(),
            len,
        }
    }

    /// Width of the bit space.
    pub fn len(&self) -> u32 {
        self.len
    }

    /// Returns whether no bit is set.
    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// Number of set bits.
    pub fn count(&self) -> u64 {
        self.bits.len()
    }

    /// Sets the bit at `index`.
    pub fn set(&mut self, index: u32) {
        debug_assert!(index < self.len);
        self.bits.insert(index);
    }

    /// Sets every bit in `range`.
    pub fn set_range(&mut self, range: Range<u32>) {
        debug_assert!(range.end <= self.len);
        self.bits.insert_range(range);
    }

    /// Returns whether the bit at `index` is set.
    pub fn test(&self, index: u32) -> bool {
        self.bits.contains(index)
    }

    /// Copies `range` out into a fresh bitmap re-based at zero.
    pub fn slice(&self, range: Range<u32>) -> Self {
        let mut out = Self::new(range.end.saturating_sub(range.start));
        for bit in self.bits.iter() {
            if bit >= range.end {
                break;
            }
            if bit >= range.start {
                out.bits.insert(bit - range.start);
            }
        }

        out
    }

    /// Number of set bits within `range`.
    pub fn count_range(&self, range: Range<u32>) -> u64 {
        self.slice(range).count()
    }

    /// Formats the set bits as a comma-separated range list, e.g. `0-2,7,12-14`.
    pub fn fmt_ranges(&self) -> String {
        let mut out = String::new();
        let mut bits = self.bits.iter().peekable();

        while let Some(start) = bits.next() {
            let mut end = start;
            while bits.peek() == Some(&(end + 1)) {
                end = bits.next().unwrap();
            }
            if !out.is_empty() {
                out.push(',');
            }
            if start == end {
                out.push_str(&start.to_string());
            } else {
                out.push_str(&format!("{start}-{end}"));
            }
        }

        out
    }
}

impl Packable for CoreBitmap {
    type UnpackError = Error;
    type UnpackVisitor = ();

    fn pack<P: Packer>(&self, packer: &mut P) -> Result<(), P::Error> {
        self.len.pack(packer)?;
        (self.bits.len() as u32).pack(packer)?;
        for bit in self.bits.iter() {
            bit.pack(packer)?;
        }

        Ok(())
    }

    fn unpack<U: Unpacker, const VERIFY: bool>(
        unpacker: &mut U,
        _visitor: &Self::UnpackVisitor,
    ) -> Result<Self, UnpackError<Self::UnpackError, U::Error>> {
        let len = u32::unpack::<_, VERIFY>(unpacker, &()).coerce()?;
        let count = u32::unpack::<_, VERIFY>(unpacker, &()).coerce()?;

        if VERIFY && count > len {
            return Err(UnpackError::Packable(Error::Decode(format!(
                "bitmap claims {count} set bits over {len}"
            ))));
        }

        let mut bitmap = Self::new(len);
        let mut previous = None;
        for _ in 0..count {
            let bit = u32::unpack::<_, VERIFY>(unpacker, &()).coerce()?;
            if VERIFY && (bit >= len || previous.is_some_and(|p| bit <= p)) {
                return Err(UnpackError::Packable(Error::Decode(format!(
                    "bitmap bit {bit} out of order or out of range"
                ))));
            }
            previous = Some(bit);
            bitmap.bits.insert(bit);
        }

        Ok(bitmap)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_ranges_without_brackets() {
        let mut bm = CoreBitmap::new(16);
        bm.set_range(0..3);
        bm.set(7);
        bm.set_range(12..15);

        assert_eq!(bm.fmt_ranges(), "0-2,7,12-14");
    }

    #[test]
    fn slice_rebases_at_zero() {
        let mut bm = CoreBitmap::new(8);
        bm.set_range(4..8);

        let slice = bm.slice(4..8);

        assert_eq!(slice.len(), 4);
        assert_eq!(slice.fmt_ranges(), "0-3");
        assert_eq!(slice.count(), bm.count_range(4..8));
    }

    #[test]
    fn empty_bitmap_formats_empty() {
        assert_eq!(CoreBitmap::new(8).fmt_ranges(), "");
    }
}
