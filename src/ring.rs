//! 32-bit ring arithmetic and single-bit boolean values.
//!
//! `Ring` is the only numeric type the circuit, preprocessing and evaluators
//! operate on: everything is `Z/2^32`, wrap-around, no dynamic field choice
//! (see spec Non-goals).

use std::fmt;
use std::ops::{Add, AddAssign, BitAnd, BitXor, Neg, Not, Shl, Shr, Sub, SubAssign};

/// An element of `Z/2^32`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "enable-serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Ring(pub u32);

impl Ring {
    pub const ZERO: Ring = Ring(0);
    pub const ONE: Ring = Ring(1);

    #[must_use]
    pub fn wrapping_mul(self, rhs: Ring) -> Ring {
        Ring(self.0.wrapping_mul(rhs.0))
    }

    #[must_use]
    pub fn to_le_bytes(self) -> [u8; 4] {
        self.0.to_le_bytes()
    }

    #[must_use]
    pub fn from_le_bytes(b: [u8; 4]) -> Ring {
        Ring(u32::from_le_bytes(b))
    }
}

impl From<u32> for Ring {
    fn from(v: u32) -> Self {
        Ring(v)
    }
}

impl From<Ring> for u32 {
    fn from(v: Ring) -> Self {
        v.0
    }
}

impl Add for Ring {
    type Output = Ring;
    fn add(self, rhs: Ring) -> Ring {
        Ring(self.0.wrapping_add(rhs.0))
    }
}

impl AddAssign for Ring {
    fn add_assign(&mut self, rhs: Ring) {
        self.0 = self.0.wrapping_add(rhs.0);
    }
}

impl Sub for Ring {
    type Output = Ring;
    fn sub(self, rhs: Ring) -> Ring {
        Ring(self.0.wrapping_sub(rhs.0))
    }
}

impl SubAssign for Ring {
    fn sub_assign(&mut self, rhs: Ring) {
        self.0 = self.0.wrapping_sub(rhs.0);
    }
}

impl Neg for Ring {
    type Output = Ring;
    fn neg(self) -> Ring {
        Ring(0u32.wrapping_sub(self.0))
    }
}

impl Not for Ring {
    type Output = Ring;
    fn not(self) -> Ring {
        Ring(!self.0)
    }
}

impl BitAnd for Ring {
    type Output = Ring;
    fn bitand(self, rhs: Ring) -> Ring {
        Ring(self.0 & rhs.0)
    }
}

impl BitXor for Ring {
    type Output = Ring;
    fn bitxor(self, rhs: Ring) -> Ring {
        Ring(self.0 ^ rhs.0)
    }
}

impl Shl<u32> for Ring {
    type Output = Ring;
    fn shl(self, rhs: u32) -> Ring {
        Ring(self.0 << rhs)
    }
}

impl Shr<u32> for Ring {
    type Output = Ring;
    fn shr(self, rhs: u32) -> Ring {
        Ring(self.0 >> rhs)
    }
}

impl fmt::Display for Ring {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single secret-shared bit, stored as a `Ring` whose value is always 0 or
/// 1. Kept as a distinct type (rather than a raw `bool`) so `ConvertB2A` is
/// the only place arithmetic and boolean semantics mix, per the teacher's
/// "encode the distinction in the type" discipline.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "enable-serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BoolRing(pub bool);

impl BoolRing {
    pub const ZERO: BoolRing = BoolRing(false);
    pub const ONE: BoolRing = BoolRing(true);

    #[must_use]
    pub fn as_ring(self) -> Ring {
        Ring(u32::from(self.0))
    }
}

impl From<bool> for BoolRing {
    fn from(v: bool) -> Self {
        BoolRing(v)
    }
}

impl BitXor for BoolRing {
    type Output = BoolRing;
    fn bitxor(self, rhs: BoolRing) -> BoolRing {
        BoolRing(self.0 ^ rhs.0)
    }
}

impl BitAnd for BoolRing {
    type Output = BoolRing;
    fn bitand(self, rhs: BoolRing) -> BoolRing {
        BoolRing(self.0 & rhs.0)
    }
}

impl Not for BoolRing {
    type Output = BoolRing;
    fn not(self) -> BoolRing {
        BoolRing(!self.0)
    }
}

/// Packs a dense bit array into an octet buffer, LSB-first: bit `i` of byte
/// `k` encodes element `8*k + i`. The final byte is zero-padded.
#[must_use]
pub fn pack(bits: &[BoolRing]) -> Vec<u8> {
    let mut out = vec![0u8; bits.len().div_ceil(8)];
    for (i, b) in bits.iter().enumerate() {
        if b.0 {
            out[i / 8] |= 1 << (i % 8);
        }
    }
    out
}

/// Inverse of [`pack`], truncated at `len` elements.
#[must_use]
pub fn unpack(bytes: &[u8], len: usize) -> Vec<BoolRing> {
    (0..len)
        .map(|i| BoolRing((bytes[i / 8] >> (i % 8)) & 1 == 1))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ring_wraps() {
        let a = Ring(u32::MAX);
        assert_eq!(a + Ring(1), Ring(0));
        assert_eq!(Ring(0) - Ring(1), Ring(u32::MAX));
    }

    #[test]
    fn pack_unpack_roundtrip() {
        let bits: Vec<BoolRing> = [true, false, false, true, true, true, false, false, true]
            .into_iter()
            .map(BoolRing)
            .collect();
        let packed = pack(&bits);
        assert_eq!(packed.len(), 2);
        let unpacked = unpack(&packed, bits.len());
        assert_eq!(bits, unpacked);
    }

    #[test]
    fn pack_is_lsb_first() {
        let bits = vec![BoolRing(true), BoolRing(false), BoolRing(true)];
        let packed = pack(&bits);
        assert_eq!(packed, vec![0b0000_0101]);
    }
}
