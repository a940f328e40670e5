use std::ops::{BitAnd, BitOr, BitOrAssign};

use choreo_serde::{BitReader, BitWrite, ConstBitLength, Serde, SerdeErr, UnsignedInteger};

/// One-shot requests posted to a performance, replicated as a 4-bit set
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Marks(u8);

impl Marks {
    pub const NONE: Marks = Marks(0);
    pub const ACTIVATE: Marks = Marks(1);
    pub const SHUTDOWN: Marks = Marks(2);
    pub const DEACTIVATE: Marks = Marks(4);
    pub const INTERRUPT: Marks = Marks(8);
    /// Any mark that ends a performance
    pub const STOP: Marks = Marks(2 | 4 | 8);
    const ALL: u8 = 0b1111;

    pub fn from_bits(bits: u8) -> Self {
        Marks(bits & Self::ALL)
    }

    pub fn bits(&self) -> u8 {
        self.0
    }

    pub fn contains(&self, other: Marks) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn intersects(&self, other: Marks) -> bool {
        self.0 & other.0 != 0
    }

    pub fn insert(&mut self, other: Marks) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: Marks) {
        self.0 &= !other.0;
    }

    pub fn difference(&self, other: Marks) -> Marks {
        Marks(self.0 & !other.0)
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

impl BitOr for Marks {
    type Output = Marks;

    fn bitor(self, rhs: Marks) -> Marks {
        Marks(self.0 | rhs.0)
    }
}

impl BitOrAssign for Marks {
    fn bitor_assign(&mut self, rhs: Marks) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for Marks {
    type Output = Marks;

    fn bitand(self, rhs: Marks) -> Marks {
        Marks(self.0 & rhs.0)
    }
}

impl Serde for Marks {
    fn ser(&self, writer: &mut dyn BitWrite) {
        UnsignedInteger::<4>::new(self.0).ser(writer);
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        let bits: u8 = UnsignedInteger::<4>::de(reader)?.to();
        Ok(Marks(bits))
    }

    fn bit_length(&self) -> u32 {
        <Self as ConstBitLength>::const_bit_length()
    }
}

impl ConstBitLength for Marks {
    fn const_bit_length() -> u32 {
        <UnsignedInteger<4> as ConstBitLength>::const_bit_length()
    }
}

/// Marks waiting to be consumed, plus every mark ever posted.
///
/// Only the history goes over the wire. A replica turns history bits it has
/// not seen before into pending marks, so duplicate delivery is harmless.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MarkSet {
    pending: Marks,
    history: Marks,
}

impl MarkSet {
    pub fn post(&mut self, marks: Marks) {
        self.pending |= marks;
        self.history |= marks;
    }

    /// Consumes `marks` if all of them are pending
    pub fn take(&mut self, marks: Marks) -> bool {
        if !self.pending.contains(marks) {
            return false;
        }
        self.pending.remove(marks);
        true
    }

    /// Consumes whichever of `marks` are pending and returns them
    pub fn take_any(&mut self, marks: Marks) -> Marks {
        let hit = self.pending & marks;
        self.pending.remove(hit);
        hit
    }

    pub fn absorb_remote(&mut self, remote: Marks) {
        let fresh = remote.difference(self.history);
        self.pending |= fresh;
        self.history |= remote;
    }

    /// Adopts `history` without treating any of it as a new request
    pub fn replace_history(&mut self, history: Marks) {
        self.history = history;
        self.pending = Marks::NONE;
    }

    pub fn pending(&self) -> Marks {
        self.pending
    }

    pub fn history(&self) -> Marks {
        self.history
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PerformanceState {
    Inactive,
    Active,
    Cleanup,
    Done,
    /// Replica created for a connection that was not zoned in yet
    Late,
}

impl Serde for PerformanceState {
    fn ser(&self, writer: &mut dyn BitWrite) {
        let index: u8 = match self {
            PerformanceState::Inactive => 0,
            PerformanceState::Active => 1,
            PerformanceState::Cleanup => 2,
            PerformanceState::Done => 3,
            PerformanceState::Late => 4,
        };
        UnsignedInteger::<3>::new(index).ser(writer);
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        let index: u8 = UnsignedInteger::<3>::de(reader)?.to();
        match index {
            0 => Ok(PerformanceState::Inactive),
            1 => Ok(PerformanceState::Active),
            2 => Ok(PerformanceState::Cleanup),
            3 => Ok(PerformanceState::Done),
            4 => Ok(PerformanceState::Late),
            _ => Err(SerdeErr),
        }
    }

    fn bit_length(&self) -> u32 {
        <UnsignedInteger<3> as ConstBitLength>::const_bit_length()
    }
}
