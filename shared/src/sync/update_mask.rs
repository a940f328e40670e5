use std::ops::{BitOr, BitOrAssign};

/// Sections of a performance's state that still need to reach a connection
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UpdateMask(u8);

impl UpdateMask {
    pub const NONE: UpdateMask = UpdateMask(0);
    /// Extra object, time factor and the first constraint block
    pub const INITIAL: UpdateMask = UpdateMask(1);
    /// Marks, state and elapsed time
    pub const STATE: UpdateMask = UpdateMask(2);
    /// The constraint block again, after zoning in or a remap
    pub const SYNC: UpdateMask = UpdateMask(4);

    pub fn contains(&self, other: UpdateMask) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn intersects(&self, other: UpdateMask) -> bool {
        self.0 & other.0 != 0
    }

    pub fn insert(&mut self, other: UpdateMask) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: UpdateMask) {
        self.0 &= !other.0;
    }

    pub fn clear(&mut self) {
        self.0 = 0;
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

impl BitOr for UpdateMask {
    type Output = UpdateMask;

    fn bitor(self, rhs: UpdateMask) -> UpdateMask {
        UpdateMask(self.0 | rhs.0)
    }
}

impl BitOrAssign for UpdateMask {
    fn bitor_assign(&mut self, rhs: UpdateMask) {
        self.0 |= rhs.0;
    }
}
