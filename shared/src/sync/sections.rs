use choreo_serde::{BitReader, BitWrite, Serde, SerdeErr};

use crate::{
    performance::{Marks, PerformanceState},
    sync::{ConstraintInfo, NetObjectRef},
};

/// Sent once per connection, when the replica is created
#[derive(Clone, Debug, PartialEq)]
pub struct InitialSection {
    pub extra: Option<NetObjectRef>,
    pub time_factor: f32,
    /// Present only if the connection was zoned in when the section was written
    pub constraint_info: Option<ConstraintInfo>,
}

impl InitialSection {
    pub fn zoned_in(&self) -> bool {
        self.constraint_info.is_some()
    }
}

impl Serde for InitialSection {
    fn ser(&self, writer: &mut dyn BitWrite) {
        self.extra.ser(writer);
        self.time_factor.ser(writer);
        self.constraint_info.ser(writer);
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        Ok(Self {
            extra: Option::<NetObjectRef>::de(reader)?,
            time_factor: f32::de(reader)?,
            constraint_info: Option::<ConstraintInfo>::de(reader)?,
        })
    }

    fn bit_length(&self) -> u32 {
        self.extra.bit_length() + self.time_factor.bit_length() + self.constraint_info.bit_length()
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StateSection {
    pub marks: Marks,
    pub state: PerformanceState,
    pub elapsed: f32,
}

impl Serde for StateSection {
    fn ser(&self, writer: &mut dyn BitWrite) {
        self.marks.ser(writer);
        self.state.ser(writer);
        self.elapsed.ser(writer);
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        Ok(Self {
            marks: Marks::de(reader)?,
            state: PerformanceState::de(reader)?,
            elapsed: f32::de(reader)?,
        })
    }

    fn bit_length(&self) -> u32 {
        self.marks.bit_length() + self.state.bit_length() + self.elapsed.bit_length()
    }
}

/// One performance's delta for one connection. Each section is preceded by a
/// presence bit.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PerformanceUpdate {
    pub initial: Option<InitialSection>,
    pub state: Option<StateSection>,
    /// Constraint block resent after zoning in or a remap, never alongside `initial`
    pub sync: Option<ConstraintInfo>,
}

impl PerformanceUpdate {
    pub fn is_empty(&self) -> bool {
        self.initial.is_none() && self.state.is_none() && self.sync.is_none()
    }
}

impl Serde for PerformanceUpdate {
    fn ser(&self, writer: &mut dyn BitWrite) {
        self.initial.ser(writer);
        self.state.ser(writer);
        self.sync.ser(writer);
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        Ok(Self {
            initial: Option::<InitialSection>::de(reader)?,
            state: Option::<StateSection>::de(reader)?,
            sync: Option::<ConstraintInfo>::de(reader)?,
        })
    }

    fn bit_length(&self) -> u32 {
        self.initial.bit_length() + self.state.bit_length() + self.sync.bit_length()
    }
}
