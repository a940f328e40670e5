mod constraint_info;
mod net_object;
mod packet;
mod sections;
mod update_mask;

pub use constraint_info::{ConstraintInfo, ConstraintInfoEntry, NetBinding};
pub use net_object::{GhostLookup, GhostResolve, NetObjectRef};
pub use packet::{ChoreographyMessage, ChoreographyPacket};
pub use sections::{InitialSection, PerformanceUpdate, StateSection};
pub use update_mask::UpdateMask;
