mod effectron;
mod marks;
mod performance;
mod performance_core;
mod selectron;

pub use effectron::Effectron;
pub use marks::{MarkSet, Marks, PerformanceState};
pub use performance::{Performance, PerformanceKind, ProcessContext, StateChange};
pub use performance_core::PerformanceCore;
pub use selectron::Selectron;
