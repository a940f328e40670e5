use crate::performance::{MarkSet, Marks, PerformanceState};

/// State, marks and elapsed time common to every performance
#[derive(Clone, Debug)]
pub struct PerformanceCore {
    pub(crate) state: PerformanceState,
    pub(crate) marks: MarkSet,
    pub(crate) elapsed: f32,
    // last elapsed reported by the server, seeds `elapsed` on activation
    pub(crate) server_elapsed: Option<f32>,
}

impl Default for PerformanceCore {
    fn default() -> Self {
        Self::new()
    }
}

impl PerformanceCore {
    pub fn new() -> Self {
        Self {
            state: PerformanceState::Inactive,
            marks: MarkSet::default(),
            elapsed: 0.0,
            server_elapsed: None,
        }
    }

    pub fn state(&self) -> PerformanceState {
        self.state
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn marks(&self) -> &MarkSet {
        &self.marks
    }

    pub(crate) fn advance(&mut self, dt: f32) {
        match self.state {
            PerformanceState::Inactive | PerformanceState::Late => {}
            _ => self.elapsed += dt,
        }
    }

    /// Transition out of Inactive requested by pending marks
    pub(crate) fn take_inactive_transition(&mut self) -> Option<PerformanceState> {
        if self.marks.take(Marks::ACTIVATE) {
            return Some(PerformanceState::Active);
        }
        let stop = self.marks.take_any(Marks::INTERRUPT | Marks::SHUTDOWN);
        (!stop.is_empty()).then_some(PerformanceState::Cleanup)
    }

    /// Consumes a pending Interrupt or Shutdown while Active
    pub(crate) fn take_stop(&mut self) -> bool {
        !self
            .marks
            .take_any(Marks::INTERRUPT | Marks::SHUTDOWN)
            .is_empty()
    }
}
