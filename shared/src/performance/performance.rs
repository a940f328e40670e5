use choreo_serde::{BitReader, BitWrite, ConstBitLength, Serde, SerdeErr, UnsignedInteger};
use log::{debug, info};

use crate::{
    choreographer::Choreographer,
    constraint::ConstraintDef,
    effect::{EffectFactory, NamedEffects},
    math::Transform,
    performance::{Marks, PerformanceCore, PerformanceState},
    phrase::Phrase,
    scene::SceneQuery,
    sync::{
        ConstraintInfo, GhostLookup, GhostResolve, InitialSection, NetObjectRef,
        PerformanceUpdate, StateSection, UpdateMask,
    },
    types::{ChoreographerId, HostType, TemplateIndex},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PerformanceKind {
    Effectron,
    Selectron,
}

impl Serde for PerformanceKind {
    fn ser(&self, writer: &mut dyn BitWrite) {
        let index: u8 = match self {
            PerformanceKind::Effectron => 0,
            PerformanceKind::Selectron => 1,
        };
        UnsignedInteger::<1>::new(index).ser(writer);
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        let index: u8 = UnsignedInteger::<1>::de(reader)?.to();
        match index {
            0 => Ok(PerformanceKind::Effectron),
            _ => Ok(PerformanceKind::Selectron),
        }
    }

    fn bit_length(&self) -> u32 {
        <UnsignedInteger<1> as ConstBitLength>::const_bit_length()
    }
}

/// Collaborators a performance needs while it is processed
pub struct ProcessContext<'a> {
    pub host: HostType,
    pub now_ms: u64,
    pub scene: &'a dyn SceneQuery,
    pub factory: &'a dyn EffectFactory,
    pub named_effects: &'a mut NamedEffects,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StateChange {
    pub from: PerformanceState,
    pub to: PerformanceState,
}

/// A choreographer with a state machine: an Effectron or a Selectron.
///
/// Implementors supply the phrase handling for each state; the transition
/// rules, late-join recovery and replication are shared.
pub trait Performance {
    fn kind(&self) -> PerformanceKind;
    fn template_index(&self) -> TemplateIndex;
    fn template_name(&self) -> &str;
    fn exec_on_new_clients(&self) -> bool;
    fn choreographer(&self) -> &Choreographer;
    fn choreographer_mut(&mut self) -> &mut Choreographer;
    fn core(&self) -> &PerformanceCore;
    fn core_mut(&mut self) -> &mut PerformanceCore;
    fn constraint_defs(&self) -> Vec<ConstraintDef>;

    /// The Active state's main phrase has run out and cannot loop again
    fn state_expired(&mut self, ctx: &ProcessContext) -> bool;
    /// Every phrase has finished
    fn cleanup_over(&self) -> bool;
    fn enter_state(&mut self, state: PerformanceState, ctx: &ProcessContext);
    fn leave_state(&mut self, state: PerformanceState, ctx: &ProcessContext);
    fn update_phrases(&mut self, dt: f32, ctx: &ProcessContext);
    fn phrases(&self) -> Vec<&Phrase>;
    fn interrupt_phrases(&mut self);

    fn id(&self) -> ChoreographerId {
        self.choreographer().id()
    }

    fn state(&self) -> PerformanceState {
        self.core().state()
    }

    fn elapsed(&self) -> f32 {
        self.core().elapsed()
    }

    /// Every mark ever posted, as replicated
    fn marks(&self) -> Marks {
        self.core().marks().history()
    }

    fn pending_marks(&self) -> Marks {
        self.core().marks().pending()
    }

    /// Posting the same mark again before it is consumed changes nothing
    fn post_mark(&mut self, marks: Marks) -> bool {
        if self.state() == PerformanceState::Done {
            return false;
        }
        self.core_mut().marks.post(marks);
        true
    }

    fn activate(&mut self) -> bool {
        if self.state() != PerformanceState::Inactive {
            return false;
        }
        self.post_mark(Marks::ACTIVATE)
    }

    fn interrupt(&mut self) -> bool {
        self.post_mark(Marks::INTERRUPT)
    }

    fn shutdown(&mut self) -> bool {
        self.post_mark(Marks::SHUTDOWN)
    }

    fn is_empty(&self) -> bool {
        self.phrases().iter().all(|phrase| phrase.is_empty())
    }

    fn init_constraints(&mut self, scene: &dyn SceneQuery) {
        let defs = self.constraint_defs();
        self.choreographer_mut().init_constraints(&defs, scene);
    }

    /// Second half of startup, run once the creator has attached constraints.
    /// Returns whether activation was requested.
    fn finish_startup(&mut self, scene: &dyn SceneQuery) -> bool {
        self.init_constraints(scene);
        if self.choreographer().postpone_activation() {
            debug!("choreographer {} postponed its activation", self.id());
            return false;
        }
        self.activate()
    }

    /// Next state according to pending marks and phrase progress
    fn pending_state(&mut self, ctx: &ProcessContext) -> Option<PerformanceState> {
        match self.state() {
            PerformanceState::Inactive => self.core_mut().take_inactive_transition(),
            PerformanceState::Active => {
                if self.core_mut().take_stop() || self.state_expired(ctx) {
                    Some(PerformanceState::Cleanup)
                } else {
                    None
                }
            }
            PerformanceState::Cleanup => self.cleanup_over().then_some(PerformanceState::Done),
            PerformanceState::Done | PerformanceState::Late => None,
        }
    }

    fn change_state(&mut self, next: PerformanceState, ctx: &ProcessContext) -> StateChange {
        let from = self.state();
        self.leave_state(from, ctx);
        if next == PerformanceState::Active && ctx.host == HostType::Client {
            let core = self.core_mut();
            if let Some(server_elapsed) = core.server_elapsed.take() {
                core.elapsed = server_elapsed;
            }
        }
        self.core_mut().state = next;
        self.enter_state(next, ctx);
        StateChange { from, to: next }
    }

    /// One tick: elapsed time, at most one transition, constraint sampling,
    /// phrase update and named effect publishing, in that order
    fn process(&mut self, dt: f32, ctx: &mut ProcessContext) -> Option<StateChange> {
        if self.state() == PerformanceState::Late {
            return None;
        }
        self.core_mut().advance(dt);

        let change = match self.pending_state(ctx) {
            Some(next) => Some(self.change_state(next, ctx)),
            None => None,
        };
        if self.state() == PerformanceState::Inactive {
            return change;
        }

        let choreographer = self.choreographer_mut();
        choreographer.refresh_local_constraints(ctx.scene);
        choreographer.sample_constraints(dt, ctx.now_ms, ctx.scene, &*ctx.named_effects);

        self.update_phrases(dt, ctx);

        let live: Vec<(String, Option<Transform>)> = self
            .phrases()
            .into_iter()
            .flat_map(|phrase| phrase.named_effects())
            .map(|(name, transform)| (name.to_string(), transform))
            .collect();
        self.choreographer_mut()
            .publish_named_effects(live, &mut *ctx.named_effects);

        change
    }

    /// Seconds to wait after reaching Done before the performance can be
    /// deleted without cutting off fading effects
    fn deletion_delay(&self) -> f32 {
        let elapsed = self.elapsed();
        let mut done_time = elapsed;
        for phrase in self.phrases() {
            let phrase_done = if phrase.will_stop() && phrase.is_infinite() {
                elapsed + phrase.calc_after_life()
            } else {
                phrase.calc_done_time()
            };
            done_time = done_time
                .max(phrase_done)
                .max(elapsed + phrase.calc_nominal_after_life());
        }
        (done_time - elapsed).max(0.0)
    }

    /// Releases everything the performance published. Runs while it is still
    /// registered so its id is known.
    fn teardown(&mut self, named_effects: &mut NamedEffects) {
        self.interrupt_phrases();
        let id = self.id();
        self.choreographer_mut().release_named_effects(named_effects);
        named_effects.unregister_owner(id);
    }

    // Replication

    /// Builds the sections `mask` asks for, as seen by one connection
    fn build_update(
        &self,
        mask: UpdateMask,
        zoned_in: bool,
        lookup: &dyn GhostLookup,
    ) -> PerformanceUpdate {
        let choreographer = self.choreographer();
        let pack_constraints =
            || ConstraintInfo::pack(&choreographer.effective_constraint_bindings(), lookup);

        let initial = mask.contains(UpdateMask::INITIAL).then(|| InitialSection {
            extra: choreographer
                .extra()
                .map(|extra| NetObjectRef::for_object(extra, lookup)),
            time_factor: choreographer.time_factor(),
            constraint_info: zoned_in.then(pack_constraints),
        });
        let state = mask
            .intersects(UpdateMask::STATE | UpdateMask::SYNC)
            .then(|| StateSection {
                marks: self.marks(),
                state: self.state(),
                elapsed: self.elapsed(),
            });
        let sync = (mask.contains(UpdateMask::SYNC) && initial.is_none()).then(pack_constraints);

        PerformanceUpdate {
            initial,
            state,
            sync,
        }
    }

    /// Called on a replica that is still Late when its sync event arrives
    fn sync_client(
        &mut self,
        marks: Marks,
        server_state: PerformanceState,
        elapsed: f32,
        ctx: &ProcessContext,
    ) -> Option<StateChange> {
        if self.state() != PerformanceState::Late {
            return None;
        }
        debug!(
            "replica {} catching up: server {:?} at {}s, marks {:?}",
            self.id(),
            server_state,
            elapsed,
            marks
        );
        self.core_mut().marks.replace_history(marks);

        let next = if !self.exec_on_new_clients() || marks.intersects(Marks::STOP) {
            PerformanceState::Done
        } else if marks.contains(Marks::ACTIVATE) {
            let core = self.core_mut();
            core.elapsed = elapsed;
            core.server_elapsed = None;
            PerformanceState::Active
        } else {
            PerformanceState::Inactive
        };

        self.core_mut().state = next;
        if next == PerformanceState::Active {
            self.enter_state(next, ctx);
        }
        Some(StateChange {
            from: PerformanceState::Late,
            to: next,
        })
    }

    /// Applies a decoded update to a replica
    fn apply_update(
        &mut self,
        update: &PerformanceUpdate,
        resolver: &dyn GhostResolve,
        ctx: &ProcessContext,
    ) -> Option<StateChange> {
        let mut zoned_in = true;
        if let Some(initial) = &update.initial {
            let choreographer = self.choreographer_mut();
            if let Err(err) = choreographer.set_time_factor(initial.time_factor) {
                debug!("ignoring replicated time factor: {}", err);
            }
            choreographer.set_extra(
                initial
                    .extra
                    .and_then(|extra| extra.resolve_object(resolver)),
            );
            match &initial.constraint_info {
                Some(info) => {
                    choreographer.unpack_constraint_bindings(info.resolve(resolver));
                    self.init_constraints(ctx.scene);
                }
                None => zoned_in = false,
            }
        }

        if !zoned_in && self.state() == PerformanceState::Inactive {
            info!("replica {} created before zoning in, waiting for sync", self.id());
            self.core_mut().state = PerformanceState::Late;
        }

        let mut change = None;
        if let Some(info) = &update.sync {
            self.choreographer_mut()
                .unpack_constraint_bindings(info.resolve(resolver));
            self.init_constraints(ctx.scene);
            if let Some(state) = &update.state {
                change = self.sync_client(state.marks, state.state, state.elapsed, ctx);
            }
        }

        if let Some(state) = &update.state {
            if self.state() != PerformanceState::Late && change.is_none() {
                let core = self.core_mut();
                core.marks.absorb_remote(state.marks);
                core.server_elapsed = Some(state.elapsed);
            }
        }
        change
    }
}
