use std::{collections::HashMap, vec::IntoIter};

use log::{debug, info, warn};

use choreo_shared::{
    constraint::SELECTED_CONSTRAINT, ChoreographerId, ChoreographyEvent, ChoreographyEvents,
    ChoreographyMessage, ChoreographyPacket, ConnectionKey, Directory, EffectFactory, Effectron,
    EventQueue, GhostLookup, HostType, NamedEffects, ObjectRef, Performance, PerformanceState,
    ProcessContext, Protocol, SceneQuery, SelectionRegistry, Selectron, UpdateMask,
};

use crate::{
    connection::Connection, server::ServerConfig, ChoreoServerError, ViewersMut, ViewersRef,
};

/// Work a performance asked to have done at a later tick
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum DeferredEvent {
    FinishStartup(ChoreographerId),
    Delete(ChoreographerId),
}

/// The authoritative choreography session.
///
/// Owns every live performance, advances them on a fixed tick and tracks what
/// each connection still needs to hear about them.
pub struct ChoreoServer {
    config: ServerConfig,
    protocol: Protocol,
    factory: Box<dyn EffectFactory>,
    // Performances
    directory: Directory,
    named_effects: NamedEffects,
    selection_registry: SelectionRegistry,
    deferred: EventQueue<DeferredEvent>,
    now_ms: u64,
    // Connections
    connections: HashMap<ConnectionKey, Connection>,
    // Events
    events: ChoreographyEvents,
}

impl ChoreoServer {
    /// Create a new ChoreoServer. Every selectron template of the protocol is
    /// enabled for selection.
    pub fn new<P: Into<Protocol>>(
        config: ServerConfig,
        protocol: P,
        factory: Box<dyn EffectFactory>,
    ) -> Self {
        let mut protocol: Protocol = protocol.into();
        if !protocol.is_locked() {
            protocol.lock();
        }
        let selection_registry = SelectionRegistry::from_protocol(&protocol);

        Self {
            config,
            protocol,
            factory,
            directory: Directory::new(),
            named_effects: NamedEffects::new(),
            selection_registry,
            deferred: EventQueue::new(),
            now_ms: 0,
            connections: HashMap::new(),
            events: ChoreographyEvents::new(),
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn protocol(&self) -> &Protocol {
        &self.protocol
    }

    /// Simulation time, advanced by one tick interval per `tick`
    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    pub fn named_effects(&self) -> &NamedEffects {
        &self.named_effects
    }

    // Connections

    pub fn connect(&mut self, key: ConnectionKey) -> bool {
        if self.connections.contains_key(&key) {
            warn!("connection {:?} is already connected", key);
            return false;
        }
        info!("connection {:?} joined the choreography session", key);
        self.connections.insert(key, Connection::new());
        self.update_scoping();
        true
    }

    pub fn disconnect(&mut self, key: &ConnectionKey) -> bool {
        if self.connections.remove(key).is_none() {
            return false;
        }
        info!("connection {:?} left the choreography session", key);
        true
    }

    pub fn is_connected(&self, key: &ConnectionKey) -> bool {
        self.connections.contains_key(key)
    }

    /// Called by the transport once a connection has every scope object it
    /// needs. Replicas created before this point are resynced.
    pub fn set_zoned_in(&mut self, key: &ConnectionKey, zoned_in: bool) -> bool {
        let Some(connection) = self.connections.get_mut(key) else {
            warn!("cannot zone in unknown connection {:?}", key);
            return false;
        };
        let resynced = connection.set_zoned_in(zoned_in);
        if resynced > 0 {
            debug!(
                "connection {:?} zoned in, resyncing {} late replicas",
                key, resynced
            );
        }
        true
    }

    pub fn is_zoned_in(&self, key: &ConnectionKey) -> bool {
        self.connections
            .get(key)
            .is_some_and(|connection| connection.zoned_in())
    }

    /// Number of performances replicated to the connection
    pub fn ghost_count(&self, key: &ConnectionKey) -> usize {
        self.connections
            .get(key)
            .map_or(0, |connection| connection.ghost_count())
    }

    // Performances

    /// Creates an Effectron from a named template. Activation follows in the
    /// finish-startup step unless the caller postpones it.
    pub fn start_effectron(
        &mut self,
        name: &str,
        extra: Option<ObjectRef>,
    ) -> Result<ChoreographerId, ChoreoServerError> {
        let (index, template) = self
            .protocol
            .effectron_index(name)
            .and_then(|index| Some((index, self.protocol.effectron(index)?.clone())))
            .ok_or_else(|| ChoreoServerError::UnknownTemplate {
                name: name.to_string(),
            })?;

        let mut effectron = Effectron::new(index, template, HostType::Server);
        effectron.choreographer_mut().set_extra(extra);
        Ok(self.start_performance(Box::new(effectron)))
    }

    /// Creates a Selectron from the first enabled selection template that
    /// accepts the picked object, bound to it through `selected`
    pub fn start_selectron(
        &mut self,
        picked: ObjectRef,
        object_type_mask: u32,
        style: u8,
        extra: Option<ObjectRef>,
    ) -> Result<ChoreographerId, ChoreoServerError> {
        let (index, template) = self
            .selection_registry
            .find(&self.protocol, object_type_mask, style)
            .and_then(|index| Some((index, self.protocol.selectron(index)?.clone())))
            .ok_or(ChoreoServerError::NoSelectionTemplate {
                type_mask: object_type_mask,
                style,
            })?;

        let mut selectron = Selectron::new(index, template, HostType::Server);
        let choreographer = selectron.choreographer_mut();
        choreographer.set_extra(extra);
        choreographer.add_object_constraint(Some(picked), SELECTED_CONSTRAINT)?;
        Ok(self.start_performance(Box::new(selectron)))
    }

    fn start_performance(&mut self, performance: Box<dyn Performance>) -> ChoreographerId {
        let template = performance.template_name().to_string();
        let id = self.directory.register(performance);
        info!("started '{}' as choreographer {}", template, id);

        let fire_at = self.now_ms + self.config.finish_startup_delay_ms();
        self.deferred.schedule(fire_at, DeferredEvent::FinishStartup(id));
        self.events.push(ChoreographyEvent::Started { id, template });
        id
    }

    /// Enables a selection template by name. Returns false if it already was.
    pub fn register_selection_template(&mut self, name: &str) -> Result<bool, ChoreoServerError> {
        let index = self.protocol.selectron_index(name).ok_or_else(|| {
            ChoreoServerError::UnknownTemplate {
                name: name.to_string(),
            }
        })?;
        Ok(self.selection_registry.register(index))
    }

    pub fn unregister_selection_template(&mut self, name: &str) -> bool {
        match self.protocol.selectron_index(name) {
            Some(index) => self.selection_registry.unregister(index),
            None => false,
        }
    }

    pub fn performance(&self, id: ChoreographerId) -> Option<&dyn Performance> {
        self.directory.get(id)
    }

    pub fn performance_mut(&mut self, id: ChoreographerId) -> Option<&mut dyn Performance> {
        let performance = self.directory.get_mut(id)?;
        Some(performance.as_mut())
    }

    pub fn performance_ids(&self) -> Vec<ChoreographerId> {
        self.directory.ids()
    }

    pub fn performance_count(&self) -> usize {
        self.directory.len()
    }

    /// Activates a performance whose startup was postponed
    pub fn activate(&mut self, id: ChoreographerId) -> Result<bool, ChoreoServerError> {
        self.post(id, |performance| performance.activate())
    }

    /// Requests an immediate stop. Takes effect on the next tick.
    pub fn interrupt(&mut self, id: ChoreographerId) -> Result<bool, ChoreoServerError> {
        self.post(id, |performance| performance.interrupt())
    }

    /// Requests a graceful stop. Takes effect on the next tick.
    pub fn shutdown(&mut self, id: ChoreographerId) -> Result<bool, ChoreoServerError> {
        self.post(id, |performance| performance.shutdown())
    }

    fn post(
        &mut self,
        id: ChoreographerId,
        post: impl FnOnce(&mut dyn Performance) -> bool,
    ) -> Result<bool, ChoreoServerError> {
        let performance = self
            .directory
            .get_mut(id)
            .ok_or(ChoreoServerError::UnknownChoreographer { id })?;
        let posted = post(performance.as_mut());
        if posted {
            self.mark_dirty(id, UpdateMask::STATE);
        }
        Ok(posted)
    }

    /// Sends the full constraint block and state to every connection again
    pub fn resync(&mut self, id: ChoreographerId) -> Result<(), ChoreoServerError> {
        if !self.directory.contains(id) {
            return Err(ChoreoServerError::UnknownChoreographer { id });
        }
        self.mark_dirty(id, UpdateMask::SYNC);
        Ok(())
    }

    // Scope

    pub fn viewers(&self, id: ChoreographerId) -> Option<ViewersRef<'_>> {
        self.directory
            .contains(id)
            .then(|| ViewersRef::new(self, id))
    }

    pub fn viewers_mut(&mut self, id: ChoreographerId) -> Option<ViewersMut<'_>> {
        if !self.directory.contains(id) {
            return None;
        }
        Some(ViewersMut::new(self, id))
    }

    pub(crate) fn performance_visible_to(&self, id: ChoreographerId, key: &ConnectionKey) -> bool {
        self.directory
            .get(id)
            .is_some_and(|performance| performance.choreographer().is_visible_to(key))
    }

    pub(crate) fn set_explicit_viewer(
        &mut self,
        id: ChoreographerId,
        key: &ConnectionKey,
        included: bool,
    ) {
        let Some(performance) = self.directory.get_mut(id) else {
            return;
        };
        let choreographer = performance.choreographer_mut();
        if included {
            choreographer.add_explicit_viewer(*key);
        } else {
            choreographer.remove_explicit_viewer(key);
        }
    }

    pub(crate) fn clear_explicit_viewers(&mut self, id: ChoreographerId) {
        if let Some(performance) = self.directory.get_mut(id) {
            performance.choreographer_mut().clear_explicit_viewers();
        }
    }

    // Tick

    /// Advances the session by one fixed tick: deferred events first, then
    /// every performance in process order, then connection scoping
    pub fn tick(&mut self, scene: &dyn SceneQuery) {
        self.now_ms += self.config.tick_interval_ms();
        let dt = self.config.tick_interval.as_secs_f32();

        self.run_deferred(scene);
        self.process_performances(dt, scene);
        self.update_scoping();
    }

    fn run_deferred(&mut self, scene: &dyn SceneQuery) {
        while let Some(event) = self.deferred.pop_due(self.now_ms) {
            match event {
                DeferredEvent::FinishStartup(id) => {
                    let Some(performance) = self.directory.get_mut(id) else {
                        debug!("choreographer {} was deleted before it finished startup", id);
                        continue;
                    };
                    if performance.finish_startup(scene) {
                        self.mark_dirty(id, UpdateMask::STATE);
                    }
                }
                DeferredEvent::Delete(id) => self.delete_performance(id),
            }
        }
    }

    fn process_performances(&mut self, dt: f32, scene: &dyn SceneQuery) {
        for id in self.directory.ids() {
            self.directory.adjust_process_ordering(id, &self.named_effects);
        }

        let Self {
            config,
            factory,
            directory,
            named_effects,
            deferred,
            now_ms,
            connections,
            events,
            ..
        } = self;
        let mut ctx = ProcessContext {
            host: HostType::Server,
            now_ms: *now_ms,
            scene,
            factory: &**factory,
            named_effects,
        };

        for id in directory.ids() {
            let Some(performance) = directory.get_mut(id) else {
                continue;
            };
            let mut mask = UpdateMask::NONE;

            if let Some(change) = performance.process(dt, &mut ctx) {
                mask |= UpdateMask::STATE;
                if change.to == PerformanceState::Done {
                    let delay_ms = (performance.deletion_delay() * 1000.0).ceil() as u64;
                    let fire_at = *now_ms + delay_ms + config.deletion_margin_ms();
                    debug!("choreographer {} done, deleting at {}ms", id, fire_at);
                    deferred.schedule(fire_at, DeferredEvent::Delete(id));
                }
                events.push(ChoreographyEvent::StateChanged { id, change });
            }
            if performance.choreographer_mut().take_needs_sync() {
                mask |= UpdateMask::SYNC;
            }

            if !mask.is_empty() {
                for connection in connections.values_mut() {
                    connection.mark_dirty(id, mask);
                }
            }
        }
    }

    fn delete_performance(&mut self, id: ChoreographerId) {
        let Some(performance) = self.directory.get_mut(id) else {
            return;
        };
        performance.teardown(&mut self.named_effects);
        self.directory.unregister(id);

        for connection in self.connections.values_mut() {
            connection.remove_ghost(id);
        }
        info!("deleted choreographer {}", id);
        self.events.push(ChoreographyEvent::Deleted { id });
    }

    fn mark_dirty(&mut self, id: ChoreographerId, mask: UpdateMask) {
        for connection in self.connections.values_mut() {
            connection.mark_dirty(id, mask);
        }
    }

    /// Creates ghosts for performances that became visible to a connection
    /// and queues removal of the ones that no longer are
    fn update_scoping(&mut self) {
        let ids = self.directory.ids();
        for (key, connection) in self.connections.iter_mut() {
            for id in &ids {
                let Some(performance) = self.directory.get(*id) else {
                    continue;
                };
                let visible = performance.choreographer().is_visible_to(key);
                if visible
                    && !connection.has_ghost(*id)
                    && performance.state() != PerformanceState::Done
                {
                    connection.add_ghost(*id);
                } else if !visible && connection.has_ghost(*id) {
                    connection.remove_ghost(*id);
                }
            }
        }
    }

    // Replication

    /// Writes everything the connection has not been sent yet. Returns `None`
    /// when there is nothing to send.
    pub fn write_updates(
        &mut self,
        key: &ConnectionKey,
        lookup: &dyn GhostLookup,
    ) -> Option<Vec<u8>> {
        let connection = self.connections.get_mut(key)?;
        let zoned_in = connection.zoned_in();
        let mut packet = ChoreographyPacket::new();

        for id in connection.take_removals() {
            packet.push(ChoreographyMessage::Remove { id });
        }

        for id in self.directory.ids() {
            let Some(ghost) = connection.ghost_mut(id) else {
                continue;
            };
            let Some(performance) = self.directory.get(id) else {
                continue;
            };

            if !ghost.created {
                let mask = UpdateMask::INITIAL | UpdateMask::STATE;
                packet.push(ChoreographyMessage::Create {
                    id,
                    kind: performance.kind(),
                    template: performance.template_index(),
                    update: performance.build_update(mask, zoned_in, lookup),
                });
                ghost.created = true;
                ghost.awaiting_zone_in = !zoned_in;
                ghost.mask.clear();
                continue;
            }

            let mut mask = ghost.mask;
            if !zoned_in {
                // constraint blocks wait for the zone-in resync
                mask.remove(UpdateMask::SYNC);
            }
            if mask.is_empty() {
                continue;
            }
            packet.push(ChoreographyMessage::Update {
                id,
                update: performance.build_update(mask, zoned_in, lookup),
            });
            ghost.mask.remove(mask);
        }

        if packet.is_empty() {
            return None;
        }
        Some(packet.to_bytes())
    }

    // Events

    /// Takes every event raised since the last call, oldest first
    pub fn take_events(&mut self) -> IntoIter<ChoreographyEvent> {
        self.events.read()
    }
}
