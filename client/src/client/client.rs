use std::{collections::HashSet, sync::Arc, vec::IntoIter};

use log::{debug, error, info, warn};

use choreo_shared::{
    ChoreographerId, ChoreographyEvent, ChoreographyEvents, ChoreographyMessage,
    ChoreographyPacket, Directory, EffectFactory, Effectron, GhostResolve, HostType,
    NamedEffects, Performance, PerformanceKind, PerformanceUpdate, ProcessContext, Protocol,
    SceneQuery, Selectron, TemplateIndex,
};

use crate::{client::ClientConfig, ChoreoClientError};

/// A client-side choreography session holding one replica per performance
/// the server has in scope for this connection
pub struct ChoreoClient {
    config: ClientConfig,
    protocol: Protocol,
    factory: Box<dyn EffectFactory>,
    directory: Directory,
    named_effects: NamedEffects,
    now_ms: u64,
    events: ChoreographyEvents,
}

impl ChoreoClient {
    /// Create a new ChoreoClient. The protocol must list the same templates in
    /// the same order as the server's.
    pub fn new<P: Into<Protocol>>(
        config: ClientConfig,
        protocol: P,
        factory: Box<dyn EffectFactory>,
    ) -> Self {
        let mut protocol: Protocol = protocol.into();
        if !protocol.is_locked() {
            protocol.lock();
        }

        Self {
            config,
            protocol,
            factory,
            directory: Directory::new(),
            named_effects: NamedEffects::new(),
            now_ms: 0,
            events: ChoreographyEvents::new(),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Local time, advanced by every `advance`
    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    pub fn named_effects(&self) -> &NamedEffects {
        &self.named_effects
    }

    pub fn replica(&self, id: ChoreographerId) -> Option<&dyn Performance> {
        self.directory.get(id)
    }

    pub fn replica_mut(&mut self, id: ChoreographerId) -> Option<&mut dyn Performance> {
        let replica = self.directory.get_mut(id)?;
        Some(replica.as_mut())
    }

    pub fn replica_ids(&self) -> Vec<ChoreographerId> {
        self.directory.ids()
    }

    pub fn replica_count(&self) -> usize {
        self.directory.len()
    }

    // Incoming

    /// Decodes and applies one packet from the server. A packet that fails to
    /// decode or names unknown templates is rejected as a whole.
    pub fn read_packet(
        &mut self,
        bytes: &[u8],
        resolver: &dyn GhostResolve,
        scene: &dyn SceneQuery,
    ) -> Result<(), ChoreoClientError> {
        let packet = ChoreographyPacket::from_bytes(bytes)
            .map_err(|err| self.desync(ChoreoClientError::from(err)))?;
        if let Err(err) = self.validate(&packet) {
            return Err(self.desync(err));
        }

        for message in packet.messages {
            match message {
                ChoreographyMessage::Create {
                    id,
                    kind,
                    template,
                    update,
                } => self.create_replica(id, kind, template, &update, resolver, scene)?,
                ChoreographyMessage::Update { id, update } => {
                    self.update_replica(id, &update, resolver, scene)
                }
                ChoreographyMessage::Remove { id } => self.remove_replica(id),
            }
        }
        Ok(())
    }

    fn desync(&self, err: ChoreoClientError) -> ChoreoClientError {
        cfg_if! {
            if #[cfg(feature = "strict_decode")] {
                panic!("choreography protocol desync: {}", err);
            } else {
                error!("rejected choreography packet: {}", err);
                err
            }
        }
    }

    /// Checks every create in the packet before anything is applied
    fn validate(&self, packet: &ChoreographyPacket) -> Result<(), ChoreoClientError> {
        let mut removed = HashSet::new();
        let mut created = HashSet::new();
        for message in &packet.messages {
            match message {
                ChoreographyMessage::Create {
                    id, kind, template, ..
                } => {
                    if !self.has_template(*kind, *template) {
                        return Err(ChoreoClientError::UnknownTemplate {
                            kind: *kind,
                            index: *template,
                        });
                    }
                    let in_use = self.directory.contains(*id) && !removed.contains(id);
                    if in_use || !created.insert(*id) {
                        return Err(ChoreoClientError::DuplicateReplica { id: *id });
                    }
                }
                ChoreographyMessage::Remove { id } => {
                    removed.insert(*id);
                    created.remove(id);
                }
                ChoreographyMessage::Update { .. } => {}
            }
        }
        Ok(())
    }

    fn has_template(&self, kind: PerformanceKind, index: TemplateIndex) -> bool {
        match kind {
            PerformanceKind::Effectron => self.protocol.effectron(index).is_some(),
            PerformanceKind::Selectron => self.protocol.selectron(index).is_some(),
        }
    }

    fn create_replica(
        &mut self,
        id: ChoreographerId,
        kind: PerformanceKind,
        template: TemplateIndex,
        update: &PerformanceUpdate,
        resolver: &dyn GhostResolve,
        scene: &dyn SceneQuery,
    ) -> Result<(), ChoreoClientError> {
        let replica: Box<dyn Performance> = match kind {
            PerformanceKind::Effectron => {
                let template_ref = self.protocol.effectron(template).map(Arc::clone).ok_or(
                    ChoreoClientError::UnknownTemplate {
                        kind,
                        index: template,
                    },
                )?;
                Box::new(Effectron::new(template, template_ref, HostType::Client))
            }
            PerformanceKind::Selectron => {
                let template_ref = self.protocol.selectron(template).map(Arc::clone).ok_or(
                    ChoreoClientError::UnknownTemplate {
                        kind,
                        index: template,
                    },
                )?;
                Box::new(Selectron::new(template, template_ref, HostType::Client))
            }
        };
        let name = replica.template_name().to_string();
        self.directory.insert_with_id(id, replica)?;
        debug!("created replica {} of '{}'", id, name);
        self.events.push(ChoreographyEvent::ReplicaCreated { id, template: name });

        self.update_replica(id, update, resolver, scene);
        Ok(())
    }

    fn update_replica(
        &mut self,
        id: ChoreographerId,
        update: &PerformanceUpdate,
        resolver: &dyn GhostResolve,
        scene: &dyn SceneQuery,
    ) {
        let Self {
            factory,
            directory,
            named_effects,
            now_ms,
            events,
            ..
        } = self;
        let Some(replica) = directory.get_mut(id) else {
            warn!("update for unknown replica {}", id);
            return;
        };
        let ctx = ProcessContext {
            host: HostType::Client,
            now_ms: *now_ms,
            scene,
            factory: &**factory,
            named_effects,
        };
        if let Some(change) = replica.apply_update(update, resolver, &ctx) {
            events.push(ChoreographyEvent::StateChanged { id, change });
        }
    }

    fn remove_replica(&mut self, id: ChoreographerId) {
        let Some(replica) = self.directory.get_mut(id) else {
            warn!("removal of unknown replica {}", id);
            return;
        };
        replica.teardown(&mut self.named_effects);
        self.directory.unregister(id);
        info!("removed replica {}", id);
        self.events.push(ChoreographyEvent::ReplicaRemoved { id });
    }

    // Frame

    /// Advances every replica by one render frame
    pub fn advance(&mut self, dt: f32, scene: &dyn SceneQuery) {
        if !dt.is_finite() {
            warn!("ignoring non-finite frame delta {}", dt);
            return;
        }
        let dt = dt.clamp(0.0, self.config.max_frame_delta.as_secs_f32());
        self.now_ms += (dt * 1000.0).round() as u64;

        for id in self.directory.ids() {
            self.directory.adjust_process_ordering(id, &self.named_effects);
        }

        let Self {
            factory,
            directory,
            named_effects,
            now_ms,
            events,
            ..
        } = self;
        let mut ctx = ProcessContext {
            host: HostType::Client,
            now_ms: *now_ms,
            scene,
            factory: &**factory,
            named_effects,
        };
        for id in directory.ids() {
            let Some(replica) = directory.get_mut(id) else {
                continue;
            };
            if let Some(change) = replica.process(dt, &mut ctx) {
                events.push(ChoreographyEvent::StateChanged { id, change });
            }
        }
    }

    // Events

    /// Takes every event raised since the last call, oldest first
    pub fn take_events(&mut self) -> IntoIter<ChoreographyEvent> {
        self.events.read()
    }
}
