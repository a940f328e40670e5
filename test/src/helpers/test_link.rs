use choreo_client::{ChoreoClient, ClientConfig};
use choreo_server::{ChoreoServer, ServerConfig};
use choreo_shared::{ChoreographyEvent, ConnectionKey};

use super::{recording_factory, test_protocol, PrimitiveLog, TestGhosts, TestScene};

/// One connected client with its own scene, ghost table and primitive log
pub struct TestClientEnd {
    pub key: ConnectionKey,
    pub client: ChoreoClient,
    pub scene: TestScene,
    pub ghosts: TestGhosts,
    pub log: PrimitiveLog,
    pub events: Vec<ChoreographyEvent>,
}

/// A server and its clients wired together in memory. Every `tick` runs the
/// server, hands each client its packet and advances the client by the same
/// step.
pub struct TestLink {
    pub server: ChoreoServer,
    pub scene: TestScene,
    pub log: PrimitiveLog,
    pub clients: Vec<TestClientEnd>,
    pub events: Vec<ChoreographyEvent>,
    next_key: u64,
}

impl Default for TestLink {
    fn default() -> Self {
        Self::new()
    }
}

impl TestLink {
    pub fn new() -> Self {
        Self::with_config(ServerConfig::default())
    }

    pub fn with_config(config: ServerConfig) -> Self {
        let log = PrimitiveLog::new();
        let server = ChoreoServer::new(config, test_protocol(), Box::new(recording_factory(&log)));
        Self {
            server,
            scene: TestScene::new(),
            log,
            clients: Vec::new(),
            events: Vec::new(),
            next_key: 1,
        }
    }

    /// Connects a client and returns its index in `clients`
    pub fn add_client(&mut self, zoned_in: bool) -> usize {
        let key = ConnectionKey::new(self.next_key);
        self.next_key += 1;
        self.server.connect(key);
        self.server.set_zoned_in(&key, zoned_in);

        let log = PrimitiveLog::new();
        let client = ChoreoClient::new(
            ClientConfig::default(),
            test_protocol(),
            Box::new(recording_factory(&log)),
        );
        self.clients.push(TestClientEnd {
            key,
            client,
            scene: TestScene::new(),
            ghosts: TestGhosts::new(),
            log,
            events: Vec::new(),
        });
        self.clients.len() - 1
    }

    pub fn client(&self, index: usize) -> &TestClientEnd {
        &self.clients[index]
    }

    pub fn client_mut(&mut self, index: usize) -> &mut TestClientEnd {
        &mut self.clients[index]
    }

    pub fn tick_seconds(&self) -> f32 {
        self.server.config().tick_interval.as_secs_f32()
    }

    pub fn tick(&mut self) {
        self.server.tick(&self.scene);
        self.events.extend(self.server.take_events());
        self.deliver();
    }

    pub fn tick_n(&mut self, ticks: usize) {
        for _ in 0..ticks {
            self.tick();
        }
    }

    /// Ticks until at least `seconds` of simulation time have passed
    pub fn run_for(&mut self, seconds: f32) {
        let ticks = (seconds / self.tick_seconds()).ceil() as usize;
        self.tick_n(ticks);
    }

    /// Sends every client its pending updates and advances it one step
    pub fn deliver(&mut self) {
        let dt = self.tick_seconds();
        for end in self.clients.iter_mut() {
            if let Some(bytes) = self.server.write_updates(&end.key, &end.ghosts) {
                end.client
                    .read_packet(&bytes, &end.ghosts, &end.scene)
                    .expect("server packets decode on the client");
            }
            end.client.advance(dt, &end.scene);
            end.events.extend(end.client.take_events());
        }
    }
}
