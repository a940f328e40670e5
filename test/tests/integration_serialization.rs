/// WIRE: packets decoded by a client, including malformed ones
use choreo_client::{ChoreoClient, ChoreoClientError, ClientConfig};
use choreo_shared::{
    sync::{ConstraintInfo, InitialSection, StateSection},
    ChoreographyMessage, ChoreographyPacket, Marks, Performance, PerformanceKind,
    PerformanceState, PerformanceUpdate,
};
use choreo_test::{recording_factory, test_protocol, PrimitiveLog, TestGhosts, TestScene, SPARK};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

struct Receiver {
    client: ChoreoClient,
    scene: TestScene,
    ghosts: TestGhosts,
    _log: PrimitiveLog,
}

impl Receiver {
    fn new() -> Self {
        let log = PrimitiveLog::new();
        Self {
            client: ChoreoClient::new(
                ClientConfig::default(),
                test_protocol(),
                Box::new(recording_factory(&log)),
            ),
            scene: TestScene::new(),
            ghosts: TestGhosts::new(),
            _log: log,
        }
    }

    fn read(&mut self, bytes: &[u8]) -> Result<(), ChoreoClientError> {
        self.client.read_packet(bytes, &self.ghosts, &self.scene)
    }
}

fn spark_index() -> u16 {
    test_protocol().effectron_index(SPARK).expect("spark exists")
}

fn create(id: u32, template: u16, elapsed: f32) -> ChoreographyMessage {
    ChoreographyMessage::Create {
        id,
        kind: PerformanceKind::Effectron,
        template,
        update: PerformanceUpdate {
            initial: Some(InitialSection {
                extra: None,
                time_factor: 1.0,
                constraint_info: Some(ConstraintInfo::default()),
            }),
            state: Some(StateSection {
                marks: Marks::ACTIVATE,
                state: PerformanceState::Active,
                elapsed,
            }),
            sync: None,
        },
    }
}

fn packet(messages: Vec<ChoreographyMessage>) -> Vec<u8> {
    ChoreographyPacket { messages }.to_bytes()
}

#[test]
fn create_carries_state_and_elapsed() {
    init_logger();
    let mut receiver = Receiver::new();
    let message = create(12, spark_index(), 4.25);

    let bytes = packet(vec![message.clone()]);
    let decoded = ChoreographyPacket::from_bytes(&bytes).expect("decodes");
    assert_eq!(decoded.messages, vec![message]);

    receiver.read(&bytes).expect("accepted");
    receiver.client.advance(0.0, &receiver.scene);

    let replica = receiver.client.replica(12).expect("created");
    assert_eq!(replica.state(), PerformanceState::Active);
    assert_eq!(replica.elapsed(), 4.25);
    assert_eq!(replica.marks(), Marks::ACTIVATE);
}

#[test]
fn truncated_packet_is_rejected() {
    init_logger();
    let mut receiver = Receiver::new();
    let bytes = packet(vec![create(3, spark_index(), 0.0)]);

    let result = receiver.read(&bytes[..1]);
    assert!(matches!(result, Err(ChoreoClientError::Decode(_))));
    assert_eq!(receiver.client.replica_count(), 0);

    assert!(matches!(
        receiver.read(&[]),
        Err(ChoreoClientError::Decode(_))
    ));
}

#[test]
fn unknown_template_rejects_the_whole_packet() {
    init_logger();
    let mut receiver = Receiver::new();
    let bytes = packet(vec![create(1, spark_index(), 0.0), create(2, 99, 0.0)]);

    let result = receiver.read(&bytes);
    assert!(matches!(
        result,
        Err(ChoreoClientError::UnknownTemplate {
            kind: PerformanceKind::Effectron,
            index: 99
        })
    ));
    assert_eq!(receiver.client.replica_count(), 0);
    assert!(receiver.client.take_events().next().is_none());
}

#[test]
fn duplicate_replica_id_is_rejected() {
    init_logger();
    let mut receiver = Receiver::new();
    receiver
        .read(&packet(vec![create(5, spark_index(), 0.0)]))
        .expect("accepted");

    let result = receiver.read(&packet(vec![create(5, spark_index(), 0.0)]));
    assert!(matches!(
        result,
        Err(ChoreoClientError::DuplicateReplica { id: 5 })
    ));

    let result = receiver.read(&packet(vec![
        create(6, spark_index(), 0.0),
        create(6, spark_index(), 0.0),
    ]));
    assert!(matches!(
        result,
        Err(ChoreoClientError::DuplicateReplica { id: 6 })
    ));
    assert_eq!(receiver.client.replica_ids(), vec![5]);

    // an id freed earlier in the same packet may be reused
    receiver
        .read(&packet(vec![
            ChoreographyMessage::Remove { id: 5 },
            create(5, spark_index(), 0.0),
        ]))
        .expect("accepted");
    assert_eq!(receiver.client.replica_ids(), vec![5]);
}

#[test]
fn zero_id_never_decodes() {
    init_logger();
    let mut receiver = Receiver::new();
    let bytes = packet(vec![ChoreographyMessage::Remove { id: 0 }]);

    assert!(ChoreographyPacket::from_bytes(&bytes).is_err());
    assert!(matches!(
        receiver.read(&bytes),
        Err(ChoreoClientError::Decode(_))
    ));
}

#[test]
fn updates_and_removals_for_unknown_replicas_are_ignored() {
    init_logger();
    let mut receiver = Receiver::new();
    let bytes = packet(vec![
        ChoreographyMessage::Update {
            id: 40,
            update: PerformanceUpdate::default(),
        },
        ChoreographyMessage::Remove { id: 41 },
    ]);

    receiver.read(&bytes).expect("nothing to reject");
    assert_eq!(receiver.client.replica_count(), 0);
}
