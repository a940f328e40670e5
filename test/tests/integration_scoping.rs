/// SCOPING: which connections see a performance, and resyncs after a remap
use choreo_shared::{ChoreographyEvent, Performance, Point3};
use choreo_test::{TestLink, PULSE, SPARK, TORCH};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn explicit_viewers_limit_replication() {
    init_logger();
    let mut link = TestLink::new();
    let first = link.add_client(true);
    let second = link.add_client(true);
    let first_key = link.client(first).key;
    let second_key = link.client(second).key;

    let id = link.server.start_effectron(TORCH, None).expect("starts");
    link.server
        .viewers_mut(id)
        .expect("registered")
        .include(&first_key);
    link.tick();

    let viewers = link.server.viewers(id).expect("registered");
    assert!(viewers.has(&first_key));
    assert!(!viewers.has(&second_key));
    assert!(link.client(first).client.replica(id).is_some());
    assert!(link.client(second).client.replica(id).is_none());
    assert_eq!(link.server.ghost_count(&second_key), 0);

    link.server
        .viewers_mut(id)
        .expect("registered")
        .include(&second_key)
        .exclude(&first_key);
    link.tick();
    assert!(link.client(first).client.replica(id).is_none());
    assert!(link.client(second).client.replica(id).is_some());
    assert!(link
        .client(first)
        .events
        .contains(&ChoreographyEvent::ReplicaRemoved { id }));

    link.server.viewers_mut(id).expect("registered").clear();
    link.tick();
    for end in [first, second] {
        assert!(link.client(end).client.replica(id).is_some());
    }
}

#[test]
fn scoped_out_and_back_in_before_a_send() {
    init_logger();
    let mut link = TestLink::new();
    let first = link.add_client(true);
    let second = link.add_client(true);
    let first_key = link.client(first).key;

    let spark = link.server.start_effectron(SPARK, None).expect("starts");
    link.tick();
    assert!(link.client(second).client.replica(spark).is_some());

    // hidden from the second client for one server tick, nothing sent
    link.server
        .viewers_mut(spark)
        .expect("registered")
        .include(&first_key);
    link.server.tick(&link.scene);

    link.server.viewers_mut(spark).expect("registered").clear();
    let pulse = link.server.start_effectron(PULSE, None).expect("starts");
    link.server.tick(&link.scene);
    link.deliver();

    let end = link.client(second);
    assert!(end.client.replica(spark).is_some());
    assert!(end.client.replica(pulse).is_some());
    assert!(end
        .events
        .contains(&ChoreographyEvent::ReplicaRemoved { id: spark }));
    let recreated = end
        .events
        .iter()
        .filter(|event| {
            event.id() == spark && matches!(event, ChoreographyEvent::ReplicaCreated { .. })
        })
        .count();
    assert_eq!(recreated, 2);

    link.tick();
    for end in [first, second] {
        assert!(link.client(end).client.replica(spark).is_some());
        assert!(link.client(end).client.replica(pulse).is_some());
    }
}

#[test]
fn connections_joining_later_receive_running_performances() {
    init_logger();
    let mut link = TestLink::new();
    let id = link.server.start_effectron(TORCH, None).expect("starts");
    link.tick_n(4);

    let viewer = link.add_client(true);
    let key = link.client(viewer).key;
    assert_eq!(link.server.ghost_count(&key), 1);
    link.tick();
    assert!(link.client(viewer).client.replica(id).is_some());

    assert!(link.server.disconnect(&key));
    assert!(!link.server.is_connected(&key));
    assert_eq!(link.server.ghost_count(&key), 0);
    assert!(!link.server.disconnect(&key));
}

#[test]
fn remap_resyncs_constraint_bindings() {
    init_logger();
    let mut link = TestLink::new();
    let viewer = link.add_client(true);

    let anchor = link.scene.spawn("Anchor", Point3::new(1.0, 2.0, 3.0));
    let end = link.client_mut(viewer);
    let client_anchor = end.scene.spawn("Anchor", Point3::new(1.0, 2.0, 3.0));
    end.ghosts.ghost(client_anchor, 7);

    let id = link.server.start_effectron(SPARK, Some(anchor)).expect("starts");
    link.tick_n(5);
    assert_eq!(
        link.client(viewer)
            .log
            .last_transform()
            .map(|transform| transform.position),
        Some(Point3::new(1.0, 2.0, 3.0))
    );

    link.server
        .performance_mut(id)
        .expect("registered")
        .choreographer_mut()
        .remap_constraint("extra", "4 5 6", &link.scene)
        .expect("valid source");
    link.tick();

    assert_eq!(
        link.client(viewer)
            .log
            .last_transform()
            .map(|transform| transform.position),
        Some(Point3::new(4.0, 5.0, 6.0))
    );
    let replica = link.client(viewer).client.replica(id).expect("replica kept");
    assert_eq!(replica.choreographer().remap_defs().len(), 0);
    assert!(replica
        .choreographer()
        .dynamic_constraint_defs()
        .iter()
        .any(|def| def.name == "extra"));
}

#[test]
fn explicit_resync_is_harmless_for_running_replicas() {
    init_logger();
    let mut link = TestLink::new();
    let viewer = link.add_client(true);

    let id = link.server.start_effectron(TORCH, None).expect("starts");
    link.tick_n(3);
    let before = link.client(viewer).client.replica(id).map(|replica| replica.state());

    link.server.resync(id).expect("registered");
    link.tick();
    let after = link.client(viewer).client.replica(id).map(|replica| replica.state());
    assert_eq!(before, after);
    assert!(link.server.resync(999).is_err());
}
