/// END-TO-END: Effectron lifecycle on a server and one zoned-in client
///
/// Covers activation through finish startup, phrase expiry, the after-life
/// wait before deletion, looping, and interrupt handling.
use choreo_shared::{
    ChoreographyEvent, EffectKind, Marks, Performance, PerformanceState, Point3, StateChange,
};
use choreo_test::{PrimitiveEvent, TestLink, PULSE, SPARK};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn client_saw(link: &TestLink, client: usize, event: &ChoreographyEvent) -> bool {
    link.client(client).events.iter().any(|seen| seen == event)
}

#[test]
fn effectron_plays_once_and_is_deleted() {
    init_logger();
    let mut link = TestLink::new();
    let viewer = link.add_client(true);

    let anchor = link.scene.spawn("Anchor", Point3::new(1.0, 2.0, 3.0));
    let end = link.client_mut(viewer);
    let client_anchor = end.scene.spawn("Anchor", Point3::new(1.0, 2.0, 3.0));
    end.ghosts.ghost(client_anchor, 7);

    let id = link
        .server
        .start_effectron(SPARK, Some(anchor))
        .expect("spark template is registered");
    assert_ne!(id, 0);

    link.tick();
    let server_state = link.server.performance(id).map(|spark| spark.state());
    assert_eq!(server_state, Some(PerformanceState::Active));
    let replica = link.client(viewer).client.replica(id).expect("replica created");
    assert_eq!(replica.state(), PerformanceState::Active);

    // effects are client-only by default
    assert_eq!(link.log.count(PrimitiveEvent::Started(EffectKind::Billboard)), 0);
    let log = &link.client(viewer).log;
    assert_eq!(log.count(PrimitiveEvent::Started(EffectKind::Billboard)), 1);
    assert_eq!(
        log.last_transform().map(|transform| transform.position),
        Some(Point3::new(1.0, 2.0, 3.0))
    );

    link.run_for(2.2);
    assert_eq!(
        link.server.performance(id).map(|spark| spark.state()),
        Some(PerformanceState::Done)
    );
    let log = &link.client(viewer).log;
    assert_eq!(log.count(PrimitiveEvent::Stopped(EffectKind::Billboard)), 1);
    // still fading out, the replica must not be gone yet
    assert!(link.client(viewer).client.replica(id).is_some());

    link.run_for(1.5);
    assert!(link.server.performance(id).is_none());
    assert!(link.client(viewer).client.replica(id).is_none());
    assert!(link.events.contains(&ChoreographyEvent::Deleted { id }));
    assert!(client_saw(
        &link,
        viewer,
        &ChoreographyEvent::StateChanged {
            id,
            change: StateChange {
                from: PerformanceState::Cleanup,
                to: PerformanceState::Done,
            },
        }
    ));
    assert!(client_saw(&link, viewer, &ChoreographyEvent::ReplicaRemoved { id }));

    let log = &link.client(viewer).log;
    assert_eq!(log.count(PrimitiveEvent::CleanedUp(EffectKind::Billboard)), 1);
    assert_eq!(log.live(), 0);
}

#[test]
fn looping_phrase_recycles_until_budget_is_spent() {
    init_logger();
    let mut link = TestLink::new();
    let viewer = link.add_client(true);

    let id = link.server.start_effectron(PULSE, None).expect("pulse starts");
    // the third loop ends at 3s, deletion follows half a second after Done
    link.run_for(3.3);

    let log = &link.client(viewer).log;
    assert_eq!(log.count(PrimitiveEvent::Started(EffectKind::Sound)), 3);
    assert_eq!(log.count(PrimitiveEvent::CleanedUp(EffectKind::Sound)), 3);

    let server_state = link.server.performance(id).map(|pulse| pulse.state());
    assert_eq!(server_state, Some(PerformanceState::Done));
}

#[test]
fn interrupt_twice_matches_interrupt_once() {
    init_logger();
    let mut once = TestLink::new();
    let mut twice = TestLink::new();
    let once_viewer = once.add_client(true);
    let twice_viewer = twice.add_client(true);

    let once_id = once.server.start_effectron(SPARK, None).expect("starts");
    let twice_id = twice.server.start_effectron(SPARK, None).expect("starts");
    once.tick_n(5);
    twice.tick_n(5);

    assert_eq!(once.server.interrupt(once_id).ok(), Some(true));
    assert_eq!(twice.server.interrupt(twice_id).ok(), Some(true));
    assert_eq!(twice.server.interrupt(twice_id).ok(), Some(true));
    once.tick();
    twice.tick();

    let once_spark = once.server.performance(once_id).expect("registered");
    let twice_spark = twice.server.performance(twice_id).expect("registered");
    assert_eq!(once_spark.state(), PerformanceState::Cleanup);
    assert_eq!(twice_spark.state(), once_spark.state());
    assert_eq!(twice_spark.marks(), once_spark.marks());
    assert_eq!(twice_spark.marks(), Marks::ACTIVATE | Marks::INTERRUPT);
    assert!(twice_spark.pending_marks().is_empty());

    // leaving Active stops the flash, so it still fades out
    for (link, viewer) in [(&once, once_viewer), (&twice, twice_viewer)] {
        let log = &link.client(viewer).log;
        assert_eq!(log.count(PrimitiveEvent::Stopped(EffectKind::Billboard)), 1);
        assert_eq!(log.count(PrimitiveEvent::CleanedUp(EffectKind::Billboard)), 0);
    }
    twice.run_for(0.6);
    let log = &twice.client(twice_viewer).log;
    assert_eq!(log.count(PrimitiveEvent::Stopped(EffectKind::Billboard)), 1);
    assert_eq!(log.count(PrimitiveEvent::CleanedUp(EffectKind::Billboard)), 1);
}

#[test]
fn done_is_terminal() {
    init_logger();
    let mut link = TestLink::new();
    link.add_client(true);

    let id = link.server.start_effectron(SPARK, None).expect("starts");
    link.tick();
    link.server.shutdown(id).expect("registered");
    link.tick_n(2);
    assert_eq!(
        link.server.performance(id).map(|spark| spark.state()),
        Some(PerformanceState::Done)
    );

    assert_eq!(link.server.activate(id).ok(), Some(false));
    assert_eq!(link.server.interrupt(id).ok(), Some(false));
    assert_eq!(link.server.shutdown(id).ok(), Some(false));
    link.tick();
    assert_eq!(
        link.server.performance(id).map(|spark| spark.state()),
        Some(PerformanceState::Done)
    );
}

#[test]
fn postponed_activation_waits_for_the_caller() {
    init_logger();
    let mut link = TestLink::new();
    let viewer = link.add_client(true);

    let id = link.server.start_effectron(SPARK, None).expect("starts");
    link.server
        .performance_mut(id)
        .expect("registered")
        .choreographer_mut()
        .set_postpone_activation(true);
    link.tick_n(3);
    assert_eq!(
        link.server.performance(id).map(|spark| spark.state()),
        Some(PerformanceState::Inactive)
    );
    let replica = link.client(viewer).client.replica(id).expect("replica created");
    assert_eq!(replica.state(), PerformanceState::Inactive);

    assert_eq!(link.server.activate(id).ok(), Some(true));
    link.tick();
    let replica = link.client(viewer).client.replica(id).expect("replica created");
    assert_eq!(replica.state(), PerformanceState::Active);
}

#[test]
fn unknown_template_is_rejected() {
    init_logger();
    let mut link = TestLink::new();
    assert!(link.server.start_effectron("missing", None).is_err());
    assert_eq!(link.server.performance_count(), 0);
    assert_eq!(link.server.take_events().count(), 0);
}

#[test]
fn non_finite_frame_delta_is_ignored() {
    init_logger();
    let mut link = TestLink::new();
    let viewer = link.add_client(true);

    let id = link.server.start_effectron(SPARK, None).expect("starts");
    link.tick_n(5);
    let elapsed_of = |link: &TestLink| {
        link.client(viewer)
            .client
            .replica(id)
            .map(|spark| spark.elapsed())
    };
    let before = elapsed_of(&link).expect("replicated");
    assert!(before > 0.0);

    let end = link.client_mut(viewer);
    end.client.advance(f32::NAN, &end.scene);
    end.client.advance(f32::INFINITY, &end.scene);
    assert_eq!(elapsed_of(&link), Some(before));

    link.tick();
    let after = elapsed_of(&link).expect("replicated");
    assert!(after.is_finite() && after > before);
}
