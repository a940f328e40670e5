/// LATE JOIN: replicas created before their connection zoned in
///
/// A Late replica ignores state until the sync event arrives, then either
/// joins the running performance partway through or settles as Done.
use std::sync::Arc;

use choreo_shared::{
    sync::{ConstraintInfo, InitialSection, StateSection},
    EffectKind, Effectron, HostType, Marks, NamedEffects, Performance, PerformanceState,
    PerformanceUpdate, Point3, ProcessContext, StateChange,
};
use choreo_test::{
    recording_factory, test_protocol, PrimitiveEvent, PrimitiveLog, TestGhosts, TestLink,
    TestScene, PULSE, SPARK, TORCH,
};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn client_replica(name: &str) -> Effectron {
    let protocol = test_protocol();
    let index = protocol.effectron_index(name).expect("template exists");
    let template = Arc::clone(protocol.effectron(index).expect("template exists"));
    Effectron::new(index, template, HostType::Client)
}

fn initial_without_constraints() -> PerformanceUpdate {
    PerformanceUpdate {
        initial: Some(InitialSection {
            extra: None,
            time_factor: 1.0,
            constraint_info: None,
        }),
        state: Some(StateSection {
            marks: Marks::ACTIVATE,
            state: PerformanceState::Active,
            elapsed: 1.0,
        }),
        sync: None,
    }
}

fn sync_event(marks: Marks, state: PerformanceState, elapsed: f32) -> PerformanceUpdate {
    PerformanceUpdate {
        initial: None,
        state: Some(StateSection {
            marks,
            state,
            elapsed,
        }),
        sync: Some(ConstraintInfo::default()),
    }
}

#[test]
fn late_replica_joins_active_performance_partway() {
    init_logger();
    let mut scene = TestScene::new();
    scene.spawn("Tower", Point3::new(0.0, 10.0, 0.0));
    let log = PrimitiveLog::new();
    let factory = recording_factory(&log);
    let mut named_effects = NamedEffects::new();
    let ghosts = TestGhosts::new();

    let mut torch = client_replica(TORCH);
    {
        let ctx = ProcessContext {
            host: HostType::Client,
            now_ms: 0,
            scene: &scene,
            factory: &factory,
            named_effects: &mut named_effects,
        };
        assert_eq!(torch.apply_update(&initial_without_constraints(), &ghosts, &ctx), None);
    }
    assert_eq!(torch.state(), PerformanceState::Late);
    // state carried by the creating update is not absorbed while Late
    assert!(torch.marks().is_empty());

    let change = {
        let ctx = ProcessContext {
            host: HostType::Client,
            now_ms: 0,
            scene: &scene,
            factory: &factory,
            named_effects: &mut named_effects,
        };
        torch.apply_update(
            &sync_event(Marks::ACTIVATE, PerformanceState::Active, 3.0),
            &ghosts,
            &ctx,
        )
    };
    assert_eq!(
        change,
        Some(StateChange {
            from: PerformanceState::Late,
            to: PerformanceState::Active,
        })
    );
    assert_eq!(torch.state(), PerformanceState::Active);
    assert_eq!(torch.elapsed(), 3.0);
    assert_eq!(torch.marks(), Marks::ACTIVATE);
    assert!(torch.pending_marks().is_empty());
    assert!(torch
        .active_phrase()
        .is_some_and(|phrase| !phrase.is_empty()));

    let mut ctx = ProcessContext {
        host: HostType::Client,
        now_ms: 16,
        scene: &scene,
        factory: &factory,
        named_effects: &mut named_effects,
    };
    assert_eq!(torch.process(0.016, &mut ctx), None);
    // three seconds in, the flame is past its fade in
    assert_eq!(log.count(PrimitiveEvent::Started(EffectKind::Billboard)), 1);
    assert_eq!(
        log.last_transform().map(|transform| transform.position),
        Some(Point3::new(0.0, 10.0, 0.0))
    );
}

#[test]
fn late_replica_without_exec_on_new_clients_is_done() {
    init_logger();
    let scene = TestScene::new();
    let log = PrimitiveLog::new();
    let factory = recording_factory(&log);
    let mut named_effects = NamedEffects::new();
    let ghosts = TestGhosts::new();

    let mut pulse = client_replica(PULSE);
    let ctx = ProcessContext {
        host: HostType::Client,
        now_ms: 0,
        scene: &scene,
        factory: &factory,
        named_effects: &mut named_effects,
    };
    pulse.apply_update(&initial_without_constraints(), &ghosts, &ctx);
    let change = pulse.apply_update(
        &sync_event(Marks::ACTIVATE, PerformanceState::Active, 0.5),
        &ghosts,
        &ctx,
    );

    assert_eq!(
        change.map(|change| change.to),
        Some(PerformanceState::Done)
    );
    assert!(pulse.active_phrase().is_none());
    assert_eq!(log.count(PrimitiveEvent::Started(EffectKind::Sound)), 0);
}

#[test]
fn late_replica_of_stopped_performance_is_done() {
    init_logger();
    let scene = TestScene::new();
    let log = PrimitiveLog::new();
    let factory = recording_factory(&log);
    let mut named_effects = NamedEffects::new();
    let ghosts = TestGhosts::new();

    let mut spark = client_replica(SPARK);
    let ctx = ProcessContext {
        host: HostType::Client,
        now_ms: 0,
        scene: &scene,
        factory: &factory,
        named_effects: &mut named_effects,
    };
    spark.apply_update(&initial_without_constraints(), &ghosts, &ctx);
    let change = spark.apply_update(
        &sync_event(
            Marks::ACTIVATE | Marks::SHUTDOWN,
            PerformanceState::Cleanup,
            2.5,
        ),
        &ghosts,
        &ctx,
    );

    assert_eq!(
        change.map(|change| change.to),
        Some(PerformanceState::Done)
    );
    assert_eq!(spark.marks(), Marks::ACTIVATE | Marks::SHUTDOWN);
}

#[test]
fn late_replica_of_inactive_performance_waits_for_activation() {
    init_logger();
    let scene = TestScene::new();
    let log = PrimitiveLog::new();
    let factory = recording_factory(&log);
    let mut named_effects = NamedEffects::new();
    let ghosts = TestGhosts::new();

    let mut spark = client_replica(SPARK);
    let ctx = ProcessContext {
        host: HostType::Client,
        now_ms: 0,
        scene: &scene,
        factory: &factory,
        named_effects: &mut named_effects,
    };
    spark.apply_update(&initial_without_constraints(), &ghosts, &ctx);
    let change = spark.apply_update(
        &sync_event(Marks::NONE, PerformanceState::Inactive, 0.0),
        &ghosts,
        &ctx,
    );

    assert_eq!(
        change.map(|change| change.to),
        Some(PerformanceState::Inactive)
    );
    assert!(spark.active_phrase().is_none());
}

#[test]
fn zoning_in_resyncs_late_replicas() {
    init_logger();
    let mut link = TestLink::new();
    let early = link.add_client(true);
    let late = link.add_client(false);

    let spark = link.server.start_effectron(SPARK, None).expect("starts");
    let pulse = link.server.start_effectron(PULSE, None).expect("starts");
    link.run_for(1.0);

    let late_end = link.client(late);
    for id in [spark, pulse] {
        let replica = late_end.client.replica(id).expect("ghosted before zoning in");
        assert_eq!(replica.state(), PerformanceState::Late);
    }
    assert!(late_end.log.events().is_empty());
    assert_eq!(
        link.client(early).log.count(PrimitiveEvent::Started(EffectKind::Billboard)),
        1
    );

    let key = link.client(late).key;
    assert!(link.server.set_zoned_in(&key, true));
    link.tick();

    let server_elapsed = link
        .server
        .performance(spark)
        .map(|spark| spark.elapsed())
        .expect("still running");
    let late_end = link.client(late);
    let replica = late_end.client.replica(spark).expect("replica kept");
    assert_eq!(replica.state(), PerformanceState::Active);
    assert!((replica.elapsed() - server_elapsed).abs() <= 2.0 * link.tick_seconds());
    assert_eq!(
        late_end.log.count(PrimitiveEvent::Started(EffectKind::Billboard)),
        1
    );

    let replica = late_end.client.replica(pulse).expect("replica kept");
    assert_eq!(replica.state(), PerformanceState::Done);
    assert_eq!(late_end.log.count(PrimitiveEvent::Started(EffectKind::Sound)), 0);

    // replicas made after zoning in follow the ordinary path
    let after = link.server.start_effectron(PULSE, None).expect("starts");
    link.tick();
    let replica = link.client(late).client.replica(after).expect("replica created");
    assert_eq!(replica.state(), PerformanceState::Active);
}
