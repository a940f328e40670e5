/// SELECTRON: selection templates and the main/select/deselect sequence
use choreo_server::ChoreoServerError;
use choreo_shared::{
    ChoreographyEvent, EffectKind, Performance, PerformanceState, Point3, StateChange,
};
use choreo_test::{PrimitiveEvent, TestLink, BEACON, BEACON_TYPE_MASK, SPARK};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn selection_templates_match_by_type_mask() {
    init_logger();
    let mut link = TestLink::new();
    let picked = link.scene.spawn("Crate", Point3::ZERO);

    assert!(matches!(
        link.server.start_selectron(picked, 0b10, 0, None),
        Err(ChoreoServerError::NoSelectionTemplate {
            type_mask: 0b10,
            style: 0
        })
    ));
    assert!(matches!(
        link.server.start_selectron(picked, BEACON_TYPE_MASK, 1, None),
        Err(ChoreoServerError::NoSelectionTemplate { .. })
    ));

    assert!(link.server.unregister_selection_template(BEACON));
    assert!(!link.server.unregister_selection_template(BEACON));
    assert!(link
        .server
        .start_selectron(picked, BEACON_TYPE_MASK, 0, None)
        .is_err());

    assert_eq!(link.server.register_selection_template(BEACON).ok(), Some(true));
    assert_eq!(link.server.register_selection_template(BEACON).ok(), Some(false));
    assert!(matches!(
        link.server.register_selection_template(SPARK),
        Err(ChoreoServerError::UnknownTemplate { .. })
    ));

    let id = link
        .server
        .start_selectron(picked, BEACON_TYPE_MASK | 0b100, 0, None)
        .expect("beacon accepts any mask containing its bit");
    let beacon = link.server.performance(id).expect("registered");
    assert_eq!(beacon.template_name(), BEACON);
}

#[test]
fn select_deselect_sequencing() {
    init_logger();
    let mut link = TestLink::new();
    let viewer = link.add_client(true);

    let picked = link.scene.spawn("Crate", Point3::new(5.0, 0.0, -2.0));
    let end = link.client_mut(viewer);
    let client_crate = end.scene.spawn("Crate", Point3::new(5.0, 0.0, -2.0));
    end.ghosts.ghost(client_crate, 3);

    let id = link
        .server
        .start_selectron(picked, BEACON_TYPE_MASK, 0, None)
        .expect("beacon registered");
    link.tick();
    link.run_for(0.2);

    let log = &link.client(viewer).log;
    assert_eq!(log.count(PrimitiveEvent::Started(EffectKind::Light)), 1);
    assert_eq!(log.count(PrimitiveEvent::Started(EffectKind::Sound)), 1);

    // the select phrase ends on its own, the selectron stays Active
    link.run_for(0.6);
    let end = link.client(viewer);
    assert_eq!(end.log.count(PrimitiveEvent::CleanedUp(EffectKind::Sound)), 1);
    assert_eq!(end.log.live(), 1);
    assert_eq!(
        end.log.last_transform().map(|transform| transform.position),
        Some(Point3::new(5.0, 0.0, -2.0))
    );
    let replica = end.client.replica(id).expect("replica created");
    assert_eq!(replica.state(), PerformanceState::Active);

    link.server.shutdown(id).expect("registered");
    link.tick();
    let end = link.client(viewer);
    let replica = end.client.replica(id).expect("replica kept");
    assert_eq!(replica.state(), PerformanceState::Cleanup);
    assert_eq!(end.log.count(PrimitiveEvent::Started(EffectKind::Sound)), 2);
    assert_eq!(end.log.count(PrimitiveEvent::CleanedUp(EffectKind::Light)), 1);

    link.run_for(0.4);
    let replica = link.client(viewer).client.replica(id).expect("replica kept");
    assert_eq!(replica.state(), PerformanceState::Done);
    assert!(link.client(viewer).events.contains(&ChoreographyEvent::StateChanged {
        id,
        change: StateChange {
            from: PerformanceState::Cleanup,
            to: PerformanceState::Done,
        },
    }));

    link.run_for(1.0);
    assert!(link.server.performance(id).is_none());
    assert!(link.client(viewer).client.replica(id).is_none());
    assert_eq!(link.client(viewer).log.live(), 0);
}

#[test]
fn interrupted_selectron_stops_main_and_cuts_select() {
    init_logger();
    let mut link = TestLink::new();
    let viewer = link.add_client(true);
    let picked = link.scene.spawn("Crate", Point3::ZERO);

    let id = link
        .server
        .start_selectron(picked, BEACON_TYPE_MASK, 0, None)
        .expect("beacon registered");
    link.tick_n(3);
    link.server.interrupt(id).expect("registered");
    link.tick();

    // the light has no fade out, so stopping it cleans it up at once
    let end = link.client(viewer);
    assert_eq!(end.log.count(PrimitiveEvent::Stopped(EffectKind::Light)), 0);
    assert_eq!(end.log.count(PrimitiveEvent::CleanedUp(EffectKind::Light)), 1);
    assert_eq!(
        end.client.replica(id).map(|replica| replica.state()),
        Some(PerformanceState::Cleanup)
    );
}
