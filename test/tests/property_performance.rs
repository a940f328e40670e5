/// PROPERTY-BASED TESTS: directory and mark invariants
///
/// Key invariants:
/// 1. Ids are never 0 and never shared by two registered performances
/// 2. Unregistered performances carry id 0
/// 3. Posting a mark twice before it is consumed equals posting it once
/// 4. Done is terminal whatever is posted afterwards
use std::sync::Arc;

use proptest::prelude::*;

use choreo_shared::{
    Directory, Effectron, HostType, Marks, NamedEffects, Performance, PerformanceState,
    PrimitiveFactory, ProcessContext,
};
use choreo_test::{test_protocol, TestScene, PULSE, SPARK};

fn server_effectron(name: &str) -> Effectron {
    let protocol = test_protocol();
    let index = protocol.effectron_index(name).expect("template exists");
    let template = Arc::clone(protocol.effectron(index).expect("template exists"));
    Effectron::new(index, template, HostType::Server)
}

fn mark_strategy() -> impl Strategy<Value = Marks> {
    prop_oneof![
        Just(Marks::ACTIVATE),
        Just(Marks::SHUTDOWN),
        Just(Marks::INTERRUPT),
    ]
}

/// Processes `ticks` server ticks of 50ms
fn run(performance: &mut dyn Performance, ticks: usize, scene: &TestScene) {
    let factory = PrimitiveFactory::new();
    let mut named_effects = NamedEffects::new();
    for tick in 0..ticks {
        let mut ctx = ProcessContext {
            host: HostType::Server,
            now_ms: tick as u64 * 50,
            scene,
            factory: &factory,
            named_effects: &mut named_effects,
        };
        performance.process(0.05, &mut ctx);
    }
}

proptest! {
    #[test]
    fn prop_ids_unique_and_nonzero(
        ops in prop::collection::vec((any::<bool>(), any::<usize>()), 1..60)
    ) {
        let mut directory = Directory::new();
        let mut live = Vec::new();

        for (register, pick) in ops {
            if register || live.is_empty() {
                let performance = server_effectron(SPARK);
                prop_assert_eq!(performance.id(), 0);
                let id = directory.register(Box::new(performance));
                prop_assert_ne!(id, 0);
                prop_assert!(!live.contains(&id));
                prop_assert_eq!(directory.get(id).map(|p| p.id()), Some(id));
                live.push(id);
            } else {
                let id = live.swap_remove(pick % live.len());
                let removed = directory.unregister(id);
                prop_assert!(removed.is_some());
                prop_assert_eq!(removed.map(|p| p.id()), Some(0));
                prop_assert!(!directory.contains(id));
            }
            prop_assert_eq!(directory.len(), live.len());
            prop_assert_eq!(directory.process_order().len(), live.len());
        }
    }

    #[test]
    fn prop_repeated_marks_are_idempotent(
        mark in mark_strategy(),
        repeats in 1usize..5,
        warmup in 0usize..10,
    ) {
        let scene = TestScene::new();
        let mut once = server_effectron(SPARK);
        let mut many = server_effectron(SPARK);
        for performance in [&mut once, &mut many] {
            performance.activate();
            run(performance, warmup + 1, &scene);
        }

        prop_assert!(once.post_mark(mark));
        for _ in 0..repeats {
            prop_assert!(many.post_mark(mark));
        }
        run(&mut once, 1, &scene);
        run(&mut many, 1, &scene);

        prop_assert_eq!(once.state(), many.state());
        prop_assert_eq!(once.marks(), many.marks());
        prop_assert_eq!(once.pending_marks(), many.pending_marks());
    }

    #[test]
    fn prop_done_is_terminal(
        marks in prop::collection::vec(mark_strategy(), 0..8),
    ) {
        let scene = TestScene::new();
        let mut pulse = server_effectron(PULSE);
        pulse.activate();
        pulse.shutdown();
        run(&mut pulse, 3, &scene);
        prop_assert_eq!(pulse.state(), PerformanceState::Done);
        let history = pulse.marks();

        for mark in marks {
            prop_assert!(!pulse.post_mark(mark));
            run(&mut pulse, 1, &scene);
            prop_assert_eq!(pulse.state(), PerformanceState::Done);
        }
        prop_assert_eq!(pulse.marks(), history);
    }
}
