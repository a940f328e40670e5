use std::{cell::RefCell, rc::Rc};

use choreo_shared::{
    effect::EffectFrame, EffectKind, EffectPrimitive, PrimitiveFactory, Transform,
};

/// What happened to a recorded primitive
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PrimitiveEvent {
    Started(EffectKind),
    Stopped(EffectKind),
    CleanedUp(EffectKind),
}

/// Shared record of every primitive built by one factory
#[derive(Clone, Default)]
pub struct PrimitiveLog {
    events: Rc<RefCell<Vec<PrimitiveEvent>>>,
    live: Rc<RefCell<usize>>,
    last_transform: Rc<RefCell<Option<Transform>>>,
}

impl PrimitiveLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<PrimitiveEvent> {
        self.events.borrow().clone()
    }

    pub fn count(&self, event: PrimitiveEvent) -> usize {
        self.events
            .borrow()
            .iter()
            .filter(|recorded| **recorded == event)
            .count()
    }

    /// Primitives started and not yet cleaned up
    pub fn live(&self) -> usize {
        *self.live.borrow()
    }

    /// Transform handed to the most recent update
    pub fn last_transform(&self) -> Option<Transform> {
        *self.last_transform.borrow()
    }

    pub fn clear(&self) {
        self.events.borrow_mut().clear();
    }

    fn push(&self, event: PrimitiveEvent) {
        match event {
            PrimitiveEvent::Started(_) => *self.live.borrow_mut() += 1,
            PrimitiveEvent::CleanedUp(_) => {
                let mut live = self.live.borrow_mut();
                *live = live.saturating_sub(1);
            }
            PrimitiveEvent::Stopped(_) => {}
        }
        self.events.borrow_mut().push(event);
    }
}

/// Primitive that renders nothing and logs its lifecycle
pub struct RecordingPrimitive {
    kind: EffectKind,
    log: PrimitiveLog,
}

impl RecordingPrimitive {
    pub fn new(kind: EffectKind, log: PrimitiveLog) -> Self {
        Self { kind, log }
    }
}

impl EffectPrimitive for RecordingPrimitive {
    fn on_start(&mut self, _transform: Option<Transform>) -> bool {
        self.log.push(PrimitiveEvent::Started(self.kind));
        true
    }

    fn on_update(&mut self, frame: &EffectFrame) -> bool {
        *self.log.last_transform.borrow_mut() = frame.transform;
        true
    }

    fn on_stop(&mut self) {
        self.log.push(PrimitiveEvent::Stopped(self.kind));
    }

    fn on_cleanup(&mut self) {
        self.log.push(PrimitiveEvent::CleanedUp(self.kind));
    }
}

/// Factory whose billboards, sounds and lights all record into `log`
pub fn recording_factory(log: &PrimitiveLog) -> PrimitiveFactory {
    let mut factory = PrimitiveFactory::new();
    for kind in [EffectKind::Billboard, EffectKind::Sound, EffectKind::Light] {
        let log = log.clone();
        factory.register(kind, move |template| {
            Box::new(RecordingPrimitive::new(template.kind, log.clone()))
        });
    }
    factory
}
