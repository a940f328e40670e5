use crate::{protocol::Protocol, types::TemplateIndex};

/// Selectron templates enabled for the running session, searched in
/// registration order
#[derive(Default)]
pub struct SelectionRegistry {
    registered: Vec<TemplateIndex>,
}

impl SelectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers every selectron template of `protocol`
    pub fn from_protocol(protocol: &Protocol) -> Self {
        let mut registry = Self::new();
        for index in 0..protocol.selectron_count() {
            registry.register(index);
        }
        registry
    }

    pub fn register(&mut self, index: TemplateIndex) -> bool {
        if self.registered.contains(&index) {
            return false;
        }
        self.registered.push(index);
        true
    }

    pub fn unregister(&mut self, index: TemplateIndex) -> bool {
        let before = self.registered.len();
        self.registered.retain(|registered| *registered != index);
        before != self.registered.len()
    }

    pub fn is_registered(&self, index: TemplateIndex) -> bool {
        self.registered.contains(&index)
    }

    pub fn clear(&mut self) {
        self.registered.clear();
    }

    /// First registered template matching the object's type mask and style
    pub fn find(
        &self,
        protocol: &Protocol,
        object_type_mask: u32,
        style: u8,
    ) -> Option<TemplateIndex> {
        self.registered.iter().copied().find(|index| {
            protocol
                .selectron(*index)
                .is_some_and(|template| template.matches(object_type_mask, style))
        })
    }
}
