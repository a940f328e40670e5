use std::sync::Arc;

use crate::types::TemplateIndex;

mod error;
mod selection_registry;
mod templates;

pub use error::TemplateError;
pub use selection_registry::SelectionRegistry;
pub use templates::{EffectronTemplate, SelectronTemplate};

// Protocol Plugin
pub trait ProtocolPlugin {
    fn build(&self, protocol: &mut Protocol);
}

/// Registry of every effectron and selectron template, shared by server and
/// client. Templates are addressed on the wire by their registration index, so
/// both sides must register the same templates in the same order.
#[derive(Default)]
pub struct Protocol {
    effectrons: Vec<Arc<EffectronTemplate>>,
    selectrons: Vec<Arc<SelectronTemplate>>,
    locked: bool,
}

impl Protocol {
    pub fn builder() -> Self {
        Self::default()
    }

    pub fn add_plugin<P: ProtocolPlugin>(&mut self, plugin: P) -> &mut Self {
        self.check_lock();
        plugin.build(self);
        self
    }

    /// Panics if the template is invalid or the protocol is locked
    pub fn add_effectron(&mut self, template: EffectronTemplate) -> &mut Self {
        if let Err(err) = self.try_add_effectron(template) {
            panic!("{}", err);
        }
        self
    }

    /// Panics if the template is invalid or the protocol is locked
    pub fn add_selectron(&mut self, template: SelectronTemplate) -> &mut Self {
        if let Err(err) = self.try_add_selectron(template) {
            panic!("{}", err);
        }
        self
    }

    // Non-panicking builder methods

    pub fn try_add_effectron(
        &mut self,
        template: EffectronTemplate,
    ) -> Result<&mut Self, TemplateError> {
        self.try_check_lock()?;
        if self.effectron_index(&template.name).is_some() {
            return Err(TemplateError::DuplicateName {
                name: template.name,
            });
        }
        check_capacity(self.effectrons.len(), &template.name)?;
        template.validate()?;
        self.effectrons.push(Arc::new(template));
        Ok(self)
    }

    pub fn try_add_selectron(
        &mut self,
        template: SelectronTemplate,
    ) -> Result<&mut Self, TemplateError> {
        self.try_check_lock()?;
        if self.selectron_index(&template.name).is_some() {
            return Err(TemplateError::DuplicateName {
                name: template.name,
            });
        }
        check_capacity(self.selectrons.len(), &template.name)?;
        template.validate()?;
        self.selectrons.push(Arc::new(template));
        Ok(self)
    }

    pub fn try_lock(&mut self) -> Result<(), TemplateError> {
        self.try_check_lock()?;
        self.locked = true;
        Ok(())
    }

    pub fn lock(&mut self) {
        self.check_lock();
        self.locked = true;
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Returns Err if protocol is locked
    pub fn try_check_lock(&self) -> Result<(), TemplateError> {
        if self.locked {
            Err(TemplateError::AlreadyLocked)
        } else {
            Ok(())
        }
    }

    /// Checks if protocol is locked, panics if it is
    pub fn check_lock(&self) {
        if self.locked {
            panic!("Protocol already locked!");
        }
    }

    pub fn build(&mut self) -> Self {
        std::mem::take(self)
    }

    // Lookup

    pub fn effectron(&self, index: TemplateIndex) -> Option<&Arc<EffectronTemplate>> {
        self.effectrons.get(usize::from(index))
    }

    pub fn effectron_index(&self, name: &str) -> Option<TemplateIndex> {
        self.effectrons
            .iter()
            .position(|template| template.name == name)
            .and_then(|index| TemplateIndex::try_from(index).ok())
    }

    pub fn effectron_count(&self) -> TemplateIndex {
        self.effectrons.len() as TemplateIndex
    }

    pub fn selectron(&self, index: TemplateIndex) -> Option<&Arc<SelectronTemplate>> {
        self.selectrons.get(usize::from(index))
    }

    pub fn selectron_index(&self, name: &str) -> Option<TemplateIndex> {
        self.selectrons
            .iter()
            .position(|template| template.name == name)
            .and_then(|index| TemplateIndex::try_from(index).ok())
    }

    pub fn selectron_count(&self) -> TemplateIndex {
        self.selectrons.len() as TemplateIndex
    }
}

fn check_capacity(len: usize, name: &str) -> Result<(), TemplateError> {
    if len >= usize::from(TemplateIndex::MAX) {
        return Err(TemplateError::TooManyTemplates {
            name: name.to_string(),
        });
    }
    Ok(())
}
