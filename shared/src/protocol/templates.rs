use crate::{
    constraint::{ConstraintDef, ConstraintError},
    phrase::PhraseTemplate,
    protocol::TemplateError,
};

/// A one-shot performance playing a single phrase
#[derive(Clone, Debug, PartialEq)]
pub struct EffectronTemplate {
    pub name: String,
    pub phrase: PhraseTemplate,
    /// Clients that join mid-performance start it partway through
    pub exec_on_new_clients: bool,
}

impl EffectronTemplate {
    pub fn new(name: &str, phrase: PhraseTemplate) -> Self {
        Self {
            name: name.to_string(),
            phrase,
            exec_on_new_clients: false,
        }
    }

    pub fn with_exec_on_new_clients(mut self, exec_on_new_clients: bool) -> Self {
        self.exec_on_new_clients = exec_on_new_clients;
        self
    }

    pub fn constraint_defs(&self) -> Result<Vec<ConstraintDef>, ConstraintError> {
        let mut defs = Vec::new();
        self.phrase.gather_constraint_defs(&mut defs)?;
        Ok(defs)
    }

    pub(crate) fn validate(&self) -> Result<(), TemplateError> {
        validate_phrase(&self.name, &self.phrase)?;
        self.constraint_defs()
            .map(|_| ())
            .map_err(|source| TemplateError::InvalidConstraint {
                name: self.name.clone(),
                source,
            })
    }
}

/// A selection highlight: `main` plays while selected, `select` plays on
/// selection and `deselect` plays once the selection is cleared.
#[derive(Clone, Debug, PartialEq)]
pub struct SelectronTemplate {
    pub name: String,
    pub main: PhraseTemplate,
    pub select: PhraseTemplate,
    pub deselect: PhraseTemplate,
    /// Object type bits this template applies to
    pub selection_type_mask: u32,
    pub selection_style: u8,
    pub exec_on_new_clients: bool,
}

impl SelectronTemplate {
    pub fn new(name: &str, selection_type_mask: u32, selection_style: u8) -> Self {
        Self {
            name: name.to_string(),
            main: PhraseTemplate::default(),
            select: PhraseTemplate::default(),
            deselect: PhraseTemplate::default(),
            selection_type_mask,
            selection_style,
            exec_on_new_clients: true,
        }
    }

    pub fn with_main(mut self, phrase: PhraseTemplate) -> Self {
        self.main = phrase;
        self
    }

    pub fn with_select(mut self, phrase: PhraseTemplate) -> Self {
        self.select = phrase;
        self
    }

    pub fn with_deselect(mut self, phrase: PhraseTemplate) -> Self {
        self.deselect = phrase;
        self
    }

    pub fn with_exec_on_new_clients(mut self, exec_on_new_clients: bool) -> Self {
        self.exec_on_new_clients = exec_on_new_clients;
        self
    }

    /// Style is equal and the type masks share at least one bit
    pub fn matches(&self, object_type_mask: u32, style: u8) -> bool {
        self.selection_style == style && self.selection_type_mask & object_type_mask != 0
    }

    pub fn constraint_defs(&self) -> Result<Vec<ConstraintDef>, ConstraintError> {
        let mut defs = Vec::new();
        self.main.gather_constraint_defs(&mut defs)?;
        self.select.gather_constraint_defs(&mut defs)?;
        self.deselect.gather_constraint_defs(&mut defs)?;
        Ok(defs)
    }

    pub(crate) fn validate(&self) -> Result<(), TemplateError> {
        validate_phrase(&self.name, &self.main)?;
        validate_phrase(&self.name, &self.select)?;
        validate_phrase(&self.name, &self.deselect)?;
        self.constraint_defs()
            .map(|_| ())
            .map_err(|source| TemplateError::InvalidConstraint {
                name: self.name.clone(),
                source,
            })
    }
}

fn validate_phrase(name: &str, phrase: &PhraseTemplate) -> Result<(), TemplateError> {
    let invalid = |reason| TemplateError::InvalidTiming {
        name: name.to_string(),
        reason,
    };
    // negative durations and lifetimes are the endless sentinel
    if phrase.duration.is_nan() || phrase.duration == f32::INFINITY {
        return Err(invalid("duration is not a number"));
    }
    if phrase.loop_count < 0 && phrase.duration <= 0.0 {
        return Err(invalid("endless looping needs a positive duration"));
    }
    for effect in phrase.effects.iter() {
        let timing = &effect.timing;
        if timing.lifetime.is_nan() || timing.lifetime == f32::INFINITY {
            return Err(invalid("lifetime is not a number"));
        }
        let spans = [timing.delay, timing.fade_in, timing.fade_out, timing.residue];
        if spans.iter().any(|span| !span.is_finite()) {
            return Err(invalid("delay, fade or residue is not finite"));
        }
        if timing.delay < 0.0 {
            return Err(invalid("negative delay"));
        }
        if timing.fade_in < 0.0 || timing.fade_out < 0.0 {
            return Err(invalid("negative fade"));
        }
        if timing.residue < 0.0 {
            return Err(invalid("negative residue"));
        }
    }
    Ok(())
}
