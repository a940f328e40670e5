mod phrase;
mod phrase_template;

pub use phrase::{Phrase, PhraseFilter};
pub use phrase_template::PhraseTemplate;
