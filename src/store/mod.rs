pub mod creation_store;

pub use creation_store::{CreationStore, WizardStep};
