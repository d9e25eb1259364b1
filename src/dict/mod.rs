pub mod manager;
pub mod personal;

pub use personal::{DictionaryEvent, PersonalDictionary};
