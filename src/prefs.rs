//! String key/value preferences that outlive a session.

use std::collections::BTreeMap;
use thiserror::Error;

/// Key holding the persisted [`Theme`](crate::theme::Theme).
pub const THEME_KEY: &str = "appTheme";

/// Key holding the persisted [`SheetState`](crate::layout::SheetState).
pub const SHEET_KEY: &str = "hudSheet";

/// Every key this application writes.
pub const KEYS: [&str; 2] = [THEME_KEY, SHEET_KEY];

#[derive(Error, Debug)]
pub enum PrefsError {
    #[error("preference storage is not available")]
    Unavailable,
    #[error("storage rejected '{key}': {reason}")]
    Rejected { key: String, reason: String },
}

/// Minimal key/value capability the controllers persist through.
pub trait PreferenceStore {
    fn get(&self, key: &str) -> Option<String>;

    fn set(&mut self, key: &str, value: &str) -> Result<(), PrefsError>;
}

/// Writes `value` under `key`, logging instead of propagating a failure.
/// The caller keeps its in-memory state either way.
pub fn persist(store: &mut impl PreferenceStore, key: &str, value: &str) {
    if let Err(err) = store.set(key, value) {
        log::warn!("Could not persist {key}={value}: {err}");
    }
}

/// In-memory store. Also used as the live mirror of the platform storage,
/// which is written back when the app saves.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the store from another backend for the given keys.
    pub fn seeded<F>(keys: &[&str], mut lookup: F) -> Self
    where
        F: FnMut(&str) -> Option<String>,
    {
        let values = keys
            .iter()
            .filter_map(|key| lookup(key).map(|value| ((*key).to_owned(), value)))
            .collect();
        Self { values }
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl PreferenceStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), PrefsError> {
        self.values.insert(key.to_owned(), value.to_owned());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct ReadOnly;

    impl PreferenceStore for ReadOnly {
        fn get(&self, _key: &str) -> Option<String> {
            None
        }

        fn set(&mut self, key: &str, _value: &str) -> Result<(), PrefsError> {
            Err(PrefsError::Rejected {
                key: key.to_owned(),
                reason: "quota exceeded".to_owned(),
            })
        }
    }

    #[test]
    fn seeded_only_copies_present_keys() {
        let store = MemoryStore::seeded(&KEYS, |key| {
            (key == THEME_KEY).then(|| "light".to_owned())
        });
        assert_eq!(store.get(THEME_KEY).as_deref(), Some("light"));
        assert_eq!(store.get(SHEET_KEY), None);
        assert_eq!(store.entries().count(), 1);
    }

    #[test]
    fn persist_swallows_write_failures() {
        let mut store = ReadOnly;
        persist(&mut store, THEME_KEY, "dark");
        assert_eq!(store.get(THEME_KEY), None);
    }
}
