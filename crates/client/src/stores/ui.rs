use std::sync::Arc;

use futures_channel::mpsc::UnboundedReceiver;
use serde::{Deserialize, Serialize};

use super::Store;
use crate::storage::{self, PreferenceStorage};

/// Storage key the UI preferences are persisted under.
pub const UI_STORAGE_KEY: &str = "teamspace-ui";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
    #[default]
    System,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UiPreferences {
    pub sidebar_collapsed: bool,
    pub theme: Theme,
}

/// UI preferences, rehydrated from storage on construction and written back
/// on every change.
#[derive(Clone)]
pub struct UiStore {
    prefs: Store<UiPreferences>,
    storage: Arc<dyn PreferenceStorage>,
}

impl std::fmt::Debug for UiStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UiStore").field("prefs", &self.prefs).finish()
    }
}

impl PartialEq for UiStore {
    fn eq(&self, other: &Self) -> bool {
        self.prefs == other.prefs
    }
}

impl UiStore {
    pub fn new(storage: Arc<dyn PreferenceStorage>) -> Self {
        let prefs = storage::load::<UiPreferences>(storage.as_ref(), UI_STORAGE_KEY)
            .unwrap_or_default();
        Self {
            prefs: Store::new(prefs),
            storage,
        }
    }

    pub fn get(&self) -> UiPreferences {
        self.prefs.get()
    }

    pub fn update<F: FnOnce(&mut UiPreferences)>(&self, f: F) {
        self.prefs.update(f);
        self.persist();
    }

    pub fn set_sidebar_collapsed(&self, collapsed: bool) {
        self.update(|p| p.sidebar_collapsed = collapsed);
    }

    pub fn toggle_sidebar(&self) {
        self.update(|p| p.sidebar_collapsed = !p.sidebar_collapsed);
    }

    pub fn set_theme(&self, theme: Theme) {
        self.update(|p| p.theme = theme);
    }

    pub fn changes(&self) -> UnboundedReceiver<UiPreferences> {
        self.prefs.changes()
    }

    pub fn store(&self) -> &Store<UiPreferences> {
        &self.prefs
    }

    fn persist(&self) {
        if let Err(e) = storage::save(self.storage.as_ref(), UI_STORAGE_KEY, &self.prefs.get()) {
            crate::log_warn!("failed to persist UI preferences: {}", e);
        }
    }
}
