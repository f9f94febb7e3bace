use futures_channel::mpsc::UnboundedReceiver;

use super::Store;

/// Which channel the chat view has open.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatStore {
    active_channel: Store<Option<String>>,
}

impl ChatStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active_channel(&self) -> Option<String> {
        self.active_channel.get()
    }

    pub fn set_active_channel(&self, channel_id: impl Into<String>) {
        self.active_channel.set(Some(channel_id.into()));
    }

    pub fn clear_active_channel(&self) {
        self.active_channel.set(None);
    }

    pub fn changes(&self) -> UnboundedReceiver<Option<String>> {
        self.active_channel.changes()
    }

    pub fn store(&self) -> &Store<Option<String>> {
        &self.active_channel
    }
}
