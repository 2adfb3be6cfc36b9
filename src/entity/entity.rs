use std::fmt;

use serde::{Deserialize, Serialize};

use super::EventRecord;

/// Event journal embedded in every aggregate.
///
/// Commands append records through [`Entity::digest`]; the repository
/// persists the records and aggregates are rebuilt by replaying them. While
/// replaying, `digest` is a no-op so re-running a command method does not
/// record it twice.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct Entity {
    id: String,
    version: u64,
    events: Vec<EventRecord>,
    #[serde(skip, default)]
    replaying: bool,
    #[serde(skip, default)]
    committed_version: u64,
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entity")
            .field("id", &self.id)
            .field("version", &self.version)
            .field("committed_version", &self.committed_version)
            .field("pending", &self.new_events().len())
            .finish()
    }
}

impl Entity {
    pub fn new() -> Self {
        Entity::default()
    }

    pub fn with_id(id: impl Into<String>) -> Self {
        Entity {
            id: id.into(),
            ..Entity::default()
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = id.into();
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Version the entity had when it was loaded or last committed.
    pub fn committed_version(&self) -> u64 {
        self.committed_version
    }

    pub fn events(&self) -> &[EventRecord] {
        &self.events
    }

    /// Events recorded since load or the last commit.
    pub fn new_events(&self) -> &[EventRecord] {
        &self.events[self.committed_version as usize..]
    }

    pub fn has_changes(&self) -> bool {
        self.version > self.committed_version
    }

    pub fn mark_committed(&mut self) {
        self.committed_version = self.version;
    }

    /// Append an event. The payload is encoded with bitcode.
    pub fn digest<T: Serialize + ?Sized>(&mut self, name: impl Into<String>, payload: &T) {
        if self.replaying {
            return;
        }

        let bytes = bitcode::serialize(payload).expect("event payload must be serializable");
        self.version += 1;
        self.events.push(EventRecord::new(name, bytes, self.version));
    }

    pub fn load_from_history(&mut self, history: Vec<EventRecord>) {
        self.version = history.len() as u64;
        self.committed_version = self.version;
        self.events = history;
    }

    pub fn is_replaying(&self) -> bool {
        self.replaying
    }

    pub fn set_replaying(&mut self, replaying: bool) {
        self.replaying = replaying;
    }
}
