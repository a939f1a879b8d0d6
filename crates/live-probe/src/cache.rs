//! Process-wide room id hint.
//!
//! The live page sometimes omits the room id while the room is still up, so
//! the last id we saw is kept as a fallback. It is a hint only: any freshly
//! extracted id overwrites it.

use std::sync::{Arc, LazyLock};

use parking_lot::RwLock;

static GLOBAL_ROOM_ID: LazyLock<Arc<RoomIdCache>> =
    LazyLock::new(|| Arc::new(RoomIdCache::new()));

#[derive(Debug, Default)]
pub struct RoomIdCache {
    room_id: RwLock<Option<String>>,
}

impl RoomIdCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cache shared by every detector in this process.
    pub fn global() -> Arc<RoomIdCache> {
        Arc::clone(&GLOBAL_ROOM_ID)
    }

    pub fn get(&self) -> Option<String> {
        self.room_id.read().clone()
    }

    pub fn store(&self, room_id: &str) {
        let mut slot = self.room_id.write();
        if slot.as_deref() != Some(room_id) {
            *slot = Some(room_id.to_string());
        }
    }

    pub fn clear(&self) {
        *self.room_id.write() = None;
    }
}
