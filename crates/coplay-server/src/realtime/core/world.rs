use std::sync::atomic::{AtomicU8, Ordering};

use tokio::sync::RwLock;

use coplay_core::protocol::{Payload, WorldDelta};

/// Shared game world held by the server: the merged world entries, the
/// authoritative game speed, and the last in-memory save checkpoint.
#[derive(Default)]
pub struct WorldState {
    entries: RwLock<Payload>,
    checkpoint: RwLock<Option<Payload>>,
    speed: AtomicU8,
}

impl WorldState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge a delta. Additions overwrite existing entries; removals drop the
    /// named keys and ignore the values. Returns how many entries changed.
    pub async fn apply(&self, delta: &WorldDelta, addition: bool) -> usize {
        let mut entries = self.entries.write().await;
        let mut touched = 0;
        for (key, value) in delta.entries.iter() {
            if addition {
                entries.insert(key, value.clone());
                touched += 1;
            } else if entries.remove(key).is_some() {
                touched += 1;
            }
        }
        touched
    }

    pub async fn snapshot(&self) -> WorldDelta {
        WorldDelta::new(self.entries.read().await.clone())
    }

    /// Keep a copy of the current world. Returns the number of entries saved.
    pub async fn save(&self) -> usize {
        let current = self.entries.read().await.clone();
        let n = current.len();
        *self.checkpoint.write().await = Some(current);
        n
    }

    pub async fn last_checkpoint(&self) -> Option<WorldDelta> {
        self.checkpoint.read().await.clone().map(WorldDelta::new)
    }

    pub fn speed(&self) -> u8 {
        self.speed.load(Ordering::Relaxed)
    }

    pub fn set_speed(&self, speed: u8) {
        self.speed.store(speed, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coplay_core::protocol::Value;

    fn delta(pairs: &[(&str, i64)]) -> WorldDelta {
        WorldDelta::new(pairs.iter().map(|(k, v)| (*k, Value::Int(*v))).collect())
    }

    #[tokio::test]
    async fn additions_merge_and_removals_drop() {
        let world = WorldState::new();
        assert_eq!(world.apply(&delta(&[("a", 1), ("b", 2)]), true).await, 2);
        assert_eq!(world.apply(&delta(&[("a", 9)]), true).await, 1);
        assert_eq!(world.apply(&delta(&[("b", 0), ("zzz", 0)]), false).await, 1);

        let snap = world.snapshot().await;
        assert_eq!(snap.entries.get("a"), Some(&Value::Int(9)));
        assert!(snap.entries.get("b").is_none());
    }

    #[tokio::test]
    async fn save_keeps_a_copy() {
        let world = WorldState::new();
        world.apply(&delta(&[("a", 1)]), true).await;
        assert_eq!(world.save().await, 1);
        world.apply(&delta(&[("a", 1)]), false).await;

        let saved = world.last_checkpoint().await.unwrap();
        assert_eq!(saved.entries.len(), 1);
        assert!(world.snapshot().await.is_empty());
    }
}
