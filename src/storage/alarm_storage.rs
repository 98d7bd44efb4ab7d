use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::alarm::{Alarm, AlarmId, NewAlarm};

#[async_trait]
pub trait AlarmStorage: Send + Sync {
    async fn insert(&self, alarm: NewAlarm) -> anyhow::Result<Alarm>;
    async fn update(&self, alarm: Alarm) -> anyhow::Result<Alarm>;
    async fn get(&self, id: AlarmId) -> Option<Alarm>;
    /// All alarms in creation order.
    async fn get_all(&self) -> Vec<Alarm>;
    async fn delete(&self, id: AlarmId) -> anyhow::Result<Alarm>;
}

struct InMemoryAlarmStore {
    next_id: u64,
    alarms: BTreeMap<AlarmId, Alarm>,
}

pub struct InMemoryAlarmStorage {
    store: RwLock<InMemoryAlarmStore>,
}

impl InMemoryAlarmStorage {
    pub fn new() -> Self {
        InMemoryAlarmStorage {
            store: RwLock::new(InMemoryAlarmStore {
                next_id: 1,
                alarms: BTreeMap::new(),
            }),
        }
    }
}

impl Default for InMemoryAlarmStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AlarmStorage for InMemoryAlarmStorage {
    async fn insert(&self, alarm: NewAlarm) -> anyhow::Result<Alarm> {
        let mut store = self.store.write().await;
        let id = AlarmId::new(store.next_id);
        let alarm = alarm.into_alarm(id);

        store.alarms.insert(id, alarm.clone());
        store.next_id += 1;

        log::debug!("Stored alarm {}", id);
        Ok(alarm)
    }

    async fn update(&self, alarm: Alarm) -> anyhow::Result<Alarm> {
        let mut store = self.store.write().await;
        match store.alarms.get_mut(&alarm.id) {
            Some(stored) => {
                *stored = alarm.clone();
                Ok(alarm)
            }
            None => anyhow::bail!("Alarm {} does not exist", alarm.id),
        }
    }

    async fn get(&self, id: AlarmId) -> Option<Alarm> {
        let store = self.store.read().await;
        store.alarms.get(&id).cloned()
    }

    async fn get_all(&self) -> Vec<Alarm> {
        let store = self.store.read().await;
        store.alarms.values().cloned().collect()
    }

    async fn delete(&self, id: AlarmId) -> anyhow::Result<Alarm> {
        let mut store = self.store.write().await;
        store
            .alarms
            .remove(&id)
            .ok_or_else(|| anyhow::anyhow!("Alarm {} does not exist", id))
    }
}
