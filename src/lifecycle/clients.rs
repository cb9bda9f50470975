//! Registry of open application instances (clients)

use parking_lot::RwLock;
use std::collections::HashMap;
use std::time::SystemTime;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientInfo {
    pub id: Uuid,
    /// URL the instance was opened at
    pub url: String,
    /// Whether this worker intercepts the instance's requests
    pub controlled: bool,
    pub connected_at: SystemTime,
}

#[derive(Default)]
pub struct ClientRegistry {
    clients: RwLock<HashMap<Uuid, ClientInfo>>,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, url: impl Into<String>, controlled: bool) -> Uuid {
        let info = ClientInfo {
            id: Uuid::new_v4(),
            url: url.into(),
            controlled,
            connected_at: SystemTime::now(),
        };
        let id = info.id;
        tracing::debug!(client = %id, url = %info.url, controlled, "Client connected");
        self.clients.write().insert(id, info);
        id
    }

    /// Returns true if the client was known
    pub fn unregister(&self, id: &Uuid) -> bool {
        let removed = self.clients.write().remove(id).is_some();
        if removed {
            tracing::debug!(client = %id, "Client disconnected");
        }
        removed
    }

    /// Take control of every open client; returns how many were newly claimed
    pub fn claim(&self) -> usize {
        let mut clients = self.clients.write();
        let mut claimed = 0;
        for client in clients.values_mut().filter(|c| !c.controlled) {
            client.controlled = true;
            claimed += 1;
        }
        claimed
    }

    pub fn get(&self, id: &Uuid) -> Option<ClientInfo> {
        self.clients.read().get(id).cloned()
    }

    pub fn is_controlled(&self, id: &Uuid) -> bool {
        self.clients.read().get(id).is_some_and(|c| c.controlled)
    }

    pub fn controlled_count(&self) -> usize {
        self.clients.read().values().filter(|c| c.controlled).count()
    }

    pub fn len(&self) -> usize {
        self.clients.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.read().is_empty()
    }
}
