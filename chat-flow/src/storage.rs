use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;

use crate::{error::Result, flow::Flow, session::Session};

/// Storage for flow definitions.
#[async_trait]
pub trait FlowStorage: Send + Sync {
    async fn save(&self, id: String, flow: Arc<Flow>) -> Result<()>;
    async fn get(&self, id: &str) -> Result<Option<Arc<Flow>>>;
    async fn delete(&self, id: &str) -> Result<()>;
}

/// Storage for conversation sessions.
#[async_trait]
pub trait SessionStorage: Send + Sync {
    async fn save(&self, session: Session) -> Result<()>;
    async fn get(&self, id: &str) -> Result<Option<Session>>;
    async fn delete(&self, id: &str) -> Result<()>;
}

/// In-memory implementation of [`FlowStorage`].
#[derive(Default)]
pub struct InMemoryFlowStorage {
    flows: Arc<DashMap<String, Arc<Flow>>>,
}

impl InMemoryFlowStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FlowStorage for InMemoryFlowStorage {
    async fn save(&self, id: String, flow: Arc<Flow>) -> Result<()> {
        self.flows.insert(id, flow);
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<Arc<Flow>>> {
        Ok(self.flows.get(id).map(|entry| entry.clone()))
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.flows.remove(id);
        Ok(())
    }
}

/// In-memory implementation of [`SessionStorage`].
#[derive(Default)]
pub struct InMemorySessionStorage {
    sessions: Arc<DashMap<String, Session>>,
}

impl InMemorySessionStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStorage for InMemorySessionStorage {
    async fn save(&self, session: Session) -> Result<()> {
        self.sessions.insert(session.id.clone(), session);
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<Session>> {
        Ok(self.sessions.get(id).map(|entry| entry.clone()))
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.sessions.remove(id);
        Ok(())
    }
}
