use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{info, warn};

use crate::config::{ConnectionId, ConnectionOptions, SessionTimings};
use crate::engine::session::SessionEngine;
use crate::error::Result;
use crate::transport::http_transport::HttpTransport;
use crate::transport::traits::Transport;

type Connector =
    Box<dyn Fn(&ConnectionOptions, &SessionTimings) -> Result<Arc<dyn Transport>> + Send + Sync>;

/// One engine per server connection, keyed by [`ConnectionId`].
///
/// Owned by the application root and handed to whoever needs a client.
pub struct ClientRegistry {
    engines: RwLock<HashMap<ConnectionId, Arc<SessionEngine>>>,
    timings: SessionTimings,
    connector: Connector,
}

impl ClientRegistry {
    pub fn new(timings: SessionTimings) -> Self {
        Self::with_connector(timings, |options, timings| {
            let transport = HttpTransport::new(options, timings.request_timeout())?;
            Ok(Arc::new(transport) as Arc<dyn Transport>)
        })
    }

    /// Registry whose engines use transports built by `connector`.
    pub fn with_connector<F>(timings: SessionTimings, connector: F) -> Self
    where
        F: Fn(&ConnectionOptions, &SessionTimings) -> Result<Arc<dyn Transport>>
            + Send
            + Sync
            + 'static,
    {
        Self {
            engines: RwLock::new(HashMap::new()),
            timings,
            connector: Box::new(connector),
        }
    }

    /// Return the engine for `options`, creating it and starting its first
    /// authentication in the background when none exists yet.
    ///
    /// Must be called from within a tokio runtime.
    pub fn get_or_connect(&self, options: ConnectionOptions) -> Result<Arc<SessionEngine>> {
        let id = options.identity();
        if let Some(engine) = self.engines.read().get(&id) {
            return Ok(engine.clone());
        }

        let mut engines = self.engines.write();
        // Double-check after acquiring the write lock.
        if let Some(engine) = engines.get(&id) {
            return Ok(engine.clone());
        }

        let transport = (self.connector)(&options, &self.timings)?;
        let engine = SessionEngine::with_transport(options, self.timings.clone(), transport);
        engines.insert(id.clone(), engine.clone());
        info!("client {} registered", id);

        let connecting = engine.clone();
        tokio::spawn(async move {
            if let Err(e) = connecting.authenticate().await {
                warn!("initial auth for {} failed, retrying in background: {}", id, e);
            }
        });

        Ok(engine)
    }

    pub fn get(&self, id: &ConnectionId) -> Option<Arc<SessionEngine>> {
        self.engines.read().get(id).cloned()
    }

    /// Drop the engine from the registry and stop its timers.
    pub fn remove(&self, id: &ConnectionId) -> Option<Arc<SessionEngine>> {
        let engine = self.engines.write().remove(id)?;
        engine.shutdown();
        info!("client {} removed", id);
        Some(engine)
    }

    pub fn ids(&self) -> Vec<ConnectionId> {
        self.engines.read().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.engines.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.engines.read().is_empty()
    }

    pub fn shutdown_all(&self) {
        let engines: Vec<_> = self.engines.write().drain().collect();
        for (id, engine) in engines {
            engine.shutdown();
            info!("client {} shut down", id);
        }
    }
}
