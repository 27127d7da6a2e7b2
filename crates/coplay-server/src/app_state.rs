//! Shared application state for the coplay server.
//!
//! Wires RealtimeCore + Dispatcher and registers the built-in services.
//! Startup errors are returned, not panicked on.

use std::sync::Arc;

use tokio::sync::Notify;

use coplay_core::error::Result;

use crate::config::ServerConfig;
use crate::dispatch::Dispatcher;
use crate::obs::ServerMetrics;
use crate::realtime::RealtimeCore;
use crate::services::{ChatService, DataRelayService, RequestService, WorldService};

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
    realtime: Arc<RealtimeCore>,
    dispatcher: Arc<Dispatcher>,
}

struct AppStateInner {
    cfg: ServerConfig,
    shutdown: Notify,
}

impl AppState {
    pub fn new(cfg: ServerConfig) -> Result<Self> {
        let realtime = Arc::new(RealtimeCore::new(Arc::new(ServerMetrics::default())));
        let dispatcher = Dispatcher::new();

        dispatcher.register(Arc::new(ChatService::new()))?;
        dispatcher.register(Arc::new(RequestService::new()))?;
        dispatcher.register(Arc::new(WorldService::new()))?;
        dispatcher.register(Arc::new(DataRelayService::new()))?;

        tracing::debug!(kinds = ?dispatcher.registered_kinds(), "handlers registered");

        Ok(Self {
            inner: Arc::new(AppStateInner {
                cfg,
                shutdown: Notify::new(),
            }),
            realtime,
            dispatcher: Arc::new(dispatcher),
        })
    }

    pub fn cfg(&self) -> &ServerConfig {
        &self.inner.cfg
    }

    pub fn realtime(&self) -> Arc<RealtimeCore> {
        Arc::clone(&self.realtime)
    }

    pub fn dispatcher(&self) -> Arc<Dispatcher> {
        Arc::clone(&self.dispatcher)
    }

    pub fn metrics(&self) -> &ServerMetrics {
        &self.realtime.metrics
    }

    /// Ask the server to stop accepting connections.
    pub fn request_shutdown(&self) {
        self.inner.shutdown.notify_one();
    }

    /// Resolves once `request_shutdown` has been called.
    pub async fn shutdown_requested(&self) {
        self.inner.shutdown.notified().await;
    }
}
