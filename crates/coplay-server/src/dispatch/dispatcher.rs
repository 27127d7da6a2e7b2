use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;

use coplay_core::error::{CoplayError, Result};
use coplay_core::protocol::{Message, MessageKind};

use crate::realtime::RealtimeCtx;

/// Message handler. Declares the kinds it owns; the dispatcher routes every
/// message of those kinds to it and to nothing else.
#[async_trait]
pub trait Handler: Send + Sync {
    fn name(&self) -> &'static str;
    fn accepts(&self) -> &'static [MessageKind];
    async fn handle(&self, ctx: RealtimeCtx, msg: Message) -> Result<()>;
}

/// What happened to a dispatched message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatched {
    /// A handler ran to completion.
    Handled,
    /// No handler owns this kind (or the kind is unknown); nothing ran.
    Dropped,
}

/// Kind -> handler routing table. Built at startup, read per message.
#[derive(Default)]
pub struct Dispatcher {
    handlers: DashMap<MessageKind, Arc<dyn Handler>>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self {
            handlers: DashMap::new(),
        }
    }

    /// Claim every kind the handler accepts. If any of them already has an
    /// owner the whole registration is refused and the table is unchanged.
    pub fn register(&self, handler: Arc<dyn Handler>) -> Result<()> {
        if let Some(kind) = handler
            .accepts()
            .iter()
            .find(|k| self.handlers.contains_key(*k))
        {
            return Err(CoplayError::DuplicateHandler(kind.tag().to_string()));
        }
        for kind in handler.accepts() {
            self.handlers.insert(*kind, Arc::clone(&handler));
        }
        Ok(())
    }

    pub fn registered_kinds(&self) -> Vec<MessageKind> {
        let mut kinds: Vec<MessageKind> = self.handlers.iter().map(|e| *e.key()).collect();
        kinds.sort();
        kinds
    }

    pub fn handler_for(&self, kind: MessageKind) -> Option<Arc<dyn Handler>> {
        self.handlers.get(&kind).map(|e| Arc::clone(e.value()))
    }

    /// Route one decoded message. Unroutable messages are logged and dropped;
    /// handler errors are returned to the caller.
    pub async fn dispatch(&self, ctx: RealtimeCtx, msg: Message) -> Result<Dispatched> {
        let Some(kind) = msg.kind() else {
            tracing::info!(sender = %ctx.sender().id, kind = msg.envelope().kind(), "unknown kind; dropped");
            return Ok(Dispatched::Dropped);
        };
        let Some(handler) = self.handler_for(kind) else {
            tracing::warn!(sender = %ctx.sender().id, %kind, "no handler registered; dropped");
            return Ok(Dispatched::Dropped);
        };

        tracing::trace!(handler = handler.name(), %kind, "dispatch");
        handler.handle(ctx, msg).await?;
        Ok(Dispatched::Handled)
    }
}
