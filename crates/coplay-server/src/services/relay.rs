use async_trait::async_trait;

use coplay_core::error::Result;
use coplay_core::protocol::{Message, MessageKind};

use crate::dispatch::Handler;
use crate::realtime::RealtimeCtx;

/// Opaque `data` messages: relayed unchanged to every session.
#[derive(Default)]
pub struct DataRelayService;

impl DataRelayService {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Handler for DataRelayService {
    fn name(&self) -> &'static str {
        "data"
    }

    fn accepts(&self) -> &'static [MessageKind] {
        &[MessageKind::Data]
    }

    async fn handle(&self, ctx: RealtimeCtx, msg: Message) -> Result<()> {
        let reached = ctx.broadcast(msg.envelope())?;
        tracing::trace!(sender = %ctx.sender().id, reached, "data relayed");
        Ok(())
    }
}
