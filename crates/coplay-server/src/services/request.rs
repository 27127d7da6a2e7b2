use async_trait::async_trait;

use coplay_core::error::{CoplayError, Result};
use coplay_core::protocol::{Message, MessageKind, Response, ServerChat, Value};

use crate::dispatch::Handler;
use crate::realtime::RealtimeCtx;

/// Answers `request` messages with a `response` of the same name.
///
/// Known requests: `userlist`, `gameworld`, `save`. Anything else is answered
/// with a server error chat.
#[derive(Default)]
pub struct RequestService;

impl RequestService {
    pub fn new() -> Self {
        Self
    }

    async fn answer(&self, ctx: &RealtimeCtx, request: &str) -> Result<()> {
        let core = ctx.core();
        let reply = match request {
            "userlist" => {
                let users: Vec<Value> = core.sessions.users().into_iter().map(Value::from).collect();
                Response::new(request, users).into_envelope()
            }
            "gameworld" => Response::new(request, core.world.snapshot().await).into_envelope(),
            "save" => {
                let saved = core.world.save().await;
                tracing::info!(sender = %ctx.sender().id, entries = saved, "world saved on request");
                Response::new(request, true).into_envelope()
            }
            other => ServerChat::error(format!("Unknown request: {other}")).into_envelope(),
        };
        ctx.reply(&reply)
    }
}

#[async_trait]
impl Handler for RequestService {
    fn name(&self) -> &'static str {
        "request"
    }

    fn accepts(&self) -> &'static [MessageKind] {
        &[MessageKind::Request]
    }

    async fn handle(&self, ctx: RealtimeCtx, msg: Message) -> Result<()> {
        let Message::Request(req) = msg else {
            return Err(CoplayError::Internal("request service got a foreign kind".into()));
        };
        self.answer(&ctx, req.request()?).await
    }
}
