use async_trait::async_trait;

use coplay_core::error::{CoplayError, Result};
use coplay_core::protocol::{encode, Message, MessageKind, PrivateChat, UserRef};

use crate::dispatch::Handler;
use crate::obs::ServerMetrics;
use crate::realtime::RealtimeCtx;

/// Reply text when a `pm` names a session that is not connected.
pub const INVALID_PM_TARGET: &str = "Invalid target player for pm";

/// Public chat and private messages.
///
/// `chat` is fanned out unchanged to every connected session, the sender
/// included. `pm` goes to exactly the named receiver; a miss is answered with
/// a server-authored `pm` back to the sender.
#[derive(Default)]
pub struct ChatService;

impl ChatService {
    pub fn new() -> Self {
        Self
    }

    fn private(&self, ctx: &RealtimeCtx, pm: &PrivateChat) -> Result<()> {
        pm.sender()?;
        pm.message()?;
        let receiver = pm.receiver()?;

        let target = ctx
            .core()
            .sessions
            .lookup_str(receiver)
            .filter(|s| !s.connection().is_closed());
        let Some(target) = target else {
            return Self::miss(ctx, receiver);
        };

        // The target may disconnect between lookup and delivery.
        match target.connection().try_deliver(target.id(), encode(pm.envelope())?) {
            Ok(()) => Ok(()),
            Err(_) if target.connection().is_closed() => Self::miss(ctx, receiver),
            Err(e) => {
                ServerMetrics::inc(&ctx.core().metrics.delivery_failures);
                Err(e)
            }
        }
    }

    fn miss(ctx: &RealtimeCtx, receiver: &str) -> Result<()> {
        tracing::debug!(sender = %ctx.sender().id, receiver, "pm target not connected");
        let reply = PrivateChat::new(
            UserRef::server(),
            ctx.sender().id.to_string(),
            INVALID_PM_TARGET,
        );
        ctx.reply(reply.envelope())
    }
}

#[async_trait]
impl Handler for ChatService {
    fn name(&self) -> &'static str {
        "chat"
    }

    fn accepts(&self) -> &'static [MessageKind] {
        &[MessageKind::Chat, MessageKind::PrivateChat]
    }

    async fn handle(&self, ctx: RealtimeCtx, msg: Message) -> Result<()> {
        match msg {
            Message::Chat(chat) => {
                chat.sender()?;
                chat.message()?;
                ctx.broadcast(chat.envelope()).map(|_| ())
            }
            Message::PrivateChat(pm) => self.private(&ctx, &pm),
            other => Err(CoplayError::Internal(format!(
                "chat service got {}",
                other.envelope().kind()
            ))),
        }
    }
}
