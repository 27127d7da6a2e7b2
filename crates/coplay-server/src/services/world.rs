use async_trait::async_trait;

use coplay_core::error::{CoplayError, Result};
use coplay_core::protocol::{GameSpeed, GameWorld, Message, MessageKind, ServerChat, SpeedMode};

use crate::dispatch::Handler;
use crate::realtime::RealtimeCtx;

/// Shared world edits and game speed.
///
/// `gameworld` deltas are merged into the server's world and then fanned out
/// to every session. `gamespeed` with mode `Set` changes the authoritative
/// speed; `Vote` is relayed as-is so peers can tally it.
#[derive(Default)]
pub struct WorldService;

impl WorldService {
    pub fn new() -> Self {
        Self
    }

    async fn world(&self, ctx: &RealtimeCtx, gw: &GameWorld) -> Result<()> {
        let addition = gw.is_addition()?;
        let touched = ctx.core().world.apply(gw.changes()?, addition).await;
        tracing::debug!(sender = %ctx.sender().id, addition, touched, "world delta applied");
        ctx.broadcast(gw.envelope()).map(|_| ())
    }

    fn speed(&self, ctx: &RealtimeCtx, gs: &GameSpeed) -> Result<()> {
        let (speed, mode) = match (gs.speed(), gs.mode()) {
            (Ok(s), Ok(m)) => (s, m),
            (Err(e), _) | (_, Err(e)) => {
                return ctx.reply(ServerChat::error(e.to_string()).envelope());
            }
        };
        match mode {
            SpeedMode::Set => {
                ctx.core().world.set_speed(speed);
                tracing::info!(sender = %ctx.sender().id, speed, "game speed set");
                ctx.broadcast(GameSpeed::new(speed, SpeedMode::Set).envelope())
                    .map(|_| ())
            }
            SpeedMode::Vote => ctx.broadcast(gs.envelope()).map(|_| ()),
        }
    }
}

#[async_trait]
impl Handler for WorldService {
    fn name(&self) -> &'static str {
        "world"
    }

    fn accepts(&self) -> &'static [MessageKind] {
        &[MessageKind::GameWorld, MessageKind::GameSpeed]
    }

    async fn handle(&self, ctx: RealtimeCtx, msg: Message) -> Result<()> {
        match msg {
            Message::GameWorld(gw) => self.world(&ctx, &gw).await,
            Message::GameSpeed(gs) => self.speed(&ctx, &gs),
            other => Err(CoplayError::Internal(format!(
                "world service got {}",
                other.envelope().kind()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::realtime::core::test_support::attach;
    use crate::realtime::RealtimeCore;
    use coplay_core::protocol::{decode_message, encode, Envelope, UserRef, Value, WorldDelta};

    fn setup() -> (Arc<RealtimeCore>, RealtimeCtx, tokio::sync::mpsc::Receiver<bytes::Bytes>) {
        let core = Arc::new(RealtimeCore::new(Arc::default()));
        let (id, rx) = attach(&core, "host", 8);
        let ctx = RealtimeCtx::new(UserRef::new(id, "host"), Arc::clone(&core));
        (core, ctx, rx)
    }

    #[tokio::test]
    async fn gameworld_applies_then_broadcasts() {
        let (core, ctx, mut rx) = setup();
        let (_, mut peer) = attach(&core, "peer", 8);
        let gw = GameWorld::new(
            WorldDelta::new([("tree_4", Value::Bool(true))].into_iter().collect()),
            true,
        );
        let wire = encode(gw.envelope()).unwrap();

        WorldService::new()
            .handle(ctx, Message::GameWorld(gw))
            .await
            .unwrap();

        assert_eq!(
            core.world.snapshot().await.entries.get("tree_4"),
            Some(&Value::Bool(true))
        );
        assert_eq!(rx.try_recv().unwrap(), wire);
        assert_eq!(peer.try_recv().unwrap(), wire);
    }

    #[tokio::test]
    async fn set_speed_updates_world() {
        let (core, ctx, mut rx) = setup();
        WorldService::new()
            .handle(ctx, Message::GameSpeed(GameSpeed::new(3, SpeedMode::Set)))
            .await
            .unwrap();

        assert_eq!(core.world.speed(), 3);
        let Message::GameSpeed(gs) = decode_message(&rx.try_recv().unwrap()).unwrap() else {
            panic!("expected gamespeed");
        };
        assert_eq!(gs.speed().unwrap(), 3);
    }

    #[tokio::test]
    async fn vote_is_relayed_without_changing_speed() {
        let (core, ctx, mut rx) = setup();
        WorldService::new()
            .handle(ctx, Message::GameSpeed(GameSpeed::new(2, SpeedMode::Vote)))
            .await
            .unwrap();

        assert_eq!(core.world.speed(), 0);
        assert!(rx.try_recv().is_ok());
    }

    #[tokio::test]
    async fn out_of_range_speed_is_refused() {
        let (core, ctx, mut rx) = setup();
        let mut env = Envelope::new("gamespeed");
        env.insert("type", Value::Int(0)).insert("speed", Value::Int(9));
        let msg = Message::from_envelope(env);

        WorldService::new().handle(ctx, msg).await.unwrap();

        assert_eq!(core.world.speed(), 0);
        let Message::ServerChat(chat) = decode_message(&rx.try_recv().unwrap()).unwrap() else {
            panic!("expected serverchat");
        };
        assert!(chat.message().unwrap().contains("speed"));
    }
}
