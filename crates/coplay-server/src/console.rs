//! Operator console: line commands read from stdin by the server binary.

use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use coplay_core::error::{CoplayError, Result};
use coplay_core::protocol::{GameSpeed, ServerChat, SessionId, SpeedMode, MAX_GAME_SPEED};

use crate::app_state::AppState;
use crate::realtime::RealtimeCore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Say(String),
    Users,
    Kick(SessionId),
    Speed(u8),
    Save,
    Stop,
}

impl ConsoleCommand {
    /// `Ok(None)` for a blank line.
    pub fn parse(line: &str) -> Result<Option<Self>> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }
        let (cmd, rest) = match line.split_once(char::is_whitespace) {
            Some((cmd, rest)) => (cmd, rest.trim()),
            None => (line, ""),
        };

        let parsed = match cmd {
            "say" if !rest.is_empty() => ConsoleCommand::Say(rest.to_string()),
            "say" => return Err(CoplayError::BadRequest("usage: say <text>".into())),
            "users" => ConsoleCommand::Users,
            "kick" => ConsoleCommand::Kick(
                rest.parse()
                    .map_err(|_| CoplayError::BadRequest("usage: kick <id>".into()))?,
            ),
            "speed" => {
                let speed = rest
                    .parse::<u8>()
                    .ok()
                    .filter(|s| *s <= MAX_GAME_SPEED)
                    .ok_or_else(|| {
                        CoplayError::BadRequest(format!("usage: speed <0..{MAX_GAME_SPEED}>"))
                    })?;
                ConsoleCommand::Speed(speed)
            }
            "save" => ConsoleCommand::Save,
            "stop" => ConsoleCommand::Stop,
            other => return Err(CoplayError::BadRequest(format!("unknown command: {other}"))),
        };
        Ok(Some(parsed))
    }
}

/// Run one command against the live server. Returns the text to show the
/// operator. `Stop` only disconnects everyone; stopping the listener is the
/// caller's job.
pub async fn execute(core: &RealtimeCore, cmd: ConsoleCommand) -> Result<String> {
    match cmd {
        ConsoleCommand::Say(text) => {
            let reached = core.broadcast(ServerChat::info(text).envelope())?;
            Ok(format!("sent to {reached} session(s)"))
        }
        ConsoleCommand::Users => {
            let users = core.sessions.users();
            if users.is_empty() {
                return Ok("no users connected".into());
            }
            Ok(users
                .iter()
                .map(|u| format!("{} {}", u.id, u.name))
                .collect::<Vec<_>>()
                .join("\n"))
        }
        ConsoleCommand::Kick(id) => match core.kick(id) {
            Some(session) => Ok(format!("kicked {} ({id})", session.display_name())),
            None => Err(CoplayError::SessionNotFound(id.get())),
        },
        ConsoleCommand::Speed(speed) => {
            core.world.set_speed(speed);
            core.broadcast(GameSpeed::new(speed, SpeedMode::Set).envelope())?;
            Ok(format!("game speed set to {speed}"))
        }
        ConsoleCommand::Save => {
            let saved = core.world.save().await;
            Ok(format!("saved {saved} world entries"))
        }
        ConsoleCommand::Stop => {
            core.broadcast(ServerChat::info("Server is shutting down").envelope())?;
            let sessions = core.sessions.snapshot();
            for session in &sessions {
                core.kick(session.id());
            }
            Ok(format!("disconnected {} session(s)", sessions.len()))
        }
    }
}

/// Read commands until `stop` or end of input.
pub async fn run<R>(app: AppState, input: R)
where
    R: AsyncBufRead + Unpin,
{
    let core = app.realtime();
    let mut lines = input.lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                tracing::warn!(error = %e, "console read failed");
                break;
            }
        };
        let cmd = match ConsoleCommand::parse(&line) {
            Ok(Some(cmd)) => cmd,
            Ok(None) => continue,
            Err(e) => {
                println!("{e}");
                continue;
            }
        };
        let stop = cmd == ConsoleCommand::Stop;
        match execute(&core, cmd).await {
            Ok(out) => println!("{out}"),
            Err(e) => println!("{e}"),
        }
        if stop {
            tracing::info!("stop requested from console");
            app.request_shutdown();
            break;
        }
    }
}
