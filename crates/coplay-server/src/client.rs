//! WebSocket client for the coplay protocol.
//!
//! Connects, performs the login exchange, then sends and receives envelopes
//! one per binary frame.

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use coplay_core::error::{CoplayError, Result};
use coplay_core::protocol::{decode_message, encode, Envelope, Login, Message, SessionId, UserRef, Value};

type Stream = WebSocketStream<MaybeTlsStream<TcpStream>>;

pub struct Client {
    stream: Stream,
    me: UserRef,
}

impl Client {
    /// Connect to `ws://{address}:{port}/v1/ws` and log in. A refused login is
    /// returned as `AuthFailed` carrying the server's reason string.
    pub async fn connect(address: &str, port: u16, username: &str, password: &str) -> Result<Self> {
        let url = format!("ws://{address}:{port}/v1/ws");
        let (mut stream, _response) = connect_async(url.as_str())
            .await
            .map_err(|e| CoplayError::Transport(format!("connect {url}: {e}")))?;

        let unique_id = uuid::Uuid::new_v4().to_string();
        let login = Login::new(username, password, unique_id);
        send_on(&mut stream, login.envelope()).await?;

        let reply = loop {
            match recv_on(&mut stream).await? {
                Message::Response(resp) if resp.response_type()? == "login" => break resp,
                other => {
                    tracing::debug!(kind = other.envelope().kind(), "ignored before login reply");
                }
            }
        };

        match reply.data()? {
            Value::User(me) => {
                tracing::debug!(id = %me.id, name = %me.name, "logged in");
                let me = me.clone();
                Ok(Self { stream, me })
            }
            Value::Str(reason) => Err(CoplayError::AuthFailed(reason.clone())),
            other => Err(CoplayError::Decode(format!(
                "login reply carried {}",
                other.type_name()
            ))),
        }
    }

    pub fn me(&self) -> &UserRef {
        &self.me
    }

    pub fn id(&self) -> SessionId {
        self.me.id
    }

    pub async fn send(&mut self, env: &Envelope) -> Result<()> {
        send_on(&mut self.stream, env).await
    }

    /// Next message from the server. Control frames are skipped.
    pub async fn recv(&mut self) -> Result<Message> {
        recv_on(&mut self.stream).await
    }

    pub async fn disconnect(mut self) -> Result<()> {
        self.stream
            .close(None)
            .await
            .map_err(|e| CoplayError::Transport(e.to_string()))
    }
}

async fn send_on(stream: &mut Stream, env: &Envelope) -> Result<()> {
    let bytes = encode(env)?;
    stream
        .send(WsMessage::Binary(bytes.to_vec()))
        .await
        .map_err(|e| CoplayError::Transport(e.to_string()))
}

async fn recv_on(stream: &mut Stream) -> Result<Message> {
    loop {
        let frame = stream
            .next()
            .await
            .ok_or_else(|| CoplayError::Transport("connection closed".into()))?
            .map_err(|e| CoplayError::Transport(e.to_string()))?;
        match frame {
            WsMessage::Binary(b) => return decode_message(&b),
            WsMessage::Text(s) => return decode_message(s.as_bytes()),
            WsMessage::Close(_) => return Err(CoplayError::Transport("connection closed".into())),
            _ => continue,
        }
    }
}
