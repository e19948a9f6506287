//! RCON connection and client.

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use serenity::async_trait;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::bridge::adapters::ConsoleClient;
use crate::common::error::{ConsoleError, ConsoleResult};
use crate::config::types::RconConfig;
use crate::protocol::rcon::codec::{
    new_rcon_framed, RconFramed, RconPacket, AUTH_FAILED_ID, SERVERDATA_AUTH,
    SERVERDATA_AUTH_RESPONSE, SERVERDATA_EXECCOMMAND, SERVERDATA_RESPONSE_VALUE,
};

/// Deadline for one round-trip, including a reconnect.
pub const EXECUTE_TIMEOUT: Duration = Duration::from_secs(2);

/// A single RCON session over any byte stream.
pub struct RconConnection<S> {
    framed: RconFramed<S>,
    last_id: i32,
}

impl<S: AsyncRead + AsyncWrite + Unpin> RconConnection<S> {
    pub fn new(stream: S) -> Self {
        Self {
            framed: new_rcon_framed(stream),
            last_id: 0,
        }
    }

    /// Positive request ids, never colliding with the auth failure id.
    fn next_id(&mut self) -> i32 {
        self.last_id = self.last_id.checked_add(1).unwrap_or(1);
        self.last_id
    }

    async fn receive(&mut self) -> ConsoleResult<RconPacket> {
        match self.framed.next().await {
            Some(packet) => packet,
            None => Err(ConsoleError::ConnectionClosed),
        }
    }

    /// Log in with the RCON password.
    pub async fn authenticate(&mut self, password: &str) -> ConsoleResult<()> {
        let id = self.next_id();
        self.framed
            .send(RconPacket::new(id, SERVERDATA_AUTH, password))
            .await?;

        loop {
            let packet = self.receive().await?;
            if packet.kind != SERVERDATA_AUTH_RESPONSE {
                // Servers send an empty response value ahead of the auth result.
                continue;
            }
            if packet.id == AUTH_FAILED_ID {
                return Err(ConsoleError::AuthRejected);
            }
            if packet.id == id {
                return Ok(());
            }
            debug!("Skipping auth response for unknown id {}", packet.id);
        }
    }

    /// Run one command and return its output.
    pub async fn execute(&mut self, command: &str) -> ConsoleResult<String> {
        let id = self.next_id();
        self.framed
            .send(RconPacket::new(id, SERVERDATA_EXECCOMMAND, command))
            .await?;

        loop {
            let packet = self.receive().await?;
            if packet.kind == SERVERDATA_RESPONSE_VALUE && packet.id == id {
                return Ok(packet.body);
            }
            debug!(id = packet.id, kind = packet.kind, "Skipping unrelated RCON frame");
        }
    }
}

/// RCON client with one persistent, lazily (re)established connection.
pub struct RconClient {
    address: String,
    password: String,
    timeout: Duration,
    connection: Mutex<Option<RconConnection<TcpStream>>>,
}

impl RconClient {
    pub fn new(config: &RconConfig) -> Self {
        Self::with_timeout(config.address(), config.password.clone(), EXECUTE_TIMEOUT)
    }

    pub fn with_timeout(address: String, password: String, timeout: Duration) -> Self {
        Self {
            address,
            password,
            timeout,
            connection: Mutex::new(None),
        }
    }

    async fn connect(&self) -> ConsoleResult<RconConnection<TcpStream>> {
        let stream = TcpStream::connect(&self.address)
            .await
            .map_err(|e| ConsoleError::ConnectFailed {
                address: self.address.clone(),
                source: e,
            })?;
        let mut connection = RconConnection::new(stream);
        connection.authenticate(&self.password).await?;
        info!("Connected to Factorio RCON at {}", self.address);
        Ok(connection)
    }

    async fn round_trip(
        &self,
        slot: &mut Option<RconConnection<TcpStream>>,
        command: &str,
    ) -> ConsoleResult<String> {
        if slot.is_none() {
            *slot = Some(self.connect().await?);
        }
        match slot.as_mut() {
            Some(connection) => connection.execute(command).await,
            None => Err(ConsoleError::ConnectionClosed),
        }
    }
}

#[async_trait]
impl ConsoleClient for RconClient {
    async fn execute(&self, command: &str) -> ConsoleResult<String> {
        // Holding the lock for the whole round-trip keeps responses paired
        // with their requests.
        let mut slot = self.connection.lock().await;

        let result = match tokio::time::timeout(self.timeout, self.round_trip(&mut slot, command)).await {
            Ok(result) => result,
            Err(_) => Err(ConsoleError::Timeout),
        };

        if let Err(ref e) = result {
            if slot.take().is_some() {
                warn!("Dropping RCON connection after error: {}", e);
            }
        }
        result
    }
}
