//! Request/response client with reconnect and bounded retry

use crate::config::ClientConfig;
use log::{debug, warn};
use shared::transport::{read_frame, write_frame, FrameError};
use shared::{Command, Envelope, Request, Response};
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpStream;
use tokio::time::{sleep, timeout};

#[derive(Debug, Error)]
pub enum RpcError {
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },
    #[error("call timed out after {0:?}")]
    Timeout(Duration),
    #[error(transparent)]
    Frame(#[from] FrameError),
    #[error("gave up after {attempts} attempts: {last}")]
    Exhausted { attempts: u32, last: Box<RpcError> },
}

/// Holds at most one open connection and reopens it after any failure.
pub struct RpcClient {
    addr: String,
    stream: Option<TcpStream>,
    call_timeout: Duration,
    attempts: u32,
    retry_delay: Duration,
}

impl RpcClient {
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            addr: config.server_addr.clone(),
            stream: None,
            call_timeout: config.call_timeout,
            attempts: config.retry_attempts.max(1),
            retry_delay: config.retry_delay,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    /// Single attempt; polling skips the tick on failure instead of retrying.
    pub async fn fetch_state(&mut self, client_id: &str) -> Result<Response, RpcError> {
        let request = Request::FetchState {
            client_id: client_id.to_string(),
        };
        self.attempt(&Envelope::new(request)).await
    }

    /// Sends a command, retrying with the same sequence number on failure.
    pub async fn execute(&mut self, command: Command) -> Result<Response, RpcError> {
        self.call(Request::ExecuteCommand(command)).await
    }

    pub async fn call(&mut self, request: Request) -> Result<Response, RpcError> {
        let envelope = Envelope::new(request);
        let mut attempt = 1;
        loop {
            match self.attempt(&envelope).await {
                Ok(response) => return Ok(response),
                Err(e) if attempt >= self.attempts => {
                    warn!("Giving up after {} attempts: {}", attempt, e);
                    return Err(RpcError::Exhausted {
                        attempts: attempt,
                        last: Box::new(e),
                    });
                }
                Err(e) => {
                    debug!("Attempt {} failed: {}", attempt, e);
                    attempt += 1;
                    sleep(self.retry_delay).await;
                }
            }
        }
    }

    async fn attempt(&mut self, envelope: &Envelope) -> Result<Response, RpcError> {
        let limit = self.call_timeout;
        let result = match timeout(limit, self.exchange(envelope)).await {
            Ok(result) => result,
            Err(_) => Err(RpcError::Timeout(limit)),
        };
        if result.is_err() {
            // The stream may hold half a frame; start over on a fresh one.
            self.stream = None;
        }
        result
    }

    async fn exchange(&mut self, envelope: &Envelope) -> Result<Response, RpcError> {
        if self.stream.is_none() {
            let stream = TcpStream::connect(&self.addr)
                .await
                .map_err(|source| RpcError::Connect {
                    addr: self.addr.clone(),
                    source,
                })?;
            stream.set_nodelay(true).ok();
            debug!("Connected to {}", self.addr);
            self.stream = Some(stream);
        }
        let Some(stream) = self.stream.as_mut() else {
            return Err(FrameError::Closed.into());
        };

        write_frame(stream, envelope).await?;
        Ok(read_frame(stream).await?)
    }
}
