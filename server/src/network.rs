//! Server network layer: accepts TCP connections and answers framed requests

use crate::commands::CommandProcessor;
use crate::signal::Shutdown;
use log::{debug, error, info, warn};
use shared::transport::{read_frame, write_frame, FrameError};
use shared::Envelope;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};

/// Request/response server fronting one [`CommandProcessor`]
pub struct Server {
    listener: TcpListener,
    processor: Arc<CommandProcessor>,
    shutdown: Shutdown,
}

impl Server {
    pub async fn bind(
        addr: &str,
        processor: Arc<CommandProcessor>,
        shutdown: Shutdown,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let listener = TcpListener::bind(addr).await?;
        info!("Server listening on {}", listener.local_addr()?);
        Ok(Self {
            listener,
            processor,
            shutdown,
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accepts connections until shutdown, one task per connection
    pub async fn run(mut self) {
        loop {
            tokio::select! {
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, addr)) => {
                        debug!("Connection from {}", addr);
                        let processor = Arc::clone(&self.processor);
                        let shutdown = self.shutdown.clone();
                        tokio::spawn(async move {
                            serve_connection(stream, addr, processor, shutdown).await;
                        });
                    }
                    Err(e) => {
                        error!("Failed to accept connection: {}", e);
                    }
                },
                _ = self.shutdown.cancelled() => break,
            }
        }
        info!("Server stopped accepting connections");
    }
}

/// Answers requests on one connection until the peer hangs up
async fn serve_connection(
    mut stream: TcpStream,
    addr: SocketAddr,
    processor: Arc<CommandProcessor>,
    mut shutdown: Shutdown,
) {
    loop {
        let envelope: Envelope = tokio::select! {
            frame = read_frame::<_, Envelope>(&mut stream) => match frame {
                Ok(envelope) => envelope,
                Err(FrameError::Closed) => {
                    debug!("{} disconnected", addr);
                    return;
                }
                Err(e) => {
                    warn!("Dropping connection from {}: {}", addr, e);
                    return;
                }
            },
            _ = shutdown.cancelled() => return,
        };

        let response = processor.handle(envelope).await;
        if let Err(e) = write_frame(&mut stream, &response).await {
            warn!("Failed to answer {}: {}", addr, e);
            return;
        }
    }
}
