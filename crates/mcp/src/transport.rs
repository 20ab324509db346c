//! Line transports for the MCP server.
//!
//! One JSON-RPC message per line. [`StdioTransport`] is what the binary
//! runs on; [`ChannelTransport`] connects a server and a client in memory.

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Stdin, Stdout};
use tokio::sync::mpsc;

use crate::error::McpError;

#[async_trait]
pub trait McpTransport: Send {
    /// Next non-empty message line, or `None` once the peer has closed.
    async fn receive(&mut self) -> Result<Option<String>, McpError>;

    async fn send(&mut self, message: &str) -> Result<(), McpError>;
}

pub struct StdioTransport {
    reader: BufReader<Stdin>,
    writer: Stdout,
}

impl StdioTransport {
    pub fn new() -> Self {
        Self {
            reader: BufReader::new(tokio::io::stdin()),
            writer: tokio::io::stdout(),
        }
    }
}

impl Default for StdioTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl McpTransport for StdioTransport {
    async fn receive(&mut self) -> Result<Option<String>, McpError> {
        loop {
            let mut line = String::new();
            if self.reader.read_line(&mut line).await? == 0 {
                return Ok(None);
            }
            let trimmed = line.trim();
            if !trimmed.is_empty() {
                return Ok(Some(trimmed.to_string()));
            }
        }
    }

    async fn send(&mut self, message: &str) -> Result<(), McpError> {
        self.writer.write_all(message.as_bytes()).await?;
        self.writer.write_all(b"\n").await?;
        self.writer.flush().await?;
        Ok(())
    }
}

/// In-memory transport; messages sent on one end arrive at the other.
pub struct ChannelTransport {
    rx: mpsc::Receiver<String>,
    tx: mpsc::Sender<String>,
}

impl ChannelTransport {
    pub fn pair() -> (Self, Self) {
        let (tx_a, rx_b) = mpsc::channel(32);
        let (tx_b, rx_a) = mpsc::channel(32);
        (Self { rx: rx_a, tx: tx_a }, Self { rx: rx_b, tx: tx_b })
    }
}

#[async_trait]
impl McpTransport for ChannelTransport {
    async fn receive(&mut self) -> Result<Option<String>, McpError> {
        Ok(self.rx.recv().await)
    }

    async fn send(&mut self, message: &str) -> Result<(), McpError> {
        self.tx.send(message.to_string()).await.map_err(|e| {
            McpError::Transport(std::io::Error::new(std::io::ErrorKind::BrokenPipe, e))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_channel_pair_is_bidirectional() {
        let (mut client, mut server) = ChannelTransport::pair();

        client.send(r#"{"jsonrpc":"2.0","id":1,"method":"tools/list"}"#).await.unwrap();
        let line = server.receive().await.unwrap().unwrap();
        assert!(line.contains("tools/list"));

        server.send(r#"{"jsonrpc":"2.0","id":1,"result":{}}"#).await.unwrap();
        assert!(client.receive().await.unwrap().unwrap().contains("result"));
    }

    #[tokio::test]
    async fn test_closed_peer_ends_stream() {
        let (mut client, server) = ChannelTransport::pair();
        drop(server);
        assert_eq!(client.receive().await.unwrap(), None);
        assert!(matches!(client.send("x").await, Err(McpError::Transport(_))));
    }
}
