use std::net::SocketAddr;

use anyhow::{Result, anyhow};
use pokeduel_protocol::ServerMessage;
use tokio::sync::mpsc;

/// One datagram waiting to be sent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outbound {
    pub to: SocketAddr,
    pub text: String,
}

impl Outbound {
    pub fn new(to: SocketAddr, message: &ServerMessage) -> Self {
        Self {
            to,
            text: message.to_wire_format(),
        }
    }
}

/// Cloneable handle for queueing datagrams to the socket's sender task.
///
/// Request handlers each get a clone.
#[derive(Clone)]
pub struct Outbox {
    outgoing: mpsc::Sender<Outbound>,
}

impl Outbox {
    pub fn new(outgoing: mpsc::Sender<Outbound>) -> Self {
        Self { outgoing }
    }

    /// Queue a single datagram
    pub async fn send(&self, outbound: Outbound) -> Result<()> {
        self.outgoing
            .send(outbound)
            .await
            .map_err(|_| anyhow!("Sender task closed"))
    }

    /// Queue datagrams in order
    pub async fn send_all(&self, outbound: Vec<Outbound>) -> Result<()> {
        for datagram in outbound {
            self.send(datagram).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_send_all_preserves_order() {
        let (tx, mut rx) = mpsc::channel(8);
        let outbox = Outbox::new(tx);
        let to = SocketAddr::from(([127, 0, 0, 1], 5000));

        outbox
            .send_all(vec![
                Outbound::new(to, &ServerMessage::Win),
                Outbound::new(to, &ServerMessage::ExpGained { amount: 20 }),
            ])
            .await
            .unwrap();

        assert_eq!(rx.recv().await.unwrap().text, "@win");
        assert_eq!(
            rx.recv().await.unwrap().text,
            "Your pokemons gained 20 exp each!"
        );
    }

    #[tokio::test]
    async fn test_send_after_close_fails() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let outbox = Outbox::new(tx);
        let to = SocketAddr::from(([127, 0, 0, 1], 5000));
        assert!(outbox.send(Outbound::new(to, &ServerMessage::Lose)).await.is_err());
    }
}
