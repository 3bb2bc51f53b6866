//! Best-effort event signals and the shutdown token for entity tasks.

use tokio::sync::{mpsc, watch};

/// Sending half of a single-slot mailbox.
#[derive(Debug, Clone)]
pub struct SignalSender {
    tx: mpsc::Sender<()>,
}

/// Receiving half of a single-slot mailbox, owned by one entity task.
#[derive(Debug)]
pub struct SignalReceiver {
    rx: mpsc::Receiver<()>,
}

pub fn mailbox() -> (SignalSender, SignalReceiver) {
    let (tx, rx) = mpsc::channel(1);
    (SignalSender { tx }, SignalReceiver { rx })
}

impl SignalSender {
    /// Offers the signal without waiting. Returns false when it was dropped
    /// because one is already pending or the receiver is gone.
    pub fn offer(&self) -> bool {
        self.tx.try_send(()).is_ok()
    }
}

impl SignalReceiver {
    /// Consumes a pending signal, if any, without waiting.
    pub fn take(&mut self) -> bool {
        self.rx.try_recv().is_ok()
    }

    /// Waits for the next signal. Resolves to `None` once every sender is dropped.
    pub async fn recv(&mut self) -> Option<()> {
        self.rx.recv().await
    }
}

/// Owner side of the shutdown token.
#[derive(Debug)]
pub struct ShutdownTrigger {
    tx: watch::Sender<bool>,
}

/// Cloneable cancellation token observed by long-running tasks.
#[derive(Debug, Clone)]
pub struct Shutdown {
    rx: watch::Receiver<bool>,
}

pub fn shutdown_channel() -> (ShutdownTrigger, Shutdown) {
    let (tx, rx) = watch::channel(false);
    (ShutdownTrigger { tx }, Shutdown { rx })
}

impl ShutdownTrigger {
    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }

    pub fn subscribe(&self) -> Shutdown {
        Shutdown {
            rx: self.tx.subscribe(),
        }
    }
}

impl Shutdown {
    pub fn is_triggered(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once shutdown is triggered or the trigger is dropped.
    pub async fn cancelled(&mut self) {
        if self.is_triggered() {
            return;
        }
        while self.rx.changed().await.is_ok() {
            if *self.rx.borrow() {
                return;
            }
        }
    }
}
