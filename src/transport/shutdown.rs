use tokio::sync::watch;

/// Creates a linked handle/signal pair. Dropping the handle also fires the signal.
pub fn shutdown_channel() -> (ShutdownHandle, ShutdownSignal) {
    let (tx, rx) = watch::channel(false);
    (ShutdownHandle { tx }, ShutdownSignal { rx })
}

pub struct ShutdownHandle {
    tx: watch::Sender<bool>,
}

impl ShutdownHandle {
    pub fn trigger(&self) {
        // send_replace never fails, even with no receivers left.
        self.tx.send_replace(true);
    }

    pub fn signal(&self) -> ShutdownSignal {
        ShutdownSignal {
            rx: self.tx.subscribe(),
        }
    }
}

#[derive(Clone)]
pub struct ShutdownSignal {
    rx: watch::Receiver<bool>,
}

impl ShutdownSignal {
    pub fn is_triggered(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once shutdown is triggered or the handle is dropped.
    pub async fn recv(&mut self) {
        while !*self.rx.borrow_and_update() {
            if self.rx.changed().await.is_err() {
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_trigger_wakes_every_signal() {
        let (handle, signal) = shutdown_channel();
        let mut first = signal.clone();
        let mut second = handle.signal();

        assert!(!signal.is_triggered());
        handle.trigger();

        tokio::time::timeout(Duration::from_secs(1), first.recv())
            .await
            .expect("first signal should fire");
        tokio::time::timeout(Duration::from_secs(1), second.recv())
            .await
            .expect("second signal should fire");
        assert!(signal.is_triggered());
    }

    #[tokio::test]
    async fn test_dropping_handle_fires_signal() {
        let (handle, mut signal) = shutdown_channel();
        drop(handle);

        tokio::time::timeout(Duration::from_secs(1), signal.recv())
            .await
            .expect("signal should fire when the handle is dropped");
    }
}
