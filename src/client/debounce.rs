//! Trailing-edge debounce
//!
//! A timer that only fires after a quiet period. Restarting it cancels the pending timer, so
//! nothing fires while edits keep coming in.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

/// Debounce timer with an explicit cancellation token per quiet period
#[derive(Debug)]
pub struct Debounce {
    /// Length of the quiet period
    delay: Duration,

    /// Bumped on every restart, firings of older periods are ignored
    generation: u64,

    /// Token of the pending period, if any
    pending: Option<CancellationToken>,
}

impl Debounce {
    /// Create an idle debounce
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            generation: 0,
            pending: None,
        }
    }

    /// Start a new quiet period, cancelling the pending one
    ///
    /// `on_fire` gets the generation of the period once it passes uncancelled
    pub fn restart<F>(&mut self, on_fire: F) -> u64
    where
        F: FnOnce(u64) + Send + 'static,
    {
        self.cancel();

        self.generation += 1;

        let generation = self.generation;
        let token = CancellationToken::new();
        let delay = self.delay;

        self.pending = Some(token.clone());

        tokio::spawn(async move {
            tokio::select! {
                () = token.cancelled() => {},
                () = tokio::time::sleep(delay) => on_fire(generation),
            }
        });

        generation
    }

    /// Cancel the pending period, nothing will fire
    pub fn cancel(&mut self) {
        if let Some(token) = self.pending.take() {
            token.cancel();
        }
    }

    /// Is a quiet period running?
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Accept a firing, only when it belongs to the latest uncancelled period
    pub fn take_fired(&mut self, generation: u64) -> bool {
        if generation == self.generation && self.pending.is_some() {
            self.pending = None;

            true
        } else {
            false
        }
    }
}

impl Drop for Debounce {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use tokio::sync::mpsc;

    use super::*;

    fn fire_into(sender: &mpsc::UnboundedSender<u64>) -> impl FnOnce(u64) + Send + 'static {
        let sender = sender.clone();

        move |generation| {
            let _ = sender.send(generation);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_only_last_restart_fires() {
        let (sender, mut receiver) = mpsc::unbounded_channel();
        let mut debounce = Debounce::new(Duration::from_millis(800));

        debounce.restart(fire_into(&sender));
        tokio::time::sleep(Duration::from_millis(500)).await;
        debounce.restart(fire_into(&sender));
        tokio::time::sleep(Duration::from_millis(500)).await;
        let last = debounce.restart(fire_into(&sender));

        assert!(receiver.try_recv().is_err());

        tokio::time::sleep(Duration::from_millis(800)).await;

        let fired = receiver.recv().await.unwrap();
        assert_eq!(last, fired);
        assert!(debounce.take_fired(fired));
        assert!(!debounce.is_pending());
        assert!(receiver.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_prevents_firing() {
        let (sender, mut receiver) = mpsc::unbounded_channel();
        let mut debounce = Debounce::new(Duration::from_millis(800));

        let generation = debounce.restart(fire_into(&sender));
        debounce.cancel();

        tokio::time::sleep(Duration::from_secs(2)).await;

        assert!(receiver.try_recv().is_err());
        assert!(!debounce.take_fired(generation));
    }
}
