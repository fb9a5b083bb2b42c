//! Periodic, read-only recomputation of the elapsed session time.

use std::{sync::Arc, time::Duration};

use tokio::{sync::watch, task::JoinHandle};
use tracing::debug;

use crate::domain::{
    models::{Elapsed, SessionPhase, SessionState},
    ports::outbound::Clock,
};

/// Reads the published session snapshot and reports elapsed time.
///
/// Never mutates the session, so it may run while a write is pending.
pub struct ElapsedTicker<C> {
    state: watch::Receiver<SessionState>,
    clock: Arc<C>,
}

impl<C: Clock> ElapsedTicker<C> {
    pub fn new(state: watch::Receiver<SessionState>, clock: Arc<C>) -> Self {
        Self { state, clock }
    }

    pub fn phase(&self) -> SessionPhase {
        self.state.borrow().phase()
    }

    pub fn current(&self) -> Elapsed {
        self.state.borrow().elapsed_at(self.clock.now())
    }

    /// Call `on_tick` every `period` until the session owner is dropped.
    pub fn spawn<F>(self, period: Duration, mut on_tick: F) -> JoinHandle<()>
    where
        F: FnMut(SessionPhase, Elapsed) + Send + 'static,
    {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                ticker.tick().await;
                if self.state.has_changed().is_err() {
                    debug!("Session owner dropped, stopping elapsed ticker");
                    break;
                }
                on_tick(self.phase(), self.current());
            }
        })
    }
}
