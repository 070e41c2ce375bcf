use hexline_engine::IdentityStore;
use hexline_protocol::{Color, GameState, MoveRequest};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::api::GameApi;
use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// Another fetch was already outstanding; nothing was sent.
    Skipped,
    /// Fetch or decode failed; the previous snapshot stays in place.
    Failed,
    Applied { board_changed: bool },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    Move(MoveRequest),
    SelectColor(Color),
    Undo,
    Reset,
}

/// Keeps the local copy of the authoritative state in step with the server.
///
/// At most one state fetch is outstanding at a time; extra refresh requests
/// are dropped, not queued. Mutations bypass that guard but are each
/// followed by their own refresh.
pub struct SyncEngine<A> {
    api: A,
    identity: Arc<IdentityStore>,
    in_flight: AtomicBool,
    state: watch::Sender<Option<Arc<GameState>>>,
}

impl<A: GameApi> SyncEngine<A> {
    pub fn new(api: A, identity: Arc<IdentityStore>) -> Self {
        let (state, _) = watch::channel(None);
        Self {
            api,
            identity,
            in_flight: AtomicBool::new(false),
            state,
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// Latest authoritative state, `None` until the first successful fetch.
    pub fn snapshot(&self) -> Option<Arc<GameState>> {
        self.state.borrow().clone()
    }

    /// Change feed; only fires when the fetched state differs structurally.
    pub fn subscribe(&self) -> watch::Receiver<Option<Arc<GameState>>> {
        self.state.subscribe()
    }

    pub async fn refresh(&self) -> RefreshOutcome {
        let Some(_guard) = FlightGuard::claim(&self.in_flight) else {
            debug!("refresh already in flight, dropped");
            return RefreshOutcome::Skipped;
        };

        let resp = match self.api.fetch_state().await {
            Ok(resp) => resp,
            Err(e) => {
                warn!(error = %e, "failed to fetch game state");
                return RefreshOutcome::Failed;
            }
        };

        if let Some(color) = resp.my_color.as_ref() {
            match self.identity.merge_server_color(color) {
                Ok(true) => info!(color = %color, "server bound identity"),
                Ok(false) => {}
                Err(e) => warn!(error = %e, "failed to persist server identity"),
            }
        }

        let next = Arc::new(resp.game);
        let board_changed = self.state.send_if_modified(|slot| {
            if slot.as_deref() == Some(next.as_ref()) {
                return false;
            }
            *slot = Some(next);
            true
        });
        if !board_changed {
            debug!("game state unchanged");
        }
        RefreshOutcome::Applied { board_changed }
    }

    /// Sends a mutation, then refreshes regardless of its result.
    pub async fn mutate(&self, mutation: Mutation) -> (Result<()>, RefreshOutcome) {
        let result = match &mutation {
            Mutation::Move(mv) => self.api.submit_move(*mv).await,
            Mutation::SelectColor(color) => self.api.select_color(color).await,
            Mutation::Undo => self.api.undo().await,
            Mutation::Reset => self.api.reset().await,
        };
        if let Err(e) = &result {
            warn!(?mutation, error = %e, "mutation failed");
        }
        let refreshed = self.refresh().await;
        (result, refreshed)
    }
}

struct FlightGuard<'a>(&'a AtomicBool);

impl<'a> FlightGuard<'a> {
    fn claim(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
