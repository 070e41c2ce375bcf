use hexline_engine::geometry::{hit_test, PlanePoint};
use hexline_engine::{
    can_undo, is_my_turn, BoardScene, ClickOutcome, EndgameEvaluator, IdentityStore, PanelView,
    Selection, TurnTracker, TurnTransition,
};
use hexline_protocol::{Color, GameState, Point};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use crate::api::GameApi;
use crate::error::{ClientError, Result};
use crate::render::Renderer;
use crate::sync::{Mutation, RefreshOutcome, SyncEngine};
use crate::ticker::TurnClockTicker;

#[derive(Default)]
struct LocalView {
    selection: Selection,
    turn: TurnTracker,
    endgame: EndgameEvaluator,
}

/// Everything one participant's client holds, owned in one place.
///
/// The sync engine is the only writer of the authoritative snapshot; every
/// other piece reads it after a refresh completes.
pub struct ClientSession<A> {
    sync: SyncEngine<A>,
    identity: Arc<IdentityStore>,
    renderer: Arc<dyn Renderer>,
    view: Mutex<LocalView>,
    clock: TurnClockTicker,
}

impl<A: GameApi + 'static> ClientSession<A> {
    pub fn new(api: A, identity: Arc<IdentityStore>, renderer: Arc<dyn Renderer>) -> Self {
        Self {
            sync: SyncEngine::new(api, identity.clone()),
            identity,
            renderer,
            view: Mutex::new(LocalView::default()),
            clock: TurnClockTicker::new(),
        }
    }

    pub fn sync(&self) -> &SyncEngine<A> {
        &self.sync
    }

    pub fn identity(&self) -> &IdentityStore {
        &self.identity
    }

    pub fn clock(&self) -> &TurnClockTicker {
        &self.clock
    }

    pub fn selected(&self) -> Vec<Point> {
        self.view.lock().selection.selected()
    }

    pub async fn refresh(&self) -> RefreshOutcome {
        let outcome = self.sync.refresh().await;
        if let RefreshOutcome::Applied { board_changed } = outcome {
            self.publish(board_changed);
        }
        outcome
    }

    /// A click on lattice point `point`.
    pub async fn click(&self, point: Point) -> Result<ClickOutcome> {
        let enabled = self.sync.snapshot().is_some_and(|state| {
            let id = self.identity.current();
            !state.game_over
                && is_my_turn(
                    id.my_color.as_ref(),
                    id.follow_color.as_ref(),
                    state.last_move_color.as_ref(),
                )
        });
        let outcome = self.view.lock().selection.click(point, enabled);
        match outcome {
            ClickOutcome::Ignored => {}
            ClickOutcome::Updated(_) => self.publish(false),
            ClickOutcome::Submit(mv) => {
                let (result, refreshed) = self.sync.mutate(Mutation::Move(mv)).await;
                self.report(&result);
                self.after_refresh(refreshed);
                result?;
            }
        }
        Ok(outcome)
    }

    /// A click at plane coordinates. `None` when it lands on no lattice point.
    pub async fn click_at(&self, at: PlanePoint) -> Result<Option<ClickOutcome>> {
        let hit = self
            .sync
            .snapshot()
            .and_then(|state| hit_test(&state.points, at));
        match hit {
            Some(point) => self.click(point).await.map(Some),
            None => Ok(None),
        }
    }

    pub async fn choose_my_color(&self, color: &Color) -> Result<()> {
        let players = self.players();
        if !players.contains(color) {
            return Err(ClientError::UnknownColor(color.to_string()));
        }
        self.identity.choose_my_color(color, &players)?;
        info!(color = %color, "own color chosen");

        let (result, refreshed) = self.sync.mutate(Mutation::SelectColor(color.clone())).await;
        if result.is_ok() {
            if let Some(cookie) = self.sync.api().session_cookie() {
                if let Err(e) = self.identity.save_cookie(&cookie) {
                    warn!(error = %e, "failed to persist session cookie");
                }
            }
        }
        self.report(&result);
        self.after_refresh(refreshed);
        result
    }

    /// Purely local; the server never learns whom we follow.
    pub fn choose_follow_color(&self, color: &Color) -> Result<()> {
        let players = self.players();
        if !players.contains(color) {
            return Err(ClientError::UnknownColor(color.to_string()));
        }
        self.identity.choose_follow_color(color, &players)?;
        info!(color = %color, "follow color chosen");
        self.publish(false);
        Ok(())
    }

    /// Takes back our own last move. Returns false without contacting the
    /// server when we are not its author.
    pub async fn undo(&self) -> Result<bool> {
        let last = self.sync.snapshot().and_then(|s| s.last_move_color.clone());
        if !can_undo(self.identity.my_color().as_ref(), last.as_ref()) {
            return Ok(false);
        }
        let (result, refreshed) = self.sync.mutate(Mutation::Undo).await;
        self.report(&result);
        self.after_refresh(refreshed);
        result.map(|()| true)
    }

    /// Clears the board for everyone; a half-made selection is dropped too.
    pub async fn reset(&self) -> Result<()> {
        let (result, refreshed) = self.sync.mutate(Mutation::Reset).await;
        if result.is_ok() {
            self.view.lock().selection.clear();
        }
        self.report(&result);
        self.after_refresh(refreshed);
        result
    }

    /// Accepts a color name or its 1-based position in `players`.
    pub fn resolve_color(&self, input: &str) -> Result<Color> {
        let players = self.players();
        let input = input.trim();
        if let Ok(n) = input.parse::<usize>() {
            if let Some(color) = n.checked_sub(1).and_then(|i| players.get(i)) {
                return Ok(color.clone());
            }
        }
        players
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(input))
            .ok_or_else(|| ClientError::UnknownColor(input.to_string()))
    }

    /// Polls on a fixed cadence for as long as the handle lives.
    pub fn spawn_poller(self: &Arc<Self>, every: Duration) -> JoinHandle<()> {
        let session = self.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                session.refresh().await;
            }
        })
    }

    /// Forwards turn clock ticks to the renderer.
    pub fn spawn_clock_display(self: &Arc<Self>) -> JoinHandle<()> {
        let mut feed = self.clock.subscribe();
        let renderer = self.renderer.clone();
        tokio::spawn(async move {
            while feed.changed().await.is_ok() {
                let text = feed.borrow_and_update().clone();
                renderer.show_clock(text.as_deref());
            }
        })
    }

    fn players(&self) -> Vec<Color> {
        self.sync
            .snapshot()
            .map(|s| s.players.clone())
            .unwrap_or_default()
    }

    fn report(&self, result: &Result<()>) {
        if let Err(e) = result {
            if let Some(reason) = e.user_reason() {
                self.renderer.show_error(reason);
            }
        }
    }

    /// After a mutation the panel is repainted even when its refresh was
    /// dropped or failed, so the cleared selection shows.
    fn after_refresh(&self, outcome: RefreshOutcome) {
        match outcome {
            RefreshOutcome::Applied { board_changed } => self.publish(board_changed),
            RefreshOutcome::Skipped | RefreshOutcome::Failed => self.publish(false),
        }
    }

    fn publish(&self, board_changed: bool) {
        // Snapshot is read under the view lock: the turn tracker sees states
        // in the order they were stored.
        let mut view = self.view.lock();
        let Some(state) = self.sync.snapshot() else {
            return;
        };
        if board_changed {
            if let Some(scene) = BoardScene::build(&state) {
                self.renderer.draw_board(&scene);
            }
        }
        self.update_view(&mut view, &state);
    }

    fn update_view(&self, view: &mut LocalView, state: &GameState) {
        let identity = self.identity.current();
        let my_turn = is_my_turn(
            identity.my_color.as_ref(),
            identity.follow_color.as_ref(),
            state.last_move_color.as_ref(),
        );

        match view.turn.observe(my_turn) {
            Some(TurnTransition::Began) => {
                info!("turn started");
                self.clock.start();
            }
            Some(TurnTransition::Ended) => {
                info!("turn ended");
                self.clock.stop();
            }
            None => {}
        }
        let victory = view.endgame.observe(state);

        self.renderer.update_panel(&PanelView::build(
            state,
            &identity,
            view.selection.selected(),
        ));

        if let Some(victory) = victory {
            info!(
                winners = ?victory.winners,
                top_score = victory.top_score,
                episode = victory.episode,
                "game over"
            );
            self.renderer.show_victory(&victory);
        }
    }
}
