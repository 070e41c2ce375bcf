//! Client-side core of Hexline.
//!
//! Nothing in here talks to the network: the rules engine owns legality,
//! capture and scoring, and this crate only derives what the local client
//! needs from the authoritative state it is handed.

pub mod clock;
pub mod endgame;
pub mod geometry;
pub mod identity;
pub mod selection;
pub mod store;
pub mod turn;
pub mod view;

pub use clock::TurnClock;
pub use endgame::{EndgameEvaluator, Victory};
pub use geometry::BoardScene;
pub use identity::{IdentityStore, LocalIdentity};
pub use selection::{ClickOutcome, Selection, SelectionState};
pub use store::{MemorySessionStore, SessionStore, SqliteSessionStore};
pub use turn::{can_undo, is_my_turn, TurnStatus, TurnTracker, TurnTransition};
pub use view::PanelView;
