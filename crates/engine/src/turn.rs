use hexline_protocol::Color;
use serde::Serialize;

/// Whether the local participant may move now.
///
/// Turns relay: whoever follows the last mover's color goes next. Before the
/// first move any identified participant may open.
pub fn is_my_turn(
    my_color: Option<&Color>,
    follow_color: Option<&Color>,
    last_move_color: Option<&Color>,
) -> bool {
    let (Some(_), Some(follow)) = (my_color, follow_color) else {
        return false;
    };
    match last_move_color {
        None => true,
        Some(last) => last == follow,
    }
}

/// Only the author of the most recent move may take it back.
pub fn can_undo(my_color: Option<&Color>, last_move_color: Option<&Color>) -> bool {
    matches!((my_color, last_move_color), (Some(mine), Some(last)) if mine == last)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TurnStatus {
    /// Own color or follow color not chosen yet.
    NeedsIdentity,
    Waiting { follow: Color },
    MyTurn { mine: Color },
}

impl TurnStatus {
    pub fn evaluate(
        my_color: Option<&Color>,
        follow_color: Option<&Color>,
        last_move_color: Option<&Color>,
    ) -> Self {
        match (my_color, follow_color) {
            (Some(mine), Some(follow)) => {
                if is_my_turn(my_color, follow_color, last_move_color) {
                    Self::MyTurn { mine: mine.clone() }
                } else {
                    Self::Waiting {
                        follow: follow.clone(),
                    }
                }
            }
            _ => Self::NeedsIdentity,
        }
    }

    pub fn is_my_turn(&self) -> bool {
        matches!(self, Self::MyTurn { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnTransition {
    Began,
    Ended,
}

/// Edge detector over successive `is_my_turn` evaluations.
#[derive(Debug, Default)]
pub struct TurnTracker {
    active: bool,
}

impl TurnTracker {
    pub fn observe(&mut self, my_turn: bool) -> Option<TurnTransition> {
        let prev = std::mem::replace(&mut self.active, my_turn);
        match (prev, my_turn) {
            (false, true) => Some(TurnTransition::Began),
            (true, false) => Some(TurnTransition::Ended),
            _ => None,
        }
    }
}
