use hexline_protocol::{Color, GameState, Point};
use serde::Serialize;

use crate::identity::LocalIdentity;
use crate::turn::{can_undo, TurnStatus};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoreRow {
    pub color: Color,
    pub lines: u32,
    pub triangles: u32,
}

/// Non-geometric part of the screen: identity, turn, scores, controls.
///
/// Rebuilt on every refresh and identity change, whether or not the board
/// itself changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PanelView {
    pub players: Vec<Color>,
    pub my_color: Option<Color>,
    pub follow_color: Option<Color>,
    pub status: TurnStatus,
    pub undo_enabled: bool,
    pub last_move_color: Option<Color>,
    pub scores: Vec<ScoreRow>,
    pub selected: Vec<Point>,
    pub game_over: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl PanelView {
    pub fn build(state: &GameState, identity: &LocalIdentity, selected: Vec<Point>) -> Self {
        let my = identity.my_color.as_ref();
        let last = state.last_move_color.as_ref();
        let scores = state
            .players
            .iter()
            .map(|color| ScoreRow {
                color: color.clone(),
                lines: state.line_count_of(color),
                triangles: state.score_of(color),
            })
            .collect();

        Self {
            players: state.players.clone(),
            my_color: identity.my_color.clone(),
            follow_color: identity.follow_color.clone(),
            status: TurnStatus::evaluate(my, identity.follow_color.as_ref(), last),
            undo_enabled: can_undo(my, last),
            last_move_color: state.last_move_color.clone(),
            scores,
            selected,
            game_over: state.game_over,
            message: state.message.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn rows_follow_player_order_with_defaults() {
        let (red, blue) = (Color::from("red"), Color::from("blue"));
        let state = GameState {
            players: vec![red.clone(), blue.clone()],
            scores: BTreeMap::from([(blue.clone(), 2)]),
            line_counts: BTreeMap::from([(red.clone(), 1), (blue.clone(), 3)]),
            last_move_color: Some(red.clone()),
            ..GameState::default()
        };
        let identity = LocalIdentity {
            my_color: Some(red.clone()),
            follow_color: Some(blue.clone()),
        };
        let panel = PanelView::build(&state, &identity, vec![Point(0, 0)]);

        assert_eq!(panel.scores[0], ScoreRow { color: red.clone(), lines: 1, triangles: 0 });
        assert_eq!(panel.scores[1], ScoreRow { color: blue.clone(), lines: 3, triangles: 2 });
        assert!(panel.undo_enabled);
        assert_eq!(panel.status, TurnStatus::Waiting { follow: blue });
        assert_eq!(panel.selected, vec![Point(0, 0)]);
    }

    #[test]
    fn serializes_status_with_kind_tag() {
        let panel = PanelView::build(&GameState::default(), &LocalIdentity::default(), Vec::new());
        let json = serde_json::to_value(&panel).unwrap();
        assert_eq!(json["status"]["kind"], "needs_identity");
        assert_eq!(json["undo_enabled"], false);
    }
}
