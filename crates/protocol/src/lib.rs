use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A player color as the rules engine names it (usually a CSS hex string).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Color(pub String);

impl Color {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Color {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Axial lattice coordinate `(q, r)`, encoded on the wire as `[q, r]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Point(pub i32, pub i32);

impl Point {
    pub fn q(self) -> i32 {
        self.0
    }

    pub fn r(self) -> i32 {
        self.1
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.0, self.1)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Line {
    pub points: Vec<Point>,
    pub color: Color,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapturedTriangle {
    pub points: [Point; 3],
    pub color: Color,
}

/// Authoritative board as reported by `GET /api/gamestate`.
///
/// Every field defaults so that a partial or empty object (the rules engine
/// answers `{}` before its first game exists) still decodes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameState {
    pub players: Vec<Color>,
    pub points: Vec<Point>,
    pub lines: Vec<Line>,
    pub captured_triangles: Vec<CapturedTriangle>,
    pub scores: BTreeMap<Color, u32>,
    pub line_counts: BTreeMap<Color, u32>,
    pub last_move_color: Option<Color>,
    pub game_over: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl GameState {
    pub fn has_player(&self, color: &Color) -> bool {
        self.players.iter().any(|c| c == color)
    }

    pub fn score_of(&self, color: &Color) -> u32 {
        self.scores.get(color).copied().unwrap_or(0)
    }

    pub fn line_count_of(&self, color: &Color) -> u32 {
        self.line_counts.get(color).copied().unwrap_or(0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameStateResponse {
    #[serde(default)]
    pub game: GameState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub my_color: Option<Color>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRequest {
    pub p1: Point,
    pub p2: Point,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectColorRequest {
    pub color: Color,
}

/// Body of every non-2xx answer from the rules engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

pub mod endpoints {
    pub const GAME_STATE: &str = "/api/gamestate";
    pub const MOVE: &str = "/api/move";
    pub const SELECT_COLOR: &str = "/api/select_color";
    pub const UNDO: &str = "/api/undo";
    pub const RESET: &str = "/api/reset";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_rules_engine_payload() {
        let raw = r##"{
            "game": {
                "players": ["#d9534f", "#428bca"],
                "points": [[0, 0], [1, 0], [0, 1]],
                "lines": [{"points": [[0, 0], [1, 0]], "color": "#d9534f"}],
                "captured_triangles": [{"points": [[0, 0], [1, 0], [0, 1]], "color": "#428bca"}],
                "all_possible_triangles": [[[0, 0], [1, 0], [0, 1]]],
                "scores": {"#d9534f": 0, "#428bca": 1},
                "line_counts": {"#d9534f": 1, "#428bca": 0},
                "last_move_color": "#d9534f",
                "game_over": false,
                "message": "hi"
            },
            "my_color": "#428bca"
        }"##;
        let resp: GameStateResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(resp.my_color, Some(Color::from("#428bca")));
        assert_eq!(resp.game.points[1], Point(1, 0));
        assert_eq!(resp.game.captured_triangles[0].points[2], Point(0, 1));
        assert_eq!(resp.game.score_of(&Color::from("#428bca")), 1);
        assert_eq!(resp.game.last_move_color, Some(Color::from("#d9534f")));
    }

    #[test]
    fn empty_game_object_decodes_to_default() {
        let resp: GameStateResponse =
            serde_json::from_str(r#"{"game": {}, "my_color": null}"#).unwrap();
        assert_eq!(resp.game, GameState::default());
        assert!(resp.my_color.is_none());
    }

    #[test]
    fn move_request_uses_pair_arrays() {
        let body = serde_json::to_value(MoveRequest {
            p1: Point(-1, 2),
            p2: Point(2, -1),
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({"p1": [-1, 2], "p2": [2, -1]}));
    }

    #[test]
    fn missing_score_defaults_to_zero() {
        let state = GameState {
            players: vec![Color::from("red")],
            ..GameState::default()
        };
        assert_eq!(state.score_of(&Color::from("red")), 0);
        assert_eq!(state.line_count_of(&Color::from("red")), 0);
    }
}
