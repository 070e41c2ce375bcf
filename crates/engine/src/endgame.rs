use hexline_protocol::{Color, GameState};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Victory {
    /// Every color tied at the top score, in `players` order.
    pub winners: Vec<Color>,
    pub top_score: u32,
    /// Completion episode this victory belongs to.
    pub episode: u64,
}

/// All players sharing the highest score. Missing scores count as zero; no
/// players means no winners and a top score of zero.
pub fn winners(state: &GameState) -> (Vec<Color>, u32) {
    let Some(top) = state.players.iter().map(|c| state.score_of(c)).max() else {
        return (Vec::new(), 0);
    };
    let winners = state
        .players
        .iter()
        .filter(|c| state.score_of(c) == top)
        .cloned()
        .collect();
    (winners, top)
}

/// Reports a victory once per completion episode.
///
/// An episode starts when `game_over` is first seen true after having been
/// false (or never seen); it ends when `game_over` is seen false again.
#[derive(Debug, Default)]
pub struct EndgameEvaluator {
    episode: u64,
    in_episode: bool,
    last_shown: Option<u64>,
}

impl EndgameEvaluator {
    pub fn observe(&mut self, state: &GameState) -> Option<Victory> {
        if !state.game_over {
            self.in_episode = false;
            return None;
        }
        if !self.in_episode {
            self.in_episode = true;
            self.episode += 1;
        }
        if self.last_shown == Some(self.episode) {
            return None;
        }
        self.last_shown = Some(self.episode);
        let (winners, top_score) = winners(state);
        Some(Victory {
            winners,
            top_score,
            episode: self.episode,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn state(players: &[&str], scores: &[(&str, u32)], over: bool) -> GameState {
        GameState {
            players: players.iter().map(|c| Color::from(*c)).collect(),
            scores: scores
                .iter()
                .map(|(c, s)| (Color::from(*c), *s))
                .collect::<BTreeMap<_, _>>(),
            game_over: over,
            ..GameState::default()
        }
    }

    #[test]
    fn ties_are_all_winners() {
        let s = state(
            &["red", "blue", "green"],
            &[("red", 3), ("blue", 3), ("green", 2)],
            true,
        );
        let (w, top) = winners(&s);
        assert_eq!(w, vec![Color::from("red"), Color::from("blue")]);
        assert_eq!(top, 3);
    }

    #[test]
    fn missing_scores_count_as_zero() {
        let s = state(&["red", "blue"], &[], true);
        let (w, top) = winners(&s);
        assert_eq!(w.len(), 2);
        assert_eq!(top, 0);
    }

    #[test]
    fn no_players_no_winners() {
        let (w, top) = winners(&state(&[], &[("red", 5)], true));
        assert!(w.is_empty());
        assert_eq!(top, 0);
    }

    #[test]
    fn fires_once_per_episode() {
        let mut eval = EndgameEvaluator::default();
        let playing = state(&["red"], &[("red", 1)], false);
        let over = state(&["red"], &[("red", 1)], true);

        assert!(eval.observe(&playing).is_none());
        let first = eval.observe(&over).expect("victory");
        assert_eq!(first.episode, 1);
        assert!(eval.observe(&over).is_none());
        assert!(eval.observe(&over).is_none());

        assert!(eval.observe(&playing).is_none());
        let second = eval.observe(&over).expect("victory after reset");
        assert_eq!(second.episode, 2);
    }

    #[test]
    fn already_over_on_first_sight_still_fires() {
        let mut eval = EndgameEvaluator::default();
        let over = state(&["red", "blue"], &[("blue", 4)], true);
        let v = eval.observe(&over).unwrap();
        assert_eq!(v.winners, vec![Color::from("blue")]);
        assert_eq!(v.top_score, 4);
    }
}
