use hexline_protocol::{MoveRequest, Point};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionState {
    Empty,
    OnePoint(Point),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickOutcome {
    /// Clicks are gated off (not our turn, or the game is over).
    Ignored,
    Updated(SelectionState),
    /// Second point chosen. The buffer is already empty again; the move must
    /// be sent as-is and is never restored if the server rejects it.
    Submit(MoveRequest),
}

/// Accumulates the two endpoints of a candidate move.
///
/// Holds no turn logic of its own: the caller passes whether input is enabled.
#[derive(Debug, Default)]
pub struct Selection {
    buffered: Option<Point>,
}

impl Selection {
    pub fn click(&mut self, point: Point, enabled: bool) -> ClickOutcome {
        if !enabled {
            return ClickOutcome::Ignored;
        }
        match self.buffered.take() {
            None => {
                self.buffered = Some(point);
                ClickOutcome::Updated(SelectionState::OnePoint(point))
            }
            Some(first) if first == point => ClickOutcome::Updated(SelectionState::Empty),
            Some(first) => ClickOutcome::Submit(MoveRequest {
                p1: first,
                p2: point,
            }),
        }
    }

    pub fn state(&self) -> SelectionState {
        match self.buffered {
            None => SelectionState::Empty,
            Some(p) => SelectionState::OnePoint(p),
        }
    }

    pub fn selected(&self) -> Vec<Point> {
        self.buffered.into_iter().collect()
    }

    pub fn clear(&mut self) {
        self.buffered = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_point_twice_toggles_back_to_empty() {
        let mut sel = Selection::default();
        let p = Point(1, -1);
        assert_eq!(
            sel.click(p, true),
            ClickOutcome::Updated(SelectionState::OnePoint(p))
        );
        assert_eq!(sel.click(p, true), ClickOutcome::Updated(SelectionState::Empty));
        assert_eq!(sel.state(), SelectionState::Empty);
    }

    #[test]
    fn two_points_submit_in_click_order_and_clear() {
        let mut sel = Selection::default();
        let (p, q) = (Point(0, 0), Point(3, 0));
        sel.click(p, true);
        assert_eq!(
            sel.click(q, true),
            ClickOutcome::Submit(MoveRequest { p1: p, p2: q })
        );
        assert_eq!(sel.state(), SelectionState::Empty);
        assert!(sel.selected().is_empty());
    }

    #[test]
    fn gated_clicks_leave_buffer_alone() {
        let mut sel = Selection::default();
        let p = Point(2, 1);
        sel.click(p, true);
        assert_eq!(sel.click(Point(0, 0), false), ClickOutcome::Ignored);
        assert_eq!(sel.state(), SelectionState::OnePoint(p));
        assert_eq!(sel.selected(), vec![p]);
    }
}
