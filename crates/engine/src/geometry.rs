//! Projection of axial lattice coordinates onto the drawing plane.
//!
//! Everything here is pure: the same transform is used for the full board,
//! a single triangle, or a hit test, so any subset of points re-derives the
//! same planar positions.

use hexline_protocol::{Color, GameState, Point};
use serde::Serialize;

/// Padding added on every side of the board bounds.
pub const BOARD_PADDING: f64 = 2.0;
/// Drawn radius of a lattice point.
pub const POINT_RADIUS: f64 = 0.2;
/// Radius around a lattice point that still counts as a click on it.
pub const TOUCH_RADIUS: f64 = 0.6;

const SQRT_3: f64 = 1.732_050_807_568_877_2;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PlanePoint {
    pub x: f64,
    pub y: f64,
}

/// Axis-aligned viewport in plane units, laid out like an SVG `viewBox`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ViewBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

pub fn project(p: Point) -> PlanePoint {
    let q = f64::from(p.q());
    let r = f64::from(p.r());
    PlanePoint {
        x: 1.5 * q,
        y: SQRT_3 / 2.0 * q + SQRT_3 * r,
    }
}

/// Padded bounds of `points`; `None` when there is nothing to frame.
pub fn view_box<'a>(points: impl IntoIterator<Item = &'a Point>) -> Option<ViewBox> {
    let mut bounds: Option<(f64, f64, f64, f64)> = None;
    for p in points {
        let PlanePoint { x, y } = project(*p);
        bounds = Some(match bounds {
            None => (x, y, x, y),
            Some((min_x, min_y, max_x, max_y)) => {
                (min_x.min(x), min_y.min(y), max_x.max(x), max_y.max(y))
            }
        });
    }
    let (min_x, min_y, max_x, max_y) = bounds?;
    Some(ViewBox {
        x: min_x - BOARD_PADDING,
        y: min_y - BOARD_PADDING,
        width: (max_x - min_x) + 2.0 * BOARD_PADDING,
        height: (max_y - min_y) + 2.0 * BOARD_PADDING,
    })
}

/// Nearest lattice point within [`TOUCH_RADIUS`] of `at`.
pub fn hit_test(points: &[Point], at: PlanePoint) -> Option<Point> {
    points
        .iter()
        .map(|p| {
            let pp = project(*p);
            let d = (pp.x - at.x).hypot(pp.y - at.y);
            (*p, d)
        })
        .filter(|(_, d)| *d <= TOUCH_RADIUS)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(p, _)| p)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenePolygon {
    pub corners: [PlanePoint; 3],
    pub color: Color,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SceneSegment {
    pub from: PlanePoint,
    pub to: PlanePoint,
    pub color: Color,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenePoint {
    pub axial: Point,
    pub at: PlanePoint,
}

/// Everything a renderer needs to paint the board geometry, already projected.
///
/// Painting order is triangles, then segments, then points.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoardScene {
    pub view_box: ViewBox,
    pub point_radius: f64,
    pub triangles: Vec<ScenePolygon>,
    pub segments: Vec<SceneSegment>,
    pub points: Vec<ScenePoint>,
}

impl BoardScene {
    /// `None` when the state carries no lattice; callers skip drawing then.
    pub fn build(state: &GameState) -> Option<Self> {
        let view_box = view_box(&state.points)?;

        let triangles = state
            .captured_triangles
            .iter()
            .map(|tri| ScenePolygon {
                corners: tri.points.map(project),
                color: tri.color.clone(),
            })
            .collect();

        let segments = state
            .lines
            .iter()
            .flat_map(|line| {
                line.points.windows(2).map(move |pair| SceneSegment {
                    from: project(pair[0]),
                    to: project(pair[1]),
                    color: line.color.clone(),
                })
            })
            .collect();

        let points = state
            .points
            .iter()
            .map(|p| ScenePoint {
                axial: *p,
                at: project(*p),
            })
            .collect();

        Some(Self {
            view_box,
            point_radius: POINT_RADIUS,
            triangles,
            segments,
            points,
        })
    }
}
