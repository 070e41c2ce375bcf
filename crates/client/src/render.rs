//! Display adapters. These are the only place that touches an output surface;
//! they read the published views and never feed anything back.

use hexline_engine::geometry::PlanePoint;
use hexline_engine::{BoardScene, PanelView, TurnStatus, Victory};
use parking_lot::Mutex;
use std::collections::{BTreeMap, BTreeSet};
use std::io::Write;
use tracing::warn;

pub trait Renderer: Send + Sync {
    /// Called only when the board geometry changed.
    fn draw_board(&self, scene: &BoardScene);
    /// Called after every refresh and every local identity change.
    fn update_panel(&self, panel: &PanelView);
    fn show_clock(&self, clock: Option<&str>);
    fn show_victory(&self, victory: &Victory);
    fn show_error(&self, message: &str);
}

/// Plain-text board for a terminal.
///
/// Lattice points are laid out on a character grid where the row is `q + 2r`
/// and the column is `q`, which keeps the triangular lattice readable.
pub struct TerminalRenderer<W> {
    out: Mutex<W>,
}

impl<W: Write + Send> TerminalRenderer<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner()
    }

    fn emit(&self, text: &str) {
        let mut out = self.out.lock();
        if let Err(e) = out.write_all(text.as_bytes()).and_then(|()| out.flush()) {
            warn!(error = %e, "failed to write to terminal");
        }
    }
}

const CELL_WIDTH: usize = 7;

fn cell(at: PlanePoint) -> (i64, i64) {
    let col = (at.x / 1.5).round() as i64;
    let row = (at.y / (3f64.sqrt() / 2.0)).round() as i64;
    (row, col)
}

impl<W: Write + Send> Renderer for TerminalRenderer<W> {
    fn draw_board(&self, scene: &BoardScene) {
        let touched: BTreeSet<(i64, i64)> = scene
            .segments
            .iter()
            .flat_map(|s| [cell(s.from), cell(s.to)])
            .collect();
        let cells: BTreeMap<(i64, i64), String> = scene
            .points
            .iter()
            .map(|p| {
                let mark = if touched.contains(&cell(p.at)) { '*' } else { ' ' };
                (cell(p.at), format!("{},{}{mark}", p.axial.q(), p.axial.r()))
            })
            .collect();

        let rows = cells.keys().map(|(r, _)| *r);
        let cols = cells.keys().map(|(_, c)| *c);
        let (Some(r0), Some(r1)) = (rows.clone().min(), rows.max()) else {
            return;
        };
        let (Some(c0), Some(c1)) = (cols.clone().min(), cols.max()) else {
            return;
        };

        let mut text = String::from("\n");
        for row in r0..=r1 {
            let mut line = String::new();
            for col in c0..=c1 {
                let label = cells.get(&(row, col)).map(String::as_str).unwrap_or("");
                line.push_str(&format!("{label:<CELL_WIDTH$}"));
            }
            text.push_str(line.trim_end());
            text.push('\n');
        }

        let mut captured: BTreeMap<&str, usize> = BTreeMap::new();
        for tri in &scene.triangles {
            *captured.entry(tri.color.as_str()).or_default() += 1;
        }
        text.push_str(&format!(
            "segments drawn: {}, triangles captured: {}",
            scene.segments.len(),
            scene.triangles.len()
        ));
        for (color, n) in captured {
            text.push_str(&format!(" [{color}: {n}]"));
        }
        text.push('\n');
        self.emit(&text);
    }

    fn update_panel(&self, panel: &PanelView) {
        let mut text = String::new();
        let status = match &panel.status {
            TurnStatus::NeedsIdentity => "choose your color and the color you follow".to_string(),
            TurnStatus::Waiting { follow } => format!("waiting for {follow} to move..."),
            TurnStatus::MyTurn { mine } => format!("your move ({mine})"),
        };
        text.push_str(&format!("status: {status}\n"));
        let fmt_opt = |c: &Option<hexline_protocol::Color>| {
            c.as_ref().map_or_else(|| "-".to_string(), ToString::to_string)
        };
        text.push_str(&format!(
            "you: {}  follow: {}  last move: {}  undo: {}\n",
            fmt_opt(&panel.my_color),
            fmt_opt(&panel.follow_color),
            fmt_opt(&panel.last_move_color),
            if panel.undo_enabled { "available" } else { "-" },
        ));
        for (i, row) in panel.scores.iter().enumerate() {
            text.push_str(&format!(
                "  {}. {:<10} lines {:>3}  triangles {:>3}\n",
                i + 1,
                row.color,
                row.lines,
                row.triangles
            ));
        }
        if !panel.selected.is_empty() {
            let picked: Vec<String> = panel.selected.iter().map(ToString::to_string).collect();
            text.push_str(&format!("selected: {}\n", picked.join(" ")));
        }
        if let Some(message) = &panel.message {
            text.push_str(&format!("server: {message}\n"));
        }
        self.emit(&text);
    }

    fn show_clock(&self, clock: Option<&str>) {
        if let Some(clock) = clock {
            self.emit(&format!("\rturn clock {clock}  "));
        }
    }

    fn show_victory(&self, victory: &Victory) {
        let names: Vec<String> = victory.winners.iter().map(ToString::to_string).collect();
        let text = match names.as_slice() {
            [] => "game over: no players\n".to_string(),
            [one] => format!(
                "game over: {one} wins with {} triangles\n",
                victory.top_score
            ),
            many => format!(
                "game over: tie between {}, {} triangles each\n",
                many.join(", "),
                victory.top_score
            ),
        };
        self.emit(&text);
    }

    fn show_error(&self, message: &str) {
        self.emit(&format!("error: {message}\n"));
    }
}

/// One JSON object per line, for driving another front end.
pub struct JsonRenderer<W> {
    out: Mutex<W>,
}

impl<W: Write + Send> JsonRenderer<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner()
    }

    fn emit(&self, event: &str, payload: serde_json::Value) {
        let line = serde_json::json!({ "event": event, "payload": payload });
        let mut out = self.out.lock();
        if let Err(e) = writeln!(out, "{line}").and_then(|()| out.flush()) {
            warn!(error = %e, event, "failed to write event");
        }
    }
}

impl<W: Write + Send> Renderer for JsonRenderer<W> {
    fn draw_board(&self, scene: &BoardScene) {
        self.emit("board", serde_json::to_value(scene).unwrap_or_default());
    }

    fn update_panel(&self, panel: &PanelView) {
        self.emit("panel", serde_json::to_value(panel).unwrap_or_default());
    }

    fn show_clock(&self, clock: Option<&str>) {
        self.emit("clock", serde_json::json!(clock));
    }

    fn show_victory(&self, victory: &Victory) {
        self.emit("victory", serde_json::to_value(victory).unwrap_or_default());
    }

    fn show_error(&self, message: &str) {
        self.emit("error", serde_json::json!(message));
    }
}
