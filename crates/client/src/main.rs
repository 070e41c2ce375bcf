use clap::{Parser, Subcommand};
use hexline_client::config::{
    default_session_db, ClientConfig, OutputFormat, DEFAULT_POLL_MS, DEFAULT_SERVER,
    DEFAULT_SESSION,
};
use hexline_client::render::{JsonRenderer, Renderer, TerminalRenderer};
use hexline_client::{logging, ClientError, ClientSession, HttpGameApi};
use hexline_engine::geometry::PlanePoint;
use hexline_engine::{ClickOutcome, IdentityStore, SessionStore, SqliteSessionStore};
use hexline_protocol::Point;
use reqwest::Url;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "hexline", version, about = "Terminal client for a shared Hexline board")]
struct Cli {
    #[arg(long, env = "HEXLINE_SERVER", default_value = DEFAULT_SERVER, global = true)]
    server: Url,
    #[arg(long, env = "HEXLINE_POLL_MS", default_value_t = DEFAULT_POLL_MS, global = true)]
    poll_ms: u64,
    #[arg(long, env = "HEXLINE_SESSION", default_value = DEFAULT_SESSION, global = true)]
    session: String,
    #[arg(long, env = "HEXLINE_SESSION_DB", global = true)]
    session_db: Option<PathBuf>,
    /// Emit board and panel updates as JSON lines instead of text.
    #[arg(long, global = true)]
    json: bool,
    #[arg(long, global = true)]
    log_json: bool,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Join the board and play (default).
    Play,
    /// Forget this session's colors and server cookie.
    EndSession,
}

impl Cli {
    fn config(&self) -> ClientConfig {
        let mut config = ClientConfig::new(self.server.clone())
            .with_poll_interval(Duration::from_millis(self.poll_ms));
        config.session = self.session.clone();
        config.session_db = self.session_db.clone().unwrap_or_else(default_session_db);
        if self.json {
            config.output = OutputFormat::Json;
        }
        config
    }
}

const HELP: &str = "\
commands:
  pick <q> <r>   select a lattice point; two points make a move
  tap <x> <y>    select the point nearest to board coordinates x, y
  color <c>      claim your color (name or number)
  follow <c>     the color whose move hands you the turn
  undo           take back your own last move
  reset          clear the board for everyone
  help           this text
  quit

rules:
  The board is a hexagon of points. Each move draws a straight line of
  four consecutive points (pick both ends). A line that closes a small
  triangle captures it for your color; each triangle is captured once,
  by whoever closes it first. When every triangle is taken the game ends
  and the color with the most triangles wins; ties share the win.
";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init_tracing(cli.log_json);
    let config = cli.config();
    let store = Arc::new(SqliteSessionStore::new(
        config.session_db.clone(),
        config.session.clone(),
    ));

    match cli.command.unwrap_or(Command::Play) {
        Command::EndSession => {
            store.clear()?;
            info!(session = store.session(), db = %store.db_path().display(), "session ended");
            Ok(())
        }
        Command::Play => play(config, store).await,
    }
}

async fn play(config: ClientConfig, store: Arc<SqliteSessionStore>) -> anyhow::Result<()> {
    let identity = Arc::new(IdentityStore::init(store)?);
    let api = HttpGameApi::new(config.server.clone(), identity.cookie()?.as_deref())?;
    let renderer: Arc<dyn Renderer> = match config.output {
        OutputFormat::Text => Arc::new(TerminalRenderer::new(std::io::stdout())),
        OutputFormat::Json => Arc::new(JsonRenderer::new(std::io::stdout())),
    };
    let session = Arc::new(ClientSession::new(api, identity, renderer.clone()));

    info!(server = %config.server, session = %config.session, "joining board");
    let poller = session.spawn_poller(config.poll_interval);
    let clock = session.spawn_clock_display();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut confirm_reset = false;
    loop {
        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(line) = line else { break };
        let words: Vec<&str> = line.split_whitespace().collect();

        if std::mem::take(&mut confirm_reset) {
            if matches!(words.as_slice(), ["y" | "yes"]) {
                report(renderer.as_ref(), session.reset().await);
            }
            continue;
        }

        match words.as_slice() {
            [] => {}
            ["quit" | "exit"] => break,
            ["help"] => print!("{HELP}"),
            ["pick", q, r] => {
                let (Ok(q), Ok(r)) = (q.parse(), r.parse()) else {
                    renderer.show_error("usage: pick <q> <r>");
                    continue;
                };
                let point = Point(q, r);
                let on_board = session
                    .sync()
                    .snapshot()
                    .is_some_and(|s| s.points.contains(&point));
                if !on_board {
                    renderer.show_error(&format!("{point} is not on the board"));
                    continue;
                }
                match session.click(point).await {
                    Ok(ClickOutcome::Ignored) => renderer.show_error("not your turn"),
                    Ok(_) => {}
                    Err(e) => report(renderer.as_ref(), Err(e)),
                }
            }
            ["tap", x, y] => {
                let (Ok(x), Ok(y)) = (x.parse(), y.parse()) else {
                    renderer.show_error("usage: tap <x> <y>");
                    continue;
                };
                match session.click_at(PlanePoint { x, y }).await {
                    Ok(None) => renderer.show_error("no point there"),
                    Ok(Some(ClickOutcome::Ignored)) => renderer.show_error("not your turn"),
                    Ok(Some(_)) => {}
                    Err(e) => report(renderer.as_ref(), Err(e)),
                }
            }
            ["color", c] => match session.resolve_color(c) {
                Ok(color) => report(renderer.as_ref(), session.choose_my_color(&color).await),
                Err(e) => report(renderer.as_ref(), Err(e)),
            },
            ["follow", c] => {
                let result = session
                    .resolve_color(c)
                    .and_then(|color| session.choose_follow_color(&color));
                report(renderer.as_ref(), result);
            }
            ["undo"] => match session.undo().await {
                Ok(false) => renderer.show_error("only the author of the last move can undo it"),
                Ok(true) => {}
                Err(e) => report(renderer.as_ref(), Err(e)),
            },
            ["reset"] => {
                println!("reset the whole board for everyone? [y/N]");
                confirm_reset = true;
            }
            _ => renderer.show_error("unknown command, try `help`"),
        }
    }

    poller.abort();
    clock.abort();
    Ok(())
}

fn report(renderer: &dyn Renderer, result: Result<(), ClientError>) {
    match result {
        Ok(()) => {}
        // Already shown by the session.
        Err(ClientError::Rejected { .. }) => {}
        Err(e @ (ClientError::Transport(_) | ClientError::Decode(_))) => {
            warn!(error = %e, "request failed");
        }
        Err(e) => renderer.show_error(&e.to_string()),
    }
}
