//! Drives `HttpGameApi` against a small in-process rules engine.

use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use hexline_client::{ClientError, GameApi, HttpGameApi};
use hexline_protocol::{
    endpoints, Color, ErrorBody, GameState, GameStateResponse, Line, MoveRequest, Point,
    SelectColorRequest,
};
use reqwest::Url;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct Board {
    game: GameState,
    /// Session id to bound color.
    seats: HashMap<String, Color>,
    next_sid: u32,
}

type Shared = Arc<Mutex<Board>>;

fn sid(headers: &HeaderMap) -> Option<String> {
    let raw = headers.get(header::COOKIE)?.to_str().ok()?;
    raw.split(';')
        .map(str::trim)
        .find_map(|kv| kv.strip_prefix("sid=").map(str::to_string))
}

fn reject(status: StatusCode, error: &str) -> Response {
    (
        status,
        Json(ErrorBody {
            error: error.to_string(),
        }),
    )
        .into_response()
}

async fn game_state(State(board): State<Shared>, headers: HeaderMap) -> Json<GameStateResponse> {
    let board = board.lock().unwrap();
    let my_color = sid(&headers).and_then(|s| board.seats.get(&s).cloned());
    Json(GameStateResponse {
        game: board.game.clone(),
        my_color,
    })
}

async fn select_color(
    State(board): State<Shared>,
    headers: HeaderMap,
    Json(req): Json<SelectColorRequest>,
) -> Response {
    let mut board = board.lock().unwrap();
    if !board.game.has_player(&req.color) {
        return reject(StatusCode::BAD_REQUEST, "invalid color");
    }
    let (id, fresh) = match sid(&headers) {
        Some(id) => (id, false),
        None => {
            board.next_sid += 1;
            (format!("s{}", board.next_sid), true)
        }
    };
    board.seats.insert(id.clone(), req.color);
    let mut resp = Json(serde_json::json!({ "ok": true })).into_response();
    if fresh {
        let cookie = format!("sid={id}; Path=/");
        resp.headers_mut()
            .insert(header::SET_COOKIE, cookie.parse().unwrap());
    }
    resp
}

async fn submit_move(
    State(board): State<Shared>,
    headers: HeaderMap,
    Json(mv): Json<MoveRequest>,
) -> Response {
    let mut board = board.lock().unwrap();
    let Some(color) = sid(&headers).and_then(|s| board.seats.get(&s).cloned()) else {
        return reject(StatusCode::FORBIDDEN, "choose a color first");
    };
    let exists = board
        .game
        .lines
        .iter()
        .any(|l| l.points == [mv.p1, mv.p2] || l.points == [mv.p2, mv.p1]);
    if exists {
        return reject(StatusCode::BAD_REQUEST, "line already drawn");
    }
    board.game.lines.push(Line {
        points: vec![mv.p1, mv.p2],
        color: color.clone(),
    });
    board.game.last_move_color = Some(color);
    StatusCode::OK.into_response()
}

async fn undo(State(board): State<Shared>) -> Response {
    let mut board = board.lock().unwrap();
    if board.game.lines.pop().is_none() {
        return reject(StatusCode::BAD_REQUEST, "nothing to undo");
    }
    board.game.last_move_color = None;
    StatusCode::OK.into_response()
}

async fn reset(State(board): State<Shared>) -> StatusCode {
    let mut board = board.lock().unwrap();
    board.game.lines.clear();
    board.game.captured_triangles.clear();
    board.game.last_move_color = None;
    board.game.game_over = false;
    StatusCode::OK
}

async fn serve() -> (Url, Shared) {
    let board: Shared = Arc::new(Mutex::new(Board {
        game: GameState {
            players: vec![Color::from("red"), Color::from("blue")],
            points: vec![Point(0, 0), Point(3, 0), Point(0, 3)],
            ..GameState::default()
        },
        ..Board::default()
    }));
    let app = Router::new()
        .route(endpoints::GAME_STATE, get(game_state))
        .route(endpoints::SELECT_COLOR, post(select_color))
        .route(endpoints::MOVE, post(submit_move))
        .route(endpoints::UNDO, post(undo))
        .route(endpoints::RESET, post(reset))
        .with_state(board.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (Url::parse(&format!("http://{addr}")).unwrap(), board)
}

#[tokio::test]
async fn anonymous_client_sees_board_without_binding() {
    let (url, _) = serve().await;
    let api = HttpGameApi::new(url, None).unwrap();

    let state = api.fetch_state().await.unwrap();
    assert_eq!(state.game.players.len(), 2);
    assert_eq!(state.my_color, None);
    assert_eq!(api.session_cookie(), None);
}

#[tokio::test]
async fn rejection_reason_is_surfaced() {
    let (url, _) = serve().await;
    let api = HttpGameApi::new(url, None).unwrap();

    let err = api
        .submit_move(MoveRequest {
            p1: Point(0, 0),
            p2: Point(3, 0),
        })
        .await
        .unwrap_err();
    match err {
        ClientError::Rejected { status, reason } => {
            assert_eq!(status, 403);
            assert_eq!(reason, "choose a color first");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn seat_survives_a_new_client_via_saved_cookie() {
    let (url, board) = serve().await;
    let api = HttpGameApi::new(url.clone(), None).unwrap();
    api.select_color(&Color::from("blue")).await.unwrap();
    let cookie = api.session_cookie().expect("server set a session cookie");

    let mv = MoveRequest {
        p1: Point(0, 0),
        p2: Point(3, 0),
    };
    api.submit_move(mv).await.unwrap();
    assert_eq!(
        board.lock().unwrap().game.last_move_color,
        Some(Color::from("blue"))
    );

    let restored = HttpGameApi::new(url, Some(&cookie)).unwrap();
    let state = restored.fetch_state().await.unwrap();
    assert_eq!(state.my_color, Some(Color::from("blue")));

    let err = restored.submit_move(mv).await.unwrap_err();
    assert_eq!(err.user_reason(), Some("line already drawn"));
}

#[tokio::test]
async fn undo_and_reset_round_trip() {
    let (url, _) = serve().await;
    let api = HttpGameApi::new(url, None).unwrap();
    api.select_color(&Color::from("red")).await.unwrap();
    api.submit_move(MoveRequest {
        p1: Point(0, 0),
        p2: Point(0, 3),
    })
    .await
    .unwrap();

    api.undo().await.unwrap();
    let state = api.fetch_state().await.unwrap();
    assert!(state.game.lines.is_empty());
    assert_eq!(state.game.last_move_color, None);

    let err = api.undo().await.unwrap_err();
    assert_eq!(err.user_reason(), Some("nothing to undo"));

    api.reset().await.unwrap();
    assert_eq!(api.fetch_state().await.unwrap().my_color, Some(Color::from("red")));
}

#[tokio::test]
async fn unparseable_error_body_falls_back_to_status() {
    let app = Router::new().route(
        endpoints::RESET,
        post(|| async { (StatusCode::SERVICE_UNAVAILABLE, "busy") }),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let api = HttpGameApi::new(Url::parse(&format!("http://{addr}")).unwrap(), None).unwrap();
    match api.reset().await.unwrap_err() {
        ClientError::Rejected { status, reason } => {
            assert_eq!(status, 503);
            assert!(reason.contains("503"));
        }
        other => panic!("unexpected error: {other}"),
    }
}
