use async_trait::async_trait;
use hexline_protocol::{
    endpoints, Color, ErrorBody, GameStateResponse, MoveRequest, SelectColorRequest,
};
use reqwest::cookie::{CookieStore, Jar};
use reqwest::{Response, StatusCode, Url};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::error::{ClientError, Result};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// The rules engine's REST surface as the client sees it.
#[async_trait]
pub trait GameApi: Send + Sync {
    async fn fetch_state(&self) -> Result<GameStateResponse>;
    async fn submit_move(&self, mv: MoveRequest) -> Result<()>;
    async fn select_color(&self, color: &Color) -> Result<()>;
    async fn undo(&self) -> Result<()>;
    async fn reset(&self) -> Result<()>;

    /// Session cookie to persist, if the transport has one.
    fn session_cookie(&self) -> Option<String> {
        None
    }
}

#[derive(Debug, Clone)]
pub struct HttpGameApi {
    http: reqwest::Client,
    base: Url,
    jar: Arc<Jar>,
}

impl HttpGameApi {
    /// `cookie` is a previously saved `Cookie` header value for `base`.
    pub fn new(base: Url, cookie: Option<&str>) -> Result<Self> {
        let jar = Arc::new(Jar::default());
        if let Some(cookie) = cookie {
            for pair in cookie.split(';').map(str::trim).filter(|p| !p.is_empty()) {
                jar.add_cookie_str(pair, &base);
            }
        }
        let http = reqwest::Client::builder()
            .cookie_provider(jar.clone())
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self { http, base, jar })
    }

    fn url(&self, path: &str) -> Result<Url> {
        self.base
            .join(path)
            .map_err(|e| ClientError::Endpoint(format!("{path}: {e}")))
    }

    async fn post_empty(&self, path: &str) -> Result<()> {
        let resp = self.http.post(self.url(path)?).send().await?;
        check(resp).await
    }
}

#[async_trait]
impl GameApi for HttpGameApi {
    async fn fetch_state(&self) -> Result<GameStateResponse> {
        let resp = self.http.get(self.url(endpoints::GAME_STATE)?).send().await?;
        let status = resp.status();
        let bytes = resp.bytes().await?;
        if !status.is_success() {
            return Err(rejection(status, &bytes));
        }
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn submit_move(&self, mv: MoveRequest) -> Result<()> {
        debug!(p1 = %mv.p1, p2 = %mv.p2, "submitting move");
        let resp = self
            .http
            .post(self.url(endpoints::MOVE)?)
            .json(&mv)
            .send()
            .await?;
        check(resp).await
    }

    async fn select_color(&self, color: &Color) -> Result<()> {
        let resp = self
            .http
            .post(self.url(endpoints::SELECT_COLOR)?)
            .json(&SelectColorRequest {
                color: color.clone(),
            })
            .send()
            .await?;
        check(resp).await
    }

    async fn undo(&self) -> Result<()> {
        self.post_empty(endpoints::UNDO).await
    }

    async fn reset(&self) -> Result<()> {
        self.post_empty(endpoints::RESET).await
    }

    fn session_cookie(&self) -> Option<String> {
        let header = self.jar.cookies(&self.base)?;
        header.to_str().ok().map(str::to_string)
    }
}

async fn check(resp: Response) -> Result<()> {
    let status = resp.status();
    if status.is_success() {
        return Ok(());
    }
    let bytes = resp.bytes().await?;
    Err(rejection(status, &bytes))
}

fn rejection(status: StatusCode, body: &[u8]) -> ClientError {
    let reason = serde_json::from_slice::<ErrorBody>(body)
        .map(|b| b.error)
        .unwrap_or_else(|_| status.to_string());
    ClientError::Rejected {
        status: status.as_u16(),
        reason,
    }
}
