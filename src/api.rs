use std::fmt;

use gloo::net::http::{Request, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;

use lastspike_core::{GameSnapshot, PlayerProfile, SessionData, Trade};

/// REST client for the lobby and game endpoints. Every call goes to the
/// authoritative backend; a failed fetch is logged by the caller and the
/// previously rendered snapshot stays on screen.
#[derive(Clone)]
pub(crate) struct ApiClient {
    base: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ApiError {
    Status { code: u16, body: String },
    Network(String),
    Decode(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Status { code, body } => write!(f, "api error {code}: {body}"),
            ApiError::Network(detail) => write!(f, "network error: {detail}"),
            ApiError::Decode(detail) => write!(f, "bad response body: {detail}"),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<gloo::net::Error> for ApiError {
    fn from(err: gloo::net::Error) -> Self {
        ApiError::Network(err.to_string())
    }
}

#[derive(Serialize)]
struct CreatePlayerBody<'a> {
    name: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateSessionBody<'a> {
    player_ids: [&'a str; 1],
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SubmitActionBody<'a> {
    player_id: &'a str,
    action: u8,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RespondTradeBody<'a> {
    player_id: &'a str,
    accept: bool,
}

async fn checked(response: Response) -> Result<Response, ApiError> {
    if response.ok() {
        return Ok(response);
    }
    let code = response.status();
    let body = response.text().await.unwrap_or_default();
    Err(ApiError::Status { code, body })
}

/// Empty bodies are valid success responses on mutation endpoints.
async fn json_or_default<T>(response: Response) -> Result<T, ApiError>
where
    T: DeserializeOwned + Default,
{
    let text = response
        .text()
        .await
        .map_err(|err| ApiError::Decode(err.to_string()))?;
    if text.trim().is_empty() {
        return Ok(T::default());
    }
    serde_json::from_str(&text).map_err(|err| ApiError::Decode(err.to_string()))
}

impl ApiClient {
    pub(crate) fn new(base: impl Into<String>) -> Self {
        let base = base.into();
        Self {
            base: base.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base)
    }

    async fn get_json<T>(&self, path: &str) -> Result<T, ApiError>
    where
        T: DeserializeOwned + Default,
    {
        let response = Request::get(&self.url(path)).send().await?;
        json_or_default(checked(response).await?).await
    }

    async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize,
        T: DeserializeOwned + Default,
    {
        let response = Request::post(&self.url(path)).json(body)?.send().await?;
        json_or_default(checked(response).await?).await
    }

    pub(crate) async fn create_player(&self, name: &str) -> Result<PlayerProfile, ApiError> {
        self.post_json("/api/Players", &CreatePlayerBody { name })
            .await
    }

    pub(crate) async fn get_player(&self, player_id: &str) -> Result<PlayerProfile, ApiError> {
        self.get_json(&format!("/api/Players/{player_id}")).await
    }

    pub(crate) async fn create_session(&self, host_id: &str) -> Result<SessionData, ApiError> {
        self.post_json(
            "/api/Sessions",
            &CreateSessionBody {
                player_ids: [host_id],
            },
        )
        .await
    }

    pub(crate) async fn join_session(
        &self,
        session_id: &str,
        player_id: &str,
    ) -> Result<(), ApiError> {
        let response = Request::post(&self.url(&format!(
            "/api/Sessions/{session_id}/players/{player_id}"
        )))
        .send()
        .await?;
        checked(response).await?;
        Ok(())
    }

    pub(crate) async fn get_session(&self, session_id: &str) -> Result<SessionData, ApiError> {
        self.get_json(&format!("/api/Sessions/{session_id}")).await
    }

    pub(crate) async fn start_game(
        &self,
        session_id: &str,
        player_id: &str,
    ) -> Result<(), ApiError> {
        let response = Request::put(&self.url(&format!(
            "/api/Sessions/{session_id}/start_game?playerId={player_id}"
        )))
        .send()
        .await?;
        checked(response).await?;
        Ok(())
    }

    pub(crate) async fn get_game_state(&self, session_id: &str) -> Result<GameSnapshot, ApiError> {
        self.get_json(&format!("/api/Sessions/{session_id}/game_state"))
            .await
    }

    pub(crate) async fn submit_action(
        &self,
        session_id: &str,
        player_id: &str,
        action: u8,
    ) -> Result<(), ApiError> {
        let response = Request::post(&self.url(&format!("/api/Sessions/{session_id}/actions")))
            .json(&SubmitActionBody { player_id, action })?
            .send()
            .await?;
        checked(response).await?;
        Ok(())
    }

    pub(crate) async fn propose_trade(
        &self,
        session_id: &str,
        trade: &Trade,
    ) -> Result<(), ApiError> {
        let response = Request::post(&self.url(&format!("/api/Sessions/{session_id}/trades")))
            .json(trade)?
            .send()
            .await?;
        checked(response).await?;
        Ok(())
    }

    pub(crate) async fn respond_trade(
        &self,
        session_id: &str,
        player_id: &str,
        accept: bool,
    ) -> Result<(), ApiError> {
        let response = Request::put(&self.url(&format!("/api/Sessions/{session_id}/trades")))
            .json(&RespondTradeBody { player_id, accept })?
            .send()
            .await?;
        checked(response).await?;
        Ok(())
    }
}
