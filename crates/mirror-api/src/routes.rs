use std::sync::Arc;

use axum::{
    Router,
    body::Bytes,
    extract::State,
    http::{Method, StatusCode, Uri, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::{debug, error, warn};

use mirror_db::Database;
use mirror_db::models::MessageKey;
use mirror_types::validation::{TimestampFormat, parse_identifier, parse_timestamp};

use crate::credentials::ApiKeyResolver;
use crate::dispatcher::{Captures, Dispatcher, Resolution};
use crate::error::{ApiError, parse_body};
use crate::messages::MessageService;
use crate::users::UserService;

/// Operations reachable over HTTP.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    ListMessages,
    ListMessagesByOwner,
    ReadMessage,
    CreateMessage,
    UpdateMessage,
    DeleteMessage,
    ListUsers,
    CreateUser,
}

/// Route table under `prefix` (e.g. `/api/v1`).
pub fn dispatcher(prefix: &str) -> Dispatcher<Endpoint> {
    let prefix = prefix.trim_end_matches('/');
    let messages = format!("{prefix}/messages");
    let by_owner = format!("{messages}/{{owner}}");
    let by_key = format!("{messages}/{{owner}}/{{created_at}}");
    let users = format!("{prefix}/users");

    Dispatcher::new()
        .route(Method::GET, &messages, Endpoint::ListMessages)
        .route(Method::GET, &by_owner, Endpoint::ListMessagesByOwner)
        .route(Method::GET, &by_key, Endpoint::ReadMessage)
        .route(Method::POST, &messages, Endpoint::CreateMessage)
        .route(Method::PUT, &by_key, Endpoint::UpdateMessage)
        .route(Method::DELETE, &by_key, Endpoint::DeleteMessage)
        .route(Method::GET, &users, Endpoint::ListUsers)
        .route(Method::POST, &users, Endpoint::CreateUser)
}

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub messages: MessageService,
    pub users: UserService,
    pub dispatcher: Dispatcher<Endpoint>,
}

impl AppStateInner {
    pub fn new(db: Arc<Database>, prefix: &str) -> Self {
        let credentials = Arc::new(ApiKeyResolver::new(db.clone()));
        Self {
            messages: MessageService::new(db.clone(), credentials),
            users: UserService::new(db),
            dispatcher: dispatcher(prefix),
        }
    }
}

/// Every request goes through [`serve`]; axum's own routing is not used.
pub fn router(state: AppState) -> Router {
    Router::new().fallback(serve).with_state(state)
}

pub async fn serve(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    body: Bytes,
) -> Response {
    let (endpoint, captures) = match state.dispatcher.resolve(&method, uri.path()) {
        Resolution::Matched { handler, captures } => (*handler, captures),
        Resolution::MethodNotAllowed { allow } => {
            warn!("{} not allowed on {}", method, uri.path());
            return ApiError::MethodNotAllowed(allow).into_response();
        }
        Resolution::NotFound => {
            debug!("No route for {} {}", method, uri.path());
            return ApiError::NotFound.into_response();
        }
    };

    // Database work is blocking; keep it off the async runtime.
    let result = tokio::task::spawn_blocking(move || handle(&state, endpoint, &captures, &body))
        .await
        .unwrap_or_else(|e| {
            error!("spawn_blocking join error: {}", e);
            Err(ApiError::Internal)
        });

    match result {
        Ok(response) => response,
        Err(err) => err.into_response(),
    }
}

fn handle(
    state: &AppStateInner,
    endpoint: Endpoint,
    captures: &Captures,
    body: &[u8],
) -> Result<Response, ApiError> {
    match endpoint {
        Endpoint::ListMessages => json(StatusCode::OK, &state.messages.list()?),
        Endpoint::ListMessagesByOwner => {
            let owner = owner_capture(captures)?;
            json(StatusCode::OK, &state.messages.list_by_owner(owner)?)
        }
        Endpoint::ReadMessage => {
            let key = key_captures(captures)?;
            json(StatusCode::OK, &state.messages.read(key)?)
        }
        Endpoint::CreateMessage => json(StatusCode::CREATED, &state.messages.create(body)?),
        Endpoint::UpdateMessage => {
            let key = key_captures(captures)?;
            json(StatusCode::OK, &state.messages.update(key, body)?)
        }
        Endpoint::DeleteMessage => {
            let key = key_captures(captures)?;
            json(StatusCode::OK, &state.messages.delete(key, body)?)
        }
        Endpoint::ListUsers => json(StatusCode::OK, &state.users.list()?),
        Endpoint::CreateUser => {
            let input = parse_body(body)?;
            json(StatusCode::CREATED, &state.users.create(&input)?)
        }
    }
}

// Malformed captures name no resource, so they answer 404 like a miss.

fn owner_capture(captures: &Captures) -> Result<uuid::Uuid, ApiError> {
    parse_identifier(captures.get(0)?).map_err(|e| {
        debug!("{}", e);
        ApiError::NotFound
    })
}

fn key_captures(captures: &Captures) -> Result<MessageKey, ApiError> {
    let owner_id = owner_capture(captures)?;
    let created_at =
        parse_timestamp(captures.get(1)?, TimestampFormat::Rfc3339Nano).map_err(|e| {
            debug!("{}", e);
            ApiError::NotFound
        })?;
    Ok(MessageKey {
        owner_id,
        created_at,
    })
}

fn json<T: Serialize>(status: StatusCode, value: &T) -> Result<Response, ApiError> {
    let bytes = serde_json::to_vec(value).map_err(|e| {
        error!("Could not encode response: {}", e);
        ApiError::Encoding
    })?;
    Ok((status, [(header::CONTENT_TYPE, "application/json")], bytes).into_response())
}
