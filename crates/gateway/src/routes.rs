//! HTTP routes.

use crate::{
    auth::{ANONYMOUS, Authenticator, bearer_token},
    error::ApiError,
    hook::Hook,
    orchestrator::ChatTurn,
    state::Gateway,
    utils::{cookie, new_id},
};
use axum::{
    Json, Router,
    body::{Body, Bytes},
    extract::{Path, Query, State},
    http::{HeaderMap, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use futures_util::StreamExt;
use pcore::Store;
use protocol::{
    CHAT_ID_HEADER, Chat, ChatPage, ChatRequest, DATA_STREAM_HEADER, DeleteResponse, MODEL_COOKIE,
    ModelSpec, NEW_CHAT_ID, SEARCH_MODE_COOKIE, SuperPromptRequest, SuperPromptResponse,
};
use serde::Deserialize;
use std::convert::Infallible;

/// Default page size of `GET /api/chats`.
const DEFAULT_PAGE_LIMIT: usize = 20;

const TEXT_PLAIN: &str = "text/plain; charset=utf-8";

/// Build the axum router.
pub fn router<H: Hook, A: Authenticator>(state: Gateway<H, A>) -> Router {
    Router::new()
        .route("/api/chat", post(chat::<H, A>))
        .route(
            "/api/chat/{id}",
            get(load_chat::<H, A>).delete(delete_chat::<H, A>),
        )
        .route("/api/chats", get(list_chats::<H, A>))
        .route("/api/generate-super-prompt", post(super_prompt::<H, A>))
        .with_state(state)
}

/// Resolve the requesting user. No token means anonymous.
async fn user_id<A: Authenticator>(auth: &A, headers: &HeaderMap) -> Result<String, ApiError> {
    let Some(token) = bearer_token(headers) else {
        return Ok(ANONYMOUS.to_owned());
    };
    auth.authenticate(token)
        .await
        .map(|ctx| ctx.user_id.to_string())
        .map_err(|_| ApiError::Unauthorized)
}

/// The model from the model cookie, or `default` when absent or malformed.
fn selected_model(headers: &HeaderMap, default: &ModelSpec) -> ModelSpec {
    let Some(json) = cookie(headers, MODEL_COOKIE) else {
        return default.clone();
    };
    match serde_json::from_str(&json) {
        Ok(model) => model,
        Err(e) => {
            tracing::warn!("malformed {MODEL_COOKIE} cookie, using default model: {e}");
            default.clone()
        }
    }
}

/// `POST /api/chat`: stream a chat turn.
async fn chat<H: Hook, A: Authenticator>(
    State(state): State<Gateway<H, A>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    let request: ChatRequest =
        serde_json::from_slice(&body).map_err(|e| ApiError::ChatRequest(e.into()))?;

    let from_share = headers
        .get(header::REFERER)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|referer| referer.contains("/share/"));
    if from_share {
        return Err(ApiError::SharePage);
    }

    let user_id = user_id(state.authenticator.as_ref(), &headers).await?;
    let chat_id = if request.id.is_empty() || request.id == NEW_CHAT_ID {
        new_id()
    } else {
        request.id
    };
    let model = selected_model(&headers, &state.chat.default_model);
    let search_mode = cookie(&headers, SEARCH_MODE_COOKIE).is_some_and(|value| value == "true");

    let provider = match state.providers.get(&model.provider_id) {
        Some(provider) if model.enabled => provider.clone(),
        _ => return Err(ApiError::ProviderDisabled(model.provider_id)),
    };

    tracing::info!(
        "chat {chat_id}: {} ({:?}), search {search_mode}, user {user_id}",
        model.qualified_id(),
        model.tool_call_type
    );
    let turn = ChatTurn {
        messages: request.messages,
        model,
        chat_id: chat_id.clone(),
        search_mode,
        user_id,
    };
    let stream = state
        .orchestrator(provider)
        .run(turn)
        .map(|part| Ok::<_, Infallible>(part.encode()));

    Response::builder()
        .header(header::CONTENT_TYPE, TEXT_PLAIN)
        .header(DATA_STREAM_HEADER, "v1")
        .header(CHAT_ID_HEADER, chat_id)
        .body(Body::from_stream(stream))
        .map_err(|e| ApiError::ChatRequest(e.into()))
}

#[derive(Debug, Default, Deserialize)]
struct PageQuery {
    offset: Option<String>,
    limit: Option<String>,
}

impl PageQuery {
    fn offset(&self) -> usize {
        parse_or(self.offset.as_deref(), 0)
    }

    fn limit(&self) -> usize {
        parse_or(self.limit.as_deref(), DEFAULT_PAGE_LIMIT).max(1)
    }
}

fn parse_or(value: Option<&str>, default: usize) -> usize {
    value
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(default)
}

/// `GET /api/chats`: a page of the user's chats.
async fn list_chats<H: Hook, A: Authenticator>(
    State(state): State<Gateway<H, A>>,
    headers: HeaderMap,
    Query(query): Query<PageQuery>,
) -> Result<Json<ChatPage>, ApiError> {
    let user_id = user_id(state.authenticator.as_ref(), &headers).await?;
    let page = state
        .store
        .chats_page(&user_id, query.limit(), query.offset())
        .await
        .map_err(ApiError::ListChats)?;
    Ok(Json(page))
}

/// `GET /api/chat/{id}`: one stored chat.
async fn load_chat<H: Hook, A: Authenticator>(
    State(state): State<Gateway<H, A>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Chat>, ApiError> {
    let user_id = user_id(state.authenticator.as_ref(), &headers).await?;
    state
        .store
        .get_chat(&id, &user_id)
        .await
        .map_err(ApiError::LoadChat)?
        .map(Json)
        .ok_or(ApiError::ChatNotFound)
}

/// `DELETE /api/chat/{id}`: delete a chat.
async fn delete_chat<H: Hook, A: Authenticator>(
    State(state): State<Gateway<H, A>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>, ApiError> {
    let user_id = user_id(state.authenticator.as_ref(), &headers).await?;
    let existed = state
        .store
        .delete_chat(&id, &user_id)
        .await
        .map_err(ApiError::DeleteChat)?;
    tracing::debug!("delete chat {id} for {user_id}: existed {existed}");
    Ok(Json(DeleteResponse { success: true }))
}

/// `POST /api/generate-super-prompt`.
async fn super_prompt<H: Hook, A: Authenticator>(
    State(state): State<Gateway<H, A>>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let request: SuperPromptRequest =
        serde_json::from_slice(&body).map_err(|e| ApiError::SuperPrompt(e.into()))?;

    let input = request.input.unwrap_or_default();
    if request.stream {
        let stream = state.super_prompt.stream(&input)?;
        return Ok(([(header::CONTENT_TYPE, TEXT_PLAIN)], Body::from_stream(stream)).into_response());
    }

    let prompt = state.super_prompt.generate(&input).await?;
    Ok(Json(SuperPromptResponse { prompt }).into_response())
}
