//! Document vote API routes

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;

use crate::annotations::{VoteCounts, VoteDirection};
use crate::documents::DocumentName;
use crate::error::Result;
use crate::state::AppState;

/// Create the votes router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_votes))
        .route("/:document", get(get_votes))
        .route("/:document/upvote", post(upvote))
        .route("/:document/downvote", post(downvote))
}

#[derive(Debug, Serialize)]
pub struct VotesResponse {
    pub votes: VoteCounts,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DocumentVotesResponse {
    pub document: String,
    pub votes: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

async fn list_votes(State(state): State<AppState>) -> Result<Json<VotesResponse>> {
    let counts = state.editor().votes().all().await?;
    Ok(Json(VotesResponse {
        votes: counts.value,
        warning: counts.warning,
    }))
}

async fn get_votes(
    State(state): State<AppState>,
    Path(document): Path<String>,
) -> Result<Json<DocumentVotesResponse>> {
    let document = DocumentName::parse(document)?;
    let count = state.editor().votes().count(&document).await?;
    Ok(Json(DocumentVotesResponse {
        document: document.to_string(),
        votes: count.value,
        warning: count.warning,
    }))
}

async fn upvote(
    State(state): State<AppState>,
    Path(document): Path<String>,
) -> Result<Json<DocumentVotesResponse>> {
    vote(state, document, VoteDirection::Up).await
}

async fn downvote(
    State(state): State<AppState>,
    Path(document): Path<String>,
) -> Result<Json<DocumentVotesResponse>> {
    vote(state, document, VoteDirection::Down).await
}

/// Documents must exist in the library to be voted on
async fn vote(
    state: AppState,
    document: String,
    direction: VoteDirection,
) -> Result<Json<DocumentVotesResponse>> {
    let document = DocumentName::parse(document)?;
    state.editor().documents().page_count(&document).await?;

    let count = state.editor().votes().vote(&document, direction).await?;
    Ok(Json(DocumentVotesResponse {
        document: document.to_string(),
        votes: count.value,
        warning: count.warning,
    }))
}
