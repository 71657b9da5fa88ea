//! Per-page annotation API routes
//!
//! Highlights, comments (with votes) and notes of one document page.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use super::{page_ref, AppJson};
use crate::annotations::{Comment, Highlight, PageIndex, VoteDirection};
use crate::error::Result;
use crate::state::AppState;

/// Create the annotations router, nested under `/documents`
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/:document/pages/:page/highlights",
            get(list_highlights).post(create_highlight),
        )
        .route(
            "/:document/pages/:page/comments",
            get(list_comments).post(create_comment),
        )
        .route(
            "/:document/pages/:page/comments/:index/upvote",
            post(upvote_comment),
        )
        .route(
            "/:document/pages/:page/comments/:index/downvote",
            post(downvote_comment),
        )
        .route("/:document/pages/:page/note", get(get_note).put(save_note))
}

/// Request body for creating a highlight
#[derive(Debug, Deserialize)]
pub struct CreateHighlightRequest {
    pub start: usize,
    pub end: usize,
}

/// Request body for creating a comment
#[derive(Debug, Deserialize)]
pub struct CreateCommentRequest {
    pub name: String,
    #[serde(alias = "text")]
    pub comment: String,
}

/// Request body for saving a note
#[derive(Debug, Deserialize)]
pub struct SaveNoteRequest {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct HighlightsResponse {
    pub document: String,
    pub page: PageIndex,
    pub highlights: Vec<Highlight>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CommentsResponse {
    pub document: String,
    pub page: PageIndex,
    pub comments: Vec<Comment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CommentResponse {
    pub document: String,
    pub page: PageIndex,
    pub index: usize,
    pub comment: Comment,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct NoteResponse {
    pub document: String,
    pub page: PageIndex,
    pub note: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

async fn list_highlights(
    State(state): State<AppState>,
    Path((document, page)): Path<(String, u32)>,
) -> Result<Json<HighlightsResponse>> {
    let page_ref = page_ref(document, page)?;
    let highlights = state.editor().highlights(&page_ref).await?;
    Ok(Json(HighlightsResponse {
        document: page_ref.document.to_string(),
        page,
        highlights: highlights.value,
        warning: highlights.warning,
    }))
}

async fn create_highlight(
    State(state): State<AppState>,
    Path((document, page)): Path<(String, u32)>,
    AppJson(data): AppJson<CreateHighlightRequest>,
) -> Result<(StatusCode, Json<HighlightsResponse>)> {
    let page_ref = page_ref(document, page)?;
    let highlights = state
        .editor()
        .add_highlight(&page_ref, data.start, data.end)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(HighlightsResponse {
            document: page_ref.document.to_string(),
            page,
            highlights: highlights.value,
            warning: highlights.warning,
        }),
    ))
}

async fn list_comments(
    State(state): State<AppState>,
    Path((document, page)): Path<(String, u32)>,
) -> Result<Json<CommentsResponse>> {
    let page_ref = page_ref(document, page)?;
    let comments = state.editor().comments(&page_ref).await?;
    Ok(Json(CommentsResponse {
        document: page_ref.document.to_string(),
        page,
        comments: comments.value,
        warning: comments.warning,
    }))
}

async fn create_comment(
    State(state): State<AppState>,
    Path((document, page)): Path<(String, u32)>,
    AppJson(data): AppJson<CreateCommentRequest>,
) -> Result<(StatusCode, Json<CommentsResponse>)> {
    let page_ref = page_ref(document, page)?;
    let comments = state
        .editor()
        .add_comment(&page_ref, &data.name, &data.comment)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(CommentsResponse {
            document: page_ref.document.to_string(),
            page,
            comments: comments.value,
            warning: comments.warning,
        }),
    ))
}

async fn upvote_comment(
    State(state): State<AppState>,
    Path((document, page, index)): Path<(String, u32, usize)>,
) -> Result<Json<CommentResponse>> {
    vote_comment(state, document, page, index, VoteDirection::Up).await
}

async fn downvote_comment(
    State(state): State<AppState>,
    Path((document, page, index)): Path<(String, u32, usize)>,
) -> Result<Json<CommentResponse>> {
    vote_comment(state, document, page, index, VoteDirection::Down).await
}

async fn vote_comment(
    state: AppState,
    document: String,
    page: u32,
    index: usize,
    direction: VoteDirection,
) -> Result<Json<CommentResponse>> {
    let page_ref = page_ref(document, page)?;
    let comment = state
        .editor()
        .vote_comment(&page_ref, index, direction)
        .await?;
    Ok(Json(CommentResponse {
        document: page_ref.document.to_string(),
        page,
        index,
        comment: comment.value,
        warning: comment.warning,
    }))
}

async fn get_note(
    State(state): State<AppState>,
    Path((document, page)): Path<(String, u32)>,
) -> Result<Json<NoteResponse>> {
    let page_ref = page_ref(document, page)?;
    let note = state.editor().note(&page_ref).await?;
    Ok(Json(NoteResponse {
        document: page_ref.document.to_string(),
        page,
        note: note.value,
        warning: note.warning,
    }))
}

async fn save_note(
    State(state): State<AppState>,
    Path((document, page)): Path<(String, u32)>,
    AppJson(data): AppJson<SaveNoteRequest>,
) -> Result<Json<NoteResponse>> {
    let page_ref = page_ref(document, page)?;
    let note = state.editor().save_note(&page_ref, &data.text).await?;
    Ok(Json(NoteResponse {
        document: page_ref.document.to_string(),
        page,
        note: note.value,
        warning: note.warning,
    }))
}
