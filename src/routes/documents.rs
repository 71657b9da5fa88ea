//! Document library API routes

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use serde::Serialize;

use super::page_ref;
use crate::annotations::{PageView, RenderedPage};
use crate::error::Result;
use crate::state::AppState;

/// Create the documents router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_documents))
        .route("/:document/pages/:page", get(get_page))
        .route("/:document/pages/:page/text", get(get_page_text))
}

/// A library document with its vote count
#[derive(Debug, Serialize)]
pub struct DocumentSummary {
    pub name: String,
    pub votes: i64,
}

#[derive(Debug, Serialize)]
pub struct DocumentsListResponse {
    pub documents: Vec<DocumentSummary>,
    pub total: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

/// List library documents with their votes
async fn list_documents(State(state): State<AppState>) -> Result<Json<DocumentsListResponse>> {
    let editor = state.editor();
    let names = editor.documents().list().await?;
    let counts = editor.votes().all().await?;

    let documents: Vec<DocumentSummary> = names
        .into_iter()
        .map(|name| DocumentSummary {
            votes: counts.value.get(name.as_str()).copied().unwrap_or(0),
            name: name.to_string(),
        })
        .collect();

    Ok(Json(DocumentsListResponse {
        total: documents.len(),
        documents,
        warning: counts.warning,
    }))
}

/// Everything stored for one page
async fn get_page(
    State(state): State<AppState>,
    Path((document, page)): Path<(String, u32)>,
) -> Result<Json<PageView>> {
    let page_ref = page_ref(document, page)?;
    Ok(Json(state.editor().page_view(&page_ref).await?))
}

/// Page text with highlights marked
async fn get_page_text(
    State(state): State<AppState>,
    Path((document, page)): Path<(String, u32)>,
) -> Result<Json<RenderedPage>> {
    let page_ref = page_ref(document, page)?;
    Ok(Json(state.editor().render_page(&page_ref).await?))
}
