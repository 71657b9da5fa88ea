//! Route modules for Pagemark

pub mod annotations;
pub mod documents;
pub mod health;
pub mod votes;

use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    middleware,
    routing::get,
    Json, Router,
};

use crate::access::require_secret;
use crate::annotations::PageRef;
use crate::documents::DocumentName;
use crate::error::{AppError, Result};
use crate::state::AppState;

/// Build the application router
pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .nest(
            "/documents",
            documents::router().merge(annotations::router()),
        )
        .nest("/votes", votes::router())
        .layer(middleware::from_fn_with_state(state.clone(), require_secret));

    Router::new()
        .route("/health", get(health::health_check))
        .route("/api/v1/health", get(health::health_check))
        .nest("/api/v1", api)
        .with_state(state)
}

/// Page context from path segments
pub(crate) fn page_ref(document: String, page: u32) -> Result<PageRef> {
    Ok(PageRef::new(DocumentName::parse(document)?, page))
}

/// JSON request body whose rejections use the [`AppError`] response shape
pub struct AppJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for AppJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> std::result::Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(AppJson(value))
    }
}
