use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};

use crate::app::AppState;
use crate::auth::{Session, SessionError};

/// Resolves the bearer token (if any) and injects a [`Session`] into the request.
///
/// Never rejects: a missing or invalid token becomes `Session::Anonymous` and the
/// handlers answer 401 themselves, after nothing else has run.
pub async fn session_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let authorization = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    let session = match state.sessions.resolve(authorization) {
        Ok(session) => session,
        Err(SessionError::MissingToken) => Session::Anonymous,
        Err(e) => {
            tracing::debug!("Treating request as anonymous: {}", e);
            Session::Anonymous
        }
    };

    request.extensions_mut().insert(session);
    next.run(request).await
}
