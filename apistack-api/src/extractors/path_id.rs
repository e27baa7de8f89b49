//! Path extractor for actor ids.
//!
//! `ActorIdPath` accepts only a plain decimal integer in the `:id` segment.
//! Anything else is rejected with a 400 in the API error format before the
//! handler runs.

use apistack_core::{ActorId, ParseActorIdError};
use axum::{
    async_trait,
    extract::{FromRequestParts, Path},
    http::request::Parts,
    response::{IntoResponse, Response},
};

use crate::error::{ApiError, ErrorCode};

/// Extractor for the actor id path parameter.
///
/// # Example
///
/// ```rust,ignore
/// async fn get_actor(ActorIdPath(id): ActorIdPath) -> ApiResult<Json<Actor>> {
///     // id is ActorId, already validated
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActorIdPath(pub ActorId);

/// Error returned when the id segment cannot be extracted.
#[derive(Debug)]
pub struct PathIdError {
    pub path_param: String,
    pub message: String,
}

impl std::fmt::Display for PathIdError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Invalid actor ID '{}': {}", self.path_param, self.message)
    }
}

impl std::error::Error for PathIdError {}

impl From<PathIdError> for ApiError {
    fn from(err: PathIdError) -> Self {
        ApiError::new(ErrorCode::InvalidFormat, err.to_string())
            .with_details(serde_json::json!({ "id": err.path_param }))
    }
}

impl IntoResponse for PathIdError {
    fn into_response(self) -> Response {
        ApiError::from(self).into_response()
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for ActorIdPath
where
    S: Send + Sync,
{
    type Rejection = PathIdError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw): Path<String> = Path::from_request_parts(parts, state)
            .await
            .map_err(|e| PathIdError {
                path_param: parts.uri.path().to_string(),
                message: format!("Failed to extract id from path: {}", e.body_text()),
            })?;

        raw.parse::<ActorId>()
            .map(ActorIdPath)
            .map_err(|e: ParseActorIdError| PathIdError {
                path_param: raw.clone(),
                message: e.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request, http::StatusCode, routing::get, Router};
    use tower::ServiceExt;

    async fn echo(ActorIdPath(id): ActorIdPath) -> String {
        id.to_string()
    }

    async fn status_for(uri: &str) -> Result<StatusCode, Box<dyn std::error::Error>> {
        let app = Router::new().route("/actors/:id", get(echo));
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty())?)
            .await?;
        Ok(response.status())
    }

    #[tokio::test]
    async fn test_numeric_id_is_accepted() -> Result<(), Box<dyn std::error::Error>> {
        assert_eq!(status_for("/actors/42").await?, StatusCode::OK);
        Ok(())
    }

    #[tokio::test]
    async fn test_non_numeric_id_is_bad_request() -> Result<(), Box<dyn std::error::Error>> {
        for uri in ["/actors/abc", "/actors/-1", "/actors/1.5", "/actors/99999999999999999999"] {
            assert_eq!(status_for(uri).await?, StatusCode::BAD_REQUEST, "{}", uri);
        }
        Ok(())
    }

    #[test]
    fn test_rejection_uses_api_error_format() {
        let err = ApiError::from(PathIdError {
            path_param: "abc".to_string(),
            message: "id 'abc' is not numeric".to_string(),
        });
        assert_eq!(err.code, ErrorCode::InvalidFormat);
        assert!(err.message.contains("abc"));
    }
}
