use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use queue_core::QueueError;
use serde_json::json;

/// A controller failure on its way to the client.
///
/// Every kind maps to 500 with the error text in `detail`; the text tells a
/// conflict from a missing job or a store outage.
#[derive(Debug)]
pub struct ApiError(pub QueueError);

impl From<QueueError> for ApiError {
    fn from(e: QueueError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self.0 {
            QueueError::StoreUnavailable(_) => tracing::error!("{}", self.0),
            _ => tracing::warn!("{}", self.0),
        }

        let body = Json(json!({ "detail": self.0.to_string() }));
        (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use serde_json::Value;

    async fn render(err: QueueError) -> (StatusCode, Value) {
        let response = ApiError(err).into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn store_outage_is_500_with_prefixed_detail() {
        let (status, body) =
            render(QueueError::StoreUnavailable("connection refused".into())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

        let detail = body["detail"].as_str().unwrap();
        assert!(detail.starts_with("Store unavailable:"), "{detail}");
        assert!(detail.contains("connection refused"));
    }

    #[tokio::test]
    async fn detail_tells_kinds_apart() {
        let (status, body) = render(QueueError::InvalidId("empty".into())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["detail"].as_str().unwrap().starts_with("Invalid job id:"));
    }
}
