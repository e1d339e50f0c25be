use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum QuizError {
    #[error("Topic {0} not found")]
    TopicNotFound(i64),

    #[error("Topic '{0}' not found")]
    InvalidTopicId(String),

    #[error("No quiz is available for topic {0}")]
    EmptyPool(i64),

    #[error("Storage error: {0:#}")]
    Storage(#[from] anyhow::Error),
}

impl QuizError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            QuizError::TopicNotFound(_)
            | QuizError::InvalidTopicId(_)
            | QuizError::EmptyPool(_) => StatusCode::NOT_FOUND,
            QuizError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-readable code so clients can tell the two 404s apart.
    pub fn code(&self) -> &'static str {
        match self {
            QuizError::TopicNotFound(_) | QuizError::InvalidTopicId(_) => "topic_not_found",
            QuizError::EmptyPool(_) => "no_quiz_available",
            QuizError::Storage(_) => "storage_error",
        }
    }
}

impl IntoResponse for QuizError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let message = match &self {
            QuizError::Storage(err) => {
                tracing::error!(error = ?err, "Quiz storage failure");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        (
            status,
            Json(json!({
                "message": message,
                "status": status.as_u16(),
                "code": self.code(),
            })),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn body_json(error: QuizError) -> (StatusCode, serde_json::Value) {
        let response = error.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn not_found_variants_are_distinguishable() {
        let (status, body) = body_json(QuizError::TopicNotFound(4)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "topic_not_found");
        assert_eq!(body["message"], "Topic 4 not found");

        let (status, body) = body_json(QuizError::EmptyPool(4)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "no_quiz_available");
        assert_eq!(body["status"], 404);
    }

    #[tokio::test]
    async fn storage_errors_hide_details() {
        let (status, body) = body_json(anyhow::anyhow!("connection refused").into()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "Internal server error");
    }
}
