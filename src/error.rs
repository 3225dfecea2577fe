use axum::http::StatusCode;
use time::Date;
use uuid::Uuid;

/// Errors surfaced by the recommendation engine.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("{0}")]
    Validation(String),

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: Uuid },

    #[error("failed to create meal slot {meal_of_plan_id} on {date}")]
    SlotFill {
        meal_of_plan_id: Uuid,
        date: Date,
        #[source]
        source: anyhow::Error,
    },

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

impl EngineError {
    pub fn status(&self) -> StatusCode {
        match self {
            EngineError::Validation(_) => StatusCode::BAD_REQUEST,
            EngineError::NotFound { .. } => StatusCode::NOT_FOUND,
            EngineError::SlotFill { .. } | EngineError::Store(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<EngineError> for (StatusCode, String) {
    fn from(e: EngineError) -> Self {
        let status = e.status();
        if status.is_server_error() {
            let cause = std::error::Error::source(&e).map(ToString::to_string);
            tracing::error!(error = %e, cause = ?cause, "engine failure");
        }
        (status, e.to_string())
    }
}
