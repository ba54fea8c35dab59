use {
    crate::domain::reward,
    axum::http::StatusCode,
    serde::Serialize,
};

/// Error response body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Error {
    success: bool,
    message: String,
    error_kind: &'static str,
    /// Set when a transaction was submitted, its outcome may still be
    /// visible on chain.
    #[serde(skip_serializing_if = "Option::is_none")]
    transaction_hash: Option<String>,
    /// Verbatim revert reason of a failed gas estimate.
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
    timestamp: String,
}

pub type Failure = (StatusCode, axum::Json<Error>);

impl From<reward::Error> for Failure {
    fn from(err: reward::Error) -> Self {
        let kind = err.kind();
        let status = match kind {
            reward::Kind::InvalidInput => StatusCode::BAD_REQUEST,
            reward::Kind::NetworkUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            reward::Kind::ConfirmationTimeout => StatusCode::GATEWAY_TIMEOUT,
            reward::Kind::ConfigurationError
            | reward::Kind::InsufficientFunds
            | reward::Kind::UnauthorizedSigner
            | reward::Kind::EstimationFailed
            | reward::Kind::TransactionReverted => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let reason = match &err {
            reward::Error::EstimationFailed { reason } => Some(reason.clone()),
            _ => None,
        };
        (
            status,
            axum::Json(Error {
                success: false,
                message: err.to_string(),
                error_kind: kind.into(),
                transaction_hash: err.tx().map(|tx| tx.to_string()),
                reason,
                timestamp: super::timestamp(),
            }),
        )
    }
}

/// The request body is not a JSON claim at all.
pub fn malformed(err: &serde_json::Error) -> Failure {
    (
        StatusCode::BAD_REQUEST,
        axum::Json(Error {
            success: false,
            message: format!("invalid request body: {err}"),
            error_kind: reward::Kind::InvalidInput.into(),
            transaction_hash: None,
            reason: None,
            timestamp: super::timestamp(),
        }),
    )
}
