//! Error Types for TITAN API
//!
//! This module defines error handling for the API layer:
//! - ErrorCode enum, the machine-readable `reason` of a failed request
//! - ApiError struct for structured error responses
//! - IntoResponse implementation for Axum HTTP responses
//! - The mapping from the core error taxonomy onto wire reasons
//!
//! Every failure is serialized as `{"ok": false, "reason": ..., "message": ...}`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use titan_core::{
    ConfigError, MintError, OracleError, StorageError, TitanError, ValidationError,
};
use titan_storage::constraints;

// ============================================================================
// ERROR CODE ENUM
// ============================================================================

/// Failure reasons reported to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    // ========================================================================
    // Request Errors (400, 401, 403)
    // ========================================================================
    /// Proof material or tag id missing, or both proof modes supplied
    MissingParams,

    /// A value could not be parsed (e.g. a malformed card id)
    InvalidInput,

    /// The oracle answered and did not vouch for the tag
    NotAuthentic,

    /// No usable principal on a request that needs one
    Unauthorized,

    /// Admin token missing or wrong
    Forbidden,

    // ========================================================================
    // Not Found Errors (404)
    // ========================================================================
    /// First sighting with a hint matching no single template
    UnknownTemplate,

    /// Requested card or template does not exist
    NotFound,

    // ========================================================================
    // Conflict Errors (409)
    // ========================================================================
    /// Counter at or below the last accepted value
    Replay,

    /// Template cannot mint more instances
    EditionCapReached,

    /// Card already has an owner
    AlreadyClaimed,

    /// Lifecycle transition not allowed from the current status
    InvalidTransition,

    /// Tag uid or tag id already belongs to another card
    TagAlreadyBound,

    /// A uniqueness constraint rejected the write
    Conflict,

    // ========================================================================
    // Upstream and Server Errors (500, 502, 503)
    // ========================================================================
    /// Oracle unreachable, misbehaving or not configured (retryable)
    OracleUnreachable,

    /// Database operation failed
    DatabaseError,

    /// Database connection pool closed or exhausted
    ServiceUnavailable,

    /// Internal server error
    InternalError,
}

impl ErrorCode {
    /// Get the HTTP status code for this error code.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ErrorCode::MissingParams | ErrorCode::InvalidInput | ErrorCode::NotAuthentic => {
                StatusCode::BAD_REQUEST
            }
            ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorCode::Forbidden => StatusCode::FORBIDDEN,

            ErrorCode::UnknownTemplate | ErrorCode::NotFound => StatusCode::NOT_FOUND,

            ErrorCode::Replay
            | ErrorCode::EditionCapReached
            | ErrorCode::AlreadyClaimed
            | ErrorCode::InvalidTransition
            | ErrorCode::TagAlreadyBound
            | ErrorCode::Conflict => StatusCode::CONFLICT,

            ErrorCode::OracleUnreachable => StatusCode::BAD_GATEWAY,
            ErrorCode::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ErrorCode::DatabaseError | ErrorCode::InternalError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Wire name, as it appears in the `reason` field.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::MissingParams => "missing_params",
            ErrorCode::InvalidInput => "invalid_input",
            ErrorCode::NotAuthentic => "not_authentic",
            ErrorCode::Unauthorized => "unauthorized",
            ErrorCode::Forbidden => "forbidden",
            ErrorCode::UnknownTemplate => "unknown_template",
            ErrorCode::NotFound => "not_found",
            ErrorCode::Replay => "replay",
            ErrorCode::EditionCapReached => "edition_cap_reached",
            ErrorCode::AlreadyClaimed => "already_claimed",
            ErrorCode::InvalidTransition => "invalid_transition",
            ErrorCode::TagAlreadyBound => "tag_already_bound",
            ErrorCode::Conflict => "conflict",
            ErrorCode::OracleUnreachable => "oracle_unreachable",
            ErrorCode::DatabaseError => "database_error",
            ErrorCode::ServiceUnavailable => "service_unavailable",
            ErrorCode::InternalError => "internal_error",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// API ERROR STRUCT
// ============================================================================

/// Structured error response for API operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiError {
    /// Failure reason
    #[serde(rename = "reason")]
    pub code: ErrorCode,

    /// Human-readable error message
    pub message: String,

    /// Optional additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn status_code(&self) -> StatusCode {
        self.code.status_code()
    }

    // ========================================================================
    // Convenience constructors
    // ========================================================================

    pub fn missing_params(need: &str) -> Self {
        Self::new(ErrorCode::MissingParams, "Required scan parameters are missing")
            .with_details(serde_json::json!({ "need": need }))
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unauthorized, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Forbidden, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    pub fn database_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::DatabaseError, message)
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ServiceUnavailable, message)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

// ============================================================================
// AXUM INTEGRATION
// ============================================================================

#[derive(Serialize)]
struct ErrorBody<'a> {
    ok: bool,
    #[serde(flatten)]
    error: &'a ApiError,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(ErrorBody {
            ok: false,
            error: &self,
        });
        (status, body).into_response()
    }
}

// ============================================================================
// CONVERSIONS FROM CORE ERRORS
// ============================================================================

impl From<TitanError> for ApiError {
    fn from(err: TitanError) -> Self {
        match err {
            TitanError::Oracle(e) => e.into(),
            TitanError::Mint(e) => e.into(),
            TitanError::Storage(e) => e.into(),
            TitanError::Validation(e) => e.into(),
            TitanError::Config(e) => e.into(),
        }
    }
}

impl From<OracleError> for ApiError {
    fn from(err: OracleError) -> Self {
        let provider = err.provider();
        match err {
            OracleError::Rejected { .. } => {
                ApiError::new(ErrorCode::NotAuthentic, "Tag could not be authenticated")
            }
            OracleError::Unreachable { .. } | OracleError::NotConfigured { .. } => ApiError::new(
                ErrorCode::OracleUnreachable,
                "Verification service unavailable, retry later",
            )
            .with_details(serde_json::json!({ "provider": provider, "retryable": true })),
        }
    }
}

impl From<MintError> for ApiError {
    fn from(err: MintError) -> Self {
        let message = err.to_string();
        if let MintError::TagAlreadyBound { card_id, .. } = err {
            return ApiError::new(ErrorCode::TagAlreadyBound, message)
                .with_details(serde_json::json!({ "card_id": card_id }));
        }
        let code = match err {
            MintError::Replay { .. } => ErrorCode::Replay,
            MintError::UnknownTemplate { .. } | MintError::AmbiguousTemplate { .. } => {
                ErrorCode::UnknownTemplate
            }
            MintError::EditionCapReached { .. } => ErrorCode::EditionCapReached,
            MintError::CardNotFound { .. } => ErrorCode::NotFound,
            MintError::AlreadyClaimed { .. } => ErrorCode::AlreadyClaimed,
            MintError::InvalidTransition { .. } => ErrorCode::InvalidTransition,
            MintError::TagAlreadyBound { .. } => ErrorCode::TagAlreadyBound,
        };
        ApiError::new(code, message)
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound { .. } => ApiError::not_found(err.to_string()),
            StorageError::UniqueViolation { ref constraint }
                if constraint == constraints::TAG_UID || constraint == constraints::TAG_EXTERNAL_ID =>
            {
                tracing::warn!(constraint = %constraint, "Tag already bound to another card");
                ApiError::new(
                    ErrorCode::TagAlreadyBound,
                    "Tag is already bound to another card",
                )
                .with_details(serde_json::json!({ "constraint": constraint }))
            }
            StorageError::UniqueViolation { ref constraint } => {
                tracing::warn!(constraint = %constraint, "Unique violation surfaced to client");
                ApiError::new(ErrorCode::Conflict, err.to_string())
            }
            StorageError::Unavailable { .. } => {
                tracing::error!(error = %err, "Storage unavailable");
                ApiError::service_unavailable("Database connection unavailable, retry later")
            }
            other => {
                tracing::error!(error = %other, "Storage error");
                ApiError::database_error("Database operation failed")
            }
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        let message = err.to_string();
        match err {
            ValidationError::RequiredFieldMissing { field } => {
                ApiError::new(ErrorCode::MissingParams, message)
                    .with_details(serde_json::json!({ "need": field }))
            }
            ValidationError::ConflictingFields { fields } => {
                ApiError::new(ErrorCode::MissingParams, message)
                    .with_details(serde_json::json!({ "need": fields.join("|") }))
            }
            ValidationError::InvalidValue { .. } => ApiError::invalid_input(message),
        }
    }
}

impl From<ConfigError> for ApiError {
    fn from(err: ConfigError) -> Self {
        tracing::error!(error = %err, "Configuration error");
        ApiError::internal_error(err.to_string())
    }
}

// ============================================================================
// RESULT TYPE ALIAS
// ============================================================================

/// Result type alias for API operations.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use titan_core::{CardId, CardStatus, EntityIdType, OracleProvider, TemplateId};

    fn code_of(err: impl Into<TitanError>) -> ErrorCode {
        ApiError::from(err.into()).code
    }

    #[test]
    fn test_core_errors_map_to_wire_reasons() {
        let card_id = CardId::now_v7();
        let cases: Vec<(TitanError, ErrorCode, StatusCode)> = vec![
            (
                OracleError::Unreachable {
                    provider: OracleProvider::Etrnl,
                    reason: "timeout".into(),
                }
                .into(),
                ErrorCode::OracleUnreachable,
                StatusCode::BAD_GATEWAY,
            ),
            (
                OracleError::NotConfigured {
                    provider: OracleProvider::TitanNfc,
                }
                .into(),
                ErrorCode::OracleUnreachable,
                StatusCode::BAD_GATEWAY,
            ),
            (
                OracleError::Rejected {
                    provider: OracleProvider::Etrnl,
                    reason: "bad cmac".into(),
                }
                .into(),
                ErrorCode::NotAuthentic,
                StatusCode::BAD_REQUEST,
            ),
            (
                MintError::Replay {
                    tag_uid: "04AA".into(),
                    observed: 1,
                    last: 1,
                }
                .into(),
                ErrorCode::Replay,
                StatusCode::CONFLICT,
            ),
            (
                MintError::AmbiguousTemplate {
                    hint: "SL".into(),
                    matches: 2,
                }
                .into(),
                ErrorCode::UnknownTemplate,
                StatusCode::NOT_FOUND,
            ),
            (
                MintError::EditionCapReached {
                    template_id: TemplateId::now_v7(),
                    cap: 2,
                }
                .into(),
                ErrorCode::EditionCapReached,
                StatusCode::CONFLICT,
            ),
            (
                MintError::CardNotFound { card_id }.into(),
                ErrorCode::NotFound,
                StatusCode::NOT_FOUND,
            ),
            (
                MintError::AlreadyClaimed { card_id }.into(),
                ErrorCode::AlreadyClaimed,
                StatusCode::CONFLICT,
            ),
            (
                MintError::InvalidTransition {
                    card_id,
                    from: CardStatus::Unassigned,
                    to: CardStatus::Shipped,
                }
                .into(),
                ErrorCode::InvalidTransition,
                StatusCode::CONFLICT,
            ),
            (
                StorageError::Backend {
                    reason: "connection reset".into(),
                }
                .into(),
                ErrorCode::DatabaseError,
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                ValidationError::ConflictingFields {
                    fields: vec!["tt".into(), "cmac".into()],
                }
                .into(),
                ErrorCode::MissingParams,
                StatusCode::BAD_REQUEST,
            ),
            (
                StorageError::Unavailable {
                    reason: "connection pool: timed out".into(),
                }
                .into(),
                ErrorCode::ServiceUnavailable,
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                MintError::TagAlreadyBound {
                    tag_uid: "04AA".into(),
                    card_id,
                }
                .into(),
                ErrorCode::TagAlreadyBound,
                StatusCode::CONFLICT,
            ),
        ];

        for (err, code, status) in cases {
            let api = ApiError::from(err);
            assert_eq!(api.code, code);
            assert_eq!(api.status_code(), status);
        }
    }

    #[test]
    fn test_backend_details_are_not_leaked() {
        let api = ApiError::from(TitanError::from(StorageError::Backend {
            reason: "password authentication failed for user titan".into(),
        }));
        assert!(!api.message.contains("password"));
    }

    #[test]
    fn test_unique_violation_is_conflict() {
        let code = code_of(StorageError::UniqueViolation {
            constraint: constraints::SKU_CODE.into(),
        });
        assert_eq!(code, ErrorCode::Conflict);
    }

    #[test]
    fn test_tag_collisions_are_tag_already_bound() {
        for constraint in [constraints::TAG_UID, constraints::TAG_EXTERNAL_ID] {
            let api = ApiError::from(TitanError::from(StorageError::UniqueViolation {
                constraint: constraint.into(),
            }));
            assert_eq!(api.code, ErrorCode::TagAlreadyBound);
            assert_eq!(api.status_code(), StatusCode::CONFLICT);
        }
    }

    #[test]
    fn test_validation_errors_name_the_fields() {
        let api = ApiError::from(ValidationError::RequiredFieldMissing {
            field: "templateId".into(),
        });
        assert_eq!(api.code, ErrorCode::MissingParams);
        assert_eq!(api.details, Some(serde_json::json!({ "need": "templateId" })));

        let api = ApiError::from(ValidationError::ConflictingFields {
            fields: vec!["tt".into(), "cmac".into()],
        });
        assert_eq!(api.details, Some(serde_json::json!({ "need": "tt|cmac" })));
    }

    #[test]
    fn test_error_body_shape() -> Result<(), serde_json::Error> {
        let err = ApiError::missing_params("tagId enc eCode and tt OR cmac");
        let body = serde_json::to_value(ErrorBody {
            ok: false,
            error: &err,
        })?;
        assert_eq!(body["ok"], false);
        assert_eq!(body["reason"], "missing_params");
        assert_eq!(body["details"]["need"], "tagId enc eCode and tt OR cmac");
        Ok(())
    }

    #[test]
    fn test_error_code_serializes_as_wire_name() -> Result<(), serde_json::Error> {
        for code in [
            ErrorCode::OracleUnreachable,
            ErrorCode::EditionCapReached,
            ErrorCode::AlreadyClaimed,
        ] {
            assert_eq!(serde_json::to_value(code)?, code.as_str());
        }
        Ok(())
    }
}
