//! Error types for TITAN operations

use crate::{CardId, CardStatus, OracleProvider, TemplateId};
use thiserror::Error;

/// Storage layer errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// A uniqueness constraint rejected a write. `constraint` names the
    /// violated key (`tag_uid`, `tag_external_id`, `template_serial`, `sku_code`).
    #[error("Unique constraint {constraint} violated")]
    UniqueViolation { constraint: String },

    #[error("Transaction failed: {reason}")]
    TransactionFailed { reason: String },

    #[error("Storage lock poisoned")]
    LockPoisoned,

    /// No connection could be obtained in time, or the pool is closed.
    #[error("Storage unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("Storage backend error: {reason}")]
    Backend { reason: String },
}

impl StorageError {
    pub fn is_unique_violation_on(&self, key: &str) -> bool {
        matches!(self, StorageError::UniqueViolation { constraint } if constraint == key)
    }
}

/// Authenticity oracle errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum OracleError {
    /// Transport failure, timeout, non-success status or malformed body.
    #[error("Oracle {provider} unreachable: {reason}")]
    Unreachable {
        provider: OracleProvider,
        reason: String,
    },

    /// The oracle answered and did not vouch for the tag.
    #[error("Oracle {provider} rejected tag: {reason}")]
    Rejected {
        provider: OracleProvider,
        reason: String,
    },

    #[error("Oracle {provider} is not configured")]
    NotConfigured { provider: OracleProvider },
}

impl OracleError {
    pub fn provider(&self) -> OracleProvider {
        match self {
            OracleError::Unreachable { provider, .. }
            | OracleError::Rejected { provider, .. }
            | OracleError::NotConfigured { provider } => *provider,
        }
    }
}

/// Validation errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required field missing: {field}")]
    RequiredFieldMissing { field: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Conflicting fields {fields:?}: supply exactly one")]
    ConflictingFields { fields: Vec<String> },
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required setting: {name}")]
    MissingRequired { name: String },

    #[error("Invalid value for {name}: {value} ({reason})")]
    InvalidValue {
        name: String,
        value: String,
        reason: String,
    },
}

/// Errors of the verification and minting pipeline.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MintError {
    #[error("Replay detected for tag {tag_uid}: counter {observed} <= last seen {last}")]
    Replay {
        tag_uid: String,
        observed: i64,
        last: i64,
    },

    #[error("No template matches hint {hint:?}")]
    UnknownTemplate { hint: Option<String> },

    #[error("Template hint {hint} matches {matches} templates")]
    AmbiguousTemplate { hint: String, matches: usize },

    #[error("Edition cap {cap} reached for template {template_id}")]
    EditionCapReached { template_id: TemplateId, cap: i64 },

    #[error("Card not found: {card_id}")]
    CardNotFound { card_id: CardId },

    /// The tag is already bound to a card; a bind must not mint a second one.
    #[error("Tag {tag_uid} is already bound to card {card_id}")]
    TagAlreadyBound { tag_uid: String, card_id: CardId },

    #[error("Card {card_id} already claimed")]
    AlreadyClaimed { card_id: CardId },

    #[error("Card {card_id} cannot move from {from} to {to}")]
    InvalidTransition {
        card_id: CardId,
        from: CardStatus,
        to: CardStatus,
    },
}

/// Master error type for all TITAN errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TitanError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Oracle error: {0}")]
    Oracle(#[from] OracleError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Mint error: {0}")]
    Mint(#[from] MintError),
}

impl TitanError {
    /// Whether retrying the whole request may succeed.
    ///
    /// Only upstream outages and transient storage failures qualify; replay,
    /// authenticity, cap, not-found and conflict outcomes are final.
    pub fn is_retryable(&self) -> bool {
        match self {
            TitanError::Oracle(OracleError::Unreachable { .. }) => true,
            TitanError::Storage(StorageError::TransactionFailed { .. })
            | TitanError::Storage(StorageError::Unavailable { .. })
            | TitanError::Storage(StorageError::Backend { .. }) => true,
            _ => false,
        }
    }
}

/// Result type alias for TITAN operations.
pub type TitanResult<T> = Result<T, TitanError>;
