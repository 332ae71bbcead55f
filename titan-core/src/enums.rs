//! Closed vocabularies for cards, scans and oracle providers.
//!
//! Every enum has a stable database representation (`as_db_str` /
//! `from_db_str`) shared by the SQL schema and the HTTP layer.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error when parsing an invalid enum string.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Invalid {kind}: {value}")]
pub struct EnumParseError {
    pub kind: &'static str,
    pub value: String,
}

impl EnumParseError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

macro_rules! db_str_impls {
    ($ty:ty) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.as_db_str())
            }
        }

        impl FromStr for $ty {
            type Err = EnumParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::from_db_str(s)
            }
        }
    };
}

// ============================================================================
// CARD VERSION
// ============================================================================

/// Print run a template belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardVersion {
    Regular,
    Diamond,
}

impl CardVersion {
    pub fn as_db_str(&self) -> &'static str {
        match self {
            CardVersion::Regular => "regular",
            CardVersion::Diamond => "diamond",
        }
    }

    pub fn from_db_str(s: &str) -> Result<Self, EnumParseError> {
        match s.trim().to_lowercase().as_str() {
            "regular" => Ok(CardVersion::Regular),
            "diamond" => Ok(CardVersion::Diamond),
            _ => Err(EnumParseError::new("card version", s)),
        }
    }
}

db_str_impls!(CardVersion);

// ============================================================================
// CARD STATUS (ownership state machine)
// ============================================================================

/// Lifecycle status of a physical card.
///
/// ```text
/// Unassigned ── claim ──→ Claimed ── ship ──→ Shipped
/// ```
///
/// Scanning never moves a card between states; `Shipped` is reached only
/// through fulfillment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardStatus {
    Unassigned,
    Claimed,
    Shipped,
}

impl CardStatus {
    pub fn as_db_str(&self) -> &'static str {
        match self {
            CardStatus::Unassigned => "unassigned",
            CardStatus::Claimed => "claimed",
            CardStatus::Shipped => "shipped",
        }
    }

    pub fn from_db_str(s: &str) -> Result<Self, EnumParseError> {
        match s.trim().to_lowercase().as_str() {
            "unassigned" => Ok(CardStatus::Unassigned),
            "claimed" => Ok(CardStatus::Claimed),
            "shipped" => Ok(CardStatus::Shipped),
            _ => Err(EnumParseError::new("card status", s)),
        }
    }

    /// Whether the state machine permits moving from `self` to `next`.
    pub fn can_transition_to(&self, next: CardStatus) -> bool {
        matches!(
            (self, next),
            (CardStatus::Unassigned, CardStatus::Claimed) | (CardStatus::Claimed, CardStatus::Shipped)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, CardStatus::Shipped)
    }
}

db_str_impls!(CardStatus);

// ============================================================================
// SCAN STATE
// ============================================================================

/// Ownership state reported back to a scanner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanState {
    Unclaimed,
    OwnedByOther,
}

impl ScanState {
    pub fn as_db_str(&self) -> &'static str {
        match self {
            ScanState::Unclaimed => "unclaimed",
            ScanState::OwnedByOther => "owned_by_other",
        }
    }

    pub fn from_db_str(s: &str) -> Result<Self, EnumParseError> {
        match s.trim().to_lowercase().as_str() {
            "unclaimed" => Ok(ScanState::Unclaimed),
            "owned_by_other" => Ok(ScanState::OwnedByOther),
            _ => Err(EnumParseError::new("scan state", s)),
        }
    }
}

db_str_impls!(ScanState);

// ============================================================================
// ORACLE PROVIDER
// ============================================================================

/// Upstream tag verification service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OracleProvider {
    /// ETRNL tamper-token / CMAC verification.
    Etrnl,
    /// Titan NFC sealed payload verification.
    TitanNfc,
}

impl OracleProvider {
    pub fn as_db_str(&self) -> &'static str {
        match self {
            OracleProvider::Etrnl => "etrnl",
            OracleProvider::TitanNfc => "titan_nfc",
        }
    }

    pub fn from_db_str(s: &str) -> Result<Self, EnumParseError> {
        match s.trim().to_lowercase().as_str() {
            "etrnl" => Ok(OracleProvider::Etrnl),
            "titan_nfc" | "titan-nfc" | "titannfc" => Ok(OracleProvider::TitanNfc),
            _ => Err(EnumParseError::new("oracle provider", s)),
        }
    }

    pub fn all() -> [OracleProvider; 2] {
        [OracleProvider::Etrnl, OracleProvider::TitanNfc]
    }
}

db_str_impls!(OracleProvider);
