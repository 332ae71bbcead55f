//! TITAN Core - Entity Types
//!
//! Pure data structures shared by every other crate in the workspace:
//! typed identifiers, status enums, the three persisted entities, the
//! proof material a scanning client presents, and the error taxonomy.
//! This crate performs no I/O.

pub mod entities;
pub mod enums;
pub mod error;
pub mod identity;
pub mod proof;
pub mod scan;

pub use entities::{CardInstance, CardTemplate, ClientMeta, ScanEvent};
pub use enums::{CardStatus, CardVersion, EnumParseError, OracleProvider, ScanState};
pub use error::{
    ConfigError, MintError, OracleError, StorageError, TitanError, TitanResult, ValidationError,
};
pub use identity::{
    AthleteId, CardId, EntityIdType, PrincipalId, ScanEventId, TemplateId, Timestamp,
};
pub use proof::{OracleVerdict, ProofMaterial};
pub use scan::{BindEvidence, BindRequest, ScanOutcome, ScanRequest, VerifiedScan};
