//! TITAN Mint - Tag verification and minting core
//!
//! The pipeline a scan goes through once the request layer has normalized it:
//!
//! ```text
//! ScanRequest ─→ oracle.verify ─→ InstanceBinder::bind
//!                                    ├─ known tag:   replay::advance ─→ audit::append ─→ commit
//!                                    └─ first sight: TemplateResolver ─→ serial::reserve
//!                                                    ─→ insert instance ─→ audit::append ─→ commit
//! ```
//!
//! The oracle call happens before any transaction is opened, so no row lock
//! is ever held across network I/O. Every mutating path either commits in
//! full (instance change plus its audit record) or rolls back.

pub mod audit;
pub mod binder;
pub mod ownership;
pub mod replay;
pub mod resolver;
pub mod scan;
pub mod serial;

pub use binder::InstanceBinder;
pub use ownership::{claim, mark_shipped};
pub use resolver::{ResolverStrategy, TemplateResolver};
pub use scan::ScanService;

use titan_core::TitanResult;
use titan_storage::CardTx;

/// Commit on success, roll back on failure.
///
/// The operation's error wins over a failed rollback, which is only logged.
pub(crate) async fn finish<T>(tx: Box<dyn CardTx>, result: TitanResult<T>) -> TitanResult<T> {
    match result {
        Ok(value) => {
            tx.commit().await?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = tx.rollback().await {
                tracing::warn!(error = %rollback_err, "rollback failed");
            }
            Err(err)
        }
    }
}
