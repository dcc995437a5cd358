//! `stockgrid-recon` - purchase-to-stock reconciliation engine.
//!
//! Pure engine crate: receives a table handle and a batch of purchases,
//! resets in-transit order state and upserts one row per purchase code.
//! No CLI or IO dependencies.

pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod model;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::ReconConfig;
pub use engine::{reconcile, reconcile_in};
pub use error::ReconError;
pub use model::{PurchaseRecord, ReconcileSummary};
