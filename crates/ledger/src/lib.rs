//! SQLite persistence for FleetWatch.
//!
//! One [`FleetLedger`] owns the connection; the position log, event log and
//! load repository are thin views over it implementing the store contracts
//! from `fleetwatch-dispatch`.
//!
//! # Example
//!
//! ```no_run
//! use fleetwatch_ledger::FleetLedger;
//!
//! let ledger = FleetLedger::open("data/fleetwatch.db")?;
//! let positions = ledger.positions();
//! let events = ledger.events();
//! # Ok::<(), fleetwatch_ledger::LedgerError>(())
//! ```

pub mod error;
pub mod event_log;
pub mod load_repository;
pub mod position_log;
pub mod store;

pub use error::{LedgerError, Result};
pub use event_log::SqliteEventLog;
pub use load_repository::SqliteLoadRepository;
pub use position_log::SqlitePositionLog;
pub use store::FleetLedger;
