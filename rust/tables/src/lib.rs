//! # tonk-tables: Concurrent Tonk Tables
//!
//! Runs many Tonk tables at once. Each table is owned by a single tokio task
//! that applies commands from a bounded queue one at a time, so actions for
//! the same table never race. After every change the task broadcasts a
//! versioned snapshot through a [`transport::Transport`], rendered per viewer
//! so nobody sees another player's hand, and every finished round is handed
//! to a [`ledger::SettlementSink`].
//!
//! ## Modules
//!
//! - [`registry`] - Table directory: create, join, leave, start, reset, archive
//! - [`table`] - The per-table task and its handle
//! - [`events`] - Table events and the in-process `EventBus`
//! - [`transport`] - The outbound delivery trait
//! - [`ledger`] - Settlement sinks (in-memory store, JSONL file)
//! - [`settings`] - Table settings and validation
//! - [`errors`] - Error codes, severities and rejection payloads
//! - [`logging`] - `tracing` setup and a capturing test subscriber

pub mod errors;
pub mod events;
pub mod ledger;
pub mod logging;
pub mod registry;
pub mod settings;
pub mod table;
pub mod transport;

pub use errors::{ErrorResponse, TableError};
pub use events::{EventBus, EventSubscription, TableEvent};
pub use registry::TableRegistry;
pub use settings::TableSettings;
pub use table::TableHandle;
