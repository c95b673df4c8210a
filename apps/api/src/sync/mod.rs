// Sync Engine: incremental, idempotent ingestion from the provider into the store.
// When a sync runs is decided by the injected `SyncDispatcher`.

pub mod dispatcher;
pub mod engine;
pub mod handlers;

pub use dispatcher::{BackgroundDispatcher, DispatchOutcome, InlineDispatcher, SyncDispatcher};
pub use engine::{SyncEngine, SyncError, SyncReport};
