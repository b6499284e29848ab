//! Shared wire, model, and error-report types for the rowfan dispatch engine.
//!
//! This crate is pure data: no I/O, no runtime. Both the engine and any
//! remote worker binary depend on it, so payloads serialized on one side
//! always decode on the other.

pub mod partition;
pub mod payload;
pub mod report;
pub mod table;
pub mod task;

pub use partition::{ObjectKey, PartitionPlan, PartitionRange};
pub use payload::{DispatchPayload, InboundEvent, Kwargs, PartitionJob, MAX_PAYLOAD_BYTES};
pub use report::{ErrorReport, WorkerOutcome};
pub use table::RowTable;
pub use task::TaskRef;
