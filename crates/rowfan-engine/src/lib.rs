//! Distributed partition dispatch engine.
//!
//! Given a [`RowTable`](rowfan_types::RowTable) and a registered task, the
//! engine serializes the rows to a blob, stages it in shared storage,
//! splits it into contiguous row-aligned byte ranges, and fans one
//! fire-and-forget compute invocation out per partition. With no compute
//! backend configured it falls back to synchronous in-process execution,
//! which is also the deterministic test path.
//!
//! ## Architecture modules
//!
//! - **`registry`**: maps task path strings to registered callables.
//! - **`partitioner`**: plans row-aligned byte ranges over a staged blob.
//! - **`dispatcher`**: the local/remote state machine and
//!   [`distribute_table`](dispatcher::Dispatcher::distribute_table) fan-out.
//! - **`worker`**: per-partition fetch, sub-table rebuild, and task
//!   invocation with optional error containment.
//! - **`router`**: classifies inbound compute events and executes
//!   dispatched sub-tasks.
//! - **`compute`**: the fire-and-forget invoke contract and its Lambda
//!   adapter.

pub mod compute;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod partitioner;
pub mod registry;
pub mod router;
pub mod worker;

pub use compute::{ComputeBackend, InvokeAck, LambdaCompute};
pub use config::DispatchConfig;
pub use dispatcher::{DispatchAck, Dispatcher, DistributeOptions, DistributeReport};
pub use error::{DispatchError, TaskError};
pub use registry::{TaskFn, TaskRegistry};
pub use router::{route_event, Routed};
