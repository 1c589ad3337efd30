//! The execution-result aggregate and status aggregator: everything the
//! scheduler needs to assemble a deterministic result from concurrently
//! completing controls.

mod aggregate;
mod status;

pub use aggregate::ExecutionAggregate;
pub use status::{control_status, observation_status};
