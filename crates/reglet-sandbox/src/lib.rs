//! Capability-checked host-function registry exposed to sandboxed plugins,
//! including the SSRF guard on outbound network calls.

pub mod dispatcher;
pub mod ssrf;

pub use dispatcher::HostFunctionDispatcher;
pub use ssrf::is_blocked_address;
