//! Per-instance state threaded through the `wasmtime::Store`: WASI context
//! plus the capability-checked host-function dispatcher for this plugin.

use std::sync::Arc;

use reglet_sandbox::HostFunctionDispatcher;
use wasmtime_wasi::preview1::WasiP1Ctx;

pub struct HostState {
    pub wasi: WasiP1Ctx,
    pub dispatcher: Arc<HostFunctionDispatcher>,
    pub plugin_name: String,
}
