//! The WASM plugin runtime: loads, pools, and invokes compliance-check
//! plugins inside a wasmtime sandbox, converting guest traps and malformed
//! responses into structured [`reglet_types::PluginError`]s rather than
//! letting them propagate as Rust panics.

mod abi;
mod config;
mod engine;
mod host_state;
mod instance_pool;
mod metadata;
mod module;

pub use config::{
    PluginConfig, DEFAULT_FUEL, DEFAULT_MEMORY_PAGES, DEFAULT_TABLE_ELEMENTS, DEFAULT_TIMEOUT_SECS,
    MAX_FUEL_HARD, MAX_MEMORY_HARD, MAX_TABLE_ELEMENTS_HARD,
};
pub use engine::PluginRuntime;
pub use metadata::Metadata;
pub use module::validate_module_binary;
