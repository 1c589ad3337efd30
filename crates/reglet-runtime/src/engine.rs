//! The plugin runtime: compiles and caches WASM modules, pools
//! instances per plugin, and dispatches `describe`/`schema`/`check` calls
//! across the allocator-dance ABI.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use reglet_capability::CapabilitySet;
use reglet_sandbox::HostFunctionDispatcher;
use reglet_types::{Evidence, PluginError, PluginErrorType};
use reglet_wire::{unpack, ContextWire, EvidenceEnvelope};
use tokio::sync::Mutex;
use wasmtime::{Config, Engine, Linker, Module, Store};
use wasmtime_wasi::preview1;
use wasmtime_wasi::WasiCtxBuilder;

use crate::abi::{read_guest_bytes, write_guest_bytes};
use crate::config::PluginConfig;
use crate::host_state::HostState;
use crate::instance_pool::{InstancePool, PooledInstance};
use crate::metadata::Metadata;
use crate::module::validate_module_binary;

struct LoadedPlugin {
    module: Module,
    config: PluginConfig,
    capabilities: Arc<CapabilitySet>,
    pool: Arc<InstancePool>,
}

/// Owns the wasmtime engine and every loaded plugin's module cache and
/// instance pool. Constructed once at startup, torn down on shutdown; it is
/// the only process-wide component in this engine.
pub struct PluginRuntime {
    engine: Engine,
    plugins: Mutex<HashMap<String, Arc<LoadedPlugin>>>,
}

impl PluginRuntime {
    pub fn new() -> anyhow::Result<Self> {
        let mut config = Config::new();
        config.async_support(true);
        config.consume_fuel(true);
        config.epoch_interruption(true);
        let engine = Engine::new(&config)?;
        Ok(Self { engine, plugins: Mutex::new(HashMap::new()) })
    }

    /// Compiles `bytes`, installs host imports, and pre-warms an instance
    /// pool of size `pool_size` for `name`.
    pub async fn load(
        &self,
        name: &str,
        bytes: &[u8],
        capabilities: CapabilitySet,
        plugin_config: PluginConfig,
        pool_size: usize,
    ) -> Result<(), PluginError> {
        validate_module_binary(bytes)?;

        let module = Module::new(&self.engine, bytes).map_err(|e| {
            PluginError::new("compile_failed", e.to_string(), PluginErrorType::Internal)
        })?;

        let capabilities = Arc::new(capabilities);
        let engine = self.engine.clone();
        let module_for_pool = module.clone();
        let plugin_name = name.to_string();
        let caps_for_pool = Arc::clone(&capabilities);

        let factory: Arc<
            dyn Fn() -> std::pin::Pin<Box<dyn std::future::Future<Output = anyhow::Result<PooledInstance>> + Send>>
                + Send
                + Sync,
        > = Arc::new(move || {
            let engine = engine.clone();
            let module = module_for_pool.clone();
            let plugin_name = plugin_name.clone();
            let caps = Arc::clone(&caps_for_pool);
            Box::pin(async move { build_instance(&engine, &module, &plugin_name, caps).await })
        });

        let pool = Arc::new(InstancePool::new(pool_size.max(1), factory));

        let loaded = Arc::new(LoadedPlugin { module, config: plugin_config, capabilities, pool });
        self.plugins.lock().await.insert(name.to_string(), loaded);
        Ok(())
    }

    /// Invokes the guest's `describe` export.
    pub async fn describe(&self, name: &str) -> Result<Metadata, PluginError> {
        let bytes = self.call_zero_arg_export(name, "describe").await?;
        serde_json::from_slice(&bytes)
            .map_err(|e| PluginError::new("bad_metadata", e.to_string(), PluginErrorType::Internal))
    }

    /// Invokes the guest's `schema` export, returning its raw JSON schema bytes.
    pub async fn schema(&self, name: &str) -> Result<Vec<u8>, PluginError> {
        self.call_zero_arg_export(name, "schema").await
    }

    /// Invokes the guest's `check` export, returning decoded [`Evidence`].
    /// On guest trap, the instance is discarded rather than returned to the
    /// pool and a `guest_trap` error is returned.
    pub async fn check(
        &self,
        name: &str,
        ctx: &ContextWire,
        config: &serde_json::Value,
    ) -> Result<Evidence, PluginError> {
        let plugin = self.get_plugin(name).await?;
        let mut pooled = plugin.pool.acquire().await.map_err(|e| {
            PluginError::new("instance_unavailable", e.to_string(), PluginErrorType::Internal)
        })?;

        pooled.store.set_fuel(plugin.config.fuel).ok();

        let outcome = invoke_check(&mut pooled, ctx, config).await;

        match outcome {
            Ok(evidence) => {
                plugin.pool.release(pooled).await;
                Ok(evidence)
            }
            Err(err) => {
                plugin.pool.discard().await;
                Err(err)
            }
        }
    }

    async fn call_zero_arg_export(&self, name: &str, export: &str) -> Result<Vec<u8>, PluginError> {
        let plugin = self.get_plugin(name).await?;
        let mut pooled = plugin.pool.acquire().await.map_err(|e| {
            PluginError::new("instance_unavailable", e.to_string(), PluginErrorType::Internal)
        })?;

        let result = call_export_returning_packed(&mut pooled, export).await;
        match result {
            Ok(bytes) => {
                plugin.pool.release(pooled).await;
                Ok(bytes)
            }
            Err(err) => {
                plugin.pool.discard().await;
                Err(err)
            }
        }
    }

    async fn get_plugin(&self, name: &str) -> Result<Arc<LoadedPlugin>, PluginError> {
        self.plugins
            .lock()
            .await
            .get(name)
            .cloned()
            .ok_or_else(|| PluginError::new("plugin_not_loaded", format!("plugin {name:?} not loaded"), PluginErrorType::Config))
    }
}

async fn build_instance(
    engine: &Engine,
    module: &Module,
    plugin_name: &str,
    capabilities: Arc<CapabilitySet>,
) -> anyhow::Result<PooledInstance> {
    let wasi = WasiCtxBuilder::new().build_p1();
    let dispatcher = Arc::new(HostFunctionDispatcher::new((*capabilities).clone()));
    let state = HostState { wasi, dispatcher, plugin_name: plugin_name.to_string() };
    let mut store = Store::new(engine, state);
    store.set_epoch_deadline(1);

    let mut linker: Linker<HostState> = Linker::new(engine);
    preview1::add_to_linker_async(&mut linker, |s: &mut HostState| &mut s.wasi)?;
    register_host_functions(&mut linker)?;

    let instance = linker.instantiate_async(&mut store, module).await?;
    Ok(PooledInstance { store, instance })
}

fn register_host_functions(linker: &mut Linker<HostState>) -> anyhow::Result<()> {
    linker.func_wrap_async(
        "env",
        "http_request",
        |mut caller: wasmtime::Caller<'_, HostState>, (packed,): (u64,)| {
            Box::new(async move {
                handle_host_call(&mut caller, packed, |dispatcher, req| {
                    Box::pin(async move { dispatcher.http_request(req).await })
                })
                .await
            })
        },
    )?;
    linker.func_wrap_async(
        "env",
        "dns_lookup",
        |mut caller: wasmtime::Caller<'_, HostState>, (packed,): (u64,)| {
            Box::new(async move {
                handle_host_call(&mut caller, packed, |dispatcher, req| {
                    Box::pin(async move { dispatcher.dns_lookup(req).await })
                })
                .await
            })
        },
    )?;
    linker.func_wrap_async(
        "env",
        "tcp_connect",
        |mut caller: wasmtime::Caller<'_, HostState>, (packed,): (u64,)| {
            Box::new(async move {
                handle_host_call(&mut caller, packed, |dispatcher, req| {
                    Box::pin(async move { dispatcher.tcp_connect(req).await })
                })
                .await
            })
        },
    )?;
    linker.func_wrap_async(
        "env",
        "smtp_probe",
        |mut caller: wasmtime::Caller<'_, HostState>, (packed,): (u64,)| {
            Box::new(async move {
                handle_host_call(&mut caller, packed, |dispatcher, req| {
                    Box::pin(async move { dispatcher.smtp_probe(req).await })
                })
                .await
            })
        },
    )?;
    linker.func_wrap_async(
        "env",
        "exec_run",
        |mut caller: wasmtime::Caller<'_, HostState>, (packed,): (u64,)| {
            Box::new(async move {
                handle_host_call(&mut caller, packed, |dispatcher, req| {
                    Box::pin(async move { dispatcher.exec_run(req).await })
                })
                .await
            })
        },
    )?;
    Ok(())
}

/// Shared plumbing for every guest-callable host function: decode the
/// request from guest memory, run `handler`, re-encode the response through
/// the guest's own `allocate` export.
async fn handle_host_call<Req, Resp, F>(
    caller: &mut wasmtime::Caller<'_, HostState>,
    packed_req: u64,
    handler: F,
) -> anyhow::Result<u64>
where
    Req: serde::de::DeserializeOwned,
    Resp: serde::Serialize,
    F: for<'a> FnOnce(
        Arc<HostFunctionDispatcher>,
        Req,
    ) -> std::pin::Pin<Box<dyn std::future::Future<Output = Resp> + Send + 'a>>,
{
    let memory = caller
        .get_export("memory")
        .and_then(|e| e.into_memory())
        .ok_or_else(|| anyhow::anyhow!("guest module has no exported memory"))?;
    let allocate = caller.get_export("allocate").ok_or_else(|| anyhow::anyhow!("guest module has no `allocate` export"))?;
    let allocate = allocate
        .into_func()
        .ok_or_else(|| anyhow::anyhow!("guest `allocate` export is not a function"))?
        .typed::<u32, u32>(&mut *caller)?;

    let request_bytes = read_guest_bytes(caller, memory, packed_req)?;
    let request: Req = serde_json::from_slice(&request_bytes)?;

    let dispatcher = Arc::clone(&caller.data().dispatcher);
    let response = handler(dispatcher, request).await;
    let response_bytes = serde_json::to_vec(&response)?;

    write_guest_bytes(caller, memory, allocate, &response_bytes).await
}

async fn call_export_returning_packed(pooled: &mut PooledInstance, export: &str) -> Result<Vec<u8>, PluginError> {
    let func = pooled
        .instance
        .get_typed_func::<(), u64>(&mut pooled.store, export)
        .map_err(|e| PluginError::new("missing_export", e.to_string(), PluginErrorType::Config))?;
    let packed = func.call_async(&mut pooled.store, ()).await.map_err(|e| {
        PluginError::guest_trap(e.to_string())
    })?;
    let memory = pooled
        .instance
        .get_memory(&mut pooled.store, "memory")
        .ok_or_else(|| PluginError::new("no_memory", "guest module has no exported memory", PluginErrorType::Internal))?;
    let (ptr, len) = unpack(packed);
    memory
        .data(&pooled.store)
        .get(ptr as usize..(ptr as usize + len as usize))
        .map(|s| s.to_vec())
        .ok_or_else(|| PluginError::new("bad_pointer", "guest returned out-of-bounds pointer/length", PluginErrorType::Internal))
}

async fn invoke_check(
    pooled: &mut PooledInstance,
    ctx: &ContextWire,
    config: &serde_json::Value,
) -> Result<Evidence, PluginError> {
    let memory = pooled
        .instance
        .get_memory(&mut pooled.store, "memory")
        .ok_or_else(|| PluginError::new("no_memory", "guest module has no exported memory", PluginErrorType::Internal))?;
    let allocate = pooled
        .instance
        .get_typed_func::<u32, u32>(&mut pooled.store, "allocate")
        .map_err(|e| PluginError::new("missing_export", e.to_string(), PluginErrorType::Config))?;

    let ctx_bytes = serde_json::to_vec(ctx).map_err(|e| PluginError::new("marshal_failed", e.to_string(), PluginErrorType::Internal))?;
    let ctx_ptr = allocate
        .call_async(&mut pooled.store, ctx_bytes.len() as u32)
        .await
        .map_err(|e| PluginError::guest_trap(e.to_string()))?;
    memory
        .write(&mut pooled.store, ctx_ptr as usize, &ctx_bytes)
        .map_err(|e| PluginError::new("marshal_failed", e.to_string(), PluginErrorType::Internal))?;
    let ctx_packed = reglet_wire::pack(ctx_ptr, ctx_bytes.len() as u32);

    let cfg_bytes = serde_json::to_vec(config).map_err(|e| PluginError::new("marshal_failed", e.to_string(), PluginErrorType::Internal))?;
    let cfg_ptr = allocate
        .call_async(&mut pooled.store, cfg_bytes.len() as u32)
        .await
        .map_err(|e| PluginError::guest_trap(e.to_string()))?;
    memory
        .write(&mut pooled.store, cfg_ptr as usize, &cfg_bytes)
        .map_err(|e| PluginError::new("marshal_failed", e.to_string(), PluginErrorType::Internal))?;
    let cfg_packed = reglet_wire::pack(cfg_ptr, cfg_bytes.len() as u32);

    let check = pooled
        .instance
        .get_typed_func::<(u64, u64), u64>(&mut pooled.store, "check")
        .map_err(|e| PluginError::new("missing_export", e.to_string(), PluginErrorType::Config))?;

    let packed_result = check
        .call_async(&mut pooled.store, (ctx_packed, cfg_packed))
        .await
        .map_err(|e| PluginError::guest_trap(e.to_string()))?;

    let (ptr, len) = unpack(packed_result);
    let bytes = memory
        .data(&pooled.store)
        .get(ptr as usize..(ptr as usize + len as usize))
        .map(|s| s.to_vec())
        .ok_or_else(|| PluginError::new("bad_pointer", "guest returned out-of-bounds pointer/length", PluginErrorType::Internal))?;

    let envelope: EvidenceEnvelope = serde_json::from_slice(&bytes)
        .map_err(|e| PluginError::new("bad_evidence", e.to_string(), PluginErrorType::Internal))?;

    Ok(Evidence {
        timestamp: Utc::now(),
        status: envelope.status,
        data: envelope.data,
        raw: None,
        error: envelope.error.map(|e| PluginError::new(e.code, e.message, PluginErrorType::Internal)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runtime_constructs_with_async_and_fuel_enabled() {
        assert!(PluginRuntime::new().is_ok());
    }

    #[tokio::test]
    async fn describe_on_unloaded_plugin_reports_config_error() {
        let runtime = PluginRuntime::new().unwrap();
        let err = runtime.describe("nonexistent").await.unwrap_err();
        assert_eq!(err.code, "plugin_not_loaded");
        assert_eq!(err.kind, PluginErrorType::Config);
    }
}
