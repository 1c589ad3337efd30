//! Per-plugin instance pool. An instance is single-threaded (WASM is not
//! reentrant on one instance); the pool enforces mutual exclusion per
//! instance but may hold `N >= 1` instances per plugin for parallel
//! invocations. Instances return to the pool on clean completion and are
//! discarded on trap.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio::sync::Mutex;
use wasmtime::{Instance, Store};

use crate::host_state::HostState;

pub struct PooledInstance {
    pub store: Store<HostState>,
    pub instance: Instance,
}

type Factory = dyn Fn() -> Pin<Box<dyn Future<Output = anyhow::Result<PooledInstance>> + Send>> + Send + Sync;

/// Bounds how many live instances one plugin may hold concurrently and
/// builds fresh ones on demand up to that bound. The factory is async
/// because building an instance means driving `Linker::instantiate_async`.
pub struct InstancePool {
    max_instances: usize,
    idle: Mutex<Vec<PooledInstance>>,
    live_count: Mutex<usize>,
    factory: Arc<Factory>,
}

impl InstancePool {
    pub fn new(max_instances: usize, factory: Arc<Factory>) -> Self {
        Self {
            max_instances: max_instances.max(1),
            idle: Mutex::new(Vec::new()),
            live_count: Mutex::new(0),
            factory,
        }
    }

    /// Acquires an idle instance, or builds a fresh one if under the pool's
    /// cap, or waits for one to become available. Returns `Err` only when
    /// the factory itself fails (caller treats that as a load failure, not
    /// as pool exhaustion).
    pub async fn acquire(&self) -> anyhow::Result<PooledInstance> {
        loop {
            {
                let mut idle = self.idle.lock().await;
                if let Some(pooled) = idle.pop() {
                    return Ok(pooled);
                }
            }
            let mut live = self.live_count.lock().await;
            if *live < self.max_instances {
                *live += 1;
                drop(live);
                return (self.factory)().await;
            }
            drop(live);
            tokio::task::yield_now().await;
        }
    }

    /// Returns an instance to the idle pool after a clean call.
    pub async fn release(&self, pooled: PooledInstance) {
        self.idle.lock().await.push(pooled);
    }

    /// Discards an instance after a trap; the pool's live-count budget frees
    /// up so a fresh instance can be built on the next `acquire`.
    pub async fn discard(&self) {
        let mut live = self.live_count.lock().await;
        *live = live.saturating_sub(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_pool(max: usize, built: Arc<AtomicUsize>) -> InstancePool {
        InstancePool::new(
            max,
            Arc::new(move || {
                let built = Arc::clone(&built);
                Box::pin(async move {
                    built.fetch_add(1, Ordering::SeqCst);
                    anyhow::bail!("test pool has no real wasmtime state to build")
                })
            }),
        )
    }

    #[tokio::test]
    async fn discard_frees_the_live_budget() {
        let built = Arc::new(AtomicUsize::new(0));
        let pool = counting_pool(1, Arc::clone(&built));
        let _ = pool.acquire().await; // fails to build, but increments live_count first
        pool.discard().await;
        assert_eq!(*pool.live_count.lock().await, 0);
    }
}
