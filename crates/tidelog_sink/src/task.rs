//! Task spawning seam for background compression and pruning.

use parking_lot::Mutex;
use std::fmt::Debug;
use std::sync::Arc;
use std::thread;

/// A fire-and-forget unit of background work.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Runs background tasks.
///
/// The rotating writer never waits for the tasks it spawns. Tests substitute
/// [`InlineSpawner`] to run them synchronously and assert on the result.
pub trait Spawner: Send + Sync + Debug {
    /// Starts `task`. `name` identifies the task in thread names and logs.
    fn spawn(&self, name: &str, task: Task);
}

/// Spawns each task on its own named OS thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSpawner;

impl Spawner for ThreadSpawner {
    fn spawn(&self, name: &str, task: Task) {
        // `Builder::spawn` drops the closure when it fails, so the task is
        // parked where the fallback path can still take it.
        let slot = Arc::new(Mutex::new(Some(task)));
        let thread_slot = Arc::clone(&slot);

        let spawned = thread::Builder::new()
            .name(format!("tidelog-{name}"))
            .spawn(move || {
                let task = thread_slot.lock().take();
                if let Some(task) = task {
                    task();
                }
            });

        if let Err(e) = spawned {
            tracing::warn!(task = name, error = %e, "failed to spawn background thread, running inline");
            let task = slot.lock().take();
            if let Some(task) = task {
                task();
            }
        }
    }
}

/// Runs each task immediately on the caller's thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct InlineSpawner;

impl Spawner for InlineSpawner {
    fn spawn(&self, _name: &str, task: Task) {
        task();
    }
}
