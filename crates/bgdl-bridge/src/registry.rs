//! Task registry: the live mapping from task id to task.
//!
//! Owned by one `BackgroundDownloader` (and shared with its router); there is
//! no process-wide instance, so independent downloaders never collide. The
//! registry is never persisted: native is the durable source of truth and
//! reconciliation rebuilds it after a restart.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use crate::task::DownloadTask;

type TaskMap = HashMap<String, DownloadTask>;

fn lock(map: &Mutex<TaskMap>) -> MutexGuard<'_, TaskMap> {
    map.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Shared registry of live tasks, keyed by id. No ordering guarantee.
#[derive(Clone, Default)]
pub struct TaskRegistry {
    tasks: Arc<Mutex<TaskMap>>,
}

impl std::fmt::Debug for TaskRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskRegistry")
            .field("len", &self.len())
            .finish()
    }
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<DownloadTask> {
        lock(&self.tasks).get(id).cloned()
    }

    pub fn contains(&self, id: &str) -> bool {
        lock(&self.tasks).contains_key(id)
    }

    /// Store a task, returning the one it replaced (last writer wins).
    pub fn insert(&self, task: DownloadTask) -> Option<DownloadTask> {
        lock(&self.tasks).insert(task.id().to_string(), task)
    }

    pub fn remove(&self, id: &str) -> Option<DownloadTask> {
        lock(&self.tasks).remove(id)
    }

    /// Remove `task` only if it is still the entry registered under its id.
    ///
    /// A newer task stored under the same id is left alone.
    pub fn remove_task(&self, task: &DownloadTask) -> bool {
        let mut tasks = lock(&self.tasks);
        if tasks.get(task.id()).is_some_and(|current| current.same_task(task)) {
            tasks.remove(task.id());
            true
        } else {
            false
        }
    }

    pub fn len(&self) -> usize {
        lock(&self.tasks).len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.tasks).is_empty()
    }

    pub fn ids(&self) -> Vec<String> {
        lock(&self.tasks).keys().cloned().collect()
    }

    /// Handles to every live task.
    pub fn tasks(&self) -> Vec<DownloadTask> {
        lock(&self.tasks).values().cloned().collect()
    }

    pub(crate) fn downgrade(&self) -> WeakRegistry {
        WeakRegistry {
            tasks: Arc::downgrade(&self.tasks),
        }
    }
}

/// Back-reference from a task to the registry that holds it.
#[derive(Clone, Default)]
pub(crate) struct WeakRegistry {
    tasks: Weak<Mutex<TaskMap>>,
}

impl WeakRegistry {
    /// Remove `task` from the registry if it is still registered.
    pub fn detach(&self, task: &DownloadTask) {
        if let Some(tasks) = self.tasks.upgrade() {
            TaskRegistry { tasks }.remove_task(task);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MockNative;
    use bgdl_core::metadata;

    fn make(registry: &TaskRegistry, id: &str) -> DownloadTask {
        DownloadTask::new(
            id,
            metadata::empty(),
            Arc::new(MockNative::new()),
            registry.downgrade(),
        )
    }

    #[test]
    fn test_insert_overwrites_same_id() {
        let registry = TaskRegistry::new();
        let first = make(&registry, "a");
        let second = make(&registry, "a");

        assert!(registry.insert(first.clone()).is_none());
        let replaced = registry.insert(second.clone()).unwrap();

        assert!(replaced.same_task(&first));
        assert!(registry.get("a").unwrap().same_task(&second));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_remove_task_ignores_newer_entry() {
        let registry = TaskRegistry::new();
        let old = make(&registry, "a");
        let new = make(&registry, "a");
        registry.insert(old.clone());
        registry.insert(new.clone());

        assert!(!registry.remove_task(&old));
        assert!(registry.contains("a"));
        assert!(registry.remove_task(&new));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_detach_after_registry_dropped() {
        let registry = TaskRegistry::new();
        let task = make(&registry, "a");
        drop(registry);

        // Should not panic
        task.detach();
    }

    #[test]
    fn test_independent_registries() {
        let one = TaskRegistry::new();
        let two = TaskRegistry::new();
        one.insert(make(&one, "a"));

        assert!(one.contains("a"));
        assert!(!two.contains("a"));
    }
}
