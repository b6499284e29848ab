//! Task registry: string task paths mapped to executable closures.
//!
//! Workers resolve every [`TaskRef`] against a registry built at process
//! startup, so a stale reference fails as an explicit
//! [`TaskError::Unresolved`] at resolve time instead of an import-time
//! surprise. The registry is an explicit, cloneable handle; clones share
//! the same entries.

use std::sync::Arc;

use dashmap::DashMap;
use rowfan_types::payload::Kwargs;
use rowfan_types::table::RowTable;
use rowfan_types::task::TaskRef;

use crate::error::TaskError;

/// A registered table-processing task: sub-table in, keyword args alongside.
pub type TaskFn = Arc<dyn Fn(RowTable, &Kwargs) -> anyhow::Result<()> + Send + Sync>;

/// Constructs a bound method task from constructor kwargs.
pub type FactoryFn = Arc<dyn Fn(&Kwargs) -> anyhow::Result<TaskFn> + Send + Sync>;

enum Registration {
    Function(TaskFn),
    Method {
        factory: FactoryFn,
        unbound: Option<TaskFn>,
    },
}

/// String-keyed task registry.
///
/// Both method reference shapes (`…|method` and `…|method|`) share one
/// registration; [`resolve`](TaskRegistry::resolve) picks the factory or
/// the direct method based on the reference's `requires_init` flag.
#[derive(Clone, Default)]
pub struct TaskRegistry {
    entries: Arc<DashMap<String, Registration>>,
}

impl TaskRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a plain function task under `module.name`.
    pub fn register_function<F>(&self, module: &str, name: &str, task: F)
    where
        F: Fn(RowTable, &Kwargs) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let task_ref = TaskRef::function(module, name);
        let key = task_ref.registry_key();
        tracing::debug!(task = %key, "Registered function task");
        self.entries.insert(key, Registration::Function(Arc::new(task)));
    }

    /// Register a method task under `module.Type|method`.
    ///
    /// `factory` builds the receiver from constructor kwargs and returns the
    /// bound method; `unbound` serves references that call the method
    /// directly on the type without instantiation.
    pub fn register_method<F>(
        &self,
        module: &str,
        type_name: &str,
        method: &str,
        factory: F,
        unbound: Option<TaskFn>,
    ) where
        F: Fn(&Kwargs) -> anyhow::Result<TaskFn> + Send + Sync + 'static,
    {
        let task_ref = TaskRef::method(module, type_name, method, true);
        let key = task_ref.registry_key();
        tracing::debug!(task = %key, "Registered method task");
        self.entries.insert(
            key,
            Registration::Method {
                factory: Arc::new(factory),
                unbound,
            },
        );
    }

    /// `true` when a registration exists for this reference.
    #[must_use]
    pub fn contains(&self, task_ref: &TaskRef) -> bool {
        self.entries.contains_key(&task_ref.registry_key())
    }

    /// Number of registrations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` when nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolve a reference to an executable task.
    ///
    /// Method references with `requires_init` run the registered factory
    /// once per resolve with `init_kwargs` (default `{}`); direct method
    /// references return the registered unbound task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::Unresolved`] for an unknown path and
    /// [`TaskError::Binding`] when the reference shape does not match the
    /// registration, the direct method is missing, or the factory fails.
    pub fn resolve(
        &self,
        task_ref: &TaskRef,
        init_kwargs: Option<&Kwargs>,
    ) -> Result<TaskFn, TaskError> {
        let path = task_ref.as_path();
        let entry = self
            .entries
            .get(&task_ref.registry_key())
            .ok_or_else(|| TaskError::Unresolved(path.clone()))?;

        match (task_ref, entry.value()) {
            (TaskRef::Function { .. }, Registration::Function(task)) => Ok(task.clone()),
            (
                TaskRef::Method {
                    requires_init: true,
                    ..
                },
                Registration::Method { factory, .. },
            ) => {
                let empty = Kwargs::new();
                factory(init_kwargs.unwrap_or(&empty)).map_err(|err| TaskError::Binding {
                    path,
                    reason: format!("constructor failed: {err:#}"),
                })
            }
            (
                TaskRef::Method {
                    requires_init: false,
                    ..
                },
                Registration::Method { unbound, .. },
            ) => unbound.clone().ok_or_else(|| TaskError::Binding {
                path,
                reason: "no direct method registered for this type".to_string(),
            }),
            (TaskRef::Function { .. }, Registration::Method { .. }) => Err(TaskError::Binding {
                path,
                reason: "registered as a method, referenced as a function".to_string(),
            }),
            (TaskRef::Method { .. }, Registration::Function(_)) => Err(TaskError::Binding {
                path,
                reason: "registered as a function, referenced as a method".to_string(),
            }),
        }
    }
}

impl std::fmt::Debug for TaskRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskRegistry")
            .field("entries", &self.entries.len())
            .finish()
    }
}
