//! Dispatch configuration.
//!
//! Deployment identity (which compute function, which staging bucket)
//! arrives from the environment; everything else on the dispatcher is
//! explicit. The literal function name `local` is a sentinel that forces
//! synchronous in-process execution even when a compute backend is wired
//! up.

/// Env var naming the compute function to invoke.
pub const ENV_FUNCTION: &str = "ROWFAN_FUNCTION";
/// Env var naming the default staging bucket.
pub const ENV_BUCKET: &str = "ROWFAN_BUCKET";
/// Env var naming the staging key prefix.
pub const ENV_KEY_PREFIX: &str = "ROWFAN_KEY_PREFIX";

/// Function-name sentinel that forces local execution.
pub const FORCE_LOCAL_SENTINEL: &str = "local";

/// Deployment-facing dispatcher settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchConfig {
    /// Compute function receiving dispatched partitions; `None` means no
    /// deployed backend is reachable and dispatch runs locally.
    pub function_name: Option<String>,
    /// Default staging bucket.
    pub bucket: Option<String>,
    /// Prefix prepended to staged object keys.
    pub key_prefix: Option<String>,
    /// Force synchronous in-process execution regardless of backend wiring.
    pub force_local: bool,
}

impl DispatchConfig {
    /// A config that always executes locally.
    #[must_use]
    pub fn local() -> Self {
        Self {
            force_local: true,
            ..Self::default()
        }
    }

    /// Load from the environment.
    ///
    /// `ROWFAN_FUNCTION=local` sets `force_local` instead of a function
    /// name; empty values are treated as unset.
    #[must_use]
    pub fn from_env() -> Self {
        let function = read_env(ENV_FUNCTION);
        let force_local = function.as_deref() == Some(FORCE_LOCAL_SENTINEL);
        Self {
            function_name: function.filter(|_| !force_local),
            bucket: read_env(ENV_BUCKET),
            key_prefix: read_env(ENV_KEY_PREFIX),
            force_local,
        }
    }
}

fn read_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}
