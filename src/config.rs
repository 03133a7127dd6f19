//! Resolver configuration.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Deadline used by [`ResolverConfig::default`].
pub const DEFAULT_DEADLINE: Duration = Duration::from_secs(10);

/// What to do when a single node cannot be resolved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeErrorPolicy {
    /// Leave the node out of the port index and report a diagnostic.
    #[default]
    Partial,
    /// Fail the whole request with the first error.
    Fail,
}

/// Options for a [`ResolverService`](crate::ide::ResolverService).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ResolverConfig {
    /// Upper bound for one `resolve` call, in milliseconds on the wire.
    /// `None` waits forever.
    #[serde(with = "millis")]
    pub deadline: Option<Duration>,
    pub node_errors: NodeErrorPolicy,
    /// Root of the standard library (holds `builtin/` and importable packages).
    pub stdlib_root: Option<PathBuf>,
    /// Number of lowered files kept in the parse cache; 0 disables it.
    pub cache_capacity: usize,
    /// Report connections to unknown nodes or ports as warnings.
    pub check_network: bool,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            deadline: Some(DEFAULT_DEADLINE),
            node_errors: NodeErrorPolicy::Partial,
            stdlib_root: None,
            cache_capacity: 256,
            check_network: true,
        }
    }
}

impl ResolverConfig {
    pub fn with_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn with_node_errors(mut self, policy: NodeErrorPolicy) -> Self {
        self.node_errors = policy;
        self
    }

    pub fn with_stdlib_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.stdlib_root = Some(root.into());
        self
    }

    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity;
        self
    }

    pub fn with_check_network(mut self, enabled: bool) -> Self {
        self.check_network = enabled;
        self
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(d) => s.serialize_some(&(d.as_millis() as u64)),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Duration>, D::Error> {
        Ok(Option::<u64>::deserialize(d)?.map(Duration::from_millis))
    }
}
