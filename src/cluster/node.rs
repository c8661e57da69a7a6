use chrono::{DateTime, Utc};

/// A managed preemptible node: opaque identity plus the timestamp the
/// forced-reclamation deadline is computed from. The deadline itself
/// (`created_at + 24h`) is derived by the scheduler through
/// [`crate::cluster::ClusterGateway::creation_time`], not here, so that
/// gateway capability has an actual call site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl Node {
    pub fn new(name: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            created_at,
        }
    }
}
