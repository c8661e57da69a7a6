//! In-memory [`ClusterGateway`] stand-in used by the scheduler's test suite:
//! a fully controllable double so scheduler behavior (which nodes get
//! drained, what the next sleep is) can be asserted without a real cluster.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::GatewayError;

use super::gateway::{ClusterGateway, DrainOutcome};
use super::node::Node;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainBehavior {
    Complete,
    TimeOut,
}

pub struct MockGateway {
    nodes: Mutex<Vec<Node>>,
    drained: Mutex<Vec<String>>,
    list_error: Mutex<Option<String>>,
    drain_behavior: DrainBehavior,
}

impl MockGateway {
    pub fn new(nodes: Vec<Node>) -> Self {
        Self {
            nodes: Mutex::new(nodes),
            drained: Mutex::new(Vec::new()),
            list_error: Mutex::new(None),
            drain_behavior: DrainBehavior::Complete,
        }
    }

    pub fn with_drain_behavior(mut self, behavior: DrainBehavior) -> Self {
        self.drain_behavior = behavior;
        self
    }

    pub fn fail_listing_with(&self, message: impl Into<String>) {
        *self.list_error.lock().unwrap() = Some(message.into());
    }

    /// Names of nodes that `drain` was called on, in call order.
    pub fn drained_nodes(&self) -> Vec<String> {
        self.drained.lock().unwrap().clone()
    }

    pub fn remove_node(&self, name: &str) {
        self.nodes.lock().unwrap().retain(|n| n.name != name);
    }
}

#[async_trait]
impl ClusterGateway for MockGateway {
    async fn list_managed_preemptible_nodes(&self) -> Result<Vec<Node>, GatewayError> {
        if let Some(message) = self.list_error.lock().unwrap().clone() {
            return Err(GatewayError::Listing(message));
        }
        Ok(self.nodes.lock().unwrap().clone())
    }

    async fn drain(&self, node: &Node, _deadline: Duration) -> DrainOutcome {
        self.drained.lock().unwrap().push(node.name.clone());
        match self.drain_behavior {
            DrainBehavior::Complete => {
                self.remove_node(&node.name);
                DrainOutcome::Completed
            }
            DrainBehavior::TimeOut => DrainOutcome::TimedOut,
        }
    }
}
