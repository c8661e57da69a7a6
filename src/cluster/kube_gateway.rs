//! Production [`ClusterGateway`] backed by a real Kubernetes API server.
//!
//! Client construction (in-cluster vs. local kube-config) and the raw
//! list/patch/delete calls against nodes and pods live here so the binary
//! is runnable; the scheduler never depends on this module directly, only
//! on the [`ClusterGateway`] trait.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use k8s_openapi::api::core::v1::{Node as K8sNode, Pod};
use kube::api::{DeleteParams, ListParams, Patch, PatchParams};
use kube::{Api, Client};
use serde_json::json;
use tracing::{debug, info, warn};

use crate::config::Environment;
use crate::error::{DrainError, GatewayError};

use super::gateway::{retry_until_deadline, ClusterGateway, DrainOutcome, POD_CHECK_INTERVAL, PROCESSING_RETRY_INTERVAL};
use super::node::Node;

/// Build a `kube::Client` for the configured environment: in-cluster
/// credentials in production, `~/.kube/config` in development.
pub async fn build_client(environment: Environment) -> Result<Client, GatewayError> {
    let config = match environment {
        Environment::Development => {
            kube::Config::from_kubeconfig(&kube::config::KubeConfigOptions::default())
                .await
                .map_err(|e| GatewayError::ClientInit(e.to_string()))?
        }
        Environment::Production => kube::Config::incluster()
            .map_err(|e| GatewayError::ClientInit(e.to_string()))?,
    };

    Client::try_from(config).map_err(|e| GatewayError::ClientInit(e.to_string()))
}

const PREEMPTIBLE_LABEL: &str = "cloud.google.com/gke-preemptible=true";
const POOL_LABEL_KEY: &str = "cloud.google.com/gke-nodepool";
const SYSTEM_NAMESPACE: &str = "kube-system";

/// Which side of the include/exclude pool filter is active. At most one is
/// ever configured: the two are mutually exclusive.
#[derive(Debug, Clone)]
pub enum PoolFilter {
    None,
    Include(String),
    Exclude(String),
}

pub struct KubeGateway {
    client: Client,
    pool_filter: PoolFilter,
    debug: bool,
}

impl KubeGateway {
    /// Build a gateway from an already-constructed `kube::Client`. Client
    /// construction itself (in-cluster credentials vs. `~/.kube/config`) is
    /// the caller's responsibility — see `config::Environment`.
    ///
    /// When `debug` is set, `drain` pauses for operator confirmation on
    /// stdin between the cordon, evict, and delete phases, so an operator
    /// can watch each step land before the next one fires.
    pub fn new(client: Client, pool_filter: PoolFilter, debug: bool) -> Self {
        Self {
            client,
            pool_filter,
            debug,
        }
    }

    /// Block on an operator pressing Enter before continuing to the next
    /// drain phase. Only ever called when `debug` is set, so this never
    /// runs unattended in production.
    async fn pause_for_operator(&self, node_name: &str, phase: &str) {
        if !self.debug {
            return;
        }
        info!(node = node_name, phase, "debug mode: press enter to continue");
        let _ = tokio::task::spawn_blocking(|| {
            let mut discard = String::new();
            std::io::stdin().read_line(&mut discard)
        })
        .await;
    }

    fn passes_pool_filter(&self, node: &K8sNode) -> bool {
        let pool = node
            .metadata
            .labels
            .as_ref()
            .and_then(|labels| labels.get(POOL_LABEL_KEY))
            .map(String::as_str);

        match (&self.pool_filter, pool) {
            (PoolFilter::None, _) => true,
            (PoolFilter::Include(want), Some(have)) => want == have,
            (PoolFilter::Include(_), None) => false,
            (PoolFilter::Exclude(exclude), Some(have)) => exclude != have,
            (PoolFilter::Exclude(_), None) => true,
        }
    }

    async fn cordon(&self, name: &str) -> Result<(), DrainError> {
        let nodes: Api<K8sNode> = Api::all(self.client.clone());
        let patch = json!({ "spec": { "unschedulable": true } });
        nodes
            .patch(name, &PatchParams::default(), &Patch::Merge(patch))
            .await
            .map(|_| ())
            .map_err(|e| DrainError::Cordon {
                node: name.to_string(),
                reason: e.to_string(),
            })
    }

    async fn list_workload_pods(&self, node_name: &str) -> Result<Vec<Pod>, DrainError> {
        let pods: Api<Pod> = Api::all(self.client.clone());
        let field_selector = format!(
            "spec.nodeName={node_name},metadata.namespace!={SYSTEM_NAMESPACE}"
        );
        let list = pods
            .list(&ListParams::default().fields(&field_selector))
            .await
            .map_err(|e| DrainError::PodListing {
                node: node_name.to_string(),
                reason: e.to_string(),
            })?;

        Ok(list
            .items
            .into_iter()
            .filter(|pod| !owned_by_daemonset(pod))
            .collect())
    }

    async fn evict_pods(&self, node_name: &str, deadline: Instant) -> bool {
        let pods_api: Api<Pod> = Api::all(self.client.clone());

        let list_result = self.list_workload_pods(node_name).await;
        match list_result {
            Ok(pods) => {
                for pod in &pods {
                    if let Some(pod_name) = &pod.metadata.name {
                        if let Err(e) = pods_api.delete(pod_name, &DeleteParams::default()).await {
                            warn!(node = node_name, pod = %pod_name, error = %e, "pod delete failed, check loop will catch stragglers");
                        }
                    }
                }
            }
            Err(e) => {
                warn!(node = node_name, error = %e, "failed to list workload pods");
            }
        }

        retry_until_deadline(deadline, POD_CHECK_INTERVAL, || async {
            match self.list_workload_pods(node_name).await {
                Ok(pods) if pods.is_empty() => Some(()),
                Ok(_) => None,
                Err(e) => {
                    warn!(node = node_name, error = %e, "pod listing failed during eviction poll");
                    None
                }
            }
        })
        .await
        .is_some()
    }

    async fn delete_node(&self, name: &str) -> Result<(), DrainError> {
        let nodes: Api<K8sNode> = Api::all(self.client.clone());
        nodes
            .delete(name, &DeleteParams::default())
            .await
            .map(|_| ())
            .map_err(|e| DrainError::NodeDelete {
                node: name.to_string(),
                reason: e.to_string(),
            })
    }
}

fn owned_by_daemonset(pod: &Pod) -> bool {
    pod.metadata
        .owner_references
        .as_ref()
        .is_some_and(|owners| owners.iter().any(|owner| owner.kind == "DaemonSet"))
}

#[async_trait]
impl ClusterGateway for KubeGateway {
    async fn list_managed_preemptible_nodes(&self) -> Result<Vec<Node>, GatewayError> {
        debug!("scanning nodes");
        let nodes: Api<K8sNode> = Api::all(self.client.clone());
        let list = nodes
            .list(&ListParams::default().labels(PREEMPTIBLE_LABEL))
            .await
            .map_err(|e| GatewayError::Listing(e.to_string()))?;

        let managed = list
            .items
            .into_iter()
            .filter(|n| self.passes_pool_filter(n))
            .filter_map(|n| {
                let name = n.metadata.name.clone()?;
                let created_at = n.metadata.creation_timestamp.as_ref()?.0;
                Some(Node::new(name, created_at))
            })
            .collect();

        Ok(managed)
    }

    async fn drain(&self, node: &Node, deadline: Duration) -> DrainOutcome {
        let deadline = Instant::now() + deadline;
        info!(node = %node.name, "draining node");

        let cordoned = retry_until_deadline(deadline, PROCESSING_RETRY_INTERVAL, || async {
            match self.cordon(&node.name).await {
                Ok(()) => Some(()),
                Err(e) => {
                    warn!(node = %node.name, error = %e, "cordon failed, retrying");
                    None
                }
            }
        })
        .await;

        if cordoned.is_none() {
            warn!(node = %node.name, "timed out cordoning node");
            return DrainOutcome::TimedOut;
        }
        self.pause_for_operator(&node.name, "cordon").await;

        if !self.evict_pods(&node.name, deadline).await {
            warn!(node = %node.name, "timed out evicting pods");
            return DrainOutcome::TimedOut;
        }
        self.pause_for_operator(&node.name, "evict").await;

        let deleted = retry_until_deadline(deadline, PROCESSING_RETRY_INTERVAL, || async {
            match self.delete_node(&node.name).await {
                Ok(()) => Some(()),
                Err(e) => {
                    warn!(node = %node.name, error = %e, "node delete failed, retrying");
                    None
                }
            }
        })
        .await;

        if deleted.is_none() {
            warn!(node = %node.name, "timed out deleting node");
            return DrainOutcome::TimedOut;
        }

        info!(node = %node.name, "drain completed");
        DrainOutcome::Completed
    }
}
