//! The cluster gateway: the capability set (list / creation-time / drain)
//! the scheduler needs from the cluster, plus a production adapter and an
//! in-memory test double.

mod gateway;
mod kube_gateway;
mod mock;
mod node;

pub use gateway::{ClusterGateway, DrainOutcome, POD_CHECK_INTERVAL, PROCESSING_RETRY_INTERVAL};
pub use kube_gateway::{build_client, KubeGateway, PoolFilter};
pub use mock::{DrainBehavior, MockGateway};
pub use node::Node;
