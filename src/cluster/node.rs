use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::cluster::capacity::SlotCounter;
use crate::core::clock;
use crate::protocol::NodeType;
use crate::remoting::Channel;

/// A raw connection bound to the identity the remote side declared
#[derive(Debug, Clone)]
pub struct ConnectionWrapper {
    pub channel: Arc<dyn Channel>,
    pub node_type: NodeType,
    pub node_group: String,
    pub identity: String,
}

impl ConnectionWrapper {
    pub fn new(
        channel: Arc<dyn Channel>,
        node_type: NodeType,
        node_group: impl Into<String>,
        identity: impl Into<String>,
    ) -> Self {
        Self {
            channel,
            node_type,
            node_group: node_group.into(),
            identity: identity.into(),
        }
    }
}

/// Registry entry for one connected process
#[derive(Debug)]
pub struct WorkerNode {
    node_group: String,
    identity: String,
    connection: RwLock<ConnectionWrapper>,
    slots: SlotCounter,
    last_update: AtomicI64,
}

impl WorkerNode {
    pub fn new(connection: ConnectionWrapper) -> Self {
        Self {
            node_group: connection.node_group.clone(),
            identity: connection.identity.clone(),
            connection: RwLock::new(connection),
            slots: SlotCounter::new(),
            last_update: AtomicI64::new(clock::now_millis()),
        }
    }

    pub fn node_group(&self) -> &str {
        &self.node_group
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    pub fn node_type(&self) -> NodeType {
        self.connection.read().node_type
    }

    /// Connection currently bound to this identity
    pub fn channel(&self) -> Arc<dyn Channel> {
        self.connection.read().channel.clone()
    }

    pub fn connection(&self) -> ConnectionWrapper {
        self.connection.read().clone()
    }

    pub fn slots(&self) -> &SlotCounter {
        &self.slots
    }

    pub fn available_threads(&self) -> i32 {
        self.slots.get()
    }

    /// Epoch millis of the last command seen from this node
    pub fn last_update(&self) -> i64 {
        self.last_update.load(Ordering::Relaxed)
    }

    /// Rebind to `channel`. Only a changed connection or role allocates.
    pub(crate) fn bind(&self, channel: &Arc<dyn Channel>, node_type: NodeType) {
        let unchanged = {
            let current = self.connection.read();
            current.channel.id() == channel.id() && current.node_type == node_type
        };
        if !unchanged {
            let mut current = self.connection.write();
            *current = ConnectionWrapper::new(
                channel.clone(),
                node_type,
                self.node_group.as_str(),
                self.identity.as_str(),
            );
            tracing::info!(
                node_group = %self.node_group,
                identity = %self.identity,
                channel_id = channel.id(),
                "Node connection rebound"
            );
        }
        self.touch();
    }

    fn touch(&self) {
        self.last_update
            .store(clock::now_millis(), Ordering::Relaxed);
    }
}
