//! Registry of connected nodes, keyed by (node group, identity).
//!
//! Entries are created or refreshed by every inbound command, so a worker that
//! reconnects re-registers itself with whatever message it sends first.

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::cluster::node::{ConnectionWrapper, WorkerNode};
use crate::protocol::NodeMeta;
use crate::remoting::{Channel, ChannelId};

/// Registry for connected nodes
#[derive(Debug, Default)]
pub struct NodeRegistry {
    groups: DashMap<String, DashMap<String, Arc<WorkerNode>>>,
}

impl NodeRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            groups: DashMap::new(),
        }
    }

    /// Register `channel` under the sender's identity, replacing any previous
    /// connection. Idempotent for repeated identical envelopes.
    pub fn upsert(&self, channel: &Arc<dyn Channel>, meta: NodeMeta<'_>) -> Arc<WorkerNode> {
        // Hot path: known node, nothing to allocate
        if let Some(group) = self.groups.get(meta.node_group) {
            if let Some(node) = group.get(meta.identity) {
                node.bind(channel, meta.node_type);
                return node.clone();
            }
        }

        let group = self.groups.entry(meta.node_group.to_string()).or_default();
        let node = match group.entry(meta.identity.to_string()) {
            Entry::Occupied(entry) => {
                entry.get().bind(channel, meta.node_type);
                entry.get().clone()
            }
            Entry::Vacant(entry) => {
                let node = Arc::new(WorkerNode::new(ConnectionWrapper::new(
                    channel.clone(),
                    meta.node_type,
                    meta.node_group,
                    meta.identity,
                )));
                entry.insert(node.clone());
                tracing::info!(
                    node_group = meta.node_group,
                    identity = meta.identity,
                    node_type = %meta.node_type,
                    remote_addr = %channel.remote_addr(),
                    "Node registered"
                );
                node
            }
        };
        node
    }

    /// Get a node by group and identity
    pub fn lookup(&self, node_group: &str, identity: &str) -> Option<Arc<WorkerNode>> {
        self.groups
            .get(node_group)
            .and_then(|group| group.get(identity).map(|node| node.clone()))
    }

    /// Evict every node bound to `channel_id`. Returns the number removed.
    pub fn remove_channel(&self, channel_id: ChannelId) -> usize {
        self.evict(|node| node.channel().id() == channel_id)
    }

    /// Evict every node whose connection reports closed. Returns the number removed.
    pub fn evict_closed(&self) -> usize {
        self.evict(|node| node.channel().is_closed())
    }

    fn evict(&self, doomed: impl Fn(&WorkerNode) -> bool) -> usize {
        let mut removed = 0;
        for group in self.groups.iter() {
            group.retain(|_, node| {
                if doomed(node) {
                    tracing::info!(
                        node_group = node.node_group(),
                        identity = node.identity(),
                        "Node evicted"
                    );
                    removed += 1;
                    false
                } else {
                    true
                }
            });
        }
        if removed > 0 {
            self.groups.retain(|_, group| !group.is_empty());
        }
        removed
    }

    /// Snapshot of the nodes in one group
    pub fn nodes_in_group(&self, node_group: &str) -> Vec<Arc<WorkerNode>> {
        self.groups
            .get(node_group)
            .map(|group| group.iter().map(|node| node.value().clone()).collect())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.groups.iter().map(|group| group.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::NodeType;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[derive(Debug)]
    struct FakeChannel {
        id: ChannelId,
        closed: AtomicBool,
    }

    impl FakeChannel {
        fn open(id: ChannelId) -> Arc<Self> {
            Arc::new(Self {
                id,
                closed: AtomicBool::new(false),
            })
        }
    }

    impl Channel for FakeChannel {
        fn id(&self) -> ChannelId {
            self.id
        }

        fn remote_addr(&self) -> String {
            format!("127.0.0.1:{}", 40000 + self.id)
        }

        fn is_closed(&self) -> bool {
            self.closed.load(Ordering::SeqCst)
        }
    }

    fn meta<'a>(group: &'a str, identity: &'a str) -> NodeMeta<'a> {
        NodeMeta {
            node_type: NodeType::TaskTracker,
            node_group: group,
            identity,
        }
    }

    #[test]
    fn test_upsert_and_lookup() {
        let registry = NodeRegistry::new();
        let channel: Arc<dyn Channel> = FakeChannel::open(1);

        registry.upsert(&channel, meta("g1", "w1"));

        let node = registry.lookup("g1", "w1").unwrap();
        assert_eq!(node.identity(), "w1");
        assert_eq!(node.node_type(), NodeType::TaskTracker);
        assert!(registry.lookup("g1", "w2").is_none());
        assert!(registry.lookup("g2", "w1").is_none());
    }

    #[test]
    fn test_upsert_is_idempotent_and_keeps_latest_channel() {
        let registry = NodeRegistry::new();
        let first: Arc<dyn Channel> = FakeChannel::open(1);
        let second: Arc<dyn Channel> = FakeChannel::open(2);

        registry.upsert(&first, meta("g1", "w1"));
        registry.upsert(&first, meta("g1", "w1"));
        let node = registry.upsert(&second, meta("g1", "w1"));

        assert_eq!(registry.len(), 1);
        assert_eq!(node.channel().id(), 2);
    }

    #[test]
    fn test_reconnect_keeps_capacity() {
        let registry = NodeRegistry::new();
        let first: Arc<dyn Channel> = FakeChannel::open(1);
        let second: Arc<dyn Channel> = FakeChannel::open(2);

        let node = registry.upsert(&first, meta("g1", "w1"));
        node.slots().report(3, 10);
        registry.upsert(&second, meta("g1", "w1"));

        assert_eq!(registry.lookup("g1", "w1").unwrap().available_threads(), 3);
    }

    #[test]
    fn test_evict_closed() {
        let registry = NodeRegistry::new();
        let live = FakeChannel::open(1);
        let dead = FakeChannel::open(2);
        let live_dyn: Arc<dyn Channel> = live.clone();
        let dead_dyn: Arc<dyn Channel> = dead.clone();

        registry.upsert(&live_dyn, meta("g1", "w1"));
        registry.upsert(&dead_dyn, meta("g2", "w2"));
        dead.closed.store(true, Ordering::SeqCst);

        assert_eq!(registry.evict_closed(), 1);
        assert_eq!(registry.len(), 1);
        assert!(registry.lookup("g2", "w2").is_none());
        assert!(registry.nodes_in_group("g2").is_empty());
    }

    #[test]
    fn test_remove_channel() {
        let registry = NodeRegistry::new();
        let channel: Arc<dyn Channel> = FakeChannel::open(7);

        registry.upsert(&channel, meta("g1", "w1"));
        registry.upsert(&channel, meta("g1", "w2"));

        assert_eq!(registry.remove_channel(7), 2);
        assert!(registry.is_empty());
    }
}
