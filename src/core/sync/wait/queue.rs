/*!
 * FIFO Wait Queue
 */

use super::node::WaitNode;
use super::traits::WaitQueue;
use std::collections::VecDeque;
use std::sync::Arc;
use std::thread::ThreadId;

/// First-in first-out queue of parked nodes
///
/// # Performance
///
/// - `insert` / `extract`: O(1)
/// - `remove`: O(n), only on timeout or interrupt
#[derive(Debug, Default)]
pub struct FifoWaitQueue {
    nodes: VecDeque<Arc<WaitNode>>,
}

impl FifoWaitQueue {
    pub fn new() -> Self {
        Self::default()
    }
}

impl WaitQueue for FifoWaitQueue {
    #[inline]
    fn insert(&mut self, node: Arc<WaitNode>) {
        self.nodes.push_back(node);
    }

    #[inline]
    fn extract(&mut self) -> Option<Arc<WaitNode>> {
        self.nodes.pop_front()
    }

    fn remove(&mut self, node: &Arc<WaitNode>) -> bool {
        match self.nodes.iter().position(|n| Arc::ptr_eq(n, node)) {
            Some(index) => {
                self.nodes.remove(index);
                true
            }
            None => false,
        }
    }

    #[inline]
    fn has_nodes(&self) -> bool {
        !self.nodes.is_empty()
    }

    #[inline]
    fn len(&self) -> usize {
        self.nodes.len()
    }

    fn is_waiting(&self, thread: ThreadId) -> bool {
        self.nodes.iter().any(|n| n.owner() == thread)
    }

    fn waiting_threads(&self) -> Vec<ThreadId> {
        self.nodes.iter().map(|n| n.owner()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn node_on_new_thread() -> Arc<WaitNode> {
        thread::spawn(WaitNode::new).join().unwrap()
    }

    #[test]
    fn test_fifo_order() {
        let mut queue = FifoWaitQueue::new();
        let first = node_on_new_thread();
        let second = node_on_new_thread();

        queue.insert(first.clone());
        queue.insert(second.clone());

        assert_eq!(queue.len(), 2);
        assert_eq!(queue.waiting_threads(), vec![first.owner(), second.owner()]);
        assert!(Arc::ptr_eq(&queue.extract().unwrap(), &first));
        assert!(Arc::ptr_eq(&queue.extract().unwrap(), &second));
        assert!(queue.extract().is_none());
        assert!(queue.is_empty());
    }

    #[test]
    fn test_remove_middle_node() {
        let mut queue = FifoWaitQueue::new();
        let nodes: Vec<_> = (0..3).map(|_| node_on_new_thread()).collect();
        for node in &nodes {
            queue.insert(node.clone());
        }

        assert!(queue.remove(&nodes[1]));
        assert!(!queue.remove(&nodes[1]));
        assert!(!queue.is_waiting(nodes[1].owner()));
        assert!(queue.is_waiting(nodes[2].owner()));
        assert_eq!(queue.waiting_threads(), vec![nodes[0].owner(), nodes[2].owner()]);
    }

    #[test]
    fn test_empty_queries_never_fail() {
        let queue = FifoWaitQueue::new();
        assert!(!queue.has_nodes());
        assert_eq!(queue.len(), 0);
        assert!(!queue.is_waiting(thread::current().id()));
        assert!(queue.waiting_threads().is_empty());
    }
}
