use std::fmt::{Debug, Formatter};
use std::sync::atomic::{AtomicUsize, Ordering};
use crossbeam::queue::SegQueue;
use nab_flatbvh::utils::ShortTypeName;
use crate::aabb_tree::Node;

pub const NODE_POOL_BATCH_SIZE: usize = 128;
pub const NODE_POOL_DEFAULT_MAX_RETAINED: usize = 64 * 1024;

// Recycles cleared tree nodes; share one between trees with an Arc
pub struct NodePool<K>
{
    free: SegQueue<Node<K>>,
    total_allocated: AtomicUsize, // every node ever created by this pool
    batch_size: usize,
    max_retained: usize,
}
impl<K: Copy> Default for NodePool<K>
{
    fn default() -> Self { Self::with_limits(NODE_POOL_BATCH_SIZE, NODE_POOL_DEFAULT_MAX_RETAINED) }
}
impl<K: Copy> NodePool<K>
{
    #[must_use]
    pub fn with_limits(batch_size: usize, max_retained: usize) -> Self
    {
        debug_assert!(batch_size > 0, "Node pool batches must hold at least one node");
        Self
        {
            free: SegQueue::new(),
            total_allocated: AtomicUsize::new(0),
            batch_size: batch_size.max(1),
            max_retained,
        }
    }

    #[inline] #[must_use] pub fn free_count(&self) -> usize { self.free.len() }
    #[inline] #[must_use] pub fn total_allocated(&self) -> usize { self.total_allocated.load(Ordering::Relaxed) }
    #[inline] #[must_use] pub fn batch_size(&self) -> usize { self.batch_size }
    #[inline] #[must_use] pub fn max_retained(&self) -> usize { self.max_retained }

    // Take a cleared node, replenishing the pool with a whole batch when it runs dry
    #[must_use]
    pub fn allocate(&self) -> Node<K>
    {
        if let Some(node) = self.free.pop()
        {
            return node;
        }

        for _ in 1..self.batch_size
        {
            self.free.push(Node::cleared());
        }
        self.total_allocated.fetch_add(self.batch_size, Ordering::Relaxed);
        Node::cleared()
    }

    // Return a node for reuse. Nodes past the retention cap are dropped
    pub fn release(&self, mut node: Node<K>)
    {
        if self.free.len() >= self.max_retained
        {
            return;
        }
        node.clear();
        self.free.push(node);
    }

    pub fn release_all(&self, nodes: impl IntoIterator<Item = Node<K>>)
    {
        for node in nodes
        {
            self.release(node);
        }
    }
}
impl<K> Debug for NodePool<K>
{
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result
    {
        f.debug_struct(Self::short_type_name())
            .field("free", &self.free.len())
            .field("total_allocated", &self.total_allocated.load(Ordering::Relaxed))
            .field("batch_size", &self.batch_size)
            .field("max_retained", &self.max_retained)
            .finish()
    }
}

#[cfg(test)]
mod tests
{
    use glam::Vec3;
    use math_flatbvh::AABB;
    use crate::aabb_tree::ExternalRef;
    use super::*;

    #[test]
    fn batches()
    {
        let pool = NodePool::<u32>::with_limits(4, 100);
        assert_eq!(pool.total_allocated(), 0);
        assert_eq!(pool.free_count(), 0);

        let a = pool.allocate();
        assert_eq!(pool.total_allocated(), 4);
        assert_eq!(pool.free_count(), 3);

        let _b = pool.allocate();
        let _c = pool.allocate();
        let _d = pool.allocate();
        assert_eq!(pool.free_count(), 0);
        assert_eq!(pool.total_allocated(), 4);

        let _e = pool.allocate();
        assert_eq!(pool.total_allocated(), 8);
        assert_eq!(pool.free_count(), 3);

        pool.release(a);
        assert_eq!(pool.free_count(), 4);
    }

    #[test]
    fn released_nodes_are_cleared()
    {
        let pool = NodePool::<u32>::with_limits(1, 100);
        let mut node = pool.allocate();
        node.reset_leaf(42, AABB::new(Vec3::ZERO, Vec3::ONE));
        assert!(node.is_leaf());

        pool.release(node);
        let recycled = pool.allocate();
        assert_eq!(recycled.external(), ExternalRef::None);
        assert_eq!(recycled.escape_offset(), 1);
        assert_eq!(recycled.extents(), AABB::EMPTY);
        assert_eq!(pool.total_allocated(), 1);
    }

    #[test]
    fn retention_cap()
    {
        let pool = NodePool::<u32>::with_limits(1, 2);
        let nodes: Vec<_> = (0..5).map(|_| pool.allocate()).collect();
        assert_eq!(pool.total_allocated(), 5);

        pool.release_all(nodes);
        assert_eq!(pool.free_count(), 2);
    }
}
