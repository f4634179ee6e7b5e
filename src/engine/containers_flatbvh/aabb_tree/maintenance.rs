use std::time::{Duration, Instant};
use math_flatbvh::AABB;
use super::partition::{self, BuildLeaf};
use super::{AabbTree, ExternalRef, Node, TreeKey, LEAF_GROUP_SIZE};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortMode
{
    Unsorted,
    Standard,
    HighQuality,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RebuildStats
{
    pub num_leaves: usize,
    pub num_nodes: usize,
    pub num_tombstones_dropped: usize,
    pub sort: SortMode,
    pub elapsed: Duration,
}

impl<K: TreeKey> AabbTree<K>
{
    #[inline] #[must_use]
    pub fn needs_finalize(&self) -> bool { self.needs_rebuild || self.needs_rebound }

    // Run any pending maintenance. A rebuild supersedes a rebound. Returns whether anything ran
    pub fn finalize(&mut self) -> bool
    {
        if self.needs_rebuild
        {
            self.rebuild();
            true
        }
        else if self.needs_rebound
        {
            self.rebound();
            true
        }
        else
        {
            false
        }
    }

    fn rebound(&mut self)
    {
        let (start, end) = (self.start_update, self.end_update);
        if start < end
        {
            let mut num_refit = 0;
            let mut index = 0;
            while index < self.nodes.len()
            {
                let escape = index + self.nodes[index].escape_offset;
                if self.nodes[index].is_container() && index < end && escape > start
                {
                    refit_subtree(&mut self.nodes, index, start, end, &mut num_refit);
                }
                index = escape;
            }

            log::trace!("Rebounded '{}': {} containers over slots {start}..{end} after {} updates",
                self.config.name, num_refit, self.num_updates);
        }

        self.needs_rebound = false;
        self.num_updates = 0;
        self.reset_update_range();
    }

    fn rebuild(&mut self)
    {
        let start_time = Instant::now();
        let num_tombstones_dropped = self.num_tombstones;

        let mut leaves: Vec<BuildLeaf<K>> = Vec::with_capacity(self.num_external_nodes);
        for node in &self.nodes
        {
            if let ExternalRef::Node(key) = node.external
            {
                leaves.push(BuildLeaf { key, extents: node.extents });
            }
        }
        debug_assert_eq!(leaves.len(), self.num_external_nodes);

        let sort = match leaves.len() > LEAF_GROUP_SIZE && self.num_adds > 0
        {
            false => SortMode::Unsorted,
            true if self.config.high_quality =>
            {
                partition::sort_leaves_high_quality(&mut leaves);
                SortMode::HighQuality
            }
            true =>
            {
                partition::sort_leaves(&mut leaves);
                SortMode::Standard
            }
        };

        let num_nodes = match leaves.len()
        {
            0 => 0,
            1 => 1,
            n => predict_num_nodes(n),
        };
        self.resize_store(num_nodes);

        match leaves.as_slice()
        {
            [] => { },
            [leaf] => self.write_leaf(0, *leaf),
            _ =>
            {
                let end = self.build_subtree(&leaves, 0);
                debug_assert_eq!(end, num_nodes);
            }
        }

        self.needs_rebuild = false;
        self.needs_rebound = false;
        self.num_adds = 0;
        self.num_updates = 0;
        self.num_tombstones = 0;
        self.reset_update_range();

        let stats = RebuildStats
        {
            num_leaves: leaves.len(),
            num_nodes,
            num_tombstones_dropped,
            sort,
            elapsed: start_time.elapsed(),
        };
        self.last_rebuild = Some(stats);

        if self.config.log_rebuilds
        {
            log::debug!("Rebuilt '{}': {} leaves into {} nodes ({} removed dropped, {:?}) in {:.3}ms",
                self.config.name,
                stats.num_leaves,
                stats.num_nodes,
                stats.num_tombstones_dropped,
                stats.sort,
                stats.elapsed.as_secs_f64() * 1000.0);
        }
    }

    fn resize_store(&mut self, num_nodes: usize)
    {
        if self.nodes.len() > num_nodes
        {
            self.pool.release_all(self.nodes.drain(num_nodes..));
        }
        while self.nodes.len() < num_nodes
        {
            self.nodes.push(self.pool.allocate());
        }
    }

    fn write_leaf(&mut self, index: usize, leaf: BuildLeaf<K>)
    {
        self.nodes[index].reset_leaf(leaf.key, leaf.extents);
        match self.slots.get_mut(&leaf.key)
        {
            Some(slot) => slot.0 = index,
            None => debug_assert!(false, "Rebuilt leaf {:?} is missing from the slot map", leaf.key),
        }
    }

    // Writes the subtree for `leaves` at `index`, returns the slot after it
    fn build_subtree(&mut self, leaves: &[BuildLeaf<K>], index: usize) -> usize
    {
        let mut next = index + 1;
        let extents = if leaves.len() <= LEAF_GROUP_SIZE
        {
            let mut bounds = AABB::EMPTY;
            for leaf in leaves
            {
                bounds.union_with(leaf.extents);
                self.write_leaf(next, *leaf);
                next += 1;
            }
            bounds
        }
        else
        {
            let split = leaves.len() / 2;
            let left = next;
            let right = self.build_subtree(&leaves[..split], left);
            next = self.build_subtree(&leaves[split..], right);
            self.nodes[left].extents.unioned_with(self.nodes[right].extents)
        };

        self.nodes[index].reset_container(extents, next - index);
        next
    }
}

// Slots used by `build_subtree` for `num_leaves` (>= 2) leaves
#[must_use]
pub(super) fn predict_num_nodes(num_leaves: usize) -> usize
{
    if num_leaves <= LEAF_GROUP_SIZE
    {
        return num_leaves + 1;
    }
    let split = num_leaves / 2;
    1 + predict_num_nodes(split) + predict_num_nodes(num_leaves - split)
}

// Recompute container bounds under `index` that overlap the dirty slot range, from the bottom up
fn refit_subtree<K: Copy>(nodes: &mut [Node<K>], index: usize, start: usize, end: usize, num_refit: &mut usize)
{
    let escape = index + nodes[index].escape_offset;
    let mut extents = AABB::EMPTY;

    let mut child = index + 1;
    while child < escape
    {
        let child_escape = child + nodes[child].escape_offset;
        match nodes[child].external
        {
            ExternalRef::Removed => { },
            ExternalRef::Node(_) => extents.union_with(nodes[child].extents),
            ExternalRef::None =>
            {
                if child < end && child_escape > start
                {
                    refit_subtree(nodes, child, start, end, num_refit);
                }
                extents.union_with(nodes[child].extents);
            }
        }
        child = child_escape;
    }

    nodes[index].extents = extents;
    *num_refit += 1;
}
