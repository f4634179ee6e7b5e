use std::time::Instant;
use math_flatbvh::{classify_aabb, Intersection, Intersects, Plane, Sphere, AABB};
use super::{AabbTree, ExternalRef, Node, TreeKey};

impl<K: TreeKey> AabbTree<K>
{
    /// Collect the leaves inside the convex volume bounded by `planes` (a point is inside when `n·p >= d` for every plane).
    /// `out` is truncated to `start_index` and the keys appended, returns how many were appended.
    /// Wading through too many removed leaves flags the tree for a rebuild on the next [`finalize`](Self::finalize)
    pub fn get_visible_nodes(&mut self, planes: &[Plane], out: &mut Vec<K>, start_index: usize) -> usize
    {
        let start_time = Instant::now();
        let (num_visible, num_skipped) = collect_leaves(&self.nodes, out, start_index, |extents| classify_aabb(planes, extents));
        let elapsed = start_time.elapsed();
        self.last_visible_query = Some(elapsed);

        if !self.needs_rebuild && self.config.thresholds.too_many_tombstones(num_skipped, num_visible)
        {
            log::debug!("'{}' skipped {} removed leaves for {} visible in {:.3}ms, flagging for rebuild",
                self.config.name, num_skipped, num_visible, elapsed.as_secs_f64() * 1000.0);
            self.needs_rebuild = true;
        }
        num_visible
    }

    pub fn get_overlapping_nodes(&self, query: &AABB, out: &mut Vec<K>, start_index: usize) -> usize
    {
        collect_leaves(&self.nodes, out, start_index, |extents| query.get_intersection(*extents)).0
    }

    pub fn get_sphere_overlapping_nodes(&self, sphere: &Sphere, out: &mut Vec<K>, start_index: usize) -> usize
    {
        collect_leaves(&self.nodes, out, start_index, |extents| sphere.get_intersection(*extents)).0
    }

    // Every pair of live leaves whose boxes overlap, each reported once with the lower slot first
    pub fn get_overlapping_pairs(&self, out: &mut Vec<(K, K)>) -> usize
    {
        let start = out.len();
        for (slot, node) in self.nodes.iter().enumerate()
        {
            let ExternalRef::Node(key) = node.external else { continue };

            let mut index = 0;
            while index < self.nodes.len()
            {
                let other = &self.nodes[index];
                let escape = index + other.escape_offset;
                // subtrees ending at or before `slot` were paired already
                if escape <= slot + 1 || other.is_tombstone() || !other.extents.overlaps(node.extents)
                {
                    index = escape;
                    continue;
                }

                if let ExternalRef::Node(other_key) = other.external
                {
                    out.push((key, other_key));
                }
                index += 1;
            }
        }
        out.len() - start
    }
}

// Walk the whole forest, culling subtrees `classify` rejects and taking subtrees it fully contains wholesale.
// Returns (keys appended, tombstones skipped)
fn collect_leaves<K: Copy>(
    nodes: &[Node<K>],
    out: &mut Vec<K>,
    start_index: usize,
    classify: impl Fn(&AABB) -> Intersection) -> (usize, usize)
{
    debug_assert!(start_index <= out.len(), "Start index {start_index} is past the end of the output ({})", out.len());
    out.truncate(start_index);
    let start_index = out.len();

    let mut num_skipped = 0;
    let mut index = 0;
    while index < nodes.len()
    {
        let node = &nodes[index];
        match node.external
        {
            ExternalRef::Removed =>
            {
                num_skipped += 1;
                index += 1;
            }
            ExternalRef::Node(key) =>
            {
                if classify(&node.extents) != Intersection::None
                {
                    out.push(key);
                }
                index += 1;
            }
            ExternalRef::None => match classify(&node.extents)
            {
                Intersection::None => index += node.escape_offset,
                Intersection::Overlapping => index += 1,
                Intersection::FullyContained =>
                {
                    let escape = index + node.escape_offset;
                    for child in &nodes[(index + 1)..escape]
                    {
                        match child.external
                        {
                            ExternalRef::Node(key) => out.push(key),
                            ExternalRef::Removed => num_skipped += 1,
                            ExternalRef::None => { },
                        }
                    }
                    index = escape;
                }
            },
        }
    }

    (out.len() - start_index, num_skipped)
}
