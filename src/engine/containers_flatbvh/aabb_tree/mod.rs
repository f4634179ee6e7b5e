//! A dynamic bounding volume hierarchy stored as one flat array.
//!
//! Nodes are laid out depth-first. A container is followed by its whole subtree and records its
//! size as an `escape_offset`, so skipping a subtree is a single add. Leaves always have an offset of 1.
//! The store is a forest: after a rebuild there is a single root, and leaves added since then sit
//! after it as extra top-level entries until the next rebuild.
//!
//! Edits are cheap and only flag maintenance; call [`AabbTree::finalize`] once per step
//! before querying to refit or rebuild.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt::{Debug, Formatter};
use std::hash::{BuildHasherDefault, Hash};
use std::sync::Arc;
use std::time::Duration;
use metrohash::MetroHash64;
use smallvec::SmallVec;
use math_flatbvh::AABB;
use nab_flatbvh::utils::ShortTypeName;
use crate::{NodeIndex, NodePool};

mod config;
pub use config::*;

mod error;
pub use error::*;

mod maintenance;
pub use maintenance::*;

mod partition;
pub use partition::SplitKey;

mod queries;

pub use ray_test::*;


pub trait TreeKey: Copy + Eq + Hash + Debug { }
impl<T: Copy + Eq + Hash + Debug> TreeKey for T { }

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExternalRef<K>
{
    None, // container
    Removed, // tombstone, dropped on the next rebuild
    Node(K),
}

#[derive(Clone, Copy, PartialEq)]
pub struct Node<K>
{
    extents: AABB,
    escape_offset: usize,
    external: ExternalRef<K>,
}
impl<K: Copy> Node<K>
{
    #[inline] #[must_use]
    pub const fn cleared() -> Self
    {
        Self
        {
            extents: AABB::EMPTY,
            escape_offset: 1,
            external: ExternalRef::None,
        }
    }

    #[inline] #[must_use] pub fn extents(&self) -> AABB { self.extents }
    #[inline] #[must_use] pub fn escape_offset(&self) -> usize { self.escape_offset }
    #[inline] #[must_use] pub fn external(&self) -> ExternalRef<K> { self.external }

    #[inline] #[must_use] pub fn is_leaf(&self) -> bool { matches!(self.external, ExternalRef::Node(_)) }
    #[inline] #[must_use] pub fn is_tombstone(&self) -> bool { matches!(self.external, ExternalRef::Removed) }
    #[inline] #[must_use] pub fn is_container(&self) -> bool { matches!(self.external, ExternalRef::None) }

    #[inline] #[must_use]
    pub fn key(&self) -> Option<K>
    {
        match self.external
        {
            ExternalRef::Node(key) => Some(key),
            _ => None,
        }
    }

    pub(crate) fn reset_leaf(&mut self, key: K, extents: AABB)
    {
        self.extents = extents;
        self.escape_offset = 1;
        self.external = ExternalRef::Node(key);
    }

    pub(crate) fn reset_container(&mut self, extents: AABB, escape_offset: usize)
    {
        debug_assert!(escape_offset > 1, "Containers must hold at least one child");
        self.extents = extents;
        self.escape_offset = escape_offset;
        self.external = ExternalRef::None;
    }

    pub(crate) fn clear(&mut self)
    {
        *self = Self::cleared();
    }
}
impl<K: Debug> Debug for Node<K>
{
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result
    {
        match &self.external
        {
            ExternalRef::None => f.write_fmt(format_args!("[+{}] {:?}", self.escape_offset, self.extents)),
            ExternalRef::Removed => f.write_str("(Removed)"),
            ExternalRef::Node(key) => f.write_fmt(format_args!("(Leaf) {:?} value: {key:?}", self.extents)),
        }
    }
}

type SlotMap<K> = HashMap<K, NodeIndex, BuildHasherDefault<MetroHash64>>;

pub struct AabbTree<K: TreeKey>
{
    config: AabbTreeConfig,
    pool: Arc<NodePool<K>>,

    nodes: Vec<Node<K>>, // everything past the last slot goes back to the pool
    slots: SlotMap<K>,

    num_external_nodes: usize, // live leaves
    num_tombstones: usize,
    num_adds: usize,
    num_updates: usize,
    start_update: usize, // dirty slot range, empty when start >= end
    end_update: usize,

    needs_rebuild: bool,
    needs_rebound: bool,

    last_rebuild: Option<RebuildStats>,
    last_visible_query: Option<Duration>,
}
impl<K: TreeKey> AabbTree<K>
{
    #[must_use]
    pub fn new(config: AabbTreeConfig) -> Self
    {
        Self::with_pool(config, Arc::new(NodePool::default()))
    }

    #[must_use]
    pub fn with_pool(config: AabbTreeConfig, pool: Arc<NodePool<K>>) -> Self
    {
        Self
        {
            config,
            pool,
            nodes: Vec::new(),
            slots: SlotMap::default(),
            num_external_nodes: 0,
            num_tombstones: 0,
            num_adds: 0,
            num_updates: 0,
            start_update: usize::MAX,
            end_update: 0,
            needs_rebuild: false,
            needs_rebound: false,
            last_rebuild: None,
            last_visible_query: None,
        }
    }

    #[inline] #[must_use] pub fn config(&self) -> &AabbTreeConfig { &self.config }
    #[inline] #[must_use] pub fn pool(&self) -> &Arc<NodePool<K>> { &self.pool }

    #[inline] #[must_use] pub fn get_num_leaves(&self) -> usize { self.num_external_nodes }
    #[inline] #[must_use] pub fn get_num_tombstones(&self) -> usize { self.num_tombstones }
    #[inline] #[must_use] pub fn is_empty(&self) -> bool { self.num_external_nodes == 0 }
    // one past the last used slot
    #[inline] #[must_use] pub fn end_node(&self) -> usize { self.nodes.len() }
    #[inline] #[must_use] pub fn get_nodes(&self) -> &[Node<K>] { &self.nodes }
    #[inline] #[must_use] pub fn get_root_node(&self) -> Option<&Node<K>> { self.nodes.first() }
    #[inline] #[must_use] pub fn last_rebuild(&self) -> Option<RebuildStats> { self.last_rebuild }
    /// How long the most recent [`get_visible_nodes`](Self::get_visible_nodes) took
    #[inline] #[must_use] pub fn last_visible_query(&self) -> Option<Duration> { self.last_visible_query }

    #[inline] #[must_use] pub fn contains(&self, key: K) -> bool { self.slots.contains_key(&key) }

    #[must_use]
    pub fn get_leaf_extents(&self, key: K) -> Option<AABB>
    {
        let slot = self.slots.get(&key)?;
        self.nodes.get(slot.0).map(|n| n.extents)
    }

    // Union of all top-level entries, None when the tree holds nothing
    #[must_use]
    pub fn get_extents(&self) -> Option<AABB>
    {
        let mut extents = AABB::EMPTY;
        let mut any = false;
        let mut index = 0;
        while index < self.nodes.len()
        {
            let node = &self.nodes[index];
            if !node.is_tombstone()
            {
                extents.union_with(node.extents);
                any = true;
            }
            index += node.escape_offset;
        }
        any.then_some(extents)
    }

    pub fn add(&mut self, key: K, extents: AABB) -> Result<(), TreeError>
    {
        let slot = self.nodes.len();
        match self.slots.entry(key)
        {
            Entry::Occupied(existing) =>
            {
                return Err(TreeError::AlreadyTracked { slot: existing.get().0 });
            }
            Entry::Vacant(vacant) =>
            {
                vacant.insert(NodeIndex::some(slot));
            }
        }

        let mut node = self.pool.allocate();
        node.reset_leaf(key, extents);
        self.nodes.push(node);

        self.num_adds += 1;
        self.num_external_nodes += 1;
        if !self.needs_rebuild && self.config.thresholds.rebuild_after_adds(self.num_adds, self.num_external_nodes)
        {
            self.needs_rebuild = true;
        }
        Ok(())
    }

    pub fn remove(&mut self, key: K) -> Result<(), TreeError>
    {
        let slot = self.slot_of(key)?;

        if self.num_external_nodes > 1
        {
            self.nodes[slot].external = ExternalRef::Removed;
            self.slots.remove(&key);
            self.num_external_nodes -= 1;
            self.num_tombstones += 1;
        }
        else
        {
            self.clear();
        }
        Ok(())
    }

    pub fn update(&mut self, key: K, extents: AABB) -> Result<(), TreeError>
    {
        if !self.slots.contains_key(&key)
        {
            return self.add(key, extents);
        }
        let slot = self.slot_of(key)?;

        let node = &mut self.nodes[slot];
        if node.extents.fully_contains(extents)
        {
            // a pending rebuild recomputes every container, so the tighter box is safe to take
            if self.needs_rebuild { node.extents = extents; }
            return Ok(());
        }
        node.extents = extents;

        if self.needs_rebuild || self.nodes.len() <= 1
        {
            return Ok(());
        }

        self.num_updates += 1;
        self.start_update = self.start_update.min(slot);
        self.end_update = self.end_update.max(slot + 1);

        let thresholds = self.config.thresholds;
        if !self.needs_rebound
        {
            if thresholds.rebound_after_updates(self.num_updates, self.num_external_nodes)
            {
                self.needs_rebound = true;
            }
            else if let Some(parent) = self.find_parent(slot).get()
            {
                self.needs_rebound = !self.nodes[parent].extents.fully_contains(extents);
            }
        }
        else if thresholds.rebuild_after_updates(self.num_updates, self.num_external_nodes)
        {
            self.needs_rebuild = true;
        }
        Ok(())
    }

    // Drop every node back into the pool
    pub fn clear(&mut self)
    {
        self.pool.release_all(self.nodes.drain(..));
        self.slots.clear();
        self.num_external_nodes = 0;
        self.num_tombstones = 0;
        self.num_adds = 0;
        self.num_updates = 0;
        self.needs_rebuild = false;
        self.needs_rebound = false;
        self.reset_update_range();
    }

    fn slot_of(&self, key: K) -> Result<usize, TreeError>
    {
        let slot = self.slots.get(&key).ok_or(TreeError::Untracked)?.0;
        match self.nodes.get(slot)
        {
            Some(node) if node.external == ExternalRef::Node(key) => Ok(slot),
            _ =>
            {
                debug_assert!(false, "{:?} is mapped to slot {slot} which doesn't hold it", key);
                Err(TreeError::SlotMismatch { slot })
            }
        }
    }

    fn reset_update_range(&mut self)
    {
        self.start_update = usize::MAX;
        self.end_update = 0;
    }

    // Nearest container whose subtree covers `slot`, none for top-level entries
    fn find_parent(&self, slot: usize) -> NodeIndex
    {
        let mut top = 0;
        loop
        {
            let escape = top + self.nodes[top].escape_offset;
            if escape > slot { break; }
            top = escape;
        }

        for index in (top..slot).rev()
        {
            if index + self.nodes[index].escape_offset > slot
            {
                return NodeIndex::some(index);
            }
        }
        NodeIndex::none()
    }

    // Check the store's structure: escape offsets, leaf containment (once finalized), and bookkeeping
    pub fn validate(&self) -> Result<(), ValidationError>
    {
        let end = self.nodes.len();
        let check_containment = !self.needs_finalize();

        let mut live = 0;
        let mut tombstones = 0;
        let mut ancestors: SmallVec<[usize; 16]> = SmallVec::new();
        for (index, node) in self.nodes.iter().enumerate()
        {
            while ancestors.last().is_some_and(|&a| a + self.nodes[a].escape_offset <= index)
            {
                ancestors.pop();
            }

            let escape = index + node.escape_offset;
            let overruns_parent = ancestors.last().is_some_and(|&a| escape > a + self.nodes[a].escape_offset);
            if node.escape_offset == 0 || escape > end || overruns_parent
            {
                return Err(ValidationError::EscapeOutOfRange { slot: index, escape_offset: node.escape_offset });
            }

            match node.external
            {
                ExternalRef::None => ancestors.push(index),
                ExternalRef::Removed =>
                {
                    if node.escape_offset != 1
                    {
                        return Err(ValidationError::BadLeafOffset { slot: index, escape_offset: node.escape_offset });
                    }
                    tombstones += 1;
                }
                ExternalRef::Node(key) =>
                {
                    if node.escape_offset != 1
                    {
                        return Err(ValidationError::BadLeafOffset { slot: index, escape_offset: node.escape_offset });
                    }
                    if self.slots.get(&key).copied() != Some(NodeIndex::some(index))
                    {
                        return Err(ValidationError::HandleMismatch { slot: index });
                    }
                    if check_containment
                    {
                        if let Some(&container) = ancestors.iter().find(|&&a| !self.nodes[a].extents.fully_contains(node.extents))
                        {
                            return Err(ValidationError::NotContained { container, leaf: index });
                        }
                    }
                    live += 1;
                }
            }
        }

        if live != self.num_external_nodes || live != self.slots.len()
        {
            return Err(ValidationError::LeafCountMismatch { expected: self.num_external_nodes, found: live });
        }
        if tombstones != self.num_tombstones
        {
            return Err(ValidationError::TombstoneCountMismatch { expected: self.num_tombstones, found: tombstones });
        }
        Ok(())
    }
}
impl<K: TreeKey> Drop for AabbTree<K>
{
    fn drop(&mut self)
    {
        self.pool.release_all(self.nodes.drain(..));
    }
}
impl<K: TreeKey> Debug for AabbTree<K>
{
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result
    {
        f.write_fmt(format_args!("{} '{}' ({} leaves, {} nodes, {} removed)",
            Self::short_type_name(),
            self.config.name,
            self.num_external_nodes,
            self.nodes.len(),
            self.num_tombstones))?;

        let mut subtree_ends: SmallVec<[usize; 16]> = SmallVec::new();
        for (index, node) in self.nodes.iter().enumerate()
        {
            while subtree_ends.last().is_some_and(|&end| end <= index)
            {
                subtree_ends.pop();
            }

            if f.alternate()
            {
                f.write_fmt(format_args!("\n{index:3}  "))?;
            }
            else
            {
                f.write_str("\n  ")?;
            }
            for i in 0..subtree_ends.len()
            {
                f.write_str([" ┗━ ", "━━ "][i.min(1)])?;
            }
            Debug::fmt(node, f)?;

            if node.is_container()
            {
                subtree_ends.push(index + node.escape_offset);
            }
        }
        Ok(())
    }
}
