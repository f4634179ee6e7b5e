use math_flatbvh::AABB;
use super::LEAF_GROUP_SIZE;

// ranges this small get insertion sorted
const INSERTION_SORT_THRESHOLD: usize = 8;

#[derive(Debug, Clone, Copy)]
pub(crate) struct BuildLeaf<K>
{
    pub key: K,
    pub extents: AABB,
}

/// Sort key used to order leaves around a split. Uses doubled box centers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitKey
{
    X,
    Y,
    Z,
    XPlusZ,
    XMinusZ,
}
impl SplitKey
{
    pub const ALL: [SplitKey; 5] = [Self::X, Self::Y, Self::Z, Self::XPlusZ, Self::XMinusZ];
    // cycled by depth for standard builds
    pub const STANDARD_AXES: [SplitKey; 3] = [Self::X, Self::Z, Self::Y];

    #[inline] #[must_use]
    pub fn of(self, extents: &AABB) -> f32
    {
        let c = extents.min + extents.max;
        match self
        {
            Self::X => c.x,
            Self::Y => c.y,
            Self::Z => c.z,
            Self::XPlusZ => c.x + c.z,
            Self::XMinusZ => c.x - c.z,
        }
    }
}

// Alternate axes, and direction, at each level so neighboring leaf groups stay spatially adjacent
pub(crate) fn sort_leaves<K: Copy>(leaves: &mut [BuildLeaf<K>])
{
    sort_recursive(leaves, 0);
}

fn sort_recursive<K: Copy>(leaves: &mut [BuildLeaf<K>], depth: usize)
{
    let split = leaves.len() / 2;
    let axis = SplitKey::STANDARD_AXES[depth % 3];
    match depth % 2 == 0
    {
        true => nth_element(leaves, split, |l| axis.of(&l.extents)),
        false => nth_element(leaves, split, |l| -axis.of(&l.extents)),
    }

    let (left, right) = leaves.split_at_mut(split);
    if left.len() > LEAF_GROUP_SIZE { sort_recursive(left, depth + 1); }
    if right.len() > LEAF_GROUP_SIZE { sort_recursive(right, depth + 1); }
}

// Try every split key at each level and keep the one whose halves have the least total surface area
pub(crate) fn sort_leaves_high_quality<K: Copy>(leaves: &mut [BuildLeaf<K>])
{
    let split = leaves.len() / 2;

    let mut best_key = SplitKey::X;
    let mut best_cost = f32::INFINITY;
    for key in SplitKey::ALL
    {
        nth_element(leaves, split, |l| key.of(&l.extents));
        let cost = split_cost(leaves, split);
        if cost < best_cost
        {
            best_cost = cost;
            best_key = key;
        }
    }
    if best_key != SplitKey::ALL[SplitKey::ALL.len() - 1]
    {
        nth_element(leaves, split, |l| best_key.of(&l.extents));
    }

    let (left, right) = leaves.split_at_mut(split);
    if left.len() > LEAF_GROUP_SIZE { sort_leaves_high_quality(left); }
    if right.len() > LEAF_GROUP_SIZE { sort_leaves_high_quality(right); }
}

#[must_use]
pub(crate) fn split_cost<K>(leaves: &[BuildLeaf<K>], split: usize) -> f32
{
    let bounds = |half: &[BuildLeaf<K>]| half.iter().fold(AABB::EMPTY, |acc, l| acc.unioned_with(l.extents));
    bounds(&leaves[..split]).surface_area() + bounds(&leaves[split..]).surface_area()
}

// Quickselect: afterwards no item before `nth` has a greater key and no item after it has a lesser key
pub(crate) fn nth_element<T>(items: &mut [T], nth: usize, key: impl Fn(&T) -> f32)
{
    if nth >= items.len()
    {
        return;
    }

    let mut first = 0;
    let mut last = items.len();
    while last - first > INSERTION_SORT_THRESHOLD
    {
        let pivot = median_of_three(
            key(&items[first]),
            key(&items[(first + last) / 2]),
            key(&items[last - 1]));

        let mut lo = first;
        let mut hi = last;
        loop
        {
            while lo < last - 1 && key(&items[lo]) < pivot { lo += 1; }
            hi -= 1;
            while hi > first && pivot < key(&items[hi]) { hi -= 1; }
            if lo >= hi { break; }
            items.swap(lo, hi);
            lo += 1;
        }

        // no progress, only possible with unordered (NaN) keys
        if lo == first || lo >= last
        {
            break;
        }

        if lo <= nth { first = lo; } else { last = lo; }
    }

    insertion_sort(&mut items[first..last], &key);
}

#[inline]
fn median_of_three(a: f32, b: f32, c: f32) -> f32
{
    if a < b
    {
        if b < c { b } else if a < c { c } else { a }
    }
    else if a < c { a }
    else if b < c { c }
    else { b }
}

fn insertion_sort<T>(items: &mut [T], key: &impl Fn(&T) -> f32)
{
    for i in 1..items.len()
    {
        let mut j = i;
        while j > 0 && key(&items[j]) < key(&items[j - 1])
        {
            items.swap(j, j - 1);
            j -= 1;
        }
    }
}
