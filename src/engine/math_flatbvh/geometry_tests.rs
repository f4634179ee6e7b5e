#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Intersection
{
    None,
    Overlapping,
    FullyContained, // the tested object is entirely inside
}

pub trait Intersects<T>
{
    fn get_intersection(&self, other: T) -> Intersection;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Facing
{
    Behind,
    On,
    InFront,
}

pub trait GetFacing<T>
{
    fn get_facing(&self, other: T) -> Facing;
}
