use std::fmt::{Debug, Formatter};
use glam::{Vec3, Vec4, Vec4Swizzles};
use nab_flatbvh::utils::ShortTypeName;
use crate::{Facing, GetFacing, Intersection, AABB};

// Points with dot(normal, p) >= distance are in front of (inside) the plane
#[derive(Copy, Clone, PartialEq)]
pub struct Plane(pub Vec4);
impl Plane
{
    // An 'invalid' plane with all zero values, primarily for 'fast' initialization
    pub const NULL: Plane = Plane(Vec4::new(0.0, 0.0, 0.0, 0.0));

    #[inline] #[must_use]
    pub const fn new(normal: Vec3, distance: f32) -> Self
    {
        Self(Vec4::new(normal.x, normal.y, normal.z, distance))
    }

    #[inline] #[must_use]
    pub const fn new_raw(x: f32, y: f32, z: f32, d: f32) -> Self { Self(Vec4::new(x, y, z, d)) }

    #[must_use]
    pub fn from_points(a: Vec3, b: Vec3, c: Vec3) -> Self
    {
        let norm = (b - a).cross(c - a).normalize();
        Self(norm.extend(norm.dot(a)))
    }

    #[inline] #[must_use]
    pub fn normal(self) -> Vec3 { self.0.xyz() }
    #[inline] #[must_use]
    pub fn distance(self) -> f32 { self.0.w }

    #[inline] #[must_use]
    pub fn negated_distance(self) -> Self
    {
        Self(Vec4::new(self.0.x, self.0.y, self.0.z, -self.0.w))
    }

    #[inline] #[must_use]
    pub fn normalized(self) -> Self
    {
        let len = self.0.xyz().length_recip();
        Self(self.0 * len)
    }

    #[inline] #[must_use]
    pub fn signed_distance(self, point: Vec3) -> f32
    {
        self.normal().dot(point) - self.distance()
    }

    // corner of the box furthest along the normal (positive vertex)
    #[inline] #[must_use]
    pub fn positive_vertex(self, aabb: &AABB) -> Vec3
    {
        Vec3::select(self.normal().cmpge(Vec3::ZERO), aabb.max, aabb.min)
    }
    // corner of the box furthest against the normal (negative vertex)
    #[inline] #[must_use]
    pub fn negative_vertex(self, aabb: &AABB) -> Vec3
    {
        Vec3::select(self.normal().cmpge(Vec3::ZERO), aabb.min, aabb.max)
    }

    #[inline] #[must_use]
    pub fn is_aabb_outside(self, aabb: &AABB) -> bool
    {
        self.normal().dot(self.positive_vertex(aabb)) < self.distance()
    }
    #[inline] #[must_use]
    pub fn is_aabb_inside(self, aabb: &AABB) -> bool
    {
        self.normal().dot(self.negative_vertex(aabb)) >= self.distance()
    }
}
impl Debug for Plane
{
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result
    {
        f.debug_struct(Self::short_type_name())
            .field("normal", &self.normal())
            .field("distance", &self.distance())
            .finish()
    }
}
impl From<Vec4> for Plane
{
    fn from(value: Vec4) -> Self { Self(value) }
}
impl From<[f32; 4]> for Plane
{
    fn from(value: [f32; 4]) -> Self { Self(Vec4::from_array(value)) }
}
impl From<Plane> for Vec4
{
    fn from(value: Plane) -> Self { value.0 }
}
impl GetFacing<Vec3> for Plane
{
    fn get_facing(&self, other: Vec3) -> Facing
    {
        let d = self.signed_distance(other);
        if d > 0.0 { Facing::InFront }
        else if d == 0.0 { Facing::On }
        else { Facing::Behind }
    }
}

// Classify a box against a convex set of planes
#[must_use]
pub fn classify_aabb(planes: &[Plane], aabb: &AABB) -> Intersection
{
    let mut fully_inside = true;
    for plane in planes
    {
        if plane.is_aabb_outside(aabb)
        {
            return Intersection::None;
        }
        fully_inside &= plane.is_aabb_inside(aabb);
    }
    match fully_inside
    {
        true => Intersection::FullyContained,
        false => Intersection::Overlapping,
    }
}
