use std::fmt::{Debug, Formatter};
use glam::{Mat4, Vec3};
use nab_flatbvh::utils::ShortTypeName;
use crate::{classify_aabb, Facing, GetFacing, Intersection, Intersects, Plane, AABB};

#[derive(Clone, PartialEq)]
pub struct Frustum
{
    pub planes: [Plane; 6], // ordered left, right, top, bottom, near, far
}
impl Frustum
{
    pub const NULL: Frustum = Frustum { planes: [Plane::NULL; 6] }; // an invalid frustum acting as a placeholder

    // if input is projection, planes are in view space
    // if view projection, planes are in world space
    // if model view projection, planes are in model space
    // expects a [0, 1] depth range (glam's *_lh/*_rh perspective)
    #[must_use]
    pub fn from_matrix(col_major_mtx: &Mat4) -> Self
    {
        let rows = col_major_mtx.transpose(); // glam stores in column-major
        let planes =
        [
            Plane::from(rows.w_axis + rows.x_axis).negated_distance().normalized(), // left
            Plane::from(rows.w_axis - rows.x_axis).negated_distance().normalized(), // right
            Plane::from(rows.w_axis - rows.y_axis).negated_distance().normalized(), // top
            Plane::from(rows.w_axis + rows.y_axis).negated_distance().normalized(), // bottom

            Plane::from(rows.z_axis).negated_distance().normalized(), // near
            Plane::from(rows.w_axis - rows.z_axis).negated_distance().normalized(), // far
        ];
        Self { planes }
    }

    #[inline] #[must_use] pub fn left(&self) -> Plane { self.planes[0] }
    #[inline] #[must_use] pub fn right(&self) -> Plane { self.planes[1] }
    #[inline] #[must_use] pub fn top(&self) -> Plane { self.planes[2] }
    #[inline] #[must_use] pub fn bottom(&self) -> Plane { self.planes[3] }
    #[inline] #[must_use] pub fn near(&self) -> Plane { self.planes[4] }
    #[inline] #[must_use] pub fn far(&self) -> Plane { self.planes[5] }
}
impl Debug for Frustum
{
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result
    {
        f.debug_struct(Self::short_type_name())
            .field("left", &self.left())
            .field("right", &self.right())
            .field("top", &self.top())
            .field("bottom", &self.bottom())
            .field("near", &self.near())
            .field("far", &self.far())
            .finish()
    }
}
impl Intersects<Vec3> for Frustum
{
    fn get_intersection(&self, other: Vec3) -> Intersection
    {
        match self.planes.iter().all(|p| p.get_facing(other) != Facing::Behind)
        {
            true => Intersection::FullyContained,
            false => Intersection::None,
        }
    }
}
impl Intersects<AABB> for Frustum
{
    fn get_intersection(&self, other: AABB) -> Intersection
    {
        classify_aabb(&self.planes, &other)
    }
}
