mod aabb;
pub use aabb::*;

mod plane;
pub use plane::*;

mod sphere;
pub use sphere::*;

mod frustum;
pub use frustum::*;

mod ray;
pub use ray::*;

mod geometry_tests;
pub use geometry_tests::*;
