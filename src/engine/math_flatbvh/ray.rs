use glam::Vec3;

// Direction need not be normalized; distances along the ray are factors of `direction`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray
{
    pub origin: Vec3,
    pub direction: Vec3,
    pub max_factor: f32,
}
impl Ray
{
    #[inline] #[must_use]
    pub fn new(origin: Vec3, direction: Vec3) -> Self
    {
        Self { origin, direction, max_factor: f32::INFINITY }
    }

    #[inline] #[must_use]
    pub fn with_max_factor(self, max_factor: f32) -> Self
    {
        Self { max_factor, ..self }
    }

    #[inline] #[must_use]
    pub fn point_at(&self, factor: f32) -> Vec3 { self.origin + self.direction * factor }
}
