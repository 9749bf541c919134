//! # Bar Picking
//!
//! Pointer ray-casting against the bar field. The core is a set of pure
//! functions over plain inputs (normalized pointer coordinates, camera pose,
//! bar extents) so hover resolution is testable without a window or GPU;
//! translating window events into those inputs is the application's job.
//!
//! ## How it works
//!
//! 1. **Pointer to NDC**: map viewport pixels to normalized device coords
//! 2. **NDC to Ray**: unproject near/far plane points into a world-space ray
//! 3. **Ray vs Extents**: slab-test the ray against every bar's box and keep
//!    the nearest hit

use cgmath::{
    perspective, ElementWise, EuclideanSpace, InnerSpace, Matrix4, Point3, SquareMatrix, Vector3,
    Vector4, Zero,
};

use crate::gfx::camera::orbit_camera::OrbitCamera;

/// Flat bars keep a hit slab this tall so zero-valued data stays hoverable.
pub const MIN_HIT_HEIGHT: f32 = 0.05;

/// A 3D ray for intersection testing.
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    /// Ray origin point in world space
    pub origin: Vector3<f32>,
    /// Ray direction (normalized)
    pub direction: Vector3<f32>,
}

impl Ray {
    pub fn new(origin: Vector3<f32>, direction: Vector3<f32>) -> Self {
        Self {
            origin,
            direction: direction.normalize(),
        }
    }
}

/// Axis-aligned bounding box for intersection testing.
#[derive(Debug, Clone, Copy)]
pub struct Aabb {
    pub min: Vector3<f32>,
    pub max: Vector3<f32>,
}

impl Aabb {
    pub fn new(min: Vector3<f32>, max: Vector3<f32>) -> Self {
        Self { min, max }
    }

    /// Create an AABB wrapping a set of vertices.
    pub fn from_vertices(vertices: &[[f32; 3]]) -> Self {
        if vertices.is_empty() {
            return Self::new(Vector3::zero(), Vector3::zero());
        }

        let mut min = Vector3::new(vertices[0][0], vertices[0][1], vertices[0][2]);
        let mut max = min;

        for vertex in vertices.iter().skip(1) {
            let v = Vector3::new(vertex[0], vertex[1], vertex[2]);
            min.x = min.x.min(v.x);
            min.y = min.y.min(v.y);
            min.z = min.z.min(v.z);
            max.x = max.x.max(v.x);
            max.y = max.y.max(v.y);
            max.z = max.z.max(v.z);
        }

        Self::new(min, max)
    }

    /// Slab-test a ray against the box.
    /// Returns the distance to the entry point, or None if no intersection.
    pub fn intersect_ray(&self, ray: &Ray) -> Option<f32> {
        let inv_dir = Vector3::new(
            1.0 / ray.direction.x,
            1.0 / ray.direction.y,
            1.0 / ray.direction.z,
        );

        let t_min = (self.min - ray.origin).mul_element_wise(inv_dir);
        let t_max = (self.max - ray.origin).mul_element_wise(inv_dir);

        let t1 = Vector3::new(
            t_min.x.min(t_max.x),
            t_min.y.min(t_max.y),
            t_min.z.min(t_max.z),
        );
        let t2 = Vector3::new(
            t_min.x.max(t_max.x),
            t_min.y.max(t_max.y),
            t_min.z.max(t_max.z),
        );

        let t_near = t1.x.max(t1.y.max(t1.z));
        let t_far = t2.x.min(t2.y.min(t2.z));

        if t_near <= t_far && t_far >= 0.0 {
            Some(if t_near >= 0.0 { t_near } else { t_far })
        } else {
            None
        }
    }

    /// Apply a transformation matrix to the AABB.
    pub fn transform(&self, matrix: &Matrix4<f32>) -> Self {
        let corners = [
            Vector3::new(self.min.x, self.min.y, self.min.z),
            Vector3::new(self.max.x, self.min.y, self.min.z),
            Vector3::new(self.min.x, self.max.y, self.min.z),
            Vector3::new(self.min.x, self.min.y, self.max.z),
            Vector3::new(self.max.x, self.max.y, self.min.z),
            Vector3::new(self.max.x, self.min.y, self.max.z),
            Vector3::new(self.min.x, self.max.y, self.max.z),
            Vector3::new(self.max.x, self.max.y, self.max.z),
        ];

        let mut transformed_corners = Vec::with_capacity(8);
        for corner in &corners {
            let homogeneous = Vector4::new(corner.x, corner.y, corner.z, 1.0);
            let transformed = matrix * homogeneous;
            transformed_corners.push([
                transformed.x / transformed.w,
                transformed.y / transformed.w,
                transformed.z / transformed.w,
            ]);
        }

        Self::from_vertices(&transformed_corners)
    }
}

/// Result of a pick against the bar field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickResult {
    /// Index of the hit bar in the descriptor order
    pub bar_index: usize,
    /// Distance from the ray origin to the entry point
    pub distance: f32,
}

/// Convert viewport pixel coordinates to normalized device coordinates,
/// with Y flipped so +Y is up.
pub fn screen_to_ndc(position: (f32, f32), viewport: (f32, f32)) -> (f32, f32) {
    let ndc_x = (2.0 * position.0) / viewport.0 - 1.0;
    let ndc_y = 1.0 - (2.0 * position.1) / viewport.1;
    (ndc_x, ndc_y)
}

/// Build a world-space ray through a normalized device coordinate.
///
/// Unprojects the near and far plane points through the inverse
/// view-projection; the clip-space convention cancels out, so the plain
/// perspective matrix is used here.
pub fn pointer_ray(ndc: (f32, f32), camera: &OrbitCamera) -> Ray {
    let view_proj = pointer_view_projection(camera);
    let inv_view_proj = view_proj.invert().unwrap_or_else(Matrix4::identity);

    let near_point = Vector4::new(ndc.0, ndc.1, -1.0, 1.0);
    let far_point = Vector4::new(ndc.0, ndc.1, 1.0, 1.0);

    let world_near = inv_view_proj * near_point;
    let world_far = inv_view_proj * far_point;

    let near_3d = Vector3::new(
        world_near.x / world_near.w,
        world_near.y / world_near.w,
        world_near.z / world_near.w,
    );
    let far_3d = Vector3::new(
        world_far.x / world_far.w,
        world_far.y / world_far.w,
        world_far.z / world_far.w,
    );

    Ray::new(near_3d, far_3d - near_3d)
}

fn pointer_view_projection(camera: &OrbitCamera) -> Matrix4<f32> {
    let eye = Point3::from_vec(camera.eye);
    let target = Point3::from_vec(camera.target);
    let view = Matrix4::look_at_rh(eye, target, camera.up);
    let proj = perspective(camera.fovy, camera.aspect, camera.znear, camera.zfar);
    proj * view
}

/// World-space extent of one bar: a square footprint centered on the bar's
/// position, rising from the ground to the given height.
pub fn bar_extent(center: Vector3<f32>, footprint: f32, height: f32) -> Aabb {
    let half = footprint * 0.5;
    Aabb::new(
        Vector3::new(center.x - half, center.y - half, center.z),
        Vector3::new(
            center.x + half,
            center.y + half,
            center.z + height.max(MIN_HIT_HEIGHT),
        ),
    )
}

/// Find the nearest bar the ray passes through, if any.
///
/// Ties go to the lower index so hover resolution is deterministic.
pub fn pick_nearest(ray: &Ray, extents: &[Aabb]) -> Option<PickResult> {
    let mut closest: Option<PickResult> = None;

    for (i, extent) in extents.iter().enumerate() {
        if let Some(distance) = extent.intersect_ray(ray) {
            if closest.map_or(true, |hit| distance < hit.distance) {
                closest = Some(PickResult {
                    bar_index: i,
                    distance,
                });
            }
        }
    }

    closest
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chart_camera() -> OrbitCamera {
        OrbitCamera::new(15.0, 0.5, 0.3, Vector3::new(0.0, 0.0, 2.0), 1.6)
    }

    #[test]
    fn aabb_bounds_wrap_all_vertices() {
        let vertices = vec![[0.0, 0.0, 0.0], [1.0, 1.0, 1.0], [-1.0, -1.0, -1.0]];
        let aabb = Aabb::from_vertices(&vertices);

        assert_eq!(aabb.min, Vector3::new(-1.0, -1.0, -1.0));
        assert_eq!(aabb.max, Vector3::new(1.0, 1.0, 1.0));
    }

    #[test]
    fn ray_hits_and_misses_the_box() {
        let aabb = Aabb::new(Vector3::new(-1.0, -1.0, -1.0), Vector3::new(1.0, 1.0, 1.0));

        let ray = Ray::new(Vector3::new(0.0, 0.0, -5.0), Vector3::new(0.0, 0.0, 1.0));
        assert!(aabb.intersect_ray(&ray).is_some());

        let ray_miss = Ray::new(Vector3::new(5.0, 0.0, -5.0), Vector3::new(0.0, 0.0, 1.0));
        assert!(aabb.intersect_ray(&ray_miss).is_none());
    }

    #[test]
    fn ray_starting_inside_reports_the_exit_distance() {
        let aabb = Aabb::new(Vector3::new(-1.0, -1.0, -1.0), Vector3::new(1.0, 1.0, 1.0));
        let ray = Ray::new(Vector3::zero(), Vector3::new(1.0, 0.0, 0.0));

        let t = aabb.intersect_ray(&ray).unwrap();
        assert!((t - 1.0).abs() < 1e-5);
    }

    #[test]
    fn transform_moves_the_bounds() {
        let aabb = Aabb::new(Vector3::new(-0.5, -0.5, 0.0), Vector3::new(0.5, 0.5, 1.0));
        let moved = aabb.transform(&Matrix4::from_translation(Vector3::new(3.0, 0.0, 0.0)));

        assert!((moved.min.x - 2.5).abs() < 1e-5);
        assert!((moved.max.x - 3.5).abs() < 1e-5);
        assert!((moved.max.z - 1.0).abs() < 1e-5);
    }

    #[test]
    fn ndc_mapping_covers_the_viewport() {
        assert_eq!(screen_to_ndc((400.0, 300.0), (800.0, 600.0)), (0.0, 0.0));
        assert_eq!(screen_to_ndc((0.0, 0.0), (800.0, 600.0)), (-1.0, 1.0));
        assert_eq!(screen_to_ndc((800.0, 600.0), (800.0, 600.0)), (1.0, -1.0));
    }

    #[test]
    fn center_ray_aims_at_the_camera_target() {
        let camera = chart_camera();
        let ray = pointer_ray((0.0, 0.0), &camera);

        let toward_target = (camera.target - camera.eye).normalize();
        assert!(ray.direction.dot(toward_target) > 0.999);
        // Origin sits on the near plane, just ahead of the eye.
        assert!((ray.origin - camera.eye).magnitude() < 0.2);
    }

    #[test]
    fn nearest_hit_beats_slice_order() {
        let far = Aabb::new(Vector3::new(-1.0, 9.0, 0.0), Vector3::new(1.0, 11.0, 2.0));
        let near = Aabb::new(Vector3::new(-1.0, 4.0, 0.0), Vector3::new(1.0, 6.0, 2.0));
        let ray = Ray::new(Vector3::new(0.0, 0.0, 1.0), Vector3::new(0.0, 1.0, 0.0));

        let hit = pick_nearest(&ray, &[far, near]).unwrap();
        assert_eq!(hit.bar_index, 1);
        assert!((hit.distance - 4.0).abs() < 1e-5);
    }

    #[test]
    fn pointer_over_a_bar_resolves_that_bar_only() {
        let camera = chart_camera();
        // Three bars on X at step 1.5, heights 5 / 10 / 2.5.
        let extents = [
            bar_extent(Vector3::new(-1.5, 0.0, 0.0), 1.0, 5.0),
            bar_extent(Vector3::new(0.0, 0.0, 0.0), 1.0, 10.0),
            bar_extent(Vector3::new(1.5, 0.0, 0.0), 1.0, 2.5),
        ];

        // Project the middle bar's mid-height point through the same
        // matrices the pointer ray uses.
        let view_proj = pointer_view_projection(&camera);
        let clip = view_proj * Vector4::new(0.0, 0.0, 2.0, 1.0);
        let ndc = (clip.x / clip.w, clip.y / clip.w);

        let ray = pointer_ray(ndc, &camera);
        let hit = pick_nearest(&ray, &extents).unwrap();
        assert_eq!(hit.bar_index, 1);
    }

    #[test]
    fn empty_sky_returns_no_hit() {
        let extents = [
            bar_extent(Vector3::new(-1.5, 0.0, 0.0), 1.0, 5.0),
            bar_extent(Vector3::new(0.0, 0.0, 0.0), 1.0, 10.0),
        ];
        let ray = Ray::new(Vector3::new(0.0, 0.0, 20.0), Vector3::new(0.0, 0.0, 1.0));

        assert!(pick_nearest(&ray, &extents).is_none());
    }

    #[test]
    fn flat_bars_keep_a_thin_hit_slab() {
        let extent = bar_extent(Vector3::new(2.0, 0.0, 0.0), 1.0, 0.0);
        assert!((extent.max.z - extent.min.z - MIN_HIT_HEIGHT).abs() < 1e-6);

        let ray = Ray::new(Vector3::new(2.0, 0.0, 5.0), Vector3::new(0.0, 0.0, -1.0));
        assert!(extent.intersect_ray(&ray).is_some());
    }
}
