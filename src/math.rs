//! Small math helpers on nalgebra types shared by the scene graph,
//! camera and renderer.

use nalgebra::{Matrix4, UnitQuaternion, Vector3, Vector4};

/// Composes translation * rotation * scale into one world matrix.
pub fn trs(
    rotation: &UnitQuaternion<f32>,
    translation: &Vector3<f32>,
    scale: &Vector3<f32>,
) -> Matrix4<f32> {
    Matrix4::new_translation(translation)
        * rotation.to_homogeneous()
        * Matrix4::new_nonuniform_scaling(scale)
}

/// Rotation applied about an arbitrary point instead of the origin.
pub fn rotation_about_point(
    rotation: &UnitQuaternion<f32>,
    origin: &Vector3<f32>,
) -> Matrix4<f32> {
    Matrix4::new_translation(origin)
        * rotation.to_homogeneous()
        * Matrix4::new_translation(&-origin)
}

/// Transforms a point through a matrix in homogeneous coordinates and
/// divides by w, so the result stays correct under any affine composition.
pub fn transform_point(m: &Matrix4<f32>, p: &Vector3<f32>) -> Vector3<f32> {
    let out = m * Vector4::new(p.x, p.y, p.z, 1.0);
    Vector3::new(out.x / out.w, out.y / out.w, out.z / out.w)
}

/// Rotates a point by a quaternion through homogeneous coordinates.
pub fn rotate_point(q: &UnitQuaternion<f32>, p: &Vector3<f32>) -> Vector3<f32> {
    transform_point(&q.to_homogeneous(), p)
}

/// Angle between two vectors in radians.
pub fn angle_between(a: &Vector3<f32>, b: &Vector3<f32>) -> f32 {
    a.angle(b)
}

/// Right-handed perspective projection. A `None` far plane produces an
/// infinite projection so arbitrarily distant geometry still rasterizes.
pub fn perspective(fovy: f32, aspect: f32, near: f32, far: Option<f32>) -> Matrix4<f32> {
    let f = 1.0 / (fovy / 2.0).tan();
    let mut out = Matrix4::zeros();
    out[(0, 0)] = f / aspect;
    out[(1, 1)] = f;
    out[(3, 2)] = -1.0;
    match far {
        Some(far) => {
            let nf = 1.0 / (near - far);
            out[(2, 2)] = (far + near) * nf;
            out[(2, 3)] = 2.0 * far * near * nf;
        }
        None => {
            out[(2, 2)] = -1.0;
            out[(2, 3)] = -2.0 * near;
        }
    }
    out
}

/// Look-at view matrix from an eye position toward a target.
pub fn look_at(eye: &Vector3<f32>, target: &Vector3<f32>, up: &Vector3<f32>) -> Matrix4<f32> {
    Matrix4::look_at_rh(&(*eye).into(), &(*target).into(), up)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn rotation_about_point_fixes_the_point() {
        let q = UnitQuaternion::from_axis_angle(&Vector3::y_axis(), FRAC_PI_2);
        let origin = Vector3::new(3.0, -1.0, 2.0);
        let m = rotation_about_point(&q, &origin);
        let moved = transform_point(&m, &origin);
        assert_relative_eq!(moved, origin, epsilon = 1e-5);
    }

    #[test]
    fn rotation_about_origin_matches_plain_rotation() {
        let q = UnitQuaternion::from_axis_angle(&Vector3::x_axis(), 0.7);
        let p = Vector3::new(1.0, 2.0, 3.0);
        let a = transform_point(&rotation_about_point(&q, &Vector3::zeros()), &p);
        let b = rotate_point(&q, &p);
        assert_relative_eq!(a, b, epsilon = 1e-6);
    }

    #[test]
    fn infinite_perspective_keeps_near_geometry() {
        let m = perspective(FRAC_PI_2, 1.0, 1.0, None);
        // A point on the near plane maps to z/w = -1.
        let p = m * Vector4::new(0.0, 0.0, -1.0, 1.0);
        assert_relative_eq!(p.z / p.w, -1.0, epsilon = 1e-5);
        // Very distant points approach z/w = 1 without overshooting.
        let far = m * Vector4::new(0.0, 0.0, -1e7, 1.0);
        assert!(far.z / far.w <= 1.0);
        assert!(far.z / far.w > 0.999);
    }
}
