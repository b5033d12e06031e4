//! First-person camera with a guarded pitch axis.

use nalgebra::{Matrix4, Unit, UnitQuaternion, Vector3};

use crate::config;

/// Orthonormal camera basis. `z` is the viewing direction, `x` points right
/// and `y` up; the basis is rebuilt from `z` and the world up after every
/// rotation so drift cannot accumulate.
#[derive(Clone, Debug)]
pub struct Camera {
    pub position: Vector3<f32>,
    pub world_up: Vector3<f32>,
    pub z: Vector3<f32>,
    pub x: Vector3<f32>,
    pub y: Vector3<f32>,
    pub fov: f32,
}

impl Camera {
    pub fn new(position: Vector3<f32>, forward: Vector3<f32>, world_up: Vector3<f32>, fov: f32) -> Self {
        let mut cam = Self {
            position,
            world_up,
            z: forward,
            x: Vector3::zeros(),
            y: Vector3::zeros(),
            fov,
        };
        cam.recalculate();
        cam
    }

    fn recalculate(&mut self) {
        self.z = self.z.normalize();
        self.x = self.z.cross(&self.world_up).normalize();
        self.y = self.x.cross(&self.z).normalize();
    }

    pub fn view_matrix(&self) -> Matrix4<f32> {
        crate::math::look_at(&self.position, &(self.position + self.z), &self.y)
    }

    /// Pitches the view direction about the camera's right axis. The
    /// rotation is refused whenever it would bring the view within 10
    /// degrees of either pole, so the basis can never flip over.
    pub fn rotate_x(&mut self, rad: f32) {
        let to_up = self.z.dot(&self.world_up).clamp(-1.0, 1.0).acos();
        let to_down = self.z.dot(&-self.world_up).clamp(-1.0, 1.0).acos();
        let away_from_up = to_up > config::GIMBAL_GUARD || rad < 0.0;
        let away_from_down = to_down > config::GIMBAL_GUARD || rad > 0.0;
        if away_from_up && away_from_down {
            let rot = UnitQuaternion::from_axis_angle(&Unit::new_normalize(self.x), rad);
            self.z = rot * self.z;
            self.recalculate();
        }
    }

    /// Points the camera along `forward` and rebuilds the basis.
    pub fn set_forward(&mut self, forward: Vector3<f32>) {
        self.z = forward;
        self.recalculate();
    }

    /// Turns the view direction toward `dir` by at most `max_step` radians.
    /// Returns the angle still remaining afterwards; zero means the camera
    /// now points exactly at `dir`.
    pub fn rotate_toward(&mut self, dir: &Vector3<f32>, max_step: f32) -> f32 {
        let dir = dir.normalize();
        let angle = self.z.dot(&dir).clamp(-1.0, 1.0).acos();
        if angle <= max_step {
            self.set_forward(dir);
            return 0.0;
        }
        // Antiparallel directions leave no unique turn plane; pivot over
        // the current up vector in that case.
        let axis = Unit::try_new(self.z.cross(&dir), 1e-9)
            .unwrap_or_else(|| Unit::new_normalize(self.y));
        self.z = UnitQuaternion::from_axis_angle(&axis, max_step) * self.z;
        self.recalculate();
        angle - max_step
    }

    /// Yaws the view direction about the world up axis. Unguarded.
    pub fn rotate_y(&mut self, rad: f32) {
        let rot = UnitQuaternion::from_axis_angle(&Unit::new_normalize(self.world_up), rad);
        self.z = rot * self.z;
        self.recalculate();
    }

    pub fn move_z(&mut self, dist: f32) {
        self.position += self.z * dist;
    }

    pub fn move_x(&mut self, dist: f32) {
        self.position += self.x * dist;
    }

    pub fn move_y(&mut self, dist: f32) {
        self.position += self.y * dist;
    }
}

/// The six face cameras used to render the shadow cubemap, in the face
/// order +X, -X, +Y, -Y, +Z, -Z. Each covers a quarter turn.
pub fn shadow_rig(position: Vector3<f32>) -> [Camera; 6] {
    let fov = std::f32::consts::FRAC_PI_2;
    let faces = [
        (Vector3::new(1.0, 0.0, 0.0), Vector3::new(0.0, -1.0, 0.0)),
        (Vector3::new(-1.0, 0.0, 0.0), Vector3::new(0.0, -1.0, 0.0)),
        (Vector3::new(0.0, 1.0, 0.0), Vector3::new(0.0, 0.0, 1.0)),
        (Vector3::new(0.0, -1.0, 0.0), Vector3::new(0.0, 0.0, -1.0)),
        (Vector3::new(0.0, 0.0, 1.0), Vector3::new(0.0, -1.0, 0.0)),
        (Vector3::new(0.0, 0.0, -1.0), Vector3::new(0.0, -1.0, 0.0)),
    ];
    faces.map(|(forward, up)| Camera::new(position, forward, up, fov))
}

/// Which movement and rotation inputs are currently held. Polled from the
/// UI layer once per frame.
#[derive(Clone, Copy, Debug, Default)]
pub struct KeyState {
    pub forward: bool,
    pub back: bool,
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
    pub turn_left: bool,
    pub turn_right: bool,
    pub pitch_up: bool,
    pub pitch_down: bool,
}

/// A camera driven by key and mouse input. Mouse deltas accumulate between
/// frames and are consumed by a single `update` call.
pub struct ControllableCamera {
    pub camera: Camera,
    pub keys: KeyState,
    mouse_movement: [f32; 2],
    movement_speed: f32,
    rotation_speed: f32,
    mouse_rotation_speed: f32,
    boost: bool,
}

impl ControllableCamera {
    pub fn new(position: Vector3<f32>, forward: Vector3<f32>) -> Self {
        Self {
            camera: Camera::new(position, forward, Vector3::y(), config::DEFAULT_FOV),
            keys: KeyState::default(),
            mouse_movement: [0.0, 0.0],
            movement_speed: config::MOVEMENT_SPEED,
            rotation_speed: config::ROTATION_SPEED,
            mouse_rotation_speed: config::MOUSE_ROTATION_SPEED,
            boost: false,
        }
    }

    pub fn toggle_boost(&mut self) {
        self.boost = !self.boost;
    }

    pub fn boost_active(&self) -> bool {
        self.boost
    }

    pub fn add_mouse_delta(&mut self, dx: f32, dy: f32) {
        self.mouse_movement[0] -= dx;
        self.mouse_movement[1] -= dy;
    }

    /// Applies the held keys and the accumulated mouse movement for a frame
    /// of `dt` milliseconds, then clears the mouse accumulator.
    pub fn update(&mut self, dt: f32) {
        let speed = dt
            * self.movement_speed
            * if self.boost { config::BOOST_FACTOR } else { 1.0 };
        if self.keys.forward {
            self.camera.move_z(speed);
        }
        if self.keys.back {
            self.camera.move_z(-speed);
        }
        if self.keys.right {
            self.camera.move_x(speed);
        }
        if self.keys.left {
            self.camera.move_x(-speed);
        }
        if self.keys.up {
            self.camera.move_y(speed);
        }
        if self.keys.down {
            self.camera.move_y(-speed);
        }

        let turn = dt * self.rotation_speed;
        if self.keys.turn_left {
            self.camera.rotate_y(turn);
        }
        if self.keys.turn_right {
            self.camera.rotate_y(-turn);
        }
        if self.keys.pitch_up {
            self.camera.rotate_x(turn);
        }
        if self.keys.pitch_down {
            self.camera.rotate_x(-turn);
        }

        self.camera
            .rotate_x(dt * self.mouse_movement[1] * self.mouse_rotation_speed);
        self.camera
            .rotate_y(dt * self.mouse_movement[0] * self.mouse_rotation_speed);
        self.mouse_movement = [0.0, 0.0];
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn basis_stays_orthonormal_after_rotations() {
        let mut cam = Camera::new(
            Vector3::zeros(),
            Vector3::new(0.3, 0.1, -1.0),
            Vector3::y(),
            config::DEFAULT_FOV,
        );
        for i in 0..200 {
            cam.rotate_y(0.01 * (i % 7) as f32);
            cam.rotate_x(0.005);
        }
        assert_relative_eq!(cam.z.norm(), 1.0, epsilon = 1e-4);
        assert_relative_eq!(cam.x.dot(&cam.z), 0.0, epsilon = 1e-4);
        assert_relative_eq!(cam.y.dot(&cam.z), 0.0, epsilon = 1e-4);
        assert_relative_eq!(cam.y.dot(&cam.x), 0.0, epsilon = 1e-4);
    }

    #[test]
    fn pitch_never_reaches_the_poles() {
        let mut cam = Camera::new(
            Vector3::zeros(),
            Vector3::new(0.0, 0.0, -1.0),
            Vector3::y(),
            config::DEFAULT_FOV,
        );
        // The last accepted step can land at most one step inside the guard
        // band, never at the pole itself.
        for _ in 0..10_000 {
            cam.rotate_x(0.05);
        }
        let angle_to_up = cam.z.dot(&Vector3::y()).clamp(-1.0, 1.0).acos();
        assert!(angle_to_up >= config::GIMBAL_GUARD - 0.05 - 1e-3);

        for _ in 0..10_000 {
            cam.rotate_x(-0.05);
        }
        let angle_to_down = cam.z.dot(&-Vector3::y()).clamp(-1.0, 1.0).acos();
        assert!(angle_to_down >= config::GIMBAL_GUARD - 0.05 - 1e-3);
    }

    #[test]
    fn guarded_direction_still_allows_retreat() {
        let mut cam = Camera::new(
            Vector3::zeros(),
            Vector3::new(0.0, 0.0, -1.0),
            Vector3::y(),
            config::DEFAULT_FOV,
        );
        for _ in 0..10_000 {
            cam.rotate_x(0.05);
        }
        let pinned = cam.z;
        cam.rotate_x(0.05);
        assert_eq!(cam.z, pinned);
        cam.rotate_x(-0.05);
        assert_ne!(cam.z, pinned);
    }

    #[test]
    fn rotate_toward_converges_and_reports_remaining_angle() {
        let mut cam = Camera::new(
            Vector3::zeros(),
            Vector3::new(0.0, 0.0, -1.0),
            Vector3::y(),
            config::DEFAULT_FOV,
        );
        let target = Vector3::new(1.0, 0.2, 0.3).normalize();
        let mut remaining = f32::MAX;
        for _ in 0..200 {
            remaining = cam.rotate_toward(&target, 0.05);
            if remaining <= 0.0 {
                break;
            }
        }
        assert_eq!(remaining, 0.0);
        assert_relative_eq!(cam.z.dot(&target), 1.0, epsilon = 1e-4);
    }

    #[test]
    fn mouse_deltas_are_consumed_by_update() {
        let mut cam = ControllableCamera::new(Vector3::zeros(), Vector3::new(0.0, 0.0, -1.0));
        cam.add_mouse_delta(40.0, 0.0);
        let before = cam.camera.z;
        cam.update(16.0);
        let after_first = cam.camera.z;
        assert_ne!(before, after_first);
        // A second update without new deltas must not rotate further.
        cam.update(16.0);
        assert_eq!(cam.camera.z, after_first);
    }

    #[test]
    fn boost_scales_movement_tenfold() {
        let mut cam = ControllableCamera::new(Vector3::zeros(), Vector3::new(0.0, 0.0, -1.0));
        cam.keys.forward = true;
        cam.update(100.0);
        let plain = cam.camera.position.norm();

        let mut boosted = ControllableCamera::new(Vector3::zeros(), Vector3::new(0.0, 0.0, -1.0));
        boosted.keys.forward = true;
        boosted.toggle_boost();
        boosted.update(100.0);
        assert_relative_eq!(boosted.camera.position.norm(), plain * 10.0, epsilon = 1e-3);
    }

    #[test]
    fn shadow_rig_faces_are_orthogonal_quarter_views() {
        let rig = shadow_rig(Vector3::new(1.0, 2.0, 3.0));
        for cam in &rig {
            assert_eq!(cam.fov, std::f32::consts::FRAC_PI_2);
            assert_eq!(cam.position, Vector3::new(1.0, 2.0, 3.0));
            assert_relative_eq!(cam.y.dot(&cam.z), 0.0, epsilon = 1e-6);
        }
        assert_relative_eq!(rig[0].z.dot(&rig[1].z), -1.0);
        assert_relative_eq!(rig[2].z.dot(&rig[3].z), -1.0);
        assert_relative_eq!(rig[4].z.dot(&rig[5].z), -1.0);
    }
}
