//! Tunable constants for rendering, camera handling and the star swap
//! transition, collected in one place.

use std::f32::consts::PI;

/// Near clip distance for the main view. The far plane is unbounded
/// (infinite projection), so distant background stars never clip out.
pub const CLIP_NEAR: f32 = 20.0;

/// Near/far clip used by the shadow cameras. The far value also normalizes
/// depth values into [0, 1] inside the shadow shaders.
pub const SHADOW_CLIP: [f32; 2] = [1.0, 5000.0];

/// Edge length of each shadow cubemap face in pixels.
pub const SHADOW_TEXTURE_SIZE: i32 = 2048;

/// Depth comparison bias against the shadow cubemap, per storage precision.
/// The byte path needs a much larger bias to suppress shadow acne.
pub const SHADOW_BIAS_FLOAT: f32 = 0.00001;
pub const SHADOW_BIAS_BYTE: f32 = 0.003;

/// Scene background clear color.
pub const BACKGROUND_COLOR: [f32; 3] = [10.0 / 255.0, 10.0 / 255.0, 10.0 / 255.0];

/// Camera speeds. Distances per millisecond of frame time.
pub const MOVEMENT_SPEED: f32 = 0.1;
pub const ROTATION_SPEED: f32 = 0.0005;
pub const MOUSE_ROTATION_SPEED: f32 = 0.0002;
pub const BOOST_FACTOR: f32 = 10.0;

/// Rotations that would bring the camera forward vector closer than this to
/// straight up or straight down are rejected.
pub const GIMBAL_GUARD: f32 = PI / 18.0;

/// Default vertical field of view.
pub const DEFAULT_FOV: f32 = PI / 4.0;

/// Default number of segments in a dynamically generated orbit ring.
pub const DEFAULT_ORBIT_SEGMENTS: usize = 100;

/// Background stars outside this half-angle around the camera forward axis
/// are culled from the solid pass.
pub const STAR_CULL_ANGLE: f32 = PI / 4.0;

/// Star swap transition: angular speed of the camera turn and the
/// field-of-view change speed, both per millisecond, plus the minimum fov
/// reached before the scene is rebuilt.
pub const SWAP_TURN_SPEED: f32 = 0.002;
pub const SWAP_FOV_SPEED: f32 = 0.001;
pub const SWAP_MIN_FOV: f32 = 0.01;
