//! Phong shading materials.

/// Reflection coefficients and phong exponent used by the shaded pass.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Material {
    /// Ambient reflection coefficient in [0, 1].
    pub k_amb: f32,
    /// Diffuse reflection coefficient in [0, 1].
    pub k_dif: f32,
    /// Specular reflection coefficient in [0, 1].
    pub k_spe: f32,
    /// Phong exponent.
    pub shininess: f32,
}

impl Material {
    /// Ambient-only material. Used for light sources, connectors, orbit
    /// rings and background stars.
    pub const AMBIENT: Material = Material {
        k_amb: 1.0,
        k_dif: 0.0,
        k_spe: 0.0,
        shininess: 0.0,
    };

    /// Full phong material for shaded bodies.
    pub const SHADED: Material = Material {
        k_amb: 0.1,
        k_dif: 1.0,
        k_spe: 0.2,
        shininess: 40.0,
    };
}
