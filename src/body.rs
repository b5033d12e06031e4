//! Scene graph of celestial bodies.
//!
//! Bodies live in an arena and reference each other through `BodyId`
//! handles; a body's parent is an optional index into the same arena, so the
//! graph cannot form ownership cycles and `attach` additionally rejects
//! parent chains that would loop. Variant behavior (light source, orbiter,
//! billboarded catalog star, connector segment, orbit ring) is dispatched on
//! `BodyKind` instead of an inheritance chain.
//!
//! Orbits are kinematic: `update` advances the angle of the local position
//! in the XZ plane while the orbital tilt comes entirely from the fixed
//! `rotation_plane` quaternion applied about the attachment point.

use std::f32::consts::PI;

use nalgebra::{Matrix4, Unit, UnitQuaternion, Vector3};

use crate::material::Material;
use crate::math;
use crate::mesh::MeshId;
use crate::texture::Skin;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BodyId(pub usize);

#[derive(Clone, Debug, PartialEq)]
pub enum BodyKind {
    /// The light source of the system, fixed at the origin of its subtree.
    Star,
    /// A planet or moon orbiting its parent.
    Orbiter,
    /// A catalog star billboarded toward the camera.
    BackgroundStar { catalog_index: usize },
    /// A cylinder segment between two bodies. Live connectors track their
    /// endpoints every time the world matrix is requested; orbit-ring
    /// segments have no endpoints and keep a baked axis/angle instead.
    Connector {
        a: Option<BodyId>,
        b: Option<BodyId>,
        inset: f32,
        length: f32,
        axis: Vector3<f32>,
        angle: f32,
    },
    /// A pre-built ring mesh scaled to the orbit radius.
    OrbitRing,
}

/// How an orbiter's path is visualized. Exactly one variant holds at a time.
#[derive(Clone, Debug, PartialEq)]
pub enum OrbitVisual {
    None,
    Static(BodyId),
    Dynamic(Vec<BodyId>),
}

pub struct Body {
    pub kind: BodyKind,
    pub mesh: MeshId,
    pub skin: Option<Skin>,
    /// Position relative to the parent; absolute for bodies without one.
    pub local_position: Vector3<f32>,
    pub scale: Vector3<f32>,
    /// Accumulated self-rotation, integrated by `update`.
    pub rotation_self: UnitQuaternion<f32>,
    /// Fixed tilt of the orbital plane relative to the parent's local axes.
    pub rotation_plane: UnitQuaternion<f32>,
    pub material: Material,
    pub amb_color: [f32; 3],
    pub dif_color: [f32; 3],
    pub spe_color: [f32; 3],
    pub alpha: f32,
    /// Angular momentum per axis in object space.
    pub rot_object: Vector3<f32>,
    pub rot_speed: f32,
    pub orbit_speed: f32,
    pub parent: Option<BodyId>,
    pub children: Vec<BodyId>,
    pub orbit_visual: OrbitVisual,
    /// Parent position at the time the orbit visual was last moved.
    orbit_origin: Vector3<f32>,
}

impl Body {
    fn base(kind: BodyKind, mesh: MeshId, position: Vector3<f32>, scale: Vector3<f32>) -> Self {
        Self {
            kind,
            mesh,
            skin: None,
            local_position: position,
            scale,
            rotation_self: UnitQuaternion::identity(),
            rotation_plane: UnitQuaternion::identity(),
            material: Material::AMBIENT,
            amb_color: [1.0, 1.0, 1.0],
            dif_color: [1.0, 1.0, 1.0],
            spe_color: [1.0, 1.0, 1.0],
            alpha: 1.0,
            rot_object: Vector3::zeros(),
            rot_speed: 0.0,
            orbit_speed: 0.0,
            parent: None,
            children: Vec::new(),
            orbit_visual: OrbitVisual::None,
            orbit_origin: Vector3::zeros(),
        }
    }

    /// The light source of a system. Always placed at the origin and
    /// rendered with ambient colors only.
    pub fn star(scale: Vector3<f32>, color: [f32; 3], alpha: f32) -> Self {
        let mut body = Self::base(BodyKind::Star, MeshId::Sphere, Vector3::zeros(), scale);
        body.amb_color = color;
        body.dif_color = color;
        body.spe_color = color;
        body.alpha = alpha;
        body
    }

    /// A body orbiting its parent. `rot_plane_deg` tilts the orbital plane
    /// (euler angles in degrees, applied in the parent's space).
    #[allow(clippy::too_many_arguments)]
    pub fn orbiter(
        skin: Option<Skin>,
        position: Vector3<f32>,
        scale: Vector3<f32>,
        material: Material,
        amb_color: [f32; 3],
        dif_color: [f32; 3],
        spe_color: [f32; 3],
        alpha: f32,
        rot_object: Vector3<f32>,
        rot_plane_deg: Vector3<f32>,
        rot_speed: f32,
        orbit_speed: f32,
    ) -> Self {
        let mut body = Self::base(BodyKind::Orbiter, MeshId::Sphere, position, scale);
        body.skin = skin;
        body.material = material;
        body.amb_color = amb_color;
        body.dif_color = dif_color;
        body.spe_color = spe_color;
        body.alpha = alpha;
        body.rot_object = rot_object;
        body.rotation_plane = UnitQuaternion::from_euler_angles(
            rot_plane_deg.x.to_radians(),
            rot_plane_deg.y.to_radians(),
            rot_plane_deg.z.to_radians(),
        );
        body.rot_speed = rot_speed;
        body.orbit_speed = orbit_speed;
        body
    }

    /// A catalog star rendered as a camera-facing disc.
    pub fn background_star(
        catalog_index: usize,
        position: Vector3<f32>,
        size: f32,
        color: [f32; 3],
        alpha: f32,
    ) -> Self {
        let mut body = Self::base(
            BodyKind::BackgroundStar { catalog_index },
            MeshId::Circle,
            position,
            Vector3::new(size, size, size),
        );
        body.amb_color = color;
        body.dif_color = color;
        body.spe_color = color;
        body.alpha = alpha;
        body
    }
}

#[derive(Default)]
pub struct SceneGraph {
    bodies: Vec<Body>,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self { bodies: Vec::new() }
    }

    pub fn insert(&mut self, body: Body) -> BodyId {
        self.bodies.push(body);
        BodyId(self.bodies.len() - 1)
    }

    pub fn body(&self, id: BodyId) -> &Body {
        &self.bodies[id.0]
    }

    pub fn body_mut(&mut self, id: BodyId) -> &mut Body {
        &mut self.bodies[id.0]
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    /// Makes `child` orbit `parent`. Rejected when the parent chain of
    /// `parent` already contains `child`, which would loop the graph.
    pub fn attach(&mut self, child: BodyId, parent: BodyId) -> Result<(), String> {
        let mut cursor = Some(parent);
        while let Some(id) = cursor {
            if id == child {
                return Err("attaching would create a cycle".to_string());
            }
            cursor = self.bodies[id.0].parent;
        }
        self.bodies[child.0].parent = Some(parent);
        self.bodies[parent.0].children.push(child);
        self.bodies[child.0].orbit_origin = self.root_position(child);
        Ok(())
    }

    /// Inserts a body as a child of `parent` and returns its handle so the
    /// caller can chain further children or an orbit visual onto it.
    pub fn add_child(&mut self, parent: BodyId, body: Body) -> Result<BodyId, String> {
        let id = self.insert(body);
        self.attach(id, parent)?;
        Ok(id)
    }

    /// Resolved position of the parent. For a parent that itself orbits,
    /// this recurses up the chain and applies the parent's orbital-plane
    /// rotation about its own attachment point.
    pub fn root_position(&self, id: BodyId) -> Vector3<f32> {
        match self.bodies[id.0].parent {
            None => Vector3::zeros(),
            Some(pid) => {
                let parent = &self.bodies[pid.0];
                if parent.kind == BodyKind::Orbiter {
                    let grand = self.root_position(pid);
                    let pos = parent.local_position + grand;
                    math::transform_point(
                        &math::rotation_about_point(&parent.rotation_plane, &grand),
                        &pos,
                    )
                } else {
                    parent.local_position
                }
            }
        }
    }

    /// The body's position resolved through the parent chain, including its
    /// own orbital-plane rotation. This is the position shown to the user.
    pub fn true_position(&self, id: BodyId) -> Vector3<f32> {
        let body = &self.bodies[id.0];
        if body.kind != BodyKind::Orbiter {
            return body.local_position;
        }
        let root_pos = self.root_position(id);
        let pos = root_pos + body.local_position;
        math::transform_point(
            &math::rotation_about_point(&body.rotation_plane, &root_pos),
            &pos,
        )
    }

    /// World and normal matrices for a body, consistent with the current
    /// kinematic state. Recomputed on every call, never cached.
    pub fn world_mats(&self, id: BodyId, cam_position: &Vector3<f32>) -> (Matrix4<f32>, Matrix4<f32>) {
        let body = &self.bodies[id.0];
        let world = match &body.kind {
            BodyKind::Star => math::trs(
                &UnitQuaternion::identity(),
                &body.local_position,
                &body.scale,
            ),
            BodyKind::Orbiter => {
                let root_pos = self.root_position(id);
                let true_pos = root_pos + body.local_position;
                math::rotation_about_point(&body.rotation_plane, &root_pos)
                    * math::trs(&body.rotation_self, &true_pos, &body.scale)
            }
            BodyKind::BackgroundStar { .. } => {
                let to_view = body.local_position - cam_position;
                billboard(&body.local_position, &to_view, &body.scale)
            }
            BodyKind::Connector { a: Some(a), b: Some(b), inset, .. } => {
                // Live connectors re-track their endpoints on every request.
                let p1 = self.bodies[a.0].local_position;
                let p2 = self.bodies[b.0].local_position;
                let mid = (p1 - p2) * 0.5 + p2;
                let length = (p1 - p2).norm() - inset;
                let to_obj = mid - p1;
                let axis = Vector3::y_axis().cross(&to_obj);
                let angle = math::angle_between(&Vector3::y(), &to_obj);
                let scale = Vector3::new(body.scale.x, length, body.scale.z);
                segment_matrix(&mid, &axis, angle, &scale)
            }
            BodyKind::Connector { axis, angle, .. } => {
                segment_matrix(&body.local_position, axis, *angle, &body.scale)
            }
            BodyKind::OrbitRing => {
                math::trs(&body.rotation_plane, &body.local_position, &body.scale)
            }
        };
        let normal = world
            .try_inverse()
            .map(|inv| inv.transpose())
            .unwrap_or_else(Matrix4::identity);
        (world, normal)
    }

    /// Advances the kinematic state of a body and its whole subtree.
    ///
    /// For an orbiter with radius r the angular velocity is
    /// `speed * orbit_speed * PI / (200 * r)`; a body at the origin does not
    /// orbit. Only the angle of the local position changes, the radius is
    /// preserved exactly. Children update after their parent so they see the
    /// already-advanced position.
    pub fn update(&mut self, id: BodyId, time: f32, speed: f32) {
        if self.bodies[id.0].kind == BodyKind::Orbiter {
            {
                let body = &mut self.bodies[id.0];
                let r = body.local_position.norm();
                let w = if r == 0.0 {
                    0.0
                } else {
                    speed * body.orbit_speed * PI / (200.0 * r)
                };
                let phi = body.local_position.x.atan2(body.local_position.z);
                let phi = (phi + time * w).rem_euclid(2.0 * PI);
                body.local_position = Vector3::new(r * phi.sin(), 0.0, r * phi.cos());

                let step = speed * body.rot_speed * time / 2000.0;
                let rot = body.rot_object;
                body.rotation_self = body.rotation_self
                    * UnitQuaternion::from_axis_angle(&Vector3::x_axis(), step * rot.x)
                    * UnitQuaternion::from_axis_angle(&Vector3::y_axis(), step * rot.y)
                    * UnitQuaternion::from_axis_angle(&Vector3::z_axis(), step * rot.z);
            }

            // The orbit visual rides along with the parent: segments move by
            // the distance the parent traveled since the last update, a
            // static ring is simply re-centered.
            let root_pos = self.root_position(id);
            let delta = root_pos - self.bodies[id.0].orbit_origin;
            match self.bodies[id.0].orbit_visual.clone() {
                OrbitVisual::Dynamic(segments) => {
                    for seg in segments {
                        self.bodies[seg.0].local_position += delta;
                    }
                }
                OrbitVisual::Static(ring) => {
                    self.bodies[ring.0].local_position = root_pos;
                }
                OrbitVisual::None => {}
            }
            self.bodies[id.0].orbit_origin = root_pos;
        }

        let children = self.bodies[id.0].children.clone();
        for child in children {
            self.update(child, time, speed);
        }
    }

    /// Builds a closed ring of `steps` connector segments approximating the
    /// body's orbit circle. The placeholder anchors used during construction
    /// are discarded; only the segments remain, with their interaction hooks
    /// neutralized (no endpoints) and their thickness scaled to the owner.
    pub fn add_dynamic_orbit(&mut self, id: BodyId, steps: usize) {
        let owner = &self.bodies[id.0];
        let r = owner.local_position.norm();
        let plane = owner.rotation_plane;
        let thickness = owner.scale.x / 10.0;
        let root_pos = self.root_position(id);

        let mut anchors = Vec::with_capacity(steps);
        for i in 0..steps {
            let phi = 2.0 * PI * i as f32 / steps as f32;
            let pos = Vector3::new(r * phi.sin(), 0.0, r * phi.cos());
            let pos = math::rotate_point(&plane, &pos) + root_pos;
            anchors.push(pos);
        }

        let mut segments = Vec::with_capacity(steps);
        // Close the ring first, then walk the remaining adjacent pairs.
        segments.push(self.insert(orbit_segment(
            anchors[0],
            anchors[steps - 1],
            thickness,
        )));
        for i in 1..steps {
            segments.push(self.insert(orbit_segment(
                anchors[i],
                anchors[i - 1],
                thickness,
            )));
        }
        self.bodies[id.0].orbit_visual = OrbitVisual::Dynamic(segments);
    }

    /// Attaches one pre-built ring mesh scaled to the orbit radius. Cheaper
    /// than a dynamic orbit but coarser, and it does not scale with camera
    /// distance the way the segment ring does.
    pub fn add_static_orbit(&mut self, id: BodyId) {
        let owner = &self.bodies[id.0];
        let r = owner.local_position.norm();
        let plane = owner.rotation_plane;
        let root_pos = self.root_position(id);
        let mut ring = Body::base(
            BodyKind::OrbitRing,
            MeshId::Orbit,
            root_pos,
            Vector3::new(r, r, r),
        );
        ring.rotation_plane = plane;
        let ring = self.insert(ring);
        self.bodies[id.0].orbit_visual = OrbitVisual::Static(ring);
    }

    /// Collects every body orbiting `id` (recursively) plus every orbit
    /// visual in the subtree, in traversal order.
    pub fn collect_system(&self, id: BodyId) -> (Vec<BodyId>, Vec<BodyId>) {
        let mut orbiters = Vec::new();
        let mut visuals = Vec::new();
        match &self.bodies[id.0].orbit_visual {
            OrbitVisual::Dynamic(segments) => visuals.extend(segments.iter().copied()),
            OrbitVisual::Static(ring) => visuals.push(*ring),
            OrbitVisual::None => {}
        }
        for &child in &self.bodies[id.0].children {
            orbiters.push(child);
            let (sub_orbiters, sub_visuals) = self.collect_system(child);
            orbiters.extend(sub_orbiters);
            visuals.extend(sub_visuals);
        }
        (orbiters, visuals)
    }
}

/// Builds a connector body with a baked transform between two points.
fn orbit_segment(p1: Vector3<f32>, p2: Vector3<f32>, thickness: f32) -> Body {
    let mid = (p1 - p2) * 0.5 + p2;
    let length = (p1 - p2).norm();
    let to_obj = mid - p1;
    let axis = Vector3::y_axis().cross(&to_obj);
    let angle = math::angle_between(&Vector3::y(), &to_obj);
    let mut body = Body::base(
        BodyKind::Connector {
            a: None,
            b: None,
            inset: 0.0,
            length,
            axis,
            angle,
        },
        MeshId::Cylinder,
        mid,
        Vector3::new(thickness, length, thickness),
    );
    body.amb_color = [1.0, 1.0, 1.0];
    body.dif_color = [1.0, 1.0, 1.0];
    body.spe_color = [1.0, 1.0, 1.0];
    body
}

/// Builds a live connector between two arena bodies. The transform is
/// recomputed from the endpoints whenever the world matrix is requested.
pub fn connector(a: BodyId, b: BodyId, inset: f32, color: [f32; 3], alpha: f32) -> Body {
    let mut body = Body::base(
        BodyKind::Connector {
            a: Some(a),
            b: Some(b),
            inset,
            length: 0.0,
            axis: Vector3::zeros(),
            angle: 0.0,
        },
        MeshId::Cylinder,
        Vector3::zeros(),
        Vector3::new(2.0, 0.0, 2.0),
    );
    body.amb_color = color;
    body.dif_color = color;
    body.spe_color = color;
    body.alpha = alpha;
    body
}

fn billboard(position: &Vector3<f32>, to_view: &Vector3<f32>, scale: &Vector3<f32>) -> Matrix4<f32> {
    let axis = Vector3::y_axis().cross(to_view);
    let angle = math::angle_between(&Vector3::y(), to_view);
    let rotation = Unit::try_new(axis, 1e-9)
        .map(|axis| UnitQuaternion::from_axis_angle(&axis, angle))
        .unwrap_or_else(UnitQuaternion::identity);
    math::trs(&rotation, position, scale)
}

fn segment_matrix(
    position: &Vector3<f32>,
    axis: &Vector3<f32>,
    angle: f32,
    scale: &Vector3<f32>,
) -> Matrix4<f32> {
    let rotation = Unit::try_new(*axis, 1e-9)
        .map(|axis| UnitQuaternion::from_axis_angle(&axis, angle))
        .unwrap_or_else(UnitQuaternion::identity);
    math::trs(&rotation, position, scale)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn plain_orbiter(position: Vector3<f32>, orbit_speed: f32) -> Body {
        Body::orbiter(
            None,
            position,
            Vector3::new(1.0, 1.0, 1.0),
            Material::SHADED,
            [0.5, 0.5, 0.5],
            [0.5, 0.5, 0.5],
            [1.0, 1.0, 1.0],
            1.0,
            Vector3::new(0.0, 1.0, 0.0),
            Vector3::zeros(),
            1.0,
            orbit_speed,
        )
    }

    fn star_with_planet(graph: &mut SceneGraph, position: Vector3<f32>) -> (BodyId, BodyId) {
        let sun = graph.insert(Body::star(Vector3::new(5.0, 5.0, 5.0), [1.0, 1.0, 0.8], 1.0));
        let planet = graph.add_child(sun, plain_orbiter(position, 1.0)).unwrap();
        (sun, planet)
    }

    #[test]
    fn update_preserves_orbit_radius() {
        let mut graph = SceneGraph::new();
        let (sun, planet) = star_with_planet(&mut graph, Vector3::new(30.0, 0.0, 40.0));
        let r = graph.body(planet).local_position.norm();
        for _ in 0..500 {
            graph.update(sun, 16.0, 3.0);
        }
        assert_relative_eq!(graph.body(planet).local_position.norm(), r, epsilon = 1e-2);
        assert_eq!(graph.body(planet).local_position.y, 0.0);
    }

    #[test]
    fn update_at_origin_produces_no_nan() {
        let mut graph = SceneGraph::new();
        let (sun, planet) = star_with_planet(&mut graph, Vector3::zeros());
        graph.update(sun, 16.0, 1.0);
        let pos = graph.body(planet).local_position;
        assert!(pos.iter().all(|c| c.is_finite()));
        let (world, normal) = graph.world_mats(planet, &Vector3::zeros());
        assert!(world.iter().all(|c| c.is_finite()));
        assert!(normal.iter().all(|c| c.is_finite()));
    }

    #[test]
    fn world_mats_is_pure_between_updates() {
        let mut graph = SceneGraph::new();
        let (sun, planet) = star_with_planet(&mut graph, Vector3::new(100.0, 0.0, 0.0));
        graph.update(sun, 16.0, 1.0);
        let cam = Vector3::new(0.0, 0.0, 500.0);
        let (w1, n1) = graph.world_mats(planet, &cam);
        let (w2, n2) = graph.world_mats(planet, &cam);
        assert_eq!(w1, w2);
        assert_eq!(n1, n2);
    }

    #[test]
    fn child_update_sees_advanced_parent_position() {
        let mut graph = SceneGraph::new();
        let (sun, planet) = star_with_planet(&mut graph, Vector3::new(100.0, 0.0, 0.0));
        let moon = graph
            .add_child(planet, plain_orbiter(Vector3::new(10.0, 0.0, 0.0), 1.0))
            .unwrap();
        graph.update(sun, 16.0, 1.0);
        // The moon's resolved parent position must equal the planet's
        // current true position, not last frame's.
        let expected = graph.true_position(planet);
        assert_relative_eq!(graph.root_position(moon), expected, epsilon = 1e-4);
    }

    #[test]
    fn tilted_parent_rotates_attachment_point() {
        let mut graph = SceneGraph::new();
        let sun = graph.insert(Body::star(Vector3::new(5.0, 5.0, 5.0), [1.0, 1.0, 0.8], 1.0));
        let mut tilted = plain_orbiter(Vector3::new(0.0, 0.0, 100.0), 1.0);
        tilted.rotation_plane =
            UnitQuaternion::from_axis_angle(&Vector3::x_axis(), -std::f32::consts::FRAC_PI_2);
        let planet = graph.add_child(sun, tilted).unwrap();
        // The plane rotation lifts the planet out of the XZ plane even
        // though its local position stays inside it.
        let pos = graph.true_position(planet);
        assert_relative_eq!(pos.y, 100.0, epsilon = 1e-3);
        assert_relative_eq!(pos.z, 0.0, epsilon = 1e-3);
    }

    #[test]
    fn attach_rejects_cycles() {
        let mut graph = SceneGraph::new();
        let (_sun, planet) = star_with_planet(&mut graph, Vector3::new(50.0, 0.0, 0.0));
        let moon = graph
            .add_child(planet, plain_orbiter(Vector3::new(5.0, 0.0, 0.0), 1.0))
            .unwrap();
        assert!(graph.attach(planet, moon).is_err());
        assert!(graph.attach(planet, planet).is_err());
    }

    #[test]
    fn dynamic_orbit_forms_a_closed_ring() {
        let steps = 64;
        let mut graph = SceneGraph::new();
        let (_sun, planet) = star_with_planet(&mut graph, Vector3::new(0.0, 0.0, 200.0));
        graph.add_dynamic_orbit(planet, steps);

        let segments = match &graph.body(planet).orbit_visual {
            OrbitVisual::Dynamic(segments) => segments.clone(),
            other => panic!("expected dynamic orbit, got {:?}", other),
        };
        assert_eq!(segments.len(), steps);

        // Each segment spans one chord of the orbit polygon and sits at the
        // chord midpoint distance from the center.
        let r = 200.0f32;
        let chord = 2.0 * r * (PI / steps as f32).sin();
        let mid_r = r * (PI / steps as f32).cos();
        for &seg in &segments {
            let body = graph.body(seg);
            match &body.kind {
                BodyKind::Connector { a: None, b: None, length, .. } => {
                    assert_relative_eq!(*length, chord, epsilon = 1e-2);
                }
                other => panic!("expected neutralized segment, got {:?}", other),
            }
            assert_relative_eq!(body.local_position.norm(), mid_r, epsilon = 1e-2);
            // Thickness follows the owner scale.
            assert_relative_eq!(body.scale.x, 0.1, epsilon = 1e-6);
        }
    }

    #[test]
    fn dynamic_orbit_rides_along_with_moving_parent() {
        let mut graph = SceneGraph::new();
        let (sun, planet) = star_with_planet(&mut graph, Vector3::new(0.0, 0.0, 150.0));
        let moon = graph
            .add_child(planet, plain_orbiter(Vector3::new(20.0, 0.0, 0.0), 1.0))
            .unwrap();
        graph.add_dynamic_orbit(moon, 16);
        let first_segment = match &graph.body(moon).orbit_visual {
            OrbitVisual::Dynamic(segments) => segments[0],
            other => panic!("expected dynamic orbit, got {:?}", other),
        };
        let before = graph.body(first_segment).local_position;
        let parent_before = graph.root_position(moon);
        graph.update(sun, 400.0, 5.0);
        let parent_after = graph.root_position(moon);
        let after = graph.body(first_segment).local_position;
        assert_relative_eq!(after - before, parent_after - parent_before, epsilon = 1e-3);
    }

    #[test]
    fn static_orbit_sits_at_parent_position_with_radius_scale() {
        let mut graph = SceneGraph::new();
        let (sun, planet) = star_with_planet(&mut graph, Vector3::new(0.0, 0.0, 120.0));
        graph.add_static_orbit(planet);
        let ring = match &graph.body(planet).orbit_visual {
            OrbitVisual::Static(ring) => *ring,
            other => panic!("expected static orbit, got {:?}", other),
        };
        assert_eq!(graph.body(ring).local_position, Vector3::zeros());
        assert_relative_eq!(graph.body(ring).scale.x, 120.0);
        graph.update(sun, 16.0, 1.0);
        // Re-centered every update.
        assert_eq!(graph.body(ring).local_position, graph.root_position(planet));
    }

    #[test]
    fn background_star_world_matrix_faces_the_camera() {
        let mut graph = SceneGraph::new();
        let star = graph.insert(Body::background_star(
            3,
            Vector3::new(0.0, 0.0, 1000.0),
            100.0,
            [0.8, 0.8, 1.0],
            1.0,
        ));
        let cam = Vector3::zeros();
        let (world, _) = graph.world_mats(star, &cam);
        // The disc normal (+Y in model space) must point along the view
        // direction after billboarding.
        let normal = world.transform_vector(&Vector3::y());
        let to_view = Vector3::new(0.0, 0.0, 1.0);
        assert_relative_eq!(normal.normalize().dot(&to_view).abs(), 1.0, epsilon = 1e-4);
    }
}
