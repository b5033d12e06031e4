//! Scene state and orchestration.
//!
//! Owns the body graph, the star catalog, user connections, constellation
//! display, the camera and the star swap transition. Every frame the scene
//! advances the kinematics and flattens the visible bodies into a
//! `FrameBundle` for the renderer; pick results come back as indices into
//! that bundle and are resolved here.

use std::collections::{BTreeSet, HashMap};

use nalgebra::Vector3;

use crate::body::{self, Body, BodyId, SceneGraph};
use crate::camera::ControllableCamera;
use crate::catalog::StarCatalog;
use crate::config;
use crate::material::Material;
use crate::math;
use crate::render::{DrawItem, FrameBundle};
use crate::texture::Skin;

const SIGN_LINE_COLOR: [f32; 3] = [0.4, 0.1, 0.9];
const CAMERA_HOME: Vector3<f32> = Vector3::new(0.0, 40.0, 350.0);

/// A recorded connection between two catalog stars. Pairs touching the
/// current home star are recorded but have no visible segment.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Connection {
    pub a: usize,
    pub b: usize,
    pub color: [f32; 3],
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Clickable {
    Sun,
    Star(usize),
    Connector(usize, usize),
    Inert,
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Selection {
    Sun,
    Star { index: usize },
    Connector { a: usize, b: usize },
}

/// The star swap runs as an explicit state machine so a second swap request
/// can be rejected instead of corrupting the one in flight.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SwapTransition {
    Idle,
    RotatingToTarget { target: usize },
    ShrinkingFov { target: usize },
    GrowingFov,
}

pub struct Scene {
    graph: SceneGraph,
    catalog: StarCatalog,
    signs: HashMap<String, Vec<usize>>,
    active_signs: BTreeSet<String>,
    sun: BodyId,
    sun_index: usize,
    /// Catalog index to billboard body for every star except the home star.
    background: HashMap<usize, BodyId>,
    connections: Vec<Connection>,
    connector_bodies: HashMap<(usize, usize), BodyId>,
    sign_bodies: HashMap<String, Vec<BodyId>>,
    pending: Option<usize>,
    selected: Option<Selection>,
    last_clickable: Vec<Clickable>,
    pub connect_color: [f32; 3],
    pub camera: ControllableCamera,
    transition: SwapTransition,
    saved_fov: f32,
    pub paused: bool,
    pub speed: f32,
    pub info_text: String,
}

impl Scene {
    pub fn new(catalog: StarCatalog, signs: HashMap<String, Vec<usize>>) -> Self {
        // The home star starts as the final catalog entry, appended at load.
        let sun_index = catalog.len().saturating_sub(1);
        let camera = ControllableCamera::new(CAMERA_HOME, -CAMERA_HOME.normalize());
        let saved_fov = camera.camera.fov;
        let mut scene = Self {
            graph: SceneGraph::new(),
            catalog,
            signs,
            active_signs: BTreeSet::new(),
            sun: BodyId(0),
            sun_index,
            background: HashMap::new(),
            connections: Vec::new(),
            connector_bodies: HashMap::new(),
            sign_bodies: HashMap::new(),
            pending: None,
            selected: None,
            last_clickable: Vec::new(),
            connect_color: [1.0, 0.0, 0.0],
            camera,
            transition: SwapTransition::Idle,
            saved_fov,
            paused: false,
            speed: 1.0,
            info_text: String::new(),
        };
        scene.build_world();
        scene
    }

    pub fn sun_index(&self) -> usize {
        self.sun_index
    }

    pub fn transition(&self) -> SwapTransition {
        self.transition
    }

    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    pub fn sign_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.signs.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn sign_active(&self, name: &str) -> bool {
        self.active_signs.contains(name)
    }

    /// Advances the simulation by `dt` milliseconds and flattens the scene
    /// into draw lists. Camera input is suspended while a swap is in flight.
    pub fn frame(&mut self, dt: f32) -> FrameBundle {
        if self.transition == SwapTransition::Idle {
            self.camera.update(dt);
        } else {
            self.advance_transition(dt);
        }
        if !self.paused {
            self.graph.update(self.sun, dt, self.speed);
        }
        self.build_frame()
    }

    // ----- world construction -----------------------------------------

    /// Builds the graph for the current home star: the light source, a
    /// deterministic planet system seeded by the star's catalog index, and
    /// one billboard per remaining catalog star positioned relative to home.
    fn build_world(&mut self) {
        self.graph = SceneGraph::new();
        self.background.clear();
        self.connector_bodies.clear();
        self.sign_bodies.clear();
        self.selected = None;
        self.pending = None;
        self.last_clickable.clear();

        self.sun = self.graph.insert(Body::star(
            Vector3::new(40.0, 40.0, 40.0),
            [1.0, 0.95, 0.8],
            1.0,
        ));
        let mut rng = SeededRng::new(self.sun_index as u64);
        generate_planets(&mut self.graph, self.sun, &mut rng);

        let home = self.catalog.positions[self.sun_index];
        for index in 0..self.catalog.len() {
            if index == self.sun_index {
                continue;
            }
            let body = Body::background_star(
                index,
                self.catalog.positions[index] - home,
                self.catalog.sizes[index],
                self.catalog.colors[index],
                1.0,
            );
            self.background.insert(index, self.graph.insert(body));
        }

        for connection in self.connections.clone() {
            self.spawn_connector_body(connection);
        }
        for name in self.active_signs.clone() {
            self.spawn_sign(&name);
        }
    }

    // ----- connections ------------------------------------------------

    /// Registers a star for connecting. The first call arms the pending
    /// endpoint, the second call on a different star completes the pair.
    pub fn add_connector(&mut self, index: usize) {
        match self.pending.take() {
            None => {
                self.pending = Some(index);
                self.info_text = format!("star {} armed, pick a second star", index);
            }
            Some(first) if first == index => {
                self.info_text = "connection cancelled".to_string();
            }
            Some(first) => {
                if self.connect_pair(first, index, self.connect_color) {
                    self.info_text = format!("connected {} and {}", first, index);
                } else {
                    self.info_text = format!("{} and {} are already connected", first, index);
                }
            }
        }
    }

    /// Records a pair unless it already exists in either order. Returns
    /// whether the pair was added.
    fn connect_pair(&mut self, a: usize, b: usize, color: [f32; 3]) -> bool {
        if a == b {
            return false;
        }
        if self
            .connections
            .iter()
            .any(|c| (c.a == a && c.b == b) || (c.a == b && c.b == a))
        {
            return false;
        }
        let connection = Connection { a, b, color };
        self.connections.push(connection);
        self.spawn_connector_body(connection);
        true
    }

    fn spawn_connector_body(&mut self, connection: Connection) {
        let Connection { a, b, color } = connection;
        if a == self.sun_index || b == self.sun_index {
            return;
        }
        let (Some(&body_a), Some(&body_b)) = (self.background.get(&a), self.background.get(&b))
        else {
            return;
        };
        let body = body::connector(body_a, body_b, 0.0, color, 1.0);
        let id = self.graph.insert(body);
        self.connector_bodies.insert(pair_key(a, b), id);
    }

    pub fn remove_connector(&mut self, a: usize, b: usize) {
        self.connections
            .retain(|c| !((c.a == a && c.b == b) || (c.a == b && c.b == a)));
        // The arena entry goes stale here; it is garbage collected by the
        // next system rebuild and never referenced in the meantime.
        self.connector_bodies.remove(&pair_key(a, b));
        if self.selected == Some(Selection::Connector { a, b })
            || self.selected == Some(Selection::Connector { a: b, b: a })
        {
            self.selected = None;
            self.info_text.clear();
        }
    }

    /// Serializes every connection as `/id1/id2/rrggbb` fragments.
    pub fn export_connections(&self) -> String {
        let mut out = String::new();
        for c in &self.connections {
            let [r, g, b] = c.color.map(|ch| (ch * 255.0).round() as u8);
            out.push_str(&format!("/{}/{}/{:02x}{:02x}{:02x}", c.a, c.b, r, g, b));
        }
        out
    }

    /// Parses a connection list in the export format. Validation is
    /// all-or-nothing: a single malformed triple rejects the whole string
    /// and leaves the scene untouched. Valid triples that duplicate an
    /// existing pair or connect a star to itself are skipped silently.
    /// Returns the number of connections added.
    pub fn import_connections(&mut self, text: &str) -> Result<usize, String> {
        let parts: Vec<&str> = text.trim().split('/').collect();
        if parts.len() == 1 {
            return Err("no connections found".to_string());
        }
        if (parts.len() - 1) % 3 != 0 {
            return Err("malformed connection list".to_string());
        }

        let mut parsed = Vec::new();
        for chunk in parts[1..].chunks(3) {
            let (a_str, b_str, hex) = (chunk[0], chunk[1], chunk[2]);
            let parse_id = |s: &str| -> Result<usize, String> {
                if s.is_empty() || !s.chars().all(|c| c.is_ascii_digit()) {
                    return Err(format!("invalid star id {:?}", s));
                }
                let id: usize = s
                    .parse()
                    .map_err(|_| format!("invalid star id {:?}", s))?;
                if id >= self.catalog.len() {
                    return Err(format!("star id {} out of range", id));
                }
                Ok(id)
            };
            let a = parse_id(a_str)?;
            let b = parse_id(b_str)?;
            if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
                return Err(format!("invalid color {:?}", hex));
            }
            let channel = |range: std::ops::Range<usize>| -> f32 {
                u8::from_str_radix(&hex[range], 16).unwrap_or(0) as f32 / 255.0
            };
            parsed.push((a, b, [channel(0..2), channel(2..4), channel(4..6)]));
        }

        let mut added = 0;
        for (a, b, color) in parsed {
            if self.connect_pair(a, b, color) {
                added += 1;
            }
        }
        Ok(added)
    }

    // ----- constellations ---------------------------------------------

    pub fn set_sign(&mut self, name: &str, enabled: bool) {
        if enabled == self.active_signs.contains(name) {
            return;
        }
        if enabled {
            self.active_signs.insert(name.to_string());
            self.spawn_sign(name);
        } else {
            self.active_signs.remove(name);
            self.sign_bodies.remove(name);
        }
    }

    fn spawn_sign(&mut self, name: &str) {
        let Some(pairs) = self.signs.get(name).cloned() else { return };
        let mut bodies = Vec::new();
        for pair in pairs.chunks(2) {
            let (a, b) = (pair[0], pair[1]);
            if a == b || a == self.sun_index || b == self.sun_index {
                continue;
            }
            let (Some(&body_a), Some(&body_b)) =
                (self.background.get(&a), self.background.get(&b))
            else {
                continue;
            };
            let body = body::connector(body_a, body_b, 0.0, SIGN_LINE_COLOR, 1.0);
            bodies.push(self.graph.insert(body));
        }
        self.sign_bodies.insert(name.to_string(), bodies);
    }

    // ----- star swap ---------------------------------------------------

    /// Starts the transition to another catalog star. Refused while a swap
    /// is already running or when the target is the current home star.
    pub fn swap_star(&mut self, target: usize) -> Result<(), String> {
        if self.transition != SwapTransition::Idle {
            return Err("swap already in progress".to_string());
        }
        if target == self.sun_index {
            return Err("already orbiting this star".to_string());
        }
        if target >= self.catalog.len() {
            return Err(format!("star id {} out of range", target));
        }
        self.saved_fov = self.camera.camera.fov;
        self.transition = SwapTransition::RotatingToTarget { target };
        self.info_text = format!("traveling to star {}", target);
        Ok(())
    }

    fn advance_transition(&mut self, dt: f32) {
        match self.transition {
            SwapTransition::Idle => {}
            SwapTransition::RotatingToTarget { target } => {
                let home = self.catalog.positions[self.sun_index];
                let star_pos = self.catalog.positions[target] - home;
                let to_target = star_pos - self.camera.camera.position;
                let remaining = self
                    .camera
                    .camera
                    .rotate_toward(&to_target, config::SWAP_TURN_SPEED * dt);
                if remaining <= 0.0 {
                    self.transition = SwapTransition::ShrinkingFov { target };
                }
            }
            SwapTransition::ShrinkingFov { target } => {
                let cam = &mut self.camera.camera;
                cam.fov -= config::SWAP_FOV_SPEED * dt;
                if cam.fov <= config::SWAP_MIN_FOV {
                    cam.fov = config::SWAP_MIN_FOV;
                    self.sun_index = target;
                    self.build_world();
                    self.camera.camera.position = CAMERA_HOME;
                    self.camera.camera.set_forward(-CAMERA_HOME.normalize());
                    self.info_text = format!("arrived at star {}", target);
                    self.transition = SwapTransition::GrowingFov;
                }
            }
            SwapTransition::GrowingFov => {
                let cam = &mut self.camera.camera;
                cam.fov += config::SWAP_FOV_SPEED * dt;
                if cam.fov >= self.saved_fov {
                    // Restore the exact pre-swap field of view.
                    cam.fov = self.saved_fov;
                    self.transition = SwapTransition::Idle;
                }
            }
        }
    }

    // ----- selection and input -----------------------------------------

    /// Resolves a pick result from the last rendered frame. `None` (a miss
    /// or an empty clickable list) clears the current selection.
    pub fn handle_pick(&mut self, hit: Option<usize>) {
        let target = hit.and_then(|i| self.last_clickable.get(i).copied());
        self.clear_selection();
        match target {
            Some(Clickable::Sun) => {
                self.selected = Some(Selection::Sun);
                self.info_text = "HOME STAR\nposition: (0, 0, 0)".to_string();
            }
            Some(Clickable::Star(index)) => {
                if let Some(&id) = self.background.get(&index) {
                    self.graph.body_mut(id).scale *= 4.0;
                }
                self.selected = Some(Selection::Star { index });
                let pos = self.catalog.positions[index] - self.catalog.positions[self.sun_index];
                self.info_text = format!(
                    "STAR {}\nposition: ({:.0}, {:.0}, {:.0})\n\
                     middle mouse button on 2 stars to connect, P to travel",
                    index, pos.x, pos.y, pos.z
                );
            }
            Some(Clickable::Connector(a, b)) => {
                if let Some(&id) = self.connector_bodies.get(&pair_key(a, b)) {
                    let body = self.graph.body_mut(id);
                    body.scale.x *= 4.0;
                    body.scale.z *= 4.0;
                }
                self.selected = Some(Selection::Connector { a, b });
                self.info_text = format!("CONNECTOR {} - {}\npress P to remove", a, b);
            }
            Some(Clickable::Inert) | None => {}
        }
    }

    fn clear_selection(&mut self) {
        match self.selected.take() {
            Some(Selection::Star { index }) => {
                if let Some(&id) = self.background.get(&index) {
                    self.graph.body_mut(id).scale /= 4.0;
                }
            }
            Some(Selection::Connector { a, b }) => {
                if let Some(&id) = self.connector_bodies.get(&pair_key(a, b)) {
                    let body = self.graph.body_mut(id);
                    body.scale.x /= 4.0;
                    body.scale.z /= 4.0;
                }
            }
            _ => {}
        }
        self.info_text.clear();
    }

    /// Middle mouse button: arm or complete a connection on the selected star.
    pub fn connect_selected(&mut self) {
        if let Some(Selection::Star { index }) = self.selected {
            self.add_connector(index);
        }
    }

    /// The P key: travel to the selected star, or remove the selected
    /// connector.
    pub fn primary_action(&mut self) {
        match self.selected {
            Some(Selection::Star { index }) => {
                if let Err(err) = self.swap_star(index) {
                    self.info_text = err;
                }
            }
            Some(Selection::Connector { a, b }) => {
                self.remove_connector(a, b);
                self.info_text = format!("removed connector {} - {}", a, b);
            }
            _ => {}
        }
    }

    // ----- frame flattening --------------------------------------------

    fn draw_item(&self, id: BodyId, cam_position: &Vector3<f32>) -> DrawItem {
        let body = self.graph.body(id);
        let (world, normal) = self.graph.world_mats(id, cam_position);
        DrawItem {
            mesh: body.mesh,
            world,
            normal,
            skin: body.skin,
            amb_color: body.amb_color,
            dif_color: body.dif_color,
            alpha: body.alpha,
            material: body.material,
        }
    }

    fn build_frame(&mut self) -> FrameBundle {
        let cam = &self.camera.camera;
        let cam_position = cam.position;
        let mut solid = Vec::new();
        let mut clickable = Vec::new();

        solid.push(self.draw_item(self.sun, &cam_position));
        clickable.push(Clickable::Sun);

        // Background stars outside the view cone are culled, except the
        // selected one which must stay pickable for the follow-up click.
        let selected_star = match self.selected {
            Some(Selection::Star { index }) => Some(index),
            _ => None,
        };
        for (&index, &id) in &self.background {
            let to_star = self.graph.body(id).local_position - cam_position;
            let visible = math::angle_between(&cam.z, &to_star) <= config::STAR_CULL_ANGLE
                || selected_star == Some(index);
            if visible {
                solid.push(self.draw_item(id, &cam_position));
                clickable.push(Clickable::Star(index));
            }
        }

        // Connector segments disappear for the duration of a star swap; they
        // reappear against the rebuilt billboard set once it completes.
        if self.transition == SwapTransition::Idle {
            for (&(a, b), &id) in &self.connector_bodies {
                solid.push(self.draw_item(id, &cam_position));
                clickable.push(Clickable::Connector(a, b));
            }
            for bodies in self.sign_bodies.values() {
                for &id in bodies {
                    solid.push(self.draw_item(id, &cam_position));
                    clickable.push(Clickable::Inert);
                }
            }
        }

        let (orbiters, orbit_visuals) = self.graph.collect_system(self.sun);
        for id in orbit_visuals {
            solid.push(self.draw_item(id, &cam_position));
            clickable.push(Clickable::Inert);
        }

        let mut shaded = Vec::with_capacity(orbiters.len() + 1);
        shaded.push(self.draw_item(self.sun, &cam_position));
        for id in orbiters {
            shaded.push(self.draw_item(id, &cam_position));
        }

        self.last_clickable = clickable;
        let light = self.graph.body(self.sun);
        FrameBundle {
            solid,
            shaded,
            view: cam.view_matrix(),
            fov: cam.fov,
            cam_position,
            light_position: light.local_position,
            light_color: light.amb_color,
        }
    }
}

fn pair_key(a: usize, b: usize) -> (usize, usize) {
    if a <= b { (a, b) } else { (b, a) }
}

/// Small deterministic generator so the same catalog star always grows the
/// same planet system.
struct SeededRng(u64);

impl SeededRng {
    fn new(seed: u64) -> Self {
        Self(seed.wrapping_mul(0x9E37_79B9_7F4A_7C15) | 1)
    }

    fn next_u32(&mut self) -> u32 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        (x >> 32) as u32
    }

    fn next_f32(&mut self) -> f32 {
        (self.next_u32() >> 8) as f32 / (1 << 24) as f32
    }

    fn range(&mut self, lo: f32, hi: f32) -> f32 {
        lo + self.next_f32() * (hi - lo)
    }
}

const ROCKY_SKINS: [Skin; 6] = [
    Skin::LavaRock1,
    Skin::LavaRock2,
    Skin::Ice1,
    Skin::Ice2,
    Skin::IceAndWater1,
    Skin::IceAndWater2,
];

fn generate_planets(graph: &mut SceneGraph, sun: BodyId, rng: &mut SeededRng) {
    let count = 3 + (rng.next_u32() % 6) as usize;
    let mut radius = 150.0;
    for _ in 0..count {
        radius += rng.range(80.0, 200.0);
        let scale = rng.range(4.0, 16.0);
        let gas_giant = radius > 500.0 && rng.next_f32() < 0.5;
        let skin = if gas_giant {
            Skin::GasGiant(1 + (rng.next_u32() % 15) as u8)
        } else {
            ROCKY_SKINS[(rng.next_u32() as usize) % ROCKY_SKINS.len()]
        };
        let tint = skin.fallback_color().map(|c| c as f32 / 255.0);
        let phi = rng.range(0.0, 2.0 * std::f32::consts::PI);
        let position = Vector3::new(radius * phi.sin(), 0.0, radius * phi.cos());
        let tilt = Vector3::new(rng.range(-15.0, 15.0), 0.0, rng.range(-15.0, 15.0));
        let planet = graph
            .add_child(
                sun,
                Body::orbiter(
                    Some(skin),
                    position,
                    Vector3::new(scale, scale, scale),
                    Material::SHADED,
                    tint,
                    tint,
                    [1.0, 1.0, 1.0],
                    1.0,
                    Vector3::new(rng.range(-0.2, 0.2), 1.0, rng.range(-0.2, 0.2)),
                    tilt,
                    rng.range(0.5, 2.0),
                    rng.range(0.5, 2.0),
                ),
            )
            .expect("planet attaches to the sun");
        graph.add_dynamic_orbit(planet, config::DEFAULT_ORBIT_SEGMENTS);

        if scale > 8.0 && rng.next_f32() < 0.6 {
            let moons = 1 + (rng.next_u32() % 2) as usize;
            for _ in 0..moons {
                let moon_radius = scale * 2.0 + rng.range(10.0, 30.0);
                let moon_phi = rng.range(0.0, 2.0 * std::f32::consts::PI);
                let moon_pos = Vector3::new(
                    moon_radius * moon_phi.sin(),
                    0.0,
                    moon_radius * moon_phi.cos(),
                );
                let moon_skin = ROCKY_SKINS[(rng.next_u32() as usize) % ROCKY_SKINS.len()];
                let moon_tint = moon_skin.fallback_color().map(|c| c as f32 / 255.0);
                let moon_scale = rng.range(1.0, 3.0);
                let moon = graph
                    .add_child(
                        planet,
                        Body::orbiter(
                            Some(moon_skin),
                            moon_pos,
                            Vector3::new(moon_scale, moon_scale, moon_scale),
                            Material::SHADED,
                            moon_tint,
                            moon_tint,
                            [1.0, 1.0, 1.0],
                            1.0,
                            Vector3::new(0.0, 1.0, 0.0),
                            Vector3::new(rng.range(-10.0, 10.0), 0.0, 0.0),
                            rng.range(0.5, 2.0),
                            rng.range(1.0, 3.0),
                        ),
                    )
                    .expect("moon attaches to its planet");
                graph.add_static_orbit(moon);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_catalog(stars: usize) -> (StarCatalog, HashMap<String, Vec<usize>>) {
        let mut positions = Vec::new();
        let mut colors = Vec::new();
        let mut sizes = Vec::new();
        for i in 0..stars {
            positions.push(Vector3::new(1000.0 + i as f32 * 100.0, 50.0, -500.0));
            colors.push([0.5, 0.5, 0.5]);
            sizes.push(100.0);
        }
        // The home star entry sits last, at the origin.
        positions.push(Vector3::zeros());
        colors.push([0.0, 1.0, 0.0]);
        sizes.push(5.0);
        (
            StarCatalog { positions, colors, sizes },
            HashMap::from([("Ori".to_string(), vec![0, 1, 1, 2])]),
        )
    }

    fn test_scene() -> Scene {
        let (catalog, signs) = test_catalog(6);
        Scene::new(catalog, signs)
    }

    /// Points the camera straight at a background star so it survives the
    /// view cone cull.
    fn aim_at_star(scene: &mut Scene, index: usize) {
        let to_star = scene.catalog.positions[index] - scene.camera.camera.position;
        scene.camera.camera.set_forward(to_star.normalize());
    }

    #[test]
    fn export_import_roundtrip() {
        let mut scene = test_scene();
        assert!(scene.connect_pair(0, 1, [1.0, 0.0, 0.0]));
        assert!(scene.connect_pair(2, 3, [0.0, 1.0, 0.0]));
        let exported = scene.export_connections();
        assert_eq!(exported, "/0/1/ff0000/2/3/00ff00");

        let mut other = test_scene();
        assert_eq!(other.import_connections(&exported), Ok(2));
        assert_eq!(other.connections(), scene.connections());
    }

    #[test]
    fn import_rejects_malformed_input_without_side_effects() {
        let mut scene = test_scene();
        for bad in [
            "garbage",
            "/1/2",
            "/1/x/ff0000",
            "/1/2/ff00",
            "/1/2/zz0000",
            "/1/999/ff0000",
            "/-1/2/ff0000",
        ] {
            assert!(scene.import_connections(bad).is_err(), "accepted {:?}", bad);
            assert!(scene.connections().is_empty(), "state changed by {:?}", bad);
        }
    }

    #[test]
    fn import_rejects_everything_when_one_triple_is_bad() {
        let mut scene = test_scene();
        let result = scene.import_connections("/0/1/ff0000/1/999/00ff00");
        assert!(result.is_err());
        assert!(scene.connections().is_empty());
    }

    #[test]
    fn import_skips_self_and_duplicate_pairs() {
        let mut scene = test_scene();
        let added = scene
            .import_connections("/1/1/ff0000/1/2/ff0000/2/1/00ff00")
            .unwrap();
        assert_eq!(added, 1);
        assert_eq!(scene.connections().len(), 1);
        assert_eq!(scene.connections()[0].a, 1);
        assert_eq!(scene.connections()[0].b, 2);
    }

    #[test]
    fn sun_pairs_are_recorded_without_a_segment() {
        let mut scene = test_scene();
        let sun = scene.sun_index();
        assert!(scene.connect_pair(0, sun, [1.0, 0.0, 0.0]));
        assert_eq!(scene.connections().len(), 1);
        assert!(scene.connector_bodies.is_empty());
        // The pair still exports and survives a roundtrip.
        let exported = scene.export_connections();
        let mut other = test_scene();
        assert_eq!(other.import_connections(&exported), Ok(1));
    }

    #[test]
    fn swap_rejects_concurrent_requests_and_restores_fov() {
        let mut scene = test_scene();
        let fov_before = scene.camera.camera.fov;
        scene.swap_star(2).unwrap();
        assert!(scene.swap_star(3).is_err());
        assert!(scene.swap_star(2).is_err());

        let mut frames = 0;
        while scene.transition() != SwapTransition::Idle {
            scene.frame(50.0);
            frames += 1;
            assert!(frames < 10_000, "transition never settled");
        }
        assert_eq!(scene.sun_index(), 2);
        assert_eq!(scene.camera.camera.fov, fov_before);
        // The swapped-to star no longer has a billboard; the old home does.
        assert!(!scene.background.contains_key(&2));
        assert!(scene.background.contains_key(&6));
    }

    #[test]
    fn swap_to_current_star_is_refused() {
        let mut scene = test_scene();
        let sun = scene.sun_index();
        assert!(scene.swap_star(sun).is_err());
        assert_eq!(scene.transition(), SwapTransition::Idle);
    }

    #[test]
    fn connectors_are_hidden_while_a_swap_is_in_flight() {
        let mut scene = test_scene();
        scene.connect_pair(0, 1, [1.0, 0.0, 0.0]);
        scene.frame(16.0);
        assert!(scene
            .last_clickable
            .iter()
            .any(|c| matches!(c, Clickable::Connector(..))));

        scene.swap_star(3).unwrap();
        scene.frame(16.0);
        assert!(!scene
            .last_clickable
            .iter()
            .any(|c| matches!(c, Clickable::Connector(..))));
    }

    #[test]
    fn connections_survive_a_swap() {
        let mut scene = test_scene();
        scene.connect_pair(0, 1, [1.0, 0.0, 0.0]);
        scene.swap_star(3).unwrap();
        while scene.transition() != SwapTransition::Idle {
            scene.frame(50.0);
        }
        assert_eq!(scene.connections().len(), 1);
        assert!(scene.connector_bodies.contains_key(&(0, 1)));
    }

    #[test]
    fn planet_generation_is_deterministic_per_star() {
        let (catalog_a, signs_a) = test_catalog(6);
        let (catalog_b, signs_b) = test_catalog(6);
        let scene_a = Scene::new(catalog_a, signs_a);
        let scene_b = Scene::new(catalog_b, signs_b);
        let (orbiters_a, _) = scene_a.graph.collect_system(scene_a.sun);
        let (orbiters_b, _) = scene_b.graph.collect_system(scene_b.sun);
        assert_eq!(orbiters_a.len(), orbiters_b.len());
        for (&a, &b) in orbiters_a.iter().zip(&orbiters_b) {
            assert_eq!(
                scene_a.graph.body(a).local_position,
                scene_b.graph.body(b).local_position
            );
        }
    }

    #[test]
    fn pick_miss_clears_selection() {
        let mut scene = test_scene();
        aim_at_star(&mut scene, 0);
        scene.frame(16.0);
        let star_slot = scene
            .last_clickable
            .iter()
            .position(|c| matches!(c, Clickable::Star(_)))
            .expect("a background star is clickable");
        scene.handle_pick(Some(star_slot));
        assert!(matches!(scene.selected, Some(Selection::Star { .. })));
        assert!(!scene.info_text.is_empty());

        scene.handle_pick(None);
        assert!(scene.selected.is_none());
        assert!(scene.info_text.is_empty());
    }

    #[test]
    fn selecting_a_star_scales_it_and_deselecting_restores_it() {
        let mut scene = test_scene();
        aim_at_star(&mut scene, 0);
        scene.frame(16.0);
        let (slot, index) = scene
            .last_clickable
            .iter()
            .enumerate()
            .find_map(|(i, c)| match c {
                Clickable::Star(index) => Some((i, *index)),
                _ => None,
            })
            .expect("a background star is clickable");
        let id = scene.background[&index];
        let before = scene.graph.body(id).scale;
        scene.handle_pick(Some(slot));
        assert_eq!(scene.graph.body(id).scale, before * 4.0);
        scene.handle_pick(None);
        assert_eq!(scene.graph.body(id).scale, before);
    }

    #[test]
    fn middle_click_flow_connects_two_stars() {
        let mut scene = test_scene();
        scene.selected = Some(Selection::Star { index: 0 });
        scene.connect_selected();
        assert_eq!(scene.pending, Some(0));
        scene.selected = Some(Selection::Star { index: 1 });
        scene.connect_selected();
        assert_eq!(scene.connections().len(), 1);
        assert!(scene.connector_bodies.contains_key(&(0, 1)));
    }

    #[test]
    fn primary_action_removes_selected_connector() {
        let mut scene = test_scene();
        scene.connect_pair(0, 1, [1.0, 0.0, 0.0]);
        scene.selected = Some(Selection::Connector { a: 0, b: 1 });
        scene.primary_action();
        assert!(scene.connections().is_empty());
        assert!(scene.connector_bodies.is_empty());
        assert!(scene.selected.is_none());
    }

    #[test]
    fn sign_toggle_spawns_and_removes_line_segments() {
        let mut scene = test_scene();
        scene.set_sign("Ori", true);
        assert_eq!(scene.sign_bodies["Ori"].len(), 2);
        let frame = scene.frame(16.0);
        // Sign lines are in the solid list but not pickable as connectors.
        assert!(scene.last_clickable.contains(&Clickable::Inert));
        assert!(!frame.solid.is_empty());

        scene.set_sign("Ori", false);
        assert!(!scene.sign_bodies.contains_key("Ori"));
    }

    #[test]
    fn frame_culls_stars_behind_the_camera() {
        let mut scene = test_scene();
        let all = scene.background.len();
        // Face straight away from every star.
        scene.camera.camera.set_forward(Vector3::new(-1.0, 0.0, 0.0));
        let frame = scene.frame(16.0);
        let stars_drawn = scene
            .last_clickable
            .iter()
            .filter(|c| matches!(c, Clickable::Star(_)))
            .count();
        assert!(stars_drawn < all);
        assert!(frame.shaded.len() >= 2);
    }

    #[test]
    fn shaded_list_leads_with_the_light() {
        let mut scene = test_scene();
        let frame = scene.frame(16.0);
        assert_eq!(frame.shaded[0].material, Material::AMBIENT);
        assert_eq!(frame.light_position, Vector3::zeros());
    }
}
