//! GPU rendering of the star system.
//!
//! Three passes share one set of mesh buffers: an off-screen picking pass
//! that writes object ids into a color target, a shadow pass that renders
//! light-to-fragment distances into a cubemap, and the forward pass that
//! draws ambient-only bodies plus phong-shaded planets sampling the cubemap.

use std::collections::HashMap;

use eframe::glow;
use glow::HasContext as _;
use nalgebra::{Matrix4, Vector3};

use crate::camera::shadow_rig;
use crate::config;
use crate::material::Material;
use crate::math;
use crate::mesh::{MeshId, VERTEX_STRIDE};
use crate::texture::{Skin, SurfaceTexture};

/// One body flattened for the GPU. The scene rebuilds these every frame so
/// the renderer never has to know about the scene graph.
#[derive(Clone)]
pub struct DrawItem {
    pub mesh: MeshId,
    pub world: Matrix4<f32>,
    pub normal: Matrix4<f32>,
    pub skin: Option<Skin>,
    pub amb_color: [f32; 3],
    pub dif_color: [f32; 3],
    pub alpha: f32,
    pub material: Material,
}

/// Everything the paint callback needs for one frame. `shaded[0]` is the
/// light source; it contributes its position and ambient color to the
/// shading of the rest but is itself drawn through the solid list.
#[derive(Clone, Default)]
pub struct FrameBundle {
    pub solid: Vec<DrawItem>,
    pub shaded: Vec<DrawItem>,
    pub view: Matrix4<f32>,
    pub fov: f32,
    pub cam_position: Vector3<f32>,
    pub light_position: Vector3<f32>,
    pub light_color: [f32; 3],
}

impl Default for DrawItem {
    fn default() -> Self {
        Self {
            mesh: MeshId::Sphere,
            world: Matrix4::identity(),
            normal: Matrix4::identity(),
            skin: None,
            amb_color: [1.0, 1.0, 1.0],
            dif_color: [1.0, 1.0, 1.0],
            alpha: 1.0,
            material: Material::AMBIENT,
        }
    }
}

struct GpuMesh {
    vertex_array: glow::VertexArray,
    buffer: glow::Buffer,
    vertex_count: i32,
}

pub struct RenderEngine {
    solid_program: glow::Program,
    shaded_program: glow::Program,
    shadow_program: glow::Program,
    pick_program: glow::Program,
    meshes: HashMap<MeshId, GpuMesh>,
    textures: HashMap<Skin, glow::Texture>,
    pick_framebuffer: glow::Framebuffer,
    pick_texture: glow::Texture,
    pick_depth: glow::Renderbuffer,
    pick_size: (i32, i32),
    shadow_framebuffer: glow::Framebuffer,
    shadow_cubemap: glow::Texture,
    float_shadow: bool,
}

impl RenderEngine {
    pub fn new(gl: &glow::Context) -> Self {
        let solid_program = compile_program(gl, SOLID_VS, SOLID_FS);
        let shaded_program = compile_program(gl, SHADED_VS, SHADED_FS);
        let shadow_program = compile_program(gl, SHADOW_VS, SHADOW_FS);
        let pick_program = compile_program(gl, PICK_VS, PICK_FS);

        let float_shadow = {
            let extensions = gl.supported_extensions();
            extensions.contains("EXT_color_buffer_float")
                || extensions.contains("GL_ARB_color_buffer_float")
                || extensions.contains("GL_EXT_color_buffer_float")
        };

        unsafe {
            // Picking target, resized lazily to the viewport.
            let pick_framebuffer = gl.create_framebuffer().expect("Cannot create framebuffer");
            let pick_texture = gl.create_texture().expect("Cannot create texture");
            let pick_depth = gl.create_renderbuffer().expect("Cannot create renderbuffer");

            // Shadow cubemap at a fixed resolution, float faces when the
            // driver supports rendering to them.
            let size = config::SHADOW_TEXTURE_SIZE;
            let shadow_cubemap = gl.create_texture().expect("Cannot create texture");
            gl.bind_texture(glow::TEXTURE_CUBE_MAP, Some(shadow_cubemap));
            let (internal, data_type) = if float_shadow {
                (glow::RGBA32F, glow::FLOAT)
            } else {
                (glow::RGBA, glow::UNSIGNED_BYTE)
            };
            for face in 0..6 {
                gl.tex_image_2d(
                    glow::TEXTURE_CUBE_MAP_POSITIVE_X + face,
                    0,
                    internal as i32,
                    size,
                    size,
                    0,
                    glow::RGBA,
                    data_type,
                    glow::PixelUnpackData::Slice(None),
                );
            }
            gl.tex_parameter_i32(
                glow::TEXTURE_CUBE_MAP,
                glow::TEXTURE_MIN_FILTER,
                glow::LINEAR as i32,
            );
            gl.tex_parameter_i32(
                glow::TEXTURE_CUBE_MAP,
                glow::TEXTURE_MAG_FILTER,
                glow::LINEAR as i32,
            );
            gl.tex_parameter_i32(
                glow::TEXTURE_CUBE_MAP,
                glow::TEXTURE_WRAP_S,
                glow::MIRRORED_REPEAT as i32,
            );
            gl.tex_parameter_i32(
                glow::TEXTURE_CUBE_MAP,
                glow::TEXTURE_WRAP_T,
                glow::MIRRORED_REPEAT as i32,
            );

            let shadow_framebuffer = gl.create_framebuffer().expect("Cannot create framebuffer");
            let shadow_depth = gl.create_renderbuffer().expect("Cannot create renderbuffer");
            gl.bind_framebuffer(glow::FRAMEBUFFER, Some(shadow_framebuffer));
            gl.bind_renderbuffer(glow::RENDERBUFFER, Some(shadow_depth));
            gl.renderbuffer_storage(glow::RENDERBUFFER, glow::DEPTH_COMPONENT16, size, size);
            gl.framebuffer_renderbuffer(
                glow::FRAMEBUFFER,
                glow::DEPTH_ATTACHMENT,
                glow::RENDERBUFFER,
                Some(shadow_depth),
            );
            gl.bind_framebuffer(glow::FRAMEBUFFER, None);

            Self {
                solid_program,
                shaded_program,
                shadow_program,
                pick_program,
                meshes: HashMap::new(),
                textures: HashMap::new(),
                pick_framebuffer,
                pick_texture,
                pick_depth,
                pick_size: (0, 0),
                shadow_framebuffer,
                shadow_cubemap,
                float_shadow,
            }
        }
    }

    pub fn upload_mesh(&mut self, gl: &glow::Context, id: MeshId, vertices: &[f32]) {
        if self.meshes.contains_key(&id) {
            return;
        }
        unsafe {
            let vertex_array = gl.create_vertex_array().expect("Cannot create vertex array");
            let buffer = gl.create_buffer().expect("Cannot create buffer");
            gl.bind_vertex_array(Some(vertex_array));
            gl.bind_buffer(glow::ARRAY_BUFFER, Some(buffer));
            let bytes = core::slice::from_raw_parts(
                vertices.as_ptr() as *const u8,
                std::mem::size_of_val(vertices),
            );
            gl.buffer_data_u8_slice(glow::ARRAY_BUFFER, bytes, glow::STATIC_DRAW);

            let stride = (VERTEX_STRIDE * 4) as i32;
            gl.enable_vertex_attrib_array(0);
            gl.vertex_attrib_pointer_f32(0, 3, glow::FLOAT, false, stride, 0);
            gl.enable_vertex_attrib_array(1);
            gl.vertex_attrib_pointer_f32(1, 3, glow::FLOAT, false, stride, 12);
            gl.enable_vertex_attrib_array(2);
            gl.vertex_attrib_pointer_f32(2, 2, glow::FLOAT, false, stride, 24);
            gl.bind_vertex_array(None);

            self.meshes.insert(
                id,
                GpuMesh {
                    vertex_array,
                    buffer,
                    vertex_count: (vertices.len() / VERTEX_STRIDE) as i32,
                },
            );
        }
    }

    pub fn upload_texture(&mut self, gl: &glow::Context, skin: Skin, tex: &SurfaceTexture) {
        if self.textures.contains_key(&skin) {
            return;
        }
        unsafe {
            let texture = gl.create_texture().expect("Cannot create texture");
            gl.bind_texture(glow::TEXTURE_2D, Some(texture));

            let pixels: Vec<u8> = tex.pixels.iter().flat_map(|&[r, g, b]| [r, g, b]).collect();
            gl.tex_image_2d(
                glow::TEXTURE_2D,
                0,
                glow::RGB as i32,
                tex.width as i32,
                tex.height as i32,
                0,
                glow::RGB,
                glow::UNSIGNED_BYTE,
                glow::PixelUnpackData::Slice(Some(&pixels)),
            );
            gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MIN_FILTER, glow::LINEAR as i32);
            gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MAG_FILTER, glow::LINEAR as i32);
            gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_S, glow::REPEAT as i32);
            gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_T, glow::CLAMP_TO_EDGE as i32);
            self.textures.insert(skin, texture);
        }
    }

    fn ensure_pick_target(&mut self, gl: &glow::Context, width: i32, height: i32) {
        if self.pick_size == (width, height) {
            return;
        }
        unsafe {
            gl.bind_texture(glow::TEXTURE_2D, Some(self.pick_texture));
            gl.tex_image_2d(
                glow::TEXTURE_2D,
                0,
                glow::RGBA as i32,
                width,
                height,
                0,
                glow::RGBA,
                glow::UNSIGNED_BYTE,
                glow::PixelUnpackData::Slice(None),
            );
            gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MIN_FILTER, glow::LINEAR as i32);
            gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MAG_FILTER, glow::LINEAR as i32);
            gl.tex_parameter_i32(
                glow::TEXTURE_2D,
                glow::TEXTURE_WRAP_S,
                glow::CLAMP_TO_EDGE as i32,
            );
            gl.tex_parameter_i32(
                glow::TEXTURE_2D,
                glow::TEXTURE_WRAP_T,
                glow::CLAMP_TO_EDGE as i32,
            );

            gl.bind_renderbuffer(glow::RENDERBUFFER, Some(self.pick_depth));
            gl.renderbuffer_storage(glow::RENDERBUFFER, glow::DEPTH_COMPONENT16, width, height);

            gl.bind_framebuffer(glow::FRAMEBUFFER, Some(self.pick_framebuffer));
            gl.framebuffer_texture_2d(
                glow::FRAMEBUFFER,
                glow::COLOR_ATTACHMENT0,
                glow::TEXTURE_2D,
                Some(self.pick_texture),
                0,
            );
            gl.framebuffer_renderbuffer(
                glow::FRAMEBUFFER,
                glow::DEPTH_ATTACHMENT,
                glow::RENDERBUFFER,
                Some(self.pick_depth),
            );
            gl.bind_framebuffer(glow::FRAMEBUFFER, None);
            self.pick_size = (width, height);
        }
    }

    /// Renders the solid list with per-object id colors into the picking
    /// target and reads back the pixel under the cursor. Returns the index
    /// of the hit item in the list, or `None` for the background.
    #[allow(clippy::too_many_arguments)]
    pub fn pick(
        &mut self,
        gl: &glow::Context,
        frame: &FrameBundle,
        mouse_x: i32,
        mouse_y: i32,
        width: i32,
        height: i32,
    ) -> Option<usize> {
        if frame.solid.is_empty() {
            return None;
        }
        self.ensure_pick_target(gl, width, height);
        let proj = math::perspective(
            frame.fov,
            width as f32 / height as f32,
            config::CLIP_NEAR,
            None,
        );
        unsafe {
            gl.bind_framebuffer(glow::FRAMEBUFFER, Some(self.pick_framebuffer));
            gl.disable(glow::SCISSOR_TEST);
            gl.viewport(0, 0, width, height);
            gl.enable(glow::DEPTH_TEST);
            gl.disable(glow::BLEND);
            gl.clear_color(0.0, 0.0, 0.0, 0.0);
            gl.clear(glow::COLOR_BUFFER_BIT | glow::DEPTH_BUFFER_BIT);

            gl.use_program(Some(self.pick_program));
            set_matrix(gl, self.pick_program, "mView", &frame.view);
            set_matrix(gl, self.pick_program, "mProj", &proj);
            for (index, item) in frame.solid.iter().enumerate() {
                let Some(mesh) = self.meshes.get(&item.mesh) else { continue };
                let id = encode_id(index);
                gl.uniform_4_f32(
                    gl.get_uniform_location(self.pick_program, "id").as_ref(),
                    id[0],
                    id[1],
                    id[2],
                    id[3],
                );
                set_matrix(gl, self.pick_program, "mWorld", &item.world);
                gl.bind_vertex_array(Some(mesh.vertex_array));
                gl.draw_arrays(glow::TRIANGLES, 0, mesh.vertex_count);
            }

            let mut pixel = [0u8; 4];
            gl.read_pixels(
                mouse_x,
                height - mouse_y - 1,
                1,
                1,
                glow::RGBA,
                glow::UNSIGNED_BYTE,
                glow::PixelPackData::Slice(Some(&mut pixel)),
            );
            gl.bind_framebuffer(glow::FRAMEBUFFER, None);
            decode_id(pixel)
        }
    }

    /// Renders the distance from the light to every shaded body into the
    /// six cubemap faces. Element 0 of the shaded list is the light itself
    /// and casts no shadow.
    pub fn shadow_pass(&self, gl: &glow::Context, frame: &FrameBundle) {
        if frame.shaded.is_empty() {
            log::warn!("shadow pass skipped: no shaded objects");
            return;
        }
        let size = config::SHADOW_TEXTURE_SIZE;
        let [near, far] = config::SHADOW_CLIP;
        let proj = math::perspective(std::f32::consts::FRAC_PI_2, 1.0, near, Some(far));
        let rig = shadow_rig(frame.light_position);
        unsafe {
            gl.bind_framebuffer(glow::FRAMEBUFFER, Some(self.shadow_framebuffer));
            gl.disable(glow::SCISSOR_TEST);
            gl.viewport(0, 0, size, size);
            gl.enable(glow::DEPTH_TEST);
            gl.disable(glow::BLEND);
            gl.use_program(Some(self.shadow_program));
            gl.uniform_3_f32(
                gl.get_uniform_location(self.shadow_program, "lightPos").as_ref(),
                frame.light_position.x,
                frame.light_position.y,
                frame.light_position.z,
            );
            gl.uniform_2_f32(
                gl.get_uniform_location(self.shadow_program, "shadowClip").as_ref(),
                near,
                far,
            );
            set_matrix(gl, self.shadow_program, "mProj", &proj);

            for (face, cam) in rig.iter().enumerate() {
                gl.framebuffer_texture_2d(
                    glow::FRAMEBUFFER,
                    glow::COLOR_ATTACHMENT0,
                    glow::TEXTURE_CUBE_MAP_POSITIVE_X + face as u32,
                    Some(self.shadow_cubemap),
                    0,
                );
                gl.clear_color(1.0, 1.0, 1.0, 1.0);
                gl.clear(glow::COLOR_BUFFER_BIT | glow::DEPTH_BUFFER_BIT);
                set_matrix(gl, self.shadow_program, "mView", &cam.view_matrix());

                for item in frame.shaded.iter().skip(1) {
                    let Some(mesh) = self.meshes.get(&item.mesh) else { continue };
                    set_matrix(gl, self.shadow_program, "mWorld", &item.world);
                    gl.bind_vertex_array(Some(mesh.vertex_array));
                    gl.draw_arrays(glow::TRIANGLES, 0, mesh.vertex_count);
                }
            }
            gl.bind_framebuffer(glow::FRAMEBUFFER, None);
        }
    }

    /// Forward pass into the current framebuffer: clears to the background
    /// color, then draws shaded bodies followed by the ambient-only list.
    pub fn render(
        &self,
        gl: &glow::Context,
        frame: &FrameBundle,
        viewport: (i32, i32, i32, i32),
    ) {
        let (x, y, width, height) = viewport;
        let proj = math::perspective(
            frame.fov,
            width as f32 / height as f32,
            config::CLIP_NEAR,
            None,
        );
        unsafe {
            gl.viewport(x, y, width, height);
            // The off-screen passes disabled scissoring; restore it so the
            // clear stays inside the panel being painted.
            gl.enable(glow::SCISSOR_TEST);
            gl.scissor(x, y, width, height);
            gl.enable(glow::DEPTH_TEST);
            gl.enable(glow::BLEND);
            gl.blend_func(glow::SRC_ALPHA, glow::ONE_MINUS_SRC_ALPHA);
            let [r, g, b] = config::BACKGROUND_COLOR;
            gl.clear_color(r, g, b, 1.0);
            gl.clear(glow::COLOR_BUFFER_BIT | glow::DEPTH_BUFFER_BIT);
        }
        self.render_shaded(gl, frame, &proj);
        self.render_solid(gl, frame, &proj);
    }

    fn render_solid(&self, gl: &glow::Context, frame: &FrameBundle, proj: &Matrix4<f32>) {
        unsafe {
            gl.use_program(Some(self.solid_program));
            set_matrix(gl, self.solid_program, "mView", &frame.view);
            set_matrix(gl, self.solid_program, "mProj", proj);
            gl.uniform_1_i32(
                gl.get_uniform_location(self.solid_program, "objTexture").as_ref(),
                0,
            );
            for item in &frame.solid {
                let Some(mesh) = self.meshes.get(&item.mesh) else { continue };
                set_matrix(gl, self.solid_program, "mWorld", &item.world);
                gl.uniform_3_f32(
                    gl.get_uniform_location(self.solid_program, "ambColor").as_ref(),
                    item.amb_color[0],
                    item.amb_color[1],
                    item.amb_color[2],
                );
                gl.uniform_1_f32(
                    gl.get_uniform_location(self.solid_program, "alpha").as_ref(),
                    item.alpha,
                );
                gl.active_texture(glow::TEXTURE0);
                let textured = item
                    .skin
                    .and_then(|skin| self.textures.get(&skin))
                    .map(|tex| gl.bind_texture(glow::TEXTURE_2D, Some(*tex)))
                    .is_some();
                gl.uniform_1_f32(
                    gl.get_uniform_location(self.solid_program, "enableTexture").as_ref(),
                    if textured { 1.0 } else { 0.0 },
                );
                gl.bind_vertex_array(Some(mesh.vertex_array));
                gl.draw_arrays(glow::TRIANGLES, 0, mesh.vertex_count);
            }
        }
    }

    fn render_shaded(&self, gl: &glow::Context, frame: &FrameBundle, proj: &Matrix4<f32>) {
        if frame.shaded.len() < 2 {
            return;
        }
        let [near, far] = config::SHADOW_CLIP;
        let bias = if self.float_shadow {
            config::SHADOW_BIAS_FLOAT
        } else {
            config::SHADOW_BIAS_BYTE
        };
        unsafe {
            gl.use_program(Some(self.shaded_program));
            set_matrix(gl, self.shaded_program, "mView", &frame.view);
            set_matrix(gl, self.shaded_program, "mProj", proj);
            gl.uniform_3_f32(
                gl.get_uniform_location(self.shaded_program, "lightPosition").as_ref(),
                frame.light_position.x,
                frame.light_position.y,
                frame.light_position.z,
            );
            gl.uniform_3_f32(
                gl.get_uniform_location(self.shaded_program, "camPosition").as_ref(),
                frame.cam_position.x,
                frame.cam_position.y,
                frame.cam_position.z,
            );
            gl.uniform_2_f32(
                gl.get_uniform_location(self.shaded_program, "shadowClip").as_ref(),
                near,
                far,
            );
            gl.uniform_1_f32(
                gl.get_uniform_location(self.shaded_program, "bias").as_ref(),
                bias,
            );
            gl.active_texture(glow::TEXTURE0);
            gl.bind_texture(glow::TEXTURE_CUBE_MAP, Some(self.shadow_cubemap));
            gl.uniform_1_i32(
                gl.get_uniform_location(self.shaded_program, "lightShadowMap").as_ref(),
                0,
            );
            gl.uniform_1_i32(
                gl.get_uniform_location(self.shaded_program, "objTexture").as_ref(),
                1,
            );
            // The light contributes the specular color for every body.
            let spe = frame.light_color;

            for item in frame.shaded.iter().skip(1) {
                let Some(mesh) = self.meshes.get(&item.mesh) else { continue };
                set_matrix(gl, self.shaded_program, "mWorld", &item.world);
                set_matrix(gl, self.shaded_program, "mNormal", &item.normal);
                gl.uniform_1_f32(
                    gl.get_uniform_location(self.shaded_program, "kAmb").as_ref(),
                    item.material.k_amb,
                );
                gl.uniform_1_f32(
                    gl.get_uniform_location(self.shaded_program, "kDif").as_ref(),
                    item.material.k_dif,
                );
                gl.uniform_1_f32(
                    gl.get_uniform_location(self.shaded_program, "kSpe").as_ref(),
                    item.material.k_spe,
                );
                gl.uniform_1_f32(
                    gl.get_uniform_location(self.shaded_program, "shininess").as_ref(),
                    item.material.shininess,
                );
                gl.uniform_3_f32(
                    gl.get_uniform_location(self.shaded_program, "ambColor").as_ref(),
                    item.amb_color[0],
                    item.amb_color[1],
                    item.amb_color[2],
                );
                gl.uniform_3_f32(
                    gl.get_uniform_location(self.shaded_program, "difColor").as_ref(),
                    item.dif_color[0],
                    item.dif_color[1],
                    item.dif_color[2],
                );
                gl.uniform_3_f32(
                    gl.get_uniform_location(self.shaded_program, "speColor").as_ref(),
                    spe[0],
                    spe[1],
                    spe[2],
                );
                gl.uniform_1_f32(
                    gl.get_uniform_location(self.shaded_program, "alpha").as_ref(),
                    item.alpha,
                );
                gl.active_texture(glow::TEXTURE1);
                let textured = item
                    .skin
                    .and_then(|skin| self.textures.get(&skin))
                    .map(|tex| gl.bind_texture(glow::TEXTURE_2D, Some(*tex)))
                    .is_some();
                gl.uniform_1_f32(
                    gl.get_uniform_location(self.shaded_program, "enableTexture").as_ref(),
                    if textured { 1.0 } else { 0.0 },
                );
                gl.bind_vertex_array(Some(mesh.vertex_array));
                gl.draw_arrays(glow::TRIANGLES, 0, mesh.vertex_count);
            }
        }
    }

    pub fn destroy(&self, gl: &glow::Context) {
        unsafe {
            gl.delete_program(self.solid_program);
            gl.delete_program(self.shaded_program);
            gl.delete_program(self.shadow_program);
            gl.delete_program(self.pick_program);
            for mesh in self.meshes.values() {
                gl.delete_vertex_array(mesh.vertex_array);
                gl.delete_buffer(mesh.buffer);
            }
            for texture in self.textures.values() {
                gl.delete_texture(*texture);
            }
            gl.delete_framebuffer(self.pick_framebuffer);
            gl.delete_texture(self.pick_texture);
            gl.delete_renderbuffer(self.pick_depth);
            gl.delete_framebuffer(self.shadow_framebuffer);
            gl.delete_texture(self.shadow_cubemap);
        }
    }
}

/// Packs a pickable index into an RGBA color. Index `i` is stored as the
/// little-endian bytes of `i + 1` so the cleared background decodes to none.
fn encode_id(index: usize) -> [f32; 4] {
    let bytes = ((index + 1) as u32).to_le_bytes();
    bytes.map(|b| b as f32 / 255.0)
}

fn decode_id(pixel: [u8; 4]) -> Option<usize> {
    let value = u32::from_le_bytes(pixel);
    if value == 0 {
        None
    } else {
        Some((value - 1) as usize)
    }
}

fn set_matrix(gl: &glow::Context, program: glow::Program, name: &str, matrix: &Matrix4<f32>) {
    unsafe {
        gl.uniform_matrix_4_f32_slice(
            gl.get_uniform_location(program, name).as_ref(),
            false,
            matrix.as_slice(),
        );
    }
}

fn compile_program(gl: &glow::Context, vertex_source: &str, fragment_source: &str) -> glow::Program {
    let shader_version = if cfg!(target_arch = "wasm32") {
        "#version 300 es"
    } else {
        "#version 330"
    };

    unsafe {
        let program = gl.create_program().expect("Cannot create program");

        let shader_sources = [
            (glow::VERTEX_SHADER, vertex_source),
            (glow::FRAGMENT_SHADER, fragment_source),
        ];

        let shaders: Vec<_> = shader_sources
            .iter()
            .map(|(shader_type, shader_source)| {
                let shader = gl.create_shader(*shader_type).expect("Cannot create shader");
                gl.shader_source(shader, &format!("{shader_version}\n{shader_source}"));
                gl.compile_shader(shader);
                assert!(
                    gl.get_shader_compile_status(shader),
                    "Failed to compile shader: {}",
                    gl.get_shader_info_log(shader)
                );
                gl.attach_shader(program, shader);
                shader
            })
            .collect();

        gl.link_program(program);
        assert!(
            gl.get_program_link_status(program),
            "Failed to link program: {}",
            gl.get_program_info_log(program)
        );

        for shader in shaders {
            gl.detach_shader(program, shader);
            gl.delete_shader(shader);
        }

        program
    }
}

const SOLID_VS: &str = r#"
    layout (location = 0) in vec3 position;
    layout (location = 2) in vec2 texCoord;

    uniform mat4 mWorld;
    uniform mat4 mView;
    uniform mat4 mProj;

    out vec2 v_tex;

    void main() {
        v_tex = texCoord;
        gl_Position = mProj * mView * mWorld * vec4(position, 1.0);
    }
"#;

const SOLID_FS: &str = r#"
    precision highp float;
    in vec2 v_tex;
    out vec4 out_color;

    uniform vec3 ambColor;
    uniform float alpha;
    uniform sampler2D objTexture;
    uniform float enableTexture;

    void main() {
        vec3 color = ambColor;
        if (enableTexture > 0.5) {
            color *= texture(objTexture, v_tex).rgb;
        }
        out_color = vec4(color, alpha);
    }
"#;

const PICK_VS: &str = r#"
    layout (location = 0) in vec3 position;

    uniform mat4 mWorld;
    uniform mat4 mView;
    uniform mat4 mProj;

    void main() {
        gl_Position = mProj * mView * mWorld * vec4(position, 1.0);
    }
"#;

const PICK_FS: &str = r#"
    precision highp float;
    out vec4 out_color;

    uniform vec4 id;

    void main() {
        out_color = id;
    }
"#;

const SHADOW_VS: &str = r#"
    layout (location = 0) in vec3 position;

    uniform mat4 mWorld;
    uniform mat4 mView;
    uniform mat4 mProj;

    out vec3 v_world_pos;

    void main() {
        vec4 world_pos = mWorld * vec4(position, 1.0);
        v_world_pos = world_pos.xyz;
        gl_Position = mProj * mView * world_pos;
    }
"#;

const SHADOW_FS: &str = r#"
    precision highp float;
    in vec3 v_world_pos;
    out vec4 out_color;

    uniform vec3 lightPos;
    uniform vec2 shadowClip;

    void main() {
        float depth = (length(v_world_pos - lightPos) - shadowClip.x)
            / (shadowClip.y - shadowClip.x);
        out_color = vec4(vec3(depth), 1.0);
    }
"#;

const SHADED_VS: &str = r#"
    layout (location = 0) in vec3 position;
    layout (location = 1) in vec3 normal;
    layout (location = 2) in vec2 texCoord;

    uniform mat4 mWorld;
    uniform mat4 mNormal;
    uniform mat4 mView;
    uniform mat4 mProj;

    out vec3 v_pos;
    out vec3 v_normal;
    out vec2 v_tex;

    void main() {
        vec4 world_pos = mWorld * vec4(position, 1.0);
        v_pos = world_pos.xyz;
        v_normal = normalize((mNormal * vec4(normal, 0.0)).xyz);
        v_tex = texCoord;
        gl_Position = mProj * mView * world_pos;
    }
"#;

const SHADED_FS: &str = r#"
    precision highp float;
    in vec3 v_pos;
    in vec3 v_normal;
    in vec2 v_tex;
    out vec4 out_color;

    uniform float kAmb;
    uniform float kDif;
    uniform float kSpe;
    uniform float shininess;
    uniform vec3 ambColor;
    uniform vec3 difColor;
    uniform vec3 speColor;
    uniform float alpha;
    uniform vec3 lightPosition;
    uniform vec3 camPosition;
    uniform vec2 shadowClip;
    uniform float bias;
    uniform samplerCube lightShadowMap;
    uniform sampler2D objTexture;
    uniform float enableTexture;

    void main() {
        vec3 to_light = lightPosition - v_pos;
        float light_dist = length(to_light);
        vec3 L = normalize(to_light);
        vec3 N = normalize(v_normal);
        vec3 V = normalize(camPosition - v_pos);
        vec3 R = reflect(-L, N);

        float stored = texture(lightShadowMap, v_pos - lightPosition).r;
        float current = (light_dist - shadowClip.x) / (shadowClip.y - shadowClip.x);
        float lit = (current - bias) <= stored ? 1.0 : 0.0;

        vec3 base_amb = ambColor;
        vec3 base_dif = difColor;
        if (enableTexture > 0.5) {
            vec3 tex_color = texture(objTexture, v_tex).rgb;
            base_amb *= tex_color;
            base_dif *= tex_color;
        }

        vec3 color = kAmb * base_amb
            + lit * kDif * base_dif * max(dot(N, L), 0.0)
            + lit * kSpe * speColor * pow(max(dot(R, V), 0.0), shininess);
        out_color = vec4(color, alpha);
    }
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_roundtrip_covers_small_and_large_indices() {
        for index in [0usize, 1, 254, 255, 256, 65_535, 1_000_000] {
            let encoded = encode_id(index);
            let pixel = encoded.map(|c| (c * 255.0).round() as u8);
            assert_eq!(decode_id(pixel), Some(index));
        }
    }

    #[test]
    fn cleared_background_decodes_to_none() {
        assert_eq!(decode_id([0, 0, 0, 0]), None);
    }
}
