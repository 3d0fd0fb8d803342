//! OpenGL scene renderer.
//!
//! Draws the globe mesh and the outline batches of a [`Scene`] inside an egui
//! paint callback. GPU buffers are created once per scene object; since the
//! scene only ever grows, [`GlobeRenderer::sync`] uploads just the batches it
//! has not seen yet.

use crate::scene::Scene;
use glam::Mat4;
use glow::HasContext as _;

const VERTEX_SHADER: &str = r#"
    layout(location = 0) in vec3 a_position;
    uniform mat4 u_mvp;

    void main() {
        gl_Position = u_mvp * vec4(a_position, 1.0);
    }
"#;

const FRAGMENT_SHADER: &str = r#"
    precision mediump float;
    uniform vec4 u_color;
    out vec4 out_color;

    void main() {
        out_color = u_color;
    }
"#;

/// Per-frame values handed to the paint callback.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameUniforms {
    pub globe_mvp: Mat4,
    pub outline_mvp: Mat4,
    pub globe_color: [f32; 4],
    pub outline_color: [f32; 4],
}

impl FrameUniforms {
    /// Builds the matrices for the current rotation and viewport.
    ///
    /// When `spin_outlines` is false the outlines keep the identity model
    /// transform and only the sphere rotates.
    pub fn new(scene: &Scene, rotation_y: f32, spin_outlines: bool, aspect_ratio: f32) -> Self {
        let view_projection = scene.camera.view_projection(aspect_ratio);
        let globe_mvp = view_projection * Mat4::from_rotation_y(rotation_y);
        let outline_mvp = if spin_outlines {
            globe_mvp
        } else {
            view_projection
        };

        Self {
            globe_mvp,
            outline_mvp,
            globe_color: scene.globe_material().color,
            outline_color: scene.outline_material().color,
        }
    }
}

/// Runs its undo action when dropped unless disarmed.
///
/// Releases GL objects created early in an upload when a later step fails.
struct Rollback<F: FnOnce()> {
    undo: Option<F>,
}

impl<F: FnOnce()> Rollback<F> {
    fn new(undo: F) -> Self {
        Self { undo: Some(undo) }
    }

    fn disarm(mut self) {
        self.undo = None;
    }
}

impl<F: FnOnce()> Drop for Rollback<F> {
    fn drop(&mut self) {
        if let Some(undo) = self.undo.take() {
            undo();
        }
    }
}

/// Vertex (and optionally index) buffers of one drawable.
struct GpuMesh {
    vertex_array: glow::VertexArray,
    vertex_buffer: glow::Buffer,
    index_buffer: Option<glow::Buffer>,
    count: i32,
}

impl GpuMesh {
    /// Creates and fills the buffers. On error nothing stays allocated.
    fn upload(
        gl: &glow::Context,
        vertices: &[f32],
        indices: Option<&[u32]>,
    ) -> Result<Self, String> {
        let vertex_array = unsafe { gl.create_vertex_array()? };
        let vertex_array_guard =
            Rollback::new(move || unsafe { gl.delete_vertex_array(vertex_array) });

        let vertex_buffer = unsafe { gl.create_buffer()? };
        let vertex_buffer_guard =
            Rollback::new(move || unsafe { gl.delete_buffer(vertex_buffer) });

        let index_buffer = match indices {
            Some(_) => Some(unsafe { gl.create_buffer()? }),
            None => None,
        };

        vertex_buffer_guard.disarm();
        vertex_array_guard.disarm();

        unsafe {
            gl.bind_vertex_array(Some(vertex_array));
            gl.bind_buffer(glow::ARRAY_BUFFER, Some(vertex_buffer));
            gl.buffer_data_u8_slice(glow::ARRAY_BUFFER, &f32_bytes(vertices), glow::STATIC_DRAW);
            gl.enable_vertex_attrib_array(0);
            gl.vertex_attrib_pointer_f32(0, 3, glow::FLOAT, false, 3 * 4, 0);

            if let (Some(buffer), Some(indices)) = (index_buffer, indices) {
                gl.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, Some(buffer));
                let bytes: Vec<u8> = indices.iter().flat_map(|i| i.to_ne_bytes()).collect();
                gl.buffer_data_u8_slice(glow::ELEMENT_ARRAY_BUFFER, &bytes, glow::STATIC_DRAW);
            }

            gl.bind_vertex_array(None);
            gl.bind_buffer(glow::ARRAY_BUFFER, None);
            gl.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, None);
        }

        let count = match indices {
            Some(indices) => indices.len() as i32,
            None => (vertices.len() / 3) as i32,
        };

        Ok(Self {
            vertex_array,
            vertex_buffer,
            index_buffer,
            count,
        })
    }

    unsafe fn draw(&self, gl: &glow::Context, mode: u32) {
        gl.bind_vertex_array(Some(self.vertex_array));
        if self.index_buffer.is_some() {
            gl.draw_elements(mode, self.count, glow::UNSIGNED_INT, 0);
        } else {
            // An unpaired trailing point is ignored by GL_LINES.
            gl.draw_arrays(mode, 0, self.count);
        }
    }

    unsafe fn delete(&self, gl: &glow::Context) {
        gl.delete_vertex_array(self.vertex_array);
        gl.delete_buffer(self.vertex_buffer);
        if let Some(buffer) = self.index_buffer {
            gl.delete_buffer(buffer);
        }
    }
}

fn f32_bytes(values: &[f32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_ne_bytes()).collect()
}

/// Owns the shader program and every GPU buffer of the scene.
pub struct GlobeRenderer {
    program: glow::Program,
    globe: Option<GpuMesh>,
    outlines: Vec<GpuMesh>,
}

impl GlobeRenderer {
    pub fn new(gl: &glow::Context) -> Result<Self, String> {
        let shader_version = if cfg!(target_arch = "wasm32") {
            "#version 300 es"
        } else {
            "#version 330"
        };

        unsafe {
            let program = gl.create_program()?;

            let shader_sources = [
                (glow::VERTEX_SHADER, VERTEX_SHADER),
                (glow::FRAGMENT_SHADER, FRAGMENT_SHADER),
            ];

            let mut shaders = Vec::with_capacity(shader_sources.len());
            for (shader_type, shader_source) in shader_sources {
                let shader = gl.create_shader(shader_type)?;
                gl.shader_source(shader, &format!("{shader_version}\n{shader_source}"));
                gl.compile_shader(shader);
                if !gl.get_shader_compile_status(shader) {
                    let log = gl.get_shader_info_log(shader);
                    gl.delete_shader(shader);
                    gl.delete_program(program);
                    return Err(format!("Failed to compile shader: {}", log));
                }
                gl.attach_shader(program, shader);
                shaders.push(shader);
            }

            gl.link_program(program);
            let linked = gl.get_program_link_status(program);

            for shader in shaders {
                gl.detach_shader(program, shader);
                gl.delete_shader(shader);
            }

            if !linked {
                let log = gl.get_program_info_log(program);
                gl.delete_program(program);
                return Err(format!("Failed to link program: {}", log));
            }

            Ok(Self {
                program,
                globe: None,
                outlines: Vec::new(),
            })
        }
    }

    /// Uploads the globe mesh and any outline batches added since the last call.
    ///
    /// On error, whatever was uploaded before the failure stays owned by the
    /// renderer and is released by [`destroy`](Self::destroy).
    pub fn sync(&mut self, gl: &glow::Context, scene: &Scene) -> Result<(), String> {
        if self.globe.is_none() {
            let mesh = scene.globe();
            self.globe = Some(GpuMesh::upload(
                gl,
                &mesh.vertex_data(),
                Some(mesh.indices()),
            )?);
        }

        let pending = scene.outlines().len().saturating_sub(self.outlines.len());
        if pending > 0 {
            for batch in &scene.outlines()[self.outlines.len()..] {
                self.outlines
                    .push(GpuMesh::upload(gl, &batch.vertex_data(), None)?);
            }
            log::debug!("Uploaded {} outline batches", pending);
        }
        Ok(())
    }

    pub fn paint(&self, gl: &glow::Context, uniforms: &FrameUniforms) {
        unsafe {
            gl.use_program(Some(self.program));
            gl.clear(glow::DEPTH_BUFFER_BIT);
            gl.enable(glow::DEPTH_TEST);
            gl.depth_func(glow::LEQUAL);

            let u_mvp = gl.get_uniform_location(self.program, "u_mvp");
            let u_color = gl.get_uniform_location(self.program, "u_color");

            if let Some(globe) = &self.globe {
                gl.uniform_matrix_4_f32_slice(
                    u_mvp.as_ref(),
                    false,
                    &uniforms.globe_mvp.to_cols_array(),
                );
                gl.uniform_4_f32_slice(u_color.as_ref(), &uniforms.globe_color);
                globe.draw(gl, glow::TRIANGLES);
            }

            if !self.outlines.is_empty() {
                gl.uniform_matrix_4_f32_slice(
                    u_mvp.as_ref(),
                    false,
                    &uniforms.outline_mvp.to_cols_array(),
                );
                gl.uniform_4_f32_slice(u_color.as_ref(), &uniforms.outline_color);
                for outline in &self.outlines {
                    outline.draw(gl, glow::LINES);
                }
            }

            gl.bind_vertex_array(None);
            gl.disable(glow::DEPTH_TEST);
            gl.use_program(None);
        }
    }

    pub fn destroy(&self, gl: &glow::Context) {
        unsafe {
            gl.delete_program(self.program);
            if let Some(globe) = &self.globe {
                globe.delete(gl);
            }
            for outline in &self.outlines {
                outline.delete(gl);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GlobeConfig;
    use glam::Vec4;

    #[test]
    fn test_outlines_follow_globe_when_spinning() {
        let scene = Scene::from_config(&GlobeConfig::default());
        let uniforms = FrameUniforms::new(&scene, 0.3, true, 1.5);
        assert_eq!(uniforms.globe_mvp, uniforms.outline_mvp);
    }

    #[test]
    fn test_outlines_fixed_when_not_spinning() {
        let scene = Scene::from_config(&GlobeConfig::default());
        let uniforms = FrameUniforms::new(&scene, 0.3, false, 1.5);

        assert_eq!(uniforms.outline_mvp, scene.camera.view_projection(1.5));
        assert_ne!(uniforms.globe_mvp, uniforms.outline_mvp);
    }

    #[test]
    fn test_zero_rotation_matches_view_projection() {
        let scene = Scene::from_config(&GlobeConfig::default());
        let uniforms = FrameUniforms::new(&scene, 0.0, true, 1.0);
        let point = Vec4::new(0.0, 5.0, 0.0, 1.0);

        let a = uniforms.globe_mvp * point;
        let b = scene.camera.view_projection(1.0) * point;
        assert!((a - b).length() < 1e-5);
    }

    #[test]
    fn test_colors_from_materials() {
        let scene = Scene::from_config(&GlobeConfig::default());
        let uniforms = FrameUniforms::new(&scene, 0.0, true, 1.0);
        assert_eq!(uniforms.outline_color, [1.0, 1.0, 1.0, 1.0]);
        assert_eq!(uniforms.globe_color[2], 1.0);
    }

    #[test]
    fn test_rollback_runs_on_early_return() {
        use std::cell::RefCell;

        let released = RefCell::new(Vec::new());

        let create = |fail_at: usize| -> Result<(), String> {
            let first = Rollback::new(|| released.borrow_mut().push("vertex array"));
            if fail_at == 1 {
                return Err("no buffer".to_string());
            }
            let second = Rollback::new(|| released.borrow_mut().push("vertex buffer"));
            if fail_at == 2 {
                return Err("no index buffer".to_string());
            }
            second.disarm();
            first.disarm();
            Ok(())
        };

        assert!(create(1).is_err());
        assert_eq!(*released.borrow(), vec!["vertex array"]);

        released.borrow_mut().clear();
        assert!(create(2).is_err());
        assert_eq!(*released.borrow(), vec!["vertex buffer", "vertex array"]);

        released.borrow_mut().clear();
        assert!(create(0).is_ok());
        assert!(released.borrow().is_empty());
    }

    #[test]
    fn test_f32_bytes_length() {
        assert_eq!(f32_bytes(&[1.0, 2.0, 3.0]).len(), 12);
        assert_eq!(&f32_bytes(&[1.0])[..], &1.0f32.to_ne_bytes()[..]);
    }
}
