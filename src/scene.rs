//! Scene description: globe mesh, outline batches, camera and materials.
//!
//! The scene is add-only. Outline batches are appended once loading has
//! settled and are never modified or removed afterwards, which lets the
//! renderer upload only what it has not seen yet.

use crate::config::{CameraSettings, GlobeConfig};
use crate::geo::LineSegmentBatch;
use glam::{Mat4, Vec3};
use std::f32::consts::PI;

/// Perspective camera looking at the globe.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub fov_y_rad: f32,
    pub near: f32,
    pub far: f32,
}

impl Camera {
    /// Places the camera on +Z at the configured distance, facing the origin.
    pub fn from_settings(settings: &CameraSettings) -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, settings.distance),
            target: Vec3::ZERO,
            up: Vec3::Y,
            fov_y_rad: settings.fov_degrees.to_radians(),
            near: settings.near,
            far: settings.far,
        }
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    pub fn projection_matrix_gl(&self, aspect_ratio: f32) -> Mat4 {
        Mat4::perspective_rh_gl(self.fov_y_rad, aspect_ratio, self.near, self.far)
    }

    /// Combined projection * view for the given viewport aspect ratio.
    pub fn view_projection(&self, aspect_ratio: f32) -> Mat4 {
        self.projection_matrix_gl(aspect_ratio) * self.view_matrix()
    }
}

/// Flat, unlit color.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BasicMaterial {
    /// Linear RGBA in 0..1
    pub color: [f32; 4],
}

impl BasicMaterial {
    pub fn from_rgb(rgb: [u8; 3]) -> Self {
        Self {
            color: [
                rgb[0] as f32 / 255.0,
                rgb[1] as f32 / 255.0,
                rgb[2] as f32 / 255.0,
                1.0,
            ],
        }
    }
}

/// Indexed triangle mesh of a UV sphere.
#[derive(Debug, Clone)]
pub struct SphereMesh {
    positions: Vec<Vec3>,
    indices: Vec<u32>,
}

impl SphereMesh {
    /// Builds a sphere with `width_segments` around and `height_segments`
    /// from pole to pole (at least 3 and 2 respectively).
    ///
    /// Vertex rings run from +Y down to -Y. The single-point pole rows only
    /// get one triangle per quad.
    pub fn new(radius: f32, width_segments: u32, height_segments: u32) -> Self {
        let w = width_segments.max(3);
        let h = height_segments.max(2);

        let mut positions = Vec::with_capacity(((w + 1) * (h + 1)) as usize);
        for iy in 0..=h {
            let v = iy as f32 / h as f32;
            for ix in 0..=w {
                let u = ix as f32 / w as f32;
                positions.push(Vec3::new(
                    -radius * (u * 2.0 * PI).cos() * (v * PI).sin(),
                    radius * (v * PI).cos(),
                    radius * (u * 2.0 * PI).sin() * (v * PI).sin(),
                ));
            }
        }

        let grid = |ix: u32, iy: u32| iy * (w + 1) + ix;
        let mut indices = Vec::with_capacity((6 * w * (h - 1)) as usize);
        for iy in 0..h {
            for ix in 0..w {
                let a = grid(ix + 1, iy);
                let b = grid(ix, iy);
                let c = grid(ix, iy + 1);
                let d = grid(ix + 1, iy + 1);

                if iy != 0 {
                    indices.extend_from_slice(&[a, b, d]);
                }
                if iy != h - 1 {
                    indices.extend_from_slice(&[b, c, d]);
                }
            }
        }

        Self { positions, indices }
    }

    #[cfg(test)]
    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Interleaved `x, y, z` floats for a vertex buffer.
    pub fn vertex_data(&self) -> Vec<f32> {
        self.positions.iter().flat_map(|p| p.to_array()).collect()
    }
}

/// Everything drawn each frame.
pub struct Scene {
    pub camera: Camera,
    globe: SphereMesh,
    globe_material: BasicMaterial,
    outline_material: BasicMaterial,
    outlines: Vec<LineSegmentBatch>,
}

impl Scene {
    /// Creates a scene holding only the bare globe.
    pub fn from_config(config: &GlobeConfig) -> Self {
        Self {
            camera: Camera::from_settings(&config.camera),
            globe: SphereMesh::new(
                config.radius as f32,
                config.width_segments,
                config.height_segments,
            ),
            globe_material: BasicMaterial::from_rgb(config.globe_color),
            outline_material: BasicMaterial::from_rgb(config.outline_color),
            outlines: Vec::new(),
        }
    }

    /// Appends outline batches. Empty batches are dropped.
    pub fn add_outlines(&mut self, batches: impl IntoIterator<Item = LineSegmentBatch>) {
        self.outlines
            .extend(batches.into_iter().filter(|batch| !batch.is_empty()));
    }

    pub fn globe(&self) -> &SphereMesh {
        &self.globe
    }

    pub fn globe_material(&self) -> BasicMaterial {
        self.globe_material
    }

    pub fn outline_material(&self) -> BasicMaterial {
        self.outline_material
    }

    pub fn outlines(&self) -> &[LineSegmentBatch] {
        &self.outlines
    }

    /// Total drawable segments across all outline batches.
    pub fn segment_count(&self) -> usize {
        self.outlines.iter().map(LineSegmentBatch::segment_count).sum()
    }
}
