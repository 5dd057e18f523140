//! Drawable geometry: validated CPU-side vertex data and its GPU upload.
//!
//! This module provides the two halves of the geometry registry:
//!
//! - [`Geometry`]: positions, colors, topology and fill mode, checked for
//!   consistency before anything touches the GPU
//! - [`Drawable`]: the uploaded form, owning one position buffer and one
//!   color buffer; dropping it releases both
//!
//! # Color Sources
//!
//! Colors come either per vertex or as one color broadcast to every vertex:
//!
//! ```
//! use pocket_arcade::{ColorSource, Geometry, Topology};
//!
//! let positions = vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
//!
//! let rainbow = Geometry::new(
//!     Topology::Triangles,
//!     positions.clone(),
//!     ColorSource::PerVertex(vec![[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]]),
//! )
//! .unwrap();
//!
//! let white = Geometry::new(Topology::Triangles, positions, ColorSource::Uniform([1.0; 3])).unwrap();
//! assert_eq!(white.colors(), &[[1.0; 3]; 3]);
//! # let _ = rainbow;
//! ```
//!
//! # Vertex Layout
//!
//! Positions and colors live in separate, tightly packed buffers:
//!
//! | Buffer slot | Attribute | Format    | Shader Location |
//! |-------------|-----------|-----------|-----------------|
//! | 0           | position  | Float32x3 | 0               |
//! | 1           | color     | Float32x3 | 1               |

use crate::gpu::GpuContext;

/// Primitive topology of a drawable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Topology {
    Points,
    Lines,
    LineStrip,
    Triangles,
    TriangleStrip,
}

impl Topology {
    /// Vertices consumed per primitive for list topologies.
    fn list_stride(self) -> Option<usize> {
        match self {
            Topology::Lines => Some(2),
            Topology::Triangles => Some(3),
            Topology::Points | Topology::LineStrip | Topology::TriangleStrip => None,
        }
    }

    /// Fewest vertices that produce at least one primitive.
    fn min_vertices(self) -> usize {
        match self {
            Topology::Points => 1,
            Topology::Lines | Topology::LineStrip => 2,
            Topology::Triangles | Topology::TriangleStrip => 3,
        }
    }

    pub(crate) fn to_wgpu(self) -> wgpu::PrimitiveTopology {
        match self {
            Topology::Points => wgpu::PrimitiveTopology::PointList,
            Topology::Lines => wgpu::PrimitiveTopology::LineList,
            Topology::LineStrip => wgpu::PrimitiveTopology::LineStrip,
            Topology::Triangles => wgpu::PrimitiveTopology::TriangleList,
            Topology::TriangleStrip => wgpu::PrimitiveTopology::TriangleStrip,
        }
    }
}

/// Rasterizer fill mode.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum FillMode {
    #[default]
    Fill,
    /// Wireframe; needs `POLYGON_MODE_LINE` on the device.
    Line,
}

impl FillMode {
    pub(crate) fn to_wgpu(self) -> wgpu::PolygonMode {
        match self {
            FillMode::Fill => wgpu::PolygonMode::Fill,
            FillMode::Line => wgpu::PolygonMode::Line,
        }
    }
}

/// Where a drawable's vertex colors come from.
#[derive(Clone, Debug, PartialEq)]
pub enum ColorSource {
    /// One RGB color per vertex, in vertex order.
    PerVertex(Vec<[f32; 3]>),
    /// One RGB color repeated for every vertex.
    Uniform([f32; 3]),
}

/// Reasons vertex data is rejected before upload.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GeometryError {
    #[error("geometry has no vertices")]
    Empty,
    #[error("{colors} colors supplied for {vertices} vertices")]
    ColorCountMismatch { vertices: usize, colors: usize },
    #[error("{vertices} vertices do not form whole {topology:?} primitives")]
    TopologyMismatch { topology: Topology, vertices: usize },
}

/// Validated vertex data ready for upload.
#[derive(Clone, Debug, PartialEq)]
pub struct Geometry {
    topology: Topology,
    fill_mode: FillMode,
    positions: Vec<[f32; 3]>,
    colors: Vec<[f32; 3]>,
}

impl Geometry {
    /// Checks and assembles vertex data.
    ///
    /// A [`ColorSource::Uniform`] color is broadcast to every position; a
    /// [`ColorSource::PerVertex`] list must match the position count
    /// exactly. List topologies also require whole primitives.
    pub fn new(
        topology: Topology,
        positions: Vec<[f32; 3]>,
        colors: ColorSource,
    ) -> Result<Self, GeometryError> {
        let vertices = positions.len();
        if vertices == 0 {
            return Err(GeometryError::Empty);
        }

        let whole = topology
            .list_stride()
            .is_none_or(|stride| vertices % stride == 0);
        if !whole || vertices < topology.min_vertices() {
            return Err(GeometryError::TopologyMismatch { topology, vertices });
        }

        let colors = match colors {
            ColorSource::PerVertex(colors) if colors.len() == vertices => colors,
            ColorSource::PerVertex(colors) => {
                return Err(GeometryError::ColorCountMismatch {
                    vertices,
                    colors: colors.len(),
                });
            }
            ColorSource::Uniform(color) => vec![color; vertices],
        };

        Ok(Self {
            topology,
            fill_mode: FillMode::Fill,
            positions,
            colors,
        })
    }

    /// Sets the fill mode (default [`FillMode::Fill`]).
    pub fn fill_mode(mut self, fill_mode: FillMode) -> Self {
        self.fill_mode = fill_mode;
        self
    }

    pub fn topology(&self) -> Topology {
        self.topology
    }

    pub fn positions(&self) -> &[[f32; 3]] {
        &self.positions
    }

    pub fn colors(&self) -> &[[f32; 3]] {
        &self.colors
    }

    pub fn vertex_count(&self) -> u32 {
        self.positions.len() as u32
    }
}

/// GPU-resident drawable: two vertex buffers plus draw metadata.
///
/// Immutable after upload. Owned by the [`DrawableRegistry`](crate::DrawableRegistry);
/// dropping it destroys both buffers.
#[derive(Debug)]
pub struct Drawable {
    pub(crate) position_buffer: wgpu::Buffer,
    pub(crate) color_buffer: wgpu::Buffer,
    pub(crate) topology: Topology,
    pub(crate) fill_mode: FillMode,
    pub(crate) vertex_count: u32,
}

impl Drawable {
    /// Vertex buffer layouts matching the table in the module docs.
    pub const LAYOUTS: [wgpu::VertexBufferLayout<'static>; 2] = [
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<[f32; 3]>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[wgpu::VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: wgpu::VertexFormat::Float32x3,
            }],
        },
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<[f32; 3]>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[wgpu::VertexAttribute {
                offset: 0,
                shader_location: 1,
                format: wgpu::VertexFormat::Float32x3,
            }],
        },
    ];

    /// Uploads validated geometry as static vertex data.
    pub fn upload(gpu: &GpuContext, geometry: &Geometry, label: &str) -> Self {
        use wgpu::util::DeviceExt;

        let position_buffer = gpu
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{label} Positions")),
                contents: bytemuck::cast_slice(geometry.positions()),
                usage: wgpu::BufferUsages::VERTEX,
            });

        let color_buffer = gpu
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{label} Colors")),
                contents: bytemuck::cast_slice(geometry.colors()),
                usage: wgpu::BufferUsages::VERTEX,
            });

        log::debug!(
            "uploaded '{label}': {} vertices, {:?}, {:?}",
            geometry.vertex_count(),
            geometry.topology,
            geometry.fill_mode
        );

        Self {
            position_buffer,
            color_buffer,
            topology: geometry.topology,
            fill_mode: geometry.fill_mode,
            vertex_count: geometry.vertex_count(),
        }
    }

    pub fn topology(&self) -> Topology {
        self.topology
    }

    pub fn fill_mode(&self) -> FillMode {
        self.fill_mode
    }

    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }
}

impl Drop for Drawable {
    fn drop(&mut self) {
        self.position_buffer.destroy();
        self.color_buffer.destroy();
        log::trace!("released drawable buffers ({} vertices)", self.vertex_count);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> Vec<[f32; 3]> {
        vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]
    }

    #[test]
    fn uniform_color_is_broadcast_to_every_vertex() {
        let geom = Geometry::new(
            Topology::Triangles,
            triangle(),
            ColorSource::Uniform([0.2, 0.4, 0.6]),
        )
        .unwrap();
        assert_eq!(geom.vertex_count(), 3);
        assert_eq!(geom.colors(), &[[0.2, 0.4, 0.6]; 3]);
    }

    #[test]
    fn per_vertex_colors_are_kept_in_order() {
        let colors = vec![[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];
        let geom = Geometry::new(
            Topology::Triangles,
            triangle(),
            ColorSource::PerVertex(colors.clone()),
        )
        .unwrap();
        assert_eq!(geom.colors(), colors.as_slice());
        assert_eq!(geom.topology(), Topology::Triangles);
    }

    #[test]
    fn short_color_list_is_rejected() {
        let err = Geometry::new(
            Topology::Triangles,
            triangle(),
            ColorSource::PerVertex(vec![[1.0, 0.0, 0.0]; 2]),
        )
        .unwrap_err();
        assert_eq!(
            err,
            GeometryError::ColorCountMismatch {
                vertices: 3,
                colors: 2
            }
        );
    }

    #[test]
    fn empty_geometry_is_rejected() {
        let err = Geometry::new(Topology::Points, vec![], ColorSource::Uniform([1.0; 3]))
            .unwrap_err();
        assert_eq!(err, GeometryError::Empty);
    }

    #[test]
    fn partial_triangles_are_rejected() {
        let mut positions = triangle();
        positions.push([1.0, 1.0, 0.0]);
        let err = Geometry::new(Topology::Triangles, positions, ColorSource::Uniform([1.0; 3]))
            .unwrap_err();
        assert_eq!(
            err,
            GeometryError::TopologyMismatch {
                topology: Topology::Triangles,
                vertices: 4
            }
        );
    }

    #[test]
    fn strips_accept_any_count_past_the_minimum() {
        let positions = vec![[0.0; 3]; 5];
        assert!(Geometry::new(Topology::TriangleStrip, positions, ColorSource::Uniform([1.0; 3])).is_ok());
        let err = Geometry::new(Topology::LineStrip, vec![[0.0; 3]], ColorSource::Uniform([1.0; 3]))
            .unwrap_err();
        assert!(matches!(err, GeometryError::TopologyMismatch { .. }));
    }

    #[test]
    fn fill_mode_defaults_to_fill() {
        let geom = Geometry::new(Topology::Triangles, triangle(), ColorSource::Uniform([1.0; 3]))
            .unwrap();
        assert_eq!(geom.fill_mode, FillMode::Fill);
        assert_eq!(geom.fill_mode(FillMode::Line).fill_mode, FillMode::Line);
    }
}
