//! Boundary reconstruction for convex brushes.
//!
//! A brush is a convex solid given as the intersection of half-spaces. This
//! crate turns one into explicit polygons:
//!
//! 1. every triple of planes is intersected and the points lying inside the
//!    brush are kept, merging near-duplicates ([`enumerate_vertices`]);
//! 2. for every plane the vertices on it are sorted by angle around their
//!    centroid, giving a clockwise winding seen from outside
//!    ([`assemble_faces`]).
//!
//! # Example
//!
//! ```
//! use brush_mesh::{mesh_brush, Brush, MeshConfig, Plane};
//! use nalgebra::Vector3;
//!
//! // Unit cube, normals pointing out of the solid
//! let brush = Brush::new(vec![
//!     Plane::new(-Vector3::x(), 0.0),
//!     Plane::new(Vector3::x(), 1.0),
//!     Plane::new(-Vector3::y(), 0.0),
//!     Plane::new(Vector3::y(), 1.0),
//!     Plane::new(-Vector3::z(), 0.0),
//!     Plane::new(Vector3::z(), 1.0),
//! ]);
//!
//! let mesh = mesh_brush(&brush, &MeshConfig::default()).unwrap();
//! assert_eq!(mesh.vertices().len(), 8);
//! assert_eq!(mesh.face_count(), 6);
//! ```

mod batch;
mod brush;
mod config;
mod error;
mod face;
mod frame;
mod mesh;
mod plane;
mod vertex;

pub use batch::{mesh_brushes, BatchReport, SkippedBrush};
pub use brush::{Brush, BrushFlags};
pub use config::{MeshConfig, DEFAULT_MAX_PLANES};
pub use error::{MeshError, Result};
pub use face::{assemble_face, assemble_faces, Face};
pub use frame::{tangent_binormal, Frame};
pub use mesh::{mesh_brush, BrushMesh, MeshStats};
pub use plane::{Plane, DEGENERATE_NORMAL_LENGTH, PLANE_EPSILON};
pub use vertex::{
    enumerate_vertices, enumerate_vertices_with_stats, intersect_three_planes, VertexStats,
    MIN_SOLID_PLANES,
};
