//! Asset loading: OBJ meshes flattened into GPU-ready attribute buffers.
//! Meshes can also be baked into Rust source (see [`bake`]).

pub mod bake;
pub mod error;
pub mod index;
pub mod mesh;
pub mod obj;
pub mod source;

pub use error::{MeshError, MeshResult};
pub use mesh::{FlattenedMesh, MeshInfo, MeshVertex, VerticalExtrema};
pub use obj::{load_obj, load_obj_from_path, load_obj_from_str};
pub use source::{FileSource, MeshSource};
