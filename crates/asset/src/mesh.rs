//! CPU-side mesh representation: parse tables and the flattened output.

use bytemuck::{Pod, Zeroable};

use crate::{
    error::{Attribute, MeshError, MeshResult},
    index::ObjIndex,
};

/// Record counts gathered by the sizing pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MeshInfo {
    pub positions: usize,
    pub texels: usize,
    pub normals: usize,
    pub faces: usize,
}

impl MeshInfo {
    /// Output vertex count. Every triangle contributes three independent vertices.
    pub fn vertices(&self) -> usize {
        self.faces * 3
    }
}

/// One face corner: indices into the position, texel and normal tables.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Corner {
    pub position: ObjIndex,
    pub texel: ObjIndex,
    pub normal: ObjIndex,
}

impl Corner {
    pub const fn new(position: i64, texel: i64, normal: i64) -> Self {
        Self {
            position: ObjIndex::new(position),
            texel: ObjIndex::new(texel),
            normal: ObjIndex::new(normal),
        }
    }
}

/// Triangle, corners in file order (winding).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Face {
    pub corners: [Corner; 3],
}

/// Attribute tables and faces of a single load. Dropped once flattened.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshTables {
    pub positions: Vec<[f32; 3]>,
    pub texels: Vec<[f32; 2]>,
    pub normals: Vec<[f32; 3]>,
    pub faces: Vec<Face>,
}

impl MeshTables {
    /// Tables pre-sized for the given counts.
    pub fn with_capacity(info: &MeshInfo) -> Self {
        Self {
            positions: Vec::with_capacity(info.positions),
            texels: Vec::with_capacity(info.texels),
            normals: Vec::with_capacity(info.normals),
            faces: Vec::with_capacity(info.faces),
        }
    }

    pub fn info(&self) -> MeshInfo {
        MeshInfo {
            positions: self.positions.len(),
            texels: self.texels.len(),
            normals: self.normals.len(),
            faces: self.faces.len(),
        }
    }

    /// Resolve every face corner and write the de-indexed buffers.
    ///
    /// Output vertex `3 * face + corner` takes its attributes from that corner.
    /// Nothing is returned if any corner points outside its table.
    pub fn flatten(&self) -> MeshResult<FlattenedMesh> {
        let info = self.info();
        let extrema = VerticalExtrema::of(&self.positions);

        let vertices = info.vertices();
        let mut positions = Vec::with_capacity(vertices * 3);
        let mut texels = Vec::with_capacity(vertices * 2);
        let mut normals = Vec::with_capacity(vertices * 3);

        for (face_no, face) in self.faces.iter().enumerate() {
            for (corner_no, corner) in face.corners.iter().enumerate() {
                let at = |attribute| (face_no, corner_no, attribute);
                positions.extend_from_slice(lookup(
                    &self.positions,
                    corner.position,
                    at(Attribute::Position),
                )?);
                texels.extend_from_slice(lookup(
                    &self.texels,
                    corner.texel,
                    at(Attribute::Texel),
                )?);
                normals.extend_from_slice(lookup(
                    &self.normals,
                    corner.normal,
                    at(Attribute::Normal),
                )?);
            }
        }

        Ok(FlattenedMesh {
            info,
            positions,
            texels,
            normals,
            extrema,
        })
    }
}

fn lookup<const N: usize>(
    table: &[[f32; N]],
    index: ObjIndex,
    (face, corner, attribute): (usize, usize, Attribute),
) -> MeshResult<&[f32; N]> {
    index
        .resolve(table.len())
        .map(|offset| &table[offset])
        .ok_or_else(|| MeshError::DanglingReference {
            face,
            corner,
            attribute,
            index: index.raw(),
            len: table.len(),
        })
}

/// Positions with the largest and smallest Y in a position table.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VerticalExtrema {
    pub highest: [f32; 3],
    pub lowest: [f32; 3],
}

impl VerticalExtrema {
    /// Scan a position table. On equal Y the earlier row is kept.
    /// Rows with a NaN Y are skipped; `None` when no row is left.
    pub fn of(positions: &[[f32; 3]]) -> Option<Self> {
        let mut rows = positions.iter().filter(|p| !p[1].is_nan());
        let first = rows.next()?;
        let mut highest = first;
        let mut lowest = first;
        for p in rows {
            if p[1] > highest[1] {
                highest = p;
            }
            if p[1] < lowest[1] {
                lowest = p;
            }
        }
        Some(Self {
            highest: *highest,
            lowest: *lowest,
        })
    }

    /// Vertical size of the mesh.
    pub fn span(&self) -> f32 {
        self.highest[1] - self.lowest[1]
    }

    /// Y of the liquid surface for a fill level in `[0, 1]`. Out-of-range levels are clamped.
    pub fn fill_height(&self, level: f32) -> f32 {
        self.lowest[1] + self.span() * level.clamp(0.0, 1.0)
    }
}

/// Vertex with position/normal/uv. Values are in object space.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl MeshVertex {
    pub fn new(position: [f32; 3], normal: [f32; 3], uv: [f32; 2]) -> Self {
        Self {
            position,
            normal,
            uv,
        }
    }
}

/// De-indexed triangle list: three parallel attribute buffers plus vertical extrema.
#[derive(Clone, Debug, PartialEq)]
pub struct FlattenedMesh {
    info: MeshInfo,
    positions: Vec<f32>,
    texels: Vec<f32>,
    normals: Vec<f32>,
    extrema: Option<VerticalExtrema>,
}

impl FlattenedMesh {
    pub fn info(&self) -> MeshInfo {
        self.info
    }

    pub fn vertex_count(&self) -> usize {
        self.info.vertices()
    }

    /// `vertex_count() * 3` floats, XYZ per vertex.
    pub fn positions(&self) -> &[f32] {
        &self.positions
    }

    /// `vertex_count() * 2` floats, UV per vertex.
    pub fn texels(&self) -> &[f32] {
        &self.texels
    }

    /// `vertex_count() * 3` floats, XYZ per vertex.
    pub fn normals(&self) -> &[f32] {
        &self.normals
    }

    pub fn extrema(&self) -> Option<VerticalExtrema> {
        self.extrema
    }

    pub fn highest(&self) -> Option<[f32; 3]> {
        self.extrema.map(|e| e.highest)
    }

    pub fn lowest(&self) -> Option<[f32; 3]> {
        self.extrema.map(|e| e.lowest)
    }

    /// Interleaved view over the output vertices, in buffer order.
    pub fn vertices(&self) -> impl Iterator<Item = MeshVertex> + '_ {
        self.positions
            .chunks_exact(3)
            .zip(self.normals.chunks_exact(3))
            .zip(self.texels.chunks_exact(2))
            .map(|((p, n), t)| {
                MeshVertex::new([p[0], p[1], p[2]], [n[0], n[1], n[2]], [t[0], t[1]])
            })
    }

    pub fn position_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.positions)
    }

    pub fn texel_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.texels)
    }

    pub fn normal_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.normals)
    }

    /// Returns `true` if the buffers hold at least one triangle.
    pub fn is_valid(&self) -> bool {
        self.vertex_count() > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle_tables() -> MeshTables {
        MeshTables {
            positions: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            texels: vec![[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]],
            normals: vec![[0.0, 0.0, 1.0]],
            faces: vec![Face {
                corners: [Corner::new(1, 1, 1), Corner::new(2, 2, 1), Corner::new(3, 3, 1)],
            }],
        }
    }

    #[test]
    fn flatten_keeps_corner_order() {
        let mesh = triangle_tables().flatten().expect("flatten");
        assert_eq!(
            mesh.positions(),
            &[0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0]
        );
        assert_eq!(mesh.texels(), &[0.0, 0.0, 1.0, 0.0, 0.0, 1.0]);
        assert_eq!(mesh.normals(), &[0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0]);
        assert_eq!(mesh.vertex_count(), 3);
        assert!(mesh.is_valid());
    }

    #[test]
    fn flatten_reversed_winding_is_not_reordered() {
        let mut tables = triangle_tables();
        tables.faces[0].corners.reverse();
        let mesh = tables.flatten().expect("flatten");
        assert_eq!(
            mesh.positions(),
            &[0.0, 1.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0]
        );
    }

    #[test]
    fn shared_position_repeats_in_every_slot() {
        let mut tables = triangle_tables();
        let corner = Corner::new(2, 1, 1);
        tables.faces = vec![Face { corners: [corner; 3] }; 4];
        let mesh = tables.flatten().expect("flatten");
        assert_eq!(mesh.positions().len(), 4 * 9);
        for slot in mesh.positions().chunks_exact(3) {
            assert_eq!(slot, &[1.0, 0.0, 0.0]);
        }
    }

    #[test]
    fn dangling_texel_aborts_flatten() {
        let mut tables = triangle_tables();
        tables.faces[0].corners[2] = Corner::new(3, 7, 1);
        match tables.flatten() {
            Err(MeshError::DanglingReference {
                face,
                corner,
                attribute,
                index,
                len,
            }) => {
                assert_eq!((face, corner), (0, 2));
                assert_eq!(attribute, Attribute::Texel);
                assert_eq!(index, 7);
                assert_eq!(len, 3);
            }
            other => panic!("expected dangling reference, got {other:?}"),
        }
    }

    #[test]
    fn zero_position_index_is_dangling() {
        let mut tables = triangle_tables();
        tables.faces[0].corners[0] = Corner::new(0, 1, 1);
        assert!(matches!(
            tables.flatten(),
            Err(MeshError::DanglingReference {
                attribute: Attribute::Position,
                index: 0,
                ..
            })
        ));
    }

    #[test]
    fn extrema_ties_keep_first_row() {
        let positions = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [5.0, 1.0, 5.0]];
        let e = VerticalExtrema::of(&positions).expect("non-empty");
        assert_eq!(e.highest, [0.0, 1.0, 0.0]);
        assert_eq!(e.lowest, [0.0, 0.0, 0.0]);
        assert!(VerticalExtrema::of(&[]).is_none());
    }

    #[test]
    fn extrema_skip_nan_heights() {
        let positions = [
            [0.0, f32::NAN, 0.0],
            [0.0, 5.0, 0.0],
            [0.0, -5.0, 0.0],
            [1.0, f32::NAN, 1.0],
        ];
        let e = VerticalExtrema::of(&positions).expect("finite rows present");
        assert_eq!(e.highest, [0.0, 5.0, 0.0]);
        assert_eq!(e.lowest, [0.0, -5.0, 0.0]);
        assert!(e.highest[1] >= e.lowest[1]);

        assert!(VerticalExtrema::of(&[[0.0, f32::NAN, 0.0]]).is_none());
    }

    #[test]
    fn fill_height_clamps_level() {
        let e = VerticalExtrema {
            highest: [0.0, 3.0, 0.0],
            lowest: [0.0, -1.0, 0.0],
        };
        assert_eq!(e.span(), 4.0);
        assert_eq!(e.fill_height(0.5), 1.0);
        assert_eq!(e.fill_height(-2.0), -1.0);
        assert_eq!(e.fill_height(7.0), 3.0);
    }

    #[test]
    fn interleaved_view_matches_buffers() {
        let mesh = triangle_tables().flatten().expect("flatten");
        let vertices: Vec<MeshVertex> = mesh.vertices().collect();
        assert_eq!(vertices.len(), 3);
        assert_eq!(
            vertices[1],
            MeshVertex::new([1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [1.0, 0.0])
        );
        assert_eq!(mesh.position_bytes().len(), 9 * 4);
        assert_eq!(mesh.texel_bytes().len(), 6 * 4);
        assert_eq!(mesh.normal_bytes().len(), 9 * 4);
        assert_eq!(bytemuck::bytes_of(&vertices[0]).len(), 32);
    }

    #[test]
    fn empty_tables_flatten_to_empty_mesh() {
        let mesh = MeshTables::default().flatten().expect("flatten");
        assert!(!mesh.is_valid());
        assert!(mesh.highest().is_none());
        assert!(mesh.positions().is_empty());
    }
}
