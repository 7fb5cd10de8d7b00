//! Two-pass OBJ loader for triangle meshes with positions, texels and normals.
//!
//! Supported records: `v x y z`, `vt u v`, `vn x y z` and `f p/t/n p/t/n p/t/n`
//! with positive 1-based indices. Every other line (comments, `o`, `g`, `s`,
//! `usemtl`, ...) is ignored. Quads, negative indices and the `p//n` or `p`
//! corner forms are rejected rather than guessed at.
//!
//! Lines are classified on raw bytes, so an ignored line may hold any encoding.
//! Only recognised records must be UTF-8.

use std::{
    io::{self, BufRead},
    num::IntErrorKind,
    path::Path,
};

use crate::{
    error::{MalformedReason, MeshError, MeshResult, Pass},
    mesh::{Corner, Face, FlattenedMesh, MeshInfo, MeshTables},
    source::{FileSource, MeshSource},
};

/// Load an OBJ mesh from a file path. The file is opened once per pass.
pub fn load_obj_from_path(path: impl AsRef<Path>) -> MeshResult<FlattenedMesh> {
    load_obj(&FileSource::new(path))
}

/// Convenience helper to parse an OBJ string literal.
pub fn load_obj_from_str(contents: &str) -> MeshResult<FlattenedMesh> {
    load_obj(contents)
}

/// Size, extract and flatten a mesh.
pub fn load_obj<S: MeshSource + ?Sized>(source: &S) -> MeshResult<FlattenedMesh> {
    let info = scan_info(source)?;
    let tables = extract_tables(source, &info)?;
    let mesh = tables.flatten()?;
    log::info!(
        "Loaded mesh '{}': {} faces, {} vertices",
        source.name(),
        info.faces,
        mesh.vertex_count()
    );
    Ok(mesh)
}

/// Sizing pass: count records by tag without parsing their fields.
pub fn scan_info<S: MeshSource + ?Sized>(source: &S) -> MeshResult<MeshInfo> {
    let mut info = MeshInfo::default();
    for_each_line(source, Pass::Sizing, |_, line| {
        match classify(line) {
            Some((Record::Position, _)) => info.positions += 1,
            Some((Record::Texel, _)) => info.texels += 1,
            Some((Record::Normal, _)) => info.normals += 1,
            Some((Record::Face, _)) => info.faces += 1,
            None => {}
        }
        Ok(())
    })?;
    log::debug!(
        "Sized '{}': {} positions, {} texels, {} normals, {} faces",
        source.name(),
        info.positions,
        info.texels,
        info.normals,
        info.faces
    );
    Ok(info)
}

/// Extraction pass: parse every record into tables sized by `info`.
///
/// The source must yield the same record counts it did during sizing.
pub fn extract_tables<S: MeshSource + ?Sized>(
    source: &S,
    info: &MeshInfo,
) -> MeshResult<MeshTables> {
    let mut tables = MeshTables::with_capacity(info);
    for_each_line(source, Pass::Extraction, |line_no, line| {
        let Some((record, fields)) = classify(line) else {
            return Ok(());
        };
        let malformed =
            |reason| MeshError::malformed(line_no, &String::from_utf8_lossy(line), reason);
        let fields =
            std::str::from_utf8(fields).map_err(|_| malformed(MalformedReason::NotUtf8))?;
        match record {
            Record::Position => {
                let p = parse_floats::<3>(fields).map_err(malformed)?;
                tables.positions.push(p);
            }
            Record::Texel => {
                let t = parse_floats::<2>(fields).map_err(malformed)?;
                tables.texels.push(t);
            }
            Record::Normal => {
                let n = parse_floats::<3>(fields).map_err(malformed)?;
                tables.normals.push(n);
            }
            Record::Face => tables.faces.push(parse_face(fields).map_err(malformed)?),
        }
        Ok(())
    })?;

    let found = tables.info();
    if found != *info {
        return Err(MeshError::unavailable(
            source.name(),
            Pass::Extraction,
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("record counts changed between passes: {info:?} then {found:?}"),
            ),
        ));
    }
    Ok(tables)
}

fn for_each_line<S, F>(source: &S, pass: Pass, mut visit: F) -> MeshResult<()>
where
    S: MeshSource + ?Sized,
    F: FnMut(usize, &[u8]) -> MeshResult<()>,
{
    let mut reader = source
        .open()
        .map_err(|e| MeshError::unavailable(source.name(), pass, e))?;
    let mut buf = Vec::new();
    let mut line_no = 0;
    loop {
        buf.clear();
        let read = reader
            .read_until(b'\n', &mut buf)
            .map_err(|e| MeshError::unavailable(source.name(), pass, e))?;
        if read == 0 {
            return Ok(());
        }
        let line = buf.strip_suffix(b"\n").unwrap_or(&buf[..]);
        let line = line.strip_suffix(b"\r").unwrap_or(line);
        visit(line_no, line)?;
        line_no += 1;
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Record {
    Position,
    Texel,
    Normal,
    Face,
}

/// Record kind and the text after its two-character tag.
///
/// The tag must be followed by a space or tab (or, for `vt`/`vn`, the end of the
/// line), so `vtx ...` is an unknown tag rather than a texel.
fn classify(line: &[u8]) -> Option<(Record, &[u8])> {
    let tag = line.get(..2)?;
    let rest = &line[2..];
    let separated = matches!(rest.first(), None | Some(b' ' | b'\t'));
    match tag {
        b"v " | b"v\t" => Some((Record::Position, rest)),
        b"f " | b"f\t" => Some((Record::Face, rest)),
        b"vt" if separated => Some((Record::Texel, rest)),
        b"vn" if separated => Some((Record::Normal, rest)),
        _ => None,
    }
}

fn parse_floats<const N: usize>(fields: &str) -> Result<[f32; N], MalformedReason> {
    let found = fields.split_whitespace().count();
    if found != N {
        return Err(MalformedReason::FieldCount { expected: N, found });
    }
    let mut out = [0.0; N];
    for (slot, token) in out.iter_mut().zip(fields.split_whitespace()) {
        *slot = token.parse().map_err(|_| MalformedReason::NotANumber {
            token: token.to_string(),
        })?;
    }
    Ok(out)
}

fn parse_face(fields: &str) -> Result<Face, MalformedReason> {
    let found = fields.split_whitespace().count();
    if found != 3 {
        return Err(MalformedReason::FieldCount { expected: 3, found });
    }
    let mut corners = [Corner::new(0, 0, 0); 3];
    for (slot, group) in corners.iter_mut().zip(fields.split_whitespace()) {
        *slot = parse_corner(group)?;
    }
    Ok(Face { corners })
}

fn parse_corner(group: &str) -> Result<Corner, MalformedReason> {
    let parts: Vec<&str> = group.split('/').collect();
    let &[p, t, n] = parts.as_slice() else {
        return Err(MalformedReason::CornerFormat {
            group: group.to_string(),
        });
    };
    if p.is_empty() || t.is_empty() || n.is_empty() {
        return Err(MalformedReason::CornerFormat {
            group: group.to_string(),
        });
    }
    Ok(Corner::new(parse_index(p)?, parse_index(t)?, parse_index(n)?))
}

/// Integers too large for `i64` saturate, so they surface as dangling references
/// instead of being reported as non-numeric.
fn parse_index(token: &str) -> Result<i64, MalformedReason> {
    token.parse::<i64>().or_else(|e| match e.kind() {
        IntErrorKind::PosOverflow => Ok(i64::MAX),
        IntErrorKind::NegOverflow => Ok(i64::MIN),
        _ => Err(MalformedReason::NotANumber {
            token: token.to_string(),
        }),
    })
}
