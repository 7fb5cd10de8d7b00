//! Bake a flattened mesh into Rust source, so a model can ship as constants
//! instead of being parsed at startup.

use std::fmt;

use thiserror::Error;

use crate::mesh::FlattenedMesh;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BakeError {
    #[error("'{0}' is not a usable module name")]
    InvalidName(String),
}

/// Strict and reserved keywords of the 2024 edition.
const KEYWORDS: &[&str] = &[
    "Self", "abstract", "as", "async", "await", "become", "box", "break", "const", "continue",
    "crate", "do", "dyn", "else", "enum", "extern", "false", "final", "fn", "for", "gen", "if",
    "impl", "in", "let", "loop", "macro", "match", "mod", "move", "mut", "override", "priv", "pub",
    "ref", "return", "self", "static", "struct", "super", "trait", "true", "try", "type", "typeof",
    "unsafe", "unsized", "use", "virtual", "where", "while", "yield",
];

/// Render `mesh` as `pub mod <name> { ... }` holding `VERTICES`, `POSITIONS`,
/// `TEXELS`, `NORMALS` and, when the mesh has positions, `HIGHEST`/`LOWEST`.
pub fn to_rust_module(name: &str, mesh: &FlattenedMesh) -> Result<String, BakeError> {
    if !is_module_name(name) {
        return Err(BakeError::InvalidName(name.to_string()));
    }
    Ok(BakedModule { name, mesh }.to_string())
}

/// Snake-case module name for a file stem such as `AgingVessel` or `bright-beer vessel`.
pub fn module_name_from(stem: &str) -> Option<String> {
    let mut out = String::with_capacity(stem.len() + 4);
    let mut prev_lower = false;
    for c in stem.chars() {
        if c.is_ascii_alphanumeric() {
            if c.is_ascii_uppercase() && prev_lower && !out.ends_with('_') {
                out.push('_');
            }
            out.push(c.to_ascii_lowercase());
            prev_lower = c.is_ascii_lowercase() || c.is_ascii_digit();
        } else {
            if !out.is_empty() && !out.ends_with('_') {
                out.push('_');
            }
            prev_lower = false;
        }
    }
    let trimmed = out.trim_end_matches('_');
    let name = if trimmed.starts_with(|c: char| c.is_ascii_digit()) {
        format!("mesh_{trimmed}")
    } else if KEYWORDS.contains(&trimmed) {
        format!("{trimmed}_mesh")
    } else {
        trimmed.to_string()
    };
    is_module_name(&name).then_some(name)
}

fn is_module_name(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    (first.is_ascii_alphabetic() || first == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        && name != "_"
        && !KEYWORDS.contains(&name)
}

struct BakedModule<'a> {
    name: &'a str,
    mesh: &'a FlattenedMesh,
}

impl fmt::Display for BakedModule<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let info = self.mesh.info();
        writeln!(f, "// Generated mesh module: {}", self.name)?;
        writeln!(f, "// Positions: {}", info.positions)?;
        writeln!(f, "// Texels: {}", info.texels)?;
        writeln!(f, "// Normals: {}", info.normals)?;
        writeln!(f, "// Faces: {}", info.faces)?;
        writeln!(f, "// Vertices: {}", info.vertices())?;
        writeln!(f)?;
        writeln!(f, "#[rustfmt::skip]")?;
        writeln!(f, "pub mod {} {{", self.name)?;
        writeln!(f, "    pub const VERTICES: usize = {};", info.vertices())?;
        write_floats(f, "POSITIONS", self.mesh.positions(), 3)?;
        write_floats(f, "TEXELS", self.mesh.texels(), 2)?;
        write_floats(f, "NORMALS", self.mesh.normals(), 3)?;
        if let Some(extrema) = self.mesh.extrema() {
            writeln!(f)?;
            writeln!(f, "    pub const HIGHEST: [f32; 3] = {};", Row(&extrema.highest))?;
            writeln!(f, "    pub const LOWEST: [f32; 3] = {};", Row(&extrema.lowest))?;
        }
        writeln!(f, "}}")
    }
}

fn write_floats(
    f: &mut fmt::Formatter<'_>,
    label: &str,
    values: &[f32],
    width: usize,
) -> fmt::Result {
    writeln!(f)?;
    writeln!(f, "    pub static {label}: [f32; {}] = [", values.len())?;
    for row in values.chunks(width) {
        write!(f, "       ")?;
        for v in row {
            write!(f, " {},", Literal(*v))?;
        }
        writeln!(f)?;
    }
    writeln!(f, "    ];")
}

struct Row<'a>(&'a [f32]);

impl fmt::Display for Row<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, v) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", Literal(*v))?;
        }
        f.write_str("]")
    }
}

/// An `f32` spelled as a valid Rust expression.
struct Literal(f32);

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let v = self.0;
        if v.is_nan() {
            f.write_str("f32::NAN")
        } else if v.is_infinite() {
            f.write_str(if v > 0.0 { "f32::INFINITY" } else { "f32::NEG_INFINITY" })
        } else {
            write!(f, "{v:?}")
        }
    }
}
