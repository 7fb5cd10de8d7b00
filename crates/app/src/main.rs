//! Entry point for vesselmesh.
//! Loads OBJ meshes, reports their size and fill extents, optionally bakes them to Rust.

use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, bail};
use asset::{FlattenedMesh, MeshResult, bake, load_obj_from_path};

const USAGE: &str = "\
usage: app [options] <mesh.obj>...

options:
  --bake-dir=DIR      write a Rust module per mesh into DIR
  --jobs=N            load at most N meshes in parallel
  --fill-level=L      report the fill plane height for level L in [0, 1]
  --help              show this message

logging is controlled with RUST_LOG (default: info)";

#[derive(Debug, PartialEq)]
struct Options {
    paths: Vec<PathBuf>,
    bake_dir: Option<PathBuf>,
    jobs: usize,
    fill_level: Option<f32>,
    help: bool,
}

impl Options {
    fn parse<I: IntoIterator<Item = String>>(args: I) -> Self {
        let mut opts = Options {
            paths: Vec::new(),
            bake_dir: None,
            jobs: default_jobs(),
            fill_level: None,
            help: false,
        };

        for arg in args {
            if arg == "--help" || arg == "-h" {
                opts.help = true;
            } else if let Some(v) = arg.strip_prefix("--bake-dir=") {
                opts.bake_dir = Some(PathBuf::from(v));
            } else if let Some(v) = arg.strip_prefix("--jobs=") {
                match v.parse::<usize>() {
                    Ok(n) if n > 0 => opts.jobs = n,
                    _ => log::warn!("Ignoring invalid --jobs value '{}'", v),
                }
            } else if let Some(v) = arg.strip_prefix("--fill-level=") {
                match v.parse::<f32>() {
                    Ok(level) if level.is_finite() => opts.fill_level = Some(level.clamp(0.0, 1.0)),
                    _ => log::warn!("Ignoring invalid --fill-level value '{}'", v),
                }
            } else if arg.starts_with("--") {
                log::warn!("Unknown option '{}', ignored.", arg);
            } else {
                opts.paths.push(PathBuf::from(arg));
            }
        }
        opts
    }
}

fn default_jobs() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Load every path, at most `jobs` at a time. Results come back in input order.
fn load_all(paths: &[PathBuf], jobs: usize) -> Vec<MeshResult<FlattenedMesh>> {
    if paths.is_empty() {
        return Vec::new();
    }
    let chunk = paths.len().div_ceil(jobs.max(1));
    std::thread::scope(|scope| {
        let workers: Vec<_> = paths
            .chunks(chunk)
            .map(|part| {
                scope.spawn(move || {
                    part.iter()
                        .map(|path| load_obj_from_path(path))
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        workers
            .into_iter()
            .flat_map(|w| w.join().unwrap_or_else(|panic| std::panic::resume_unwind(panic)))
            .collect()
    })
}

fn report(path: &Path, mesh: &FlattenedMesh, fill_level: Option<f32>) {
    let info = mesh.info();
    log::info!(
        "{}: {} positions, {} texels, {} normals, {} faces -> {} vertices",
        path.display(),
        info.positions,
        info.texels,
        info.normals,
        info.faces,
        mesh.vertex_count()
    );
    match mesh.extrema() {
        Some(extrema) => {
            log::info!(
                "{}: highest {:?}, lowest {:?}",
                path.display(),
                extrema.highest,
                extrema.lowest
            );
            if let Some(level) = fill_level {
                log::info!(
                    "{}: fill level {:.2} -> y = {:.4}",
                    path.display(),
                    level,
                    extrema.fill_height(level)
                );
            }
        }
        None => log::warn!("{}: mesh has no positions", path.display()),
    }
}

/// Module name per input path, derived from the file stem.
/// Fails when a stem yields no name or two inputs would bake to the same file.
fn bake_names(paths: &[PathBuf]) -> Result<Vec<String>> {
    let mut seen: HashMap<String, &Path> = HashMap::new();
    let mut names = Vec::with_capacity(paths.len());
    for path in paths {
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default();
        let Some(name) = bake::module_name_from(stem) else {
            bail!("Cannot derive a module name from {}", path.display());
        };
        if let Some(other) = seen.insert(name.clone(), path) {
            bail!(
                "{} and {} would both bake to {}.rs",
                other.display(),
                path.display(),
                name
            );
        }
        names.push(name);
    }
    Ok(names)
}

/// Write the baked module for `mesh` into `dir` as `<name>.rs`.
fn bake_to(dir: &Path, name: &str, mesh: &FlattenedMesh) -> Result<PathBuf> {
    let source = bake::to_rust_module(name, mesh)?;

    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create bake directory: {}", dir.display()))?;
    let out = dir.join(format!("{name}.rs"));
    fs::write(&out, source).with_context(|| format!("Failed to write {}", out.display()))?;
    Ok(out)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let opts = Options::parse(std::env::args().skip(1));
    if opts.help {
        println!("{USAGE}");
        return Ok(());
    }
    if opts.paths.is_empty() {
        bail!("No OBJ files given.\n\n{USAGE}");
    }
    log::info!(
        "Loading {} mesh(es) with up to {} job(s)",
        opts.paths.len(),
        opts.jobs
    );

    let names = match &opts.bake_dir {
        Some(_) => bake_names(&opts.paths)?,
        None => Vec::new(),
    };

    let results = load_all(&opts.paths, opts.jobs);
    let mut failed = 0usize;
    for (i, (path, result)) in opts.paths.iter().zip(results).enumerate() {
        let mesh = match result.with_context(|| format!("Failed to load {}", path.display())) {
            Ok(mesh) => mesh,
            Err(err) => {
                log::error!("{err:#}");
                failed += 1;
                continue;
            }
        };
        report(path, &mesh, opts.fill_level);
        if let Some(dir) = &opts.bake_dir {
            match bake_to(dir, &names[i], &mesh) {
                Ok(out) => log::info!("{}: baked to {}", path.display(), out.display()),
                Err(err) => {
                    log::error!("{err:#}");
                    failed += 1;
                }
            }
        }
    }

    if failed > 0 {
        bail!("{} of {} mesh(es) failed", failed, opts.paths.len());
    }
    log::info!("Done.");
    Ok(())
}
