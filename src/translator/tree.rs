use super::engine::translate_unit;
use crate::error::{Error, Result};
use crate::evaluator::{Context, Evaluator};
use crate::parser::scan_reader;
use std::env;
use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info};

/// Directories never descended into.
const SKIPPED_DIRS: &[&str] = &[".git", "node_modules", "bin", "dist"];

/// Extensions picked up when walking a tree.
const SOURCE_EXTENSIONS: &[&str] = &["java", "japaya"];

const HYBRID_EXTENSION: &str = "japaya";
const HOST_EXTENSION: &str = "java";

/// Scan everything `reader` yields and translate it.
pub fn translate_reader<R, E>(ctx: &Context, reader: R, evaluator: &E) -> Result<Vec<u8>>
where
    R: Read,
    E: Evaluator + ?Sized,
{
    let unit = scan_reader(reader)?;
    Ok(translate_unit(ctx, &unit, evaluator)?)
}

/// Translate `input` and atomically write the result to `output`.
pub fn translate_file<E>(ctx: &Context, input: &Path, output: &Path, evaluator: &E) -> Result<()>
where
    E: Evaluator + ?Sized,
{
    if input.as_os_str().is_empty() {
        return Err(Error::Validation("empty input path"));
    }
    if output.as_os_str().is_empty() {
        return Err(Error::Validation("empty output path"));
    }

    let file = File::open(input)
        .map_err(|e| Error::io(format!("open input {:?}", input), e))?;

    let translated =
        translate_reader(ctx, file, evaluator).map_err(|e| Error::in_file(input, e))?;

    atomic_write_file(output, &translated)
        .map_err(|e| Error::io(format!("write output {:?}", output), e))?;

    info!(input = %input.display(), output = %output.display(), "translated file");
    Ok(())
}

/// Write `data` to a temporary file beside `path`, then rename it into place.
///
/// Readers see either the old contents or the new, never a partial write.
pub fn atomic_write_file(path: &Path, data: &[u8]) -> io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let mut tmp = tempfile::Builder::new()
        .prefix(".japaya-")
        .suffix(".tmp")
        .tempfile_in(dir)?;
    tmp.write_all(data)?;
    tmp.as_file().sync_all()?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tmp.as_file()
            .set_permissions(fs::Permissions::from_mode(0o644))?;
    }

    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Translate a single file or a whole directory tree.
///
/// A directory input needs a directory output (created if missing); a file
/// input must not be pointed at an existing directory.
pub fn translate_path<E>(ctx: &Context, input: &Path, output: &Path, evaluator: &E) -> Result<()>
where
    E: Evaluator + ?Sized,
{
    let meta =
        fs::metadata(input).map_err(|e| Error::io(format!("stat input {:?}", input), e))?;

    if meta.is_dir() {
        if output.is_file() {
            return Err(Error::OutputNotDirectory(output.to_path_buf()));
        }
        fs::create_dir_all(output)
            .map_err(|e| Error::io(format!("mkdir output dir {:?}", output), e))?;
        return translate_tree(ctx, input, output, evaluator);
    }

    if output.is_dir() {
        return Err(Error::OutputIsDirectory(output.to_path_buf()));
    }
    translate_file(ctx, input, output, evaluator)
}

/// Walk `in_root` and mirror every translatable file under `out_root`.
///
/// `.japaya` files land as `.java`. The walk stops at the first failure.
pub fn translate_tree<E>(ctx: &Context, in_root: &Path, out_root: &Path, evaluator: &E) -> Result<()>
where
    E: Evaluator + ?Sized,
{
    let abs_in = lexical_absolute(in_root)?;
    let abs_out = lexical_absolute(out_root)?;
    if abs_out.starts_with(&abs_in) {
        return Err(Error::OutputInsideInput {
            input: in_root.to_path_buf(),
            output: out_root.to_path_buf(),
        });
    }

    walk(ctx, in_root, in_root, out_root, evaluator)
}

fn walk<E>(ctx: &Context, in_root: &Path, dir: &Path, out_root: &Path, evaluator: &E) -> Result<()>
where
    E: Evaluator + ?Sized,
{
    let mut entries = fs::read_dir(dir)
        .and_then(|it| it.collect::<io::Result<Vec<_>>>())
        .map_err(|e| Error::io(format!("read dir {:?}", dir), e))?;
    entries.sort_by_key(|entry| entry.file_name());

    for entry in entries {
        let path = entry.path();
        let file_type = entry
            .file_type()
            .map_err(|e| Error::io(format!("stat {:?}", path), e))?;

        if file_type.is_dir() {
            if is_skipped_dir(&entry.file_name().to_string_lossy()) {
                debug!(dir = %path.display(), "skipping directory");
                continue;
            }
            walk(ctx, in_root, &path, out_root, evaluator)?;
            continue;
        }

        if !file_type.is_file() || !should_translate(&path) {
            continue;
        }

        let rel = path.strip_prefix(in_root).unwrap_or(&path);
        let out_path = out_root.join(output_rel_path(rel));
        translate_file(ctx, &path, &out_path, evaluator)?;
    }

    Ok(())
}

fn is_skipped_dir(name: &str) -> bool {
    SKIPPED_DIRS.contains(&name)
}

fn extension_lower(path: &Path) -> Option<String> {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
}

/// Whether a file found while walking a tree gets translated.
pub fn should_translate(path: &Path) -> bool {
    extension_lower(path).is_some_and(|ext| SOURCE_EXTENSIONS.contains(&ext.as_str()))
}

/// Where a translated file lands, relative to the output root.
pub fn output_rel_path(rel: &Path) -> PathBuf {
    match extension_lower(rel) {
        Some(ext) if ext == HYBRID_EXTENSION => rel.with_extension(HOST_EXTENSION),
        _ => rel.to_path_buf(),
    }
}

/// Absolute form of `path` with `.` and `..` resolved without touching the disk.
fn lexical_absolute(path: &Path) -> Result<PathBuf> {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        env::current_dir()
            .map_err(|e| Error::io("resolve current dir", e))?
            .join(path)
    };

    let mut out = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    Ok(out)
}
