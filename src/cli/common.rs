//! Common utilities shared across CLI commands.

use std::fs;
use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result};
use jwalk::WalkDir;

use crate::config::{PreviewConfig, WatchConfig};
use crate::core::FileKind;
use crate::preview::PreviewContext;

/// Pick the project directory: CLI argument, then `[watch].root`, then cwd.
pub fn resolve_root(dir: Option<&Path>, config: &PreviewConfig) -> Result<PathBuf> {
    let root = match (dir, &config.watch.root) {
        (Some(dir), _) => dir.to_path_buf(),
        (None, Some(root)) => root.clone(),
        (None, None) => std::env::current_dir().context("failed to read current directory")?,
    };
    if !root.is_dir() {
        anyhow::bail!("not a directory: {}", root.display());
    }
    root.canonicalize()
        .with_context(|| format!("failed to resolve {}", root.display()))
}

/// Project path of `path` relative to `root`: `/src/App.tsx`.
///
/// `None` for paths outside the root.
pub fn project_path(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let mut key = String::new();
    for component in relative.components() {
        let Component::Normal(part) = component else {
            return None;
        };
        key.push('/');
        key.push_str(&part.to_string_lossy());
    }
    (!key.is_empty()).then_some(key)
}

/// Whether the engine should hold this file: text kinds only.
pub fn is_loadable(path: &Path) -> bool {
    let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
        return false;
    };
    !matches!(
        FileKind::from_extension(&ext.to_ascii_lowercase()),
        FileKind::Asset | FileKind::Other
    )
}

/// Collect every loadable file under `root`, skipping ignored directories.
pub fn collect_files(root: &Path, watch: &WatchConfig) -> Vec<PathBuf> {
    let ignore = watch.ignore.clone();
    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .process_read_dir(move |_, _, _, children| {
            children.retain(|child| {
                child.as_ref().is_ok_and(|entry| {
                    let name = entry.file_name().to_string_lossy();
                    !(entry.file_type().is_dir() && ignore.iter().any(|i| *i == name))
                })
            });
        })
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .map(|e| e.path())
        .filter(|path| is_loadable(path))
        .collect();
    files.sort();
    files
}

/// Read a file into the context under its project path.
///
/// Returns the project path, or `None` when the file is outside the root.
pub fn load_file(ctx: &PreviewContext, root: &Path, path: &Path) -> Result<Option<String>> {
    let Some(key) = project_path(root, path) else {
        return Ok(None);
    };
    let content =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    ctx.create_file(&key, &content)
        .with_context(|| format!("failed to store {key}"))?;
    Ok(Some(key))
}

/// Load the whole project. Unreadable files are logged and skipped.
pub fn load_project(ctx: &PreviewContext, root: &Path) -> usize {
    let mut loaded = 0;
    for path in collect_files(root, &ctx.config().watch) {
        match load_file(ctx, root, &path) {
            Ok(Some(_)) => loaded += 1,
            Ok(None) => {}
            Err(err) => crate::log!("load"; "{:#}", err),
        }
    }
    crate::debug!("load"; "{} file(s) from {}", loaded, root.display());
    loaded
}
