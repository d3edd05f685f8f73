//! `preview check`: load a project once and report what the engine found.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use owo_colors::OwoColorize;

use super::common::{load_project, resolve_root};
use crate::config::PreviewConfig;
use crate::preview::PreviewContext;
use crate::triage::ErrorRecord;
use crate::utils::{plural_count, plural_s};

/// Errors without a path are grouped under this key.
const UNATTRIBUTED: &str = "<unattributed>";

/// Unresolved errors grouped by project path.
#[derive(Debug, Default)]
pub struct CheckReport {
    pub files: usize,
    pub errors: BTreeMap<String, Vec<ErrorRecord>>,
}

impl CheckReport {
    /// Snapshot the context's unresolved errors, oldest first per file.
    pub fn collect(ctx: &PreviewContext, files: usize) -> Self {
        let mut errors: BTreeMap<String, Vec<ErrorRecord>> = BTreeMap::new();
        for record in ctx.unresolved_errors().into_iter().rev() {
            let key = record
                .error
                .path
                .clone()
                .unwrap_or_else(|| UNATTRIBUTED.to_string());
            errors.entry(key).or_default().push(record);
        }
        Self { files, errors }
    }

    pub fn error_count(&self) -> usize {
        self.errors.values().map(Vec::len).sum()
    }

    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    /// Print every error with its recovery hint to stderr.
    pub fn print(&self) {
        for (path, records) in &self.errors {
            eprintln!();
            eprintln!("{}{}{}", "[".dimmed(), path.cyan(), "]".dimmed());
            for record in records {
                let position = match record.error.line {
                    Some(line) => format!("{line}:{}", record.error.column.unwrap_or(1)),
                    None => "-".to_string(),
                };
                eprintln!(
                    "{} {} {} {}",
                    "→".red(),
                    position.dimmed(),
                    record.category.name().red().bold(),
                    record.error.message
                );
                eprintln!("  {} {}", "hint:".dimmed(), record.hint.title);
            }
        }
    }
}

impl fmt::Display for CheckReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let total = self.error_count();
        if total == 0 {
            return write!(
                f,
                "{} {}",
                plural_count(self.files, "file").dimmed(),
                "all checks passed".green()
            );
        }
        write!(
            f,
            "{} {} {} {}",
            "found".dimmed(),
            total.to_string().red().bold(),
            format!("error{}", plural_s(total)).dimmed(),
            format!("in {}", plural_count(self.errors.len(), "file")).dimmed()
        )
    }
}

/// Run the check. Returns the report; the caller decides the exit code.
pub fn run_check(config: PreviewConfig, dir: Option<&Path>, export: Option<&Path>) -> Result<CheckReport> {
    let root = resolve_root(dir, &config)?;
    let ctx = PreviewContext::new(config);

    log!("check"; "loading {}", root.display());
    let files = load_project(&ctx, &root);
    if files == 0 {
        log!("check"; "no source files found");
    }

    let report = CheckReport::collect(&ctx, files);
    report.print();
    log!("check"; "{}", report);

    if let Some(path) = export {
        write_export(&ctx, path)?;
        log!("check"; "debug export written to {}", path.display());
    }
    Ok(report)
}

/// Serialize the debug export as pretty JSON.
pub fn write_export(ctx: &PreviewContext, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(&ctx.export_debug_data())
        .context("failed to serialize debug export")?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::triage::ErrorCategory;

    fn write(root: &Path, path: &str, content: &str) {
        let file = root.join(path);
        fs::create_dir_all(file.parent().unwrap()).unwrap();
        fs::write(file, content).unwrap();
    }

    #[test]
    fn test_clean_project() {
        crate::logger::set_quiet(true);
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "src/main.ts", "import { a } from './a';\nfunction f() { return a(); }");
        write(dir.path(), "src/a.ts", "export const a = () => 1;");

        let report = run_check(PreviewConfig::default(), Some(dir.path()), None).unwrap();
        assert_eq!(report.files, 2);
        assert!(report.is_clean());
    }

    #[test]
    fn test_errors_grouped_by_file() {
        crate::logger::set_quiet(true);
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "src/broken.ts", "function f() {\nimport nothing\n");
        write(dir.path(), "src/ok.ts", "export const ok = 1;");
        write(dir.path(), "styles/site.css", "body { color: red;");

        let report = run_check(PreviewConfig::default(), Some(dir.path()), None).unwrap();
        assert_eq!(report.error_count(), 3);
        assert_eq!(report.errors.len(), 2);

        let broken = &report.errors["/src/broken.ts"];
        assert_eq!(broken[0].category, ErrorCategory::Syntax);
        assert_eq!(broken[1].category, ErrorCategory::Import);
        assert_eq!(broken[1].error.line, Some(2));
        assert!(report.errors.contains_key("/styles/site.css"));
    }

    #[test]
    fn test_export_written() {
        crate::logger::set_quiet(true);
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "index.html", "<html><body></body></html>");
        let out = dir.path().join("debug/export.json");

        run_check(PreviewConfig::default(), Some(dir.path()), Some(&out)).unwrap();

        let export: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
        assert_eq!(export["files"][0]["path"], "/index.html");
        assert!(export["engine"].is_object());
    }
}
