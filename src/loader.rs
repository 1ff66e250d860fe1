//! Discovers statement files under an archive root.
//!
//! Expected layout: `<root>/<institution>/<level 1>/.../<file>.pdf`. The folder lineage
//! becomes the file's [`HierarchyKey`], padded so every file in a batch has the same depth.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::error::{AuditError, Result};
use crate::models::{HierarchyKey, MonthStamp};
use crate::profiles::LayoutRegistry;

#[derive(Debug, Clone, PartialEq)]
pub struct StatementFile {
    pub path: PathBuf,
    /// Path relative to the root, `/`-separated.
    pub source: String,
    pub key: HierarchyKey,
    pub institution: String,
    /// Registered account type matched against the path, if any.
    pub account_type: Option<&'static str>,
    /// Month stamped in the file name (`YYYY-MM-DD`).
    pub file_month: Option<MonthStamp>,
}

/// Walk `root` and return the whitelisted `.pdf` statements, sorted by path.
pub fn discover(
    root: &Path,
    institutions: &[String],
    registry: &LayoutRegistry,
) -> Result<Vec<StatementFile>> {
    if !root.is_dir() {
        return Err(AuditError::Other(format!(
            "{} is not a directory",
            root.display()
        )));
    }

    let mut paths: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| {
            p.extension()
                .and_then(|s| s.to_str())
                .map(|s| s.eq_ignore_ascii_case("pdf"))
                .unwrap_or(false)
        })
        .collect();
    paths.sort();

    let mut files = Vec::new();
    for path in paths {
        let Ok(relative) = path.strip_prefix(root) else {
            continue;
        };
        let parts: Vec<String> = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().to_string())
            .collect();
        // Files directly under the root have no institution folder.
        if parts.len() < 2 {
            debug!(path = %path.display(), "not inside an institution folder, skipping");
            continue;
        }
        let institution = &parts[0];
        if !institutions.iter().any(|i| i.eq_ignore_ascii_case(institution)) {
            debug!(path = %path.display(), "institution not whitelisted, skipping");
            continue;
        }

        let folders = &parts[1..parts.len() - 1];
        let file_name = &parts[parts.len() - 1];
        let source = parts.join("/");
        let lowered = source.to_lowercase();
        let account_type = registry
            .account_types(institution)
            .into_iter()
            .find(|t| lowered.contains(&t.to_lowercase()));

        files.push(StatementFile {
            key: HierarchyKey::new(institution, folders),
            institution: institution.to_uppercase(),
            account_type,
            file_month: month_from_file_name(file_name),
            path,
            source,
        });
    }

    let depth = files.iter().map(|f| f.key.depth()).max().unwrap_or(0);
    let files: Vec<StatementFile> = files
        .into_iter()
        .map(|mut f| {
            f.key = f.key.padded(depth);
            f
        })
        .collect();

    info!(root = %root.display(), files = files.len(), depth, "discovered statements");
    Ok(files)
}

fn date_stamp() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"([0-9]{4})-(0[1-9]|1[0-2])-(0[1-9]|[12][0-9]|3[01])").ok())
        .as_ref()
}

/// First `YYYY-MM-DD` stamp in a file name, truncated to its month.
pub fn month_from_file_name(name: &str) -> Option<MonthStamp> {
    let caps = date_stamp()?.captures(name)?;
    let year = caps.get(1)?.as_str().parse().ok()?;
    let month = caps.get(2)?.as_str().parse().ok()?;
    MonthStamp::from_ym(year, month)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, b"%PDF-1.4").unwrap();
    }

    fn rbc() -> Vec<String> {
        vec!["rbc".to_string()]
    }

    #[test]
    fn test_discovers_whitelisted_pdfs() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "RBC/Personal/Chequing/2020-01-11.pdf");
        touch(dir.path(), "RBC/Personal/Visa/2020-01-12.PDF");
        touch(dir.path(), "TD/Chequing/2020-01-11.pdf");
        touch(dir.path(), "RBC/Personal/notes.txt");

        let files = discover(dir.path(), &rbc(), &LayoutRegistry::default()).unwrap();
        assert_eq!(files.len(), 2);
        assert_eq!(files[0].source, "RBC/Personal/Chequing/2020-01-11.pdf");
        assert_eq!(files[0].key.to_string(), "RBC / PERSONAL / CHEQUING");
        assert_eq!(files[0].account_type, Some("Chequing"));
        assert_eq!(files[1].account_type, Some("Visa"));
        assert_eq!(files[0].file_month, MonthStamp::from_ym(2020, 1));
    }

    #[test]
    fn test_keys_padded_to_deepest_lineage() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "rbc/Joint/Chequing/2020-01-11.pdf");
        touch(dir.path(), "rbc/Visa/2020-02-11.pdf");

        let files = discover(dir.path(), &rbc(), &LayoutRegistry::default()).unwrap();
        assert_eq!(files[0].key.labels(), &["RBC", "JOINT", "CHEQUING"]);
        assert_eq!(files[1].key.labels(), &["RBC", "VISA", "NONE"]);
        assert_eq!(files[1].institution, "RBC");
    }

    #[test]
    fn test_unknown_account_type_kept() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "RBC/Savings/statement.pdf");

        let files = discover(dir.path(), &rbc(), &LayoutRegistry::default()).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].account_type, None);
        assert_eq!(files[0].file_month, None);
    }

    #[test]
    fn test_missing_root_is_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(discover(&dir.path().join("nope"), &rbc(), &LayoutRegistry::default()).is_err());
    }

    #[test]
    fn test_month_from_file_name() {
        assert_eq!(
            month_from_file_name("Chequing Statement-1234 2019-12-11.pdf"),
            MonthStamp::from_ym(2019, 12)
        );
        assert_eq!(month_from_file_name("2019-13-01.pdf"), None);
        assert_eq!(month_from_file_name("statement.pdf"), None);
    }
}
