use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use crate::record::UserRecord;

/// Read the ID list: one per line, trimmed, blank lines skipped.
pub fn read_user_ids(path: &Path) -> Result<Vec<String>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("User IDs file '{}' not found or unreadable", path.display()))?;
    Ok(parse_user_ids(&text))
}

pub fn parse_user_ids(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Pretty JSON array, non-ASCII kept as UTF-8.
pub fn write_records(path: &Path, records: &[UserRecord]) -> Result<()> {
    let json = serde_json::to_string_pretty(records)?;
    fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::DetailKey;

    #[test]
    fn ids_skip_blank_lines_and_keep_order() {
        let ids = parse_user_ids("  jdoe \n\n\tJIRAUSER10001\r\n   \nzoe");
        assert_eq!(ids, vec!["jdoe", "JIRAUSER10001", "zoe"]);
    }

    #[test]
    fn read_ids_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ids.txt");
        fs::write(&path, "a\nb\n").unwrap();
        assert_eq!(read_user_ids(&path).unwrap(), vec!["a", "b"]);
    }

    #[test]
    fn missing_id_file_names_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("does-not-exist.txt");
        let err = read_user_ids(&path).unwrap_err();
        assert!(format!("{err:#}").contains("does-not-exist.txt"));
    }

    #[test]
    fn output_is_indented_utf8() {
        let mut rec = UserRecord::new("zoe", "https://h/secure/ViewProfile.jspa?name=zoe");
        rec.full_name = Some("Zoë Ångström".into());
        rec.details.insert(DetailKey::FullName, "Zoë Ångström".into());

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("users.json");
        write_records(&path, &[rec.clone()]).unwrap();
        let text = fs::read_to_string(&path).unwrap();

        assert!(text.starts_with("[\n  {\n    \"id\": \"zoe\""));
        assert!(text.contains("\"full_name\": \"Zoë Ångström\""));
        assert!(!text.contains("\\u"));

        let back: Vec<UserRecord> = serde_json::from_str(&text).unwrap();
        assert_eq!(back, vec![rec]);
    }

    #[test]
    fn empty_run_writes_empty_array() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.json");
        write_records(&path, &[]).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "[]");
    }
}
