//! Appending report paths to the scanner's properties file.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Escape a value the way Java properties files expect.
fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            _ => out.push(c),
        }
    }
    out
}

/// Format one `key=path1,path2` line.
pub fn format_property(key: &str, paths: &[PathBuf]) -> String {
    let joined: Vec<String> = paths.iter().map(|p| p.display().to_string()).collect();
    format!("{}={}", key, escape(&joined.join(",")))
}

/// Append the given properties, creating the file if needed. Entries with no
/// paths are not written.
pub fn append_properties(file: &Path, entries: &[(&str, Vec<PathBuf>)]) -> Result<()> {
    let lines: Vec<String> = entries
        .iter()
        .filter(|(_, paths)| !paths.is_empty())
        .map(|(key, paths)| format_property(key, paths))
        .collect();
    if lines.is_empty() {
        return Ok(());
    }

    if let Some(parent) = file.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let mut out = OpenOptions::new().create(true).append(true).open(file)?;
    for line in lines {
        writeln!(out, "{}", line)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_format_property_escapes_backslashes() {
        let line = format_property(
            "sonar.cs.vstest.reportsPaths",
            &[PathBuf::from("C:\\b\\a.trx"), PathBuf::from("C:\\b\\c.trx")],
        );
        assert_eq!(
            line,
            "sonar.cs.vstest.reportsPaths=C:\\\\b\\\\a.trx,C:\\\\b\\\\c.trx"
        );
    }

    #[test]
    fn test_append_creates_then_appends() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("out/sonar-project.properties");

        append_properties(&file, &[("a.key", vec![PathBuf::from("x")])]).unwrap();
        append_properties(
            &file,
            &[("b.key", vec![PathBuf::from("y"), PathBuf::from("z")]), ("c.key", vec![])],
        )
        .unwrap();

        let content = fs::read_to_string(&file).unwrap();
        assert_eq!(content, "a.key=x\nb.key=y,z\n");
    }

    #[test]
    fn test_nothing_to_write_leaves_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("p.properties");
        append_properties(&file, &[("a.key", vec![])]).unwrap();
        assert!(!file.exists());
    }
}
