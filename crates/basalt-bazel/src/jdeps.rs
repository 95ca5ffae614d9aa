use std::collections::BTreeSet;
use std::io::{self, BufRead};
use std::path::{Path, PathBuf};

/// Parse a compiler-emitted dependency usage report.
///
/// The report is a textproto stream of `dependency { ... }` blocks; each
/// block's `path:` field names one artifact the compiler actually used,
/// relative to the execution root. Only `path` fields are retained; any
/// other fields are skipped without being buffered.
pub fn parse_usage_report<R: BufRead>(reader: R) -> io::Result<BTreeSet<PathBuf>> {
    let mut paths = BTreeSet::new();
    let mut in_dependency = false;

    for line in reader.lines() {
        let line = line?;
        let trimmed = line.trim();

        if !in_dependency {
            if trimmed.starts_with("dependency {") {
                in_dependency = true;
            }
            continue;
        }

        if trimmed == "}" {
            in_dependency = false;
            continue;
        }

        if let Some(value) = trimmed.strip_prefix("path:") {
            if let Some(path) = unquote(value.trim()) {
                paths.insert(PathBuf::from(path));
            }
        }
    }

    Ok(paths)
}

/// Read a usage report from disk.
///
/// A missing report is not an error: targets whose toolchain did not emit
/// one simply contribute no implicit dependencies.
pub fn read_usage_report(path: &Path) -> io::Result<BTreeSet<PathBuf>> {
    let file = match std::fs::File::open(path) {
        Ok(file) => file,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            tracing::debug!(
                target = "basalt.bazel",
                path = %path.display(),
                "usage report absent; no implicit dependencies"
            );
            return Ok(BTreeSet::new());
        }
        Err(err) => return Err(err),
    };
    parse_usage_report(io::BufReader::new(file))
}

fn unquote(value: &str) -> Option<&str> {
    value.strip_prefix('"')?.strip_suffix('"')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_dependency_paths() {
        let report = r#"
rule_label: "//a:a"
dependency {
  path: "bazel-out/bin/external/maven/guava.jar"
  kind: EXPLICIT
}
dependency {
  path: "bazel-out/bin/b/libb-hjar.jar"
  kind: IMPLICIT
}
"#;
        let paths = parse_usage_report(io::Cursor::new(report)).unwrap();
        assert_eq!(
            paths,
            BTreeSet::from([
                PathBuf::from("bazel-out/bin/external/maven/guava.jar"),
                PathBuf::from("bazel-out/bin/b/libb-hjar.jar"),
            ])
        );
    }

    #[test]
    fn ignores_paths_outside_dependency_blocks() {
        let report = r#"
path: "not-a-dependency.jar"
dependency {
  path: "real.jar"
}
"#;
        let paths = parse_usage_report(io::Cursor::new(report)).unwrap();
        assert_eq!(paths, BTreeSet::from([PathBuf::from("real.jar")]));
    }

    #[test]
    fn missing_report_yields_empty_set() {
        let dir = tempfile::tempdir().unwrap();
        let paths = read_usage_report(&dir.path().join("absent.jdeps")).unwrap();
        assert!(paths.is_empty());
    }
}
