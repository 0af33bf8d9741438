//! Parser for `yarn list` tree output.
//!
//! Each line after the header names one resolved package, with tree-drawing
//! characters up front and `name@version` as the last whitespace-delimited
//! token:
//!
//! ```text
//! yarn list v1.22.19
//! ├─ left-pad@1.3.0
//! ├─ @babel/core@7.23.0
//! └─ lodash@4.17.21
//! ```

use tracing::debug;

use crate::model::PackageRecord;
use crate::parse::{split_candidate, version};

/// Parses `yarn list` output into package records.
///
/// The first line is the listing header and contributes nothing. Lines whose
/// trailing token carries a range version are excluded; lines that do not
/// yield both a name and a version are skipped with a diagnostic, never an
/// error. Records come back in listing order with default classification.
pub fn parse(output: &str) -> Vec<PackageRecord> {
    let mut records = Vec::new();

    for line in output.lines().skip(1) {
        let Some(token) = line.split_whitespace().last() else {
            continue;
        };
        if !version::is_pinned(token) {
            debug!(token, "skipping range-constrained entry");
            continue;
        }
        match split_candidate(token) {
            Some((name, version)) => records.push(PackageRecord::new(name, version)),
            None => debug!(line, "skipping line without a name@version candidate"),
        }
    }

    records
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tree_listing() {
        let output = "root-project\n\
                      ├─ left-pad@1.3.0\n\
                      ├─ chalk@^4.0.0\n\
                      └─ lodash@4.17.21\n";
        let records = parse(output);

        let names: Vec<&str> = records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["left-pad", "lodash"]);
        assert_eq!(records[0].version, "1.3.0");
        assert_eq!(records[1].version, "4.17.21");
    }

    #[test]
    fn test_header_line_is_skipped() {
        // A lone header produces nothing, even if it looks like a package.
        let records = parse("fake-header@1.0.0\n");
        assert!(records.is_empty());
    }

    #[test]
    fn test_scoped_package() {
        let output = "root\n├─ @babel/core@7.23.0\n";
        let records = parse(output);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "@babel/core");
        assert_eq!(records[0].version, "7.23.0");
    }

    #[test]
    fn test_malformed_lines_are_skipped() {
        let output = "root\n├─ not-a-candidate\n├─ @scope-only\n└─ ok@1.0.0\n";
        let records = parse(output);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "ok");
    }

    #[test]
    fn test_empty_input() {
        assert!(parse("").is_empty());
    }

    #[test]
    fn test_default_classification() {
        let records = parse("root\n└─ left-pad@1.3.0\n");
        assert!(records[0].transitive);
        assert!(records[0].integrity.is_none());
    }
}
