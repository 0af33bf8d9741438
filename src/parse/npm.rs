//! Parser for `npm ls` flat output.
//!
//! Same line shape as the yarn tree listing, with one twist: npm marks
//! already-listed duplicates with a trailing `deduped` token instead of a
//! version, and those lines must be dropped before the version filter runs:
//!
//! ```text
//! root@1.0.0 /path/to/root
//! ├── express@4.18.0
//! └── debug@4.3.4 deduped
//! ```

use tracing::debug;

use crate::model::PackageRecord;
use crate::parse::{split_candidate, version};

/// Marker npm appends to entries that were collapsed into an earlier line.
const DEDUPED_MARKER: &str = "deduped";

/// Parses `npm ls` output into package records.
///
/// The first line is the root package and contributes nothing. Lines ending
/// in `deduped` are collapsed duplicates and are dropped outright; every
/// other line goes through the same range filter and `name@version` split as
/// the yarn listing.
pub fn parse(output: &str) -> Vec<PackageRecord> {
    let mut records = Vec::new();

    for line in output.lines().skip(1) {
        let Some(token) = line.split_whitespace().last() else {
            continue;
        };
        if token == DEDUPED_MARKER {
            debug!(line, "skipping collapsed duplicate");
            continue;
        }
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
