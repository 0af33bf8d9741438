//! Version token classification.
//!
//! Listings mix concrete resolved versions (`4.17.21`) with range
//! constraints (`^4.0.0`, `>=1.2.0`). Only concrete versions can identify a
//! package, so every candidate token is classified before a record is built.

/// Returns true if `version` is a concrete, pinned version rather than a
/// range constraint.
///
/// A token containing any comparator character (`^`, `~`, `>`, `<` — which
/// also covers `>=` and `<=`) is a range. Empty tokens are never pinned.
///
/// # Example
///
/// ```
/// use depscan::parse::is_pinned;
///
/// assert!(is_pinned("4.17.21"));
/// assert!(is_pinned("1.0.0-beta.2"));
/// assert!(!is_pinned("^4.0.0"));
/// assert!(!is_pinned(">=1.2.0"));
/// ```
pub fn is_pinned(version: &str) -> bool {
    !version.is_empty() && !version.contains(['^', '~', '>', '<'])
}

/// Extracts the version part of a declared dependency spec.
///
/// Manifest specs can be compound tokens of the shape `<qualifier>:<version>`;
/// everything after the first `:` is the version. A spec without a `:` is
/// returned unchanged. No pinned check applies here — declared specs are used
/// for name matching, never for record construction.
pub fn declared_version(spec: &str) -> &str {
    match spec.split_once(':') {
        Some((_, version)) => version,
        None => spec,
    }
}
