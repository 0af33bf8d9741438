//! Core data types for dependency records and scan reports.
//!
//! This module contains the fundamental types used throughout depscan:
//!
//! - [`PackageRecord`] - A normalized, resolved dependency
//! - [`DependencyType`] - Runtime vs development classification
//! - [`Source`] - Which listing a record set was collected from
//! - [`Vulnerability`] - A security vulnerability
//! - [`ScanReport`] - Complete scan results for one project
//!
//! # Example
//!
//! ```
//! use depscan::model::{PackageRecord, ScanReport};
//!
//! let record = PackageRecord::new("lodash", "4.17.21");
//! let report = ScanReport::new("/path/to/project", vec![record]);
//!
//! println!("Scanned {} packages", report.packages.len());
//! ```

mod package;
mod report;

pub use package::*;
pub use report::*;
