use crate::model::{DependencyType, ScanReport, Severity};
use anyhow::Result;
use tabled::{settings::Style, Table, Tabled};

#[derive(Tabled)]
struct PackageRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Version")]
    version: String,
    #[tabled(rename = "Type")]
    dependency_type: String,
    #[tabled(rename = "Direct")]
    direct: String,
}

#[derive(Tabled)]
struct VulnRow {
    #[tabled(rename = "Severity")]
    severity: String,
    #[tabled(rename = "Package")]
    package: String,
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Fixed In")]
    fixed_in: String,
}

#[derive(Tabled)]
struct OutdatedRow {
    #[tabled(rename = "Package")]
    package: String,
    #[tabled(rename = "Current")]
    current: String,
    #[tabled(rename = "Latest")]
    latest: String,
    #[tabled(rename = "Update")]
    update_type: String,
}

pub fn print_cli_table(report: &ScanReport) -> Result<()> {
    println!();
    println!("Project: {}", report.project.display());
    println!(
        "Scanned at: {}",
        report.scan_time.format("%Y-%m-%d %H:%M:%S UTC")
    );
    println!();

    // Packages table
    if report.packages.is_empty() {
        println!("No dependencies found.");
    } else {
        println!("Found {} packages:", report.packages.len());
        println!();

        let rows: Vec<PackageRow> = report
            .packages
            .iter()
            .map(|record| PackageRow {
                name: truncate(&record.name, 40),
                version: record.version.clone(),
                dependency_type: record.dependency_type.to_string(),
                direct: if record.transitive { "-" } else { "yes" }.to_string(),
            })
            .collect();

        let table = Table::new(rows).with(Style::rounded()).to_string();
        println!("{}", table);
    }

    // Vulnerabilities
    if !report.vulnerabilities.is_empty() {
        println!();
        println!("Found {} vulnerabilities:", report.vulnerabilities.len());
        println!();

        let mut vulns = report.vulnerabilities.clone();
        vulns.sort_by_key(|v| v.severity.rank());

        let rows: Vec<VulnRow> = vulns
            .iter()
            .map(|v| VulnRow {
                severity: format_severity(&v.severity),
                package: truncate(&v.purl, 45),
                id: v.id.clone(),
                title: truncate(&v.title, 50),
                fixed_in: v.fixed_version.clone().unwrap_or_else(|| "-".to_string()),
            })
            .collect();

        let table = Table::new(rows).with(Style::rounded()).to_string();
        println!("{}", table);
    }

    // Outdated packages
    if !report.outdated.is_empty() {
        println!();
        println!("Found {} outdated packages:", report.outdated.len());
        println!();

        let rows: Vec<OutdatedRow> = report
            .outdated
            .iter()
            .map(|o| OutdatedRow {
                package: truncate(&o.purl, 45),
                current: o.current_version.clone(),
                latest: o.latest_version.clone(),
                update_type: classify_update(&o.current_version, &o.latest_version),
            })
            .collect();

        let table = Table::new(rows).with(Style::rounded()).to_string();
        println!("{}", table);
    }

    // Summary
    println!();
    print_summary(report);

    Ok(())
}

fn print_summary(report: &ScanReport) {
    let direct = report.packages.iter().filter(|r| !r.transitive).count();
    let dev = report
        .packages
        .iter()
        .filter(|r| r.dependency_type == DependencyType::DevDependency)
        .count();

    println!(
        "Summary: {} packages ({} direct, {} transitive, {} dev)",
        report.packages.len(),
        direct,
        report.packages.len() - direct,
        dev
    );

    if !report.vulnerabilities.is_empty() {
        let critical = report
            .vulnerabilities
            .iter()
            .filter(|v| v.severity == Severity::Critical)
            .count();
        let high = report
            .vulnerabilities
            .iter()
            .filter(|v| v.severity == Severity::High)
            .count();
        println!(
            "Vulnerabilities: {} total ({} critical, {} high)",
            report.vulnerabilities.len(),
            critical,
            high
        );
    }
}

fn format_severity(severity: &Severity) -> String {
    match severity {
        Severity::Critical => "\x1b[31mCRITICAL\x1b[0m".to_string(),
        Severity::High => "\x1b[91mHIGH\x1b[0m".to_string(),
        Severity::Medium => "\x1b[33mMEDIUM\x1b[0m".to_string(),
        Severity::Low => "\x1b[32mLOW\x1b[0m".to_string(),
        Severity::Unknown => "UNKNOWN".to_string(),
    }
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        s.to_string()
    } else {
        format!("{}...", &s[..max_len - 3])
    }
}

/// Classify version update as major, minor, or patch
fn classify_update(current: &str, latest: &str) -> String {
    let current = current.trim_start_matches('v');
    let latest = latest.trim_start_matches('v');

    if let (Ok(current), Ok(latest)) = (
        semver::Version::parse(current),
        semver::Version::parse(latest),
    ) {
        if latest.major > current.major {
            return "MAJOR".to_string();
        }
        if latest.minor > current.minor {
            return "minor".to_string();
        }
        if latest.patch > current.patch {
            return "patch".to_string();
        }
    }

    "-".to_string()
}
