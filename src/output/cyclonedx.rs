//! CycloneDX SBOM (Software Bill of Materials) output format.
//!
//! Generates a CycloneDX 1.5 compliant SBOM for compliance and supply chain
//! security. See: https://cyclonedx.org/

use crate::model::{DependencyType, ScanReport, Severity};
use anyhow::Result;
use serde::Serialize;

/// CycloneDX SBOM root document
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CycloneDxBom {
    bom_format: &'static str,
    spec_version: &'static str,
    version: u32,
    metadata: CycloneDxMetadata,
    components: Vec<CycloneDxComponent>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    vulnerabilities: Vec<CycloneDxVulnerability>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CycloneDxMetadata {
    timestamp: String,
    tools: Vec<CycloneDxTool>,
}

#[derive(Serialize)]
struct CycloneDxTool {
    vendor: &'static str,
    name: &'static str,
    version: &'static str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CycloneDxComponent {
    #[serde(rename = "type")]
    component_type: &'static str,
    #[serde(rename = "bom-ref")]
    bom_ref: String,
    name: String,
    version: String,
    purl: String,
    /// `excluded` marks dev-only packages that never ship.
    scope: &'static str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    hashes: Vec<CycloneDxHash>,
}

#[derive(Serialize)]
struct CycloneDxHash {
    alg: &'static str,
    content: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CycloneDxVulnerability {
    #[serde(rename = "bom-ref")]
    bom_ref: String,
    id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    recommendation: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    ratings: Vec<CycloneDxRating>,
    affects: Vec<CycloneDxAffects>,
}

#[derive(Serialize)]
struct CycloneDxRating {
    severity: String,
    method: &'static str,
}

#[derive(Serialize)]
struct CycloneDxAffects {
    #[serde(rename = "ref")]
    component_ref: String,
}

fn severity_to_cyclonedx(severity: Severity) -> &'static str {
    match severity {
        Severity::Critical => "critical",
        Severity::High => "high",
        Severity::Medium => "medium",
        Severity::Low => "low",
        Severity::Unknown => "unknown",
    }
}

/// Converts an npm SRI string ("sha512-<base64>") into a CycloneDX hash.
fn integrity_to_hash(integrity: &str) -> Option<CycloneDxHash> {
    let (alg, content) = integrity.split_once('-')?;
    let alg = match alg {
        "sha256" => "SHA-256",
        "sha384" => "SHA-384",
        "sha512" => "SHA-512",
        _ => return None,
    };
    Some(CycloneDxHash {
        alg,
        content: content.to_string(),
    })
}

/// Generate and print CycloneDX SBOM output
pub fn print_cyclonedx(report: &ScanReport) -> Result<()> {
    println!("{}", generate_cyclonedx_string(report)?);
    Ok(())
}

/// Generate CycloneDX as a string (for file output)
pub fn generate_cyclonedx_string(report: &ScanReport) -> Result<String> {
    let components = report
        .packages
        .iter()
        .map(|record| CycloneDxComponent {
            component_type: "library",
            bom_ref: record.purl(),
            name: record.name.clone(),
            version: record.version.clone(),
            purl: record.purl(),
            scope: match record.dependency_type {
                DependencyType::Dependency => "required",
                DependencyType::DevDependency => "excluded",
            },
            hashes: record
                .integrity
                .as_deref()
                .and_then(integrity_to_hash)
                .into_iter()
                .collect(),
        })
        .collect();

    let vulnerabilities: Vec<CycloneDxVulnerability> = report
        .vulnerabilities
        .iter()
        .map(|vuln| {
            let recommendation = vuln
                .fixed_version
                .as_ref()
                .map(|v| format!("Upgrade to version {}", v));

            CycloneDxVulnerability {
                bom_ref: format!("vuln-{}", vuln.id),
                id: vuln.id.clone(),
                description: vuln.description.clone().or(Some(vuln.title.clone())),
                recommendation,
                ratings: vec![CycloneDxRating {
                    severity: severity_to_cyclonedx(vuln.severity).to_string(),
                    method: "other",
                }],
                affects: vec![CycloneDxAffects {
                    component_ref: vuln.purl.clone(),
                }],
            }
        })
        .collect();

    let bom = CycloneDxBom {
        bom_format: "CycloneDX",
        spec_version: "1.5",
        version: 1,
        metadata: CycloneDxMetadata {
            timestamp: report.scan_time.to_rfc3339(),
            tools: vec![CycloneDxTool {
                vendor: "depscan",
                name: "depscan",
                version: env!("CARGO_PKG_VERSION"),
            }],
        },
        components,
        vulnerabilities,
    };

    Ok(serde_json::to_string_pretty(&bom)?)
}
