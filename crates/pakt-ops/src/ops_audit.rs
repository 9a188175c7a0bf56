//! Operation: scan locked dependencies for known vulnerabilities via OSV.

use std::path::Path;

use pakt_core::manifest::ComposerJson;
use pakt_registry::download;
use pakt_resolver::constraint::normalize_version;
use pakt_resolver::{resolve_from_lock, ResolvedPackage};
use pakt_util::errors::PaktError;
use pakt_util::progress::{spinner, status};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::ops_install::resolve_manifest;

/// Options for `pakt audit`.
#[derive(Debug, Default)]
pub struct AuditOptions {
    /// Minimum severity that fails the audit: "low", "moderate", "high", "critical".
    pub fail_on: Option<String>,
    /// Advisory IDs to ignore, on top of `config.audit.ignore` in composer.json.
    pub ignore: Vec<String>,
}

/// A single vulnerability finding.
#[derive(Debug, Clone, PartialEq)]
pub struct Finding {
    pub id: String,
    pub summary: String,
    pub severity: String,
    pub package: String,
    pub version: String,
    pub fixed: Option<String>,
    pub url: String,
}

/// Query payload for the OSV batch API.
#[derive(Serialize)]
struct OsvBatchQuery {
    queries: Vec<OsvQuery>,
}

#[derive(Serialize)]
struct OsvQuery {
    package: OsvPackage,
    version: String,
}

#[derive(Serialize)]
struct OsvPackage {
    name: String,
    ecosystem: String,
}

/// Response from OSV batch API.
#[derive(Deserialize)]
struct OsvBatchResponse {
    results: Vec<OsvQueryResult>,
}

#[derive(Deserialize)]
struct OsvQueryResult {
    #[serde(default)]
    vulns: Vec<OsvVuln>,
}

#[derive(Deserialize)]
struct OsvVuln {
    id: String,
    #[serde(default)]
    summary: String,
    #[serde(default)]
    severity: Vec<OsvSeverity>,
    #[serde(default)]
    affected: Vec<OsvAffected>,
    #[serde(default)]
    references: Vec<OsvReference>,
    #[serde(default)]
    database_specific: Option<OsvDatabaseSpecific>,
}

#[derive(Deserialize)]
struct OsvSeverity {
    #[serde(rename = "type")]
    severity_type: String,
    score: String,
}

#[derive(Deserialize)]
struct OsvAffected {
    #[serde(default)]
    ranges: Vec<OsvRange>,
}

#[derive(Deserialize)]
struct OsvRange {
    #[serde(default)]
    events: Vec<OsvEvent>,
}

#[derive(Deserialize)]
struct OsvEvent {
    #[serde(default)]
    fixed: Option<String>,
}

#[derive(Deserialize)]
struct OsvReference {
    #[serde(rename = "type")]
    ref_type: String,
    url: String,
}

/// GitHub advisories carry a textual severity here.
#[derive(Deserialize)]
struct OsvDatabaseSpecific {
    #[serde(default)]
    severity: Option<String>,
}

const OSV_BATCH_URL: &str = "https://api.osv.dev/v1/querybatch";
const OSV_ECOSYSTEM: &str = "Packagist";
const BATCH_SIZE: usize = 1000;

/// Scan every locked (or freshly resolved) package for known
/// vulnerabilities.
pub fn audit(project_root: &Path, opts: &AuditOptions) -> miette::Result<Vec<Finding>> {
    let (project, config) = crate::load_project(project_root)?;

    let packages: Vec<ResolvedPackage> = match crate::read_lock(&project) {
        Some(lock) => resolve_from_lock(&lock),
        None => resolve_manifest(&project, &config)?,
    };
    let packages: Vec<ResolvedPackage> = packages
        .into_iter()
        .filter(|p| p.package_type.as_deref() != Some("metapackage"))
        .collect();
    let dep_count = packages.len();
    if dep_count == 0 {
        status("Audit", "no packages to scan");
        return Ok(Vec::new());
    }

    let sp = spinner(&format!(
        "Scanning {dep_count} packages for vulnerabilities..."
    ));
    let rt = crate::runtime()?;
    let result = rt.block_on(async {
        let client = download::build_client()?;
        let mut findings = Vec::new();
        for chunk in packages.chunks(BATCH_SIZE) {
            findings.extend(query_osv_batch(&client, chunk).await?);
        }
        Ok::<_, miette::Report>(findings)
    });
    sp.finish_and_clear();
    let mut all_findings = result?;

    let ignore = ignored_ids(&project.manifest, &opts.ignore);
    all_findings.retain(|f| !ignore.contains(&f.id));

    if all_findings.is_empty() {
        status(
            "Audit",
            &format!("{dep_count} packages, no vulnerabilities found"),
        );
        return Ok(all_findings);
    }

    // critical > high > moderate > low
    all_findings.sort_by(|a, b| severity_rank(&b.severity).cmp(&severity_rank(&a.severity)));
    print!("{}", render(&all_findings, dep_count));

    if let Some(ref threshold) = opts.fail_on {
        if exceeds_threshold(&all_findings, threshold) {
            return Err(PaktError::Generic {
                message: format!(
                    "Audit failed: found vulnerabilities at or above '{}' severity",
                    threshold
                ),
            }
            .into());
        }
    }

    Ok(all_findings)
}

pub fn render(findings: &[Finding], dep_count: usize) -> String {
    let mut out = format!(
        "\nFound {} vulnerabilities in {dep_count} packages:\n\n",
        findings.len()
    );
    for f in findings {
        let sev_display = if f.severity.is_empty() {
            "UNKNOWN".to_string()
        } else {
            f.severity.to_uppercase()
        };
        let fix = f
            .fixed
            .as_deref()
            .map(|v| format!(" (fix: >= {v})"))
            .unwrap_or_default();

        out.push_str(&format!("  [{sev_display}] {}\n", f.id));
        out.push_str(&format!("    {} {}{fix}\n", f.package, f.version));
        if !f.summary.is_empty() {
            out.push_str(&format!("    {}\n", f.summary));
        }
        if !f.url.is_empty() {
            out.push_str(&format!("    {}\n", f.url));
        }
        out.push('\n');
    }
    out
}

pub fn exceeds_threshold(findings: &[Finding], threshold: &str) -> bool {
    let threshold_rank = severity_rank(threshold);
    findings
        .iter()
        .any(|f| severity_rank(&f.severity) >= threshold_rank)
}

/// `config.audit.ignore` accepts a list of IDs or an object of ID to reason.
fn ignored_ids(manifest: &ComposerJson, extra: &[String]) -> Vec<String> {
    let mut ids: Vec<String> = extra.to_vec();
    let configured = manifest
        .config
        .other
        .get("audit")
        .and_then(|a| a.get("ignore"));
    match configured {
        Some(serde_json::Value::Array(items)) => {
            ids.extend(items.iter().filter_map(|v| v.as_str().map(str::to_string)));
        }
        Some(serde_json::Value::Object(map)) => ids.extend(map.keys().cloned()),
        _ => {}
    }
    ids
}

async fn query_osv_batch(
    client: &Client,
    packages: &[ResolvedPackage],
) -> miette::Result<Vec<Finding>> {
    let batch = OsvBatchQuery {
        queries: packages
            .iter()
            .map(|p| OsvQuery {
                package: OsvPackage {
                    name: p.name.clone(),
                    ecosystem: OSV_ECOSYSTEM.to_string(),
                },
                version: normalize_version(&p.version),
            })
            .collect(),
    };

    let resp = client
        .post(OSV_BATCH_URL)
        .json(&batch)
        .send()
        .await
        .map_err(|e| PaktError::Network {
            message: format!("OSV API request failed: {e}"),
        })?;

    if !resp.status().is_success() {
        return Err(PaktError::Network {
            message: format!("OSV API returned HTTP {}", resp.status()),
        }
        .into());
    }

    let body: OsvBatchResponse = resp.json().await.map_err(|e| PaktError::Network {
        message: format!("Failed to parse OSV response: {e}"),
    })?;
    Ok(findings_from_response(body, packages))
}

/// Results come back in query order.
fn findings_from_response(body: OsvBatchResponse, packages: &[ResolvedPackage]) -> Vec<Finding> {
    let mut findings = Vec::new();
    for (query_result, package) in body.results.into_iter().zip(packages) {
        for vuln in query_result.vulns {
            let severity = extract_severity(&vuln);
            let fixed = extract_fixed_version(&vuln);
            let url = vuln
                .references
                .iter()
                .find(|r| r.ref_type == "ADVISORY" || r.ref_type == "WEB")
                .map(|r| r.url.clone())
                .unwrap_or_else(|| format!("https://osv.dev/vulnerability/{}", vuln.id));

            findings.push(Finding {
                id: vuln.id,
                summary: vuln.summary,
                severity,
                package: package.name.clone(),
                version: package.version.clone(),
                fixed,
                url,
            });
        }
    }
    findings
}

fn extract_severity(vuln: &OsvVuln) -> String {
    if let Some(sev) = vuln
        .database_specific
        .as_ref()
        .and_then(|d| d.severity.as_deref())
    {
        return sev.to_lowercase();
    }

    for sev in &vuln.severity {
        if sev.severity_type == "CVSS_V3" {
            let score: f64 = sev
                .score
                .split('/')
                .next()
                .and_then(|s| {
                    if s.starts_with("CVSS:") {
                        None
                    } else {
                        s.parse().ok()
                    }
                })
                .unwrap_or(0.0);

            if score == 0.0 {
                return cvss_to_severity(&sev.score);
            }

            return match score {
                s if s >= 9.0 => "critical".to_string(),
                s if s >= 7.0 => "high".to_string(),
                s if s >= 4.0 => "moderate".to_string(),
                _ => "low".to_string(),
            };
        }
    }

    "unknown".to_string()
}

/// Rough mapping from a CVSS vector when OSV gives no base score.
fn cvss_to_severity(vector: &str) -> String {
    if vector.contains("/AV:N") && vector.contains("/AC:L") && vector.contains("/PR:N") {
        "high".to_string()
    } else if vector.contains("/AV:N") {
        "moderate".to_string()
    } else {
        "low".to_string()
    }
}

fn extract_fixed_version(vuln: &OsvVuln) -> Option<String> {
    vuln.affected
        .iter()
        .flat_map(|a| &a.ranges)
        .flat_map(|r| &r.events)
        .find_map(|e| e.fixed.clone())
}

fn severity_rank(severity: &str) -> u8 {
    match severity.to_lowercase().as_str() {
        "critical" => 4,
        "high" => 3,
        "moderate" | "medium" => 2,
        "low" => 1,
        _ => 0,
    }
}
