//! Summary statistics over an analysis.
//!
//! Gives a quick answer to "where should I look first": per-file site
//! counts, a severity histogram, and the worst sites ranked by severity
//! and then by how often they changed.

use crate::parser::schema::{Analysis, FileAggregate, SiteRecord};
use log::debug;
use serde::{Deserialize, Serialize};

/// Which kind of site a hot site is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SiteKind {
    Ic,
    Deopt,
    Code,
}

/// Counts for one file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileSummary {
    pub file: String,
    pub ic_sites: usize,
    pub ic_updates: usize,
    pub deopt_sites: usize,
    pub deopt_updates: usize,
    pub code_sites: usize,
    pub code_updates: usize,
    /// Site counts for severity 1, 2 and 3
    pub severities: [usize; 3],
    /// Worst severity of any site, 0 for a file without sites
    pub max_severity: u8,
}

/// A site worth looking at
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HotSite {
    pub file: String,
    pub location: String,
    pub kind: SiteKind,
    pub severity: u8,
    pub updates: usize,
}

/// Summary over all files
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisSummary {
    pub files: Vec<FileSummary>,
    pub total_ic_updates: usize,
    pub total_deopt_updates: usize,
    pub total_code_updates: usize,
    /// Highest severity sites first
    pub hot_sites: Vec<HotSite>,
}

impl AnalysisSummary {
    /// Get human-readable summary
    ///
    /// **Public** - for logging and the `--summary` flag
    pub fn summary(&self) -> String {
        format!(
            "Files: {} | IC updates: {} | Deopts: {} | Code events: {} | Severe sites: {}",
            self.files.len(),
            self.total_ic_updates,
            self.total_deopt_updates,
            self.total_code_updates,
            self.hot_sites.iter().filter(|s| s.severity >= 3).count()
        )
    }
}

/// Summarize an analysis
///
/// **Public** - main entry point for summary statistics
///
/// # Arguments
/// * `analysis` - Finished analysis
/// * `top_n` - Number of hot sites to keep
pub fn summarize(analysis: &Analysis, top_n: usize) -> AnalysisSummary {
    let mut summary = AnalysisSummary::default();
    let mut hot_sites = Vec::new();

    for (identity, file) in &analysis.files {
        let file_summary = summarize_file(identity, file);
        summary.total_ic_updates += file_summary.ic_updates;
        summary.total_deopt_updates += file_summary.deopt_updates;
        summary.total_code_updates += file_summary.code_updates;
        summary.files.push(file_summary);

        collect_hot_sites(&mut hot_sites, identity, &file.ics, SiteKind::Ic);
        collect_hot_sites(&mut hot_sites, identity, &file.deopts, SiteKind::Deopt);
        collect_hot_sites(&mut hot_sites, identity, &file.codes, SiteKind::Code);
    }

    // Stable sort keeps log order among equals
    hot_sites.sort_by(|a, b| {
        b.severity
            .cmp(&a.severity)
            .then_with(|| b.updates.cmp(&a.updates))
    });
    hot_sites.truncate(top_n);
    summary.hot_sites = hot_sites;

    debug!("{}", summary.summary());
    summary
}

fn summarize_file(identity: &str, file: &FileAggregate) -> FileSummary {
    let mut severities = [0usize; 3];
    let all_severities = file
        .ics
        .values()
        .map(|s| s.severity)
        .chain(file.deopts.values().map(|s| s.severity))
        .chain(file.codes.values().map(|s| s.severity));
    for severity in all_severities {
        if (1..=3).contains(&severity) {
            severities[usize::from(severity) - 1] += 1;
        }
    }

    FileSummary {
        file: identity.to_string(),
        ic_sites: file.ics.len(),
        ic_updates: file.ics.values().map(|s| s.updates.len()).sum(),
        deopt_sites: file.deopts.len(),
        deopt_updates: file.deopts.values().map(|s| s.updates.len()).sum(),
        code_sites: file.codes.len(),
        code_updates: file.codes.values().map(|s| s.updates.len()).sum(),
        severities,
        max_severity: file.max_severity(),
    }
}

fn collect_hot_sites<U>(
    out: &mut Vec<HotSite>,
    file: &str,
    sites: &indexmap::IndexMap<String, SiteRecord<U>>,
    kind: SiteKind,
) {
    out.extend(sites.iter().map(|(key, site)| HotSite {
        file: file.to_string(),
        location: key.clone(),
        kind,
        severity: site.severity,
        updates: site.updates.len(),
    }));
}
