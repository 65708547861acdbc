//! UI-facing form of an analysis.
//!
//! Maps become arrays of `[key, value]` pairs so that consumers which
//! don't keep object key order still see sites in first-seen order.

use super::json::write_json;
use crate::parser::schema::{Analysis, CodeSiteRecord, DeoptSiteRecord, FileAggregate, IcSiteRecord};
use crate::utils::error::OutputError;
use indexmap::IndexMap;
use serde::Serialize;
use std::path::Path;

/// `[fileIdentity, file]` pairs in first-seen order
pub type RenderData<'a> = Vec<(&'a str, RenderFile<'a>)>;

/// One file, with sites as ordered pairs
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderFile<'a> {
    pub full_path: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub src: Option<&'a str>,
    pub ics: Vec<(&'a str, &'a IcSiteRecord)>,
    pub deopts: Vec<(&'a str, &'a DeoptSiteRecord)>,
    pub codes: Vec<(&'a str, &'a CodeSiteRecord)>,
}

/// Convert an analysis for rendering
///
/// **Public** - borrows from the analysis, nothing is copied
pub fn to_render_data(analysis: &Analysis) -> RenderData<'_> {
    analysis
        .files
        .iter()
        .map(|(identity, file)| (identity.as_str(), render_file(file)))
        .collect()
}

/// Write render data as JSON
///
/// **Public** - the `--render` output
pub fn write_render_data(analysis: &Analysis, output_path: impl AsRef<Path>) -> Result<(), OutputError> {
    write_json(&to_render_data(analysis), output_path.as_ref(), false)
}

fn render_file(file: &FileAggregate) -> RenderFile<'_> {
    RenderFile {
        full_path: &file.full_path,
        src: file.src.as_deref(),
        ics: pairs(&file.ics),
        deopts: pairs(&file.deopts),
        codes: pairs(&file.codes),
    }
}

fn pairs<V>(map: &IndexMap<String, V>) -> Vec<(&str, &V)> {
    map.iter().map(|(key, value)| (key.as_str(), value)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::accumulator::Accumulator;
    use crate::aggregator::location::Location;
    use crate::parser::events::BailoutType;
    use crate::parser::schema::DeoptUpdate;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_render_keeps_first_seen_order() {
        let mut acc = Accumulator::new();
        for (name, line) in [("zeta", 1), ("alpha", 2)] {
            acc.fold_deopt(
                &Location::new("/b.js", name, line, 1),
                DeoptUpdate {
                    order: u64::from(line),
                    timestamp: 0,
                    bailout_type: BailoutType::Lazy,
                    deopt_reason: String::new(),
                    inlined: false,
                    script_offset: 0,
                    severity: 2,
                },
            );
        }
        let analysis = Analysis {
            files: acc.into_files(),
            diagnostics: Default::default(),
        };

        let json = serde_json::to_value(to_render_data(&analysis)).unwrap();
        assert_eq!(json[0][0], "/b.js");
        assert_eq!(json[0][1]["fullPath"], "/b.js");
        assert_eq!(json[0][1]["deopts"][0][0], "zeta:1:1");
        assert_eq!(json[0][1]["deopts"][1][0], "alpha:2:1");
        assert_eq!(json[0][1]["deopts"][1][1]["updates"][0]["bailoutType"], "lazy");
    }
}
