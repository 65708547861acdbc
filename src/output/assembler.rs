//! Final assembly: attach source text to every analysed file.
//!
//! Loading happens after the log pass, in parallel across files. Each
//! worker writes into its own result slot, so the file order of the
//! result is exactly the first-seen order of the pass.

use super::sources::SourceLoader;
use crate::analysis::AnalysisOptions;
use crate::parser::schema::{Analysis, Diagnostics, FileAggregate, SourceWarning};
use crate::utils::error::SourceError;
use indexmap::IndexMap;
use log::{debug, info, warn};
use std::sync::Mutex;

/// Build the final analysis from the pass output
///
/// **Public** - last step of every analysis
///
/// # Arguments
/// * `files` - Per-file aggregates in first-seen order
/// * `diagnostics` - Counters from the pass
/// * `loader` - Where source text comes from
/// * `options` - Concurrency, unattributed policy and whether to load at all
///
/// # Returns
/// The analysis. Load failures leave `src` empty and add a warning.
pub fn assemble<L>(
    mut files: IndexMap<String, FileAggregate>,
    mut diagnostics: Diagnostics,
    loader: &L,
    options: &AnalysisOptions,
) -> Analysis
where
    L: SourceLoader + ?Sized,
{
    if options.load_sources {
        let sentinel = options.unattributed.sentinel();
        let targets: Vec<(String, String)> = files
            .iter()
            .filter(|(identity, _)| Some(identity.as_str()) != sentinel)
            .map(|(identity, file)| (identity.clone(), file.full_path.clone()))
            .collect();

        info!("Loading sources for {} files", targets.len());
        let loaded = load_parallel(&targets, loader, options.source_concurrency);

        for ((identity, full_path), result) in targets.into_iter().zip(loaded) {
            match result {
                Ok(src) => {
                    if let Some(file) = files.get_mut(&identity) {
                        file.src = Some(src);
                    }
                }
                Err(e) => {
                    warn!("Could not load source for {}: {}", full_path, e);
                    diagnostics.source_warnings.push(SourceWarning {
                        file: identity,
                        message: e.to_string(),
                    });
                }
            }
        }
    } else {
        debug!("Source loading disabled");
    }

    Analysis { files, diagnostics }
}

/// Load every target with at most `concurrency` workers
///
/// **Private** - results come back in target order
fn load_parallel<L>(
    targets: &[(String, String)],
    loader: &L,
    concurrency: usize,
) -> Vec<Result<String, SourceError>>
where
    L: SourceLoader + ?Sized,
{
    let total = targets.len();
    if total == 0 {
        return Vec::new();
    }
    let worker_count = concurrency.clamp(1, total);

    let slots: Vec<Mutex<Option<Result<String, SourceError>>>> =
        (0..total).map(|_| Mutex::new(None)).collect();

    std::thread::scope(|scope| {
        for start_index in 0..worker_count {
            let slots = &slots;
            scope.spawn(move || {
                let mut index = start_index;
                while index < total {
                    let result = loader.load(&targets[index].1);
                    if let Ok(mut slot) = slots[index].lock() {
                        *slot = Some(result);
                    }
                    index += worker_count;
                }
            });
        }
    });

    slots
        .into_iter()
        .zip(targets)
        .map(|(slot, (_, full_path))| {
            slot.into_inner()
                .ok()
                .flatten()
                .unwrap_or_else(|| Err(SourceError::NotFound(full_path.clone())))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::location::UnattributedPolicy;
    use crate::utils::config::UNATTRIBUTED_FILE;

    fn files(names: &[&str]) -> IndexMap<String, FileAggregate> {
        names
            .iter()
            .map(|name| (name.to_string(), FileAggregate::new(*name)))
            .collect()
    }

    fn options(concurrency: usize) -> AnalysisOptions {
        AnalysisOptions {
            source_concurrency: concurrency,
            ..Default::default()
        }
    }

    #[test]
    fn test_sources_attached_in_order() {
        let loader = |path: &str| -> Result<String, SourceError> { Ok(format!("src of {}", path)) };
        let names = ["/c.js", "/a.js", "/b.js", "/d.js", "/e.js"];
        let analysis = assemble(files(&names), Diagnostics::default(), &loader, &options(2));

        let keys: Vec<_> = analysis.files.keys().map(String::as_str).collect();
        assert_eq!(keys, names);
        assert_eq!(analysis.files["/b.js"].src.as_deref(), Some("src of /b.js"));
        assert!(analysis.diagnostics.source_warnings.is_empty());
    }

    #[test]
    fn test_failure_becomes_warning() {
        let loader = |path: &str| -> Result<String, SourceError> {
            if path == "/missing.js" {
                Err(SourceError::NotFound(path.to_string()))
            } else {
                Ok(String::new())
            }
        };
        let analysis = assemble(
            files(&["/ok.js", "/missing.js"]),
            Diagnostics::default(),
            &loader,
            &options(4),
        );

        assert!(analysis.files["/missing.js"].src.is_none());
        assert_eq!(analysis.files["/ok.js"].src.as_deref(), Some(""));
        assert_eq!(analysis.diagnostics.source_warnings.len(), 1);
        assert_eq!(analysis.diagnostics.source_warnings[0].file, "/missing.js");
    }

    #[test]
    fn test_sentinel_is_not_loaded() {
        let loader = |path: &str| -> Result<String, SourceError> {
            assert_ne!(path, UNATTRIBUTED_FILE);
            Ok(String::new())
        };
        let opts = AnalysisOptions {
            unattributed: UnattributedPolicy::default(),
            ..options(1)
        };
        let analysis = assemble(
            files(&[UNATTRIBUTED_FILE, "/a.js"]),
            Diagnostics::default(),
            &loader,
            &opts,
        );
        assert!(analysis.files[UNATTRIBUTED_FILE].src.is_none());
        assert!(analysis.diagnostics.source_warnings.is_empty());
    }

    #[test]
    fn test_loading_disabled() {
        let loader = |_: &str| -> Result<String, SourceError> { Ok("x".to_string()) };
        let opts = AnalysisOptions {
            load_sources: false,
            ..Default::default()
        };
        let analysis = assemble(files(&["/a.js"]), Diagnostics::default(), &loader, &opts);
        assert!(analysis.files["/a.js"].src.is_none());
    }
}
