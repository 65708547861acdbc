//! Fold located events into per-file aggregates.
//!
//! The accumulator only looks at event content and arrival order, so
//! replaying the same stream always produces identical aggregates.

use super::location::{full_path_for, Location};
use crate::parser::schema::{CodeUpdate, DeoptUpdate, FileAggregate, IcUpdate, SiteRecord};
use indexmap::map::Entry;
use indexmap::IndexMap;

/// Per-file accumulators for one analysis pass
#[derive(Debug, Default)]
pub struct Accumulator {
    files: IndexMap<String, FileAggregate>,
}

impl Accumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an inline cache transition at `location`
    pub fn fold_ic(&mut self, location: &Location, update: IcUpdate) {
        let severity = update.severity;
        let file = self.file_mut(&location.file);
        fold_site::<IcUpdate>(&mut file.ics, &mut file.ic_locations, location, update, severity);
    }

    /// Record a deoptimization at `location`
    pub fn fold_deopt(&mut self, location: &Location, update: DeoptUpdate) {
        let severity = update.severity;
        let file = self.file_mut(&location.file);
        fold_site::<DeoptUpdate>(
            &mut file.deopts,
            &mut file.deopt_locations,
            location,
            update,
            severity,
        );
    }

    /// Record a code lifecycle step at `location`
    pub fn fold_code(&mut self, location: &Location, update: CodeUpdate) {
        let severity = update.severity;
        let file = self.file_mut(&location.file);
        fold_site::<CodeUpdate>(
            &mut file.codes,
            &mut file.code_locations,
            location,
            update,
            severity,
        );
    }

    /// Aggregates collected so far, in first-seen file order
    pub fn files(&self) -> &IndexMap<String, FileAggregate> {
        &self.files
    }

    pub fn into_files(self) -> IndexMap<String, FileAggregate> {
        self.files
    }

    fn file_mut(&mut self, identity: &str) -> &mut FileAggregate {
        // Avoid allocating the key on the hot path when the file exists
        if !self.files.contains_key(identity) {
            self.files
                .insert(identity.to_string(), FileAggregate::new(full_path_for(identity)));
        }
        &mut self.files[identity]
    }
}

/// Get-or-create the site for `location` and append `update`
///
/// The key joins the ordered location list only when the site is created.
fn fold_site<U>(
    sites: &mut IndexMap<String, SiteRecord<U>>,
    locations: &mut Vec<String>,
    location: &Location,
    update: U,
    severity: u8,
) {
    let site = match sites.entry(location.key.clone()) {
        Entry::Occupied(entry) => entry.into_mut(),
        Entry::Vacant(entry) => {
            locations.push(location.key.clone());
            entry.insert(SiteRecord::new(
                location.file.clone(),
                location.function_name.clone(),
                location.line,
                location.column,
            ))
        }
    };
    site.push(update, severity);
}
