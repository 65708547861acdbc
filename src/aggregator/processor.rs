//! The streaming pass: tokenize, decode, resolve and fold, record by record.
//!
//! Address reuse makes the result depend on record order, so this stage
//! runs on one thread and consumes the log strictly front to back. Each
//! record is handled completely before the next one is looked at.

use super::accumulator::Accumulator;
use super::address_table::{AddressTable, Lifecycle, LifecycleKind};
use super::location::{Location, LocationResolver, UnattributedPolicy};
use super::severity::{code_severity, deopt_severity, ic_severity};
use crate::parser::decoder::{decode, Decoded};
use crate::parser::events::{DeoptEvent, IcTransition, LogEvent, Record};
use crate::parser::schema::{
    CodeEvent, CodeUpdate, DeoptUpdate, Diagnostics, FileAggregate, IcUpdate, MalformedRecord,
};
use crate::parser::tokenizer::records;
use crate::utils::config::MAX_MALFORMED_SAMPLES;
use indexmap::IndexMap;
use log::{debug, trace};

/// State for one pass over one log
///
/// **Public** - built per analysis, never shared
#[derive(Debug)]
pub struct LogProcessor {
    table: AddressTable,
    resolver: LocationResolver,
    accumulator: Accumulator,
    diagnostics: Diagnostics,
    policy: UnattributedPolicy,
}

impl LogProcessor {
    pub fn new(policy: UnattributedPolicy) -> Self {
        Self {
            table: AddressTable::new(),
            resolver: LocationResolver::new(),
            accumulator: Accumulator::new(),
            diagnostics: Diagnostics::default(),
            policy,
        }
    }

    /// Feed a whole log
    pub fn process_text(&mut self, text: &str) {
        for (order, record) in records(text) {
            self.process_record(order, record);
        }
    }

    /// Feed one record
    ///
    /// **Public** - the unit of work; cancellation can only happen between calls
    pub fn process_record(&mut self, order: u64, record: &str) {
        self.diagnostics.records += 1;

        match decode(order, record) {
            Decoded::Event(record) => {
                self.diagnostics.events += 1;
                self.handle(record);
            }
            Decoded::Ignored { tag, .. } => {
                trace!("line {}: ignoring '{}' record", order, tag);
                self.diagnostics.ignored += 1;
            }
            Decoded::Malformed { order, reason } => {
                debug!("line {}: malformed record: {}", order, reason);
                self.diagnostics.malformed += 1;
                if self.diagnostics.malformed_samples.len() < MAX_MALFORMED_SAMPLES {
                    self.diagnostics
                        .malformed_samples
                        .push(MalformedRecord { order, reason });
                }
            }
        }
    }

    /// Aggregates collected so far
    pub fn files(&self) -> &IndexMap<String, FileAggregate> {
        self.accumulator.files()
    }

    /// End the pass, discarding the address table
    pub fn finish(self) -> (IndexMap<String, FileAggregate>, Diagnostics) {
        debug!(
            "Pass finished: {} records, {} events, {} live code objects at end",
            self.diagnostics.records,
            self.diagnostics.events,
            self.table.len()
        );
        (self.accumulator.into_files(), self.diagnostics)
    }

    fn handle(&mut self, record: Record) {
        match &record.event {
            LogEvent::CodeCreation(_) | LogEvent::CodeMove(_) | LogEvent::CodeDeletion(_) => {
                match self.table.record(&record.event, &mut self.resolver) {
                    Some(change) => self.fold_lifecycle(record.order, change),
                    None => self.diagnostics.unresolved_code_events += 1,
                }
            }
            LogEvent::IcTransition(ic) => self.fold_ic(record.order, ic),
            LogEvent::Deopt(deopt) => self.fold_deopt(record.order, deopt),
        }
    }

    fn fold_lifecycle(&mut self, order: u64, change: Lifecycle) {
        let Some(location) = self.resolver.resolve_code(&change.code) else {
            if change.kind == LifecycleKind::Created {
                self.diagnostics.unlocated_code += 1;
            }
            return;
        };

        let (event, timestamp) = match change.kind {
            LifecycleKind::Created => (CodeEvent::Created, change.code.timestamp),
            LifecycleKind::Moved => (CodeEvent::Moved, None),
            LifecycleKind::Deleted => (CodeEvent::Deleted, None),
        };

        let update = CodeUpdate {
            order,
            timestamp,
            event,
            address: format!("{:#x}", change.address),
            kind: change.code.kind.clone(),
            state: change.code.state,
            severity: code_severity(change.code.state),
        };
        self.accumulator.fold_code(&location, update);
    }

    fn fold_ic(&mut self, order: u64, ic: &IcTransition) {
        let code = self.table.resolve(ic.address);
        let location = self.resolver.resolve_ic(ic, code).or_else(|| {
            let function_name = code.map(|c| c.function_name.as_str()).unwrap_or_default();
            unattributed(&self.policy, &mut self.diagnostics, order, function_name, ic.line, ic.column)
        });

        let update = IcUpdate {
            order,
            timestamp: ic.timestamp,
            ic_type: ic.ic_type.clone(),
            old_state: ic.old_state.clone(),
            new_state: ic.new_state.clone(),
            map: ic.map.clone(),
            key: ic.key.clone(),
            modifier: ic.modifier.clone(),
            slow_reason: ic.slow_reason.clone(),
            severity: ic_severity(&ic.new_state),
        };

        if let Some(location) = location {
            self.accumulator.fold_ic(&location, update);
        }
    }

    fn fold_deopt(&mut self, order: u64, deopt: &DeoptEvent) {
        let code = self.table.resolve(deopt.address);
        let location = self.resolver.resolve_deopt(deopt, code).or_else(|| {
            let function_name = code.map(|c| c.function_name.as_str()).unwrap_or_default();
            let (line, column) = deopt
                .position
                .as_ref()
                .map(|p| (p.line, p.column))
                .unwrap_or((0, 0));
            unattributed(&self.policy, &mut self.diagnostics, order, function_name, line, column)
        });

        let update = DeoptUpdate {
            order,
            timestamp: deopt.timestamp,
            bailout_type: deopt.bailout_type.clone(),
            deopt_reason: deopt.reason.clone(),
            inlined: deopt.inlining_id >= 0,
            script_offset: deopt.script_offset,
            severity: deopt_severity(&deopt.bailout_type),
        };

        if let Some(location) = location {
            self.accumulator.fold_deopt(&location, update);
        }
    }
}

/// Count an unattributable event and place it according to the policy
fn unattributed(
    policy: &UnattributedPolicy,
    diagnostics: &mut Diagnostics,
    order: u64,
    function_name: &str,
    line: u32,
    column: u32,
) -> Option<Location> {
    debug!("line {}: event has no resolvable location", order);
    diagnostics.unattributed += 1;
    policy.location(function_name, line, column)
}
