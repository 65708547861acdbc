//! Address table: which code object lives at which runtime address.
//!
//! The runtime moves code objects around and hands freed addresses to
//! unrelated code later, so an address only means something at a given
//! point in the log. The table is rebuilt for every analysis pass and
//! updated strictly in log order.
//!
//! Entries are keyed by start address and cover `[start, start + size)`,
//! since inline cache records report a program counter somewhere inside
//! the owning code object rather than its start.

use super::location::LocationResolver;
use crate::parser::events::{Address, CodeCreation, CodeKind, LogEvent, OptimizationState};
use log::debug;
use std::collections::BTreeMap;

/// One compiled function instance as known at a point in the log
#[derive(Debug, Clone, PartialEq)]
pub struct CodeObject {
    pub address: Address,
    pub size: u64,
    pub kind: CodeKind,
    pub state: OptimizationState,
    pub function_name: String,
    /// Normalized file identity, resolved once at creation
    pub file: Option<String>,
    pub line: Option<u32>,
    pub column: Option<u32>,
    pub timestamp: Option<u64>,
}

impl CodeObject {
    /// Build a code object from its creation record
    ///
    /// `file` is the already-resolved file identity (see
    /// [`LocationResolver::script_for`]).
    pub fn from_creation(creation: &CodeCreation, file: Option<String>) -> Self {
        Self {
            address: creation.address,
            size: creation.size,
            kind: creation.kind.clone(),
            state: creation.state,
            function_name: creation.function_name.clone(),
            file,
            line: creation.position.as_ref().map(|p| p.line),
            column: creation.position.as_ref().map(|p| p.column),
            timestamp: creation.timestamp,
        }
    }

    /// Whether `address` falls inside this object's instructions
    fn contains(&self, address: Address) -> bool {
        // Zero-sized objects still own their start address
        address == self.address
            || (address > self.address && address < self.address.saturating_add(self.size))
    }
}

/// What a lifecycle record did to the table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleKind {
    Created,
    Moved,
    Deleted,
}

/// A lifecycle change, with a snapshot of the affected code object
#[derive(Debug, Clone, PartialEq)]
pub struct Lifecycle {
    pub kind: LifecycleKind,
    /// Address the object occupies after the change (the freed one for deletions)
    pub address: Address,
    pub code: CodeObject,
}

/// Parse-scoped map from runtime address to the current code object
#[derive(Debug, Default)]
pub struct AddressTable {
    entries: BTreeMap<Address, CodeObject>,
}

impl AddressTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a lifecycle event to the table
    ///
    /// **Public** - called once per code-creation/move/delete record, in log order
    ///
    /// # Returns
    /// The change that happened, or `None` for events that don't touch the
    /// table (ICs, deopts) and for moves/deletes of unknown addresses,
    /// which happen when a log starts mid-stream.
    pub fn record(&mut self, event: &LogEvent, resolver: &mut LocationResolver) -> Option<Lifecycle> {
        match event {
            LogEvent::CodeCreation(creation) => {
                let file = resolver.script_for(creation.position.as_ref());
                let code = CodeObject::from_creation(creation, file);
                self.insert(code.clone());
                Some(Lifecycle {
                    kind: LifecycleKind::Created,
                    address: creation.address,
                    code,
                })
            }
            LogEvent::CodeMove(mv) => self.relocate(mv.from, mv.to).map(|code| Lifecycle {
                kind: LifecycleKind::Moved,
                address: mv.to,
                code,
            }),
            LogEvent::CodeDeletion(del) => self.remove(del.address).map(|code| Lifecycle {
                kind: LifecycleKind::Deleted,
                address: del.address,
                code,
            }),
            LogEvent::IcTransition(_) | LogEvent::Deopt(_) => None,
        }
    }

    /// Find the code object covering `address` right now
    ///
    /// **Public** - used to attribute IC and deopt events
    pub fn resolve(&self, address: Address) -> Option<&CodeObject> {
        self.entries
            .range(..=address)
            .next_back()
            .map(|(_, code)| code)
            .filter(|code| code.contains(address))
    }

    /// Number of live code objects
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Insert a code object, evicting anything its range overlaps
    fn insert(&mut self, code: CodeObject) {
        self.evict_range(code.address, code.size);
        self.entries.insert(code.address, code);
    }

    /// Re-key the object at `from` to `to`; unknown addresses are a no-op
    fn relocate(&mut self, from: Address, to: Address) -> Option<CodeObject> {
        let Some(mut code) = self.entries.remove(&from) else {
            debug!("code-move from unknown address {:#x}", from);
            return None;
        };
        code.address = to;
        self.insert(code.clone());
        Some(code)
    }

    /// Free the entry starting at `address`
    fn remove(&mut self, address: Address) -> Option<CodeObject> {
        let removed = self.entries.remove(&address);
        if removed.is_none() {
            debug!("code-delete of unknown address {:#x}", address);
        }
        removed
    }

    /// Drop every entry overlapping `[start, start + size)`
    fn evict_range(&mut self, start: Address, size: u64) {
        let end = start.saturating_add(size.max(1));
        let mut doomed: Vec<Address> = self
            .entries
            .range(start..end)
            .map(|(address, _)| *address)
            .collect();

        // An earlier entry may extend into the new range
        if let Some((address, code)) = self.entries.range(..start).next_back() {
            if code.address.saturating_add(code.size) > start {
                doomed.push(*address);
            }
        }

        for address in doomed {
            self.entries.remove(&address);
        }
    }
}
