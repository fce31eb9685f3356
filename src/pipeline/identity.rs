//! Identity assignment - globally unique component ids.
//!
//! Ids have the shape `P{page}-{prefix}{ordinal}` where the prefix is the
//! type's first letter and the ordinal is a per-(type, page) counter.
//! State is scoped to a single document run; chunks are processed
//! independently but draw from the same counters, so ids never collide
//! across chunks.

use std::collections::{HashMap, HashSet};

use crate::types::component::ComponentType;

/// Run-scoped id generator.
#[derive(Debug, Default)]
pub struct IdentityAssigner {
    counters: HashMap<(ComponentType, u32), u32>,
    used: HashSet<String>,
}

impl IdentityAssigner {
    /// Create a fresh assigner for a new document run.
    pub fn new() -> Self {
        Self::default()
    }

    /// Produce a unique id for a component of `kind` on `page`.
    ///
    /// Claim, Conclusion and Counterclaim share the `C` prefix, so their
    /// counters can propose the same id; the used-id set resolves that by
    /// bumping the ordinal until free.
    pub fn assign(&mut self, kind: ComponentType, page: u32) -> String {
        let counter = self.counters.entry((kind, page)).or_insert(0);
        loop {
            *counter += 1;
            let id = format!("P{}-{}{}", page, kind.id_prefix(), counter);
            if self.used.insert(id.clone()) {
                return id;
            }
        }
    }

    /// Number of ids handed out so far.
    pub fn assigned(&self) -> usize {
        self.used.len()
    }
}
