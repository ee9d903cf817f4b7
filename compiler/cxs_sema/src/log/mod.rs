//! Undo log for speculative parses.
//!
//! While at least one mark is live, every mutation of the symbol graph
//! pushes an [`UndoRecord`] describing how to reverse it. A mark is a
//! sentinel record that also remembers the arena length, so symbols created
//! after it are discarded by truncation rather than one record each.
//!
//! Marks nest strictly: only the innermost live mark can be rolled back or
//! committed. Committing an inner mark removes just its sentinel, leaving
//! its records owned by the enclosing mark; committing the last live mark
//! drops every record.

use cxs_ir::Name;

use crate::error::TransactionError;
use crate::symbol::{Access, InstanceOrigin, SymbolId};
use crate::ty::TypeDesc;

/// Token returned by `SymbolTable::mark`. Valid for exactly one rollback or
/// commit.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct Mark {
    id: u32,
}

impl Mark {
    #[inline]
    pub fn id(self) -> u32 {
        self.id
    }
}

/// How to reverse one mutation.
#[derive(Clone, Debug)]
pub(crate) enum UndoRecord {
    Mark {
        id: u32,
        arena_len: usize,
    },
    AddMember {
        scope: SymbolId,
        name: Name,
        symbol: SymbolId,
        previous_scope: Option<SymbolId>,
        previous_in_template: bool,
    },
    AddParameter {
        function: SymbolId,
    },
    /// Containing-scope back-reference written by a mutator that attaches
    /// `symbol` to a parameter list, class or template.
    SetScope {
        symbol: SymbolId,
        previous: Option<SymbolId>,
        previous_in_template: bool,
    },
    SetReturnType {
        function: SymbolId,
        previous: Option<TypeDesc>,
    },
    SetVarargs {
        function: SymbolId,
        previous: bool,
    },
    AddParent {
        class: SymbolId,
    },
    SetParent {
        class: SymbolId,
        index: usize,
        previous: SymbolId,
    },
    AddConstructor {
        class: SymbolId,
    },
    AddConversion {
        class: SymbolId,
    },
    AddUsingDirective {
        scope: SymbolId,
    },
    AddTemplateParameter {
        template: SymbolId,
    },
    AddSpecialization {
        template: SymbolId,
    },
    SetPrimary {
        specialization: SymbolId,
        previous: Option<SymbolId>,
    },
    AddExplicitSpecialization {
        template: SymbolId,
    },
    AddInstance {
        template: SymbolId,
    },
    AddDeferredInstance {
        template: SymbolId,
    },
    MapDefinitionParameter {
        template: SymbolId,
        name: Name,
        previous: Option<SymbolId>,
    },
    SetForwardTarget {
        symbol: SymbolId,
        previous: Option<SymbolId>,
    },
    SetType {
        symbol: SymbolId,
        previous: TypeDesc,
    },
    SetAccess {
        symbol: SymbolId,
        previous: Access,
    },
    SetOrigin {
        symbol: SymbolId,
        previous: Option<Box<InstanceOrigin>>,
    },
}

/// Stack of undo records and live marks.
#[derive(Clone, Debug, Default)]
pub(crate) struct UndoLog {
    records: Vec<UndoRecord>,
    /// Ids of live marks, innermost last.
    live: Vec<u32>,
    next_id: u32,
}

impl UndoLog {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// True while any mark is live.
    #[inline]
    pub(crate) fn is_recording(&self) -> bool {
        !self.live.is_empty()
    }

    pub(crate) fn live_marks(&self) -> usize {
        self.live.len()
    }

    /// Record a mutation if a mark is live.
    #[inline]
    pub(crate) fn push(&mut self, record: UndoRecord) {
        if self.is_recording() {
            self.records.push(record);
        }
    }

    pub(crate) fn mark(&mut self, arena_len: usize) -> Mark {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);
        self.live.push(id);
        self.records.push(UndoRecord::Mark { id, arena_len });
        Mark { id }
    }

    fn check_innermost(&self, mark: Mark) -> Result<(), TransactionError> {
        match self.live.last() {
            Some(&innermost) if innermost == mark.id => Ok(()),
            Some(&innermost) if self.live.contains(&mark.id) => {
                Err(TransactionError::NotInnermost {
                    mark: mark.id,
                    innermost,
                })
            }
            _ => Err(TransactionError::Stale { mark: mark.id }),
        }
    }

    /// Pop every record back to and including `mark`'s sentinel.
    ///
    /// Returns the records in the order they must be reversed (newest
    /// first) and the arena length to truncate to.
    pub(crate) fn unwind(
        &mut self,
        mark: Mark,
    ) -> Result<(Vec<UndoRecord>, usize), TransactionError> {
        self.check_innermost(mark)?;
        self.live.pop();

        let mut undone = Vec::new();
        while let Some(record) = self.records.pop() {
            match record {
                UndoRecord::Mark { id, arena_len } if id == mark.id => {
                    return Ok((undone, arena_len));
                }
                other => undone.push(other),
            }
        }
        crate::error::internal_invariant("live mark has no sentinel in the undo log")
    }

    /// Make every mutation since `mark` permanent with respect to it.
    pub(crate) fn commit(&mut self, mark: Mark) -> Result<(), TransactionError> {
        self.check_innermost(mark)?;
        self.live.pop();

        if self.live.is_empty() {
            self.records.clear();
        } else if let Some(pos) = self
            .records
            .iter()
            .rposition(|r| matches!(r, UndoRecord::Mark { id, .. } if *id == mark.id))
        {
            self.records.remove(pos);
        }
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn record_count(&self) -> usize {
        self.records.len()
    }
}
