//! Mark, rollback and commit.

use super::SymbolTable;
use crate::error::TransactionError;
use crate::log::{Mark, UndoRecord};

impl SymbolTable {
    /// Start recording mutations. Marks nest; release them innermost first.
    pub fn mark(&mut self) -> Mark {
        let mark = self.log.mark(self.symbols.len());
        tracing::debug!(mark = mark.id(), symbols = self.symbols.len(), "mark");
        mark
    }

    /// Undo every mutation since `mark` and discard symbols created after it.
    ///
    /// Fails without changing anything if `mark` was already consumed or an
    /// inner mark is still live.
    pub fn rollback(&mut self, mark: Mark) -> Result<(), TransactionError> {
        let (records, arena_len) = self.log.unwind(mark)?;
        tracing::debug!(mark = mark.id(), undone = records.len(), "rollback");
        for record in records {
            self.undo(record);
        }
        self.symbols.truncate(arena_len);
        Ok(())
    }

    /// Keep every mutation since `mark`.
    pub fn commit(&mut self, mark: Mark) -> Result<(), TransactionError> {
        self.log.commit(mark)?;
        tracing::debug!(mark = mark.id(), "commit");
        Ok(())
    }

    /// Number of marks not yet rolled back or committed.
    pub fn live_marks(&self) -> usize {
        self.log.live_marks()
    }

    fn undo(&mut self, record: UndoRecord) {
        match record {
            UndoRecord::Mark { .. } => {
                crate::error::internal_invariant("nested mark found while unwinding")
            }
            UndoRecord::AddMember {
                scope,
                name,
                symbol,
                previous_scope,
                previous_in_template,
            } => {
                if let Some(container) = self.symbol_mut(scope).container_mut() {
                    container.remove(name, symbol);
                }
                let sym = self.symbol_mut(symbol);
                sym.scope = previous_scope;
                sym.in_template = previous_in_template;
            }
            UndoRecord::AddParameter { function } => {
                if let Some(data) = self.symbol_mut(function).as_parameterized_mut() {
                    data.params.pop();
                }
            }
            UndoRecord::SetScope {
                symbol,
                previous,
                previous_in_template,
            } => {
                let sym = self.symbol_mut(symbol);
                sym.scope = previous;
                sym.in_template = previous_in_template;
            }
            UndoRecord::SetReturnType { function, previous } => {
                if let Some(data) = self.symbol_mut(function).as_parameterized_mut() {
                    data.return_type = previous;
                }
            }
            UndoRecord::SetVarargs { function, previous } => {
                if let Some(data) = self.symbol_mut(function).as_parameterized_mut() {
                    data.varargs = previous;
                }
            }
            UndoRecord::AddParent { class } => {
                if let Some(data) = self.symbol_mut(class).as_derivable_mut() {
                    data.parents.pop();
                }
            }
            UndoRecord::SetParent {
                class,
                index,
                previous,
            } => {
                if let Some(link) = self
                    .symbol_mut(class)
                    .as_derivable_mut()
                    .and_then(|d| d.parents.get_mut(index))
                {
                    link.parent = previous;
                }
            }
            UndoRecord::AddConstructor { class } => {
                if let Some(data) = self.symbol_mut(class).as_derivable_mut() {
                    data.constructors.pop();
                }
            }
            UndoRecord::AddConversion { class } => {
                if let Some(data) = self.symbol_mut(class).as_derivable_mut() {
                    data.conversions.pop();
                }
            }
            UndoRecord::AddUsingDirective { scope } => {
                if let Some(container) = self.symbol_mut(scope).container_mut() {
                    container.usings.pop();
                }
            }
            UndoRecord::AddTemplateParameter { template } => {
                if let Some(data) = self.symbol_mut(template).as_template_mut() {
                    data.params.pop();
                }
            }
            UndoRecord::AddSpecialization { template } => {
                if let Some(data) = self.symbol_mut(template).as_template_mut() {
                    data.specializations.pop();
                }
            }
            UndoRecord::SetPrimary {
                specialization,
                previous,
            } => {
                if let Some(data) = self.symbol_mut(specialization).as_template_mut() {
                    data.primary = previous;
                }
            }
            UndoRecord::AddExplicitSpecialization { template } => {
                if let Some(data) = self.symbol_mut(template).as_template_mut() {
                    data.explicit.pop();
                }
            }
            UndoRecord::AddInstance { template } => {
                if let Some(data) = self.symbol_mut(template).as_template_mut() {
                    data.instances.pop();
                }
            }
            UndoRecord::AddDeferredInstance { template } => {
                if let Some(data) = self.symbol_mut(template).as_template_mut() {
                    data.deferred.pop();
                }
            }
            UndoRecord::MapDefinitionParameter {
                template,
                name,
                previous,
            } => {
                if let Some(data) = self.symbol_mut(template).as_template_mut() {
                    match previous {
                        Some(param) => data.definition_params.insert(name, param),
                        None => data.definition_params.remove(&name),
                    };
                }
            }
            UndoRecord::SetForwardTarget { symbol, previous } => {
                self.symbol_mut(symbol).forward_target = previous;
            }
            UndoRecord::SetType { symbol, previous } => {
                self.symbol_mut(symbol).ty = previous;
            }
            UndoRecord::SetAccess { symbol, previous } => {
                self.symbol_mut(symbol).access = previous;
            }
            UndoRecord::SetOrigin { symbol, previous } => {
                self.symbol_mut(symbol).origin = previous;
            }
        }
    }
}
