//! Member access through inheritance paths.

use rustc_hash::FxHashSet;

use crate::error::{SemaError, SemaResult};
use crate::stack::ensure_sufficient_stack;
use crate::symbol::{Access, SymbolId};
use crate::SymbolTable;

/// One inheritance path from the naming class to the member's class.
#[derive(Copy, Clone, Debug)]
struct Path {
    access: Access,
    is_virtual: bool,
}

impl SymbolTable {
    /// Access of `symbol` when named as a member of `class`.
    ///
    /// Along one path the most restrictive of the member's own access and
    /// every base link applies. A static member or enumerator reached along
    /// several paths takes the most permissive of them, as does a member of
    /// a virtual base; any other member reached along several paths is
    /// `Ambiguous`. `BadVisibility` if `symbol` is not a member of `class`
    /// or one of its bases.
    pub fn visibility(&self, symbol: SymbolId, class: SymbolId) -> SemaResult<Access> {
        let sym = self.symbol(symbol);
        let Some(owner) = sym.scope.map(|s| self.class_of(s)) else {
            return Err(SemaError::BadVisibility { name: sym.name });
        };
        let class = self.class_of(class);
        if owner == class {
            return Ok(sym.access);
        }

        let mut paths = Vec::new();
        let mut on_path = FxHashSet::default();
        on_path.insert(class);
        let start = Path {
            access: Access::Public,
            is_virtual: false,
        };
        self.collect_paths(class, owner, start, &mut on_path, &mut paths)?;

        let member_access = |path: &Path| sym.access.through(path.access);
        match paths.as_slice() {
            [] => Err(SemaError::BadVisibility { name: sym.name }),
            [only] => Ok(member_access(only)),
            several if sym.is_shared_member() || several.iter().all(|p| p.is_virtual) => {
                Ok(several.iter().map(member_access).min().unwrap_or(Access::Private))
            }
            _ => Err(SemaError::Ambiguous { name: sym.name }),
        }
    }

    fn collect_paths(
        &self,
        class: SymbolId,
        owner: SymbolId,
        path: Path,
        on_path: &mut FxHashSet<SymbolId>,
        paths: &mut Vec<Path>,
    ) -> SemaResult<()> {
        ensure_sufficient_stack(|| {
            for link in self.symbol(class).parents() {
                let parent = self.class_of(link.parent);
                let step = Path {
                    access: path.access.through(link.access),
                    is_virtual: path.is_virtual || link.is_virtual,
                };
                if parent == owner {
                    paths.push(step);
                    continue;
                }
                if !on_path.insert(parent) {
                    return Err(SemaError::CircularInheritance {
                        class: self.symbol(parent).name,
                    });
                }
                self.collect_paths(parent, owner, step, on_path, paths)?;
                on_path.remove(&parent);
            }
            Ok(())
        })
    }
}
