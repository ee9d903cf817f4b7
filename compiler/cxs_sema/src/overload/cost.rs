//! Implicit conversion sequences.
//!
//! `Cost` ranks the conversion of one argument type to one parameter type.
//! The steps run in order and the first that applies decides the rank:
//!
//! 1. lvalue-to-rvalue adjustment (references stripped, arrays decayed)
//! 2. identity
//! 3. qualification conversion (cv-ladder)
//! 4. promotion
//! 5. standard conversion
//! 6. derived-to-base reference binding
//! 7. user-defined conversion, at most one per sequence

use std::cmp::Ordering;

use rustc_hash::FxHashSet;

use crate::error::{SemaError, SemaResult};
use crate::stack::ensure_sufficient_stack;
use crate::symbol::SymbolId;
use crate::ty::{BaseKind, Cv, PtrOp, PtrOpKind, TypeDesc, TypeFlags};
use crate::SymbolTable;

/// Conversion rank, best first.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub enum Rank {
    /// Identity, lvalue-to-rvalue, or qualification adjustment only.
    Identity,
    Promotion,
    Conversion,
    /// Binding a reference to a base class of the argument.
    DerivedToBase,
    UserDefined,
    /// Argument matched by `...`.
    Ellipsis,
    NoMatch,
}

/// The user-defined step of a conversion sequence.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub enum UserDefined {
    #[default]
    None,
    /// Converting constructor or conversion function.
    Function(SymbolId),
    /// Both a constructor and a conversion function apply.
    Ambiguous,
}

/// Extra detail for a pointer-to-`void` conversion: worse than any
/// derived-to-base pointer conversion.
const VOID_POINTER_DETAIL: u32 = 1 << 16;

/// Extra detail for a pointer-to-`bool` conversion: worse than every other
/// conversion.
const BOOLEAN_DETAIL: u32 = 1 << 20;

/// Cost of converting one argument to one parameter.
#[derive(Clone, Debug)]
pub struct Cost {
    /// Argument type after the lvalue-to-rvalue adjustment.
    pub source: TypeDesc,
    /// Parameter type after the same adjustment.
    pub target: TypeDesc,
    pub rank: Rank,
    /// The parameter was a reference.
    pub target_had_reference: bool,
    /// Number of cv-qualifiers the qualification adjustment adds.
    pub qualification: u32,
    /// Tie-break within a rank: inheritance distance, or the penalties for
    /// conversions to `void *` and `bool`.
    pub detail: u32,
    pub user_defined: UserDefined,
}

impl Cost {
    #[inline]
    pub fn is_match(&self) -> bool {
        self.rank != Rank::NoMatch
    }

    /// Order two costs for the same argument; `Less` means `self` is the
    /// better conversion.
    pub fn compare(&self, other: &Cost) -> Ordering {
        self.rank.cmp(&other.rank).then_with(|| {
            if self.rank == Rank::UserDefined {
                if let (UserDefined::Function(a), UserDefined::Function(b)) =
                    (self.user_defined, other.user_defined)
                {
                    // Sequences through different functions are
                    // indistinguishable.
                    if a != b {
                        return Ordering::Equal;
                    }
                }
            }
            self.detail
                .cmp(&other.detail)
                .then(self.qualification.cmp(&other.qualification))
        })
    }

    fn ellipsis(source: TypeDesc) -> Self {
        Cost {
            target: TypeDesc::new(BaseKind::Undef),
            source,
            rank: Rank::Ellipsis,
            target_had_reference: false,
            qualification: 0,
            detail: 0,
            user_defined: UserDefined::None,
        }
    }
}

impl SymbolTable {
    /// Cost of passing `source` to a parameter of type `target`.
    ///
    /// `nested` is set while searching for a user-defined conversion, which
    /// then cannot apply a second one.
    pub(crate) fn conversion_cost(
        &mut self,
        source: &TypeDesc,
        target: &TypeDesc,
        nested: bool,
    ) -> SemaResult<Cost> {
        let original_source = source.clone();
        let mut from = self.resolve_template_ids(source)?;
        let mut to = self.resolve_template_ids(target)?;

        from.strip_reference();
        let target_had_reference = to.strip_reference();
        from.decay();
        to.decay();
        if !target_had_reference {
            from.strip_top_cv();
            to.strip_top_cv();
        }
        from.default = None;
        to.default = None;
        strip_declaration_flags(&mut from);
        strip_declaration_flags(&mut to);

        let mut cost = Cost {
            source: from,
            target: to,
            rank: Rank::NoMatch,
            target_had_reference,
            qualification: 0,
            detail: 0,
            user_defined: UserDefined::None,
        };

        if cost.source == cost.target {
            cost.rank = Rank::Identity;
            return Ok(cost);
        }
        if let Some(added) = qualification_adjustment(&cost.source, &cost.target) {
            cost.rank = Rank::Identity;
            cost.qualification = added;
            return Ok(cost);
        }

        // A non-const lvalue reference cannot bind to the temporary a
        // promotion or conversion would produce.
        let binds_temporary = !target_had_reference || cost.target.base_cv().contains(Cv::CONST);
        if binds_temporary {
            if self.is_promotion(&cost.source, &cost.target) {
                cost.rank = Rank::Promotion;
                return Ok(cost);
            }
            if let Some(detail) = self.standard_conversion(&cost.source, &cost.target)? {
                cost.rank = Rank::Conversion;
                cost.detail = detail;
                return Ok(cost);
            }
        }
        if target_had_reference {
            if let Some(distance) = self.reference_to_base(&cost.source, &cost.target)? {
                cost.rank = Rank::DerivedToBase;
                cost.detail = distance;
                return Ok(cost);
            }
        }
        if !nested && binds_temporary {
            let user_defined = self.user_defined_conversion(&original_source, target)?;
            if user_defined != UserDefined::None {
                cost.rank = Rank::UserDefined;
                cost.user_defined = user_defined;
            }
        }
        Ok(cost)
    }

    /// Cost of an argument passed through `...`.
    pub(crate) fn ellipsis_cost(&self, source: &TypeDesc) -> Cost {
        Cost::ellipsis(self.flatten_type(source))
    }

    /// The class a descriptor names directly (no pointer operators).
    pub(crate) fn class_type(&self, ty: &TypeDesc) -> Option<SymbolId> {
        if ty.has_ptr_ops() {
            return None;
        }
        let class = self.class_of(ty.link?);
        self.symbol(class).ty.kind.is_class().then_some(class)
    }

    fn is_enumeration_type(&self, ty: &TypeDesc) -> bool {
        ty.kind == BaseKind::Enumeration
            || ty
                .link
                .is_some_and(|l| self.symbol(self.class_of(l)).ty.kind == BaseKind::Enumeration)
    }

    /// Integral and floating-point promotions.
    fn is_promotion(&self, from: &TypeDesc, to: &TypeDesc) -> bool {
        if from.has_ptr_ops() || to.has_ptr_ops() || !cv_compatible(from.base_cv(), to.base_cv())
        {
            return false;
        }
        let plain = !to.flags.intersects(TypeFlags::SIZE_SIGN);
        match to.kind {
            BaseKind::Int if plain => {
                matches!(from.kind, BaseKind::Bool | BaseKind::Char | BaseKind::WChar)
                    || (from.kind == BaseKind::Int && from.flags.contains(TypeFlags::SHORT))
                    || self.is_enumeration_type(from)
            }
            BaseKind::Double if plain => from.kind == BaseKind::Float,
            _ => false,
        }
    }

    /// Standard conversions. Returns the tie-break detail.
    fn standard_conversion(&self, from: &TypeDesc, to: &TypeDesc) -> SemaResult<Option<u32>> {
        // Arithmetic and enumeration-to-arithmetic.
        if !from.has_ptr_ops() && !to.has_ptr_ops() {
            let from_arithmetic = from.kind.is_arithmetic() || self.is_enumeration_type(from);
            if from_arithmetic && to.kind.is_arithmetic() && to.link.is_none() {
                let detail = if to.kind == BaseKind::Bool { 1 } else { 0 };
                return Ok(Some(detail));
            }
            return Ok(None);
        }

        // Pointer and member pointer to bool.
        if to.kind == BaseKind::Bool && !to.has_ptr_ops() {
            let convertible = matches!(
                from.ptr_ops.first().map(|op| op.kind),
                Some(PtrOpKind::Pointer | PtrOpKind::MemberPointer)
            );
            return Ok(convertible.then_some(BOOLEAN_DETAIL));
        }

        // Single-level pointer conversions; only the pointee may change.
        let (Some(from_op), Some(to_op)) = (single_op(from), single_op(to)) else {
            return Ok(None);
        };
        if !cv_compatible(from.base_cv(), to.base_cv()) || !cv_compatible(from_op.cv, to_op.cv) {
            return Ok(None);
        }
        match (from_op.kind, to_op.kind) {
            (PtrOpKind::Pointer, PtrOpKind::Pointer) => {
                if to.kind == BaseKind::Void && to.link.is_none() {
                    return Ok((from.kind != BaseKind::Function).then_some(VOID_POINTER_DETAIL));
                }
                let (Some(derived), Some(base)) =
                    (self.pointee_class(from), self.pointee_class(to))
                else {
                    return Ok(None);
                };
                Ok(self.derived_distance(derived, base)?.filter(|&d| d > 0))
            }
            // `T B::*` converts to `T D::*` for D derived from B.
            (PtrOpKind::MemberPointer, PtrOpKind::MemberPointer) => {
                let (Some(base), Some(derived)) = (from_op.member_of, to_op.member_of) else {
                    return Ok(None);
                };
                if !from.same_base(to) {
                    return Ok(None);
                }
                let (base, derived) = (self.class_of(base), self.class_of(derived));
                Ok(self.derived_distance(derived, base)?.filter(|&d| d > 0))
            }
            _ => Ok(None),
        }
    }

    fn pointee_class(&self, ty: &TypeDesc) -> Option<SymbolId> {
        let class = self.class_of(ty.link?);
        self.symbol(class).ty.kind.is_class().then_some(class)
    }

    /// Binding a reference to a base class of a class argument.
    fn reference_to_base(&self, from: &TypeDesc, to: &TypeDesc) -> SemaResult<Option<u32>> {
        let (Some(derived), Some(base)) = (self.class_type(from), self.class_type(to)) else {
            return Ok(None);
        };
        if !cv_compatible(from.base_cv(), to.base_cv()) {
            return Ok(None);
        }
        Ok(self.derived_distance(derived, base)?.filter(|&d| d > 0))
    }

    /// Try a converting constructor of the target class and a conversion
    /// function of the source class.
    fn user_defined_conversion(
        &mut self,
        source: &TypeDesc,
        target: &TypeDesc,
    ) -> SemaResult<UserDefined> {
        let mut to = self.flatten_type(target);
        to.strip_reference();
        let mut from = self.flatten_type(source);
        from.strip_reference();

        let mut through_constructor = None;
        if let Some(class) = self.class_type(&to) {
            let constructors: Vec<SymbolId> = self
                .symbol(class)
                .as_derivable()
                .map(|d| d.constructors().to_vec())
                .unwrap_or_default()
                .into_iter()
                .filter(|&c| !self.symbol(c).ty.flags.contains(TypeFlags::EXPLICIT))
                .collect();
            if !constructors.is_empty() {
                match self.resolve_overload(&constructors, &[source.clone()], true) {
                    Ok(found) => through_constructor = found,
                    Err(SemaError::Ambiguous { .. }) => return Ok(UserDefined::Ambiguous),
                    Err(error) => return Err(error),
                }
            }
        }

        let through_conversion = match self.class_type(&from) {
            Some(class) => self.best_conversion_function(class, target)?,
            None => UserDefined::None,
        };

        Ok(match (through_constructor, through_conversion) {
            (Some(_), UserDefined::Function(_) | UserDefined::Ambiguous) => UserDefined::Ambiguous,
            (Some(constructor), UserDefined::None) => UserDefined::Function(constructor),
            (None, conversion) => conversion,
        })
    }

    /// Best conversion function of `class` (or its bases) whose return type
    /// converts to `target` by a standard conversion.
    fn best_conversion_function(
        &mut self,
        class: SymbolId,
        target: &TypeDesc,
    ) -> SemaResult<UserDefined> {
        let mut functions = Vec::new();
        let mut seen = FxHashSet::default();
        self.collect_conversions(class, &mut functions, &mut seen);

        let mut best: Option<(SymbolId, Cost)> = None;
        let mut tied = false;
        for function in functions {
            let Some(returns) = self.return_type(function).cloned() else {
                continue;
            };
            let cost = self.conversion_cost(&returns, target, true)?;
            if !cost.is_match() {
                continue;
            }
            match &best {
                None => best = Some((function, cost)),
                Some((_, current)) => match cost.compare(current) {
                    Ordering::Less => {
                        best = Some((function, cost));
                        tied = false;
                    }
                    Ordering::Equal => tied = true,
                    Ordering::Greater => {}
                },
            }
        }
        Ok(match best {
            None => UserDefined::None,
            Some(_) if tied => UserDefined::Ambiguous,
            Some((function, _)) => UserDefined::Function(function),
        })
    }

    fn collect_conversions(
        &self,
        class: SymbolId,
        out: &mut Vec<SymbolId>,
        seen: &mut FxHashSet<SymbolId>,
    ) {
        if !seen.insert(class) {
            return;
        }
        let sym = self.symbol(class);
        if let Some(data) = sym.as_derivable() {
            out.extend_from_slice(data.conversions());
        }
        for link in sym.parents() {
            self.collect_conversions(self.class_of(link.parent), out, seen);
        }
    }

    /// Number of inheritance steps from `derived` up to `base`, `Some(0)`
    /// for the same class, `None` if unrelated.
    pub(crate) fn derived_distance(
        &self,
        derived: SymbolId,
        base: SymbolId,
    ) -> SemaResult<Option<u32>> {
        let mut path = FxHashSet::default();
        self.distance_from(self.class_of(derived), self.class_of(base), &mut path)
    }

    fn distance_from(
        &self,
        class: SymbolId,
        base: SymbolId,
        path: &mut FxHashSet<SymbolId>,
    ) -> SemaResult<Option<u32>> {
        ensure_sufficient_stack(|| {
            if class == base {
                return Ok(Some(0));
            }
            if !path.insert(class) {
                return Err(SemaError::CircularInheritance {
                    class: self.symbol(class).name,
                });
            }
            let mut best: Option<u32> = None;
            for link in self.symbol(class).parents() {
                let parent = self.class_of(link.parent);
                if let Some(distance) = self.distance_from(parent, base, path)? {
                    let distance = distance + 1;
                    best = Some(best.map_or(distance, |b| b.min(distance)));
                }
            }
            path.remove(&class);
            Ok(best)
        })
    }
}

/// Storage and function specifiers take no part in conversions, and a
/// constant argument converts as its type.
fn strip_declaration_flags(ty: &mut TypeDesc) {
    ty.strip_specifiers();
    ty.constant = None;
}

fn single_op(ty: &TypeDesc) -> Option<PtrOp> {
    match ty.ptr_ops.as_slice() {
        [op] => Some(*op),
        _ => None,
    }
}

#[inline]
fn cv_compatible(from: Cv, to: Cv) -> bool {
    to.contains(from)
}

/// The cv-ladder: a qualification conversion from `from` to `to`, returning
/// the number of qualifiers added.
///
/// Levels are numbered from the top. Every level of `to` must contain the
/// qualifiers of `from`, and if level `j > 0` adds any, every level
/// `0 < k < j` of `to` must be `const`.
pub(crate) fn qualification_adjustment(from: &TypeDesc, to: &TypeDesc) -> Option<u32> {
    if !from.same_ptr_shape(to) || !from.same_base(to) {
        return None;
    }
    let levels = |ty: &TypeDesc| -> Vec<Cv> {
        ty.ptr_ops
            .iter()
            .map(|op| op.cv)
            .chain(std::iter::once(ty.base_cv()))
            .collect()
    };
    let (from_levels, to_levels) = (levels(from), levels(to));

    let mut added = 0;
    let mut const_so_far = true;
    for (j, (&f, &t)) in from_levels.iter().zip(&to_levels).enumerate() {
        if !t.contains(f) {
            return None;
        }
        if f != t {
            if j > 0 && !const_so_far {
                return None;
            }
            added += (t - f).bits().count_ones();
        }
        if j > 0 {
            const_so_far &= t.contains(Cv::CONST);
        }
    }
    Some(added)
}
