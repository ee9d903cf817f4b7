//! Type queries that need the arena: typedef flattening, parameter-list
//! comparison, and rendering descriptors as C++ source text.

use super::SymbolTable;
use crate::symbol::SymbolId;
use crate::ty::{BaseKind, Cv, PtrOpKind, TypeDesc, TypeFlags};

impl SymbolTable {
    /// See through typedefs and completed forward declarations.
    ///
    /// `typedef int *P; const P &` flattens to `int *const &`.
    pub fn flatten_type(&self, ty: &TypeDesc) -> TypeDesc {
        let mut current = ty.clone();
        // A typedef chain cannot be longer than the arena.
        for _ in 0..=self.symbols.len() {
            let Some(link) = current.link else {
                return current;
            };
            let target = self.canonical(link);
            let sym = self.symbol(target);
            if !sym.ty.is_typedef() {
                current.link = Some(target);
                return current;
            }
            if sym.ty.link == Some(target) {
                break;
            }
            current = current.substitute_base(&sym.ty);
        }
        current
    }

    /// Parameter type as it takes part in a function's signature: arrays
    /// and functions decay to pointers, top-level cv is dropped and so are
    /// storage specifiers.
    pub(crate) fn adjusted_parameter(&self, ty: &TypeDesc) -> TypeDesc {
        let mut ty = self.flatten_type(ty);
        let decays = ty.ptr_ops.first().map_or(ty.kind == BaseKind::Function, |op| {
            op.kind == PtrOpKind::Array
        });
        if decays {
            ty.decay();
        } else {
            ty.strip_top_cv();
        }
        ty.strip_specifiers();
        ty.default = None;
        ty
    }

    /// Adjusted parameter types of a function, with a lone `void` parameter
    /// meaning none.
    pub(crate) fn signature(&self, function: SymbolId) -> Vec<TypeDesc> {
        let params = self.symbol(function).parameters();
        if let [only] = params {
            if self.symbol(*only).ty.is_plain_void() {
                return Vec::new();
            }
        }
        params
            .iter()
            .map(|&p| self.adjusted_parameter(&self.symbol(p).ty))
            .collect()
    }

    /// Do two functions declare the same parameter list?
    ///
    /// Compares after array-to-pointer and function-to-pointer adjustment,
    /// dropping top-level cv, and seeing through typedefs. A member
    /// function's own cv-qualification and varargs also count.
    pub fn has_same_parameters(&self, a: SymbolId, b: SymbolId) -> bool {
        let (a, b) = (self.canonical(a), self.canonical(b));
        if a == b {
            return true;
        }
        let (sym_a, sym_b) = (self.symbol(a), self.symbol(b));
        if sym_a.ty.base_cv() != sym_b.ty.base_cv() {
            return false;
        }
        let varargs =
            |s: &crate::symbol::Symbol| s.as_parameterized().is_some_and(|p| p.varargs);
        if varargs(sym_a) != varargs(sym_b) {
            return false;
        }
        self.signature(a) == self.signature(b)
    }

    /// Render a descriptor as C++ source text, e.g. `const int *&`.
    pub fn type_to_string(&self, ty: &TypeDesc) -> String {
        let mut out = String::new();
        self.write_base(&mut out, ty);

        let mut previous_cv = false;
        for (i, op) in ty.ptr_ops.iter().enumerate().rev() {
            if i + 1 == ty.ptr_ops.len() || previous_cv {
                out.push(' ');
            }
            match op.kind {
                PtrOpKind::Pointer => out.push('*'),
                PtrOpKind::Reference => out.push('&'),
                PtrOpKind::Array => out.push_str("[]"),
                PtrOpKind::MemberPointer => {
                    if let Some(class) = op.member_of {
                        out.push_str(self.name_of(class));
                    }
                    out.push_str("::*");
                }
            }
            previous_cv = !op.cv.is_empty();
            write_cv(&mut out, op.cv, false);
        }
        out
    }

    fn write_base(&self, out: &mut String, ty: &TypeDesc) {
        if let Some(text) = ty.constant {
            out.push_str(self.name_str(text));
            return;
        }
        write_cv(out, ty.base_cv(), true);

        let modifiers = [
            (TypeFlags::UNSIGNED, "unsigned "),
            (TypeFlags::SIGNED, "signed "),
            (TypeFlags::SHORT, "short "),
            (TypeFlags::LONG, "long "),
            (TypeFlags::LONG_LONG, "long long "),
        ];
        for (flag, text) in modifiers {
            if ty.flags.contains(flag) {
                out.push_str(text);
            }
        }

        match ty.link {
            Some(link) => out.push_str(self.name_of(link)),
            None => out.push_str(ty.kind.keyword()),
        }
        if !ty.template_args.is_empty() {
            out.push('<');
            for (i, arg) in ty.template_args.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                out.push_str(&self.type_to_string(arg));
            }
            out.push('>');
        }
    }
}

fn write_cv(out: &mut String, cv: Cv, leading: bool) {
    let parts = [(Cv::CONST, "const"), (Cv::VOLATILE, "volatile")];
    let mut first = true;
    for (flag, text) in parts {
        if !cv.contains(flag) {
            continue;
        }
        if !first {
            out.push(' ');
        }
        out.push_str(text);
        first = false;
    }
    if leading && !cv.is_empty() {
        out.push(' ');
    }
}
