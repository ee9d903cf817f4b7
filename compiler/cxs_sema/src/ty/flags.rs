//! Declaration flags and cv-qualifiers.

use bitflags::bitflags;

bitflags! {
    /// Declaration specifiers and type modifiers carried by a descriptor.
    ///
    /// `CONST`/`VOLATILE` here qualify the base type (the innermost level);
    /// qualifiers of pointer levels live on each `PtrOp`.
    #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
    pub struct TypeFlags: u32 {
        // === Qualifiers ===
        const CONST = 1 << 0;
        const VOLATILE = 1 << 1;

        // === Storage and function specifiers ===
        const STATIC = 1 << 2;
        const EXTERN = 1 << 3;
        const MUTABLE = 1 << 4;
        const INLINE = 1 << 5;
        const VIRTUAL = 1 << 6;
        const EXPLICIT = 1 << 7;
        const TYPEDEF = 1 << 8;
        const FRIEND = 1 << 9;
        const AUTO = 1 << 10;
        const REGISTER = 1 << 11;

        // === Declaration state ===
        /// Declared but not defined (`class A;`, a function prototype).
        const FORWARD = 1 << 12;

        // === Size and sign modifiers ===
        const UNSIGNED = 1 << 16;
        const SIGNED = 1 << 17;
        const SHORT = 1 << 18;
        const LONG = 1 << 19;
        const LONG_LONG = 1 << 20;
    }
}

impl TypeFlags {
    /// Both qualifiers.
    pub const CV: Self = Self::CONST.union(Self::VOLATILE);

    /// Modifiers that make two builtin types of the same kind distinct.
    pub const SIZE_SIGN: Self = Self::UNSIGNED
        .union(Self::SIGNED)
        .union(Self::SHORT)
        .union(Self::LONG)
        .union(Self::LONG_LONG);
}

bitflags! {
    /// cv-qualifiers of one level of a type.
    #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
    pub struct Cv: u8 {
        const CONST = 1 << 0;
        const VOLATILE = 1 << 1;
    }
}

impl Cv {
    /// The qualifiers among `flags`.
    #[inline]
    pub fn from_flags(flags: TypeFlags) -> Self {
        let mut cv = Cv::empty();
        cv.set(Cv::CONST, flags.contains(TypeFlags::CONST));
        cv.set(Cv::VOLATILE, flags.contains(TypeFlags::VOLATILE));
        cv
    }

    /// As declaration flags.
    #[inline]
    pub fn as_flags(self) -> TypeFlags {
        let mut flags = TypeFlags::empty();
        flags.set(TypeFlags::CONST, self.contains(Cv::CONST));
        flags.set(TypeFlags::VOLATILE, self.contains(Cv::VOLATILE));
        flags
    }
}
