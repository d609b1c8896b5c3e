//! Deterministic hash-based type identity.
//!
//! A [`TypeHash`] is computed from a qualified name, so a placeholder can be
//! addressed before anything has been registered for it:
//!
//! - Forward references (hash computed before registration)
//! - Same qualified name = same hash, whichever module asks first
//! - Single map lookups for substitution records
//!
//! Uses XXHash64 with domain constants so a placeholder and a concrete
//! implementation sharing a name still hash differently.
//!
//! # Examples
//!
//! ```
//! use latebind_core::TypeHash;
//!
//! let a = TypeHash::from_name("pkg.Widget");
//! let b = TypeHash::from_name("pkg.Widget");
//! assert_eq!(a, b);
//!
//! let concrete = TypeHash::from_concrete("pkg.Widget", "pkg/widget.lb:3");
//! assert_ne!(a, concrete);
//! ```

use std::fmt;
use xxhash_rust::xxh64::xxh64;

/// Domain-specific mixing constants for hash computation.
pub mod hash_constants {
    /// Separator constant for combining components.
    pub const SEP: u64 = 0x4bc94d6bd06053ad;

    /// Domain marker for placeholder (declared name) hashes.
    pub const TYPE: u64 = 0x2fac10b63a6cc57c;

    /// Domain marker for module hashes.
    pub const MODULE: u64 = 0x1a095090689d4647;

    /// Domain marker for concrete implementation hashes.
    pub const CONCRETE: u64 = 0x9a7f3d5e2b8c4601;
}

/// A deterministic 64-bit hash identifying a type or module by qualified name.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct TypeHash(pub u64);

impl TypeHash {
    /// Empty/invalid hash constant.
    pub const EMPTY: TypeHash = TypeHash(0);

    /// Hash of a qualified type name.
    #[inline]
    pub fn from_name(name: &str) -> Self {
        TypeHash(hash_constants::TYPE ^ xxh64(name.as_bytes(), 0))
    }

    /// Hash of a qualified module name.
    #[inline]
    pub fn from_module(name: &str) -> Self {
        TypeHash(hash_constants::MODULE ^ xxh64(name.as_bytes(), 0))
    }

    /// Hash of a concrete implementation, distinguished by where it was declared.
    ///
    /// Two declarations of the same qualified name from different origins
    /// produce different hashes.
    #[inline]
    pub fn from_concrete(name: &str, origin: &str) -> Self {
        let hash = hash_constants::CONCRETE ^ xxh64(name.as_bytes(), 0);
        TypeHash(
            hash.wrapping_mul(hash_constants::SEP)
                .wrapping_add(xxh64(origin.as_bytes(), 0)),
        )
    }

    /// Check if this is an empty/invalid hash.
    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Get the underlying u64 value.
    #[inline]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for TypeHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeHash({:#018x})", self.0)
    }
}

impl fmt::Display for TypeHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#018x}", self.0)
    }
}
