//! Diagnostic codes with category prefixes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The category of a diagnostic code, determining its prefix letter.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum Category {
    /// Fatal build errors, prefixed with `E`.
    Error,
    /// Recoverable conditions, prefixed with `W`.
    Warning,
}

impl Category {
    /// Returns the single-character prefix for this category.
    pub fn prefix(self) -> char {
        match self {
            Category::Error => 'E',
            Category::Warning => 'W',
        }
    }
}

/// A category prefix plus a numeric identifier, displayed as e.g. `E101`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct DiagnosticCode {
    /// The category of this diagnostic.
    pub category: Category,
    /// The numeric identifier within the category.
    pub number: u16,
}

impl DiagnosticCode {
    /// An import specifier matched no search path/extension combination.
    pub const UNRESOLVED_IMPORT: Self = Self::new(Category::Error, 101);
    /// A chunk was left with zero modules after classification.
    pub const EMPTY_CHUNK: Self = Self::new(Category::Error, 102);
    /// The worker template has no (or more than one) manifest marker.
    pub const MANIFEST_INJECTION: Self = Self::new(Category::Error, 103);
    /// The project configuration is missing or invalid.
    pub const CONFIG: Self = Self::new(Category::Error, 104);
    /// A file could not be read or written.
    pub const IO: Self = Self::new(Category::Error, 105);
    /// The source-transform collaborator rejected a module.
    pub const TRANSFORM: Self = Self::new(Category::Error, 106);

    /// A module is not reachable from any entry and was dropped.
    pub const DANGLING_MODULE: Self = Self::new(Category::Warning, 101);
    /// Two asset mappings produced the same output path; the last one won.
    pub const DUPLICATE_ASSET: Self = Self::new(Category::Warning, 102);
    /// An emitted file exceeds the precache size limit and was left out.
    pub const OVERSIZED_PRECACHE_ENTRY: Self = Self::new(Category::Warning, 103);
    /// A cache group matched no module.
    pub const UNUSED_CACHE_GROUP: Self = Self::new(Category::Warning, 104);

    /// Creates a new diagnostic code.
    pub const fn new(category: Category, number: u16) -> Self {
        Self { category, number }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:03}", self.category.prefix(), self.number)
    }
}
