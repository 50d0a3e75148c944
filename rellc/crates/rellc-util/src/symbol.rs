//! String interning.
//!
//! `Symbol` is a 4-byte handle to a string stored in a process-global
//! table. Names, row labels and variant tags all flow through `Symbol` so
//! that `Name` equality (spec §3: compared on `(text, Id)`) and row-label
//! lookups are index comparisons rather than string comparisons.

use dashmap::DashMap;
use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{LazyLock, RwLock};

/// An interned string.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Symbol(u32);

struct Interner {
    by_str: DashMap<&'static str, u32, ahash::RandomState>,
    by_idx: RwLock<Vec<&'static str>>,
    next: AtomicU32,
}

static INTERNER: LazyLock<Interner> = LazyLock::new(|| Interner {
    by_str: DashMap::with_hasher(ahash::RandomState::new()),
    by_idx: RwLock::new(Vec::new()),
    next: AtomicU32::new(0),
});

impl Symbol {
    pub fn intern(s: &str) -> Self {
        if let Some(existing) = INTERNER.by_str.get(s) {
            return Symbol(*existing);
        }
        // Leaked once per unique string; the interner lives for the process.
        let leaked: &'static str = Box::leak(s.to_string().into_boxed_str());
        let idx = INTERNER.next.fetch_add(1, Ordering::Relaxed);
        INTERNER.by_str.insert(leaked, idx);
        INTERNER.by_idx.write().unwrap().push(leaked);
        Symbol(idx)
    }

    pub fn as_str(self) -> &'static str {
        INTERNER.by_idx.read().unwrap()[self.0 as usize]
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
