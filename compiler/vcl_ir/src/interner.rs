//! Thread-safe string interner.
//!
//! Backend workers lowering different declarations intern synthesized
//! names (accessor names, flattened parameter names) concurrently, so the
//! table sits behind a `parking_lot::RwLock` with a read-mostly fast path.

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::Name;

struct InternTable {
    map: FxHashMap<&'static str, u32>,
    strings: Vec<&'static str>,
}

/// Interner mapping identifier text to [`Name`] handles.
///
/// Interned strings are leaked and never freed: a compilation session
/// interns a bounded set of identifiers and keeps them all alive anyway.
pub struct StringInterner {
    table: RwLock<InternTable>,
}

impl StringInterner {
    /// Create an interner with the empty string pre-interned as [`Name::EMPTY`].
    pub fn new() -> Self {
        let mut map = FxHashMap::default();
        map.insert("", 0);
        Self {
            table: RwLock::new(InternTable {
                map,
                strings: vec![""],
            }),
        }
    }

    /// Intern `s`, returning the existing handle if it was seen before.
    pub fn intern(&self, s: &str) -> Name {
        if let Some(&raw) = self.table.read().map.get(s) {
            return Name::from_raw(raw);
        }

        let mut table = self.table.write();
        // Another writer may have won the race between the two locks.
        if let Some(&raw) = table.map.get(s) {
            return Name::from_raw(raw);
        }

        let leaked: &'static str = Box::leak(s.to_owned().into_boxed_str());
        let raw = u32::try_from(table.strings.len())
            .unwrap_or_else(|_| panic!("string interner overflow: more than {} names", u32::MAX));
        table.strings.push(leaked);
        table.map.insert(leaked, raw);
        Name::from_raw(raw)
    }

    /// Look up the text of an interned name.
    pub fn lookup(&self, name: Name) -> &'static str {
        self.table.read().strings[name.index()]
    }

    /// Number of interned strings, including the empty string.
    pub fn len(&self) -> usize {
        self.table.read().strings.len()
    }

    /// Returns `true` if only the empty string is interned.
    pub fn is_empty(&self) -> bool {
        self.len() <= 1
    }
}

impl Default for StringInterner {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[expect(
    clippy::unwrap_used,
    reason = "tests use unwrap for concise assertions"
)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn intern_is_idempotent() {
        let interner = StringInterner::new();
        let a = interner.intern("unbox-impl-a");
        let b = interner.intern("unbox-impl-b");

        assert_eq!(a, interner.intern("unbox-impl-a"));
        assert_ne!(a, b);
        assert_eq!(interner.lookup(b), "unbox-impl-b");
    }

    #[test]
    fn empty_string_is_pre_interned() {
        let interner = StringInterner::new();
        assert_eq!(interner.intern(""), Name::EMPTY);
        assert!(interner.is_empty());
    }

    #[test]
    fn concurrent_interning_agrees() {
        let interner = StringInterner::new();
        let names: Vec<Name> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..4)
                .map(|_| s.spawn(|| interner.intern("p-a")))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert!(names.windows(2).all(|w| w[0] == w[1]));
        assert_eq!(interner.len(), 2);
    }
}
