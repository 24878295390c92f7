//! Name interning.
//!
//! Symbol names and string constants are interned into a sharded, concurrent
//! pool and passed around as `Name` handles. Two names are equal iff their
//! handles are equal, so name comparison in the subtype procedure is an
//! integer comparison.

use rustc_hash::{FxHashMap, FxHasher};
use std::hash::{Hash, Hasher};
use std::sync::{Arc, RwLock};

/// An interned name.
///
/// `Name::EMPTY` is the empty string and is always present.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct Name(pub u32);

impl Name {
    pub const EMPTY: Name = Name(0);

    #[inline]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub fn index(self) -> u32 {
        self.0
    }
}

const SHARD_BITS: u32 = 4;
const SHARD_COUNT: usize = 1 << SHARD_BITS;
const SHARD_MASK: u32 = (SHARD_COUNT as u32) - 1;

/// Names entered by every fresh symbol table.
pub const WELL_KNOWN_NAMES: &[&str] = &[
    "<root>",
    "<empty>",
    "<refinement>",
    "<none>",
    "scala",
    "java",
    "lang",
    "Any",
    "AnyRef",
    "AnyVal",
    "Object",
    "Nothing",
    "Null",
    "Singleton",
    "NotNull",
    "Int",
    "Long",
    "Double",
    "Boolean",
    "Char",
    "Unit",
    "String",
];

#[derive(Default)]
struct Shard {
    map: FxHashMap<Arc<str>, Name>,
    names: Vec<Arc<str>>,
}

/// Concurrent name pool.
///
/// Names are spread over a fixed number of shards by hash so that parallel
/// symbol creation rarely contends on the same lock. The shard index lives in
/// the low bits of the handle, the shard-local index in the rest.
pub struct NameTable {
    shards: [RwLock<Shard>; SHARD_COUNT],
}

impl NameTable {
    pub fn new() -> Self {
        let shards: [RwLock<Shard>; SHARD_COUNT] = std::array::from_fn(|_| RwLock::default());
        // Slot 0 of shard 0 is the empty name.
        if let Ok(mut shard) = shards[0].write() {
            let empty: Arc<str> = Arc::from("");
            shard.names.push(empty.clone());
            shard.map.insert(empty, Name::EMPTY);
        }
        let table = NameTable { shards };
        for name in WELL_KNOWN_NAMES {
            table.intern(name);
        }
        table
    }

    /// Intern `s`, returning the existing handle when already present.
    pub fn intern(&self, s: &str) -> Name {
        if s.is_empty() {
            return Name::EMPTY;
        }

        let shard_idx = Self::shard_for(s);
        if let Ok(shard) = self.shards[shard_idx].read() {
            if let Some(&name) = shard.map.get(s) {
                return name;
            }
        }

        let Ok(mut shard) = self.shards[shard_idx].write() else {
            return Name::EMPTY;
        };
        // Another writer may have won the race between the two locks.
        if let Some(&name) = shard.map.get(s) {
            return name;
        }
        let local = shard.names.len() as u32;
        if local > (u32::MAX >> SHARD_BITS) {
            return Name::EMPTY;
        }
        let name = Name((local << SHARD_BITS) | (shard_idx as u32 & SHARD_MASK));
        let owned: Arc<str> = Arc::from(s);
        shard.names.push(owned.clone());
        shard.map.insert(owned, name);
        name
    }

    /// Resolve a handle, falling back to the empty string for unknown handles.
    pub fn resolve(&self, name: Name) -> Arc<str> {
        self.try_resolve(name).unwrap_or_else(|| Arc::from(""))
    }

    pub fn try_resolve(&self, name: Name) -> Option<Arc<str>> {
        let shard_idx = (name.0 & SHARD_MASK) as usize;
        let local = (name.0 >> SHARD_BITS) as usize;
        let shard = self.shards.get(shard_idx)?.read().ok()?;
        shard.names.get(local).cloned()
    }

    /// Look a name up without interning it.
    pub fn lookup(&self, s: &str) -> Option<Name> {
        if s.is_empty() {
            return Some(Name::EMPTY);
        }
        let shard = self.shards[Self::shard_for(s)].read().ok()?;
        shard.map.get(s).copied()
    }

    pub fn len(&self) -> usize {
        self.shards
            .iter()
            .map(|shard| shard.read().map(|s| s.names.len()).unwrap_or(0))
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() <= 1
    }

    #[inline]
    fn shard_for(s: &str) -> usize {
        let mut hasher = FxHasher::default();
        s.hash(&mut hasher);
        (hasher.finish() as usize) & (SHARD_COUNT - 1)
    }
}

impl Default for NameTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "tests/interner_tests.rs"]
mod tests;
