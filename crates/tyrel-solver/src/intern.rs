//! Type interning for structural deduplication.
//!
//! Converts [`TypeData`] structures into [`TypeId`] handles. Equal structures
//! get equal handles, so type identity is an integer comparison.
//!
//! Storage is sharded by hash; each shard keeps a map from structure to local
//! index and the reverse vector. Sentinel types (`NoType`, `NoPrefix`,
//! `Error`, `Wildcard`) have fixed ids and are never stored.

use crate::symbols::SymbolId;
use crate::types::*;
use rustc_hash::{FxHashMap, FxHasher};
use std::hash::{Hash, Hasher};
use std::sync::{Arc, PoisonError, RwLock};

const SHARD_BITS: u32 = 5;
const SHARD_COUNT: usize = 1 << SHARD_BITS;
const SHARD_MASK: u32 = (SHARD_COUNT as u32) - 1;

#[derive(Default)]
struct TypeShard {
    data_to_index: FxHashMap<TypeData, u32>,
    index_to_data: Vec<TypeData>,
}

struct SliceInterner<T> {
    items: Vec<Arc<[T]>>,
    map: FxHashMap<Arc<[T]>, u32>,
}

impl<T> SliceInterner<T>
where
    T: Eq + Hash,
{
    fn new() -> Self {
        let empty: Arc<[T]> = Arc::from(Vec::new());
        let mut map = FxHashMap::default();
        map.insert(empty.clone(), 0);
        SliceInterner {
            items: vec![empty],
            map,
        }
    }

    fn intern(&mut self, items: Vec<T>) -> u32 {
        if items.is_empty() {
            return 0;
        }
        if let Some(&id) = self.map.get(items.as_slice()) {
            return id;
        }
        let arc: Arc<[T]> = items.into();
        let id = self.items.len() as u32;
        self.items.push(arc.clone());
        self.map.insert(arc, id);
        id
    }

    fn get(&self, id: u32) -> Option<Arc<[T]>> {
        self.items.get(id as usize).cloned()
    }

    fn empty(&self) -> Arc<[T]> {
        self.items[0].clone()
    }
}

/// Type interning table. Thread-safe; lock poisoning is recovered from since
/// the tables are append-only.
pub struct TypeInterner {
    shards: [RwLock<TypeShard>; SHARD_COUNT],
    type_lists: RwLock<SliceInterner<TypeId>>,
    symbol_lists: RwLock<SliceInterner<SymbolId>>,
}

impl TypeInterner {
    pub fn new() -> Self {
        TypeInterner {
            shards: std::array::from_fn(|_| RwLock::default()),
            type_lists: RwLock::new(SliceInterner::new()),
            symbol_lists: RwLock::new(SliceInterner::new()),
        }
    }

    /// Intern a structure and return its handle.
    pub fn intern(&self, data: TypeData) -> TypeId {
        if let Some(id) = Self::sentinel_id(&data) {
            return id;
        }

        let mut hasher = FxHasher::default();
        data.hash(&mut hasher);
        let shard_idx = (hasher.finish() as usize) & (SHARD_COUNT - 1);
        let shard = &self.shards[shard_idx];

        {
            let shard = shard.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(&local) = shard.data_to_index.get(&data) {
                return Self::make_id(local, shard_idx as u32);
            }
        }

        let mut shard = shard.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(&local) = shard.data_to_index.get(&data) {
            return Self::make_id(local, shard_idx as u32);
        }
        let local = shard.index_to_data.len() as u32;
        if local > ((u32::MAX - TypeId::FIRST_USER) >> SHARD_BITS) {
            return TypeId::ERROR;
        }
        shard.index_to_data.push(data);
        shard.data_to_index.insert(data, local);
        Self::make_id(local, shard_idx as u32)
    }

    /// Look up the structure behind a handle.
    pub fn lookup(&self, id: TypeId) -> Option<TypeData> {
        if let Some(data) = Self::sentinel_data(id) {
            return Some(data);
        }
        let raw = id.0.checked_sub(TypeId::FIRST_USER)?;
        let shard_idx = (raw & SHARD_MASK) as usize;
        let local = (raw >> SHARD_BITS) as usize;
        let shard = self
            .shards
            .get(shard_idx)?
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        shard.index_to_data.get(local).copied()
    }

    pub fn intern_type_list(&self, items: Vec<TypeId>) -> TypeListId {
        let mut lists = self.type_lists.write().unwrap_or_else(PoisonError::into_inner);
        TypeListId(lists.intern(items))
    }

    pub fn type_list(&self, id: TypeListId) -> Arc<[TypeId]> {
        let lists = self.type_lists.read().unwrap_or_else(PoisonError::into_inner);
        lists.get(id.0).unwrap_or_else(|| lists.empty())
    }

    pub fn intern_symbol_list(&self, items: Vec<SymbolId>) -> SymbolListId {
        let mut lists = self
            .symbol_lists
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        SymbolListId(lists.intern(items))
    }

    pub fn symbol_list(&self, id: SymbolListId) -> Arc<[SymbolId]> {
        let lists = self
            .symbol_lists
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        lists.get(id.0).unwrap_or_else(|| lists.empty())
    }

    /// Number of interned types, sentinels included.
    pub fn len(&self) -> usize {
        let stored: usize = self
            .shards
            .iter()
            .map(|shard| {
                shard
                    .read()
                    .unwrap_or_else(PoisonError::into_inner)
                    .index_to_data
                    .len()
            })
            .sum();
        TypeId::FIRST_USER as usize + stored
    }

    pub fn is_empty(&self) -> bool {
        self.len() <= TypeId::FIRST_USER as usize
    }

    fn sentinel_id(data: &TypeData) -> Option<TypeId> {
        match data {
            TypeData::NoType => Some(TypeId::NO_TYPE),
            TypeData::NoPrefix => Some(TypeId::NO_PREFIX),
            TypeData::Error => Some(TypeId::ERROR),
            TypeData::Wildcard => Some(TypeId::WILDCARD),
            _ => None,
        }
    }

    fn sentinel_data(id: TypeId) -> Option<TypeData> {
        match id {
            TypeId::NO_TYPE => Some(TypeData::NoType),
            TypeId::NO_PREFIX => Some(TypeData::NoPrefix),
            TypeId::ERROR => Some(TypeData::Error),
            TypeId::WILDCARD => Some(TypeData::Wildcard),
            _ => None,
        }
    }

    #[inline]
    fn make_id(local: u32, shard_idx: u32) -> TypeId {
        TypeId(TypeId::FIRST_USER + ((local << SHARD_BITS) | (shard_idx & SHARD_MASK)))
    }
}

impl Default for TypeInterner {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "tests/intern_tests.rs"]
mod tests;
