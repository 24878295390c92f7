//! Symbols and their storage.
//!
//! A symbol is an entity named in types: a package, class, module, type
//! parameter, abstract type, alias, value or method. Types refer to symbols by
//! [`SymbolId`]; the [`SymbolTable`] owns their data.
//!
//! The table is concurrent (`DashMap` plus an atomic id counter) so several
//! checkers can build and query it from different threads. Fresh symbols are
//! created during checking (skolems, cloned parameters, refinement classes),
//! so creation goes through `&self`.
//!
//! ## Ownership
//!
//! Every symbol except [`SymbolId::NO_SYMBOL`] and the root package class has
//! an owner; following owners always ends at `NO_SYMBOL`, which is its own
//! owner.

use crate::db::TypeDatabase;
use crate::recursion::{RecursionGuard, RecursionProfile, RecursionResult};
use crate::types::{ConstantValue, TypeData, TypeId, Variance};
use bitflags::bitflags;
use dashmap::DashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use tracing::trace;
use tyrel_common::limits::MAX_ALIAS_EXPANSION_DEPTH;
use tyrel_common::{Name, NameTable};

// =============================================================================
// SymbolId
// =============================================================================

/// Handle to a symbol in a [`SymbolTable`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct SymbolId(pub u32);

impl SymbolId {
    /// The absent symbol. Its owner is itself.
    pub const NO_SYMBOL: SymbolId = SymbolId(0);

    pub const FIRST_VALID: u32 = 1;

    #[inline]
    pub const fn exists(self) -> bool {
        self.0 >= Self::FIRST_VALID
    }
}

// =============================================================================
// Flags and kinds
// =============================================================================

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct SymbolFlags: u32 {
        const PACKAGE = 1 << 0;
        const MODULE = 1 << 1;
        /// Abstract type member or type parameter.
        const DEFERRED = 1 << 2;
        /// Existentially bound type.
        const EXISTENTIAL = 1 << 3;
        const JAVA = 1 << 4;
        const COVARIANT = 1 << 5;
        const CONTRAVARIANT = 1 << 6;
        const PRIVATE = 1 << 7;
        /// Skolem standing for an existentially bound type.
        const SKOLEM = 1 << 8;
        /// Annotation class whose presence must be preserved by subtyping.
        const TYPE_CONSTRAINT = 1 << 9;
        const TRAIT = 1 << 10;
        /// Stable value (may appear in a singleton type).
        const STABLE = 1 << 11;
        const PARAM = 1 << 12;
        const IMPLICIT = 1 << 13;
        const SYNTHETIC = 1 << 14;
        const FINAL = 1 << 15;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SymbolKind {
    #[default]
    NoSymbol,
    PackageClass,
    Class,
    ModuleClass,
    RefinementClass,
    TypeParam,
    AbstractType,
    AliasType,
    Package,
    Module,
    Value,
    Method,
}

impl SymbolKind {
    #[inline]
    pub fn is_class(self) -> bool {
        matches!(
            self,
            SymbolKind::PackageClass
                | SymbolKind::Class
                | SymbolKind::ModuleClass
                | SymbolKind::RefinementClass
        )
    }

    #[inline]
    pub fn is_type(self) -> bool {
        self.is_class()
            || matches!(
                self,
                SymbolKind::TypeParam | SymbolKind::AbstractType | SymbolKind::AliasType
            )
    }

    #[inline]
    pub fn is_term(self) -> bool {
        matches!(
            self,
            SymbolKind::Package | SymbolKind::Module | SymbolKind::Value | SymbolKind::Method
        )
    }
}

// =============================================================================
// SymbolData
// =============================================================================

/// Everything known about a symbol.
///
/// `info` depends on the kind:
///
/// | Kind | `info` |
/// |------|--------|
/// | type parameter, abstract type | `Bounds` (or `NO_TYPE` for `>: Nothing <: Any`) |
/// | alias type | right-hand side |
/// | value, parameter | its type |
/// | method | `Method` / `NullaryMethod` / `Poly` |
/// | module | the module class type |
/// | refinement class | the refined type it belongs to |
#[derive(Clone, Debug)]
pub struct SymbolData {
    pub id: SymbolId,
    pub name: Name,
    pub owner: SymbolId,
    pub kind: SymbolKind,
    pub flags: SymbolFlags,
    pub type_params: Vec<SymbolId>,
    pub info: TypeId,
    /// Parent types of a class, superclass first.
    pub parents: Vec<TypeId>,
    /// Members declared directly in a class.
    pub decls: Vec<SymbolId>,
    /// Module ↔ module class, package ↔ package class.
    pub companion: SymbolId,
    /// Skolemization level at which a skolem was created.
    pub level: u32,
}

impl SymbolData {
    fn new(id: SymbolId, name: Name, owner: SymbolId, kind: SymbolKind, flags: SymbolFlags) -> Self {
        SymbolData {
            id,
            name,
            owner,
            kind,
            flags,
            type_params: Vec::new(),
            info: TypeId::NO_TYPE,
            parents: Vec::new(),
            decls: Vec::new(),
            companion: SymbolId::NO_SYMBOL,
            level: 0,
        }
    }

    #[inline]
    pub fn is_class(&self) -> bool {
        self.kind.is_class()
    }

    #[inline]
    pub fn is_type(&self) -> bool {
        self.kind.is_type()
    }

    #[inline]
    pub fn is_term(&self) -> bool {
        self.kind.is_term()
    }

    #[inline]
    pub fn is_package_class(&self) -> bool {
        self.kind == SymbolKind::PackageClass
    }

    #[inline]
    pub fn is_package(&self) -> bool {
        matches!(self.kind, SymbolKind::Package | SymbolKind::PackageClass)
    }

    #[inline]
    pub fn is_module_class(&self) -> bool {
        self.kind == SymbolKind::ModuleClass
    }

    #[inline]
    pub fn is_refinement_class(&self) -> bool {
        self.kind == SymbolKind::RefinementClass
    }

    /// Abstract type member or type parameter.
    #[inline]
    pub fn is_abstract_type(&self) -> bool {
        self.is_type() && !self.is_class() && self.flags.contains(SymbolFlags::DEFERRED)
    }

    #[inline]
    pub fn is_alias_type(&self) -> bool {
        self.kind == SymbolKind::AliasType
    }

    #[inline]
    pub fn is_method(&self) -> bool {
        self.kind == SymbolKind::Method
    }

    #[inline]
    pub fn is_private(&self) -> bool {
        self.flags.contains(SymbolFlags::PRIVATE)
    }

    #[inline]
    pub fn is_java_defined(&self) -> bool {
        self.flags.contains(SymbolFlags::JAVA)
    }

    pub fn variance(&self) -> Variance {
        if self.flags.contains(SymbolFlags::COVARIANT) {
            Variance::Covariant
        } else if self.flags.contains(SymbolFlags::CONTRAVARIANT) {
            Variance::Contravariant
        } else {
            Variance::Invariant
        }
    }
}

// =============================================================================
// Definitions
// =============================================================================

/// Well-known symbols and their types, entered by every table.
#[derive(Clone, Debug, Default)]
pub struct Definitions {
    pub root_class: SymbolId,
    pub root_package: SymbolId,
    pub scala_class: SymbolId,
    pub java_lang_class: SymbolId,

    pub any: SymbolId,
    pub any_ref: SymbolId,
    pub object: SymbolId,
    pub any_val: SymbolId,
    pub nothing: SymbolId,
    pub null: SymbolId,
    pub singleton: SymbolId,
    pub not_null: SymbolId,
    pub int: SymbolId,
    pub long: SymbolId,
    pub double: SymbolId,
    pub boolean: SymbolId,
    pub char: SymbolId,
    pub unit: SymbolId,
    pub string: SymbolId,

    pub any_type: TypeId,
    pub any_ref_type: TypeId,
    pub object_type: TypeId,
    pub any_val_type: TypeId,
    pub nothing_type: TypeId,
    pub null_type: TypeId,
    pub int_type: TypeId,
    pub long_type: TypeId,
    pub double_type: TypeId,
    pub boolean_type: TypeId,
    pub char_type: TypeId,
    pub unit_type: TypeId,
    pub string_type: TypeId,
}

impl Definitions {
    fn enter(table: &SymbolTable, db: &dyn TypeDatabase) -> Self {
        let root_class = table.enter_symbol("<root>", SymbolId::NO_SYMBOL, SymbolKind::PackageClass, SymbolFlags::PACKAGE);
        let root_package = table.enter_symbol("<root>", SymbolId::NO_SYMBOL, SymbolKind::Package, SymbolFlags::PACKAGE);
        table.link_companions(root_package, root_class);
        let scala_class = table.new_package(root_class, "scala");
        let java_class = table.new_package(root_class, "java");
        let java_lang_class = table.new_package(java_class, "lang");

        let scala = db.this_type(scala_class);
        let java_lang = db.this_type(java_lang_class);

        let any = table.new_class(scala_class, "Any", SymbolFlags::empty());
        let any_type = db.type_ref(scala, any, vec![]);

        let object = table.new_class(java_lang_class, "Object", SymbolFlags::JAVA);
        let object_type = db.type_ref(java_lang, object, vec![]);
        table.set_parents(object, vec![any_type]);

        let any_ref = table.new_alias_type(scala_class, "AnyRef");
        table.set_info(any_ref, object_type);
        let any_ref_type = db.type_ref(scala, any_ref, vec![]);

        let any_val = table.new_class(scala_class, "AnyVal", SymbolFlags::empty());
        let any_val_type = db.type_ref(scala, any_val, vec![]);
        table.set_parents(any_val, vec![any_type]);

        let nothing = table.new_class(scala_class, "Nothing", SymbolFlags::FINAL);
        table.set_parents(nothing, vec![any_type]);
        let null = table.new_class(scala_class, "Null", SymbolFlags::FINAL);
        table.set_parents(null, vec![object_type]);

        let singleton = table.new_class(scala_class, "Singleton", SymbolFlags::TRAIT);
        table.set_parents(singleton, vec![any_type]);
        let not_null = table.new_class(scala_class, "NotNull", SymbolFlags::TRAIT);
        table.set_parents(not_null, vec![any_type]);

        let value_class = |name: &str| {
            let sym = table.new_class(scala_class, name, SymbolFlags::FINAL);
            table.set_parents(sym, vec![any_val_type]);
            (sym, db.type_ref(scala, sym, vec![]))
        };
        let (int, int_type) = value_class("Int");
        let (long, long_type) = value_class("Long");
        let (double, double_type) = value_class("Double");
        let (boolean, boolean_type) = value_class("Boolean");
        let (char, char_type) = value_class("Char");
        let (unit, unit_type) = value_class("Unit");

        let string = table.new_class(java_lang_class, "String", SymbolFlags::JAVA | SymbolFlags::FINAL);
        table.set_parents(string, vec![object_type]);

        Definitions {
            root_class,
            root_package,
            scala_class,
            java_lang_class,
            any,
            any_ref,
            object,
            any_val,
            nothing,
            null,
            singleton,
            not_null,
            int,
            long,
            double,
            boolean,
            char,
            unit,
            string,
            any_type,
            any_ref_type,
            object_type,
            any_val_type,
            nothing_type: db.type_ref(scala, nothing, vec![]),
            null_type: db.type_ref(scala, null, vec![]),
            int_type,
            long_type,
            double_type,
            boolean_type,
            char_type,
            unit_type,
            string_type: db.type_ref(java_lang, string, vec![]),
        }
    }

    /// Class of a literal value.
    pub fn constant_class(&self, value: &ConstantValue) -> SymbolId {
        match value {
            ConstantValue::Unit => self.unit,
            ConstantValue::Null => self.null,
            ConstantValue::Boolean(_) => self.boolean,
            ConstantValue::Char(_) => self.char,
            ConstantValue::Int(_) => self.int,
            ConstantValue::Long(_) => self.long,
            ConstantValue::Double(_) => self.double,
            ConstantValue::Str(_) => self.string,
        }
    }

    /// Type of a literal value's class.
    pub fn constant_type(&self, value: &ConstantValue) -> TypeId {
        match value {
            ConstantValue::Unit => self.unit_type,
            ConstantValue::Null => self.null_type,
            ConstantValue::Boolean(_) => self.boolean_type,
            ConstantValue::Char(_) => self.char_type,
            ConstantValue::Int(_) => self.int_type,
            ConstantValue::Long(_) => self.long_type,
            ConstantValue::Double(_) => self.double_type,
            ConstantValue::Str(_) => self.string_type,
        }
    }
}

// =============================================================================
// SymbolTable
// =============================================================================

/// Thread-safe symbol storage.
///
/// ```ignore
/// let interner = TypeInterner::new();
/// let symbols = SymbolTable::new(&interner);
/// let defs = symbols.definitions();
///
/// let cell = symbols.new_class(defs.scala_class, "Cell", SymbolFlags::empty());
/// let t = symbols.new_type_param(cell, "T", Variance::Invariant);
/// symbols.set_type_params(cell, vec![t]);
/// symbols.set_parents(cell, vec![defs.any_ref_type]);
/// ```
pub struct SymbolTable {
    symbols: DashMap<SymbolId, Arc<SymbolData>>,
    next_id: AtomicU32,
    names: NameTable,
    base_classes: DashMap<SymbolId, Arc<[SymbolId]>>,
    defs: Definitions,
}

impl SymbolTable {
    /// Create a table holding `NO_SYMBOL` and the well-known definitions.
    pub fn new(db: &dyn TypeDatabase) -> Self {
        let names = NameTable::new();
        let symbols = DashMap::new();
        let none = names.intern("<none>");
        symbols.insert(
            SymbolId::NO_SYMBOL,
            Arc::new(SymbolData::new(
                SymbolId::NO_SYMBOL,
                none,
                SymbolId::NO_SYMBOL,
                SymbolKind::NoSymbol,
                SymbolFlags::empty(),
            )),
        );
        let mut table = SymbolTable {
            symbols,
            next_id: AtomicU32::new(SymbolId::FIRST_VALID),
            names,
            base_classes: DashMap::new(),
            defs: Definitions::default(),
        };
        table.defs = Definitions::enter(&table, db);
        table
    }

    #[inline]
    pub fn definitions(&self) -> &Definitions {
        &self.defs
    }

    // -------------------------------------------------------------------------
    // Names
    // -------------------------------------------------------------------------

    pub fn intern_name(&self, name: &str) -> Name {
        self.names.intern(name)
    }

    pub fn resolve_name(&self, name: Name) -> Arc<str> {
        self.names.resolve(name)
    }

    // -------------------------------------------------------------------------
    // Creation
    // -------------------------------------------------------------------------

    fn allocate(&self) -> SymbolId {
        SymbolId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    fn insert(&self, data: SymbolData) -> SymbolId {
        let id = data.id;
        trace!(symbol = id.0, kind = ?data.kind, owner = data.owner.0, "SymbolTable::insert");
        self.symbols.insert(id, Arc::new(data));
        id
    }

    fn enter_symbol(&self, name: &str, owner: SymbolId, kind: SymbolKind, flags: SymbolFlags) -> SymbolId {
        let name = self.names.intern(name);
        self.enter_named(name, owner, kind, flags)
    }

    fn enter_named(&self, name: Name, owner: SymbolId, kind: SymbolKind, flags: SymbolFlags) -> SymbolId {
        let id = self.allocate();
        self.insert(SymbolData::new(id, name, owner, kind, flags))
    }

    fn link_companions(&self, term: SymbolId, class: SymbolId) {
        self.update(term, |d| d.companion = class);
        self.update(class, |d| d.companion = term);
    }

    /// Enter a package; returns the package class.
    pub fn new_package(&self, owner: SymbolId, name: &str) -> SymbolId {
        let class = self.enter_symbol(name, owner, SymbolKind::PackageClass, SymbolFlags::PACKAGE);
        let term = self.enter_symbol(name, owner, SymbolKind::Package, SymbolFlags::PACKAGE | SymbolFlags::STABLE);
        self.link_companions(term, class);
        class
    }

    pub fn new_class(&self, owner: SymbolId, name: &str, flags: SymbolFlags) -> SymbolId {
        self.enter_symbol(name, owner, SymbolKind::Class, flags)
    }

    /// Enter a module; returns the module (term) symbol. Its class is the
    /// module's `companion`, and its info is the module class type.
    pub fn new_module(&self, owner: SymbolId, name: &str, db: &dyn TypeDatabase) -> SymbolId {
        let class = self.enter_symbol(name, owner, SymbolKind::ModuleClass, SymbolFlags::MODULE | SymbolFlags::FINAL);
        let module = self.enter_symbol(name, owner, SymbolKind::Module, SymbolFlags::MODULE | SymbolFlags::STABLE);
        self.link_companions(module, class);
        let prefix = self.prefix_for(owner, db);
        self.set_info(module, db.type_ref(prefix, class, vec![]));
        self.set_parents(class, vec![self.defs.any_ref_type]);
        module
    }

    pub fn new_type_param(&self, owner: SymbolId, name: &str, variance: Variance) -> SymbolId {
        let mut flags = SymbolFlags::DEFERRED | SymbolFlags::PARAM;
        match variance {
            Variance::Covariant => flags |= SymbolFlags::COVARIANT,
            Variance::Contravariant => flags |= SymbolFlags::CONTRAVARIANT,
            Variance::Invariant => {}
        }
        self.enter_symbol(name, owner, SymbolKind::TypeParam, flags)
    }

    pub fn new_abstract_type(&self, owner: SymbolId, name: &str) -> SymbolId {
        let sym = self.enter_symbol(name, owner, SymbolKind::AbstractType, SymbolFlags::DEFERRED);
        self.add_decl(owner, sym);
        sym
    }

    /// Enter an existentially bound type. It is not a member of `owner`.
    pub fn new_existential(&self, owner: SymbolId, name: &str) -> SymbolId {
        self.enter_symbol(
            name,
            owner,
            SymbolKind::AbstractType,
            SymbolFlags::DEFERRED | SymbolFlags::EXISTENTIAL,
        )
    }

    pub fn new_alias_type(&self, owner: SymbolId, name: &str) -> SymbolId {
        let sym = self.enter_symbol(name, owner, SymbolKind::AliasType, SymbolFlags::empty());
        self.add_decl(owner, sym);
        sym
    }

    /// Enter a value member (or local value when `owner` is a method).
    pub fn new_value(&self, owner: SymbolId, name: &str, flags: SymbolFlags) -> SymbolId {
        let sym = self.enter_symbol(name, owner, SymbolKind::Value, flags);
        self.add_decl(owner, sym);
        sym
    }

    pub fn new_method(&self, owner: SymbolId, name: &str, flags: SymbolFlags) -> SymbolId {
        let sym = self.enter_symbol(name, owner, SymbolKind::Method, flags);
        self.add_decl(owner, sym);
        sym
    }

    /// Enter a value parameter of a method type.
    pub fn new_param(&self, owner: SymbolId, name: &str, info: TypeId) -> SymbolId {
        let sym = self.enter_symbol(name, owner, SymbolKind::Value, SymbolFlags::PARAM | SymbolFlags::STABLE);
        self.set_info(sym, info);
        sym
    }

    pub fn new_refinement_class(&self, owner: SymbolId) -> SymbolId {
        self.enter_symbol("<refinement>", owner, SymbolKind::RefinementClass, SymbolFlags::SYNTHETIC)
    }

    /// Enter a synthetic type symbol sharing `template`'s name and flags.
    pub fn new_type_like(&self, template: SymbolId, owner: SymbolId, extra: SymbolFlags, level: u32) -> SymbolId {
        let source = self.get(template);
        let id = self.allocate();
        let mut data = SymbolData::new(id, source.name, owner, source.kind, source.flags | extra);
        if !data.is_type() || data.is_class() {
            data.kind = SymbolKind::AbstractType;
        }
        data.info = source.info;
        data.level = level;
        self.insert(data)
    }

    /// Copy a symbol under a fresh id (same owner). Infos are not rewritten.
    pub fn clone_symbol(&self, sym: SymbolId) -> SymbolId {
        let mut data = (*self.get(sym)).clone();
        data.id = self.allocate();
        self.insert(data)
    }

    // -------------------------------------------------------------------------
    // Mutation
    // -------------------------------------------------------------------------

    /// Apply `f` to a symbol's data. Unknown ids are ignored.
    pub fn update(&self, sym: SymbolId, f: impl FnOnce(&mut SymbolData)) {
        debug_assert!(sym.exists(), "NO_SYMBOL is immutable");
        if let Some(mut entry) = self.symbols.get_mut(&sym) {
            f(Arc::make_mut(entry.value_mut()));
        }
    }

    pub fn set_info(&self, sym: SymbolId, info: TypeId) {
        self.update(sym, |d| d.info = info);
    }

    pub fn set_type_params(&self, sym: SymbolId, type_params: Vec<SymbolId>) {
        self.update(sym, |d| d.type_params = type_params);
    }

    pub fn set_flags(&self, sym: SymbolId, flags: SymbolFlags) {
        self.update(sym, |d| d.flags |= flags);
    }

    /// Replace a class's parents. Cached linearizations are dropped.
    pub fn set_parents(&self, sym: SymbolId, parents: Vec<TypeId>) {
        self.update(sym, |d| d.parents = parents);
        self.base_classes.clear();
    }

    pub fn add_decl(&self, class: SymbolId, member: SymbolId) {
        if class.exists() && self.kind(class).is_class() {
            self.update(class, |d| d.decls.push(member));
        }
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    /// Data of `sym`; unknown ids read as `NO_SYMBOL`.
    pub fn get(&self, sym: SymbolId) -> Arc<SymbolData> {
        if let Some(entry) = self.symbols.get(&sym) {
            return Arc::clone(entry.value());
        }
        debug_assert!(false, "unknown symbol {sym:?}");
        self.symbols
            .get(&SymbolId::NO_SYMBOL)
            .map(|entry| Arc::clone(entry.value()))
            .unwrap_or_else(|| {
                Arc::new(SymbolData::new(
                    SymbolId::NO_SYMBOL,
                    Name::EMPTY,
                    SymbolId::NO_SYMBOL,
                    SymbolKind::NoSymbol,
                    SymbolFlags::empty(),
                ))
            })
    }

    pub fn contains(&self, sym: SymbolId) -> bool {
        self.symbols.contains_key(&sym)
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.len() <= 1
    }

    #[inline]
    pub fn owner(&self, sym: SymbolId) -> SymbolId {
        self.get(sym).owner
    }

    #[inline]
    pub fn name(&self, sym: SymbolId) -> Name {
        self.get(sym).name
    }

    #[inline]
    pub fn kind(&self, sym: SymbolId) -> SymbolKind {
        self.get(sym).kind
    }

    #[inline]
    pub fn flags(&self, sym: SymbolId) -> SymbolFlags {
        self.get(sym).flags
    }

    #[inline]
    pub fn info(&self, sym: SymbolId) -> TypeId {
        self.get(sym).info
    }

    #[inline]
    pub fn type_params(&self, sym: SymbolId) -> Vec<SymbolId> {
        self.get(sym).type_params.clone()
    }

    #[inline]
    pub fn companion(&self, sym: SymbolId) -> SymbolId {
        self.get(sym).companion
    }

    /// `sym.name` as text.
    pub fn name_str(&self, sym: SymbolId) -> Arc<str> {
        self.resolve_name(self.name(sym))
    }

    /// Dotted path from the outermost named owner, e.g. `scala.Int`.
    pub fn full_name(&self, sym: SymbolId) -> String {
        let mut parts = Vec::new();
        let mut current = sym;
        while current.exists() && current != self.defs.root_class && current != self.defs.root_package {
            parts.push(self.name_str(current));
            current = self.owner(current);
        }
        parts.reverse();
        parts.join(".")
    }

    /// `sym` equals `owner` or is (transitively) owned by it.
    pub fn is_nested_in(&self, sym: SymbolId, owner: SymbolId) -> bool {
        let mut current = sym;
        loop {
            if current == owner {
                return true;
            }
            if !current.exists() {
                return false;
            }
            current = self.owner(current);
        }
    }

    /// Prefix used when referring to a member of `owner` from outside:
    /// `owner.this` for classes and packages, `NoPrefix` for local owners.
    pub fn prefix_for(&self, owner: SymbolId, db: &dyn TypeDatabase) -> TypeId {
        if owner.exists() && self.kind(owner).is_class() {
            db.this_type(owner)
        } else {
            TypeId::NO_PREFIX
        }
    }

    /// Class symbol behind a parent type, following aliases.
    pub fn parent_class(&self, db: &dyn TypeDatabase, parent: TypeId) -> SymbolId {
        let mut ty = parent;
        for _ in 0..MAX_ALIAS_EXPANSION_DEPTH {
            match db.data(ty) {
                TypeData::Ref { sym, .. } => {
                    let data = self.get(sym);
                    if data.is_class() {
                        return sym;
                    }
                    if data.is_alias_type() {
                        ty = data.info;
                        continue;
                    }
                    return SymbolId::NO_SYMBOL;
                }
                TypeData::Refined { class, .. } => return class,
                TypeData::Annotated { underlying, .. } => ty = underlying,
                _ => return SymbolId::NO_SYMBOL,
            }
        }
        SymbolId::NO_SYMBOL
    }

    /// Linearization of a class: the class itself, then its base classes from
    /// the most derived mixin to the root.
    ///
    /// The superclass's linearization is the tail; each further parent
    /// prepends the classes it adds. A class that (illegally) inherits from
    /// itself has the cyclic parent ignored.
    pub fn base_classes(&self, db: &dyn TypeDatabase, sym: SymbolId) -> Arc<[SymbolId]> {
        if let Some(cached) = self.base_classes.get(&sym) {
            return Arc::clone(cached.value());
        }
        let mut guard = RecursionGuard::with_profile(RecursionProfile::Linearization);
        self.compute_base_classes(db, sym, &mut guard)
    }

    fn compute_base_classes(
        &self,
        db: &dyn TypeDatabase,
        sym: SymbolId,
        guard: &mut RecursionGuard<SymbolId>,
    ) -> Arc<[SymbolId]> {
        if let Some(cached) = self.base_classes.get(&sym) {
            return Arc::clone(cached.value());
        }
        let data = self.get(sym);
        if !data.is_class() {
            return Arc::from(Vec::new());
        }
        let entry = match guard.enter(sym) {
            RecursionResult::Entered(entry) => entry,
            RecursionResult::Cycle | RecursionResult::DepthExceeded => {
                return Arc::from(Vec::new());
            }
        };

        let mut parents = data.parents.iter().map(|&p| self.parent_class(db, p));
        let mut tail: Vec<SymbolId> = match parents.next() {
            Some(superclass) if superclass.exists() => {
                self.compute_base_classes(db, superclass, guard).to_vec()
            }
            _ => Vec::new(),
        };
        for mixin in parents.filter(|m| m.exists()) {
            let mixin_bcs = self.compute_base_classes(db, mixin, guard);
            let mut added: Vec<SymbolId> = mixin_bcs
                .iter()
                .copied()
                .filter(|bc| !tail.contains(bc))
                .collect();
            added.extend(tail);
            tail = added;
        }
        tail.retain(|&bc| bc != sym);
        let mut result = Vec::with_capacity(tail.len() + 1);
        result.push(sym);
        result.extend(tail);

        guard.leave(entry);
        let result: Arc<[SymbolId]> = Arc::from(result);
        self.base_classes.insert(sym, Arc::clone(&result));
        result
    }

    /// `sym1` derives from `sym2`, counting the bottom classes: `Nothing`
    /// derives from every class, `Null` from every class that admits `null`.
    pub fn is_sub_class(&self, db: &dyn TypeDatabase, sym1: SymbolId, sym2: SymbolId) -> bool {
        if sym1 == sym2 {
            return true;
        }
        if !self.kind(sym2).is_class() {
            return false;
        }
        if sym1 == self.defs.nothing {
            return true;
        }
        if sym1 == self.defs.null {
            return self.contains_null(db, sym2);
        }
        self.is_non_bottom_sub_class(db, sym1, sym2)
    }

    /// Subclass test ignoring the bottom classes.
    pub fn is_non_bottom_sub_class(&self, db: &dyn TypeDatabase, sym1: SymbolId, sym2: SymbolId) -> bool {
        sym1 == sym2 || self.base_classes(db, sym1).contains(&sym2)
    }

    /// A class whose instances may be `null`: not `Nothing`, not a value
    /// class and not a `NotNull` class.
    pub fn contains_null(&self, db: &dyn TypeDatabase, sym: SymbolId) -> bool {
        self.kind(sym).is_class()
            && sym != self.defs.nothing
            && !self.is_non_bottom_sub_class(db, sym, self.defs.any_val)
            && !self.is_non_bottom_sub_class(db, sym, self.defs.not_null)
    }

    /// Non-private members named `name` declared in `class` itself.
    pub fn decls_named(&self, class: SymbolId, name: Name) -> Vec<SymbolId> {
        self.get(class)
            .decls
            .iter()
            .copied()
            .filter(|&d| {
                let data = self.get(d);
                data.name == name && !data.is_private()
            })
            .collect()
    }
}

#[cfg(test)]
#[path = "tests/symbols_tests.rs"]
mod tests;
