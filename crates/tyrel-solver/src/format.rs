//! Type formatting for traces and diagnostics.
//!
//! Rendering follows Scala surface syntax. Symbols are printed by their
//! simple names (packages by their full names); a prefix is shown only when
//! it is a stable path (`x.T`) or a general type (`P#T`), not for this-types.
//! Deep types are cut off with `...`.

use crate::env::TypeEnv;
use crate::symbols::{SymbolFlags, SymbolId};
use crate::types::{ConstantValue, MethodFlags, SymbolListId, TypeData, TypeId};

const MAX_FORMAT_DEPTH: u32 = 12;

/// Renders types as human-readable strings.
pub struct TypeFormatter<'a> {
    env: TypeEnv<'a>,
    max_depth: u32,
    depth: u32,
}

impl<'a> TypeFormatter<'a> {
    pub fn new(env: TypeEnv<'a>) -> Self {
        TypeFormatter {
            env,
            max_depth: MAX_FORMAT_DEPTH,
            depth: 0,
        }
    }

    pub fn with_max_depth(mut self, max_depth: u32) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn format(&mut self, ty: TypeId) -> String {
        if self.depth > self.max_depth {
            return "...".to_string();
        }
        self.depth += 1;
        let out = self.format_inner(ty);
        self.depth -= 1;
        out
    }

    fn format_inner(&mut self, ty: TypeId) -> String {
        let env = self.env;
        match env.data(ty) {
            TypeData::NoType => "<notype>".to_string(),
            TypeData::NoPrefix => "<noprefix>".to_string(),
            TypeData::Error => "<error>".to_string(),
            TypeData::Wildcard => "?".to_string(),
            TypeData::This(sym) => format!("{}.this.type", self.symbol_name(sym)),
            TypeData::Single { prefix, sym } => format!("{}{}.type", self.prefix_string(prefix), self.symbol_name(sym)),
            TypeData::Constant(value) => self.format_constant(value),
            TypeData::Ref { prefix, sym, args } => {
                let args = env.type_list(args);
                let mut out = format!("{}{}", self.prefix_string(prefix), self.symbol_name(sym));
                if !args.is_empty() {
                    out.push('[');
                    out.push_str(&self.format_list(&args));
                    out.push(']');
                }
                out
            }
            TypeData::Refined { parents, decls, .. } => {
                let parents = env.type_list(parents);
                let mut out = parents
                    .iter()
                    .map(|&p| self.format(p))
                    .collect::<Vec<_>>()
                    .join(" with ");
                let decls = env.symbol_list(decls);
                if !decls.is_empty() || parents.is_empty() {
                    if !out.is_empty() {
                        out.push(' ');
                    }
                    out.push_str("{ ");
                    out.push_str(&self.format_decls(&decls));
                    out.push_str(" }");
                }
                out
            }
            TypeData::Existential { quantified, underlying } => {
                let body = self.format(underlying);
                let decls = env.symbol_list(quantified);
                format!("{} forSome {{ {} }}", body, self.format_decls(&decls))
            }
            TypeData::Annotated { annotations, underlying } => {
                let mut out = self.format(underlying);
                for &annot in env.symbol_list(annotations).iter() {
                    out.push_str(" @");
                    out.push_str(&self.symbol_name(annot));
                }
                out
            }
            TypeData::BoundedWildcard(bounds) => format!("?{}", self.format(bounds)),
            TypeData::Bounds { lo, hi } => self.format_bounds(lo, hi),
            TypeData::Method { params, result, flags } => {
                let implicit = if flags.contains(MethodFlags::IMPLICIT) { "implicit " } else { "" };
                format!("({}{}){}", implicit, self.format_params(params), self.format(result))
            }
            TypeData::NullaryMethod(result) => format!("=> {}", self.format(result)),
            TypeData::Poly { type_params, result } => {
                let tparams = env.symbol_list(type_params);
                format!("[{}]{}", self.format_decls_sep(&tparams, ", "), self.format(result))
            }
            TypeData::TypeVar(var) => format!("?{}", var.0),
            TypeData::NotNull(underlying) => format!("{} with NotNull", self.format(underlying)),
        }
    }

    fn format_list(&mut self, types: &[TypeId]) -> String {
        types.iter().map(|&t| self.format(t)).collect::<Vec<_>>().join(", ")
    }

    fn format_constant(&self, value: ConstantValue) -> String {
        match value {
            ConstantValue::Unit => "()".to_string(),
            ConstantValue::Null => "null".to_string(),
            ConstantValue::Boolean(b) => b.to_string(),
            ConstantValue::Char(c) => format!("'{c}'"),
            ConstantValue::Int(i) => i.to_string(),
            ConstantValue::Long(l) => format!("{l}L"),
            ConstantValue::Double(bits) => f64::from_bits(bits).to_string(),
            ConstantValue::Str(name) => format!("\"{}\"", self.env.symbols.resolve_name(name)),
        }
    }

    /// ` >: lo <: hi`, omitting trivial bounds.
    fn format_bounds(&mut self, lo: TypeId, hi: TypeId) -> String {
        let defs = self.env.defs();
        let mut out = String::new();
        if lo != defs.nothing_type {
            out.push_str(" >: ");
            out.push_str(&self.format(lo));
        }
        if hi != defs.any_type {
            out.push_str(" <: ");
            out.push_str(&self.format(hi));
        }
        out
    }

    fn format_params(&mut self, params: SymbolListId) -> String {
        let params = self.env.symbol_list(params);
        params
            .iter()
            .map(|&p| {
                let info = self.env.symbols.info(p);
                format!("{}: {}", self.symbol_name(p), self.format(info))
            })
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn format_decls(&mut self, decls: &[SymbolId]) -> String {
        self.format_decls_sep(decls, "; ")
    }

    /// Member or binder declarations: `type T <: Hi`, `val x: T`, `def f: T`.
    fn format_decls_sep(&mut self, decls: &[SymbolId], sep: &str) -> String {
        decls
            .iter()
            .map(|&d| {
                let data = self.env.sym(d);
                let name = self.symbol_name(d);
                if data.flags.contains(SymbolFlags::PARAM) && data.is_type() {
                    let (lo, hi) = self.env.bounds_of(d);
                    format!("{}{}", name, self.format_bounds(lo, hi))
                } else if data.is_alias_type() {
                    format!("type {} = {}", name, self.format(data.info))
                } else if data.is_type() {
                    let (lo, hi) = self.env.bounds_of(d);
                    format!("type {}{}", name, self.format_bounds(lo, hi))
                } else if data.is_method() {
                    format!("def {}{}", name, self.format(data.info))
                } else {
                    format!("val {}: {}", name, self.format(data.info))
                }
            })
            .collect::<Vec<_>>()
            .join(sep)
    }

    fn prefix_string(&mut self, prefix: TypeId) -> String {
        match self.env.data(prefix) {
            TypeData::NoPrefix | TypeData::This(_) => String::new(),
            TypeData::Single { prefix: inner, sym } => {
                format!("{}{}.", self.prefix_string(inner), self.symbol_name(sym))
            }
            _ => format!("{}#", self.format(prefix)),
        }
    }

    fn symbol_name(&self, sym: SymbolId) -> String {
        let symbols = self.env.symbols;
        let data = symbols.get(sym);
        if data.is_package() {
            return symbols.full_name(sym);
        }
        symbols.resolve_name(data.name).to_string()
    }
}

#[cfg(test)]
#[path = "tests/format_tests.rs"]
mod tests;
