//! Case rules of the subtype cascade, split by the shape they handle.
//!
//! Each submodule adds methods to [`SubtypeChecker`](crate::subtype::SubtypeChecker).

mod higher_kinded;
mod refs;
mod structural;
mod type_vars;
