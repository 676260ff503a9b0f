//! Convenience re-exports of the types most code needs.
//!
//! ```
//! use dynfn::prelude::*;
//!
//! let f: Function<fn() -> i32> = Function::new(|| 42);
//! assert_eq!(f.call(()), 42);
//! ```

pub use crate::{
    Function, FunctionContainer, UniqueFunction, UniqueFunctionContainer, member,
};
