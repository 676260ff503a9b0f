//! The type-erased storage and dispatch core.
//!
//! A wrapper is a fixed-size cell of four pointer-words. The first word is a
//! reference to a [`vtable::WrapperVtable`]; the remaining three are a raw
//! payload slot. The active storage variant is implicitly "whichever vtable
//! occupies the header": there is no discriminant beyond the table itself.
//!
//! The module is split so that each safety-critical field is only visible in
//! the file that maintains its invariant:
//!
//! - [`data`] owns the cell and payload layouts and is the only place raw
//!   payload bytes are read or written.
//! - [`vtable`] owns the dispatch tables and is the only place thunks are
//!   paired with concrete payload types.
//! - [`raw`] owns the [`RawWrapper`] state machine built on top of the two.

mod data;
mod raw;
mod vtable;

pub use raw::RawWrapper;
pub use vtable::StorageKind;
