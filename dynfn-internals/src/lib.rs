#![no_std]
#![forbid(
    missing_docs,
    clippy::alloc_instead_of_core,
    clippy::std_instead_of_alloc,
    clippy::std_instead_of_core,
    clippy::missing_safety_doc,
    clippy::missing_docs_in_private_items,
    clippy::undocumented_unsafe_blocks,
    clippy::multiple_unsafe_ops_per_block,
    rustdoc::invalid_rust_codeblocks,
    rustdoc::broken_intra_doc_links,
    missing_copy_implementations,
    unused_doc_comments
)]
#![allow(rustdoc::private_intra_doc_links)]
//! Internal implementation crate for [`dynfn`].
//!
//! # Overview
//!
//! This crate contains the low-level, type-erased storage and unsafe dispatch
//! machinery that powers the [`dynfn`] polymorphic callable containers. It
//! provides the foundation for zero-cost type erasure through vtable-based
//! dispatch out of a fixed-size inline buffer.
//!
//! **This crate is an implementation detail.** No semantic versioning
//! guarantees are provided. Users should depend on the [`dynfn`] crate, not
//! this one.
//!
//! # Architecture
//!
//! - **[`signature`]**: The [`Signature`] family of supported call signatures
//!   and the [`Call`]/[`CallMut`] capability traits that connect ordinary
//!   closures and function pointers to a signature.
//! - **[`wrapper`]** (private): The storage and dispatch core
//!   - [`RawWrapper`]: An owned, type-erased callable value. The first bytes
//!     of its buffer hold a reference to a `WrapperVtable`, and the active
//!     storage variant is implicitly "whichever vtable occupies the header".
//!   - `RawCell`: `#[repr(C)]` buffer layout enabling field access on erased
//!     payloads
//!   - `WrapperVtable`: Function pointers for type-erased dispatch, with
//!     nullable entries for operations that are trivial or unsupported
//! - **[`allocator`]**: The [`StorageAllocator`] capability used by
//!   heap-backed storage, including pool-identity comparison.
//! - **[`member`]**: The [`Member`] receiver-bound accessor, the analog of a
//!   pointer-to-data-member.
//! - **[`errors`]**: The failure values surfaced by wrapper operations.
//!
//! # Safety Strategy
//!
//! Type erasure requires careful handling to maintain Rust's type safety
//! guarantees. When a payload of type `F` is erased into the wrapper's
//! buffer, we must ensure that the vtable function pointers stored alongside
//! it still match the actual concrete type in memory.
//!
//! This crate maintains safety through:
//!
//! - **Module-based encapsulation**: Safety-critical types keep fields
//!   module-private, making invariants locally verifiable within a single
//!   file
//! - **`#[repr(C)]` layout**: The vtable reference is always the first field
//!   of the buffer, so the active table can be read without knowing the
//!   payload type
//! - **Documented vtable contracts**: Each vtable method specifies exactly
//!   when it can be safely called
//!
//! [`dynfn`]: https://docs.rs/dynfn/latest/dynfn/
//! [`Signature`]: signature::Signature
//! [`Call`]: signature::Call
//! [`CallMut`]: signature::CallMut
//! [`StorageAllocator`]: allocator::StorageAllocator
//! [`Member`]: member::Member
//! [`RawWrapper`]: wrapper::RawWrapper

extern crate alloc;

pub mod allocator;
pub mod errors;
pub mod member;
pub mod signature;
mod wrapper;

pub use member::{Member, member};
pub use wrapper::{RawWrapper, StorageKind};
