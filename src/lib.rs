#![cfg_attr(not(doc), no_std)]
#![deny(
    missing_docs,
    clippy::alloc_instead_of_core,
    clippy::std_instead_of_alloc,
    clippy::std_instead_of_core,
    clippy::missing_safety_doc,
    clippy::undocumented_unsafe_blocks,
    clippy::multiple_unsafe_ops_per_block,
    clippy::as_ptr_cast_mut,
    clippy::ptr_as_ptr,
    rustdoc::invalid_rust_codeblocks,
    rustdoc::broken_intra_doc_links,
    missing_copy_implementations,
    unused_doc_comments
)]
// Make docs.rs generate better docs
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Polymorphic callable containers with inline, member and allocator-backed
//! storage.
//!
//! ## Overview
//!
//! This crate provides owned, type-erased function wrappers in the spirit of
//! `Box<dyn Fn(..)>`, but as fixed-size values of four pointer-words that
//! avoid the allocator whenever the target fits inline. A wrapper is declared
//! with a *signature* — a bare function-pointer type naming its argument and
//! return types — and accepts any closure, function pointer or field accessor
//! matching that signature.
//!
//! ## Quick Example
//!
//! ```
//! use dynfn::Function;
//!
//! let offset = 10;
//! let f: Function<fn(i32) -> i32> = Function::new(move |x: i32| x + offset);
//! assert_eq!(f.call((32,)), 42);
//!
//! // Small targets never touch the allocator.
//! let g = f.clone();
//! assert_eq!(g.call((0,)), 10);
//! ```
//!
//! ## Core Concepts
//!
//! Four container types cover the copyable/move-only and plain/
//! allocator-retaining combinations:
//!
//! - [`Function`]: copyable; accepts `Fn` targets that implement [`Clone`].
//! - [`UniqueFunction`]: move-only; accepts `FnMut` targets, including
//!   move-only ones. Attempting to clone it is a compile error, not a runtime
//!   one.
//! - [`FunctionContainer`]: a copyable wrapper that retains an allocator and
//!   keeps its target in that pool, re-homing or rejecting payloads that
//!   arrive from elsewhere.
//! - [`UniqueFunctionContainer`]: the move-only, allocator-retaining variant.
//!
//! Targets are stored in one of three ways, chosen automatically: inline in
//! the wrapper's own buffer when small enough, as a [`Member`] field
//! accessor, or in a node obtained from an allocator. The storage choice is
//! observable through [`StorageKind`] but never changes the call behavior.
//!
//! Invoking an empty wrapper is an error, never undefined behavior: the
//! panicking [`Function::call`] documents its panic, and every panicking
//! entry point has a `try_` twin returning [`CallError`].
//!
//! Allocators are pluggable through the [`StorageAllocator`] trait, built on
//! [`allocator_api2`]. Moving a payload between containers compares pools at
//! runtime: same pool moves a pointer, same allocator *type* but different
//! pool re-homes the value, and a foreign allocator type fails with
//! [`AllocatorMismatchError`].
//!
//! For implementation details, see the [`dynfn-internals`] crate.
//!
//! [`dynfn-internals`]: dynfn_internals
//! [`CallError`]: errors::CallError
//! [`AllocatorMismatchError`]: errors::AllocatorMismatchError

extern crate alloc;

mod container;
mod function;
pub mod prelude;
mod unique;

pub use dynfn_internals::{
    Member, StorageKind,
    allocator::StorageAllocator,
    errors,
    member,
    signature::{Call, CallMut, Signature},
};

pub use crate::{
    container::{FunctionContainer, UniqueFunctionContainer},
    function::Function,
    unique::UniqueFunction,
};
