//! Call signatures and the callable capability traits.
//!
//! A wrapper is declared with a [`Signature`]: a bare function-pointer type
//! such as `fn(i32, i32) -> i32` naming the argument types and the return
//! type of the calls it supports. The signature family is sealed and covers
//! arities 0 through 6 with by-value, `'static` argument types.
//!
//! A value is eligible as a wrapper target when it implements the capability
//! trait for the declared signature: [`Call`] for targets invocable through a
//! shared receiver (the `Fn` closures) and [`CallMut`] for targets that need
//! a mutable receiver (the `FnMut` closures). Both are blanket-implemented,
//! so ordinary closures and function pointers qualify without any user code.

/// A call signature supported by a wrapper.
///
/// Implemented for bare function-pointer types `fn(A1, ..., An) -> R` up to
/// arity 6. The trait is sealed: the dispatch machinery bakes one call thunk
/// per receiver mode into each vtable, so the set of signature shapes must be
/// closed.
///
/// # Examples
///
/// ```
/// use dynfn_internals::signature::Signature;
///
/// fn args_of<S: Signature>(args: S::Args) -> S::Args {
///     args
/// }
///
/// let args: (i32, i32) = args_of::<fn(i32, i32) -> i32>((1, 2));
/// assert_eq!(args, (1, 2));
/// ```
pub trait Signature: sealed_signature::Sealed + 'static {
    /// The argument tuple passed to a call. Arity 0 uses the unit tuple.
    type Args;
    /// The value produced by a call.
    type Output;
}

/// Capability of being called through a mutable receiver with the argument
/// and return types of the signature `S`.
///
/// Blanket-implemented for every `FnMut` closure and function pointer whose
/// parameter list matches `S`. This is the base capability: every callable
/// target supports at least the mutable-receiver path.
pub trait CallMut<S: Signature>: 'static {
    /// Invokes the target with the given argument tuple.
    fn call_mut(&mut self, args: S::Args) -> S::Output;
}

/// Capability of being called through a shared receiver with the argument
/// and return types of the signature `S`.
///
/// Blanket-implemented for every `Fn` closure and function pointer whose
/// parameter list matches `S`.
pub trait Call<S: Signature>: CallMut<S> {
    /// Invokes the target with the given argument tuple.
    fn call(&self, args: S::Args) -> S::Output;
}

/// Seal for [`Signature`], restricting it to the `fn(..) -> R` family below.
mod sealed_signature {
    /// The actual sealing trait.
    pub trait Sealed {}
}

/// Implements [`Signature`], [`Call`] and [`CallMut`] for one arity.
///
/// Each invocation takes `Type binding` pairs: the capitalized ident names
/// the argument type parameter, the lowercase ident is reused as the binding
/// when destructuring the argument tuple.
macro_rules! impl_signature {
    ($($ty:ident $arg:ident),*) => {
        impl<$($ty: 'static,)* Ret: 'static> sealed_signature::Sealed
            for fn($($ty),*) -> Ret
        {
        }

        impl<$($ty: 'static,)* Ret: 'static> Signature for fn($($ty),*) -> Ret {
            type Args = ($($ty,)*);
            type Output = Ret;
        }

        impl<Target, $($ty: 'static,)* Ret: 'static> CallMut<fn($($ty),*) -> Ret> for Target
        where
            Target: FnMut($($ty),*) -> Ret + 'static,
        {
            #[inline]
            fn call_mut(&mut self, ($($arg,)*): ($($ty,)*)) -> Ret {
                self($($arg),*)
            }
        }

        impl<Target, $($ty: 'static,)* Ret: 'static> Call<fn($($ty),*) -> Ret> for Target
        where
            Target: Fn($($ty),*) -> Ret + 'static,
        {
            #[inline]
            fn call(&self, ($($arg,)*): ($($ty,)*)) -> Ret {
                self($($arg),*)
            }
        }
    };
}

impl_signature!();
impl_signature!(A1 a1);
impl_signature!(A1 a1, A2 a2);
impl_signature!(A1 a1, A2 a2, A3 a3);
impl_signature!(A1 a1, A2 a2, A3 a3, A4 a4);
impl_signature!(A1 a1, A2 a2, A3 a3, A4 a4, A5 a5);
impl_signature!(A1 a1, A2 a2, A3 a3, A4 a4, A5 a5, A6 a6);

#[cfg(test)]
mod tests {
    use alloc::string::String;

    use super::*;

    fn add(a: i32, b: i32) -> i32 {
        a + b
    }

    #[test]
    fn test_fn_pointer_call() {
        let f: fn(i32, i32) -> i32 = add;
        assert_eq!(Call::<fn(i32, i32) -> i32>::call(&f, (2, 3)), 5);
    }

    #[test]
    fn test_closure_call() {
        let offset = 10;
        let f = move |x: i32| x + offset;
        assert_eq!(Call::<fn(i32) -> i32>::call(&f, (1,)), 11);
    }

    #[test]
    fn test_fnmut_closure() {
        let mut total = 0;
        let mut f = move |x: i32| {
            total += x;
            total
        };
        assert_eq!(CallMut::<fn(i32) -> i32>::call_mut(&mut f, (4,)), 4);
        assert_eq!(CallMut::<fn(i32) -> i32>::call_mut(&mut f, (4,)), 8);
    }

    #[test]
    fn test_zero_arity() {
        let f = || String::from("hello");
        assert_eq!(Call::<fn() -> String>::call(&f, ()), "hello");
    }
}
