//! Expression actions
//!
//! An [`Action`] is the function at an expression node. It receives the
//! tuple of already-evaluated operand values, so nothing here can
//! short-circuit: [`And`], [`Or`] and [`Cond`] see every operand evaluated,
//! side effects included.
//!
//! Operator actions are produced by the operator overloads in
//! [`crate::ops`]; the rest have builder functions in this module.

use std::borrow::Cow;
use std::fmt::{self, Display};
use std::marker::PhantomData;
use std::ops::Deref;
use std::rc::Rc;

use crate::expr::{make_expr, BindingExpr, IntoOperand, IntoOperands, Operand, Operands};

/// The function applied at an expression node
pub trait Action<Args> {
    type Output;

    fn apply(&self, args: Args) -> Self::Output;
}

/// Passes its single operand through
#[derive(Clone, Copy, Debug, Default)]
pub struct Identity;

impl<T> Action<(T,)> for Identity {
    type Output = T;

    fn apply(&self, (value,): (T,)) -> T {
        value
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Operators
// ─────────────────────────────────────────────────────────────────────────────

macro_rules! binary_actions {
    ($($(#[$doc:meta])* $name:ident => $Trait:ident::$method:ident),* $(,)?) => {$(
        $(#[$doc])*
        #[derive(Clone, Copy, Debug, Default)]
        pub struct $name;

        impl<L: std::ops::$Trait<R>, R> Action<(L, R)> for $name {
            type Output = L::Output;

            fn apply(&self, (l, r): (L, R)) -> Self::Output {
                std::ops::$Trait::$method(l, r)
            }
        }
    )*};
}

binary_actions!(
    /// `l + r`
    Add => Add::add,
    /// `l - r`
    Sub => Sub::sub,
    /// `l * r`
    Mul => Mul::mul,
    /// `l / r`
    Div => Div::div,
    /// `l % r`
    Rem => Rem::rem,
    /// `l & r`
    BitAnd => BitAnd::bitand,
    /// `l | r`
    BitOr => BitOr::bitor,
    /// `l ^ r`
    BitXor => BitXor::bitxor,
    /// `l << r`
    Shl => Shl::shl,
    /// `l >> r`
    Shr => Shr::shr,
);

macro_rules! comparison_actions {
    ($($name:ident => $Trait:ident, $op:tt);* $(;)?) => {$(
        #[derive(Clone, Copy, Debug, Default)]
        pub struct $name;

        impl<L: $Trait<R>, R> Action<(L, R)> for $name {
            type Output = bool;

            fn apply(&self, (l, r): (L, R)) -> bool {
                l $op r
            }
        }
    )*};
}

comparison_actions!(
    Eq => PartialEq, ==;
    Ne => PartialEq, !=;
    Lt => PartialOrd, <;
    Le => PartialOrd, <=;
    Gt => PartialOrd, >;
    Ge => PartialOrd, >=;
);

/// Logical and over two evaluated operands (no short-circuit)
#[derive(Clone, Copy, Debug, Default)]
pub struct And;

impl Action<(bool, bool)> for And {
    type Output = bool;

    fn apply(&self, (l, r): (bool, bool)) -> bool {
        l && r
    }
}

/// Logical or over two evaluated operands (no short-circuit)
#[derive(Clone, Copy, Debug, Default)]
pub struct Or;

impl Action<(bool, bool)> for Or {
    type Output = bool;

    fn apply(&self, (l, r): (bool, bool)) -> bool {
        l || r
    }
}

/// Unary `+`: the value unchanged
#[derive(Clone, Copy, Debug, Default)]
pub struct Plus;

impl<T> Action<(T,)> for Plus {
    type Output = T;

    fn apply(&self, (value,): (T,)) -> T {
        value
    }
}

/// Unary `-`
#[derive(Clone, Copy, Debug, Default)]
pub struct Neg;

impl<T: std::ops::Neg> Action<(T,)> for Neg {
    type Output = T::Output;

    fn apply(&self, (value,): (T,)) -> T::Output {
        -value
    }
}

/// Unary `!` (logical not on `bool`)
#[derive(Clone, Copy, Debug, Default)]
pub struct Not;

impl<T: std::ops::Not> Action<(T,)> for Not {
    type Output = T::Output;

    fn apply(&self, (value,): (T,)) -> T::Output {
        !value
    }
}

/// Bitwise complement; Rust spells it `!` on integers
#[derive(Clone, Copy, Debug, Default)]
pub struct BitNot;

impl<T: std::ops::Not> Action<(T,)> for BitNot {
    type Output = T::Output;

    fn apply(&self, (value,): (T,)) -> T::Output {
        !value
    }
}

/// Moves the value behind a shared pointer
#[derive(Clone, Copy, Debug, Default)]
pub struct AddressOf;

impl<T> Action<(T,)> for AddressOf {
    type Output = Rc<T>;

    fn apply(&self, (value,): (T,)) -> Rc<T> {
        Rc::new(value)
    }
}

/// Dereferences a pointer-like value and clones the target
#[derive(Clone, Copy, Debug, Default)]
pub struct ContentOf;

impl<P> Action<(P,)> for ContentOf
where
    P: Deref,
    P::Target: Clone,
{
    type Output = P::Target;

    fn apply(&self, (pointer,): (P,)) -> P::Target {
        (*pointer).clone()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Conditional
// ─────────────────────────────────────────────────────────────────────────────

/// `if pred { a } else { b }` with both branches already evaluated
#[derive(Clone, Copy, Debug, Default)]
pub struct Cond;

impl<T> Action<(bool, T, T)> for Cond {
    type Output = T;

    fn apply(&self, (pred, a, b): (bool, T, T)) -> T {
        if pred {
            a
        } else {
            b
        }
    }
}

/// Conditional expression
///
/// All three operands are evaluated on every evaluation; only the result is
/// selected by `pred`.
pub fn cond<P, A, B>(pred: P, a: A, b: B) -> BindingExpr<Cond, (P::Operand, A::Operand, B::Operand)>
where
    P: IntoOperand,
    A: IntoOperand,
    B: IntoOperand,
    Cond: Action<(
        <P::Operand as Operand>::Output,
        <A::Operand as Operand>::Output,
        <B::Operand as Operand>::Output,
    )>,
{
    make_expr(Cond, (pred, a, b))
}

// ─────────────────────────────────────────────────────────────────────────────
// Construction, calls and casts
// ─────────────────────────────────────────────────────────────────────────────

/// Builds a `T` from the operand values through `From`
pub struct Construct<T>(PhantomData<fn() -> T>);

impl<T> Clone for Construct<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Construct<T> {}

impl<T> Default for Construct<T> {
    fn default() -> Self {
        Construct(PhantomData)
    }
}

impl<T> fmt::Debug for Construct<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Construct<{}>", std::any::type_name::<T>())
    }
}

impl<T: From<A>, A> Action<(A,)> for Construct<T> {
    type Output = T;

    fn apply(&self, (a,): (A,)) -> T {
        T::from(a)
    }
}

macro_rules! impl_construct {
    ($($name:ident),+) => {
        impl<T: From<($($name,)+)>, $($name),+> Action<($($name,)+)> for Construct<T> {
            type Output = T;

            fn apply(&self, args: ($($name,)+)) -> T {
                T::from(args)
            }
        }
    };
}

impl_construct!(A, B);
impl_construct!(A, B, C);
impl_construct!(A, B, C, D);

/// Construct a `T` from operands
///
/// A single operand uses `T: From<A>`; several use `T: From<(A, B, ..)>`.
///
/// ```ignore
/// let size = construct::<Size, _>((width.prop(Value), height.prop(Value)));
/// ```
pub fn construct<T, O>(operands: O) -> BindingExpr<Construct<T>, O::Operands>
where
    O: IntoOperands,
    Construct<T>: Action<<O::Operands as Operands>::Values>,
{
    make_expr(Construct::default(), operands)
}

/// Calls a function with the operand values
#[derive(Clone, Copy, Debug)]
pub struct Call<F>(pub F);

macro_rules! impl_call {
    ($($name:ident),*) => {
        #[allow(non_snake_case)]
        impl<Func, Ret, $($name),*> Action<($($name,)*)> for Call<Func>
        where
            Func: Fn($($name),*) -> Ret,
        {
            type Output = Ret;

            fn apply(&self, ($($name,)*): ($($name,)*)) -> Ret {
                (self.0)($($name),*)
            }
        }
    };
}

impl_call!();
impl_call!(A);
impl_call!(A, B);
impl_call!(A, B, C);
impl_call!(A, B, C, D);
impl_call!(A, B, C, D, E);

/// Call `func` with the evaluated operands
pub fn call<F, O>(func: F, operands: O) -> BindingExpr<Call<F>, O::Operands>
where
    O: IntoOperands,
    Call<F>: Action<<O::Operands as Operands>::Values>,
{
    make_expr(Call(func), operands)
}

/// Primitive `as` conversion
pub trait AsCast<To> {
    fn as_cast(self) -> To;
}

macro_rules! impl_as_cast {
    (@from $from:ty => $($to:ty),*) => {$(
        impl AsCast<$to> for $from {
            #[inline]
            fn as_cast(self) -> $to {
                self as $to
            }
        }
    )*};
    ($($from:ty),*) => {$(
        impl_as_cast!(@from $from => i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64);
    )*};
}

impl_as_cast!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64);
impl_as_cast!(@from bool => i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);
impl_as_cast!(@from char => u8, u32, u64);

/// Lossy primitive conversion, like an `as` cast
pub struct Cast<To>(PhantomData<fn() -> To>);

/// Lossless conversion through `From`
pub struct StaticCast<To>(PhantomData<fn() -> To>);

/// Bit-for-bit reinterpretation between plain-old-data types
pub struct ReinterpretCast<To>(PhantomData<fn() -> To>);

macro_rules! marker_action_impls {
    ($($name:ident),*) => {$(
        impl<To> Clone for $name<To> {
            fn clone(&self) -> Self {
                *self
            }
        }

        impl<To> Copy for $name<To> {}

        impl<To> Default for $name<To> {
            fn default() -> Self {
                $name(PhantomData)
            }
        }

        impl<To> fmt::Debug for $name<To> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}<{}>", stringify!($name), std::any::type_name::<To>())
            }
        }
    )*};
}

marker_action_impls!(Cast, StaticCast, ReinterpretCast);

impl<To, F: AsCast<To>> Action<(F,)> for Cast<To> {
    type Output = To;

    fn apply(&self, (from,): (F,)) -> To {
        from.as_cast()
    }
}

impl<To: From<F>, F> Action<(F,)> for StaticCast<To> {
    type Output = To;

    fn apply(&self, (from,): (F,)) -> To {
        To::from(from)
    }
}

impl<To: bytemuck::Pod, F: bytemuck::Pod> Action<(F,)> for ReinterpretCast<To> {
    type Output = To;

    /// Panics when `F` and `To` differ in size.
    fn apply(&self, (from,): (F,)) -> To {
        bytemuck::cast(from)
    }
}

/// `value as To` on primitives
pub fn cast<To, F>(value: F) -> BindingExpr<Cast<To>, (F::Operand,)>
where
    F: IntoOperand,
{
    BindingExpr::new(Cast::default(), (value.into_operand(),))
}

/// `To::from(value)`
pub fn static_cast<To, F>(value: F) -> BindingExpr<StaticCast<To>, (F::Operand,)>
where
    F: IntoOperand,
{
    BindingExpr::new(StaticCast::default(), (value.into_operand(),))
}

/// Reinterpret the bits of `value` as `To`
pub fn reinterpret_cast<To, F>(value: F) -> BindingExpr<ReinterpretCast<To>, (F::Operand,)>
where
    F: IntoOperand,
{
    BindingExpr::new(ReinterpretCast::default(), (value.into_operand(),))
}

// ─────────────────────────────────────────────────────────────────────────────
// Member access and method invocation
// ─────────────────────────────────────────────────────────────────────────────

/// Projects a field out of a struct value
#[derive(Clone, Copy, Debug)]
pub struct Member<F>(pub F);

impl<S, R, F> Action<(S,)> for Member<F>
where
    F: Fn(&S) -> R,
{
    type Output = R;

    fn apply(&self, (base,): (S,)) -> R {
        (self.0)(&base)
    }
}

/// Projects a field through a nullable pointer
///
/// A `None` base is a fatal precondition violation.
#[derive(Clone, Copy, Debug)]
pub struct MemberPtr<F>(pub F);

impl<P, R, F> Action<(Option<P>,)> for MemberPtr<F>
where
    P: Deref,
    F: Fn(&P::Target) -> R,
{
    type Output = R;

    fn apply(&self, (base,): (Option<P>,)) -> R {
        let Some(base) = base else {
            panic!("member access through a null object reference");
        };
        (self.0)(&*base)
    }
}

/// Read a field of the struct produced by `base`
///
/// ```ignore
/// let width = member(geometry.prop(Geometry), |r: &Rect| r.width);
/// ```
pub fn member<B, F>(base: B, field: F) -> BindingExpr<Member<F>, (B::Operand,)>
where
    B: IntoOperand,
{
    BindingExpr::new(Member(field), (base.into_operand(),))
}

/// Read a field through an `Option<pointer>` produced by `base`
pub fn member_ptr<B, F>(base: B, field: F) -> BindingExpr<MemberPtr<F>, (B::Operand,)>
where
    B: IntoOperand,
{
    BindingExpr::new(MemberPtr(field), (base.into_operand(),))
}

/// Calls a method on the base value with the remaining operands
#[derive(Clone, Copy, Debug)]
pub struct Invoke<F>(pub F);

/// Like [`Invoke`] through a nullable pointer
#[derive(Clone, Copy, Debug)]
pub struct InvokePtr<F>(pub F);

macro_rules! impl_invoke {
    ($($name:ident),*) => {
        #[allow(non_snake_case)]
        impl<Func, Ret, Base, $($name),*> Action<(Base, $($name,)*)> for Invoke<Func>
        where
            Func: Fn(&Base, $($name),*) -> Ret,
        {
            type Output = Ret;

            fn apply(&self, (base, $($name,)*): (Base, $($name,)*)) -> Ret {
                (self.0)(&base, $($name),*)
            }
        }

        #[allow(non_snake_case)]
        impl<Func, Ret, Ptr, $($name),*> Action<(Option<Ptr>, $($name,)*)> for InvokePtr<Func>
        where
            Ptr: Deref,
            Func: Fn(&Ptr::Target, $($name),*) -> Ret,
        {
            type Output = Ret;

            fn apply(&self, (base, $($name,)*): (Option<Ptr>, $($name,)*)) -> Ret {
                let Some(base) = base else {
                    panic!("method invocation through a null object reference");
                };
                (self.0)(&*base, $($name),*)
            }
        }
    };
}

impl_invoke!();
impl_invoke!(A);
impl_invoke!(A, B);
impl_invoke!(A, B, C);
impl_invoke!(A, B, C, D);

/// Invoke `method` on the value of `base` with extra operands
///
/// ```ignore
/// let clamped = invoke(value.prop(Value), i32::clamp_ref, (0, limit.prop(Value)));
/// ```
pub fn invoke<B, F, O>(base: B, method: F, args: O) -> BindingExpr<Invoke<F>, <(B, O) as Flatten>::Operands>
where
    (B, O): Flatten,
{
    BindingExpr::new(Invoke(method), (base, args).flatten())
}

/// [`invoke`] through an `Option<pointer>` base
pub fn invoke_ptr<B, F, O>(base: B, method: F, args: O) -> BindingExpr<InvokePtr<F>, <(B, O) as Flatten>::Operands>
where
    (B, O): Flatten,
{
    BindingExpr::new(InvokePtr(method), (base, args).flatten())
}

/// Prepends a base operand to an argument tuple
pub trait Flatten {
    type Operands: Operands;

    fn flatten(self) -> Self::Operands;
}

macro_rules! impl_flatten {
    ($($name:ident),*) => {
        #[allow(non_snake_case)]
        impl<Base: IntoOperand, $($name: IntoOperand),*> Flatten for (Base, ($($name,)*)) {
            type Operands = (Base::Operand, $($name::Operand,)*);

            fn flatten(self) -> Self::Operands {
                let (base, ($($name,)*)) = self;
                (base.into_operand(), $($name.into_operand(),)*)
            }
        }
    };
}

impl_flatten!();
impl_flatten!(A);
impl_flatten!(A, B);
impl_flatten!(A, B, C);
impl_flatten!(A, B, C, D);

// ─────────────────────────────────────────────────────────────────────────────
// Formatting
// ─────────────────────────────────────────────────────────────────────────────

/// Substitutes operand values into a `{}` template
#[derive(Clone, Debug)]
pub struct Format(pub Cow<'static, str>);

impl Format {
    fn render(&self, args: &[&dyn Display]) -> String {
        use std::fmt::Write;

        let mut out = String::with_capacity(self.0.len());
        let mut args = args.iter();
        let mut chars = self.0.chars().peekable();

        while let Some(c) = chars.next() {
            match (c, chars.peek()) {
                ('{', Some('{')) | ('}', Some('}')) => {
                    chars.next();
                    out.push(c);
                }
                ('{', Some('}')) => {
                    chars.next();
                    match args.next() {
                        Some(arg) => {
                            let _ = write!(out, "{arg}");
                        }
                        None => out.push_str("{}"),
                    }
                }
                _ => out.push(c),
            }
        }
        out
    }
}

macro_rules! impl_format {
    ($($name:ident),*) => {
        #[allow(non_snake_case, unused_variables)]
        impl<$($name: Display),*> Action<($($name,)*)> for Format {
            type Output = String;

            fn apply(&self, ($($name,)*): ($($name,)*)) -> String {
                self.render(&[$(&$name as &dyn Display),*])
            }
        }
    };
}

impl_format!();
impl_format!(A);
impl_format!(A, B);
impl_format!(A, B, C);
impl_format!(A, B, C, D);
impl_format!(A, B, C, D, E);
impl_format!(A, B, C, D, E, F);

/// Format operands into a `String`
///
/// Each `{}` takes the next operand; `{{` and `}}` are literal braces.
/// Placeholders without a matching operand are kept verbatim.
///
/// ```ignore
/// label.prop(LabelText).bind(format("{} / {}", (value.prop(Value), max.prop(Max))));
/// ```
pub fn format<O>(template: impl Into<Cow<'static, str>>, operands: O) -> BindingExpr<Format, O::Operands>
where
    O: IntoOperands,
    Format: Action<<O::Operands as Operands>::Values>,
{
    make_expr(Format(template.into()), operands)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{lit, Operand};
    use std::cell::Cell;

    #[derive(Clone, Debug, PartialEq)]
    struct Size {
        width: i32,
        height: i32,
    }

    impl From<(i32, i32)> for Size {
        fn from((width, height): (i32, i32)) -> Self {
            Size { width, height }
        }
    }

    #[test]
    fn test_cond_is_eager() {
        let taken = Rc::new(Cell::new(0));
        let skipped = Rc::new(Cell::new(0));

        let branch = |count: &Rc<Cell<u32>>, value: &'static str| {
            let count = count.clone();
            call(
                move || {
                    count.set(count.get() + 1);
                    value
                },
                (),
            )
        };

        let tree = cond(true, branch(&taken, "yes"), branch(&skipped, "no"));
        assert_eq!(tree.eval(), "yes");
        assert_eq!(taken.get(), 1);
        assert_eq!(skipped.get(), 1);
    }

    #[test]
    fn test_logical_actions_do_not_short_circuit() {
        let calls = Rc::new(Cell::new(0));
        let probe = {
            let calls = calls.clone();
            call(
                move || {
                    calls.set(calls.get() + 1);
                    true
                },
                (),
            )
        };

        let and = make_expr(And, (false, probe.clone()));
        let or = make_expr(Or, (true, probe));
        assert!(!and.eval());
        assert!(or.eval());
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn test_construct() {
        let size = construct::<Size, _>((3, 4));
        assert_eq!(size.eval(), Size { width: 3, height: 4 });

        let text = construct::<String, _>(("abc",));
        assert_eq!(text.eval(), "abc");
    }

    #[test]
    fn test_call() {
        let sum = call(|a: i32, b: i32, c: i32| a + b + c, (1, 2, 3));
        assert_eq!(sum.eval(), 6);
    }

    #[test]
    fn test_casts() {
        assert_eq!(cast::<i32, _>(3.9f64).eval(), 3);
        assert_eq!(cast::<u8, _>(300i32).eval(), 44);
        assert_eq!(cast::<i32, _>(true).eval(), 1);
        assert_eq!(static_cast::<i64, _>(7i32).eval(), 7i64);
        assert_eq!(reinterpret_cast::<u32, _>(1.0f32).eval(), 0x3f80_0000);
    }

    #[test]
    #[should_panic]
    fn test_reinterpret_size_mismatch_panics() {
        reinterpret_cast::<u64, _>(1u32).eval();
    }

    #[test]
    fn test_member() {
        let size = lit(Size { width: 8, height: 2 });
        assert_eq!(member(size, |s: &Size| s.width).eval(), 8);

        let shared = lit(Some(Rc::new(Size { width: 1, height: 5 })));
        assert_eq!(member_ptr(shared, |s: &Size| s.height).eval(), 5);
    }

    #[test]
    #[should_panic(expected = "null object reference")]
    fn test_member_ptr_null_panics() {
        let missing: Option<Rc<Size>> = None;
        member_ptr(lit(missing), |s: &Size| s.width).eval();
    }

    #[test]
    fn test_invoke() {
        let area = invoke(lit(Size { width: 3, height: 4 }), |s: &Size| s.width * s.height, ());
        assert_eq!(area.eval(), 12);

        let clamped = invoke(15, |v: &i32, lo: i32, hi: i32| (*v).clamp(lo, hi), (0, 10));
        assert_eq!(clamped.eval(), 10);

        let scaled = invoke_ptr(
            lit(Some(Box::new(Size { width: 2, height: 1 }))),
            |s: &Size, k: i32| s.width * k,
            (5,),
        );
        assert_eq!(scaled.eval(), 10);
    }

    #[test]
    fn test_address_and_content() {
        let boxed = make_expr(AddressOf, (41,));
        let pointer: Rc<i32> = boxed.eval();
        assert_eq!(*pointer, 41);

        let back = make_expr(ContentOf, (lit(Rc::new(String::from("x"))),));
        assert_eq!(back.eval(), "x");
    }

    #[test]
    fn test_format() {
        let text = format("{} of {}", (3, 10));
        assert_eq!(text.eval(), "3 of 10");

        let escaped = format("{{{}}} {}", ("a",));
        assert_eq!(escaped.eval(), "{a} {}");
    }

    #[test]
    fn test_format_without_operands() {
        let fixed = format("static {{text}}", ());
        assert_eq!(fixed.eval(), "static {text}");
        assert!(!fixed.is_observable());
    }
}
