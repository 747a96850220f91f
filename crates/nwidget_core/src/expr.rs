//! Binding expressions
//!
//! An expression is an immutable tree: each [`BindingExpr`] node holds an
//! action and a fixed tuple of operands, and each operand is a literal
//! ([`Lit`]), a property accessor, or another expression. Building a tree
//! never reads anything; [`Operand::eval`] walks it bottom-up, evaluating
//! operands left to right before applying the action.
//!
//! Whether a tree can ever change on its own is known at compile time through
//! [`Operand::OBSERVABLE`]: a property leaf is observable when its descriptor
//! has a notify channel, and a node is observable when any operand is.

use crate::action::{Action, Identity};
use crate::object::{Channel, ObjectId};
use crate::property::{MetaProperty, ReadProperty};

/// A notification source found in an expression tree
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Source {
    pub object: ObjectId,
    pub channel: Channel,
}

/// Anything that can sit in an expression tree
pub trait Operand: Clone + 'static {
    type Output: 'static;

    /// Whether any leaf of this operand can notify on change
    const OBSERVABLE: bool;

    fn eval(&self) -> Self::Output;

    /// Report every observable leaf, left to right
    fn visit_sources(&self, visitor: &mut dyn FnMut(Source));

    fn is_observable(&self) -> bool {
        Self::OBSERVABLE
    }

    /// Observable leaves as a list, duplicates included
    fn sources(&self) -> Vec<Source> {
        let mut sources = Vec::new();
        self.visit_sources(&mut |source| sources.push(source));
        sources
    }
}

/// Conversion into an [`Operand`]
///
/// Implemented by accessors and expressions (as themselves) and by common
/// value types (wrapped in [`Lit`]). Other values can be wrapped with
/// [`lit`].
pub trait IntoOperand {
    type Operand: Operand;

    fn into_operand(self) -> Self::Operand;
}

// ─────────────────────────────────────────────────────────────────────────────
// Literals
// ─────────────────────────────────────────────────────────────────────────────

/// A constant operand
#[derive(Clone, Debug)]
pub struct Lit<T>(pub T);

/// Wrap any cloneable value as a literal operand
pub fn lit<T: Clone + 'static>(value: T) -> Lit<T> {
    Lit(value)
}

impl<T: Clone + 'static> Operand for Lit<T> {
    type Output = T;
    const OBSERVABLE: bool = false;

    fn eval(&self) -> T {
        self.0.clone()
    }

    fn visit_sources(&self, _visitor: &mut dyn FnMut(Source)) {}
}

impl<T: Clone + 'static> IntoOperand for Lit<T> {
    type Operand = Self;

    fn into_operand(self) -> Self {
        self
    }
}

macro_rules! impl_literal_operand {
    ($($ty:ty),* $(,)?) => {$(
        impl IntoOperand for $ty {
            type Operand = Lit<$ty>;

            fn into_operand(self) -> Lit<$ty> {
                Lit(self)
            }
        }
    )*};
}

impl_literal_operand!(
    bool,
    char,
    i8,
    i16,
    i32,
    i64,
    i128,
    isize,
    u8,
    u16,
    u32,
    u64,
    u128,
    usize,
    f32,
    f64,
    String,
    &'static str,
);

// ─────────────────────────────────────────────────────────────────────────────
// Property leaves
// ─────────────────────────────────────────────────────────────────────────────

impl<P: ReadProperty> Operand for MetaProperty<P> {
    type Output = P::Value;
    const OBSERVABLE: bool = P::NOTIFY.is_some();

    fn eval(&self) -> P::Value {
        self.get()
    }

    fn visit_sources(&self, visitor: &mut dyn FnMut(Source)) {
        if let Some(channel) = Self::notify() {
            visitor(Source {
                object: self.object().id(),
                channel,
            });
        }
    }
}

impl<P: ReadProperty> IntoOperand for MetaProperty<P> {
    type Operand = Self;

    fn into_operand(self) -> Self {
        self
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Operand tuples
// ─────────────────────────────────────────────────────────────────────────────

/// A fixed-arity tuple of operands
pub trait Operands: Clone + 'static {
    /// The tuple of evaluated values
    type Values;
    const OBSERVABLE: bool;

    fn eval_all(&self) -> Self::Values;
    fn visit_sources(&self, visitor: &mut dyn FnMut(Source));
}

/// A tuple of [`IntoOperand`] values
pub trait IntoOperands {
    type Operands: Operands;

    fn into_operands(self) -> Self::Operands;
}

macro_rules! impl_operands {
    ($($name:ident),*) => {
        #[allow(non_snake_case, unused_variables)]
        impl<$($name: Operand),*> Operands for ($($name,)*) {
            type Values = ($($name::Output,)*);
            const OBSERVABLE: bool = false $(|| $name::OBSERVABLE)*;

            fn eval_all(&self) -> Self::Values {
                let ($($name,)*) = self;
                ($($name.eval(),)*)
            }

            fn visit_sources(&self, visitor: &mut dyn FnMut(Source)) {
                let ($($name,)*) = self;
                $($name.visit_sources(visitor);)*
            }
        }

        #[allow(non_snake_case, clippy::unused_unit)]
        impl<$($name: IntoOperand),*> IntoOperands for ($($name,)*) {
            type Operands = ($($name::Operand,)*);

            fn into_operands(self) -> Self::Operands {
                let ($($name,)*) = self;
                ($($name.into_operand(),)*)
            }
        }
    };
}

impl_operands!();
impl_operands!(A);
impl_operands!(A, B);
impl_operands!(A, B, C);
impl_operands!(A, B, C, D);
impl_operands!(A, B, C, D, E);
impl_operands!(A, B, C, D, E, F);

// ─────────────────────────────────────────────────────────────────────────────
// Expression nodes
// ─────────────────────────────────────────────────────────────────────────────

/// An expression node: `action(operands...)`
#[derive(Clone, Debug)]
pub struct BindingExpr<A, O> {
    action: A,
    operands: O,
}

impl<A, O: Operands> BindingExpr<A, O> {
    pub const IS_OBSERVABLE: bool = O::OBSERVABLE;
}

impl<A, O> BindingExpr<A, O> {
    pub fn new(action: A, operands: O) -> Self {
        Self { action, operands }
    }

    pub fn action(&self) -> &A {
        &self.action
    }

    pub fn operands(&self) -> &O {
        &self.operands
    }
}

impl<A, O> Operand for BindingExpr<A, O>
where
    O: Operands,
    A: Action<O::Values> + Clone + 'static,
    A::Output: 'static,
{
    type Output = A::Output;
    const OBSERVABLE: bool = O::OBSERVABLE;

    fn eval(&self) -> A::Output {
        self.action.apply(self.operands.eval_all())
    }

    fn visit_sources(&self, visitor: &mut dyn FnMut(Source)) {
        self.operands.visit_sources(visitor);
    }
}

impl<A, O> IntoOperand for BindingExpr<A, O>
where
    Self: Operand,
{
    type Operand = Self;

    fn into_operand(self) -> Self {
        self
    }
}

/// Build an expression node from an action and operands
pub fn make_expr<A, O>(action: A, operands: O) -> BindingExpr<A, O::Operands>
where
    O: IntoOperands,
    A: Action<<O::Operands as Operands>::Values>,
{
    BindingExpr::new(action, operands.into_operands())
}

/// Wrap a single operand in an identity node
///
/// Useful to turn an accessor or literal into an expression value.
pub fn expr<T: IntoOperand>(value: T) -> BindingExpr<Identity, (T::Operand,)> {
    BindingExpr::new(Identity, (value.into_operand(),))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{self, cond};
    use crate::fixtures::{Slider, SliderMaximum, SliderValue};
    use crate::object::Runtime;
    use crate::ops::OperandExt;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn test_literal_is_constant() {
        let five = lit(5);
        assert_eq!(five.eval(), 5);
        assert!(!five.is_observable());
        assert!(five.sources().is_empty());
    }

    #[test]
    fn test_observability_is_structural() {
        let rt = Runtime::new();
        let slider = rt.create(Slider::default());

        let value = slider.prop(SliderValue);
        let maximum = slider.prop(SliderMaximum);

        assert!(<MetaProperty<SliderValue> as Operand>::OBSERVABLE);
        assert!(!<MetaProperty<SliderMaximum> as Operand>::OBSERVABLE);

        assert!(!(maximum.clone() + 1).is_observable());
        assert!((maximum.clone() + value.clone()).is_observable());
        assert!((lit(1) + (maximum * 2 - value)).is_observable());
    }

    #[test]
    fn test_eval_reads_current_values() {
        let rt = Runtime::new();
        let a = rt.create(Slider::default());
        let b = rt.create(Slider::default());

        let sum = a.prop(SliderValue) + b.prop(SliderValue) * 2;
        a.prop(SliderValue).set(3);
        b.prop(SliderValue).set(4);
        assert_eq!(sum.eval(), 11);

        b.prop(SliderValue).set(1);
        assert_eq!(sum.eval(), 5);
    }

    #[test]
    fn test_building_does_not_read() {
        let reads = Rc::new(Cell::new(0));
        let counted = {
            let reads = reads.clone();
            move |x: i32| {
                reads.set(reads.get() + 1);
                x
            }
        };

        let tree = action::call(counted, (7,)) + 1;
        assert_eq!(reads.get(), 0);
        assert_eq!(tree.eval(), 8);
        assert_eq!(reads.get(), 1);
    }

    #[test]
    fn test_sources_left_to_right() {
        let rt = Runtime::new();
        let a = rt.create(Slider::default());
        let b = rt.create(Slider::default());

        let tree = cond(
            a.prop(SliderValue).gt(b.prop(SliderMaximum)),
            b.prop(SliderValue),
            a.prop(SliderValue),
        );
        let objects: Vec<ObjectId> = tree.sources().iter().map(|s| s.object).collect();
        assert_eq!(objects, vec![a.id(), b.id(), a.id()]);
    }

    #[test]
    fn test_identity_expr() {
        let wrapped = expr("hello");
        assert_eq!(wrapped.eval(), "hello");
        assert!(!BindingExpr::<Identity, (Lit<&'static str>,)>::IS_OBSERVABLE);
    }
}
