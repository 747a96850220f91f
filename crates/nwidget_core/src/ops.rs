//! Operator overloads that build expressions
//!
//! Arithmetic and bitwise operators on accessors, literals and expressions
//! return a new [`BindingExpr`] instead of computing anything. Comparisons
//! and logical operators cannot be overloaded to return an expression, so
//! they are methods on [`OperandExt`].
//!
//! ```ignore
//! let total = a.prop(Value) + b.prop(Value) * 2;
//! let big = total.clone().ge(100).and(enabled.prop(Checked));
//! ```

use crate::action;
use crate::expr::{BindingExpr, IntoOperand, Lit, Operand};
use crate::property::{MetaProperty, ReadProperty};

macro_rules! binary_ops {
    ($($Trait:ident::$method:ident => $Action:ident),* $(,)?) => {$(
        impl<P: ReadProperty, R: IntoOperand> std::ops::$Trait<R> for MetaProperty<P> {
            type Output = BindingExpr<action::$Action, (Self, R::Operand)>;

            fn $method(self, rhs: R) -> Self::Output {
                BindingExpr::new(action::$Action, (self, rhs.into_operand()))
            }
        }

        impl<A, O, R: IntoOperand> std::ops::$Trait<R> for BindingExpr<A, O>
        where
            Self: Operand,
        {
            type Output = BindingExpr<action::$Action, (Self, R::Operand)>;

            fn $method(self, rhs: R) -> Self::Output {
                BindingExpr::new(action::$Action, (self, rhs.into_operand()))
            }
        }

        impl<T: Clone + 'static, R: IntoOperand> std::ops::$Trait<R> for Lit<T> {
            type Output = BindingExpr<action::$Action, (Self, R::Operand)>;

            fn $method(self, rhs: R) -> Self::Output {
                BindingExpr::new(action::$Action, (self, rhs.into_operand()))
            }
        }
    )*};
}

binary_ops!(
    Add::add => Add,
    Sub::sub => Sub,
    Mul::mul => Mul,
    Div::div => Div,
    Rem::rem => Rem,
    BitAnd::bitand => BitAnd,
    BitOr::bitor => BitOr,
    BitXor::bitxor => BitXor,
    Shl::shl => Shl,
    Shr::shr => Shr,
);

// Plain values on the left: `2 * a.prop(Value)`
macro_rules! scalar_lhs_ops {
    (@impl $ty:ty; $($Trait:ident::$method:ident => $Action:ident),*) => {$(
        impl<P: ReadProperty> std::ops::$Trait<MetaProperty<P>> for $ty {
            type Output = BindingExpr<action::$Action, (Lit<$ty>, MetaProperty<P>)>;

            fn $method(self, rhs: MetaProperty<P>) -> Self::Output {
                BindingExpr::new(action::$Action, (Lit(self), rhs))
            }
        }

        impl<A, O> std::ops::$Trait<BindingExpr<A, O>> for $ty
        where
            BindingExpr<A, O>: Operand,
        {
            type Output = BindingExpr<action::$Action, (Lit<$ty>, BindingExpr<A, O>)>;

            fn $method(self, rhs: BindingExpr<A, O>) -> Self::Output {
                BindingExpr::new(action::$Action, (Lit(self), rhs))
            }
        }
    )*};
    ($($ty:ty),* $(,)?) => {$(
        scalar_lhs_ops!(@impl $ty;
            Add::add => Add,
            Sub::sub => Sub,
            Mul::mul => Mul,
            Div::div => Div,
            Rem::rem => Rem,
            BitAnd::bitand => BitAnd,
            BitOr::bitor => BitOr,
            BitXor::bitxor => BitXor,
            Shl::shl => Shl,
            Shr::shr => Shr
        );
    )*};
}

scalar_lhs_ops!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64, bool);

macro_rules! unary_ops {
    ($($Trait:ident::$method:ident => $Action:ident),* $(,)?) => {$(
        impl<P: ReadProperty> std::ops::$Trait for MetaProperty<P> {
            type Output = BindingExpr<action::$Action, (Self,)>;

            fn $method(self) -> Self::Output {
                BindingExpr::new(action::$Action, (self,))
            }
        }

        impl<A, O> std::ops::$Trait for BindingExpr<A, O>
        where
            Self: Operand,
        {
            type Output = BindingExpr<action::$Action, (Self,)>;

            fn $method(self) -> Self::Output {
                BindingExpr::new(action::$Action, (self,))
            }
        }

        impl<T: Clone + 'static> std::ops::$Trait for Lit<T> {
            type Output = BindingExpr<action::$Action, (Self,)>;

            fn $method(self) -> Self::Output {
                BindingExpr::new(action::$Action, (self,))
            }
        }
    )*};
}

unary_ops!(
    Neg::neg => Neg,
    Not::not => Not,
);

/// Expression builders that have no operator form
///
/// Implemented for every [`Operand`]. All of them are lazy, like the
/// operators.
pub trait OperandExt: Operand + Sized {
    fn equals<R: IntoOperand>(self, rhs: R) -> BindingExpr<action::Eq, (Self, R::Operand)> {
        BindingExpr::new(action::Eq, (self, rhs.into_operand()))
    }

    fn not_equals<R: IntoOperand>(self, rhs: R) -> BindingExpr<action::Ne, (Self, R::Operand)> {
        BindingExpr::new(action::Ne, (self, rhs.into_operand()))
    }

    fn lt<R: IntoOperand>(self, rhs: R) -> BindingExpr<action::Lt, (Self, R::Operand)> {
        BindingExpr::new(action::Lt, (self, rhs.into_operand()))
    }

    fn le<R: IntoOperand>(self, rhs: R) -> BindingExpr<action::Le, (Self, R::Operand)> {
        BindingExpr::new(action::Le, (self, rhs.into_operand()))
    }

    fn gt<R: IntoOperand>(self, rhs: R) -> BindingExpr<action::Gt, (Self, R::Operand)> {
        BindingExpr::new(action::Gt, (self, rhs.into_operand()))
    }

    fn ge<R: IntoOperand>(self, rhs: R) -> BindingExpr<action::Ge, (Self, R::Operand)> {
        BindingExpr::new(action::Ge, (self, rhs.into_operand()))
    }

    /// Logical and; both sides are always evaluated
    fn and<R: IntoOperand>(self, rhs: R) -> BindingExpr<action::And, (Self, R::Operand)> {
        BindingExpr::new(action::And, (self, rhs.into_operand()))
    }

    /// Logical or; both sides are always evaluated
    fn or<R: IntoOperand>(self, rhs: R) -> BindingExpr<action::Or, (Self, R::Operand)> {
        BindingExpr::new(action::Or, (self, rhs.into_operand()))
    }

    fn bit_not(self) -> BindingExpr<action::BitNot, (Self,)> {
        BindingExpr::new(action::BitNot, (self,))
    }

    fn plus(self) -> BindingExpr<action::Plus, (Self,)> {
        BindingExpr::new(action::Plus, (self,))
    }

    fn address_of(self) -> BindingExpr<action::AddressOf, (Self,)> {
        BindingExpr::new(action::AddressOf, (self,))
    }

    fn content_of(self) -> BindingExpr<action::ContentOf, (Self,)> {
        BindingExpr::new(action::ContentOf, (self,))
    }
}

impl<T: Operand> OperandExt for T {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::lit;
    use crate::fixtures::{Slider, SliderValue};
    use crate::object::Runtime;

    #[test]
    fn test_precedence_follows_rust() {
        let rt = Runtime::new();
        let a = rt.create(Slider::default());
        a.prop(SliderValue).set(3);

        let tree = a.prop(SliderValue) + 4i32 * a.prop(SliderValue) - 1;
        assert_eq!(tree.eval(), 14);

        let shifted = (a.prop(SliderValue) << 2) | 1;
        assert_eq!(shifted.eval(), 13);
    }

    #[test]
    fn test_unary() {
        let rt = Runtime::new();
        let a = rt.create(Slider::default());
        a.prop(SliderValue).set(6);

        assert_eq!((-a.prop(SliderValue)).eval(), -6);
        assert_eq!((!a.prop(SliderValue)).eval(), !6);
        assert_eq!(a.prop(SliderValue).bit_not().eval(), !6);
        assert_eq!(a.prop(SliderValue).plus().eval(), 6);
        assert!(!(!lit(true)).eval());
    }

    #[test]
    fn test_comparisons() {
        let rt = Runtime::new();
        let a = rt.create(Slider::default());
        let b = rt.create(Slider::default());
        a.prop(SliderValue).set(1);
        b.prop(SliderValue).set(2);

        let (x, y) = (a.prop(SliderValue), b.prop(SliderValue));
        assert!(x.clone().lt(y.clone()).eval());
        assert!(x.clone().le(1).eval());
        assert!(!x.clone().gt(y.clone()).eval());
        assert!(y.clone().ge(2).eval());
        assert!(x.clone().equals(1).eval());
        assert!(x.clone().not_equals(y.clone()).eval());

        let both = x.clone().lt(y.clone()).and(y.clone().gt(x.clone()));
        let either = x.clone().gt(5).or(y.equals(2));
        assert!(both.eval());
        assert!(either.eval());
    }

    #[test]
    fn test_literal_left_operand() {
        let halved = lit(10.0f64) / 4.0;
        assert_eq!(halved.eval(), 2.5);

        let remainder = 17i32 % (lit(5) + 0);
        assert_eq!(remainder.eval(), 2);
    }
}
