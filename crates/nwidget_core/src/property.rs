//! Property descriptors and accessors
//!
//! A property is described once, statically, by a zero-sized descriptor type
//! implementing [`Property`] plus whichever capability traits apply
//! ([`ReadProperty`], [`WriteProperty`], [`ResetProperty`]). The
//! [`property!`](crate::property!) macro writes those impls.
//!
//! [`MetaProperty`] is the accessor: an object handle paired with a
//! descriptor. `get`/`set`/`reset` only exist when the descriptor has the
//! matching capability, so using a write-only property as an input is a
//! compile error rather than a runtime one.
//!
//! ```ignore
//! property! {
//!     pub SliderValue: Slider => i32 {
//!         read: value,
//!         write: set_value,
//!         notify: "valueChanged",
//!     }
//! }
//!
//! let value = slider.prop(SliderValue);
//! value.set(10);
//! value += 5;
//! assert_eq!(value.get(), 15);
//! ```

use std::fmt;
use std::marker::PhantomData;
use std::ops::Add;

use crate::error::Result;
use crate::expr::{IntoOperand, Operand};
use crate::object::{Channel, Obj};

/// Static description of a property on `Class`
pub trait Property: 'static {
    type Class: 'static;
    type Value: Clone + 'static;

    const NAME: &'static str;

    /// Change notification channel, if the property has one
    const NOTIFY: Option<&'static str> = None;
}

pub trait ReadProperty: Property {
    fn read(obj: &Self::Class) -> Self::Value;
}

pub trait WriteProperty: Property {
    /// Write `value`, returning whether the stored value changed
    fn write(obj: &mut Self::Class, value: Self::Value) -> bool;
}

pub trait ResetProperty: Property {
    /// Restore the default value, returning whether it changed
    fn reset(obj: &mut Self::Class) -> bool;
}

/// Return type of a setter, interpreted as "did anything change"
///
/// Setters returning `()` always count as a change.
pub trait WriteOutcome {
    fn changed(self) -> bool;
}

impl WriteOutcome for () {
    fn changed(self) -> bool {
        true
    }
}

impl WriteOutcome for bool {
    fn changed(self) -> bool {
        self
    }
}

/// Declare a property descriptor type
///
/// Every clause is optional but they must appear in the order
/// `read`, `write`, `notify`, `reset`.
///
/// ```ignore
/// property! {
///     /// Current slider position
///     pub SliderValue: Slider => i32 {
///         read: value,
///         write: set_value,
///         notify: "valueChanged",
///         reset: reset_value,
///     }
/// }
/// ```
#[macro_export]
macro_rules! property {
    (
        $(#[$meta:meta])*
        $vis:vis $marker:ident : $class:ty => $value:ty {
            $(read: $read:ident,)?
            $(write: $write:ident,)?
            $(notify: $notify:literal,)?
            $(reset: $reset:ident,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
        $vis struct $marker;

        impl $crate::property::Property for $marker {
            type Class = $class;
            type Value = $value;

            const NAME: &'static str = stringify!($marker);
            $(const NOTIFY: Option<&'static str> = Some($notify);)?
        }

        $(
            impl $crate::property::ReadProperty for $marker {
                fn read(obj: &$class) -> $value {
                    obj.$read()
                }
            }
        )?

        $(
            impl $crate::property::WriteProperty for $marker {
                fn write(obj: &mut $class, value: $value) -> bool {
                    $crate::property::WriteOutcome::changed(obj.$write(value))
                }
            }
        )?

        $(
            impl $crate::property::ResetProperty for $marker {
                fn reset(obj: &mut $class) -> bool {
                    $crate::property::WriteOutcome::changed(obj.$reset())
                }
            }
        )?
    };
}

/// Accessor for property `P` on one object
///
/// Cheap to clone; holds a non-owning handle. Arithmetic and comparison on
/// accessors build expressions instead of reading values.
pub struct MetaProperty<P: Property> {
    object: Obj<P::Class>,
    _marker: PhantomData<fn() -> P>,
}

impl<P: Property> Clone for MetaProperty<P> {
    fn clone(&self) -> Self {
        Self {
            object: self.object.clone(),
            _marker: PhantomData,
        }
    }
}

impl<P: Property> fmt::Debug for MetaProperty<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetaProperty")
            .field("name", &P::NAME)
            .field("object", &self.object.id())
            .finish()
    }
}

impl<P: Property> MetaProperty<P> {
    pub const HAS_NOTIFY_SIGNAL: bool = P::NOTIFY.is_some();

    pub fn new(object: Obj<P::Class>) -> Self {
        Self {
            object,
            _marker: PhantomData,
        }
    }

    pub fn object(&self) -> &Obj<P::Class> {
        &self.object
    }

    pub fn name(&self) -> &'static str {
        P::NAME
    }

    /// The change notification channel, if any
    pub fn notify() -> Option<Channel> {
        P::NOTIFY.map(Channel::Notify)
    }

    fn emit_change(&self) {
        if let Some(channel) = Self::notify() {
            self.object.emit(channel);
        }
    }
}

impl<P: ReadProperty> MetaProperty<P> {
    /// Read the current value
    ///
    /// Panics if the object has been destroyed.
    pub fn get(&self) -> P::Value {
        self.object.with(P::read)
    }

    pub fn try_get(&self) -> Result<P::Value> {
        self.object.try_with(P::read)
    }
}

impl<P: WriteProperty> MetaProperty<P> {
    /// Write a value immediately
    ///
    /// Existing bindings on this property are left in place. Emits the
    /// notify channel when the setter reports a change.
    pub fn set(&self, value: P::Value) {
        if self.object.with_mut(|obj| P::write(obj, value)) {
            self.emit_change();
        }
    }

    pub fn try_set(&self, value: P::Value) -> Result<()> {
        if self.object.try_with_mut(|obj| P::write(obj, value))? {
            self.emit_change();
        }
        Ok(())
    }

    /// Bind this property to `source`, replacing any existing binding
    ///
    /// `source` may be another accessor, an expression, or a plain value. A
    /// plain value cannot notify, so it is assigned once and any live
    /// binding on this property is torn down; use [`MetaProperty::set`] to
    /// write without touching bindings.
    pub fn bind<S>(&self, source: S)
    where
        S: IntoOperand,
        <S::Operand as Operand>::Output: Into<P::Value>,
    {
        crate::binding::Bindable::bind_to(&source.into_operand(), self);
    }
}

impl<P: ResetProperty> MetaProperty<P> {
    pub fn reset(&self) {
        if self.object.with_mut(P::reset) {
            self.emit_change();
        }
    }
}

impl<P> MetaProperty<P>
where
    P: ReadProperty + WriteProperty,
    P::Value: Add<Output = P::Value> + From<bool>,
{
    /// `++x`: store and return the incremented value
    pub fn increment(&self) -> P::Value {
        let value = self.get() + P::Value::from(true);
        self.set(value.clone());
        value
    }

    /// `x++`: store the incremented value and return the previous one
    pub fn post_increment(&self) -> P::Value {
        let old = self.get();
        self.set(old.clone() + P::Value::from(true));
        old
    }
}

impl<P> MetaProperty<P>
where
    P: ReadProperty + WriteProperty,
    P::Value: std::ops::Sub<Output = P::Value> + From<bool>,
{
    /// `--x`: store and return the decremented value
    pub fn decrement(&self) -> P::Value {
        let value = self.get() - P::Value::from(true);
        self.set(value.clone());
        value
    }

    /// `x--`: store the decremented value and return the previous one
    pub fn post_decrement(&self) -> P::Value {
        let old = self.get();
        self.set(old.clone() - P::Value::from(true));
        old
    }
}

macro_rules! impl_compound_assign {
    ($($Assign:ident::$assign:ident => $Op:ident::$op:ident),* $(,)?) => {$(
        impl<P> std::ops::$Assign<P::Value> for MetaProperty<P>
        where
            P: ReadProperty + WriteProperty,
            P::Value: std::ops::$Op<Output = P::Value>,
        {
            fn $assign(&mut self, rhs: P::Value) {
                self.set(std::ops::$Op::$op(self.get(), rhs));
            }
        }
    )*};
}

impl_compound_assign!(
    AddAssign::add_assign => Add::add,
    SubAssign::sub_assign => Sub::sub,
    MulAssign::mul_assign => Mul::mul,
    DivAssign::div_assign => Div::div,
    RemAssign::rem_assign => Rem::rem,
    BitXorAssign::bitxor_assign => BitXor::bitxor,
    BitAndAssign::bitand_assign => BitAnd::bitand,
    BitOrAssign::bitor_assign => BitOr::bitor,
    ShlAssign::shl_assign => Shl::shl,
    ShrAssign::shr_assign => Shr::shr,
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{Slider, SliderMaximum, SliderValue, Spinner, SpinnerCount};
    use crate::object::Runtime;
    use std::cell::Cell;
    use std::rc::Rc;

    fn watch(slider: &Obj<Slider>) -> Rc<Cell<u32>> {
        let count = Rc::new(Cell::new(0));
        let rt = slider.runtime().unwrap();
        let probe = rt.create(());
        let seen = count.clone();
        rt.connect(
            slider.id(),
            Channel::Notify("valueChanged"),
            probe.id(),
            "watch",
            crate::object::ConnectionType::Direct,
            Rc::new(move || seen.set(seen.get() + 1)),
        );
        count
    }

    #[test]
    fn test_get_set_reset() {
        let rt = Runtime::new();
        let slider = rt.create(Slider::default());
        let value = slider.prop(SliderValue);

        value.set(30);
        assert_eq!(value.get(), 30);
        value.reset();
        assert_eq!(value.get(), 0);
    }

    #[test]
    fn test_set_emits_only_on_change() {
        let rt = Runtime::new();
        let slider = rt.create(Slider::default());
        let changes = watch(&slider);
        let value = slider.prop(SliderValue);

        value.set(5);
        value.set(5);
        assert_eq!(changes.get(), 1);

        value.reset();
        value.reset();
        assert_eq!(changes.get(), 2);
    }

    #[test]
    fn test_notify_capability() {
        assert!(MetaProperty::<SliderValue>::HAS_NOTIFY_SIGNAL);
        assert!(!MetaProperty::<SliderMaximum>::HAS_NOTIFY_SIGNAL);
        assert_eq!(
            MetaProperty::<SliderValue>::notify(),
            Some(Channel::Notify("valueChanged"))
        );
        assert_eq!(MetaProperty::<SliderMaximum>::notify(), None);
    }

    #[test]
    fn test_compound_assignment() {
        let rt = Runtime::new();
        let slider = rt.create(Slider::default());
        let mut value = slider.prop(SliderValue);

        value.set(10);
        value += 5;
        assert_eq!(value.get(), 15);
        value -= 3;
        value *= 2;
        assert_eq!(value.get(), 24);
        value /= 5;
        value %= 3;
        assert_eq!(value.get(), 1);
        value <<= 4;
        value |= 1;
        assert_eq!(value.get(), 17);
        value ^= 3;
        value &= 0xff;
        value >>= 1;
        assert_eq!(value.get(), 9);
    }

    #[test]
    fn test_increment_decrement() {
        let rt = Runtime::new();
        let slider = rt.create(Slider::default());
        let value = slider.prop(SliderValue);

        assert_eq!(value.increment(), 1);
        assert_eq!(value.post_increment(), 1);
        assert_eq!(value.get(), 2);
        assert_eq!(value.decrement(), 1);
        assert_eq!(value.post_decrement(), 1);
        assert_eq!(value.get(), 0);
    }

    #[test]
    fn test_increment_narrow_integers() {
        let rt = Runtime::new();
        let spinner = rt.create(Spinner::default());
        let count = spinner.prop(SpinnerCount);

        assert_eq!(count.decrement(), -1i8);
        assert_eq!(count.post_increment(), -1i8);
        assert_eq!(count.increment(), 1i8);
        assert_eq!(count.get(), 1i8);
    }

    #[test]
    fn test_try_get_after_destroy() {
        let rt = Runtime::new();
        let slider = rt.create(Slider::default());
        let value = slider.prop(SliderValue);

        rt.destroy(slider.id());
        assert!(value.try_get().is_err());
        assert!(value.try_set(1).is_err());
    }
}
