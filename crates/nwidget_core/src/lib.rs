//! nwidget Core
//!
//! Declarative property bindings over a single-threaded object tree:
//!
//! - **Object Tree**: objects with names, parent/child ownership, unique
//!   notification connections and deferred destruction
//! - **Properties**: statically described, capability-checked accessors
//! - **Expressions**: lazily built, typed expression trees over accessors
//!   and literals, with observability known at compile time
//! - **Bindings**: keep a property, slot or callable in sync with an
//!   expression; re-evaluated whenever an input notifies
//!
//! # Example
//!
//! ```ignore
//! use nwidget_core::prelude::*;
//!
//! property! {
//!     pub Value: Slider => i32 {
//!         read: value,
//!         write: set_value,
//!         notify: "valueChanged",
//!     }
//! }
//!
//! let rt = Runtime::new();
//! let (a, b, c) = (rt.create(Slider::default()), rt.create(Slider::default()), rt.create(Slider::default()));
//!
//! a.prop(Value).set(2);
//! b.prop(Value).set(3);
//! c.prop(Value).bind(a.prop(Value) + b.prop(Value));
//! assert_eq!(c.prop(Value).get(), 5);
//!
//! a.prop(Value).set(10);
//! assert_eq!(c.prop(Value).get(), 12);
//! ```

pub mod action;
pub mod binding;
pub mod config;
pub mod error;
pub mod expr;
pub mod object;
pub mod ops;
pub mod property;

#[cfg(test)]
mod fixtures;

pub use action::{
    call, cast, cond, construct, format, invoke, invoke_ptr, member, member_ptr,
    reinterpret_cast, static_cast, Action,
};
pub use binding::{
    binding_info, unbind, BindOptions, BindTarget, Bindable, BindingInfo, BindingKey, FanIn,
    IntoCallable, IntoSlot, Reentrancy,
};
pub use config::RuntimeConfig;
pub use error::{Error, Result};
pub use expr::{expr, lit, make_expr, BindingExpr, IntoOperand, Lit, Operand, Source};
pub use object::{Channel, ConnectionType, Obj, ObjectId, Runtime, RuntimeStats, WeakRuntime};
pub use ops::OperandExt;
pub use property::{
    MetaProperty, Property, ReadProperty, ResetProperty, WriteOutcome, WriteProperty,
};

/// Everything needed to declare properties and write bindings
pub mod prelude {
    pub use crate::action::{call, cast, cond, construct, format, member, static_cast};
    pub use crate::binding::{BindOptions, Bindable, BindingKey, Reentrancy};
    pub use crate::expr::{expr, lit, Operand};
    pub use crate::object::{Channel, ConnectionType, Obj, Runtime};
    pub use crate::ops::OperandExt;
    pub use crate::property;
    pub use crate::property::MetaProperty;
}
