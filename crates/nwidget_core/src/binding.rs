//! Live bindings
//!
//! Binding an expression to a target evaluates it once, immediately, and
//! then keeps the target up to date: every property leaf with a notify
//! channel is subscribed to, and each notification re-evaluates the whole
//! expression and hands the result to the target.
//!
//! The subscriptions of one binding are gathered in a [`FanIn`], a child
//! object of the receiver named after the binding's [`BindingKey`]. Since it
//! is a child, destroying the receiver destroys the binding. Binding again
//! with the same key reuses the fan-in and replaces its subscriptions, so a
//! key never has more than one live binding.
//!
//! ```ignore
//! // c = a + b, kept up to date
//! c.prop(Value).bind(a.prop(Value) + b.prop(Value));
//!
//! // a free callable, identified by an explicit key
//! (a.prop(Value) * 2).bind_to_fn(&window, "title", move |v: i32| println!("{v}"));
//! ```

use std::borrow::Cow;
use std::fmt;
use std::rc::Rc;

use smallvec::SmallVec;
use tracing::{debug, trace};

use crate::expr::{Operand, Source};
use crate::object::{Channel, ConnectionType, Obj, ObjectId, Runtime};
use crate::property::{MetaProperty, Property, WriteProperty};

// ─────────────────────────────────────────────────────────────────────────────
// Keys and options
// ─────────────────────────────────────────────────────────────────────────────

/// Identity of a binding slot on a receiver
///
/// Property bindings are keyed by the property descriptor type; slot and
/// callable bindings use a caller-supplied name.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct BindingKey(Cow<'static, str>);

impl BindingKey {
    /// Key used when binding to property `P`
    pub fn of_property<P: Property>() -> Self {
        BindingKey(Cow::Owned(format!(
            "binding_on::{}",
            std::any::type_name::<P>()
        )))
    }

    /// Key for a slot or callable binding
    pub fn named(name: impl Into<Cow<'static, str>>) -> Self {
        BindingKey(Cow::Owned(format!("binding_to::{}", name.into())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BindingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What to do with a notification that arrives while the same binding is
/// already being applied
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Reentrancy {
    /// Re-evaluate again, nested inside the running apply
    #[default]
    Allow,
    /// Drop the nested notification
    Suppress,
}

/// Per-binding options
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BindOptions {
    /// Delivery mode of the input subscriptions
    pub connection: ConnectionType,
    pub reentrancy: Reentrancy,
}

impl BindOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connection(mut self, connection: ConnectionType) -> Self {
        self.connection = connection;
        self
    }

    pub fn reentrancy(mut self, reentrancy: Reentrancy) -> Self {
        self.reentrancy = reentrancy;
        self
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Fan-in
// ─────────────────────────────────────────────────────────────────────────────

/// State of the child object aggregating a binding's subscriptions
pub struct FanIn {
    key: BindingKey,
    apply: Option<Rc<dyn Fn()>>,
    sources: SmallVec<[Source; 4]>,
    reentrancy: Reentrancy,
    evaluating: bool,
    triggers: u64,
}

impl FanIn {
    fn new(key: BindingKey, reentrancy: Reentrancy) -> Self {
        Self {
            key,
            apply: None,
            sources: SmallVec::new(),
            reentrancy,
            evaluating: false,
            triggers: 0,
        }
    }

    pub fn key(&self) -> &BindingKey {
        &self.key
    }

    pub fn sources(&self) -> &[Source] {
        &self.sources
    }

    /// Number of notifications that led to a re-evaluation
    pub fn triggers(&self) -> u64 {
        self.triggers
    }

    fn trigger(handle: &Obj<FanIn>) {
        let Ok(step) = handle.try_with_mut(|fan_in| {
            if fan_in.evaluating && fan_in.reentrancy == Reentrancy::Suppress {
                return None;
            }
            let apply = fan_in.apply.clone()?;
            fan_in.triggers += 1;
            Some((apply, std::mem::replace(&mut fan_in.evaluating, true)))
        }) else {
            return;
        };

        let Some((apply, was_evaluating)) = step else {
            trace!(fan_in = ?handle.id(), "trigger skipped");
            return;
        };

        trace!(fan_in = ?handle.id(), "binding triggered");
        apply();

        // The apply may have torn this fan-in down.
        let _ = handle.try_with_mut(|fan_in| fan_in.evaluating = was_evaluating);
    }

    fn teardown(handle: &Obj<FanIn>) {
        let Some(rt) = handle.runtime() else {
            return;
        };
        rt.disconnect_receiver(handle.id());

        let apply = handle.try_with_mut(|fan_in| {
            fan_in.sources.clear();
            fan_in.apply.take()
        });
        drop(apply);

        debug!(fan_in = ?handle.id(), "binding torn down");
        rt.delete_later(handle.id());
    }

    fn subscribe(rt: &Runtime, handle: &Obj<FanIn>, source: Source, mode: ConnectionType) {
        let fan_in = handle.id();

        let on_destroyed = handle.clone();
        rt.connect(
            source.object,
            Channel::Destroyed,
            fan_in,
            "teardown",
            ConnectionType::Direct,
            Rc::new(move || FanIn::teardown(&on_destroyed)),
        );

        let on_change = handle.clone();
        let added = rt.connect(
            source.object,
            source.channel,
            fan_in,
            "trigger",
            mode,
            Rc::new(move || FanIn::trigger(&on_change)),
        );
        if added {
            handle.with_mut(|state| state.sources.push(source));
        }
    }
}

impl fmt::Debug for FanIn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FanIn")
            .field("key", &self.key)
            .field("sources", &self.sources)
            .field("reentrancy", &self.reentrancy)
            .field("triggers", &self.triggers)
            .finish()
    }
}

/// Snapshot of a live binding
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BindingInfo {
    pub key: BindingKey,
    /// One entry per live input subscription
    pub sources: Vec<Source>,
    pub triggers: u64,
}

// ─────────────────────────────────────────────────────────────────────────────
// Targets
// ─────────────────────────────────────────────────────────────────────────────

/// Where a binding delivers its value
pub enum BindTarget<T> {
    /// A property setter
    Property(Rc<dyn Fn(T)>),
    /// A slot or callable taking the value
    Unary(Rc<dyn Fn(T)>),
    /// A slot or callable taking nothing; the expression is not evaluated
    Nullary(Rc<dyn Fn()>),
}

impl<T> fmt::Debug for BindTarget<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BindTarget::Property(_) => f.write_str("BindTarget::Property"),
            BindTarget::Unary(_) => f.write_str("BindTarget::Unary"),
            BindTarget::Nullary(_) => f.write_str("BindTarget::Nullary"),
        }
    }
}

/// Marker for targets that ignore the value
pub struct WithoutValue;

/// Marker for targets that take the value
pub struct WithValue;

/// A method-like slot on receiver `C`: `Fn(&mut C)` or `Fn(&mut C, T)`
pub trait IntoSlot<C, T, Marker> {
    fn into_target(self, receiver: Obj<C>) -> BindTarget<T>;
}

impl<C, T, R, F> IntoSlot<C, T, WithoutValue> for F
where
    C: 'static,
    F: Fn(&mut C) -> R + 'static,
{
    fn into_target(self, receiver: Obj<C>) -> BindTarget<T> {
        BindTarget::Nullary(Rc::new(move || {
            receiver.with_mut(|state| {
                self(state);
            });
        }))
    }
}

impl<C, T, R, F> IntoSlot<C, T, WithValue> for F
where
    C: 'static,
    F: Fn(&mut C, T) -> R + 'static,
{
    fn into_target(self, receiver: Obj<C>) -> BindTarget<T> {
        BindTarget::Unary(Rc::new(move |value| {
            receiver.with_mut(|state| {
                self(state, value);
            });
        }))
    }
}

/// A free callable: `Fn()` or `Fn(T)`
pub trait IntoCallable<T, Marker> {
    fn into_target(self) -> BindTarget<T>;
}

impl<T, R, F> IntoCallable<T, WithoutValue> for F
where
    F: Fn() -> R + 'static,
{
    fn into_target(self) -> BindTarget<T> {
        BindTarget::Nullary(Rc::new(move || {
            self();
        }))
    }
}

impl<T, R, F> IntoCallable<T, WithValue> for F
where
    F: Fn(T) -> R + 'static,
{
    fn into_target(self) -> BindTarget<T> {
        BindTarget::Unary(Rc::new(move |value| {
            self(value);
        }))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Binding
// ─────────────────────────────────────────────────────────────────────────────

fn runtime_of<C: 'static>(receiver: &Obj<C>) -> Runtime {
    match receiver.try_runtime() {
        Ok(rt) => rt,
        Err(err) => panic!("cannot bind to {:?}: {err}", receiver.id()),
    }
}

fn install<E: Operand>(
    rt: &Runtime,
    receiver: ObjectId,
    key: BindingKey,
    expr: &E,
    target: BindTarget<E::Output>,
    options: BindOptions,
) {
    let apply: Rc<dyn Fn()> = match target {
        BindTarget::Property(write) | BindTarget::Unary(write) => {
            let expr = expr.clone();
            Rc::new(move || write(expr.eval()))
        }
        BindTarget::Nullary(call) => call,
    };
    apply();

    let existing = rt.find_child::<FanIn>(receiver, key.as_str());

    if !E::OBSERVABLE {
        if let Some(fan_in) = existing {
            FanIn::teardown(&fan_in);
        }
        return;
    }

    let fan_in = match existing {
        Some(fan_in) => {
            rt.disconnect_receiver(fan_in.id());
            let previous = fan_in.with_mut(|state| {
                state.sources.clear();
                state.reentrancy = options.reentrancy;
                state.apply.take()
            });
            drop(previous);
            fan_in
        }
        None => {
            let fan_in = rt.create_child(receiver, FanIn::new(key.clone(), options.reentrancy));
            rt.set_object_name(fan_in.id(), key.as_str());
            fan_in
        }
    };

    fan_in.with_mut(|state| state.apply = Some(apply));
    expr.visit_sources(&mut |source| FanIn::subscribe(rt, &fan_in, source, options.connection));

    debug!(
        key = %key,
        receiver = ?receiver,
        sources = fan_in.with(|state| state.sources.len()),
        mode = ?options.connection,
        "binding installed"
    );
}

/// Binding entry points, available on every [`Operand`]
///
/// All forms evaluate and apply once immediately. Only expressions with an
/// observable leaf keep a live binding afterwards.
pub trait Bindable: Operand {
    /// Keep `property` equal to this expression
    ///
    /// Uses the bind options of the property's runtime.
    fn bind_to<P>(&self, property: &MetaProperty<P>)
    where
        P: WriteProperty,
        Self::Output: Into<P::Value>,
    {
        let options = runtime_of(property.object()).config().bind;
        self.bind_to_with(property, options);
    }

    fn bind_to_with<P>(&self, property: &MetaProperty<P>, options: BindOptions)
    where
        P: WriteProperty,
        Self::Output: Into<P::Value>,
    {
        let receiver = property.object().clone();
        let rt = runtime_of(&receiver);
        let id = receiver.id();

        let target = BindTarget::Property(Rc::new(move |value: Self::Output| {
            MetaProperty::<P>::new(receiver.clone()).set(value.into());
        }));
        install(&rt, id, BindingKey::of_property::<P>(), self, target, options);
    }

    /// Call `slot` on `receiver` with each new value
    ///
    /// ```ignore
    /// count.prop(Value).bind_to_slot(&label, "count", |l: &mut Label, v: i32| l.text = v.to_string());
    /// ```
    fn bind_to_slot<C, M>(
        &self,
        receiver: &Obj<C>,
        key: impl Into<Cow<'static, str>>,
        slot: impl IntoSlot<C, Self::Output, M>,
    ) where
        C: 'static,
    {
        let rt = runtime_of(receiver);
        let options = rt.config().bind;
        let target = slot.into_target(receiver.clone());
        install(&rt, receiver.id(), BindingKey::named(key), self, target, options);
    }

    /// Call `f` with each new value; the binding lives as long as `receiver`
    fn bind_to_fn<C, M>(
        &self,
        receiver: &Obj<C>,
        key: impl Into<Cow<'static, str>>,
        f: impl IntoCallable<Self::Output, M>,
    ) where
        C: 'static,
    {
        let rt = runtime_of(receiver);
        let options = rt.config().bind;
        install(&rt, receiver.id(), BindingKey::named(key), self, f.into_target(), options);
    }

    /// General form: explicit key, target and options
    fn bind_with<C: 'static>(
        &self,
        receiver: &Obj<C>,
        key: BindingKey,
        target: BindTarget<Self::Output>,
        options: BindOptions,
    ) {
        let rt = runtime_of(receiver);
        install(&rt, receiver.id(), key, self, target, options);
    }
}

impl<E: Operand> Bindable for E {}

/// Tear down the binding `key` on `receiver`
///
/// Returns `false` if there was no live binding.
pub fn unbind<C: 'static>(receiver: &Obj<C>, key: &BindingKey) -> bool {
    let Some(rt) = receiver.runtime() else {
        return false;
    };
    match rt.find_child::<FanIn>(receiver.id(), key.as_str()) {
        Some(fan_in) => {
            FanIn::teardown(&fan_in);
            true
        }
        None => false,
    }
}

/// Inspect the live binding `key` on `receiver`
pub fn binding_info<C: 'static>(receiver: &Obj<C>, key: &BindingKey) -> Option<BindingInfo> {
    let rt = receiver.runtime()?;
    let fan_in = rt.find_child::<FanIn>(receiver.id(), key.as_str())?;
    fan_in
        .try_with(|state| BindingInfo {
            key: state.key.clone(),
            sources: state.sources.to_vec(),
            triggers: state.triggers,
        })
        .ok()
}

impl<P: WriteProperty> MetaProperty<P> {
    /// Remove the binding on this property, keeping its current value
    pub fn unbind(&self) -> bool {
        unbind(self.object(), &BindingKey::of_property::<P>())
    }

    pub fn binding_info(&self) -> Option<BindingInfo> {
        binding_info(self.object(), &BindingKey::of_property::<P>())
    }
}
