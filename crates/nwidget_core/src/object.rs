//! Object tree and notification dispatch
//!
//! The binding core needs a small set of capabilities from its host toolkit:
//! object identity, a destruction notification, named child lookup, unique
//! signal connections with a selectable delivery mode, and deferred
//! destruction. This module provides them on top of a slotmap-backed tree.
//!
//! Objects own their state behind a `RefCell`; everything else (names,
//! parent/child links, outgoing connections) lives in the tree. All access is
//! single-threaded. Callbacks are always invoked with no tree borrow held, so
//! a slot may freely create, connect, emit or destroy.
//!
//! ```ignore
//! let rt = Runtime::new();
//! let slider = rt.create(Slider::default());
//! let probe = rt.create(());
//!
//! rt.connect(
//!     slider.id(),
//!     Channel::Notify("valueChanged"),
//!     probe.id(),
//!     "log",
//!     ConnectionType::Direct,
//!     Rc::new(|| println!("changed")),
//! );
//!
//! slider.emit(Channel::Notify("valueChanged"));
//! ```

use rustc_hash::FxHashMap;
use slotmap::{new_key_type, SlotMap};
use smallvec::SmallVec;
use std::any::{type_name, Any};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::config::RuntimeConfig;
use crate::error::{Error, Result};
use crate::property::{MetaProperty, Property};

new_key_type! {
    /// Unique identifier for an object in the tree
    pub struct ObjectId;
}

/// A notification channel on an object
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Channel {
    /// Emitted once, right before the object leaves the tree
    Destroyed,
    /// A named change notification such as `"valueChanged"`
    Notify(&'static str),
}

/// How a connected callback is delivered
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ConnectionType {
    /// Same as `Direct`: everything runs on one thread
    #[default]
    Auto,
    /// Invoke the callback inside `emit`
    Direct,
    /// Queue the callback until the next [`Runtime::process_events`]
    Queued,
}

/// Callback attached to a connection
pub type SlotFn = Rc<dyn Fn()>;

struct Connection {
    serial: u64,
    channel: Channel,
    receiver: ObjectId,
    slot: &'static str,
    mode: ConnectionType,
    callback: SlotFn,
}

struct ObjectNode {
    name: String,
    type_name: &'static str,
    parent: Option<ObjectId>,
    children: SmallVec<[ObjectId; 4]>,
    /// `Rc<RefCell<C>>` behind `dyn Any`
    state: Rc<dyn Any>,
    /// Outgoing connections, in connection order
    connections: SmallVec<[Connection; 2]>,
    pending_delete: bool,
}

struct QueuedCall {
    sender: ObjectId,
    serial: u64,
    receiver: ObjectId,
    callback: SlotFn,
}

struct ObjectTree {
    objects: SlotMap<ObjectId, ObjectNode>,
    /// Receiver -> senders that hold at least one connection to it
    incoming: FxHashMap<ObjectId, SmallVec<[ObjectId; 4]>>,
    queued: VecDeque<QueuedCall>,
    deferred: Vec<ObjectId>,
    next_serial: u64,
    emitted: u64,
}

impl ObjectTree {
    fn has_connection(&self, sender: ObjectId, serial: u64) -> bool {
        self.objects
            .get(sender)
            .map(|node| node.connections.iter().any(|c| c.serial == serial))
            .unwrap_or(false)
    }

    fn is_live(&self, id: ObjectId) -> bool {
        self.objects
            .get(id)
            .map(|node| !node.pending_delete)
            .unwrap_or(false)
    }
}

/// Handle to the object tree (cheap to clone)
#[derive(Clone)]
pub struct Runtime {
    tree: Rc<RefCell<ObjectTree>>,
    config: Rc<RuntimeConfig>,
}

/// Non-owning runtime handle held by objects and callbacks
#[derive(Clone)]
pub struct WeakRuntime {
    tree: Weak<RefCell<ObjectTree>>,
    config: Weak<RuntimeConfig>,
}

impl WeakRuntime {
    pub fn upgrade(&self) -> Option<Runtime> {
        Some(Runtime {
            tree: self.tree.upgrade()?,
            config: self.config.upgrade()?,
        })
    }
}

impl Runtime {
    /// Create an empty runtime with the default configuration
    pub fn new() -> Self {
        Self::with_config(RuntimeConfig::default())
    }

    /// Create an empty runtime with a custom configuration
    pub fn with_config(config: RuntimeConfig) -> Self {
        Self {
            tree: Rc::new(RefCell::new(ObjectTree {
                objects: SlotMap::with_key(),
                incoming: FxHashMap::default(),
                queued: VecDeque::new(),
                deferred: Vec::new(),
                next_serial: 0,
                emitted: 0,
            })),
            config: Rc::new(config),
        }
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn downgrade(&self) -> WeakRuntime {
        WeakRuntime {
            tree: Rc::downgrade(&self.tree),
            config: Rc::downgrade(&self.config),
        }
    }

    // =========================================================================
    // OBJECTS
    // =========================================================================

    /// Create a root object owning `state`
    pub fn create<C: 'static>(&self, state: C) -> Obj<C> {
        self.insert(None, state)
    }

    /// Create an object owned by `parent`; it is destroyed with its parent
    ///
    /// Panics if `parent` is not in the tree.
    pub fn create_child<C: 'static>(&self, parent: ObjectId, state: C) -> Obj<C> {
        assert!(
            self.contains(parent),
            "create_child: parent {parent:?} is not alive"
        );
        self.insert(Some(parent), state)
    }

    fn insert<C: 'static>(&self, parent: Option<ObjectId>, state: C) -> Obj<C> {
        let state = Rc::new(RefCell::new(state));
        let erased: Rc<dyn Any> = state.clone();

        let mut tree = self.tree.borrow_mut();
        let id = tree.objects.insert(ObjectNode {
            name: String::new(),
            type_name: type_name::<C>(),
            parent,
            children: SmallVec::new(),
            state: erased,
            connections: SmallVec::new(),
            pending_delete: false,
        });
        if let Some(parent) = parent {
            if let Some(node) = tree.objects.get_mut(parent) {
                node.children.push(id);
            }
        }

        Obj {
            id,
            state: Rc::downgrade(&state),
            runtime: self.downgrade(),
        }
    }

    /// Get a typed handle for an existing object
    pub fn handle<C: 'static>(&self, id: ObjectId) -> Result<Obj<C>> {
        let erased = {
            let tree = self.tree.borrow();
            let node = tree.objects.get(id).ok_or(Error::ObjectDestroyed(id))?;
            node.state.clone()
        };
        let state = erased
            .downcast::<RefCell<C>>()
            .map_err(|_| Error::TypeMismatch {
                id,
                expected: type_name::<C>(),
            })?;

        Ok(Obj {
            id,
            state: Rc::downgrade(&state),
            runtime: self.downgrade(),
        })
    }

    /// Check whether an object is still in the tree
    pub fn contains(&self, id: ObjectId) -> bool {
        self.tree.borrow().objects.contains_key(id)
    }

    /// Check whether an object has been scheduled with [`Runtime::delete_later`]
    pub fn is_pending_delete(&self, id: ObjectId) -> bool {
        self.tree
            .borrow()
            .objects
            .get(id)
            .map(|node| node.pending_delete)
            .unwrap_or(false)
    }

    pub fn set_object_name(&self, id: ObjectId, name: impl Into<String>) {
        if let Some(node) = self.tree.borrow_mut().objects.get_mut(id) {
            node.name = name.into();
        }
    }

    pub fn object_name(&self, id: ObjectId) -> Option<String> {
        self.tree.borrow().objects.get(id).map(|n| n.name.clone())
    }

    /// Type name of the state an object was created with
    pub fn type_name_of(&self, id: ObjectId) -> Option<&'static str> {
        self.tree.borrow().objects.get(id).map(|n| n.type_name)
    }

    pub fn parent(&self, id: ObjectId) -> Option<ObjectId> {
        self.tree.borrow().objects.get(id).and_then(|n| n.parent)
    }

    pub fn children(&self, id: ObjectId) -> Vec<ObjectId> {
        self.tree
            .borrow()
            .objects
            .get(id)
            .map(|n| n.children.to_vec())
            .unwrap_or_default()
    }

    /// Find a direct child of `parent` named `name` whose state is a `C`
    ///
    /// Descendants further down are not searched, and children scheduled for
    /// deferred deletion are skipped.
    pub fn find_child<C: 'static>(&self, parent: ObjectId, name: &str) -> Option<Obj<C>> {
        let candidates: SmallVec<[ObjectId; 4]> = {
            let tree = self.tree.borrow();
            let node = tree.objects.get(parent)?;
            node.children
                .iter()
                .copied()
                .filter(|child| {
                    tree.objects
                        .get(*child)
                        .map(|c| !c.pending_delete && c.name == name)
                        .unwrap_or(false)
                })
                .collect()
        };

        candidates
            .into_iter()
            .find_map(|child| self.handle::<C>(child).ok())
    }

    // =========================================================================
    // CONNECTIONS
    // =========================================================================

    /// Connect `sender`'s `channel` to `callback`, owned by `receiver`
    ///
    /// Connections are unique per (sender, channel, receiver, slot): a second
    /// connect with the same tuple is a no-op and returns `false`. The
    /// connection disappears when either end is destroyed.
    pub fn connect(
        &self,
        sender: ObjectId,
        channel: Channel,
        receiver: ObjectId,
        slot: &'static str,
        mode: ConnectionType,
        callback: SlotFn,
    ) -> bool {
        let mut tree = self.tree.borrow_mut();
        if !tree.objects.contains_key(receiver) {
            return false;
        }
        let serial = tree.next_serial;
        let Some(node) = tree.objects.get_mut(sender) else {
            return false;
        };

        let duplicate = node
            .connections
            .iter()
            .any(|c| c.channel == channel && c.receiver == receiver && c.slot == slot);
        if duplicate {
            return false;
        }

        node.connections.push(Connection {
            serial,
            channel,
            receiver,
            slot,
            mode,
            callback,
        });
        tree.next_serial += 1;

        let senders = tree.incoming.entry(receiver).or_default();
        if !senders.contains(&sender) {
            senders.push(sender);
        }
        true
    }

    /// Drop every connection whose receiver is `receiver`
    ///
    /// Returns the number of connections removed.
    pub fn disconnect_receiver(&self, receiver: ObjectId) -> usize {
        let mut tree = self.tree.borrow_mut();
        let senders = tree.incoming.remove(&receiver).unwrap_or_default();

        let mut removed = 0;
        for sender in senders {
            if let Some(node) = tree.objects.get_mut(sender) {
                let before = node.connections.len();
                node.connections.retain(|c| c.receiver != receiver);
                removed += before - node.connections.len();
            }
        }
        tree.queued.retain(|call| call.receiver != receiver);
        removed
    }

    /// Number of connections on `sender`'s `channel`
    pub fn connection_count(&self, sender: ObjectId, channel: Channel) -> usize {
        self.tree
            .borrow()
            .objects
            .get(sender)
            .map(|n| n.connections.iter().filter(|c| c.channel == channel).count())
            .unwrap_or(0)
    }

    /// Notify everything connected to `sender`'s `channel`
    ///
    /// Direct connections run before `emit` returns, in connection order. A
    /// connection removed by an earlier callback of the same emission is
    /// skipped.
    pub fn emit(&self, sender: ObjectId, channel: Channel) {
        let calls: SmallVec<[(u64, ConnectionType, ObjectId, SlotFn); 4]> = {
            let mut tree = self.tree.borrow_mut();
            tree.emitted += 1;
            let Some(node) = tree.objects.get(sender) else {
                return;
            };
            node.connections
                .iter()
                .filter(|c| c.channel == channel)
                .map(|c| (c.serial, c.mode, c.receiver, c.callback.clone()))
                .collect()
        };

        for (serial, mode, receiver, callback) in calls {
            match mode {
                ConnectionType::Queued => {
                    self.tree.borrow_mut().queued.push_back(QueuedCall {
                        sender,
                        serial,
                        receiver,
                        callback,
                    });
                }
                ConnectionType::Auto | ConnectionType::Direct => {
                    let deliver = {
                        let tree = self.tree.borrow();
                        tree.is_live(receiver) && tree.has_connection(sender, serial)
                    };
                    if deliver {
                        callback();
                    }
                }
            }
        }
    }

    // =========================================================================
    // DESTRUCTION
    // =========================================================================

    /// Destroy an object and all of its descendants immediately
    ///
    /// `Destroyed` is emitted before the children go, so observers still see
    /// a complete subtree.
    pub fn destroy(&self, id: ObjectId) {
        if !self.contains(id) {
            return;
        }
        tracing::trace!(?id, "destroying object");

        self.emit(id, Channel::Destroyed);

        for child in self.children(id) {
            self.destroy(child);
        }

        let removed = {
            let mut tree = self.tree.borrow_mut();
            let removed = tree.objects.remove(id);

            if let Some(node) = &removed {
                if let Some(parent) = node.parent {
                    if let Some(parent) = tree.objects.get_mut(parent) {
                        parent.children.retain(|c| *c != id);
                    }
                }
                for c in node.connections.iter() {
                    if let Some(senders) = tree.incoming.get_mut(&c.receiver) {
                        senders.retain(|s| *s != id);
                        if senders.is_empty() {
                            tree.incoming.remove(&c.receiver);
                        }
                    }
                }
            }

            if let Some(senders) = tree.incoming.remove(&id) {
                for sender in senders {
                    if let Some(node) = tree.objects.get_mut(sender) {
                        node.connections.retain(|c| c.receiver != id);
                    }
                }
            }
            tree.queued.retain(|call| call.receiver != id && call.sender != id);
            removed
        };

        // State may own closures; drop it with no borrow held.
        drop(removed);
    }

    /// Schedule an object for destruction on the next [`Runtime::process_events`]
    ///
    /// The object stays usable until then but is no longer found by
    /// [`Runtime::find_child`] and no longer receives direct notifications.
    pub fn delete_later(&self, id: ObjectId) {
        let mut tree = self.tree.borrow_mut();
        let Some(node) = tree.objects.get_mut(id) else {
            return;
        };
        if !node.pending_delete {
            node.pending_delete = true;
            tree.deferred.push(id);
        }
    }

    /// Run queued calls, then deferred deletions, until nothing is pending
    ///
    /// Returns the number of queued calls delivered. Stops after
    /// `event_pass_limit` passes if callbacks keep producing work.
    pub fn process_events(&self) -> usize {
        let mut delivered = 0;

        for _ in 0..self.config.event_pass_limit {
            let (queued, deferred) = {
                let mut tree = self.tree.borrow_mut();
                let queued: Vec<QueuedCall> = tree.queued.drain(..).collect();
                let deferred = std::mem::take(&mut tree.deferred);
                (queued, deferred)
            };
            if queued.is_empty() && deferred.is_empty() {
                return delivered;
            }

            for call in queued {
                let deliver = {
                    let tree = self.tree.borrow();
                    tree.is_live(call.receiver) && tree.has_connection(call.sender, call.serial)
                };
                if deliver {
                    (call.callback)();
                    delivered += 1;
                }
            }

            for id in deferred {
                self.destroy(id);
            }
        }

        tracing::warn!(
            limit = self.config.event_pass_limit,
            "event queue did not settle"
        );
        delivered
    }

    /// Get statistics about the object tree
    pub fn stats(&self) -> RuntimeStats {
        let tree = self.tree.borrow();
        RuntimeStats {
            object_count: tree.objects.len(),
            connection_count: tree.objects.values().map(|n| n.connections.len()).sum(),
            queued_calls: tree.queued.len(),
            deferred_deletes: tree.deferred.len(),
            tracked_receivers: tree.incoming.len(),
            emitted: tree.emitted,
        }
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime").field("stats", &self.stats()).finish()
    }
}

/// Statistics about the object tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeStats {
    pub object_count: usize,
    pub connection_count: usize,
    pub queued_calls: usize,
    pub deferred_deletes: usize,
    /// Receivers with at least one live incoming connection
    pub tracked_receivers: usize,
    pub emitted: u64,
}

// =============================================================================
// OBJ - typed, non-owning object handle
// =============================================================================

/// A typed handle to an object in a [`Runtime`]
///
/// Handles do not keep the object alive. Using a handle after its object has
/// been destroyed is a programming error: [`Obj::with`] and [`Obj::with_mut`]
/// panic, the `try_` variants return [`Error::ObjectDestroyed`].
pub struct Obj<C> {
    id: ObjectId,
    state: Weak<RefCell<C>>,
    runtime: WeakRuntime,
}

impl<C> Clone for Obj<C> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            state: self.state.clone(),
            runtime: self.runtime.clone(),
        }
    }
}

impl<C> fmt::Debug for Obj<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Obj")
            .field("id", &self.id)
            .field("type", &type_name::<C>())
            .field("alive", &(self.state.strong_count() > 0))
            .finish()
    }
}

impl<C: 'static> Obj<C> {
    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn is_alive(&self) -> bool {
        self.state.strong_count() > 0
    }

    pub fn runtime(&self) -> Option<Runtime> {
        self.runtime.upgrade()
    }

    pub fn try_runtime(&self) -> Result<Runtime> {
        self.runtime.upgrade().ok_or(Error::RuntimeDropped)
    }

    /// Read the object's state
    pub fn with<R>(&self, f: impl FnOnce(&C) -> R) -> R {
        match self.try_with(f) {
            Ok(value) => value,
            Err(err) => panic!("{err}"),
        }
    }

    /// Mutate the object's state without emitting anything
    pub fn with_mut<R>(&self, f: impl FnOnce(&mut C) -> R) -> R {
        match self.try_with_mut(f) {
            Ok(value) => value,
            Err(err) => panic!("{err}"),
        }
    }

    pub fn try_with<R>(&self, f: impl FnOnce(&C) -> R) -> Result<R> {
        let state = self.state.upgrade().ok_or(Error::ObjectDestroyed(self.id))?;
        let guard = state.borrow();
        Ok(f(&guard))
    }

    pub fn try_with_mut<R>(&self, f: impl FnOnce(&mut C) -> R) -> Result<R> {
        let state = self.state.upgrade().ok_or(Error::ObjectDestroyed(self.id))?;
        let mut guard = state.borrow_mut();
        Ok(f(&mut guard))
    }

    /// Emit one of this object's channels
    pub fn emit(&self, channel: Channel) {
        if let Some(runtime) = self.runtime.upgrade() {
            runtime.emit(self.id, channel);
        }
    }

    /// Accessor for one of this object's properties
    ///
    /// ```ignore
    /// let sum = a.prop(SliderValue) + b.prop(SliderValue);
    /// ```
    pub fn prop<P: Property<Class = C>>(&self, _property: P) -> MetaProperty<P> {
        MetaProperty::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    const CHANGED: Channel = Channel::Notify("changed");

    fn counter(count: &Rc<Cell<u32>>) -> SlotFn {
        let count = count.clone();
        Rc::new(move || count.set(count.get() + 1))
    }

    #[test]
    fn test_create_and_read_state() {
        let rt = Runtime::new();
        let obj = rt.create(41i32);

        obj.with_mut(|v| *v += 1);
        assert_eq!(obj.with(|v| *v), 42);
        assert_eq!(rt.type_name_of(obj.id()), Some("i32"));
    }

    #[test]
    fn test_handle_type_mismatch() {
        let rt = Runtime::new();
        let obj = rt.create(String::from("text"));

        assert!(rt.handle::<String>(obj.id()).is_ok());
        assert_eq!(
            rt.handle::<i32>(obj.id()).unwrap_err(),
            Error::TypeMismatch {
                id: obj.id(),
                expected: "i32"
            }
        );
    }

    #[test]
    fn test_find_child_is_direct_and_typed() {
        let rt = Runtime::new();
        let root = rt.create(());
        let child = rt.create_child(root.id(), 1u8);
        let grandchild = rt.create_child(child.id(), 2u8);
        rt.set_object_name(child.id(), "child");
        rt.set_object_name(grandchild.id(), "grandchild");

        assert!(rt.find_child::<u8>(root.id(), "child").is_some());
        assert!(rt.find_child::<u16>(root.id(), "child").is_none());
        assert!(rt.find_child::<u8>(root.id(), "grandchild").is_none());

        rt.delete_later(child.id());
        assert!(rt.find_child::<u8>(root.id(), "child").is_none());
    }

    #[test]
    fn test_unique_connection() {
        let rt = Runtime::new();
        let sender = rt.create(());
        let receiver = rt.create(());
        let count = Rc::new(Cell::new(0));

        let id = (sender.id(), receiver.id());
        assert!(rt.connect(id.0, CHANGED, id.1, "slot", ConnectionType::Direct, counter(&count)));
        assert!(!rt.connect(id.0, CHANGED, id.1, "slot", ConnectionType::Direct, counter(&count)));
        assert_eq!(rt.connection_count(id.0, CHANGED), 1);

        sender.emit(CHANGED);
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn test_disconnect_receiver() {
        let rt = Runtime::new();
        let a = rt.create(());
        let b = rt.create(());
        let receiver = rt.create(());
        let count = Rc::new(Cell::new(0));

        for sender in [a.id(), b.id()] {
            rt.connect(sender, CHANGED, receiver.id(), "slot", ConnectionType::Direct, counter(&count));
        }
        assert_eq!(rt.disconnect_receiver(receiver.id()), 2);

        a.emit(CHANGED);
        b.emit(CHANGED);
        assert_eq!(count.get(), 0);
    }

    #[test]
    fn test_destroy_emits_and_cascades() {
        let rt = Runtime::new();
        let parent = rt.create(());
        let child = rt.create_child(parent.id(), ());
        let watcher = rt.create(());
        let count = Rc::new(Cell::new(0));

        rt.connect(child.id(), Channel::Destroyed, watcher.id(), "slot", ConnectionType::Direct, counter(&count));
        rt.destroy(parent.id());

        assert_eq!(count.get(), 1);
        assert!(!rt.contains(child.id()));
        assert!(!child.is_alive());
        assert_eq!(rt.stats().connection_count, 0);
    }

    #[test]
    fn test_destroyed_receiver_drops_connections() {
        let rt = Runtime::new();
        let sender = rt.create(());
        let receiver = rt.create(());
        let count = Rc::new(Cell::new(0));

        rt.connect(sender.id(), CHANGED, receiver.id(), "slot", ConnectionType::Direct, counter(&count));
        rt.destroy(receiver.id());

        sender.emit(CHANGED);
        assert_eq!(count.get(), 0);
        assert_eq!(rt.connection_count(sender.id(), CHANGED), 0);
    }

    #[test]
    fn test_destroyed_senders_release_receiver_index() {
        let rt = Runtime::new();
        let a = rt.create(());
        let b = rt.create(());
        let receiver = rt.create(());
        let count = Rc::new(Cell::new(0));

        for sender in [a.id(), b.id()] {
            rt.connect(sender, CHANGED, receiver.id(), "slot", ConnectionType::Direct, counter(&count));
        }
        assert_eq!(rt.stats().tracked_receivers, 1);

        rt.destroy(a.id());
        assert_eq!(rt.stats().tracked_receivers, 1);
        rt.destroy(b.id());
        assert_eq!(rt.stats().tracked_receivers, 0);
        assert!(rt.contains(receiver.id()));
    }

    #[test]
    fn test_queued_delivery() {
        let rt = Runtime::new();
        let sender = rt.create(());
        let receiver = rt.create(());
        let count = Rc::new(Cell::new(0));

        rt.connect(sender.id(), CHANGED, receiver.id(), "slot", ConnectionType::Queued, counter(&count));
        sender.emit(CHANGED);
        sender.emit(CHANGED);
        assert_eq!(count.get(), 0);
        assert_eq!(rt.stats().queued_calls, 2);

        assert_eq!(rt.process_events(), 2);
        assert_eq!(count.get(), 2);
    }

    #[test]
    fn test_delete_later() {
        let rt = Runtime::new();
        let obj = rt.create(7u32);

        rt.delete_later(obj.id());
        assert!(rt.contains(obj.id()));
        assert!(rt.is_pending_delete(obj.id()));
        assert_eq!(obj.with(|v| *v), 7);

        rt.process_events();
        assert!(!rt.contains(obj.id()));
        assert_eq!(obj.try_with(|v| *v), Err(Error::ObjectDestroyed(obj.id())));
    }

    #[test]
    fn test_connection_removed_mid_emit_is_skipped() {
        let rt = Runtime::new();
        let sender = rt.create(());
        let first = rt.create(());
        let second = rt.create(());
        let count = Rc::new(Cell::new(0));

        let rt_clone = rt.clone();
        let second_id = second.id();
        rt.connect(
            sender.id(),
            CHANGED,
            first.id(),
            "slot",
            ConnectionType::Direct,
            Rc::new(move || {
                rt_clone.disconnect_receiver(second_id);
            }),
        );
        rt.connect(sender.id(), CHANGED, second.id(), "slot", ConnectionType::Direct, counter(&count));

        sender.emit(CHANGED);
        assert_eq!(count.get(), 0);
    }

    #[test]
    #[should_panic(expected = "destroyed")]
    fn test_use_after_destroy_panics() {
        let rt = Runtime::new();
        let obj = rt.create(0i32);
        rt.destroy(obj.id());
        obj.with(|v| *v);
    }
}
