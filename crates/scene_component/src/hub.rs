//! Change notification fan-out for one component.
//!
//! Every component owns one [`ChangeHub`] behind an `Rc`; its attributes
//! hold a `Weak` handle to it as their [`AttributeOwner`]. A mutation flows:
//!
//! 1. `Attribute::set` marks the attribute changed and calls the hub
//!    (unless the mode is [`ChangeMode::Disconnected`]).
//! 2. The hub decides whether the change is to be replicated and, if so,
//!    records the attribute index as pending.
//! 3. Local observers run synchronously, in subscription order.
//! 4. The event is forwarded to the scene's [`ChangeSink`], if any.

use std::cell::{Cell, RefCell};
use std::collections::BTreeSet;
use std::fmt;
use std::mem;
use std::rc::{Rc, Weak};

use scene_attribute::{Attribute, AttributeOwner, AttributeValue, ChangeMode};

use crate::type_id::{ComponentId, ComponentTypeId, EntityId};

/// Identity and flags of a component, as seen by observers and policies.
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentInfo {
    pub type_name: String,
    pub type_id: ComponentTypeId,
    /// Id within the owning entity; `0` until the component is added to one.
    pub id: ComponentId,
    /// Instance name; empty for unnamed components.
    pub name: String,
    pub entity: Option<EntityId>,
    pub replicated: bool,
    pub temporary: bool,
}

impl ComponentInfo {
    #[must_use]
    pub fn new(type_name: impl Into<String>, type_id: ComponentTypeId) -> Self {
        Self {
            type_name: type_name.into(),
            type_id,
            id: 0,
            name: String::new(),
            entity: None,
            replicated: true,
            temporary: false,
        }
    }
}

/// A single attribute mutation.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeChanged {
    pub component: ComponentInfo,
    pub attribute_id: String,
    pub attribute_name: String,
    pub index: u8,
    /// The value after the mutation.
    pub value: AttributeValue,
    pub mode: ChangeMode,
    /// Whether the change was marked for network propagation.
    pub replicate: bool,
}

/// Host-supplied authority decision for [`ChangeMode::Default`] mutations.
pub trait ReplicationPolicy {
    fn should_replicate(&self, component: &ComponentInfo) -> bool;
}

/// Replicate exactly the components flagged as replicated.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReplicatedFlagPolicy;

impl ReplicationPolicy for ReplicatedFlagPolicy {
    fn should_replicate(&self, component: &ComponentInfo) -> bool {
        component.replicated
    }
}

impl<F: Fn(&ComponentInfo) -> bool> ReplicationPolicy for F {
    fn should_replicate(&self, component: &ComponentInfo) -> bool {
        self(component)
    }
}

/// Scene-level receiver of component events.
pub trait ChangeSink {
    fn attribute_changed(&self, event: &AttributeChanged);

    fn attribute_added(&self, _component: &ComponentInfo, _attribute: &Attribute, _mode: ChangeMode) {}

    fn attribute_removed(&self, _component: &ComponentInfo, _attribute: &Attribute, _mode: ChangeMode) {}

    fn component_renamed(&self, _component: &ComponentInfo, _old_name: &str) {}
}

/// Handle returned by [`Observers::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

type Observer<E> = Box<dyn FnMut(&E)>;

/// An ordered list of callbacks, invoked synchronously in subscription
/// order.
///
/// Observers may subscribe or unsubscribe from inside a callback: new
/// observers first run on the next event, cancelled ones are dropped once
/// the outermost dispatch returns.
pub struct Observers<E> {
    list: RefCell<Vec<(ObserverId, Observer<E>)>>,
    next: Cell<u64>,
    dispatching: Cell<bool>,
    cancelled: RefCell<Vec<ObserverId>>,
}

impl<E> Default for Observers<E> {
    fn default() -> Self {
        Self {
            list: RefCell::new(Vec::new()),
            next: Cell::new(0),
            dispatching: Cell::new(false),
            cancelled: RefCell::new(Vec::new()),
        }
    }
}

impl<E> fmt::Debug for Observers<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observers").field("len", &self.len()).finish()
    }
}

impl<E> Observers<E> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, observer: impl FnMut(&E) + 'static) -> ObserverId {
        let id = ObserverId(self.next.get());
        self.next.set(id.0 + 1);
        self.list.borrow_mut().push((id, Box::new(observer)));
        id
    }

    /// Remove an observer. Returns `false` if it was not subscribed.
    pub fn unsubscribe(&self, id: ObserverId) -> bool {
        let mut list = self.list.borrow_mut();
        if let Some(pos) = list.iter().position(|(oid, _)| *oid == id) {
            list.remove(pos);
            return true;
        }
        if self.dispatching.get() && id.0 < self.next.get() {
            self.cancelled.borrow_mut().push(id);
            return true;
        }
        false
    }

    /// Number of live observers, not counting any mid-dispatch.
    #[must_use]
    pub fn len(&self) -> usize {
        self.list.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn dispatch(&self, event: &E) {
        let mut taken = mem::take(&mut *self.list.borrow_mut());
        let was_dispatching = self.dispatching.replace(true);
        for (_, observer) in &mut taken {
            observer(event);
        }
        self.dispatching.set(was_dispatching);

        let mut list = self.list.borrow_mut();
        let added = mem::take(&mut *list);
        *list = taken;
        list.extend(added);
        if !was_dispatching {
            let cancelled = mem::take(&mut *self.cancelled.borrow_mut());
            list.retain(|(id, _)| !cancelled.contains(id));
        }
    }
}

/// Per-component notification target. See the module docs.
pub struct ChangeHub {
    info: RefCell<ComponentInfo>,
    observers: Observers<AttributeChanged>,
    pending: RefCell<BTreeSet<u8>>,
    policy: RefCell<Rc<dyn ReplicationPolicy>>,
    sink: RefCell<Option<Weak<dyn ChangeSink>>>,
}

impl fmt::Debug for ChangeHub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeHub")
            .field("info", &self.info.borrow())
            .field("observers", &self.observers.len())
            .field("pending", &self.pending.borrow())
            .finish_non_exhaustive()
    }
}

impl ChangeHub {
    #[must_use]
    pub fn new(info: ComponentInfo) -> Self {
        Self {
            info: RefCell::new(info),
            observers: Observers::new(),
            pending: RefCell::new(BTreeSet::new()),
            policy: RefCell::new(Rc::new(ReplicatedFlagPolicy)),
            sink: RefCell::new(None),
        }
    }

    /// Snapshot of the owning component's identity.
    #[must_use]
    pub fn info(&self) -> ComponentInfo {
        self.info.borrow().clone()
    }

    pub(crate) fn set_info(&self, info: ComponentInfo) {
        *self.info.borrow_mut() = info;
    }

    /// Register a local observer. Observers run synchronously, in
    /// subscription order, for every notified mutation.
    pub fn subscribe(&self, observer: impl FnMut(&AttributeChanged) + 'static) -> ObserverId {
        self.observers.subscribe(observer)
    }

    /// Remove an observer. Returns `false` if it was not subscribed.
    pub fn unsubscribe(&self, id: ObserverId) -> bool {
        self.observers.unsubscribe(id)
    }

    pub fn set_policy(&self, policy: Rc<dyn ReplicationPolicy>) {
        *self.policy.borrow_mut() = policy;
    }

    pub fn set_sink(&self, sink: Option<Weak<dyn ChangeSink>>) {
        *self.sink.borrow_mut() = sink;
    }

    /// The scene sink, if one is installed and still alive.
    #[must_use]
    pub fn sink(&self) -> Option<Rc<dyn ChangeSink>> {
        self.sink.borrow().as_ref().and_then(Weak::upgrade)
    }

    /// Indices of attributes marked for replication since the last call.
    pub fn take_pending(&self) -> Vec<u8> {
        mem::take(&mut *self.pending.borrow_mut()).into_iter().collect()
    }

    #[must_use]
    pub fn has_pending(&self) -> bool {
        !self.pending.borrow().is_empty()
    }

    pub(crate) fn forget_pending(&self, index: u8) {
        self.pending.borrow_mut().remove(&index);
    }

    fn resolve_replicate(&self, mode: ChangeMode) -> bool {
        match mode {
            ChangeMode::Disconnected | ChangeMode::LocalOnly => false,
            ChangeMode::Replicate => true,
            ChangeMode::Default => {
                let policy = Rc::clone(&self.policy.borrow());
                policy.should_replicate(&self.info.borrow())
            }
        }
    }

    pub(crate) fn attribute_added(&self, attribute: &Attribute, mode: ChangeMode) {
        if mode == ChangeMode::Disconnected {
            return;
        }
        if let Some(sink) = self.sink() {
            sink.attribute_added(&self.info.borrow(), attribute, mode);
        }
    }

    pub(crate) fn attribute_removed(&self, attribute: &Attribute, mode: ChangeMode) {
        self.forget_pending(attribute.index());
        if mode == ChangeMode::Disconnected {
            return;
        }
        if let Some(sink) = self.sink() {
            sink.attribute_removed(&self.info.borrow(), attribute, mode);
        }
    }

    pub(crate) fn renamed(&self, old_name: &str) {
        if let Some(sink) = self.sink() {
            sink.component_renamed(&self.info.borrow(), old_name);
        }
    }
}

impl AttributeOwner for ChangeHub {
    fn attribute_changed(&self, attribute: &Attribute, mode: ChangeMode) {
        if mode == ChangeMode::Disconnected {
            return;
        }
        let replicate = self.resolve_replicate(mode);
        if replicate {
            self.pending.borrow_mut().insert(attribute.index());
        }
        let event = AttributeChanged {
            component: self.info(),
            attribute_id: attribute.id().to_string(),
            attribute_name: attribute.name().to_string(),
            index: attribute.index(),
            value: attribute.value().clone(),
            mode,
            replicate,
        };
        tracing::trace!(
            component = %event.component.type_name,
            attribute = %event.attribute_id,
            ?mode,
            replicate,
            "attribute changed"
        );
        self.observers.dispatch(&event);
        if let Some(sink) = self.sink() {
            sink.attribute_changed(&event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hub_with_attribute(replicated: bool) -> (Rc<ChangeHub>, Attribute) {
        let mut info = ComponentInfo::new("Test", ComponentTypeId(1));
        info.replicated = replicated;
        let hub = Rc::new(ChangeHub::new(info));
        let mut attr = Attribute::new("Count", 0i32);
        let weak: Weak<ChangeHub> = Rc::downgrade(&hub);
        attr.attach(weak, 3);
        (hub, attr)
    }

    fn record(hub: &ChangeHub) -> Rc<RefCell<Vec<AttributeChanged>>> {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        hub.subscribe(move |e| sink.borrow_mut().push(e.clone()));
        log
    }

    #[test]
    fn test_disconnected_never_observed() {
        let (hub, mut attr) = hub_with_attribute(true);
        let log = record(&hub);
        attr.set(1i32, ChangeMode::Disconnected).unwrap();
        assert!(log.borrow().is_empty());
        assert!(!hub.has_pending());
    }

    #[test]
    fn test_local_only_never_replicates() {
        let (hub, mut attr) = hub_with_attribute(true);
        let log = record(&hub);
        attr.set(1i32, ChangeMode::LocalOnly).unwrap();
        assert_eq!(log.borrow().len(), 1);
        assert!(!log.borrow()[0].replicate);
        assert!(hub.take_pending().is_empty());
    }

    #[test]
    fn test_replicate_overrides_policy() {
        let (hub, mut attr) = hub_with_attribute(false);
        hub.set_policy(Rc::new(|_: &ComponentInfo| false));
        attr.set(1i32, ChangeMode::Replicate).unwrap();
        assert_eq!(hub.take_pending(), vec![3]);
        assert!(!hub.has_pending());
    }

    #[test]
    fn test_default_consults_policy() {
        let (hub, mut attr) = hub_with_attribute(false);
        attr.set(1i32, ChangeMode::Default).unwrap();
        assert!(!hub.has_pending());

        hub.set_policy(Rc::new(|c: &ComponentInfo| c.type_name == "Test"));
        attr.set(2i32, ChangeMode::Default).unwrap();
        assert_eq!(hub.take_pending(), vec![3]);
    }

    #[test]
    fn test_observers_run_in_subscription_order() {
        let (hub, mut attr) = hub_with_attribute(true);
        let order = Rc::new(RefCell::new(Vec::new()));
        for n in 0..3 {
            let order = Rc::clone(&order);
            hub.subscribe(move |_| order.borrow_mut().push(n));
        }
        attr.set(1i32, ChangeMode::LocalOnly).unwrap();
        assert_eq!(*order.borrow(), vec![0, 1, 2]);
    }

    #[test]
    fn test_unsubscribe() {
        let (hub, mut attr) = hub_with_attribute(true);
        let log = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&log);
        let id = hub.subscribe(move |_| *counter.borrow_mut() += 1);
        attr.set(1i32, ChangeMode::LocalOnly).unwrap();
        assert!(hub.unsubscribe(id));
        assert!(!hub.unsubscribe(id));
        attr.set(2i32, ChangeMode::LocalOnly).unwrap();
        assert_eq!(*log.borrow(), 1);
    }

    #[test]
    fn test_observer_may_subscribe_during_dispatch() {
        let (hub, mut attr) = hub_with_attribute(true);
        let inner_calls = Rc::new(RefCell::new(0));
        let weak_hub = Rc::downgrade(&hub);
        let calls = Rc::clone(&inner_calls);
        hub.subscribe(move |_| {
            if let Some(hub) = weak_hub.upgrade() {
                let calls = Rc::clone(&calls);
                hub.subscribe(move |_| *calls.borrow_mut() += 1);
            }
        });
        attr.set(1i32, ChangeMode::LocalOnly).unwrap();
        assert_eq!(*inner_calls.borrow(), 0);
        attr.set(2i32, ChangeMode::LocalOnly).unwrap();
        assert_eq!(*inner_calls.borrow(), 1);
    }

    #[test]
    fn test_event_carries_value() {
        let (hub, mut attr) = hub_with_attribute(true);
        let log = record(&hub);
        attr.set(42i32, ChangeMode::Default).unwrap();
        let events = log.borrow();
        assert_eq!(events[0].value, AttributeValue::Int(42));
        assert_eq!(events[0].attribute_id, "Count");
        assert_eq!(events[0].index, 3);
        assert!(events[0].replicate);
    }
}
