#![forbid(unsafe_code)]

//! Notification broker (toasts).
//!
//! The [`ToastBroker`] decouples code that announces something ("ticket
//! saved", "network error") from whatever renders the announcement. It keeps
//! an ordered live set of [`ToastItem`]s, fans every change out to
//! subscribers, and evicts items when their auto-dismiss timer fires.
//!
//! # Invariants
//!
//! 1. Live items are kept in publish order; removal never reorders the rest.
//! 2. An id appears at most once in the live set.
//! 3. Every change to the live set, including an item starting its exit
//!    transition, produces exactly one notification carrying the full ordered
//!    list.
//! 4. When a notification ends, every subscriber has last seen the current
//!    live set.
//! 5. Removal is idempotent: dismissing an unknown or already-removed id is a
//!    no-op and notifies nobody.
//! 6. `dismiss` cancels the item's outstanding timers, so a user dismissal
//!    racing the auto-dismiss timer resolves to a single removal whichever
//!    runs first.
//! 7. A duration of zero never schedules a timer.
//!
//! # Failure Modes
//!
//! | Scenario | Behavior |
//! |----------|----------|
//! | `dismiss` unknown id | returns `false`, no notification |
//! | Timer fires after manual dismissal | cancelled; if already queued, no-op |
//! | Broker dropped with pending timers | timers cancelled |
//! | Subscriber publishes/dismisses during notification | allowed; the running notification delivers the new list to every subscriber after the current callback returns |

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};
use std::time::Duration;

use deskui_core::{Environment, TimerId};
use indexmap::IndexMap;

use crate::config::ToastConfig;
use crate::reactive::{SubscriberRegistry, Subscription};

/// Severity of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ToastKind {
    Success,
    Error,
    #[default]
    Info,
    Warning,
}

impl ToastKind {
    /// Politeness used when a publish call does not specify one.
    #[must_use]
    pub const fn default_politeness(self) -> Politeness {
        match self {
            Self::Error => Politeness::Alert,
            _ => Politeness::Status,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
            Self::Info => "info",
            Self::Warning => "warning",
        }
    }
}

/// How assertive assistive technology should be when announcing a toast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Politeness {
    /// Announce at the next pause.
    #[default]
    Status,
    /// Interrupt and announce immediately.
    Alert,
}

impl Politeness {
    /// ARIA role carrying this politeness.
    #[must_use]
    pub const fn role(self) -> &'static str {
        match self {
            Self::Status => "status",
            Self::Alert => "alert",
        }
    }
}

/// Identity of a published toast, unique per broker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ToastId(u64);

impl ToastId {
    #[inline]
    #[must_use]
    pub const fn id(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ToastId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "toast-{}", self.0)
    }
}

/// A published notification. Only the exit flag changes after publishing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToastItem {
    id: ToastId,
    message: String,
    kind: ToastKind,
    politeness: Politeness,
    duration: Duration,
    exiting: bool,
}

impl ToastItem {
    #[must_use]
    pub fn id(&self) -> ToastId {
        self.id
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[must_use]
    pub fn kind(&self) -> ToastKind {
        self.kind
    }

    #[must_use]
    pub fn politeness(&self) -> Politeness {
        self.politeness
    }

    /// Auto-dismiss delay. Zero means the toast stays until dismissed.
    #[must_use]
    pub fn duration(&self) -> Duration {
        self.duration
    }

    #[must_use]
    pub fn auto_dismisses(&self) -> bool {
        !self.duration.is_zero()
    }

    /// Running its exit transition; removal follows.
    #[must_use]
    pub fn is_exiting(&self) -> bool {
        self.exiting
    }
}

/// Parameters for [`ToastBroker::publish`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToastOptions {
    message: String,
    kind: Option<ToastKind>,
    duration: Option<Duration>,
    politeness: Option<Politeness>,
}

impl ToastOptions {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: None,
            duration: None,
            politeness: None,
        }
    }

    #[must_use]
    pub fn kind(mut self, kind: ToastKind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Auto-dismiss delay. `Duration::ZERO` disables auto-dismissal.
    #[must_use]
    pub fn duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }

    #[must_use]
    pub fn duration_ms(self, ms: u64) -> Self {
        self.duration(Duration::from_millis(ms))
    }

    /// Keep the toast until it is dismissed explicitly.
    #[must_use]
    pub fn sticky(self) -> Self {
        self.duration(Duration::ZERO)
    }

    #[must_use]
    pub fn politeness(mut self, politeness: Politeness) -> Self {
        self.politeness = Some(politeness);
        self
    }
}

impl From<&str> for ToastOptions {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

impl From<String> for ToastOptions {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

struct LiveToast {
    item: ToastItem,
    expiry: Option<TimerId>,
    exit: Option<TimerId>,
}

impl LiveToast {
    fn timers(&self) -> impl Iterator<Item = TimerId> {
        self.expiry.into_iter().chain(self.exit)
    }
}

struct BrokerState {
    live: IndexMap<ToastId, LiveToast>,
    next_id: u64,
    reduced_motion: bool,
}

struct BrokerShared {
    env: Rc<dyn Environment>,
    config: ToastConfig,
    state: RefCell<BrokerState>,
    subscribers: SubscriberRegistry<[ToastItem]>,
}

impl Drop for BrokerShared {
    fn drop(&mut self) {
        let state = self.state.get_mut();
        for toast in state.live.values() {
            for timer in toast.timers() {
                self.env.cancel(timer);
            }
        }
    }
}

/// Publish/subscribe broker for transient notifications.
///
/// Cloning yields another handle to the same broker. Construct one per
/// application and hand clones to every screen that publishes.
#[derive(Clone)]
pub struct ToastBroker {
    shared: Rc<BrokerShared>,
}

impl fmt::Debug for ToastBroker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.shared.state.borrow();
        f.debug_struct("ToastBroker")
            .field("live", &state.live.len())
            .field("reduced_motion", &state.reduced_motion)
            .field("subscribers", &self.shared.subscribers.len())
            .finish()
    }
}

impl ToastBroker {
    /// Create a broker scheduling its timers on `env`.
    #[must_use]
    pub fn new(env: Rc<dyn Environment>, config: ToastConfig) -> Self {
        Self {
            shared: Rc::new(BrokerShared {
                env,
                config,
                state: RefCell::new(BrokerState {
                    live: IndexMap::new(),
                    next_id: 1,
                    reduced_motion: false,
                }),
                subscribers: SubscriberRegistry::new(),
            }),
        }
    }

    // --- Publishing ---

    /// Append a toast, notify subscribers, and arm its auto-dismiss timer.
    pub fn publish(&self, options: impl Into<ToastOptions>) -> ToastId {
        let options = options.into();
        let kind = options.kind.unwrap_or_default();
        let duration = options
            .duration
            .unwrap_or_else(|| self.shared.config.default_duration());

        let id = {
            let mut state = self.shared.state.borrow_mut();
            let id = ToastId(state.next_id);
            state.next_id += 1;
            id
        };
        let item = ToastItem {
            id,
            message: options.message,
            kind,
            politeness: options.politeness.unwrap_or(kind.default_politeness()),
            duration,
            exiting: false,
        };
        let expiry = item
            .auto_dismisses()
            .then(|| self.schedule(id, duration, TimerPurpose::Expiry));

        tracing::debug!(
            %id,
            kind = kind.as_str(),
            politeness = item.politeness.role(),
            duration_ms = duration.as_millis() as u64,
            "toast published"
        );
        self.shared.state.borrow_mut().live.insert(
            id,
            LiveToast {
                item,
                expiry,
                exit: None,
            },
        );
        self.notify();
        id
    }

    pub fn success(&self, message: impl Into<String>) -> ToastId {
        self.publish(ToastOptions::new(message).kind(ToastKind::Success))
    }

    pub fn error(&self, message: impl Into<String>) -> ToastId {
        self.publish(ToastOptions::new(message).kind(ToastKind::Error))
    }

    pub fn info(&self, message: impl Into<String>) -> ToastId {
        self.publish(ToastOptions::new(message).kind(ToastKind::Info))
    }

    pub fn warning(&self, message: impl Into<String>) -> ToastId {
        self.publish(ToastOptions::new(message).kind(ToastKind::Warning))
    }

    // --- Dismissal ---

    /// Remove a toast immediately and cancel its timers.
    ///
    /// Returns `false` if the id is not live; nothing is notified then.
    pub fn dismiss(&self, id: ToastId) -> bool {
        let removed = self.shared.state.borrow_mut().live.shift_remove(&id);
        let Some(toast) = removed else {
            tracing::trace!(%id, "dismiss of unknown toast ignored");
            return false;
        };
        for timer in toast.timers() {
            self.shared.env.cancel(timer);
        }
        tracing::debug!(%id, "toast dismissed");
        self.notify();
        true
    }

    /// Start the exit transition, then remove the toast once it completes.
    ///
    /// With reduced motion (or a zero exit delay) this is [`dismiss`]. A toast
    /// already exiting is left alone. Returns `false` if the id is not live.
    ///
    /// [`dismiss`]: ToastBroker::dismiss
    pub fn request_dismiss(&self, id: ToastId) -> bool {
        let delay = self.exit_delay();
        if delay.is_zero() {
            return self.dismiss(id);
        }

        let expiry = {
            let mut state = self.shared.state.borrow_mut();
            let Some(toast) = state.live.get_mut(&id) else {
                return false;
            };
            if toast.item.exiting {
                return true;
            }
            toast.item.exiting = true;
            toast.expiry.take()
        };
        if let Some(timer) = expiry {
            self.shared.env.cancel(timer);
        }
        let exit = self.schedule(id, delay, TimerPurpose::Exit);
        if let Some(toast) = self.shared.state.borrow_mut().live.get_mut(&id) {
            toast.exit = Some(exit);
        }
        tracing::debug!(%id, delay_ms = delay.as_millis() as u64, "toast exiting");
        self.notify();
        true
    }

    /// Remove every toast. Notifies once if anything was removed.
    pub fn clear(&self) -> usize {
        let drained: Vec<LiveToast> = {
            let mut state = self.shared.state.borrow_mut();
            state.live.drain(..).map(|(_, toast)| toast).collect()
        };
        if drained.is_empty() {
            return 0;
        }
        for timer in drained.iter().flat_map(LiveToast::timers) {
            self.shared.env.cancel(timer);
        }
        tracing::debug!(count = drained.len(), "toasts cleared");
        self.notify();
        drained.len()
    }

    // --- Motion ---

    /// Skip exit transitions while reduced motion is active.
    pub fn set_reduced_motion(&self, reduced: bool) {
        self.shared.state.borrow_mut().reduced_motion = reduced;
    }

    #[must_use]
    pub fn reduced_motion(&self) -> bool {
        self.shared.state.borrow().reduced_motion
    }

    /// Exit transition length currently in effect.
    #[must_use]
    pub fn exit_delay(&self) -> Duration {
        if self.reduced_motion() {
            Duration::ZERO
        } else {
            self.shared.config.exit_delay()
        }
    }

    // --- Queries ---

    /// Snapshot of the live set in publish order.
    #[must_use]
    pub fn toasts(&self) -> Vec<ToastItem> {
        self.shared
            .state
            .borrow()
            .live
            .values()
            .map(|t| t.item.clone())
            .collect()
    }

    #[must_use]
    pub fn get(&self, id: ToastId) -> Option<ToastItem> {
        self.shared
            .state
            .borrow()
            .live
            .get(&id)
            .map(|t| t.item.clone())
    }

    #[must_use]
    pub fn contains(&self, id: ToastId) -> bool {
        self.shared.state.borrow().live.contains_key(&id)
    }

    /// Whether the toast is running its exit transition.
    #[must_use]
    pub fn is_exiting(&self, id: ToastId) -> bool {
        self.shared
            .state
            .borrow()
            .live
            .get(&id)
            .is_some_and(|t| t.item.exiting)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.shared.state.borrow().live.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.shared.state.borrow().live.is_empty()
    }

    // --- Subscription ---

    /// Receive the full ordered live set on every change.
    pub fn subscribe(&self, listener: impl Fn(&[ToastItem]) + 'static) -> Subscription {
        self.shared.subscribers.subscribe(listener)
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.shared.subscribers.len()
    }

    fn notify(&self) {
        self.shared.subscribers.notify(|| self.toasts());
    }

    fn schedule(&self, id: ToastId, delay: Duration, purpose: TimerPurpose) -> TimerId {
        let weak: Weak<BrokerShared> = Rc::downgrade(&self.shared);
        self.shared.env.schedule(
            delay,
            Box::new(move || {
                let Some(shared) = weak.upgrade() else {
                    return;
                };
                tracing::trace!(%id, ?purpose, "toast timer fired");
                ToastBroker { shared }.dismiss(id);
            }),
        )
    }
}

#[derive(Debug, Clone, Copy)]
enum TimerPurpose {
    Expiry,
    Exit,
}

#[cfg(test)]
mod tests {
    use super::*;
    use deskui_harness::HeadlessEnvironment;
    use proptest::prelude::*;
    use std::cell::Cell;

    fn broker() -> (Rc<HeadlessEnvironment>, ToastBroker) {
        let env = HeadlessEnvironment::shared();
        let broker = ToastBroker::new(env.clone(), ToastConfig::default());
        (env, broker)
    }

    fn recorder(broker: &ToastBroker) -> (Rc<RefCell<Vec<Vec<ToastId>>>>, Subscription) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let l = Rc::clone(&log);
        let sub = broker.subscribe(move |items| {
            l.borrow_mut()
                .push(items.iter().map(ToastItem::id).collect());
        });
        (log, sub)
    }

    #[test]
    fn publish_defaults() {
        let (_env, broker) = broker();
        let id = broker.publish("Saved");
        let item = broker.get(id).unwrap();
        assert_eq!(item.message(), "Saved");
        assert_eq!(item.kind(), ToastKind::Info);
        assert_eq!(item.politeness(), Politeness::Status);
        assert_eq!(item.duration(), Duration::from_millis(5000));
    }

    #[test]
    fn error_defaults_to_alert() {
        let (_env, broker) = broker();
        let id = broker.error("Boom");
        assert_eq!(broker.get(id).unwrap().politeness(), Politeness::Alert);
    }

    #[test]
    fn explicit_politeness_wins() {
        let (_env, broker) = broker();
        let id = broker.publish(
            ToastOptions::new("quiet failure")
                .kind(ToastKind::Error)
                .politeness(Politeness::Status),
        );
        assert_eq!(broker.get(id).unwrap().politeness(), Politeness::Status);
    }

    #[test]
    fn ids_are_unique() {
        let (_env, broker) = broker();
        let a = broker.info("a");
        let b = broker.info("a");
        assert_ne!(a, b);
        assert_eq!(a.to_string(), "toast-1");
    }

    #[test]
    fn publish_notifies_full_list() {
        let (_env, broker) = broker();
        let (log, _sub) = recorder(&broker);
        let a = broker.info("a");
        let b = broker.info("b");
        assert_eq!(*log.borrow(), vec![vec![a], vec![a, b]]);
    }

    #[test]
    fn subscribe_does_not_replay() {
        let (_env, broker) = broker();
        broker.info("before");
        let (log, _sub) = recorder(&broker);
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn dismiss_preserves_order() {
        let (_env, broker) = broker();
        let (log, _sub) = recorder(&broker);
        let t1 = broker.info("1");
        let t2 = broker.info("2");
        let t3 = broker.info("3");
        assert!(broker.dismiss(t2));
        assert_eq!(log.borrow().last().unwrap(), &vec![t1, t3]);
        assert_eq!(
            broker.toasts().iter().map(ToastItem::id).collect::<Vec<_>>(),
            vec![t1, t3]
        );
    }

    #[test]
    fn dismiss_twice_notifies_once() {
        let (_env, broker) = broker();
        let id = broker.info("x");
        let (log, _sub) = recorder(&broker);
        assert!(broker.dismiss(id));
        assert!(!broker.dismiss(id));
        assert_eq!(log.borrow().len(), 1);
        assert!(broker.is_empty());
    }

    #[test]
    fn timer_expires_toast() {
        let (env, broker) = broker();
        let id = broker.publish(ToastOptions::new("x").duration_ms(100));
        env.advance_ms(99);
        assert!(broker.contains(id));
        env.advance_ms(1);
        assert!(!broker.contains(id));
    }

    #[test]
    fn manual_dismiss_cancels_timer() {
        let (env, broker) = broker();
        let id = broker.publish(ToastOptions::new("x").duration_ms(100));
        assert_eq!(env.pending_timers(), 1);
        broker.dismiss(id);
        assert_eq!(env.pending_timers(), 0);
        let (log, _sub) = recorder(&broker);
        env.advance_ms(500);
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn dismiss_after_expiry_is_noop() {
        let (env, broker) = broker();
        let id = broker.publish(ToastOptions::new("x").duration_ms(10));
        let (log, _sub) = recorder(&broker);
        env.advance_ms(10);
        assert!(!broker.dismiss(id));
        assert_eq!(log.borrow().len(), 1);
    }

    #[test]
    fn zero_duration_never_expires() {
        let (env, broker) = broker();
        let id = broker.publish(ToastOptions::new("sticky").sticky());
        assert_eq!(env.pending_timers(), 0);
        env.advance(Duration::from_secs(3600));
        assert!(broker.contains(id));
        assert!(broker.dismiss(id));
    }

    #[test]
    fn request_dismiss_runs_exit_transition() {
        let (env, broker) = broker();
        let (log, _sub) = recorder(&broker);
        let id = broker.info("x");
        let exiting = Rc::new(Cell::new(false));
        let e = Rc::clone(&exiting);
        let _flag = broker.subscribe(move |items| {
            e.set(items.iter().any(ToastItem::is_exiting));
        });
        assert!(broker.request_dismiss(id));
        assert!(broker.is_exiting(id));
        assert!(broker.get(id).unwrap().is_exiting());
        assert!(exiting.get());
        assert!(broker.contains(id));
        assert_eq!(log.borrow().len(), 2);

        // A second request while exiting changes nothing.
        assert!(broker.request_dismiss(id));
        assert_eq!(log.borrow().len(), 2);

        env.advance_ms(199);
        assert!(broker.contains(id));
        env.advance_ms(1);
        assert!(!broker.contains(id));
        assert_eq!(log.borrow().len(), 3);
        assert_eq!(env.pending_timers(), 0);
    }

    #[test]
    fn request_dismiss_with_reduced_motion_is_immediate() {
        let (env, broker) = broker();
        broker.set_reduced_motion(true);
        let id = broker.info("x");
        assert!(broker.request_dismiss(id));
        assert!(!broker.contains(id));
        assert_eq!(env.pending_timers(), 0);
    }

    #[test]
    fn dismiss_during_exit_cancels_exit_timer() {
        let (env, broker) = broker();
        let id = broker.info("x");
        broker.request_dismiss(id);
        assert!(broker.dismiss(id));
        assert_eq!(env.pending_timers(), 0);
    }

    #[test]
    fn request_dismiss_unknown_is_false() {
        let (_env, broker) = broker();
        let id = broker.info("x");
        broker.dismiss(id);
        assert!(!broker.request_dismiss(id));
    }

    #[test]
    fn clear_removes_all_with_one_notification() {
        let (env, broker) = broker();
        broker.info("a");
        broker.info("b");
        let (log, _sub) = recorder(&broker);
        assert_eq!(broker.clear(), 2);
        assert_eq!(log.borrow().len(), 1);
        assert_eq!(env.pending_timers(), 0);
        assert_eq!(broker.clear(), 0);
        assert_eq!(log.borrow().len(), 1);
    }

    #[test]
    fn unsubscribed_listener_is_silent() {
        let (_env, broker) = broker();
        let (log, sub) = recorder(&broker);
        broker.info("a");
        sub.unsubscribe();
        broker.info("b");
        assert_eq!(log.borrow().len(), 1);
        assert_eq!(broker.subscriber_count(), 0);
    }

    #[test]
    fn subscriber_may_dismiss_reentrantly() {
        let (_env, broker) = broker();
        let handle = broker.clone();
        let calls = Rc::new(Cell::new(0));
        let c = Rc::clone(&calls);
        let _sub = broker.subscribe(move |items| {
            c.set(c.get() + 1);
            if let Some(first) = items.iter().find(|t| t.message() == "evict me") {
                handle.dismiss(first.id());
            }
        });
        broker.info("evict me");
        assert!(broker.is_empty());
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn later_subscriber_sees_reentrant_dismissal() {
        let (_env, broker) = broker();
        let handle = broker.clone();
        let _evict = broker.subscribe(move |items| {
            if let Some(first) = items.iter().find(|t| t.message() == "evict me") {
                handle.dismiss(first.id());
            }
        });
        let (log, _sub) = recorder(&broker);

        let kept = broker.info("keep");
        broker.info("evict me");
        assert_eq!(broker.toasts().iter().map(ToastItem::id).collect::<Vec<_>>(), vec![kept]);
        assert_eq!(log.borrow().last(), Some(&vec![kept]));
        // Each change reached the recorder once; the evicted list never did.
        assert_eq!(*log.borrow(), vec![vec![kept], vec![kept]]);
    }

    #[test]
    fn reentrant_publish_is_delivered_to_everyone() {
        let (_env, broker) = broker();
        let handle = broker.clone();
        let _echo = broker.subscribe(move |items| {
            if items.len() == 1 && items[0].message() == "ping" {
                handle.info("pong");
            }
        });
        let (log, _sub) = recorder(&broker);

        let ping = broker.info("ping");
        let live: Vec<ToastId> = broker.toasts().iter().map(ToastItem::id).collect();
        assert_eq!(live.len(), 2);
        assert_eq!(live[0], ping);
        assert_eq!(log.borrow().last(), Some(&live));
        assert_eq!(log.borrow().len(), 1);
    }

    #[test]
    fn dropping_broker_cancels_timers() {
        let (env, broker) = broker();
        broker.info("a");
        broker.info("b");
        assert_eq!(env.pending_timers(), 2);
        drop(broker);
        assert_eq!(env.pending_timers(), 0);
    }

    #[derive(Debug, Clone)]
    enum Op {
        Publish,
        Dismiss(usize),
        Advance(u64),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            Just(Op::Publish),
            (0usize..16).prop_map(Op::Dismiss),
            (0u64..400).prop_map(Op::Advance),
        ]
    }

    proptest! {
        #[test]
        fn live_set_matches_publish_order(ops in proptest::collection::vec(op(), 1..60)) {
            let env = HeadlessEnvironment::shared();
            let broker = ToastBroker::new(env.clone(), ToastConfig {
                default_duration_ms: 250,
                exit_delay_ms: 0,
            });
            let last = Rc::new(RefCell::new(Vec::new()));
            let l = Rc::clone(&last);
            let _sub = broker.subscribe(move |items| {
                *l.borrow_mut() = items.iter().map(ToastItem::id).collect::<Vec<_>>();
            });

            // Model: (id, expires_at) in publish order.
            let mut model: Vec<(ToastId, Duration)> = Vec::new();
            let mut published: Vec<ToastId> = Vec::new();
            for op in ops {
                match op {
                    Op::Publish => {
                        let id = broker.info("x");
                        model.push((id, env.now() + Duration::from_millis(250)));
                        published.push(id);
                    }
                    Op::Dismiss(i) => {
                        if let Some(&id) = published.get(i) {
                            let was_live = model.iter().any(|(m, _)| *m == id);
                            prop_assert_eq!(broker.dismiss(id), was_live);
                            model.retain(|(m, _)| *m != id);
                        }
                    }
                    Op::Advance(ms) => {
                        env.advance_ms(ms);
                        let now = env.now();
                        model.retain(|(_, at)| *at > now);
                    }
                }
                let expected: Vec<ToastId> = model.iter().map(|(id, _)| *id).collect();
                let actual: Vec<ToastId> = broker.toasts().iter().map(ToastItem::id).collect();
                prop_assert_eq!(&actual, &expected);
                if !published.is_empty() {
                    prop_assert_eq!(&*last.borrow(), &expected);
                }
            }
        }
    }
}
