#![forbid(unsafe_code)]

//! Toast presentation.
//!
//! [`ToastView`] carries everything a renderer needs to present one
//! notification accessibly. [`ToastContainer`] keeps the current list of
//! views in sync with a [`ToastBroker`] and routes close clicks back to it.

use std::cell::RefCell;
use std::rc::Rc;

use deskui_runtime::{Politeness, Subscription, ToastBroker, ToastId, ToastItem, ToastKind};

/// Accessible label of the container region.
pub const CONTAINER_LABEL: &str = "Notifications";
/// Accessible label of each toast's close button.
pub const CLOSE_LABEL: &str = "Close notification";

/// Presentation of one toast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToastView {
    pub id: ToastId,
    pub message: String,
    pub kind: ToastKind,
    pub politeness: Politeness,
    /// Running its exit transition.
    pub exiting: bool,
}

impl ToastView {
    #[must_use]
    pub fn new(item: &ToastItem) -> Self {
        Self {
            id: item.id(),
            message: item.message().to_owned(),
            kind: item.kind(),
            politeness: item.politeness(),
            exiting: item.is_exiting(),
        }
    }

    /// Human-readable kind, announced before the message.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self.kind {
            ToastKind::Success => "Success",
            ToastKind::Error => "Error",
            ToastKind::Warning => "Warning",
            ToastKind::Info => "Information",
        }
    }

    /// Decorative glyph; hidden from assistive technology.
    #[must_use]
    pub const fn icon(&self) -> &'static str {
        match self.kind {
            ToastKind::Success => "✓",
            ToastKind::Error => "✕",
            ToastKind::Warning => "⚠",
            ToastKind::Info => "ℹ",
        }
    }

    #[must_use]
    pub const fn role(&self) -> &'static str {
        self.politeness.role()
    }

    /// `aria-live` value: errors interrupt, everything else waits.
    #[must_use]
    pub fn aria_live(&self) -> &'static str {
        if self.kind == ToastKind::Error {
            "assertive"
        } else {
            "polite"
        }
    }

    /// Text a screen reader announces.
    #[must_use]
    pub fn announcement(&self) -> String {
        format!("{}: {}", self.label(), self.message)
    }

    #[must_use]
    pub fn css_class(&self) -> String {
        let mut class = format!("toast toast-{}", self.kind.as_str());
        if self.exiting {
            class.push_str(" toast-exiting");
        }
        class
    }
}

/// Live list of toast views bound to a broker.
///
/// The subscription ends when the container is dropped.
#[derive(Debug)]
pub struct ToastContainer {
    broker: ToastBroker,
    views: Rc<RefCell<Vec<ToastView>>>,
    _subscription: Subscription,
}

impl ToastContainer {
    #[must_use]
    pub fn new(broker: ToastBroker) -> Self {
        let views = Rc::new(RefCell::new(project(&broker.toasts())));
        let sink = Rc::clone(&views);
        let subscription = broker.subscribe(move |items| {
            *sink.borrow_mut() = project(items);
        });
        Self {
            broker,
            views,
            _subscription: subscription,
        }
    }

    /// Current views in publish order.
    #[must_use]
    pub fn views(&self) -> Vec<ToastView> {
        self.views.borrow().clone()
    }

    /// Nothing is rendered when there are no toasts.
    #[must_use]
    pub fn is_visible(&self) -> bool {
        !self.views.borrow().is_empty()
    }

    #[must_use]
    pub const fn aria_label(&self) -> &'static str {
        CONTAINER_LABEL
    }

    #[must_use]
    pub const fn close_label(&self) -> &'static str {
        CLOSE_LABEL
    }

    /// The user clicked a toast's close button.
    pub fn close(&self, id: ToastId) -> bool {
        self.broker.request_dismiss(id)
    }
}

fn project(items: &[ToastItem]) -> Vec<ToastView> {
    items.iter().map(ToastView::new).collect()
}
