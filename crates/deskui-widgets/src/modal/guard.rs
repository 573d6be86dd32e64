#![forbid(unsafe_code)]

//! Scoped dialog sessions.

use super::trap::{DialogId, FocusTrap};

/// RAII guard for one modal session.
///
/// Dropping the guard closes the session it was created for, and only that
/// one: if the session already ended and another opened since, the newer
/// session is left alone.
#[must_use = "dropping a DialogGuard closes its dialog immediately"]
#[derive(Debug)]
pub struct DialogGuard {
    trap: FocusTrap,
    id: Option<DialogId>,
}

impl DialogGuard {
    pub(crate) fn new(trap: FocusTrap, id: DialogId) -> Self {
        Self { trap, id: Some(id) }
    }

    /// The session this guard owns.
    #[must_use]
    pub fn id(&self) -> Option<DialogId> {
        self.id
    }

    /// Whether the owned session is still the active one.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.id.is_some() && self.trap.active_id() == self.id
    }

    /// Close now. Returns `false` if the session had already ended.
    pub fn close(mut self) -> bool {
        self.id
            .take()
            .is_some_and(|id| self.trap.close_id(id))
    }

    /// Keep the session open after the guard is gone.
    pub fn detach(mut self) -> Option<DialogId> {
        self.id.take()
    }
}

impl Drop for DialogGuard {
    fn drop(&mut self) {
        if let Some(id) = self.id.take() {
            self.trap.close_id(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modal::ModalOptions;
    use deskui_core::{ElementId, Environment};
    use deskui_harness::HeadlessEnvironment;

    fn setup() -> (std::rc::Rc<HeadlessEnvironment>, FocusTrap) {
        let env = HeadlessEnvironment::shared();
        env.insert(1, None, true);
        env.insert(10, None, false);
        env.insert(11, Some(10), true);
        env.focus(ElementId::new(1));
        let trap = FocusTrap::new(env.clone());
        (env, trap)
    }

    #[test]
    fn drop_closes_session() {
        let (env, trap) = setup();
        {
            let guard = trap
                .open_scoped(ElementId::new(10), ModalOptions::new())
                .unwrap();
            assert!(guard.is_active());
            assert!(trap.is_open());
        }
        assert!(!trap.is_open());
        assert_eq!(env.focused(), Some(ElementId::new(1)));
        assert_eq!(env.listener_count(), 0);
    }

    #[test]
    fn stale_guard_leaves_newer_session() {
        let (_env, trap) = setup();
        let guard = trap
            .open_scoped(ElementId::new(10), ModalOptions::new())
            .unwrap();
        trap.close();
        let newer = trap.open(ElementId::new(10), ModalOptions::new()).unwrap();
        assert!(!guard.is_active());
        drop(guard);
        assert_eq!(trap.active_id(), Some(newer));
    }

    #[test]
    fn explicit_close_reports_outcome() {
        let (_env, trap) = setup();
        let guard = trap
            .open_scoped(ElementId::new(10), ModalOptions::new())
            .unwrap();
        assert!(guard.close());
        let guard = trap
            .open_scoped(ElementId::new(10), ModalOptions::new())
            .unwrap();
        trap.close();
        assert!(!guard.close());
    }

    #[test]
    fn detach_keeps_session_open() {
        let (_env, trap) = setup();
        let guard = trap
            .open_scoped(ElementId::new(10), ModalOptions::new())
            .unwrap();
        let id = guard.detach();
        assert_eq!(trap.active_id(), id);
    }

    #[test]
    fn open_scoped_propagates_rejection() {
        let (_env, trap) = setup();
        let _first = trap
            .open_scoped(ElementId::new(10), ModalOptions::new())
            .unwrap();
        assert!(
            trap.open_scoped(ElementId::new(10), ModalOptions::new())
                .is_err()
        );
        assert!(trap.is_open());
    }
}
