#![forbid(unsafe_code)]

//! Tab containment over a focus ring.

use deskui_core::ElementId;

/// What a tab press should do while a modal is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabOutcome {
    /// Let default traversal run.
    Default,
    /// Suppress default traversal and focus this ring entry.
    MoveTo(ElementId),
    /// Suppress default traversal and keep focus on the modal root.
    Hold,
}

/// Decide how a tab press is contained within `ring`.
///
/// `ring` is the modal's focusable descendants in document order. Wrapping
/// only happens at the ends; a press in the middle of the ring is left to
/// default traversal. Focus outside the ring (typically the modal root right
/// after opening) enters the ring at the near end for the direction.
#[must_use]
pub fn contain_tab(ring: &[ElementId], focused: Option<ElementId>, backward: bool) -> TabOutcome {
    let (Some(&first), Some(&last)) = (ring.first(), ring.last()) else {
        return TabOutcome::Hold;
    };
    let inside = focused.filter(|f| ring.contains(f));
    match (inside, backward) {
        (None, false) => TabOutcome::MoveTo(first),
        (None, true) => TabOutcome::MoveTo(last),
        (Some(at), false) if at == last => TabOutcome::MoveTo(first),
        (Some(at), true) if at == first => TabOutcome::MoveTo(last),
        _ => TabOutcome::Default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn ids(raw: &[u64]) -> Vec<ElementId> {
        raw.iter().copied().map(ElementId::new).collect()
    }

    #[test]
    fn forward_wraps_from_last() {
        let ring = ids(&[1, 2, 3]);
        assert_eq!(
            contain_tab(&ring, Some(ElementId::new(3)), false),
            TabOutcome::MoveTo(ElementId::new(1))
        );
    }

    #[test]
    fn backward_wraps_from_first() {
        let ring = ids(&[1, 2, 3]);
        assert_eq!(
            contain_tab(&ring, Some(ElementId::new(1)), true),
            TabOutcome::MoveTo(ElementId::new(3))
        );
    }

    #[test]
    fn middle_uses_default() {
        let ring = ids(&[1, 2, 3]);
        assert_eq!(
            contain_tab(&ring, Some(ElementId::new(2)), false),
            TabOutcome::Default
        );
        assert_eq!(
            contain_tab(&ring, Some(ElementId::new(2)), true),
            TabOutcome::Default
        );
    }

    #[test]
    fn outside_enters_ring() {
        let ring = ids(&[1, 2, 3]);
        let root = Some(ElementId::new(99));
        assert_eq!(
            contain_tab(&ring, root, false),
            TabOutcome::MoveTo(ElementId::new(1))
        );
        assert_eq!(
            contain_tab(&ring, root, true),
            TabOutcome::MoveTo(ElementId::new(3))
        );
        assert_eq!(
            contain_tab(&ring, None, false),
            TabOutcome::MoveTo(ElementId::new(1))
        );
    }

    #[test]
    fn empty_ring_holds() {
        assert_eq!(contain_tab(&[], Some(ElementId::new(1)), false), TabOutcome::Hold);
        assert_eq!(contain_tab(&[], None, true), TabOutcome::Hold);
    }

    #[test]
    fn single_entry_stays_put() {
        let ring = ids(&[7]);
        let only = ElementId::new(7);
        assert_eq!(contain_tab(&ring, Some(only), false), TabOutcome::MoveTo(only));
        assert_eq!(contain_tab(&ring, Some(only), true), TabOutcome::MoveTo(only));
    }

    proptest! {
        #[test]
        fn never_targets_outside_ring(
            ring in proptest::collection::vec(0u64..50, 0..8),
            focused in proptest::option::of(0u64..60),
            backward in any::<bool>(),
        ) {
            let ring = ids(&ring);
            match contain_tab(&ring, focused.map(ElementId::new), backward) {
                TabOutcome::MoveTo(target) => prop_assert!(ring.contains(&target)),
                TabOutcome::Hold => prop_assert!(ring.is_empty()),
                TabOutcome::Default => {
                    // Default traversal only runs from inside the ring.
                    let f = focused.map(ElementId::new);
                    prop_assert!(f.is_some_and(|f| ring.contains(&f)));
                }
            }
        }
    }
}
