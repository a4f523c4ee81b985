/*
 * Container bookkeeping: one record per logical container, keyed by the
 * native handle in an explicit registry. The registry owns every state
 * transition (parenting, visibility, destruction) and returns the native
 * operations each transition requires as a list of `HostOp`s; the Win32 side
 * applies them only after the registry borrow has ended, because several of
 * the underlying calls re-enter the window procedure synchronously.
 *
 * The initial parent deliberately has no record: several routing rules key
 * off "record exists", and end-session arbitration must happen exactly once,
 * at the one window without a record.
 */

use std::collections::HashMap;

use crate::error::{PlatformError, Result};
use crate::sizing::{Sizing, ZOrderSlot};
use crate::types::{HostHandle, Rect};

/// Per-container state. The native handle is the registry key; it is created
/// once and destroyed exactly once, so the record never stores a second copy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContainerRecord {
    /// Logical parent container, used only to propagate re-layout requests.
    /// Ownership of the native window is never derived from this link.
    pub parent: Option<HostHandle>,
    /// Set by an explicit hide, cleared on show. Ancestor layouts use this to
    /// decide whether the container counts among visible siblings.
    pub hidden: bool,
}

/// A native operation a state transition asks the platform layer to perform.
/// Ops are applied in order, outside any registry borrow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostOp {
    /// Move the child under a new native parent window.
    Reparent {
        child: HostHandle,
        new_parent: HostHandle,
    },
    SetShown {
        handle: HostHandle,
        shown: bool,
    },
    DestroyWindow {
        handle: HostHandle,
    },
    /// Ask the given container to re-run its child layout.
    RequestLayout {
        handle: HostHandle,
    },
}

#[derive(Debug)]
pub struct ContainerRegistry {
    initial_parent: HostHandle,
    records: HashMap<HostHandle, ContainerRecord>,
}

impl ContainerRegistry {
    pub fn new(initial_parent: HostHandle) -> Self {
        Self {
            initial_parent,
            records: HashMap::new(),
        }
    }

    /// The disabled, invisible top-level window that fosters every container
    /// not yet attached to a real parent.
    pub fn initial_parent(&self) -> HostHandle {
        self.initial_parent
    }

    pub fn contains(&self, handle: HostHandle) -> bool {
        self.records.contains_key(&handle)
    }

    pub fn record(&self, handle: HostHandle) -> Option<&ContainerRecord> {
        self.records.get(&handle)
    }

    pub fn insert(&mut self, handle: HostHandle) -> Result<()> {
        if self.records.contains_key(&handle) {
            log::warn!("Container: registry already has a record for {handle}");
            return Err(PlatformError::OperationFailed(format!(
                "container record for {handle} already exists"
            )));
        }
        self.records.insert(handle, ContainerRecord::default());
        Ok(())
    }

    /// Drops the record for a window that is going away (or is already gone).
    /// Safe to call for handles that never had a record.
    pub fn remove(&mut self, handle: HostHandle) -> Option<ContainerRecord> {
        self.records.remove(&handle)
    }

    pub fn is_visible(&self, handle: HostHandle) -> Result<bool> {
        let record = self.records.get(&handle).ok_or_else(|| {
            PlatformError::InvalidHandle(format!("no container record for {handle}"))
        })?;
        Ok(!record.hidden)
    }

    /*
     * Destroys a container. Destroying a container that still has a parent is
     * a bug in the caller's layout bookkeeping: the operation is refused, no
     * native op is emitted, and the record is retained.
     * [PH-ContainerContractV1] The parent link must be severed before destruction.
     */
    pub fn destroy(&mut self, handle: HostHandle) -> Result<Vec<HostOp>> {
        let record = self.records.get(&handle).ok_or_else(|| {
            PlatformError::InvalidHandle(format!("no container record for {handle}"))
        })?;
        if record.parent.is_some() {
            log::error!("Container: attempt to destroy container {handle} while it has a parent");
            return Err(PlatformError::ContractViolation(format!(
                "attempt to destroy container {handle} while it has a parent"
            )));
        }
        self.records.remove(&handle);
        Ok(vec![HostOp::DestroyWindow { handle }])
    }

    /*
     * Reattaches a container to a new logical parent, or back to the initial
     * parent when `new_parent` is `None`. Both the old and the new parent are
     * asked to re-run their layout so sibling geometry stays consistent.
     */
    pub fn set_parent(
        &mut self,
        handle: HostHandle,
        new_parent: Option<HostHandle>,
    ) -> Result<Vec<HostOp>> {
        let initial_parent = self.initial_parent;
        let record = self.records.get_mut(&handle).ok_or_else(|| {
            PlatformError::InvalidHandle(format!("no container record for {handle}"))
        })?;
        let old_parent = record.parent;
        record.parent = new_parent;

        let mut ops = vec![HostOp::Reparent {
            child: handle,
            new_parent: new_parent.unwrap_or(initial_parent),
        }];
        if let Some(old) = old_parent {
            ops.push(HostOp::RequestLayout { handle: old });
        }
        if let Some(new) = new_parent {
            ops.push(HostOp::RequestLayout { handle: new });
        }
        Ok(ops)
    }

    /// Shows or hides a container, then notifies its parent (if any) to
    /// re-run layout, since hidden containers don't count in boxes and grids.
    pub fn set_hidden(&mut self, handle: HostHandle, hidden: bool) -> Result<Vec<HostOp>> {
        let record = self.records.get_mut(&handle).ok_or_else(|| {
            PlatformError::InvalidHandle(format!("no container record for {handle}"))
        })?;
        record.hidden = hidden;

        let mut ops = vec![HostOp::SetShown {
            handle,
            shown: !hidden,
        }];
        if let Some(parent) = record.parent {
            ops.push(HostOp::RequestLayout { handle: parent });
        }
        Ok(ops)
    }
}

/*
 * Positions one child during a layout pass: move it into `bounds` directly
 * after the current z-order cursor, advance the cursor to the child, then
 * trigger the child's own nested layout. Called by stacking/grid layouts for
 * each sibling in layout order, which is what chains z-order (and therefore
 * tab order) to match.
 */
pub fn position_child_with(
    sizing: &mut Sizing,
    handle: HostHandle,
    bounds: Rect,
    move_native: impl FnOnce(HostHandle, ZOrderSlot, Rect) -> Result<()>,
    request_layout: impl FnOnce(HostHandle),
) {
    if let Err(err) = move_native(handle, sizing.insert_after, bounds) {
        log::error!("Container: error moving container {handle} into {bounds:?}: {err}");
    }
    sizing.insert_after = ZOrderSlot::After(handle);
    request_layout(handle);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sizing::BaseUnits;
    use std::cell::RefCell;

    const INITIAL_PARENT: HostHandle = HostHandle::new(0x1000);

    fn registry_with(handles: &[HostHandle]) -> ContainerRegistry {
        let mut registry = ContainerRegistry::new(INITIAL_PARENT);
        for &handle in handles {
            registry.insert(handle).unwrap();
        }
        registry
    }

    #[test]
    fn duplicate_insert_is_rejected() {
        let handle = HostHandle::new(0x10);
        let mut registry = registry_with(&[handle]);
        assert!(registry.insert(handle).is_err());
    }

    #[test]
    // [PH-ContainerContractV1] A parented container must never be destroyed.
    fn destroy_with_parent_is_a_contract_violation_and_keeps_the_window() {
        let handle = HostHandle::new(0x10);
        let parent = HostHandle::new(0x20);
        let mut registry = registry_with(&[handle, parent]);
        registry.set_parent(handle, Some(parent)).unwrap();

        let result = registry.destroy(handle);

        assert!(matches!(result, Err(PlatformError::ContractViolation(_))));
        assert!(registry.contains(handle), "record must be retained");
    }

    #[test]
    fn destroy_without_parent_emits_exactly_one_native_destroy() {
        let handle = HostHandle::new(0x10);
        let mut registry = registry_with(&[handle]);

        let ops = registry.destroy(handle).unwrap();

        assert_eq!(ops, vec![HostOp::DestroyWindow { handle }]);
        assert!(!registry.contains(handle));
        // A second destroy has nothing to act on.
        assert!(matches!(
            registry.destroy(handle),
            Err(PlatformError::InvalidHandle(_))
        ));
    }

    #[test]
    fn visibility_defaults_to_visible_and_follows_hide_show() {
        let handle = HostHandle::new(0x10);
        let parent = HostHandle::new(0x20);
        let mut registry = registry_with(&[handle, parent]);
        registry.set_parent(handle, Some(parent)).unwrap();

        assert!(registry.is_visible(handle).unwrap());

        let hide_ops = registry.set_hidden(handle, true).unwrap();
        assert!(!registry.is_visible(handle).unwrap());
        assert_eq!(
            hide_ops,
            vec![
                HostOp::SetShown {
                    handle,
                    shown: false
                },
                HostOp::RequestLayout { handle: parent },
            ]
        );

        let show_ops = registry.set_hidden(handle, false).unwrap();
        assert!(registry.is_visible(handle).unwrap());
        assert_eq!(
            show_ops,
            vec![
                HostOp::SetShown {
                    handle,
                    shown: true
                },
                HostOp::RequestLayout { handle: parent },
            ]
        );
    }

    #[test]
    fn hide_without_parent_requests_no_layout() {
        let handle = HostHandle::new(0x10);
        let mut registry = registry_with(&[handle]);

        let ops = registry.set_hidden(handle, true).unwrap();
        assert_eq!(
            ops,
            vec![HostOp::SetShown {
                handle,
                shown: false
            }]
        );
    }

    #[test]
    fn detaching_reparents_to_the_initial_parent_and_notifies_old_parent() {
        let handle = HostHandle::new(0x10);
        let parent = HostHandle::new(0x20);
        let mut registry = registry_with(&[handle, parent]);
        registry.set_parent(handle, Some(parent)).unwrap();

        let ops = registry.set_parent(handle, None).unwrap();

        assert_eq!(
            ops,
            vec![
                HostOp::Reparent {
                    child: handle,
                    new_parent: INITIAL_PARENT
                },
                HostOp::RequestLayout { handle: parent },
            ]
        );
        assert_eq!(registry.record(handle).unwrap().parent, None);
    }

    #[test]
    fn attaching_notifies_both_old_and_new_parent() {
        let handle = HostHandle::new(0x10);
        let old_parent = HostHandle::new(0x20);
        let new_parent = HostHandle::new(0x30);
        let mut registry = registry_with(&[handle, old_parent, new_parent]);
        registry.set_parent(handle, Some(old_parent)).unwrap();

        let ops = registry.set_parent(handle, Some(new_parent)).unwrap();

        assert_eq!(
            ops,
            vec![
                HostOp::Reparent {
                    child: handle,
                    new_parent
                },
                HostOp::RequestLayout { handle: old_parent },
                HostOp::RequestLayout { handle: new_parent },
            ]
        );
        assert_eq!(registry.record(handle).unwrap().parent, Some(new_parent));
    }

    #[test]
    fn positioning_chains_the_z_order_cursor_in_layout_order() {
        let children = [
            HostHandle::new(0x10),
            HostHandle::new(0x20),
            HostHandle::new(0x30),
        ];
        let base = BaseUnits {
            x: 7,
            y: 16,
            internal_leading: 3,
        };
        let mut sizing = Sizing::new(base);
        let observed = RefCell::new(Vec::new());
        let relayouts = RefCell::new(Vec::new());

        for (i, &child) in children.iter().enumerate() {
            let bounds = Rect::new(0, i as i32 * 20, 100, i as i32 * 20 + 20);
            position_child_with(
                &mut sizing,
                child,
                bounds,
                |h, slot, _| {
                    observed.borrow_mut().push((h, slot));
                    Ok(())
                },
                |h| relayouts.borrow_mut().push(h),
            );
        }

        // First child goes to the top (first tab stop); each sibling inserts
        // after the previously positioned one.
        assert_eq!(
            *observed.borrow(),
            vec![
                (children[0], ZOrderSlot::Top),
                (children[1], ZOrderSlot::After(children[0])),
                (children[2], ZOrderSlot::After(children[1])),
            ]
        );
        // The cursor ends on the last-positioned child.
        assert_eq!(sizing.insert_after, ZOrderSlot::After(children[2]));
        // Every positioned child was asked to re-run its own nested layout.
        assert_eq!(*relayouts.borrow(), children.to_vec());
    }

    #[test]
    fn move_failure_still_advances_the_cursor() {
        let child = HostHandle::new(0x10);
        let base = BaseUnits {
            x: 7,
            y: 16,
            internal_leading: 3,
        };
        let mut sizing = Sizing::new(base);
        position_child_with(
            &mut sizing,
            child,
            Rect::new(0, 0, 10, 10),
            |_, _, _| Err(PlatformError::OperationFailed("move failed".into())),
            |_| {},
        );
        assert_eq!(sizing.insert_after, ZOrderSlot::After(child));
    }
}
