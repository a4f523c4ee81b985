/*
 * Backdrop resolution logic: finding the window whose pixels actually sit
 * beneath a container, and aligning a pattern brush with them. Containers
 * draw nothing of their own and group boxes are transparent, so the paint
 * source for a background must be the nearest ancestor that is neither.
 *
 * The walk itself is pure and generic over two callbacks (parent lookup and
 * classification), which keeps it testable against synthetic window chains.
 * The Win32 side in `backdrop_windows` supplies the real callbacks.
 */

use crate::types::{Point, Rect};

/// Hard cap on the ancestor walk. A window hierarchy this deep means the
/// parent callback is feeding us a cycle; bail out instead of spinning.
const MAX_ANCESTOR_DEPTH: usize = 64;

/// How a window behaves as a paint source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AncestorKind {
    /// A grouping control; supposed to be transparent.
    GroupBox,
    /// One of our container windows; draws nothing.
    ContainerHost,
    /// Paints its own background and can serve as a backdrop source.
    Opaque,
}

impl AncestorKind {
    pub fn is_transparent(self) -> bool {
        matches!(self, AncestorKind::GroupBox | AncestorKind::ContainerHost)
    }
}

/// Walks outward from `start`, skipping transparent ancestors, and returns
/// the first opaque one. `parent_of` returns `None` at the top of the chain.
///
/// Termination holds because the top-level window is always classified
/// `Opaque`; the depth cap only trips on a malformed (cyclic) chain, in
/// which case `None` is returned and the caller logs.
pub fn find_opaque_ancestor<H, P, C>(start: H, mut parent_of: P, mut classify: C) -> Option<H>
where
    H: Copy,
    P: FnMut(H) -> Option<H>,
    C: FnMut(H) -> AncestorKind,
{
    let mut current = start;
    for _ in 0..MAX_ANCESTOR_DEPTH {
        current = parent_of(current)?;
        if !classify(current).is_transparent() {
            return Some(current);
        }
    }
    None
}

/// Brush origin that aligns a pattern brush with the ancestor's own drawing.
///
/// `control_in_ancestor` is the control's rectangle expressed in the
/// ancestor's client coordinates; the pattern must be shifted backwards by
/// that offset so the tile under the control matches what the ancestor would
/// have painted there.
pub fn brush_origin(control_in_ancestor: Rect) -> Point {
    Point::new(-control_in_ancestor.left, -control_in_ancestor.top)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Synthetic chain: index 0 is the innermost window, the last entry the
    /// top-level one. Parent of i is i + 1.
    fn walk(kinds: &[AncestorKind]) -> Option<usize> {
        find_opaque_ancestor(
            0usize,
            |i| (i + 1 < kinds.len()).then_some(i + 1),
            |i| kinds[i],
        )
    }

    #[test]
    fn skips_containers_and_groupboxes() {
        // container -> container -> groupbox -> real window
        let kinds = [
            AncestorKind::ContainerHost,
            AncestorKind::ContainerHost,
            AncestorKind::GroupBox,
            AncestorKind::Opaque,
        ];
        assert_eq!(walk(&kinds), Some(3));
    }

    #[test]
    fn immediate_opaque_parent_is_selected() {
        let kinds = [AncestorKind::ContainerHost, AncestorKind::Opaque];
        assert_eq!(walk(&kinds), Some(1));
    }

    #[test]
    fn never_returns_a_transparent_window() {
        let kinds = [
            AncestorKind::ContainerHost,
            AncestorKind::GroupBox,
            AncestorKind::GroupBox,
            AncestorKind::Opaque,
        ];
        let result = walk(&kinds).unwrap();
        assert_eq!(kinds[result], AncestorKind::Opaque);
    }

    #[test]
    fn cyclic_parent_chain_terminates() {
        // parent_of never ends and everything claims to be transparent.
        let result = find_opaque_ancestor(0u32, |i| Some(i), |_| AncestorKind::ContainerHost);
        assert_eq!(result, None);
    }

    #[test]
    fn chain_exhaustion_without_opaque_yields_none() {
        let kinds = [AncestorKind::ContainerHost, AncestorKind::GroupBox];
        assert_eq!(walk(&kinds), None);
    }

    #[test]
    fn brush_origin_is_negated_ancestor_offset() {
        // Control at (50,50)-(150,100) within an ancestor client area of
        // (0,0)-(400,300): the pattern origin must be pulled back to (-50,-50).
        let control = Rect::new(50, 50, 150, 100);
        assert_eq!(brush_origin(control), Point::new(-50, -50));
    }
}
