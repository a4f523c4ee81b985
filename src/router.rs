/*
 * Message routing decisions for the container window procedure. The window
 * procedure translates raw platform messages into `Inbound` values and then
 * executes whatever `route` decides, which keeps the priority rules in one
 * testable table:
 *
 *   - command/notification messages are processed whether or not a container
 *     record exists yet, because the platform requires consistent handling
 *     from the moment the window is created;
 *   - background, paint, and layout messages need a live record;
 *   - end-session arbitration belongs to the one window WITHOUT a record
 *     (the initial parent), so it runs exactly once per process.
 */

use crate::types::HostHandle;

/// The message classes the container window procedure cares about. Everything
/// else is `Other` and falls through to default handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Inbound {
    /// A command or notification bounced up from a child control.
    /// `fostered` is true when the source still lives under the initial
    /// parent, in which case the message is treated as ignored.
    ControlMessage {
        source: Option<HostHandle>,
        fostered: bool,
    },
    /// A child control asks for its background color/brush.
    BackgroundColorQuery,
    Paint,
    /// An embedder (e.g. a tab control) asks us to render into its context.
    PrintClient,
    EraseBackground,
    /// Private message: re-run layout over the current client rectangle.
    UpdateChild,
    /// The session is ending (or a console handler forwarded the equivalent).
    EndSessionQuery,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Redirect the message to the originating control's own handler.
    Bounce { target: HostHandle },
    /// Delete the cached brush, mark the context transparent, and return a
    /// freshly aligned backdrop brush.
    RefreshBrush,
    /// Paint the invalidated region from the opaque ancestor's snapshot.
    PaintBackground,
    /// Paint the full client rectangle into the supplied context.
    PrintClientBackground,
    /// Report the erase as done; the paint path covers the whole region.
    SuppressErase,
    RelayoutChildren,
    /// Ask the application quit policy and accept or decline termination.
    ArbitrateEndSession,
    /// Fall through to the platform's default window procedure.
    PassThrough,
}

pub fn route(inbound: Inbound, has_record: bool) -> Action {
    match inbound {
        Inbound::ControlMessage {
            source: Some(target),
            fostered: false,
        } => Action::Bounce { target },
        Inbound::ControlMessage { .. } => Action::PassThrough,
        Inbound::BackgroundColorQuery if has_record => Action::RefreshBrush,
        Inbound::Paint if has_record => Action::PaintBackground,
        Inbound::PrintClient if has_record => Action::PrintClientBackground,
        // The update region is fully painted anyway; skipping the erase
        // avoids flicker. Not gated on the record: the only record-less
        // window is the invisible initial parent.
        Inbound::EraseBackground => Action::SuppressErase,
        Inbound::UpdateChild if has_record => Action::RelayoutChildren,
        Inbound::EndSessionQuery if !has_record => Action::ArbitrateEndSession,
        _ => Action::PassThrough,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCE: HostHandle = HostHandle::new(0x40);

    #[test]
    fn control_messages_bounce_even_before_a_record_exists() {
        let inbound = Inbound::ControlMessage {
            source: Some(SOURCE),
            fostered: false,
        };
        assert_eq!(route(inbound, false), Action::Bounce { target: SOURCE });
        assert_eq!(route(inbound, true), Action::Bounce { target: SOURCE });
    }

    #[test]
    fn fostered_or_sourceless_control_messages_fall_through() {
        assert_eq!(
            route(
                Inbound::ControlMessage {
                    source: Some(SOURCE),
                    fostered: true,
                },
                true
            ),
            Action::PassThrough
        );
        assert_eq!(
            route(
                Inbound::ControlMessage {
                    source: None,
                    fostered: false,
                },
                true
            ),
            Action::PassThrough
        );
    }

    #[test]
    fn background_paint_and_layout_require_a_record() {
        for inbound in [
            Inbound::BackgroundColorQuery,
            Inbound::Paint,
            Inbound::PrintClient,
            Inbound::UpdateChild,
        ] {
            assert_eq!(route(inbound, false), Action::PassThrough);
        }
        assert_eq!(
            route(Inbound::BackgroundColorQuery, true),
            Action::RefreshBrush
        );
        assert_eq!(route(Inbound::Paint, true), Action::PaintBackground);
        assert_eq!(
            route(Inbound::PrintClient, true),
            Action::PrintClientBackground
        );
        assert_eq!(route(Inbound::UpdateChild, true), Action::RelayoutChildren);
    }

    #[test]
    fn erase_is_always_suppressed() {
        assert_eq!(route(Inbound::EraseBackground, false), Action::SuppressErase);
        assert_eq!(route(Inbound::EraseBackground, true), Action::SuppressErase);
    }

    #[test]
    fn end_session_is_arbitrated_only_by_the_record_less_window() {
        assert_eq!(
            route(Inbound::EndSessionQuery, false),
            Action::ArbitrateEndSession
        );
        assert_eq!(route(Inbound::EndSessionQuery, true), Action::PassThrough);
    }

    #[test]
    fn unknown_messages_fall_through() {
        assert_eq!(route(Inbound::Other, true), Action::PassThrough);
        assert_eq!(route(Inbound::Other, false), Action::PassThrough);
    }
}
