/*
 * Win32 side of backdrop compositing. A container never paints content of
 * its own; instead it asks the nearest opaque ancestor to render its client
 * area into an off-screen bitmap and then either builds an aligned pattern
 * brush from it (for child background-color queries) or blits the exact
 * dirty pixels back (for the container's own paint and print requests).
 *
 * Every GDI resource acquired here is scoped: `AncestorSnapshot` restores
 * the previous bitmap and deletes both the bitmap and the memory DC in its
 * `Drop`, so failure paths cannot leak.
 */

use crate::backdrop::{self, AncestorKind};
use crate::error::{PlatformError, Result as PlatformResult};
use crate::host_windows::CONTAINER_CLASS_NAME;
use crate::types::Rect;

use windows::Win32::Foundation::{HWND, LPARAM, POINT, RECT, WPARAM};
use windows::Win32::Graphics::Gdi::{
    BitBlt, CreateCompatibleBitmap, CreateCompatibleDC, CreatePatternBrush, DeleteDC, DeleteObject,
    HBITMAP, HBRUSH, HDC, HGDIOBJ, MapWindowPoints, SRCCOPY, SelectObject, SetBrushOrgEx,
};
use windows::Win32::UI::WindowsAndMessaging::{
    GA_PARENT, GetAncestor, GetClassNameW, GetClientRect, GetWindowRect, PRF_CLIENT, SendMessageW,
    WM_PRINTCLIENT,
};

/// Classifies a window class name the way the ancestor walk needs it:
/// group boxes live in the system "Button" class and are transparent, our
/// own container windows draw nothing, everything else paints a background.
pub(crate) fn classify_class_name(name: &str) -> AncestorKind {
    if name.eq_ignore_ascii_case("button") {
        AncestorKind::GroupBox
    } else if name == CONTAINER_CLASS_NAME {
        AncestorKind::ContainerHost
    } else {
        AncestorKind::Opaque
    }
}

fn classify_window(hwnd: HWND) -> AncestorKind {
    let mut buf = [0u16; 256];
    let len = unsafe { GetClassNameW(hwnd, &mut buf) };
    if len <= 0 {
        // Cannot classify; treating it as opaque keeps the walk terminating.
        log::warn!("Backdrop: GetClassNameW failed for {hwnd:?}");
        return AncestorKind::Opaque;
    }
    classify_class_name(&String::from_utf16_lossy(&buf[..len as usize]))
}

/// Walks outward from `hwnd` to the nearest ancestor that paints its own
/// background, skipping group boxes and container windows.
pub(crate) fn opaque_ancestor(hwnd: HWND) -> PlatformResult<HWND> {
    backdrop::find_opaque_ancestor(
        hwnd,
        |current| {
            let parent = unsafe { GetAncestor(current, GA_PARENT) };
            (!parent.is_invalid()).then_some(parent)
        },
        classify_window,
    )
    .ok_or_else(|| {
        PlatformError::OperationFailed(format!("no opaque ancestor found for {hwnd:?}"))
    })
}

/*
 * Off-screen copy of an ancestor's painted client area. The ancestor renders
 * itself into a compatible bitmap via WM_PRINTCLIENT; the bitmap stays
 * selected into the memory DC for the lifetime of the snapshot.
 */
pub(crate) struct AncestorSnapshot {
    mem_dc: HDC,
    bitmap: HBITMAP,
    prev_bitmap: HGDIOBJ,
}

impl AncestorSnapshot {
    pub(crate) fn capture(reference_dc: HDC, ancestor: HWND) -> PlatformResult<Self> {
        let mut client = RECT::default();
        unsafe { GetClientRect(ancestor, &mut client) }.map_err(|err| {
            PlatformError::OperationFailed(format!(
                "error getting client rect of ancestor {ancestor:?}: {err}"
            ))
        })?;

        let mem_dc = unsafe { CreateCompatibleDC(Some(reference_dc)) };
        if mem_dc.is_invalid() {
            return Err(PlatformError::OperationFailed(
                "error creating compatible DC for ancestor snapshot".to_string(),
            ));
        }
        let bitmap = unsafe {
            CreateCompatibleBitmap(
                reference_dc,
                client.right - client.left,
                client.bottom - client.top,
            )
        };
        if bitmap.is_invalid() {
            unsafe {
                let _ = DeleteDC(mem_dc);
            }
            return Err(PlatformError::OperationFailed(
                "error creating compatible bitmap for ancestor snapshot".to_string(),
            ));
        }
        let prev_bitmap = unsafe { SelectObject(mem_dc, bitmap.into()) };
        if prev_bitmap.is_invalid() {
            unsafe {
                let _ = DeleteObject(bitmap.into());
                let _ = DeleteDC(mem_dc);
            }
            return Err(PlatformError::OperationFailed(
                "error selecting bitmap into snapshot DC".to_string(),
            ));
        }

        // Ask the ancestor to render its client area into the bitmap.
        unsafe {
            SendMessageW(
                ancestor,
                WM_PRINTCLIENT,
                Some(WPARAM(mem_dc.0 as usize)),
                Some(LPARAM(PRF_CLIENT as isize)),
            );
        }

        Ok(Self {
            mem_dc,
            bitmap,
            prev_bitmap,
        })
    }

    pub(crate) fn dc(&self) -> HDC {
        self.mem_dc
    }

    pub(crate) fn bitmap(&self) -> HBITMAP {
        self.bitmap
    }
}

impl Drop for AncestorSnapshot {
    fn drop(&mut self) {
        unsafe {
            let restored = SelectObject(self.mem_dc, self.prev_bitmap);
            if restored.0 != self.bitmap.0 {
                log::error!("Backdrop: error restoring previous bitmap into snapshot DC");
            }
            if !DeleteObject(self.bitmap.into()).as_bool() {
                log::error!("Backdrop: error deleting snapshot bitmap");
            }
            if !DeleteDC(self.mem_dc).as_bool() {
                log::error!("Backdrop: error deleting snapshot DC");
            }
        }
    }
}

/// The control's window rectangle expressed in the ancestor's client
/// coordinates.
fn window_rect_in(hwnd: HWND, ancestor: HWND) -> PlatformResult<Rect> {
    let mut screen = RECT::default();
    unsafe { GetWindowRect(hwnd, &mut screen) }.map_err(|err| {
        PlatformError::OperationFailed(format!(
            "error getting window rect of {hwnd:?}: {err}"
        ))
    })?;
    let mut points = [
        POINT {
            x: screen.left,
            y: screen.top,
        },
        POINT {
            x: screen.right,
            y: screen.bottom,
        },
    ];
    unsafe {
        MapWindowPoints(None, Some(ancestor), &mut points);
    }
    Ok(Rect::new(
        points[0].x,
        points[0].y,
        points[1].x,
        points[1].y,
    ))
}

/*
 * Builds the background brush a child control should be painted with: a
 * pattern brush holding the opaque ancestor's rendering, with its origin
 * pulled back so the pattern under the control lines up pixel-exactly with
 * what the ancestor would have drawn there. The caller owns the returned
 * brush and must delete it once replaced.
 */
pub(crate) fn control_background_brush(control: HWND, dc: HDC) -> PlatformResult<HBRUSH> {
    let ancestor = opaque_ancestor(control)?;

    let brush = {
        let snapshot = AncestorSnapshot::capture(dc, ancestor)?;
        let brush = unsafe { CreatePatternBrush(snapshot.bitmap()) };
        if brush.is_invalid() {
            return Err(PlatformError::OperationFailed(
                "error creating pattern brush from ancestor snapshot".to_string(),
            ));
        }
        brush
    };

    match window_rect_in(control, ancestor) {
        Ok(control_in_ancestor) => {
            let origin = backdrop::brush_origin(control_in_ancestor);
            if let Err(err) = unsafe { SetBrushOrgEx(dc, origin.x, origin.y, None) } {
                log::error!("Backdrop: error setting brush origin for {control:?}: {err}");
            }
        }
        Err(err) => {
            // Misaligned is still better than unpainted; keep the brush.
            log::error!("Backdrop: error aligning brush for {control:?}: {err}");
        }
    }

    Ok(brush)
}

/*
 * Paints a container's dirty rectangle by copying the exact pixels the
 * opaque ancestor would have drawn there. Used for WM_PAINT and
 * WM_PRINTCLIENT, where registration matters more than brush-fill speed.
 */
pub(crate) fn paint_background(hwnd: HWND, dc: HDC, dirty: &RECT) -> PlatformResult<()> {
    let ancestor = opaque_ancestor(hwnd)?;
    let snapshot = AncestorSnapshot::capture(dc, ancestor)?;

    // The same rectangle as the ancestor sees it.
    let mut origin = [POINT {
        x: dirty.left,
        y: dirty.top,
    }];
    unsafe {
        MapWindowPoints(Some(hwnd), Some(ancestor), &mut origin);
    }

    unsafe {
        BitBlt(
            dc,
            dirty.left,
            dirty.top,
            dirty.right - dirty.left,
            dirty.bottom - dirty.top,
            Some(snapshot.dc()),
            origin[0].x,
            origin[0].y,
            SRCCOPY,
        )
    }
    .map_err(|err| {
        PlatformError::OperationFailed(format!(
            "error copying ancestor pixels under {hwnd:?}: {err}"
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn button_class_is_a_transparent_groupbox_in_any_case() {
        assert_eq!(classify_class_name("Button"), AncestorKind::GroupBox);
        assert_eq!(classify_class_name("BUTTON"), AncestorKind::GroupBox);
        assert_eq!(classify_class_name("button"), AncestorKind::GroupBox);
    }

    #[test]
    fn own_container_class_is_transparent() {
        assert_eq!(
            classify_class_name(CONTAINER_CLASS_NAME),
            AncestorKind::ContainerHost
        );
    }

    #[test]
    fn other_classes_are_opaque() {
        assert_eq!(classify_class_name("Edit"), AncestorKind::Opaque);
        assert_eq!(classify_class_name("#32770"), AncestorKind::Opaque);
        assert_eq!(classify_class_name(""), AncestorKind::Opaque);
    }
}
