/*
 * Font measurement for the resize engine. Dialog-unit base units come from
 * the live message font: average character width over the reference alphabet
 * for the horizontal unit, text-metric height for the vertical one. The
 * measurement uses a throwaway DC; both the DC and the previously selected
 * font are restored on every exit path via the guard types below.
 */

use crate::error::{PlatformError, Result as PlatformResult};
use crate::sizing::{BaseUnits, FontSample, REFERENCE_ALPHABET, Sizing};

use windows::Win32::Foundation::{HWND, SIZE};
use windows::Win32::Graphics::Gdi::{
    GetDC, GetTextExtentPoint32W, GetTextMetricsW, HDC, HFONT, HGDIOBJ, ReleaseDC, SelectObject,
    TEXTMETRICW,
};

/// DC borrowed from a window, released on drop.
struct WindowDc {
    hwnd: HWND,
    dc: HDC,
}

impl WindowDc {
    fn get(hwnd: HWND) -> PlatformResult<Self> {
        let dc = unsafe { GetDC(Some(hwnd)) };
        if dc.is_invalid() {
            return Err(PlatformError::OperationFailed(format!(
                "error getting DC for {hwnd:?}"
            )));
        }
        Ok(Self { hwnd, dc })
    }

    fn raw(&self) -> HDC {
        self.dc
    }
}

impl Drop for WindowDc {
    fn drop(&mut self) {
        if unsafe { ReleaseDC(Some(self.hwnd), self.dc) } == 0 {
            log::error!("Resize: error releasing measurement DC for {:?}", self.hwnd);
        }
    }
}

/// Temporarily selects a font into a DC, restoring the previous one on drop.
struct SelectedFont {
    dc: HDC,
    prev: HGDIOBJ,
}

impl SelectedFont {
    fn select(dc: HDC, font: HFONT) -> PlatformResult<Self> {
        let prev = unsafe { SelectObject(dc, font.into()) };
        if prev.is_invalid() {
            return Err(PlatformError::OperationFailed(
                "error selecting message font into measurement DC".to_string(),
            ));
        }
        Ok(Self { dc, prev })
    }
}

impl Drop for SelectedFont {
    fn drop(&mut self) {
        let restored = unsafe { SelectObject(self.dc, self.prev) };
        if restored.is_invalid() {
            log::error!("Resize: error restoring previous font into measurement DC");
        }
    }
}

/// Measures the given font against a throwaway DC for `hwnd` and derives the
/// dialog-unit base units from the sample.
pub(crate) fn measure_base_units(hwnd: HWND, font: HFONT) -> PlatformResult<BaseUnits> {
    let dc = WindowDc::get(hwnd)?;
    let _font = SelectedFont::select(dc.raw(), font)?;

    let mut tm = TEXTMETRICW::default();
    unsafe { GetTextMetricsW(dc.raw(), &mut tm) }.map_err(|err| {
        PlatformError::OperationFailed(format!("error getting text metrics: {err}"))
    })?;

    let alphabet: Vec<u16> = REFERENCE_ALPHABET.encode_utf16().collect();
    let mut extent = SIZE::default();
    unsafe { GetTextExtentPoint32W(dc.raw(), &alphabet, &mut extent) }.map_err(|err| {
        PlatformError::OperationFailed(format!("error getting text extent: {err}"))
    })?;

    Ok(BaseUnits::from_sample(FontSample {
        alphabet_width: extent.cx,
        height: tm.tmHeight,
        internal_leading: tm.tmInternalLeading,
    }))
}

/// Builds a fresh sizing context for one layout pass over `hwnd`'s children.
/// Any measurement failure aborts the pass as a whole; the caller logs and
/// leaves the children at their prior positions.
pub(crate) fn sizing_for(hwnd: HWND, font: HFONT) -> PlatformResult<Sizing> {
    Ok(Sizing::new(measure_base_units(hwnd, font)?))
}
