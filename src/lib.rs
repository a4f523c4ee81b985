/*
 * Provides the public entry point for the panehost crate, a Win32
 * container-window layer for building composite controls. A container is a
 * non-visual child window that hosts other controls: it forwards their
 * command/notification messages, paints a theme-correct background snapshot
 * of the nearest opaque ancestor (so transparent children like group boxes
 * composite correctly), and drives a dialog-unit layout pass that chains
 * z-order to layout order.
 *
 * The library exposes only the safe API surface (`ContainerHost`,
 * `ContainerControl`, `ChildLayout`, the sizing types). Conditional
 * compilation keeps the portable pieces (geometry, sizing math, ancestor
 * resolution, registry bookkeeping, message routing) available on every
 * platform so their logic can be compiled and tested without Win32.
 */
pub mod backdrop;
#[cfg(target_os = "windows")]
pub(crate) mod backdrop_windows;
pub mod container;
pub mod error;
#[cfg(target_os = "windows")]
pub mod host_windows;
pub mod router;
pub mod sizing;
#[cfg(target_os = "windows")]
pub(crate) mod sizing_windows;
pub mod types;

pub use error::{PlatformError, Result as PlatformResult};
pub use sizing::{BaseUnits, FontSample, Sizing, ZOrderSlot, dlg_units_to_x, dlg_units_to_y};
pub use types::{HostHandle, Point, Rect};

#[cfg(target_os = "windows")]
pub use host_windows::{
    ChildLayout, ContainerControl, ContainerHost, QuitPolicy, WM_APP_BOUNCE_COMMAND,
    WM_APP_BOUNCE_NOTIFY, WM_APP_CONSOLE_END_SESSION,
};
