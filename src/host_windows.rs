/*
 * Win32 lifecycle and message dispatch for container windows. This module
 * registers the container window class, owns the process-wide initial
 * parent (a disabled, invisible top-level window that fosters every
 * container until it is attached to a real parent), and implements the
 * window procedure that executes the routing decisions from `crate::router`.
 *
 * All state lives in `ContainerHost`, constructed by `init` and torn down
 * explicitly or on drop; nothing is kept in module-level globals. Each
 * window carries a boxed `HostContext` in its user-data slot so the window
 * procedure can find its host; record lookup itself always goes through the
 * explicit registry in `crate::container`.
 *
 * Everything here runs on the one UI thread that owns the message queue.
 * Registry borrows are never held across a synchronous `SendMessageW` (or
 * any call that can re-enter the window procedure); state transitions
 * produce `HostOp` lists first and apply them after the borrow ends.
 */

use crate::backdrop_windows;
use crate::container::{self, ContainerRegistry, HostOp};
use crate::error::{PlatformError, Result as PlatformResult};
use crate::router::{self, Action, Inbound};
use crate::sizing::{Sizing, ZOrderSlot};
use crate::sizing_windows;
use crate::types::{HostHandle, Rect};

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::ffi::c_void;
use std::rc::{Rc, Weak};

use windows::Win32::Foundation::{GetLastError, HINSTANCE, HWND, LPARAM, LRESULT, RECT, WPARAM};
use windows::Win32::Graphics::Gdi::{
    BeginPaint, COLOR_BTNFACE, CreateFontIndirectW, DeleteObject, EndPaint, HBRUSH, HDC, HFONT,
    HGDIOBJ, PAINTSTRUCT, SetBkMode, TRANSPARENT,
};
use windows::Win32::System::LibraryLoader::GetModuleHandleW;
use windows::Win32::UI::Controls::NMHDR;
use windows::Win32::UI::Input::KeyboardAndMouse::EnableWindow;
use windows::Win32::UI::WindowsAndMessaging::{
    CREATESTRUCTW, CreateWindowExW, DefWindowProcW, DestroyWindow, GWLP_USERDATA, GetClassInfoExW,
    GetClientRect, GetWindowLongPtrW, HICON, HWND_TOP, IDC_ARROW, IDI_APPLICATION, IsChild,
    LoadCursorW, LoadIconW, NONCLIENTMETRICSW, PostQuitMessage, RegisterClassExW,
    SPI_GETNONCLIENTMETRICS, SWP_NOACTIVATE, SYSTEM_PARAMETERS_INFO_UPDATE_FLAGS, SendMessageW,
    SetParent, SetWindowLongPtrW, SetWindowPos, ShowWindow, SW_HIDE, SW_SHOW,
    SystemParametersInfoW, UnregisterClassW, WINDOW_EX_STYLE, WM_APP, WM_COMMAND,
    WM_CTLCOLORBTN, WM_CTLCOLORSTATIC, WM_ERASEBKGND, WM_NCCREATE, WM_NCDESTROY, WM_NOTIFY,
    WM_PAINT, WM_PRINTCLIENT, WM_QUERYENDSESSION, WNDCLASS_STYLES, WNDCLASSEXW, WS_CHILD,
    WS_EX_CONTROLPARENT, WS_OVERLAPPEDWINDOW, WS_VISIBLE,
};
use windows::core::{HSTRING, PCWSTR};

/// Class name of every container window (and of the initial parent).
pub(crate) const CONTAINER_CLASS_NAME: &str = "PanehostContainerWindow";

// Private window message protocol. Command/notification messages arriving at
// a container are redirected to the originating control as these messages so
// the control's own handler can process them.
pub const WM_APP_BOUNCE_COMMAND: u32 = WM_APP + 0x120;
pub const WM_APP_BOUNCE_NOTIFY: u32 = WM_APP + 0x121;
/// Asks a container to re-run its child layout over its client rectangle.
pub(crate) const WM_APP_UPDATE_CHILD: u32 = WM_APP + 0x122;
/// Posted by console control handlers to funnel console close events into
/// the same end-session arbitration as WM_QUERYENDSESSION.
pub const WM_APP_CONSOLE_END_SESSION: u32 = WM_APP + 0x123;

/// Decides whether the application may quit when the session is ending.
pub type QuitPolicy = Box<dyn Fn() -> bool>;

/// Child positioning hook supplied by the layout kind hosting the container
/// (stacking, grid, ...). Implementations position each child by calling
/// `ContainerControl::position`, threading `sizing` through so z-order and
/// tab order chain in layout order.
pub trait ChildLayout {
    fn resize_children(&mut self, bounds: Rect, sizing: &mut Sizing);
}

/// Window user-data payload installed on every window of this class.
struct HostContext {
    host: Weak<ContainerHost>,
}

pub(crate) fn handle_of(hwnd: HWND) -> HostHandle {
    HostHandle::new(hwnd.0 as isize)
}

pub(crate) fn hwnd_of(handle: HostHandle) -> HWND {
    HWND(handle.raw() as *mut c_void)
}

/// Which private message a bounced command/notification is delivered as.
fn bounce_message_for(msg: u32) -> u32 {
    if msg == WM_COMMAND {
        WM_APP_BOUNCE_COMMAND
    } else {
        WM_APP_BOUNCE_NOTIFY
    }
}

/*
 * Process-lifecycle object for the container subsystem. Owns the window
 * class, the message font used for dialog-unit measurement, the initial
 * parent window, the registry of live containers, their layout hooks, and
 * the per-container background brush cache.
 */
pub struct ContainerHost {
    h_instance: HINSTANCE,
    class_name: HSTRING,
    message_font: HFONT,
    initial_parent: HWND,
    registry: RefCell<ContainerRegistry>,
    layouts: RefCell<HashMap<HostHandle, Rc<RefCell<Box<dyn ChildLayout>>>>>,
    // Cached background brushes, stored as raw handle values. Exactly one
    // live brush per container; replaced on every background-color query.
    brushes: RefCell<HashMap<HostHandle, isize>>,
    quit_policy: QuitPolicy,
    torn_down: Cell<bool>,
}

impl ContainerHost {
    /*
     * Registers the container window class and creates the initial parent.
     * Either step failing means the whole subsystem is unusable: the error is
     * returned and any partially created state is released first.
     */
    pub fn init(quit_policy: QuitPolicy) -> PlatformResult<Rc<Self>> {
        let h_instance: HINSTANCE = unsafe { GetModuleHandleW(None) }
            .map_err(|err| {
                PlatformError::InitializationFailed(format!("error getting module handle: {err}"))
            })?
            .into();
        let class_name = HSTRING::from(CONTAINER_CLASS_NAME);

        register_container_class(h_instance, &class_name)?;

        let message_font = match create_message_font() {
            Ok(font) => font,
            Err(err) => {
                unregister_class_best_effort(h_instance, &class_name);
                return Err(err);
            }
        };

        let initial_parent = match create_initial_parent(h_instance, &class_name) {
            Ok(hwnd) => hwnd,
            Err(err) => {
                unsafe {
                    let _ = DeleteObject(message_font.into());
                }
                unregister_class_best_effort(h_instance, &class_name);
                return Err(err);
            }
        };

        let host = Rc::new(Self {
            h_instance,
            class_name,
            message_font,
            initial_parent,
            registry: RefCell::new(ContainerRegistry::new(handle_of(initial_parent))),
            layouts: RefCell::new(HashMap::new()),
            brushes: RefCell::new(HashMap::new()),
            quit_policy,
            torn_down: Cell::new(false),
        });

        // The initial parent was created before the host existed; wire its
        // user-data slot now so fostered-control commands and end-session
        // queries route through this host.
        let context = Box::new(HostContext {
            host: Rc::downgrade(&host),
        });
        unsafe {
            SetWindowLongPtrW(initial_parent, GWLP_USERDATA, Box::into_raw(context) as isize);
        }

        log::debug!("Host: container subsystem initialized, initial parent {initial_parent:?}");
        Ok(host)
    }

    /*
     * Creates a container window fostered under the initial parent and wires
     * its registry record and layout hook. The window is a child window from
     * birth so it always sits in a valid hierarchy, even before the caller
     * attaches it to a real parent.
     */
    pub fn create_container(
        self: &Rc<Self>,
        layout: Box<dyn ChildLayout>,
    ) -> PlatformResult<ContainerControl> {
        let context = Box::new(HostContext {
            host: Rc::downgrade(self),
        });
        let hwnd = unsafe {
            CreateWindowExW(
                WS_EX_CONTROLPARENT,
                &self.class_name,
                None,
                WS_CHILD | WS_VISIBLE,
                0,
                0,
                100,
                100,
                Some(self.initial_parent),
                None,
                Some(self.h_instance),
                Some(Box::into_raw(context) as *mut c_void),
            )
        }
        .map_err(|err| {
            PlatformError::OperationFailed(format!("error creating container window: {err}"))
        })?;

        let handle = handle_of(hwnd);
        self.registry.borrow_mut().insert(handle)?;
        self.layouts
            .borrow_mut()
            .insert(handle, Rc::new(RefCell::new(layout)));

        log::debug!("Host: created container {handle}");
        Ok(ContainerControl {
            host: Rc::clone(self),
            handle,
        })
    }

    /*
     * Best-effort teardown: destroys the initial parent (taking any still
     * fostered containers with it), releases cached brushes and the message
     * font, and unregisters the class. Failures are logged, never returned;
     * teardown must not block process exit and is safe to call twice.
     */
    pub fn teardown(&self) {
        if self.torn_down.replace(true) {
            return;
        }
        // Layout hooks may hold ContainerControls (and thus the host); drop
        // them here so the host itself can be freed after teardown.
        self.layouts.borrow_mut().clear();
        let brushes: Vec<isize> = self
            .brushes
            .borrow_mut()
            .drain()
            .map(|(_, brush)| brush)
            .collect();
        for raw in brushes {
            unsafe {
                if !DeleteObject(HGDIOBJ(raw as *mut c_void)).as_bool() {
                    log::error!("Host: error deleting cached background brush during teardown");
                }
            }
        }
        if !self.initial_parent.is_invalid()
            && let Err(err) = unsafe { DestroyWindow(self.initial_parent) }
        {
            log::error!("Host: error destroying initial parent: {err}");
        }
        if !self.message_font.is_invalid() {
            unsafe {
                if !DeleteObject(self.message_font.into()).as_bool() {
                    log::error!("Host: error deleting message font");
                }
            }
        }
        if let Err(err) = unsafe {
            UnregisterClassW(PCWSTR(self.class_name.as_ptr()), Some(self.h_instance))
        } {
            log::error!("Host: error unregistering container window class: {err}");
        }
    }

    /// Applies native operations emitted by a registry state transition.
    /// Must be called with no registry borrow outstanding: several of these
    /// calls dispatch messages back into the window procedure synchronously.
    fn apply(&self, ops: Vec<HostOp>) {
        for op in ops {
            match op {
                HostOp::Reparent { child, new_parent } => {
                    if let Err(err) =
                        unsafe { SetParent(hwnd_of(child), Some(hwnd_of(new_parent))) }
                    {
                        log::error!("Host: error changing parent of container {child}: {err}");
                    }
                }
                HostOp::SetShown { handle, shown } => unsafe {
                    let _ = ShowWindow(hwnd_of(handle), if shown { SW_SHOW } else { SW_HIDE });
                },
                HostOp::DestroyWindow { handle } => {
                    self.layouts.borrow_mut().remove(&handle);
                    self.delete_cached_brush(handle);
                    if let Err(err) = unsafe { DestroyWindow(hwnd_of(handle)) } {
                        log::error!("Host: error destroying container window {handle}: {err}");
                    }
                }
                HostOp::RequestLayout { handle } => unsafe {
                    let _ = SendMessageW(hwnd_of(handle), WM_APP_UPDATE_CHILD, None, None);
                },
            }
        }
    }

    fn delete_cached_brush(&self, handle: HostHandle) {
        if let Some(raw) = self.brushes.borrow_mut().remove(&handle) {
            unsafe {
                if !DeleteObject(HGDIOBJ(raw as *mut c_void)).as_bool() {
                    log::error!("Host: error deleting cached background brush for {handle}");
                }
            }
        }
    }

    /// Final cleanup for a window that is being destroyed, whether through
    /// `ContainerControl::destroy` or because an ancestor window went away.
    fn forget_window(&self, handle: HostHandle) {
        self.registry.borrow_mut().remove(handle);
        self.layouts.borrow_mut().remove(&handle);
        self.delete_cached_brush(handle);
    }

    fn control_message(&self, source: HWND) -> Inbound {
        if source.is_invalid() {
            return Inbound::ControlMessage {
                source: None,
                fostered: false,
            };
        }
        let fostered = unsafe { IsChild(self.initial_parent, source) }.as_bool();
        Inbound::ControlMessage {
            source: Some(handle_of(source)),
            fostered,
        }
    }

    fn translate(&self, msg: u32, lparam: LPARAM) -> Inbound {
        match msg {
            WM_COMMAND => self.control_message(HWND(lparam.0 as *mut c_void)),
            WM_NOTIFY => {
                let source = if lparam.0 == 0 {
                    HWND::default()
                } else {
                    unsafe { (*(lparam.0 as *const NMHDR)).hwndFrom }
                };
                self.control_message(source)
            }
            WM_CTLCOLORSTATIC | WM_CTLCOLORBTN => Inbound::BackgroundColorQuery,
            WM_PAINT => Inbound::Paint,
            WM_PRINTCLIENT => Inbound::PrintClient,
            WM_ERASEBKGND => Inbound::EraseBackground,
            WM_APP_UPDATE_CHILD => Inbound::UpdateChild,
            WM_QUERYENDSESSION | WM_APP_CONSOLE_END_SESSION => Inbound::EndSessionQuery,
            _ => Inbound::Other,
        }
    }

    fn handle_message(&self, hwnd: HWND, msg: u32, wparam: WPARAM, lparam: LPARAM) -> LRESULT {
        let handle = handle_of(hwnd);
        if msg == WM_NCDESTROY {
            self.forget_window(handle);
            return unsafe { DefWindowProcW(hwnd, msg, wparam, lparam) };
        }

        let has_record = self.registry.borrow().contains(handle);
        match router::route(self.translate(msg, lparam), has_record) {
            Action::Bounce { target } => unsafe {
                SendMessageW(
                    hwnd_of(target),
                    bounce_message_for(msg),
                    Some(wparam),
                    Some(lparam),
                )
            },
            Action::RefreshBrush => self
                .refresh_background_brush(handle, wparam, lparam)
                .unwrap_or_else(|| unsafe { DefWindowProcW(hwnd, msg, wparam, lparam) }),
            Action::PaintBackground => self.paint_container(hwnd),
            Action::PrintClientBackground => self.print_container(hwnd, wparam),
            Action::SuppressErase => LRESULT(1),
            Action::RelayoutChildren => self.relayout_children(hwnd),
            Action::ArbitrateEndSession => {
                if (self.quit_policy)() {
                    unsafe { PostQuitMessage(0) };
                    LRESULT(1)
                } else {
                    LRESULT(0)
                }
            }
            Action::PassThrough => unsafe { DefWindowProcW(hwnd, msg, wparam, lparam) },
        }
    }

    /*
     * Handles a background-color query from a child: drops the previously
     * cached brush, marks the child's DC as transparent-background, and
     * returns a freshly aligned backdrop brush. On failure the query falls
     * through to default handling, which paints the class background.
     */
    fn refresh_background_brush(
        &self,
        handle: HostHandle,
        wparam: WPARAM,
        lparam: LPARAM,
    ) -> Option<LRESULT> {
        let dc = HDC(wparam.0 as *mut c_void);
        let control = HWND(lparam.0 as *mut c_void);

        self.delete_cached_brush(handle);
        if unsafe { SetBkMode(dc, TRANSPARENT) } == 0 {
            log::error!("Host: error setting transparent background mode for {control:?}");
        }
        match backdrop_windows::control_background_brush(control, dc) {
            Ok(brush) => {
                self.brushes.borrow_mut().insert(handle, brush.0 as isize);
                Some(LRESULT(brush.0 as isize))
            }
            Err(err) => {
                log::error!("Host: error computing background brush for {control:?}: {err}");
                None
            }
        }
    }

    fn paint_container(&self, hwnd: HWND) -> LRESULT {
        let mut ps = PAINTSTRUCT::default();
        let dc = unsafe { BeginPaint(hwnd, &mut ps) };
        if dc.is_invalid() {
            log::error!("Host: error beginning container paint for {hwnd:?}");
            return LRESULT(0);
        }
        if let Err(err) = backdrop_windows::paint_background(hwnd, dc, &ps.rcPaint) {
            log::error!("Host: error painting container background for {hwnd:?}: {err}");
        }
        unsafe {
            let _ = EndPaint(hwnd, &ps);
        }
        LRESULT(0)
    }

    /// Tab-like embedders send WM_PRINTCLIENT to have the container render
    /// itself into their context; the full client rectangle is painted.
    fn print_container(&self, hwnd: HWND, wparam: WPARAM) -> LRESULT {
        let dc = HDC(wparam.0 as *mut c_void);
        let mut client = RECT::default();
        if let Err(err) = unsafe { GetClientRect(hwnd, &mut client) } {
            log::error!("Host: error getting client rect for print of {hwnd:?}: {err}");
            return LRESULT(0);
        }
        if let Err(err) = backdrop_windows::paint_background(hwnd, dc, &client) {
            log::error!("Host: error printing container background for {hwnd:?}: {err}");
        }
        LRESULT(0)
    }

    fn relayout_children(&self, hwnd: HWND) -> LRESULT {
        let mut client = RECT::default();
        if let Err(err) = unsafe { GetClientRect(hwnd, &mut client) } {
            log::error!("Host: error getting client rect for resize of {hwnd:?}: {err}");
            return LRESULT(0);
        }
        self.run_child_layout(
            handle_of(hwnd),
            Rect::new(client.left, client.top, client.right, client.bottom),
        );
        LRESULT(0)
    }

    /*
     * One full resize pass: measure the message font, build the sizing
     * context with the z-order cursor at the top, and hand the bounds to the
     * container's layout hook. A measurement failure aborts the pass without
     * partial application; children keep their prior positions.
     */
    fn run_child_layout(&self, handle: HostHandle, bounds: Rect) {
        let layout = match self.layouts.borrow().get(&handle) {
            Some(layout) => Rc::clone(layout),
            None => return,
        };
        let mut sizing = match sizing_windows::sizing_for(hwnd_of(handle), self.message_font) {
            Ok(sizing) => sizing,
            Err(err) => {
                log::error!("Resize: aborting layout pass for container {handle}: {err}");
                return;
            }
        };
        match layout.try_borrow_mut() {
            Ok(mut layout) => layout.resize_children(bounds, &mut sizing),
            Err(_) => {
                log::warn!("Resize: layout for container {handle} re-entered, pass skipped")
            }
        }
    }
}

impl Drop for ContainerHost {
    fn drop(&mut self) {
        self.teardown();
    }
}

/*
 * Handle to one live container plus its standard operation table. Layout
 * subclasses build on these operations; preferred-size calculation and the
 * actual child placement algorithm stay with them.
 */
pub struct ContainerControl {
    host: Rc<ContainerHost>,
    handle: HostHandle,
}

impl ContainerControl {
    pub fn handle(&self) -> HostHandle {
        self.handle
    }

    /// Destroys the container window. The caller must have detached it from
    /// its parent first; destroying a parented container is refused as a
    /// contract violation and leaves the window alive.
    pub fn destroy(self) -> PlatformResult<()> {
        let ops = self.host.registry.borrow_mut().destroy(self.handle)?;
        self.host.apply(ops);
        Ok(())
    }

    /// Attaches the container to a new logical parent, or detaches it back
    /// to the initial parent when `parent` is `None`.
    pub fn set_parent(&self, parent: Option<&ContainerControl>) -> PlatformResult<()> {
        let ops = self
            .host
            .registry
            .borrow_mut()
            .set_parent(self.handle, parent.map(|p| p.handle))?;
        self.host.apply(ops);
        Ok(())
    }

    pub fn show(&self) -> PlatformResult<()> {
        self.set_hidden(false)
    }

    pub fn hide(&self) -> PlatformResult<()> {
        self.set_hidden(true)
    }

    fn set_hidden(&self, hidden: bool) -> PlatformResult<()> {
        let ops = self
            .host
            .registry
            .borrow_mut()
            .set_hidden(self.handle, hidden)?;
        self.host.apply(ops);
        Ok(())
    }

    pub fn is_visible(&self) -> PlatformResult<bool> {
        self.host.registry.borrow().is_visible(self.handle)
    }

    pub fn set_enabled(&self, enabled: bool) {
        unsafe {
            let _ = EnableWindow(hwnd_of(self.handle), enabled);
        }
    }

    /*
     * Positions this container within its parent during a layout pass: the
     * window is moved into `bounds` directly after the current z-order
     * cursor, the cursor advances to this window, and the container's own
     * nested layout runs synchronously over the new size.
     */
    pub fn position(&self, bounds: Rect, sizing: &mut Sizing) {
        container::position_child_with(
            sizing,
            self.handle,
            bounds,
            |handle, slot, r| {
                let insert_after = match slot {
                    ZOrderSlot::Top => HWND_TOP,
                    ZOrderSlot::After(sibling) => hwnd_of(sibling),
                };
                unsafe {
                    SetWindowPos(
                        hwnd_of(handle),
                        Some(insert_after),
                        r.left,
                        r.top,
                        r.width(),
                        r.height(),
                        SWP_NOACTIVATE,
                    )
                }
                .map_err(|err| {
                    PlatformError::OperationFailed(format!(
                        "error positioning container window: {err}"
                    ))
                })
            },
            |handle| unsafe {
                let _ = SendMessageW(hwnd_of(handle), WM_APP_UPDATE_CHILD, None, None);
            },
        );
    }

    /// Re-runs this container's child layout over its current client
    /// rectangle. Layout managers call this after structural changes.
    pub fn request_update(&self) {
        unsafe {
            let _ = SendMessageW(hwnd_of(self.handle), WM_APP_UPDATE_CHILD, None, None);
        }
    }
}

/*
 * Window procedure for the container class. Installs the boxed `HostContext`
 * from the creation parameters at WM_NCCREATE, releases it at WM_NCDESTROY,
 * and otherwise forwards to `ContainerHost::handle_message`. Windows without
 * a context (or whose host is already gone) fall through to default
 * handling.
 */
unsafe extern "system" fn container_wnd_proc(
    hwnd: HWND,
    msg: u32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    let context_ptr = if msg == WM_NCCREATE {
        let create_struct = unsafe { &*(lparam.0 as *const CREATESTRUCTW) };
        let context_raw_ptr = create_struct.lpCreateParams as *mut HostContext;
        if !context_raw_ptr.is_null() {
            unsafe { SetWindowLongPtrW(hwnd, GWLP_USERDATA, context_raw_ptr as isize) };
        }
        context_raw_ptr
    } else {
        unsafe { GetWindowLongPtrW(hwnd, GWLP_USERDATA) as *mut HostContext }
    };

    if context_ptr.is_null() {
        return unsafe { DefWindowProcW(hwnd, msg, wparam, lparam) };
    }

    let context = unsafe { &*context_ptr };
    let result = match context.host.upgrade() {
        Some(host) => host.handle_message(hwnd, msg, wparam, lparam),
        None => unsafe { DefWindowProcW(hwnd, msg, wparam, lparam) },
    };

    if msg == WM_NCDESTROY {
        let _ = unsafe { Box::from_raw(context_ptr) };
        unsafe { SetWindowLongPtrW(hwnd, GWLP_USERDATA, 0) };
    }
    result
}

fn register_container_class(h_instance: HINSTANCE, class_name: &HSTRING) -> PlatformResult<()> {
    unsafe {
        let mut existing = WNDCLASSEXW::default();
        if GetClassInfoExW(Some(h_instance), PCWSTR(class_name.as_ptr()), &mut existing).is_ok() {
            // Another component already owns this name; refusing keeps our
            // window procedure from ever receiving someone else's windows.
            return Err(PlatformError::InitializationFailed(format!(
                "window class '{CONTAINER_CLASS_NAME}' is already registered"
            )));
        }

        let wc = WNDCLASSEXW {
            cbSize: std::mem::size_of::<WNDCLASSEXW>() as u32,
            style: WNDCLASS_STYLES(0),
            lpfnWndProc: Some(container_wnd_proc),
            cbClsExtra: 0,
            cbWndExtra: 0,
            hInstance: h_instance,
            hIcon: LoadIconW(None, IDI_APPLICATION).map_err(|err| {
                PlatformError::InitializationFailed(format!("error loading default icon: {err}"))
            })?,
            hCursor: LoadCursorW(None, IDC_ARROW).map_err(|err| {
                PlatformError::InitializationFailed(format!("error loading default cursor: {err}"))
            })?,
            hbrBackground: HBRUSH((COLOR_BTNFACE.0 + 1) as *mut c_void),
            lpszMenuName: PCWSTR::null(),
            lpszClassName: PCWSTR(class_name.as_ptr()),
            hIconSm: HICON::default(),
        };
        if RegisterClassExW(&wc) == 0 {
            let err = GetLastError();
            return Err(PlatformError::InitializationFailed(format!(
                "RegisterClassExW failed for container class: {err:?}"
            )));
        }
    }
    Ok(())
}

fn unregister_class_best_effort(h_instance: HINSTANCE, class_name: &HSTRING) {
    if let Err(err) = unsafe { UnregisterClassW(PCWSTR(class_name.as_ptr()), Some(h_instance)) } {
        log::error!("Host: error unregistering container window class: {err}");
    }
}

/// The font used for dialog-unit measurement: the system message font from
/// the current non-client metrics.
fn create_message_font() -> PlatformResult<HFONT> {
    let mut metrics = NONCLIENTMETRICSW {
        cbSize: std::mem::size_of::<NONCLIENTMETRICSW>() as u32,
        ..Default::default()
    };
    unsafe {
        SystemParametersInfoW(
            SPI_GETNONCLIENTMETRICS,
            metrics.cbSize,
            Some(&mut metrics as *mut _ as *mut c_void),
            SYSTEM_PARAMETERS_INFO_UPDATE_FLAGS(0),
        )
    }
    .map_err(|err| {
        PlatformError::InitializationFailed(format!("error querying non-client metrics: {err}"))
    })?;

    let font = unsafe { CreateFontIndirectW(&metrics.lfMessageFont) };
    if font.is_invalid() {
        return Err(PlatformError::InitializationFailed(
            "error creating message font".to_string(),
        ));
    }
    Ok(font)
}

fn create_initial_parent(h_instance: HINSTANCE, class_name: &HSTRING) -> PlatformResult<HWND> {
    let hwnd = unsafe {
        CreateWindowExW(
            WINDOW_EX_STYLE(0),
            class_name,
            None,
            WS_OVERLAPPEDWINDOW,
            0,
            0,
            100,
            100,
            None,
            None,
            Some(h_instance),
            None,
        )
    }
    .map_err(|err| {
        PlatformError::InitializationFailed(format!(
            "error creating initial parent window: {err}"
        ))
    })?;

    // Disabled so it can never be interacted with; it exists only to foster
    // unattached containers and to arbitrate end-session queries.
    unsafe {
        let _ = EnableWindow(hwnd, false);
    }
    Ok(hwnd)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handle_conversion_round_trips() {
        let hwnd = HWND(0x1234isize as *mut c_void);
        assert_eq!(hwnd_of(handle_of(hwnd)), hwnd);
    }

    #[test]
    fn bounce_messages_mirror_their_source_kind() {
        assert_eq!(bounce_message_for(WM_COMMAND), WM_APP_BOUNCE_COMMAND);
        assert_eq!(bounce_message_for(WM_NOTIFY), WM_APP_BOUNCE_NOTIFY);
    }

    #[test]
    fn private_messages_stay_in_the_app_range_and_are_distinct() {
        let messages = [
            WM_APP_BOUNCE_COMMAND,
            WM_APP_BOUNCE_NOTIFY,
            WM_APP_UPDATE_CHILD,
            WM_APP_CONSOLE_END_SESSION,
        ];
        for (i, &a) in messages.iter().enumerate() {
            assert!(a >= WM_APP && a < 0xC000);
            for &b in &messages[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }
}
