//! Ventana de persiana: ciclo de vida y proc
//!
//! Una persiana es una ventana sin borde, siempre encima, que cubre una zona
//! de la pantalla. Mientras es interactiva se puede arrastrar desde cualquier
//! punto (el hit-test devuelve HTCAPTION) y redimensionar por los bordes con
//! el contenido bloqueado a cuadrado; al fijarla, ambas cosas se apagan con
//! un único cambio de estilo.

use windows::core::*;
use windows::Win32::Foundation::*;
use windows::Win32::Graphics::Gdi::*;
use windows::Win32::System::LibraryLoader::GetModuleHandleW;
use windows::Win32::UI::WindowsAndMessaging::*;

use super::resize::{lock_aspect, ResizeEdge, ResizeMargins, WindowRect};
use crate::config;
use crate::constants::{WM_USER_KEY_INPUT, WM_USER_TOGGLE_INTERACTIVE};
use crate::hook::LogicalKey;
use crate::registry;
use crate::types::SafeHwnd;

const BLIND_CLASS: PCWSTR = w!("MonitorBlindWindow");

/// Registra la clase de ventana de la persiana
pub unsafe fn register_blind_class(instance: HINSTANCE) -> Result<()> {
    let wc = WNDCLASSEXW {
        cbSize: std::mem::size_of::<WNDCLASSEXW>() as u32,
        style: CS_HREDRAW | CS_VREDRAW,
        lpfnWndProc: Some(blind_proc),
        hInstance: instance,
        hCursor: LoadCursorW(None, IDC_ARROW)?,
        hbrBackground: HBRUSH(GetStockObject(BLACK_BRUSH).0),
        lpszClassName: BLIND_CLASS,
        ..Default::default()
    };

    if RegisterClassExW(&wc) == 0 {
        return Err(Error::from_win32());
    }

    Ok(())
}

/// Crea una persiana con el tamaño exterior indicado, centrada en pantalla
pub unsafe fn create_blind_window(width: i32, height: i32) -> Result<HWND> {
    let instance = GetModuleHandleW(None)?;

    let screen_width = GetSystemMetrics(SM_CXSCREEN);
    let screen_height = GetSystemMetrics(SM_CYSCREEN);
    let x = (screen_width - width) / 2;
    let y = (screen_height - height) / 2;

    let hwnd = CreateWindowExW(
        WS_EX_LAYERED | WS_EX_TOPMOST | WS_EX_TOOLWINDOW,
        BLIND_CLASS,
        w!("MonitorBlind"),
        WS_POPUP | WS_THICKFRAME,
        x,
        y,
        width,
        height,
        None,
        None,
        instance,
        None,
    )?;

    // Solo opacidad; el color se pinta en WM_ERASEBKGND
    let cfg = config::runtime();
    SetLayeredWindowAttributes(hwnd, COLORREF(0), cfg.blind_opacity(), LWA_ALPHA)?;

    tracing::info!(width, height, "persiana creada");
    Ok(hwnd)
}

/// Mide los márgenes marco-contenido de la ventana
///
/// Debe llamarse tras el primer layout; el registro los guarda una sola vez
/// y el bloqueo de proporción los trata como inmutables.
pub unsafe fn measure_margins(hwnd: HWND) -> Option<ResizeMargins> {
    let mut window = RECT::default();
    let mut client = RECT::default();

    GetWindowRect(hwnd, &mut window).ok()?;
    GetClientRect(hwnd, &mut client).ok()?;

    Some(ResizeMargins {
        horizontal: (window.right - window.left) - (client.right - client.left),
        vertical: (window.bottom - window.top) - (client.bottom - client.top),
    })
}

/// Activa o fija la persiana
///
/// Mover con el ratón y los agarres de redimensionado cambian juntos: el
/// hit-test lee el mismo flag que acaba de escribirse y el marco se quita o
/// se pone en un único SetWindowPos con SWP_FRAMECHANGED.
pub unsafe fn set_interactive(hwnd: HWND, enabled: bool) {
    let updated =
        registry::with_manager(|m| {
            if let Some(record) = m.blind_mut(SafeHwnd(hwnd)) {
                record.interactive = enabled;
                true
            } else {
                false
            }
        });

    if updated != Some(true) {
        return;
    }

    let style = GetWindowLongPtrW(hwnd, GWL_STYLE) as u32;
    let style = if enabled {
        style | WS_THICKFRAME.0
    } else {
        style & !WS_THICKFRAME.0
    };
    SetWindowLongPtrW(hwnd, GWL_STYLE, style as isize);

    let _ = SetWindowPos(
        hwnd,
        HWND::default(),
        0,
        0,
        0,
        0,
        SWP_FRAMECHANGED | SWP_NOMOVE | SWP_NOSIZE | SWP_NOZORDER | SWP_NOACTIVATE,
    );

    tracing::debug!(enabled, "persiana interactiva");
}

/// Consulta el flag de interactividad; en reentradas responde "fijada"
unsafe fn is_interactive(hwnd: HWND) -> bool {
    registry::with_manager(|m| {
        m.blind_mut(SafeHwnd(hwnd))
            .map(|r| r.interactive)
            .unwrap_or(false)
    })
    .unwrap_or(false)
}

/// Proc de la ventana de persiana
pub unsafe extern "system" fn blind_proc(
    hwnd: HWND,
    msg: u32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    match msg {
        WM_SIZING => {
            on_sizing(hwnd, wparam, lparam);
            LRESULT(1)
        }
        WM_NCHITTEST => {
            let hit = DefWindowProcW(hwnd, msg, wparam, lparam);
            // Interactiva: el área de cliente arrastra la ventana entera
            if hit.0 == HTCLIENT as isize && is_interactive(hwnd) {
                LRESULT(HTCAPTION as isize)
            } else {
                hit
            }
        }
        WM_USER_KEY_INPUT => {
            if let Some(key) = LogicalKey::from_wparam(wparam.0) {
                on_key_input(hwnd, key);
            }
            LRESULT(0)
        }
        WM_USER_TOGGLE_INTERACTIVE => {
            set_interactive(hwnd, !is_interactive(hwnd));
            LRESULT(0)
        }
        WM_ERASEBKGND => {
            // Pintar la persiana con el color configurado
            let hdc = HDC(wparam.0 as _);
            let mut rect = RECT::default();
            let _ = GetClientRect(hwnd, &mut rect);

            let brush = CreateSolidBrush(COLORREF(config::runtime().blind_color()));
            let _ = FillRect(hdc, &rect, brush);
            let _ = DeleteObject(brush);
            LRESULT(1)
        }
        WM_CLOSE => {
            let _ = DestroyWindow(hwnd);
            LRESULT(0)
        }
        WM_DESTROY => {
            // Si era la última persiana, aquí se libera también el hook
            registry::blind_closed(SafeHwnd(hwnd));
            tracing::info!("persiana cerrada");
            LRESULT(0)
        }
        _ => DefWindowProcW(hwnd, msg, wparam, lparam),
    }
}

/// Reescribe el rectángulo propuesto de WM_SIZING para mantener el cuadrado
unsafe fn on_sizing(hwnd: HWND, wparam: WPARAM, lparam: LPARAM) {
    let Some(edge) = ResizeEdge::from_wparam(wparam.0) else {
        return;
    };

    // Sin márgenes capturados el bloqueo se degrada a "sin bloqueo"
    let margins = registry::with_manager(|m| {
        m.blind_mut(SafeHwnd(hwnd)).and_then(|r| r.margins)
    })
    .flatten();
    let Some(margins) = margins else {
        return;
    };

    let rect = &mut *(lparam.0 as *mut RECT);
    let locked = lock_aspect(
        edge,
        WindowRect::new(rect.left, rect.top, rect.right, rect.bottom),
        margins,
    );

    rect.left = locked.left;
    rect.top = locked.top;
    rect.right = locked.right;
    rect.bottom = locked.bottom;
}

/// Acciones locales de la persiana para las teclas del hook global
unsafe fn on_key_input(hwnd: HWND, key: LogicalKey) {
    match key {
        LogicalKey::MoveLeft => nudge(hwnd, -1, 0),
        LogicalKey::MoveUp => nudge(hwnd, 0, -1),
        LogicalKey::MoveRight => nudge(hwnd, 1, 0),
        LogicalKey::MoveDown => nudge(hwnd, 0, 1),
        LogicalKey::Duplicate => {
            let mut rect = RECT::default();
            if GetWindowRect(hwnd, &mut rect).is_ok() {
                if let Err(e) =
                    registry::show_blind(rect.right - rect.left, rect.bottom - rect.top)
                {
                    tracing::error!(error = %e, "no se pudo duplicar la persiana");
                }
            }
        }
        LogicalKey::ToggleInteractive => set_interactive(hwnd, !is_interactive(hwnd)),
        LogicalKey::CloseBlind => {
            let _ = PostMessageW(hwnd, WM_CLOSE, WPARAM(0), LPARAM(0));
        }
    }
}

/// Desplaza la persiana un píxel
unsafe fn nudge(hwnd: HWND, dx: i32, dy: i32) {
    let mut rect = RECT::default();
    if GetWindowRect(hwnd, &mut rect).is_ok() {
        let _ = SetWindowPos(
            hwnd,
            HWND::default(),
            rect.left + dx,
            rect.top + dy,
            0,
            0,
            SWP_NOSIZE | SWP_NOZORDER | SWP_NOACTIVATE,
        );
    }
}
