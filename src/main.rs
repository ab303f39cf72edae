//! MonitorBlind - persiana de pantalla
//!
//! Cubre zonas del monitor con ventanas opacas siempre encima. Se controla
//! desde el icono del tray y con atajos de teclado globales: las flechas
//! desplazan la persiana actual un píxel, F7 la duplica, F8 alterna
//! mover/redimensionar y F9 la cierra, tenga o no el foco.

#![cfg_attr(target_os = "windows", windows_subsystem = "windows")]

// Fuera de Windows estos módulos solo los ejercitan los tests
#[cfg_attr(not(windows), allow(dead_code))]
mod blind;
#[cfg_attr(not(windows), allow(dead_code))]
mod config;
#[cfg(windows)]
mod constants;
#[cfg_attr(not(windows), allow(dead_code))]
mod hook;
#[cfg_attr(not(windows), allow(dead_code))]
mod registry;
#[cfg(windows)]
mod settings_dialog;
#[cfg(windows)]
mod tray;
#[cfg(windows)]
mod types;

use tracing_subscriber::EnvFilter;

/// Inicializa tracing hacia un archivo junto al ejecutable
///
/// La aplicación no tiene consola (windows_subsystem), así que stderr no
/// sirve de nada; si el archivo no se puede abrir se cae a stderr igualmente.
fn init_logging() {
    let log_file = std::env::current_exe()
        .ok()
        .map(|exe| exe.with_extension("log"))
        .and_then(|path| std::fs::File::create(path).ok());

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match log_file {
        Some(file) => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(std::sync::Arc::new(file))
                .init();
        }
        None => {
            tracing_subscriber::fmt().with_env_filter(filter).init();
        }
    }
}

#[cfg(windows)]
fn main() -> anyhow::Result<()> {
    use windows::Win32::System::LibraryLoader::GetModuleHandleW;
    use windows::Win32::UI::WindowsAndMessaging::{
        DispatchMessageW, GetMessageW, TranslateMessage, MSG,
    };

    init_logging();

    // Cargar configuración persistida (o valores por defecto)
    let settings = config::load_config();
    config::runtime().load_from(&settings);

    unsafe {
        let instance = GetModuleHandleW(None)?;
        blind::window::register_blind_class(instance.into())?;

        // Ventana oculta que aloja el icono del tray y su menú
        let tray_hwnd = tray_host::create(instance.into())?;
        tray::add_tray_icon(tray_hwnd)?;

        // Persiana inicial con las dimensiones configuradas
        if let Err(e) = registry::show_startup_blind() {
            tracing::error!(error = %e, "no se pudo crear la persiana inicial");
        }

        // Balloon de bienvenida solo la primera vez
        tray::show_first_run_balloon(tray_hwnd);

        // Bucle de mensajes
        let mut msg = MSG::default();
        loop {
            let ret = GetMessageW(&mut msg, None, 0, 0);
            if ret.0 == 0 || ret.0 == -1 {
                break; // WM_QUIT o error
            }
            let _ = TranslateMessage(&msg);
            let _ = DispatchMessageW(&msg);
        }

        // Limpieza determinista: icono fuera y hook desinstalado
        tray::remove_tray_icon(tray_hwnd);
        hook::uninstall();
    }

    Ok(())
}

#[cfg(not(windows))]
fn main() {
    init_logging();
    eprintln!("monitor-blind solo funciona en Windows");
}

/// Ventana oculta que recibe los mensajes del tray
#[cfg(windows)]
mod tray_host {
    use windows::core::*;
    use windows::Win32::Foundation::*;
    use windows::Win32::UI::WindowsAndMessaging::*;

    use crate::constants::{IDM_EXIT, WM_TRAYICON};
    use crate::tray;

    const TRAY_HOST_CLASS: PCWSTR = w!("MonitorBlindTray");

    /// Crea la ventana anfitriona del tray (nunca se muestra)
    pub unsafe fn create(instance: HINSTANCE) -> Result<HWND> {
        let wc = WNDCLASSW {
            lpfnWndProc: Some(tray_host_proc),
            hInstance: instance,
            lpszClassName: TRAY_HOST_CLASS,
            ..Default::default()
        };

        if RegisterClassW(&wc) == 0 {
            return Err(Error::from_win32());
        }

        CreateWindowExW(
            WINDOW_EX_STYLE::default(),
            TRAY_HOST_CLASS,
            w!("MonitorBlind"),
            WS_OVERLAPPED,
            0,
            0,
            0,
            0,
            HWND_MESSAGE,
            None,
            instance,
            None,
        )
    }

    unsafe extern "system" fn tray_host_proc(
        hwnd: HWND,
        msg: u32,
        wparam: WPARAM,
        lparam: LPARAM,
    ) -> LRESULT {
        match msg {
            WM_TRAYICON => {
                tray::handle_tray_message(hwnd, lparam);
                LRESULT(0)
            }
            WM_COMMAND => {
                let command = wparam.0 as u32;
                if command == IDM_EXIT {
                    tray::remove_tray_icon(hwnd);
                    PostQuitMessage(0);
                } else {
                    tray::handle_tray_command(command);
                }
                LRESULT(0)
            }
            WM_DESTROY => {
                PostQuitMessage(0);
                LRESULT(0)
            }
            _ => DefWindowProcW(hwnd, msg, wparam, lparam),
        }
    }
}
