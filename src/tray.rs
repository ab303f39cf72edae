//! System tray icon y menú contextual

use windows::core::*;
use windows::Win32::Foundation::{COLORREF, HWND, LPARAM, POINT, RECT, WPARAM};
use windows::Win32::Graphics::Gdi::*;
use windows::Win32::UI::Shell::*;
use windows::Win32::UI::WindowsAndMessaging::*;

use crate::config;
use crate::constants::{
    IDM_EXIT, IDM_NEW_BLIND, IDM_OPTIONS, IDM_TOGGLE_LOCK, TRAY_ICON_ID,
    WM_USER_TOGGLE_INTERACTIVE, WM_TRAYICON,
};
use crate::registry;

/// Crea un icono personalizado para el system tray
/// Dibuja una persiana: un cuadrado oscuro con lamas horizontales claras
unsafe fn create_embedded_icon() -> Result<HICON> {
    const ICON_SIZE: i32 = 16;

    // Obtener DC de pantalla
    let screen_dc = GetDC(None);
    if screen_dc.is_invalid() {
        return Err(Error::from_win32());
    }

    // Crear DCs compatibles para el icono y la máscara
    let icon_dc = CreateCompatibleDC(screen_dc);
    let mask_dc = CreateCompatibleDC(screen_dc);

    if icon_dc.is_invalid() || mask_dc.is_invalid() {
        let _ = ReleaseDC(None, screen_dc);
        return Err(Error::from_win32());
    }

    // Crear bitmaps
    let icon_bitmap = CreateCompatibleBitmap(screen_dc, ICON_SIZE, ICON_SIZE);
    let mask_bitmap = CreateCompatibleBitmap(screen_dc, ICON_SIZE, ICON_SIZE);

    if icon_bitmap.is_invalid() || mask_bitmap.is_invalid() {
        let _ = DeleteDC(icon_dc);
        let _ = DeleteDC(mask_dc);
        let _ = ReleaseDC(None, screen_dc);
        return Err(Error::from_win32());
    }

    // Seleccionar bitmaps en los DCs
    let old_icon_bmp = SelectObject(icon_dc, icon_bitmap);
    let old_mask_bmp = SelectObject(mask_dc, mask_bitmap);

    let rect = RECT {
        left: 0,
        top: 0,
        right: ICON_SIZE,
        bottom: ICON_SIZE,
    };

    // Máscara: todo negro = opaco (el icono ocupa el cuadrado entero)
    let black_brush = CreateSolidBrush(COLORREF(0x00000000));
    let _ = FillRect(mask_dc, &rect, black_brush);
    let _ = DeleteObject(black_brush);

    // Fondo del icono: gris oscuro
    let dark_brush = CreateSolidBrush(COLORREF(0x00303030));
    let _ = FillRect(icon_dc, &rect, dark_brush);
    let _ = DeleteObject(dark_brush);

    // Lamas horizontales claras
    let slat_brush = CreateSolidBrush(COLORREF(0x00AAAAAA));
    let mut y = 2;
    while y < ICON_SIZE - 1 {
        let slat = RECT {
            left: 1,
            top: y,
            right: ICON_SIZE - 1,
            bottom: y + 1,
        };
        let _ = FillRect(icon_dc, &slat, slat_brush);
        y += 3;
    }
    let _ = DeleteObject(slat_brush);

    // Crear el icono
    let icon_info = ICONINFO {
        fIcon: true.into(),
        xHotspot: 0,
        yHotspot: 0,
        hbmMask: mask_bitmap,
        hbmColor: icon_bitmap,
    };

    let icon = CreateIconIndirect(&icon_info)?;

    // Limpiar recursos
    let _ = SelectObject(icon_dc, old_icon_bmp);
    let _ = SelectObject(mask_dc, old_mask_bmp);
    let _ = DeleteObject(icon_bitmap);
    let _ = DeleteObject(mask_bitmap);
    let _ = DeleteDC(icon_dc);
    let _ = DeleteDC(mask_dc);
    let _ = ReleaseDC(None, screen_dc);

    Ok(icon)
}

/// Añade el icono al system tray
pub unsafe fn add_tray_icon(hwnd: HWND) -> Result<()> {
    let mut nid = NOTIFYICONDATAW {
        cbSize: std::mem::size_of::<NOTIFYICONDATAW>() as u32,
        hWnd: hwnd,
        uID: TRAY_ICON_ID,
        uFlags: NIF_ICON | NIF_MESSAGE | NIF_TIP,
        uCallbackMessage: WM_TRAYICON,
        hIcon: create_embedded_icon()?,
        ..Default::default()
    };

    // Tooltip
    let tooltip = w!("MonitorBlind - persiana de pantalla");
    let tooltip_bytes = tooltip.as_wide();
    let copy_len = tooltip_bytes.len().min(nid.szTip.len() - 1);
    nid.szTip[..copy_len].copy_from_slice(&tooltip_bytes[..copy_len]);

    if Shell_NotifyIconW(NIM_ADD, &nid).as_bool() {
        Ok(())
    } else {
        Err(Error::from_win32())
    }
}

/// Elimina el icono del system tray
pub unsafe fn remove_tray_icon(hwnd: HWND) {
    let nid = NOTIFYICONDATAW {
        cbSize: std::mem::size_of::<NOTIFYICONDATAW>() as u32,
        hWnd: hwnd,
        uID: TRAY_ICON_ID,
        ..Default::default()
    };

    let _ = Shell_NotifyIconW(NIM_DELETE, &nid);
}

/// Balloon tip de bienvenida, solo en la primera ejecución
pub unsafe fn show_first_run_balloon(hwnd: HWND) {
    let cfg = config::runtime();
    if !cfg.initial_running() {
        return;
    }

    let mut nid = NOTIFYICONDATAW {
        cbSize: std::mem::size_of::<NOTIFYICONDATAW>() as u32,
        hWnd: hwnd,
        uID: TRAY_ICON_ID,
        uFlags: NIF_INFO,
        dwInfoFlags: NIIF_INFO,
        ..Default::default()
    };

    let title = w!("MonitorBlind");
    let title_bytes = title.as_wide();
    let copy_len = title_bytes.len().min(nid.szInfoTitle.len() - 1);
    nid.szInfoTitle[..copy_len].copy_from_slice(&title_bytes[..copy_len]);

    let info = w!("La persiana sigue activa desde el icono del tray");
    let info_bytes = info.as_wide();
    let copy_len = info_bytes.len().min(nid.szInfo.len() - 1);
    nid.szInfo[..copy_len].copy_from_slice(&info_bytes[..copy_len]);

    let _ = Shell_NotifyIconW(NIM_MODIFY, &nid);

    // Marcar la primera ejecución como consumida y persistirlo
    cfg.set_initial_running(false);
    if let Err(e) = config::save_config(&cfg.to_settings()) {
        tracing::warn!(error = %e, "no se pudo persistir el flag de primera ejecución");
    }
}

/// Muestra el menú contextual del system tray
unsafe fn show_tray_menu(hwnd: HWND) -> Result<()> {
    let hmenu = CreatePopupMenu()?;

    // Añadir elementos del menú
    let _ = AppendMenuW(
        hmenu,
        MF_STRING,
        IDM_NEW_BLIND as usize,
        w!("Nueva persiana"),
    );
    let _ = AppendMenuW(
        hmenu,
        MF_STRING,
        IDM_TOGGLE_LOCK as usize,
        w!("Fijar/soltar persiana"),
    );
    let _ = AppendMenuW(hmenu, MF_STRING, IDM_OPTIONS as usize, w!("Opciones..."));
    let _ = AppendMenuW(hmenu, MF_SEPARATOR, 0, PCWSTR::null());
    let _ = AppendMenuW(hmenu, MF_STRING, IDM_EXIT as usize, w!("Salir"));

    // Obtener posición del cursor para el menú
    let mut pt = POINT::default();
    let _ = GetCursorPos(&mut pt);

    // Hacer que la ventana sea foreground para que el menú se cierre correctamente
    let _ = SetForegroundWindow(hwnd);

    // Mostrar menú
    let _ = TrackPopupMenu(hmenu, TPM_RIGHTBUTTON, pt.x, pt.y, 0, hwnd, None);

    // Limpiar
    let _ = DestroyMenu(hmenu);
    Ok(())
}

/// Maneja los mensajes del system tray
pub unsafe fn handle_tray_message(hwnd: HWND, lparam: LPARAM) {
    match lparam.0 as u32 {
        WM_RBUTTONUP => {
            let _ = show_tray_menu(hwnd);
        }
        WM_LBUTTONDBLCLK => {
            // Doble click - abrir opciones
            if let Err(e) = registry::show_settings() {
                tracing::error!(error = %e, "no se pudo abrir el diálogo de opciones");
            }
        }
        _ => {}
    }
}

/// Maneja los comandos del menú del system tray
pub unsafe fn handle_tray_command(command: u32) {
    match command {
        IDM_NEW_BLIND => {
            if let Err(e) = registry::show_startup_blind() {
                tracing::error!(error = %e, "no se pudo crear la persiana");
            }
        }
        IDM_OPTIONS => {
            if let Err(e) = registry::show_settings() {
                tracing::error!(error = %e, "no se pudo abrir el diálogo de opciones");
            }
        }
        IDM_TOGGLE_LOCK => {
            // Alternar la persiana "actual" (la última de la lista)
            let target = registry::with_manager(|m| m.blind_handles().last().copied()).flatten();
            if let Some(handle) = target {
                let _ = PostMessageW(
                    handle.get(),
                    WM_USER_TOGGLE_INTERACTIVE,
                    WPARAM(0),
                    LPARAM(0),
                );
            }
        }
        _ => {}
    }
}
