//! Constantes Windows y IDs de mensajes

use windows::Win32::UI::WindowsAndMessaging::WM_USER;

/// Tecla lógica decodificada por el hook (wparam = LogicalKey)
pub const WM_USER_KEY_INPUT: u32 = WM_USER + 1;

/// Alterna mover/redimensionar de la persiana destino
pub const WM_USER_TOGGLE_INTERACTIVE: u32 = WM_USER + 2;

/// Mensaje del system tray icon
pub const WM_TRAYICON: u32 = WM_USER + 100;

/// ID del icono en el system tray
pub const TRAY_ICON_ID: u32 = 1;

/// IDs de elementos del menú contextual
pub const IDM_EXIT: u32 = 1001;
pub const IDM_NEW_BLIND: u32 = 1002;
pub const IDM_OPTIONS: u32 = 1003;
pub const IDM_TOGGLE_LOCK: u32 = 1004;

/// IDs de controles del diálogo de opciones
pub const IDC_WIDTH_LABEL: i32 = 2001;
pub const IDC_WIDTH_SLIDER: i32 = 2002;
pub const IDC_WIDTH_VALUE: i32 = 2003;
pub const IDC_HEIGHT_LABEL: i32 = 2004;
pub const IDC_HEIGHT_SLIDER: i32 = 2005;
pub const IDC_HEIGHT_VALUE: i32 = 2006;
pub const IDC_OPACITY_LABEL: i32 = 2007;
pub const IDC_OPACITY_SLIDER: i32 = 2008;
pub const IDC_OPACITY_VALUE: i32 = 2009;
