//! Hook global de teclado
//!
//! Un único hook WH_KEYBOARD_LL por proceso. El hook observa, nunca consume:
//! cada evento se reenvía siempre a la cadena con CallNextHookEx. Solo los
//! "key up" decodificados se despachan, y el despacho es un PostMessageW a la
//! ventana destino del router, nunca trabajo largo dentro del callback.

use std::sync::atomic::{AtomicIsize, Ordering};

/// Mensaje de tecla soltada (WM_KEYUP)
const MSG_KEY_UP: u32 = 0x0101;

// Códigos de tecla virtual de Windows
const VK_LEFT: u32 = 0x25;
const VK_UP: u32 = 0x26;
const VK_RIGHT: u32 = 0x27;
const VK_DOWN: u32 = 0x28;
const VK_F7: u32 = 0x76;
const VK_F8: u32 = 0x77;
const VK_F9: u32 = 0x78;

/// Tecla lógica con significado para la persiana
///
/// El discriminante viaja como wparam de WM_USER_KEY_INPUT, por eso el
/// repr(usize) y el round-trip explícito en from_wparam.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(usize)]
pub enum LogicalKey {
    MoveLeft = 1,
    MoveUp = 2,
    MoveRight = 3,
    MoveDown = 4,
    Duplicate = 5,
    ToggleInteractive = 6,
    CloseBlind = 7,
}

/// Tabla única tecla-virtual → tecla lógica; las dos decodificaciones y el
/// round-trip derivan de aquí, así añadir una tecla no puede desincronizarlas
const KEY_TABLE: [(u32, LogicalKey); 7] = [
    (VK_LEFT, LogicalKey::MoveLeft),
    (VK_UP, LogicalKey::MoveUp),
    (VK_RIGHT, LogicalKey::MoveRight),
    (VK_DOWN, LogicalKey::MoveDown),
    (VK_F7, LogicalKey::Duplicate),
    (VK_F8, LogicalKey::ToggleInteractive),
    (VK_F9, LogicalKey::CloseBlind),
];

impl LogicalKey {
    /// Decodifica un código de tecla virtual
    pub fn from_vk(vk_code: u32) -> Option<Self> {
        KEY_TABLE
            .iter()
            .find(|(vk, _)| *vk == vk_code)
            .map(|(_, key)| *key)
    }

    /// Reconstruye la tecla desde el wparam de WM_USER_KEY_INPUT
    pub fn from_wparam(wparam: usize) -> Option<Self> {
        KEY_TABLE
            .iter()
            .find(|(_, key)| *key as usize == wparam)
            .map(|(_, key)| *key)
    }
}

/// Solo las transiciones de "soltar tecla" se despachan a la aplicación
#[inline]
pub fn is_key_up_message(msg: u32) -> bool {
    msg == MSG_KEY_UP
}

/// Códigos negativos: el evento no es para esta aplicación y debe
/// reenviarse a la cadena sin mirarlo siquiera
#[inline]
pub fn is_pass_through(code: i32) -> bool {
    code < 0
}

/// Ranura única para el handle del hook de proceso
///
/// Garantiza que haya como mucho un hook activo: adquirir con uno activo es
/// un no-op, liberar sin hook activo también.
pub struct HookSlot(AtomicIsize);

impl HookSlot {
    pub const fn new() -> Self {
        Self(AtomicIsize::new(0))
    }

    /// Reserva la ranura; devuelve false si ya había un hook activo
    pub fn try_acquire(&self) -> bool {
        self.0
            .compare_exchange(0, -1, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Publica el handle recién instalado
    pub fn publish(&self, handle: isize) {
        self.0.store(handle, Ordering::Release);
    }

    /// Deshace una reserva cuya instalación falló
    pub fn abandon(&self) {
        self.0.store(0, Ordering::Release);
    }

    /// Vacía la ranura y devuelve el handle a desinstalar, si lo había
    pub fn release(&self) -> Option<isize> {
        match self.0.swap(0, Ordering::AcqRel) {
            0 => None,
            handle => Some(handle),
        }
    }

    pub fn is_active(&self) -> bool {
        self.0.load(Ordering::Acquire) != 0
    }
}

/// Router de una sola ranura para el destino de las teclas decodificadas
///
/// Hay un solo consumidor lógico activo a la vez: la ventana "actual". Un
/// registro nuevo sustituye al anterior, no hay fan-out por ventana.
pub struct KeyRouter(AtomicIsize);

impl KeyRouter {
    pub const fn new() -> Self {
        Self(AtomicIsize::new(0))
    }

    pub fn set_target(&self, hwnd: isize) {
        self.0.store(hwnd, Ordering::Release);
    }

    /// Desregistra el destino solo si sigue siendo el indicado
    pub fn clear_target(&self, hwnd: isize) {
        let _ = self
            .0
            .compare_exchange(hwnd, 0, Ordering::AcqRel, Ordering::Acquire);
    }

    pub fn target(&self) -> Option<isize> {
        match self.0.load(Ordering::Acquire) {
            0 => None,
            hwnd => Some(hwnd),
        }
    }
}

/// Handle del hook de teclado del proceso
static KEYBOARD_HOOK: HookSlot = HookSlot::new();

/// Destino actual de las teclas decodificadas
static KEY_ROUTER: KeyRouter = KeyRouter::new();

#[cfg(windows)]
pub use platform::{install, is_installed, uninstall};

/// Registra la ventana que recibe WM_USER_KEY_INPUT
pub fn set_key_target(hwnd: isize) {
    KEY_ROUTER.set_target(hwnd);
}

/// Desregistra la ventana si todavía es el destino actual
pub fn clear_key_target(hwnd: isize) {
    KEY_ROUTER.clear_target(hwnd);
}

#[cfg(windows)]
mod platform {
    use super::{is_key_up_message, is_pass_through, LogicalKey, KEYBOARD_HOOK, KEY_ROUTER};
    use crate::constants::WM_USER_KEY_INPUT;
    use windows::Win32::Foundation::{HWND, LPARAM, LRESULT, WPARAM};
    use windows::Win32::System::LibraryLoader::GetModuleHandleW;
    use windows::Win32::UI::WindowsAndMessaging::{
        CallNextHookEx, PostMessageW, SetWindowsHookExW, UnhookWindowsHookEx, HHOOK,
        KBDLLHOOKSTRUCT, WH_KEYBOARD_LL,
    };

    /// Instala el hook de teclado si no hay uno activo
    ///
    /// Idempotente: una segunda llamada con el hook vivo no hace nada. Si el
    /// sistema rechaza la instalación se informa una vez y la aplicación
    /// sigue sin atajos globales.
    pub fn install() -> windows::core::Result<()> {
        if !KEYBOARD_HOOK.try_acquire() {
            return Ok(());
        }

        let instance = match unsafe { GetModuleHandleW(None) } {
            Ok(instance) => instance,
            Err(e) => {
                KEYBOARD_HOOK.abandon();
                return Err(e);
            }
        };

        match unsafe { SetWindowsHookExW(WH_KEYBOARD_LL, Some(keyboard_hook_proc), instance, 0) } {
            Ok(hook) => {
                KEYBOARD_HOOK.publish(hook.0 as isize);
                tracing::debug!("hook de teclado instalado");
                Ok(())
            }
            Err(e) => {
                KEYBOARD_HOOK.abandon();
                tracing::error!(error = %e, "no se pudo instalar el hook de teclado");
                Err(e)
            }
        }
    }

    /// Desinstala el hook si está activo; no-op en caso contrario
    pub fn uninstall() {
        if let Some(handle) = KEYBOARD_HOOK.release() {
            unsafe {
                let _ = UnhookWindowsHookEx(HHOOK(handle as *mut _));
            }
            tracing::debug!("hook de teclado desinstalado");
        }
    }

    pub fn is_installed() -> bool {
        KEYBOARD_HOOK.is_active()
    }

    /// Callback del hook: decodifica y reenvía, nunca bloquea ni consume
    unsafe extern "system" fn keyboard_hook_proc(
        code: i32,
        wparam: WPARAM,
        lparam: LPARAM,
    ) -> LRESULT {
        if is_pass_through(code) {
            return CallNextHookEx(None, code, wparam, lparam);
        }

        if is_key_up_message(wparam.0 as u32) {
            let kb = &*(lparam.0 as *const KBDLLHOOKSTRUCT);
            if let Some(key) = LogicalKey::from_vk(kb.vkCode) {
                if let Some(target) = KEY_ROUTER.target() {
                    let _ = PostMessageW(
                        HWND(target as *mut _),
                        WM_USER_KEY_INPUT,
                        WPARAM(key as usize),
                        LPARAM(0),
                    );
                }
            }
        }

        CallNextHookEx(None, code, wparam, lparam)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodifica_las_flechas() {
        assert_eq!(LogicalKey::from_vk(VK_LEFT), Some(LogicalKey::MoveLeft));
        assert_eq!(LogicalKey::from_vk(VK_UP), Some(LogicalKey::MoveUp));
        assert_eq!(LogicalKey::from_vk(VK_RIGHT), Some(LogicalKey::MoveRight));
        assert_eq!(LogicalKey::from_vk(VK_DOWN), Some(LogicalKey::MoveDown));
    }

    #[test]
    fn decodifica_las_teclas_de_accion() {
        assert_eq!(LogicalKey::from_vk(VK_F7), Some(LogicalKey::Duplicate));
        assert_eq!(
            LogicalKey::from_vk(VK_F8),
            Some(LogicalKey::ToggleInteractive)
        );
        assert_eq!(LogicalKey::from_vk(VK_F9), Some(LogicalKey::CloseBlind));
    }

    #[test]
    fn ignora_teclas_sin_significado() {
        assert_eq!(LogicalKey::from_vk(0x41), None); // 'A'
        assert_eq!(LogicalKey::from_vk(0x0D), None); // Enter
        assert_eq!(LogicalKey::from_vk(0), None);
    }

    #[test]
    fn wparam_round_trip() {
        for (vk, key) in KEY_TABLE {
            assert_eq!(LogicalKey::from_vk(vk), Some(key));
            assert_eq!(LogicalKey::from_wparam(key as usize), Some(key));
        }
        assert_eq!(LogicalKey::from_wparam(0), None);
        assert_eq!(LogicalKey::from_wparam(99), None);
    }

    #[test]
    fn la_tabla_de_teclas_no_tiene_duplicados() {
        for (i, (vk_a, key_a)) in KEY_TABLE.iter().enumerate() {
            for (vk_b, key_b) in &KEY_TABLE[i + 1..] {
                assert_ne!(vk_a, vk_b);
                assert_ne!(*key_a as usize, *key_b as usize);
            }
        }
    }

    #[test]
    fn solo_se_despachan_los_key_up() {
        assert!(is_key_up_message(0x0101)); // WM_KEYUP
        assert!(!is_key_up_message(0x0100)); // WM_KEYDOWN
        assert!(!is_key_up_message(0x0105)); // WM_SYSKEYUP
    }

    #[test]
    fn los_codigos_negativos_pasan_sin_clasificar() {
        assert!(is_pass_through(-1));
        assert!(is_pass_through(i32::MIN));
        assert!(!is_pass_through(0)); // HC_ACTION
        assert!(!is_pass_through(3)); // HC_NOREMOVE
    }

    #[test]
    fn la_ranura_del_hook_es_idempotente() {
        let slot = HookSlot::new();
        assert!(!slot.is_active());

        // Primera adquisición gana, la segunda es no-op
        assert!(slot.try_acquire());
        slot.publish(0x1234);
        assert!(slot.is_active());
        assert!(!slot.try_acquire());

        // Liberar devuelve el handle una sola vez
        assert_eq!(slot.release(), Some(0x1234));
        assert!(!slot.is_active());
        assert_eq!(slot.release(), None);

        // Tras liberar se puede volver a adquirir
        assert!(slot.try_acquire());
        slot.abandon();
        assert!(!slot.is_active());
    }

    #[test]
    fn nunca_hay_mas_de_un_hook_activo() {
        let slot = HookSlot::new();
        let mut activos = 0i32;

        // Secuencia arbitraria de install/uninstall sobre la ranura
        for op in [true, true, false, true, false, false, true, true] {
            if op {
                if slot.try_acquire() {
                    slot.publish(1);
                    activos += 1;
                }
            } else if slot.release().is_some() {
                activos -= 1;
            }
            assert!((0..=1).contains(&activos));
            assert_eq!(slot.is_active(), activos == 1);
        }
    }

    #[test]
    fn el_router_es_de_ranura_unica() {
        let router = KeyRouter::new();
        assert_eq!(router.target(), None);

        router.set_target(10);
        assert_eq!(router.target(), Some(10));

        // Un registro nuevo sustituye al anterior
        router.set_target(20);
        assert_eq!(router.target(), Some(20));

        // Limpiar con un destino obsoleto no toca el actual
        router.clear_target(10);
        assert_eq!(router.target(), Some(20));

        router.clear_target(20);
        assert_eq!(router.target(), None);
    }
}
