//! Tipos personalizados y wrappers

use windows::Win32::Foundation::HWND;

/// Wrapper thread-safe para HWND
///
/// HWND es un handle opaco de Windows que puede compartirse entre threads
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct SafeHwnd(pub HWND);

unsafe impl Send for SafeHwnd {}
unsafe impl Sync for SafeHwnd {}

impl SafeHwnd {
    /// Obtiene el HWND interno
    #[inline]
    pub fn get(&self) -> HWND {
        self.0
    }

    /// Representación entera para atomics y mensajes
    #[inline]
    pub fn as_isize(&self) -> isize {
        self.0 .0 as isize
    }
}
