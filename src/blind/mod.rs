//! Módulo de persiana - la ventana que cubre una zona de la pantalla

pub mod resize;
#[cfg(windows)]
pub mod window;
