//! Registro de instancias de ventana
//!
//! Lleva la cuenta de las persianas vivas y del diálogo de opciones (como
//! mucho uno). Las persianas no se deduplican: varias a la vez es un caso de
//! uso soportado. La construcción real de ventanas queda detrás del trait
//! `WindowFactory`, que en producción es Win32 y en los tests un fake.

use anyhow::Result;

use crate::blind::resize::ResizeMargins;

/// Colaborador que construye y muestra ventanas
pub trait WindowFactory {
    type Handle: Copy + PartialEq;

    /// Crea una persiana con el tamaño exterior indicado (sin mostrarla)
    fn create_blind(&mut self, width: i32, height: i32) -> Result<Self::Handle>;

    /// Crea el diálogo de opciones con la persiana indicada como dueña
    fn create_settings(&mut self, owner: Self::Handle) -> Result<Self::Handle>;

    /// Muestra una ventana ya creada
    fn show(&mut self, handle: Self::Handle);
}

/// Estado mutable de una persiana viva
pub struct BlindRecord<H> {
    pub handle: H,
    /// Permitido mover y redimensionar con el ratón
    pub interactive: bool,
    /// Márgenes marco-contenido, capturados una sola vez tras el primer layout
    pub margins: Option<ResizeMargins>,
}

/// Dueño exclusivo del estado del registro
pub struct ViewManager<F: WindowFactory> {
    factory: F,
    blinds: Vec<BlindRecord<F::Handle>>,
    main_visible: bool,
    settings_visible: bool,
}

impl<F: WindowFactory> ViewManager<F> {
    pub const fn new(factory: F) -> Self {
        Self {
            factory,
            blinds: Vec::new(),
            main_visible: false,
            settings_visible: false,
        }
    }

    /// Crea y muestra una persiana nueva; siempre construye otra instancia
    ///
    /// Un fallo de construcción se propaga al llamador, sin reintentos.
    pub fn request_show_blind(&mut self, width: i32, height: i32) -> Result<F::Handle> {
        let handle = self.factory.create_blind(width, height)?;

        self.blinds.push(BlindRecord {
            handle,
            interactive: true,
            margins: None,
        });

        self.factory.show(handle);
        self.main_visible = true;

        Ok(handle)
    }

    /// Muestra el diálogo de opciones, creando antes una persiana si no hay
    ///
    /// El diálogo es singleton: si ya está visible la petición es un no-op.
    pub fn request_show_settings(&mut self, default_width: i32, default_height: i32) -> Result<()> {
        // El diálogo necesita una ventana dueña
        if self.blinds.is_empty() {
            self.request_show_blind(default_width, default_height)?;
        }

        if !self.settings_visible {
            let owner = self.blinds[0].handle;
            let dialog = self.factory.create_settings(owner)?;
            self.settings_visible = true;
            self.factory.show(dialog);
        }

        Ok(())
    }

    /// Elimina una persiana cerrada; devuelve la nueva persiana "actual"
    /// (la última de la lista) o None si ya no queda ninguna
    pub fn notify_blind_closed(&mut self, handle: F::Handle) -> Option<F::Handle> {
        self.blinds.retain(|r| r.handle != handle);

        if self.blinds.is_empty() {
            self.main_visible = false;
            None
        } else {
            Some(self.blinds[self.blinds.len() - 1].handle)
        }
    }

    /// El diálogo de opciones se cerró
    pub fn notify_settings_closed(&mut self) {
        self.settings_visible = false;
    }

    #[allow(dead_code)]
    pub fn is_main_visible(&self) -> bool {
        self.main_visible
    }

    #[allow(dead_code)]
    pub fn is_settings_visible(&self) -> bool {
        self.settings_visible
    }

    pub fn blind_count(&self) -> usize {
        self.blinds.len()
    }

    /// Acceso mutable al registro de una persiana concreta
    pub fn blind_mut(&mut self, handle: F::Handle) -> Option<&mut BlindRecord<F::Handle>> {
        self.blinds.iter_mut().find(|r| r.handle == handle)
    }

    /// Captura los márgenes una sola vez; escrituras posteriores se ignoran
    pub fn set_margins_once(&mut self, handle: F::Handle, margins: ResizeMargins) {
        if let Some(record) = self.blind_mut(handle) {
            if record.margins.is_none() {
                record.margins = Some(margins);
            }
        }
    }

    /// Handles de todas las persianas vivas
    pub fn blind_handles(&self) -> Vec<F::Handle> {
        self.blinds.iter().map(|r| r.handle).collect()
    }
}

#[cfg(windows)]
pub use win32::{
    blind_closed, settings_closed, show_blind, show_settings, show_startup_blind, with_manager,
    Win32WindowFactory,
};

#[cfg(windows)]
mod win32 {
    use super::{ViewManager, WindowFactory};
    use crate::config;
    use crate::hook;
    use crate::types::SafeHwnd;
    use anyhow::{Context, Result};
    use std::sync::Mutex;
    use windows::Win32::UI::WindowsAndMessaging::{ShowWindow, SW_SHOW};

    /// Fábrica de ventanas real sobre Win32
    pub struct Win32WindowFactory;

    impl WindowFactory for Win32WindowFactory {
        type Handle = SafeHwnd;

        fn create_blind(&mut self, width: i32, height: i32) -> Result<SafeHwnd> {
            let hwnd = unsafe { crate::blind::window::create_blind_window(width, height) }
                .context("No se pudo crear la ventana de persiana")?;
            Ok(SafeHwnd(hwnd))
        }

        fn create_settings(&mut self, owner: SafeHwnd) -> Result<SafeHwnd> {
            let hwnd = unsafe { crate::settings_dialog::create_settings_dialog(owner.get()) }
                .context("No se pudo crear el diálogo de opciones")?;
            Ok(SafeHwnd(hwnd))
        }

        fn show(&mut self, handle: SafeHwnd) {
            unsafe {
                let _ = ShowWindow(handle.get(), SW_SHOW);
            }
        }
    }

    /// Instancia global del registro
    static VIEW_MANAGER: Mutex<ViewManager<Win32WindowFactory>> =
        Mutex::new(ViewManager::new(Win32WindowFactory));

    /// Ejecuta una operación sobre el registro global
    ///
    /// CreateWindow/ShowWindow despachan mensajes de forma síncrona, así que
    /// un proc de ventana puede reentrar aquí con el lock ya tomado. En ese
    /// caso se devuelve None y el mensaje cae en su comportamiento por
    /// defecto, en lugar de bloquear el hilo de mensajes.
    pub fn with_manager<R>(
        f: impl FnOnce(&mut ViewManager<Win32WindowFactory>) -> R,
    ) -> Option<R> {
        match VIEW_MANAGER.try_lock() {
            Ok(mut manager) => Some(f(&mut manager)),
            Err(_) => None,
        }
    }

    /// Crea y muestra una persiana, cableando hook y router
    pub fn show_blind(width: i32, height: i32) -> Result<SafeHwnd> {
        let (handle, count) = with_manager(|m| {
            let handle = m.request_show_blind(width, height)?;
            Ok::<_, anyhow::Error>((handle, m.blind_count()))
        })
        .context("registro ocupado")??;

        // Fuera del lock: medir márgenes y enganchar los atajos globales
        finish_blind_setup(handle, count);
        Ok(handle)
    }

    /// Persiana inicial con las dimensiones configuradas
    pub fn show_startup_blind() -> Result<SafeHwnd> {
        let cfg = config::runtime();
        show_blind(
            cfg.default_main_window_width(),
            cfg.default_main_window_height(),
        )
    }

    /// Muestra el diálogo de opciones (singleton), creando persiana si falta
    pub fn show_settings() -> Result<()> {
        let cfg = config::runtime();
        let width = cfg.default_main_window_width();
        let height = cfg.default_main_window_height();

        let before = with_manager(|m| m.blind_count()).context("registro ocupado")?;
        let result =
            with_manager(|m| m.request_show_settings(width, height)).context("registro ocupado")?;

        // Si la petición tuvo que crear la persiana dueña, rematar su alta
        // antes de propagar nada: aunque el diálogo fallara, esa persiana ya
        // está viva y necesita márgenes, router y hook
        let created = with_manager(|m| {
            if m.blind_count() > before {
                m.blind_handles().last().copied().map(|h| (h, m.blind_count()))
            } else {
                None
            }
        })
        .context("registro ocupado")?;

        if let Some((handle, count)) = created {
            finish_blind_setup(handle, count);
        }

        result
    }

    /// Una persiana terminó de cerrarse
    pub fn blind_closed(handle: SafeHwnd) {
        let remaining = with_manager(|m| m.notify_blind_closed(handle));

        match remaining {
            Some(Some(next)) => hook::set_key_target(next.as_isize()),
            Some(None) => {
                // Última persiana: liberar el hook de forma determinista
                hook::clear_key_target(handle.as_isize());
                hook::uninstall();
                tracing::info!("última persiana cerrada");
            }
            None => tracing::warn!("registro ocupado al cerrar persiana"),
        }
    }

    /// El diálogo de opciones terminó de cerrarse
    pub fn settings_closed() {
        if with_manager(|m| m.notify_settings_closed()).is_none() {
            tracing::warn!("registro ocupado al cerrar opciones");
        }
    }

    /// Alta tardía de una persiana recién mostrada: márgenes, router y hook
    fn finish_blind_setup(handle: SafeHwnd, count: usize) {
        if let Some(margins) = unsafe { crate::blind::window::measure_margins(handle.get()) } {
            let _ = with_manager(|m| m.set_margins_once(handle, margins));
        }

        hook::set_key_target(handle.as_isize());

        // La primera persiana del proceso instala el hook global
        if count == 1 && !hook::is_installed() {
            if let Err(e) = hook::install() {
                tracing::error!(error = %e, "sin atajos globales: fallo al instalar el hook");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Fake de fábrica que registra las operaciones
    #[derive(Default)]
    struct FakeFactory {
        next_handle: u32,
        created_blinds: Vec<(u32, i32, i32)>,
        created_settings: Vec<(u32, u32)>, // (dialogo, dueña)
        shown: Vec<u32>,
        fail_next: bool,
        fail_settings: bool,
    }

    impl WindowFactory for FakeFactory {
        type Handle = u32;

        fn create_blind(&mut self, width: i32, height: i32) -> Result<u32> {
            if self.fail_next {
                anyhow::bail!("sin recursos");
            }
            self.next_handle += 1;
            self.created_blinds.push((self.next_handle, width, height));
            Ok(self.next_handle)
        }

        fn create_settings(&mut self, owner: u32) -> Result<u32> {
            if self.fail_next || self.fail_settings {
                anyhow::bail!("sin recursos");
            }
            self.next_handle += 1;
            self.created_settings.push((self.next_handle, owner));
            Ok(self.next_handle)
        }

        fn show(&mut self, handle: u32) {
            self.shown.push(handle);
        }
    }

    fn manager() -> ViewManager<FakeFactory> {
        ViewManager::new(FakeFactory::default())
    }

    #[test]
    fn n_peticiones_crean_n_persianas_distintas() {
        let mut m = manager();

        let a = m.request_show_blind(400, 300).expect("persiana a");
        let b = m.request_show_blind(400, 300).expect("persiana b");
        let c = m.request_show_blind(200, 200).expect("persiana c");

        assert_eq!(m.blind_count(), 3);
        assert!(a != b && b != c && a != c);
        assert!(m.is_main_visible());
        assert_eq!(m.factory.shown, vec![a, b, c]);
    }

    #[test]
    fn cerrar_todas_apaga_main_visible() {
        let mut m = manager();
        let a = m.request_show_blind(400, 300).expect("persiana a");
        let b = m.request_show_blind(400, 300).expect("persiana b");

        // Cada una se cierra de forma independiente
        assert_eq!(m.notify_blind_closed(a), Some(b));
        assert!(m.is_main_visible());
        assert_eq!(m.blind_count(), 1);

        assert_eq!(m.notify_blind_closed(b), None);
        assert!(!m.is_main_visible());
        assert_eq!(m.blind_count(), 0);
    }

    #[test]
    fn el_dialogo_de_opciones_es_singleton() {
        let mut m = manager();
        m.request_show_blind(400, 300).expect("persiana");

        m.request_show_settings(400, 300).expect("opciones");
        m.request_show_settings(400, 300).expect("opciones repetidas");

        // Dos peticiones seguidas, un solo diálogo
        assert_eq!(m.factory.created_settings.len(), 1);
        assert!(m.is_settings_visible());

        // Tras cerrarlo se puede volver a abrir
        m.notify_settings_closed();
        m.request_show_settings(400, 300).expect("opciones de nuevo");
        assert_eq!(m.factory.created_settings.len(), 2);
    }

    #[test]
    fn opciones_sin_persiana_crea_una_con_el_tamano_por_defecto() {
        let mut m = manager();

        m.request_show_settings(640, 480).expect("opciones");

        assert_eq!(m.blind_count(), 1);
        assert_eq!(m.factory.created_blinds.len(), 1);
        let (blind, w, h) = m.factory.created_blinds[0];
        assert_eq!((w, h), (640, 480));

        // El diálogo queda parentado a la primera persiana de la lista
        assert_eq!(m.factory.created_settings[0].1, blind);
    }

    #[test]
    fn el_dialogo_pertenece_a_la_primera_persiana() {
        let mut m = manager();
        let primera = m.request_show_blind(400, 300).expect("primera");
        m.request_show_blind(400, 300).expect("segunda");

        m.request_show_settings(400, 300).expect("opciones");
        assert_eq!(m.factory.created_settings[0].1, primera);
    }

    #[test]
    fn fallo_de_construccion_se_propaga_sin_alterar_el_registro() {
        let mut m = manager();
        m.factory.fail_next = true;

        assert!(m.request_show_blind(400, 300).is_err());
        assert_eq!(m.blind_count(), 0);
        assert!(!m.is_main_visible());

        assert!(m.request_show_settings(400, 300).is_err());
        assert!(!m.is_settings_visible());
    }

    #[test]
    fn fallo_del_dialogo_no_desmonta_la_persiana_duena() {
        let mut m = manager();
        m.factory.fail_settings = true;

        // El diálogo falla, pero la persiana auto-creada ya está viva
        assert!(m.request_show_settings(400, 300).is_err());
        assert_eq!(m.blind_count(), 1);
        assert!(m.is_main_visible());
        assert!(!m.is_settings_visible());

        let blind = m.factory.created_blinds[0].0;
        assert_eq!(m.factory.shown, vec![blind]);

        // La persiana superviviente admite su alta normal (márgenes)
        let margins = ResizeMargins {
            horizontal: 8,
            vertical: 31,
        };
        m.set_margins_once(blind, margins);
        assert_eq!(m.blind_mut(blind).and_then(|r| r.margins), Some(margins));
    }

    #[test]
    fn los_margenes_se_capturan_una_sola_vez() {
        let mut m = manager();
        let h = m.request_show_blind(400, 300).expect("persiana");
        assert_eq!(m.blind_mut(h).map(|r| r.margins), Some(None));

        let primeros = ResizeMargins {
            horizontal: 8,
            vertical: 31,
        };
        m.set_margins_once(h, primeros);
        m.set_margins_once(
            h,
            ResizeMargins {
                horizontal: 99,
                vertical: 99,
            },
        );

        // La segunda escritura se ignora
        assert_eq!(m.blind_mut(h).and_then(|r| r.margins), Some(primeros));
    }

    #[test]
    fn las_persianas_nacen_interactivas() {
        let mut m = manager();
        let h = m.request_show_blind(400, 300).expect("persiana");
        assert!(m.blind_mut(h).map(|r| r.interactive).unwrap_or(false));
    }

    #[test]
    fn cerrar_una_persiana_desconocida_es_inofensivo() {
        let mut m = manager();
        let a = m.request_show_blind(400, 300).expect("persiana");

        assert_eq!(m.notify_blind_closed(999), Some(a));
        assert_eq!(m.blind_count(), 1);
    }
}
