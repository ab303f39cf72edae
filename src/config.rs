//! Configuración de la aplicación y persistencia

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicI32, AtomicU32, AtomicU8, Ordering};
use std::sync::OnceLock;

/// Valores por defecto de la configuración
pub struct ConfigDefaults;

impl ConfigDefaults {
    pub const MAIN_WINDOW_WIDTH: i32 = 400;
    pub const MAIN_WINDOW_HEIGHT: i32 = 300;

    /// Opacidad de la persiana (0 = invisible, 255 = opaca)
    pub const BLIND_OPACITY: u8 = 220;

    /// Color de la persiana (COLORREF, negro)
    pub const BLIND_COLOR: u32 = 0x00000000;

    /// Primera ejecución: se muestra el balloon tip del tray
    pub const INITIAL_RUNNING: bool = true;
}

/// Configuración serializable para persistencia
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub default_main_window_width: i32,
    pub default_main_window_height: i32,
    pub blind_opacity: u8,
    pub blind_color: u32,
    pub initial_running: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_main_window_width: ConfigDefaults::MAIN_WINDOW_WIDTH,
            default_main_window_height: ConfigDefaults::MAIN_WINDOW_HEIGHT,
            blind_opacity: ConfigDefaults::BLIND_OPACITY,
            blind_color: ConfigDefaults::BLIND_COLOR,
            initial_running: ConfigDefaults::INITIAL_RUNNING,
        }
    }
}

impl Settings {
    /// Valida que los valores estén en rangos válidos
    pub fn validate(&self) -> Result<()> {
        if self.default_main_window_width < 100 || self.default_main_window_width > 4000 {
            anyhow::bail!("Ancho por defecto debe estar entre 100-4000 píxeles");
        }
        if self.default_main_window_height < 100 || self.default_main_window_height > 4000 {
            anyhow::bail!("Alto por defecto debe estar entre 100-4000 píxeles");
        }
        if self.blind_opacity < 50 {
            anyhow::bail!("Opacidad debe estar entre 50-255");
        }
        Ok(())
    }
}

/// Configuración runtime con valores atómicos para acceso thread-safe
///
/// Los hooks y procs de ventana son funciones estáticas, por lo que la
/// configuración viva se guarda en atomics globales igual que el resto
/// del estado compartido.
pub struct RuntimeConfig {
    default_main_window_width: AtomicI32,
    default_main_window_height: AtomicI32,
    blind_opacity: AtomicU8,
    blind_color: AtomicU32,
    initial_running: AtomicBool,
}

impl RuntimeConfig {
    /// Crea una configuración runtime con valores por defecto
    pub fn new() -> Self {
        Self {
            default_main_window_width: AtomicI32::new(ConfigDefaults::MAIN_WINDOW_WIDTH),
            default_main_window_height: AtomicI32::new(ConfigDefaults::MAIN_WINDOW_HEIGHT),
            blind_opacity: AtomicU8::new(ConfigDefaults::BLIND_OPACITY),
            blind_color: AtomicU32::new(ConfigDefaults::BLIND_COLOR),
            initial_running: AtomicBool::new(ConfigDefaults::INITIAL_RUNNING),
        }
    }

    /// Carga valores desde Settings
    pub fn load_from(&self, settings: &Settings) {
        self.default_main_window_width
            .store(settings.default_main_window_width, Ordering::Relaxed);
        self.default_main_window_height
            .store(settings.default_main_window_height, Ordering::Relaxed);
        self.blind_opacity
            .store(settings.blind_opacity, Ordering::Relaxed);
        self.blind_color
            .store(settings.blind_color, Ordering::Relaxed);
        self.initial_running
            .store(settings.initial_running, Ordering::Relaxed);
    }

    /// Exporta valores actuales a Settings
    pub fn to_settings(&self) -> Settings {
        Settings {
            default_main_window_width: self.default_main_window_width.load(Ordering::Relaxed),
            default_main_window_height: self.default_main_window_height.load(Ordering::Relaxed),
            blind_opacity: self.blind_opacity.load(Ordering::Relaxed),
            blind_color: self.blind_color.load(Ordering::Relaxed),
            initial_running: self.initial_running.load(Ordering::Relaxed),
        }
    }

    /// Obtiene el ancho por defecto de la persiana
    #[inline]
    pub fn default_main_window_width(&self) -> i32 {
        self.default_main_window_width.load(Ordering::Relaxed)
    }

    /// Obtiene el alto por defecto de la persiana
    #[inline]
    pub fn default_main_window_height(&self) -> i32 {
        self.default_main_window_height.load(Ordering::Relaxed)
    }

    /// Obtiene la opacidad de la persiana
    #[inline]
    pub fn blind_opacity(&self) -> u8 {
        self.blind_opacity.load(Ordering::Relaxed)
    }

    /// Obtiene el color de la persiana (COLORREF)
    #[inline]
    pub fn blind_color(&self) -> u32 {
        self.blind_color.load(Ordering::Relaxed)
    }

    /// Indica si es la primera ejecución
    #[inline]
    pub fn initial_running(&self) -> bool {
        self.initial_running.load(Ordering::Relaxed)
    }

    /// Establece el ancho por defecto de la persiana
    #[inline]
    pub fn set_default_main_window_width(&self, value: i32) {
        self.default_main_window_width.store(value, Ordering::Relaxed);
    }

    /// Establece el alto por defecto de la persiana
    #[inline]
    pub fn set_default_main_window_height(&self, value: i32) {
        self.default_main_window_height.store(value, Ordering::Relaxed);
    }

    /// Establece la opacidad de la persiana
    #[inline]
    pub fn set_blind_opacity(&self, value: u8) {
        self.blind_opacity.store(value, Ordering::Relaxed);
    }

    /// Marca que la primera ejecución ya pasó
    #[inline]
    pub fn set_initial_running(&self, value: bool) {
        self.initial_running.store(value, Ordering::Relaxed);
    }
}

/// Instancia global de la configuración runtime
static RUNTIME_CONFIG: OnceLock<RuntimeConfig> = OnceLock::new();

/// Acceso a la configuración runtime
pub fn runtime() -> &'static RuntimeConfig {
    RUNTIME_CONFIG.get_or_init(RuntimeConfig::new)
}

// =============================================================================
// PERSISTENCIA
// =============================================================================

/// Obtiene la ruta del archivo de configuración
/// El archivo se llama igual que el ejecutable pero con extensión .json
/// Ejemplo: monitor-blind.exe -> monitor-blind.json
fn get_config_path() -> Result<PathBuf> {
    // Usar el mismo directorio que el ejecutable
    let exe_path = std::env::current_exe().context("No se pudo obtener la ruta del ejecutable")?;

    let exe_dir = exe_path
        .parent()
        .context("No se pudo obtener el directorio del ejecutable")?;

    // Obtener el nombre del ejecutable sin extensión y añadir .json
    let config_name = exe_path
        .file_stem()
        .context("No se pudo obtener el nombre del ejecutable")?
        .to_string_lossy()
        .to_string()
        + ".json";

    Ok(exe_dir.join(config_name))
}

/// Guarda la configuración en un archivo concreto
pub fn save_config_to(settings: &Settings, path: &Path) -> Result<()> {
    // Validar antes de guardar
    settings.validate()?;

    let json = serde_json::to_string_pretty(settings).context("Error al serializar config")?;
    fs::write(path, json).context("Error al guardar config")?;

    Ok(())
}

/// Guarda la configuración junto al ejecutable
pub fn save_config(settings: &Settings) -> Result<()> {
    let path = get_config_path()?;
    save_config_to(settings, &path)
}

/// Carga la configuración desde un archivo concreto
///
/// Si el archivo no existe, está corrupto o contiene valores fuera de rango,
/// se usan los valores por defecto.
pub fn load_config_from(path: &Path) -> Settings {
    if let Ok(json) = fs::read_to_string(path) {
        match serde_json::from_str::<Settings>(&json) {
            Ok(settings) if settings.validate().is_ok() => return settings,
            Ok(_) => {
                tracing::warn!(?path, "config fuera de rango, usando valores por defecto")
            }
            Err(e) => {
                tracing::warn!(?path, error = %e, "config ilegible, usando valores por defecto")
            }
        }
    }

    Settings::default()
}

/// Carga la configuración desde el archivo junto al ejecutable
pub fn load_config() -> Settings {
    match get_config_path() {
        Ok(path) => load_config_from(&path),
        Err(e) => {
            tracing::warn!(error = %e, "sin ruta de config, usando valores por defecto");
            Settings::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_por_archivo_temporal() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("monitor-blind.json");

        let settings = Settings {
            default_main_window_width: 640,
            default_main_window_height: 480,
            blind_opacity: 128,
            ..Settings::default()
        };

        save_config_to(&settings, &path).expect("guardar config");
        let loaded = load_config_from(&path);

        assert_eq!(loaded.default_main_window_width, 640);
        assert_eq!(loaded.default_main_window_height, 480);
        assert_eq!(loaded.blind_opacity, 128);
    }

    #[test]
    fn archivo_corrupto_usa_valores_por_defecto() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("monitor-blind.json");
        std::fs::write(&path, "{ esto no es json").expect("escribir basura");

        let loaded = load_config_from(&path);
        assert_eq!(
            loaded.default_main_window_width,
            ConfigDefaults::MAIN_WINDOW_WIDTH
        );
    }

    #[test]
    fn archivo_inexistente_usa_valores_por_defecto() {
        let dir = tempfile::tempdir().expect("tempdir");
        let loaded = load_config_from(&dir.path().join("no-existe.json"));
        assert!(loaded.initial_running);
    }

    #[test]
    fn validacion_rechaza_rangos_invalidos() {
        let settings = Settings {
            default_main_window_width: 10,
            ..Settings::default()
        };
        assert!(settings.validate().is_err());

        let settings = Settings {
            blind_opacity: 10,
            ..Settings::default()
        };
        assert!(settings.validate().is_err());

        assert!(Settings::default().validate().is_ok());
    }

    #[test]
    fn guardar_config_invalida_falla() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("monitor-blind.json");

        let settings = Settings {
            default_main_window_height: 9999,
            ..Settings::default()
        };
        assert!(save_config_to(&settings, &path).is_err());
        assert!(!path.exists());
    }

    #[test]
    fn runtime_config_round_trip() {
        let rt = RuntimeConfig::new();
        let settings = Settings {
            default_main_window_width: 800,
            blind_opacity: 99,
            initial_running: false,
            ..Settings::default()
        };

        rt.load_from(&settings);
        assert_eq!(rt.default_main_window_width(), 800);
        assert_eq!(rt.blind_opacity(), 99);
        assert!(!rt.initial_running());

        let exported = rt.to_settings();
        assert_eq!(exported.default_main_window_width, 800);
        assert_eq!(exported.blind_opacity, 99);
    }
}
