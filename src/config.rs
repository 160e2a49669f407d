//! # Configuración del Servidor
//! src/config.rs
//!
//! Este módulo define los tres parámetros de arranque del servidor de
//! archivos: puerto, directorio raíz y timeout de inactividad por conexión.
//! Se pueden pasar por CLI o por variables de entorno.
//!
//! ## Ejemplos de uso
//!
//! ### CLI
//! ```bash
//! ./file_server --port 2025 --root ./www --timeout 5000
//! ```
//!
//! ### Variables de entorno
//! ```bash
//! SERVER_PORT=8080 SERVER_ROOT=/srv/www ./file_server
//! ```

use crate::error::ServerError;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

/// Puerto mínimo aceptado desde la CLI (los puertos <= 1024 son privilegiados)
pub const MIN_PORT: u16 = 1025;

/// Configuración del servidor de archivos
///
/// Inmutable una vez construida: el listener la comparte con cada conexión.
#[derive(Debug, Clone, Parser)]
#[command(name = "file_server")]
#[command(about = "Servidor HTTP/1.1 de archivos con conexiones no persistentes")]
#[command(version = "0.1.0")]
pub struct ServerConfig {
    /// Puerto en el que escucha el servidor (> 1024)
    #[arg(short, long, default_value = "2025", env = "SERVER_PORT")]
    pub port: u16,

    /// Directorio raíz desde el que se sirven los archivos
    #[arg(short, long = "root", default_value = ".", env = "SERVER_ROOT")]
    pub root_directory: PathBuf,

    /// Timeout de inactividad por conexión, en milisegundos
    #[arg(short = 't', long = "timeout", default_value = "5000", env = "SERVER_TIMEOUT")]
    pub idle_timeout_ms: u64,
}

impl ServerConfig {
    /// Crea una configuración parseando los argumentos de la CLI
    pub fn new() -> Self {
        ServerConfig::parse()
    }

    /// Dirección de bind: todas las interfaces en el puerto configurado
    ///
    /// # Ejemplo
    /// ```
    /// use file_server::config::ServerConfig;
    ///
    /// let config = ServerConfig::default();
    /// assert_eq!(config.address(), "0.0.0.0:2025");
    /// ```
    pub fn address(&self) -> String {
        format!("0.0.0.0:{}", self.port)
    }

    /// Timeout de lectura que se aplica a cada socket aceptado
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_millis(self.idle_timeout_ms)
    }

    /// Valida la configuración
    ///
    /// El puerto 0 (efímero) no se acepta aquí; sólo se usa
    /// programáticamente desde los tests.
    pub fn validate(&self) -> Result<(), ServerError> {
        if self.port < MIN_PORT {
            return Err(ServerError::Config(format!(
                "port must be > 1024 (got {})",
                self.port
            )));
        }

        if !self.root_directory.is_dir() {
            return Err(ServerError::Config(format!(
                "root directory {} does not exist",
                self.root_directory.display()
            )));
        }

        if self.idle_timeout_ms == 0 {
            return Err(ServerError::Config("idle timeout must be > 0".to_string()));
        }

        Ok(())
    }

    /// Registra un resumen de la configuración efectiva
    pub fn print_summary(&self) {
        info!(
            port = self.port,
            root = %self.root_directory.display(),
            idle_timeout_ms = self.idle_timeout_ms,
            "configuración del servidor"
        );
    }
}

impl Default for ServerConfig {
    /// Configuración por defecto (mismos valores que la CLI)
    fn default() -> Self {
        Self {
            port: 2025,
            root_directory: PathBuf::from("."),
            idle_timeout_ms: 5_000,
        }
    }
}
