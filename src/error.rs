//! # Errores del Servidor
//! src/error.rs
//!
//! Errores que pueden escapar hacia quien arranca el servidor. Los errores
//! de cada conexión nunca llegan aquí: se resuelven dentro del handler.

use thiserror::Error;

/// Errores a nivel de servidor (configuración y listener)
#[derive(Error, Debug)]
pub enum ServerError {
    /// Parámetro de arranque inválido
    #[error("invalid configuration: {0}")]
    Config(String),

    /// No se pudo abrir el socket de escucha
    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    /// `start()` se llamó sobre un servidor que ya no está en `Created`
    #[error("server was already started")]
    AlreadyStarted,

    /// Error de IO del listener
    #[error("listener I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Alias de resultado para operaciones del servidor
pub type ServerResult<T> = Result<T, ServerError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_config_error_display() {
        let err = ServerError::Config("port must be > 1024".to_string());
        assert_eq!(err.to_string(), "invalid configuration: port must be > 1024");
    }

    #[test]
    fn test_bind_error_keeps_source() {
        let err = ServerError::Bind {
            address: "0.0.0.0:80".to_string(),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        };

        assert!(err.to_string().starts_with("failed to bind 0.0.0.0:80"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_io_error_from() {
        let err: ServerError = io::Error::new(io::ErrorKind::Other, "boom").into();
        assert!(matches!(err, ServerError::Io(_)));
    }
}
