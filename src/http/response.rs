//! # Construcción de Respuestas HTTP
//!
//! Este módulo arma el encabezado (status line + headers) de las respuestas.
//! El cuerpo de una respuesta 200 no vive aquí: el handler lo transmite
//! directo desde el archivo en bloques.
//!
//! ## Formato de una respuesta de error
//!
//! ```text
//! HTTP/1.1 404 Not Found\r\n
//! Date: Sun, 06 Nov 1994 08:49:37 GMT\r\n
//! Server: file_server/0.1.0\r\n
//! Connection: close\r\n
//! \r\n
//! ```
//!
//! ## Ejemplo de uso
//!
//! ```
//! use file_server::http::{Response, StatusCode};
//!
//! let response = Response::error(StatusCode::BadRequest);
//! let bytes = response.to_bytes();
//! assert!(bytes.starts_with(b"HTTP/1.1 400 Bad Request\r\n"));
//! ```

use super::files::{current_date, FileInfo};
use super::StatusCode;

/// Valor fijo del header `Server`
pub const SERVER_TOKEN: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Encabezado de una respuesta HTTP/1.1
#[derive(Debug, Clone)]
pub struct Response {
    /// Código de estado HTTP
    status: StatusCode,

    /// Headers en el orden en que se escriben
    headers: Vec<(String, String)>,
}

impl Response {
    /// Crea una respuesta con `Date` y `Server` ya puestos
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: vec![
                ("Date".to_string(), current_date()),
                ("Server".to_string(), SERVER_TOKEN.to_string()),
            ],
        }
    }

    /// Agrega un header al final
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.add_header(name, value);
        self
    }

    /// Agrega un header a una respuesta existente (versión mutable)
    pub fn add_header(&mut self, name: &str, value: &str) {
        self.headers.push((name.to_string(), value.to_string()));
    }

    /// Respuesta 200 OK para un archivo ya resuelto
    ///
    /// Orden de headers: Date, Server, Last-Modified, Content-Length,
    /// Content-Type, Connection.
    pub fn ok(file: &FileInfo) -> Self {
        Self::new(StatusCode::Ok)
            .with_header("Last-Modified", &file.last_modified)
            .with_header("Content-Length", &file.content_length.to_string())
            .with_header("Content-Type", &file.content_type)
            .with_header("Connection", "close")
    }

    /// Respuesta de error sin body
    pub fn error(status: StatusCode) -> Self {
        Self::new(status).with_header("Connection", "close")
    }

    /// Convierte el encabezado a bytes listos para el socket
    ///
    /// - Status line: `HTTP/1.1 200 OK\r\n`
    /// - Headers: `Header-Name: Value\r\n`
    /// - Línea vacía: `\r\n`
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut result = Vec::new();

        result.extend_from_slice(format!("HTTP/1.1 {}\r\n", self.status).as_bytes());

        for (name, value) in &self.headers {
            result.extend_from_slice(format!("{}: {}\r\n", name, value).as_bytes());
        }

        result.extend_from_slice(b"\r\n");
        result
    }
}
