//! # Parsing de Requests HTTP
//! src/http/request.rs
//!
//! El servidor sólo entiende un tipo de request:
//!
//! ```text
//! GET /index.html HTTP/1.1\r\n
//! Host: localhost:2025\r\n
//! User-Agent: curl/8.5.0\r\n
//! \r\n
//! ```
//!
//! ## Componentes
//!
//! 1. **Request Line**: exactamente tres tokens separados por un espacio
//! 2. **Headers**: se leen y se descartan (no hay semántica de headers)
//! 3. **Empty Line**: marca el fin de la request; el body se ignora

use std::io::{self, BufRead, Read};
use thiserror::Error;

/// Único método soportado
pub const METHOD_GET: &str = "GET";

/// Única versión soportada
pub const HTTP_VERSION: &str = "HTTP/1.1";

/// Largo máximo de una línea (request line o header), terminador incluido
pub const MAX_LINE_LENGTH: usize = 8 * 1024;

/// Máximo de líneas de header antes de la línea vacía
pub const MAX_HEADER_LINES: usize = 100;

/// Errores de validación de la request line (todos terminan en 400)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// La línea no tiene exactamente 3 tokens
    #[error("expected 3 tokens in request line, found {0}")]
    WrongTokenCount(usize),

    /// Método distinto de GET
    #[error("unsupported HTTP method: {0}")]
    UnsupportedMethod(String),

    /// Versión distinta de HTTP/1.1
    #[error("unsupported HTTP version: {0}")]
    UnsupportedVersion(String),
}

/// Request ya validada
///
/// Sólo se construye si la request line tiene exactamente tres tokens,
/// el primero es `GET` y el tercero `HTTP/1.1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedRequest {
    /// Método HTTP (siempre "GET")
    method: String,

    /// Target tal cual llegó (ej: "/index.html")
    raw_path: String,

    /// Versión HTTP (siempre "HTTP/1.1")
    version: String,

    /// Líneas de header crudas, sin interpretar
    headers: Vec<String>,
}

impl ParsedRequest {
    /// Valida la request line y construye la request
    ///
    /// # Ejemplo
    ///
    /// ```
    /// use file_server::http::ParsedRequest;
    ///
    /// let request = ParsedRequest::parse("GET /index.html HTTP/1.1", Vec::new()).unwrap();
    /// assert_eq!(request.raw_path(), "/index.html");
    /// assert_eq!(request.target(), "index.html");
    /// ```
    pub fn parse(request_line: &str, headers: Vec<String>) -> Result<Self, ParseError> {
        // Split por espacio simple: "GET  /x HTTP/1.1" produce 4 tokens
        let parts: Vec<&str> = request_line.split(' ').collect();

        if parts.len() != 3 {
            return Err(ParseError::WrongTokenCount(parts.len()));
        }

        if parts[0] != METHOD_GET {
            return Err(ParseError::UnsupportedMethod(parts[0].to_string()));
        }

        if parts[2] != HTTP_VERSION {
            return Err(ParseError::UnsupportedVersion(parts[2].to_string()));
        }

        Ok(ParsedRequest {
            method: parts[0].to_string(),
            raw_path: parts[1].to_string(),
            version: parts[2].to_string(),
            headers,
        })
    }

    /// Target sin el separador inicial (sólo se quita uno)
    pub fn target(&self) -> &str {
        self.raw_path.strip_prefix('/').unwrap_or(&self.raw_path)
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn raw_path(&self) -> &str {
        &self.raw_path
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }
}

/// Lee una línea terminada en `\n` (acepta también `\r\n`)
///
/// Retorna `Ok(None)` si el stream terminó antes de leer un solo byte.
/// Los bytes que no son UTF-8 válido se reemplazan; esa línea fallará
/// luego en la validación. Una línea que llega a `MAX_LINE_LENGTH` bytes
/// sin terminador falla con `ErrorKind::InvalidData`.
pub fn read_line<R: BufRead>(reader: &mut R) -> io::Result<Option<String>> {
    let mut buffer = Vec::new();
    let bytes_read = reader
        .by_ref()
        .take(MAX_LINE_LENGTH as u64)
        .read_until(b'\n', &mut buffer)?;

    if bytes_read == 0 {
        return Ok(None);
    }

    if buffer.last() == Some(&b'\n') {
        buffer.pop();
        if buffer.last() == Some(&b'\r') {
            buffer.pop();
        }
    } else if bytes_read == MAX_LINE_LENGTH {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("line exceeds {} bytes", MAX_LINE_LENGTH),
        ));
    }

    Ok(Some(String::from_utf8_lossy(&buffer).into_owned()))
}

/// Consume las líneas de header hasta la línea vacía
///
/// Si el stream se cierra antes de la línea vacía se considera terminado
/// el bloque de headers. Más de `MAX_HEADER_LINES` líneas falla con
/// `ErrorKind::InvalidData`.
pub fn drain_headers<R: BufRead>(reader: &mut R) -> io::Result<Vec<String>> {
    let mut headers = Vec::new();

    while let Some(line) = read_line(reader)? {
        if line.is_empty() {
            break;
        }
        if headers.len() == MAX_HEADER_LINES {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("more than {} header lines", MAX_HEADER_LINES),
            ));
        }
        headers.push(line);
    }

    Ok(headers)
}
