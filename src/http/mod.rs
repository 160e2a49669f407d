//! # Módulo HTTP
//!
//! Implementa el subconjunto de HTTP/1.1 que necesita el servidor de
//! archivos, sin librerías de alto nivel:
//!
//! - Validación de la request line (`GET <path> HTTP/1.1`)
//! - Construcción de encabezados de respuesta
//! - Códigos de estado 200, 400, 404 y 408
//! - Metadatos de archivos (tamaño, tipo MIME, fechas HTTP)
//!
//! ### Formato de Request
//!
//! ```text
//! GET /index.html HTTP/1.1\r\n
//! Header-Name: Header-Value\r\n
//! \r\n
//! ```
//!
//! ### Formato de Response
//!
//! ```text
//! HTTP/1.1 200 OK\r\n
//! Date: ...\r\n
//! Server: ...\r\n
//! Last-Modified: ...\r\n
//! Content-Length: 12\r\n
//! Content-Type: text/html\r\n
//! Connection: close\r\n
//! \r\n
//! <bytes del archivo>
//! ```

pub mod files;     // Metadatos de archivos
pub mod request;   // Parsing de HTTP requests
pub mod response;  // Construcción de HTTP responses
pub mod status;    // Códigos de estado HTTP

// Re-exportamos los tipos principales para facilitar su uso
pub use files::FileInfo;
pub use request::{ParseError, ParsedRequest};
pub use response::Response;
pub use status::StatusCode;
