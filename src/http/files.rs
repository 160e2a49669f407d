//! # Metadatos de Archivos
//! src/http/files.rs
//!
//! Utilidades para armar los headers de una respuesta 200: tamaño,
//! tipo MIME, fecha de modificación y fecha actual en formato HTTP-date.

use std::fs;
use std::io;
use std::path::Path;
use std::time::SystemTime;

/// Fecha actual en formato HTTP-date (RFC 7231)
///
/// # Ejemplo
/// ```
/// let date = file_server::http::files::current_date();
/// assert!(date.ends_with(" GMT"));
/// ```
pub fn current_date() -> String {
    httpdate::fmt_http_date(SystemTime::now())
}

/// Tamaño del archivo en bytes, como string decimal
pub fn content_length(path: &Path) -> io::Result<String> {
    Ok(fs::metadata(path)?.len().to_string())
}

/// Tipo MIME inferido por la extensión del archivo
///
/// Si no se reconoce la extensión se usa `application/octet-stream`.
pub fn content_type(path: &Path) -> String {
    mime_guess::from_path(path)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}

/// Fecha de última modificación en formato HTTP-date
pub fn last_modified(path: &Path) -> io::Result<String> {
    let modified = fs::metadata(path)?.modified()?;
    Ok(httpdate::fmt_http_date(modified))
}

/// Snapshot de los metadatos de un archivo al momento de resolverlo
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    pub content_length: u64,
    pub content_type: String,
    pub last_modified: String,
}

impl FileInfo {
    /// Lee los metadatos una sola vez
    ///
    /// El cuerpo se envía después usando `content_length` como límite,
    /// aunque el archivo cambie mientras tanto.
    pub fn read(path: &Path) -> io::Result<Self> {
        let content_length = content_length(path)?
            .parse::<u64>()
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        Ok(FileInfo {
            content_length,
            content_type: content_type(path),
            last_modified: last_modified(path)?,
        })
    }
}
