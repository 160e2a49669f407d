//! # Handler de Conexión
//! src/server/connection.rs
//!
//! Convierte una conexión aceptada en exactamente una respuesta HTTP:
//!
//! ```text
//! ReadRequestLine -> ReadHeaderLines -> Validate -> Resolve -> {Serve | RespondError} -> Close
//! ```
//!
//! Ningún error de la conexión sale de aquí. El cliente ve un 200 con el
//! archivo, un 4xx sin body, o un cierre sin nada.

use crate::config::ServerConfig;
use crate::http::request::{drain_headers, read_line};
use crate::http::{FileInfo, ParsedRequest, Response, StatusCode};
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::net::{Shutdown, TcpStream};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::debug;

/// Tamaño de cada bloque del archivo que se escribe en el socket
pub const CHUNK_SIZE: usize = 4096;

/// Tiempo máximo descartando bytes no leídos antes de cerrar
const LINGER_TIMEOUT: Duration = Duration::from_millis(250);

/// Máximo de bytes no leídos que se descartan al cerrar
const LINGER_MAX_BYTES: usize = 256 * 1024;

/// Resultado observable de una conexión
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// 200 OK + la cantidad de bytes de body enviados
    Served(u64),

    /// Respuesta de error (400, 404, 408)
    Rejected(StatusCode),

    /// Cierre sin respuesta (EOF inicial o error de transporte)
    Closed,
}

/// Fallas al leer la request
#[derive(Error, Debug)]
enum ConnectionError {
    #[error("no request received within the idle timeout")]
    Timeout,

    #[error("request head too large: {0}")]
    TooLarge(io::Error),

    #[error("transport error: {0}")]
    Transport(#[from] io::Error),
}

impl ConnectionError {
    /// Un read con timeout vencido devuelve `WouldBlock` en Unix y `TimedOut` en Windows
    fn from_read(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => ConnectionError::Timeout,
            io::ErrorKind::InvalidData => ConnectionError::TooLarge(err),
            _ => ConnectionError::Transport(err),
        }
    }
}

/// Socket aceptado con cierre idempotente
struct Connection {
    stream: TcpStream,
    closed: bool,
}

impl Connection {
    fn new(stream: TcpStream) -> Self {
        Self {
            stream,
            closed: false,
        }
    }

    /// Lee la request line y drena los headers
    ///
    /// `Ok(None)` si el cliente cerró antes de mandar algo.
    fn read_request(&self, idle_timeout: Duration) -> Result<Option<(String, Vec<String>)>, ConnectionError> {
        // Duration::ZERO no es un timeout válido para el socket
        let timeout = if idle_timeout.is_zero() { None } else { Some(idle_timeout) };
        self.stream.set_read_timeout(timeout)?;

        let mut reader = BufReader::new(&self.stream);

        let request_line = match read_line(&mut reader).map_err(ConnectionError::from_read)? {
            Some(line) => line,
            None => return Ok(None),
        };
        debug!(request = %request_line, "request line");

        let headers = drain_headers(&mut reader).map_err(ConnectionError::from_read)?;
        Ok(Some((request_line, headers)))
    }

    /// Máquina de estados completa, sin el cierre
    fn serve(&mut self, config: &ServerConfig) -> Outcome {
        let (request_line, headers) = match self.read_request(config.idle_timeout()) {
            Ok(Some(request)) => request,
            Ok(None) => return Outcome::Closed,
            Err(ConnectionError::Timeout) => return self.reject(StatusCode::RequestTimeout),
            Err(e @ ConnectionError::TooLarge(_)) => {
                debug!(error = %e, "request rechazada");
                return self.reject(StatusCode::BadRequest);
            }
            Err(e) => {
                debug!(error = %e, "error leyendo la request");
                return Outcome::Closed;
            }
        };

        let request = match ParsedRequest::parse(&request_line, headers) {
            Ok(request) => request,
            Err(e) => {
                debug!(error = %e, "request inválida");
                return self.reject(StatusCode::BadRequest);
            }
        };
        debug!(
            method = request.method(),
            path = request.raw_path(),
            version = request.version(),
            "request válida"
        );
        for header in request.headers() {
            debug!(header = %header, "header");
        }

        let Some(path) = resolve(&config.root_directory, request.target()) else {
            return self.reject(StatusCode::NotFound);
        };

        // Metadatos y apertura antes de enviar cualquier byte
        let opened = FileInfo::read(&path).and_then(|info| Ok((info, File::open(&path)?)));
        let (info, file) = match opened {
            Ok(opened) => opened,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "no se pudo abrir el archivo");
                return self.reject(StatusCode::NotFound);
            }
        };

        match self.send_file(&info, file) {
            Ok(sent) => Outcome::Served(sent),
            Err(e) => {
                debug!(error = %e, "error enviando el archivo");
                Outcome::Closed
            }
        }
    }

    /// Envía el 200 y luego el archivo en bloques de `CHUNK_SIZE`
    ///
    /// Nunca envía más de `content_length` bytes, aunque el archivo haya
    /// crecido desde que se leyeron los metadatos.
    fn send_file(&mut self, info: &FileInfo, file: File) -> io::Result<u64> {
        let mut writer = BufWriter::with_capacity(CHUNK_SIZE, &self.stream);
        writer.write_all(&Response::ok(info).to_bytes())?;
        writer.flush()?;

        let mut body = file.take(info.content_length);
        let mut buffer = [0u8; CHUNK_SIZE];
        let mut sent: u64 = 0;

        loop {
            let bytes_read = body.read(&mut buffer)?;
            if bytes_read == 0 {
                break;
            }
            writer.write_all(&buffer[..bytes_read])?;
            sent += bytes_read as u64;
        }

        writer.flush()?;
        Ok(sent)
    }

    /// Envía una respuesta de error sin body; los errores de escritura se ignoran
    fn reject(&mut self, status: StatusCode) -> Outcome {
        let head = Response::error(status).to_bytes();
        if let Err(e) = self.stream.write_all(&head).and_then(|_| self.stream.flush()) {
            debug!(status = status.as_u16(), error = %e, "no se pudo enviar el error");
        }
        Outcome::Rejected(status)
    }

    /// Cierra la conexión; una segunda llamada no hace nada
    ///
    /// Orden: cerrar la escritura, descartar lo que el cliente mandó y no se
    /// leyó, cerrar todo. Cerrar con bytes sin leer en el kernel manda un RST
    /// y el cliente puede perder la respuesta.
    fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;

        match self.stream.shutdown(Shutdown::Write) {
            Ok(()) => self.discard_unread(),
            // El peer (o el pool, al cancelar) pudo haberla cerrado antes
            Err(e) if e.kind() == io::ErrorKind::NotConnected => return,
            Err(e) => debug!(error = %e, "error cerrando la escritura"),
        }

        if let Err(e) = self.stream.shutdown(Shutdown::Both) {
            if e.kind() != io::ErrorKind::NotConnected {
                debug!(error = %e, "error cerrando la conexión");
            }
        }
    }

    /// Lee y descarta hasta EOF, acotado por `LINGER_TIMEOUT` y `LINGER_MAX_BYTES`
    fn discard_unread(&self) {
        let deadline = Instant::now() + LINGER_TIMEOUT;
        let mut scratch = [0u8; CHUNK_SIZE];
        let mut discarded = 0;

        while discarded < LINGER_MAX_BYTES {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() || self.stream.set_read_timeout(Some(remaining)).is_err() {
                break;
            }
            match (&self.stream).read(&mut scratch) {
                Ok(0) | Err(_) => break,
                Ok(n) => discarded += n,
            }
        }

        if discarded > 0 {
            debug!(bytes = discarded, "bytes no leídos descartados al cerrar");
        }
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.close();
    }
}

/// Resuelve el target contra el directorio raíz
///
/// Retorna `None` si no es un archivo regular o si queda fuera de la raíz
/// (segmentos `..`, targets absolutos, symlinks hacia afuera).
pub fn resolve(root: &Path, target: &str) -> Option<PathBuf> {
    let candidate = root.join(target);
    if !candidate.is_file() {
        return None;
    }

    let canonical_root = root.canonicalize().ok()?;
    let canonical = candidate.canonicalize().ok()?;

    if !canonical.starts_with(&canonical_root) {
        return None;
    }

    Some(canonical)
}

/// Atiende una conexión completa y la cierra exactamente una vez
pub fn handle_connection(stream: TcpStream, config: &ServerConfig) -> Outcome {
    let mut connection = Connection::new(stream);
    let outcome = connection.serve(config);
    connection.close();

    debug!(?outcome, "conexión terminada");
    outcome
}
