//! # File Server
//! src/lib.rs
//!
//! Servidor HTTP/1.1 de archivos, multihilo y sin conexiones persistentes:
//! cada conexión lee exactamente una request `GET`, responde con el archivo
//! pedido (o con un error 400/404/408) y se cierra.
//!
//! ## Arquitectura
//!
//! El servidor está dividido en módulos especializados:
//! - `http`: Validación de requests, armado de respuestas y metadatos de archivos
//! - `server`: Loop de accept, pool de workers y handler de cada conexión
//! - `config`: Parámetros de arranque (puerto, raíz, timeout)
//! - `error`: Errores que escapan al que arranca el servidor
//!
//! ## Ejemplo de uso
//!
//! ```no_run
//! use file_server::config::ServerConfig;
//! use file_server::server::Server;
//!
//! let server = Server::new(ServerConfig::default());
//! let addr = server.start().expect("Error al iniciar servidor");
//! println!("escuchando en {}", addr);
//!
//! // ... más tarde
//! server.request_shutdown();
//! ```

pub mod config;
pub mod error;
pub mod http;
pub mod server;
