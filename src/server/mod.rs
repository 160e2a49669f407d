//! # Módulo del Servidor
//! src/server/mod.rs
//!
//! Este módulo implementa el ciclo de vida de las conexiones:
//! 1. `tcp`: escucha en un puerto, acepta y despacha (thread de accept)
//! 2. `pool`: un thread por conexión + contabilidad para el apagado
//! 3. `connection`: lee, valida, resuelve y responde una única request
//! 4. `state`: bandera de apagado compartida y fase del servidor

pub mod connection;
pub mod pool;
pub mod state;
pub mod tcp;

// Re-exportar para facilitar el uso
pub use connection::{handle_connection, Outcome};
pub use state::Phase;
pub use tcp::Server;
