//! # File Server - Entry Point
//! src/main.rs
//!
//! Punto de entrada del servidor de archivos.
//!
//! Lee la configuración de la CLI, arranca el servidor y espera a que se
//! escriba `quit` en la entrada estándar para apagarlo. Si stdin se cierra
//! (`< /dev/null`, systemd, docker sin `-i`) el servidor sigue corriendo.

use file_server::config::ServerConfig;
use file_server::server::Server;
use std::io::{self, BufRead};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::Duration;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Lee stdin en un thread aparte y avisa cuando llega `quit`
fn spawn_stdin_watcher() -> Receiver<()> {
    let (tx, rx) = mpsc::channel();

    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            match line {
                Ok(line) if line.trim() == "quit" => {
                    let _ = tx.send(());
                    return;
                }
                Ok(_) => {}
                Err(e) => {
                    error!(error = %e, "error leyendo stdin");
                    return;
                }
            }
        }
    });

    rx
}

/// Bloquea hasta que llegue `quit` o hasta que el servidor se apague solo
///
/// Retorna `true` si se pidió `quit`. Un stdin cerrado no cuenta como
/// `quit`: se deja de escuchar el canal y se sigue esperando al servidor.
fn wait_for_quit(quit: &Receiver<()>, shutdown_requested: impl Fn() -> bool, tick: Duration) -> bool {
    let mut stdin_open = true;

    while !shutdown_requested() {
        if !stdin_open {
            thread::sleep(tick);
            continue;
        }

        match quit.recv_timeout(tick) {
            Ok(()) => return true,
            Err(RecvTimeoutError::Disconnected) => {
                debug!("stdin cerrado, el servidor sigue corriendo");
                stdin_open = false;
            }
            Err(RecvTimeoutError::Timeout) => {}
        }
    }

    false
}

fn main() {
    init_logging();

    let config = ServerConfig::new();
    if let Err(e) = config.validate() {
        error!("{}", e);
        std::process::exit(2);
    }
    config.print_summary();

    let server = Server::new(config);
    if let Err(e) = server.start() {
        error!("💥 Error fatal: {}", e);
        std::process::exit(1);
    }

    info!("escribe 'quit' para detener el servidor");
    let quit = spawn_stdin_watcher();

    wait_for_quit(&quit, || server.is_shutdown_requested(), Duration::from_secs(1));

    server.request_shutdown();
    info!("adiós");
}
