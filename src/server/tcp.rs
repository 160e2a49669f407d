//! # Servidor TCP Concurrente
//! src/server/tcp.rs
//!
//! Listener/dispatcher: un thread dedicado corre el loop de accept y cada
//! conexión aceptada se despacha al pool, un thread por conexión.
//!
//! El accept no bloquea indefinidamente: el listener es no bloqueante y el
//! loop duerme un intervalo corto entre intentos vacíos, así la bandera de
//! apagado se revisa al menos una vez por segundo.

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::server::connection::handle_connection;
use crate::server::pool::WorkerPool;
use crate::server::state::{Phase, ServerState};
use std::io;
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Espera entre intentos de accept sin conexiones pendientes
///
/// Debe quedar por debajo de 1 s: es la latencia máxima con la que el loop
/// nota la bandera de apagado.
pub const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Tiempo máximo de espera por las conexiones en vuelo al apagar
pub const SHUTDOWN_GRACE_PERIOD: Duration = Duration::from_secs(10);

/// Servidor HTTP de archivos
pub struct Server {
    config: Arc<ServerConfig>,
    state: Arc<ServerState>,
    pool: WorkerPool,
    grace_period: Duration,
    accept_thread: Mutex<Option<JoinHandle<()>>>,
}

impl Server {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config: Arc::new(config),
            state: Arc::new(ServerState::new()),
            pool: WorkerPool::new(),
            grace_period: SHUTDOWN_GRACE_PERIOD,
            accept_thread: Mutex::new(None),
        }
    }

    /// Cambia el periodo de gracia del apagado (por defecto 10 s)
    pub fn with_grace_period(mut self, grace_period: Duration) -> Self {
        self.grace_period = grace_period;
        self
    }

    /// Abre el socket, lanza el loop de accept y retorna de inmediato
    ///
    /// Retorna la dirección real de escucha (útil con el puerto 0).
    pub fn start(&self) -> ServerResult<SocketAddr> {
        if !self.state.transition(Phase::Created, Phase::Running) {
            return Err(ServerError::AlreadyStarted);
        }

        let address = self.config.address();
        let listener = match bind(&address) {
            Ok(listener) => listener,
            Err(source) => {
                self.state.request_shutdown();
                self.state.set_phase(Phase::Stopped);
                return Err(ServerError::Bind { address, source });
            }
        };
        let local_addr = listener.local_addr()?;
        info!(%local_addr, "servidor escuchando");

        let accept_loop = AcceptLoop {
            listener,
            config: Arc::clone(&self.config),
            state: Arc::clone(&self.state),
            pool: self.pool.clone(),
            grace_period: self.grace_period,
        };

        let handle = thread::Builder::new()
            .name("accept-loop".to_string())
            .spawn(move || accept_loop.run())
            .map_err(|e| {
                self.state.request_shutdown();
                self.state.set_phase(Phase::Stopped);
                ServerError::Io(e)
            })?;

        *self.accept_thread.lock().unwrap_or_else(PoisonError::into_inner) = Some(handle);
        Ok(local_addr)
    }

    /// Pide el apagado y espera a que termine
    ///
    /// Retorna después de la espera acotada por el periodo de gracia (las
    /// conexiones que no terminaron a tiempo se cortan). Es idempotente: los
    /// llamados concurrentes también esperan a que el servidor llegue a
    /// `Phase::Stopped`.
    pub fn request_shutdown(&self) {
        if self.state.request_shutdown() {
            info!("apagado solicitado");
        }

        // Nunca arrancó: no hay nada que drenar
        if self.state.transition(Phase::Created, Phase::Stopped) {
            return;
        }

        let handle = self
            .accept_thread
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        match handle {
            Some(handle) => {
                if handle.join().is_err() {
                    error!("el thread de accept terminó con panic");
                    self.state.set_phase(Phase::Stopped);
                }
            }
            // Otro llamado ya está drenando
            None => self.state.wait_stopped(),
        }
    }

    pub fn is_shutdown_requested(&self) -> bool {
        self.state.is_shutdown_requested()
    }

    pub fn phase(&self) -> Phase {
        self.state.phase()
    }

    /// Conexiones que siguen siendo atendidas
    pub fn active_connections(&self) -> usize {
        self.pool.active()
    }
}

impl Drop for Server {
    fn drop(&mut self) {
        self.request_shutdown();
    }
}

fn bind(address: &str) -> io::Result<TcpListener> {
    let listener = TcpListener::bind(address)?;
    listener.set_nonblocking(true)?;
    Ok(listener)
}

/// Fuente de conexiones del loop de accept
trait Acceptor: Send + 'static {
    fn accept(&self) -> io::Result<(TcpStream, SocketAddr)>;
}

impl Acceptor for TcpListener {
    fn accept(&self) -> io::Result<(TcpStream, SocketAddr)> {
        TcpListener::accept(self)
    }
}

/// Todo lo que necesita el thread de accept
struct AcceptLoop<A: Acceptor = TcpListener> {
    listener: A,
    config: Arc<ServerConfig>,
    state: Arc<ServerState>,
    pool: WorkerPool,
    grace_period: Duration,
}

impl<A: Acceptor> AcceptLoop<A> {
    fn run(self) {
        while !self.state.is_shutdown_requested() {
            match self.listener.accept() {
                Ok((stream, peer)) => {
                    info!(address = %peer.ip(), port = peer.port(), "nueva conexión");

                    // En algunas plataformas el socket hereda el modo no bloqueante
                    if let Err(e) = stream.set_nonblocking(false) {
                        debug!(error = %e, "no se pudo pasar el socket a modo bloqueante");
                        continue;
                    }

                    let config = Arc::clone(&self.config);
                    let worker_stream = match stream.try_clone() {
                        Ok(s) => s,
                        Err(e) => {
                            debug!(error = %e, "no se pudo clonar el socket");
                            continue;
                        }
                    };

                    if let Err(e) = self.pool.execute(&stream, move || {
                        handle_connection(worker_stream, &config);
                    }) {
                        warn!(error = %e, "no se pudo despachar la conexión");
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                    thread::sleep(ACCEPT_POLL_INTERVAL);
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => {
                    error!(error = %e, "error fatal en el listener, apagando");
                    self.state.request_shutdown();
                }
            }
        }

        self.drain();
    }

    /// ShuttingDown -> Stopped
    fn drain(self) {
        self.state.set_phase(Phase::ShuttingDown);
        drop(self.listener);

        let cancelled = self.pool.shutdown(self.grace_period);
        if cancelled > 0 {
            warn!(cancelled, "conexiones cortadas al apagar");
        }

        self.state.set_phase(Phase::Stopped);
        info!("servidor detenido");
    }
}
