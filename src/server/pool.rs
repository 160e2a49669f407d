//! # Pool de Workers por Conexión
//! src/server/pool.rs
//!
//! Un thread por conexión, sin límite de admisión (`thread::spawn` por cada
//! `accept`). Lo que agrega el pool es la contabilidad necesaria para el
//! apagado:
//!
//! - cuántas conexiones siguen en vuelo (`Mutex` + `Condvar`)
//! - un clon de cada socket en vuelo, para poder cortarlo si el periodo de
//!   gracia expira (los threads de Rust no se pueden matar; cerrar el
//!   socket hace fallar la lectura/escritura bloqueada y el handler termina)

use std::collections::HashMap;
use std::io;
use std::net::{Shutdown, TcpStream};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;
use tracing::{debug, warn};

/// Estado protegido por el mutex del pool
struct PoolState {
    /// Id para la próxima conexión despachada
    next_id: u64,

    /// Sockets en vuelo, indexados por id de conexión
    in_flight: HashMap<u64, TcpStream>,

    /// `false` una vez que empezó el apagado
    accepting: bool,
}

struct PoolInner {
    state: Mutex<PoolState>,

    /// Se notifica cada vez que termina una conexión
    finished: Condvar,
}

impl PoolInner {
    fn lock(&self) -> MutexGuard<'_, PoolState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Pool sin límite: cada tarea corre en su propio thread
#[derive(Clone)]
pub struct WorkerPool {
    inner: Arc<PoolInner>,
}

/// Quita la conexión del registro al terminar (incluso si el handler hace panic)
struct CompletionGuard {
    id: u64,
    inner: Arc<PoolInner>,
}

impl Drop for CompletionGuard {
    fn drop(&mut self) {
        let mut state = self.inner.lock();
        state.in_flight.remove(&self.id);
        self.inner.finished.notify_all();
    }
}

impl WorkerPool {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(PoolInner {
                state: Mutex::new(PoolState {
                    next_id: 0,
                    in_flight: HashMap::new(),
                    accepting: true,
                }),
                finished: Condvar::new(),
            }),
        }
    }

    /// Despacha `job` en un thread nuevo y no espera a que termine
    ///
    /// `stream` es el socket que atenderá el job; el pool guarda un clon
    /// para poder cancelarlo durante el apagado.
    pub fn execute<F>(&self, stream: &TcpStream, job: F) -> io::Result<u64>
    where
        F: FnOnce() + Send + 'static,
    {
        let handle = stream.try_clone()?;

        let id = {
            let mut state = self.inner.lock();
            if !state.accepting {
                return Err(io::Error::new(
                    io::ErrorKind::Other,
                    "worker pool is shutting down",
                ));
            }
            let id = state.next_id;
            state.next_id += 1;
            state.in_flight.insert(id, handle);
            id
        };

        let guard = CompletionGuard {
            id,
            inner: Arc::clone(&self.inner),
        };

        let spawned = thread::Builder::new()
            .name(format!("conn-{}", id))
            .spawn(move || {
                let _guard = guard;
                job();
            });

        // Si el spawn falla, el closure (y con él el guard) ya se liberó
        spawned.map(|_| id)
    }

    /// Número de conexiones en vuelo
    pub fn active(&self) -> usize {
        self.inner.lock().in_flight.len()
    }

    /// Deja de aceptar tareas y espera hasta `grace` a que terminen
    ///
    /// Las conexiones que siguen abiertas al vencer el plazo se cortan con
    /// `shutdown(Both)`. Retorna cuántas se cancelaron a la fuerza.
    pub fn shutdown(&self, grace: Duration) -> usize {
        let state = {
            let mut state = self.inner.lock();
            state.accepting = false;
            state
        };

        let (mut state, timeout) = self
            .inner
            .finished
            .wait_timeout_while(state, grace, |s| !s.in_flight.is_empty())
            .unwrap_or_else(PoisonError::into_inner);

        if !timeout.timed_out() || state.in_flight.is_empty() {
            debug!("todas las conexiones terminaron dentro del periodo de gracia");
            return 0;
        }

        let cancelled = state.in_flight.len();
        warn!(cancelled, "periodo de gracia agotado, cancelando conexiones");

        for (id, stream) in state.in_flight.drain() {
            if let Err(e) = stream.shutdown(Shutdown::Both) {
                debug!(conn = id, error = %e, "no se pudo cortar la conexión");
            }
        }

        cancelled
    }
}

impl Default for WorkerPool {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use std::net::TcpListener;
    use std::sync::mpsc;
    use std::time::Instant;

    /// Par de sockets conectados (servidor, cliente)
    fn socket_pair() -> (TcpStream, TcpStream) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let client = TcpStream::connect(listener.local_addr().unwrap()).unwrap();
        let (server, _) = listener.accept().unwrap();
        (server, client)
    }

    #[test]
    fn test_execute_runs_job() {
        let pool = WorkerPool::new();
        let (server, _client) = socket_pair();
        let (tx, rx) = mpsc::channel();

        pool.execute(&server, move || {
            tx.send(42).unwrap();
        })
        .unwrap();

        assert_eq!(rx.recv_timeout(Duration::from_secs(5)).unwrap(), 42);
        assert_eq!(pool.shutdown(Duration::from_secs(5)), 0);
        assert_eq!(pool.active(), 0);
    }

    #[test]
    fn test_shutdown_waits_for_running_jobs() {
        let pool = WorkerPool::new();
        let (server, _client) = socket_pair();

        pool.execute(&server, || thread::sleep(Duration::from_millis(200)))
            .unwrap();

        let cancelled = pool.shutdown(Duration::from_secs(5));
        assert_eq!(cancelled, 0);
        assert_eq!(pool.active(), 0);
    }

    #[test]
    fn test_shutdown_cancels_after_grace() {
        let pool = WorkerPool::new();
        let (server, _client) = socket_pair();
        let (tx, rx) = mpsc::channel();
        let mut worker_side = server.try_clone().unwrap();

        pool.execute(&server, move || {
            // Bloquea hasta que el pool corte el socket
            let mut buf = [0u8; 16];
            let result = worker_side.read(&mut buf);
            tx.send(result.unwrap_or(0)).unwrap();
        })
        .unwrap();

        let start = Instant::now();
        let cancelled = pool.shutdown(Duration::from_millis(200));

        assert_eq!(cancelled, 1);
        assert!(start.elapsed() < Duration::from_secs(5));
        // La lectura bloqueada se desbloquea (EOF o error)
        assert_eq!(rx.recv_timeout(Duration::from_secs(5)).unwrap(), 0);
    }

    #[test]
    fn test_execute_after_shutdown_is_rejected() {
        let pool = WorkerPool::new();
        pool.shutdown(Duration::from_millis(10));

        let (server, _client) = socket_pair();
        assert!(pool.execute(&server, || {}).is_err());
    }

    #[test]
    fn test_panicking_job_is_still_accounted() {
        let pool = WorkerPool::new();
        let (server, _client) = socket_pair();

        pool.execute(&server, || panic!("boom")).unwrap();

        assert_eq!(pool.shutdown(Duration::from_secs(5)), 0);
        assert_eq!(pool.active(), 0);
    }
}
