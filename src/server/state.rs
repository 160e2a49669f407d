//! # Estado Compartido del Servidor
//! src/server/state.rs
//!
//! El único estado mutable compartido entre threads es la bandera de
//! apagado. Se guarda en un `AtomicBool` para que el loop de accept la vea
//! sin data race. La fase del ciclo de vida se lleva aparte; llegar a
//! `Stopped` además despierta a quien esté esperando el fin del apagado.

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::{Condvar, Mutex, PoisonError};

/// Fases del ciclo de vida del listener
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Phase {
    Created = 0,
    Running = 1,
    ShuttingDown = 2,
    Stopped = 3,
}

impl Phase {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => Phase::Created,
            1 => Phase::Running,
            2 => Phase::ShuttingDown,
            _ => Phase::Stopped,
        }
    }
}

/// Bandera de apagado + fase actual
#[derive(Debug)]
pub struct ServerState {
    shutdown: AtomicBool,
    phase: AtomicU8,

    /// `true` una vez alcanzado `Phase::Stopped`
    stopped: Mutex<bool>,
    stopped_signal: Condvar,
}

impl ServerState {
    pub fn new() -> Self {
        Self {
            shutdown: AtomicBool::new(false),
            phase: AtomicU8::new(Phase::Created as u8),
            stopped: Mutex::new(false),
            stopped_signal: Condvar::new(),
        }
    }

    /// Marca el apagado
    ///
    /// Retorna `true` sólo para quien la puso en `true` por primera vez;
    /// la bandera nunca vuelve a `false`.
    pub fn request_shutdown(&self) -> bool {
        !self.shutdown.swap(true, Ordering::SeqCst)
    }

    pub fn is_shutdown_requested(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }

    pub fn phase(&self) -> Phase {
        Phase::from_u8(self.phase.load(Ordering::SeqCst))
    }

    /// Transición condicional `from -> to`
    ///
    /// Retorna `false` si la fase actual no era `from`.
    pub fn transition(&self, from: Phase, to: Phase) -> bool {
        let changed = self
            .phase
            .compare_exchange(from as u8, to as u8, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok();
        if changed && to == Phase::Stopped {
            self.notify_stopped();
        }
        changed
    }

    /// Fuerza una fase (se usa para las transiciones terminales)
    pub fn set_phase(&self, phase: Phase) {
        self.phase.store(phase as u8, Ordering::SeqCst);
        if phase == Phase::Stopped {
            self.notify_stopped();
        }
    }

    /// Bloquea hasta que la fase sea `Stopped`
    pub fn wait_stopped(&self) {
        let stopped = self.stopped.lock().unwrap_or_else(PoisonError::into_inner);
        let _stopped = self
            .stopped_signal
            .wait_while(stopped, |stopped| !*stopped)
            .unwrap_or_else(PoisonError::into_inner);
    }

    fn notify_stopped(&self) {
        *self.stopped.lock().unwrap_or_else(PoisonError::into_inner) = true;
        self.stopped_signal.notify_all();
    }
}

impl Default for ServerState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_initial_state() {
        let state = ServerState::new();
        assert!(!state.is_shutdown_requested());
        assert_eq!(state.phase(), Phase::Created);
    }

    #[test]
    fn test_request_shutdown_only_once() {
        let state = ServerState::new();
        assert!(state.request_shutdown());
        assert!(!state.request_shutdown());
        assert!(state.is_shutdown_requested());
    }

    #[test]
    fn test_transition() {
        let state = ServerState::new();
        assert!(state.transition(Phase::Created, Phase::Running));
        assert!(!state.transition(Phase::Created, Phase::Running));
        assert_eq!(state.phase(), Phase::Running);

        state.set_phase(Phase::Stopped);
        assert_eq!(state.phase(), Phase::Stopped);
    }

    #[test]
    fn test_concurrent_shutdown_has_single_winner() {
        let state = Arc::new(ServerState::new());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let state = Arc::clone(&state);
                thread::spawn(move || state.request_shutdown())
            })
            .collect();

        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|won| *won)
            .count();

        assert_eq!(winners, 1);
    }

    #[test]
    fn test_wait_stopped_wakes_on_stop() {
        let state = Arc::new(ServerState::new());
        state.set_phase(Phase::Running);

        let waiter = {
            let state = Arc::clone(&state);
            thread::spawn(move || {
                state.wait_stopped();
                state.phase()
            })
        };

        thread::sleep(std::time::Duration::from_millis(50));
        state.set_phase(Phase::ShuttingDown);
        state.set_phase(Phase::Stopped);

        assert_eq!(waiter.join().unwrap(), Phase::Stopped);
    }

    #[test]
    fn test_wait_stopped_after_direct_transition() {
        let state = ServerState::new();
        assert!(state.transition(Phase::Created, Phase::Stopped));

        // Ya detenido: retorna de inmediato
        state.wait_stopped();
    }
}
