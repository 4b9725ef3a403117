//! Port allocation for node and wallet processes.
//!
//! Every worker (a test binary, or one of several running in parallel) owns a
//! disjoint window of `PORTS_PER_WORKER` ports, so harness instances running at
//! the same time never hand out the same port.

use log::debug;
use serde::{Deserialize, Serialize};
use std::net::{Ipv4Addr, TcpListener};
use std::sync::atomic::{AtomicU32, Ordering};

/// First port of worker 0
pub const DEFAULT_BASE_PORT: u16 = 20000;

/// Size of the port window owned by one worker
pub const PORTS_PER_WORKER: u16 = 500;

/// Variable holding the worker number, e.g. `3` or `gw3`
pub const WORKER_ID_VARIABLE: &str = "HIVENET_WORKER_ID";

#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("No free port left in range {start}..{end}")]
    Exhausted { start: u16, end: u16 },

    #[error("Worker {worker_id} does not fit in the port range above {base}")]
    InvalidWorker { base: u16, worker_id: u16 },
}

/// Ports used by one node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodePorts {
    pub p2p: u16,
    pub http: u16,
    pub ws: u16,
}

/// Hands out ports from a fixed window, skipping ports already bound by
/// another process.
#[derive(Debug)]
pub struct PortAllocator {
    start: u16,
    end: u16,
    next: AtomicU32,
}

impl PortAllocator {
    /// Window of `worker_id` above `base`
    pub fn for_worker(base: u16, worker_id: u16) -> Result<Self, PortError> {
        let start = u32::from(base) + u32::from(worker_id) * u32::from(PORTS_PER_WORKER);
        let end = start + u32::from(PORTS_PER_WORKER);
        if end > u32::from(u16::MAX) {
            return Err(PortError::InvalidWorker { base, worker_id });
        }
        Ok(Self::with_range(start as u16, end as u16))
    }

    /// Allocator over `start..end`
    pub fn with_range(start: u16, end: u16) -> Self {
        Self {
            start,
            end,
            next: AtomicU32::new(u32::from(start)),
        }
    }

    pub fn range(&self) -> (u16, u16) {
        (self.start, self.end)
    }

    /// Next port of the window that can currently be bound on the loopback.
    pub fn allocate(&self) -> Result<u16, PortError> {
        loop {
            let candidate = self.next.fetch_add(1, Ordering::Relaxed);
            if candidate >= u32::from(self.end) {
                return Err(PortError::Exhausted {
                    start: self.start,
                    end: self.end,
                });
            }

            let port = candidate as u16;
            if is_free(port) {
                return Ok(port);
            }
            debug!("Port {} is in use, skipping", port);
        }
    }

    pub fn allocate_node_ports(&self) -> Result<NodePorts, PortError> {
        Ok(NodePorts {
            p2p: self.allocate()?,
            http: self.allocate()?,
            ws: self.allocate()?,
        })
    }
}

fn is_free(port: u16) -> bool {
    TcpListener::bind((Ipv4Addr::LOCALHOST, port)).is_ok()
}

/// Worker number taken from `HIVENET_WORKER_ID`, 0 when unset.
///
/// Trailing digits are used, so test-runner ids like `gw3` work too.
pub fn worker_id_from_env() -> u16 {
    std::env::var(WORKER_ID_VARIABLE)
        .ok()
        .and_then(|value| parse_worker_id(&value))
        .unwrap_or(0)
}

fn parse_worker_id(value: &str) -> Option<u16> {
    let digits_start = value
        .char_indices()
        .rev()
        .take_while(|(_, c)| c.is_ascii_digit())
        .last()
        .map(|(index, _)| index)?;
    value[digits_start..].parse().ok()
}
