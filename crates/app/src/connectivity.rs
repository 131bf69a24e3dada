use std::sync::atomic::{AtomicBool, Ordering};

/// Network reachability as seen by the controllers. Every gesture that would
/// reach the remote service checks it first.
pub trait Connectivity: Send + Sync {
    fn is_online(&self) -> bool;
}

/// Reachability flag flipped by the host (console `offline` / `online`).
#[derive(Debug)]
pub struct ManualConnectivity {
    online: AtomicBool,
}

impl ManualConnectivity {
    pub fn new(online: bool) -> Self {
        Self {
            online: AtomicBool::new(online),
        }
    }

    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::Relaxed);
    }
}

impl Connectivity for ManualConnectivity {
    fn is_online(&self) -> bool {
        self.online.load(Ordering::Relaxed)
    }
}
