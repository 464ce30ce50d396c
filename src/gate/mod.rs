use std::mem;

/// Gate over "the currently open transport session".
///
/// `Pending` holds the work queued until a session opens; `resolve` moves to
/// `Open` and hands the queue back in arrival order. Losing the session
/// moves an open gate back to a fresh `Pending` through `invalidate`. An
/// open gate is never resolved again.
#[derive(Debug)]
pub enum ConnectionGate<S, W> {
    Pending(Vec<W>),
    Open(S),
}

impl<S, W> ConnectionGate<S, W> {
    pub fn new() -> Self {
        ConnectionGate::Pending(Vec::new())
    }

    /// Pending → Open.
    ///
    /// Returns the queued waiters to flush against `session`, or gives the
    /// session back if the gate is already open.
    pub fn resolve(&mut self, session: S) -> Result<Vec<W>, S> {
        match self {
            ConnectionGate::Open(_) => Err(session),
            ConnectionGate::Pending(waiters) => {
                let waiters = mem::take(waiters);
                *self = ConnectionGate::Open(session);
                Ok(waiters)
            }
        }
    }

    /// Open → Pending, returning the session that was open.
    ///
    /// A pending gate keeps its waiters.
    pub fn invalidate(&mut self) -> Option<S> {
        match mem::replace(self, ConnectionGate::Pending(Vec::new())) {
            ConnectionGate::Open(session) => Some(session),
            pending => {
                *self = pending;
                None
            }
        }
    }

    /// Queue work behind a pending gate; hands it back if the gate is open
    pub fn enqueue(&mut self, waiter: W) -> Result<(), W> {
        match self {
            ConnectionGate::Pending(waiters) => {
                waiters.push(waiter);
                Ok(())
            }
            ConnectionGate::Open(_) => Err(waiter),
        }
    }

    /// Drop queued waiters that do not match `keep`
    pub fn retain_waiting(&mut self, keep: impl FnMut(&W) -> bool) {
        if let ConnectionGate::Pending(waiters) = self {
            waiters.retain(keep);
        }
    }

    pub fn session(&self) -> Option<&S> {
        match self {
            ConnectionGate::Open(session) => Some(session),
            ConnectionGate::Pending(_) => None,
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self, ConnectionGate::Open(_))
    }

    pub fn waiting(&self) -> usize {
        match self {
            ConnectionGate::Pending(waiters) => waiters.len(),
            ConnectionGate::Open(_) => 0,
        }
    }
}

impl<S, W> Default for ConnectionGate<S, W> {
    fn default() -> Self {
        Self::new()
    }
}
