use foundation::CycleId;

/// What happened at a lifecycle point.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum EventKind {
    Derender,
    Fetch,
    Attach,
    Detach,
    Markers,
    Notice,
    Discard,
}

impl EventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::Derender => "derender",
            EventKind::Fetch => "fetch",
            EventKind::Attach => "attach",
            EventKind::Detach => "detach",
            EventKind::Markers => "markers",
            EventKind::Notice => "notice",
            EventKind::Discard => "discard",
        }
    }
}

/// Cycle-indexed trace event.
///
/// Complements `tracing` output with a structured record tests can assert on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub cycle: CycleId,
    pub kind: EventKind,
    pub message: String,
}

#[derive(Debug, Default)]
pub struct EventBus {
    events: Vec<Event>,
    /// Keep only events of the newest `n` cycles; `None` keeps everything.
    retained_cycles: Option<u64>,
    newest: CycleId,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// A bus that forgets events older than the newest `cycles` cycles.
    pub fn bounded(cycles: u64) -> Self {
        Self {
            retained_cycles: Some(cycles.max(1)),
            ..Self::default()
        }
    }

    pub fn emit(&mut self, cycle: CycleId, kind: EventKind, message: impl Into<String>) {
        self.events.push(Event {
            cycle,
            kind,
            message: message.into(),
        });
        if cycle > self.newest {
            self.newest = cycle;
            if let Some(keep) = self.retained_cycles {
                let floor = self.newest.0.saturating_sub(keep - 1);
                self.events.retain(|e| e.cycle.0 >= floor);
            }
        }
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Kinds recorded for `cycle`, in emission order.
    pub fn kinds_for(&self, cycle: CycleId) -> Vec<EventKind> {
        self.events
            .iter()
            .filter(|e| e.cycle == cycle)
            .map(|e| e.kind)
            .collect()
    }

    pub fn drain(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }
}
