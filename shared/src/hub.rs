//! Publish/subscribe fan-out of live log entries.
//!
//! The `Hub` pushes newly stored entries to any number of independently
//! filtered subscribers. Fan-out runs on a single actor task so that any two
//! entries reach every matching subscriber in insertion order. Delivery is
//! deliberately lossy: a slow subscriber loses entries, it never stalls
//! ingestion or its peers.

use crate::models::{CompiledFilter, LogEntry, LogFilter};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::mpsc;
use tracing::{debug, trace};

/// Bound on the hub's entry intake queue. When the producer outpaces the
/// actor, the newest entry is dropped rather than blocking ingestion.
const INTAKE_CAPACITY: usize = 256;

/// Bound on each subscriber's outbound delivery queue.
const SUBSCRIBER_QUEUE_CAPACITY: usize = 256;

/// An event delivered on a subscriber's outbound queue.
#[derive(Debug, Clone)]
pub enum Event {
    /// A log entry that matched the subscriber's filter.
    Log(LogEntry),
    /// Upstream liveness change. Bypasses filters.
    Status {
        /// Whether the ingestion source is still open.
        stdin_open: bool,
    },
    /// Reply to a client ping. Bypasses filters.
    Pong,
}

enum Command {
    Register(Arc<Subscriber>),
    Unregister(u64),
    UpstreamClosed,
}

/// A live consumer of the broadcast feed.
///
/// Holds exactly one filter, mutable by the owning connection handler while
/// registered, and read as one consistent value by the hub on every
/// broadcast.
#[derive(Debug)]
pub struct Subscriber {
    id: u64,
    filter: RwLock<CompiledFilter>,
    sender: mpsc::Sender<Event>,
}

impl Subscriber {
    fn new(id: u64, queue_capacity: usize) -> (Arc<Self>, mpsc::Receiver<Event>) {
        let (sender, receiver) = mpsc::channel(queue_capacity);
        let subscriber = Arc::new(Self {
            id,
            filter: RwLock::new(CompiledFilter::default()),
            sender,
        });
        (subscriber, receiver)
    }

    /// Returns the subscriber's unique id.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Atomically replaces the active filter.
    ///
    /// Takes effect for all subsequent broadcasts, not retroactively; events
    /// already queued are unaffected.
    pub fn set_filter(&self, filter: &LogFilter) {
        // A poisoned lock only means a writer panicked mid-swap; the stored
        // value is still a whole CompiledFilter, so recover and overwrite.
        *self
            .filter
            .write()
            .unwrap_or_else(PoisonError::into_inner) = filter.compile();
    }

    /// Resets the filter to match-all.
    pub fn clear_filter(&self) {
        self.set_filter(&LogFilter::default());
    }

    /// Attempts to enqueue an event without blocking.
    ///
    /// Returns false when the queue is full or the receiver is gone; the
    /// event is dropped in either case.
    pub fn try_send(&self, event: Event) -> bool {
        self.sender.try_send(event).is_ok()
    }

    fn matches(&self, entry: &LogEntry) -> bool {
        self.filter
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .matches(entry)
    }
}

/// Handle for broadcasting entries and managing subscribers.
///
/// Construction also yields the [`HubRunner`] actor that must be spawned for
/// any delivery to happen:
///
/// ```
/// use shared::hub::Hub;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let (hub, runner) = Hub::new();
/// tokio::spawn(runner.run());
/// let (subscriber, mut events) = hub.subscribe();
/// # }
/// ```
#[derive(Debug)]
pub struct Hub {
    control: mpsc::UnboundedSender<Command>,
    entries: mpsc::Sender<LogEntry>,
    stdin_open: AtomicBool,
    next_subscriber_id: AtomicU64,
}

impl Hub {
    /// Creates the hub and its actor task.
    #[must_use]
    pub fn new() -> (Self, HubRunner) {
        let (control_tx, control_rx) = mpsc::unbounded_channel();
        let (entries_tx, entries_rx) = mpsc::channel(INTAKE_CAPACITY);

        let hub = Self {
            control: control_tx,
            entries: entries_tx,
            stdin_open: AtomicBool::new(true),
            next_subscriber_id: AtomicU64::new(1),
        };
        let runner = HubRunner {
            control: control_rx,
            entries: entries_rx,
            subscribers: Vec::new(),
        };
        (hub, runner)
    }

    /// Registers a new subscriber with a match-all filter.
    ///
    /// Returns the subscriber handle (for filter changes and unregistration)
    /// and the receiving end of its delivery queue.
    pub fn subscribe(&self) -> (Arc<Subscriber>, mpsc::Receiver<Event>) {
        let id = self.next_subscriber_id.fetch_add(1, Ordering::Relaxed);
        let (subscriber, receiver) = Subscriber::new(id, SUBSCRIBER_QUEUE_CAPACITY);
        let _ = self.control.send(Command::Register(Arc::clone(&subscriber)));
        (subscriber, receiver)
    }

    /// Removes a subscriber and releases its delivery queue.
    ///
    /// Safe to call from either side of a connection teardown race; a second
    /// call for the same id is a no-op.
    pub fn unsubscribe(&self, id: u64) {
        let _ = self.control.send(Command::Unregister(id));
    }

    /// Hands an entry to the fan-out actor without blocking.
    ///
    /// When the intake queue is full the entry is dropped and ingestion
    /// continues; delivery is best-effort by design.
    pub fn broadcast(&self, entry: LogEntry) {
        if self.entries.try_send(entry).is_err() {
            trace!("hub intake full, dropping entry");
        }
    }

    /// Marks the ingestion source closed and notifies every subscriber,
    /// regardless of their filters.
    pub fn notify_upstream_closed(&self) {
        self.stdin_open.store(false, Ordering::Relaxed);
        let _ = self.control.send(Command::UpstreamClosed);
    }

    /// Current liveness of the ingestion source.
    #[must_use]
    pub fn is_upstream_open(&self) -> bool {
        self.stdin_open.load(Ordering::Relaxed)
    }
}

/// Actor owning the subscriber set and performing serialized fan-out.
#[derive(Debug)]
pub struct HubRunner {
    control: mpsc::UnboundedReceiver<Command>,
    entries: mpsc::Receiver<LogEntry>,
    subscribers: Vec<Arc<Subscriber>>,
}

impl HubRunner {
    /// Runs the fan-out loop until the owning [`Hub`] is dropped.
    ///
    /// Registration changes and broadcasts are processed one at a time in
    /// arrival order, which yields the cross-subscriber relative-ordering
    /// guarantee.
    pub async fn run(mut self) {
        loop {
            tokio::select! {
                // Registration changes are never lossy, so apply them ahead
                // of any queued entries.
                biased;
                command = self.control.recv() => match command {
                    Some(command) => self.handle_command(command),
                    None => break,
                },
                entry = self.entries.recv() => match entry {
                    Some(entry) => self.fan_out(&entry),
                    None => break,
                },
            }
        }
        debug!("hub actor stopped");
    }

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::Register(subscriber) => {
                debug!(id = subscriber.id(), "subscriber registered");
                self.subscribers.push(subscriber);
            }
            Command::Unregister(id) => {
                let before = self.subscribers.len();
                self.subscribers.retain(|s| s.id() != id);
                if self.subscribers.len() < before {
                    debug!(id, "subscriber removed");
                }
            }
            Command::UpstreamClosed => {
                for subscriber in &self.subscribers {
                    let _ = subscriber.try_send(Event::Status { stdin_open: false });
                }
            }
        }
    }

    fn fan_out(&self, entry: &LogEntry) {
        for subscriber in &self.subscribers {
            if subscriber.matches(entry) && !subscriber.try_send(Event::Log(entry.clone())) {
                trace!(id = subscriber.id(), "subscriber queue full, dropping entry");
            }
        }
    }
}
