//! Per-connection state.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use crate::config::GatewayConfig;
use crate::domain::registry::EventReceiver;
use crate::domain::{ClientHandle, ConnectionId, EventFilter, EventInfo, Session};

/// Deadline offset used when `now + interval` does not fit in an [`Instant`].
pub const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// Connection phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Accepting commands.
    Standby,
    /// Push-only streaming. Never left once entered.
    Running,
}

/// Bitmask of interactive event classes a client wants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InteractionLevel(u32);

impl InteractionLevel {
    /// Every class.
    pub const ALL: Self = Self(0);
    /// Plain notifications.
    pub const NOTIFICATION: Self = Self(1);
    /// Captcha prompts.
    pub const CAPTCHA: Self = Self(2);
    /// Free-form queries.
    pub const QUERY: Self = Self(4);

    /// Wraps a raw bitmask.
    #[must_use]
    pub const fn new(bits: u32) -> Self {
        Self(bits)
    }

    /// Raw bitmask.
    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }
}

impl Default for InteractionLevel {
    fn default() -> Self {
        Self::ALL
    }
}

/// Settings every new connection starts with.
#[derive(Debug, Clone)]
pub struct ConnectionDefaults {
    /// Push interval.
    pub interval: Duration,
    /// Event filter.
    pub filter: EventFilter,
}

impl From<&GatewayConfig> for ConnectionDefaults {
    fn from(config: &GatewayConfig) -> Self {
        Self {
            interval: config.push_interval,
            filter: config.event_filter.clone(),
        }
    }
}

/// State of one connection, owned by its push loop.
///
/// Only the event queue is written from outside, through the
/// [`ClientHandle`] stored in the registry.
#[derive(Debug)]
pub struct ClientContext {
    handle: Arc<ClientHandle>,
    queue: EventReceiver,
    mode: Mode,
    interval: Duration,
    interaction: InteractionLevel,
    next_deadline: Instant,
}

impl ClientContext {
    /// Creates the state for a freshly opened connection.
    #[must_use]
    pub fn new(defaults: &ConnectionDefaults) -> Self {
        let (handle, queue) = ClientHandle::new(defaults.filter.clone());
        Self {
            handle,
            queue,
            mode: Mode::Standby,
            interval: defaults.interval,
            interaction: InteractionLevel::default(),
            next_deadline: Instant::now(),
        }
    }

    /// Registry-side handle.
    #[must_use]
    pub fn handle(&self) -> &Arc<ClientHandle> {
        &self.handle
    }

    /// Connection id.
    #[must_use]
    pub fn id(&self) -> ConnectionId {
        self.handle.id()
    }

    /// Current session, if logged in.
    #[must_use]
    pub fn session(&self) -> Option<Session> {
        self.handle.session()
    }

    /// Replaces the session.
    pub fn set_session(&self, session: Option<Session>) {
        self.handle.set_session(session);
    }

    /// Replaces the event filter.
    pub fn set_filter(&self, filter: EventFilter) {
        self.handle.set_filter(filter);
    }

    /// Current phase.
    #[must_use]
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Push interval.
    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Sets the push interval. Ignored once running.
    pub fn set_interval(&mut self, interval: Duration) {
        if self.mode == Mode::Standby {
            self.interval = interval;
        }
    }

    /// Interaction level.
    #[must_use]
    pub fn interaction(&self) -> InteractionLevel {
        self.interaction
    }

    /// Sets the interaction level. Ignored once running.
    pub fn set_interaction(&mut self, level: InteractionLevel) {
        if self.mode == Mode::Standby {
            self.interaction = level;
        }
    }

    /// Switches to push-only mode.
    pub fn start(&mut self) {
        self.mode = Mode::Running;
        self.handle.mark_streaming();
    }

    /// Waits up to one interval for the next queued event.
    ///
    /// Returns `Ok(None)` on timeout.
    ///
    /// # Errors
    ///
    /// Returns [`QueueClosed`] if no producer is left.
    pub async fn next_event(&mut self) -> Result<Option<Arc<EventInfo>>, QueueClosed> {
        match tokio::time::timeout(self.interval, self.queue.recv()).await {
            Ok(Some(event)) => Ok(Some(event)),
            Ok(None) => Err(QueueClosed),
            Err(_) => Ok(None),
        }
    }

    /// Returns `true` once the next status push is due.
    #[must_use]
    pub fn push_due(&self, now: Instant) -> bool {
        now >= self.next_deadline
    }

    /// Schedules the next status push one interval after `now`.
    ///
    /// An interval too large for the clock schedules it [`FAR_FUTURE`]
    /// ahead instead.
    pub fn schedule_next(&mut self, now: Instant) {
        self.next_deadline = now
            .checked_add(self.interval)
            .or_else(|| now.checked_add(FAR_FUTURE))
            .unwrap_or(now);
    }
}

/// The event queue has no producer left.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueClosed;

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn defaults() -> ConnectionDefaults {
        ConnectionDefaults {
            interval: Duration::from_millis(1500),
            filter: EventFilter::default(),
        }
    }

    #[test]
    fn starts_in_standby_with_defaults() {
        let ctx = ClientContext::new(&defaults());
        assert_eq!(ctx.mode(), Mode::Standby);
        assert_eq!(ctx.interval(), Duration::from_millis(1500));
        assert_eq!(ctx.interaction(), InteractionLevel::ALL);
        assert!(ctx.session().is_none());
    }

    #[test]
    fn settings_freeze_once_running() {
        let mut ctx = ClientContext::new(&defaults());
        ctx.set_interval(Duration::from_millis(500));
        ctx.set_interaction(InteractionLevel::CAPTCHA);
        ctx.start();
        ctx.set_interval(Duration::from_secs(9));
        ctx.set_interaction(InteractionLevel::QUERY);

        assert_eq!(ctx.mode(), Mode::Running);
        assert_eq!(ctx.interval(), Duration::from_millis(500));
        assert_eq!(ctx.interaction(), InteractionLevel::CAPTCHA);
        assert!(ctx.handle().with_subscription(|s| s.streaming));
    }

    #[tokio::test(start_paused = true)]
    async fn push_is_due_immediately_then_after_interval() {
        let mut ctx = ClientContext::new(&defaults());
        let now = Instant::now();
        assert!(ctx.push_due(now));

        ctx.schedule_next(now);
        assert!(!ctx.push_due(now + Duration::from_millis(1499)));
        assert!(ctx.push_due(now + Duration::from_millis(1500)));
    }

    #[tokio::test(start_paused = true)]
    async fn oversized_interval_does_not_overflow_deadline() {
        let mut ctx = ClientContext::new(&defaults());
        ctx.set_interval(Duration::MAX);
        let now = Instant::now();
        ctx.schedule_next(now);
        assert!(!ctx.push_due(now + Duration::from_secs(86_400 * 365)));
    }

    #[tokio::test(start_paused = true)]
    async fn next_event_times_out_after_interval() {
        let mut ctx = ClientContext::new(&defaults());
        let before = Instant::now();
        let result = ctx.next_event().await;
        assert!(matches!(result, Ok(None)));
        assert_eq!(before.elapsed(), Duration::from_millis(1500));
    }

    #[tokio::test]
    async fn next_event_returns_queued_event() {
        let mut ctx = ClientContext::new(&defaults());
        let event = Arc::new(EventInfo {
            eventname: "package_added".into(),
            event_args: Vec::new(),
        });
        assert!(ctx.handle().enqueue(event));
        let Ok(Some(received)) = ctx.next_event().await else {
            panic!("expected an event");
        };
        assert_eq!(received.eventname, "package_added");
    }
}
