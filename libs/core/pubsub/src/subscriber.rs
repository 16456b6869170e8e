//! Reconnecting subscriber.
//!
//! Two tasks per subscription:
//! - the reader owns the connection state machine, decodes messages and
//!   forwards events into a bounded channel;
//! - the dispatcher drains that channel into the [`EventHandler`], one event
//!   at a time.
//!
//! Shutdown stops the reader first; the dispatcher then finishes whatever is
//! already queued and exits.

use crate::config::SubscriberConfig;
use crate::error::PubSubError;
use crate::event::Event;
use crate::handler::EventHandler;
use crate::metrics::SubscriberMetrics;
use crate::policy::ReconnectPolicy;
use crate::state::SubscriberState;
use crate::transport::{PubSubConnection, PubSubTransport, RawMessage};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Builds subscriptions over a transport.
pub struct EventSubscriber<T> {
    transport: Arc<T>,
    config: SubscriberConfig,
}

impl<T> EventSubscriber<T>
where
    T: PubSubTransport + 'static,
{
    pub fn new(transport: T, config: SubscriberConfig) -> Self {
        Self {
            transport: Arc::new(transport),
            config,
        }
    }

    pub fn config(&self) -> &SubscriberConfig {
        &self.config
    }

    /// Follow the configured channel and feed every decoded event to `handler`.
    ///
    /// Spawns onto the current tokio runtime and returns immediately; the
    /// subscription runs until [`SubscriberHandle::shutdown`] is called or the
    /// handle is dropped.
    pub fn subscribe(&self, handler: Arc<dyn EventHandler>) -> SubscriberHandle {
        let channel = self.config.channel.clone();
        let metrics = SubscriberMetrics::new(channel.clone());
        let (state_tx, state_rx) = watch::channel(SubscriberState::Disconnected);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (events_tx, events_rx) = mpsc::channel(self.config.buffer.max(1));

        info!(
            channel = %channel,
            handler = handler.name(),
            buffer = self.config.buffer,
            "Starting event subscriber"
        );

        let reader = ChannelReader {
            transport: Arc::clone(&self.transport),
            channel: channel.clone(),
            policy: self.config.reconnect.clone(),
            state: state_tx,
            events: events_tx,
            shutdown: shutdown_rx,
            metrics: metrics.clone(),
        };

        SubscriberHandle {
            channel,
            state: state_rx,
            shutdown: shutdown_tx,
            reader: tokio::spawn(reader.run()),
            dispatcher: tokio::spawn(dispatch(events_rx, handler, metrics)),
        }
    }
}

/// Owner of a running subscription.
pub struct SubscriberHandle {
    channel: String,
    state: watch::Receiver<SubscriberState>,
    shutdown: watch::Sender<bool>,
    reader: JoinHandle<()>,
    dispatcher: JoinHandle<()>,
}

impl SubscriberHandle {
    pub fn channel(&self) -> &str {
        &self.channel
    }

    pub fn state(&self) -> SubscriberState {
        *self.state.borrow()
    }

    /// Receiver for observing state transitions.
    pub fn watch_state(&self) -> watch::Receiver<SubscriberState> {
        self.state.clone()
    }

    /// Wait until the subscriber reaches `target`.
    ///
    /// Returns `false` if the subscription ended first.
    pub async fn wait_for_state(&self, target: SubscriberState) -> bool {
        let mut rx = self.state.clone();
        rx.wait_for(|state| *state == target).await.is_ok()
    }

    /// Stop reading, let queued events reach the handler, then return.
    pub async fn shutdown(self) {
        info!(channel = %self.channel, "Shutting down event subscriber");
        let _ = self.shutdown.send(true);

        if let Err(e) = self.reader.await {
            error!(channel = %self.channel, error = %e, "Subscriber reader task failed");
        }
        if let Err(e) = self.dispatcher.await {
            error!(channel = %self.channel, error = %e, "Subscriber dispatcher task failed");
        }
        info!(channel = %self.channel, "Event subscriber stopped");
    }
}

/// Per-connection subscription bookkeeping.
///
/// Remembers what was subscribed on this connection so a repeated subscribe
/// for the same channel never issues a second `SUBSCRIBE`.
pub(crate) struct Session<C> {
    conn: C,
    channels: HashSet<String>,
}

impl<C: PubSubConnection> Session<C> {
    pub(crate) fn new(conn: C) -> Self {
        Self {
            conn,
            channels: HashSet::new(),
        }
    }

    /// Returns `true` when a `SUBSCRIBE` was actually sent.
    pub(crate) async fn subscribe(&mut self, channel: &str) -> Result<bool, PubSubError> {
        if self.channels.contains(channel) {
            return Ok(false);
        }
        self.conn.subscribe(channel).await?;
        self.channels.insert(channel.to_string());
        Ok(true)
    }

    pub(crate) async fn next_message(&mut self) -> Option<RawMessage> {
        self.conn.next_message().await
    }
}

/// Outcome of one connected session.
enum SessionEnd {
    /// Transport failed or closed; reconnect.
    Lost,
    /// Shutdown requested, or nobody is left to consume events.
    Stop,
}

struct ChannelReader<T> {
    transport: Arc<T>,
    channel: String,
    policy: ReconnectPolicy,
    state: watch::Sender<SubscriberState>,
    events: mpsc::Sender<Event>,
    shutdown: watch::Receiver<bool>,
    metrics: SubscriberMetrics,
}

impl<T: PubSubTransport> ChannelReader<T> {
    async fn run(mut self) {
        let mut attempt: u32 = 0;

        loop {
            if *self.shutdown.borrow() {
                break;
            }

            self.set_state(SubscriberState::Connecting);
            let connected = tokio::select! {
                biased;
                _ = self.shutdown.changed() => break,
                result = self.transport.connect() => result,
            };

            match connected {
                Ok(conn) => {
                    self.set_state(SubscriberState::Ready);
                    let mut session = Session::new(conn);

                    match session.subscribe(&self.channel).await {
                        Ok(_) => {
                            if attempt > 0 {
                                info!(channel = %self.channel, attempts = attempt, "Resubscribed after reconnect");
                            }
                            attempt = 0;
                            self.set_state(SubscriberState::Subscribed);
                            if let SessionEnd::Stop = self.pump(&mut session).await {
                                break;
                            }
                        }
                        Err(e) => {
                            warn!(channel = %self.channel, error = %e, "Subscribe failed");
                        }
                    }
                }
                Err(e) => {
                    warn!(channel = %self.channel, error = %e, "Connection attempt failed");
                }
            }

            attempt = attempt.saturating_add(1);
            self.set_state(SubscriberState::Reconnecting);
            self.metrics.reconnect();

            let delay = self.policy.delay_for(attempt);
            debug!(
                channel = %self.channel,
                attempt,
                delay_ms = delay.as_millis() as u64,
                "Waiting before reconnect"
            );
            if self.wait_or_shutdown(delay).await {
                break;
            }
        }

        self.set_state(SubscriberState::Disconnected);
        debug!(channel = %self.channel, "Subscriber reader stopped");
    }

    /// Read messages until the connection drops or shutdown is requested.
    async fn pump<C: PubSubConnection>(&mut self, session: &mut Session<C>) -> SessionEnd {
        loop {
            let message = tokio::select! {
                biased;
                _ = self.shutdown.changed() => return SessionEnd::Stop,
                message = session.next_message() => message,
            };

            let Some(raw) = message else {
                warn!(channel = %self.channel, "Pub/sub connection closed");
                return SessionEnd::Lost;
            };

            self.metrics.message_received();
            match Event::decode(&raw.payload) {
                Ok(event) => {
                    if self.events.send(event).await.is_err() {
                        error!(channel = %self.channel, "Event dispatcher is gone, stopping reader");
                        return SessionEnd::Stop;
                    }
                }
                Err(e) => {
                    self.metrics.decode_failed();
                    warn!(
                        channel = %raw.channel,
                        error = %e,
                        bytes = raw.payload.len(),
                        "Dropping malformed event"
                    );
                }
            }
        }
    }

    /// Sleep for `delay`; returns `true` if shutdown was requested meanwhile.
    async fn wait_or_shutdown(&mut self, delay: Duration) -> bool {
        tokio::select! {
            biased;
            _ = self.shutdown.changed() => true,
            _ = tokio::time::sleep(delay) => *self.shutdown.borrow(),
        }
    }

    fn set_state(&self, next: SubscriberState) {
        let previous = self.state.send_replace(next);
        if previous != next {
            debug!(channel = %self.channel, from = %previous, to = %next, "Subscriber state changed");
        }
    }
}

async fn dispatch(
    mut events: mpsc::Receiver<Event>,
    handler: Arc<dyn EventHandler>,
    metrics: SubscriberMetrics,
) {
    while let Some(event) = events.recv().await {
        if let Err(e) = handler.handle(&event).await {
            metrics.handler_failed(handler.name());
            error!(
                handler = handler.name(),
                event_type = %event.event_type,
                service = %event.service,
                error = %e,
                "Event handler failed, dropping event"
            );
        }
    }
    debug!(handler = handler.name(), "Event dispatcher drained");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::HandlerError;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::mpsc::UnboundedReceiver;

    enum Step {
        Refuse,
        Open(UnboundedReceiver<Vec<u8>>),
    }

    #[derive(Default)]
    struct Counters {
        connects: AtomicUsize,
        subscribes: AtomicUsize,
    }

    /// Transport that replays a script of connection outcomes and then hangs.
    struct ScriptedTransport {
        steps: Mutex<VecDeque<Step>>,
        counters: Arc<Counters>,
    }

    impl ScriptedTransport {
        fn new(steps: Vec<Step>) -> (Self, Arc<Counters>) {
            let counters = Arc::new(Counters::default());
            let transport = Self {
                steps: Mutex::new(steps.into()),
                counters: Arc::clone(&counters),
            };
            (transport, counters)
        }
    }

    struct ScriptedConnection {
        rx: UnboundedReceiver<Vec<u8>>,
        counters: Arc<Counters>,
    }

    #[async_trait]
    impl PubSubTransport for ScriptedTransport {
        type Connection = ScriptedConnection;

        async fn connect(&self) -> Result<ScriptedConnection, PubSubError> {
            self.counters.connects.fetch_add(1, Ordering::SeqCst);
            let step = self.steps.lock().unwrap().pop_front();
            match step {
                Some(Step::Open(rx)) => Ok(ScriptedConnection {
                    rx,
                    counters: Arc::clone(&self.counters),
                }),
                Some(Step::Refuse) => Err(PubSubError::Connection(
                    database::DatabaseError::ConnectionFailed("refused".to_string()),
                )),
                None => std::future::pending().await,
            }
        }
    }

    #[async_trait]
    impl PubSubConnection for ScriptedConnection {
        async fn subscribe(&mut self, _channel: &str) -> Result<(), PubSubError> {
            self.counters.subscribes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn next_message(&mut self) -> Option<RawMessage> {
            self.rx
                .recv()
                .await
                .map(|payload| RawMessage::new("events", payload))
        }
    }

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<String>>,
        fail_on: Option<&'static str>,
    }

    impl Recorder {
        fn seen(&self) -> Vec<String> {
            self.seen.lock().unwrap().clone()
        }

        async fn wait_for(&self, count: usize) {
            tokio::time::timeout(Duration::from_secs(5), async {
                while self.seen.lock().unwrap().len() < count {
                    tokio::time::sleep(Duration::from_millis(5)).await;
                }
            })
            .await
            .expect("handler did not receive enough events");
        }
    }

    #[async_trait]
    impl EventHandler for Recorder {
        async fn handle(&self, event: &Event) -> Result<(), HandlerError> {
            self.seen.lock().unwrap().push(event.event_type.clone());
            if self.fail_on == Some(event.event_type.as_str()) {
                return Err(HandlerError::new("store unavailable"));
            }
            Ok(())
        }

        fn name(&self) -> &'static str {
            "recorder"
        }
    }

    fn raw(event_type: &str) -> Vec<u8> {
        format!(
            r#"{{"type":"{event_type}","payload":{{}},"timestamp":1700000000000,"service":"test"}}"#
        )
        .into_bytes()
    }

    fn fast_config() -> SubscriberConfig {
        SubscriberConfig::default()
            .with_buffer(16)
            .with_reconnect(
                ReconnectPolicy::new(Duration::from_millis(1), Duration::from_millis(5))
                    .without_jitter(),
            )
    }

    #[tokio::test]
    async fn test_delivers_events_in_order_and_drops_malformed() {
        let (tx, rx) = mpsc::unbounded_channel();
        let (transport, counters) = ScriptedTransport::new(vec![Step::Open(rx)]);
        let recorder = Arc::new(Recorder::default());

        let handle = EventSubscriber::new(transport, fast_config()).subscribe(recorder.clone());
        assert!(handle.wait_for_state(SubscriberState::Subscribed).await);

        tx.send(raw("data.fetch.started")).unwrap();
        tx.send(b"{not json".to_vec()).unwrap();
        tx.send(br#"{"type":"","payload":{},"timestamp":1,"service":"x"}"#.to_vec())
            .unwrap();
        tx.send(raw("data.fetch.completed")).unwrap();

        recorder.wait_for(2).await;
        assert_eq!(
            recorder.seen(),
            vec!["data.fetch.started", "data.fetch.completed"]
        );
        assert_eq!(counters.subscribes.load(Ordering::SeqCst), 1);

        handle.shutdown().await;
    }

    #[tokio::test]
    async fn test_reconnects_and_resubscribes_after_close_and_refusal() {
        let (tx1, rx1) = mpsc::unbounded_channel();
        let (tx2, rx2) = mpsc::unbounded_channel();
        let (transport, counters) =
            ScriptedTransport::new(vec![Step::Refuse, Step::Open(rx1), Step::Refuse, Step::Open(rx2)]);
        let recorder = Arc::new(Recorder::default());

        let handle = EventSubscriber::new(transport, fast_config()).subscribe(recorder.clone());

        tx1.send(raw("data.upload.started")).unwrap();
        recorder.wait_for(1).await;
        drop(tx1);

        tx2.send(raw("data.upload.completed")).unwrap();
        recorder.wait_for(2).await;

        assert_eq!(
            recorder.seen(),
            vec!["data.upload.started", "data.upload.completed"]
        );
        assert_eq!(counters.connects.load(Ordering::SeqCst), 4);
        assert_eq!(counters.subscribes.load(Ordering::SeqCst), 2);
        assert!(handle.wait_for_state(SubscriberState::Subscribed).await);

        handle.shutdown().await;
    }

    #[tokio::test]
    async fn test_handler_failure_does_not_stop_subscription() {
        let (tx, rx) = mpsc::unbounded_channel();
        let (transport, _) = ScriptedTransport::new(vec![Step::Open(rx)]);
        let recorder = Arc::new(Recorder {
            fail_on: Some("data.search.started"),
            ..Recorder::default()
        });

        let handle = EventSubscriber::new(transport, fast_config()).subscribe(recorder.clone());

        tx.send(raw("data.search.started")).unwrap();
        tx.send(raw("data.search.completed")).unwrap();
        recorder.wait_for(2).await;

        assert!(handle.state().is_subscribed());
        handle.shutdown().await;
    }

    #[tokio::test]
    async fn test_shutdown_while_connecting_ends_disconnected() {
        let (transport, _) = ScriptedTransport::new(Vec::new());
        let recorder = Arc::new(Recorder::default());

        let handle = EventSubscriber::new(transport, fast_config()).subscribe(recorder);
        assert!(handle.wait_for_state(SubscriberState::Connecting).await);

        let mut state = handle.watch_state();
        handle.shutdown().await;
        assert_eq!(*state.borrow_and_update(), SubscriberState::Disconnected);
    }

    #[tokio::test]
    async fn test_session_subscribe_is_idempotent() {
        let (_tx, rx) = mpsc::unbounded_channel();
        let counters = Arc::new(Counters::default());
        let mut session = Session::new(ScriptedConnection {
            rx,
            counters: Arc::clone(&counters),
        });

        assert!(session.subscribe("events").await.unwrap());
        assert!(!session.subscribe("events").await.unwrap());
        assert!(session.subscribe("audit").await.unwrap());
        assert_eq!(counters.subscribes.load(Ordering::SeqCst), 2);
    }
}
