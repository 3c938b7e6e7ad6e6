use std::sync::{
    Arc, Mutex,
    atomic::{AtomicBool, Ordering},
};

use tokio::{
    sync::mpsc::{self, UnboundedSender},
    task::JoinHandle,
};
use tracing::debug;

use spotify_remote_client::{
    Result, client::Client, discovery, spotify_models::status::StatusResponse,
};

use crate::{
    broadcast::{EventBus, spawn_event_consumer},
    commands::{CommandDispatcher, PlaybackCommand, SpotifyWindowSink},
    events::{Event, EventKind},
    poller::{LONG_POLL_SECONDS, Poller},
};

/// The one object the rest of the application talks to: discovery, the
/// authenticated transport, the command dispatcher and the status poller
/// composed behind a single handle.
pub struct RemoteBridge {
    client: Arc<Client>,
    bus: Arc<EventBus>,
    events: UnboundedSender<Event>,
    dispatcher: CommandDispatcher,
    stop: Arc<AtomicBool>,
    event_consumer: JoinHandle<()>,
    poller: Mutex<Option<JoinHandle<()>>>,
}

impl RemoteBridge {
    /// Discover the control service and build a bridge for it.
    pub async fn connect() -> Result<Self> {
        let port = discovery::find_listening_port().await?;
        Ok(Self::with_port(port))
    }

    /// Build a bridge against an already-known port.
    pub fn with_port(port: u16) -> Self {
        let client = Arc::new(Client::new(port));
        let bus = Arc::new(EventBus::new());
        let (events, event_queue) = mpsc::unbounded_channel();
        let event_consumer = spawn_event_consumer(bus.clone(), event_queue);
        let dispatcher = CommandDispatcher::new(SpotifyWindowSink);

        Self {
            client,
            bus,
            events,
            dispatcher,
            stop: Arc::new(AtomicBool::new(false)),
            event_consumer,
            poller: Mutex::new(None),
        }
    }

    pub fn subscribe<F>(&self, kind: EventKind, callback: F)
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        self.bus.subscribe(kind, callback);
    }

    /// Start the background status poller. Calling this more than once is a
    /// no-op.
    pub fn start_polling(&self) {
        let mut poller = self.poller.lock().unwrap();
        if poller.is_some() {
            return;
        }

        let task = Poller::new(
            self.client.clone(),
            self.events.clone(),
            self.stop.clone(),
            LONG_POLL_SECONDS,
        );
        *poller = Some(tokio::spawn(task.run()));
    }

    /// Fetch the current playback status immediately.
    pub async fn get_status(&self) -> Result<StatusResponse> {
        self.client.status().await
    }

    /// Start playback of a URI, optionally inside a richer context such as a
    /// containing playlist.
    pub async fn play_uri(&self, uri: &str, context: Option<&str>) -> Result<()> {
        self.client.play_uri(uri, context).await?;
        Ok(())
    }

    /// Play a URI while keeping the currently playing album as the context,
    /// so playback carries on there afterwards.
    pub async fn queue_uri(&self, uri: &str) -> Result<()> {
        let context = match self.client.status().await {
            Ok(status) => status
                .track
                .as_ref()
                .and_then(|track| track.album_resource.as_ref())
                .and_then(|album| album.uri.clone()),
            Err(_) => None,
        };

        self.client.play_uri(uri, context.as_deref()).await?;
        Ok(())
    }

    /// Queue a hardware command for delivery to the Spotify window.
    pub fn queue_command(&self, command: PlaybackCommand) {
        self.dispatcher.submit(command);
    }

    pub fn send_command(&self, command: PlaybackCommand) {
        self.queue_command(command);
    }

    /// Stop the poller and both consumer tasks. Events and commands already
    /// queued are dropped.
    pub fn shutdown(&self) {
        debug!("shutting down remote bridge");
        self.stop.store(true, Ordering::Relaxed);

        if let Some(poller) = self.poller.lock().unwrap().take() {
            poller.abort();
        }
        self.dispatcher.shutdown();
        self.event_consumer.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;

    #[tokio::test]
    async fn subscribers_receive_events_pushed_through_the_bus() {
        let bridge = RemoteBridge::with_port(4370);
        let seen = Arc::new(StdMutex::new(Vec::new()));

        let pauses = seen.clone();
        bridge.subscribe(EventKind::Pause, move |_| {
            pauses.lock().unwrap().push("pause");
        });

        bridge.events.send(Event::Pause).unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;

        assert_eq!(*seen.lock().unwrap(), vec!["pause"]);
        bridge.shutdown();
    }

    #[tokio::test]
    async fn shutdown_is_idempotent() {
        let bridge = RemoteBridge::with_port(4370);
        bridge.start_polling();
        bridge.shutdown();
        bridge.shutdown();
    }
}
