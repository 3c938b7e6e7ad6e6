use std::time::Duration;

use tokio::{
    sync::mpsc::{self, UnboundedReceiver, UnboundedSender},
    task::JoinHandle,
};
use tracing::{debug, warn};

/// Spacing inserted after track navigation commands so the Spotify window is
/// not flooded with rapid repeated triggers.
const TRACK_NAVIGATION_SPACING: Duration = Duration::from_millis(300);

/// Hardware playback commands, delivered to the Spotify main window as
/// WM_COMMAND messages rather than over HTTP.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackCommand {
    PlayPause,
    PreviousTrack,
    NextTrack,
    SeekBackward,
    SeekForward,
    VolumeUp,
    VolumeDown,
}

impl PlaybackCommand {
    /// The command identifier understood by the Spotify window's message
    /// handler.
    pub fn code(self) -> u32 {
        match self {
            PlaybackCommand::PlayPause => 114,
            PlaybackCommand::NextTrack => 115,
            PlaybackCommand::PreviousTrack => 116,
            PlaybackCommand::SeekForward => 117,
            PlaybackCommand::SeekBackward => 118,
            PlaybackCommand::VolumeUp => 121,
            PlaybackCommand::VolumeDown => 122,
        }
    }

    fn is_track_navigation(self) -> bool {
        matches!(
            self,
            PlaybackCommand::PlayPause
                | PlaybackCommand::PreviousTrack
                | PlaybackCommand::NextTrack
        )
    }
}

/// Delivery target for hardware commands. The production sink posts window
/// messages; tests substitute a recording sink.
pub trait CommandSink: Send + Sync + 'static {
    /// Deliver one command. Returns false when the target window cannot be
    /// found.
    fn deliver(&self, command: PlaybackCommand) -> bool;
}

/// Sends WM_COMMAND messages to the Spotify main window.
pub struct SpotifyWindowSink;

impl CommandSink for SpotifyWindowSink {
    #[cfg(windows)]
    fn deliver(&self, command: PlaybackCommand) -> bool {
        use windows::Win32::Foundation::{LPARAM, WPARAM};
        use windows::Win32::UI::WindowsAndMessaging::{FindWindowW, SendMessageW, WM_COMMAND};
        use windows::core::{PCWSTR, w};

        let Ok(window) = (unsafe { FindWindowW(w!("SpotifyMainWindow"), PCWSTR::null()) }) else {
            return false;
        };

        debug!("sending command {command:?} to window {window:?}");
        unsafe {
            SendMessageW(
                window,
                WM_COMMAND,
                Some(WPARAM(command.code() as usize)),
                Some(LPARAM(0)),
            )
        };
        true
    }

    #[cfg(not(windows))]
    fn deliver(&self, _command: PlaybackCommand) -> bool {
        false
    }
}

/// Accepts playback commands from any task and delivers them one at a time,
/// strictly in submission order.
pub struct CommandDispatcher {
    tx: UnboundedSender<PlaybackCommand>,
    consumer: JoinHandle<()>,
}

impl CommandDispatcher {
    pub fn new(sink: impl CommandSink) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let consumer = tokio::spawn(consume(rx, sink));
        Self { tx, consumer }
    }

    /// Queue a command for delivery. Never blocks; delivery is fire and
    /// forget.
    pub fn submit(&self, command: PlaybackCommand) {
        debug!("queuing command {command:?}");
        if self.tx.send(command).is_err() {
            warn!("command dispatcher is shut down, dropping {command:?}");
        }
    }

    pub(crate) fn shutdown(&self) {
        self.consumer.abort();
    }
}

async fn consume(mut commands: UnboundedReceiver<PlaybackCommand>, sink: impl CommandSink) {
    while let Some(command) = commands.recv().await {
        if !sink.deliver(command) {
            // The window disappearing means Spotify quit, which the status
            // poller reports on its own, so the command is simply dropped.
            debug!("Spotify window not found, dropping command {command:?}");
            continue;
        }

        if command.is_track_navigation() {
            debug!("sleeping to avoid command flooding");
            tokio::time::sleep(TRACK_NAVIGATION_SPACING).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use tokio::time::Instant;

    struct RecordingSink {
        deliveries: Arc<Mutex<Vec<(PlaybackCommand, Instant)>>>,
        window_present: bool,
    }

    impl CommandSink for RecordingSink {
        fn deliver(&self, command: PlaybackCommand) -> bool {
            if !self.window_present {
                return false;
            }
            self.deliveries
                .lock()
                .unwrap()
                .push((command, Instant::now()));
            true
        }
    }

    fn recording_dispatcher(
        window_present: bool,
    ) -> (CommandDispatcher, Arc<Mutex<Vec<(PlaybackCommand, Instant)>>>) {
        let deliveries = Arc::new(Mutex::new(Vec::new()));
        let dispatcher = CommandDispatcher::new(RecordingSink {
            deliveries: deliveries.clone(),
            window_present,
        });
        (dispatcher, deliveries)
    }

    #[tokio::test(start_paused = true)]
    async fn track_navigation_commands_are_spaced_out() {
        let (dispatcher, deliveries) = recording_dispatcher(true);
        let started = Instant::now();

        for _ in 0..3 {
            dispatcher.submit(PlaybackCommand::PlayPause);
        }
        tokio::time::sleep(Duration::from_secs(2)).await;

        let deliveries = deliveries.lock().unwrap();
        assert_eq!(deliveries.len(), 3);
        assert!(deliveries[1].1 - deliveries[0].1 >= TRACK_NAVIGATION_SPACING);
        assert!(deliveries[2].1 - deliveries[1].1 >= TRACK_NAVIGATION_SPACING);
        assert!(deliveries[2].1 - started >= TRACK_NAVIGATION_SPACING * 2);
    }

    #[tokio::test(start_paused = true)]
    async fn commands_are_delivered_in_submission_order() {
        let (dispatcher, deliveries) = recording_dispatcher(true);

        let submitted = [
            PlaybackCommand::PlayPause,
            PlaybackCommand::VolumeUp,
            PlaybackCommand::NextTrack,
            PlaybackCommand::SeekForward,
            PlaybackCommand::PreviousTrack,
        ];
        for command in submitted {
            dispatcher.submit(command);
        }
        tokio::time::sleep(Duration::from_secs(5)).await;

        let delivered: Vec<_> = deliveries
            .lock()
            .unwrap()
            .iter()
            .map(|(command, _)| *command)
            .collect();
        assert_eq!(delivered, submitted);
    }

    #[tokio::test(start_paused = true)]
    async fn seek_and_volume_commands_are_not_throttled() {
        let (dispatcher, deliveries) = recording_dispatcher(true);

        for _ in 0..4 {
            dispatcher.submit(PlaybackCommand::VolumeUp);
        }
        tokio::time::sleep(Duration::from_millis(10)).await;

        let deliveries = deliveries.lock().unwrap();
        assert_eq!(deliveries.len(), 4);
        assert!(deliveries[3].1 - deliveries[0].1 < TRACK_NAVIGATION_SPACING);
    }

    #[tokio::test(start_paused = true)]
    async fn a_missing_window_drops_commands_without_blocking_later_ones() {
        let (dispatcher, deliveries) = recording_dispatcher(false);

        dispatcher.submit(PlaybackCommand::PlayPause);
        dispatcher.submit(PlaybackCommand::NextTrack);
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert!(deliveries.lock().unwrap().is_empty());
    }
}
