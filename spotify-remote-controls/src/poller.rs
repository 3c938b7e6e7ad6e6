use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, warn};

use spotify_remote_client::{
    Error, Result,
    client::Client,
    spotify_models::status::{RawTrack, StatusResponse},
};
use spotify_remote_models::PlaybackState;

use crate::events::Event;

/// How long the server may hold a long-poll status request open.
pub(crate) const LONG_POLL_SECONDS: u64 = 60;

/// Consecutive incomplete-metadata retries before the condition is surfaced
/// to subscribers. Spotify briefly reports "playing" before the track
/// resources are attached; this bounds that race.
const METADATA_RETRY_LIMIT: u32 = 3;

/// Pause before probing again after a transport or protocol failure.
const ERROR_RETRY: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NextRequest {
    Immediate,
    LongPoll,
    Backoff,
}

/// Background loop that long-polls the status endpoint and turns raw payloads
/// into discrete events.
///
/// The previous-track baseline and recorded playback state live here and are
/// touched by no other task. Every failure is converted into an event;
/// nothing is allowed to terminate the loop except the stop flag.
pub struct Poller {
    client: Arc<Client>,
    events: UnboundedSender<Event>,
    stop: Arc<AtomicBool>,
    long_poll_seconds: u64,
    previous_track: Option<RawTrack>,
    playback_state: PlaybackState,
    metadata_retries: u32,
    in_error_state: bool,
}

impl Poller {
    pub(crate) fn new(
        client: Arc<Client>,
        events: UnboundedSender<Event>,
        stop: Arc<AtomicBool>,
        long_poll_seconds: u64,
    ) -> Self {
        Self {
            client,
            events,
            stop,
            long_poll_seconds,
            previous_track: None,
            playback_state: PlaybackState::Undetermined,
            metadata_retries: 0,
            in_error_state: false,
        }
    }

    pub(crate) async fn run(mut self) {
        debug!("status poller starting");

        let mut next = NextRequest::Immediate;
        while !self.stop.load(Ordering::Relaxed) {
            let result = match next {
                NextRequest::Immediate => self.client.status().await,
                NextRequest::LongPoll => self.client.status_longpoll(self.long_poll_seconds).await,
                NextRequest::Backoff => {
                    tokio::time::sleep(ERROR_RETRY).await;
                    self.client.status().await
                }
            };
            next = self.ingest(result);
        }

        debug!("status poller stopped");
    }

    /// Feed one poll outcome through the classifier and decide how to issue
    /// the next request.
    fn ingest(&mut self, result: Result<StatusResponse>) -> NextRequest {
        match result {
            Ok(status) => {
                self.metadata_retries = 0;
                self.in_error_state = false;
                self.process_status(&status);
                NextRequest::LongPoll
            }
            Err(Error::MetadataNotReady) => {
                self.metadata_retries += 1;
                if self.metadata_retries > METADATA_RETRY_LIMIT {
                    // Spotify has reported a half-populated track several
                    // polls in a row; give up and tell subscribers.
                    self.metadata_retries = 0;
                    self.emit_error(Error::MetadataNotReady);
                    NextRequest::LongPoll
                } else {
                    NextRequest::Immediate
                }
            }
            Err(error) => {
                self.metadata_retries = 0;
                self.emit_error(error);
                // Force a fresh TrackChange once the service comes back.
                self.previous_track = None;
                NextRequest::Backoff
            }
        }
    }

    fn process_status(&mut self, status: &StatusResponse) {
        let playback_state = classify_playback_state(status);

        // Compare the raw track fragment, not the deserialized value, and
        // only announce while actually playing; a differing track while
        // paused or stopped is stale data.
        if playback_state == PlaybackState::Playing
            && let Some(raw_track) = &status.track
            && self.previous_track.as_ref() != Some(raw_track)
        {
            if let Some(track) = raw_track.to_track() {
                self.emit(Event::TrackChange(track));
            }
            self.previous_track = Some(raw_track.clone());
        }

        if playback_state != self.playback_state {
            match playback_state {
                PlaybackState::Playing => {
                    if let Some(track) = status.track.as_ref().and_then(RawTrack::to_track) {
                        self.emit(Event::Play(track));
                    }
                }
                PlaybackState::Paused => self.emit(Event::Pause),
                PlaybackState::Stopped => self.emit(Event::Stop),
                PlaybackState::Undetermined => {}
            }
            self.playback_state = playback_state;
        }
    }

    fn emit(&self, event: Event) {
        if self.events.send(event).is_err() {
            warn!("event consumer is gone, dropping event");
        }
    }

    fn emit_error(&mut self, error: Error) {
        if self.in_error_state {
            return;
        }
        self.in_error_state = true;
        self.emit(Event::Error(error));
    }
}

pub fn classify_playback_state(status: &StatusResponse) -> PlaybackState {
    if status.playing {
        PlaybackState::Playing
    } else if status.playing_position == 0.0 {
        PlaybackState::Stopped
    } else {
        PlaybackState::Paused
    }
}
