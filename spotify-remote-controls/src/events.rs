use spotify_remote_client::Error;
use spotify_remote_models::Track;

/// A discrete playback event derived from the status stream.
#[derive(Debug, Clone)]
pub enum Event {
    Play(Track),
    Pause,
    Stop,
    TrackChange(Track),
    Error(Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Play,
    Pause,
    Stop,
    TrackChange,
    Error,
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::Play(_) => EventKind::Play,
            Event::Pause => EventKind::Pause,
            Event::Stop => EventKind::Stop,
            Event::TrackChange(_) => EventKind::TrackChange,
            Event::Error(_) => EventKind::Error,
        }
    }
}
