#[derive(Default, Debug, Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub struct Artist {
    pub name: String,
    pub uri: Option<String>,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub struct Album {
    pub artists: Vec<Artist>,
    pub name: String,
    pub uri: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub struct Track {
    pub artists: Vec<Artist>,
    pub name: String,
    pub uri: Option<String>,
    pub album: Option<Album>,
    pub duration_seconds: Option<u32>,
    pub track_type: String,
}

impl Track {
    /// All artist names, joined for display.
    pub fn artist_names(&self) -> String {
        self.artists
            .iter()
            .map(|artist| artist.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Playback state of the Spotify client, as derived from status payloads.
/// Stopped is only reported when nothing is playing and the playhead sits at
/// zero; any other non-playing position means Paused.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub enum PlaybackState {
    #[default]
    Undetermined,
    Playing,
    Paused,
    Stopped,
}
