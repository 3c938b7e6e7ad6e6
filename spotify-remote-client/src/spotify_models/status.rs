use serde::{Deserialize, Serialize};
use spotify_remote_models::{Album, Artist, Track};

/// Payload returned by every `/remote/*.json` endpoint. Fields the bridge
/// does not act on (protocol version, feature flags, echo context, server
/// time) are kept optional and simply never read.
#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusResponse {
    #[serde(default)]
    pub playing: bool,
    #[serde(default)]
    pub playing_position: f64,
    pub volume: Option<f64>,
    pub version: Option<i64>,
    pub client_version: Option<String>,
    pub play_enabled: Option<bool>,
    pub prev_enabled: Option<bool>,
    pub next_enabled: Option<bool>,
    pub shuffle: Option<bool>,
    pub repeat: Option<bool>,
    pub online: Option<bool>,
    pub running: Option<bool>,
    pub server_time: Option<i64>,
    pub open_graph_state: Option<serde_json::Value>,
    pub context: Option<serde_json::Value>,
    pub track: Option<RawTrack>,
    pub error: Option<RawError>,
}

/// The `track` sub-object of a status payload. During a track transition
/// Spotify reports the track before its resources are attached, so every
/// field is optional. Track-change detection compares this raw fragment, not
/// the deserialized [`Track`].
#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawTrack {
    pub track_resource: Option<RawResource>,
    pub artist_resource: Option<RawResource>,
    pub album_resource: Option<RawResource>,
    pub length: Option<u32>,
    pub track_type: Option<String>,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawResource {
    pub name: Option<String>,
    pub uri: Option<String>,
}

/// The embedded error object of a failed request:
/// `{"error": {"type": "4110", ...}}`.
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawError {
    #[serde(rename = "type")]
    pub kind: String,
    pub message: Option<String>,
}

impl RawTrack {
    /// Whether Spotify has attached all the metadata the event stream needs:
    /// album name, artist name, track name and track length.
    pub fn metadata_complete(&self) -> bool {
        fn has_name(resource: &Option<RawResource>) -> bool {
            resource
                .as_ref()
                .and_then(|resource| resource.name.as_ref())
                .is_some()
        }

        has_name(&self.album_resource)
            && has_name(&self.artist_resource)
            && has_name(&self.track_resource)
            && self.length.is_some()
    }

    /// Build the domain [`Track`], or `None` while metadata is incomplete.
    pub fn to_track(&self) -> Option<Track> {
        let artist_resource = self.artist_resource.as_ref()?;
        let album_resource = self.album_resource.as_ref()?;
        let track_resource = self.track_resource.as_ref()?;

        let artist = Artist {
            name: artist_resource.name.clone()?,
            uri: artist_resource.uri.clone(),
        };
        let album = Album {
            artists: vec![artist.clone()],
            name: album_resource.name.clone()?,
            uri: album_resource.uri.clone(),
        };

        Some(Track {
            artists: vec![artist],
            name: track_resource.name.clone()?,
            uri: track_resource.uri.clone(),
            album: Some(album),
            duration_seconds: self.length,
            track_type: self
                .track_type
                .clone()
                .unwrap_or_else(|| String::from("normal")),
        })
    }
}
