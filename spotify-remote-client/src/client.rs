use std::sync::OnceLock;

use rand::RngExt;
use reqwest::header::{HeaderMap, HeaderValue};
use tokio::sync::Mutex;
use tracing::{debug, error};

use crate::{
    Error, Result, is_content_playback_code, remote_error_description,
    spotify_models::{CsrfToken, OauthToken, status::StatusResponse},
};

const SPOTIFY_OPEN_TOKEN_URL: &str = "https://open.spotify.com/token";

/// Conditions that make a long-poll status request return early.
const RETURN_ON: &str = "login,logout,play,pause,error,ap";

/// HTTP session against the control service hosted by the Spotify client.
///
/// Owns the per-session hostname and the CSRF/OAuth tokens. Tokens are lazy
/// loaded on the first authenticated request and cached for the lifetime of
/// the client; a failed fetch leaves them unset so the next request retries.
#[derive(Debug)]
pub struct Client {
    http: reqwest::Client,
    hostname: String,
    port: u16,
    session: OnceLock<Session>,
    session_initiated: Mutex<bool>,
}

#[derive(Debug, Clone)]
struct Session {
    csrf_token: String,
    oauth_token: String,
}

/// A random subdomain of spotilocal.com, which resolves to 127.0.0.1. Each
/// session uses its own so responses are never cached across sessions.
pub fn generate_hostname() -> String {
    let mut rng = rand::rng();
    let subdomain: String = (0..10).map(|_| rng.random_range('a'..='z')).collect();
    format!("{subdomain}.spotilocal.com")
}

/// Turn remote errors about unplayable content into [`Error::ContentPlayback`]
/// so callers can tell the user that this specific content cannot play.
fn classify_play_error(uri: &str, error: Error) -> Error {
    match error {
        Error::Remote { code, description } if is_content_playback_code(&code) => {
            Error::ContentPlayback {
                uri: uri.to_string(),
                code,
                description,
            }
        }
        other => other,
    }
}

impl Client {
    pub fn new(port: u16) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert("Origin", HeaderValue::from_static("https://open.spotify.com"));

        // The control service serves a self-signed certificate for
        // *.spotilocal.com, so certificate verification has to go.
        let http = reqwest::Client::builder()
            .danger_accept_invalid_certs(true)
            .default_headers(headers)
            .build()
            .unwrap();

        Self {
            http,
            hostname: generate_hostname(),
            port,
            session: OnceLock::new(),
            session_initiated: Mutex::new(false),
        }
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Fetch the current playback status.
    ///
    /// Returns [`Error::MetadataNotReady`] when Spotify reports a track whose
    /// resources have not been fully populated yet, which happens briefly
    /// during track transitions.
    pub async fn status(&self) -> Result<StatusResponse> {
        let status = self.remote_request("status", &[]).await?;
        Self::ensure_metadata(&status)?;
        Ok(status)
    }

    /// Fetch the playback status, letting the server hold the request open
    /// for up to `return_after_seconds` or until it observes a state change.
    pub async fn status_longpoll(&self, return_after_seconds: u64) -> Result<StatusResponse> {
        let return_after = return_after_seconds.to_string();
        let params = [
            ("returnafter", return_after.as_str()),
            ("returnon", RETURN_ON),
        ];
        let status = self.remote_request("status", &params).await?;
        Self::ensure_metadata(&status)?;
        Ok(status)
    }

    /// Start playback of a Spotify URI. When no richer context (for example a
    /// containing playlist) is supplied, the URI doubles as its own context.
    ///
    /// Error codes that mean the content itself cannot be played are
    /// reclassified as [`Error::ContentPlayback`] so callers can tell the
    /// user exactly that.
    pub async fn play_uri(&self, uri: &str, context: Option<&str>) -> Result<StatusResponse> {
        let context = context.unwrap_or(uri);
        self.remote_request("play", &[("uri", uri), ("context", context)])
            .await
            .map_err(|error| classify_play_error(uri, error))
    }

    fn ensure_metadata(status: &StatusResponse) -> Result<()> {
        match &status.track {
            Some(track) if track.metadata_complete() => Ok(()),
            _ => {
                error!("received incomplete track metadata from Spotify");
                Err(Error::MetadataNotReady)
            }
        }
    }

    async fn remote_request(&self, endpoint: &str, params: &[(&str, &str)]) -> Result<StatusResponse> {
        let session = self.session().await?;
        let url = format!(
            "https://{}:{}/remote/{}.json",
            self.hostname, self.port, endpoint
        );

        debug!("requesting {url} with params {params:?}");
        let response = self
            .http
            .get(&url)
            .query(&[
                ("oauth", session.oauth_token.as_str()),
                ("csrf", session.csrf_token.as_str()),
            ])
            .query(params)
            .send()
            .await?;

        let body = response.text().await?;
        let status: StatusResponse = serde_json::from_str(&body)?;

        if let Some(remote_error) = &status.error {
            let description = remote_error_description(&remote_error.kind);
            debug!("error {} from Spotify: {description}", remote_error.kind);
            return Err(Error::Remote {
                code: remote_error.kind.clone(),
                description: description.to_string(),
            });
        }

        Ok(status)
    }

    async fn session(&self) -> Result<&Session> {
        if let Some(session) = self.session.get() {
            return Ok(session);
        }

        let mut initiated = self.session_initiated.lock().await;

        if !*initiated {
            let csrf_token = self.csrf_token().await?;
            let oauth_token = self.oauth_token().await?;

            self.session
                .set(Session {
                    csrf_token,
                    oauth_token,
                })
                .or(Err(Error::Connection {
                    message: "unable to store session tokens".into(),
                }))?;
            *initiated = true;
        }
        drop(initiated);

        self.session.get().ok_or_else(|| Error::Connection {
            message: "session tokens were never stored".to_string(),
        })
    }

    async fn csrf_token(&self) -> Result<String> {
        let url = format!("https://{}:{}/simplecsrf/token.json", self.hostname, self.port);
        debug!("requesting csrf token from {url}");

        let body = self.http.get(&url).send().await?.text().await?;
        let token: CsrfToken = serde_json::from_str(&body)?;
        Ok(token.token)
    }

    async fn oauth_token(&self) -> Result<String> {
        debug!("requesting oauth token from {SPOTIFY_OPEN_TOKEN_URL}");

        let body = self
            .http
            .get(SPOTIFY_OPEN_TOKEN_URL)
            .send()
            .await?
            .text()
            .await?;
        let token: OauthToken = serde_json::from_str(&body)?;
        Ok(token.token)
    }
}
