use snafu::prelude::*;

pub mod client;
pub mod discovery;
pub mod spotify_models;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Snafu, Debug, Clone)]
pub enum Error {
    #[snafu(display("Spotify is not running"))]
    NotRunning,
    #[snafu(display("Spotify returned error {code}: {description}"))]
    Remote { code: String, description: String },
    #[snafu(display("Spotify has not finished populating track metadata"))]
    MetadataNotReady,
    #[snafu(display("{description}: {uri}"))]
    ContentPlayback {
        uri: String,
        code: String,
        description: String,
    },
    #[snafu(display("connection to Spotify failed: {message}"))]
    Connection { message: String },
    #[snafu(display("unable to parse response from Spotify: {message}"))]
    Deserialize { message: String },
}

impl From<reqwest::Error> for Error {
    fn from(error: reqwest::Error) -> Self {
        Error::Connection {
            message: error.to_string(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Error::Deserialize {
            message: error.to_string(),
        }
    }
}

/// Description for a numeric error code returned by the remote service.
pub fn remote_error_description(code: &str) -> &'static str {
    match code {
        "4001" => "Unknown method",
        "4002" => "Error parsing request",
        "4003" => "Unknown service",
        "4004" => "Service not responding",
        "4102" => "Invalid OAuthToken",
        "4103" => "Expired OAuth token",
        "4104" => "OAuth token not verified",
        "4105" => "Token verification denied too many requests",
        "4106" => "Token verification timeout",
        "4107" => "Invalid Csrf token",
        "4108" => "OAuth token is invalid for current user",
        "4109" => "Invalid Csrf path",
        "4110" => "No user logged in",
        "4111" => "Invalid scope",
        "4112" => "Csrf challenge failed",
        "4201" => "Upgrade to premium",
        "4202" => "Upgrade to premium or wait",
        "4203" => "Billing failed",
        "4204" => "Technical error",
        "4205" => "Commercial is playing",
        "4301" => "Content is unavailable but can be purchased",
        "4302" => "Premium only content",
        "4303" => "Content unavailable",
        _ => "Unknown error",
    }
}

/// Codes that mean the requested content itself cannot be played, as opposed
/// to the request or session being at fault.
pub fn is_content_playback_code(code: &str) -> bool {
    matches!(code, "4301" | "4302" | "4303")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_codes_map_to_their_descriptions() {
        assert_eq!(remote_error_description("4001"), "Unknown method");
        assert_eq!(remote_error_description("4110"), "No user logged in");
        assert_eq!(remote_error_description("4205"), "Commercial is playing");
        assert_eq!(
            remote_error_description("4301"),
            "Content is unavailable but can be purchased"
        );
        assert_eq!(remote_error_description("4302"), "Premium only content");
        assert_eq!(remote_error_description("4303"), "Content unavailable");
    }

    #[test]
    fn unlisted_codes_fall_back_to_unknown() {
        assert_eq!(remote_error_description("9999"), "Unknown error");
        assert_eq!(remote_error_description(""), "Unknown error");
    }

    #[test]
    fn only_content_codes_are_classified_as_content_playback() {
        assert!(is_content_playback_code("4301"));
        assert!(is_content_playback_code("4302"));
        assert!(is_content_playback_code("4303"));
        assert!(!is_content_playback_code("4103"));
        assert!(!is_content_playback_code("4205"));
        assert!(!is_content_playback_code("9999"));
    }
}
