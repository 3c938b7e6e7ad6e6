use serde::{Deserialize, Serialize};
use snafu::prelude::*;

pub mod status;

/// Response from the `/simplecsrf/token.json` helper endpoint.
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CsrfToken {
    pub token: String,
}

/// Response from the open.spotify.com token endpoint.
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OauthToken {
    #[serde(rename = "t")]
    pub token: String,
}

#[derive(Snafu, Debug)]
pub enum UriError {
    #[snafu(display("this link contains an unfamiliar domain"))]
    WrongDomain,
    #[snafu(display("the link contains an invalid path"))]
    InvalidPath,
    #[snafu(display("the link is invalid"))]
    InvalidUrl,
}

pub type ParseUriResult<T, E = UriError> = std::result::Result<T, E>;

/// Convert an open.spotify.com link into the `spotify:` URI the control
/// service understands.
pub fn parse_open_url(string_url: &str) -> ParseUriResult<String> {
    let Ok(url) = url::Url::parse(string_url) else {
        return Err(UriError::InvalidUrl);
    };

    let (Some(host), Some(mut path)) = (url.host_str(), url.path_segments()) else {
        return Err(UriError::InvalidUrl);
    };

    if host != "open.spotify.com" && host != "play.spotify.com" {
        return Err(UriError::WrongDomain);
    }

    match (path.next(), path.next()) {
        (Some(kind @ ("track" | "album" | "artist" | "playlist")), Some(id)) if !id.is_empty() => {
            Ok(format!("spotify:{kind}:{id}"))
        }
        _ => Err(UriError::InvalidPath),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_links_convert_to_uris() {
        assert_eq!(
            parse_open_url("https://open.spotify.com/track/6rqhFgbbKwnb9MLmUQDhG6").unwrap(),
            "spotify:track:6rqhFgbbKwnb9MLmUQDhG6"
        );
        assert_eq!(
            parse_open_url("https://play.spotify.com/album/0sNOF9WDwhWunNAHPD3Baj").unwrap(),
            "spotify:album:0sNOF9WDwhWunNAHPD3Baj"
        );
    }

    #[test]
    fn other_domains_are_rejected() {
        assert!(matches!(
            parse_open_url("https://example.com/track/abc"),
            Err(UriError::WrongDomain)
        ));
    }

    #[test]
    fn unknown_paths_are_rejected() {
        assert!(matches!(
            parse_open_url("https://open.spotify.com/"),
            Err(UriError::InvalidPath)
        ));
        assert!(matches!(
            parse_open_url("https://open.spotify.com/user/whoever"),
            Err(UriError::InvalidPath)
        ));
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(matches!(
            parse_open_url("not a url"),
            Err(UriError::InvalidUrl)
        ));
    }
}
