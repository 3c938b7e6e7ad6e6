use std::time::Duration;

use sysinfo::{ProcessRefreshKind, RefreshKind, System};
use tokio::{net::TcpStream, time::timeout};
use tracing::debug;

use crate::{Error, Result};

/// Process names the Spotify desktop client runs under.
const SPOTIFY_PROCESSES: &[&str] = &["Spotify.exe", "SpotifyWebHelper.exe", "spotify"];

/// The control service always binds a port in this reserved range.
const SPOTIFY_PORT_RANGE: std::ops::Range<u16> = 4370..4380;

const PROBE_TIMEOUT: Duration = Duration::from_millis(250);

/// Attempt to find the HTTPS port that the Spotify control service is
/// listening on.
///
/// Checks that a Spotify process is running at all, then probes the reserved
/// port range in ascending order and returns the lowest port that accepts a
/// connection. This is a point-in-time probe; callers decide whether and when
/// to retry on [`Error::NotRunning`].
pub async fn find_listening_port() -> Result<u16> {
    let running = tokio::task::spawn_blocking(spotify_process_running)
        .await
        .unwrap_or(false);
    if !running {
        debug!("no Spotify process found");
        return Err(Error::NotRunning);
    }

    for port in SPOTIFY_PORT_RANGE {
        match timeout(PROBE_TIMEOUT, TcpStream::connect(("127.0.0.1", port))).await {
            Ok(Ok(_)) => {
                debug!("Spotify control service is listening on port {port}");
                return Ok(port);
            }
            _ => continue,
        }
    }

    debug!("Spotify is running but no control port is listening");
    Err(Error::NotRunning)
}

fn spotify_process_running() -> bool {
    let system =
        System::new_with_specifics(RefreshKind::new().with_processes(ProcessRefreshKind::new()));

    system.processes().values().any(|process| {
        SPOTIFY_PROCESSES
            .iter()
            .any(|name| process.name().eq_ignore_ascii_case(name))
    })
}
