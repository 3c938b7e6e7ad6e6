use clap::{Parser, Subcommand, ValueEnum};
use snafu::prelude::*;
use spotify_remote_controls::{
    bridge::RemoteBridge,
    commands::PlaybackCommand,
    events::{Event, EventKind},
    poller::classify_playback_state,
};
use spotify_remote_models::PlaybackState;

#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
struct Cli {
    #[clap(short, long)]
    /// Log level
    verbosity: Option<tracing::Level>,

    #[clap(short, long)]
    /// Connect to a specific control port instead of discovering one.
    port: Option<u16>,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Watch playback and announce every event on stdout.
    Listen,
    /// Print the current playback status.
    Status,
    /// Start playback of a spotify: URI or an open.spotify.com link.
    Play {
        uri: String,

        #[clap(short, long)]
        /// Context to play inside, e.g. a containing playlist URI.
        context: Option<String>,
    },
    /// Play a URI while keeping the current album as the playback context.
    Queue { uri: String },
    /// Send a hardware command to the Spotify window.
    Command {
        #[clap(value_enum)]
        command: CommandArg,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CommandArg {
    PlayPause,
    Previous,
    Next,
    SeekBackward,
    SeekForward,
    VolumeUp,
    VolumeDown,
}

impl From<CommandArg> for PlaybackCommand {
    fn from(command: CommandArg) -> Self {
        match command {
            CommandArg::PlayPause => PlaybackCommand::PlayPause,
            CommandArg::Previous => PlaybackCommand::PreviousTrack,
            CommandArg::Next => PlaybackCommand::NextTrack,
            CommandArg::SeekBackward => PlaybackCommand::SeekBackward,
            CommandArg::SeekForward => PlaybackCommand::SeekForward,
            CommandArg::VolumeUp => PlaybackCommand::VolumeUp,
            CommandArg::VolumeDown => PlaybackCommand::VolumeDown,
        }
    }
}

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("{error}"))]
    BridgeError { error: String },
    #[snafu(display("{error}"))]
    UriError { error: String },
}

impl From<spotify_remote_client::Error> for Error {
    fn from(error: spotify_remote_client::Error) -> Self {
        Error::BridgeError {
            error: error.to_string(),
        }
    }
}

impl From<spotify_remote_client::spotify_models::UriError> for Error {
    fn from(error: spotify_remote_client::spotify_models::UriError) -> Self {
        Error::UriError {
            error: error.to_string(),
        }
    }
}

pub async fn run() -> Result<(), Error> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(cli.verbosity)
        .with_target(false)
        .compact()
        .init();

    let bridge = match cli.port {
        Some(port) => RemoteBridge::with_port(port),
        None => RemoteBridge::connect().await?,
    };

    match cli.command {
        Commands::Listen => {
            subscribe_announcements(&bridge);
            bridge.start_polling();

            tokio::signal::ctrl_c().await.ok();
            bridge.shutdown();
            Ok(())
        }
        Commands::Status => {
            let status = bridge.get_status().await?;

            let state = match classify_playback_state(&status) {
                PlaybackState::Playing => "Playing",
                PlaybackState::Paused => "Paused",
                PlaybackState::Stopped => "Stopped",
                PlaybackState::Undetermined => "Unknown",
            };
            println!("{state}");

            if let Some(track) = status.track.as_ref().and_then(|track| track.to_track()) {
                println!("{} by {}", track.name, track.artist_names());
                if let Some(album) = &track.album {
                    println!("Album: {}", album.name);
                }
                if let Some(duration) = track.duration_seconds {
                    println!(
                        "{} of {}",
                        format_seconds(status.playing_position as u32),
                        format_seconds(duration)
                    );
                }
            }
            Ok(())
        }
        Commands::Play { uri, context } => {
            let uri = normalise_uri(&uri)?;
            bridge.play_uri(&uri, context.as_deref()).await?;
            println!("Playing {uri}");
            Ok(())
        }
        Commands::Queue { uri } => {
            let uri = normalise_uri(&uri)?;
            bridge.queue_uri(&uri).await?;
            println!("Queued {uri}");
            Ok(())
        }
        Commands::Command { command } => {
            bridge.queue_command(command.into());
            // Delivery is asynchronous; give the consumer a moment to drain
            // before the process exits.
            tokio::time::sleep(std::time::Duration::from_millis(500)).await;
            bridge.shutdown();
            Ok(())
        }
    }
}

fn subscribe_announcements(bridge: &RemoteBridge) {
    bridge.subscribe(EventKind::TrackChange, |event| {
        if let Event::TrackChange(track) = event {
            println!("Now playing: {} by {}", track.name, track.artist_names());
        }
    });
    bridge.subscribe(EventKind::Play, |_| println!("Playing"));
    bridge.subscribe(EventKind::Pause, |_| println!("Paused"));
    bridge.subscribe(EventKind::Stop, |_| println!("Stopped"));
    bridge.subscribe(EventKind::Error, |event| {
        if let Event::Error(error) = event {
            println!("Spotify error: {error}");
        }
    });
}

/// Accept either a spotify: URI or an open.spotify.com link.
fn normalise_uri(uri: &str) -> Result<String, Error> {
    if uri.starts_with("http://") || uri.starts_with("https://") {
        Ok(spotify_remote_client::spotify_models::parse_open_url(uri)?)
    } else {
        Ok(uri.to_string())
    }
}

fn format_seconds(seconds: u32) -> String {
    let (minutes, seconds) = (seconds / 60, seconds % 60);
    if minutes >= 60 {
        let (hours, minutes) = (minutes / 60, minutes % 60);
        format!("{hours:02}:{minutes:02}:{seconds:02}")
    } else {
        format!("{minutes:02}:{seconds:02}")
    }
}
