use std::path::PathBuf;

use clap::{
    CommandFactory, Parser, Subcommand,
    builder::{
        Styles,
        styling::{AnsiColor, Effects},
    },
};
use clap_complete::{Shell, generate};

use spotmerge::{cli, config, error};

fn styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::White.on_default() | Effects::BOLD)
        .usage(AnsiColor::White.on_default() | Effects::BOLD)
        .literal(AnsiColor::BrightBlue.on_default())
        .placeholder(AnsiColor::BrightGreen.on_default())
}

#[derive(Parser, Debug, Clone)]
#[clap(
  version = env!("CARGO_PKG_VERSION"),
  name=env!("CARGO_PKG_NAME"),
  bin_name=env!("CARGO_PKG_NAME"),
  author=env!("CARGO_PKG_AUTHORS"),
  about=env!("CARGO_PKG_DESCRIPTION"),
  styles=styles(),
)]
struct Cli {
    /// Playback device: a device id, `active` or `last`
    #[clap(long, global = true)]
    device: Option<String>,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Authorize with Spotify API
    Auth,

    /// Merge the playlists listed in a CSV file into one playlist
    Merge(MergeOptions),

    /// List the tracks of a playlist
    Tracks(TracksOptions),

    /// Start playback of a track or playlist, or resume
    Play(PlayOptions),

    /// Pause playback
    Pause,

    /// Resume playback
    Resume,

    /// Set the playback volume (0-100)
    Volume(VolumeOptions),

    /// Show the currently playing track
    NowPlaying(NowPlayingOptions),

    /// List available playback devices
    Devices,

    /// Get shell completions
    Completions(CompletionsOption),
}

#[derive(Parser, Debug, Clone)]
pub struct MergeOptions {
    /// CSV file with a header row; column 2 is the name, column 3 the playlist URL
    #[clap(long)]
    sources: PathBuf,

    /// Name of the playlist to create
    #[clap(long, default_value = "Merged Playlist")]
    name: String,

    /// Add to an existing playlist id instead of creating one
    #[clap(long, conflicts_with = "name")]
    destination: Option<String>,

    /// Add each track at most once across all sources
    #[clap(long)]
    dedup: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct TracksOptions {
    /// Playlist URL (https://open.spotify.com/playlist/...)
    url: String,
}

#[derive(Parser, Debug, Clone)]
pub struct PlayOptions {
    /// Track id to play
    #[clap(long, conflicts_with = "playlist")]
    track: Option<String>,

    /// Playlist id to play
    #[clap(long)]
    playlist: Option<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct VolumeOptions {
    #[clap(allow_hyphen_values = true)]
    percent: i32,
}

#[derive(Parser, Debug, Clone)]
pub struct NowPlayingOptions {
    /// Keep polling and print track changes until Ctrl-C
    #[clap(long)]
    watch: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct CompletionsOption {
    shell: Shell,
}

#[tokio::main]
async fn main() {
    if let Err(e) = config::load_env().await {
        error!("Cannot load environment. Err: {}", e);
    }

    let cli = Cli::parse();
    let device = cli.device;

    match cli.command {
        Command::Auth => cli::auth().await,
        Command::Merge(opt) => {
            cli::merge(&opt.sources, &opt.name, opt.destination, opt.dedup).await
        }
        Command::Tracks(opt) => cli::tracks(&opt.url).await,
        Command::Play(opt) => cli::play(opt.track, opt.playlist, device).await,
        Command::Pause => cli::pause(device).await,
        Command::Resume => cli::resume(device).await,
        Command::Volume(opt) => cli::volume(opt.percent, device).await,
        Command::NowPlaying(opt) => cli::now_playing(opt.watch).await,
        Command::Devices => cli::devices().await,
        Command::Completions(opt) => {
            let mut cmd = Cli::command_for_update();
            let name = cmd.get_name().to_string();
            generate(opt.shell, &mut cmd, name, &mut std::io::stdout())
        }
    }
}
