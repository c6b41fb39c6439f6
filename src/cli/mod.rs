use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, Default)]
#[command(
    name = "channel-transcripts",
    about = "Channel Transcripts - Collect the captions of every public video on a YouTube channel into one text file",
    version,
    long_about = "Lists every public video of a YouTube channel through the YouTube Data API, fetches the best available caption track for each one (manually authored preferred over auto-generated) and writes them all into a single text file, headed by the video titles."
)]
pub struct Cli {
    /// YouTube Data API v3 key
    #[arg(long, env = "YOUTUBE_API_KEY", value_name = "KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Channel ID to collect (starts with "UC")
    #[arg(short, long, env = "YOUTUBE_CHANNEL_ID", value_name = "CHANNEL_ID")]
    pub channel_id: Option<String>,

    /// Output file path (default: all_transcripts.txt)
    #[arg(short, long, env = "TRANSCRIPTS_OUTPUT", value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Preferred caption language, in order of preference (repeatable)
    #[arg(short, long = "language", value_name = "LANG")]
    pub languages: Vec<String>,

    /// Number of transcripts fetched at the same time (1-8)
    #[arg(long, value_name = "COUNT")]
    pub concurrency: Option<usize>,

    /// Configuration file (YAML)
    #[arg(long, env = "TRANSCRIPTS_CONFIG", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Override the YouTube Data API endpoint
    #[arg(long, env = "YOUTUBE_API_BASE_URL", value_name = "URL", hide = true)]
    pub api_base_url: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Disable progress indicators
    #[arg(short, long)]
    pub quiet: bool,
}
