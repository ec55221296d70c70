use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "shutter", about = "Shutter: a local photo cache", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Directory holding the blob store and metadata file
    #[arg(long, global = true, default_value = ".shutter")]
    pub data_dir: PathBuf,

    /// Configuration file (defaults to <data-dir>/shutter.toml if present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Import an image file into the cache
    Capture(CaptureArgs),
    /// List cached photos, newest first
    List(ListArgs),
    /// Print a photo's display reference
    Show(ShowArgs),
    /// Remove a photo from the cache
    Remove(RemoveArgs),
    /// Print the effective configuration
    Config(ConfigArgs),
}

#[derive(Args)]
pub struct CaptureArgs {
    /// Image file to import
    #[arg(long = "from")]
    pub from: PathBuf,
    /// Capture quality hint, 0-100
    #[arg(short, long)]
    pub quality: Option<u8>,
}

#[derive(Args)]
pub struct ListArgs {
    #[arg(short = 'n', long)]
    pub limit: Option<usize>,
    /// List stored blobs that no photo refers to
    #[arg(long)]
    pub orphans: bool,
}

#[derive(Args)]
pub struct ShowArgs {
    pub key: String,
}

#[derive(Args)]
pub struct RemoveArgs {
    pub key: String,
}

#[derive(Args)]
pub struct ConfigArgs {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_capture() {
        let cli = Cli::try_parse_from(["shutter", "capture", "--from", "IMG_1.jpeg"]).unwrap();
        if let Command::Capture(args) = cli.command {
            assert_eq!(args.from, PathBuf::from("IMG_1.jpeg"));
            assert_eq!(args.quality, None);
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_capture_quality() {
        let cli = Cli::try_parse_from(["shutter", "capture", "--from", "a.jpeg", "-q", "80"]).unwrap();
        if let Command::Capture(args) = cli.command {
            assert_eq!(args.quality, Some(80));
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_capture_requires_from() {
        assert!(Cli::try_parse_from(["shutter", "capture"]).is_err());
    }

    #[test]
    fn parse_list() {
        let cli = Cli::try_parse_from(["shutter", "list", "-n", "3"]).unwrap();
        if let Command::List(args) = cli.command {
            assert_eq!(args.limit, Some(3));
            assert!(!args.orphans);
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_list_orphans() {
        let cli = Cli::try_parse_from(["shutter", "list", "--orphans"]).unwrap();
        if let Command::List(args) = cli.command {
            assert!(args.orphans);
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_show() {
        let cli = Cli::try_parse_from(["shutter", "show", "1000.jpeg"]).unwrap();
        if let Command::Show(args) = cli.command {
            assert_eq!(args.key, "1000.jpeg");
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_remove() {
        let cli = Cli::try_parse_from(["shutter", "remove", "1000.jpeg"]).unwrap();
        assert!(matches!(cli.command, Command::Remove(_)));
    }

    #[test]
    fn parse_config() {
        let cli = Cli::try_parse_from(["shutter", "config"]).unwrap();
        assert!(matches!(cli.command, Command::Config(_)));
    }

    #[test]
    fn default_data_dir() {
        let cli = Cli::try_parse_from(["shutter", "list"]).unwrap();
        assert_eq!(cli.data_dir, PathBuf::from(".shutter"));
        assert!(cli.config.is_none());
    }

    #[test]
    fn parse_global_options_after_command() {
        let cli = Cli::try_parse_from([
            "shutter", "list", "--data-dir", "/tmp/photos", "--config", "c.toml",
        ])
        .unwrap();
        assert_eq!(cli.data_dir, PathBuf::from("/tmp/photos"));
        assert_eq!(cli.config, Some(PathBuf::from("c.toml")));
    }

    #[test]
    fn parse_verbose() {
        let cli = Cli::try_parse_from(["shutter", "--verbose", "list"]).unwrap();
        assert!(cli.verbose);
    }

    #[test]
    fn parse_json_format() {
        let cli = Cli::try_parse_from(["shutter", "--format", "json", "list"]).unwrap();
        assert!(matches!(cli.format, OutputFormat::Json));
    }
}
