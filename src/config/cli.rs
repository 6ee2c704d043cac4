use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum, ValueHint, builder::BoolishValueParser};

use crate::domain::posts::PostStatus;

/// Command-line arguments for the postdeck binary.
#[derive(Debug, Parser)]
#[command(
    name = "postdeck",
    version,
    about = "Moderation console for image-post feeds"
)]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(
        long = "config-file",
        env = "POSTDECK_CONFIG_FILE",
        value_name = "PATH",
        value_hint = ValueHint::FilePath,
        global = true
    )]
    pub config_file: Option<PathBuf>,

    /// Override where the scanned credentials are stored.
    #[arg(
        long = "credentials-file",
        env = "POSTDECK_CREDENTIALS_FILE",
        value_name = "PATH",
        value_hint = ValueHint::FilePath,
        global = true
    )]
    pub credentials_file: Option<PathBuf>,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new(),
        global = true
    )]
    pub log_json: Option<bool>,

    /// Override the number of posts per page.
    #[arg(long = "page-size", value_name = "COUNT", global = true)]
    pub page_size: Option<u32>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Scan a credential QR code and store it for later sessions.
    Login(LoginArgs),
    /// Post management.
    #[command(subcommand)]
    Posts(PostsCommand),
    /// Step through the images of one post.
    Gallery(GalleryArgs),
    /// Interactive console over the feed.
    Browse,
}

#[derive(Debug, Args, Clone)]
#[group(required = true, multiple = false)]
pub struct LoginArgs {
    /// Decode a single image file holding the QR code.
    #[arg(long, value_name = "FILE", value_hint = ValueHint::FilePath)]
    pub image: Option<PathBuf>,

    /// Watch a directory of captured frames until one holds a QR code.
    #[arg(long, value_name = "DIR", value_hint = ValueHint::DirPath)]
    pub frames: Option<PathBuf>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum PostsCommand {
    /// List one page of posts.
    List(ListArgs),
    /// Create a post.
    Create(CreateArgs),
    /// Update fields of a post.
    Update(UpdateArgs),
    /// Delete a post after confirmation.
    Delete(DeleteArgs),
    /// Flip a post between approved and pending.
    Toggle(IdArg),
}

#[derive(Debug, Args, Clone)]
pub struct ListArgs {
    /// One-based page number; clamped to the last page.
    #[arg(long, default_value_t = 1)]
    pub page: u32,
}

#[derive(Debug, Args, Clone)]
pub struct CreateArgs {
    #[arg(long)]
    pub description: String,
    #[arg(long, value_enum)]
    pub status: Option<StatusArg>,
    /// Image files to upload; repeat for several.
    #[arg(long = "image", value_name = "FILE", value_hint = ValueHint::FilePath)]
    pub images: Vec<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct UpdateArgs {
    #[arg(long)]
    pub id: i64,
    #[arg(long)]
    pub description: Option<String>,
    #[arg(long, value_enum)]
    pub status: Option<StatusArg>,
    /// Image files to upload and append.
    #[arg(long = "add-image", value_name = "FILE", value_hint = ValueHint::FilePath)]
    pub add_images: Vec<PathBuf>,
    /// Zero-based positions of existing images to remove.
    #[arg(long = "remove-image", value_name = "INDEX")]
    pub remove_images: Vec<usize>,
}

#[derive(Debug, Args, Clone)]
pub struct DeleteArgs {
    #[arg(long)]
    pub id: i64,
    /// Skip the confirmation prompt.
    #[arg(long, short = 'y', action = clap::ArgAction::SetTrue)]
    pub yes: bool,
}

#[derive(Debug, Args, Clone)]
pub struct IdArg {
    #[arg(long)]
    pub id: i64,
}

#[derive(Debug, Args, Clone)]
pub struct GalleryArgs {
    #[arg(long)]
    pub id: i64,
    /// Zero-based index of the first image shown.
    #[arg(long, default_value_t = 0)]
    pub start: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StatusArg {
    Pending,
    Approved,
    Rejected,
}

impl From<StatusArg> for PostStatus {
    fn from(value: StatusArg) -> Self {
        match value {
            StatusArg::Pending => PostStatus::Pending,
            StatusArg::Approved => PostStatus::Approved,
            StatusArg::Rejected => PostStatus::Rejected,
        }
    }
}
