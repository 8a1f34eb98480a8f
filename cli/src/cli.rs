//! Command-line surface.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use markflow_shared::{endpoints::UploadMode, models::GroupKind, pagination::DEFAULT_PER_PAGE};

/// Group type as typed on the command line.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum GroupKindArg {
    /// Plain group of uploads.
    Standard,
    /// Uploads filed under named batches.
    Batch,
}

impl From<GroupKindArg> for GroupKind {
    fn from(value: GroupKindArg) -> Self {
        match value {
            GroupKindArg::Standard => GroupKind::Standard,
            GroupKindArg::Batch => GroupKind::Batch,
        }
    }
}

/// How the server splits uploaded files into pages.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum UploadModeArg {
    /// One page per image file.
    Images,
    /// Every page of each PDF.
    Pdf,
}

impl From<UploadModeArg> for UploadMode {
    fn from(value: UploadModeArg) -> Self {
        match value {
            UploadModeArg::Images => UploadMode::Images,
            UploadModeArg::Pdf => UploadMode::Pdf,
        }
    }
}

/// Top-level arguments.
#[derive(Parser)]
#[command(name = "mf-cli", version, about = "MarkFlow exam marking CLI")]
pub struct Cli {
    /// API host; `/api/v1` is appended.
    #[arg(long, env = "MARKFLOW_API_BASE", default_value = "http://localhost:8000", global = true)]
    pub api_base: String,
    /// Where tokens and the preferred model are kept between runs.
    #[arg(
        long,
        env = "MARKFLOW_SESSION_FILE",
        default_value = "./.markflow/session.json",
        global = true
    )]
    pub session_file: PathBuf,
    /// Subcommand.
    #[command(subcommand)]
    pub command: Commands,
}

/// Listing position and order shared by the list commands.
#[derive(Debug, Clone, Args)]
pub struct ListArgs {
    /// 1-based page number.
    #[arg(long, default_value_t = 1)]
    pub page: usize,
    /// Rows per page.
    #[arg(long, default_value_t = DEFAULT_PER_PAGE)]
    pub per_page: usize,
    /// Column to sort by.
    #[arg(long)]
    pub sort: Option<String>,
    /// Sort descending instead of ascending.
    #[arg(long)]
    pub desc: bool,
}

/// Subcommands.
#[derive(Subcommand)]
pub enum Commands {
    /// Sign in and store the session tokens.
    Login {
        /// Account email.
        #[arg(long)]
        email: String,
        /// Account password.
        #[arg(long, env = "MARKFLOW_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Create an account and sign in.
    Register {
        /// Display name.
        #[arg(long)]
        name: String,
        /// Account email.
        #[arg(long)]
        email: String,
        /// Account password.
        #[arg(long, env = "MARKFLOW_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Forget the stored session.
    Logout,
    /// Show the signed-in user.
    Whoami,
    /// Upload groups.
    Groups {
        /// Group action.
        #[command(subcommand)]
        command: GroupCommands,
    },
    /// Uploaded scripts.
    Uploads {
        /// Upload action.
        #[command(subcommand)]
        command: UploadCommands,
    },
    /// Pages of one upload and their OCR text.
    Pages {
        /// Page action.
        #[command(subcommand)]
        command: PageCommands,
    },
    /// Marking schemes.
    Schemes {
        /// Scheme action.
        #[command(subcommand)]
        command: SchemeCommands,
    },
    /// Marking jobs of a group.
    Jobs {
        /// Job action.
        #[command(subcommand)]
        command: JobCommands,
    },
    /// Results of a marking job.
    Results {
        /// Result action.
        #[command(subcommand)]
        command: ResultCommands,
    },
}

/// `groups` actions.
#[derive(Subcommand)]
pub enum GroupCommands {
    /// List groups; sorting happens on the server.
    List {
        /// Page and order.
        #[command(flatten)]
        list: ListArgs,
    },
    /// Create a group.
    Create {
        /// Group name.
        #[arg(long)]
        name: String,
        /// Group type.
        #[arg(long, value_enum, default_value_t = GroupKindArg::Standard, ignore_case = true)]
        kind: GroupKindArg,
        /// Optional description.
        #[arg(long)]
        description: Option<String>,
    },
    /// Delete one or more groups.
    Delete {
        /// Group ids.
        #[arg(required = true)]
        ids: Vec<String>,
    },
}

/// `uploads` actions.
#[derive(Subcommand)]
pub enum UploadCommands {
    /// List the uploads of a group.
    List {
        /// Group id.
        #[arg(long)]
        group: String,
        /// Page and order.
        #[command(flatten)]
        list: ListArgs,
    },
    /// List the uploads filed under one batch.
    Batch {
        /// Group id.
        #[arg(long)]
        group: String,
        /// Batch name.
        #[arg(long)]
        batch: String,
    },
    /// Upload script files to a group.
    Create {
        /// Group id.
        #[arg(long)]
        group: String,
        /// Page splitting mode.
        #[arg(long, value_enum, default_value_t = UploadModeArg::Images, ignore_case = true)]
        mode: UploadModeArg,
        /// Batch to file the uploads under (batch groups).
        #[arg(long)]
        batch: Option<String>,
        /// Files to upload, in order.
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Keep refreshing until processing finishes.
        #[arg(long)]
        watch: bool,
    },
    /// Refresh until nothing in the group (or batch) is processing.
    Watch {
        /// Group id.
        #[arg(long)]
        group: String,
        /// Limit to one batch.
        #[arg(long)]
        batch: Option<String>,
    },
    /// Delete an upload.
    Delete {
        /// Upload id.
        id: String,
    },
}

/// `pages` actions.
#[derive(Subcommand)]
pub enum PageCommands {
    /// List the pages of an upload.
    List {
        /// Upload id.
        #[arg(long)]
        upload: String,
    },
    /// Print the OCR text of one page.
    Show {
        /// Upload id.
        #[arg(long)]
        upload: String,
        /// 1-based page number.
        #[arg(long)]
        page: u32,
    },
    /// Replace the OCR text of a page with the contents of a file.
    SetText {
        /// Upload id.
        #[arg(long)]
        upload: String,
        /// 1-based page number.
        #[arg(long)]
        page: u32,
        /// UTF-8 text file.
        #[arg(long)]
        file: PathBuf,
    },
    /// Run OCR again for a page.
    RedoOcr {
        /// Upload id.
        #[arg(long)]
        upload: String,
        /// 1-based page number.
        #[arg(long)]
        page: u32,
        /// Poll the page for a while afterwards.
        #[arg(long)]
        wait: bool,
    },
}

/// `schemes` actions.
#[derive(Subcommand)]
pub enum SchemeCommands {
    /// List marking schemes.
    List {
        /// Page and order.
        #[command(flatten)]
        list: ListArgs,
    },
    /// Show one scheme with its criteria.
    Show {
        /// Scheme id.
        id: String,
    },
    /// Create a scheme.
    Create {
        /// Scheme contents.
        #[command(flatten)]
        scheme: SchemeArgs,
    },
    /// Replace a scheme.
    Update {
        /// Scheme id.
        id: String,
        /// New contents.
        #[command(flatten)]
        scheme: SchemeArgs,
    },
}

/// Scheme contents given on the command line.
#[derive(Debug, Clone, Args)]
pub struct SchemeArgs {
    /// Scheme name.
    #[arg(long)]
    pub name: String,
    /// Optional description.
    #[arg(long)]
    pub description: Option<String>,
    /// Criterion as `NAME=MARKS`; repeat for each criterion.
    #[arg(long = "criterion", required = true)]
    pub criteria: Vec<String>,
}

/// `jobs` actions.
#[derive(Subcommand)]
pub enum JobCommands {
    /// List the marking jobs of a group.
    List {
        /// Group id.
        #[arg(long)]
        group: String,
    },
    /// Start marking a group against a scheme.
    Create {
        /// Group id.
        #[arg(long)]
        group: String,
        /// Scheme id.
        #[arg(long)]
        scheme: String,
        /// AI model; defaults to the last one used.
        #[arg(long)]
        model: Option<String>,
        /// Keep refreshing until the job finishes.
        #[arg(long)]
        watch: bool,
    },
    /// Refresh until no job of the group is running.
    Watch {
        /// Group id.
        #[arg(long)]
        group: String,
    },
}

/// `results` actions.
#[derive(Subcommand)]
pub enum ResultCommands {
    /// List the results of a marking job.
    List {
        /// Job id.
        #[arg(long)]
        job: String,
        /// Page and order.
        #[command(flatten)]
        list: ListArgs,
    },
    /// Refresh until every result is final.
    Watch {
        /// Job id.
        #[arg(long)]
        job: String,
        /// Page to follow.
        #[arg(long, default_value_t = 1)]
        page: usize,
    },
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_upload_create() {
        let cli = Cli::try_parse_from([
            "mf-cli",
            "uploads",
            "create",
            "--group",
            "g1",
            "--batch",
            "Term1",
            "a.jpg",
            "b.jpg",
        ])
        .unwrap();
        match cli.command {
            Commands::Uploads {
                command:
                    UploadCommands::Create {
                        group,
                        batch,
                        files,
                        ..
                    },
            } => {
                assert_eq!(group, "g1");
                assert_eq!(batch.as_deref(), Some("Term1"));
                assert_eq!(files.len(), 2);
            },
            _ => panic!("wrong command"),
        }
    }
}
