use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "blogctl")]
#[command(about = "Operator tool for the blog content store", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Database URL, overriding `DATABASE_URL`
    #[arg(long, global = true)]
    pub database_url: Option<String>,

    /// Act as this stored account instead of the local operator
    #[arg(long = "as", global = true, value_name = "USERNAME")]
    pub acting_as: Option<String>,

    /// Print machine-readable JSON instead of tables
    #[arg(long, global = true)]
    pub json: bool,

    /// Show timing/latency information
    #[arg(long, global = true)]
    pub timing: bool,

    /// Enable verbose debug output
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show build and database information
    Info,
    /// Publish a new post
    Publish(PublishArgs),
    /// Edit an existing post; omitted fields keep their current values
    Edit(EditArgs),
    /// List posts, newest first
    Posts {
        /// Only posts carrying this tag
        #[arg(long)]
        tag: Option<String>,
    },
    /// Show one post with its comments and neighbours
    Show {
        title: String,

        /// Navigate within this tag
        #[arg(long)]
        tag: Option<String>,
    },
    /// Delete a post
    Delete { title: String },
    /// Comment on a post
    Comment { title: String, content: String },
    /// List all tags
    Tags,
    /// Remove tags no post references
    SweepTags,
    /// Manage accounts
    Accounts {
        #[command(subcommand)]
        command: AccountCommands,
    },
}

#[derive(Args, Debug)]
pub struct PublishArgs {
    #[arg(long, short = 't')]
    pub title: String,

    /// Post body
    #[arg(long, short = 'c', default_value = "")]
    pub content: String,

    /// Read the post body from stdin
    #[arg(long, conflicts_with = "content")]
    pub stdin: bool,

    /// Tags separated by commas or spaces
    #[arg(long, default_value = "")]
    pub tags: String,

    /// Publish time as YYYY-MM-DDTHH:MM (UTC); now when omitted
    #[arg(long, default_value = "")]
    pub time: String,

    /// Encoded image file
    #[arg(long)]
    pub image: Option<PathBuf>,

    /// Encoded thumbnail file; defaults to the image
    #[arg(long, requires = "image")]
    pub thumbnail: Option<PathBuf>,

    /// Hide the post from listings
    #[arg(long)]
    pub unlisted: bool,

    /// Make this a link post pointing at URL
    #[arg(long, value_name = "URL")]
    pub link: Option<String>,
}

#[derive(Args, Debug)]
pub struct EditArgs {
    /// Current title
    pub title: String,

    /// New title
    #[arg(long)]
    pub rename: Option<String>,

    #[arg(long, short = 'c')]
    pub content: Option<String>,

    /// Replacement tag list (replaces all tags)
    #[arg(long)]
    pub tags: Option<String>,

    /// New publish time as YYYY-MM-DDTHH:MM (UTC)
    #[arg(long)]
    pub time: Option<String>,

    #[arg(long)]
    pub image: Option<PathBuf>,

    #[arg(long, requires = "image")]
    pub thumbnail: Option<PathBuf>,

    #[arg(long)]
    pub unlisted: Option<bool>,

    /// Link target; an empty value turns the link off
    #[arg(long, value_name = "URL")]
    pub link: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum AccountCommands {
    /// List accounts, newest first
    List,
    /// Create an account
    Add {
        username: String,
        #[arg(long, default_value = "")]
        email: String,
    },
    /// Delete an account; its comments become anonymous
    Remove { username: String },
    /// Flip a role on an account
    Toggle {
        username: String,
        #[arg(value_enum)]
        role: RoleArg,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum RoleArg {
    Admin,
    Uploader,
}

impl From<RoleArg> for blog_services::accounts::Role {
    fn from(role: RoleArg) -> Self {
        match role {
            RoleArg::Admin => Self::Admin,
            RoleArg::Uploader => Self::Uploader,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory as _;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_publish_arguments() {
        let cli = Cli::try_parse_from([
            "blogctl", "publish", "-t", "Hello", "--tags", "a,b", "--time", "2024-01-01T10:00",
            "--unlisted",
        ])
        .expect("publish should parse");

        match cli.command {
            Commands::Publish(args) => {
                assert_eq!(args.title, "Hello");
                assert_eq!(args.tags, "a,b");
                assert_eq!(args.time, "2024-01-01T10:00");
                assert!(args.unlisted);
                assert!(args.link.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_edit_leaves_unset_fields_empty() {
        let cli = Cli::try_parse_from(["blogctl", "edit", "Hello", "--unlisted", "true"])
            .expect("edit should parse");
        match cli.command {
            Commands::Edit(args) => {
                assert_eq!(args.title, "Hello");
                assert_eq!(args.unlisted, Some(true));
                assert!(args.content.is_none());
                assert!(args.tags.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["blogctl", "posts", "--tag", "x", "--json", "--as", "alice"])
            .expect("posts should parse");
        assert!(cli.json);
        assert_eq!(cli.acting_as.as_deref(), Some("alice"));
    }

    #[test]
    fn test_thumbnail_requires_image() {
        let result = Cli::try_parse_from(["blogctl", "publish", "-t", "x", "--thumbnail", "t.jpg"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_account_toggle_role() {
        let cli = Cli::try_parse_from(["blogctl", "accounts", "toggle", "bob", "uploader"])
            .expect("toggle should parse");
        match cli.command {
            Commands::Accounts {
                command: AccountCommands::Toggle { username, role },
            } => {
                assert_eq!(username, "bob");
                assert_eq!(role, RoleArg::Uploader);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
