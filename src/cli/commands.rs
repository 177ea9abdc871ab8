use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "tk", about = concat!("[x] ticklist v", env!("CARGO_PKG_VERSION"), " - todos that live on your server"), version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Use a different config file
    #[arg(short = 'c', long = "config", global = true)]
    pub config: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a default config file
    Init(InitArgs),
    /// Store an API token in the config
    Login(LoginArgs),
    /// Clear the stored API token
    Logout,
    /// List todos
    List(ListArgs),
    /// Add a todo
    Add(AddArgs),
    /// Toggle a todo's done state
    Toggle(IdArgs),
    /// Change a todo's text
    Edit(EditArgs),
    /// Delete a todo
    Rm(IdArgs),
}

#[derive(Args)]
pub struct InitArgs {
    /// Overwrite an existing config file
    #[arg(long)]
    pub force: bool,
}

#[derive(Args)]
pub struct LoginArgs {
    /// Bearer token (omit to take it from $TK_TOKEN)
    pub token: Option<String>,
}

#[derive(Args)]
pub struct ListArgs {
    /// Show only a subset: all, active, or completed
    #[arg(short, long, default_value = "all")]
    pub filter: String,
}

#[derive(Args)]
pub struct AddArgs {
    /// Todo text (words are joined with spaces)
    #[arg(required = true, num_args = 1..)]
    pub text: Vec<String>,
}

#[derive(Args)]
pub struct IdArgs {
    /// Todo id
    pub id: i64,
}

#[derive(Args)]
pub struct EditArgs {
    /// Todo id
    pub id: i64,
    /// New text (words are joined with spaces)
    #[arg(required = true, num_args = 1..)]
    pub text: Vec<String>,
}
