use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "termsession", version, about = "Timed assessment sessions in the terminal")]
pub struct Cli {
    /// Session document (YAML) issued by the server
    pub config: PathBuf,

    /// Validate the document, print a summary and exit
    #[arg(long)]
    pub check: bool,

    /// Request an evaluation when the document only carries a result
    #[arg(long)]
    pub evaluate: bool,

    /// Log requests instead of sending them
    #[arg(long)]
    pub dry_run: bool,

    /// Log file [default: <data dir>/termsession.log]
    #[arg(long, value_name = "path")]
    pub log_file: Option<PathBuf>,
}
