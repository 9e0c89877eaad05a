use clap::Parser;

use crate::run_mode::{RunFlags, RunMode};

/// Migrates the catalog database into the content API.
///
/// Recognized tokens: `publish` (wipe and write for real), `test` (wipe and
/// seed fixtures afterwards), `clean` (wipe only). Without tokens the
/// migration runs as a preview. Other tokens are ignored.
#[derive(Parser, Clone, Debug)]
#[command(name = "catalog-migrate")]
#[command(disable_help_flag = true, disable_version_flag = true)]
pub struct Cli {
    /// Run-mode tokens
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub tokens: Vec<String>,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    pub fn flags(&self) -> RunFlags {
        RunFlags::from_tokens(&self.tokens)
    }

    pub fn run_mode(&self) -> RunMode {
        self.flags().into()
    }
}
