pub mod extract;
pub mod list;
pub mod pack;

#[derive(clap::Subcommand)]
pub enum RarcCommands {
    /// Extract a RARC archive into a directory
    Extract(extract::ExtractArgs),
    /// Show the contents of a RARC archive
    List(list::ListArgs),
    /// Pack a directory into a RARC archive
    Pack(pack::PackArgs),
}

impl RarcCommands {
    pub fn handle(&self) -> miette::Result<()> {
        match self {
            RarcCommands::Extract(extract) => extract.handle(),
            RarcCommands::List(list) => list.handle(),
            RarcCommands::Pack(pack) => pack.handle(),
        }
    }
}
