use std::path::PathBuf;

#[derive(Debug, Clone, clap::Parser)]
#[clap(name = "mdx-l10n", author, version, about)]
pub struct CliArguments {
    /// Project configuration file
    #[clap(long, global = true, default_value = "mdx-l10n.toml")]
    pub config: PathBuf,

    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, clap::Subcommand)]
pub enum Commands {
    /// Prints the translatable units of documents as JSON
    Extract(ExtractArgs),
    /// Writes localized copies of documents
    Localize(LocalizeArgs),
}

#[derive(Debug, Clone, clap::Parser)]
pub struct ExtractArgs {
    /// Write the units here instead of stdout
    #[clap(long, short)]
    pub output: Option<PathBuf>,

    #[clap(required = true)]
    pub files: Vec<PathBuf>,
}

#[derive(Debug, Clone, clap::Parser)]
pub struct LocalizeArgs {
    /// Target locale, repeatable. Defaults to the configured locales.
    #[clap(long = "locale", short)]
    pub locales: Vec<String>,

    /// JSON translation set. Defaults to the configured path.
    #[clap(long)]
    pub translations: Option<PathBuf>,

    /// Where untranslated units are written
    #[clap(long, default_value = "new-resources.json")]
    pub new_resources: PathBuf,

    #[clap(required = true)]
    pub files: Vec<PathBuf>,
}
