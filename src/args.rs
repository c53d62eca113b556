use clap::{Parser, Subcommand};

/// This is a simplified electronic voting terminal: it collects the ballots of the voters,
/// stores them and tallies them.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) A JSON configuration file. The relative paths it contains are
    /// resolved against its directory. See the documentation of urna_tally::manual.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,

    /// (file path) The candidates registry: name,number,party,jurisdiction,office on each line.
    /// Setting this option overrides the path that may be specified with the --config option.
    #[clap(long, value_parser)]
    pub candidates: Option<String>,

    /// (file path) The voters registry: name,document,voter id,municipality,jurisdiction on
    /// each line. Setting this option overrides the path that may be specified with the
    /// --config option.
    #[clap(long, value_parser)]
    pub voters: Option<String>,

    /// (file path, default votos.bin) The ballot log.
    #[clap(short, long, value_parser)]
    pub ballots: Option<String>,

    /// (directory) If specified, the ballot log and the produced files that are not named
    /// by another option or by the configuration file are placed in this directory.
    #[clap(short, long, value_parser)]
    pub out_dir: Option<String>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Collects ballots at the terminal, until the operator stops.
    Vote {
        /// The jurisdiction (UF) of the terminal. Only the voters registered there can vote.
        #[clap(short, long, value_parser)]
        jurisdiction: Option<String>,
    },
    /// Tallies the ballot log, prints the count of each bucket and writes the result file.
    Apuracao,
    /// Tallies the ballot log, writes the result file and the boletim, and displays the
    /// votes of each office.
    Results {
        /// (file path) A reference result file. If provided, the program checks that the
        /// produced result file matches it.
        #[clap(short, long, value_parser)]
        reference: Option<String>,
    },
}
