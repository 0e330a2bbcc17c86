use clap::Parser;

/// This program builds a tiered accountability report from a roster of representatives.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path) The JSON configuration file describing the data sources, the tracked events and the rules.
    /// For more information about the file format, read the documentation of the accountability crate.
    #[clap(short, long, value_parser)]
    pub config: String,

    /// (file path) A reference report in JSON format. If provided, tierwatch will
    /// check that the generated report matches the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// (file path, 'stdout' or empty) If specified, the report will be written in JSON format to the given
    /// location. Setting this option overrides the path that may be specified in the configuration.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (integer) Seed for the synthesized votes. Overrides the seed of the configuration.
    #[clap(long, value_parser)]
    pub seed: Option<u64>,

    /// (RFC 3339 timestamp) Generation time written in the report. Defaults to the current time.
    #[clap(long, value_parser)]
    pub timestamp: Option<String>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
