use clap::Parser;

/// Merges the yearly survey exports of every category into one dataset, following the guide of the category.
#[derive(Parser, Debug, Clone, Default)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) A JSON configuration file. The options passed on the command line
    /// override the ones of the file. Relative directories in the file are resolved against
    /// the directory of the file.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,

    /// (directory) Where the data files are. Subdirectories are searched as well.
    #[clap(short, long, value_parser)]
    pub input_dir: Option<String>,

    /// (directory) Where the guide documents (.xlsx) are.
    #[clap(short, long, value_parser)]
    pub guide_dir: Option<String>,

    /// (directory) Where the merged files are written. Created if needed.
    #[clap(short, long, value_parser)]
    pub output_dir: Option<String>,

    /// (list of comma-separated 2-digit years, default 24,23,22) The years to merge, as they
    /// appear at the start of the data file names.
    #[clap(long, value_parser, value_delimiter = ',')]
    pub years: Option<Vec<String>>,

    /// (default 변수레이블) The name of the column of the guide that holds the variable labels.
    #[clap(long, value_parser)]
    pub var_label_column: Option<String>,

    /// (list of comma-separated positions, default 4,6) Zero-based positions of the guide
    /// columns holding the codes that the data files must contain.
    #[clap(long, value_parser, value_delimiter = ',')]
    pub required_columns: Option<Vec<usize>>,

    /// (list of comma-separated positions, default 8,10) Zero-based positions of the guide
    /// columns holding the derived codes, which the data files must not contain.
    #[clap(long, value_parser, value_delimiter = ',')]
    pub forbidden_columns: Option<Vec<usize>>,

    /// (file path, 'stdout' or empty) Where the JSON summary of the run is written. Defaults to
    /// the standard output.
    #[clap(short, long, value_parser)]
    pub summary_out: Option<String>,

    /// If passed as an argument, checks the merged files for the QA columns after the merge.
    #[clap(long, takes_value = false)]
    pub qa: bool,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
