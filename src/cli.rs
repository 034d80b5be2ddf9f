//! Command-line interface definitions and argument parsing

use std::path::PathBuf;

use clap::Parser;

use crate::data::Encoding;

/// Sales analytics CLI: cleans a sales CSV and renders trend, pricing and RFM reports
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the input CSV file
    #[arg(short, long, default_value = "data/sales_data_sample.csv")]
    pub input: PathBuf,

    /// Text encoding of the input file (utf-8 or iso-8859-1)
    #[arg(short, long, default_value = "iso-8859-1")]
    pub encoding: Encoding,

    /// Directory the reports are written to
    #[arg(short, long, default_value = "reports")]
    pub reports_dir: PathBuf,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Default log filter when `RUST_LOG` is unset
    pub fn log_filter(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else {
            "info"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_need_no_flags() {
        let args = Args::try_parse_from(["salesforge"]).unwrap();
        assert_eq!(args.input, PathBuf::from("data/sales_data_sample.csv"));
        assert_eq!(args.encoding, Encoding::Latin1);
        assert_eq!(args.reports_dir, PathBuf::from("reports"));
        assert!(!args.verbose);
        assert_eq!(args.log_filter(), "info");
    }

    #[test]
    fn test_flags_override_defaults() {
        let args = Args::try_parse_from([
            "salesforge",
            "--input",
            "sales.csv",
            "--encoding",
            "UTF-8",
            "--reports-dir",
            "out",
            "--verbose",
        ])
        .unwrap();
        assert_eq!(args.input, PathBuf::from("sales.csv"));
        assert_eq!(args.encoding, Encoding::Utf8);
        assert_eq!(args.reports_dir, PathBuf::from("out"));
        assert_eq!(args.log_filter(), "debug");

        assert!(Args::try_parse_from(["salesforge", "--encoding", "ebcdic"]).is_err());
    }
}
