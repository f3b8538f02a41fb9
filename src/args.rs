use clap::Parser;
use clap_verbosity_flag::{InfoLevel, Verbosity};
use std::path::PathBuf;

/// Drop characters mapped to empty glyphs from a TrueType font
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Font file to clean
    pub input_font: PathBuf,

    /// Where to write the cleaned font (defaults to <input>_cleaned.<ext>)
    pub output_font: Option<PathBuf>,

    /// New family name for the font
    #[arg(long)]
    pub name: Option<String>,

    #[command(flatten)]
    pub verbosity: Verbosity<InfoLevel>,
}

impl Args {
    /// The output path, falling back to one beside the input font
    pub fn output_path(&self) -> PathBuf {
        self.output_font
            .clone()
            .unwrap_or_else(|| crate::default_output_path(&self.input_font))
    }
}
