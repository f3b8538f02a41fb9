use clap::Parser;
use fontcleaner::{cleanup, Args};

fn main() {
    let args = Args::parse();
    env_logger::Builder::new()
        .filter_level(args.verbosity.into())
        .init();

    let output = args.output_path();
    if let Err(e) = cleanup(&args.input_font, &output, args.name.as_deref()) {
        log::error!("Font cleanup failed: {}", e);
        std::process::exit(1);
    }
}
