use std::process;

use clap::Parser;
use colored::Colorize;
use kontig::{
    cli::Args,
    gfa,
    graph::CompactedDBG,
};

/// Initialize the tracing subscriber.
///
/// `-v` selects info-level progress messages; set `RUST_LOG=kontig=debug`
/// to see debug output regardless.
fn init_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let default_filter = if verbose { "kontig=info" } else { "kontig=warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let args = Args::parse();

    if let Err(errors) = args.validate() {
        for error in &errors {
            eprintln!("{} {}", "error:".red().bold(), error);
        }
        process::exit(1);
    }

    init_tracing(args.verbose);

    let mut cdbg = match CompactedDBG::<()>::new(args.kmer_length, args.minimizer_length) {
        Ok(cdbg) => cdbg,
        Err(e) => {
            eprintln!("{} {}", "error:".red().bold(), e);
            process::exit(1);
        }
    };

    if args.verbose {
        eprintln!("{}: {}", "k-length".bold(), args.kmer_length.to_string().blue().bold());
        eprintln!(
            "{}: {}",
            "g-length".bold(),
            args.minimizer_length.to_string().blue().bold()
        );
        eprintln!("{}: {}", "threads".bold(), args.threads.to_string().blue().bold());
        eprintln!(
            "{}: {}",
            "mode".bold(),
            if args.reference { "reference" } else { "reads" }.blue().bold()
        );
        for file in &args.files {
            eprintln!("{}: {}", "data".bold(), file.display().to_string().underline().blue());
        }
        eprintln!();
    }

    if let Err(e) = cdbg.build(&args.build_options()) {
        eprintln!("{} {}", "error:".red().bold(), e);
        process::exit(1);
    }

    let (clipped, removed) = cdbg.simplify(args.clip_tips, args.rm_isolated);

    let gfa_path = args.gfa_path();
    if let Err(e) = gfa::write_gfa(&cdbg, &gfa_path) {
        eprintln!("{} {}", "error:".red().bold(), e);
        process::exit(1);
    }

    if args.verbose {
        eprintln!(
            "{}: {} unitigs, {} k-mers",
            "graph".bold(),
            cdbg.num_unitigs().to_string().green().bold(),
            cdbg.num_kmers().to_string().green().bold()
        );
        if args.clip_tips || args.rm_isolated {
            eprintln!(
                "{}: {} tips clipped, {} isolated removed",
                "simplify".bold(),
                clipped.to_string().green().bold(),
                removed.to_string().green().bold()
            );
        }
        eprintln!(
            "{}: {}",
            "output".bold(),
            gfa_path.display().to_string().green().bold()
        );
    }
}
