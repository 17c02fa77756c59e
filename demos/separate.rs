use clap::{Parser, Subcommand};
use color_eyre::Result;
use gabbay_rs::convert::{back_convert, convert};
use gabbay_rs::formula::Formula;
use gabbay_rs::matrix::PureMatrix;
use gabbay_rs::separator::{Separator, SeparatorConfig};

#[derive(Parser)]
#[command(author, version, about = "Separation of past/future LTL formulas")]
struct Cli {
    /// Formula, e.g. "(a & (b U c)) S q"
    formula: String,

    /// Number of worker threads (default: one per core)
    #[arg(short, long, value_name = "INT")]
    workers: Option<usize>,

    /// Skip the simplification passes
    #[arg(long)]
    no_simplify: bool,

    /// Merge siblings of the result with reversed Lemma A2
    #[arg(long)]
    merge_siblings: bool,

    /// Print debug logs
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the parsed tree in DOT format
    Tree,

    /// Rewrite derived operators with `S` and `U`
    Convert,

    /// Separate the formula
    Separate {
        /// Fold the result back into `O H Y F G X` where possible
        #[arg(long)]
        back_convert: bool,
    },

    /// Separate the formula and print its (past, present, future) matrix
    Matrix,
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    simplelog::TermLogger::init(
        if cli.verbose {
            simplelog::LevelFilter::Debug
        } else {
            simplelog::LevelFilter::Info
        },
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )?;

    let f: Formula = cli.formula.parse()?;
    println!("formula = {}", f);

    let config = SeparatorConfig {
        workers: cli.workers,
        simplify: !cli.no_simplify,
        merge_siblings: cli.merge_siblings,
    };

    match cli.command {
        Commands::Tree => {
            // Render with: dot -Tpng tree.dot -o tree.png
            print!("{}", f.to_dot()?);
        }
        Commands::Convert => {
            println!("converted = {}", convert(&f));
        }
        Commands::Separate { back_convert: fold } => {
            let separator = Separator::new(config)?;
            let time_separate = std::time::Instant::now();
            let g = separator.separate(&f);
            let time_separate = time_separate.elapsed();
            let g = if fold { back_convert(&g) } else { g };
            println!("separated = {}", g);
            println!("size = {}", g.size());
            println!("Separated in {:.3} s", time_separate.as_secs_f64());
        }
        Commands::Matrix => {
            let separator = Separator::new(config)?;
            let g = separator.separate(&f);
            println!("{}", PureMatrix::from_formula(&g));
        }
    }

    Ok(())
}
