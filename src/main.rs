use clap::Parser;
use linear_cut_optimizer::render;
use linear_cut_optimizer::solver::{Mode, Solver};
use linear_cut_optimizer::{LengthSpec, SearchConfig};
use tracing::Level;

#[derive(Parser)]
#[command(
    name = "cut_optimizer",
    about = "1D cutting stock optimizer for bars, pipes and profiles"
)]
struct Cli {
    /// Stock bars as LEN:QTY (e.g. 6000:10 4000:5)
    #[arg(long, num_args = 1.., required = true)]
    stock: Vec<String>,

    /// Order pieces as LEN:QTY (e.g. 1200:8 750:12)
    #[arg(long, num_args = 1.., required = true)]
    orders: Vec<String>,

    /// Blade kerf width lost at every cut after the first (default: 0)
    #[arg(long, default_value_t = 0.0)]
    kerf: f64,

    /// Engine: exact or heuristic
    #[arg(long, default_value = "exact")]
    mode: Mode,

    /// Wall-clock budget for the exact search in milliseconds
    #[arg(long, default_value_t = linear_cut_optimizer::config::DEFAULT_TIME_LIMIT_MS)]
    time_limit_ms: u64,

    /// Node budget for the exact search
    #[arg(long, default_value_t = linear_cut_optimizer::config::DEFAULT_MAX_ITERATIONS)]
    max_iterations: u64,

    /// Print the result as JSON
    #[arg(long)]
    json: bool,

    /// Show an ASCII layout of each cutting pattern
    #[arg(long)]
    layout: bool,

    /// Log search progress to stderr
    #[arg(long)]
    verbose: bool,
}

fn parse_spec(s: &str) -> Result<LengthSpec, String> {
    let parts: Vec<&str> = s.split(':').collect();
    if parts.len() != 2 {
        return Err(format!("invalid entry '{}', expected LEN:QTY", s));
    }
    let length = parts[0]
        .parse::<f64>()
        .map_err(|_| format!("invalid length in '{}'", s))?;
    if !length.is_finite() || length <= 0.0 {
        return Err(format!("length must be positive in '{}'", s));
    }
    let count = parts[1]
        .parse::<u32>()
        .map_err(|_| format!("invalid quantity in '{}'", s))?;
    Ok(LengthSpec::new(length, count))
}

fn parse_specs(entries: &[String]) -> Vec<LengthSpec> {
    entries
        .iter()
        .map(|e| parse_spec(e))
        .collect::<Result<Vec<_>, _>>()
        .unwrap_or_else(|e| {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        })
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::WARN })
        .init();

    let stock = parse_specs(&cli.stock);
    let orders = parse_specs(&cli.orders);

    if !cli.kerf.is_finite() || cli.kerf < 0.0 {
        eprintln!("Error: kerf must be a non-negative number");
        std::process::exit(1);
    }

    // Every piece needs at least one stock length that can hold it
    let longest = stock.iter().filter(|s| s.count > 0).map(|s| s.length).fold(0.0, f64::max);
    for o in orders.iter().filter(|o| o.count > 0) {
        if o.length > longest {
            eprintln!("Error: order {o} does not fit in any stock bar");
            std::process::exit(1);
        }
    }

    let config = SearchConfig::new()
        .with_time_limit_ms(cli.time_limit_ms)
        .with_max_iterations(cli.max_iterations);
    let solver = Solver::new(stock, cli.kerf, orders);
    let result = solver.solve(cli.mode, &config);

    if cli.json {
        match serde_json::to_string_pretty(&result) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
        return;
    }

    for (i, plan) in result.plans.iter().enumerate() {
        let pieces: Vec<String> = plan
            .cut_lengths
            .iter()
            .zip(&plan.cut_counts)
            .map(|(len, count)| {
                if *count > 1 {
                    format!("{}x{}", len, count)
                } else {
                    format!("{}", len)
                }
            })
            .collect();
        println!(
            "Pattern {}: {} x{} -> {}  (waste {:.1} per bar)",
            i + 1,
            plan.stock_length,
            plan.count,
            pieces.join(" + "),
            plan.avg_waste,
        );
        if cli.layout {
            print!("{}", render::render_plan(plan));
        }
    }

    let summary = &result.summary;
    if !summary.is_order_fulfilled {
        eprintln!("Error: the stock supply cannot fulfill the order");
        std::process::exit(2);
    }
    println!(
        "\nSummary: {} bar{} used, {:.1} kerf loss, {:.1} waste",
        summary.total_stock_used,
        if summary.total_stock_used == 1 { "" } else { "s" },
        summary.total_cut_loss,
        summary.total_waste,
    );
}
