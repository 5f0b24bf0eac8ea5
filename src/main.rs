use std::error::Error;
use std::path::PathBuf;

use clap::Parser;
use hello_optimization::grid::GridSamples;
use hello_optimization::plot::{build_plot, write_html};
use hello_optimization::problem;

#[derive(Parser)]
#[command(name = "hello-optimization")]
#[command(about = "Minimize a toy objective under two inequality constraints and plot the result")]
struct Args {
    /// Also write the figure to this HTML file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Do not open the figure in a browser
    #[arg(long)]
    no_show: bool,

    /// Print the optimization result as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let args = Args::parse();

    let res = problem::solve();
    if args.json {
        println!("{}", serde_json::to_string_pretty(&res)?);
    } else {
        println!("{res}");
    }
    println!("The optimal point x* is {:?}", res.x);

    let grid = GridSamples::sample();
    let plot = build_plot(&grid, &res.x);
    if let Some(path) = &args.output {
        write_html(&plot, path)?;
    }
    if !args.no_show {
        plot.show();
    }
    Ok(())
}
