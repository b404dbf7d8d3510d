use gfsim::prelude::*;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use structopt::StructOpt;

/// Command line options
#[derive(StructOpt, Debug)]
#[structopt(name = "gfsim_run", about = "Runs a glass forming simulation defined in a JSON file")]
struct Options {
    /// Problem file (JSON)
    input: String,

    /// Output directory
    #[structopt(short, long, default_value = "/tmp/gfsim/results")]
    out_dir: String,

    /// Prints the convergence entries
    #[structopt(short, long)]
    verbose: bool,
}

fn main() -> Result<(), SolverError> {
    env_logger::init();

    // parse options
    let options = Options::from_args();

    // load problem
    let problem = Problem::read_json(&options.input)?;
    let mode = gfsim::host::select_problem_mode(&problem)?;
    log::info!("execution mode: {:?}", mode);

    // run
    let verbose = options.verbose;
    let mut sink = |entry: &ConvergenceEntry| {
        if verbose {
            println!(
                "{:?} {:>4} {:>12.4e} {:>9.3}s",
                entry.stage, entry.iteration, entry.residual_norm, entry.wall_time
            );
        }
    };
    let cancel = AtomicBool::new(false);
    let outcome = match gfsim::fem::run(&problem, &mut sink, &cancel) {
        Ok(outcome) => outcome,
        Err(failure) => {
            if let Some(last) = failure.record.entries().last() {
                eprintln!(
                    "failed after {} convergence entries (last: {:?} {} {:e})",
                    failure.record.len(),
                    last.stage,
                    last.iteration,
                    last.residual_norm
                );
            }
            return Err(failure.error);
        }
    };

    // save result
    let stem = Path::new(&options.input)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("problem");
    let path = format!("{}/{}-result.json", options.out_dir, stem);
    if let Some(result) = outcome.result() {
        result.write_json(&path)?;
        let summary = &result.summary;
        let thin_line = format!("{:─^1$}", "", path.len());
        println!("\n\n{}", thin_line);
        println!("max temperature     = {:.3} K", summary.max_temperature);
        println!("max von Mises       = {:e} Pa", summary.max_von_mises);
        if let Some(speed) = summary.feed_speed {
            println!("feed speed          = {:e} m/s", speed);
        }
        if let Some(force) = summary.fiber_tension {
            println!("fiber tension       = {:e} N", force);
        }
        println!("outer iterations    = {}", summary.outer_iterations);
        println!("the result file is:");
        println!("{}", path);
        println!("{}\n\n", thin_line);
    }
    Ok(())
}
