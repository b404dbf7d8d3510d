use crate::base::{ConvergenceEntry, ConvergenceRecord, ProgressSink, SolverOptions, Stage};

/// Prints the convergence tables and forwards the entries to the caller's progress sink
///
/// The tables are printed only if `verbose_iterations` is enabled. Each entry is also sent to the
/// `log` facade with the trace level.
pub struct ControlConvergence<'a> {
    options: &'a SolverOptions,
    sink: &'a mut dyn ProgressSink,
    previous: Option<ConvergenceEntry>,
}

impl<'a> ControlConvergence<'a> {
    /// Allocates a new instance
    pub fn new(options: &'a SolverOptions, sink: &'a mut dyn ProgressSink) -> Self {
        ControlConvergence {
            options,
            sink,
            previous: None,
        }
    }

    /// Returns true if the entry satisfies the tolerance of its stage
    pub fn converged(&self, entry: &ConvergenceEntry) -> bool {
        match entry.stage {
            Stage::Thermal | Stage::TransientThermal => entry.residual_norm < self.options.thermal_tol,
            Stage::Coupling => entry.residual_norm < 1.0,
        }
    }

    /// Prints the header of the convergence table
    pub fn print_header(&self) {
        if self.options.verbose_iterations {
            println!("\nGFSIM === CONVERGENCE STATISTICS ==============================================");
            println!("\nLegend:");
            println!("✅ ─ converged");
            println!("🔹 ─ converging");
            println!("🎈 ─ diverging");
            println!("😱 ─ found NaN or Inf\n");
            println!("{}", "─".repeat(79));
            println!("{:>16} {:>5} {:>12} {:>11}", "stage", "iter", "norm", "wall time");
            println!("{}", "─".repeat(79));
        }
    }

    /// Prints one entry of the convergence table
    pub fn print_entry(&self, entry: &ConvergenceEntry) {
        if !self.options.verbose_iterations {
            return;
        }
        let icon = if !entry.residual_norm.is_finite() {
            "😱"
        } else if self.converged(entry) {
            "✅"
        } else {
            match self.previous {
                Some(prev) if prev.stage == entry.stage && entry.iteration > 0 => {
                    if entry.residual_norm > prev.residual_norm {
                        "🎈"
                    } else {
                        "🔹"
                    }
                }
                _ => "  ",
            }
        };
        let stage = match entry.stage {
            Stage::Thermal => "thermal",
            Stage::TransientThermal => "transient",
            Stage::Coupling => "coupling",
        };
        println!(
            "{:>16} {:>5} {:>12.4e} {:>10.3}s {}",
            stage, entry.iteration, entry.residual_norm, entry.wall_time, icon
        );
    }

    /// Prints the horizontal line at the end of the analysis
    pub fn print_footer(&self) {
        if self.options.verbose_iterations {
            println!("{}", "─".repeat(79));
        }
    }

    /// Appends a new entry to the record, then prints, logs and forwards it
    pub fn report(&mut self, record: &mut ConvergenceRecord, stage: Stage, iteration: usize, residual_norm: f64) {
        let entry = record.push(stage, iteration, residual_norm);
        log::trace!("{:?} iteration {}: norm = {:e}", stage, iteration, residual_norm);
        self.print_entry(&entry);
        self.previous = Some(entry);
        self.sink.on_entry(&entry);
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
