use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Identifies the iterative process that produced a convergence entry
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stage {
    /// Newton iteration of the steady thermal-radiation solver
    Thermal,

    /// Newton iteration within one step of the transient thermal solver
    TransientThermal,

    /// Outer (Picard) iteration of the coupling orchestrator
    Coupling,
}

/// Holds one line of the convergence history
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConvergenceEntry {
    /// Process that generated this entry
    pub stage: Stage,

    /// Iteration index (zero-based)
    pub iteration: usize,

    /// Norm used to decide convergence
    ///
    /// * Thermal stages: ‖ΔT‖∞ in K
    /// * Coupling stage: max(‖ΔT‖∞ / tol_T, ‖Δv‖∞ / (‖v‖∞ tol_v)); converged when below 1
    pub residual_norm: f64,

    /// Elapsed wall time since the record was created (seconds)
    pub wall_time: f64,
}

/// Holds the append-only convergence history of a run
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ConvergenceRecord {
    /// All entries in the order they were produced
    entries: Vec<ConvergenceEntry>,

    /// Reference instant for the wall times
    #[serde(skip)]
    started: Option<Instant>,
}

impl ConvergenceRecord {
    /// Allocates a new (empty) record and starts its clock
    pub fn new() -> Self {
        ConvergenceRecord {
            entries: Vec::new(),
            started: Some(Instant::now()),
        }
    }

    /// Appends a new entry and returns a copy of it
    pub fn push(&mut self, stage: Stage, iteration: usize, residual_norm: f64) -> ConvergenceEntry {
        let wall_time = match self.started {
            Some(instant) => instant.elapsed().as_secs_f64(),
            None => 0.0,
        };
        let entry = ConvergenceEntry {
            stage,
            iteration,
            residual_norm,
            wall_time,
        };
        self.entries.push(entry);
        entry
    }

    /// Appends all entries of another record (keeping their order)
    pub fn append(&mut self, other: &ConvergenceRecord) {
        self.entries.extend_from_slice(&other.entries);
    }

    /// Returns all entries
    pub fn entries(&self) -> &[ConvergenceEntry] {
        &self.entries
    }

    /// Returns the last entry, if any
    pub fn last(&self) -> Option<&ConvergenceEntry> {
        self.entries.last()
    }

    /// Returns the number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if there are no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the entries of a given stage
    pub fn of_stage(&self, stage: Stage) -> impl Iterator<Item = &ConvergenceEntry> {
        self.entries.iter().filter(move |e| e.stage == stage)
    }
}

impl PartialEq for ConvergenceRecord {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

/// Receives convergence entries as they are produced (progress reporting side channel)
pub trait ProgressSink {
    /// Handles a new entry
    fn on_entry(&mut self, entry: &ConvergenceEntry);
}

impl<F> ProgressSink for F
where
    F: FnMut(&ConvergenceEntry),
{
    fn on_entry(&mut self, entry: &ConvergenceEntry) {
        self(entry)
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
