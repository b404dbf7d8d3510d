use super::{MaterialParameters, SolverOptions};
use crate::mesh::{BoundaryTag, GeometrySpec};
use crate::StrError;
use serde::{Deserialize, Serialize};

/// Defines the kind of glass forming process
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProcessType {
    /// Drawing of a fiber from a heated preform (free surface; routed native)
    FiberDraw,

    /// Controlled cooling of a formed part
    Annealing,

    /// General forming (pressing, sagging, blowing)
    Forming,
}

/// Defines the commercial plan tier of the requester (does not affect routing)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlanTier {
    Free,
    Professional,
    Enterprise,
}

/// Defines a thermal boundary condition
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum ThermalBc {
    /// Prescribed temperature (K)
    Temperature(f64),

    /// Prescribed inward heat flux (W/m²)
    Flux(f64),

    /// Convection q = -h (T - T∞)
    Convection { h: f64, t_ambient: f64 },

    /// Grey-body radiation exchange q = -εσ(T⁴ - T∞⁴)
    Radiation { emissivity: f64, t_ambient: f64 },
}

/// Defines a flow boundary condition
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum FlowBc {
    /// v = 0
    NoSlip,

    /// Prescribed velocity components; None leaves the component free
    Velocity { vr: Option<f64>, vz: Option<f64> },

    /// Symmetry axis (v_r = 0)
    Axis,

    /// Stress-free surface moved by the ALE update, with optional surface tension γ (N/m)
    FreeSurface { surface_tension: f64 },

    /// Prescribed traction vector (Pa)
    Traction { tr: f64, tz: f64 },

    /// Prescribed normal pressure (Pa); the traction is -p·n
    Pressure(f64),
}

impl FlowBc {
    /// Returns the (v_r, v_z) components fixed by this condition
    pub fn prescribed(&self) -> (Option<f64>, Option<f64>) {
        match self {
            FlowBc::NoSlip => (Some(0.0), Some(0.0)),
            FlowBc::Velocity { vr, vz } => (*vr, *vz),
            FlowBc::Axis => (Some(0.0), None),
            _ => (None, None),
        }
    }
}

/// Holds the draw-process parameters of a fiber draw
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DrawParameters {
    /// Draw (fiber) speed at the downstream end (m/s)
    pub draw_speed: f64,

    /// Preform diameter (m)
    pub preform_diameter: f64,

    /// Fiber diameter (m)
    pub fiber_diameter: f64,
}

impl DrawParameters {
    /// Returns the feed speed required by mass conservation
    ///
    /// ```text
    /// v_feed = v_draw · (d_fiber / d_preform)²
    /// ```
    pub fn required_feed_speed(&self) -> f64 {
        let ratio = self.fiber_diameter / self.preform_diameter;
        self.draw_speed * ratio * ratio
    }

    /// Returns the flow boundary conditions of a neck-down drawn along +z
    ///
    /// The upstream face (Bottom) is fed at the feed speed and the downstream face (Top) is pulled at
    /// the draw speed (plug flow); the lateral surface is free.
    pub fn flow_bcs(&self) -> Vec<(BoundaryTag, FlowBc)> {
        vec![
            (
                BoundaryTag::Bottom,
                FlowBc::Velocity {
                    vr: Some(0.0),
                    vz: Some(self.required_feed_speed()),
                },
            ),
            (
                BoundaryTag::Top,
                FlowBc::Velocity {
                    vr: Some(0.0),
                    vz: Some(self.draw_speed),
                },
            ),
            (BoundaryTag::Axis, FlowBc::Axis),
            (BoundaryTag::Outer, FlowBc::FreeSurface { surface_tension: 0.0 }),
        ]
    }

    /// Validates all data
    pub fn validate(&self) -> Option<String> {
        if !(self.draw_speed > 0.0) {
            return Some(format!("draw_speed = {:?} is incorrect; it must be > 0.0", self.draw_speed));
        }
        if !(self.fiber_diameter > 0.0 && self.fiber_diameter <= self.preform_diameter) {
            return Some(format!(
                "fiber_diameter = {:?} is incorrect; it must be in (0.0, preform_diameter]",
                self.fiber_diameter
            ));
        }
        None
    }
}

/// Defines the cooling history used by the structural-relaxation integrator
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum CoolingSchedule {
    /// Constant cooling rate (K/s, positive means cooling) from each node's final temperature down to
    /// the room temperature, sampled every dt seconds
    ConstantRate { rate: f64, dt: f64 },

    /// Tabulated (time, temperature) history applied uniformly to all nodes
    Table { times: Vec<f64>, temperatures: Vec<f64> },
}

impl Default for CoolingSchedule {
    fn default() -> Self {
        CoolingSchedule::ConstantRate { rate: 1.0, dt: 1.0 }
    }
}

impl CoolingSchedule {
    /// Validates all data
    pub fn validate(&self) -> Option<String> {
        match self {
            CoolingSchedule::ConstantRate { rate, dt } => {
                if !(*rate > 0.0) {
                    return Some(format!("cooling rate = {:?} is incorrect; it must be > 0.0", rate));
                }
                if !(*dt > 0.0) {
                    return Some(format!("cooling dt = {:?} is incorrect; it must be > 0.0", dt));
                }
                if !(rate * dt).is_normal() {
                    return Some(format!(
                        "cooling rate·dt = {:?} is incorrect; it must be a normal number",
                        rate * dt
                    ));
                }
            }
            CoolingSchedule::Table { times, temperatures } => {
                if times.len() < 2 || times.len() != temperatures.len() {
                    return Some("cooling table must have at least two (time, temperature) pairs".to_string());
                }
                if times.windows(2).any(|w| !(w[1] > w[0])) {
                    return Some("cooling table times must be strictly increasing".to_string());
                }
            }
        }
        None
    }
}

/// Holds the process parameters of a simulation
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProcessParameters {
    /// Kind of process
    pub process_type: ProcessType,

    /// Plan tier of the requester
    pub plan_tier: PlanTier,

    /// Initial (and first guess) temperature (K)
    pub initial_temperature: f64,

    /// Room temperature: the reference of the residual stress (K)
    pub room_temperature: f64,

    /// Gravity acceleration vector (g_r, g_z) (m/s²)
    pub gravity: [f64; 2],

    /// Thermal boundary conditions; untagged edges are insulated
    pub thermal_bcs: Vec<(BoundaryTag, ThermalBc)>,

    /// Flow boundary conditions; empty means the flow is not solved
    pub flow_bcs: Vec<(BoundaryTag, FlowBc)>,

    /// Draw parameters (fiber draw only)
    pub draw: Option<DrawParameters>,

    /// Cooling history for the structural relaxation of steady and coupled runs
    #[serde(default)]
    pub cooling: CoolingSchedule,

    /// Computes the axial force on the downstream (Top) boundary
    #[serde(default)]
    pub fiber_tension: bool,
}

impl ProcessParameters {
    /// Allocates a new instance with insulated walls, no flow and no gravity
    pub fn new(process_type: ProcessType, initial_temperature: f64) -> Self {
        ProcessParameters {
            process_type,
            plan_tier: PlanTier::Free,
            initial_temperature,
            room_temperature: 293.15,
            gravity: [0.0, 0.0],
            thermal_bcs: Vec::new(),
            flow_bcs: Vec::new(),
            draw: None,
            cooling: CoolingSchedule::default(),
            fiber_tension: false,
        }
    }

    /// Returns true if the viscous flow has to be solved
    pub fn solves_flow(&self) -> bool {
        !self.flow_bcs.is_empty()
    }

    /// Returns true if a free surface (ALE update) exists
    pub fn has_free_surface(&self) -> bool {
        self.flow_bcs
            .iter()
            .any(|(_, bc)| matches!(bc, FlowBc::FreeSurface { .. }))
    }

    /// Sets the thermal boundary condition of a tag (replacing a previous one)
    pub fn set_thermal_bc(&mut self, tag: BoundaryTag, bc: ThermalBc) -> Result<&mut Self, StrError> {
        if let ThermalBc::Temperature(t) = bc {
            if !(t > 0.0) {
                return Err("prescribed temperature must be > 0.0 K");
            }
        }
        self.thermal_bcs.retain(|(t, _)| *t != tag);
        self.thermal_bcs.push((tag, bc));
        Ok(self)
    }

    /// Sets the flow boundary condition of a tag (replacing a previous one)
    pub fn set_flow_bc(&mut self, tag: BoundaryTag, bc: FlowBc) -> Result<&mut Self, StrError> {
        if let FlowBc::FreeSurface { surface_tension } = bc {
            if surface_tension < 0.0 {
                return Err("surface tension must be ≥ 0.0");
            }
        }
        self.flow_bcs.retain(|(t, _)| *t != tag);
        self.flow_bcs.push((tag, bc));
        Ok(self)
    }

    /// Sets the fiber-draw parameters and the corresponding flow boundary conditions
    pub fn set_draw(&mut self, draw: DrawParameters) -> Result<&mut Self, StrError> {
        if draw.validate().is_some() {
            return Err("invalid draw parameters");
        }
        self.flow_bcs = draw.flow_bcs();
        self.draw = Some(draw);
        Ok(self)
    }

    /// Validates all data
    pub fn validate(&self) -> Option<String> {
        if !(self.initial_temperature > 0.0) {
            return Some(format!(
                "initial_temperature = {:?} is incorrect; it must be > 0.0",
                self.initial_temperature
            ));
        }
        if !(self.room_temperature > 0.0) {
            return Some(format!(
                "room_temperature = {:?} is incorrect; it must be > 0.0",
                self.room_temperature
            ));
        }
        if self.gravity.iter().any(|g| !g.is_finite()) {
            return Some("gravity components must be finite".to_string());
        }
        for (tag, bc) in &self.thermal_bcs {
            let ok = match bc {
                ThermalBc::Temperature(t) => *t > 0.0,
                ThermalBc::Flux(q) => q.is_finite(),
                ThermalBc::Convection { h, t_ambient } => *h >= 0.0 && *t_ambient > 0.0,
                ThermalBc::Radiation { emissivity, t_ambient } => {
                    *emissivity >= 0.0 && *emissivity <= 1.0 && *t_ambient >= 0.0
                }
            };
            if !ok {
                return Some(format!("thermal boundary condition {:?} on {:?} is incorrect", bc, tag));
            }
        }
        if let Some(draw) = &self.draw {
            if let Some(message) = draw.validate() {
                return Some(message);
            }
        }
        if self.process_type == ProcessType::FiberDraw && self.draw.is_none() {
            return Some("fiber draw requires draw parameters".to_string());
        }
        self.cooling.validate()
    }
}

/// Defines what the run computes
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum SimulationType {
    /// Steady thermal-radiation solve only
    SteadyThermal,

    /// Coupled thermal-flow (Picard) solve, with ALE when a free surface exists
    Coupled,

    /// Transient thermal solve from the initial temperature up to t_final (s)
    Transient { t_final: f64 },
}

/// Holds everything needed to run a simulation
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Problem {
    /// Geometry (structured generator or explicit mesh)
    pub geometry: GeometrySpec,

    /// Glass composition
    pub material: MaterialParameters,

    /// Process parameters and boundary conditions
    pub process: ProcessParameters,

    /// Kind of simulation
    pub simulation_type: SimulationType,

    /// Solver tolerances and caps
    #[serde(default)]
    pub solver_options: SolverOptions,
}

impl Problem {
    /// Validates all data
    pub fn validate(&self) -> Option<String> {
        if let Some(message) = self.material.validate() {
            return Some(message);
        }
        if let Some(message) = self.process.validate() {
            return Some(message);
        }
        if let Some(message) = self.solver_options.validate() {
            return Some(message);
        }
        if let SimulationType::Transient { t_final } = self.simulation_type {
            if !(t_final > 0.0) {
                return Some(format!("t_final = {:?} is incorrect; it must be > 0.0", t_final));
            }
        }
        None // all good
    }

    /// Reads a JSON file containing a problem
    pub fn read_json<P>(full_path: &P) -> Result<Self, StrError>
    where
        P: AsRef<std::ffi::OsStr> + ?Sized,
    {
        let path = std::path::Path::new(full_path).to_path_buf();
        let input = std::fs::File::open(path).map_err(|_| "cannot open file")?;
        let buffered = std::io::BufReader::new(input);
        let problem = serde_json::from_reader(buffered).map_err(|_| "cannot parse JSON file")?;
        Ok(problem)
    }

    /// Writes a JSON file with the problem
    pub fn write_json<P>(&self, full_path: &P) -> Result<(), StrError>
    where
        P: AsRef<std::ffi::OsStr> + ?Sized,
    {
        let path = std::path::Path::new(full_path).to_path_buf();
        if let Some(p) = path.parent() {
            std::fs::create_dir_all(p).map_err(|_| "cannot create directory")?;
        }
        let mut file = std::fs::File::create(&path).map_err(|_| "cannot create file")?;
        serde_json::to_writer_pretty(&mut file, &self).map_err(|_| "cannot write file")?;
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
