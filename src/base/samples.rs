use super::{
    DrawParameters, MaterialParameters, ProcessParameters, ProcessType, Problem, SimulationType, SolverOptions,
    ThermalBc, VftBase,
};
use crate::mesh::{BoundaryTag, GeometrySpec};

/// Holds samples of material parameters and problems
pub struct Samples {}

impl Samples {
    /// Returns the parameters of a soda-lime silicate glass (SI units)
    ///
    /// The VFT triple uses the decadic (Fulcher) form: log₁₀ η = -3.5 + 4500 / (T - 520).
    pub fn soda_lime() -> MaterialParameters {
        MaterialParameters {
            eta_inf: f64::powf(10.0, -3.5), // Pa·s
            vft_a: 4500.0,                  // K
            vft_t0: 520.0,                  // K
            vft_base: VftBase::Decadic,
            density: 2500.0,            // kg/m³
            conductivity: 1.0,          // W/(m·K)
            specific_heat: 1000.0,      // J/(kg·K)
            thermal_expansion: 9e-6,    // 1/K
            young: 70e9,                // Pa
            poisson: 0.22,              // -
            absorption: Some(300.0),    // 1/m
            refractive_index: 1.5,      // -
            tau0: 1e-15,                // s
            tnm_x: 0.5,                 // -
        }
    }

    /// Returns the soda-lime parameters without radiative conduction (constant conductivity)
    pub fn soda_lime_opaque() -> MaterialParameters {
        MaterialParameters {
            absorption: None,
            ..Samples::soda_lime()
        }
    }

    /// Returns a steady conduction problem on a hollow cylinder
    ///
    /// Inner radius 10 mm at 500 K, outer radius 50 mm at 300 K, height 10 mm with insulated ends,
    /// and constant conductivity. The exact solution is T(r) = 500 - 200 ln(r/10mm) / ln 5.
    pub fn radial_conduction(nr: usize, nz: usize) -> Problem {
        let mut process = ProcessParameters::new(ProcessType::Forming, 400.0);
        process.thermal_bcs = vec![
            (BoundaryTag::Inner, ThermalBc::Temperature(500.0)),
            (BoundaryTag::Outer, ThermalBc::Temperature(300.0)),
        ];
        Problem {
            geometry: GeometrySpec::Cylinder {
                inner_radius: 0.01,
                outer_radius: 0.05,
                height: 0.01,
                nr,
                nz,
            },
            material: Samples::soda_lime_opaque(),
            process,
            simulation_type: SimulationType::SteadyThermal,
            solver_options: SolverOptions::default(),
        }
    }

    /// Returns the transient cooling of a solid cylinder (radius 10 mm, height 20 mm) from 900 K
    ///
    /// The lateral and top faces lose heat by convection to 300 K; the bottom face is insulated.
    pub fn annealing_cylinder(nr: usize, nz: usize) -> Problem {
        let mut process = ProcessParameters::new(ProcessType::Annealing, 900.0);
        let convection = ThermalBc::Convection {
            h: 50.0,
            t_ambient: 300.0,
        };
        process.thermal_bcs = vec![(BoundaryTag::Outer, convection), (BoundaryTag::Top, convection)];
        let mut solver_options = SolverOptions::default();
        solver_options.dt_initial = 5.0;
        solver_options.dt_max = 100.0;
        Problem {
            geometry: GeometrySpec::Cylinder {
                inner_radius: 0.0,
                outer_radius: 0.01,
                height: 0.02,
                nr,
                nz,
            },
            material: Samples::soda_lime(),
            process,
            simulation_type: SimulationType::Transient { t_final: 300.0 },
            solver_options,
        }
    }

    /// Returns an isothermal fiber draw (preform diameter 10 mm, fiber diameter 125 µm, draw speed 1 m/s)
    ///
    /// The neck-down region is 50 mm long and kept at 1900 K through the lateral surface. Its initial
    /// profile r(z) = R (r_f / R)^(z/L) is the isothermal one-dimensional draw profile, thus the free
    /// surface barely moves. The pseudo time step of the free-surface update is kept small so that
    /// the shape change per outer iteration stays below the Picard velocity tolerance.
    pub fn fiber_draw(nr: usize, nz: usize) -> Problem {
        let draw = DrawParameters {
            draw_speed: 1.0,
            preform_diameter: 0.01,
            fiber_diameter: 125e-6,
        };
        let mut process = ProcessParameters::new(ProcessType::FiberDraw, 1900.0);
        process.thermal_bcs = vec![(BoundaryTag::Outer, ThermalBc::Temperature(1900.0))];
        process.flow_bcs = draw.flow_bcs();
        process.draw = Some(draw);
        process.fiber_tension = true;
        let mut solver_options = SolverOptions::default();
        solver_options.ale_time_step = 1e-8;
        Problem {
            geometry: GeometrySpec::NeckDown {
                preform_radius: 5e-3,
                fiber_radius: 62.5e-6,
                length: 0.05,
                nr,
                nz,
            },
            material: Samples::soda_lime(),
            process,
            simulation_type: SimulationType::Coupled,
            solver_options,
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
