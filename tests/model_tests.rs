//! Model-level tests: the extended equations reduce to the two-pool v1 model
//! and trajectories stay physical.

use accd_sim::{
    config::{resolve_parameters, Mode, ModelParameters, ParameterOverrides},
    kinetics::StressProfile,
    model::{AccEthyleneModel, Scenario, StateVariable, N_STATES},
    solver::{output_times, solve_scenario, DormandPrinceIntegrator, SolverConfig},
};

/// v1 right-hand side: gradient export, rhizosphere ACCD, no extensions
fn v1_rhs(p: &ModelParameters, bacteria: bool, y: &[f64], dy: &mut [f64]) {
    let k = &p.kinetics;
    let ap = y[0].max(0.0);
    let ar = y[1].max(0.0);
    let e = y[2].max(0.0);
    let xb = if bacteria { y[3].max(0.0) } else { 0.0 };

    let export = k.k_export_per_h * (ap - ar / k.plant_root_volume_ratio).max(0.0);
    let accd = if ar > 0.0 {
        xb * k.vmax_accd_mM_per_g_h * ar / (k.km_accd_mM + ar)
    } else {
        0.0
    };
    let growth = if ar > 0.0 {
        k.mu_max_per_h * ar / (k.ks_mM + ar) * xb
    } else {
        0.0
    };
    let ke_n = k.ethylene_ic50_uM.powf(k.growth_hill_n);
    let inhibition = ke_n / (ke_n + e.powf(k.growth_hill_n));

    dy[0] = k.v_acs_mM_per_h * k.stress_factor - k.k_aco_per_h * ap - export;
    dy[1] = export * k.plant_root_volume_ratio - accd - k.k_loss_per_h * ar;
    dy[2] = k.ethylene_yield * k.k_aco_per_h * ap * k.plant_air_volume_ratio
        - (k.k_vent_per_h + k.k_scrub_per_h) * e;
    dy[3] = if bacteria {
        growth - k.decay_per_h * xb
    } else {
        0.0
    };
    dy[4] = k.growth_rate_per_h * inhibition;
}

#[test]
fn test_extensions_off_reproduce_v1_model() {
    let params = ModelParameters::default();
    let times = output_times(params.settings.t_end_h, 241);

    for scenario in [Scenario::Control, Scenario::Treatment] {
        let model = AccEthyleneModel::new(&params, StressProfile::Constant, scenario);
        let y0 = model.initial_state();

        let mut engine_integrator = DormandPrinceIntegrator::new(N_STATES, SolverConfig::default());
        let engine = engine_integrator
            .integrate(&y0, &times, |t, y, dy| model.derivatives(t, y, dy), None)
            .unwrap();

        let bacteria = scenario.bacteria_enabled();
        let mut v1_integrator = DormandPrinceIntegrator::new(N_STATES, SolverConfig::default());
        let v1 = v1_integrator
            .integrate(&y0, &times, |_, y, dy| v1_rhs(&params, bacteria, y, dy), None)
            .unwrap();

        for (i, (a, b)) in engine.iter().zip(&v1).enumerate() {
            for var in StateVariable::ALL {
                let j = var.index();
                let scale = a[j].abs().max(b[j].abs());
                assert!(
                    (a[j] - b[j]).abs() <= 1e-6 * scale + 1e-10,
                    "{} {} diverges from v1 at sample {}: {} vs {}",
                    scenario,
                    var.wire_name(),
                    i,
                    a[j],
                    b[j]
                );
            }
        }
    }
}

#[test]
fn test_states_stay_non_negative() {
    let base = ModelParameters::default();
    let profiles = [
        StressProfile::Constant,
        StressProfile::Step { onset_h: 24.0 },
        StressProfile::Pulse {
            onset_h: 12.0,
            duration_h: 6.0,
        },
        StressProfile::Ramp {
            onset_h: 6.0,
            ramp_h: 48.0,
        },
    ];

    for mode in [Mode::Baseline, Mode::HighExport, Mode::Endophytic, Mode::Feedback] {
        let mut overrides = ParameterOverrides::new();
        overrides.insert("aco_fb_enable", 1.0).insert("n_points", 241.0);
        let params = resolve_parameters(&base, mode, &overrides).unwrap();

        for profile in profiles {
            for scenario in [Scenario::Control, Scenario::Treatment] {
                let model = AccEthyleneModel::new(&params, profile, scenario);
                let traj = solve_scenario(&model, &SolverConfig::default(), None).unwrap();
                for var in [
                    StateVariable::PlantAcc,
                    StateVariable::RootAcc,
                    StateVariable::Ethylene,
                    StateVariable::Biomass,
                ] {
                    let min = traj.min_value(var).unwrap();
                    assert!(
                        min >= -1e-9,
                        "{} went negative ({}) in {} / {} / {}",
                        var.wire_name(),
                        min,
                        mode,
                        profile.kind(),
                        scenario
                    );
                }
            }
        }
    }
}

#[test]
fn test_no_inoculum_means_treatment_equals_control() {
    let mut params = ModelParameters::default();
    params.initial.root_acc_mM = 0.0;
    params.initial.biomass_g_per_L = 0.0;
    params.mechanisms.direct_fraction = 0.3;
    params.settings.n_points = 121;

    let control = AccEthyleneModel::new(&params, StressProfile::Constant, Scenario::Control);
    let treatment = AccEthyleneModel::new(&params, StressProfile::Constant, Scenario::Treatment);
    let config = SolverConfig::default();
    let a = solve_scenario(&control, &config, None).unwrap();
    let b = solve_scenario(&treatment, &config, None).unwrap();

    for var in StateVariable::ALL {
        assert_eq!(
            a.series(var),
            b.series(var),
            "{} differs without bacteria",
            var.wire_name()
        );
    }
}

#[test]
fn test_control_reaches_analytic_ethylene_balance() {
    // Without bacteria, once Ap and Ce have settled: Ce = Y k_ACO Ap Vp_Vair / (k_vent + k_scrub)
    let params = ModelParameters::default();
    let model = AccEthyleneModel::new(&params, StressProfile::Constant, Scenario::Control);
    let traj = solve_scenario(&model, &SolverConfig::default(), None).unwrap();

    let k = &params.kinetics;
    let ap = traj.final_value(StateVariable::PlantAcc).unwrap();
    let ce = traj.final_value(StateVariable::Ethylene).unwrap();
    let expected = k.ethylene_yield * k.k_aco_per_h * ap * k.plant_air_volume_ratio
        / (k.k_vent_per_h + k.k_scrub_per_h);
    assert!(
        (ce - expected).abs() / expected < 0.01,
        "ethylene {} should sit at its quasi-steady value {}",
        ce,
        expected
    );
}
