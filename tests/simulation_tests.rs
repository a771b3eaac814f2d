//! End-to-end scenario tests over the default 120 h horizon.
//!
//! Validation targets:
//! | Scenario | Expectation |
//! |----------|-------------|
//! | baseline | no active mechanisms, export fraction 25%, peak reduction 15-25% |
//! | high_export | final ethylene not above baseline |
//! | endophytic | peak reduction strictly above baseline |
//! | K_m sweep | final root-zone ACC non-decreasing in K_m_ACCD |
//! | custom | explicit full map reproduces any mode |

use std::time::Duration;

use accd_sim::{
    analysis::Mechanism,
    config::{EngineConfig, Mode, ParameterOverrides},
    error::SimulationError,
    model::StateVariable,
    simulation::{SimulationEngine, SimulationOutcome, SimulationRequest},
};

fn run(request: &SimulationRequest) -> SimulationOutcome {
    SimulationEngine::default()
        .run(request)
        .unwrap_or_else(|e| panic!("simulation failed: {}", e))
}

// ============================================================================
// Mode scenarios
// ============================================================================

#[test]
fn test_baseline_scenario() {
    let outcome = run(&SimulationRequest::new(Mode::Baseline));
    let kpis = &outcome.kpis;

    assert!(kpis.active_mechanisms.is_empty(), "got {:?}", kpis.active_mechanisms);

    let export = kpis.export_fraction_pct.unwrap();
    assert!((export - 25.0).abs() < 1e-9, "export fraction should be 25%, got {}", export);

    let reduction = kpis.reduction_peak_pct.unwrap();
    assert!(
        (15.0..=25.0).contains(&reduction),
        "baseline peak reduction should be 15-25%, got {:.2}%",
        reduction
    );

    assert_eq!(outcome.control.len(), 2000);
    assert_eq!(outcome.treatment.len(), 2000);
    assert!(kpis.growth_accd > kpis.growth_ctrl, "ACCD should relieve growth inhibition");
}

#[test]
fn test_high_export_lowers_final_ethylene() {
    let baseline = run(&SimulationRequest::new(Mode::Baseline));
    let high = run(&SimulationRequest::new(Mode::HighExport));

    assert_eq!(high.kpis.active_mechanisms, vec![Mechanism::HighExport]);
    assert!(
        high.kpis.ss_accd_uM <= baseline.kpis.ss_accd_uM,
        "high_export final ethylene {} should not exceed baseline {}",
        high.kpis.ss_accd_uM,
        baseline.kpis.ss_accd_uM
    );
    assert!(high.kpis.reduction_peak_pct.unwrap() > baseline.kpis.reduction_peak_pct.unwrap());
}

#[test]
fn test_endophytic_beats_baseline() {
    let baseline = run(&SimulationRequest::new(Mode::Baseline));
    let endophytic = run(&SimulationRequest::new(Mode::Endophytic));

    assert!(endophytic.kpis.active_mechanisms.contains(&Mechanism::Endophytic));
    let base = baseline.kpis.reduction_peak_pct.unwrap();
    let endo = endophytic.kpis.reduction_peak_pct.unwrap();
    assert!(
        endo > base,
        "endophytic peak reduction {:.2}% should exceed baseline {:.2}%",
        endo,
        base
    );
    // The control run has no bacteria, so the mode cannot change it
    assert_eq!(baseline.control, endophytic.control);
}

#[test]
fn test_feedback_mode_lowers_control_ethylene() {
    let baseline = run(&SimulationRequest::new(Mode::Baseline));
    let feedback = run(&SimulationRequest::new(Mode::Feedback));

    assert_eq!(feedback.kpis.active_mechanisms, vec![Mechanism::AcsFeedback]);
    assert!(feedback.kpis.peak_ctrl_uM < baseline.kpis.peak_ctrl_uM);
}

#[test]
fn test_root_acc_non_decreasing_in_km() {
    let mut last = f64::NEG_INFINITY;
    for km in [0.5, 1.5, 3.0, 5.0, 10.0] {
        let request = SimulationRequest::new(Mode::Baseline)
            .with_override("K_m_ACCD", km)
            .with_override("n_points", 241.0);
        let outcome = run(&request);
        let ar = outcome.treatment.final_value(StateVariable::RootAcc).unwrap();
        assert!(
            ar >= last,
            "final Ar should not fall as K_m_ACCD rises: K_m = {} gives {} after {}",
            km,
            ar,
            last
        );
        last = ar;
    }
}

// ============================================================================
// Parameter resolution
// ============================================================================

#[test]
fn test_custom_with_full_map_matches_every_mode() {
    for mode in Mode::ALL {
        let mut overrides = ParameterOverrides::new();
        overrides
            .insert("k_exp", 0.22)
            .insert("f_direct", 0.15)
            .insert("fb_enable", 1.0)
            .insert("n_points", 121.0);
        let resolved = SimulationEngine::default()
            .resolve(&SimulationRequest {
                mode,
                overrides,
                ..Default::default()
            })
            .unwrap();

        let full = ParameterOverrides::from_parameters(&resolved);
        for other in Mode::ALL {
            let request = SimulationRequest {
                mode: other,
                overrides: full.clone(),
                ..Default::default()
            };
            let again = SimulationEngine::default().resolve(&request).unwrap();
            assert_eq!(again, resolved, "full map under {} differs from {}", other, mode);
        }
    }
}

#[test]
fn test_overrides_win_over_mode_preset() {
    let request = SimulationRequest::new(Mode::HighExport)
        .with_override("k_exp", 0.05)
        .with_override("n_points", 121.0);
    let outcome = run(&request);
    assert_eq!(outcome.params.kinetics.k_export_per_h, 0.05);
    assert!(!outcome.kpis.active_mechanisms.contains(&Mechanism::HighExport));
}

// ============================================================================
// Failures
// ============================================================================

#[test]
fn test_validation_errors_name_the_field() {
    let engine = SimulationEngine::default();
    let cases = [
        ("k_ACO", -0.1),
        ("f_direct", 1.5),
        ("fb_enable", 0.5),
        ("n_points", 1.0),
        ("n_points", 10.5),
        ("t_end", 0.0),
        ("n_fb", 0.0),
        ("V_max_ACCD", f64::INFINITY),
    ];
    for (key, value) in cases {
        let request = SimulationRequest::new(Mode::Baseline).with_override(key, value);
        let err = engine.run(&request).unwrap_err();
        assert!(err.is_validation(), "{} = {} should be a validation error", key, value);
        assert_eq!(err.field(), Some(key), "error should name {}: {}", key, err);
    }
}

#[test]
fn test_timeout_aborts_without_partial_output() {
    let config = EngineConfig::default().with_timeout(Duration::from_millis(0));
    let request = SimulationRequest::new(Mode::Baseline).with_override("t_end", 5000.0);
    let err = SimulationEngine::new(config).run(&request).unwrap_err();
    assert_eq!(err, SimulationError::Timeout { timeout_ms: 0 });
    assert_eq!(err.status_code(), 504);
}

#[test]
fn test_runs_are_deterministic() {
    let request = SimulationRequest::new(Mode::Endophytic).with_override("n_points", 301.0);
    let a = run(&request);
    let b = run(&request);
    assert_eq!(a.control, b.control);
    assert_eq!(a.treatment, b.treatment);
    assert_eq!(a.kpis, b.kpis);
}
