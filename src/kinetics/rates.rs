//! Individual fluxes of the ACC / ethylene / ACCD model.
//!
//! Each function is a pure function of the parameters, the (non-negative)
//! state and, where relevant, time. Units: mM/h for ACC fluxes, µM/h for
//! ethylene, g/(L·h) for biomass, 1/h for growth index.

use super::enzyme::{hill_inhibition, hill_repression, michaelis_menten, monod};
use super::stress::StressProfile;
use crate::config::ModelParameters;
use crate::model::ModelState;

/// ACS feedback factor f_fbACS(Ce); identically 1 when disabled
#[inline]
pub fn acs_feedback(p: &ModelParameters, ethylene_uM: f64) -> f64 {
    let m = &p.mechanisms;
    if m.acs_feedback_enabled {
        hill_repression(ethylene_uM, m.acs_feedback_k_uM, m.acs_feedback_n)
    } else {
        1.0
    }
}

/// ACO feedback factor f_fbACO(Ce); identically 1 when disabled
#[inline]
pub fn aco_feedback(p: &ModelParameters, ethylene_uM: f64) -> f64 {
    let m = &p.mechanisms;
    if m.aco_feedback_enabled {
        hill_repression(ethylene_uM, m.aco_feedback_k_uM, m.aco_feedback_n)
    } else {
        1.0
    }
}

/// ACC synthesis: V_ACS,max · f_stress(t) · f_fbACS(Ce)
#[inline]
pub fn acc_synthesis(p: &ModelParameters, stress: &StressProfile, t_h: f64, s: &ModelState) -> f64 {
    p.kinetics.v_acs_mM_per_h
        * stress.multiplier(p.kinetics.stress_factor, t_h)
        * acs_feedback(p, s.ethylene_uM)
}

/// Effective ACO rate constant k_ACO · f_fbACO(Ce)
#[inline]
pub fn effective_k_aco(p: &ModelParameters, s: &ModelState) -> f64 {
    p.kinetics.k_aco_per_h * aco_feedback(p, s.ethylene_uM)
}

/// ACC oxidation to ethylene: k_ACO,eff · Ap
#[inline]
pub fn acc_oxidation(p: &ModelParameters, s: &ModelState) -> f64 {
    effective_k_aco(p, s) * s.plant_acc_mM
}

/// Gradient-driven export: k_exp · max(Ap − Ar/(Vp/Vr), 0)
///
/// Ar/(Vp/Vr) is the root-zone concentration expressed on the plant side.
/// There is no back-flux from root zone to plant.
#[inline]
pub fn acc_export(p: &ModelParameters, s: &ModelState) -> f64 {
    let ratio = p.kinetics.plant_root_volume_ratio;
    let root_equivalent = if ratio > 0.0 {
        s.root_acc_mM / ratio
    } else {
        0.0
    };
    p.kinetics.k_export_per_h * (s.plant_acc_mM - root_equivalent).max(0.0)
}

/// Endophytic ACCD acting directly on plant ACC, using f_direct · Xb
#[inline]
pub fn direct_sink(p: &ModelParameters, s: &ModelState) -> f64 {
    let m = &p.mechanisms;
    if m.direct_fraction <= 0.0 {
        return 0.0;
    }
    let biomass = m.direct_fraction * s.biomass_g_per_L;
    biomass * michaelis_menten(m.vmax_direct_mM_per_g_h, m.km_direct_mM, s.plant_acc_mM)
}

/// Rhizosphere ACCD uptake using (1 − f_direct) · Xb
#[inline]
pub fn rhizosphere_uptake(p: &ModelParameters, s: &ModelState) -> f64 {
    let biomass = (1.0 - p.mechanisms.direct_fraction) * s.biomass_g_per_L;
    biomass * michaelis_menten(p.kinetics.vmax_accd_mM_per_g_h, p.kinetics.km_accd_mM, s.root_acc_mM)
}

/// Non-enzymatic root-zone ACC loss: k_loss · Ar
#[inline]
pub fn root_loss(p: &ModelParameters, s: &ModelState) -> f64 {
    p.kinetics.k_loss_per_h * s.root_acc_mM
}

/// Monod growth on root-zone ACC: μ(Ar) · Xb
#[inline]
pub fn bacterial_growth(p: &ModelParameters, s: &ModelState) -> f64 {
    monod(p.kinetics.mu_max_per_h, p.kinetics.ks_mM, s.root_acc_mM) * s.biomass_g_per_L
}

/// First-order biomass decay: k_d · Xb
#[inline]
pub fn bacterial_decay(p: &ModelParameters, s: &ModelState) -> f64 {
    p.kinetics.decay_per_h * s.biomass_g_per_L
}

/// Ethylene appearance in air: Y_eth · v_ACO · (Vp/Vair)
#[inline]
pub fn ethylene_production(p: &ModelParameters, oxidation: f64) -> f64 {
    p.kinetics.ethylene_yield * oxidation * p.kinetics.plant_air_volume_ratio
}

/// Ventilation / leakage loss: k_vent · Ce
#[inline]
pub fn ethylene_ventilation(p: &ModelParameters, s: &ModelState) -> f64 {
    p.kinetics.k_vent_per_h * s.ethylene_uM
}

/// Adsorption / scrubber loss: k_scrub · Ce
#[inline]
pub fn ethylene_scrubbing(p: &ModelParameters, s: &ModelState) -> f64 {
    p.kinetics.k_scrub_per_h * s.ethylene_uM
}

/// Ethylene growth-inhibition factor K_E^n / (K_E^n + Ce^n)
#[inline]
pub fn growth_inhibition(p: &ModelParameters, s: &ModelState) -> f64 {
    hill_inhibition(s.ethylene_uM, p.kinetics.ethylene_ic50_uM, p.kinetics.growth_hill_n)
}

/// Plant growth rate: r_g · inhibition
#[inline]
pub fn plant_growth(p: &ModelParameters, s: &ModelState) -> f64 {
    p.kinetics.growth_rate_per_h * growth_inhibition(p, s)
}
