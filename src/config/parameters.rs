//! Model parameter set with literature-informed defaults.
//!
//! Every parameter has a wire name (the key used in JSON requests, responses
//! and parameter files), a unit and a one-line description. Parameters are
//! grouped the same way the model equations use them, but the wire format is
//! flat: `{"v_ACS": 0.05, "k_ACO": 0.3, ...}`.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{SimResult, SimulationError};

/// Upper bound on output samples per trajectory
pub const MAX_OUTPUT_POINTS: usize = 1_000_000;

/// Top-level parameter container
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ModelParameters {
    /// Plant ACC, ethylene, bacterial and growth kinetics
    #[serde(flatten)]
    pub kinetics: KineticParameters,
    /// Optional v2 mechanisms (direct sink, feedback repression)
    #[serde(flatten)]
    pub mechanisms: MechanismParameters,
    /// Initial values of the five state variables
    #[serde(flatten)]
    pub initial: InitialConditions,
    /// Horizon and output resolution
    #[serde(flatten)]
    pub settings: SimulationSettings,
}

/// Core kinetic parameters (Eq 1-5)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KineticParameters {
    /// Max ACC synthesis rate by ACS (mM/h)
    #[serde(rename = "v_ACS")]
    pub v_acs_mM_per_h: f64,

    /// Stress multiplier on ACS (1 = unstressed, 3-5 = severe)
    #[serde(rename = "f_stress")]
    pub stress_factor: f64,

    /// ACC oxidase first-order rate constant (1/h)
    #[serde(rename = "k_ACO")]
    pub k_aco_per_h: f64,

    /// ACC export permeability, plant to root zone (1/h)
    #[serde(rename = "k_exp")]
    pub k_export_per_h: f64,

    /// Ethylene yield per ACC oxidised (mol/mol)
    #[serde(rename = "Y_eth")]
    pub ethylene_yield: f64,

    /// Rhizosphere ACCD Vmax per gram biomass (mM/(g·h))
    /// Reference: 603-1350 nmol/mg/h for characterised PGPR strains
    #[serde(rename = "V_max_ACCD")]
    pub vmax_accd_mM_per_g_h: f64,

    /// Rhizosphere ACCD Michaelis constant (mM)
    /// Reference: 1.5-17.4 mM at pH 8.5; low end for high-affinity strains
    #[serde(rename = "K_m_ACCD")]
    pub km_accd_mM: f64,

    /// Maximum bacterial specific growth rate (1/h)
    #[serde(rename = "mu_max")]
    pub mu_max_per_h: f64,

    /// Monod half-saturation on ACC as sole N source (mM)
    #[serde(rename = "K_s")]
    pub ks_mM: f64,

    /// Bacterial decay / maintenance rate (1/h)
    #[serde(rename = "k_d")]
    pub decay_per_h: f64,

    /// Plant tissue volume / root-zone volume
    #[serde(rename = "Vp_Vr")]
    pub plant_root_volume_ratio: f64,

    /// Plant tissue volume / greenhouse air volume
    #[serde(rename = "Vp_Vair")]
    pub plant_air_volume_ratio: f64,

    /// Ventilation / leakage rate (1/h)
    #[serde(rename = "k_vent")]
    pub k_vent_per_h: f64,

    /// Adsorption or chemical scrubbing rate (1/h), 0 = no scrubber
    #[serde(rename = "k_scrub")]
    pub k_scrub_per_h: f64,

    /// Non-enzymatic root-zone ACC loss (1/h)
    #[serde(rename = "k_loss")]
    pub k_loss_per_h: f64,

    /// Intrinsic plant growth rate (1/h)
    #[serde(rename = "r_g")]
    pub growth_rate_per_h: f64,

    /// Ethylene concentration giving 50% growth inhibition (µM)
    #[serde(rename = "K_E")]
    pub ethylene_ic50_uM: f64,

    /// Cooperativity of the ethylene growth response
    #[serde(rename = "n_hill")]
    pub growth_hill_n: f64,
}

impl Default for KineticParameters {
    fn default() -> Self {
        Self {
            v_acs_mM_per_h: 0.05,
            stress_factor: 3.0,
            k_aco_per_h: 0.30,
            k_export_per_h: 0.10,
            ethylene_yield: 1.0,

            vmax_accd_mM_per_g_h: 1.0,
            km_accd_mM: 1.5,

            mu_max_per_h: 0.15,
            ks_mM: 0.1,
            decay_per_h: 0.01,

            plant_root_volume_ratio: 0.10,
            plant_air_volume_ratio: 0.001,
            k_vent_per_h: 0.50,
            k_scrub_per_h: 0.0,
            k_loss_per_h: 0.01,

            growth_rate_per_h: 0.02,
            ethylene_ic50_uM: 0.0001,
            growth_hill_n: 2.0,
        }
    }
}

/// Mechanism toggles added in model v2
///
/// All of these are data: the right-hand side reads them uniformly, so
/// disabling a mechanism is the same as never having added it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MechanismParameters {
    /// Fraction of biomass acting endophytically on plant ACC, in [0, 1]
    #[serde(rename = "f_direct")]
    pub direct_fraction: f64,

    /// Direct-sink ACCD Vmax (mM/(g·h))
    #[serde(rename = "V_max_ACCD_direct")]
    pub vmax_direct_mM_per_g_h: f64,

    /// Direct-sink ACCD Michaelis constant (mM)
    #[serde(rename = "K_m_ACCD_direct")]
    pub km_direct_mM: f64,

    /// Ethylene feedback repression of ACS
    #[serde(rename = "fb_enable", with = "flag")]
    pub acs_feedback_enabled: bool,

    /// ACS repression constant (µM ethylene)
    #[serde(rename = "K_fb")]
    pub acs_feedback_k_uM: f64,

    /// ACS repression Hill coefficient
    #[serde(rename = "n_fb")]
    pub acs_feedback_n: f64,

    /// Ethylene feedback repression of ACO
    #[serde(rename = "aco_fb_enable", with = "flag")]
    pub aco_feedback_enabled: bool,

    /// ACO repression constant (µM ethylene)
    #[serde(rename = "K_fb_aco")]
    pub aco_feedback_k_uM: f64,

    /// ACO repression Hill coefficient
    #[serde(rename = "n_fb_aco")]
    pub aco_feedback_n: f64,
}

impl Default for MechanismParameters {
    fn default() -> Self {
        Self {
            direct_fraction: 0.0,
            vmax_direct_mM_per_g_h: 1.0,
            km_direct_mM: 1.5,
            acs_feedback_enabled: false,
            acs_feedback_k_uM: 0.0002,
            acs_feedback_n: 2.0,
            aco_feedback_enabled: false,
            aco_feedback_k_uM: 0.0002,
            aco_feedback_n: 2.0,
        }
    }
}

/// Initial state values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InitialConditions {
    /// Plant intracellular ACC (mM)
    #[serde(rename = "A_p0")]
    pub plant_acc_mM: f64,
    /// Root-zone ACC (mM)
    #[serde(rename = "A_r0")]
    pub root_acc_mM: f64,
    /// Gas-phase ethylene (µM)
    #[serde(rename = "E0")]
    pub ethylene_uM: f64,
    /// Bacterial inoculum, treatment scenario only (g DCW/L)
    #[serde(rename = "X_b0")]
    pub biomass_g_per_L: f64,
    /// Plant growth index
    #[serde(rename = "G0")]
    pub growth_index: f64,
}

impl Default for InitialConditions {
    fn default() -> Self {
        Self {
            plant_acc_mM: 0.01,
            root_acc_mM: 0.0,
            ethylene_uM: 0.0,
            biomass_g_per_L: 0.5,
            growth_index: 1.0,
        }
    }
}

/// Horizon and output resolution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationSettings {
    /// Simulated duration (h)
    #[serde(rename = "t_end")]
    pub t_end_h: f64,
    /// Number of evenly spaced output samples, including t=0 and t=t_end
    #[serde(rename = "n_points")]
    pub n_points: usize,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            t_end_h: 120.0,
            n_points: 2000,
        }
    }
}

/// How a parameter is stored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterKind {
    /// Real-valued, non-negative
    Real,
    /// 0/1 switch
    Flag,
    /// Integer count
    Count,
}

/// Catalog entry for one parameter
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ParameterSpec {
    pub key: &'static str,
    pub unit: &'static str,
    pub description: &'static str,
    pub kind: ParameterKind,
}

/// Conversion between stored field types and the numeric wire value
trait ParameterValue: Sized {
    const KIND: ParameterKind;
    fn to_wire(&self) -> f64;
    fn from_wire(key: &str, value: f64) -> SimResult<Self>;
}

impl ParameterValue for f64 {
    const KIND: ParameterKind = ParameterKind::Real;

    fn to_wire(&self) -> f64 {
        *self
    }

    fn from_wire(key: &str, value: f64) -> SimResult<Self> {
        if !value.is_finite() {
            return Err(SimulationError::invalid(key, "must be a finite number"));
        }
        Ok(value)
    }
}

impl ParameterValue for bool {
    const KIND: ParameterKind = ParameterKind::Flag;

    fn to_wire(&self) -> f64 {
        if *self {
            1.0
        } else {
            0.0
        }
    }

    fn from_wire(key: &str, value: f64) -> SimResult<Self> {
        if value == 0.0 {
            Ok(false)
        } else if value == 1.0 {
            Ok(true)
        } else {
            Err(SimulationError::invalid(key, format!("flag must be 0 or 1, got {value}")))
        }
    }
}

impl ParameterValue for usize {
    const KIND: ParameterKind = ParameterKind::Count;

    fn to_wire(&self) -> f64 {
        *self as f64
    }

    fn from_wire(key: &str, value: f64) -> SimResult<Self> {
        if !value.is_finite() || value < 0.0 || value.fract() != 0.0 {
            return Err(SimulationError::invalid(
                key,
                format!("must be a non-negative integer, got {value}"),
            ));
        }
        if value > MAX_OUTPUT_POINTS as f64 {
            return Err(SimulationError::invalid(
                key,
                format!("must not exceed {MAX_OUTPUT_POINTS}"),
            ));
        }
        Ok(value as usize)
    }
}

/// Generates the catalog and name-based accessors from one table so the
/// wire names, struct fields and metadata cannot drift apart.
macro_rules! parameter_catalog {
    ($( $key:literal => $group:ident . $field:ident : $ty:ty, $unit:literal, $desc:literal; )*) => {
        /// Every parameter, in canonical order
        pub const PARAMETER_SPECS: &[ParameterSpec] = &[
            $( ParameterSpec {
                key: $key,
                unit: $unit,
                description: $desc,
                kind: <$ty as ParameterValue>::KIND,
            }, )*
        ];

        impl ModelParameters {
            /// Read a parameter by wire name
            pub fn get(&self, key: &str) -> Option<f64> {
                match key {
                    $( $key => Some(self.$group.$field.to_wire()), )*
                    _ => None,
                }
            }

            /// Write a parameter by wire name
            ///
            /// Checks the value's representation (finite, flag 0/1, integral
            /// count). Range checks happen in [`ModelParameters::validate`].
            pub fn set(&mut self, key: &str, value: f64) -> SimResult<()> {
                match key {
                    $( $key => {
                        self.$group.$field = <$ty as ParameterValue>::from_wire(key, value)?;
                        Ok(())
                    } )*
                    _ => Err(SimulationError::UnknownParameter(key.to_string())),
                }
            }
        }
    };
}

parameter_catalog! {
    "v_ACS" => kinetics.v_acs_mM_per_h: f64, "mM/h", "Max ACC synthesis rate";
    "f_stress" => kinetics.stress_factor: f64, "-", "Stress factor";
    "k_ACO" => kinetics.k_aco_per_h: f64, "1/h", "ACC oxidase rate";
    "k_exp" => kinetics.k_export_per_h: f64, "1/h", "ACC export rate";
    "Y_eth" => kinetics.ethylene_yield: f64, "mol/mol", "Ethylene yield";
    "V_max_ACCD" => kinetics.vmax_accd_mM_per_g_h: f64, "mM/(g*h)", "Max ACCD rate";
    "K_m_ACCD" => kinetics.km_accd_mM: f64, "mM", "ACCD Km";
    "mu_max" => kinetics.mu_max_per_h: f64, "1/h", "Max growth rate";
    "K_s" => kinetics.ks_mM: f64, "mM", "Monod Ks";
    "k_d" => kinetics.decay_per_h: f64, "1/h", "Decay rate";
    "Vp_Vr" => kinetics.plant_root_volume_ratio: f64, "ratio", "Plant/root vol";
    "Vp_Vair" => kinetics.plant_air_volume_ratio: f64, "ratio", "Plant/air vol";
    "k_vent" => kinetics.k_vent_per_h: f64, "1/h", "Ventilation rate";
    "k_scrub" => kinetics.k_scrub_per_h: f64, "1/h", "Scrubber rate";
    "k_loss" => kinetics.k_loss_per_h: f64, "1/h", "ACC loss rate";
    "r_g" => kinetics.growth_rate_per_h: f64, "1/h", "Growth rate";
    "K_E" => kinetics.ethylene_ic50_uM: f64, "uM", "Ethylene IC50";
    "n_hill" => kinetics.growth_hill_n: f64, "-", "Hill coefficient";
    "f_direct" => mechanisms.direct_fraction: f64, "-", "Direct (endophytic) biomass fraction";
    "V_max_ACCD_direct" => mechanisms.vmax_direct_mM_per_g_h: f64, "mM/(g*h)", "Direct-sink ACCD Vmax";
    "K_m_ACCD_direct" => mechanisms.km_direct_mM: f64, "mM", "Direct-sink ACCD Km";
    "fb_enable" => mechanisms.acs_feedback_enabled: bool, "flag", "ACS feedback on/off";
    "K_fb" => mechanisms.acs_feedback_k_uM: f64, "uM", "ACS repression constant";
    "n_fb" => mechanisms.acs_feedback_n: f64, "-", "ACS repression Hill coefficient";
    "aco_fb_enable" => mechanisms.aco_feedback_enabled: bool, "flag", "ACO feedback on/off";
    "K_fb_aco" => mechanisms.aco_feedback_k_uM: f64, "uM", "ACO repression constant";
    "n_fb_aco" => mechanisms.aco_feedback_n: f64, "-", "ACO repression Hill coefficient";
    "A_p0" => initial.plant_acc_mM: f64, "mM", "Initial plant ACC";
    "A_r0" => initial.root_acc_mM: f64, "mM", "Initial root-zone ACC";
    "E0" => initial.ethylene_uM: f64, "uM", "Initial ethylene";
    "X_b0" => initial.biomass_g_per_L: f64, "g/L", "Initial bacterial loading";
    "G0" => initial.growth_index: f64, "-", "Initial growth index";
    "t_end" => settings.t_end_h: f64, "h", "Simulation horizon";
    "n_points" => settings.n_points: usize, "-", "Output points";
}

/// Look up catalog metadata for a wire name
pub fn parameter_spec(key: &str) -> Option<&'static ParameterSpec> {
    PARAMETER_SPECS.iter().find(|spec| spec.key == key)
}

impl ModelParameters {
    /// Load a flat JSON parameter file on top of the defaults, or fall back
    /// to the defaults if the file is missing or invalid
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        match std::fs::read_to_string(path.as_ref()) {
            Ok(contents) => match Self::from_json_str(&contents) {
                Ok(params) => {
                    log::info!("Loaded model parameters from {:?}", path.as_ref());
                    params
                }
                Err(e) => {
                    log::warn!("Failed to parse model parameters: {}, using defaults", e);
                    Self::default()
                }
            },
            Err(_) => {
                log::info!("Model parameters file not found, using defaults");
                Self::default()
            }
        }
    }

    /// Parse a flat JSON object of overrides and apply it to the defaults
    pub fn from_json_str(contents: &str) -> SimResult<Self> {
        let value: Value = serde_json::from_str(contents)
            .map_err(|e| SimulationError::MalformedRequest(e.to_string()))?;
        let object = value.as_object().ok_or_else(|| {
            SimulationError::MalformedRequest("parameter file must be a JSON object".into())
        })?;
        let overrides = ParameterOverrides::from_json_map(object)?;

        let mut params = Self::default();
        params.apply_overrides(&overrides)?;
        params.validate()?;
        Ok(params)
    }

    /// Apply every override in order; stops at the first rejected entry
    pub fn apply_overrides(&mut self, overrides: &ParameterOverrides) -> SimResult<()> {
        for (key, &value) in overrides.iter() {
            self.set(key, value)?;
        }
        Ok(())
    }

    /// Flat `name -> value` view sorted by name (flags as 0/1)
    pub fn to_map(&self) -> BTreeMap<&'static str, f64> {
        PARAMETER_SPECS
            .iter()
            .filter_map(|spec| self.get(spec.key).map(|v| (spec.key, v)))
            .collect()
    }

    /// Check every range constraint, reporting the first offending field
    pub fn validate(&self) -> SimResult<()> {
        for spec in PARAMETER_SPECS {
            let Some(value) = self.get(spec.key) else {
                continue;
            };
            if !value.is_finite() {
                return Err(SimulationError::invalid(spec.key, "must be a finite number"));
            }
            if value < 0.0 {
                return Err(SimulationError::invalid(
                    spec.key,
                    format!("must be >= 0, got {value}"),
                ));
            }
        }

        for (key, n) in [
            ("n_hill", self.kinetics.growth_hill_n),
            ("n_fb", self.mechanisms.acs_feedback_n),
            ("n_fb_aco", self.mechanisms.aco_feedback_n),
        ] {
            if n <= 0.0 {
                return Err(SimulationError::invalid(
                    key,
                    format!("Hill coefficient must be > 0, got {n}"),
                ));
            }
        }

        let f = self.mechanisms.direct_fraction;
        if !(0.0..=1.0).contains(&f) {
            return Err(SimulationError::invalid(
                "f_direct",
                format!("fraction must lie in [0, 1], got {f}"),
            ));
        }

        if self.settings.t_end_h <= 0.0 {
            return Err(SimulationError::invalid(
                "t_end",
                format!("must be > 0, got {}", self.settings.t_end_h),
            ));
        }
        if self.settings.n_points < 2 {
            return Err(SimulationError::invalid(
                "n_points",
                format!("must be >= 2, got {}", self.settings.n_points),
            ));
        }
        if self.settings.n_points > MAX_OUTPUT_POINTS {
            return Err(SimulationError::invalid(
                "n_points",
                format!("must not exceed {MAX_OUTPUT_POINTS}"),
            ));
        }
        Ok(())
    }
}

/// Caller-supplied subset of parameters keyed by wire name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParameterOverrides(BTreeMap<String, f64>);

impl ParameterOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace one override
    pub fn insert(&mut self, key: impl Into<String>, value: f64) -> &mut Self {
        self.0.insert(key.into(), value);
        self
    }

    pub fn get(&self, key: &str) -> Option<f64> {
        self.0.get(key).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &f64)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Every parameter of a resolved set as explicit overrides
    pub fn from_parameters(params: &ModelParameters) -> Self {
        Self(
            params
                .to_map()
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        )
    }

    /// Decode a JSON object; numbers and booleans are accepted, names are
    /// checked against the catalog
    pub fn from_json_map(object: &Map<String, Value>) -> SimResult<Self> {
        let mut overrides = Self::new();
        for (key, value) in object {
            if parameter_spec(key).is_none() {
                return Err(SimulationError::UnknownParameter(key.clone()));
            }
            let number = match value {
                Value::Number(n) => n.as_f64().ok_or_else(|| {
                    SimulationError::invalid(key.as_str(), "number out of range")
                })?,
                Value::Bool(b) => {
                    if *b {
                        1.0
                    } else {
                        0.0
                    }
                }
                Value::Null => continue,
                other => {
                    return Err(SimulationError::invalid(
                        key.as_str(),
                        format!("expected a number, got {other}"),
                    ))
                }
            };
            overrides.insert(key.clone(), number);
        }
        Ok(overrides)
    }
}

impl FromIterator<(String, f64)> for ParameterOverrides {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Serde adapter storing a bool as the integers 0/1, accepting either
/// integers or JSON booleans on input
mod flag {
    use serde::de::{self, Deserializer, Visitor};
    use serde::Serializer;
    use std::fmt;

    pub fn serialize<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(u8::from(*value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        struct FlagVisitor;

        impl<'de> Visitor<'de> for FlagVisitor {
            type Value = bool;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("0, 1, true or false")
            }

            fn visit_bool<E: de::Error>(self, v: bool) -> Result<bool, E> {
                Ok(v)
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<bool, E> {
                match v {
                    0 => Ok(false),
                    1 => Ok(true),
                    _ => Err(E::invalid_value(de::Unexpected::Unsigned(v), &self)),
                }
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<bool, E> {
                match v {
                    0 => Ok(false),
                    1 => Ok(true),
                    _ => Err(E::invalid_value(de::Unexpected::Signed(v), &self)),
                }
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<bool, E> {
                if v == 0.0 {
                    Ok(false)
                } else if v == 1.0 {
                    Ok(true)
                } else {
                    Err(E::invalid_value(de::Unexpected::Float(v), &self))
                }
            }
        }

        deserializer.deserialize_any(FlagVisitor)
    }
}
