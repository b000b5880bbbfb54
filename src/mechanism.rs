//! Mechanismedefinities: symbolische kinematische stelsels plus hun
//! onveranderlijke numerieke configuratie (parameters, V-domein, rasterbereik).
//!
//! Een [`Mechanism`] wordt één keer gebouwd en daarna alleen gelezen; alle
//! verspreide scriptparameters uit eerdere experimenten zijn hier samengevoegd.

use crate::interval::Interval;
use crate::symbolic::Expr;

/// Symbolisch kinematisch stelsel F(U, V; params) = 0 met zijn
/// standaardconfiguratie.
#[derive(Debug, Clone)]
pub struct Mechanism {
    name: String,
    constraints: Vec<Expr>,
    u_symbols: Vec<String>,
    v_symbols: Vec<String>,
    param_symbols: Vec<String>,
    defaults: Defaults,
}

/// Numerieke standaardwaarden van een preset.
#[derive(Debug, Clone)]
pub struct Defaults {
    /// Mechanismeconstanten, in de volgorde van `param_symbols`.
    pub params: Vec<f64>,
    /// Toelaatbaar bereik per configuratievariabele.
    pub v_domain: Vec<(f64, f64)>,
    /// Vierkant rasterbereik `[lo, hi]` voor beide taakassen.
    pub grid_span: (f64, f64),
}

impl Mechanism {
    /// Naam van het midpunt-symbool voor as `i` (`v1mid`, `v2mid`, ...).
    #[must_use]
    pub fn mid_symbol(i: usize) -> String {
        format!("v{}mid", i + 1)
    }

    /// Naam van het centrum-symbool voor as `i` (`c1`, `c2`, ...).
    #[must_use]
    pub fn center_symbol(i: usize) -> String {
        format!("c{}", i + 1)
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn constraints(&self) -> &[Expr] {
        &self.constraints
    }

    #[must_use]
    pub fn u_symbols(&self) -> &[String] {
        &self.u_symbols
    }

    #[must_use]
    pub fn v_symbols(&self) -> &[String] {
        &self.v_symbols
    }

    #[must_use]
    pub fn param_symbols(&self) -> &[String] {
        &self.param_symbols
    }

    #[must_use]
    pub fn default_params(&self) -> &[f64] {
        &self.defaults.params
    }

    /// Volledig toelaatbaar V-domein als intervalbox.
    #[must_use]
    pub fn v_domain(&self) -> Vec<Interval> {
        self.defaults
            .v_domain
            .iter()
            .map(|&(lo, hi)| Interval::raw(lo, hi))
            .collect()
    }

    #[must_use]
    pub fn grid_span(&self) -> (f64, f64) {
        self.defaults.grid_span
    }
}

fn u_symbols(count: usize) -> Vec<String> {
    (0..count).map(|i| format!("u{}", i + 1)).collect()
}

fn v_symbols(count: usize) -> Vec<String> {
    (0..count).map(|i| format!("v{}", i + 1)).collect()
}

/// Beschikbare mechanisme-presets.
pub mod presets {
    use super::{Defaults, Mechanism, u_symbols, v_symbols};
    use crate::symbolic::Expr;
    use std::f64::consts::{FRAC_PI_2, PI};

    /// Soorten presets in de registry.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum PresetKind {
        TwoRpr,
        Dextar,
        PolarArm,
        SinCos,
    }

    /// Metadata voor registratie in de presettabel.
    #[derive(Debug, Clone, Copy)]
    pub struct Registration {
        pub names: &'static [&'static str],
        pub kind: PresetKind,
    }

    /// Volledige lijst van presetregistraties.
    pub const REGISTRATIONS: &[Registration] = &[
        Registration {
            names: &["2rpr", "two_rpr", "2-RPR"],
            kind: PresetKind::TwoRpr,
        },
        Registration {
            names: &["dextar", "four_bar"],
            kind: PresetKind::Dextar,
        },
        Registration {
            names: &["polar_arm", "polar"],
            kind: PresetKind::PolarArm,
        },
        Registration {
            names: &["sin_cos", "sincos"],
            kind: PresetKind::SinCos,
        },
    ];

    /// Zoekt een preset op naam (hoofdletterongevoelig).
    #[must_use]
    pub fn resolve(name: &str) -> Option<PresetKind> {
        let normalized = name.trim().to_lowercase();
        REGISTRATIONS
            .iter()
            .find(|registration| {
                registration
                    .names
                    .iter()
                    .any(|candidate| candidate.to_lowercase() == normalized)
            })
            .map(|registration| registration.kind)
    }

    impl PresetKind {
        #[must_use]
        pub fn build(self) -> Mechanism {
            match self {
                Self::TwoRpr => two_rpr(),
                Self::Dextar => dextar(),
                Self::PolarArm => polar_arm(),
                Self::SinCos => sin_cos(),
            }
        }

        #[must_use]
        pub fn name(self) -> &'static str {
            match self {
                Self::TwoRpr => "2rpr",
                Self::Dextar => "dextar",
                Self::PolarArm => "polar_arm",
                Self::SinCos => "sin_cos",
            }
        }
    }

    /// Parallelle 2-RPR-manipulator: twee prismatische staven op afstand `d`,
    /// onbekenden zijn de staaflengtes.
    #[must_use]
    pub fn two_rpr() -> Mechanism {
        let (u1, u2) = (Expr::var("u1"), Expr::var("u2"));
        let (v1, v2) = (Expr::var("v1"), Expr::var("v2"));
        let d = Expr::var("d");
        let constraints = vec![
            v1.powi(2) - u1.clone().powi(2) - u2.clone().powi(2),
            v2.powi(2) - (u1 - d).powi(2) - u2.powi(2),
        ];
        Mechanism {
            name: "2rpr".to_owned(),
            constraints,
            u_symbols: u_symbols(2),
            v_symbols: v_symbols(2),
            param_symbols: vec!["d".to_owned()],
            defaults: Defaults {
                params: vec![6.0],
                v_domain: vec![(3.0, 15.0), (3.0, 15.0)],
                grid_span: (-15.0, 15.0),
            },
        }
    }

    /// DexTAR-achtige vierstangenmechanisme met vier hoekonbekenden en
    /// stanglengtes `L`, `l` en halve basisafstand `d`.
    #[must_use]
    pub fn dextar() -> Mechanism {
        let (u1, u2) = (Expr::var("u1"), Expr::var("u2"));
        let (v1, v2) = (Expr::var("v1"), Expr::var("v2"));
        let (v3, v4) = (Expr::var("v3"), Expr::var("v4"));
        let (big_l, small_l, d) = (Expr::var("L"), Expr::var("l"), Expr::var("d"));
        let constraints = vec![
            u1.clone() - big_l.clone() * v1.clone().cos() - small_l.clone() * v3.clone().cos()
                + d.clone(),
            u1 - big_l.clone() * v2.clone().cos() - small_l.clone() * v4.clone().cos() - d,
            u2.clone() - big_l.clone() * v1.sin() - small_l.clone() * v3.sin(),
            u2 - big_l * v2.sin() - small_l * v4.sin(),
        ];
        let reach = 7.2 + 2.0;
        // Eén werkmodus per ketting. De proximale en distale hoekdomeinen
        // hebben verschillende middelpunten: bij gelijke middelpunten is
        // sin(v1 - v3) nul en daarmee de Jacobiaan in het middelpunt
        // singulier, waarna geen enkele cel ooit een eindtoestand bereikt.
        Mechanism {
            name: "dextar".to_owned(),
            constraints,
            u_symbols: u_symbols(2),
            v_symbols: v_symbols(4),
            param_symbols: vec!["L".to_owned(), "l".to_owned(), "d".to_owned()],
            defaults: Defaults {
                params: vec![7.2, 2.0, 3.0],
                v_domain: vec![
                    (0.1, PI - 0.1),
                    (0.1, PI - 0.1),
                    (-FRAC_PI_2, FRAC_PI_2),
                    (-FRAC_PI_2, FRAC_PI_2),
                ],
                grid_span: (3.0 - reach, 3.0 + reach),
            },
        }
    }

    /// Polaire arm: lengte en hoek als onbekenden.
    #[must_use]
    pub fn polar_arm() -> Mechanism {
        let (u1, u2) = (Expr::var("u1"), Expr::var("u2"));
        let (v1, v2) = (Expr::var("v1"), Expr::var("v2"));
        let constraints = vec![
            u1 - v1.clone() * v2.clone().sin(),
            u2 - v1 * v2.cos(),
        ];
        Mechanism {
            name: "polar_arm".to_owned(),
            constraints,
            u_symbols: u_symbols(2),
            v_symbols: v_symbols(2),
            param_symbols: Vec::new(),
            defaults: Defaults {
                params: Vec::new(),
                v_domain: vec![(3.0, 15.0), (0.0, PI / 2.0)],
                grid_span: (-15.0, 15.0),
            },
        }
    }

    /// Didactisch sinus/cosinus-stelsel zonder parameters.
    #[must_use]
    pub fn sin_cos() -> Mechanism {
        let (u1, u2) = (Expr::var("u1"), Expr::var("u2"));
        let (v1, v2) = (Expr::var("v1"), Expr::var("v2"));
        let constraints = vec![u1 - v1.sin(), u2 - v2.cos()];
        // v2 over een halve periode: met middelpunt pi zou sin(v2mid) en
        // daarmee de Jacobiaan in het middelpunt nul zijn. Over [0, pi]
        // bestrijkt cos(v2) nog steeds zijn volledige bereik.
        Mechanism {
            name: "sin_cos".to_owned(),
            constraints,
            u_symbols: u_symbols(2),
            v_symbols: v_symbols(2),
            param_symbols: Vec::new(),
            defaults: Defaults {
                params: Vec::new(),
                v_domain: vec![(0.0, 2.0 * PI), (0.0, PI)],
                grid_span: (-2.0, 2.0),
            },
        }
    }

    /// Vrij stelsel voor tests en experimenten; krijgt neutrale defaults.
    #[must_use]
    pub fn custom(
        name: &str,
        constraints: Vec<Expr>,
        task_dim: usize,
        config_dim: usize,
        param_symbols: Vec<String>,
    ) -> Mechanism {
        let param_count = param_symbols.len();
        Mechanism {
            name: name.to_owned(),
            constraints,
            u_symbols: u_symbols(task_dim),
            v_symbols: v_symbols(config_dim),
            param_symbols,
            defaults: Defaults {
                params: vec![0.0; param_count],
                v_domain: vec![(-1.0, 1.0); config_dim],
                grid_span: (-1.0, 1.0),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::presets::{self, PresetKind};
    use crate::symbolic::Expr;
    use crate::symbolic::matrix::ExprMatrix;

    #[test]
    fn registry_resolves_aliases_case_insensitively() {
        assert_eq!(presets::resolve("2-RPR"), Some(PresetKind::TwoRpr));
        assert_eq!(presets::resolve("DEXTAR"), Some(PresetKind::Dextar));
        assert_eq!(presets::resolve(" sincos "), Some(PresetKind::SinCos));
        assert_eq!(presets::resolve("unknown"), None);
    }

    #[test]
    fn presets_are_dimensionally_consistent() {
        for registration in presets::REGISTRATIONS {
            let mechanism = registration.kind.build();
            assert_eq!(
                mechanism.constraints().len(),
                mechanism.v_symbols().len(),
                "{} must be square",
                mechanism.name()
            );
            assert_eq!(
                mechanism.default_params().len(),
                mechanism.param_symbols().len()
            );
            assert_eq!(mechanism.v_domain().len(), mechanism.v_symbols().len());
        }
    }

    #[test]
    fn preset_midpoint_jacobians_are_invertible() {
        // A singular Jacobian at the domain midpoints makes every enclosure
        // the whole real line, so no cell would ever reach a terminal state.
        for registration in presets::REGISTRATIONS {
            let mechanism = registration.kind.build();
            let jacobian =
                ExprMatrix::jacobian(mechanism.constraints(), mechanism.v_symbols());
            let determinant = jacobian.determinant().expect("presets are square");
            let mut bindings: Vec<(&str, Expr)> = mechanism
                .v_symbols()
                .iter()
                .zip(mechanism.v_domain())
                .map(|(name, axis)| (name.as_str(), Expr::Const(axis.mid())))
                .collect();
            bindings.extend(
                mechanism
                    .param_symbols()
                    .iter()
                    .zip(mechanism.default_params())
                    .map(|(name, &value)| (name.as_str(), Expr::Const(value))),
            );
            match determinant.substitute_all(&bindings).simplify() {
                Expr::Const(value) => assert!(
                    value.abs() > 1e-9,
                    "{} has a singular midpoint Jacobian",
                    mechanism.name()
                ),
                other => panic!(
                    "{} determinant did not fold to a constant: {other}",
                    mechanism.name()
                ),
            }
        }
    }

    #[test]
    fn two_rpr_has_expected_shape() {
        let mechanism = presets::two_rpr();
        assert_eq!(mechanism.u_symbols(), ["u1", "u2"]);
        assert_eq!(mechanism.v_symbols(), ["v1", "v2"]);
        assert_eq!(mechanism.default_params(), [6.0]);
    }
}
