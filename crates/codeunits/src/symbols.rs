//! Default symbol table.
//!
//! Factors are in CGS. Symbols flagged prefixable accept the SI prefixes in
//! [`SI_PREFIXES`] (`kpc`, `Myr`, `μG`); everything else must match exactly.
//! Exact matches always win, so `m` is a meter, `G` is a gauss and `Gyr` is a
//! gigayear.

use codeunits_types::{Dimension, Rational};
use std::f64::consts::PI;

/// SI metric prefixes and their powers of ten.
///
/// ASCII `u` and the micro sign `µ` are accepted for `μ`.
pub const SI_PREFIXES: &[(&str, i32)] = &[
    ("Y", 24),
    ("Z", 21),
    ("E", 18),
    ("P", 15),
    ("T", 12),
    ("G", 9),
    ("M", 6),
    ("k", 3),
    ("h", 2),
    ("da", 1),
    ("d", -1),
    ("c", -2),
    ("m", -3),
    ("μ", -6),
    ("µ", -6),
    ("u", -6),
    ("n", -9),
    ("p", -12),
    ("f", -15),
    ("a", -18),
    ("z", -21),
    ("y", -24),
];

/// Every way `name` can be read as an SI prefix followed by a remainder.
///
/// Longer prefixes come first so `da` is tried before `d`.
pub fn prefix_splits(name: &str) -> Vec<(f64, &str)> {
    let mut splits: Vec<(usize, f64, &str)> = SI_PREFIXES
        .iter()
        .filter(|(prefix, _)| name.len() > prefix.len() && name.starts_with(prefix))
        .map(|(prefix, exp)| (prefix.chars().count(), 10f64.powi(*exp), &name[prefix.len()..]))
        .collect();
    splits.sort_by_key(|(chars, _, _)| std::cmp::Reverse(*chars));
    splits.into_iter().map(|(_, scale, rest)| (scale, rest)).collect()
}

pub mod constants {
    //! Physical constants in CGS.

    /// Parsec in centimeters.
    pub const PARSEC_CM: f64 = 3.085_677_581_491_367e18;
    /// Astronomical unit in centimeters.
    pub const AU_CM: f64 = 1.495_978_707e13;
    /// Light year in centimeters.
    pub const LIGHT_YEAR_CM: f64 = 9.460_730_472_580_8e17;
    /// Solar radius in centimeters.
    pub const SOLAR_RADIUS_CM: f64 = 6.957e10;
    /// Earth radius in centimeters.
    pub const EARTH_RADIUS_CM: f64 = 6.371e8;

    /// Solar mass in grams.
    pub const SOLAR_MASS_G: f64 = 1.988_415_86e33;
    /// Earth mass in grams.
    pub const EARTH_MASS_G: f64 = 5.9722e27;
    /// Jupiter mass in grams.
    pub const JUPITER_MASS_G: f64 = 1.8982e30;
    /// Atomic mass unit in grams.
    pub const AMU_G: f64 = 1.660_539_066_60e-24;
    /// Proton mass in grams.
    pub const PROTON_MASS_G: f64 = 1.672_621_923_69e-24;

    /// Julian year in seconds.
    pub const YEAR_S: f64 = 31_557_600.0;

    /// Electron volt in ergs.
    pub const ELECTRON_VOLT_ERG: f64 = 1.602_176_634e-12;
}

use constants::*;

const fn int(n: i8) -> Rational {
    Rational::integer(n)
}

const ENERGY: Dimension = Dimension {
    length: int(2),
    mass: int(1),
    time: int(-2),
    ..Dimension::DIMENSIONLESS
};

const POWER: Dimension = Dimension {
    time: int(-3),
    ..ENERGY
};

const FORCE: Dimension = Dimension {
    length: int(1),
    mass: int(1),
    time: int(-2),
    ..Dimension::DIMENSIONLESS
};

const PRESSURE: Dimension = Dimension {
    length: int(-1),
    mass: int(1),
    time: int(-2),
    ..Dimension::DIMENSIONLESS
};

const FREQUENCY: Dimension = Dimension {
    time: int(-1),
    ..Dimension::DIMENSIONLESS
};

/// Symbol of the empty product. Parsed away, so it never appears as a term.
pub const DIMENSIONLESS_SYMBOL: &str = "dimensionless";

/// A built-in symbol.
#[derive(Debug, Clone, Copy)]
pub struct SymbolDef {
    pub symbol: &'static str,
    pub cgs_factor: f64,
    pub dimension: Dimension,
    pub prefixable: bool,
}

const fn def(symbol: &'static str, cgs_factor: f64, dimension: Dimension, prefixable: bool) -> SymbolDef {
    SymbolDef {
        symbol,
        cgs_factor,
        dimension,
        prefixable,
    }
}

/// Symbols every new registry starts with.
pub const DEFAULT_SYMBOLS: &[SymbolDef] = &[
    def(DIMENSIONLESS_SYMBOL, 1.0, Dimension::DIMENSIONLESS, false),
    // length
    def("cm", 1.0, Dimension::LENGTH, false),
    def("m", 100.0, Dimension::LENGTH, true),
    def("pc", PARSEC_CM, Dimension::LENGTH, true),
    def("AU", AU_CM, Dimension::LENGTH, false),
    def("ly", LIGHT_YEAR_CM, Dimension::LENGTH, true),
    def("Rsun", SOLAR_RADIUS_CM, Dimension::LENGTH, false),
    def("Rearth", EARTH_RADIUS_CM, Dimension::LENGTH, false),
    // mass
    def("g", 1.0, Dimension::MASS, true),
    def("Msun", SOLAR_MASS_G, Dimension::MASS, false),
    def("Mearth", EARTH_MASS_G, Dimension::MASS, false),
    def("Mjup", JUPITER_MASS_G, Dimension::MASS, false),
    def("amu", AMU_G, Dimension::MASS, false),
    def("mp", PROTON_MASS_G, Dimension::MASS, false),
    // time
    def("s", 1.0, Dimension::TIME, true),
    def("min", 60.0, Dimension::TIME, false),
    def("hr", 3600.0, Dimension::TIME, false),
    def("day", 86_400.0, Dimension::TIME, false),
    def("yr", YEAR_S, Dimension::TIME, true),
    def("Hz", 1.0, FREQUENCY, true),
    // temperature
    def("K", 1.0, Dimension::TEMPERATURE, true),
    // energy, power, force, pressure
    def("erg", 1.0, ENERGY, false),
    def("J", 1.0e7, ENERGY, true),
    def("eV", ELECTRON_VOLT_ERG, ENERGY, true),
    def("W", 1.0e7, POWER, true),
    def("dyn", 1.0, FORCE, false),
    def("N", 1.0e5, FORCE, true),
    def("Pa", 10.0, PRESSURE, true),
    // magnetic field (Gaussian)
    def("G", 1.0, Dimension::MAGNETIC_FIELD, true),
    def("gauss", 1.0, Dimension::MAGNETIC_FIELD, false),
    // angle
    def("rad", 1.0, Dimension::ANGLE, false),
    def("degree", PI / 180.0, Dimension::ANGLE, false),
    def("arcmin", PI / 10_800.0, Dimension::ANGLE, false),
    def("arcsec", PI / 648_000.0, Dimension::ANGLE, false),
    // current, luminous intensity
    def("A", 1.0, Dimension::CURRENT, true),
    def("cd", 1.0, Dimension::LUMINOSITY, false),
];

/// Named CGS units preferred by `to_cgs` over a product of base symbols.
pub const CGS_NAMED: &[(&str, Dimension)] = &[
    ("erg", ENERGY),
    ("dyn", FORCE),
    ("G", Dimension::MAGNETIC_FIELD),
];
