//! Parsed unit expressions.
//!
//! A [`UnitExpression`] is a product of registered symbols raised to rational
//! powers. Terms keep a handle on the registry's cosmology, so the CGS factor
//! of a comoving or `h`-scaled expression is evaluated when it is asked for,
//! never cached at parse time.
//!
//! # Grammar
//!
//! ```text
//! product := term (('*' | '/' | <implicit>) term)*
//! term    := atom (('^' | '**') power)?
//! atom    := IDENT | '1' | '(' product ')'
//! power   := ['-' | '+'] (INT | FLOAT) | '(' ['-' | '+'] INT ['/' INT] ')'
//! ```
//!
//! `/` divides by the next term only, so `erg/g/K` is `erg · g⁻¹ · K⁻¹`.
//! Whitespace and concatenation multiply: `Msun kpc` and `Msunkpc` are the
//! same. A concatenated run is split into the longest registered symbols,
//! backtracking when a greedy split leaves an unresolvable remainder.

use std::collections::HashSet;
use std::fmt;

use codeunits_types::dimension::BASE_SYMBOLS;
use codeunits_types::{Dimension, Rational};
use tracing::trace;

use crate::cosmology::Cosmology;
use crate::error::{Result, UnitError};
use crate::lexer::{lex, Token};
use crate::registry::{UnitEntry, UnitRegistry, COMOVING_SUFFIX};
use crate::symbols::{CGS_NAMED, DIMENSIONLESS_SYMBOL};

const MINUS_ONE: Rational = Rational::integer(-1);

/// One symbol raised to a power.
#[derive(Debug, Clone)]
pub struct UnitTerm {
    pub symbol: String,
    pub entry: UnitEntry,
    pub power: Rational,
    cosmology: Cosmology,
}

impl UnitTerm {
    /// Current CGS factor of this term, power applied.
    pub fn factor(&self) -> f64 {
        self.power
            .pow_f64(self.entry.factor(&self.cosmology.snapshot()))
    }

    fn same_unit(&self, other: &UnitTerm) -> bool {
        self.symbol == other.symbol
            && self.entry == other.entry
            && self.cosmology.ptr_eq(&other.cosmology)
    }
}

/// Product of unit terms with its net dimension.
#[derive(Debug, Clone)]
pub struct UnitExpression {
    terms: Vec<UnitTerm>,
    dimension: Dimension,
}

impl UnitExpression {
    /// Parse `source` against `registry`.
    pub fn parse(source: &str, registry: &UnitRegistry) -> Result<Self> {
        let tokens = lex(source)?;
        if tokens.is_empty() {
            return Err(UnitError::EmptyUnitExpression);
        }

        let mut parser = Parser {
            source,
            tokens: &tokens,
            pos: 0,
            registry,
        };
        let expr = parser.parse_product(false)?;
        if let Some(token) = parser.peek() {
            return Err(parser.unexpected(Some(token.clone()), "after unit expression"));
        }

        trace!(source, parsed = %expr, dimension = %expr.dimension, "unit expression parsed");
        Ok(expr)
    }

    /// The empty product.
    pub fn dimensionless() -> Self {
        Self {
            terms: Vec::new(),
            dimension: Dimension::DIMENSIONLESS,
        }
    }

    /// A single symbol to the first power.
    pub fn from_entry(symbol: impl Into<String>, entry: UnitEntry, cosmology: &Cosmology) -> Self {
        Self {
            dimension: entry.dimension,
            terms: vec![UnitTerm {
                symbol: symbol.into(),
                entry,
                power: Rational::ONE,
                cosmology: cosmology.clone(),
            }],
        }
    }

    /// Plain CGS unit for `dimension` in `registry`.
    ///
    /// Named units (`erg`, `dyn`, `G`) win over a product of base symbols.
    pub fn cgs(dimension: Dimension, registry: &UnitRegistry) -> Result<Self> {
        if dimension.is_dimensionless() {
            return Ok(Self::dimensionless());
        }

        let cosmology = registry.cosmology();
        if let Some((symbol, _)) = CGS_NAMED.iter().find(|(_, named)| *named == dimension) {
            return Ok(Self::from_entry(*symbol, registry.lookup(symbol)?, cosmology));
        }

        dimension
            .exponents()
            .into_iter()
            .zip(BASE_SYMBOLS)
            .filter(|(power, _)| !power.is_zero())
            .try_fold(Self::dimensionless(), |acc, (power, symbol)| {
                let base = Self::from_entry(symbol, registry.lookup(symbol)?, cosmology);
                Ok(acc.multiply(&base, power))
            })
    }

    pub fn terms(&self) -> &[UnitTerm] {
        &self.terms
    }

    pub fn dimension(&self) -> Dimension {
        self.dimension
    }

    pub fn is_dimensionless(&self) -> bool {
        self.dimension.is_dimensionless()
    }

    /// Whether the expression can be converted to `other`.
    pub fn is_compatible(&self, other: &UnitExpression) -> bool {
        self.dimension == other.dimension
    }

    /// Current CGS factor.
    ///
    /// Positive and negative powers are accumulated separately and divided
    /// once, so `Mpc/Mpccm` at `z = 1` is exactly 2.
    pub fn cgs_factor(&self) -> f64 {
        let (numerator, denominator) =
            self.terms
                .iter()
                .fold((1.0, 1.0), |(numerator, denominator), term| {
                    let factor = term.entry.factor(&term.cosmology.snapshot());
                    if term.power.num > 0 {
                        (numerator * term.power.pow_f64(factor), denominator)
                    } else {
                        (numerator, denominator * (-term.power).pow_f64(factor))
                    }
                });
        numerator / denominator
    }

    /// Multiplier taking a value in `self` to a value in `target`.
    pub fn conversion_factor(&self, target: &UnitExpression) -> Result<f64> {
        if !self.is_compatible(target) {
            return Err(UnitError::mismatch("convert", self.dimension, target.dimension));
        }
        Ok(self.cgs_factor() / target.cgs_factor())
    }

    /// `self · other^power`, merging repeated symbols.
    ///
    /// Exponents saturate at the `i8/u8` range. Unit strings go through
    /// [`UnitExpression::checked_multiply`] instead.
    pub fn multiply(&self, other: &UnitExpression, power: Rational) -> UnitExpression {
        let mut terms = self.terms.clone();
        for term in &other.terms {
            let scaled = term.power * power;
            match terms.iter().position(|existing| existing.same_unit(term)) {
                Some(index) => terms[index].power = terms[index].power + scaled,
                None => terms.push(UnitTerm {
                    power: scaled,
                    ..term.clone()
                }),
            }
        }
        terms.retain(|term| !term.power.is_zero());

        UnitExpression {
            terms,
            dimension: self.dimension.multiply(&other.dimension, power),
        }
    }

    /// `self · other^power`, or `None` when any exponent leaves the `i8/u8`
    /// range.
    pub fn checked_multiply(&self, other: &UnitExpression, power: Rational) -> Option<UnitExpression> {
        let mut terms = self.terms.clone();
        for term in &other.terms {
            let scaled = term.power.checked_mul(power)?;
            match terms.iter().position(|existing| existing.same_unit(term)) {
                Some(index) => terms[index].power = terms[index].power.checked_add(scaled)?,
                None => terms.push(UnitTerm {
                    power: scaled,
                    ..term.clone()
                }),
            }
        }
        terms.retain(|term| !term.power.is_zero());

        Some(UnitExpression {
            terms,
            dimension: self.dimension.checked_multiply(&other.dimension, power)?,
        })
    }

    pub fn divide(&self, other: &UnitExpression) -> UnitExpression {
        self.multiply(other, MINUS_ONE)
    }

    pub fn pow(&self, power: Rational) -> UnitExpression {
        UnitExpression::dimensionless().multiply(self, power)
    }

    pub fn inverse(&self) -> UnitExpression {
        self.pow(MINUS_ONE)
    }

    fn sorted_key(&self) -> Vec<(&str, Rational)> {
        let mut key: Vec<_> = self
            .terms
            .iter()
            .map(|term| (term.symbol.as_str(), term.power))
            .collect();
        key.sort_by(|a, b| a.0.cmp(b.0));
        key
    }
}

/// Same symbols to the same powers, in any order.
impl PartialEq for UnitExpression {
    fn eq(&self, other: &Self) -> bool {
        self.dimension == other.dimension && self.sorted_key() == other.sorted_key()
    }
}

fn write_term(f: &mut fmt::Formatter<'_>, symbol: &str, power: Rational) -> fmt::Result {
    match power {
        Rational::ONE => write!(f, "{}", symbol),
        p if p.is_integer() => write!(f, "{}^{}", symbol, p),
        p => write!(f, "{}^({})", symbol, p),
    }
}

/// Renders `g*cm^2/s^2`, `G^(1/2)`, `1/s`, or `dimensionless`.
impl fmt::Display for UnitExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.terms.is_empty() {
            return write!(f, "dimensionless");
        }

        let (numerator, denominator): (Vec<&UnitTerm>, Vec<&UnitTerm>) =
            self.terms.iter().partition(|term| term.power.num > 0);

        if numerator.is_empty() {
            write!(f, "1")?;
        }
        for (i, term) in numerator.iter().enumerate() {
            if i > 0 {
                write!(f, "*")?;
            }
            write_term(f, &term.symbol, term.power)?;
        }
        for term in denominator {
            write!(f, "/")?;
            write_term(f, &term.symbol, -term.power)?;
        }
        Ok(())
    }
}

/// Split a concatenated identifier into registered symbols.
///
/// Longest head first; backtracks when the remainder cannot be resolved.
/// Offsets whose remainder failed once are not retried, so a run costs at
/// most one lookup per (start, end) pair.
fn split_symbols(name: &str, registry: &UnitRegistry) -> Option<Vec<(String, UnitEntry)>> {
    let mut dead_ends = HashSet::new();
    let mut run = split_from(name, 0, registry, &mut dead_ends)?;
    run.reverse();
    Some(run)
}

/// Split `name[start..]`, returning the symbols in reverse order.
fn split_from(
    name: &str,
    start: usize,
    registry: &UnitRegistry,
    dead_ends: &mut HashSet<usize>,
) -> Option<Vec<(String, UnitEntry)>> {
    if start == name.len() {
        return Some(Vec::new());
    }
    if dead_ends.contains(&start) {
        return None;
    }

    let rest = &name[start..];
    let mut ends: Vec<usize> = rest.char_indices().map(|(i, c)| start + i + c.len_utf8()).collect();
    ends.reverse();
    for end in ends {
        let Ok(entry) = registry.lookup(&name[start..end]) else {
            continue;
        };
        if let Some(mut run) = split_from(name, end, registry, dead_ends) {
            run.push((name[start..end].to_string(), entry));
            return Some(run);
        }
    }

    dead_ends.insert(start);
    None
}

/// `Mpccm` on a registry without comoving symbols is an unknown comoving
/// unit, not `Mpc·cm`.
fn reads_as_comoving(name: &str, registry: &UnitRegistry) -> bool {
    if registry.has_cosmology() || registry.contains(name) {
        return false;
    }
    name.strip_suffix(COMOVING_SUFFIX)
        .filter(|base| !base.is_empty())
        .and_then(|base| registry.lookup(base).ok())
        .is_some_and(|entry| entry.dimension == Dimension::LENGTH)
}

struct Parser<'a> {
    source: &'a str,
    tokens: &'a [Token],
    pos: usize,
    registry: &'a UnitRegistry,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<&'a Token> {
        let token = self.tokens.get(self.pos);
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    /// Consume the next token if it equals `expected`.
    fn eat(&mut self, expected: &Token) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: &Token) -> Result<()> {
        if self.eat(expected) {
            Ok(())
        } else {
            let found = self.peek().cloned();
            Err(self.unexpected(found, &format!("expected {:?}", expected)))
        }
    }

    fn malformed(&self, reason: impl Into<String>) -> UnitError {
        UnitError::malformed(self.source, reason)
    }

    /// `lhs · rhs^power`, rejecting exponents that leave the `i8/u8` range.
    fn combine(&self, lhs: &UnitExpression, rhs: &UnitExpression, power: Rational) -> Result<UnitExpression> {
        lhs.checked_multiply(rhs, power)
            .ok_or_else(|| self.malformed("exponent out of range"))
    }

    fn unexpected(&self, found: Option<Token>, context: &str) -> UnitError {
        match found {
            Some(token) => self.malformed(format!("unexpected {:?} {}", token, context)),
            None => self.malformed(format!("unexpected end of input, {}", context)),
        }
    }

    fn parse_product(&mut self, nested: bool) -> Result<UnitExpression> {
        let mut expr = self.parse_term()?;

        loop {
            let power = match self.peek() {
                Some(Token::Star) => {
                    self.advance();
                    Rational::ONE
                }
                Some(Token::Slash) => {
                    self.advance();
                    MINUS_ONE
                }
                Some(Token::Ident(_) | Token::Integer(_) | Token::LParen) => Rational::ONE,
                Some(Token::RParen) if nested => break,
                None => break,
                Some(token) => {
                    return Err(self.unexpected(Some(token.clone()), "between unit terms"))
                }
            };
            let term = self.parse_term()?;
            expr = self.combine(&expr, &term, power)?;
        }

        Ok(expr)
    }

    fn parse_term(&mut self) -> Result<UnitExpression> {
        match self.advance() {
            Some(Token::Ident(name)) => {
                if reads_as_comoving(name, self.registry) {
                    return Err(UnitError::unknown(name.as_str()));
                }
                let mut run = split_symbols(name, self.registry)
                    .ok_or_else(|| UnitError::unknown(name.as_str()))?;
                run.retain(|(symbol, _)| symbol != DIMENSIONLESS_SYMBOL);
                let power = self.parse_optional_power()?;

                let cosmology = self.registry.cosmology();
                let last = run.pop();
                let head = run.into_iter().try_fold(UnitExpression::dimensionless(), |acc, (symbol, entry)| {
                    self.combine(&acc, &UnitExpression::from_entry(symbol, entry, cosmology), Rational::ONE)
                })?;
                match last {
                    Some((symbol, entry)) => {
                        self.combine(&head, &UnitExpression::from_entry(symbol, entry, cosmology), power)
                    }
                    None => Ok(head),
                }
            }
            Some(Token::Integer(1)) => {
                self.parse_optional_power()?;
                Ok(UnitExpression::dimensionless())
            }
            Some(Token::Integer(n)) => Err(self.malformed(format!(
                "numeric factor {} is not a unit; only 1 may appear",
                n
            ))),
            Some(Token::LParen) => {
                if self.peek() == Some(&Token::RParen) {
                    return Err(self.malformed("empty parentheses"));
                }
                let inner = self.parse_product(true)?;
                self.expect(&Token::RParen)?;
                let power = self.parse_optional_power()?;
                self.combine(&UnitExpression::dimensionless(), &inner, power)
            }
            other => Err(self.unexpected(other.cloned(), "where a unit was expected")),
        }
    }

    fn parse_optional_power(&mut self) -> Result<Rational> {
        if self.eat(&Token::Caret) {
            self.parse_power()
        } else {
            Ok(Rational::ONE)
        }
    }

    fn parse_power(&mut self) -> Result<Rational> {
        let grouped = self.eat(&Token::LParen);
        let sign: i64 = if self.eat(&Token::Minus) {
            -1
        } else {
            self.eat(&Token::Plus);
            1
        };

        let power = match self.advance() {
            Some(Token::Integer(n)) => {
                let num = i16::try_from(sign * n)
                    .map_err(|_| self.malformed(format!("exponent {} out of range", n)))?;
                let denom = if grouped && self.eat(&Token::Slash) {
                    match self.advance() {
                        Some(Token::Integer(d)) => u16::try_from(*d)
                            .map_err(|_| self.malformed(format!("denominator {} out of range", d)))?,
                        other => {
                            return Err(self.unexpected(other.cloned(), "in exponent denominator"))
                        }
                    }
                } else {
                    1
                };
                Rational::checked(num, denom).ok_or_else(|| {
                    self.malformed(format!("exponent {}/{} is not representable", num, denom))
                })?
            }
            Some(Token::Float(value)) => Rational::approximate(sign as f64 * value)
                .ok_or_else(|| self.malformed(format!("exponent {} is not a simple fraction", value)))?,
            other => return Err(self.unexpected(other.cloned(), "where an exponent was expected")),
        };

        if grouped {
            self.expect(&Token::RParen)?;
        }
        Ok(power)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbols::constants::{PARSEC_CM, SOLAR_MASS_G, YEAR_S};

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() <= 1e-12 * b.abs()
    }

    fn parse(source: &str) -> UnitExpression {
        UnitRegistry::new().parse(source).unwrap()
    }

    #[test]
    fn test_division_binds_to_next_term_only() {
        let expr = parse("erg/g/K");
        assert_eq!(expr.dimension(), Dimension::from_exponents([2, 0, -2, -1, 0, 0, 0]));

        let expr = parse("g/cm*s");
        assert_eq!(expr.dimension(), Dimension::from_exponents([-1, 1, 1, 0, 0, 0, 0]));
    }

    #[test]
    fn test_parenthesized_division() {
        let expr = parse("g/(cm*s)");
        assert_eq!(expr.dimension(), Dimension::from_exponents([-1, 1, -1, 0, 0, 0, 0]));
    }

    #[test]
    fn test_power_forms() {
        assert_eq!(parse("cm^3").dimension().length, Rational::integer(3));
        assert_eq!(parse("cm**3").dimension().length, Rational::integer(3));
        assert_eq!(parse("s^-1").dimension().time, MINUS_ONE);
        assert_eq!(parse("G**0.5").dimension(), Dimension::MAGNETIC_FIELD.pow(Rational::HALF));
        assert_eq!(parse("cm^(-1/2)").dimension().length, Rational::new(-1, 2));
        assert_eq!(parse("(cm s)^2").dimension(), Dimension::from_exponents([2, 0, 2, 0, 0, 0, 0]));
    }

    #[test]
    fn test_implicit_multiplication() {
        let spaced = parse("Msun kpc");
        let joined = parse("Msunkpc");
        assert_eq!(spaced, joined);
        assert!(close(joined.cgs_factor(), SOLAR_MASS_G * 1e3 * PARSEC_CM));
        assert_eq!(joined.terms().len(), 2);
    }

    #[test]
    fn test_split_backtracks() {
        // "gs" is not a symbol; "g" then "s" is.
        let expr = parse("gs");
        assert_eq!(expr.dimension(), Dimension::from_exponents([0, 1, 1, 0, 0, 0, 0]));
        // longest head first: "min" is a minute, not milli-inch
        assert_eq!(parse("min").cgs_factor(), 60.0);
    }

    #[test]
    fn test_repeated_symbols_merge() {
        let expr = parse("cm*cm/cm");
        assert_eq!(expr.terms().len(), 1);
        assert_eq!(expr.to_string(), "cm");

        let expr = parse("g/g");
        assert!(expr.terms().is_empty());
        assert!(expr.is_dimensionless());
    }

    #[test]
    fn test_cgs_factor() {
        assert!(close(parse("km/s").cgs_factor(), 1e5));
        assert!(close(parse("Myr").cgs_factor(), 1e6 * YEAR_S));
        assert!(close(parse("Msun/pc^3").cgs_factor(), SOLAR_MASS_G / PARSEC_CM.powi(3)));
    }

    #[test]
    fn test_comoving_ratio_is_exact() {
        let mut registry = UnitRegistry::new();
        registry.add_comoving_and_hubble(0.7).unwrap();
        registry.set_redshift(1.0).unwrap();

        let ratio = registry.parse("Mpc/Mpccm").unwrap();
        assert!(ratio.is_dimensionless());
        assert_eq!(ratio.cgs_factor(), 2.0);
    }

    #[test]
    fn test_factor_reads_cosmology_at_evaluation() {
        let mut registry = UnitRegistry::new();
        registry.add_comoving_and_hubble(0.7).unwrap();
        let expr = registry.parse("kpccm/h").unwrap();
        let at_zero = expr.cgs_factor();

        registry.set_redshift(3.0).unwrap();
        assert!(close(expr.cgs_factor(), at_zero / 4.0));
        assert!(close(at_zero, 1e3 * PARSEC_CM / 0.7));
    }

    #[test]
    fn test_comoving_needs_cosmology() {
        let registry = UnitRegistry::new();
        assert_eq!(
            registry.parse("kpccm").unwrap_err(),
            UnitError::UnknownUnit {
                symbol: "kpccm".to_string()
            }
        );
        // an explicit product is still fine
        assert_eq!(registry.parse("kpc cm").unwrap().dimension().length, Rational::integer(2));
    }

    #[test]
    fn test_dimensionless_one() {
        let expr = parse("1/s");
        assert_eq!(expr.dimension(), Dimension::from_exponents([0, 0, -1, 0, 0, 0, 0]));
        assert_eq!(expr.to_string(), "1/s");
    }

    #[test]
    fn test_errors() {
        let registry = UnitRegistry::new();
        assert_eq!(registry.parse("").unwrap_err(), UnitError::EmptyUnitExpression);
        assert_eq!(registry.parse("   ").unwrap_err(), UnitError::EmptyUnitExpression);
        assert_eq!(
            registry.parse("furlong/s").unwrap_err(),
            UnitError::UnknownUnit {
                symbol: "furlong".to_string()
            }
        );
        for bad in ["cm/", "/cm", "cm^", "(cm", "cm)", "()", "3 cm", "cm^(1/0)", "cm^0.123"] {
            assert!(
                matches!(registry.parse(bad), Err(UnitError::MalformedUnitExpression { .. })),
                "{} should be malformed",
                bad
            );
        }
    }

    #[test]
    fn test_exponent_overflow_is_malformed() {
        let registry = UnitRegistry::new();
        for bad in ["cm^100 cm^100", "cm^(1/199) cm^(1/197)", "(cm^100)^2", "cm^-100/cm^100"] {
            match registry.parse(bad) {
                Err(UnitError::MalformedUnitExpression { reason, .. }) => {
                    assert_eq!(reason, "exponent out of range", "{}", bad)
                }
                other => panic!("{} should be malformed, got {:?}", bad, other),
            }
        }
        assert_eq!(parse("cm^100 cm^27").dimension().length, Rational::integer(127));
    }

    #[test]
    fn test_split_gives_up_quickly() {
        let registry = UnitRegistry::new();
        let name = format!("{}x", "m".repeat(64));
        let start = std::time::Instant::now();
        assert_eq!(
            registry.parse(&name).unwrap_err(),
            UnitError::UnknownUnit { symbol: name }
        );
        assert!(start.elapsed() < std::time::Duration::from_secs(1));
        assert!(registry.parse(&"m".repeat(64)).is_ok());
    }

    #[test]
    fn test_display_round_trips() {
        let registry = UnitRegistry::new();
        for source in ["g*cm^2/s^2", "G^(1/2)", "1/s", "Msun/kpc^3/Myr", "cm^(-1/2)*g"] {
            let expr = registry.parse(source).unwrap();
            let reparsed = registry.parse(&expr.to_string()).unwrap();
            assert_eq!(expr, reparsed, "{} -> {}", source, expr);
            assert_eq!(expr.cgs_factor(), reparsed.cgs_factor());
        }
        assert_eq!(UnitExpression::dimensionless().to_string(), "dimensionless");
        assert_eq!(registry.parse("dimensionless").unwrap(), UnitExpression::dimensionless());
        assert_eq!(registry.parse("cm^(-1/2)*g").unwrap().to_string(), "g/cm^(1/2)");
    }

    #[test]
    fn test_cgs_units() {
        let registry = UnitRegistry::new();
        let energy = parse("J").dimension();
        assert_eq!(UnitExpression::cgs(energy, &registry).unwrap().to_string(), "erg");

        let magnetic = UnitExpression::cgs(Dimension::MAGNETIC_FIELD, &registry).unwrap();
        assert_eq!(magnetic.to_string(), "G");

        let density = UnitExpression::cgs(parse("Msun/kpc^3").dimension(), &registry).unwrap();
        assert_eq!(density.to_string(), "g/cm^3");
        assert_eq!(density.cgs_factor(), 1.0);

        let none = UnitExpression::cgs(Dimension::DIMENSIONLESS, &registry).unwrap();
        assert!(none.terms().is_empty());
    }

    #[test]
    fn test_conversion_factor_checks_dimension() {
        let err = parse("km").conversion_factor(&parse("s")).unwrap_err();
        assert!(matches!(err, UnitError::DimensionMismatch { operation: "convert", .. }));
        assert!(close(parse("km").conversion_factor(&parse("m")).unwrap(), 1e3));
    }
}
