//! SI unit prefixes.
//!
//! A fixed table of (name, symbol, power-of-ten exponent) entries from yotta
//! to yocto. Lookup is a linear scan in both directions.

use std::fmt;

/// One prefix entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnitPrefix {
    pub name: &'static str,
    pub symbol: char,
    pub exponent: i8,
}

/// A prefix table. Systems share the static SI table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnitPrefixTable {
    prefixes: &'static [UnitPrefix],
}

const fn prefix(name: &'static str, symbol: char, exponent: i8) -> UnitPrefix {
    UnitPrefix { name, symbol, exponent }
}

static SI_PREFIXES: [UnitPrefix; 20] = [
    prefix("yotta", 'Y', 24),
    prefix("zetta", 'Z', 21),
    prefix("exa", 'E', 18),
    prefix("peta", 'P', 15),
    prefix("tera", 'T', 12),
    prefix("giga", 'G', 9),
    prefix("mega", 'M', 6),
    prefix("kilo", 'k', 3),
    prefix("hecto", 'h', 2),
    prefix("deca", 'D', 1),
    prefix("deci", 'd', -1),
    prefix("centi", 'c', -2),
    prefix("milli", 'm', -3),
    prefix("micro", 'μ', -6),
    prefix("nano", 'n', -9),
    prefix("pico", 'p', -12),
    prefix("femto", 'f', -15),
    prefix("atto", 'a', -18),
    prefix("zepto", 'z', -21),
    prefix("yocto", 'y', -24),
];

static SI_TABLE: UnitPrefixTable = UnitPrefixTable { prefixes: &SI_PREFIXES };

impl UnitPrefixTable {
    pub fn si() -> &'static UnitPrefixTable {
        &SI_TABLE
    }

    /// Fold case and look-alike variants onto the table's symbol.
    ///
    /// `K` → `k`, `H` → `h`, MICRO SIGN (U+00B5) → GREEK SMALL LETTER MU (U+03BC).
    pub fn normalize(symbol: char) -> char {
        match symbol {
            'K' => 'k',
            'H' => 'h',
            '\u{00B5}' => '\u{03BC}',
            c => c,
        }
    }

    pub fn prefix_of(&self, symbol: char) -> Option<&'static UnitPrefix> {
        let symbol = Self::normalize(symbol);
        self.prefixes.iter().find(|p| p.symbol == symbol)
    }

    pub fn exponent_of(&self, symbol: char) -> Option<i8> {
        self.prefix_of(symbol).map(|p| p.exponent)
    }

    /// Fails for exponents with no prefix step (4, 5, 7, ...). Zero has no prefix.
    pub fn symbol_of(&self, exponent: i8) -> Option<char> {
        self.prefixes.iter().find(|p| p.exponent == exponent).map(|p| p.symbol)
    }

    pub fn is_prefix_exponent(&self, exponent: i8) -> bool {
        exponent == 0 || self.symbol_of(exponent).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &'static UnitPrefix> {
        self.prefixes.iter()
    }
}

impl fmt::Display for UnitPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}, 10^{})", self.name, self.symbol, self.exponent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_both_directions() {
        let t = UnitPrefixTable::si();
        assert_eq!(t.exponent_of('k'), Some(3));
        assert_eq!(t.exponent_of('m'), Some(-3));
        assert_eq!(t.exponent_of('Y'), Some(24));
        assert_eq!(t.exponent_of('y'), Some(-24));
        assert_eq!(t.symbol_of(9), Some('G'));
        assert_eq!(t.symbol_of(2), Some('h'));
        assert_eq!(t.symbol_of(4), None);
        assert_eq!(t.symbol_of(0), None);
        assert_eq!(t.exponent_of('x'), None);
    }

    #[test]
    fn test_case_normalization() {
        let t = UnitPrefixTable::si();
        assert_eq!(t.exponent_of('K'), Some(3));
        assert_eq!(t.exponent_of('H'), Some(2));
        // M stays mega, not milli
        assert_eq!(t.exponent_of('M'), Some(6));
    }

    #[test]
    fn test_micro_variants() {
        let t = UnitPrefixTable::si();
        assert_eq!(t.exponent_of('\u{00B5}'), Some(-6));
        assert_eq!(t.exponent_of('\u{03BC}'), Some(-6));
        assert_eq!(t.symbol_of(-6), Some('\u{03BC}'));
    }
}
