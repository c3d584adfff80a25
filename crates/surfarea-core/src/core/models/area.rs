use crate::core::classifier::AtomClass;
use serde::Serialize;

/// Aggregated surface area of a group of atoms, split by atom class and by
/// main-chain/side-chain membership.
///
/// Both splits partition the same atoms, so `total == polar + apolar + unknown` and
/// `total == main_chain + side_chain` hold by construction. `unknown` collects atoms whose
/// class is neither polar nor apolar and stays zero for fully classified structures.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct AreaBreakdown {
    pub total: f64,
    pub polar: f64,
    pub apolar: f64,
    pub unknown: f64,
    pub main_chain: f64,
    pub side_chain: f64,
}

impl AreaBreakdown {
    /// Builds a reference breakdown for a residue type; the total is the main-chain plus
    /// side-chain area.
    pub fn reference(main_chain: f64, side_chain: f64, polar: f64, apolar: f64) -> Self {
        Self {
            total: main_chain + side_chain,
            polar,
            apolar,
            unknown: 0.0,
            main_chain,
            side_chain,
        }
    }

    /// Adds the area of one atom.
    pub fn add_atom(&mut self, area: f64, class: AtomClass, is_main_chain: bool) {
        self.total += area;
        match class {
            AtomClass::Polar => self.polar += area,
            AtomClass::Apolar => self.apolar += area,
            AtomClass::Unknown => self.unknown += area,
        }
        if is_main_chain {
            self.main_chain += area;
        } else {
            self.side_chain += area;
        }
    }

    /// Adds another breakdown field by field.
    pub fn accumulate(&mut self, other: &AreaBreakdown) {
        self.total += other.total;
        self.polar += other.polar;
        self.apolar += other.apolar;
        self.unknown += other.unknown;
        self.main_chain += other.main_chain;
        self.side_chain += other.side_chain;
    }

    /// Normalizes this breakdown by a reference, field by field.
    pub fn relative_to(&self, reference: &AreaBreakdown) -> RelativeAreaBreakdown {
        RelativeAreaBreakdown {
            total: ratio(self.total, reference.total),
            polar: ratio(self.polar, reference.polar),
            apolar: ratio(self.apolar, reference.apolar),
            main_chain: ratio(self.main_chain, reference.main_chain),
            side_chain: ratio(self.side_chain, reference.side_chain),
        }
    }
}

/// Absolute area divided by reference area. A zero reference field yields NaN.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct RelativeAreaBreakdown {
    pub total: f64,
    pub polar: f64,
    pub apolar: f64,
    pub main_chain: f64,
    pub side_chain: f64,
}

fn ratio(value: f64, reference: f64) -> f64 {
    if reference == 0.0 {
        f64::NAN
    } else {
        value / reference
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_atom_keeps_both_partitions_consistent() {
        let mut area = AreaBreakdown::default();
        area.add_atom(1.0, AtomClass::Polar, true);
        area.add_atom(2.0, AtomClass::Apolar, false);
        area.add_atom(0.5, AtomClass::Unknown, false);

        assert_eq!(area.total, 3.5);
        assert_eq!(area.polar, 1.0);
        assert_eq!(area.apolar, 2.0);
        assert_eq!(area.unknown, 0.5);
        assert_eq!(area.main_chain, 1.0);
        assert_eq!(area.side_chain, 2.5);
        assert_eq!(area.total, area.polar + area.apolar + area.unknown);
        assert_eq!(area.total, area.main_chain + area.side_chain);
    }

    #[test]
    fn accumulate_sums_every_field() {
        let mut a = AreaBreakdown::reference(1.0, 2.0, 1.5, 1.5);
        let b = AreaBreakdown::reference(3.0, 4.0, 5.0, 2.0);
        a.accumulate(&b);
        assert_eq!(a.total, 10.0);
        assert_eq!(a.main_chain, 4.0);
        assert_eq!(a.side_chain, 6.0);
        assert_eq!(a.polar, 6.5);
        assert_eq!(a.apolar, 3.5);
    }

    #[test]
    fn relative_to_divides_field_by_field() {
        let mut area = AreaBreakdown::default();
        area.add_atom(10.0, AtomClass::Polar, true);
        area.add_atom(30.0, AtomClass::Apolar, false);
        let reference = AreaBreakdown::reference(20.0, 60.0, 20.0, 60.0);

        let relative = area.relative_to(&reference);
        assert_eq!(relative.total, 0.5);
        assert_eq!(relative.main_chain, 0.5);
        assert_eq!(relative.side_chain, 0.5);
        assert_eq!(relative.polar, 0.5);
        assert_eq!(relative.apolar, 0.5);
    }

    #[test]
    fn zero_reference_yields_nan_never_infinity() {
        let mut area = AreaBreakdown::default();
        area.add_atom(5.0, AtomClass::Polar, true);
        let reference = AreaBreakdown::reference(10.0, 0.0, 10.0, 0.0);

        let relative = area.relative_to(&reference);
        assert!(relative.side_chain.is_nan());
        assert!(relative.apolar.is_nan());
        assert!(!relative.total.is_infinite());
        assert_eq!(relative.main_chain, 0.5);

        let zero = AreaBreakdown::default().relative_to(&AreaBreakdown::default());
        assert!(zero.total.is_nan());
    }
}
