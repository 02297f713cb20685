//! Priority rationale as ordered decision tables.
//!
//! The base table is evaluated top to bottom and always ends in a catch-all
//! rule, so exactly one base sentence is chosen. The efficiency table then
//! appends at most one note.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::types::Score;

const IMPACT_HIGH: Decimal = dec!(70);
const FEASIBILITY_READY: Decimal = dec!(60);
const EFFICIENCY_LOW: Decimal = dec!(40);
const EFFICIENCY_HIGH: Decimal = dec!(70);

/// The three normalized factors a rationale is chosen from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FactorScores {
    pub impact: Score,
    pub feasibility: Score,
    pub efficiency: Score,
}

/// A (predicate, template) pair.
#[derive(Clone, Copy)]
pub struct RationaleRule {
    pub applies: fn(&FactorScores) -> bool,
    pub text: &'static str,
}

fn high_impact_ready(s: &FactorScores) -> bool {
    s.impact >= IMPACT_HIGH && s.feasibility >= FEASIBILITY_READY
}

fn high_impact_weak_base(s: &FactorScores) -> bool {
    s.impact >= IMPACT_HIGH && s.feasibility < FEASIBILITY_READY
}

fn moderate_impact_ready(s: &FactorScores) -> bool {
    s.impact < IMPACT_HIGH && s.feasibility >= FEASIBILITY_READY
}

fn always(_: &FactorScores) -> bool {
    true
}

fn costly(s: &FactorScores) -> bool {
    s.efficiency < EFFICIENCY_LOW
}

fn efficient(s: &FactorScores) -> bool {
    s.efficiency >= EFFICIENCY_HIGH
}

pub const BASE_RULES: [RationaleRule; 4] = [
    RationaleRule {
        applies: high_impact_ready,
        text: "Large untapped volume with an existing foothold, suitable for an immediate push",
    },
    RationaleRule {
        applies: high_impact_weak_base,
        text: "Large untapped volume but a weak base, start with a small-scope pilot",
    },
    RationaleRule {
        applies: moderate_impact_ready,
        text: "Moderate upside with fast execution, a steady complement",
    },
    RationaleRule {
        applies: always,
        text: "Limited upside and feasibility, track at low cost",
    },
];

pub const EFFICIENCY_RULES: [RationaleRule; 2] = [
    RationaleRule {
        applies: costly,
        text: "higher expected investment intensity",
    },
    RationaleRule {
        applies: efficient,
        text: "favorable investment efficiency",
    },
];

fn first_match(rules: &[RationaleRule], scores: &FactorScores) -> Option<&'static str> {
    rules.iter().find(|r| (r.applies)(scores)).map(|r| r.text)
}

/// Compose the rationale for one record.
pub fn rationale_for(scores: &FactorScores) -> String {
    let base = first_match(&BASE_RULES, scores).unwrap_or(BASE_RULES[3].text);
    match first_match(&EFFICIENCY_RULES, scores) {
        Some(note) => format!("{base}; {note}"),
        None => base.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scores(impact: Decimal, feasibility: Decimal, efficiency: Decimal) -> FactorScores {
        FactorScores {
            impact,
            feasibility,
            efficiency,
        }
    }

    #[test]
    fn test_each_base_branch() {
        assert_eq!(
            rationale_for(&scores(dec!(80), dec!(60), dec!(50))),
            BASE_RULES[0].text
        );
        assert_eq!(
            rationale_for(&scores(dec!(70), dec!(59.9), dec!(50))),
            BASE_RULES[1].text
        );
        assert_eq!(
            rationale_for(&scores(dec!(69.9), dec!(90), dec!(50))),
            BASE_RULES[2].text
        );
        assert_eq!(
            rationale_for(&scores(dec!(10), dec!(10), dec!(50))),
            BASE_RULES[3].text
        );
    }

    #[test]
    fn test_efficiency_notes() {
        let costly_text = rationale_for(&scores(dec!(10), dec!(10), dec!(39.9)));
        assert!(costly_text.ends_with("; higher expected investment intensity"));
        let efficient_text = rationale_for(&scores(dec!(10), dec!(10), dec!(70)));
        assert!(efficient_text.ends_with("; favorable investment efficiency"));
        let neutral = rationale_for(&scores(dec!(10), dec!(10), dec!(40)));
        assert!(!neutral.contains(';'));
    }

    #[test]
    fn test_base_table_is_exhaustive() {
        for i in [dec!(0), dec!(69.99), dec!(70), dec!(100)] {
            for f in [dec!(0), dec!(59.99), dec!(60), dec!(100)] {
                let matched = BASE_RULES
                    .iter()
                    .filter(|r| (r.applies)(&scores(i, f, dec!(50))))
                    .count();
                // the catch-all always matches in addition to at most one specific rule
                assert!(matched == 1 || matched == 2, "i={i} f={f}");
            }
        }
    }
}
