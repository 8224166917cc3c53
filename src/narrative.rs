// Static cause attribution for report highlights.
//
// The table is fixed domain knowledge: built once on first use, read-only
// afterwards, never updated from data.
use once_cell::sync::Lazy;
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Increase,
    Decrease,
}

impl Direction {
    /// Direction of a percentage change; zero counts as an increase.
    pub fn of(pct: f64) -> Self {
        if pct < 0.0 {
            Direction::Decrease
        } else {
            Direction::Increase
        }
    }
}

struct Causes {
    increase: &'static str,
    decrease: &'static str,
}

const fn causes(increase: &'static str, decrease: &'static str) -> Causes {
    Causes { increase, decrease }
}

const GAS: Causes = causes(
    "Expansion of the gas grid and switching from coal and oil to gas for heating and process heat.",
    "Efficiency improvements, milder winters and the start of a shift to electric heating.",
);
const OIL: Causes = causes(
    "Growth in road and air travel and in freight activity.",
    "Improved vehicle efficiency, fuel switching and reduced travel activity.",
);

// Keys are lower-case fuel labels.
static CAUSES: Lazy<HashMap<&'static str, Causes>> = Lazy::new(|| {
    HashMap::from([
        (
            "coal",
            causes(
                "Short-term switching to coal when gas prices spiked, or a temporary rise in heavy industrial output.",
                "Closure of coal-fired plant and heavy industry, together with carbon pricing that made coal uncompetitive.",
            ),
        ),
        (
            "manufactured fuel",
            causes(
                "Higher coke and breeze use tied to iron and steel production.",
                "Contraction of the iron and steel sector and closure of coke ovens.",
            ),
        ),
        ("natural gas", GAS),
        ("gas", GAS),
        ("petroleum", OIL),
        ("oil", OIL),
        (
            "electricity",
            causes(
                "Electrification of heat and transport and growth in electrical equipment.",
                "More efficient lighting and appliances and the decline of energy-intensive manufacturing.",
            ),
        ),
        (
            "bioenergy & waste",
            causes(
                "Renewable heat incentives and blending mandates for biofuels.",
                "Withdrawal of support schemes or reduced availability of feedstock.",
            ),
        ),
        (
            "heat sold",
            causes(
                "New district heating networks and combined heat and power schemes.",
                "Closure of industrial combined heat and power sites.",
            ),
        ),
    ])
});

/// Specific cause for `fuel` moving in `direction`, if one is known.
pub fn cause(fuel: &str, direction: Direction) -> Option<&'static str> {
    let key = fuel.trim().to_lowercase();
    CAUSES.get(key.as_str()).map(|c| match direction {
        Direction::Increase => c.increase,
        Direction::Decrease => c.decrease,
    })
}

/// Direction-only text used when no specific cause is known.
pub fn generic_cause(direction: Direction) -> &'static str {
    match direction {
        Direction::Increase => "This likely reflects higher activity in the sector or substitution towards this fuel.",
        Direction::Decrease => "This likely reflects efficiency gains, lower activity or substitution towards other fuels.",
    }
}

pub fn cause_or_generic(fuel: &str, direction: Direction) -> &'static str {
    cause(fuel, direction).unwrap_or_else(|| generic_cause(direction))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_fuels_match_case_insensitively() {
        assert!(cause("Natural gas", Direction::Decrease).is_some());
        assert_eq!(
            cause("  ELECTRICITY ", Direction::Increase),
            cause("electricity", Direction::Increase)
        );
    }

    #[test]
    fn unknown_fuel_falls_back_to_direction_text() {
        assert_eq!(cause("Hydrogen", Direction::Increase), None);
        assert_eq!(
            cause_or_generic("Hydrogen", Direction::Increase),
            generic_cause(Direction::Increase)
        );
        assert_ne!(generic_cause(Direction::Increase), generic_cause(Direction::Decrease));
    }

    #[test]
    fn direction_follows_sign() {
        assert_eq!(Direction::of(12.0), Direction::Increase);
        assert_eq!(Direction::of(0.0), Direction::Increase);
        assert_eq!(Direction::of(-0.1), Direction::Decrease);
    }
}
