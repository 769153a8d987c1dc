//! Per-hour energy balance checks.

use super::types::HourDispatch;

/// Absolute tolerance for balance checks, scaled up for large flows.
pub const BALANCE_TOLERANCE: f64 = 1e-9;

/// Demand-side residual: `self_consumed + imported_from_grid - demand`.
pub fn demand_residual(demand: f64, dispatch: &HourDispatch) -> f64 {
    dispatch.self_consumed + dispatch.imported_from_grid - demand
}

/// Supply-side residual including storage flow:
/// `self_consumed + exported + curtailed + charged - generation - discharged`.
pub fn supply_residual(generation: f64, dispatch: &HourDispatch) -> f64 {
    dispatch.self_consumed + dispatch.exported + dispatch.curtailed + dispatch.charged()
        - generation
        - dispatch.discharged()
}

fn tolerance(scale: f64) -> f64 {
    BALANCE_TOLERANCE * scale.abs().max(1.0)
}

/// Checks both balance equations and the sign of every flow.
///
/// # Returns
///
/// `None` when the hour balances, otherwise a description of the first
/// broken rule.
pub fn imbalance(demand: f64, generation: f64, dispatch: &HourDispatch) -> Option<String> {
    let flows = [
        ("self_consumed", dispatch.self_consumed),
        ("exported", dispatch.exported),
        ("imported_from_grid", dispatch.imported_from_grid),
        ("curtailed", dispatch.curtailed),
    ];
    for (name, value) in flows {
        if !value.is_finite() || value < 0.0 {
            return Some(format!("{name} = {value} is not a finite non-negative value"));
        }
    }
    if !dispatch.stored_delta.is_finite() {
        return Some(format!("stored_delta = {} is not finite", dispatch.stored_delta));
    }

    let scale = demand.max(generation).max(dispatch.stored_delta.abs());
    let d = demand_residual(demand, dispatch);
    if d.abs() > tolerance(scale) {
        return Some(format!(
            "self_consumed + imported_from_grid misses demand {demand} by {d:e}"
        ));
    }
    let s = supply_residual(generation, dispatch);
    if s.abs() > tolerance(scale) {
        return Some(format!(
            "supply side misses generation {generation} by {s:e} (stored_delta {})",
            dispatch.stored_delta
        ));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pure_export_balances() {
        let d = HourDispatch {
            self_consumed: 10.0,
            exported: 5.0,
            ..HourDispatch::default()
        };
        assert_eq!(imbalance(10.0, 15.0, &d), None);
    }

    #[test]
    fn discharge_counts_as_supply() {
        // demand 4 met by 1 solar + 3 from storage
        let d = HourDispatch {
            self_consumed: 4.0,
            stored_delta: -3.0,
            ..HourDispatch::default()
        };
        assert_eq!(imbalance(4.0, 1.0, &d), None);
    }

    #[test]
    fn charge_counts_as_sink() {
        let d = HourDispatch {
            self_consumed: 2.0,
            exported: 1.0,
            curtailed: 0.5,
            stored_delta: 1.5,
            ..HourDispatch::default()
        };
        assert_eq!(imbalance(2.0, 5.0, &d), None);
    }

    #[test]
    fn missing_import_is_flagged() {
        let d = HourDispatch {
            self_consumed: 2.0,
            ..HourDispatch::default()
        };
        let msg = imbalance(3.0, 2.0, &d);
        assert!(msg.is_some_and(|m| m.contains("demand")));
    }

    #[test]
    fn dropped_surplus_is_flagged() {
        let d = HourDispatch {
            self_consumed: 1.0,
            ..HourDispatch::default()
        };
        let msg = imbalance(1.0, 3.0, &d);
        assert!(msg.is_some_and(|m| m.contains("generation")));
    }

    #[test]
    fn negative_flow_is_flagged() {
        let d = HourDispatch {
            self_consumed: 2.0,
            imported_from_grid: -1.0,
            exported: 0.0,
            ..HourDispatch::default()
        };
        assert!(imbalance(1.0, 2.0, &d).is_some());
    }

    #[test]
    fn float_noise_is_tolerated() {
        let d = HourDispatch {
            self_consumed: 0.1 + 0.2,
            ..HourDispatch::default()
        };
        assert_eq!(imbalance(0.3, 0.3, &d), None);
    }
}
