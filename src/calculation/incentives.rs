//! Incentive aggregation.

use rust_decimal::Decimal;

use crate::models::{AuditStep, Incentive};

use super::round_money;

/// The summed incentives for one payslip, including the audit step.
#[derive(Debug, Clone)]
pub struct IncentiveTotal {
    /// Sum of the item amounts.
    pub total: Decimal,
    /// The items behind the total.
    pub items: Vec<Incentive>,
    /// The audit step recording this aggregation.
    pub audit_step: AuditStep,
}

/// Sums incentive items into a total addable to gross pay.
///
/// Negative amounts are not rejected here.
///
/// # Example
///
/// ```
/// use payroll_engine::calculation::total_incentives;
/// use payroll_engine::models::Incentive;
/// use rust_decimal::Decimal;
///
/// let items = vec![
///     Incentive { name: "Perfect Attendance".into(), amount: Decimal::new(500, 0), incentive_type: "bonus".into() },
///     Incentive { name: "Sales".into(), amount: Decimal::new(125050, 2), incentive_type: "commission".into() },
/// ];
/// assert_eq!(total_incentives(&items, 1).total, Decimal::new(175050, 2));
/// ```
pub fn total_incentives(items: &[Incentive], step_number: u32) -> IncentiveTotal {
    let items: Vec<Incentive> = items
        .iter()
        .map(|item| Incentive {
            amount: round_money(item.amount),
            ..item.clone()
        })
        .collect();
    let total: Decimal = items.iter().map(|item| item.amount).sum();

    let audit_step = AuditStep {
        step_number,
        rule_id: "incentive_total".to_string(),
        rule_name: "Incentive Total".to_string(),
        input: serde_json::json!({ "items": items }),
        output: serde_json::json!({ "total": total.to_string() }),
        reasoning: format!("{} incentive item(s) totalling ${}", items.len(), total),
    };

    IncentiveTotal {
        total,
        items,
        audit_step,
    }
}
