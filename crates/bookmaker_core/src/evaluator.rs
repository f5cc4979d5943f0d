//! crates/bookmaker_core/src/evaluator.rs
//!
//! The pure half of an evaluation pass: which locked achievements pass now.

use crate::context::EvaluationContext;
use crate::domain::{AchievementDefinition, ActionCounters, LastEvent};
use crate::predicates::{self, Inputs};
use std::collections::HashSet;

/// Definitions that are not yet unlocked and whose rule passes, in catalog order.
pub fn newly_passing<'d>(
    catalog: &'d [AchievementDefinition],
    unlocked: &HashSet<String>,
    ctx: &EvaluationContext<'_>,
    counters: &ActionCounters,
    last_event: Option<&LastEvent>,
) -> Vec<&'d AchievementDefinition> {
    let inputs = Inputs {
        ctx,
        counters,
        last_event,
    };
    catalog
        .iter()
        .filter(|def| !unlocked.contains(&def.id))
        .filter(|def| predicates::evaluate(&def.rule, &inputs))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::fixtures::{book, date};
    use serde_json::json;

    fn catalog() -> Vec<AchievementDefinition> {
        serde_json::from_value(json!([
            {"id": "first", "name": "First", "rule": {"type": "TOTAL_READS", "gte": 1}},
            {"id": "bogus", "name": "Bogus", "rule": {"type": "NOT_A_REAL_TYPE"}},
            {"id": "ten", "name": "Ten", "rule": {"type": "TOTAL_READS", "gte": 10}},
            {"id": "pair", "name": "Pair", "rule": {"type": "TOTAL_READS", "gte": 2}}
        ]))
        .unwrap()
    }

    #[test]
    fn keeps_catalog_order_and_skips_unlocked() {
        let books = vec![book("A", "", "2024-01-01"), book("B", "", "2024-01-02")];
        let ctx = EvaluationContext::build(&books, date("2024-01-31"));
        let catalog = catalog();
        let counters = ActionCounters::default();

        let ids: Vec<&str> = newly_passing(&catalog, &HashSet::new(), &ctx, &counters, None)
            .iter()
            .map(|d| d.id.as_str())
            .collect();
        assert_eq!(ids, vec!["first", "pair"]);

        let unlocked: HashSet<String> = ["first".to_string()].into_iter().collect();
        let ids: Vec<&str> = newly_passing(&catalog, &unlocked, &ctx, &counters, None)
            .iter()
            .map(|d| d.id.as_str())
            .collect();
        assert_eq!(ids, vec!["pair"]);
    }
}
