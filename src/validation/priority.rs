// ============================================================================
// Consumer Priority
// Effective consumer ordering fed to the settlement engine
// ============================================================================

use crate::domain::{ConsumerSelection, ConsumptionUnit};
use std::cmp::Ordering;

/// Selected consumers in the order they are served.
///
/// Excluded consumers are dropped (with `exclude_by_default`, only explicitly
/// included consumers are kept). The rest are sorted by priority ascending,
/// ties broken by site name. Consumers without an explicit priority follow
/// all prioritised ones. Site id is the final tie-break so the order is total.
pub fn order_consumers<'a>(
    consumers: &'a [ConsumptionUnit],
    selection: &ConsumerSelection,
) -> Vec<&'a ConsumptionUnit> {
    let mut ordered: Vec<&ConsumptionUnit> = consumers
        .iter()
        .filter(|c| selection.is_selected(&c.site_id))
        .collect();

    ordered.sort_by(|a, b| compare(a, b, selection));
    ordered
}

fn compare(a: &ConsumptionUnit, b: &ConsumptionUnit, selection: &ConsumerSelection) -> Ordering {
    let pa = selection.priority(&a.site_id);
    let pb = selection.priority(&b.site_id);

    let by_priority = match (pa, pb) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };

    by_priority
        .then_with(|| a.site_name.cmp(&b.site_name))
        .then_with(|| a.site_id.cmp(&b.site_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::MonthKey;

    fn consumer(id: &str, name: &str) -> ConsumptionUnit {
        let month: MonthKey = "042024".parse().unwrap();
        ConsumptionUnit::new(id, name, "CCO", month, [10; 5])
    }

    fn ids(ordered: &[&ConsumptionUnit]) -> Vec<String> {
        ordered.iter().map(|c| c.site_id.to_string()).collect()
    }

    #[test]
    fn test_priority_ascending() {
        let consumers = vec![consumer("A", "Alpha"), consumer("B", "Beta"), consumer("C", "Gamma")];
        let selection = ConsumerSelection::new()
            .with_priority("A", 3)
            .with_priority("B", 1)
            .with_priority("C", 2);

        assert_eq!(ids(&order_consumers(&consumers, &selection)), vec!["B", "C", "A"]);
    }

    #[test]
    fn test_ties_broken_by_name() {
        let consumers = vec![consumer("X1", "Zinc works"), consumer("X2", "Aluminium works")];
        let selection = ConsumerSelection::new().with_priority("X1", 1).with_priority("X2", 1);

        assert_eq!(ids(&order_consumers(&consumers, &selection)), vec!["X2", "X1"]);
    }

    #[test]
    fn test_unprioritised_go_last() {
        let consumers = vec![consumer("A", "Alpha"), consumer("B", "Beta")];
        let selection = ConsumerSelection::new().with_priority("B", 99);

        assert_eq!(ids(&order_consumers(&consumers, &selection)), vec!["B", "A"]);
    }

    #[test]
    fn test_exclusion() {
        let consumers = vec![consumer("A", "Alpha"), consumer("B", "Beta")];
        let selection = ConsumerSelection::new().exclude("A");
        assert_eq!(ids(&order_consumers(&consumers, &selection)), vec!["B"]);
    }

    #[test]
    fn test_exclude_by_default_keeps_only_included() {
        let consumers = vec![consumer("A", "Alpha"), consumer("B", "Beta"), consumer("C", "Gamma")];
        let selection = ConsumerSelection::new()
            .exclude_by_default(true)
            .include("C")
            .include("A");
        assert_eq!(ids(&order_consumers(&consumers, &selection)), vec!["A", "C"]);
    }
}
