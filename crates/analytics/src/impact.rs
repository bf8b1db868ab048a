use core_types::AlignedEvent;
use core_types::numeric::{max, mean, median, min, sample_std};
use serde::Serialize;

/// Aligned events grouped by category. Groups appear in the order their
/// first member appears in the input.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventCategories<'a> {
    pub by_event_type: Vec<(String, Vec<&'a AlignedEvent>)>,
    pub by_impact_type: Vec<(String, Vec<&'a AlignedEvent>)>,
}

/// Summary statistics of `price_change_pct` over one group of events.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImpactSummary {
    pub category: String,
    pub count: usize,
    pub mean_price_change_pct: Option<f64>,
    pub median_price_change_pct: Option<f64>,
    pub std_price_change_pct: Option<f64>,
    pub max_price_change_pct: Option<f64>,
    pub min_price_change_pct: Option<f64>,
}

impl ImpactSummary {
    fn from_group(category: String, members: &[&AlignedEvent]) -> Self {
        let pct: Vec<f64> = members
            .iter()
            .filter_map(|e| e.metrics.price_change_pct)
            .collect();
        Self {
            category,
            count: members.len(),
            mean_price_change_pct: mean(&pct),
            median_price_change_pct: median(&pct),
            std_price_change_pct: sample_std(&pct),
            max_price_change_pct: max(&pct),
            min_price_change_pct: min(&pct),
        }
    }
}

pub fn categorize_events(events: &[AlignedEvent]) -> EventCategories<'_> {
    EventCategories {
        by_event_type: group_by(events, |e| e.event.event_type.as_deref()),
        by_impact_type: group_by(events, |e| e.event.impact_type.as_deref()),
    }
}

/// One `Overall` row, then one `Type: ..` row per event type and one
/// `Impact: ..` row per impact type. Empty input gives no rows.
pub fn calculate_event_impact_statistics(events: &[AlignedEvent]) -> Vec<ImpactSummary> {
    if events.is_empty() {
        return Vec::new();
    }
    let all: Vec<&AlignedEvent> = events.iter().collect();
    let categories = categorize_events(events);

    std::iter::once(ImpactSummary::from_group("Overall".to_string(), &all))
        .chain(
            categories
                .by_event_type
                .iter()
                .map(|(name, members)| ImpactSummary::from_group(format!("Type: {name}"), members)),
        )
        .chain(
            categories
                .by_impact_type
                .iter()
                .map(|(name, members)| ImpactSummary::from_group(format!("Impact: {name}"), members)),
        )
        .collect()
}

fn group_by<'a, F>(events: &'a [AlignedEvent], key: F) -> Vec<(String, Vec<&'a AlignedEvent>)>
where
    F: Fn(&AlignedEvent) -> Option<&str>,
{
    let mut groups: Vec<(String, Vec<&'a AlignedEvent>)> = Vec::new();
    for event in events {
        let Some(k) = key(event) else { continue };
        match groups.iter_mut().find(|(name, _)| name == k) {
            Some((_, members)) => members.push(event),
            None => groups.push((k.to_string(), vec![event])),
        }
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::{Event, ImpactMetrics};

    fn aligned(event_type: Option<&str>, impact: Option<&str>, pct: Option<f64>) -> AlignedEvent {
        AlignedEvent {
            event: Event {
                event_type: event_type.map(str::to_string),
                impact_type: impact.map(str::to_string),
                ..Event::default()
            },
            metrics: ImpactMetrics {
                price_change_pct: pct,
                ..ImpactMetrics::default()
            },
        }
    }

    fn sample() -> Vec<AlignedEvent> {
        vec![
            aligned(Some("OPEC"), Some("Supply Shock"), Some(-10.0)),
            aligned(Some("Economic"), Some("Demand Shock"), Some(4.0)),
            aligned(Some("OPEC"), None, Some(2.0)),
            aligned(None, Some("Supply Shock"), None),
        ]
    }

    #[test]
    fn groups_in_first_appearance_order() {
        let events = sample();
        let categories = categorize_events(&events);
        let types: Vec<(&str, usize)> = categories
            .by_event_type
            .iter()
            .map(|(n, m)| (n.as_str(), m.len()))
            .collect();
        assert_eq!(types, vec![("OPEC", 2), ("Economic", 1)]);
        assert_eq!(categories.by_impact_type[0].0, "Supply Shock");
        assert_eq!(categories.by_impact_type[0].1.len(), 2);
    }

    #[test]
    fn rows_are_ordered_overall_types_impacts() {
        let rows = calculate_event_impact_statistics(&sample());
        let names: Vec<&str> = rows.iter().map(|r| r.category.as_str()).collect();
        assert_eq!(
            names,
            vec!["Overall", "Type: OPEC", "Type: Economic", "Impact: Supply Shock", "Impact: Demand Shock"]
        );

        let overall = &rows[0];
        assert_eq!(overall.count, 4);
        assert_eq!(overall.median_price_change_pct, Some(2.0));
        assert_eq!(overall.max_price_change_pct, Some(4.0));
        assert_eq!(overall.min_price_change_pct, Some(-10.0));

        // The untyped member has no percentage but still counts.
        let supply = &rows[3];
        assert_eq!(supply.count, 2);
        assert_eq!(supply.mean_price_change_pct, Some(-10.0));
        assert_eq!(supply.std_price_change_pct, None);
    }

    #[test]
    fn empty_input_has_no_rows() {
        assert!(calculate_event_impact_statistics(&[]).is_empty());
    }
}
