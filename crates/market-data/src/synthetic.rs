//! Stand-in data for when no input files are present.
//!
//! The price walk is seeded, so two runs with the same configuration produce
//! byte-identical series.

use chrono::NaiveDate;
use configuration::SyntheticConfig;
use core_types::{Event, PriceFrame, PriceSample};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f64::consts::PI;

/// Generates a daily geometric random walk:
/// `p[0] = initial_price`, `p[i] = p[i-1] * (1 + N(drift, volatility))`.
pub fn generate_price_frame(config: &SyntheticConfig, column: &str) -> PriceFrame {
    let mut rng = StdRng::seed_from_u64(config.seed);

    let dates: Vec<NaiveDate> = config
        .start_date
        .iter_days()
        .take_while(|d| *d <= config.end_date)
        .collect();

    let mut samples = Vec::with_capacity(dates.len());
    let mut price = config.initial_price;
    for (i, date) in dates.into_iter().enumerate() {
        if i > 0 {
            let daily_return = config.drift + config.volatility * standard_normal(&mut rng);
            price *= 1.0 + daily_return;
        }
        samples.push(PriceSample { date, price });
    }

    PriceFrame::from_samples(column, &samples)
}

/// Box-Muller transform over two uniform draws.
fn standard_normal(rng: &mut StdRng) -> f64 {
    let u1: f64 = rng.gen_range(f64::EPSILON..1.0);
    let u2: f64 = rng.gen_range(0.0..1.0);
    (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
}

/// A handful of well-known oil market events.
pub fn sample_events() -> Vec<Event> {
    let event = |date: (i32, u32, u32), event_type: &str, description: &str, impact: &str, severity: &str| Event {
        event_date: NaiveDate::from_ymd_opt(date.0, date.1, date.2),
        event_type: Some(event_type.to_string()),
        impact_type: Some(impact.to_string()),
        severity: Some(severity.to_string()),
        description: Some(description.to_string()),
        ..Event::default()
    };

    vec![
        event((2008, 9, 15), "Economic", "Lehman Brothers collapse", "Demand Shock", "Very High"),
        event((2014, 11, 27), "OPEC", "OPEC decides not to cut production", "Supply Shock", "High"),
        event((2020, 3, 9), "Economic", "COVID-19 pandemic impact", "Demand Shock", "Very High"),
        event((2022, 2, 24), "Geopolitical", "Russia-Ukraine conflict", "Supply Shock", "Very High"),
    ]
}
