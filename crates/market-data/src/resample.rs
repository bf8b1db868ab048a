use chrono::{Datelike, Duration, NaiveDate};
use core_types::{Column, Frequency, PriceFrame};
use tracing::info;

/// Downsamples a frame to calendar bins, keeping the last observed value of
/// each column per bin.
///
/// Weekly bins end on Sunday and monthly bins on the last day of the month;
/// the bin end is the new index date. Bins without any observation are kept
/// with missing cells so the index stays regular.
pub fn resample_last(frame: &PriceFrame, frequency: Frequency) -> PriceFrame {
    if frequency == Frequency::Daily {
        return frame.clone();
    }
    let (Some(first), Some(last)) = (frame.first_date(), frame.last_date()) else {
        return frame.clone();
    };

    let mut labels = Vec::new();
    let final_label = bin_end(last, frequency);
    let mut label = bin_end(first, frequency);
    while label <= final_label {
        labels.push(label);
        match label.succ_opt() {
            Some(next_day) => label = bin_end(next_day, frequency),
            None => break,
        }
    }

    let columns = frame
        .columns()
        .iter()
        .map(|column| {
            let mut cells = vec![None; labels.len()];
            for (date, value) in frame.dates().iter().zip(&column.values) {
                let (Some(v), Ok(bin)) = (value, labels.binary_search(&bin_end(*date, frequency))) else {
                    continue;
                };
                cells[bin] = Some(*v);
            }
            Column::new(column.name.clone(), cells)
        })
        .collect();

    info!(?frequency, bins = labels.len(), "Resampled price data.");
    PriceFrame::new(labels, columns).unwrap_or_else(|_| frame.clone())
}

/// Last date of the bin containing `date`.
fn bin_end(date: NaiveDate, frequency: Frequency) -> NaiveDate {
    match frequency {
        Frequency::Daily => date,
        Frequency::Weekly => {
            let to_sunday = 6 - i64::from(date.weekday().num_days_from_monday());
            date + Duration::days(to_sunday)
        }
        Frequency::Monthly => {
            let (year, month) = if date.month() == 12 {
                (date.year() + 1, 1)
            } else {
                (date.year(), date.month() + 1)
            };
            NaiveDate::from_ymd_opt(year, month, 1)
                .and_then(|d| d.pred_opt())
                .unwrap_or(date)
        }
    }
}
