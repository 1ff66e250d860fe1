use std::collections::HashSet;

use crate::models::{CoverageGroup, MonthStamp};

/// Months between the group's first and last observation with no statement, ascending.
pub fn detect_gaps(group: &CoverageGroup) -> Vec<MonthStamp> {
    let observed: HashSet<MonthStamp> = group.observed_months.iter().copied().collect();
    month_range(group.min_month, group.max_month)
        .filter(|m| !observed.contains(m))
        .collect()
}

/// Fill `gap_months` on every group.
pub fn analyze(groups: &mut [CoverageGroup]) {
    for group in groups.iter_mut() {
        group.gap_months = detect_gaps(group);
    }
}

/// Every month start from `from` to `to`, inclusive.
pub fn month_range(from: MonthStamp, to: MonthStamp) -> impl Iterator<Item = MonthStamp> {
    std::iter::successors(Some(from), move |m| {
        let next = m.next();
        (next <= to && next != *m).then_some(next)
    })
    .take_while(move |m| *m <= to)
}
