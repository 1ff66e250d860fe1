use std::collections::{BTreeMap, HashSet};

use crate::models::{CoverageGroup, CoverageRecord, HierarchyKey, MonthStamp};

/// Group coverage observations by hierarchy.
///
/// Repeated months within a group keep only their first occurrence. Groups come back
/// ordered by key; `gap_months` is left empty for the gap detector to fill.
pub fn aggregate<'a, I>(records: I) -> Vec<CoverageGroup>
where
    I: IntoIterator<Item = &'a CoverageRecord>,
{
    let mut observed: BTreeMap<&HierarchyKey, Vec<MonthStamp>> = BTreeMap::new();
    let mut seen: HashSet<(&HierarchyKey, MonthStamp)> = HashSet::new();

    for record in records {
        if seen.insert((&record.key, record.month)) {
            observed.entry(&record.key).or_default().push(record.month);
        }
    }

    observed
        .into_iter()
        .filter_map(|(key, months)| {
            let min_month = *months.iter().min()?;
            let max_month = *months.iter().max()?;
            Some(CoverageGroup {
                key: key.clone(),
                min_month,
                max_month,
                observed_months: months,
                gap_months: Vec::new(),
            })
        })
        .collect()
}
