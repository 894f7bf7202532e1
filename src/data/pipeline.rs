//! Aggregation Pipeline
//! Filters the dataset by dependency and builds chart-ready summary tables.

use crate::data::labels::{IndicatorGroup, LabelMap, DEPENDENCY_COLUMN};
use crate::data::schema::{self, SchemaError};
use crate::data::summary::{SummaryTable, UNMAPPED_LABEL};
use crate::data::Dataset;
use polars::prelude::*;
use std::collections::BTreeSet;

/// Dependency codes chosen by the user. Empty means "show nothing".
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilterSelection {
    codes: BTreeSet<i64>,
}

impl FilterSelection {
    pub fn none() -> Self {
        Self::default()
    }

    /// Every code of the dependency domain.
    pub fn all(domain: &LabelMap) -> Self {
        domain.codes().into_iter().collect()
    }

    /// Build from display labels; labels not in `domain` are ignored.
    pub fn from_labels<S: AsRef<str>>(domain: &LabelMap, labels: &[S]) -> Self {
        labels
            .iter()
            .filter_map(|l| domain.code_for(l.as_ref()))
            .collect()
    }

    pub fn contains(&self, code: i64) -> bool {
        self.codes.contains(&code)
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn codes(&self) -> impl Iterator<Item = i64> + '_ {
        self.codes.iter().copied()
    }
}

impl FromIterator<i64> for FilterSelection {
    fn from_iter<I: IntoIterator<Item = i64>>(iter: I) -> Self {
        Self {
            codes: iter.into_iter().collect(),
        }
    }
}

/// Rows of the dataset retained by a selection.
#[derive(Debug, Clone)]
pub struct FilteredView {
    frame: DataFrame,
}

impl FilteredView {
    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn row_count(&self) -> usize {
        self.frame.height()
    }

    pub fn is_empty(&self) -> bool {
        self.frame.height() == 0
    }
}

/// Stateless filter and aggregation operations.
pub struct Pipeline;

impl Pipeline {
    /// Keep rows whose dependency code is in `selection`. Null or
    /// non-integer codes never match.
    pub fn filter(dataset: &Dataset, selection: &FilterSelection) -> Result<FilteredView, SchemaError> {
        Self::filter_frame(dataset.frame(), selection)
    }

    pub fn filter_frame(df: &DataFrame, selection: &FilterSelection) -> Result<FilteredView, SchemaError> {
        if selection.is_empty() {
            return Ok(FilteredView { frame: df.clear() });
        }

        let codes = schema::int_codes(df, DEPENDENCY_COLUMN, "filter")?;
        let mask: BooleanChunked = codes
            .iter()
            .map(|code| code.is_some_and(|c| selection.contains(c)))
            .collect();

        let frame = df.filter(&mask).map_err(|e| SchemaError::Unreadable {
            context: "filter".to_string(),
            column: DEPENDENCY_COLUMN.to_string(),
            reason: e.to_string(),
        })?;

        log::debug!(
            "Filter kept {} of {} rows for {} dependency codes",
            frame.height(),
            df.height(),
            selection.len()
        );
        Ok(FilteredView { frame })
    }

    /// Count each code of `label_map.column`, keyed by label in domain order.
    /// Unknown, null and malformed values land in the unmapped bucket.
    pub fn categorical_summary(view: &FilteredView, label_map: &LabelMap) -> Result<SummaryTable, SchemaError> {
        let context = format!("summary of {}", label_map.column);
        let codes = schema::int_codes(view.frame(), &label_map.column, &context)?;

        let mut table: SummaryTable = label_map
            .entries
            .iter()
            .map(|e| (e.label.clone(), 0.0))
            .collect();
        let mut unmapped = 0usize;

        for code in codes {
            match code.and_then(|c| label_map.label_for(c)) {
                Some(label) => table.add(label, 1.0),
                None => unmapped += 1,
            }
        }

        if unmapped > 0 {
            log::debug!("{}: {} rows without a label", label_map.column, unmapped);
            table.push(UNMAPPED_LABEL, unmapped as f64);
        }
        Ok(table)
    }

    /// Sum every indicator column of `group`, labelled in legend order.
    /// All columns are checked before any arithmetic.
    pub fn indicator_sums(view: &FilteredView, group: &IndicatorGroup) -> Result<SummaryTable, SchemaError> {
        schema::require_columns(view.frame(), group.columns(), group.name())?;

        let mut table = SummaryTable::new();
        for (column, label) in group.columns().iter().zip(group.labels()) {
            let values = schema::float_values(view.frame(), column, group.name())?;
            let sum: f64 = values.into_iter().flatten().sum();
            table.push(label.clone(), sum);
        }
        Ok(table)
    }

    /// Count rows per region name after trim + uppercase normalization.
    /// Regions listed in `order` come first (zero if absent), then any
    /// others in first-seen order.
    pub fn region_counts(view: &FilteredView, column: &str, order: &[String]) -> Result<SummaryTable, SchemaError> {
        let names = schema::text_values(view.frame(), column, "region counts")?;

        let mut table: SummaryTable = order
            .iter()
            .map(|name| (normalize_key(name), 0.0))
            .collect();
        let mut unmapped = 0usize;

        for name in names {
            match name.map(|n| normalize_key(&n)).filter(|n| !n.is_empty()) {
                Some(key) => table.add(&key, 1.0),
                None => unmapped += 1,
            }
        }

        if unmapped > 0 {
            table.push(UNMAPPED_LABEL, unmapped as f64);
        }
        Ok(table)
    }
}

/// Trim and uppercase a region name so lookups ignore casing and padding.
pub fn normalize_key(name: &str) -> String {
    name.trim().to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset(codes: &[i64]) -> Dataset {
        let df = df!(DEPENDENCY_COLUMN => codes).unwrap();
        Dataset::new(df, "test")
    }

    #[test]
    fn test_scenario_a_dependency_counts() {
        let ds = dataset(&[1, 2, 2]);
        let selection: FilterSelection = [1, 2].into_iter().collect();
        let view = Pipeline::filter(&ds, &selection).unwrap();
        let table = Pipeline::categorical_summary(&view, &LabelMap::dependency()).unwrap();

        assert_eq!(table.get("Federal"), Some(1.0));
        assert_eq!(table.get("Estadual"), Some(2.0));
        assert_eq!(table.get("Municipal"), Some(0.0));
        assert_eq!(table.get(UNMAPPED_LABEL), None);
    }

    #[test]
    fn test_filter_retains_only_selected_codes() {
        let ds = dataset(&[1, 2, 3, 4, 3, 9]);
        let selection: FilterSelection = [3, 4].into_iter().collect();
        let view = Pipeline::filter(&ds, &selection).unwrap();

        let codes = schema::int_codes(view.frame(), DEPENDENCY_COLUMN, "t").unwrap();
        assert_eq!(codes.len(), 3);
        assert!(codes.iter().all(|c| matches!(c, Some(3) | Some(4))));
    }

    #[test]
    fn test_empty_selection_yields_empty_view() {
        let ds = dataset(&[1, 2, 3]);
        let view = Pipeline::filter(&ds, &FilterSelection::none()).unwrap();
        assert!(view.is_empty());
        assert!(schema::has_column(view.frame(), DEPENDENCY_COLUMN));
    }

    #[test]
    fn test_full_domain_keeps_everything() {
        let ds = dataset(&[4, 3, 2, 1]);
        let view = Pipeline::filter(&ds, &FilterSelection::all(&LabelMap::dependency())).unwrap();
        assert_eq!(view.row_count(), ds.row_count());
    }

    #[test]
    fn test_unmapped_codes_are_counted() {
        let df = df!("TP_LOCALIZACAO" => [Some(1i64), Some(2), Some(7), None]).unwrap();
        let view = FilteredView { frame: df };
        let table = Pipeline::categorical_summary(&view, &LabelMap::location()).unwrap();

        assert_eq!(table.get(UNMAPPED_LABEL), Some(2.0));
        assert_eq!(table.total(), 4.0);
        assert_eq!(table.labels().last(), Some(&UNMAPPED_LABEL));
    }

    #[test]
    fn test_indicator_sums_keep_legend_order() {
        let df = df!(
            "B" => [1i64, 1, 0],
            "A" => [0i64, 1, 1],
        )
        .unwrap();
        let view = FilteredView { frame: df };
        let group = IndicatorGroup::new(
            "g",
            vec!["A".into(), "B".into()],
            vec!["first".into(), "second".into()],
        )
        .unwrap();

        let table = Pipeline::indicator_sums(&view, &group).unwrap();
        assert_eq!(table.labels(), vec!["first", "second"]);
        assert_eq!(table.values(), vec![2.0, 2.0]);
    }

    #[test]
    fn test_indicator_sums_missing_column() {
        let df = df!("A" => [1i64]).unwrap();
        let view = FilteredView { frame: df };
        let group = IndicatorGroup::new(
            "g",
            vec!["A".into(), "Z".into()],
            vec!["a".into(), "z".into()],
        )
        .unwrap();

        let err = Pipeline::indicator_sums(&view, &group).unwrap_err();
        assert_eq!(err.columns(), vec!["Z".to_string()]);
    }

    #[test]
    fn test_region_counts_normalize_names() {
        let df = df!("NO_REGIAO" => [" sul ", "SUL", "Sul", "Norte"]).unwrap();
        let view = FilteredView { frame: df };
        let table = Pipeline::region_counts(&view, "NO_REGIAO", &["Norte".to_string()]).unwrap();

        assert_eq!(table.labels(), vec!["NORTE", "SUL"]);
        assert_eq!(table.get("SUL"), Some(3.0));
    }

    #[test]
    fn test_fractional_codes_are_never_selected() {
        let df = df!(DEPENDENCY_COLUMN => [1.7f64, 1.0, 2.0]).unwrap();
        let ds = Dataset::new(df, "test");
        let selection: FilterSelection = [1].into_iter().collect();
        let view = Pipeline::filter(&ds, &selection).unwrap();
        assert_eq!(view.row_count(), 1);
    }

    #[test]
    fn test_fractional_codes_land_in_unmapped_bucket() {
        let df = df!("TP_LOCALIZACAO" => [1.9f64, 2.5, 2.0]).unwrap();
        let view = FilteredView { frame: df };
        let table = Pipeline::categorical_summary(&view, &LabelMap::location()).unwrap();

        assert_eq!(table.get("Urbana"), Some(0.0));
        assert_eq!(table.get("Rural"), Some(1.0));
        assert_eq!(table.get(UNMAPPED_LABEL), Some(2.0));
    }
}
