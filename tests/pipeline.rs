use std::io::Write;
use std::sync::Arc;

use censo_dashboard::config::DashboardConfig;
use censo_dashboard::dashboard::{DashboardSession, SectionData, SectionId};
use censo_dashboard::data::schema::int_codes;
use censo_dashboard::data::{
    DataLoader, DataSource, FilterSelection, IndicatorGroup, LabelMap, LoadError, Pipeline,
    SchemaError, UNMAPPED_LABEL,
};
use censo_dashboard::geo::RegionLookup;
use censo_dashboard::stats::CorrelationCalculator;
use tempfile::NamedTempFile;

const WATER_HEADER: &str = "IN_AGUA_POTAVEL;IN_AGUA_REDE_PUBLICA;IN_AGUA_POCO_ARTESIANO;IN_AGUA_CACIMBA;IN_AGUA_FONTE_RIO;IN_AGUA_INEXISTENTE";

fn write_latin1(lines: &[&str]) -> NamedTempFile {
    let mut tmp = NamedTempFile::new().unwrap();
    for line in lines {
        // Characters below U+0100 map to a single Latin-1 byte
        let bytes: Vec<u8> = line.chars().map(|c| c as u32 as u8).collect();
        tmp.write_all(&bytes).unwrap();
        tmp.write_all(b"\n").unwrap();
    }
    tmp.flush().unwrap();
    tmp
}

fn load(tmp: &NamedTempFile) -> Arc<censo_dashboard::Dataset> {
    let mut loader = DataLoader::default();
    loader
        .load(&DataSource::Path(tmp.path().to_path_buf()))
        .unwrap()
}

fn census_file() -> NamedTempFile {
    write_latin1(&[
        &format!("NO_REGIAO;TP_DEPENDENCIA;TP_LOCALIZACAO;IN_ENERGIA_RENOVAVEL;{}", WATER_HEADER),
        "Sul;1;1;1;1;1;0;0;0;0",
        " sul ;2;2;0;1;0;1;0;0;0",
        "Nordeste;3;2;0;0;0;0;1;0;0",
        "Região Inválida;4;1;0;1;1;0;0;0;0",
        "SUDESTE;9;3;1;1;1;0;0;0;0",
    ])
}

#[test]
fn test_scenario_a_dependency_summary() {
    let tmp = write_latin1(&["TP_DEPENDENCIA", "1", "2", "2"]);
    let dataset = load(&tmp);

    let selection: FilterSelection = [1, 2].into_iter().collect();
    let view = Pipeline::filter(&dataset, &selection).unwrap();
    let table = Pipeline::categorical_summary(&view, &LabelMap::dependency()).unwrap();

    assert_eq!(table.get("Federal"), Some(1.0));
    assert_eq!(table.get("Estadual"), Some(2.0));
    assert_eq!(table.total(), 3.0);
}

#[test]
fn test_scenario_b_water_sums() {
    let tmp = write_latin1(&[
        &format!("TP_DEPENDENCIA;{}", WATER_HEADER),
        "3;0;0;0;0;0;1",
        "3;0;0;0;0;0;0",
    ]);
    let dataset = load(&tmp);
    let view = Pipeline::filter(&dataset, &FilterSelection::all(&LabelMap::dependency())).unwrap();

    let table = Pipeline::indicator_sums(&view, &IndicatorGroup::water_supply()).unwrap();
    assert_eq!(table.labels().last(), Some(&"Sem Água"));
    assert_eq!(table.get("Sem Água"), Some(1.0));
    for (label, value) in table.entries() {
        if label != "Sem Água" {
            assert_eq!(*value, 0.0, "{label}");
        }
    }
}

#[test]
fn test_scenario_c_missing_indicator_column() {
    let tmp = write_latin1(&["TP_DEPENDENCIA;IN_AGUA_POTAVEL", "1;1"]);
    let dataset = load(&tmp);
    let view = Pipeline::filter(&dataset, &[1].into_iter().collect()).unwrap();

    let err = Pipeline::indicator_sums(&view, &IndicatorGroup::water_supply()).unwrap_err();
    match err {
        SchemaError::MissingColumns { columns, .. } => {
            assert!(columns.contains(&"IN_AGUA_INEXISTENTE".to_string()));
            assert!(!columns.contains(&"IN_AGUA_POTAVEL".to_string()));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_scenario_d_empty_selection() {
    let tmp = census_file();
    let dataset = load(&tmp);
    let view = Pipeline::filter(&dataset, &FilterSelection::none()).unwrap();

    assert_eq!(view.row_count(), 0);
    for map in [LabelMap::dependency(), LabelMap::location(), LabelMap::renewable_energy()] {
        let table = Pipeline::categorical_summary(&view, &map).unwrap();
        assert!(table.is_all_zero());
    }
    let water = Pipeline::indicator_sums(&view, &IndicatorGroup::water_supply()).unwrap();
    assert!(water.is_all_zero());
}

#[test]
fn test_filter_is_subset_for_every_selection() {
    let tmp = census_file();
    let dataset = load(&tmp);
    let domain = LabelMap::dependency().codes();

    // Every subset of the four dependency codes
    for mask in 0u32..16 {
        let selection: FilterSelection = domain
            .iter()
            .enumerate()
            .filter(|(i, _)| mask & (1 << i) != 0)
            .map(|(_, c)| *c)
            .collect();

        let view = Pipeline::filter(&dataset, &selection).unwrap();
        assert!(view.row_count() <= dataset.row_count());

        let codes = int_codes(view.frame(), "TP_DEPENDENCIA", "test").unwrap();
        assert!(codes.iter().all(|c| c.is_some_and(|c| selection.contains(c))));

        let summary = Pipeline::categorical_summary(&view, &LabelMap::location()).unwrap();
        assert_eq!(summary.total(), view.row_count() as f64);
    }
}

#[test]
fn test_unmapped_codes_surface_in_summary() {
    let tmp = census_file();
    let dataset = load(&tmp);
    let everything: FilterSelection = [1, 2, 3, 4, 9].into_iter().collect();
    let view = Pipeline::filter(&dataset, &everything).unwrap();

    let dependency = Pipeline::categorical_summary(&view, &LabelMap::dependency()).unwrap();
    assert_eq!(dependency.get(UNMAPPED_LABEL), Some(1.0));

    let location = Pipeline::categorical_summary(&view, &LabelMap::location()).unwrap();
    assert_eq!(location.get(UNMAPPED_LABEL), Some(1.0));
    assert_eq!(location.total(), 5.0);
}

#[test]
fn test_region_counts_and_markers() {
    let tmp = census_file();
    let dataset = load(&tmp);
    let lookup = RegionLookup::builtin();
    let view = Pipeline::filter(&dataset, &FilterSelection::all(&LabelMap::dependency())).unwrap();

    let counts = Pipeline::region_counts(&view, "NO_REGIAO", &lookup.names()).unwrap();
    assert_eq!(counts.get("SUL"), Some(2.0));
    assert_eq!(counts.get("REGIÃO INVÁLIDA"), Some(1.0));

    let markers = lookup.markers_for(&counts);
    assert!(markers.iter().all(|m| m.name != "Região Inválida"));
    assert!(markers.iter().any(|m| m.name == "Sul" && m.count == 2.0));
}

#[test]
fn test_correlation_over_full_dataset() {
    let tmp = census_file();
    let dataset = load(&tmp);
    let columns: Vec<String> = ["TP_DEPENDENCIA", "TP_LOCALIZACAO", "IN_ENERGIA_RENOVAVEL", "NOPE"]
        .iter()
        .map(|s| s.to_string())
        .collect();

    let matrix = CorrelationCalculator::compute(&dataset, &columns).unwrap();
    assert_eq!(matrix.size(), 3);
    assert_eq!(matrix.skipped, vec!["NOPE".to_string()]);
    for i in 0..3 {
        assert_eq!(matrix.get(i, i), 1.0);
        for j in 0..3 {
            assert_eq!(matrix.get(i, j), matrix.get(j, i));
            assert!((-1.0..=1.0).contains(&matrix.get(i, j)));
        }
    }
}

#[test]
fn test_session_isolates_broken_sections() {
    let tmp = census_file();
    let dataset = load(&tmp);
    let mut session =
        DashboardSession::new(dataset, DashboardConfig::default(), RegionLookup::builtin());
    let snapshot = session.recompute();

    assert_eq!(snapshot.total_rows, 5);
    // Code 9 is outside the default selection
    assert_eq!(snapshot.row_count, 4);

    let water = snapshot.section(SectionId::WaterSupply).unwrap();
    assert!(matches!(water.result, Ok(SectionData::Table(_))));

    let waste = snapshot.section(SectionId::WasteTreatment).unwrap();
    assert!(waste.result.is_err());
    let race = snapshot.section(SectionId::RaceColor).unwrap();
    assert!(race.result.is_err());
    assert_eq!(snapshot.warnings().len(), 2);

    let correlation = snapshot.section(SectionId::Correlation).unwrap();
    match &correlation.result {
        Ok(SectionData::Heatmap(m)) => assert!(m.skipped.iter().any(|c| c.starts_with("IN_TRATAMENTO_LIXO"))),
        other => panic!("unexpected correlation section: {other:?}"),
    }
}

#[test]
fn test_delimiter_mismatch_is_load_error() {
    let tmp = write_latin1(&["TP_DEPENDENCIA,TP_LOCALIZACAO", "1,1"]);
    let mut loader = DataLoader::default();
    let err = loader
        .load(&DataSource::Path(tmp.path().to_path_buf()))
        .unwrap_err();
    assert!(matches!(err, LoadError::DelimiterMismatch { .. }));
}

#[test]
fn test_fractional_codes_from_csv() {
    let tmp = write_latin1(&["TP_DEPENDENCIA;TP_LOCALIZACAO", "1.7;1.9", "2;2.5"]);
    let dataset = load(&tmp);

    let only_federal: FilterSelection = [1].into_iter().collect();
    let view = Pipeline::filter(&dataset, &only_federal).unwrap();
    assert_eq!(view.row_count(), 0);

    let view = Pipeline::filter(&dataset, &FilterSelection::all(&LabelMap::dependency())).unwrap();
    assert_eq!(view.row_count(), 1);
    let location = Pipeline::categorical_summary(&view, &LabelMap::location()).unwrap();
    assert_eq!(location.get("Rural"), Some(0.0));
    assert_eq!(location.get(UNMAPPED_LABEL), Some(1.0));
}

#[test]
fn test_fractional_location_codes_are_unmapped() {
    let tmp = write_latin1(&["TP_DEPENDENCIA;TP_LOCALIZACAO", "1;1.9", "2;2.5"]);
    let dataset = load(&tmp);
    let view = Pipeline::filter(&dataset, &FilterSelection::all(&LabelMap::dependency())).unwrap();

    let location = Pipeline::categorical_summary(&view, &LabelMap::location()).unwrap();
    assert_eq!(location.get("Urbana"), Some(0.0));
    assert_eq!(location.get("Rural"), Some(0.0));
    assert_eq!(location.get(UNMAPPED_LABEL), Some(2.0));
}

#[test]
fn test_text_codes_from_csv() {
    let tmp = write_latin1(&["TP_DEPENDENCIA;TP_LOCALIZACAO", "2.0;1", "x;2", "3;2.0"]);
    let dataset = load(&tmp);

    let view = Pipeline::filter(&dataset, &[2, 3].into_iter().collect()).unwrap();
    assert_eq!(view.row_count(), 2);

    let location = Pipeline::categorical_summary(&view, &LabelMap::location()).unwrap();
    assert_eq!(location.get("Urbana"), Some(1.0));
    assert_eq!(location.get("Rural"), Some(1.0));
    assert_eq!(location.get(UNMAPPED_LABEL), None);
}
