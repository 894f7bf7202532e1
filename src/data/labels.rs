//! Label Tables
//! Versioned code → label lookups and indicator column groups.

use crate::config::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

pub const DEPENDENCY_COLUMN: &str = "TP_DEPENDENCIA";
pub const LOCATION_COLUMN: &str = "TP_LOCALIZACAO";
pub const RENEWABLE_ENERGY_COLUMN: &str = "IN_ENERGIA_RENOVAVEL";
pub const REGION_COLUMN: &str = "NO_REGIAO";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelEntry {
    pub code: i64,
    pub label: String,
}

/// Lookup table for one coded column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelMap {
    pub column: String,
    pub version: u32,
    pub entries: Vec<LabelEntry>,
}

impl LabelMap {
    pub fn new(column: &str, version: u32, entries: &[(i64, &str)]) -> Self {
        Self {
            column: column.to_string(),
            version,
            entries: entries
                .iter()
                .map(|(code, label)| LabelEntry {
                    code: *code,
                    label: label.to_string(),
                })
                .collect(),
        }
    }

    /// Administrative dependency (federal/state/municipal/private).
    pub fn dependency() -> Self {
        Self::new(
            DEPENDENCY_COLUMN,
            1,
            &[(1, "Federal"), (2, "Estadual"), (3, "Municipal"), (4, "Privada")],
        )
    }

    /// Urban/rural location.
    pub fn location() -> Self {
        Self::new(LOCATION_COLUMN, 1, &[(1, "Urbana"), (2, "Rural")])
    }

    /// Renewable energy flag.
    pub fn renewable_energy() -> Self {
        Self::new(
            RENEWABLE_ENERGY_COLUMN,
            1,
            &[(1, "Com Renovável"), (0, "Sem Renovável")],
        )
    }

    pub fn label_for(&self, code: i64) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.code == code)
            .map(|e| e.label.as_str())
    }

    pub fn code_for(&self, label: &str) -> Option<i64> {
        self.entries
            .iter()
            .find(|e| e.label == label)
            .map(|e| e.code)
    }

    pub fn codes(&self) -> Vec<i64> {
        self.entries.iter().map(|e| e.code).collect()
    }

    pub fn labels(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.label.as_str()).collect()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.entries.is_empty() {
            return Err(ConfigError::EmptyLabelMap(self.column.clone()));
        }
        let mut codes = HashSet::new();
        for entry in &self.entries {
            if !codes.insert(entry.code) {
                return Err(ConfigError::DuplicateCode {
                    column: self.column.clone(),
                    code: entry.code,
                });
            }
        }
        Ok(())
    }
}

/// Ordered indicator columns paired with their legend labels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawIndicatorGroup")]
pub struct IndicatorGroup {
    name: String,
    columns: Vec<String>,
    labels: Vec<String>,
}

#[derive(Deserialize)]
struct RawIndicatorGroup {
    name: String,
    columns: Vec<String>,
    labels: Vec<String>,
}

impl TryFrom<RawIndicatorGroup> for IndicatorGroup {
    type Error = ConfigError;

    fn try_from(raw: RawIndicatorGroup) -> Result<Self, Self::Error> {
        IndicatorGroup::new(&raw.name, raw.columns, raw.labels)
    }
}

impl IndicatorGroup {
    /// Columns and labels must line up one to one.
    pub fn new(
        name: &str,
        columns: Vec<String>,
        labels: Vec<String>,
    ) -> Result<Self, ConfigError> {
        if columns.len() != labels.len() {
            return Err(ConfigError::LengthMismatch {
                group: name.to_string(),
                columns: columns.len(),
                labels: labels.len(),
            });
        }
        if columns.is_empty() {
            return Err(ConfigError::EmptyGroup(name.to_string()));
        }
        Ok(Self {
            name: name.to_string(),
            columns,
            labels,
        })
    }

    fn from_static(name: &str, pairs: &[(&str, &str)]) -> Self {
        Self {
            name: name.to_string(),
            columns: pairs.iter().map(|(c, _)| c.to_string()).collect(),
            labels: pairs.iter().map(|(_, l)| l.to_string()).collect(),
        }
    }

    pub fn water_supply() -> Self {
        Self::from_static(
            "water_supply",
            &[
                ("IN_AGUA_POTAVEL", "Água Potável"),
                ("IN_AGUA_REDE_PUBLICA", "Rede Pública"),
                ("IN_AGUA_POCO_ARTESIANO", "Poço Artesiano"),
                ("IN_AGUA_CACIMBA", "Cacimba"),
                ("IN_AGUA_FONTE_RIO", "Fonte/Rio"),
                ("IN_AGUA_INEXISTENTE", "Sem Água"),
            ],
        )
    }

    pub fn waste_treatment() -> Self {
        Self::from_static(
            "waste_treatment",
            &[
                ("IN_TRATAMENTO_LIXO_SEPARACAO", "Separação"),
                ("IN_TRATAMENTO_LIXO_REUTILIZA", "Reutilização"),
                ("IN_TRATAMENTO_LIXO_RECICLAGEM", "Reciclagem"),
                ("IN_TRATAMENTO_LIXO_INEXISTENTE", "Sem Tratamento"),
            ],
        )
    }

    /// Basic-education enrollment by declared race/color.
    pub fn race_color_enrollment() -> Self {
        Self::from_static(
            "race_color_enrollment",
            &[
                ("QT_MAT_BAS_ND", "Não Declarada"),
                ("QT_MAT_BAS_BRANCA", "Branca"),
                ("QT_MAT_BAS_PRETA", "Preta"),
                ("QT_MAT_BAS_PARDA", "Parda"),
                ("QT_MAT_BAS_AMARELA", "Amarela"),
                ("QT_MAT_BAS_INDIGENA", "Indígena"),
            ],
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dependency_map_round_trip_lookup() {
        let map = LabelMap::dependency();
        assert_eq!(map.label_for(3), Some("Municipal"));
        assert_eq!(map.code_for("Privada"), Some(4));
        assert_eq!(map.label_for(9), None);
    }

    #[test]
    fn test_duplicate_code_rejected() {
        let map = LabelMap::new("X", 1, &[(1, "a"), (1, "b")]);
        assert!(matches!(
            map.validate(),
            Err(ConfigError::DuplicateCode { code: 1, .. })
        ));
    }

    #[test]
    fn test_indicator_group_length_mismatch() {
        let err = IndicatorGroup::new(
            "water",
            vec!["A".into(), "B".into()],
            vec!["a".into()],
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::LengthMismatch {
                columns: 2,
                labels: 1,
                ..
            }
        ));
    }

    #[test]
    fn test_deserialize_rejects_mismatched_group() {
        let json = r#"{"name":"w","columns":["A","B"],"labels":["a"]}"#;
        assert!(serde_json::from_str::<IndicatorGroup>(json).is_err());
    }

    #[test]
    fn test_builtin_groups_are_aligned() {
        for group in [
            IndicatorGroup::water_supply(),
            IndicatorGroup::waste_treatment(),
            IndicatorGroup::race_color_enrollment(),
        ] {
            assert_eq!(group.columns().len(), group.labels().len());
        }
    }
}
