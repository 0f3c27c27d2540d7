//! Dataset catalog parsing and selection.
//!
//! The catalog is one SDMX-JSON document listing every dataset ("key
//! family"). It is loaded once per run and passed around as a [`Catalog`].

use census_core::dataset::filter_by_year_tag;
use census_core::{DatasetDescriptor, Error, YearProfile};
use serde::Deserialize;
use serde_json::Value;

/// Annotation title that carries the `census_{year}` source tags.
const SOURCES_ANNOTATION: &str = "contenttype/sources";

#[derive(Debug, Deserialize)]
struct CatalogDocument {
    structure: Structure,
}

#[derive(Debug, Deserialize)]
struct Structure {
    keyfamilies: KeyFamilies,
}

#[derive(Debug, Deserialize)]
struct KeyFamilies {
    #[serde(default)]
    keyfamily: Vec<KeyFamily>,
}

#[derive(Debug, Deserialize)]
struct KeyFamily {
    id: String,
    name: Text,
    #[serde(default)]
    annotations: Option<Annotations>,
    components: Components,
}

#[derive(Debug, Deserialize)]
struct Text {
    value: String,
}

#[derive(Debug, Deserialize)]
struct Annotations {
    #[serde(default)]
    annotation: Vec<Annotation>,
}

#[derive(Debug, Deserialize)]
struct Annotation {
    #[serde(default)]
    annotationtitle: String,
    #[serde(default)]
    annotationtext: Value,
}

#[derive(Debug, Deserialize)]
struct Components {
    #[serde(default)]
    dimension: Vec<Dimension>,
}

#[derive(Debug, Deserialize)]
struct Dimension {
    conceptref: String,
}

/// Flatten an annotation text that may be a string, a list, or a scalar.
fn annotation_texts(value: Value) -> Vec<String> {
    match value {
        Value::Null => Vec::new(),
        Value::String(s) => vec![s],
        Value::Array(items) => items.into_iter().flat_map(annotation_texts).collect(),
        other => vec![other.to_string()],
    }
}

impl From<KeyFamily> for DatasetDescriptor {
    fn from(family: KeyFamily) -> Self {
        let source_tags = family
            .annotations
            .map(|a| a.annotation)
            .unwrap_or_default()
            .into_iter()
            .filter(|a| a.annotationtitle == SOURCES_ANNOTATION)
            .flat_map(|a| annotation_texts(a.annotationtext))
            .collect();

        DatasetDescriptor {
            table_id: family.id,
            table_name: family.name.value,
            dimensions: family.components.dimension.into_iter().map(|d| d.conceptref).collect(),
            source_tags,
        }
    }
}

/// Every dataset definition, in catalog order.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    datasets: Vec<DatasetDescriptor>,
}

impl Catalog {
    /// Parse the catalog document.
    pub fn parse(body: &str) -> Result<Self, Error> {
        let document: CatalogDocument =
            serde_json::from_str(body).map_err(|e| Error::InvalidResponse(format!("catalog: {e}")))?;
        let datasets = document
            .structure
            .keyfamilies
            .keyfamily
            .into_iter()
            .map(DatasetDescriptor::from)
            .collect();
        Ok(Self { datasets })
    }

    pub fn from_datasets(datasets: Vec<DatasetDescriptor>) -> Self {
        Self { datasets }
    }

    pub fn datasets(&self) -> &[DatasetDescriptor] {
        &self.datasets
    }

    pub fn len(&self) -> usize {
        self.datasets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.datasets.is_empty()
    }

    /// Datasets tagged for `year`.
    pub fn for_year(&self, year: i32) -> Vec<&DatasetDescriptor> {
        filter_by_year_tag(&self.datasets, year)
    }

    /// Datasets a profile loads: year tag first, then the table selection.
    pub fn select(&self, profile: &YearProfile) -> Vec<&DatasetDescriptor> {
        self.for_year(profile.year)
            .into_iter()
            .filter(|d| profile.selection.matches(d))
            .collect()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use census_core::TableSelection;
    use serde_json::json;

    pub(crate) fn keyfamily(id: &str, name: &str, year_text: Value, dims: &[&str]) -> Value {
        json!({
            "id": id,
            "agencyid": "NOMIS",
            "name": { "value": name, "lang": "en" },
            "annotations": { "annotation": [
                { "annotationtitle": "Status", "annotationtext": "Current (being actively updated)" },
                { "annotationtitle": SOURCES_ANNOTATION, "annotationtext": year_text },
            ]},
            "components": {
                "dimension": dims
                    .iter()
                    .map(|d| json!({ "codelist": format!("CL_{d}"), "conceptref": d }))
                    .collect::<Vec<_>>(),
                "primarymeasure": { "conceptref": "OBS_VALUE" },
            }
        })
    }

    pub(crate) fn catalog_json(families: Vec<Value>) -> String {
        json!({ "structure": { "header": { "id": "none" }, "keyfamilies": { "keyfamily": families } } }).to_string()
    }

    fn sample() -> Catalog {
        let plain = ["GEOGRAPHY", "CELL", "MEASURES", "FREQ"];
        Catalog::parse(&catalog_json(vec![
            keyfamily(
                "NM_1_1",
                "UV001 - Usual resident population",
                json!("census_2001"),
                &["GEOGRAPHY", "C_SEX", "MEASURES", "FREQ"],
            ),
            keyfamily(
                "NM_2_1",
                "ST001 - Age by sex",
                json!("census_2001"),
                &["GEOGRAPHY", "C_AGE", "C_SEX", "MEASURES", "FREQ"],
            ),
            keyfamily("NM_3_1", "KS001 - Usual resident population", json!(["census_2001", "nomis"]), &plain),
            keyfamily("NM_4_1", "1991 census - local base statistics", json!("census_1991"), &plain),
        ]))
        .unwrap()
    }

    #[test]
    fn test_parse_descriptors() {
        let catalog = sample();
        assert_eq!(catalog.len(), 4);
        let first = &catalog.datasets()[0];
        assert_eq!(first.table_id, "NM_1_1");
        assert_eq!(first.table_name, "UV001 - Usual resident population");
        assert_eq!(first.dimensions, ["GEOGRAPHY", "C_SEX", "MEASURES", "FREQ"]);
        assert_eq!(first.source_tags, ["census_2001"]);
    }

    #[test]
    fn test_array_annotation_text() {
        let catalog = sample();
        assert_eq!(catalog.datasets()[2].source_tags, ["census_2001", "nomis"]);
        assert!(catalog.datasets()[2].has_year_tag(2001));
    }

    #[test]
    fn test_for_year_preserves_order() {
        let ids: Vec<_> = sample().for_year(2001).iter().map(|d| d.table_id.clone()).collect();
        assert_eq!(ids, ["NM_1_1", "NM_2_1", "NM_3_1"]);
    }

    #[test]
    fn test_select_with_profile() {
        let catalog = sample();
        let uv_ks = YearProfile::new(2001, TableSelection { prefixes: vec!["UV".into(), "KS".into()], names: vec![] });
        let ids: Vec<_> = catalog.select(&uv_ks).iter().map(|d| d.table_id.clone()).collect();
        assert_eq!(ids, ["NM_1_1", "NM_3_1"]);

        let profiles = YearProfile::defaults();
        let ids: Vec<_> = catalog.select(&profiles[1]).iter().map(|d| d.table_id.clone()).collect();
        assert_eq!(ids, ["NM_4_1"]);
    }

    #[test]
    fn test_missing_annotations_means_no_tags() {
        let body = catalog_json(vec![json!({
            "id": "NM_9_1",
            "name": { "value": "untagged" },
            "components": { "dimension": [] }
        })]);
        let catalog = Catalog::parse(&body).unwrap();
        assert!(catalog.datasets()[0].source_tags.is_empty());
        assert!(catalog.for_year(2001).is_empty());
    }

    #[test]
    fn test_invalid_document() {
        assert!(matches!(Catalog::parse("{\"structure\": {}}"), Err(Error::InvalidResponse(_))));
        assert!(matches!(Catalog::parse("<html>"), Err(Error::InvalidResponse(_))));
    }
}
