//! Dummy-variable (one-hot) encoding of categorical attributes
//!
//! Expands a categorical column into one 0/1 indicator column per distinct
//! category. Categories are ordered lexicographically and column names are
//! `{prefix}_{category}` (or the bare category name for an empty prefix).

use terrastat_core::{AttributeValue, Error, FeatureCollection, Result};

/// One-hot encoding of a categorical column.
#[derive(Debug, Clone)]
pub struct DummyEncoding {
    /// Output column names, one per category, lexicographic order
    pub names: Vec<String>,
    /// Indicator columns aligned with `names`; values are 0 or 1
    pub columns: Vec<Vec<i64>>,
}

impl DummyEncoding {
    /// Number of distinct categories.
    pub fn category_count(&self) -> usize {
        self.names.len()
    }

    /// Append every indicator column to a collection as an integer field.
    ///
    /// The source categorical field is left untouched, as the expansion is
    /// additive.
    pub fn apply_to(&self, collection: &mut FeatureCollection) -> Result<()> {
        for (name, column) in self.names.iter().zip(&self.columns) {
            let values = column.iter().map(|&v| AttributeValue::Int(v)).collect();
            collection.add_column(name, values)?;
        }
        Ok(())
    }
}

/// Encode a categorical column as dummy variables.
///
/// # Errors
///
/// [`Error::InsufficientData`] on empty input.
pub fn dummy_variables(values: &[String], prefix: &str) -> Result<DummyEncoding> {
    if values.is_empty() {
        return Err(Error::InsufficientData {
            needed: 1,
            actual: 0,
            what: "features",
        });
    }

    let mut categories: Vec<&String> = values.iter().collect();
    categories.sort();
    categories.dedup();

    let names = categories
        .iter()
        .map(|category| {
            if prefix.is_empty() {
                (*category).clone()
            } else {
                format!("{prefix}_{category}")
            }
        })
        .collect();

    let columns = categories
        .iter()
        .map(|category| {
            values
                .iter()
                .map(|v| i64::from(v == *category))
                .collect()
        })
        .collect();

    Ok(DummyEncoding { names, columns })
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_types::{point, Geometry};
    use terrastat_core::Feature;

    fn labels(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_categories_sorted_and_named() {
        let enc = dummy_variables(&labels(&["b", "a", "b", "c"]), "Cat").unwrap();
        assert_eq!(enc.names, vec!["Cat_a", "Cat_b", "Cat_c"]);
        assert_eq!(enc.category_count(), 3);
    }

    #[test]
    fn test_rows_are_one_hot() {
        let enc = dummy_variables(&labels(&["b", "a", "b"]), "d").unwrap();
        for row in 0..3 {
            let total: i64 = enc.columns.iter().map(|c| c[row]).sum();
            assert_eq!(total, 1, "row {} should have exactly one indicator", row);
        }
        // "b" is the second category after sorting.
        assert_eq!(enc.columns[1], vec![1, 0, 1]);
    }

    #[test]
    fn test_empty_prefix_uses_bare_category() {
        let enc = dummy_variables(&labels(&["x", "y"]), "").unwrap();
        assert_eq!(enc.names, vec!["x", "y"]);
    }

    #[test]
    fn test_single_category() {
        let enc = dummy_variables(&labels(&["only", "only"]), "c").unwrap();
        assert_eq!(enc.names, vec!["c_only"]);
        assert_eq!(enc.columns[0], vec![1, 1]);
    }

    #[test]
    fn test_empty_input_rejected() {
        assert!(matches!(
            dummy_variables(&[], "Cat"),
            Err(Error::InsufficientData { .. })
        ));
    }

    #[test]
    fn test_apply_to_collection() {
        let mut fc = FeatureCollection::new();
        for (x, zone) in [(0.0, "rural"), (1.0, "urban"), (2.0, "rural")] {
            let mut f = Feature::new(Geometry::Point(point! { x: x, y: 0.0 }));
            f.set_property("zone", AttributeValue::String(zone.to_string()));
            fc.push(f);
        }

        let zones = fc.string_column("zone").unwrap();
        let enc = dummy_variables(&zones, "Cat").unwrap();
        enc.apply_to(&mut fc).unwrap();

        assert_eq!(
            fc.numeric_column("Cat_rural").unwrap(),
            vec![1.0, 0.0, 1.0]
        );
        assert_eq!(
            fc.numeric_column("Cat_urban").unwrap(),
            vec![0.0, 1.0, 0.0]
        );
        // Original field survives.
        assert!(fc.string_column("zone").is_ok());
    }
}
