use crate::error::{PipelineError, Result};

use super::model::{DensityField, PointArray};

/// Base name of the electron-density point arrays.
pub const DENSITY_FIELD: &str = "electron_density";

/// Whether `name` ends with `electron_density`, optionally followed by
/// `_<digits>` (case-insensitive).
pub fn is_density_field(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    let stem = match lower.rsplit_once('_') {
        Some((head, digits))
            if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) =>
        {
            head
        }
        _ => lower.as_str(),
    };
    stem.ends_with(DENSITY_FIELD)
}

/// Numeric step suffix of a field name (`electron_density_3` → 3), 1 if absent.
pub fn step_index(name: &str) -> u64 {
    name.rsplit_once('_')
        .and_then(|(_, digits)| {
            if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                None
            } else {
                digits.parse().ok()
            }
        })
        .unwrap_or(1)
}

/// Pick the density fields out of a mesh's point data.
///
/// One-component arrays are kept as 1-D fields; vector and tensor arrays are
/// skipped. The result is ordered by step index (stable for equal indices).
pub fn select_density_fields(point_data: &[PointArray]) -> Result<Vec<DensityField>> {
    let mut selected: Vec<DensityField> = point_data
        .iter()
        .filter(|array| is_density_field(&array.name))
        .filter_map(|array| {
            if array.components != 1 {
                log::debug!(
                    "skipping '{}': {} components per point",
                    array.name,
                    array.components
                );
                return None;
            }
            Some(DensityField {
                name: array.name.clone(),
                values: array.values.clone(),
            })
        })
        .collect();

    if selected.is_empty() {
        return Err(PipelineError::NoFieldsFound);
    }

    selected.sort_by_key(|field| step_index(&field.name));
    Ok(selected)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_matching() {
        assert!(is_density_field("electron_density"));
        assert!(is_density_field("Electron_density"));
        assert!(is_density_field("electron_density_12"));
        assert!(is_density_field("plasma_electron_density_2"));
        assert!(!is_density_field("electron_density_x"));
        assert!(!is_density_field("electron_density_"));
        assert!(!is_density_field("electron_temperature_1"));
        assert!(!is_density_field("electron_density_rate"));
    }

    #[test]
    fn step_suffix_defaults_to_one() {
        assert_eq!(step_index("electron_density"), 1);
        assert_eq!(step_index("electron_density_7"), 7);
        assert_eq!(step_index("electron_density_x"), 1);
    }

    #[test]
    fn fields_sorted_by_step_and_vectors_dropped() {
        let data = vec![
            PointArray::scalar("electron_density_10", vec![10.0]),
            PointArray::scalar("electron_temperature_1", vec![0.5]),
            PointArray {
                name: "electron_density_3".into(),
                components: 3,
                values: vec![1.0, 2.0, 3.0],
            },
            PointArray::scalar("electron_density_2", vec![2.0]),
            PointArray::scalar("electron_density", vec![1.0]),
        ];
        let fields = select_density_fields(&data).unwrap();
        let names: Vec<&str> = fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["electron_density", "electron_density_2", "electron_density_10"]
        );
    }

    #[test]
    fn no_match_is_an_error() {
        let data = vec![PointArray::scalar("potential", vec![1.0])];
        assert!(matches!(
            select_density_fields(&data),
            Err(PipelineError::NoFieldsFound)
        ));
    }
}
