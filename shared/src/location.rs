use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a place is on the map. Each category renders with its own marker color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Visited,
    Resided,
    Wanted,
}

/// Fill color used when a color name is missing or unknown.
pub const DEFAULT_COLOR: &str = "red";

impl Category {
    pub const ALL: [Category; 3] = [Category::Visited, Category::Resided, Category::Wanted];

    /// CSS color name used as the marker fill.
    pub fn color(self) -> &'static str {
        match self {
            Category::Visited => "red",
            Category::Resided => "green",
            Category::Wanted => "blue",
        }
    }

    /// Legend text for the category.
    pub fn label(self) -> &'static str {
        match self {
            Category::Visited => "Visited",
            Category::Resided => "Lived here",
            Category::Wanted => "Want to go",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocationEntry {
    pub name: &'static str,
    pub longitude: f64,
    pub latitude: f64,
    pub category: Category,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RegistryError {
    #[error("location registry is empty")]
    Empty,
    #[error("location #{index} has an empty name")]
    EmptyName { index: usize },
    #[error("location {name:?} has longitude {value} outside [-180, 180]")]
    Longitude { name: String, value: f64 },
    #[error("location {name:?} has latitude {value} outside [-90, 90]")]
    Latitude { name: String, value: f64 },
}

const fn entry(name: &'static str, longitude: f64, latitude: f64, category: Category) -> LocationEntry {
    LocationEntry {
        name,
        longitude,
        latitude,
        category,
    }
}

/// Every place shown on the map, in draw order.
pub static LOCATIONS: &[LocationEntry] = &[
    entry("Lyon", 4.8552, 45.7774, Category::Resided),
    entry("Paris", 2.3522, 48.8566, Category::Resided),
    entry("Grenoble", 5.7245, 45.1885, Category::Resided),
    entry("Annecy", 6.1294, 45.8992, Category::Visited),
    entry("Marseille", 5.3698, 43.2965, Category::Visited),
    entry("Nice", 7.2620, 43.7102, Category::Visited),
    entry("Bordeaux", -0.5792, 44.8378, Category::Visited),
    entry("Strasbourg", 7.7521, 48.5734, Category::Visited),
    entry("Geneva", 6.1432, 46.2044, Category::Visited),
    entry("Barcelona", 2.1734, 41.3851, Category::Visited),
    entry("Turin", 7.6869, 45.0703, Category::Visited),
    entry("London", -0.1276, 51.5072, Category::Visited),
    entry("Berlin", 13.4050, 52.5200, Category::Wanted),
    entry("Lisbon", -9.1393, 38.7223, Category::Wanted),
    entry("Rome", 12.4964, 41.9028, Category::Wanted),
    entry("Edinburgh", -3.1883, 55.9533, Category::Wanted),
];

pub fn locations() -> &'static [LocationEntry] {
    LOCATIONS
}

impl LocationEntry {
    /// Check coordinate ranges. `index` is only used to name unnamed entries in errors.
    pub fn validate(&self, index: usize) -> Result<(), RegistryError> {
        if self.name.trim().is_empty() {
            return Err(RegistryError::EmptyName { index });
        }
        if !self.longitude.is_finite() || !(-180.0..=180.0).contains(&self.longitude) {
            return Err(RegistryError::Longitude {
                name: self.name.to_string(),
                value: self.longitude,
            });
        }
        if !self.latitude.is_finite() || !(-90.0..=90.0).contains(&self.latitude) {
            return Err(RegistryError::Latitude {
                name: self.name.to_string(),
                value: self.latitude,
            });
        }
        Ok(())
    }
}

/// Validate a whole registry, stopping at the first bad entry.
pub fn validate_registry(entries: &[LocationEntry]) -> Result<(), RegistryError> {
    if entries.is_empty() {
        return Err(RegistryError::Empty);
    }
    entries
        .iter()
        .enumerate()
        .try_for_each(|(index, entry)| entry.validate(index))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_registry_is_valid() {
        assert_eq!(validate_registry(locations()), Ok(()));
    }

    #[test]
    fn builtin_registry_starts_at_lyon() {
        let first = locations()[0];
        assert_eq!(first.name, "Lyon");
        assert_eq!(first.category, Category::Resided);
    }

    #[test]
    fn registry_names_are_unique() {
        let mut names: Vec<_> = locations().iter().map(|e| e.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), locations().len());
    }

    #[test]
    fn empty_registry_is_rejected() {
        assert_eq!(validate_registry(&[]), Err(RegistryError::Empty));
    }

    #[test]
    fn out_of_range_coordinates_are_rejected() {
        let bad_lon = entry("East", 181.0, 0.0, Category::Visited);
        assert!(matches!(
            validate_registry(&[bad_lon]),
            Err(RegistryError::Longitude { value, .. }) if value == 181.0
        ));

        let bad_lat = entry("North", 0.0, -90.5, Category::Visited);
        assert!(matches!(
            validate_registry(&[bad_lat]),
            Err(RegistryError::Latitude { value, .. }) if value == -90.5
        ));

        let nan = entry("Nowhere", f64::NAN, 0.0, Category::Visited);
        assert!(matches!(
            nan.validate(0),
            Err(RegistryError::Longitude { .. })
        ));
    }

    #[test]
    fn boundary_coordinates_are_accepted() {
        let corner = entry("Corner", -180.0, 90.0, Category::Wanted);
        assert_eq!(corner.validate(0), Ok(()));
    }

    #[test]
    fn first_failure_names_the_entry() {
        let entries = [
            entry("Fine", 1.0, 1.0, Category::Visited),
            entry(" ", 1.0, 1.0, Category::Visited),
            entry("Broken", 500.0, 1.0, Category::Visited),
        ];
        let err = validate_registry(&entries).unwrap_err();
        assert_eq!(err, RegistryError::EmptyName { index: 1 });
        assert_eq!(err.to_string(), "location #1 has an empty name");
    }

    #[test]
    fn categories_have_distinct_colors_and_labels() {
        let colors: Vec<_> = Category::ALL.iter().map(|c| c.color()).collect();
        assert_eq!(colors, ["red", "green", "blue"]);
        assert_eq!(Category::Visited.color(), DEFAULT_COLOR);
        assert_eq!(Category::Resided.label(), "Lived here");
        let mut labels: Vec<_> = Category::ALL.iter().map(|c| c.label()).collect();
        labels.sort_unstable();
        labels.dedup();
        assert_eq!(labels.len(), Category::ALL.len());
    }

    #[test]
    fn category_serializes_lowercase() {
        let json = serde_json::to_string(&Category::Resided).unwrap();
        assert_eq!(json, "\"resided\"");
        let back: Category = serde_json::from_str("\"wanted\"").unwrap();
        assert_eq!(back, Category::Wanted);
    }
}
