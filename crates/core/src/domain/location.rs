use serde::{Deserialize, Serialize};

use crate::geo::GeoPoint;

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LocationId(pub String);

impl std::fmt::Display for LocationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A named spot nested inside a directory record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SubLocation {
    pub category: String,
    pub name: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub species: Option<Vec<String>>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub id: LocationId,
    pub name: String,
    pub position: GeoPoint,
    #[serde(default)]
    pub sub_locations: Vec<SubLocation>,
    #[serde(default)]
    pub rating: Option<u8>,
}

impl Location {
    pub fn new(id: impl Into<String>, name: impl Into<String>, position: GeoPoint) -> Self {
        Self {
            id: LocationId(id.into()),
            name: name.into(),
            position,
            sub_locations: Vec::new(),
            rating: None,
        }
    }

    pub fn with_sub_location(mut self, sub_location: SubLocation) -> Self {
        self.sub_locations.push(sub_location);
        self
    }

    pub fn with_rating(mut self, rating: u8) -> Self {
        self.rating = Some(rating);
        self
    }

    /// Name shown to the user. Collapsed directory records carry the
    /// meaningful name on their first sub-location.
    pub fn display_name(&self) -> &str {
        self.sub_locations
            .first()
            .map(|sub| sub.name.trim())
            .filter(|name| !name.is_empty())
            .unwrap_or(self.name.as_str())
    }

    /// Case-insensitive match against the species listed on any sub-location.
    pub fn supports_species(&self, species: &str) -> bool {
        let wanted = species.trim().to_lowercase();
        self.sub_locations.iter().filter_map(|sub| sub.species.as_ref()).flatten().any(|name| {
            name.trim().to_lowercase() == wanted
        })
    }
}
