//! Fixed species catalog shared by the directory filter and the classifier.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SpeciesId(pub i32);

impl SpeciesId {
    /// Sentinel for names the catalog does not know.
    pub const UNKNOWN: SpeciesId = SpeciesId(-1);

    pub fn is_known(self) -> bool {
        self != Self::UNKNOWN
    }
}

/// Catalog order defines the ids the classifier was trained with. Append only.
const SPECIES: &[&str] = &[
    "cod",
    "pollock",
    "mackerel",
    "sea trout",
    "salmon",
    "trout",
    "perch",
    "pike",
    "char",
    "haddock",
    "halibut",
    "whitefish",
];

#[derive(Clone, Copy, Debug, Default)]
pub struct SpeciesCatalog;

impl SpeciesCatalog {
    pub fn id_of(&self, name: &str) -> SpeciesId {
        let normalized = name.trim().to_lowercase();
        SPECIES
            .iter()
            .position(|known| *known == normalized)
            .map(|index| SpeciesId(index as i32))
            .unwrap_or(SpeciesId::UNKNOWN)
    }

    pub fn name_of(&self, id: SpeciesId) -> Option<&'static str> {
        usize::try_from(id.0).ok().and_then(|index| SPECIES.get(index)).copied()
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> {
        SPECIES.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::{SpeciesCatalog, SpeciesId};

    #[test]
    fn lookup_is_case_and_whitespace_insensitive() {
        let catalog = SpeciesCatalog;
        assert_eq!(catalog.id_of("  Cod "), SpeciesId(0));
        assert_eq!(catalog.id_of("SEA TROUT"), SpeciesId(3));
    }

    #[test]
    fn unknown_names_map_to_sentinel() {
        let catalog = SpeciesCatalog;
        let id = catalog.id_of("kraken");

        assert_eq!(id, SpeciesId::UNKNOWN);
        assert!(!id.is_known());
        assert_eq!(catalog.name_of(id), None);
    }

    #[test]
    fn mapping_is_bidirectional() {
        let catalog = SpeciesCatalog;
        for name in catalog.names() {
            let id = catalog.id_of(name);
            assert_eq!(catalog.name_of(id), Some(name));
        }
        assert_eq!(catalog.name_of(SpeciesId(999)), None);
    }
}
