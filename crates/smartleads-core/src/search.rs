use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ValidationError;

/// Smallest search radius the lead API accepts, in kilometres.
pub const MIN_RADIUS_KM: u32 = 1;
/// Largest search radius the lead API accepts, in kilometres.
pub const MAX_RADIUS_KM: u32 = 50;

/// Business categories the lead API can search for.
///
/// Serialized with the identifiers the API expects (`"restaurantes"`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Metalurgicas,
    Restaurantes,
    Hoteles,
    Abogados,
    Contadores,
    Inmobiliarias,
    Concesionarios,
}

impl Category {
    pub const ALL: [Category; 7] = [
        Category::Metalurgicas,
        Category::Restaurantes,
        Category::Hoteles,
        Category::Abogados,
        Category::Contadores,
        Category::Inmobiliarias,
        Category::Concesionarios,
    ];

    /// Wire identifier sent to the API.
    #[must_use]
    pub fn id(self) -> &'static str {
        match self {
            Category::Metalurgicas => "metalurgicas",
            Category::Restaurantes => "restaurantes",
            Category::Hoteles => "hoteles",
            Category::Abogados => "abogados",
            Category::Contadores => "contadores",
            Category::Inmobiliarias => "inmobiliarias",
            Category::Concesionarios => "concesionarios",
        }
    }

    /// Human-readable label for selectors.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Category::Metalurgicas => "Metalúrgicas",
            Category::Restaurantes => "Restaurantes",
            Category::Hoteles => "Hoteles",
            Category::Abogados => "Abogados",
            Category::Contadores => "Contadores",
            Category::Inmobiliarias => "Inmobiliarias",
            Category::Concesionarios => "Concesionarios",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Category {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Category::ALL
            .into_iter()
            .find(|c| c.id() == wanted)
            .ok_or_else(|| ValidationError::UnknownCategory(s.to_string()))
    }
}

/// A point on the map, in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    fn is_valid(self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// A company search as entered by the user.
///
/// Exactly one of `location` or `coordinates` must be set; the two forms come
/// from the free-text place field and the "use my location" button
/// respectively. Call [`SearchRequest::validate`] before submitting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub category: Category,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub coordinates: Option<Coordinates>,
    pub radius_km: u32,
}

impl SearchRequest {
    /// Search around a named place.
    #[must_use]
    pub fn near_place(category: Category, location: impl Into<String>, radius_km: u32) -> Self {
        Self {
            category,
            location: Some(location.into()),
            coordinates: None,
            radius_km,
        }
    }

    /// Search around a latitude/longitude pair.
    #[must_use]
    pub fn near_point(category: Category, latitude: f64, longitude: f64, radius_km: u32) -> Self {
        Self {
            category,
            location: None,
            coordinates: Some(Coordinates {
                latitude,
                longitude,
            }),
            radius_km,
        }
    }

    /// Checks the location form and radius constraints.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] found: missing or doubled
    /// location forms, a blank place name, out-of-range coordinates, or a
    /// radius outside `MIN_RADIUS_KM..=MAX_RADIUS_KM`.
    pub fn validate(&self) -> Result<(), ValidationError> {
        match (&self.location, self.coordinates) {
            (None, None) => return Err(ValidationError::MissingLocation),
            (Some(_), Some(_)) => return Err(ValidationError::AmbiguousLocation),
            (Some(name), None) if name.trim().is_empty() => {
                return Err(ValidationError::BlankLocation)
            }
            (None, Some(point)) if !point.is_valid() => {
                return Err(ValidationError::InvalidCoordinates {
                    latitude: point.latitude,
                    longitude: point.longitude,
                })
            }
            _ => {}
        }

        if !(MIN_RADIUS_KM..=MAX_RADIUS_KM).contains(&self.radius_km) {
            return Err(ValidationError::RadiusOutOfRange(self.radius_km));
        }

        Ok(())
    }

    /// Place name used for `{ciudad}` substitution, when the search has one.
    #[must_use]
    pub fn city(&self) -> Option<&str> {
        self.location.as_deref().map(str::trim)
    }
}
