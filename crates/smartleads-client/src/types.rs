//! Wire types for the lead API.
//!
//! The API speaks Spanish field names (`rubro`, `nombre`, `validada`, ...);
//! these types map them onto the domain types in `smartleads-core`.

use serde::{Deserialize, Serialize};
use smartleads_core::{CompanyRecord, SearchRequest};

// ---------------------------------------------------------------------------
// POST /search
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub(crate) struct SearchPayload<'a> {
    pub rubro: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location_name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lng: Option<f64>,
    pub radius: u32,
    pub user_id: &'a str,
}

impl<'a> SearchPayload<'a> {
    pub(crate) fn new(request: &'a SearchRequest, user_id: &'a str) -> Self {
        Self {
            rubro: request.category.id(),
            location_name: request.city(),
            lat: request.coordinates.map(|c| c.latitude),
            lng: request.coordinates.map(|c| c.longitude),
            radius: request.radius_km,
            user_id,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct SearchAccepted {
    pub search_id: WireId,
}

// ---------------------------------------------------------------------------
// GET /search/{id}/progress
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(crate) struct ProgressResponse {
    pub progress: i32,
}

// ---------------------------------------------------------------------------
// GET /empresas
// ---------------------------------------------------------------------------

/// Identifiers arrive as strings from some stores and as numbers from others.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum WireId {
    Text(String),
    Number(i64),
}

impl WireId {
    pub(crate) fn into_string(self) -> String {
        match self {
            WireId::Text(s) => s,
            WireId::Number(n) => n.to_string(),
        }
    }
}

/// One row of the `empresas` listing.
#[derive(Debug, Deserialize)]
pub(crate) struct EmpresaRow {
    #[serde(default)]
    pub id: Option<WireId>,
    #[serde(default)]
    pub osm_id: Option<WireId>,
    #[serde(default)]
    pub nombre: Option<String>,
    #[serde(default)]
    pub rubro: Option<String>,
    #[serde(default)]
    pub direccion: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub telefono: Option<String>,
    #[serde(default)]
    pub validada: Option<bool>,
}

impl EmpresaRow {
    /// Converts the row into a [`CompanyRecord`]. Rows without any usable id
    /// cannot be deduplicated and are dropped.
    pub(crate) fn into_record(self) -> Option<CompanyRecord> {
        let id = self
            .id
            .or(self.osm_id)
            .map(WireId::into_string)
            .and_then(non_blank)?;
        Some(CompanyRecord {
            id,
            name: self.nombre.and_then(non_blank).unwrap_or_default(),
            category: self.rubro.and_then(non_blank).unwrap_or_default(),
            address: self.direccion.and_then(non_blank).unwrap_or_default(),
            website: self.website.and_then(non_blank),
            email: self.email.and_then(non_blank),
            phone: self.telefono.and_then(non_blank),
            validated: self.validada.unwrap_or(false),
        })
    }
}

/// Blank strings mean "not found" on the wire.
fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else if trimmed.len() == value.len() {
        Some(value)
    } else {
        Some(trimmed.to_string())
    }
}

// ---------------------------------------------------------------------------
// POST /send-email
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub(crate) struct SendEmailPayload<'a> {
    pub user_id: &'a str,
    pub empresa_id: &'a str,
    pub template_id: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SendEmailResponse {
    #[serde(default)]
    pub success: bool,
}

#[cfg(test)]
mod tests {
    use smartleads_core::Category;

    use super::*;

    #[test]
    fn place_search_omits_coordinates() {
        let request = SearchRequest::near_place(Category::Hoteles, " Mendoza ", 5);
        let payload = serde_json::to_value(SearchPayload::new(&request, "u1")).unwrap();
        assert_eq!(
            payload,
            serde_json::json!({
                "rubro": "hoteles",
                "location_name": "Mendoza",
                "radius": 5,
                "user_id": "u1"
            })
        );
    }

    #[test]
    fn point_search_omits_location_name() {
        let request = SearchRequest::near_point(Category::Abogados, -32.89, -68.83, 12);
        let payload = serde_json::to_value(SearchPayload::new(&request, "u1")).unwrap();
        assert_eq!(payload["lat"], -32.89);
        assert_eq!(payload["lng"], -68.83);
        assert!(payload.get("location_name").is_none());
    }

    #[test]
    fn row_falls_back_to_osm_id_and_drops_blanks() {
        let row: EmpresaRow = serde_json::from_value(serde_json::json!({
            "osm_id": 987_654,
            "nombre": "Hotel Aconcagua",
            "rubro": "hoteles",
            "direccion": "San Lorenzo 545",
            "website": "",
            "email": "  ",
            "telefono": "+54 261 520 0500",
            "validada": true
        }))
        .unwrap();

        let record = row.into_record().expect("row has an id");
        assert_eq!(record.id, "987654");
        assert_eq!(record.website, None);
        assert_eq!(record.email, None);
        assert_eq!(record.phone.as_deref(), Some("+54 261 520 0500"));
        assert!(record.validated);
    }

    #[test]
    fn row_without_id_is_dropped() {
        let row: EmpresaRow =
            serde_json::from_value(serde_json::json!({ "nombre": "Sin id" })).unwrap();
        assert!(row.into_record().is_none());
    }
}
