//! The typed record extracted from one listing page

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::coerce;

/// Kind of a listing attribute, fixing its coercion and column type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Integer,
    Decimal,
    Boolean,
}

impl FieldKind {
    pub fn sql_type(&self) -> &'static str {
        match self {
            FieldKind::Text => "TEXT",
            FieldKind::Integer => "INTEGER",
            FieldKind::Decimal => "REAL",
            FieldKind::Boolean => "BOOLEAN",
        }
    }
}

/// A single coerced attribute value
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Integer(i64),
    Decimal(f64),
    Boolean(bool),
    Null,
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(FieldValue::Null, Into::into)
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Integer(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Decimal(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Boolean(value)
    }
}

/// Attribute names and kinds, in `property_listings` column order
pub const LISTING_FIELDS: &[(&str, FieldKind)] = &[
    ("address", FieldKind::Text),
    ("postal_code", FieldKind::Text),
    ("city", FieldKind::Text),
    ("neighborhood", FieldKind::Text),
    ("living_area", FieldKind::Decimal),
    ("bedrooms", FieldKind::Integer),
    ("price", FieldKind::Decimal),
    ("price_per_m2", FieldKind::Decimal),
    ("description", FieldKind::Text),
    ("asking_price", FieldKind::Decimal),
    ("asking_price_per_m2", FieldKind::Decimal),
    ("status", FieldKind::Text),
    ("acceptance", FieldKind::Text),
    ("vve_contribution", FieldKind::Decimal),
    ("type_of_apartment", FieldKind::Text),
    ("type_of_construction", FieldKind::Text),
    ("year_of_construction", FieldKind::Integer),
    ("accessibility", FieldKind::Text),
    ("living_area_m2", FieldKind::Decimal),
    ("volume", FieldKind::Decimal),
    ("number_of_rooms", FieldKind::Integer),
    ("number_of_bedrooms", FieldKind::Integer),
    ("number_of_bathrooms", FieldKind::Integer),
    ("bathroom_facilities", FieldKind::Text),
    ("number_of_floors", FieldKind::Integer),
    ("located_on", FieldKind::Text),
    ("facilities", FieldKind::Text),
    ("energy_label", FieldKind::Text),
    ("insulation", FieldKind::Text),
    ("heating", FieldKind::Text),
    ("hot_water", FieldKind::Text),
    ("boiler_brand", FieldKind::Text),
    ("boiler_type", FieldKind::Text),
    ("boiler_ownership", FieldKind::Text),
    ("cadastral_number", FieldKind::Text),
    ("ownership_status", FieldKind::Text),
    ("type_of_parking", FieldKind::Text),
    ("registered_with_chamber_of_commerce", FieldKind::Boolean),
    ("annual_meeting", FieldKind::Boolean),
    ("periodic_contribution", FieldKind::Boolean),
    ("reserve_fund", FieldKind::Boolean),
    ("maintenance_plan", FieldKind::Boolean),
    ("building_insurance", FieldKind::Boolean),
    ("agency_name", FieldKind::Text),
    ("phone_number", FieldKind::Text),
];

/// Structured attributes of one listing
///
/// Every attribute is optional. Values the model gives in free text
/// (`"€ 425.000 k.k."`, `"ja"`) are coerced on deserialization and anything
/// unreadable becomes `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct StructuredListing {
    /// Street and house number
    #[serde(deserialize_with = "coerce::de_text")]
    pub address: Option<String>,
    /// Dutch postal code, e.g. `3034 AB`
    #[serde(deserialize_with = "coerce::de_text")]
    pub postal_code: Option<String>,
    #[serde(deserialize_with = "coerce::de_text")]
    pub city: Option<String>,
    /// Neighbourhood (buurt)
    #[serde(deserialize_with = "coerce::de_text")]
    pub neighborhood: Option<String>,
    /// Living area in m² as shown in the header
    #[serde(deserialize_with = "coerce::de_decimal")]
    pub living_area: Option<f64>,
    /// Bedrooms as shown in the header
    #[serde(deserialize_with = "coerce::de_integer")]
    pub bedrooms: Option<i64>,
    /// Listed price in euros
    #[serde(deserialize_with = "coerce::de_decimal")]
    pub price: Option<f64>,
    #[serde(deserialize_with = "coerce::de_decimal")]
    pub price_per_m2: Option<f64>,
    /// Free-text description (omschrijving)
    #[serde(deserialize_with = "coerce::de_text")]
    pub description: Option<String>,
    /// Vraagprijs in euros
    #[serde(deserialize_with = "coerce::de_decimal")]
    pub asking_price: Option<f64>,
    /// Vraagprijs per m² in euros
    #[serde(deserialize_with = "coerce::de_decimal")]
    pub asking_price_per_m2: Option<f64>,
    /// Status, e.g. `Beschikbaar` or `Onder bod`
    #[serde(deserialize_with = "coerce::de_text")]
    pub status: Option<String>,
    /// Aanvaarding
    #[serde(deserialize_with = "coerce::de_text")]
    pub acceptance: Option<String>,
    /// Bijdrage VvE in euros per month
    #[serde(deserialize_with = "coerce::de_decimal")]
    pub vve_contribution: Option<f64>,
    /// Soort appartement or soort woonhuis
    #[serde(deserialize_with = "coerce::de_text")]
    pub type_of_apartment: Option<String>,
    /// Soort bouw
    #[serde(deserialize_with = "coerce::de_text")]
    pub type_of_construction: Option<String>,
    /// Bouwjaar
    #[serde(deserialize_with = "coerce::de_integer")]
    pub year_of_construction: Option<i64>,
    /// Toegankelijkheid
    #[serde(deserialize_with = "coerce::de_text")]
    pub accessibility: Option<String>,
    /// Wonen, in m²
    #[serde(deserialize_with = "coerce::de_decimal")]
    pub living_area_m2: Option<f64>,
    /// Inhoud in m³
    #[serde(deserialize_with = "coerce::de_decimal")]
    pub volume: Option<f64>,
    /// Aantal kamers
    #[serde(deserialize_with = "coerce::de_integer")]
    pub number_of_rooms: Option<i64>,
    /// Aantal slaapkamers
    #[serde(deserialize_with = "coerce::de_integer")]
    pub number_of_bedrooms: Option<i64>,
    /// Aantal badkamers
    #[serde(deserialize_with = "coerce::de_integer")]
    pub number_of_bathrooms: Option<i64>,
    /// Badkamervoorzieningen
    #[serde(deserialize_with = "coerce::de_text")]
    pub bathroom_facilities: Option<String>,
    /// Aantal woonlagen
    #[serde(deserialize_with = "coerce::de_integer")]
    pub number_of_floors: Option<i64>,
    /// Gelegen op, e.g. `3e woonlaag`
    #[serde(deserialize_with = "coerce::de_text")]
    pub located_on: Option<String>,
    /// Voorzieningen
    #[serde(deserialize_with = "coerce::de_text")]
    pub facilities: Option<String>,
    /// Energielabel letter
    #[serde(deserialize_with = "coerce::de_text")]
    pub energy_label: Option<String>,
    /// Isolatie
    #[serde(deserialize_with = "coerce::de_text")]
    pub insulation: Option<String>,
    /// Verwarming
    #[serde(deserialize_with = "coerce::de_text")]
    pub heating: Option<String>,
    /// Warm water
    #[serde(deserialize_with = "coerce::de_text")]
    pub hot_water: Option<String>,
    #[serde(deserialize_with = "coerce::de_text")]
    pub boiler_brand: Option<String>,
    #[serde(deserialize_with = "coerce::de_text")]
    pub boiler_type: Option<String>,
    /// Cv-ketel ownership, e.g. `eigendom` or `huur`
    #[serde(deserialize_with = "coerce::de_text")]
    pub boiler_ownership: Option<String>,
    /// Kadastrale aanduiding
    #[serde(deserialize_with = "coerce::de_text")]
    pub cadastral_number: Option<String>,
    /// Eigendomssituatie
    #[serde(deserialize_with = "coerce::de_text")]
    pub ownership_status: Option<String>,
    /// Soort parkeergelegenheid
    #[serde(deserialize_with = "coerce::de_text")]
    pub type_of_parking: Option<String>,
    /// VvE ingeschreven bij KvK
    #[serde(deserialize_with = "coerce::de_boolean")]
    pub registered_with_chamber_of_commerce: Option<bool>,
    /// Jaarlijkse vergadering
    #[serde(deserialize_with = "coerce::de_boolean")]
    pub annual_meeting: Option<bool>,
    /// Periodieke bijdrage
    #[serde(deserialize_with = "coerce::de_boolean")]
    pub periodic_contribution: Option<bool>,
    /// Reservefonds aanwezig
    #[serde(deserialize_with = "coerce::de_boolean")]
    pub reserve_fund: Option<bool>,
    /// Onderhoudsplan
    #[serde(deserialize_with = "coerce::de_boolean")]
    pub maintenance_plan: Option<bool>,
    /// Opstalverzekering
    #[serde(deserialize_with = "coerce::de_boolean")]
    pub building_insurance: Option<bool>,
    /// Listing agent (makelaar)
    #[serde(deserialize_with = "coerce::de_text")]
    pub agency_name: Option<String>,
    /// Phone number of the listing agent
    #[serde(deserialize_with = "coerce::de_text")]
    pub phone_number: Option<String>,
}

impl StructuredListing {
    /// Coerce a parsed model response; unknown keys are ignored
    pub fn from_raw(raw: &Map<String, Value>) -> Result<Self, serde_json::Error> {
        serde_json::from_value(Value::Object(raw.clone()))
    }

    /// Values in `LISTING_FIELDS` order
    pub fn values(&self) -> Vec<FieldValue> {
        vec![
            self.address.clone().into(),
            self.postal_code.clone().into(),
            self.city.clone().into(),
            self.neighborhood.clone().into(),
            self.living_area.into(),
            self.bedrooms.into(),
            self.price.into(),
            self.price_per_m2.into(),
            self.description.clone().into(),
            self.asking_price.into(),
            self.asking_price_per_m2.into(),
            self.status.clone().into(),
            self.acceptance.clone().into(),
            self.vve_contribution.into(),
            self.type_of_apartment.clone().into(),
            self.type_of_construction.clone().into(),
            self.year_of_construction.into(),
            self.accessibility.clone().into(),
            self.living_area_m2.into(),
            self.volume.into(),
            self.number_of_rooms.into(),
            self.number_of_bedrooms.into(),
            self.number_of_bathrooms.into(),
            self.bathroom_facilities.clone().into(),
            self.number_of_floors.into(),
            self.located_on.clone().into(),
            self.facilities.clone().into(),
            self.energy_label.clone().into(),
            self.insulation.clone().into(),
            self.heating.clone().into(),
            self.hot_water.clone().into(),
            self.boiler_brand.clone().into(),
            self.boiler_type.clone().into(),
            self.boiler_ownership.clone().into(),
            self.cadastral_number.clone().into(),
            self.ownership_status.clone().into(),
            self.type_of_parking.clone().into(),
            self.registered_with_chamber_of_commerce.into(),
            self.annual_meeting.into(),
            self.periodic_contribution.into(),
            self.reserve_fund.into(),
            self.maintenance_plan.into(),
            self.building_insurance.into(),
            self.agency_name.clone().into(),
            self.phone_number.clone().into(),
        ]
    }

    /// Number of attributes that carry a value
    pub fn populated(&self) -> usize {
        self.values()
            .iter()
            .filter(|v| **v != FieldValue::Null)
            .count()
    }
}
