use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;

/// Cookies and base headers obtained once per run and shared read-only by every fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    cookies: BTreeMap<String, String>,
    headers: BTreeMap<String, String>,
}

impl Session {
    pub fn new(cookies: BTreeMap<String, String>, headers: BTreeMap<String, String>) -> Self {
        Self { cookies, headers }
    }

    pub fn cookies(&self) -> &BTreeMap<String, String> {
        &self.cookies
    }

    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    /// Value for the `Cookie` request header, `None` when the jar is empty.
    pub fn cookie_header(&self) -> Option<String> {
        if self.cookies.is_empty() {
            return None;
        }
        let pairs: Vec<String> = self
            .cookies
            .iter()
            .map(|(name, value)| format!("{}={}", name, value))
            .collect();
        Some(pairs.join("; "))
    }
}

// Listing URLs look like
// https://www.immoweb.be/en/classified/{subtype}/for-sale/{locality}/{postal-code}/{id}
const SUBTYPE_SEGMENT: usize = 5;
const LOCALITY_SEGMENT: usize = 7;
const POSTAL_CODE_SEGMENT: usize = 8;
const MIN_SEGMENTS: usize = POSTAL_CODE_SEGMENT + 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingRef {
    pub url: String,
    /// Type slug exactly as it appears in the URL.
    pub property_type_segment: String,
    /// Same slug, lower-cased and trimmed, ready for vocabulary lookup.
    pub subtype_segment: String,
    pub locality: String,
    pub postal_code: String,
}

impl ListingRef {
    /// Splits an absolute listing URL into its positional segments.
    /// Returns `None` for URLs too short to carry locality and postal code.
    pub fn parse(url: &str) -> Option<Self> {
        let path = url.split(|c: char| c == '?' || c == '#').next().unwrap_or(url);
        let segments: Vec<&str> = path.split('/').collect();
        if segments.len() < MIN_SEGMENTS {
            return None;
        }

        let property_type_segment = segments[SUBTYPE_SEGMENT].to_string();
        let subtype_segment = property_type_segment.trim().to_lowercase();

        Some(ListingRef {
            url: url.to_string(),
            property_type_segment,
            subtype_segment,
            locality: segments[LOCALITY_SEGMENT].to_string(),
            postal_code: segments[POSTAL_CODE_SEGMENT].to_string(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Leading run of digits, e.g. "110 m²" -> 110.
    Numeric,
    /// True iff the cell text equals the sentinel word.
    Flag(&'static str),
    /// True iff the cell yields anything at all.
    Presence,
    /// Whitespace-collapsed cell text.
    Raw,
}

/// Record slot a descriptor writes into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    TypeOfSale,
    Bedrooms,
    LivingArea,
    EquippedKitchen,
    Furnished,
    OpenFire,
    TerraceSurface,
    GardenSurface,
    Facades,
    SwimmingPool,
    BuildingCondition,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub column: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub field: Field,
}

const fn descriptor(column: &'static str, label: &'static str, kind: FieldKind, field: Field) -> FieldDescriptor {
    FieldDescriptor { column, label, kind, field }
}

/// Attribute-table fields. Property ID, price, type and subtype have dedicated rules.
pub const DESCRIPTORS: [FieldDescriptor; 11] = [
    descriptor("Type of sale", "Monthly annuity", FieldKind::Raw, Field::TypeOfSale),
    descriptor("Number of bedrooms", "Bedrooms", FieldKind::Numeric, Field::Bedrooms),
    descriptor("Living area m²", "Living area", FieldKind::Numeric, Field::LivingArea),
    descriptor("Equipped kitchen", "Kitchen type", FieldKind::Flag("Installed"), Field::EquippedKitchen),
    descriptor("Furnished", "Furnished", FieldKind::Flag("Yes"), Field::Furnished),
    descriptor("Open fire", "How many fireplaces?", FieldKind::Presence, Field::OpenFire),
    descriptor("Terrace surface m²", "Terrace surface", FieldKind::Numeric, Field::TerraceSurface),
    descriptor("Garden area m²", "Garden surface", FieldKind::Numeric, Field::GardenSurface),
    descriptor("Number of facades", "Number of frontages", FieldKind::Numeric, Field::Facades),
    descriptor("Swimming pool", "Swimming pool", FieldKind::Flag("Yes"), Field::SwimmingPool),
    descriptor("Building condition", "Building condition", FieldKind::Raw, Field::BuildingCondition),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Number(u64),
    Flag(bool),
    Text(String),
}

impl FieldValue {
    pub fn as_number(&self) -> Option<u64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_flag(&self) -> Option<bool> {
        match self {
            FieldValue::Flag(b) => Some(*b),
            _ => None,
        }
    }

    pub fn into_text(self) -> Option<String> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyFamily {
    Apartment,
    House,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Subtype {
    pub family: PropertyFamily,
    pub name: String,
}

/// One successfully processed listing. Built once, never modified.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Record {
    pub url: String,
    pub property_id: Option<String>,
    pub locality: Option<String>,
    pub postal_code: Option<String>,
    pub price: Option<u64>,
    pub property_type: String,
    pub subtype: Option<Subtype>,
    pub type_of_sale: Option<String>,
    pub bedrooms: Option<u64>,
    pub living_area: Option<u64>,
    pub equipped_kitchen: bool,
    pub furnished: bool,
    pub open_fire: bool,
    pub terrace_surface: Option<u64>,
    pub garden_surface: Option<u64>,
    pub facades: Option<u64>,
    pub swimming_pool: bool,
    pub building_condition: Option<String>,
}

pub const RECORD_COLUMNS: [&str; 18] = [
    "URL",
    "Property ID",
    "Locality",
    "Postal code",
    "Price",
    "Property type",
    "Sub type",
    "Type of sale",
    "Number of bedrooms",
    "Living area m²",
    "Equipped kitchen",
    "Furnished",
    "Open fire",
    "Terrace surface m²",
    "Garden area m²",
    "Number of facades",
    "Swimming pool",
    "Building condition",
];

// Booleans go out as 0/1 and the subtype as its bare slug
impl Serialize for Record {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let flag = |b: bool| -> u8 { u8::from(b) };
        let subtype = self.subtype.as_ref().map(|s| s.name.as_str());

        let mut state = serializer.serialize_struct("Record", RECORD_COLUMNS.len())?;
        state.serialize_field("URL", &self.url)?;
        state.serialize_field("Property ID", &self.property_id)?;
        state.serialize_field("Locality", &self.locality)?;
        state.serialize_field("Postal code", &self.postal_code)?;
        state.serialize_field("Price", &self.price)?;
        state.serialize_field("Property type", &self.property_type)?;
        state.serialize_field("Sub type", &subtype)?;
        state.serialize_field("Type of sale", &self.type_of_sale)?;
        state.serialize_field("Number of bedrooms", &self.bedrooms)?;
        state.serialize_field("Living area m²", &self.living_area)?;
        state.serialize_field("Equipped kitchen", &flag(self.equipped_kitchen))?;
        state.serialize_field("Furnished", &flag(self.furnished))?;
        state.serialize_field("Open fire", &flag(self.open_fire))?;
        state.serialize_field("Terrace surface m²", &self.terrace_surface)?;
        state.serialize_field("Garden area m²", &self.garden_surface)?;
        state.serialize_field("Number of facades", &self.facades)?;
        state.serialize_field("Swimming pool", &flag(self.swimming_pool))?;
        state.serialize_field("Building condition", &self.building_condition)?;
        state.end()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunBudget {
    pub max_records_total: usize,
    pub max_pages_per_partition: usize,
}

impl Default for RunBudget {
    fn default() -> Self {
        Self {
            max_records_total: 10_000,
            max_pages_per_partition: 333,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listing_ref_reads_positional_segments() {
        let listing =
            ListingRef::parse("https://www.immoweb.be/en/classified/Villa/for-sale/uccle/1180/11223344").unwrap();
        assert_eq!(listing.property_type_segment, "Villa");
        assert_eq!(listing.subtype_segment, "villa");
        assert_eq!(listing.locality, "uccle");
        assert_eq!(listing.postal_code, "1180");
    }

    #[test]
    fn listing_ref_rejects_short_urls() {
        assert!(ListingRef::parse("https://www.immoweb.be/en/classified/villa/for-sale").is_none());
        assert!(ListingRef::parse("not a url").is_none());
    }

    #[test]
    fn listing_ref_needs_postal_code_segment() {
        let shortest = ListingRef::parse("https://www.immoweb.be/en/classified/villa/for-sale/uccle/1180").unwrap();
        assert_eq!(shortest.locality, "uccle");
        assert_eq!(shortest.postal_code, "1180");

        assert!(ListingRef::parse("https://www.immoweb.be/en/classified/villa/for-sale/uccle").is_none());
    }

    #[test]
    fn listing_ref_ignores_query_and_fragment() {
        let url = "https://www.immoweb.be/en/classified/villa/for-sale/uccle/1180?searchId=x";
        let listing = ListingRef::parse(url).unwrap();
        assert_eq!(listing.postal_code, "1180");
        assert_eq!(listing.url, url);

        let listing = ListingRef::parse("https://www.immoweb.be/en/classified/loft/for-sale/gent/9000#photos").unwrap();
        assert_eq!(listing.subtype_segment, "loft");
        assert_eq!(listing.postal_code, "9000");

        // A query can't stand in for missing path segments
        assert!(ListingRef::parse("https://www.immoweb.be/en/classified/villa/for-sale?a=/b/c/d").is_none());
    }

    #[test]
    fn cookie_header_joins_pairs() {
        let mut cookies = BTreeMap::new();
        cookies.insert("uc_consent".to_string(), "1".to_string());
        cookies.insert("session".to_string(), "abc".to_string());
        let session = Session::new(cookies, BTreeMap::new());
        assert_eq!(session.cookie_header().as_deref(), Some("session=abc; uc_consent=1"));
        assert_eq!(Session::default().cookie_header(), None);
    }

    #[test]
    fn descriptor_columns_match_record_columns() {
        for descriptor in DESCRIPTORS.iter() {
            assert!(
                RECORD_COLUMNS.contains(&descriptor.column),
                "{} missing from export columns",
                descriptor.column
            );
        }
    }
}
