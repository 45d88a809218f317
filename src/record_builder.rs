use crate::extractor::{flattened_text, parse_selector, FieldExtractor};
use crate::models::{Field, FieldValue, ListingRef, PropertyFamily, Record, Subtype, DESCRIPTORS};
use anyhow::Result;
use scraper::{Html, Selector};

pub const APARTMENT_SUBTYPES: [&str; 10] = [
    "apartment",
    "ground-floor",
    "triplex",
    "duplex",
    "studio",
    "penthouse",
    "loft",
    "kot",
    "service-flat",
    "flat-studio",
];

pub const HOUSE_SUBTYPES: [&str; 16] = [
    "house",
    "bungalow",
    "chalet",
    "castle",
    "farmhouse",
    "country-house",
    "exceptional-property",
    "apartment-block",
    "mixed-use-building",
    "town-house",
    "mansion",
    "villa",
    "other-property",
    "other-properties",
    "manor-house",
    "pavilion",
];

/// Classifies a URL subtype slug. Unknown slugs stay unclassified instead of being guessed.
pub fn classify_subtype(segment: &str) -> Option<Subtype> {
    let name = segment.trim().to_lowercase();
    let family = if APARTMENT_SUBTYPES.contains(&name.as_str()) {
        PropertyFamily::Apartment
    } else if HOUSE_SUBTYPES.contains(&name.as_str()) {
        PropertyFamily::House
    } else {
        return None;
    };
    Some(Subtype { family, name })
}

pub struct RecordBuilder {
    fields: FieldExtractor,
    property_id: Selector,
    price: Selector,
}

impl RecordBuilder {
    pub fn new() -> Result<Self> {
        Ok(Self {
            fields: FieldExtractor::new()?,
            property_id: parse_selector("div.classified__header--immoweb-code")?,
            price: parse_selector("span.sr-only")?,
        })
    }

    pub fn build(&self, document: &Html, listing: &ListingRef, partition: &str) -> Record {
        let mut record = Record {
            url: listing.url.clone(),
            property_id: self.property_id(document),
            locality: non_empty(&listing.locality),
            postal_code: non_empty(&listing.postal_code),
            price: self.price(document),
            property_type: partition.to_string(),
            subtype: classify_subtype(&listing.subtype_segment),
            type_of_sale: None,
            bedrooms: None,
            living_area: None,
            equipped_kitchen: false,
            furnished: false,
            open_fire: false,
            terrace_surface: None,
            garden_surface: None,
            facades: None,
            swimming_pool: false,
            building_condition: None,
        };

        for descriptor in DESCRIPTORS.iter() {
            let value = self.fields.extract(document, descriptor);
            let number = || value.as_ref().and_then(FieldValue::as_number);
            let flag = || value.as_ref().and_then(FieldValue::as_flag).unwrap_or(false);

            match descriptor.field {
                Field::TypeOfSale => record.type_of_sale = value.clone().and_then(FieldValue::into_text),
                Field::Bedrooms => record.bedrooms = number(),
                Field::LivingArea => record.living_area = number(),
                Field::EquippedKitchen => record.equipped_kitchen = flag(),
                Field::Furnished => record.furnished = flag(),
                Field::OpenFire => record.open_fire = flag(),
                Field::TerraceSurface => record.terrace_surface = number(),
                Field::GardenSurface => record.garden_surface = number(),
                Field::Facades => record.facades = number(),
                Field::SwimmingPool => record.swimming_pool = flag(),
                Field::BuildingCondition => {
                    record.building_condition = value.clone().and_then(FieldValue::into_text)
                }
            }
        }

        record
    }

    // "Immoweb code : 10912345" -> "10912345"
    fn property_id(&self, document: &Html) -> Option<String> {
        let header = document.select(&self.property_id).next()?;
        let first = header.text().map(str::trim).find(|t| !t.is_empty())?;
        let id = first.split(':').nth(1)?.trim();
        non_empty(id)
    }

    fn price(&self, document: &Html) -> Option<u64> {
        let span = document.select(&self.price).next()?;
        let digits: String = flattened_text(span).chars().filter(char::is_ascii_digit).collect();
        digits.parse().ok()
    }
}

fn non_empty(text: &str) -> Option<String> {
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}
