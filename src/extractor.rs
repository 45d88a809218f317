use crate::models::{FieldDescriptor, FieldKind, FieldValue};
use anyhow::Result;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;

static DIGIT_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").expect("digit pattern compiles"));

pub(crate) fn parse_selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| anyhow::anyhow!("Failed to parse selector {}: {:?}", css, e))
}

/// Text fragments trimmed, empties dropped, joined by single spaces.
pub(crate) fn flattened_text(element: ElementRef) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|fragment| !fragment.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

pub(crate) fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Walks the listing's attribute table (`th` label / `td` value pairs).
pub struct FieldExtractor {
    header: Selector,
    data: Selector,
}

impl FieldExtractor {
    pub fn new() -> Result<Self> {
        Ok(Self {
            header: parse_selector("th.classified-table__header")?,
            data: parse_selector("td.classified-table__data")?,
        })
    }

    /// Value of one descriptor, or `None` when the table has no such row.
    pub fn extract(&self, document: &Html, descriptor: &FieldDescriptor) -> Option<FieldValue> {
        let cell = self.find_cell(document, descriptor.label)?;

        match descriptor.kind {
            FieldKind::Numeric => numeric_value(cell).map(FieldValue::Number),
            FieldKind::Flag(sentinel) => Some(FieldValue::Flag(flattened_text(cell) == sentinel)),
            FieldKind::Presence => Some(FieldValue::Flag(has_content(cell))),
            FieldKind::Raw => {
                let text = collapse_whitespace(&flattened_text(cell));
                if text.is_empty() {
                    None
                } else {
                    Some(FieldValue::Text(text))
                }
            }
        }
    }

    fn find_cell<'a>(&self, document: &'a Html, label: &str) -> Option<ElementRef<'a>> {
        let needle = label.to_lowercase();
        let header = document
            .select(&self.header)
            .find(|th| flattened_text(*th).to_lowercase().contains(&needle))?;

        // First data cell after the header in document order, not necessarily a sibling
        let mut passed_header = false;
        for node in document.tree.root().descendants() {
            if node.id() == header.id() {
                passed_header = true;
                continue;
            }
            if !passed_header {
                continue;
            }
            if let Some(element) = ElementRef::wrap(node) {
                if self.data.matches(&element) {
                    return Some(element);
                }
            }
        }

        None
    }
}

fn numeric_value(cell: ElementRef) -> Option<u64> {
    let text = flattened_text(cell);
    if let Some(run) = DIGIT_RUN.find(&text) {
        return run.as_str().parse().ok();
    }

    direct_fragments(cell)
        .into_iter()
        .find(|fragment| fragment.chars().all(|c| c.is_ascii_digit()))
        .and_then(|fragment| fragment.parse().ok())
}

fn has_content(cell: ElementRef) -> bool {
    let text = flattened_text(cell);
    DIGIT_RUN.is_match(&text) || !direct_fragments(cell).is_empty()
}

fn direct_fragments(cell: ElementRef) -> Vec<String> {
    cell.children()
        .filter_map(|node| node.value().as_text().map(|t| t.trim().to_string()))
        .filter(|fragment| !fragment.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Field, DESCRIPTORS};

    fn table(rows: &[(&str, &str)]) -> Html {
        let body: String = rows
            .iter()
            .map(|(th, td)| {
                format!(
                    r#"<tr><th class="classified-table__header">{}</th><td class="classified-table__data">{}</td></tr>"#,
                    th, td
                )
            })
            .collect();
        Html::parse_document(&format!(r#"<html><body><table class="classified-table">{}</table></body></html>"#, body))
    }

    fn descriptor(field: Field) -> FieldDescriptor {
        *DESCRIPTORS.iter().find(|d| d.field == field).unwrap()
    }

    #[test]
    fn numeric_takes_leading_digit_run() {
        let doc = table(&[("Living area", "\n  110\n  <span class=\"sr-only\">square meters</span>\n")]);
        let extractor = FieldExtractor::new().unwrap();
        let value = extractor.extract(&doc, &descriptor(Field::LivingArea));
        assert_eq!(value, Some(FieldValue::Number(110)));
    }

    #[test]
    fn label_match_is_case_insensitive_substring() {
        let doc = table(&[("  Number of frontages  ", "4")]);
        let extractor = FieldExtractor::new().unwrap();
        assert_eq!(
            extractor.extract(&doc, &descriptor(Field::Facades)),
            Some(FieldValue::Number(4))
        );
    }

    #[test]
    fn first_matching_header_wins() {
        let doc = table(&[("Bedrooms", "3"), ("Bedrooms 2", "9")]);
        let extractor = FieldExtractor::new().unwrap();
        assert_eq!(
            extractor.extract(&doc, &descriptor(Field::Bedrooms)),
            Some(FieldValue::Number(3))
        );
    }

    #[test]
    fn missing_header_is_absent() {
        let doc = table(&[("Bedrooms", "3")]);
        let extractor = FieldExtractor::new().unwrap();
        assert_eq!(extractor.extract(&doc, &descriptor(Field::GardenSurface)), None);
        assert_eq!(extractor.extract(&doc, &descriptor(Field::SwimmingPool)), None);
    }

    #[test]
    fn numeric_without_digits_is_absent() {
        let doc = table(&[("Terrace surface", "Ask the agent")]);
        let extractor = FieldExtractor::new().unwrap();
        assert_eq!(extractor.extract(&doc, &descriptor(Field::TerraceSurface)), None);
    }

    #[test]
    fn flag_requires_exact_sentinel() {
        let extractor = FieldExtractor::new().unwrap();

        let installed = table(&[("Kitchen type", " Installed ")]);
        assert_eq!(
            extractor.extract(&installed, &descriptor(Field::EquippedKitchen)),
            Some(FieldValue::Flag(true))
        );

        let hyper = table(&[("Kitchen type", "Hyper equipped")]);
        assert_eq!(
            extractor.extract(&hyper, &descriptor(Field::EquippedKitchen)),
            Some(FieldValue::Flag(false))
        );
    }

    #[test]
    fn presence_is_true_for_any_content() {
        let extractor = FieldExtractor::new().unwrap();

        let one = table(&[("How many fireplaces?", "1")]);
        assert_eq!(
            extractor.extract(&one, &descriptor(Field::OpenFire)),
            Some(FieldValue::Flag(true))
        );

        let empty = table(&[("How many fireplaces?", "   ")]);
        assert_eq!(
            extractor.extract(&empty, &descriptor(Field::OpenFire)),
            Some(FieldValue::Flag(false))
        );
    }

    #[test]
    fn raw_collapses_whitespace() {
        let doc = table(&[("Building condition", "\n   Just   <b>renovated</b>\n")]);
        let extractor = FieldExtractor::new().unwrap();
        assert_eq!(
            extractor.extract(&doc, &descriptor(Field::BuildingCondition)),
            Some(FieldValue::Text("Just renovated".to_string()))
        );
    }

    #[test]
    fn data_cell_may_live_outside_the_header_row() {
        let doc = Html::parse_document(
            r#"<table><tr><th class="classified-table__header">Garden surface</th></tr></table>
               <p>noise</p>
               <table><tr><td class="classified-table__data">250 m²</td></tr></table>"#,
        );
        let extractor = FieldExtractor::new().unwrap();
        assert_eq!(
            extractor.extract(&doc, &descriptor(Field::GardenSurface)),
            Some(FieldValue::Number(250))
        );
    }
}
