use crate::debug_println;
use crate::extractor::parse_selector;
use crate::models::ListingRef;
use crate::portal::Portal;
use anyhow::Result;
use scraper::{Html, Selector};

/// Listing shapes the record schema cannot model.
pub const EXCLUDED_MARKERS: [&str; 3] = ["new-real-estate-project", "mixed-use-building", "exceptional-property"];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanReport {
    /// Kept listings, in page ranking order.
    pub listings: Vec<ListingRef>,
    pub excluded: usize,
    pub malformed: usize,
}

pub struct IndexScanner {
    card: Selector,
    link: Selector,
    portal: Portal,
}

impl IndexScanner {
    pub fn new(portal: Portal) -> Result<Self> {
        Ok(Self {
            card: parse_selector("article.card--result")?,
            link: parse_selector("a.card__title-link")?,
            portal,
        })
    }

    pub fn scan(&self, document: &Html) -> ScanReport {
        let mut report = ScanReport::default();

        for card in document.select(&self.card) {
            let href = match card.select(&self.link).next().and_then(|a| a.value().attr("href")) {
                Some(href) => href,
                None => {
                    debug_println!("Skipping listing card without a title link");
                    continue;
                }
            };

            let url = match self.portal.absolute_url(href.trim()) {
                Some(url) => url,
                None => {
                    debug_println!("Dropping unresolvable listing link: {}", href);
                    report.malformed += 1;
                    continue;
                }
            };

            if is_excluded(&url) {
                debug_println!("Excluding out-of-scope listing: {}", url);
                report.excluded += 1;
                continue;
            }

            match ListingRef::parse(&url) {
                Some(listing) => report.listings.push(listing),
                None => {
                    debug_println!("Dropping malformed listing URL: {}", url);
                    report.malformed += 1;
                }
            }
        }

        debug_println!(
            "Found {} listings ({} excluded, {} malformed)",
            report.listings.len(),
            report.excluded,
            report.malformed
        );
        report
    }
}

pub fn is_excluded(url: &str) -> bool {
    EXCLUDED_MARKERS.iter().any(|marker| url.contains(marker))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn card(href: &str) -> String {
        format!(
            r#"<article class="card card--result"><h2><a class="card__title-link" href="{}">Listing</a></h2></article>"#,
            href
        )
    }

    fn index(cards: &[String]) -> Html {
        Html::parse_document(&format!("<html><body><main>{}</main></body></html>", cards.join("\n")))
    }

    #[test]
    fn excluded_markers_are_dropped_and_order_kept() {
        let doc = index(&[
            card("https://www.immoweb.be/en/classified/villa/for-sale/uccle/1180/1"),
            card("https://www.immoweb.be/en/classified/new-real-estate-project-houses/for-sale/gent/9000/2"),
            card("https://www.immoweb.be/en/classified/duplex/for-sale/liege/4000/3"),
            card("https://www.immoweb.be/en/classified/mixed-use-building/for-sale/namur/5000/4"),
            card("https://www.immoweb.be/en/classified/exceptional-property/for-sale/spa/4900/5"),
            card("https://www.immoweb.be/en/classified/chalet/for-sale/durbuy/6940/6"),
        ]);
        let scanner = IndexScanner::new(Portal::default()).unwrap();

        let report = scanner.scan(&doc);

        let urls: Vec<&str> = report.listings.iter().map(|l| l.url.as_str()).collect();
        assert_eq!(
            urls,
            vec![
                "https://www.immoweb.be/en/classified/villa/for-sale/uccle/1180/1",
                "https://www.immoweb.be/en/classified/duplex/for-sale/liege/4000/3",
                "https://www.immoweb.be/en/classified/chalet/for-sale/durbuy/6940/6",
            ]
        );
        assert_eq!(report.excluded, 3);
        assert_eq!(report.malformed, 0);
    }

    #[test]
    fn relative_and_malformed_links() {
        let doc = index(&[
            card("/en/classified/loft/for-sale/antwerpen/2000/7"),
            card("/en/classified/loft"),
        ]);
        let scanner = IndexScanner::new(Portal::new("https://fixture.test")).unwrap();

        let report = scanner.scan(&doc);

        assert_eq!(report.listings.len(), 1);
        assert_eq!(report.listings[0].url, "https://fixture.test/en/classified/loft/for-sale/antwerpen/2000/7");
        assert_eq!(report.listings[0].postal_code, "2000");
        assert_eq!(report.malformed, 1);
    }

    #[test]
    fn scheme_relative_link_is_parsed_on_its_own_host() {
        let doc = index(&[card("//www.immoweb.be/en/classified/villa/for-sale/uccle/1180/1")]);
        let scanner = IndexScanner::new(Portal::new("https://fixture.test")).unwrap();

        let report = scanner.scan(&doc);

        assert_eq!(report.malformed, 0);
        assert_eq!(report.listings.len(), 1);
        let listing = &report.listings[0];
        assert_eq!(listing.url, "https://www.immoweb.be/en/classified/villa/for-sale/uccle/1180/1");
        assert_eq!(listing.subtype_segment, "villa");
        assert_eq!(listing.locality, "uccle");
        assert_eq!(listing.postal_code, "1180");
    }

    #[test]
    fn unresolvable_link_counts_as_malformed() {
        let doc = index(&[
            card("http://"),
            card("https://www.immoweb.be/en/classified/duplex/for-sale/liege/4000/3"),
        ]);
        let scanner = IndexScanner::new(Portal::default()).unwrap();

        let report = scanner.scan(&doc);

        assert_eq!(report.malformed, 1);
        assert_eq!(report.listings.len(), 1);
        assert_eq!(report.listings[0].locality, "liege");
    }

    #[test]
    fn duplicates_are_not_filtered() {
        let url = "https://www.immoweb.be/en/classified/villa/for-sale/uccle/1180/1";
        let doc = index(&[card(url), card(url)]);
        let scanner = IndexScanner::new(Portal::default()).unwrap();
        assert_eq!(scanner.scan(&doc).listings.len(), 2);
    }

    #[test]
    fn cards_without_title_link_are_skipped() {
        let doc = Html::parse_document(
            r#"<article class="card--result"><a href="/somewhere">ad</a></article>"#,
        );
        let scanner = IndexScanner::new(Portal::default()).unwrap();
        assert_eq!(scanner.scan(&doc), ScanReport::default());
    }
}
