use scraper::{Html, Selector};
use std::sync::LazyLock;

use crate::models::CityRef;

const PLACEHOLDER: &str = "Select Jharkhand Mandi";

static DROPDOWN: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("select#redirectDropdown").unwrap());
static OPTION: LazyLock<Selector> = LazyLock::new(|| Selector::parse("option").unwrap());

#[derive(Debug, PartialEq, Eq)]
pub enum CityListing {
    Found(Vec<CityRef>),
    SelectorMissing,
}

impl CityListing {
    pub fn into_cities(self) -> Vec<CityRef> {
        match self {
            CityListing::Found(cities) => cities,
            CityListing::SelectorMissing => Vec::new(),
        }
    }
}

/// Read the city dropdown off the state page, in document order.
pub fn parse_city_options(html: &str) -> CityListing {
    let doc = Html::parse_document(html);
    let Some(dropdown) = doc.select(&DROPDOWN).next() else {
        return CityListing::SelectorMissing;
    };

    let cities = dropdown
        .select(&OPTION)
        .filter_map(|opt| {
            let el = opt.value();
            let value = el.attr("value").filter(|v| !v.is_empty())?;
            if el.attr("disabled").is_some() {
                return None;
            }
            let label = opt.text().collect::<String>();
            let label = label.trim();
            if label == PLACEHOLDER {
                return None;
            }
            Some(CityRef {
                name: label.to_string(),
                slug: el
                    .attr("data-slug")
                    .filter(|s| !s.is_empty())
                    .map(str::to_string),
                value: value.to_string(),
            })
        })
        .collect();

    CityListing::Found(cities)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::state_page;

    #[test]
    fn keeps_enabled_options_in_order() {
        let html = state_page(
            r#"<option value="" disabled selected>Select Jharkhand Mandi</option>
               <option value="12" data-slug="ranchi">  Ranchi </option>
               <option value="7" disabled>Closed Mandi</option>
               <option value="31">Pakur</option>
               <option value="4" data-slug="dhanbad">Dhanbad</option>"#,
        );

        let cities = parse_city_options(&html).into_cities();
        let names: Vec<_> = cities.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["Ranchi", "Pakur", "Dhanbad"]);
        assert_eq!(
            cities[0],
            CityRef {
                name: "Ranchi".into(),
                slug: Some("ranchi".into()),
                value: "12".into(),
            }
        );
        assert_eq!(cities[1].slug, None);
    }

    #[test]
    fn placeholder_with_a_value_is_still_skipped() {
        let html = state_page(
            r#"<option value="0">Select Jharkhand Mandi</option>
               <option value="9">Gumla</option>"#,
        );
        let cities = parse_city_options(&html).into_cities();
        assert_eq!(cities.len(), 1);
        assert_eq!(cities[0].name, "Gumla");
    }

    #[test]
    fn options_without_value_are_skipped() {
        let html = state_page(r#"<option>Ranchi</option><option value="">Pakur</option>"#);
        assert_eq!(parse_city_options(&html), CityListing::Found(vec![]));
    }

    #[test]
    fn missing_dropdown_is_reported() {
        let html = "<html><body><select id=\"other\"><option value=\"1\">X</option></select></body></html>";
        assert_eq!(parse_city_options(html), CityListing::SelectorMissing);
        assert!(parse_city_options("").into_cities().is_empty());
    }
}
