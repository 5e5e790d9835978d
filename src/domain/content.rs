//! Normalized portfolio content.
//!
//! Every provider response is mapped into these types before it reaches the
//! cache, so callers never see CMS-specific shapes.

use std::fmt;

use serde::Serialize;

/// Category id used for items the CMS returned without one.
pub const UNCATEGORIZED: &str = "uncategorized";

/// Identifier of an item or section. CMS revisions used both integer and
/// string identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum ItemId {
    Numeric(i64),
    Text(String),
}

impl ItemId {
    /// Compare against an identifier taken from user input (query string,
    /// command line). Numeric ids match any string that parses to the same
    /// integer.
    pub fn matches(&self, raw: &str) -> bool {
        match self {
            ItemId::Numeric(value) => raw
                .trim()
                .parse::<i64>()
                .is_ok_and(|parsed| parsed == *value),
            ItemId::Text(value) => value == raw,
        }
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemId::Numeric(value) => write!(f, "{value}"),
            ItemId::Text(value) => f.write_str(value),
        }
    }
}

impl From<i64> for ItemId {
    fn from(value: i64) -> Self {
        Self::Numeric(value)
    }
}

impl From<&str> for ItemId {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Section {
    pub id: ItemId,
    pub title: String,
    pub images: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContentItem {
    pub id: ItemId,
    /// Legacy `projectID` when the CMS carries it next to `id`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<ItemId>,
    pub title: String,
    pub image_url: String,
    pub popup_text: String,
    pub category: Option<String>,
    pub sections: Vec<Section>,
}

impl ContentItem {
    /// Whether `raw` names this item by its id or its legacy project id.
    pub fn matches_id(&self, raw: &str) -> bool {
        self.id.matches(raw)
            || self
                .project_id
                .as_ref()
                .is_some_and(|project_id| project_id.matches(raw))
    }

    /// All section images in display order.
    pub fn slides(&self) -> impl Iterator<Item = &str> {
        self.sections
            .iter()
            .flat_map(|section| section.images.iter().map(String::as_str))
    }

    pub fn slide_count(&self) -> usize {
        self.sections.iter().map(|section| section.images.len()).sum()
    }

    /// Flattened slide index of the first image of `section`.
    pub fn section_start(&self, section: usize) -> Option<usize> {
        if section >= self.sections.len() {
            return None;
        }
        Some(
            self.sections[..section]
                .iter()
                .map(|previous| previous.images.len())
                .sum(),
        )
    }

    /// Index of the section that contains flattened slide `slide`.
    ///
    /// Falls back to the first section when `slide` is past the end.
    pub fn section_at(&self, slide: usize) -> usize {
        let mut seen = 0;
        for (index, section) in self.sections.iter().enumerate() {
            seen += section.images.len();
            if slide < seen {
                return index;
            }
        }
        0
    }
}

/// An item laid out as a slideshow: flattened slides plus the slide index
/// where each section starts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemDetail<'a> {
    #[serde(flatten)]
    pub item: &'a ContentItem,
    pub slides: Vec<&'a str>,
    pub slide_count: usize,
    pub section_starts: Vec<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_section: Option<usize>,
}

impl<'a> ItemDetail<'a> {
    /// `slide` selects the section reported as current, if given.
    pub fn new(item: &'a ContentItem, slide: Option<usize>) -> Self {
        let section_starts = (0..item.sections.len())
            .filter_map(|section| item.section_start(section))
            .collect();
        Self {
            item,
            slides: item.slides().collect(),
            slide_count: item.slide_count(),
            section_starts,
            current_section: slide.map(|slide| item.section_at(slide)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Category {
    pub id: String,
    pub items: Vec<ContentItem>,
}

/// Group items by category, keeping the first-seen order of categories and
/// the input order of items within each category.
pub fn group_by_category(items: Vec<ContentItem>) -> Vec<Category> {
    let mut categories: Vec<Category> = Vec::new();
    for item in items {
        let id = item.category.as_deref().unwrap_or(UNCATEGORIZED);
        match categories.iter_mut().find(|category| category.id == id) {
            Some(category) => category.items.push(item),
            None => categories.push(Category {
                id: id.to_string(),
                items: vec![item],
            }),
        }
    }
    categories
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: i64, category: Option<&str>, sections: &[usize]) -> ContentItem {
        ContentItem {
            id: ItemId::Numeric(id),
            project_id: None,
            title: format!("Item {id}"),
            image_url: "main.jpg".to_string(),
            popup_text: String::new(),
            category: category.map(str::to_string),
            sections: sections
                .iter()
                .enumerate()
                .map(|(index, count)| Section {
                    id: ItemId::Numeric(index as i64 + 1),
                    title: format!("Section {index}"),
                    images: (0..*count).map(|n| format!("{index}-{n}.jpg")).collect(),
                })
                .collect(),
        }
    }

    #[test]
    fn numeric_id_matches_parsed_input() {
        let id = ItemId::Numeric(12);
        assert!(id.matches("12"));
        assert!(id.matches(" 12 "));
        assert!(!id.matches("012a"));
        assert!(!id.matches("13"));
    }

    #[test]
    fn text_id_matches_exactly() {
        let id = ItemId::from("space-01");
        assert!(id.matches("space-01"));
        assert!(!id.matches("SPACE-01"));
    }

    #[test]
    fn ids_serialize_untagged() {
        let json = serde_json::to_string(&vec![ItemId::Numeric(3), ItemId::from("x")])
            .expect("serialize ids");
        assert_eq!(json, r#"[3,"x"]"#);
    }

    #[test]
    fn section_start_sums_previous_sections() {
        let item = item(1, None, &[2, 0, 3]);
        assert_eq!(item.section_start(0), Some(0));
        assert_eq!(item.section_start(1), Some(2));
        assert_eq!(item.section_start(2), Some(2));
        assert_eq!(item.section_start(3), None);
        assert_eq!(item.slide_count(), 5);
    }

    #[test]
    fn section_at_skips_empty_sections() {
        let item = item(1, None, &[2, 0, 3]);
        assert_eq!(item.section_at(0), 0);
        assert_eq!(item.section_at(1), 0);
        assert_eq!(item.section_at(2), 2);
        assert_eq!(item.section_at(4), 2);
        assert_eq!(item.section_at(5), 0);
    }

    #[test]
    fn slides_flatten_in_section_order() {
        let item = item(1, None, &[1, 2]);
        let slides: Vec<&str> = item.slides().collect();
        assert_eq!(slides, vec!["0-0.jpg", "1-0.jpg", "1-1.jpg"]);
    }

    #[test]
    fn project_id_also_identifies_the_item() {
        let mut legacy = item(4, None, &[1]);
        legacy.project_id = Some(ItemId::Numeric(104));
        assert!(legacy.matches_id("4"));
        assert!(legacy.matches_id("104"));
        assert!(!legacy.matches_id("5"));
        assert!(!item(4, None, &[1]).matches_id("104"));
    }

    #[test]
    fn detail_lists_section_offsets() {
        let item = item(1, None, &[2, 0, 3]);
        let detail = ItemDetail::new(&item, Some(3));

        assert_eq!(detail.slide_count, 5);
        assert_eq!(detail.slides.len(), detail.slide_count);
        assert_eq!(detail.section_starts, vec![0, 2, 2]);
        assert_eq!(detail.slides[2], "2-0.jpg");
        assert_eq!(detail.current_section, Some(2));

        let json = serde_json::to_value(&detail).expect("serialize detail");
        assert_eq!(json["title"], "Item 1");
        assert_eq!(json["section_starts"], serde_json::json!([0, 2, 2]));
        assert_eq!(json["current_section"], 2);
        assert!(json.get("project_id").is_none());
    }

    #[test]
    fn detail_without_slide_omits_current_section() {
        let item = item(1, None, &[1]);
        let json = serde_json::to_value(ItemDetail::new(&item, None)).expect("serialize detail");
        assert!(json.get("current_section").is_none());
    }

    #[test]
    fn grouping_keeps_first_seen_order() {
        let grouped = group_by_category(vec![
            item(1, Some("space"), &[1]),
            item(2, Some("brand"), &[1]),
            item(3, Some("space"), &[1]),
            item(4, None, &[1]),
        ]);

        let ids: Vec<&str> = grouped.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["space", "brand", UNCATEGORIZED]);
        assert_eq!(grouped[0].items.len(), 2);
        assert_eq!(grouped[0].items[1].id, ItemId::Numeric(3));
    }
}
