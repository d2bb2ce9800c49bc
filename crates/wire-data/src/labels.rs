use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Text-bearing element flavours. Everything except `Text` is drawn as a control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextKind {
    Text,
    Input,
    ButtonRect,
    ButtonOval,
}

impl TextKind {
    pub fn is_plain(self) -> bool {
        matches!(self, TextKind::Text)
    }
}

/// What a detector class label turns into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Text,
    Input,
    ButtonRect,
    ButtonOval,
    Image,
    Checkbox,
    Icon,
}

impl Category {
    pub fn text_kind(self) -> Option<TextKind> {
        match self {
            Category::Text => Some(TextKind::Text),
            Category::Input => Some(TextKind::Input),
            Category::ButtonRect => Some(TextKind::ButtonRect),
            Category::ButtonOval => Some(TextKind::ButtonOval),
            Category::Image | Category::Checkbox | Category::Icon => None,
        }
    }
}

/// Icon classes emitted by the UI detector, in label-map order.
const ICON_LABELS: &[&str] = &[
    "icon_arrow_left",
    "icon_arrow_right",
    "icon_cart",
    "icon_close",
    "icon_facebook",
    "icon_home",
    "icon_mail",
    "icon_menu",
    "icon_search",
    "icon_settings",
    "icon_star",
    "icon_twitter",
    "icon_user",
];

/// Closed mapping from detector class label to element category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LabelVocabulary {
    entries: BTreeMap<String, Category>,
}

impl Default for LabelVocabulary {
    fn default() -> Self {
        let mut entries = BTreeMap::new();
        entries.insert("text".to_string(), Category::Text);
        entries.insert("input".to_string(), Category::Input);
        entries.insert("button_rect".to_string(), Category::ButtonRect);
        entries.insert("button_oval".to_string(), Category::ButtonOval);
        entries.insert("image".to_string(), Category::Image);
        entries.insert("checkbox".to_string(), Category::Checkbox);
        for label in ICON_LABELS {
            entries.insert(label.to_string(), Category::Icon);
        }
        Self { entries }
    }
}

impl LabelVocabulary {
    pub fn categorize(&self, label: &str) -> Option<Category> {
        self.entries.get(label).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_vocabulary() {
        let vocab = LabelVocabulary::default();
        assert_eq!(vocab.len(), 19);
        assert_eq!(vocab.categorize("text"), Some(Category::Text));
        assert_eq!(vocab.categorize("icon_search"), Some(Category::Icon));
        assert_eq!(vocab.categorize("checkbox"), Some(Category::Checkbox));
        assert_eq!(vocab.categorize("carousel"), None);
    }

    #[test]
    fn test_text_kinds() {
        assert_eq!(Category::ButtonOval.text_kind(), Some(TextKind::ButtonOval));
        assert_eq!(Category::Image.text_kind(), None);
        assert!(TextKind::Text.is_plain());
        assert!(!TextKind::Input.is_plain());
    }

    #[test]
    fn test_vocabulary_json_shape() {
        let vocab: LabelVocabulary =
            serde_json::from_str(r#"{ "headline": "text", "cta": "button_rect" }"#).unwrap();
        assert_eq!(vocab.categorize("cta"), Some(Category::ButtonRect));
        assert_eq!(vocab.categorize("text"), None);
    }
}
