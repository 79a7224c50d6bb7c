use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One clipping from the Kindle export.
///
/// The serialized keys match the `kindle.log` format written by earlier
/// versions of the tool, so existing logs keep working.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Highlight {
    #[serde(rename = "book title")]
    pub book_title: String,
    #[serde(rename = "book location")]
    pub location: String,
    #[serde(rename = "quote")]
    pub quote: String,
}

impl Highlight {
    pub fn new(book_title: &str, location: &str, quote: &str) -> Self {
        Highlight {
            book_title: book_title.to_string(),
            location: location.to_string(),
            quote: quote.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Element {
    Title,
    Quote,
    Annotation,
}

impl FromStr for Element {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "title" => Ok(Element::Title),
            "quote" => Ok(Element::Quote),
            "annotation" => Ok(Element::Annotation),
            other => Err(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    #[default]
    Default,
    Gray,
    Brown,
    Orange,
    Yellow,
    Green,
    Blue,
    Purple,
    Pink,
    Red,
}

impl Color {
    pub const ALL: [Color; 10] = [
        Color::Default,
        Color::Gray,
        Color::Brown,
        Color::Orange,
        Color::Yellow,
        Color::Green,
        Color::Blue,
        Color::Purple,
        Color::Pink,
        Color::Red,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Color::Default => "default",
            Color::Gray => "gray",
            Color::Brown => "brown",
            Color::Orange => "orange",
            Color::Yellow => "yellow",
            Color::Green => "green",
            Color::Blue => "blue",
            Color::Purple => "purple",
            Color::Pink => "pink",
            Color::Red => "red",
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Color {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Color::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| s.to_string())
    }
}

/// The block kinds a styled element can be rendered as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockType {
    HeaderBlock,
    SubheaderBlock,
    SubsubheaderBlock,
    QuoteBlock,
    TextBlock,
    PageBlock,
    BulletedListBlock,
    TodoBlock,
    CalloutBlock,
    ToggleBlock,
}

impl BlockType {
    pub const ALL: [BlockType; 10] = [
        BlockType::HeaderBlock,
        BlockType::SubheaderBlock,
        BlockType::SubsubheaderBlock,
        BlockType::QuoteBlock,
        BlockType::TextBlock,
        BlockType::PageBlock,
        BlockType::BulletedListBlock,
        BlockType::TodoBlock,
        BlockType::CalloutBlock,
        BlockType::ToggleBlock,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            BlockType::HeaderBlock => "HeaderBlock",
            BlockType::SubheaderBlock => "SubheaderBlock",
            BlockType::SubsubheaderBlock => "SubsubheaderBlock",
            BlockType::QuoteBlock => "QuoteBlock",
            BlockType::TextBlock => "TextBlock",
            BlockType::PageBlock => "PageBlock",
            BlockType::BulletedListBlock => "BulletedListBlock",
            BlockType::TodoBlock => "TodoBlock",
            BlockType::CalloutBlock => "CalloutBlock",
            BlockType::ToggleBlock => "ToggleBlock",
        }
    }

    /// Pages and toggles hold their children instead of showing them inline.
    pub fn is_container(self) -> bool {
        matches!(self, BlockType::PageBlock | BlockType::ToggleBlock)
    }
}

impl fmt::Display for BlockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BlockType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BlockType::ALL
            .into_iter()
            .find(|b| b.as_str() == s)
            .ok_or_else(|| s.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleRule {
    pub color: Color,
    #[serde(rename = "block.type")]
    pub block_type: BlockType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleSheet {
    pub title: StyleRule,
    pub quote: StyleRule,
    pub annotation: StyleRule,
}

impl Default for StyleSheet {
    fn default() -> Self {
        StyleSheet {
            title: StyleRule {
                color: Color::Pink,
                block_type: BlockType::SubheaderBlock,
            },
            quote: StyleRule {
                color: Color::Default,
                block_type: BlockType::QuoteBlock,
            },
            annotation: StyleRule {
                color: Color::Gray,
                block_type: BlockType::BulletedListBlock,
            },
        }
    }
}

impl StyleSheet {
    pub fn rule(&self, element: Element) -> &StyleRule {
        match element {
            Element::Title => &self.title,
            Element::Quote => &self.quote,
            Element::Annotation => &self.annotation,
        }
    }

    pub fn rule_mut(&mut self, element: Element) -> &mut StyleRule {
        match element {
            Element::Title => &mut self.title,
            Element::Quote => &mut self.quote,
            Element::Annotation => &mut self.annotation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_highlight_serializes_with_log_keys() {
        let h = Highlight::new("Dune", "- Location 12-14", "Fear is the mind-killer.");

        let json = serde_json::to_value(&h).unwrap();

        assert_eq!(json["book title"], "Dune");
        assert_eq!(json["book location"], "- Location 12-14");
        assert_eq!(json["quote"], "Fear is the mind-killer.");
    }

    #[test]
    fn test_highlight_equality_uses_all_fields() {
        let a = Highlight::new("Dune", "loc 1", "q");

        assert_eq!(a, Highlight::new("Dune", "loc 1", "q"));
        assert_ne!(a, Highlight::new("Dune", "loc 2", "q"));
        assert_ne!(a, Highlight::new("Dune", "loc 1", "other"));
    }

    #[test]
    fn test_default_style_sheet_file_format() {
        let json = serde_json::to_value(StyleSheet::default()).unwrap();

        assert_eq!(json["title"]["color"], "pink");
        assert_eq!(json["title"]["block.type"], "SubheaderBlock");
        assert_eq!(json["quote"]["block.type"], "QuoteBlock");
        assert_eq!(json["annotation"]["color"], "gray");
        assert_eq!(json["annotation"]["block.type"], "BulletedListBlock");
    }

    #[test]
    fn test_container_block_types() {
        let containers: Vec<_> = BlockType::ALL
            .into_iter()
            .filter(|b| b.is_container())
            .collect();

        assert_eq!(containers, vec![BlockType::PageBlock, BlockType::ToggleBlock]);
    }

    #[test]
    fn test_parse_names() {
        assert_eq!("ToggleBlock".parse::<BlockType>(), Ok(BlockType::ToggleBlock));
        assert_eq!("purple".parse::<Color>(), Ok(Color::Purple));
        assert_eq!("annotation".parse::<Element>(), Ok(Element::Annotation));
        assert!("Toggle".parse::<BlockType>().is_err());
        assert!("magenta".parse::<Color>().is_err());
    }
}
