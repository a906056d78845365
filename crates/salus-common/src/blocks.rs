//! Page and block payloads as stored by the authoring layer.
//!
//! Blocks are immutable inputs to rendering. The `data` payload is
//! kind-discriminated JSON; unrecognized kinds deserialize into
//! [`BlockData::Unknown`] so a page with a newer block type still renders.

use serde::{Deserialize, Serialize};

/// Kind-discriminated block payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BlockData {
    /// Authoring markdown, converted to HTML at render time.
    Text { text: String },
    /// Privileged raw HTML. Embedded verbatim; the authoring path that
    /// writes these blocks is the trust boundary.
    Html { html: String },
    /// Stored media reference rendered as a figure.
    Image {
        src: String,
        #[serde(default)]
        alt: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        caption: Option<String>,
    },
    /// Anything this version does not understand.
    #[serde(untagged)]
    Unknown(serde_json::Value),
}

impl BlockData {
    /// The `type` discriminator as stored, best-effort for unknown kinds.
    pub fn kind(&self) -> &str {
        match self {
            BlockData::Text { .. } => "text",
            BlockData::Html { .. } => "html",
            BlockData::Image { .. } => "image",
            BlockData::Unknown(value) => value
                .get("type")
                .and_then(|v| v.as_str())
                .unwrap_or("unknown"),
        }
    }
}

/// One content block: a payload plus its ordering position on the page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    #[serde(flatten)]
    pub data: BlockData,
    #[serde(default)]
    pub position: i64,
}

impl Block {
    pub fn new(data: BlockData, position: i64) -> Self {
        Self { data, position }
    }
}

/// Page metadata rendered into the document chrome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A page plus its blocks, the unit the CLI and tests read from disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageDocument {
    pub page: Page,
    #[serde(default)]
    pub blocks: Vec<Block>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_deserialize_text_block() {
        let json = r##"{"type": "text", "text": "# Hello", "position": 2}"##;
        let block: Block = serde_json::from_str(json).unwrap();
        assert_eq!(block.position, 2);
        assert_eq!(
            block.data,
            BlockData::Text {
                text: "# Hello".to_owned()
            }
        );
    }

    #[test]
    fn test_deserialize_html_block() {
        let json = r#"{"type": "html", "html": "<div>x</div>"}"#;
        let block: Block = serde_json::from_str(json).unwrap();
        assert_eq!(block.position, 0);
        assert!(matches!(block.data, BlockData::Html { .. }));
    }

    #[test]
    fn test_deserialize_image_block() {
        let json = r#"{"type": "image", "src": "/media/scan.png", "alt": "CT scan"}"#;
        let block: Block = serde_json::from_str(json).unwrap();
        match block.data {
            BlockData::Image { src, alt, caption } => {
                assert_eq!(src, "/media/scan.png");
                assert_eq!(alt, "CT scan");
                assert_eq!(caption, None);
            }
            other => panic!("unexpected payload: {other:?}"),
        }
    }

    #[test]
    fn test_unknown_kind_falls_through() {
        let json = r#"{"type": "poll", "question": "?", "position": 9}"#;
        let block: Block = serde_json::from_str(json).unwrap();
        assert_eq!(block.position, 9);
        assert_eq!(block.data.kind(), "poll");
        assert!(matches!(block.data, BlockData::Unknown(_)));
    }

    #[test]
    fn test_page_document_roundtrip() {
        let doc = PageDocument {
            page: Page {
                title: "Flu clinic hours".to_owned(),
                description: None,
            },
            blocks: vec![
                Block::new(
                    BlockData::Text {
                        text: "**Walk-ins welcome**".to_owned(),
                    },
                    1,
                ),
                Block::new(
                    BlockData::Html {
                        html: "<div class=\"notice\">Closed Friday</div>".to_owned(),
                    },
                    2,
                ),
            ],
        };
        let json = serde_json::to_string(&doc).unwrap();
        let back: PageDocument = serde_json::from_str(&json).unwrap();
        assert_eq!(doc, back);
    }
}
