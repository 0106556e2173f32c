use serde::Deserialize;

use crate::feed::format_display;

/// A feed entry as it appears on the wire, before date normalization.
///
/// Field names bind to the exact JSON keys of the content API; an element
/// missing any of them fails deserialization, which is what gives the parser
/// its all-or-nothing batch behavior. The publication timestamp is carried
/// through raw — the parser performs no date semantics.
#[derive(Debug, Clone, Deserialize)]
pub struct RawStory {
    #[serde(rename = "webTitle")]
    pub title: String,
    #[serde(rename = "sectionName")]
    pub section: String,
    #[serde(rename = "webPublicationDate")]
    pub published: String,
    #[serde(rename = "webUrl")]
    pub url: String,
}

/// One normalized feed item, ready for display.
///
/// A `Story` is built wholly from a single source object via [`Story::from_raw`]
/// or not at all — no partially-initialized record ever reaches a consumer.
/// Values are snapshots; nothing mutates them after construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Story {
    /// Headline of the story.
    pub title: String,
    /// Section the story was published under (e.g. "Politics").
    pub section: String,
    /// Locale-formatted short publication date, e.g. "Mar 9, 2024".
    /// Empty when the source timestamp could not be parsed.
    pub published_display: String,
    /// Link to the full story. Opaque — never parsed by this crate.
    pub url: String,
}

impl Story {
    /// Normalize a raw wire entry into a display record.
    ///
    /// Date normalization is a per-item soft failure: an unparseable
    /// timestamp yields an empty display date, never an error.
    pub fn from_raw(raw: RawStory) -> Self {
        Self {
            published_display: format_display(&raw.published),
            title: raw.title,
            section: raw.section,
            url: raw.url,
        }
    }
}
