//! Analysis item model.
//!
//! Every completed analysis is stored as one `AnalysisItem`: either a
//! summarized text or a described image. The two variants never share
//! storage; consumers match exhaustively.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Desired length of a generated summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SummaryLength {
    Short,
    #[default]
    Medium,
    Long,
}

/// Editorial focus of a generated summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SummaryFocus {
    #[default]
    Informative,
    Critical,
    Narrative,
    Technical,
}

/// Output format of a generated summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SummaryFormat {
    List,
    #[default]
    Paragraph,
    Mixed,
}

impl SummaryLength {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Short => "short",
            Self::Medium => "medium",
            Self::Long => "long",
        }
    }
}

impl SummaryFocus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Informative => "informative",
            Self::Critical => "critical",
            Self::Narrative => "narrative",
            Self::Technical => "technical",
        }
    }
}

impl SummaryFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::List => "list",
            Self::Paragraph => "paragraph",
            Self::Mixed => "mixed",
        }
    }
}

/// Summarization parameters chosen at creation time. Immutable afterwards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummarizeConfig {
    pub length: SummaryLength,
    pub focus: SummaryFocus,
    pub format: SummaryFormat,
}

/// A summarized text document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextItem {
    /// Unique identifier, the merge key for import.
    pub id: String,
    /// Creation timestamp, the canonical sort key.
    pub created_at: DateTime<Utc>,
    /// Display label.
    pub title: String,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Name of the uploaded file, when there was one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_filename: Option<String>,
    /// Fully extracted source text.
    pub original_content: String,
    /// Generated summary. Rewritten in place by refinement.
    pub summary: String,
    /// Parameters the summary was generated with.
    pub config: SummarizeConfig,
}

/// A described image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageItem {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub title: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_filename: Option<String>,
    /// Base64 data URI (`data:<mime>;base64,...`), the canonical stored form.
    pub encoded_image: String,
    /// Generated description. Rewritten in place by refinement.
    pub description: String,
}

/// One stored analysis result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum AnalysisItem {
    Text(TextItem),
    Image(ImageItem),
}

impl AnalysisItem {
    /// Create a text item with the default title/tag conventions.
    pub fn new_text(
        content: String,
        summary: String,
        config: SummarizeConfig,
        title: Option<String>,
        tags: Option<Vec<String>>,
        source_filename: Option<String>,
    ) -> Self {
        let title = title
            .or_else(|| source_filename.clone())
            .unwrap_or_else(|| default_text_title(&content));
        AnalysisItem::Text(TextItem {
            id: uuid::Uuid::new_v4().to_string(),
            created_at: Utc::now(),
            title,
            tags: tags.unwrap_or_else(|| vec!["texto".to_string(), "resumen".to_string()]),
            source_filename,
            original_content: content,
            summary,
            config,
        })
    }

    /// Create an image item with the default title/tag conventions.
    pub fn new_image(
        encoded_image: String,
        description: String,
        title: Option<String>,
        tags: Option<Vec<String>>,
        source_filename: Option<String>,
    ) -> Self {
        let title = title
            .or_else(|| source_filename.clone())
            .unwrap_or_else(|| "Nuevo Análisis de Imagen".to_string());
        AnalysisItem::Image(ImageItem {
            id: uuid::Uuid::new_v4().to_string(),
            created_at: Utc::now(),
            title,
            tags: tags.unwrap_or_else(|| vec!["imagen".to_string(), "visión".to_string()]),
            source_filename,
            encoded_image,
            description,
        })
    }

    pub fn id(&self) -> &str {
        match self {
            Self::Text(t) => &t.id,
            Self::Image(i) => &i.id,
        }
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        match self {
            Self::Text(t) => t.created_at,
            Self::Image(i) => i.created_at,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Self::Text(t) => &t.title,
            Self::Image(i) => &i.title,
        }
    }

    pub fn tags(&self) -> &[String] {
        match self {
            Self::Text(t) => &t.tags,
            Self::Image(i) => &i.tags,
        }
    }

    pub fn source_filename(&self) -> Option<&str> {
        match self {
            Self::Text(t) => t.source_filename.as_deref(),
            Self::Image(i) => i.source_filename.as_deref(),
        }
    }

    /// Serialized discriminant value.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Image(_) => "image",
        }
    }

    /// Generated output shown to the user: summary or description.
    pub fn generated(&self) -> &str {
        match self {
            Self::Text(t) => &t.summary,
            Self::Image(i) => &i.description,
        }
    }
}

/// Placeholder title: first five words of the content.
fn default_text_title(content: &str) -> String {
    let mut title: String = content
        .split_whitespace()
        .take(5)
        .collect::<Vec<_>>()
        .join(" ");
    title.push_str("...");
    title
}

/// Partial update of an item's mutable fields.
///
/// Absent fields are left untouched; present fields overwrite wholesale
/// (tags are replaced, not merged). `summary` applies only to text items
/// and `description` only to image items.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemPatch {
    pub title: Option<String>,
    pub tags: Option<Vec<String>>,
    pub summary: Option<String>,
    pub description: Option<String>,
}

impl ItemPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.tags.is_none()
            && self.summary.is_none()
            && self.description.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_item_roundtrip() {
        let item = AnalysisItem::new_text(
            "Hello world from the test suite".to_string(),
            "A greeting.".to_string(),
            SummarizeConfig::default(),
            None,
            None,
            Some("notes.txt".to_string()),
        );

        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["kind"], "text");
        assert_eq!(json["sourceFilename"], "notes.txt");
        assert!(json["createdAt"].is_string());

        let back: AnalysisItem = serde_json::from_value(json).unwrap();
        assert_eq!(back, item);
    }

    #[test]
    fn test_image_item_roundtrip() {
        let item = AnalysisItem::new_image(
            "data:image/png;base64,aGk=".to_string(),
            "A tiny image.".to_string(),
            Some("Vacation".to_string()),
            None,
            None,
        );

        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["kind"], "image");
        assert_eq!(json["title"], "Vacation");
        assert!(json.get("summary").is_none());

        let back: AnalysisItem = serde_json::from_value(json).unwrap();
        assert_eq!(back, item);
    }

    #[test]
    fn test_default_title_from_content() {
        let item = AnalysisItem::new_text(
            "one two three four five six seven".to_string(),
            String::new(),
            SummarizeConfig::default(),
            None,
            None,
            None,
        );
        assert_eq!(item.title(), "one two three four five...");
    }

    #[test]
    fn test_filename_preferred_over_generated_title() {
        let item = AnalysisItem::new_text(
            "one two three four five six".to_string(),
            String::new(),
            SummarizeConfig::default(),
            None,
            None,
            Some("report.txt".to_string()),
        );
        assert_eq!(item.title(), "report.txt");
    }

    #[test]
    fn test_config_serde_values() {
        let config = SummarizeConfig {
            length: SummaryLength::Long,
            focus: SummaryFocus::Critical,
            format: SummaryFormat::List,
        };
        let json = serde_json::to_value(config).unwrap();
        assert_eq!(json["length"], "long");
        assert_eq!(json["focus"], "critical");
        assert_eq!(json["format"], "list");
    }

    #[test]
    fn test_default_tags() {
        let text = AnalysisItem::new_text(
            "x".into(),
            "y".into(),
            SummarizeConfig::default(),
            None,
            None,
            None,
        );
        assert_eq!(text.tags(), ["texto", "resumen"]);

        let image =
            AnalysisItem::new_image("data:image/png;base64,".into(), "z".into(), None, None, None);
        assert_eq!(image.tags(), ["imagen", "visión"]);
    }
}
