//! Prompt construction for the summary model.

use crate::model::note::NoteCategory;
use crate::summary::model::ModelRequest;
use serde::{Deserialize, Serialize};

const ANALYSIS_SYSTEM: &str =
    "You are an expert at summarizing and analyzing text. Always answer with a single JSON object.";
const QUICK_SYSTEM: &str = "You write short, concise summaries of at most two sentences.";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SummaryLength {
    Short,
    #[default]
    Medium,
    Long,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SummaryStyle {
    Bullet,
    #[default]
    Paragraph,
    Keywords,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SummaryLanguage {
    Pl,
    #[default]
    En,
}

impl SummaryLanguage {
    fn name(self) -> &'static str {
        match self {
            Self::Pl => "Polish",
            Self::En => "English",
        }
    }
}

/// Shape of a detailed analysis request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryOptions {
    pub length: SummaryLength,
    pub style: SummaryStyle,
    pub language: SummaryLanguage,
}

impl SummaryOptions {
    pub fn quick() -> Self {
        Self {
            length: SummaryLength::Short,
            style: SummaryStyle::Paragraph,
            ..Self::default()
        }
    }

    pub fn detailed() -> Self {
        Self {
            length: SummaryLength::Long,
            style: SummaryStyle::Bullet,
            ..Self::default()
        }
    }

    pub fn keywords() -> Self {
        Self {
            length: SummaryLength::Medium,
            style: SummaryStyle::Keywords,
            ..Self::default()
        }
    }
}

pub(crate) fn analysis_request(
    content: &str,
    title: Option<&str>,
    options: &SummaryOptions,
) -> ModelRequest {
    let length = match options.length {
        SummaryLength::Short => "very short (1-2 sentences)",
        SummaryLength::Medium => "medium (3-4 sentences)",
        SummaryLength::Long => "detailed (5-7 sentences)",
    };
    let style = match options.style {
        SummaryStyle::Bullet => "as bullet points",
        SummaryStyle::Paragraph => "as a paragraph",
        SummaryStyle::Keywords => "as keywords",
    };

    let prompt = format!(
        "Analyze this note and return a JSON object with the fields:\n\
         - summary: {length} summary {style}\n\
         - keyPoints: array of the most important points (3-5 items)\n\
         - category: one of {categories}\n\
         - sentiment: positive, neutral or negative\n\
         - confidence: confidence of the analysis between 0.0 and 1.0\n\
         Write the text fields in {language}.\n\
         {title}\n\
         Note content:\n{content}\n\n\
         JSON:",
        categories = NoteCategory::prompt_list(),
        language = options.language.name(),
        title = title_line(title),
    );

    ModelRequest::new(prompt)
        .with_system(ANALYSIS_SYSTEM)
        .with_temperature(0.3)
        .with_max_tokens(500)
        .expecting_json()
}

pub(crate) fn quick_request(content: &str, title: Option<&str>, budget: usize) -> ModelRequest {
    let prompt = format!(
        "Write a short summary (at most 2 sentences) of this note:\n\
         {title}\n\
         Content:\n{body}\n\n\
         Summary:",
        title = title_line(title),
        body = clip(content, budget),
    );

    ModelRequest::new(prompt)
        .with_system(QUICK_SYSTEM)
        .with_temperature(0.3)
        .with_max_tokens(100)
}

pub(crate) fn category_request(content: &str, title: Option<&str>, budget: usize) -> ModelRequest {
    let prompt = format!(
        "Pick the category of this note. Answer with exactly one of: {categories}.\n\
         {title}\n\
         Content: {body}\n\n\
         Category:",
        categories = NoteCategory::prompt_list(),
        title = title_line(title),
        body = clip(content, budget),
    );

    ModelRequest::new(prompt)
        .with_temperature(0.1)
        .with_max_tokens(20)
}

pub(crate) fn tags_request(content: &str, title: Option<&str>, budget: usize) -> ModelRequest {
    let prompt = format!(
        "Generate 3-5 single-word tags for this note.\n\
         {title}\n\
         Content: {body}\n\n\
         Tags (comma separated):",
        title = title_line(title),
        body = clip(content, budget),
    );

    ModelRequest::new(prompt)
        .with_temperature(0.3)
        .with_max_tokens(50)
}

fn title_line(title: Option<&str>) -> String {
    match title.map(str::trim).filter(|value| !value.is_empty()) {
        Some(value) => format!("Title: {value}\n"),
        None => String::new(),
    }
}

/// First `budget` characters, with `...` appended when cut.
fn clip(content: &str, budget: usize) -> String {
    if content.chars().count() <= budget {
        return content.to_string();
    }
    let head: String = content.chars().take(budget).collect();
    format!("{head}...")
}
