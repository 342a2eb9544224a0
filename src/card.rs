use crate::models::RepositoryRecord;
use crate::theme::{DisplayPreference, ResolvedTheme};
use colored::*;
use serde::Serialize;

pub const DESCRIPTION_FALLBACK: &str = "No description provided";
pub const MAX_TOPIC_BADGES: usize = 3;
const DATE_FORMAT: &str = "%b %-d, %Y";

/// Everything one project card shows
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepoCard {
    pub name: String,
    pub description: String,
    pub language: Option<String>,
    pub topics: Vec<String>,
    pub stars: u64,
    pub forks: u64,
    pub is_fork: bool,
    pub updated: String,
    pub code_url: String,
    pub demo_url: Option<String>,
    pub preview_url: Option<String>,
    #[serde(skip)]
    preference: DisplayPreference,
}

impl RepoCard {
    pub fn from_record(record: &RepositoryRecord, preference: DisplayPreference) -> Self {
        RepoCard {
            name: record.name.clone(),
            description: record
                .description
                .clone()
                .unwrap_or_else(|| DESCRIPTION_FALLBACK.to_string()),
            language: record.primary_language.clone(),
            topics: record.topics.iter().take(MAX_TOPIC_BADGES).cloned().collect(),
            stars: record.star_count,
            forks: record.fork_count,
            is_fork: record.is_fork,
            updated: record.updated_at.format(DATE_FORMAT).to_string(),
            code_url: record.web_url.clone(),
            demo_url: record.homepage_url.clone(),
            preview_url: None,
            preference,
        }
    }

    /// Attach a screenshot preview built from the demo link.
    ///
    /// `template` carries a `{url}` placeholder. Cards without a demo link get no preview.
    pub fn with_preview_template(mut self, template: Option<&str>) -> Self {
        self.preview_url = match (template, self.demo_url.as_deref()) {
            (Some(template), Some(demo)) => Some(template.replace("{url}", demo)),
            _ => None,
        };
        self
    }

    /// Terminal rendition of the card
    pub fn render_text(&self, system_prefers_dark: bool) -> String {
        let dark = self.preference.resolve(system_prefers_dark) == ResolvedTheme::Dark;
        let accent = |s: &str| if dark { s.bright_cyan() } else { s.blue() };

        let mut lines = Vec::new();

        let mut title = self.name.bold().to_string();
        if self.is_fork {
            title.push_str(&format!(" {}", "(fork)".dimmed()));
        }
        lines.push(title);
        lines.push(format!("  {}", self.description));

        let mut meta = Vec::new();
        if let Some(language) = &self.language {
            meta.push(accent(language).to_string());
        }
        meta.push(format!("★ {}", self.stars));
        meta.push(format!("⑂ {}", self.forks));
        meta.push(format!("updated {}", self.updated).dimmed().to_string());
        lines.push(format!("  {}", meta.join("  ")));

        if !self.topics.is_empty() {
            let badges: Vec<String> = self.topics.iter().map(|t| format!("#{}", t)).collect();
            lines.push(format!("  {}", badges.join(" ").yellow()));
        }

        lines.push(format!("  code: {}", accent(&self.code_url)));
        if let Some(demo) = &self.demo_url {
            lines.push(format!("  demo: {}", accent(demo)));
        }
        if let Some(preview) = &self.preview_url {
            lines.push(format!("  preview: {}", preview.dimmed()));
        }

        lines.join("\n")
    }
}
