//! Renderer families.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The family a renderer belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RendererKind {
    /// Full HTML page with layout.
    Page,
    /// Bare HTML fragment for partial reloads.
    Fragment,
    Json,
    Xml,
    /// CSV download.
    Csv,
    Text,
    Redirect,
}

impl RendererKind {
    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Page | Self::Fragment => "text/html; charset=utf-8",
            Self::Json => "application/json",
            Self::Xml => "application/xml; charset=utf-8",
            Self::Csv => "text/csv; charset=utf-8",
            Self::Text | Self::Redirect => "text/plain; charset=utf-8",
        }
    }

    pub fn is_html(&self) -> bool {
        matches!(self, Self::Page | Self::Fragment)
    }
}

impl fmt::Display for RendererKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Page => "page",
            Self::Fragment => "fragment",
            Self::Json => "json",
            Self::Xml => "xml",
            Self::Csv => "csv",
            Self::Text => "text",
            Self::Redirect => "redirect",
        };
        f.write_str(name)
    }
}
