//! Parsed page documents
//!
//! A [`Document`] wraps the HTML tree built from a response body and answers
//! CSS selector queries against it. Parsing never fails: malformed markup is
//! recovered the way browsers recover it, invalid UTF-8 is replaced, and an
//! empty body yields an empty document.

use crate::{Result, TideError};
use scraper::{ElementRef, Html, Selector};

/// A queryable HTML document
#[derive(Debug)]
pub struct Document {
    html: Html,
}

impl Document {
    /// Parses a complete response body
    ///
    /// # Example
    ///
    /// ```
    /// use sumi_tide::crawler::Document;
    ///
    /// let doc = Document::parse(b"<html><head><title>Hi</title></head></html>");
    /// assert_eq!(doc.title(), Some("Hi".to_string()));
    /// ```
    pub fn parse(body: &[u8]) -> Self {
        let text = String::from_utf8_lossy(body);
        Self {
            html: Html::parse_document(&text),
        }
    }

    /// The underlying scraper tree
    pub fn html(&self) -> &Html {
        &self.html
    }

    /// Returns every element matching `selector`, in document order
    pub fn select(&self, selector: &str) -> Result<Vec<ElementRef<'_>>> {
        let compiled = compile(selector)?;
        Ok(self.html.select(&compiled).collect())
    }

    /// Returns the trimmed text of every element matching `selector`
    pub fn select_text(&self, selector: &str) -> Result<Vec<String>> {
        Ok(self
            .select(selector)?
            .into_iter()
            .map(|element| element.text().collect::<String>().trim().to_string())
            .collect())
    }

    /// Returns the page title (from the `<title>` tag)
    pub fn title(&self) -> Option<String> {
        let title_selector = Selector::parse("title").ok()?;

        self.html
            .select(&title_selector)
            .next()
            .map(|element| element.text().collect::<String>().trim().to_string())
            .filter(|s| !s.is_empty())
    }
}

fn compile(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| TideError::Selector {
        selector: selector.to_string(),
        message: e.to_string(),
    })
}
