//! services/studio/src/adapters/document.rs
//!
//! Renders a generated outline into a standalone HTML page. Section titles and
//! contents arrive as Markdown and are converted with `pulldown-cmark`; raw
//! HTML inside them is shown as text.

use freeplotter_core::domain::{OutlineDocument, RenderedDocument};
use freeplotter_core::ports::{DocumentRenderer, PortResult};
use pulldown_cmark::{html, Event, Options, Parser};

pub const DOCUMENT_HEADER: &str = "~ Created with Freeplotter.com ~";

const STYLE: &str = "body{font-family:'Times New Roman',serif;max-width:46rem;margin:2rem auto;padding:0 2rem;}\
header{font-size:12px;color:grey;text-align:center;margin-bottom:20px;}\
h1{font-size:24px;text-align:center;margin-bottom:16px;}\
h2{font-size:16px;margin:10px 0;}\
.summary,.premise{font-size:14px;}\
.section{margin:0 12px 20px;}\
.section-title{font-size:14px;font-weight:bold;}\
.section-content{font-size:14px;text-align:justify;}";

/// A `DocumentRenderer` producing `text/html`.
#[derive(Debug, Clone, Default)]
pub struct HtmlOutlineRenderer;

impl HtmlOutlineRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl DocumentRenderer for HtmlOutlineRenderer {
    fn render_outline(&self, document: &OutlineDocument) -> PortResult<RenderedDocument> {
        let mut page = String::with_capacity(4096);
        page.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
        page.push_str(&format!("<title>{}</title>\n", escape(&document.title)));
        page.push_str(&format!("<style>{}</style>\n</head>\n<body>\n", STYLE));
        page.push_str(&format!("<header>{}</header>\n", DOCUMENT_HEADER));
        page.push_str(&format!("<h1>{}</h1>\n", escape(&document.title)));

        if let Some(summary) = document.summary.as_deref().filter(|s| !s.is_empty()) {
            page.push_str(&format!("<p class=\"summary\">{}</p>\n", escape(summary)));
        }

        if !document.premise.is_empty() {
            page.push_str("<section>\n<h2>Premise</h2>\n");
            page.push_str(&format!(
                "<p class=\"premise\">{}</p>\n</section>\n",
                escape(&document.premise)
            ));
        }

        if !document.sections.is_empty() {
            page.push_str("<h2>Outline</h2>\n");
            for section in &document.sections {
                page.push_str("<section class=\"section\">\n");
                page.push_str(&format!(
                    "<div class=\"section-title\">{}</div>\n",
                    markdown_to_html(&section.title)
                ));
                page.push_str(&format!(
                    "<div class=\"section-content\">{}</div>\n",
                    markdown_to_html(&section.content)
                ));
                page.push_str("</section>\n");
            }
        }

        page.push_str("</body>\n</html>\n");
        Ok(RenderedDocument {
            content_type: "text/html; charset=utf-8".to_string(),
            bytes: page.into_bytes(),
        })
    }
}

fn markdown_to_html(text: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);

    let parser = Parser::new_ext(text, options).map(|event| match event {
        Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
        other => other,
    });
    let mut out = String::new();
    html::push_html(&mut out, parser);
    out
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
