//! Method Documentation
//!
//! Renders method summaries and descriptions (markdown) to HTML for the
//! method panel's documentation tab. Fenced code blocks and method sources
//! are highlighted with syntect.

use std::sync::OnceLock;

use pulldown_cmark::{html::push_html, CodeBlockKind, CowStr, Event, Options, Parser, Tag, TagEnd};
use syntect::highlighting::{Theme, ThemeSet};
use syntect::html::highlighted_html_for_string;
use syntect::parsing::SyntaxSet;

use crate::models::SchemaMethod;

static SYNTAX_SET: OnceLock<SyntaxSet> = OnceLock::new();
static THEME_SET: OnceLock<ThemeSet> = OnceLock::new();

const THEME: &str = "InspiredGitHub";

fn syntax_set() -> &'static SyntaxSet {
    SYNTAX_SET.get_or_init(SyntaxSet::load_defaults_newlines)
}

fn theme() -> Option<&'static Theme> {
    let themes = &THEME_SET.get_or_init(ThemeSet::load_defaults).themes;
    themes.get(THEME).or_else(|| themes.values().next())
}

/// Language of a method source: JavaScript when wrapped in `{ … }`,
/// StructrScript (`${ … }` expressions) otherwise
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceLanguage {
    JavaScript,
    Python,
    StructrScript,
}

impl SourceLanguage {
    pub fn detect(method: &SchemaMethod) -> Self {
        match method.code_type.as_deref().map(str::to_ascii_lowercase).as_deref() {
            Some("js") | Some("javascript") => return SourceLanguage::JavaScript,
            Some("py") | Some("python") => return SourceLanguage::Python,
            _ => {}
        }
        let source = method.source.as_deref().unwrap_or_default().trim_start();
        if source.starts_with('{') {
            SourceLanguage::JavaScript
        } else {
            SourceLanguage::StructrScript
        }
    }

    fn token(self) -> Option<&'static str> {
        match self {
            SourceLanguage::JavaScript => Some("js"),
            SourceLanguage::Python => Some("py"),
            SourceLanguage::StructrScript => None,
        }
    }
}

pub fn render_markdown(text: &str) -> String {
    let parser = Parser::new_ext(text, Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TABLES);
    let mut html = String::new();
    push_html(&mut html, highlight_code_blocks(parser).into_iter());
    html
}

fn highlight_code_blocks(parser: Parser<'_>) -> Vec<Event<'_>> {
    let mut events = Vec::new();
    let mut block: Option<(Option<String>, String)> = None;

    for event in parser {
        if let Some((lang, code)) = block.as_mut() {
            match event {
                Event::Text(text) => code.push_str(&text),
                Event::End(TagEnd::CodeBlock) => {
                    events.push(Event::Html(CowStr::from(highlight_code(code, lang.as_deref()))));
                    block = None;
                }
                _ => {}
            }
            continue;
        }

        match event {
            Event::Start(Tag::CodeBlock(kind)) => {
                let lang = match kind {
                    CodeBlockKind::Fenced(l) if !l.is_empty() => Some(l.to_string()),
                    _ => None,
                };
                block = Some((lang, String::new()));
            }
            other => events.push(other),
        }
    }
    events
}

pub fn highlight_code(code: &str, lang: Option<&str>) -> String {
    let ss = syntax_set();
    let syntax = lang
        .and_then(|l| ss.find_syntax_by_token(l))
        .unwrap_or_else(|| ss.find_syntax_plain_text());

    theme()
        .and_then(|theme| highlighted_html_for_string(code, ss, syntax, theme).ok())
        .unwrap_or_else(|| format!("<pre><code>{}</code></pre>", escape_html(code)))
}

pub fn highlight_source(method: &SchemaMethod) -> String {
    highlight_code(method.source.as_deref().unwrap_or_default(), SourceLanguage::detect(method).token())
}

/// Documentation tab: summary, description, parameter table and a sample call
pub fn render_method_docs(method: &SchemaMethod) -> String {
    let mut doc = String::new();

    if let Some(summary) = method.summary.as_deref().filter(|s| !s.trim().is_empty()) {
        doc.push_str(&format!("**{}**\n\n", summary.trim()));
    }
    if let Some(description) = method.description.as_deref().filter(|s| !s.trim().is_empty()) {
        doc.push_str(description.trim());
        doc.push_str("\n\n");
    }

    let mut parameters = method.parameters.clone();
    parameters.sort_by_key(|p| p.index);
    if !parameters.is_empty() {
        doc.push_str("| Parameter | Type | Description |\n|---|---|---|\n");
        for p in &parameters {
            doc.push_str(&format!(
                "| `{}` | {} | {} |\n",
                p.name,
                p.parameter_type,
                p.description.as_deref().unwrap_or_default().replace('|', "\\|").replace('\n', " ")
            ));
        }
        doc.push('\n');
    }

    let arguments: Vec<String> = parameters
        .iter()
        .map(|p| format!("{}: {}", p.name, p.example_value.as_deref().filter(|v| !v.is_empty()).unwrap_or("null")))
        .collect();
    let target = if method.is_global() { "$".to_string() } else { "$.this".to_string() };
    let call = if method.is_global() {
        format!("{}.call('{}', {{ {} }});", target, method.name, arguments.join(", "))
    } else {
        format!("{}.{}({{ {} }});", target, method.name, arguments.join(", "))
    };
    doc.push_str(&format!("```js\n{}\n```\n", call.replace("{  }", "{}")));

    render_markdown(&doc)
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MethodParameter, TypeRef};

    fn method(source: &str) -> SchemaMethod {
        SchemaMethod {
            id: "m1".into(),
            name: "report".into(),
            source: Some(source.into()),
            ..SchemaMethod::default()
        }
    }

    #[test]
    fn test_detects_language_from_source() {
        assert_eq!(SourceLanguage::detect(&method("{ return 1; }")), SourceLanguage::JavaScript);
        assert_eq!(SourceLanguage::detect(&method("${this.name}")), SourceLanguage::StructrScript);

        let python = SchemaMethod { code_type: Some("Python".into()), ..method("x = 1") };
        assert_eq!(SourceLanguage::detect(&python), SourceLanguage::Python);
    }

    #[test]
    fn test_code_blocks_are_highlighted_not_escaped_twice() {
        let html = render_markdown("Intro\n\n```js\nlet a = 1 < 2;\n```\n");
        assert!(html.contains("<p>Intro</p>"));
        assert!(html.contains("<pre"));
        assert!(!html.contains("<code class=\"language-js\">"));
        assert!(html.contains("&lt;"));
    }

    #[test]
    fn test_docs_list_parameters_in_index_order() {
        let mut m = method("{ }");
        m.schema_node = Some(TypeRef::new("t1"));
        m.summary = Some("Builds a report".into());
        m.parameters = vec![
            MethodParameter { name: "to".into(), parameter_type: "Date".into(), index: 1, ..Default::default() },
            MethodParameter {
                name: "from".into(),
                parameter_type: "Date".into(),
                index: 0,
                example_value: Some("'2024-01-01'".into()),
                ..Default::default()
            },
        ];

        let html = render_method_docs(&m);
        assert!(html.contains("<strong>Builds a report</strong>"));
        let from = html.find("<code>from</code>").unwrap();
        let to = html.find("<code>to</code>").unwrap();
        assert!(from < to);
        assert!(html.contains("report"));
    }

    #[test]
    fn test_plain_text_fallback_escapes() {
        let html = highlight_code("<b>", Some("no-such-language"));
        assert!(html.contains("&lt;b&gt;"));
    }
}
