//! Problem statements: fetching the problem page and rendering `PROBLEM.md`.
use crate::catalog::{with_retries, RetryPolicy};
use regex::Regex;
use std::time::Instant;

pub const PROBLEM_PAGE_BASE_URL: &str = "https://www.acmicpc.net/problem";

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
AppleWebKit/537.36 (KHTML, like Gecko) Chrome/122.0.0.0 Safari/537.36";

pub fn problem_url(problem_id: u64) -> String {
    format!("{PROBLEM_PAGE_BASE_URL}/{problem_id}")
}

/// Statement sections as plain text.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Statement {
    pub url: String,
    pub description: String,
    pub input: String,
    pub output: String,
    pub sample_inputs: Vec<String>,
    pub sample_outputs: Vec<String>,
    /// Set when the page could not be fetched; the description then explains why.
    pub fetch_error: Option<String>,
}

impl Statement {
    /// Placeholder statement used when the page is unreachable.
    pub fn degraded(problem_id: u64, reason: &str) -> Self {
        Self {
            url: problem_url(problem_id),
            description: format!("(failed to fetch problem page: {reason})"),
            fetch_error: Some(reason.to_string()),
            ..Self::default()
        }
    }
}

/// Source of problem statements. Implementations report failures through
/// `Statement::fetch_error` instead of failing provisioning.
pub trait ProblemStatementSource {
    fn fetch(&self, problem_id: u64) -> Statement;
}

/// Scrapes the acmicpc.net problem page.
pub struct BojStatementSource {
    agent: ureq::Agent,
    retry: RetryPolicy,
}

impl BojStatementSource {
    pub fn new(agent: ureq::Agent, retry: RetryPolicy) -> Self {
        Self { agent, retry }
    }

    fn get_page(&self, url: &str) -> Result<String, ureq::Error> {
        let mut response = self
            .agent
            .get(url)
            .header("User-Agent", BROWSER_USER_AGENT)
            .header(
                "Accept",
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            )
            .header("Accept-Language", "ko-KR,ko;q=0.9,en-US;q=0.8,en;q=0.7")
            .header("Referer", "https://www.acmicpc.net/")
            .header("Cache-Control", "no-cache")
            .call()?;
        response.body_mut().read_to_string()
    }
}

impl ProblemStatementSource for BojStatementSource {
    fn fetch(&self, problem_id: u64) -> Statement {
        let url = problem_url(problem_id);
        let start = Instant::now();
        match with_retries(self.retry, "problem page", |_| self.get_page(&url)) {
            Ok(html) => {
                tracing::info!(
                    problem_id,
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    html_bytes = html.len(),
                    "problem page fetched"
                );
                parse_problem_page(&url, &html)
            }
            Err(err) => {
                tracing::warn!(problem_id, error = %err, "problem page fetch failed");
                Statement::degraded(problem_id, &err.to_string())
            }
        }
    }
}

/// Extract statement sections from a problem page.
pub fn parse_problem_page(url: &str, html: &str) -> Statement {
    let description = html_to_text(&extract_div(html, "problem_description"));
    Statement {
        url: url.to_string(),
        description: if description.is_empty() {
            "(no description found on the problem page)".to_string()
        } else {
            description
        },
        input: html_to_text(&extract_div(html, "problem_input")),
        output: html_to_text(&extract_div(html, "problem_output")),
        sample_inputs: extract_samples(html, "sample-input"),
        sample_outputs: extract_samples(html, "sample-output"),
        fetch_error: None,
    }
}

fn extract_div(html: &str, id: &str) -> String {
    let pattern = format!(r#"(?is)<div id="{}"[^>]*>(.*?)</div>"#, regex::escape(id));
    Regex::new(&pattern)
        .ok()
        .and_then(|re| re.captures(html))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_default()
}

fn extract_samples(html: &str, prefix: &str) -> Vec<String> {
    let pattern = format!(
        r#"(?is)<pre[^>]*id="{}-\d+"[^>]*>(.*?)</pre>"#,
        regex::escape(prefix)
    );
    let Ok(re) = Regex::new(&pattern) else {
        return Vec::new();
    };
    re.captures_iter(html)
        .filter_map(|caps| caps.get(1))
        .map(|m| html_to_text(m.as_str()))
        .collect()
}

/// Minimal HTML to text: line breaks for block elements, tags dropped,
/// common entities decoded.
pub fn html_to_text(html: &str) -> String {
    if html.trim().is_empty() {
        return String::new();
    }
    let breaks = Regex::new(r"(?i)<br\s*/?>|</p>|</li>|</h\d>").map(|re| re.replace_all(html, "\n"));
    let text = breaks.as_deref().unwrap_or(html);
    let stripped = Regex::new(r"(?s)<[^>]*>").map(|re| re.replace_all(text, "").into_owned());
    let stripped = stripped.unwrap_or_else(|_| text.to_string());
    let decoded = decode_entities(&stripped);
    let lines: Vec<&str> = decoded.lines().map(str::trim_end).collect();
    collapse_blank_lines(&lines).trim().to_string()
}

/// Named entities that show up in problem statements.
const NAMED_ENTITIES: &[(&str, &str)] = &[
    ("amp", "&"),
    ("lt", "<"),
    ("gt", ">"),
    ("quot", "\""),
    ("apos", "'"),
    ("nbsp", " "),
    ("le", "≤"),
    ("ge", "≥"),
    ("ne", "≠"),
    ("times", "×"),
    ("divide", "÷"),
    ("minus", "−"),
    ("plusmn", "±"),
    ("middot", "·"),
    ("sdot", "⋅"),
    ("hellip", "…"),
    ("ndash", "–"),
    ("mdash", "—"),
    ("lsquo", "‘"),
    ("rsquo", "’"),
    ("ldquo", "“"),
    ("rdquo", "”"),
    ("laquo", "«"),
    ("raquo", "»"),
    ("deg", "°"),
    ("sup2", "²"),
    ("sup3", "³"),
    ("larr", "←"),
    ("rarr", "→"),
    ("uarr", "↑"),
    ("darr", "↓"),
    ("infin", "∞"),
    ("lfloor", "⌊"),
    ("rfloor", "⌋"),
];

/// Decode named and numeric character references in one pass, so `&amp;lt;`
/// stays `&lt;`. Unknown names are kept verbatim.
fn decode_entities(text: &str) -> String {
    let Ok(re) = Regex::new(r"&(#[0-9]{1,7}|#[xX][0-9a-fA-F]{1,6}|[a-zA-Z][a-zA-Z0-9]{1,8});") else {
        return text.to_string();
    };
    re.replace_all(text, |caps: &regex::Captures<'_>| {
        let name = &caps[1];
        let decoded = if let Some(hex) = name.strip_prefix("#x").or_else(|| name.strip_prefix("#X")) {
            u32::from_str_radix(hex, 16).ok().and_then(char::from_u32).map(String::from)
        } else if let Some(dec) = name.strip_prefix('#') {
            dec.parse::<u32>().ok().and_then(char::from_u32).map(String::from)
        } else {
            NAMED_ENTITIES
                .iter()
                .find(|(entity, _)| *entity == name)
                .map(|(_, value)| value.to_string())
        };
        decoded.unwrap_or_else(|| caps[0].to_string())
    })
    .into_owned()
}

fn collapse_blank_lines(lines: &[&str]) -> String {
    let mut out = String::new();
    let mut blank_run = 0;
    for line in lines {
        if line.trim().is_empty() {
            blank_run += 1;
            if blank_run > 1 {
                continue;
            }
        } else {
            blank_run = 0;
        }
        out.push_str(line);
        out.push('\n');
    }
    out
}

/// Render `PROBLEM.md`.
pub fn render_statement(problem_id: u64, title: &str, statement: &Statement) -> String {
    let mut lines = vec![
        format!("# [{problem_id}] {title}"),
        String::new(),
        format!("- URL: {}", statement.url),
        String::new(),
        "## Description".to_string(),
        String::new(),
        if statement.description.is_empty() {
            "(empty)".to_string()
        } else {
            statement.description.clone()
        },
    ];
    if !statement.input.is_empty() {
        lines.push("\n## Input\n".to_string());
        lines.push(statement.input.clone());
    }
    if !statement.output.is_empty() {
        lines.push("\n## Output\n".to_string());
        lines.push(statement.output.clone());
    }
    let sample_count = statement
        .sample_inputs
        .len()
        .max(statement.sample_outputs.len());
    if sample_count > 0 {
        lines.push("\n## Examples".to_string());
    }
    for idx in 0..sample_count {
        let n = idx + 1;
        if let Some(input) = statement.sample_inputs.get(idx).filter(|s| !s.is_empty()) {
            lines.push(format!("\n### Sample Input {n}\n"));
            lines.push(format!("```\n{}\n```", input.trim()));
        }
        if let Some(output) = statement.sample_outputs.get(idx).filter(|s| !s.is_empty()) {
            lines.push(format!("\n### Sample Output {n}\n"));
            lines.push(format!("```\n{}\n```", output.trim()));
        }
    }
    let mut text = lines.join("\n");
    text.push('\n');
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<html><body>
<div id="problem_description" class="problem-text"><p>Read two integers A &amp; B.</p><p>Print A+B.</p></div>
<div id="problem_input" class="problem-text"><p>A and B on one line.</p></div>
<div id="problem_output" class="problem-text"><p>A+B &lt; 20</p></div>
<pre class="sampledata" id="sample-input-1">1 2
</pre>
<pre class="sampledata" id="sample-output-1">3
</pre>
<pre class="sampledata" id="sample-input-2">5 6</pre>
</body></html>"#;

    #[test]
    fn parses_sections_and_samples() {
        let statement = parse_problem_page("u", PAGE);
        assert_eq!(statement.description, "Read two integers A & B.\nPrint A+B.");
        assert_eq!(statement.input, "A and B on one line.");
        assert_eq!(statement.output, "A+B < 20");
        assert_eq!(statement.sample_inputs, ["1 2", "5 6"]);
        assert_eq!(statement.sample_outputs, ["3"]);
        assert!(statement.fetch_error.is_none());
    }

    #[test]
    fn decodes_named_and_numeric_entities() {
        assert_eq!(
            html_to_text("<p>1 &le; N &le; 10<sup>5</sup>, A &times; B &ne; 0</p>"),
            "1 ≤ N ≤ 105, A × B ≠ 0"
        );
        assert_eq!(html_to_text("&#39;x&#x27; &#8804; &#X2265;"), "'x' ≤ ≥");
        assert_eq!(html_to_text("&amp;lt; &unknown; &#xD800;"), "&lt; &unknown; &#xD800;");
    }

    #[test]
    fn missing_description_gets_placeholder() {
        let statement = parse_problem_page("u", "<html></html>");
        assert!(statement.description.starts_with("(no description"));
        assert!(statement.sample_inputs.is_empty());
    }

    #[test]
    fn renders_markdown_with_numbered_samples() {
        let statement = parse_problem_page(&problem_url(1000), PAGE);
        let text = render_statement(1000, "A+B", &statement);
        assert!(text.starts_with("# [1000] A+B\n\n- URL: https://www.acmicpc.net/problem/1000\n"));
        assert!(text.contains("## Input"));
        assert!(text.contains("### Sample Input 1\n\n```\n1 2\n```"));
        assert!(text.contains("### Sample Output 1\n\n```\n3\n```"));
        assert!(text.contains("### Sample Input 2"));
        assert!(!text.contains("### Sample Output 2"));
    }

    #[test]
    fn degraded_statement_renders_reason() {
        let statement = Statement::degraded(42, "timeout");
        let text = render_statement(42, "", &statement);
        assert!(text.contains("(failed to fetch problem page: timeout)"));
        assert!(!text.contains("## Examples"));
    }
}
