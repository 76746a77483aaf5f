//! Shared fixtures

use knowledge_harvester::config::parse_config;
use knowledge_harvester::Config;
use std::path::Path;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// TOML for a config pointed at `base_url` with no request delay and a lenient validator
pub fn test_config_toml(base_url: &str, dir: &Path, mode: &str) -> String {
    format!(
        r#"
        [target]
        name = "Mock Org"
        url = "{base_url}"
        team-id = "team-test"
        user-id = "tester"

        [crawler]
        max-pages = 10
        request-delay-ms = 0
        timeout-secs = 5
        user-agents = ["HarvestTest/1.0"]

        [pipeline]
        min-content-length = 20
        min-title-length = 3
        processing-mode = "{mode}"
        max-concurrency = 3

        [storage]
        database-path = "{db}"
        url-directory = "{urls}"
        "#,
        base_url = base_url,
        mode = mode,
        db = dir.join("knowledge.db").display(),
        urls = dir.join("urls").display(),
    )
}

pub fn test_config(base_url: &str, dir: &Path, mode: &str) -> Config {
    parse_config(&test_config_toml(base_url, dir, mode)).expect("test config should be valid")
}

/// An HTML page with a title, links and technical body text
pub fn html_page(title: &str, links: &[&str], body: &str) -> String {
    let anchors: String = links
        .iter()
        .map(|href| format!(r#"<a href="{}">{}</a> "#, href, href))
        .collect();
    format!(
        "<html><head><title>{}</title></head><body><nav>{}</nav><article><p>{}</p></article></body></html>",
        title, anchors, body
    )
}

pub async fn mount_html(server: &MockServer, route: &str, html: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_raw(html, "text/html"))
        .mount(server)
        .await;
}

pub const TECH_TEXT: &str =
    "Our backend team shipped a new database framework to improve server performance.";

/// A one-page PDF with each entry of `lines` on its own line, in Helvetica
pub fn minimal_pdf(lines: &[&str]) -> Vec<u8> {
    let mut stream = String::from("BT /F1 12 Tf 72 720 Td 14 TL\n");
    for (i, line) in lines.iter().enumerate() {
        if i > 0 {
            stream.push_str("T*\n");
        }
        stream.push_str(&format!("({}) Tj\n", line));
    }
    stream.push_str("ET");

    let objects = [
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string(),
        "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] /Contents 4 0 R \
         /Resources << /Font << /F1 5 0 R >> >> >>"
            .to_string(),
        format!("<< /Length {} >>\nstream\n{}\nendstream", stream.len(), stream),
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>"
            .to_string(),
    ];

    let mut pdf = String::from("%PDF-1.4\n");
    let mut offsets = Vec::with_capacity(objects.len());
    for (i, object) in objects.iter().enumerate() {
        offsets.push(pdf.len());
        pdf.push_str(&format!("{} 0 obj\n{}\nendobj\n", i + 1, object));
    }

    let xref = pdf.len();
    pdf.push_str(&format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1));
    for offset in offsets {
        pdf.push_str(&format!("{:010} 00000 n \n", offset));
    }
    pdf.push_str(&format!(
        "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
        objects.len() + 1,
        xref
    ));
    pdf.into_bytes()
}
