//! Result payload of a completed analysis.
//!
//! The payload shape belongs to the analysis service; this wrapper keeps it
//! opaque and only offers read accessors for the pieces the front end shows.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Opaque result object attached to a completed task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Payload(Value);

/// Downloadable and displayable resources referenced by a payload, resolved
/// to absolute URLs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceLinks {
    /// Generated report document.
    pub report: Option<String>,
    /// Rendered page snapshot image.
    pub snapshot: Option<String>,
    /// Extracted brand assets.
    pub assets: Vec<String>,
    /// Collected stylesheets.
    pub stylesheets: Vec<String>,
}

impl ResourceLinks {
    pub fn is_empty(&self) -> bool {
        self.report.is_none()
            && self.snapshot.is_none()
            && self.assets.is_empty()
            && self.stylesheets.is_empty()
    }
}

impl Payload {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }

    pub fn title(&self) -> Option<&str> {
        self.brand_field("title")
    }

    pub fn description(&self) -> Option<&str> {
        self.brand_field("description")
    }

    /// Generated report text.
    pub fn report(&self) -> Option<&str> {
        self.0.get("report").and_then(Value::as_str)
    }

    pub fn fonts(&self) -> Vec<&str> {
        self.0
            .get("brand_data")
            .and_then(|brand| brand.get("fonts"))
            .and_then(Value::as_array)
            .map(|fonts| fonts.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }

    /// Resolves every resource reference against `base_url`.
    pub fn links(&self, base_url: &str) -> ResourceLinks {
        let single = |key: &str| {
            self.0
                .get(key)
                .and_then(Value::as_str)
                .map(|path| resolve(base_url, path))
        };
        let many = |key: &str| {
            self.0
                .get(key)
                .and_then(Value::as_array)
                .map(|paths| {
                    paths
                        .iter()
                        .filter_map(Value::as_str)
                        .map(|path| resolve(base_url, path))
                        .collect()
                })
                .unwrap_or_default()
        };

        ResourceLinks {
            report: single("pdf_url"),
            snapshot: single("screenshot_url"),
            assets: many("assets_urls"),
            stylesheets: many("css_urls"),
        }
    }

    fn brand_field(&self, key: &str) -> Option<&str> {
        self.0
            .get("brand_data")
            .and_then(|brand| brand.get(key))
            .and_then(Value::as_str)
    }
}

impl From<Value> for Payload {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

/// Joins a service-relative path onto the base URL. Absolute URLs pass
/// through unchanged.
pub fn resolve(base_url: &str, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }

    let base = base_url.trim_end_matches('/');
    let path = path.trim_start_matches('/').replace(' ', "%20");
    format!("{base}/{path}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case("http://localhost:8000", "/results/x/report.pdf", "http://localhost:8000/results/x/report.pdf")]
    #[case("http://localhost:8000/", "/results/x/report.pdf", "http://localhost:8000/results/x/report.pdf")]
    #[case("http://localhost:8000", "results/x/a.png", "http://localhost:8000/results/x/a.png")]
    #[case("http://api", "/results/x/Brand Assets/logo.svg", "http://api/results/x/Brand%20Assets/logo.svg")]
    #[case("http://api", "https://cdn.example.com/a.png", "https://cdn.example.com/a.png")]
    fn resolves_against_base(#[case] base: &str, #[case] path: &str, #[case] expected: &str) {
        assert_eq!(resolve(base, path), expected);
    }

    #[test]
    fn extracts_links_and_brand_fields() {
        let payload = Payload::new(json!({
            "brand_data": {
                "title": "Example",
                "description": "An example brand",
                "fonts": ["Inter", 12, "Georgia"]
            },
            "report": "# Report",
            "pdf_url": "/results/example_com/report.pdf",
            "screenshot_url": "/results/example_com/Snapshot/homepage.png",
            "assets_urls": ["/results/example_com/Brand Assets/logo.png"],
            "css_urls": ["/results/example_com/CSS/main.css"]
        }));

        assert_eq!(payload.title(), Some("Example"));
        assert_eq!(payload.description(), Some("An example brand"));
        assert_eq!(payload.report(), Some("# Report"));
        assert_eq!(payload.fonts(), vec!["Inter", "Georgia"]);
        assert_eq!(
            payload.links("http://localhost:8000"),
            ResourceLinks {
                report: Some("http://localhost:8000/results/example_com/report.pdf".into()),
                snapshot: Some(
                    "http://localhost:8000/results/example_com/Snapshot/homepage.png".into()
                ),
                assets: vec![
                    "http://localhost:8000/results/example_com/Brand%20Assets/logo.png".into()
                ],
                stylesheets: vec!["http://localhost:8000/results/example_com/CSS/main.css".into()],
            }
        );
    }

    #[test]
    fn null_pdf_url_yields_no_report_link() {
        let payload = Payload::new(json!({ "pdf_url": null }));
        let links = payload.links("http://localhost:8000");

        assert!(links.report.is_none());
        assert!(links.is_empty());
    }
}
