//! Themed error documents

use hyper::StatusCode;

/// Everything the error document shows
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorPage {
    pub code: StatusCode,
    pub status_text: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub info: Option<String>,
    pub validated_url: String,
    pub resource: Option<String>,
}

impl ErrorPage {
    pub fn new(code: StatusCode, status_text: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            code,
            status_text: status_text.into(),
            title: None,
            description: None,
            info: None,
            validated_url: url.into(),
            resource: None,
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn info(mut self, info: impl Into<String>) -> Self {
        self.info = Some(info.into());
        self
    }

    pub fn resource(mut self, resource: impl Into<String>) -> Self {
        self.resource = Some(resource.into());
        self
    }

    fn heading(&self) -> String {
        match &self.title {
            Some(title) => title.clone(),
            None => format!("{} {}", self.code.as_u16(), self.status_text),
        }
    }

    /// Render the full HTML document
    pub fn render(&self) -> String {
        let heading = escape_html(&self.heading());
        let description = escape_html(self.description.as_deref().unwrap_or(&self.status_text));
        let info = self
            .info
            .as_deref()
            .map(|i| format!("<p class=\"info\">{}</p>", escape_html(i)))
            .unwrap_or_default();
        let resource = self
            .resource
            .as_deref()
            .map(|r| {
                format!(
                    "<p class=\"info\">The {} may be offline, or no peers are sharing it right now.</p>",
                    escape_html(r)
                )
            })
            .unwrap_or_default();

        format!(
            r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{heading}</title>
    <style>
        body {{ margin: 0; padding: 0; background: #f6f7f9; font-family: -apple-system, system-ui, sans-serif; display: flex; align-items: center; justify-content: center; min-height: 100vh; color: #333; }}
        .container {{ max-width: 600px; padding: 2rem; border: 1px solid #dde0e5; border-radius: 8px; background: #fff; }}
        h1 {{ font-size: 1.6rem; margin: 0 0 1rem; }}
        .code {{ font-family: monospace; color: #888; }}
        .info {{ line-height: 1.6; color: #555; }}
        .url {{ font-family: monospace; word-break: break-all; color: #777; }}
    </style>
</head>
<body>
    <div class="container">
        <h1>{heading}</h1>
        <p>{description}</p>
        {info}
        {resource}
        <p class="url">{url}</p>
        <p class="code">Error code: {code}</p>
    </div>
</body>
</html>"#,
            heading = heading,
            description = description,
            info = info,
            resource = resource,
            url = escape_html(&self.validated_url),
            code = self.code.as_u16(),
        )
    }
}

/// Escape text for inclusion in HTML element content or attribute values
pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
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
