use std::backtrace::Backtrace;
use std::error::Error;
use std::fmt::Write as _;

/// An error and its formatted trace, ready to be mailed as an HTML report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExceptionReport {
    exception: String,
    traceback: String,
}

impl ExceptionReport {
    /// Create a report from an error message and an already formatted trace.
    ///
    /// An empty trace is allowed and renders as an empty traceback block.
    pub fn new(exception: impl Into<String>, traceback: impl Into<String>) -> Self {
        Self {
            exception: exception.into(),
            traceback: traceback.into(),
        }
    }

    /// Capture an error together with its source chain and a backtrace of the
    /// current call site.
    pub fn capture(error: &(dyn Error + 'static)) -> Self {
        let mut traceback = format!("Error: {}\n", error);

        let mut source = error.source();
        if source.is_some() {
            traceback.push_str("\nCaused by:\n");
        }
        let mut depth = 0;
        while let Some(cause) = source {
            let _ = writeln!(traceback, "    {}: {}", depth, cause);
            depth += 1;
            source = cause.source();
        }

        let _ = write!(
            traceback,
            "\nStack backtrace:\n{}",
            Backtrace::force_capture()
        );

        Self::new(error.to_string(), traceback)
    }

    pub fn exception(&self) -> &str {
        &self.exception
    }

    pub fn traceback(&self) -> &str {
        &self.traceback
    }

    /// Render the report into the fixed HTML template.
    ///
    /// The exception text and traceback are escaped; `post_traceback_html_body`
    /// is inserted verbatim after the traceback block.
    pub fn to_html(&self, post_traceback_html_body: Option<&str>) -> String {
        format!(
            r#"
<html>
<head>
    <style>
        body {{
            font-family: Arial, sans-serif;
            margin: 20px;
            color: #333;
        }}
        h2 {{
            color: #d9534f;
        }}
        .exception {{
            font-weight: bold;
            color: #d9534f;
        }}
        .traceback {{
            background-color: #f9f2f4;
            border: 1px solid #d9534f;
            padding: 10px;
            font-family: 'Courier New', Courier, monospace;
            white-space: pre-wrap;
            color: #333;
            border-radius: 4px;
        }}
    </style>
</head>
<body>
    <h2>Exception Details</h2>
    <p class="exception">Exception: {exception}</p>
    <p><strong>Traceback:</strong></p>
    <div class="traceback">{traceback}</div>
    <p>{post}</p>
</body>
</html>
"#,
            exception = html_escape(&self.exception),
            traceback = html_escape(&self.traceback),
            post = post_traceback_html_body.unwrap_or(""),
        )
    }
}

impl From<&anyhow::Error> for ExceptionReport {
    fn from(error: &anyhow::Error) -> Self {
        // Debug output carries the context chain and, when enabled, the backtrace
        Self::new(error.to_string(), format!("{:?}", error))
    }
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[derive(Debug, thiserror::Error)]
    #[error("division by zero")]
    struct DivisionByZero;

    #[derive(Debug, thiserror::Error)]
    #[error("failed to compute ratio")]
    struct RatioError(#[source] DivisionByZero);

    fn traceback_block(html: &str) -> &str {
        let start = html.find(r#"<div class="traceback">"#).unwrap() + 23;
        let end = start + html[start..].find("</div>").unwrap();
        &html[start..end]
    }

    #[test]
    fn test_capture_includes_message_and_trace() {
        let report = ExceptionReport::capture(&DivisionByZero);
        assert_eq!(report.exception(), "division by zero");
        assert!(report.traceback().contains("Stack backtrace:"));

        let html = report.to_html(None);
        assert!(html.contains("Exception: division by zero"));
        assert!(!traceback_block(&html).trim().is_empty());
    }

    #[test]
    fn test_capture_walks_source_chain() {
        let report = ExceptionReport::capture(&RatioError(DivisionByZero));
        assert_eq!(report.exception(), "failed to compute ratio");
        assert!(report.traceback().contains("Caused by:"));
        assert!(report.traceback().contains("0: division by zero"));
    }

    #[test]
    fn test_post_traceback_fragment_is_verbatim() {
        let report = ExceptionReport::new("division by zero", "trace");
        let html = report.to_html(Some("<b>ping ops</b>"));
        assert!(html.contains("<p><b>ping ops</b></p>"));
    }

    #[test]
    fn test_missing_fragment_renders_empty() {
        let html = ExceptionReport::new("boom", "trace").to_html(None);
        assert!(html.contains("<p></p>"));
    }

    #[test]
    fn test_empty_traceback_is_permitted() {
        let html = ExceptionReport::new("boom", "").to_html(None);
        assert_eq!(traceback_block(&html), "");
    }

    #[test]
    fn test_exception_and_trace_are_escaped() {
        let report = ExceptionReport::new("bad <input> & more", "at <T as Trait>::call");
        let html = report.to_html(None);
        assert!(html.contains("bad &lt;input&gt; &amp; more"));
        assert!(html.contains("at &lt;T as Trait&gt;::call"));
    }

    #[test]
    fn test_from_anyhow_error() {
        let error = Err::<(), _>(DivisionByZero)
            .context("while computing ratio")
            .unwrap_err();
        let report = ExceptionReport::from(&error);
        assert_eq!(report.exception(), "while computing ratio");
        assert!(report.traceback().contains("division by zero"));
    }
}
