use std::fmt::Write as _;

/// Shown instead of markup when a template has none.
pub const PLACEHOLDER_TEXT: &str = "No preview available";

/// Sandbox tokens for the preview frame: same-origin content access, no scripts.
pub const SANDBOX: &str = "allow-same-origin";

/// Rendering mode of a preview.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Fidelity {
    /// Scaled-down card preview.
    Thumbnail,
    /// 1:1 render, used in the full-preview modal.
    Full,
}

impl Fidelity {
    pub fn scale(self) -> f64 {
        match self {
            Fidelity::Thumbnail => 0.6,
            Fidelity::Full => 1.0,
        }
    }

    /// Body width/height. The thumbnail body is oversized by 1/0.6 so that,
    /// after scaling, it exactly fills the visible frame.
    pub fn container_size(self) -> &'static str {
        match self {
            Fidelity::Thumbnail => "166.67%",
            Fidelity::Full => "100%",
        }
    }

    /// Height of the hosting frame in CSS pixels.
    pub fn frame_height_px(self) -> u32 {
        match self {
            Fidelity::Thumbnail => 192,
            Fidelity::Full => 600,
        }
    }
}

/// Builds the standalone preview document.
///
/// Template markup and style are inserted verbatim: they are trusted-origin
/// content and only ever rendered inside a script-less sandbox. Without
/// markup the placeholder is rendered and the template style is left out.
pub fn build_preview_document(
    markup: Option<&str>,
    style: Option<&str>,
    fidelity: Fidelity,
) -> String {
    let markup = markup.filter(|m| !m.trim().is_empty());
    let size = fidelity.container_size();

    let mut doc = String::with_capacity(
        512 + markup.map_or(0, str::len) + style.map_or(0, str::len),
    );
    doc.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    doc.push_str("<meta charset=\"UTF-8\">\n");
    doc.push_str(
        "<meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n",
    );
    doc.push_str("<title>Template Preview</title>\n<style>\n");
    let _ = write!(
        doc,
        "body {{\n  margin: 0;\n  padding: 20px;\n  \
         font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;\n  \
         background: white;\n  transform: scale({});\n  transform-origin: top left;\n  \
         width: {size};\n  height: {size};\n}}\n",
        fidelity.scale()
    );
    if markup.is_some() {
        if let Some(style) = style {
            doc.push_str(style);
            doc.push('\n');
        }
    }
    doc.push_str("</style>\n</head>\n<body>\n");
    match markup {
        Some(markup) => doc.push_str(markup),
        None => {
            let _ = write!(
                doc,
                "<div style=\"padding: 20px; text-align: center; color: #666;\">\
                 {PLACEHOLDER_TEXT}</div>"
            );
        }
    }
    doc.push_str("\n</body>\n</html>\n");
    doc
}

/// Wraps a preview document in a host page holding a sandboxed inline frame,
/// so a browser opening the file shows the preview isolated from the host.
pub fn sandboxed_frame_html(title: &str, document: &str, fidelity: Fidelity) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"UTF-8\">\n\
         <title>{title}</title>\n</head>\n<body style=\"margin: 0; background: #f4f4f5;\">\n\
         <iframe title=\"Preview of {title}\" sandbox=\"{SANDBOX}\" \
         style=\"width: 100%; height: {height}px; border: 0; background: white;\" \
         srcdoc=\"{srcdoc}\"></iframe>\n</body>\n</html>\n",
        title = escape_attr(title),
        height = fidelity.frame_height_px(),
        srcdoc = escape_attr(document),
    )
}

fn escape_attr(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}
