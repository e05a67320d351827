//! The upload page: one image input, one text output.

const TITLE: &str = "🍓 Food Analyzer AI 🥕";

/// Escape text for use inside HTML element content and attribute values.
pub fn escape_html(text: &str) -> String {
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

/// Render the form. `result` fills the output box; `notice` is shown above
/// the form when the upload itself was unusable.
pub fn render_page(model: &str, result: Option<&str>, notice: Option<&str>) -> String {
    let notice_html = notice
        .map(|n| format!(r#"<p class="notice">{}</p>"#, escape_html(n)))
        .unwrap_or_default();

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
    <style>
        body {{ font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; background: #f7f7f9; margin: 0; padding: 20px; }}
        .container {{ max-width: 760px; margin: 0 auto; background: white; border-radius: 12px; padding: 32px; box-shadow: 0 4px 20px rgba(0,0,0,0.08); }}
        h1 {{ margin-top: 0; }}
        .description {{ color: #555; }}
        label {{ display: block; font-weight: 600; margin: 20px 0 8px; }}
        textarea {{ width: 100%; box-sizing: border-box; font-family: monospace; font-size: 1em; padding: 10px; }}
        button {{ margin-top: 16px; padding: 10px 24px; font-size: 1em; border: none; border-radius: 8px; background: #e8590c; color: white; cursor: pointer; }}
        .notice {{ background: #fff4e6; border: 1px solid #ffc078; color: #a34a00; padding: 10px; border-radius: 8px; }}
    </style>
</head>
<body>
    <div class="container">
        <h1>{title}</h1>
        <p class="description">Upload a picture of food, and the AI will tell you what's in it and how much there is. Built with {model}.</p>
        {notice}
        <form method="post" action="/analyze" enctype="multipart/form-data">
            <label for="image">Upload a food image</label>
            <input type="file" id="image" name="image" accept="image/*" required>
            <button type="submit">Submit</button>
        </form>
        <label for="result">Analysis Result</label>
        <textarea id="result" rows="10" readonly>
{result}</textarea>
    </div>
</body>
</html>
"#,
        title = TITLE,
        model = escape_html(model),
        notice = notice_html,
        result = escape_html(result.unwrap_or_default()),
    )
}
