use std::fmt::Write;

/// Minimal HTML escaping for text and attribute values.
pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// The single page: four input forms, a clear button, and the frame grid.
pub fn render_index(images: &[String], default_browser: &str, default_frames: u32) -> String {
    let mut grid = String::new();
    for name in images {
        let name = escape(name);
        let _ = write!(
            grid,
            r#"<figure><img src="/images/{name}" alt="{name}"><figcaption>{name}</figcaption></figure>"#
        );
    }
    if images.is_empty() {
        grid.push_str("<p>No frames yet.</p>");
    }

    let browser = escape(default_browser);
    format!(
        r#"<!doctype html>
<html>
<head>
<meta charset="utf-8">
<title>frame-sieve</title>
<style>
body {{ font-family: sans-serif; margin: 2rem; }}
form {{ margin-bottom: 1rem; }}
.frames {{ display: flex; flex-wrap: wrap; gap: 1rem; }}
figure {{ margin: 0; }}
img {{ max-width: 320px; border: 1px solid #ccc; }}
</style>
</head>
<body>
<h1>frame-sieve</h1>
<form method="post" enctype="multipart/form-data">
  <label>Page URL <input type="url" name="url" required></label>
  <label>Frames <input type="number" name="frames" min="1" value="{default_frames}"></label>
  <label>Interval (ms) <input type="number" name="interval_ms" min="0"></label>
  <label>Browser <input type="text" name="browser" value="{browser}"></label>
  <button type="submit">Capture animation</button>
</form>
<form method="post" enctype="multipart/form-data">
  <label>Local GIF path <input type="text" name="gif" required></label>
  <button type="submit">Extract</button>
</form>
<form method="post" enctype="multipart/form-data">
  <label>GIF URL <input type="url" name="gif_url" required></label>
  <button type="submit">Fetch and extract</button>
</form>
<form method="post" enctype="multipart/form-data">
  <label>Upload GIF <input type="file" name="file" accept=".gif,image/gif" required></label>
  <button type="submit">Upload and extract</button>
</form>
<form method="post" enctype="multipart/form-data">
  <input type="hidden" name="clear" value="1">
  <button type="submit">Clear</button>
</form>
<div class="frames">{grid}</div>
</body>
</html>
"#
    )
}
