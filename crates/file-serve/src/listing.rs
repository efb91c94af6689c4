use crate::path;

/// Render an HTML index of `dir`
///
/// `url_path` is the decoded request path, used for the title.  Entries are sorted
/// case-insensitively; directories get a trailing `/` and symlinks an `@`.
pub(crate) fn render(dir: &std::path::Path, url_path: &str) -> std::io::Result<String> {
    let mut entries = std::fs::read_dir(dir)?
        .filter_map(Result::ok)
        .map(|entry| Entry::new(&entry))
        .collect::<Vec<_>>();
    entries.sort_by_cached_key(|entry| entry.name.to_lowercase());

    let title = escape_html(url_path);
    let mut html = String::new();
    html.push_str("<!DOCTYPE HTML>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
    html.push_str(&format!("<title>Directory listing for {title}</title>\n"));
    html.push_str("</head>\n<body>\n");
    html.push_str(&format!("<h1>Directory listing for {title}</h1>\n"));
    html.push_str("<hr>\n<ul>\n");
    for entry in &entries {
        html.push_str(&format!(
            "<li><a href=\"{}\">{}</a></li>\n",
            path::percent_encode(&entry.link(), path::PATH_SAFE),
            escape_html(&entry.display()),
        ));
    }
    html.push_str("</ul>\n<hr>\n</body>\n</html>\n");

    Ok(html)
}

struct Entry {
    name: String,
    is_dir: bool,
    is_symlink: bool,
}

impl Entry {
    fn new(entry: &std::fs::DirEntry) -> Self {
        Self {
            name: entry.file_name().to_string_lossy().into_owned(),
            // follows symlinks, a link to a directory is still browsable
            is_dir: entry.path().is_dir(),
            is_symlink: entry.file_type().is_ok_and(|t| t.is_symlink()),
        }
    }

    fn link(&self) -> String {
        if self.is_dir {
            format!("{}/", self.name)
        } else {
            self.name.clone()
        }
    }

    fn display(&self) -> String {
        if self.is_symlink {
            format!("{}@", self.name)
        } else {
            self.link()
        }
    }
}

pub(crate) fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            c => escaped.push(c),
        }
    }
    escaped
}
