//! HTML rendering of a [`Snapshot`].
//!
//! # Responsibility
//! - Turn a snapshot into a standalone HTML document.
//! - Split entries into tabular sections and plain JSON sections.
//!
//! # Invariants
//! - Rendering is pure: no I/O, no clock reads.
//! - Every piece of stored text is escaped before it reaches the document.
//! - Tabular sections show at most `max_rows` rows and say so when truncated.

use crate::snapshot::{EntryOrigin, Snapshot, SnapshotEntry};
use serde_json::Value;
pub const DEFAULT_MAX_ROWS: usize = 10;
pub const DEFAULT_MAX_CELL_CHARS: usize = 100;

const STYLE: &str = "
        body { font-family: Arial, sans-serif; margin: 20px; background-color: #f5f5f5; }
        .container { max-width: 1200px; margin: 0 auto; background-color: white; padding: 20px; }
        h1 { color: #333; border-bottom: 2px solid #007acc; padding-bottom: 10px; }
        h2 { color: #007acc; margin-top: 30px; }
        .section { margin-bottom: 30px; padding: 15px; border: 1px solid #ddd; }
        .table { width: 100%; border-collapse: collapse; margin-top: 10px; }
        .table th, .table td { border: 1px solid #ddd; padding: 8px; text-align: left; }
        .json { font-family: 'Courier New', monospace; white-space: pre-wrap; }
        .collapsible { cursor: pointer; padding: 10px; width: 100%; border: none; text-align: left; }
        .content { padding: 0 18px; display: none; }
";

const SCRIPT: &str = "
    <script>
        var coll = document.getElementsByClassName(\"collapsible\");
        for (var i = 0; i < coll.length; i++) {
            coll[i].addEventListener(\"click\", function() {
                var content = this.nextElementSibling;
                content.style.display = content.style.display === \"block\" ? \"none\" : \"block\";
            });
        }
    </script>
";

/// Presentation limits for [`render_report`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportOptions {
    pub title: String,
    /// Rows shown per tabular section.
    pub max_rows: usize,
    /// Characters shown per table cell before `...` is appended.
    pub max_cell_chars: usize,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            title: "EasyStore Report".to_string(),
            max_rows: DEFAULT_MAX_ROWS,
            max_cell_chars: DEFAULT_MAX_CELL_CHARS,
        }
    }
}

/// Facts about the report that do not come from the snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportMeta {
    /// Human-readable store location.
    pub source: String,
    pub generated_at: String,
}

/// How an entry is laid out in the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionKind {
    /// Rendered as an HTML table, one row per object.
    Tabular,
    /// Rendered as pretty-printed JSON.
    Plain,
}

/// Classifies an entry by shape.
///
/// Foreign relations are always tabular, even when empty. Any other entry is
/// tabular when it is a non-empty array whose elements are all objects.
pub fn classify(entry: &SnapshotEntry) -> SectionKind {
    if entry.origin == EntryOrigin::Table {
        return SectionKind::Tabular;
    }
    match &entry.value {
        Value::Array(items) if !items.is_empty() && items.iter().all(Value::is_object) => {
            SectionKind::Tabular
        }
        _ => SectionKind::Plain,
    }
}

/// Renders `snapshot` as a complete HTML document.
pub fn render_report(snapshot: &Snapshot, meta: &ReportMeta, options: &ReportOptions) -> String {
    let (tabular, plain): (Vec<&SnapshotEntry>, Vec<&SnapshotEntry>) = snapshot
        .entries()
        .iter()
        .partition(|entry| classify(entry) == SectionKind::Tabular);

    let mut html = String::new();
    let title = escape_html(&options.title);
    html.push_str(&format!(
        "<!DOCTYPE html>
<html lang=\"en\">
<head>
    <meta charset=\"UTF-8\">
    <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">
    <title>{title} - {source}</title>
    <style>{STYLE}    </style>
</head>
<body>
    <div class=\"container\">
        <h1>{title}</h1>
        <p><strong>Database:</strong> {source}</p>
        <p><strong>Generated at:</strong> {generated_at}</p>
        <div class=\"section\">
            <h2>Overview</h2>
            <p><strong>Tables:</strong> {table_count}</p>
            <p><strong>Stored entries:</strong> {plain_count}</p>
        </div>
",
        source = escape_html(&meta.source),
        generated_at = escape_html(&meta.generated_at),
        table_count = tabular.len(),
        plain_count = plain.len(),
    ));

    if !plain.is_empty() {
        html.push_str("        <div class=\"section\">\n            <h2>Stored data</h2>\n");
        for entry in &plain {
            render_plain_entry(&mut html, entry);
        }
        html.push_str("        </div>\n");
    }

    if !tabular.is_empty() {
        html.push_str("        <div class=\"section\">\n            <h2>Tables</h2>\n");
        for entry in &tabular {
            render_table_entry(&mut html, entry, options);
        }
        html.push_str("        </div>\n");
    }

    html.push_str(SCRIPT);
    html.push_str("    </div>\n</body>\n</html>\n");
    html
}

fn render_plain_entry(html: &mut String, entry: &SnapshotEntry) {
    let pretty =
        serde_json::to_string_pretty(&entry.value).unwrap_or_else(|_| entry.value.to_string());
    html.push_str(&format!(
        "            <button class=\"collapsible\">{}</button>
            <div class=\"content\">
                <div class=\"json\">{}</div>
            </div>
",
        escape_html(&entry.name),
        escape_html(&pretty)
    ));
}

fn render_table_entry(html: &mut String, entry: &SnapshotEntry, options: &ReportOptions) {
    let rows: &[Value] = match &entry.value {
        Value::Array(rows) => rows.as_slice(),
        _ => &[],
    };

    html.push_str(&format!(
        "            <button class=\"collapsible\">{} ({} rows)</button>\n            <div class=\"content\">\n",
        escape_html(&entry.name),
        rows.len()
    ));

    if rows.is_empty() {
        html.push_str("                <p>Table is empty</p>\n            </div>\n");
        return;
    }

    let columns = column_names(rows);
    html.push_str("                <table class=\"table\">\n                    <thead>\n                        <tr>\n");
    for column in &columns {
        html.push_str(&format!(
            "                            <th>{}</th>\n",
            escape_html(column)
        ));
    }
    html.push_str("                        </tr>\n                    </thead>\n                    <tbody>\n");

    for row in rows.iter().take(options.max_rows) {
        html.push_str("                        <tr>\n");
        for column in &columns {
            let cell = row.get(column.as_str()).map(cell_text).unwrap_or_default();
            html.push_str(&format!(
                "                            <td>{}</td>\n",
                escape_html(&truncate_chars(&cell, options.max_cell_chars))
            ));
        }
        html.push_str("                        </tr>\n");
    }
    html.push_str("                    </tbody>\n                </table>\n");

    if rows.len() > options.max_rows {
        html.push_str(&format!(
            "                <p><em>Showing first {} of {} rows ({} total)</em></p>\n",
            options.max_rows,
            rows.len(),
            rows.len()
        ));
    }
    html.push_str("            </div>\n");
}

/// Ordered union of object keys across `rows`.
fn column_names(rows: &[Value]) -> Vec<String> {
    let mut columns: Vec<String> = Vec::new();
    for row in rows {
        if let Value::Object(object) = row {
            for key in object.keys() {
                if !columns.contains(key) {
                    columns.push(key.clone());
                }
            }
        }
    }
    columns
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => "NULL".to_string(),
        other => other.to_string(),
    }
}

fn truncate_chars(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_string();
    }
    let mut truncated = value.chars().take(max_chars).collect::<String>();
    truncated.push_str("...");
    truncated
}

/// Escapes text for safe inclusion in HTML element content and attributes.
pub fn escape_html(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}
