use super::types::{BookmarkRecord, DisplayRow, TagSet};
use crate::core::settings::ColorScheme;
use std::collections::{HashMap, HashSet};

/// Joins bookmarks with their tags into table rows, in reader order.
///
/// Repeated base names get a running suffix: the second "Example" becomes
/// "Example (2)", the third "Example (3)". A suffix that would clash with a
/// name already emitted keeps counting up.
pub fn build_rows(records: &[BookmarkRecord], tags: &TagSet) -> Vec<DisplayRow> {
    let mut name_counter: HashMap<&str, usize> = HashMap::new();
    let mut used: HashSet<String> = HashSet::with_capacity(records.len());

    records
        .iter()
        .map(|record| {
            let base_name = record.base_name();
            let count = name_counter.entry(base_name).or_insert(0);

            let display_name = loop {
                *count += 1;
                let candidate = if *count == 1 {
                    base_name.to_string()
                } else {
                    format!("{} ({})", base_name, count)
                };
                if !used.contains(&candidate) {
                    break candidate;
                }
            };
            used.insert(display_name.clone());

            DisplayRow {
                display_name,
                url: record.url.clone(),
                tags: tags.get(&record.url).join(","),
            }
        })
        .collect()
}

impl DisplayRow {
    /// Three-line label: name, then URL and tags in their configured colors.
    pub fn render_html(&self, colors: &ColorScheme) -> String {
        format!(
            "<html><body>\
             <span style=\"color:{};\">{}</span><br>\
             <span style=\"color:{};\">{}</span><br>\
             <span style=\"color:{};\">{}</span>\
             </body></html>",
            escape_html(&colors.name),
            escape_html(&self.display_name),
            escape_html(&colors.url),
            escape_html(&self.url),
            escape_html(&colors.tags),
            escape_html(&self.tags),
        )
    }
}

fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
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
