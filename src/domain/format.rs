use serde::Deserialize;

use super::{Change, ChangeKind};

/// Placeholder for a route that has not been published.
pub const NO_ROUTE: &str = "None";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkerStyle {
    /// Coloured glyphs, for mail clients.
    #[default]
    Glyph,
    /// The change type spelled out.
    Plain,
}

impl MarkerStyle {
    pub fn marker(&self, kind: ChangeKind) -> &'static str {
        match (self, kind) {
            (MarkerStyle::Glyph, ChangeKind::New) => "🟢",
            (MarkerStyle::Glyph, ChangeKind::Deleted) => "🔴",
            (MarkerStyle::Glyph, ChangeKind::Modified) => "🔄",
            (MarkerStyle::Plain, kind) => kind.as_str(),
        }
    }
}

/// Renders one change for a notification body.
///
/// ```text
/// 🟢 01.05.2099 Alexanderplatz - Demo - PLZ: 10178, Alexanderplatz 1 - Karl-Liebknecht-Str.
/// ```
pub fn format_change(change: &Change, style: MarkerStyle) -> String {
    let marker = style.marker(change.kind());
    let (date, start_location, topic) = change.headline();

    match change {
        Change::New {
            postal_code,
            street_address,
            route_description,
            ..
        }
        | Change::Deleted {
            postal_code,
            street_address,
            route_description,
            ..
        } => {
            let mut line = format!("{marker} {date} {start_location} - {topic}");
            if let Some(plz) = non_empty(postal_code) {
                line.push_str(&format!(" - PLZ: {plz}"));
            }
            if let Some(street) = non_empty(street_address) {
                line.push_str(&format!(", {street}"));
            }
            if let Some(route) = non_empty(route_description) {
                line.push_str(&format!(" - {route}"));
            }
            line
        }
        Change::Modified {
            old_route,
            new_route,
            ..
        } => format!(
            "{marker} Changes in Route: {date} {start_location} - {topic}\n\nOld Route: {}\n\nNew Route: {}",
            old_route.as_deref().unwrap_or(NO_ROUTE),
            new_route.as_deref().unwrap_or(NO_ROUTE),
        ),
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}
