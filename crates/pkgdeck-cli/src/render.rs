use std::io::IsTerminal;

use anstyle::{AnsiColor, Effects, Style};
use pkgdeck_core::InstalledSet;
use pkgdeck_resolver::{Action, ReconciledEntry, Relationship};
use serde::Serialize;

use crate::flows::{ReportStatus, SearchRow};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum OutputStyle {
    Plain,
    Rich,
}

pub(crate) fn current_output_style(force_plain: bool) -> OutputStyle {
    if force_plain || std::env::var_os("NO_COLOR").is_some() || !std::io::stdout().is_terminal()
    {
        OutputStyle::Plain
    } else {
        OutputStyle::Rich
    }
}

pub(crate) fn render_status_line(
    style: OutputStyle,
    status: ReportStatus,
    message: &str,
) -> String {
    match style {
        OutputStyle::Plain => message.to_string(),
        OutputStyle::Rich => format!("{} {message}", status_badge(status)),
    }
}

fn status_badge(status: ReportStatus) -> &'static str {
    match status {
        ReportStatus::Changed => "[OK]",
        ReportStatus::Unchanged => "[INFO]",
    }
}

pub(crate) fn relationship_summary(entry: &ReconciledEntry) -> String {
    let relationship = &entry.classification.relationship;
    let state = match relationship {
        Relationship::NotInstalled => "not installed".to_string(),
        Relationship::InstalledExact => "installed".to_string(),
        Relationship::InstalledOlder(installed)
        | Relationship::InstalledNewer(installed)
        | Relationship::InstalledEqualVersionDifferentString(installed) => {
            format!("installed {}", installed.version())
        }
    };
    if entry.is_incomparable() {
        return format!("{state}, versions incomparable");
    }
    if matches!(
        relationship,
        Relationship::InstalledEqualVersionDifferentString(_)
    ) {
        return format!("{state}, already satisfied");
    }
    state
}

pub(crate) fn format_search_lines(rows: &[SearchRow], style: OutputStyle) -> Vec<String> {
    if rows.is_empty() {
        return vec!["no packages found".to_string()];
    }
    rows.iter()
        .map(|row| {
            let mut line = format!(
                "{} {} ({})",
                row.manifest.id,
                row.manifest.version,
                relationship_summary(&row.entry)
            );
            if let Some(action) = row.entry.action {
                line.push_str(&format!(" -> {}", render_action(style, action)));
            }
            if let Some(description) = &row.manifest.description {
                line.push_str(&format!("\n    {description}"));
            }
            line
        })
        .collect()
}

pub(crate) fn format_installed_lines(installed: &InstalledSet) -> Vec<String> {
    if installed.is_empty() {
        return vec!["no packages installed".to_string()];
    }
    installed
        .iter()
        .map(|identity| format!("{} {}", identity.id(), identity.version()))
        .collect()
}

fn render_action(style: OutputStyle, action: Action) -> String {
    match style {
        OutputStyle::Plain => action.label().to_string(),
        OutputStyle::Rich => colorize(action_style(action), action.label()),
    }
}

fn action_style(action: Action) -> Style {
    let color = match action {
        Action::Install => AnsiColor::BrightGreen,
        Action::Uninstall => AnsiColor::BrightRed,
        Action::Update => AnsiColor::BrightCyan,
        Action::Downgrade => AnsiColor::BrightYellow,
    };
    Style::new().fg_color(Some(color.into())).effects(Effects::BOLD)
}

fn colorize(style: Style, text: &str) -> String {
    format!("{}{}{}", style.render(), text, style.render_reset())
}

#[derive(Debug, Serialize)]
pub(crate) struct SearchRowView<'a> {
    id: &'a str,
    version: &'a str,
    description: Option<&'a str>,
    license: Option<&'a str>,
    license_url: Option<&'a str>,
    installed_version: Option<&'a str>,
    action: Option<&'static str>,
    incomparable: Option<String>,
}

impl<'a> From<&'a SearchRow> for SearchRowView<'a> {
    fn from(row: &'a SearchRow) -> Self {
        let installed_version = match &row.entry.classification.relationship {
            Relationship::NotInstalled => None,
            Relationship::InstalledExact => Some(row.manifest.version.as_str()),
            other => other.installed_version().map(|identity| identity.version()),
        };
        Self {
            id: &row.manifest.id,
            version: &row.manifest.version,
            description: row.manifest.description.as_deref(),
            license: row.manifest.license.as_deref(),
            license_url: row.manifest.license_url.as_deref(),
            installed_version,
            action: row.entry.action.map(Action::label),
            incomparable: row
                .entry
                .classification
                .incomparable
                .as_ref()
                .map(ToString::to_string),
        }
    }
}

pub(crate) fn render_search_json(rows: &[SearchRow]) -> anyhow::Result<String> {
    let views: Vec<SearchRowView<'_>> = rows.iter().map(SearchRowView::from).collect();
    Ok(serde_json::to_string_pretty(&views)?)
}
