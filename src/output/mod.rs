use anyhow::Result;
use console::style;

use crate::catalog::CatalogDocument;
use crate::cli::OutputFormat;
use crate::clip::{Clip, ClipStatus};

fn styled_status(status: ClipStatus) -> String {
    let label = format!("{:<9}", status.as_str());
    match status {
        ClipStatus::Pending => style(label).yellow().to_string(),
        ClipStatus::Generated => style(label).cyan().to_string(),
        ClipStatus::Uploaded => style(label).blue().to_string(),
        ClipStatus::Published => style(label).green().to_string(),
    }
}

/// Multi-line description of one clip
pub fn format_clip_text(clip: &Clip) -> String {
    let mut lines = vec![
        format!("Clip #{} [{}]", clip.uid, styled_status(clip.status()).trim_end()),
        format!("  Source: {}", clip.url),
        format!("  Range: {} - {}", clip.start, clip.end.as_deref().unwrap_or("end")),
    ];
    if let Some(path) = &clip.download_path {
        lines.push(format!("  Downloaded: {}", path.display()));
    }
    if let Some(path) = &clip.normalized_path {
        lines.push(format!("  Normalized: {}", path.display()));
    }
    if let Some(url) = &clip.file_url {
        lines.push(format!("  File URL: {}", url));
    }
    lines.join("\n")
}

/// One line per clip, ordered as given
pub fn format_clip_list(clips: &[&Clip]) -> String {
    if clips.is_empty() {
        return "No clips yet".to_string();
    }

    clips
        .iter()
        .map(|clip| {
            format!(
                "{}  {}  {} - {}  {}",
                clip.uid,
                styled_status(clip.status()),
                clip.start,
                clip.end.as_deref().unwrap_or("end"),
                clip.url
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Categories with their localized names
pub fn format_categories(document: &CatalogDocument) -> String {
    if document.categories.is_empty() {
        return "No categories".to_string();
    }

    document
        .categories
        .iter()
        .map(|(id, names)| {
            let names = names
                .iter()
                .map(|(locale, name)| format!("{}:{}", locale, name))
                .collect::<Vec<_>>()
                .join(" ");
            let count = document.clips.values().filter(|c| &c.category == id).count();
            format!("{}  ({} clips)  {}", id, count, names)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Print one clip to the console
pub fn print_clip(clip: &Clip, format: &OutputFormat) -> Result<()> {
    let content = match format {
        OutputFormat::Text => format_clip_text(clip),
        OutputFormat::Json => clip_json(clip)?,
    };

    println!("{}", content);
    Ok(())
}

/// Print a list of clips to the console
pub fn print_clips(clips: &[&Clip], format: &OutputFormat) -> Result<()> {
    let content = match format {
        OutputFormat::Text => format_clip_list(clips),
        OutputFormat::Json => {
            let values = clips
                .iter()
                .map(|clip| clip_value(clip))
                .collect::<Result<Vec<_>>>()?;
            serde_json::to_string_pretty(&values)?
        }
    };

    println!("{}", content);
    Ok(())
}

/// Clip record plus its derived status
fn clip_value(clip: &Clip) -> Result<serde_json::Value> {
    let mut value = serde_json::to_value(clip)?;
    value["status"] = serde_json::Value::String(clip.status().as_str().to_string());
    Ok(value)
}

fn clip_json(clip: &Clip) -> Result<String> {
    Ok(serde_json::to_string_pretty(&clip_value(clip)?)?)
}
