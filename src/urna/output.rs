// Writing the produced files, and the text view of the votes of an office.

use log::debug;
use snafu::prelude::*;
use std::fs;

use urna_tally::report::OfficeGroup;

use crate::urna::*;

const MAX_BAR_WIDTH: u64 = 40;

/// Writes a report to the given path, replacing any previous content.
pub fn write_text(path: &str, contents: &str) -> UrnaResult<()> {
    fs::write(path, contents).context(WritingReportSnafu { path })?;
    debug!("write_text: {} bytes written to {}", contents.len(), path);
    Ok(())
}

fn bar_width(votes: u64, max_votes: u64) -> usize {
    if votes == 0 || max_votes == 0 {
        return 0;
    }
    let w = votes * MAX_BAR_WIDTH / max_votes;
    w.max(1) as usize
}

/// Horizontal bar chart of the votes received by each selection of an office.
pub fn render_chart(group: &OfficeGroup) -> String {
    let mut lines: Vec<String> = vec![format!("Resultados para {}", group.office.title())];
    let labels: Vec<(String, u64)> = group
        .votes
        .iter()
        .map(|(sel, n)| {
            let name = group
                .names
                .get(sel)
                .cloned()
                .unwrap_or_else(|| sel.label().to_string());
            (name, *n)
        })
        .collect();
    let label_width = labels.iter().map(|(l, _)| l.chars().count()).max().unwrap_or(0);
    let max_votes = labels.iter().map(|(_, n)| *n).max().unwrap_or(0);
    for (label, n) in labels.iter() {
        let padding = " ".repeat(label_width - label.chars().count());
        lines.push(format!(
            "  {}{} | {} {}",
            label,
            padding,
            "#".repeat(bar_width(*n, max_votes)),
            n
        ));
    }
    lines.join("\n")
}
