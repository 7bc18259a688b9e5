//! The `paperguess slider` command.

use anyhow::Result;
use comfy_table::Table;

use paperguess_core::scoring::{citations_from_slider, slider_from_citations, SLIDER_MAX};

const TABLE_STEP: usize = 10;

pub fn execute(position: Option<i64>, citations: Option<u32>) -> Result<()> {
    match (position, citations) {
        (Some(pos), _) => {
            let pos = u32::try_from(pos)
                .ok()
                .filter(|p| *p <= SLIDER_MAX)
                .ok_or_else(|| anyhow::anyhow!("slider position {pos} is outside 0-{SLIDER_MAX}"))?;
            println!("{}", citations_from_slider(pos));
        }
        (None, Some(c)) => {
            let pos = slider_from_citations(c);
            println!("{pos} (shows {} citations)", citations_from_slider(pos));
        }
        (None, None) => {
            let mut table = Table::new();
            table.set_header(vec!["Position", "Citations"]);
            for pos in (0..=SLIDER_MAX).step_by(TABLE_STEP) {
                table.add_row(vec![pos.to_string(), citations_from_slider(pos).to_string()]);
            }
            println!("{table}");
        }
    }
    Ok(())
}
