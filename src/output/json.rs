use anyhow::Result;

use crate::model::SpaceReport;

pub fn print_json(report: &SpaceReport) -> Result<()> {
    let json = serde_json::to_string_pretty(report)?;
    println!("{}", json);
    Ok(())
}
