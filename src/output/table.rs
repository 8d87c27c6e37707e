use anyhow::Result;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::model::{AppReport, SpaceReport};

#[derive(Tabled)]
struct Row {
    #[tabled(rename = "App")]
    name: String,
    #[tabled(rename = "State")]
    state: String,
    #[tabled(rename = "Instances")]
    instances: String,
    #[tabled(rename = "Java")]
    java: String,
    #[tabled(rename = "Spring Boot")]
    spring_boot: String,
}

pub fn print_table(report: &SpaceReport) -> Result<()> {
    println!("{}", render_table(report));
    Ok(())
}

pub fn render_table(report: &SpaceReport) -> String {
    let rows: Vec<Row> = report.app_details.iter().map(to_row).collect();
    let mut table = Table::new(rows);
    table.with(Style::sharp());
    table.to_string()
}

fn to_row(report: &AppReport) -> Row {
    Row {
        name: report.app.name.clone(),
        state: report.app.state.clone(),
        instances: report
            .processes
            .as_ref()
            .and_then(|procs| procs.iter().find_map(|p| p.instances))
            .map(|n| n.to_string())
            .unwrap_or_else(|| "-".to_string()),
        java: detected(report, |r| r.java_version.as_deref()),
        spring_boot: detected(report, |r| r.spring_boot_version.as_deref()),
    }
}

/// Distinct detected values across all scan results, in scan order.
fn detected(
    report: &AppReport,
    pick: impl Fn(&crate::model::ScanResult) -> Option<&str>,
) -> String {
    let mut values: Vec<&str> = Vec::new();
    if let Some(scan) = &report.scan {
        for result in &scan.results {
            if let Some(value) = pick(result) {
                if !values.contains(&value) {
                    values.push(value);
                }
            }
        }
    }
    if values.is_empty() {
        "-".to_string()
    } else {
        values.join(", ")
    }
}
