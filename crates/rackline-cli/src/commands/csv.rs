//! `rackline csv` commands.

use anyhow::{Context, Result};
use rackline_csv::{CsvImport, CsvImportForm, FormFields};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

fn load_form(form_path: &Path) -> Result<CsvImportForm> {
    let content = fs::read_to_string(form_path)
        .with_context(|| format!("Failed to read form declaration {}", form_path.display()))?;
    let fields = FormFields::from_yaml(&content)
        .with_context(|| format!("Invalid form declaration {}", form_path.display()))?;
    debug!(form = %form_path.display(), fields = fields.len(), "Loaded form declaration");
    Ok(CsvImportForm::new(fields))
}

/// Parse and validate `csv_path` against the form at `form_path`.
pub fn validate_file(form_path: &Path, csv_path: &Path) -> Result<CsvImport> {
    let form = load_form(form_path)?;
    let content =
        fs::read(csv_path).with_context(|| format!("Failed to read {}", csv_path.display()))?;
    Ok(form.clean_file(&content)?)
}

pub fn run_validate(form_path: &Path, csv_path: &Path, json: bool) -> Result<()> {
    let import = validate_file(form_path, csv_path)?;
    info!(
        file = %csv_path.display(),
        records = import.records.len(),
        "CSV file validated"
    );

    if json {
        println!("{}", serde_json::to_string_pretty(&import.records)?);
        return Ok(());
    }

    let columns: Vec<String> = import
        .headers
        .iter()
        .map(|(field, to_field)| match to_field {
            Some(to_field) => format!("{field}.{to_field}"),
            None => field.clone(),
        })
        .collect();
    println!("{}: {} record(s) OK", csv_path.display(), import.records.len());
    println!("Columns: {}", columns.join(", "));
    Ok(())
}

pub fn run_template(form_path: &Path) -> Result<()> {
    let form = load_form(form_path)?;
    print!("{}", form.initial_template());
    Ok(())
}
