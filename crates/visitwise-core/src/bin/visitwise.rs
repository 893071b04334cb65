//! VisitWise CLI
//!
//! Billing reports over an exported practice data file (the JSON shape of
//! `PracticeData`).
//!
//! Usage:
//!   visitwise allocate --data <file> --patient <id>
//!   visitwise earnings --data <file> [--month <YYYY-MM>]
//!   visitwise summary --data <file>
//!   visitwise visits --data <file> --patient <id> --month <YYYY-MM>
//!   visitwise remind --data <file> --patient <id>

use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use std::result::Result;
use visitwise_core::contact::{dialer_link, maps_link, payment_reminder_link};
use visitwise_core::visit_log::{visited_days, visits_in_month};
use visitwise_core::*;

#[derive(Parser)]
#[command(name = "visitwise")]
#[command(author = "VisitWise")]
#[command(version = "0.1.0")]
#[command(about = "Visit log and per-visit billing reports", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Practice config file (JSON); defaults apply when absent
    #[arg(short, long, global = true, default_value = "visitwise.json")]
    config: PathBuf,

    /// Output format: json, compact, csv, or table
    #[arg(short, long, global = true, default_value = "json")]
    format: String,

    /// Output file (stdout if not specified)
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Paid/unpaid status of every completed visit for one patient
    Allocate {
        /// Practice data file
        #[arg(short, long)]
        data: PathBuf,

        /// Patient id
        #[arg(short, long)]
        patient: String,
    },

    /// Practice earnings, collections and outstanding
    Earnings {
        /// Practice data file
        #[arg(short, long)]
        data: PathBuf,

        /// Calendar month (YYYY-MM); all-time when omitted
        #[arg(short, long)]
        month: Option<String>,
    },

    /// All-time summary per patient, largest outstanding first
    Summary {
        /// Practice data file
        #[arg(short, long)]
        data: PathBuf,

        /// Include archived patients
        #[arg(long)]
        include_archived: bool,
    },

    /// One patient's visit calendar for a month
    Visits {
        /// Practice data file
        #[arg(short, long)]
        data: PathBuf,

        /// Patient id
        #[arg(short, long)]
        patient: String,

        /// Calendar month (YYYY-MM)
        #[arg(short, long)]
        month: String,
    },

    /// Payment reminder and contact links for one patient
    Remind {
        /// Practice data file
        #[arg(short, long)]
        data: PathBuf,

        /// Patient id
        #[arg(short, long)]
        patient: String,
    },
}

#[derive(serde::Serialize)]
struct VisitStatusRow {
    visit_id: String,
    date: String,
    charge: Amount,
    status: PaymentStatus,
}

#[derive(serde::Serialize)]
struct AllocationReport {
    patient_id: String,
    patient_name: String,
    visits: Vec<VisitStatusRow>,
    paid_count: usize,
    unpaid_count: usize,
    unpaid_amount: Amount,
    remaining_credit: Amount,
}

#[derive(serde::Serialize)]
struct EarningsReport {
    window: EarningsWindow,
    currency: String,
    #[serde(flatten)]
    totals: EarningsTotals,
    credit: Amount,
}

#[derive(serde::Serialize)]
struct CalendarReport {
    patient_id: String,
    month: YearMonth,
    visited_days: Vec<u32>,
    visit_count: usize,
    earned: Amount,
}

#[derive(serde::Serialize)]
struct ReminderReport {
    patient_id: String,
    outstanding: Amount,
    #[serde(skip_serializing_if = "Option::is_none")]
    reminder_link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    dialer_link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    maps_link: Option<String>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let config = PracticeConfig::load(&cli.config)?;

    let result: serde_json::Value = match cli.command {
        Commands::Allocate { data, patient } => {
            let data = load_data(&data)?;
            serde_json::to_value(allocation_report(&data, &patient)?)?
        }
        Commands::Earnings { data, month } => {
            let data = load_data(&data)?;
            let window = match month {
                Some(month) => EarningsWindow::Month(month.parse()?),
                None => EarningsWindow::AllTime,
            };
            let totals = practice_totals(&data.ledgers(), window);
            serde_json::to_value(EarningsReport {
                window,
                currency: config.currency_symbol.clone(),
                totals,
                credit: totals.credit(),
            })?
        }
        Commands::Summary { data, include_archived } => {
            let data = load_data(&data)?;
            let ledgers: Vec<PatientLedger<'_>> = data
                .ledgers()
                .into_iter()
                .filter(|ledger| include_archived || ledger.patient.is_active)
                .collect();
            serde_json::to_value(practice_summary(&ledgers))?
        }
        Commands::Visits { data, patient, month } => {
            let data = load_data(&data)?;
            let month: YearMonth = month.parse()?;
            let record = data
                .patient(&patient)
                .ok_or_else(|| VisitwiseError::not_found("Patient", &patient))?;
            let in_month = visits_in_month(&data.visits, &patient, month);
            let earned = completed_charges(&in_month, record.charge_per_visit);
            serde_json::to_value(CalendarReport {
                patient_id: patient.clone(),
                month,
                visited_days: visited_days(&data.visits, &patient, month).into_iter().collect(),
                visit_count: in_month.len(),
                earned,
            })?
        }
        Commands::Remind { data, patient } => {
            let data = load_data(&data)?;
            let ledger = data
                .ledger(&patient)
                .ok_or_else(|| VisitwiseError::not_found("Patient", &patient))?;
            let outstanding = ledger.totals(EarningsWindow::AllTime).outstanding;
            let record = ledger.patient;
            serde_json::to_value(ReminderReport {
                patient_id: patient.clone(),
                outstanding,
                reminder_link: payment_reminder_link(record, outstanding, &config),
                dialer_link: record.phone.as_deref().and_then(dialer_link),
                maps_link: maps_link(record),
            })?
        }
    };

    // Output result
    let output_str = match cli.format.as_str() {
        "json" => serde_json::to_string_pretty(&result)?,
        "compact" => serde_json::to_string(&result)?,
        "csv" => result_to_csv(&result)?,
        "table" => result_to_table(&result)?,
        other => return Err(format!("Unknown output format: {}", other).into()),
    };

    if let Some(output_path) = cli.output {
        fs::write(&output_path, &output_str)?;
        eprintln!("Output written to: {}", output_path.display());
    } else {
        println!("{}", output_str);
    }

    Ok(())
}

fn completed_charges(visits: &[&Visit], default_charge: Amount) -> Amount {
    visits
        .iter()
        .filter(|v| v.completed)
        .map(|v| v.effective_charge(default_charge))
        .fold(0, Amount::saturating_add)
}

fn load_data(path: &Path) -> Result<PracticeData, Box<dyn std::error::Error>> {
    let content = fs::read_to_string(path)?;
    let data = PracticeData::from_json(&content)?;
    log::info!(
        "Loaded {} patients, {} visits, {} payments from {}",
        data.patients.len(),
        data.visits.len(),
        data.payments.len(),
        path.display()
    );
    Ok(data)
}

fn allocation_report(data: &PracticeData, patient_id: &str) -> Result<AllocationReport, Box<dyn std::error::Error>> {
    let ledger = data
        .ledger(patient_id)
        .ok_or_else(|| VisitwiseError::not_found("Patient", patient_id))?;
    let default_charge = ledger.patient.charge_per_visit;
    let allocation = allocate_payments(
        ledger.visits.iter().copied(),
        ledger.payments.iter().copied(),
        default_charge,
    );

    let mut completed: Vec<&Visit> = ledger.visits.iter().copied().filter(|v| v.completed).collect();
    completed.sort_by_key(|v| v.date);
    let visits = completed
        .into_iter()
        .filter_map(|v| {
            allocation.status_of(&v.id).map(|status| VisitStatusRow {
                visit_id: v.id.clone(),
                date: calendar::format_date(v.date),
                charge: v.effective_charge(default_charge),
                status,
            })
        })
        .collect();

    Ok(AllocationReport {
        patient_id: ledger.patient.id.clone(),
        patient_name: ledger.patient.name.clone(),
        visits,
        paid_count: allocation.paid_count,
        unpaid_count: allocation.unpaid_count,
        unpaid_amount: allocation.unpaid_amount,
        remaining_credit: allocation.remaining_credit,
    })
}

fn cell(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Array of objects, or the array nested under an object's `visits` key
fn rows_of(value: &serde_json::Value) -> Option<&Vec<serde_json::Value>> {
    value
        .as_array()
        .or_else(|| value.get("visits").and_then(|v| v.as_array()))
        .filter(|rows| rows.first().map(|r| r.is_object()).unwrap_or(false))
}

/// Quote a CSV field holding a delimiter, quote or line break
fn escape_csv(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn result_to_csv(value: &serde_json::Value) -> Result<String, Box<dyn std::error::Error>> {
    let mut output = String::new();

    if let Some(rows) = rows_of(value) {
        let headers: Vec<&str> = rows[0]
            .as_object()
            .map(|obj| obj.keys().map(|s| s.as_str()).collect())
            .unwrap_or_default();
        let header_line: Vec<String> = headers.iter().map(|h| escape_csv(h)).collect();
        output.push_str(&header_line.join(","));
        output.push('\n');

        for row in rows {
            let line: Vec<String> = headers
                .iter()
                .map(|h| escape_csv(&row.get(*h).map(cell).unwrap_or_default()))
                .collect();
            output.push_str(&line.join(","));
            output.push('\n');
        }
    } else {
        output = serde_json::to_string(value)?;
    }

    Ok(output)
}

fn result_to_table(value: &serde_json::Value) -> Result<String, Box<dyn std::error::Error>> {
    let Some(rows) = rows_of(value) else {
        // Single record: key/value lines
        let Some(obj) = value.as_object() else {
            return Ok(serde_json::to_string_pretty(value)?);
        };
        let width = obj.keys().map(|k| k.len()).max().unwrap_or(0);
        let lines: Vec<String> = obj
            .iter()
            .map(|(k, v)| format!("{:<width$}  {}", k, cell(v), width = width))
            .collect();
        return Ok(lines.join("\n"));
    };

    let headers: Vec<String> = rows[0]
        .as_object()
        .map(|obj| obj.keys().cloned().collect())
        .unwrap_or_default();
    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|row| headers.iter().map(|h| row.get(h).map(cell).unwrap_or_default()).collect())
        .collect();
    let widths: Vec<usize> = headers
        .iter()
        .enumerate()
        .map(|(i, h)| cells.iter().map(|r| r[i].chars().count()).max().unwrap_or(0).max(h.len()))
        .collect();

    let format_row = |row: &[String]| -> String {
        row.iter()
            .zip(&widths)
            .map(|(c, w)| format!("{:<w$}", c, w = *w))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut output = format_row(&headers);
    output.push('\n');
    output.push_str(&widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>().join("  "));
    for row in &cells {
        output.push('\n');
        output.push_str(&format_row(row));
    }
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn jan(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    /// Split one CSV line, honouring quoted fields
    fn split_csv_line(line: &str) -> Vec<String> {
        let mut fields = vec![String::new()];
        let mut quoted = false;
        let mut chars = line.chars().peekable();
        while let Some(c) = chars.next() {
            match c {
                '"' if quoted && chars.peek() == Some(&'"') => {
                    chars.next();
                    fields.last_mut().unwrap().push('"');
                }
                '"' => quoted = !quoted,
                ',' if !quoted => fields.push(String::new()),
                other => fields.last_mut().unwrap().push(other),
            }
        }
        fields
    }

    #[test]
    fn test_completed_charges_saturate() {
        let big = Visit::completed("v1", "p1", jan(2), Amount::MAX);
        let fallback = Visit::completed("v2", "p1", jan(3), 0);
        let planned = Visit::scheduled("v3", "p1", jan(4), 900);

        assert_eq!(completed_charges(&[&fallback, &planned], 250), 250);
        assert_eq!(completed_charges(&[&big, &fallback, &planned], 250), Amount::MAX);
    }

    #[test]
    fn test_escape_csv() {
        assert_eq!(escape_csv("Asha"), "Asha");
        assert_eq!(escape_csv("Rao, Asha"), r#""Rao, Asha""#);
        assert_eq!(escape_csv(r#"say "hi""#), r##""say ""hi"""##);
        assert_eq!(escape_csv("two\nlines"), "\"two\nlines\"");
    }

    #[test]
    fn test_summary_csv_keeps_columns_with_comma_in_name() {
        let patient = Patient::new("p1", "Rao, Asha", 500);
        let visits = vec![Visit::completed("v1", "p1", jan(2), 500)];
        let payments: Vec<Payment> = Vec::new();
        let ledgers = vec![PatientLedger::new(&patient, &visits, &payments)];
        let value = serde_json::to_value(practice_summary(&ledgers)).unwrap();

        let csv = result_to_csv(&value).unwrap();
        let mut lines = csv.lines();
        let header = split_csv_line(lines.next().unwrap());
        let row = split_csv_line(lines.next().unwrap());
        assert_eq!(row.len(), header.len());

        let name_col = header.iter().position(|h| h == "patient_name").unwrap();
        assert_eq!(row[name_col], "Rao, Asha");
    }
}
