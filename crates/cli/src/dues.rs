//! `dues ingest|seed|list|set|delete`: ledger maintenance.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use plotdues_core::{coerce_amount, DuesRecord};
use plotdues_ledger::{LedgerStore, UpsertSummary};
use plotdues_recon::{ManualEntry, Reconciler, SeedOutcome};
use serde::Serialize;

use crate::exit_codes::{EXIT_ERROR, EXIT_NOT_FOUND};
use crate::CliError;

#[derive(Args)]
pub struct SetArgs {
    /// JSON record, or @path to read it from a file
    payload: Option<String>,

    #[arg(long)]
    plot: Option<String>,

    #[arg(long)]
    owner: Option<String>,

    /// Dues status text, e.g. "Paid" or "Partial"
    #[arg(long)]
    status: Option<String>,

    /// Total dues; commas are allowed ("12,000")
    #[arg(long)]
    total: Option<String>,

    #[arg(long)]
    paid: Option<String>,

    #[arg(long)]
    po_no: Option<String>,

    /// PO date (2024-03-15, 03/15/2024, RFC 3339); empty string clears it
    #[arg(long)]
    po_date: Option<String>,

    #[arg(long)]
    address: Option<String>,

    #[arg(long)]
    contact: Option<String>,
}

impl SetArgs {
    fn into_entry(self) -> Result<ManualEntry, CliError> {
        let mut entry = match self.payload {
            Some(payload) => parse_payload(&payload)?,
            None => ManualEntry::default(),
        };

        override_with(&mut entry.plot_no, self.plot);
        override_with(&mut entry.owner_name, self.owner);
        override_with(&mut entry.dues_status, self.status);
        override_with(&mut entry.po_no, self.po_no);
        override_with(&mut entry.po_date, self.po_date);
        override_with(&mut entry.address, self.address);
        override_with(&mut entry.contact, self.contact);
        if let Some(total) = self.total {
            entry.total_dues = Some(coerce_amount(&total));
        }
        if let Some(paid) = self.paid {
            entry.amount_paid = Some(coerce_amount(&paid));
        }
        Ok(entry)
    }
}

fn override_with(field: &mut Option<String>, flag: Option<String>) {
    if flag.is_some() {
        *field = flag;
    }
}

fn parse_payload(payload: &str) -> Result<ManualEntry, CliError> {
    let text = match payload.strip_prefix('@') {
        Some(path) => std::fs::read_to_string(path)
            .map_err(|e| CliError::usage(format!("cannot read {path}: {e}")))?,
        None => payload.to_string(),
    };
    serde_json::from_str(&text).map_err(|e| {
        CliError::usage(format!("invalid record JSON: {e}"))
            .with_hint("expected an object like {\"plotNo\": \"B-7\", \"amountPaid\": 1000}")
    })
}

fn print_json<T: Serialize>(value: &T) -> Result<(), CliError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| CliError::new(EXIT_ERROR, format!("failed to serialize output: {e}")))?;
    println!("{json}");
    Ok(())
}

fn print_summary(verb: &str, summary: &UpsertSummary) {
    println!(
        "{verb}: {} inserted, {} updated, {} records in ledger",
        summary.inserted, summary.updated, summary.total
    );
}

pub fn cmd_ingest(store: Arc<LedgerStore>, file: PathBuf, json: bool) -> Result<(), CliError> {
    let summary = Reconciler::new(store).ingest_path(&file)?;
    if json {
        print_json(&summary)
    } else {
        print_summary("Imported", &summary);
        Ok(())
    }
}

pub fn cmd_seed(store: Arc<LedgerStore>, file: PathBuf, json: bool) -> Result<(), CliError> {
    let outcome = Reconciler::new(store).seed(&file)?;
    if json {
        return print_json(&outcome);
    }
    match outcome {
        SeedOutcome::AlreadySeeded { total } => println!("Already seeded: {total} records in ledger"),
        SeedOutcome::Seeded(summary) => print_summary(&format!("Seeded from {}", file.display()), &summary),
    }
    Ok(())
}

pub fn cmd_list(store: Arc<LedgerStore>, plot: Option<String>, json: bool) -> Result<(), CliError> {
    let records = store.search(plot.as_deref().unwrap_or(""));
    if json {
        return print_json(&records);
    }
    if records.is_empty() {
        eprintln!("no records");
        return Ok(());
    }
    print_table(&records);
    Ok(())
}

fn print_table(records: &[DuesRecord]) {
    let plot_width = records
        .iter()
        .map(|r| r.plot_no.chars().count())
        .max()
        .unwrap_or(0)
        .max("PLOT".len());
    let owner_width = records
        .iter()
        .map(|r| r.owner_name.as_deref().unwrap_or("").chars().count())
        .max()
        .unwrap_or(0)
        .max("OWNER".len());

    println!(
        "{:<plot_width$}  {:<owner_width$}  {:>12}  {:>12}  {:>12}  STATUS",
        "PLOT", "OWNER", "TOTAL", "PAID", "REMAINING"
    );
    for r in records {
        println!(
            "{:<plot_width$}  {:<owner_width$}  {:>12.2}  {:>12.2}  {:>12.2}  {}",
            r.plot_no,
            r.owner_name.as_deref().unwrap_or(""),
            r.total_dues,
            r.amount_paid,
            r.remaining,
            r.dues_status.as_deref().unwrap_or(""),
        );
    }
}

pub fn cmd_set(store: Arc<LedgerStore>, args: SetArgs) -> Result<(), CliError> {
    let entry = args.into_entry()?;
    let summary = Reconciler::new(store).upsert_entry(entry)?;
    let verb = if summary.inserted > 0 { "Added" } else { "Updated" };
    println!("{verb}: {} records in ledger", summary.total);
    Ok(())
}

pub fn cmd_delete(store: Arc<LedgerStore>, plot: String) -> Result<(), CliError> {
    let recon = Reconciler::new(store);
    if !recon.delete(&plot)? {
        return Err(CliError::new(EXIT_NOT_FOUND, format!("no record found for plot '{}'", plot.trim())));
    }
    println!("Deleted: {} records in ledger", recon.store().len());
    Ok(())
}
