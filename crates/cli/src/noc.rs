//! `dues noc`: No Objection Certificate eligibility.

use std::sync::Arc;

use plotdues_core::timestamp::format_iso;
use plotdues_ledger::LedgerStore;
use plotdues_recon::{NocEvaluator, NocResult};

use crate::exit_codes::{EXIT_ERROR, EXIT_NOC_OUTSTANDING, EXIT_SUCCESS};
use crate::CliError;

/// Returns the exit code: success when the certificate can be issued.
pub fn cmd_noc(store: Arc<LedgerStore>, plot: String, json: bool) -> Result<u8, CliError> {
    let result = NocEvaluator::new(store).evaluate(&plot)?;

    if json {
        let out = serde_json::to_string_pretty(&result)
            .map_err(|e| CliError::new(EXIT_ERROR, format!("failed to serialize output: {e}")))?;
        println!("{out}");
    } else {
        print_certificate(&result);
    }

    Ok(if result.can_issue { EXIT_SUCCESS } else { EXIT_NOC_OUTSTANDING })
}

fn print_certificate(r: &NocResult) {
    let or_dash = |s: &str| if s.is_empty() { "-".to_string() } else { s.to_string() };

    println!("Plot:       {}", r.plot_no);
    println!("Owner:      {}", or_dash(&r.owner_name));
    println!("Address:    {}", or_dash(&r.address));
    println!("Contact:    {}", or_dash(&r.contact));
    println!("Status:     {}", or_dash(&r.dues_status));
    println!("Total dues: {:.2}", r.total_dues);
    println!("Paid:       {:.2}", r.amount_paid);
    println!("Remaining:  {:.2}", r.remaining);
    println!("PO:         {}", or_dash(&r.po_no));
    println!(
        "PO date:    {}",
        r.po_date.as_ref().map(format_iso).unwrap_or_else(|| "-".to_string())
    );
    println!();
    if r.can_issue {
        println!("NOC can be issued ({})", format_iso(&r.issued_at));
    } else {
        println!("NOC cannot be issued: {:.2} outstanding", r.remaining);
    }
}
