//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `tally_core` linkage with an end-to-end in-memory session.
//! - Keep output deterministic by driving a manual clock.

use std::error::Error;
use tally_core::{
    core_version, format_duration, open_db_in_memory, BillingIncrement, DataServices,
    ManualClock, NewClient, TimerSession, WorkContext,
};

const DEMO_START_MS: i64 = 1_700_000_000_000;

fn main() -> Result<(), Box<dyn Error>> {
    println!("tally_core version={}", core_version());

    let clock = ManualClock::starting_at(DEMO_START_MS);
    let services = DataServices::new(WorkContext::try_with_clock(
        open_db_in_memory()?,
        clock.clone(),
    )?);

    let mut input = NewClient::named("Demo client");
    input.hourly_rate = Some(100.0);
    input.billing_increment = Some(BillingIncrement::FifteenMinutes);
    let client = services.clients().create_client_with(input, false)?;
    let (_project, mut task) = services.create_project_with_task(&client, "Website", "Layout")?;

    let mut session = TimerSession::new();
    session.select_client(Some(client.id));
    services.timer().toggle(&mut session, &mut task)?;
    clock.advance_secs(37 * 60);
    services.timer().toggle(&mut session, &mut task)?;

    let summary = services.billing().client_summary(&client)?;
    println!(
        "tracked={} billed={} amount={:.2}",
        format_duration(summary.tracked_secs),
        format_duration(summary.billed_secs),
        summary.amount
    );
    Ok(())
}
