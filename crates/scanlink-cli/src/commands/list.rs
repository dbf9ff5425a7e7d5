//! List command - enumerate available scanners

use anyhow::Result;
use scanlink_client::ScannerClient;

use crate::output::{OutputContext, ScannerRow};

/// List the scanners the daemon reports
pub async fn list(client: &ScannerClient, ctx: &OutputContext) -> Result<()> {
    let scanners = client.list_scanners().await?;

    if scanners.is_empty() {
        ctx.warn("No scanners found");
    }

    let rows: Vec<ScannerRow> = scanners.into_iter().map(ScannerRow::from).collect();
    ctx.print(&rows);
    Ok(())
}
