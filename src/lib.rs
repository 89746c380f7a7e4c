//! Remote invocation of hub-hosted simulation tools.
//!
//! The hub platform runs simulation tools as batch jobs behind a small HTTP
//! API. This crate builds a runnable driver document for a tool (via the
//! platform's `drivergen` tool), launches it, and decodes the XML run
//! results into native values: numbers, text blocks, and XY curves.
//!
//! ```no_run
//! use nanohub_remote::{config::Config, HubClient};
//! use serde_json::json;
//!
//! # async fn demo() -> anyhow::Result<()> {
//! let cfg = Config::load();
//! let client = HubClient::from_config(&cfg)?;
//! let inputs = json!({ "input.number(temperature).current": "300K" });
//! let results = nanohub_remote::run_tool(&client, "pntoy", &inputs, &[]).await?;
//! for (label, value) in &results {
//!     println!("{label}: {value:?}");
//! }
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod config;
pub mod driver;
pub mod results;
pub mod xml;

use std::collections::HashMap;

use anyhow::Result;
use serde::Serialize;

pub use api::{HubClient, LaunchRequest, ToolSession};
pub use driver::{get_driver, Driver};
pub use results::{extract_results, Curve, ResultValue};

/// Run a tool end to end: build its driver, launch it, fetch the run
/// document, and extract the requested outputs.
///
/// An empty `outputs` slice extracts every recognized output. Returns an
/// empty map when the run has not finished yet (same contract as
/// [`extract_results`]).
pub async fn run_tool<S, I>(
    session: &S,
    tool_name: &str,
    inputs: &I,
    outputs: &[&str],
) -> Result<HashMap<String, ResultValue>>
where
    S: ToolSession + ?Sized,
    I: Serialize,
{
    let driver = get_driver(session, tool_name, inputs).await?;
    let session_id = session.launch_tool(&driver.into_request()).await?;
    let run_xml = session.get_results(&session_id).await?;
    extract_results(run_xml.as_deref(), outputs)
}
