//! Builds runnable driver documents through the hub's `drivergen` tool.

use anyhow::{Context, Result};
use serde::Serialize;

use crate::{
    api::{LaunchRequest, ToolSession},
    xml,
};

/// Request document for the drivergen tool. The two placeholders receive
/// the target tool name and its JSON-serialized inputs.
pub const DRIVER_TEMPLATE: &str = r#"<?xml version="1.0"?>
<run>
    <input>
        <string id="toolname"><current>{toolname}</current></string>
        <string id="inputs"><current>{inputs}</current></string>
    </input>
</run>
"#;

const DRIVERGEN_APP: &str = "drivergen";
const XML_DECLARATION: &str = "<?xml version=\"1.0\"?>";

/// A driver document ready to execute on the hub, paired with the tool it
/// runs.
#[derive(Debug, Clone)]
pub struct Driver {
    pub app: String,
    pub xml: String,
}

impl Driver {
    pub fn into_request(self) -> LaunchRequest {
        LaunchRequest { app: self.app, xml: self.xml }
    }
}

/// Build the driver XML for running `tool_name` with the given inputs.
///
/// Runs the hub's `drivergen` tool over the session and pulls the generated
/// driver body out of its result document. Fails if the run produced no
/// result document or the `output/string/current` node is missing.
pub async fn get_driver<S, I>(session: &S, tool_name: &str, inputs: &I) -> Result<Driver>
where
    S: ToolSession + ?Sized,
    I: Serialize,
{
    let inputs_json = serde_json::to_string(inputs).context("failed to serialize tool inputs")?;
    let request = LaunchRequest {
        app: DRIVERGEN_APP.to_string(),
        xml: DRIVER_TEMPLATE
            .replacen("{toolname}", tool_name, 1)
            .replacen("{inputs}", &inputs_json, 1),
    };

    let session_id = session.launch_tool(&request).await?;
    let run_xml = session
        .get_results(&session_id)
        .await?
        .context("drivergen run produced no result document")?;

    let body = xml::first_tag_text(&run_xml, "output/string/current")?;
    Ok(Driver {
        app: tool_name.to_string(),
        xml: format!("{XML_DECLARATION}\n{body}"),
    })
}
