//! SyncML `<Exec>` fragment rendering.
//!
//! Produces the ready-to-send command body for one OMA-URI, without the
//! surrounding SyncML envelope. Matches the shape of Microsoft's published
//! examples: a fresh CmdID per rendering, the node's declared DFFormat
//! (defaulting to chr), and a Data element only when the schema calls
//! for one.

use uuid::Uuid;

/// Render the `<Exec>` fragment lines for one command
pub fn build_exec_payload(
    uri: &str,
    df_format: Option<&str>,
    default_value: Option<&str>,
) -> Vec<String> {
    let format = df_format.unwrap_or("chr").to_ascii_lowercase();

    let mut lines = vec![
        "<Exec>".to_string(),
        format!("  <CmdID>{}</CmdID>", Uuid::new_v4()),
        "  <Item>".to_string(),
        "    <Target>".to_string(),
        format!("      <LocURI>{}</LocURI>", uri.trim()),
        "    </Target>".to_string(),
        "    <Meta>".to_string(),
        format!("      <Format xmlns=\"syncml:metinf\">{}</Format>", format),
        "      <Type>text/plain</Type>".to_string(),
        "    </Meta>".to_string(),
    ];

    if emits_data(&format, default_value) {
        match default_value {
            // A null format always sends empty data, whatever the default
            Some(value) if format != "null" => {
                lines.push(format!("    <Data>{}</Data>", value));
            }
            _ => lines.push("    <Data></Data>".to_string()),
        }
    }

    lines.push("  </Item>".to_string());
    lines.push("</Exec>".to_string());
    lines
}

/// Data is emitted when the format is null (empty element) or the schema
/// declares a DefaultValue (sent as-is)
fn emits_data(format: &str, default_value: Option<&str>) -> bool {
    format == "null" || default_value.is_some()
}
