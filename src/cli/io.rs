//! JSON output for the CLI
//!
//! - Output: single JSON object per invocation on stdout
//! - Logs never go to stdout
//! - UTF-8 only

use std::io::{self, Write};

use serde_json::{json, Value};

use super::errors::{CliError, CliResult};

/// Success envelope
pub fn response(data: Value) -> Value {
    json!({
        "status": "ok",
        "data": data
    })
}

/// Error envelope; `details` is present only when the error carries it
pub fn error_response(error: &CliError) -> Value {
    let mut response = json!({
        "status": "error",
        "code": error.code_str(),
        "message": error.message()
    });
    if let (Some(details), Some(object)) = (error.details(), response.as_object_mut()) {
        object.insert("details".to_string(), details.clone());
    }
    response
}

fn write_to(mut writer: impl Write, value: &Value) -> CliResult<()> {
    serde_json::to_writer(&mut writer, value)?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}

/// Write a success response to stdout
pub fn write_response(data: Value) -> CliResult<()> {
    write_to(io::stdout().lock(), &response(data))
}

/// Write an error response to stdout
pub fn write_error(error: &CliError) -> CliResult<()> {
    write_to(io::stdout().lock(), &error_response(error))
}
