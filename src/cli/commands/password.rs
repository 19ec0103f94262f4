use serde_json::json;

use crate::auth::hash_password;
use crate::cli::OutputFormat;

pub fn handle(password: &str, output_format: OutputFormat) -> anyhow::Result<()> {
    let hash = hash_password(password)?;
    match output_format {
        OutputFormat::Json => println!("{}", json!({ "hash": hash })),
        OutputFormat::Text => println!("{}", hash),
    }
    Ok(())
}
