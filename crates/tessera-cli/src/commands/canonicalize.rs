//! Canonicalize command implementation.

use tessera_canonical::Canonicalizer;

use crate::input::read_json;

pub fn run(input: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let value = read_json(input)?;

    let result = Canonicalizer::new()
        .canonicalize(&value)
        .map_err(|e| format!("Canonicalization failed: {}", e))?;

    for warning in &result.report.warnings {
        eprintln!("warning: {}", warning.code());
    }
    println!("{}", String::from_utf8_lossy(&result.bytes));
    Ok(())
}
