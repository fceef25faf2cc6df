//! Validate command implementation.

use serde_json::json;
use tessera_consensus::{bulk_validate, validate_each};

use crate::input::read_array;

pub fn run(
    input: Option<String>,
    json_output: bool,
    strict: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let records = read_array(input)?;
    let results = validate_each(&records);
    let valid = bulk_validate(&records);

    if json_output {
        let rows: Vec<_> = results
            .iter()
            .enumerate()
            .map(|(row, result)| match result {
                Ok(()) => json!({ "row": row, "valid": true }),
                Err(e) => json!({
                    "row": row,
                    "valid": false,
                    "field": e.field(),
                    "reason": e.to_string(),
                }),
            })
            .collect();
        let report = json!({ "valid": valid, "total": records.len(), "rows": rows });
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{:<8} {:<10} REASON", "ROW", "VERDICT");
        println!("{}", "-".repeat(60));
        for (row, result) in results.iter().enumerate() {
            match result {
                Ok(()) => println!("{:<8} {:<10}", row, "ok"),
                Err(e) => println!("{:<8} {:<10} {}", row, "invalid", e),
            }
        }
        let invalid = results.iter().filter(|r| r.is_err()).count();
        println!();
        println!(
            "{} records, {} invalid: batch {}",
            records.len(),
            invalid,
            if valid { "valid" } else { "invalid" }
        );
    }

    if strict && !valid {
        return Err("Validation failed".into());
    }
    Ok(())
}
