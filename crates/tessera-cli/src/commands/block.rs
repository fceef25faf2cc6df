//! Block hash command implementation.

use tessera_consensus::block_hash_value;

use crate::input::read_json;

pub fn run(input: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let header = read_json(input)?;
    let hash = block_hash_value(&header)?;
    println!("{}", hash);
    Ok(())
}
