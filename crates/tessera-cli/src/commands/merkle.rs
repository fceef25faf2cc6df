//! Merkle root command implementation.

use tessera_consensus::merkle_root;

use crate::input::read_array;

pub fn run(input: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let events = read_array(input)?;
    let root = merkle_root(&events)?;
    println!("{}", root);
    Ok(())
}
