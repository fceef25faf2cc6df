//! Batch hashes command implementation.

use tessera_consensus::batch_hashes;

use crate::input::read_array;

pub fn run(input: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let items = read_array(input)?;
    for hash in batch_hashes(&items)? {
        println!("{}", hash);
    }
    Ok(())
}
