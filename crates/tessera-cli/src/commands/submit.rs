//! Submit command implementation.

use tessera_codec::row_from_value;
use tessera_ingest::{Ack, IngestClient};

use crate::input::read_array;

pub async fn run(
    addr: String,
    auth_token: Option<String>,
    input: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let rows = read_array(input)?
        .into_iter()
        .enumerate()
        .map(|(i, value)| {
            row_from_value(value).ok_or_else(|| format!("Row {} is not a JSON object", i))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut client = IngestClient::connect(addr.as_str())
        .await
        .map_err(|e| format!("Failed to connect to {}: {}", addr, e))?;
    if let Some(token) = auth_token {
        client.authenticate(&token).await?;
    }

    tracing::info!(addr = %addr, rows = rows.len(), "submitting batch");
    match client.submit_rows(&rows).await? {
        Ack::Ok => {
            println!("OK");
            Ok(())
        }
        Ack::Rejected(payload) => {
            println!("{}", serde_json::to_string_pretty(&payload)?);
            Err(format!("Batch rejected: {}", payload.message).into())
        }
    }
}
