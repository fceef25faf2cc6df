use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::errors::FramingError;

/// Length prefix size in bytes.
pub const LENGTH_PREFIX_SIZE: usize = 4;

/// Reads the next big-endian length prefix.
///
/// Returns `Ok(None)` if the stream closes cleanly before the first byte.
/// A stream that closes inside the prefix is an error.
pub async fn read_length<R>(reader: &mut R) -> Result<Option<usize>, FramingError>
where
    R: AsyncRead + Unpin,
{
    let mut prefix = [0u8; LENGTH_PREFIX_SIZE];
    let mut filled = 0;
    while filled < LENGTH_PREFIX_SIZE {
        let n = reader.read(&mut prefix[filled..]).await?;
        if n == 0 {
            if filled == 0 {
                return Ok(None);
            }
            return Err(FramingError::UnexpectedEof {
                expected: LENGTH_PREFIX_SIZE,
                received: filled,
            });
        }
        filled += n;
    }
    Ok(Some(u32::from_be_bytes(prefix) as usize))
}

/// Reads exactly `len` payload bytes.
///
/// `len` is checked against `max` before anything is allocated.
pub async fn read_payload<R>(
    reader: &mut R,
    len: usize,
    max: usize,
) -> Result<Vec<u8>, FramingError>
where
    R: AsyncRead + Unpin,
{
    if len > max {
        return Err(FramingError::TooLarge { size: len, max });
    }
    let mut payload = vec![0u8; len];
    let mut filled = 0;
    while filled < len {
        let n = reader.read(&mut payload[filled..]).await?;
        if n == 0 {
            return Err(FramingError::UnexpectedEof {
                expected: len,
                received: filled,
            });
        }
        filled += n;
    }
    Ok(payload)
}

/// Reads one whole message.
///
/// Returns `Ok(None)` on a clean close between messages.
pub async fn read_frame<R>(reader: &mut R, max: usize) -> Result<Option<Vec<u8>>, FramingError>
where
    R: AsyncRead + Unpin,
{
    match read_length(reader).await? {
        None => Ok(None),
        Some(len) => read_payload(reader, len, max).await.map(Some),
    }
}

/// Writes one message: length prefix then payload, then flushes.
pub async fn write_frame<W>(writer: &mut W, payload: &[u8]) -> Result<(), FramingError>
where
    W: AsyncWrite + Unpin,
{
    let len = u32::try_from(payload.len())
        .map_err(|_| FramingError::Unrepresentable(payload.len()))?;
    let mut buf = Vec::with_capacity(LENGTH_PREFIX_SIZE + payload.len());
    buf.extend_from_slice(&len.to_be_bytes());
    buf.extend_from_slice(payload);
    writer.write_all(&buf).await?;
    writer.flush().await?;
    Ok(())
}
