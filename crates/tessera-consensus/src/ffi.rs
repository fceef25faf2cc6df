//! C ABI over the consensus primitives.
//!
//! Inputs are NUL-terminated UTF-8 JSON strings; outputs are written into a
//! caller-owned buffer as NUL-terminated strings. Every function returns one
//! of the `TESSERA_*` codes below (`tessera_bulk_validate` additionally
//! returns 1 for valid and 0 for invalid).

use std::ffi::CStr;
use std::os::raw::c_char;
use std::panic::{catch_unwind, UnwindSafe};

use serde_json::Value;

use crate::block::block_hash_value;
use crate::errors::ConsensusError;
use crate::hashes::batch_hashes;
use crate::merkle::merkle_root;
use crate::validation::bulk_validate;

/// Success.
pub const TESSERA_OK: i32 = 0;
/// A required pointer was null.
pub const TESSERA_ERR_NULL_POINTER: i32 = -1;
/// Input was not valid UTF-8.
pub const TESSERA_ERR_INVALID_UTF8: i32 = -2;
/// Input was not the expected JSON shape.
pub const TESSERA_ERR_JSON_PARSE: i32 = -3;
/// Output buffer cannot hold the result and its terminator.
pub const TESSERA_ERR_BUFFER_TOO_SMALL: i32 = -4;
/// Any other failure.
pub const TESSERA_ERR_INTERNAL: i32 = -5;

fn guarded<F: FnOnce() -> Result<i32, i32> + UnwindSafe>(f: F) -> i32 {
    match catch_unwind(f) {
        Ok(Ok(code)) | Ok(Err(code)) => code,
        Err(_) => TESSERA_ERR_INTERNAL,
    }
}

unsafe fn read_input<'a>(ptr: *const c_char) -> Result<&'a str, i32> {
    if ptr.is_null() {
        return Err(TESSERA_ERR_NULL_POINTER);
    }
    CStr::from_ptr(ptr)
        .to_str()
        .map_err(|_| TESSERA_ERR_INVALID_UTF8)
}

fn parse_array(input: &str) -> Result<Vec<Value>, i32> {
    serde_json::from_str(input).map_err(|_| TESSERA_ERR_JSON_PARSE)
}

unsafe fn write_output(text: &str, out: *mut c_char, out_len: usize) -> Result<i32, i32> {
    if out.is_null() {
        return Err(TESSERA_ERR_NULL_POINTER);
    }
    let bytes = text.as_bytes();
    if bytes.len() >= out_len {
        return Err(TESSERA_ERR_BUFFER_TOO_SMALL);
    }
    std::ptr::copy_nonoverlapping(bytes.as_ptr(), out as *mut u8, bytes.len());
    *out.add(bytes.len()) = 0;
    Ok(TESSERA_OK)
}

fn error_code(err: &ConsensusError) -> i32 {
    match err {
        ConsensusError::InvalidHeader(_) => TESSERA_ERR_JSON_PARSE,
        ConsensusError::Serialization(_) | ConsensusError::Canonicalization(_) => {
            TESSERA_ERR_INTERNAL
        }
    }
}

/// Writes the Merkle root of a JSON array of events into `out`.
///
/// # Safety
///
/// `events_json` must be null or point to a NUL-terminated string. `out`
/// must be null or valid for writes of `out_len` bytes.
#[no_mangle]
pub unsafe extern "C" fn tessera_merkle_root(
    events_json: *const c_char,
    out: *mut c_char,
    out_len: usize,
) -> i32 {
    guarded(|| {
        let events = parse_array(read_input(events_json)?)?;
        let root = merkle_root(&events).map_err(|e| error_code(&e))?;
        write_output(root.as_str(), out, out_len)
    })
}

/// Writes the hash of a JSON block header into `out`.
///
/// # Safety
///
/// Same contract as [`tessera_merkle_root`].
#[no_mangle]
pub unsafe extern "C" fn tessera_block_hash(
    header_json: *const c_char,
    out: *mut c_char,
    out_len: usize,
) -> i32 {
    guarded(|| {
        let input = read_input(header_json)?;
        let header: Value = serde_json::from_str(input).map_err(|_| TESSERA_ERR_JSON_PARSE)?;
        let hash = block_hash_value(&header).map_err(|e| error_code(&e))?;
        write_output(hash.as_str(), out, out_len)
    })
}

/// Returns 1 if every record in a JSON array is structurally valid, 0 if not,
/// or a negative error code.
///
/// # Safety
///
/// `records_json` must be null or point to a NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn tessera_bulk_validate(records_json: *const c_char) -> i32 {
    guarded(|| {
        let records = parse_array(read_input(records_json)?)?;
        Ok(i32::from(bulk_validate(&records)))
    })
}

/// Writes a JSON array of per-item canonical hashes into `out`.
///
/// # Safety
///
/// Same contract as [`tessera_merkle_root`].
#[no_mangle]
pub unsafe extern "C" fn tessera_batch_hashes(
    items_json: *const c_char,
    out: *mut c_char,
    out_len: usize,
) -> i32 {
    guarded(|| {
        let items = parse_array(read_input(items_json)?)?;
        let hashes = batch_hashes(&items).map_err(|e| error_code(&e))?;
        let text = serde_json::to_string(&hashes).map_err(|_| TESSERA_ERR_INTERNAL)?;
        write_output(&text, out, out_len)
    })
}

/// Writes the library version into `out`.
///
/// # Safety
///
/// `out` must be null or valid for writes of `out_len` bytes.
#[no_mangle]
pub unsafe extern "C" fn tessera_version(out: *mut c_char, out_len: usize) -> i32 {
    guarded(|| write_output(env!("CARGO_PKG_VERSION"), out, out_len))
}
