//! HTTP cache envelope stripping
//!
//! Cached responses are wrapped in a fixed envelope. Little-endian, no padding.
//!
//! # Layout
//! ```text
//! 0x00: magic "RBXH"
//! 0x04: version          u32
//! 0x08: url_len          u32
//! 0x0C: url              (url_len bytes + NUL)
//! var:  status           u32
//! var:  headers_size     u32
//! var:  headers          (headers_size bytes)
//! var:  headers_hash     u32
//! var:  body_size        u32
//! var:  body_hash        u32
//! var:  reserved         u32
//! var:  payload
//! ```
//!
//! Files without the magic are copied verbatim. Non-2xx responses are dropped.

use anyhow::{Context, Result, bail};
use std::fs::{File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::Path;

/// Envelope magic bytes
pub const ENVELOPE_MAGIC: &[u8; 4] = b"RBXH";

/// Hash, body size, hash and reserved fields after the response headers
const TRAILING_FIELDS_SIZE: u64 = 16;

/// Longest URL accepted before the envelope is treated as corrupt
const MAX_URL_LEN: u32 = 64 * 1024;

/// Parsed envelope fields. The reader is left at the start of the payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvelopeHeader {
    pub version: u32,
    pub url: String,
    pub status: u32,
    pub headers_size: u32,
}

impl EnvelopeHeader {
    /// Whether the cached response carries a usable body (status 200..=299).
    pub fn is_success(&self) -> bool {
        (200..=299).contains(&self.status)
    }
}

/// What [`strip_file`] did with one cache entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StripOutcome {
    /// No envelope, file copied as-is
    Copied { bytes: u64 },
    /// Envelope removed, payload written
    Stripped { status: u32, url: String, bytes: u64 },
    /// Response was not a success; nothing written
    SkippedStatus(u32),
}

impl StripOutcome {
    pub fn wrote_output(&self) -> bool {
        !matches!(self, StripOutcome::SkippedStatus(_))
    }
}

/// Read the envelope if the stream starts with one.
///
/// Returns `Ok(None)` when the magic is missing; up to 4 bytes are consumed
/// in that case.
pub fn read_envelope<R: Read>(r: &mut R) -> Result<Option<EnvelopeHeader>> {
    let mut magic = Vec::with_capacity(ENVELOPE_MAGIC.len());
    r.by_ref()
        .take(ENVELOPE_MAGIC.len() as u64)
        .read_to_end(&mut magic)?;
    if magic != ENVELOPE_MAGIC {
        return Ok(None);
    }

    let version = read_u32(r).context("Truncated envelope version")?;
    let url_len = read_u32(r).context("Truncated envelope URL length")?;
    if url_len > MAX_URL_LEN {
        bail!("Envelope URL length {} exceeds {}", url_len, MAX_URL_LEN);
    }

    // URL is NUL-terminated
    let mut url = vec![0u8; url_len as usize + 1];
    r.read_exact(&mut url).context("Truncated envelope URL")?;
    url.pop();
    let url = String::from_utf8_lossy(&url).into_owned();

    let status = read_u32(r).context("Truncated envelope status")?;
    let headers_size = read_u32(r).context("Truncated envelope header size")?;

    let skip = headers_size as u64 + TRAILING_FIELDS_SIZE;
    let skipped = io::copy(&mut r.by_ref().take(skip), &mut io::sink())?;
    if skipped < skip {
        bail!(
            "Truncated envelope headers: expected {} bytes, found {}",
            skip,
            skipped
        );
    }

    Ok(Some(EnvelopeHeader {
        version,
        url,
        status,
        headers_size,
    }))
}

/// Strip the envelope from `input` and write the payload to `output`.
///
/// `output` must not exist. It is only created when something is written,
/// and removed again if writing fails.
pub fn strip_file(input: &Path, output: &Path) -> Result<StripOutcome> {
    let file =
        File::open(input).with_context(|| format!("Failed to open cache entry: {:?}", input))?;
    let mut reader = BufReader::new(file);

    let envelope = read_envelope(&mut reader)
        .with_context(|| format!("Failed to read envelope: {:?}", input))?;

    match envelope {
        None => {
            reader.seek(SeekFrom::Start(0))?;
            let bytes = write_new(&mut reader, output)?;
            tracing::debug!("Copied {:?} ({} bytes, no envelope)", input, bytes);
            Ok(StripOutcome::Copied { bytes })
        }
        Some(header) if !header.is_success() => {
            tracing::debug!("Skipping {:?}: status {}", input, header.status);
            Ok(StripOutcome::SkippedStatus(header.status))
        }
        Some(header) => {
            let bytes = write_new(&mut reader, output)?;
            tracing::info!("{}", input.display());
            tracing::debug!("  {} -> {:?} ({} bytes)", header.url, output, bytes);
            Ok(StripOutcome::Stripped {
                status: header.status,
                url: header.url,
                bytes,
            })
        }
    }
}

/// Copy the rest of `reader` into a freshly created `output`.
fn write_new<R: Read>(reader: &mut R, output: &Path) -> Result<u64> {
    let file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(output)
        .with_context(|| format!("Failed to create output: {:?}", output))?;
    let mut writer = BufWriter::new(file);

    let result = io::copy(reader, &mut writer).and_then(|n| writer.flush().map(|_| n));
    match result {
        Ok(n) => Ok(n),
        Err(e) => {
            drop(writer);
            let _ = std::fs::remove_file(output);
            Err(e).with_context(|| format!("Failed to write {:?}", output))
        }
    }
}

fn read_u32<R: Read>(r: &mut R) -> io::Result<u32> {
    let mut bytes = [0u8; 4];
    r.read_exact(&mut bytes)?;
    Ok(u32::from_le_bytes(bytes))
}

/// Build an envelope around `payload` (test and tooling helper).
pub fn wrap_payload(url: &str, status: u32, headers: &[u8], payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(payload.len() + url.len() + headers.len() + 40);
    out.extend_from_slice(ENVELOPE_MAGIC);
    out.extend_from_slice(&1u32.to_le_bytes());
    out.extend_from_slice(&(url.len() as u32).to_le_bytes());
    out.extend_from_slice(url.as_bytes());
    out.push(0);
    out.extend_from_slice(&status.to_le_bytes());
    out.extend_from_slice(&(headers.len() as u32).to_le_bytes());
    out.extend_from_slice(headers);
    out.extend_from_slice(&[0u8; TRAILING_FIELDS_SIZE as usize]);
    out.extend_from_slice(payload);
    out
}
