//! Clustered page dumps: a small header followed by brotli-compressed clusters
//! of JSON page records, addressed by `(cluster offset, slot)`.

use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

pub const MAGIC: &[u8; 4] = b"OWKD";
pub const FORMAT_VERSION: u32 = 1;
/// Magic plus the little-endian format version.
pub const HEADER_LEN: u64 = 8;

const MAX_CLUSTER_BYTES: usize = 64 * 1024 * 1024;
/// Upper bound on a decompressed cluster; guards against decompression bombs.
const MAX_DECOMPRESSED_BYTES: u64 = 8 * MAX_CLUSTER_BYTES as u64;
const DECOMPRESS_BUFFER: usize = 4096;

#[derive(Debug, thiserror::Error)]
pub enum DumpError {
    #[error("dump I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("not a page dump (bad magic)")]
    BadMagic,

    #[error("unsupported dump format version {0}")]
    UnsupportedVersion(u32),

    #[error("cluster at offset {0} is larger than {max} bytes", max = MAX_CLUSTER_BYTES)]
    ClusterTooLarge(u64),

    #[error("cluster at offset {offset} failed to decompress: {source}")]
    Decompress {
        offset: u64,
        source: std::io::Error,
    },

    #[error("malformed page record: {0}")]
    Record(#[from] serde_json::Error),

    #[error("slot {slot} out of range for cluster at offset {offset}")]
    SlotOutOfRange { offset: u64, slot: u64 },
}

/// One page as stored in a dump. `html` is already rendered article markup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRecord {
    pub title: String,
    pub html: String,
    #[serde(default)]
    pub redirect: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLocation {
    /// Byte offset of the cluster's length prefix.
    pub cluster: u64,
    pub slot: u64,
}

/// A validated dump on disk.
///
/// Holds only the path: every read opens its own handle, so concurrent
/// readers never share a file cursor.
#[derive(Debug, Clone)]
pub struct DumpFile {
    path: PathBuf,
}

impl DumpFile {
    pub fn open(path: &Path) -> Result<Self, DumpError> {
        let mut file = File::open(path)?;
        read_header(&mut file)?;
        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn read_page(&self, location: PageLocation) -> Result<PageRecord, DumpError> {
        if location.cluster < HEADER_LEN {
            return Err(DumpError::SlotOutOfRange {
                offset: location.cluster,
                slot: location.slot,
            });
        }

        let mut reader = BufReader::new(File::open(&self.path)?);
        reader.seek(SeekFrom::Start(location.cluster))?;
        let mut records = read_cluster(&mut reader, location.cluster)?;

        let out_of_range = || DumpError::SlotOutOfRange {
            offset: location.cluster,
            slot: location.slot,
        };
        let slot = usize::try_from(location.slot).map_err(|_| out_of_range())?;
        if slot >= records.len() {
            return Err(out_of_range());
        }

        debug!(
            dump = %self.path.display(),
            cluster = location.cluster,
            slot,
            records = records.len(),
            "page read"
        );
        Ok(records.swap_remove(slot))
    }
}

fn read_header(reader: &mut impl Read) -> Result<(), DumpError> {
    let mut header = [0u8; HEADER_LEN as usize];
    reader.read_exact(&mut header).map_err(|e| {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            DumpError::BadMagic
        } else {
            DumpError::Io(e)
        }
    })?;

    if &header[..4] != MAGIC {
        return Err(DumpError::BadMagic);
    }
    let version = u32::from_le_bytes([header[4], header[5], header[6], header[7]]);
    if version != FORMAT_VERSION {
        return Err(DumpError::UnsupportedVersion(version));
    }
    Ok(())
}

fn read_cluster(reader: &mut impl Read, offset: u64) -> Result<Vec<PageRecord>, DumpError> {
    let mut len = [0u8; 4];
    reader.read_exact(&mut len)?;
    let len = u32::from_le_bytes(len) as usize;
    if len > MAX_CLUSTER_BYTES {
        return Err(DumpError::ClusterTooLarge(offset));
    }

    let mut compressed = vec![0u8; len];
    reader.read_exact(&mut compressed)?;

    let mut json = Vec::new();
    brotli::Decompressor::new(compressed.as_slice(), DECOMPRESS_BUFFER)
        .take(MAX_DECOMPRESSED_BYTES)
        .read_to_end(&mut json)
        .map_err(|source| DumpError::Decompress { offset, source })?;

    Ok(serde_json::from_slice(&json)?)
}

/// Writes a dump with `per_cluster` records per cluster and returns each
/// record's location, in input order.
#[cfg(test)]
pub(crate) fn write_dump(
    path: &Path,
    records: &[PageRecord],
    per_cluster: usize,
) -> Result<Vec<PageLocation>, DumpError> {
    use std::io::Write;

    let mut out = Vec::new();
    out.extend_from_slice(MAGIC);
    out.extend_from_slice(&FORMAT_VERSION.to_le_bytes());

    let mut locations = Vec::with_capacity(records.len());
    for chunk in records.chunks(per_cluster.max(1)) {
        let cluster = out.len() as u64;
        let json = serde_json::to_vec(chunk)?;
        let mut compressed = Vec::new();
        {
            let mut writer =
                brotli::CompressorWriter::new(&mut compressed, DECOMPRESS_BUFFER, 5, 22);
            writer.write_all(&json)?;
        }
        out.extend_from_slice(&(compressed.len() as u32).to_le_bytes());
        out.extend_from_slice(&compressed);
        let slots = 0..chunk.len() as u64;
        locations.extend(slots.map(|slot| PageLocation { cluster, slot }));
    }

    std::fs::write(path, out)?;
    Ok(locations)
}
