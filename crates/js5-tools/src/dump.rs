//! Reference table listing

use js5_store::{Cache, Channel, Result};
use serde::Serialize;

/// One entry of a reference table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntrySummary {
    /// File id
    pub id: u32,
    /// Name hash, -1 when unnamed
    pub identifier: i32,
    /// CRC-32 of the stored container
    pub crc: u32,
    /// File version
    pub version: u32,
    /// Hex Whirlpool digest, absent when the table carries none
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
    /// Member ids, for archive files
    pub members: Vec<u32>,
}

/// List the entries of `type_id`'s reference table
pub fn dump<C: Channel>(cache: &Cache<C>, type_id: u8) -> Result<Vec<EntrySummary>> {
    let table = cache.reference_table(type_id)?;
    let whirlpool = table.has_whirlpool();

    Ok(table
        .entries()
        .iter()
        .map(|(id, entry)| EntrySummary {
            id,
            identifier: entry.identifier,
            crc: entry.crc,
            version: entry.version,
            digest: whirlpool.then(|| entry.digest.to_hex()),
            members: entry.children().ids().to_vec(),
        })
        .collect())
}
