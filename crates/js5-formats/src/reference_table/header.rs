//! Format-dependent reference table header
//!
//! The first byte of a table is its format. Formats 6 and later follow it
//! with a 32-bit table version; earlier formats have none.

use binrw::{BinRead, BinResult, BinWrite};
use std::io::{Read, Seek, Write};

/// First format that carries a table version
pub const VERSIONED_FORMAT: u8 = 6;

/// Version-aware reference table header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableHeader {
    /// Format below 6, no version field
    Unversioned {
        /// Format byte
        format: u8,
    },
    /// Format 6 or above
    Versioned {
        /// Format byte
        format: u8,
        /// Table version
        version: u32,
    },
}

impl Default for TableHeader {
    fn default() -> Self {
        Self::Versioned {
            format: VERSIONED_FORMAT,
            version: 0,
        }
    }
}

impl TableHeader {
    /// Create the header variant `format` calls for. `version` is discarded
    /// for unversioned formats.
    pub const fn new(format: u8, version: u32) -> Self {
        if format >= VERSIONED_FORMAT {
            Self::Versioned { format, version }
        } else {
            Self::Unversioned { format }
        }
    }

    /// Get the format byte
    pub const fn format(&self) -> u8 {
        match self {
            Self::Unversioned { format } | Self::Versioned { format, .. } => *format,
        }
    }

    /// Get the table version; unversioned headers report 0
    pub const fn version(&self) -> u32 {
        match self {
            Self::Unversioned { .. } => 0,
            Self::Versioned { version, .. } => *version,
        }
    }

    /// Set the table version. Unversioned headers have nowhere to store it
    /// and ignore the call.
    pub fn set_version(&mut self, new_version: u32) {
        if let Self::Versioned { version, .. } = self {
            *version = new_version;
        }
    }

    /// Whether a version field is present
    pub const fn is_versioned(&self) -> bool {
        matches!(self, Self::Versioned { .. })
    }

    /// Encoded header size
    pub const fn size(&self) -> usize {
        match self {
            Self::Unversioned { .. } => 1,
            Self::Versioned { .. } => 5,
        }
    }
}

impl BinRead for TableHeader {
    type Args<'a> = ();

    fn read_options<R: Read + Seek>(
        reader: &mut R,
        endian: binrw::Endian,
        _args: Self::Args<'_>,
    ) -> BinResult<Self> {
        let format = u8::read_options(reader, endian, ())?;
        if format >= VERSIONED_FORMAT {
            let version = u32::read_options(reader, binrw::Endian::Big, ())?;
            Ok(Self::Versioned { format, version })
        } else {
            Ok(Self::Unversioned { format })
        }
    }
}

impl BinWrite for TableHeader {
    type Args<'a> = ();

    fn write_options<W: Write + Seek>(
        &self,
        writer: &mut W,
        _endian: binrw::Endian,
        _args: Self::Args<'_>,
    ) -> BinResult<()> {
        match self {
            Self::Unversioned { format } => {
                writer.write_all(&[*format])?;
            }
            Self::Versioned { format, version } => {
                writer.write_all(&[*format])?;
                writer.write_all(&version.to_be_bytes())?;
            }
        }
        Ok(())
    }
}
