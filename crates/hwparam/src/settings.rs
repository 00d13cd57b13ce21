// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Binary settings file (.bin)
//!
//! # Format Overview
//!
//! ```text
//! +---------------------------------------------------------+
//! |                  File Header (24 bytes)                  |
//! |  Magic (8) | Version (4) | StructureChecksum (4)        |
//! |  PayloadSize (4) | PayloadCRC32 (4)                     |
//! +---------------------------------------------------------+
//! |                  Payload (little-endian)                 |
//! |  domain_count (4)                                        |
//! |  Domain[]                                                |
//! +---------------------------------------------------------+
//! ```
//!
//! # Domain Format
//!
//! ```text
//! +---------------------------------------------------------+
//! | name (str) | element_count (4) | element_path (str)[]   |
//! | configuration_count (4) | Configuration[]              |
//! +---------------------------------------------------------+
//! Configuration:
//! | name (str) | has_rule (1) | rule (str, if has_rule)     |
//! | (block_len (4) | block bytes (var))[element_count]      |
//! ```
//!
//! Strings are a u16 length followed by UTF-8 bytes. Blocks follow the
//! domain's element order; a zero-length block marks data not yet
//! validated. Loading checks everything against the live tree
//! before any state is replaced.

use crate::configuration::{AreaBlock, Configuration};
use crate::domain::ConfigurableDomain;
use crate::domains::ConfigurableDomains;
use crate::element::ElementTree;
use crate::rule::ApplicationRule;
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::collections::HashSet;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Cursor, Read, Write};
use std::path::Path;
use thiserror::Error;

/// Magic bytes: "HWPSET\0\0"
pub const MAGIC: [u8; 8] = [0x48, 0x57, 0x50, 0x53, 0x45, 0x54, 0x00, 0x00];

/// Current format version.
pub const FORMAT_VERSION: u32 = 1;

/// Settings file errors.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Unable to open binary settings file {path}: {source}")]
    Open { path: String, source: io::Error },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid settings format: {0}")]
    InvalidFormat(String),

    #[error("Version mismatch: expected {expected}, got {got}")]
    VersionMismatch { expected: u32, got: u32 },

    #[error("Structure checksum mismatch: expected {expected:#010x}, got {got:#010x}")]
    ChecksumMismatch { expected: u32, got: u32 },

    #[error("CRC mismatch in settings payload")]
    CrcMismatch,

    #[error("Unknown configurable element {0} in settings")]
    UnknownElement(String),

    #[error("Size mismatch for {path}: expected {expected} bytes, got {got}")]
    SizeMismatch {
        path: String,
        expected: usize,
        got: usize,
    },
}

/// File header (24 bytes, fixed).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsHeader {
    /// Magic bytes (8).
    pub magic: [u8; 8],
    /// Format version (4).
    pub version: u32,
    /// Structure checksum of the tree the settings were captured on (4).
    pub checksum: u32,
    /// Payload size in bytes (4).
    pub payload_size: u32,
    /// CRC32 of the payload (4).
    pub payload_crc: u32,
}

impl SettingsHeader {
    pub const SIZE: usize = 24;

    pub fn new(checksum: u32, payload: &[u8]) -> Self {
        Self {
            magic: MAGIC,
            version: FORMAT_VERSION,
            checksum,
            payload_size: payload.len() as u32,
            payload_crc: crc32fast::hash(payload),
        }
    }

    pub fn write<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(&self.magic)?;
        w.write_u32::<LittleEndian>(self.version)?;
        w.write_u32::<LittleEndian>(self.checksum)?;
        w.write_u32::<LittleEndian>(self.payload_size)?;
        w.write_u32::<LittleEndian>(self.payload_crc)?;
        Ok(())
    }

    pub fn read<R: Read>(r: &mut R) -> Result<Self, SettingsError> {
        let mut magic = [0u8; 8];
        r.read_exact(&mut magic)?;

        if magic != MAGIC {
            return Err(SettingsError::InvalidFormat(
                "Invalid settings file magic".into(),
            ));
        }

        Ok(Self {
            magic,
            version: r.read_u32::<LittleEndian>()?,
            checksum: r.read_u32::<LittleEndian>()?,
            payload_size: r.read_u32::<LittleEndian>()?,
            payload_crc: r.read_u32::<LittleEndian>()?,
        })
    }
}

// ============================================================================
// Encoding
// ============================================================================

/// Serialize `domains` (captured on `tree`) to a complete settings image.
pub fn encode(
    domains: &ConfigurableDomains,
    tree: &ElementTree,
    checksum: u32,
) -> Result<Vec<u8>, SettingsError> {
    let mut payload = Vec::new();
    payload.write_u32::<LittleEndian>(domains.domains().len() as u32)?;

    for domain in domains.domains() {
        write_string(&mut payload, domain.name())?;
        payload.write_u32::<LittleEndian>(domain.elements().len() as u32)?;
        for element in domain.elements() {
            write_string(&mut payload, tree.path(*element))?;
        }

        payload.write_u32::<LittleEndian>(domain.configurations().len() as u32)?;
        for configuration in domain.configurations() {
            write_string(&mut payload, configuration.name())?;
            match configuration.rule() {
                Some(rule) => {
                    payload.write_u8(1)?;
                    write_string(&mut payload, rule.as_str())?;
                }
                None => payload.write_u8(0)?,
            }
            for element in domain.elements() {
                match configuration.block(*element).filter(|b| b.is_valid()) {
                    Some(block) => {
                        payload.write_u32::<LittleEndian>(block.bytes().len() as u32)?;
                        payload.write_all(block.bytes())?;
                    }
                    None => payload.write_u32::<LittleEndian>(0)?,
                }
            }
        }
    }

    let mut out = Vec::with_capacity(SettingsHeader::SIZE + payload.len());
    SettingsHeader::new(checksum, &payload).write(&mut out)?;
    out.extend_from_slice(&payload);
    Ok(out)
}

fn write_string<W: Write>(w: &mut W, s: &str) -> Result<(), SettingsError> {
    let len = u16::try_from(s.len()).map_err(|_| {
        SettingsError::InvalidFormat(format!("String too long ({} bytes)", s.len()))
    })?;
    w.write_u16::<LittleEndian>(len)?;
    w.write_all(s.as_bytes())?;
    Ok(())
}

// ============================================================================
// Decoding
// ============================================================================

/// Rebuild the domains from a settings image, validated against `tree` and
/// the caller's structure `checksum`.
pub fn decode(
    data: &[u8],
    tree: &ElementTree,
    checksum: u32,
) -> Result<ConfigurableDomains, SettingsError> {
    let mut cursor = Cursor::new(data);
    let header = SettingsHeader::read(&mut cursor)?;

    if header.version != FORMAT_VERSION {
        return Err(SettingsError::VersionMismatch {
            expected: FORMAT_VERSION,
            got: header.version,
        });
    }
    if header.checksum != checksum {
        return Err(SettingsError::ChecksumMismatch {
            expected: checksum,
            got: header.checksum,
        });
    }

    let payload = &data[SettingsHeader::SIZE..];
    if payload.len() != header.payload_size as usize {
        return Err(SettingsError::InvalidFormat(format!(
            "Payload size {} does not match header ({})",
            payload.len(),
            header.payload_size
        )));
    }
    if crc32fast::hash(payload) != header.payload_crc {
        return Err(SettingsError::CrcMismatch);
    }

    let mut r = Cursor::new(payload);
    let domain_count = r.read_u32::<LittleEndian>()?;
    let mut domains = Vec::new();
    let mut domain_names = HashSet::new();

    for _ in 0..domain_count {
        let domain = read_domain(&mut r, tree)?;
        if !domain_names.insert(domain.name().to_string()) {
            return Err(SettingsError::InvalidFormat(format!(
                "Duplicate domain {}",
                domain.name()
            )));
        }
        domains.push(domain);
    }

    if (r.position() as usize) != payload.len() {
        return Err(SettingsError::InvalidFormat(
            "Trailing bytes after last domain".into(),
        ));
    }

    Ok(ConfigurableDomains::from_domains(domains))
}

fn read_domain(
    r: &mut Cursor<&[u8]>,
    tree: &ElementTree,
) -> Result<ConfigurableDomain, SettingsError> {
    let name = read_string(r)?;

    let element_count = r.read_u32::<LittleEndian>()?;
    let mut elements = Vec::new();
    for _ in 0..element_count {
        let path = read_string(r)?;
        let element = tree
            .find(&path)
            .ok_or(SettingsError::UnknownElement(path))?;
        let overlapping = elements.iter().any(|e| {
            *e == element || tree.is_ancestor(*e, element) || tree.is_ancestor(element, *e)
        });
        if overlapping {
            return Err(SettingsError::InvalidFormat(format!(
                "Overlapping element {} in domain {}",
                tree.path(element),
                name
            )));
        }
        elements.push(element);
    }

    let configuration_count = r.read_u32::<LittleEndian>()?;
    let mut configurations: Vec<Configuration> = Vec::new();
    for _ in 0..configuration_count {
        let configuration_name = read_string(r)?;
        if configurations.iter().any(|c| c.name() == configuration_name) {
            return Err(SettingsError::InvalidFormat(format!(
                "Duplicate configuration {} in domain {}",
                configuration_name, name
            )));
        }
        let rule = match r.read_u8()? {
            0 => None,
            1 => Some(ApplicationRule::new(read_string(r)?)),
            flag => {
                return Err(SettingsError::InvalidFormat(format!(
                    "Invalid rule flag {}",
                    flag
                )))
            }
        };

        let mut blocks = Vec::new();
        for element in &elements {
            let expected = tree.element(*element).footprint();
            let got = r.read_u32::<LittleEndian>()? as usize;
            if got == 0 && expected != 0 {
                blocks.push(AreaBlock::new(*element, Vec::new(), false));
                continue;
            }
            if got != expected {
                return Err(SettingsError::SizeMismatch {
                    path: tree.path(*element).to_string(),
                    expected,
                    got,
                });
            }
            let mut bytes = vec![0u8; got];
            r.read_exact(&mut bytes)?;
            blocks.push(AreaBlock::new(*element, bytes, true));
        }

        configurations.push(Configuration::from_parts(configuration_name, rule, blocks));
    }

    Ok(ConfigurableDomain::from_parts(name, elements, configurations))
}

fn read_string<R: Read>(r: &mut R) -> Result<String, SettingsError> {
    let len = r.read_u16::<LittleEndian>()? as usize;
    let mut buf = vec![0u8; len];
    r.read_exact(&mut buf)?;
    String::from_utf8(buf).map_err(|_| SettingsError::InvalidFormat("Invalid UTF-8 string".into()))
}

// ============================================================================
// Files
// ============================================================================

/// Write a settings file.
pub fn save<P: AsRef<Path>>(
    path: P,
    domains: &ConfigurableDomains,
    tree: &ElementTree,
    checksum: u32,
) -> Result<(), SettingsError> {
    let path = path.as_ref();
    let image = encode(domains, tree, checksum)?;
    let file = File::create(path).map_err(|source| SettingsError::Open {
        path: path.display().to_string(),
        source,
    })?;
    let mut writer = BufWriter::new(file);
    writer.write_all(&image)?;
    writer.flush()?;
    tracing::info!(
        "Settings written to {} ({} domains, {} bytes)",
        path.display(),
        domains.domains().len(),
        image.len()
    );
    Ok(())
}

/// Read a settings file.
pub fn load<P: AsRef<Path>>(
    path: P,
    tree: &ElementTree,
    checksum: u32,
) -> Result<ConfigurableDomains, SettingsError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| SettingsError::Open {
        path: path.display().to_string(),
        source,
    })?;
    let mut data = Vec::new();
    BufReader::new(file).read_to_end(&mut data)?;
    let domains = decode(&data, tree, checksum)?;
    tracing::info!(
        "Settings loaded from {} ({} domains)",
        path.display(),
        domains.domains().len()
    );
    Ok(domains)
}
