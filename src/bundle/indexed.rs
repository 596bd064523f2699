//! The indexed binary container.
//!
//! Layout, all integers little-endian:
//!
//! ```text
//! u32        magic (0xFB0BD1E5)
//! u32        module count N
//! u32        startup code length, terminator included
//! N records: u8   record length, this byte included
//!            [u8] module identifier
//!            u32  code offset in the code blob
//!            u32  code length, terminator included
//! code blob: startup code, then each module's code, all null-terminated
//! ```
//!
//! A runtime reads the table and loads a single module by offset without
//! scanning the rest of the file. Every stored length counts the trailing
//! null, so a reader takes `length - 1` bytes of text.

use std::sync::Arc;

use crate::bundle::compiled;
use crate::core::error::{BundleError, BundleResult};
use crate::core::module::Module;

pub const MAGIC: u32 = 0xFB0B_D1E5;

const U32_LEN: usize = 4;
const HEADER_LEN: usize = 3 * U32_LEN;
const RECORD_OVERHEAD: usize = 1 + 2 * U32_LEN;

/// Longest module identifier a record can hold.
pub const MAX_ID_LEN: usize = u8::MAX as usize - RECORD_OVERHEAD;

/// Serialize the startup code and the modules into an indexed container.
///
/// Every module must already be compiled.
pub fn encode(startup_code: &str, modules: &[Arc<Module>]) -> BundleResult<Vec<u8>> {
    let mut startup = Vec::with_capacity(startup_code.len() + 1);
    startup.extend_from_slice(startup_code.as_bytes());
    startup.push(0);

    let mut table = Vec::new();
    let mut blobs: Vec<&[u8]> = Vec::with_capacity(modules.len());
    let mut offset = startup.len();

    for module in modules {
        let (id, _) = compiled(module)?;
        if id.len() > MAX_ID_LEN {
            return Err(BundleError::MalformedBundle(format!(
                "module identifier `{}` is {} bytes long, records hold at most {}",
                id,
                id.len(),
                MAX_ID_LEN
            )));
        }
        let code = module.encode()?;

        table.push((id.len() + RECORD_OVERHEAD) as u8);
        table.extend_from_slice(id.as_bytes());
        table.extend_from_slice(&to_u32(offset)?.to_le_bytes());
        table.extend_from_slice(&to_u32(code.len())?.to_le_bytes());

        offset += code.len();
        blobs.push(code);
    }

    let mut out = Vec::with_capacity(HEADER_LEN + table.len() + offset);
    out.extend_from_slice(&MAGIC.to_le_bytes());
    out.extend_from_slice(&to_u32(modules.len())?.to_le_bytes());
    // inclusive of the null, like the per-module lengths
    out.extend_from_slice(&to_u32(startup.len())?.to_le_bytes());
    out.extend_from_slice(&table);
    out.extend_from_slice(&startup);
    for code in blobs {
        out.extend_from_slice(code);
    }

    tracing::debug!(
        "encoded {} modules, {} bytes of code",
        modules.len(),
        offset
    );
    Ok(out)
}

fn to_u32(value: usize) -> BundleResult<u32> {
    u32::try_from(value).map_err(|_| {
        BundleError::MalformedBundle(format!("{} does not fit in 32 bits", value))
    })
}

/// One record of the module table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    pub id: String,
    /// Offset in the code blob.
    pub offset: u32,
    /// Code length, terminator included.
    pub length: u32,
}

/// A decoded indexed container.
#[derive(Debug, Clone)]
pub struct IndexedBundle {
    entries: Vec<IndexEntry>,
    startup_len: usize,
    blob: Vec<u8>,
}

impl IndexedBundle {
    /// Decode a container, validating the table against the code blob.
    pub fn parse(bytes: &[u8]) -> BundleResult<Self> {
        let mut reader = Reader { bytes, pos: 0 };

        let magic = reader.u32()?;
        if magic != MAGIC {
            return Err(malformed(format!("bad magic number {:#010x}", magic)));
        }
        let count = reader.u32()? as usize;
        let startup_len = reader.u32()? as usize;

        let mut entries = Vec::with_capacity(count);
        for _ in 0..count {
            let record_len = reader.u8()? as usize;
            if record_len < RECORD_OVERHEAD {
                return Err(malformed(format!("record length {} is too short", record_len)));
            }
            let id = reader.take(record_len - RECORD_OVERHEAD)?;
            let id = String::from_utf8(id.to_vec())
                .map_err(|_| malformed("module identifier is not UTF-8".to_string()))?;
            let offset = reader.u32()?;
            let length = reader.u32()?;
            entries.push(IndexEntry { id, offset, length });
        }

        let blob = reader.rest().to_vec();
        if startup_len == 0 || startup_len > blob.len() {
            return Err(malformed("startup code exceeds the code blob".to_string()));
        }
        for entry in &entries {
            let end = entry.offset as usize + entry.length as usize;
            if end > blob.len() {
                return Err(malformed(format!(
                    "code of `{}` exceeds the code blob",
                    entry.id
                )));
            }
        }

        Ok(IndexedBundle {
            entries,
            startup_len,
            blob,
        })
    }

    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    /// Size of the code blob, startup code included.
    pub fn code_blob_len(&self) -> usize {
        self.blob.len()
    }

    /// Startup code, without its terminator.
    pub fn startup_code(&self) -> &[u8] {
        strip_terminator(&self.blob[..self.startup_len])
    }

    /// Code of a module, without its terminator.
    pub fn module_code(&self, id: &str) -> Option<&[u8]> {
        let entry = self.entries.iter().find(|e| e.id == id)?;
        let start = entry.offset as usize;
        Some(strip_terminator(&self.blob[start..start + entry.length as usize]))
    }
}

fn strip_terminator(bytes: &[u8]) -> &[u8] {
    bytes.strip_suffix(&[0]).unwrap_or(bytes)
}

fn malformed(message: String) -> BundleError {
    BundleError::MalformedBundle(message)
}

struct Reader<'b> {
    bytes: &'b [u8],
    pos: usize,
}

impl<'b> Reader<'b> {
    fn take(&mut self, len: usize) -> BundleResult<&'b [u8]> {
        let end = self.pos + len;
        let slice = self
            .bytes
            .get(self.pos..end)
            .ok_or_else(|| malformed(format!("unexpected end of data at byte {}", self.pos)))?;
        self.pos = end;
        Ok(slice)
    }

    fn u8(&mut self) -> BundleResult<u8> {
        Ok(self.take(1)?[0])
    }

    fn u32(&mut self) -> BundleResult<u32> {
        let bytes = self.take(U32_LEN)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn rest(&self) -> &'b [u8] {
        &self.bytes[self.pos..]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn module(id: &str, code: &str) -> Arc<Module> {
        let module = Module::new(format!("/tmp/pro/{}", id));
        module.set_compiled(id.to_string(), code.to_string()).unwrap();
        Arc::new(module)
    }

    #[test]
    fn test_layout() {
        let modules = vec![module("a.js", "A")];
        let bytes = encode("S", &modules).unwrap();

        let mut expected = vec![0xE5, 0xD1, 0x0B, 0xFB];
        expected.extend_from_slice(&1u32.to_le_bytes());
        // "S" plus its null
        expected.extend_from_slice(&2u32.to_le_bytes());
        expected.push(13);
        expected.extend_from_slice(b"a.js");
        expected.extend_from_slice(&2u32.to_le_bytes());
        expected.extend_from_slice(&2u32.to_le_bytes());
        expected.extend_from_slice(b"S\0A\0");
        assert_eq!(bytes, expected);
    }

    #[test]
    fn test_parse_recovers_modules() {
        let modules = vec![
            module("index.js", "__d(function() {},\"index.js\");"),
            module("src/App.js", "__d(function() { var x = 'é'; },\"src/App.js\");"),
            module("src/info.json", "{}"),
        ];
        let bytes = encode("__r(\"index.js\")\n", &modules).unwrap();
        let bundle = IndexedBundle::parse(&bytes).unwrap();

        assert_eq!(bundle.startup_code(), b"__r(\"index.js\")\n");
        assert_eq!(bundle.entries().len(), 3);
        for m in &modules {
            let id = m.id().unwrap();
            assert_eq!(bundle.module_code(id).unwrap(), m.code().unwrap().as_bytes());
        }

        let entries = bundle.entries();
        assert_eq!(entries[0].offset as usize, "__r(\"index.js\")\n".len() + 1);
        assert!(entries.windows(2).all(|w| w[0].offset < w[1].offset));
        let last = entries.last().unwrap();
        assert_eq!((last.offset + last.length) as usize, bundle.code_blob_len());
    }

    #[test]
    fn test_uncompiled_module_is_an_error() {
        let modules = vec![Arc::new(Module::new("/tmp/pro/a.js"))];
        let err = encode("S", &modules).unwrap_err();
        assert!(matches!(
            err,
            BundleError::IncompleteModule { missing: "identifier", .. }
        ));
    }

    #[test]
    fn test_identifier_length_limit() {
        let fits = "a".repeat(MAX_ID_LEN);
        assert!(encode("S", &[module(&fits, "x")]).is_ok());

        let too_long = "a".repeat(MAX_ID_LEN + 1);
        assert!(matches!(
            encode("S", &[module(&too_long, "x")]),
            Err(BundleError::MalformedBundle(_))
        ));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(IndexedBundle::parse(b"").is_err());
        assert!(IndexedBundle::parse(&[0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]).is_err());

        let bytes = encode("S", &[module("a.js", "A")]).unwrap();
        assert!(IndexedBundle::parse(&bytes[..bytes.len() - 3]).is_err());
    }
}
