//! Binary row files
//!
//! Arrays are stored as NPY v1.0 structured arrays so any tool that reads
//! typed structured-array dumps can open them. The body is a flat run of
//! packed, little-endian canonical rows; there are no pointers and no
//! variable-length fields.
//!
//! ```text
//! magic("\x93NUMPY", 6) + major(1) + minor(1) + header_len(u16 LE)
//! + header: "{'descr': [('row_value', '<u4'), ...], 'fortran_order': False, 'shape': (N,), }"
//!   padded with spaces and a trailing '\n' so the preamble is a multiple of 64 bytes
//! + N * 43 bytes of rows
//! ```
//!
//! Readers also accept version 2.x/3.x preambles (u32 header length).

use crate::error::{ArrayError, ArrayResult};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use calcpack_core::{Row, RowSchema, CANONICAL_SCHEMA};
use once_cell::sync::Lazy;
use regex::Regex;
use std::io::{self, Read, Write};

/// Magic bytes that open every binary row file
pub const NPY_MAGIC: &[u8; 6] = b"\x93NUMPY";

/// File extension for binary row files
pub const NPY_EXTENSION: &str = "npy";

/// Preamble alignment in bytes
const HEADER_ALIGN: usize = 64;

/// magic + version + u16 header length
const V1_PREFIX_LEN: usize = 10;

static SHAPE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"'shape':\s*\((\d+),?\s*\)").expect("valid shape regex"));

/// Python-literal structured dtype descriptor for a schema
pub fn descr(schema: &RowSchema) -> String {
    let fields: Vec<String> = schema
        .fields
        .iter()
        .map(|f| format!("('{}', '{}')", f.name, f.kind.type_code()))
        .collect();
    format!("[{}]", fields.join(", "))
}

/// Full preamble (magic, version, header) for `len` canonical rows
pub fn header(len: usize) -> Vec<u8> {
    let mut dict = format!(
        "{{'descr': {}, 'fortran_order': False, 'shape': ({},), }}",
        descr(&CANONICAL_SCHEMA),
        len
    );
    // Pad so that magic + version + length + header (incl. '\n') is aligned
    let unpadded = V1_PREFIX_LEN + dict.len() + 1;
    let padding = (HEADER_ALIGN - unpadded % HEADER_ALIGN) % HEADER_ALIGN;
    dict.extend(std::iter::repeat(' ').take(padding));
    dict.push('\n');

    let mut buf = Vec::with_capacity(V1_PREFIX_LEN + dict.len());
    buf.extend_from_slice(NPY_MAGIC);
    buf.push(1);
    buf.push(0);
    buf.extend_from_slice(&(dict.len() as u16).to_le_bytes());
    buf.extend_from_slice(dict.as_bytes());
    buf
}

/// Total encoded size of `len` rows, preamble included
pub fn encoded_len(len: usize) -> usize {
    header(len).len() + len * CANONICAL_SCHEMA.row_width()
}

/// Write one packed row
pub fn write_row<W: Write>(writer: &mut W, row: &Row) -> io::Result<()> {
    writer.write_u32::<LittleEndian>(row.row_value)?;
    writer.write_u32::<LittleEndian>(row.col_value)?;
    writer.write_u32::<LittleEndian>(row.row_index)?;
    writer.write_u32::<LittleEndian>(row.col_index)?;
    writer.write_u8(row.uncertainty_type)?;
    writer.write_f32::<LittleEndian>(row.amount)?;
    writer.write_f32::<LittleEndian>(row.loc)?;
    writer.write_f32::<LittleEndian>(row.scale)?;
    writer.write_f32::<LittleEndian>(row.shape)?;
    writer.write_f32::<LittleEndian>(row.minimum)?;
    writer.write_f32::<LittleEndian>(row.maximum)?;
    writer.write_u8(row.negative as u8)?;
    writer.write_u8(row.flip as u8)?;
    Ok(())
}

/// Read one packed row
pub fn read_row<R: Read>(reader: &mut R) -> io::Result<Row> {
    Ok(Row {
        row_value: reader.read_u32::<LittleEndian>()?,
        col_value: reader.read_u32::<LittleEndian>()?,
        row_index: reader.read_u32::<LittleEndian>()?,
        col_index: reader.read_u32::<LittleEndian>()?,
        uncertainty_type: reader.read_u8()?,
        amount: reader.read_f32::<LittleEndian>()?,
        loc: reader.read_f32::<LittleEndian>()?,
        scale: reader.read_f32::<LittleEndian>()?,
        shape: reader.read_f32::<LittleEndian>()?,
        minimum: reader.read_f32::<LittleEndian>()?,
        maximum: reader.read_f32::<LittleEndian>()?,
        negative: reader.read_u8()? != 0,
        flip: reader.read_u8()? != 0,
    })
}

/// Write a preamble followed by `rows`; returns bytes written
pub fn write_rows<W: Write>(mut writer: W, rows: &[Row]) -> ArrayResult<u64> {
    let preamble = header(rows.len());
    writer.write_all(&preamble)?;
    for row in rows {
        write_row(&mut writer, row)?;
    }
    Ok((preamble.len() + rows.len() * CANONICAL_SCHEMA.row_width()) as u64)
}

/// Read a preamble and the rows it declares
pub fn read_rows<R: Read>(mut reader: R) -> ArrayResult<Vec<Row>> {
    let mut magic = [0u8; 6];
    reader
        .read_exact(&mut magic)
        .map_err(|_| ArrayError::invalid_header("file too short for magic bytes"))?;
    if &magic != NPY_MAGIC {
        return Err(ArrayError::invalid_header("bad magic bytes"));
    }

    let major = reader.read_u8()?;
    let _minor = reader.read_u8()?;
    let header_len = match major {
        1 => reader.read_u16::<LittleEndian>()? as usize,
        2 | 3 => reader.read_u32::<LittleEndian>()? as usize,
        other => {
            return Err(ArrayError::invalid_header(format!(
                "unsupported format version {}",
                other
            )))
        }
    };

    let mut dict = vec![0u8; header_len];
    reader
        .read_exact(&mut dict)
        .map_err(|_| ArrayError::invalid_header("header shorter than declared"))?;
    let dict = String::from_utf8(dict)
        .map_err(|_| ArrayError::invalid_header("header is not valid text"))?;

    let expected = format!("'descr': {}", descr(&CANONICAL_SCHEMA));
    if !dict.contains(&expected) {
        return Err(ArrayError::LayoutMismatch(dict.trim().to_string()));
    }
    if dict.contains("'fortran_order': True") {
        return Err(ArrayError::LayoutMismatch(
            "fortran order is not supported".to_string(),
        ));
    }
    let len: usize = SHAPE_RE
        .captures(&dict)
        .and_then(|c| c[1].parse().ok())
        .ok_or_else(|| ArrayError::invalid_header("missing or non 1-d shape"))?;

    let width = CANONICAL_SCHEMA.row_width();
    let expected_bytes = len
        .checked_mul(width)
        .ok_or_else(|| ArrayError::invalid_header("shape too large"))?;
    let mut body = Vec::new();
    reader
        .by_ref()
        .take(expected_bytes as u64)
        .read_to_end(&mut body)?;
    if body.len() < expected_bytes {
        return Err(ArrayError::Truncated {
            expected: expected_bytes,
            actual: body.len(),
        });
    }

    // The body is fully present here, so `len` is bounded by real input
    let mut cursor = io::Cursor::new(body);
    let mut rows = Vec::with_capacity(len);
    for _ in 0..len {
        rows.push(read_row(&mut cursor)?);
    }
    Ok(rows)
}
