// ============================================================
// Layer 4 — NumPy .npy Codec
// ============================================================
// Encodes a Tensor as a NumPy .npy file and decodes it back.
//
// File layout (format version 1.0):
//
//   ┌────────────┬─────────┬────────────┬──────────────────────┬──────┐
//   │ \x93NUMPY  │ 01 00   │ header_len │ header dict + spaces │ data │
//   │ 6 bytes    │ version │ u16 LE     │ ends with '\n'       │      │
//   └────────────┴─────────┴────────────┴──────────────────────┴──────┘
//
// The header is a Python dict literal, e.g.
//   {'descr': '<f4', 'fortran_order': False, 'shape': (768,), }
// padded with spaces so that the data starts on a 64-byte boundary.
//
// Shapes follow Python tuple syntax:
//   []       → ()
//   [768]    → (768,)
//   [3, 4]   → (3, 4)
//
// Decoding accepts versions 1.x (u16 header length) and 2.x/3.x
// (u32 header length). Fortran-ordered arrays are rejected.
//
// Reference: numpy.lib.format documentation

use anyhow::{anyhow, bail, ensure, Context, Result};

use crate::domain::tensor::{DType, Tensor};

const MAGIC: &[u8] = b"\x93NUMPY";

/// File extension used for exported arrays
pub const EXTENSION: &str = "npy";

/// Header alignment required by the format
const ALIGN: usize = 64;

fn descr(dtype: DType) -> &'static str {
    match dtype {
        DType::Bool => "|b1",
        DType::U8   => "|u1",
        DType::I8   => "|i1",
        DType::U16  => "<u2",
        DType::I16  => "<i2",
        DType::F16  => "<f2",
        DType::U32  => "<u4",
        DType::I32  => "<i4",
        DType::F32  => "<f4",
        DType::U64  => "<u8",
        DType::I64  => "<i8",
        DType::F64  => "<f8",
    }
}

fn dtype_from_descr(descr: &str) -> Option<DType> {
    // '=' (native) is little-endian on every platform we write from
    let dtype = match descr.trim_start_matches(&['<', '|', '='][..]) {
        "b1" => DType::Bool,
        "u1" => DType::U8,
        "i1" => DType::I8,
        "u2" => DType::U16,
        "i2" => DType::I16,
        "f2" => DType::F16,
        "u4" => DType::U32,
        "i4" => DType::I32,
        "f4" => DType::F32,
        "u8" => DType::U64,
        "i8" => DType::I64,
        "f8" => DType::F64,
        _ => return None,
    };
    Some(dtype)
}

fn shape_literal(shape: &[usize]) -> String {
    match shape {
        []    => "()".to_string(),
        [n]   => format!("({},)", n),
        dims  => format!(
            "({})",
            dims.iter().map(|d| d.to_string()).collect::<Vec<_>>().join(", ")
        ),
    }
}

/// Serialise a tensor into .npy bytes.
pub fn encode(tensor: &Tensor) -> Result<Vec<u8>> {
    ensure!(
        tensor.is_consistent(),
        "tensor data is {} bytes, shape {:?} of {:?} needs {}",
        tensor.data.len(),
        tensor.shape,
        tensor.dtype,
        tensor.numel() * tensor.dtype.size()
    );

    let dict = format!(
        "{{'descr': '{}', 'fortran_order': False, 'shape': {}, }}",
        descr(tensor.dtype),
        shape_literal(&tensor.shape)
    );

    // magic(6) + version(2) + header_len(2) + dict + '\n'
    let unpadded = MAGIC.len() + 2 + 2 + dict.len() + 1;
    let padding  = (ALIGN - unpadded % ALIGN) % ALIGN;
    let header_len = dict.len() + padding + 1;
    let header_len = u16::try_from(header_len)
        .map_err(|_| anyhow!("npy header too long for shape {:?}", tensor.shape))?;

    let mut out = Vec::with_capacity(unpadded + padding + tensor.data.len());
    out.extend_from_slice(MAGIC);
    out.extend_from_slice(&[1, 0]);
    out.extend_from_slice(&header_len.to_le_bytes());
    out.extend_from_slice(dict.as_bytes());
    out.resize(out.len() + padding, b' ');
    out.push(b'\n');
    out.extend_from_slice(&tensor.data);
    Ok(out)
}

/// Extract the raw text after `'key':` in a header dict
fn header_value<'a>(header: &'a str, key: &str) -> Result<&'a str> {
    let quoted = format!("'{}'", key);
    let start = header
        .find(&quoted)
        .or_else(|| header.find(&format!("\"{}\"", key)))
        .with_context(|| format!("npy header has no '{}' entry", key))?;
    let rest = &header[start + quoted.len()..];
    let colon = rest.find(':').with_context(|| format!("npy header: no ':' after '{}'", key))?;
    Ok(rest[colon + 1..].trim_start())
}

fn parse_descr(header: &str) -> Result<DType> {
    let value = header_value(header, "descr")?;
    let quote = value.chars().next().context("npy header: empty descr")?;
    ensure!(quote == '\'' || quote == '"', "npy header: descr is not a string");
    let end = value[1..].find(quote).context("npy header: unterminated descr")?;
    let descr = &value[1..1 + end];
    dtype_from_descr(descr).ok_or_else(|| anyhow!("unsupported npy descr '{}'", descr))
}

fn parse_shape(header: &str) -> Result<Vec<usize>> {
    let value = header_value(header, "shape")?;
    ensure!(value.starts_with('('), "npy header: shape is not a tuple");
    let end = value.find(')').context("npy header: unterminated shape")?;
    value[1..end]
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<usize>().with_context(|| format!("npy shape entry '{}'", s)))
        .collect()
}

/// Parse .npy bytes back into a tensor.
pub fn decode(bytes: &[u8]) -> Result<Tensor> {
    ensure!(bytes.len() >= 10 && &bytes[..6] == MAGIC, "not a .npy file");

    let major = bytes[6];
    let (header_len, header_start) = match major {
        1 => (u16::from_le_bytes([bytes[8], bytes[9]]) as usize, 10),
        2 | 3 => {
            ensure!(bytes.len() >= 12, "truncated .npy header");
            (u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]) as usize, 12)
        }
        v => bail!("unsupported .npy version {}", v),
    };

    let data_start = header_start + header_len;
    ensure!(bytes.len() >= data_start, "truncated .npy header");
    let header = std::str::from_utf8(&bytes[header_start..data_start])
        .context("npy header is not valid UTF-8")?;

    let fortran = header_value(header, "fortran_order")?;
    ensure!(fortran.starts_with("False"), "fortran-ordered arrays are not supported");

    let tensor = Tensor::new(
        parse_descr(header)?,
        parse_shape(header)?,
        bytes[data_start..].to_vec(),
    );
    ensure!(
        tensor.is_consistent(),
        "npy data is {} bytes, expected {}",
        tensor.data.len(),
        tensor.numel() * tensor.dtype.size()
    );
    Ok(tensor)
}
