use std::fs::File;
use std::path::Path;
use std::io::Read;
use byteorder::{LittleEndian, ReadBytesExt};
use super::types::{GGUFValue, GGUFValueType, GGUFError};

/// The magic number that identifies GGUF files
pub const GGUF_MAGIC: u32 = 0x46554747; // "GGUF" in ASCII

/// Reads a length or count field, which is 64-bit from version 3 on.
pub fn read_len<R: Read>(reader: &mut R, version: u32) -> Result<u64, GGUFError> {
    if version >= 3 {
        Ok(reader.read_u64::<LittleEndian>()?)
    } else {
        Ok(reader.read_u32::<LittleEndian>()? as u64)
    }
}

/// Read a length-prefixed UTF-8 string
pub fn read_string<R: Read>(reader: &mut R, version: u32) -> Result<String, GGUFError> {
    let str_len = read_len(reader, version)?;

    let mut buffer = Vec::new();
    reader.take(str_len).read_to_end(&mut buffer)?;
    if buffer.len() as u64 != str_len {
        return Err(GGUFError::InvalidFormat(
            format!("String truncated: expected {} bytes, got {}", str_len, buffer.len())
        ));
    }

    String::from_utf8(buffer)
        .map_err(|e| GGUFError::InvalidFormat(format!("Invalid UTF-8 in string: {}", e)))
}

/// Read a scalar GGUF value of the specified type
pub fn read_value_by_type<R: Read>(
    reader: &mut R,
    value_type: GGUFValueType,
    version: u32,
) -> Result<GGUFValue, GGUFError> {
    let value = match value_type {
        GGUFValueType::UINT8 => GGUFValue::Int(reader.read_u8()? as i64),
        GGUFValueType::INT8 => GGUFValue::Int(reader.read_i8()? as i64),
        GGUFValueType::UINT16 => GGUFValue::Int(reader.read_u16::<LittleEndian>()? as i64),
        GGUFValueType::INT16 => GGUFValue::Int(reader.read_i16::<LittleEndian>()? as i64),
        GGUFValueType::UINT32 => GGUFValue::Int(reader.read_u32::<LittleEndian>()? as i64),
        GGUFValueType::INT32 => GGUFValue::Int(reader.read_i32::<LittleEndian>()? as i64),
        GGUFValueType::FLOAT32 => GGUFValue::Float(reader.read_f32::<LittleEndian>()?),
        GGUFValueType::BOOL => GGUFValue::Bool(reader.read_u8()? != 0),
        GGUFValueType::STRING => GGUFValue::String(read_string(reader, version)?),
        GGUFValueType::UINT64 => GGUFValue::Int(reader.read_u64::<LittleEndian>()? as i64),
        GGUFValueType::INT64 => GGUFValue::Int(reader.read_i64::<LittleEndian>()?),
        // No dedicated f64 variant
        GGUFValueType::FLOAT64 => GGUFValue::Float(reader.read_f64::<LittleEndian>()? as f32),
        GGUFValueType::ARRAY => {
            return Err(GGUFError::InvalidFormat("Nested arrays are not supported".into()));
        }
    };
    Ok(value)
}

/// Checks if a file at the given path is a GGUF format file by verifying its magic number.
pub fn is_gguf_file<P: AsRef<Path>>(path: P) -> bool {
    if let Ok(mut file) = File::open(path) {
        if let Ok(magic) = file.read_u32::<LittleEndian>() {
            return magic == GGUF_MAGIC;
        }
    }
    false
}
