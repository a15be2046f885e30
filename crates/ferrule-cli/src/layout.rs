use std::fmt;
use std::io::{Read, Write};
use std::str::FromStr;

use anyhow::{anyhow, bail, Context};
use ferrule_serial::{
    Exportable, Exporter, Importer, SerialResult, StreamExporter, StreamImporter,
};
use serde::Serialize;

/// Field types understood by `encode` and `decode`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldType {
    Bool,
    Byte,
    Short,
    Char,
    Int,
    Long,
    Float,
    Double,
    Compact,
    String,
    Bytes,
    Shorts,
    Chars,
    Ints,
    Longs,
    Floats,
    Doubles,
}

const NAMES: &[(&str, FieldType)] = &[
    ("bool", FieldType::Bool),
    ("byte", FieldType::Byte),
    ("short", FieldType::Short),
    ("char", FieldType::Char),
    ("int", FieldType::Int),
    ("long", FieldType::Long),
    ("float", FieldType::Float),
    ("double", FieldType::Double),
    ("compact", FieldType::Compact),
    ("string", FieldType::String),
    ("bytes[]", FieldType::Bytes),
    ("shorts[]", FieldType::Shorts),
    ("chars[]", FieldType::Chars),
    ("ints[]", FieldType::Ints),
    ("longs[]", FieldType::Longs),
    ("floats[]", FieldType::Floats),
    ("doubles[]", FieldType::Doubles),
];

impl FieldType {
    pub fn name(self) -> &'static str {
        NAMES
            .iter()
            .find(|(_, ty)| *ty == self)
            .map(|(name, _)| *name)
            .unwrap_or("?")
    }

    /// Read one value of this type.
    pub fn read(self, input: &mut dyn Importer) -> SerialResult<Value> {
        let value = match self {
            Self::Bool => Value::Bool(input.read_boolean()?),
            Self::Byte => Value::Byte(input.read_byte()?),
            Self::Short => Value::Short(input.read_short()?),
            Self::Char => Value::Char(input.read_char()?),
            Self::Int => Value::Int(input.read_int()?),
            Self::Long => Value::Long(input.read_long()?),
            Self::Float => Value::Float(input.read_float()?),
            Self::Double => Value::Double(input.read_double()?),
            Self::Compact => Value::Compact(input.read_compact_number()?),
            Self::String => Value::String(input.read_string()?),
            Self::Bytes => Value::Bytes(input.read_byte_array()?),
            Self::Shorts => Value::Shorts(input.read_short_array()?),
            Self::Chars => Value::Chars(input.read_char_array()?),
            Self::Ints => Value::Ints(input.read_int_array()?),
            Self::Longs => Value::Longs(input.read_long_array()?),
            Self::Floats => Value::Floats(input.read_float_array()?),
            Self::Doubles => Value::Doubles(input.read_double_array()?),
        };
        Ok(value)
    }
}

impl FromStr for FieldType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        NAMES
            .iter()
            .find(|(name, _)| *name == s)
            .map(|(_, ty)| *ty)
            .ok_or_else(|| anyhow!("unknown field type `{s}`"))
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A typed value as it appears on the wire.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Value {
    Bool(bool),
    Byte(u8),
    Short(i16),
    Char(u16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Compact(i32),
    String(String),
    Bytes(Vec<u8>),
    Shorts(Vec<i16>),
    Chars(Vec<u16>),
    Ints(Vec<i32>),
    Longs(Vec<i64>),
    Floats(Vec<f32>),
    Doubles(Vec<f64>),
}

impl Value {
    pub fn field_type(&self) -> FieldType {
        match self {
            Self::Bool(_) => FieldType::Bool,
            Self::Byte(_) => FieldType::Byte,
            Self::Short(_) => FieldType::Short,
            Self::Char(_) => FieldType::Char,
            Self::Int(_) => FieldType::Int,
            Self::Long(_) => FieldType::Long,
            Self::Float(_) => FieldType::Float,
            Self::Double(_) => FieldType::Double,
            Self::Compact(_) => FieldType::Compact,
            Self::String(_) => FieldType::String,
            Self::Bytes(_) => FieldType::Bytes,
            Self::Shorts(_) => FieldType::Shorts,
            Self::Chars(_) => FieldType::Chars,
            Self::Ints(_) => FieldType::Ints,
            Self::Longs(_) => FieldType::Longs,
            Self::Floats(_) => FieldType::Floats,
            Self::Doubles(_) => FieldType::Doubles,
        }
    }

    /// Parse the text form of a value of type `ty`.
    ///
    /// Array elements are comma separated; `bytes[]` takes hex instead.
    pub fn parse(ty: FieldType, text: &str) -> anyhow::Result<Self> {
        let value = match ty {
            FieldType::Bool => Self::Bool(parse_bool(text)?),
            FieldType::Byte => Self::Byte(parse_num(text)?),
            FieldType::Short => Self::Short(parse_num(text)?),
            FieldType::Char => Self::Char(parse_num(text)?),
            FieldType::Int => Self::Int(parse_num(text)?),
            FieldType::Long => Self::Long(parse_num(text)?),
            FieldType::Float => Self::Float(parse_num(text)?),
            FieldType::Double => Self::Double(parse_num(text)?),
            FieldType::Compact => Self::Compact(parse_num(text)?),
            FieldType::String => Self::String(text.to_string()),
            FieldType::Bytes => {
                Self::Bytes(hex::decode(text).with_context(|| format!("invalid hex `{text}`"))?)
            }
            FieldType::Shorts => Self::Shorts(parse_list(text)?),
            FieldType::Chars => Self::Chars(parse_list(text)?),
            FieldType::Ints => Self::Ints(parse_list(text)?),
            FieldType::Longs => Self::Longs(parse_list(text)?),
            FieldType::Floats => Self::Floats(parse_list(text)?),
            FieldType::Doubles => Self::Doubles(parse_list(text)?),
        };
        Ok(value)
    }
}

impl Exportable for Value {
    fn export(&self, out: &mut dyn Exporter) -> SerialResult<()> {
        match self {
            Self::Bool(v) => out.write_boolean(*v),
            Self::Byte(v) => out.write_byte(*v),
            Self::Short(v) => out.write_short(*v),
            Self::Char(v) => out.write_char(*v),
            Self::Int(v) => out.write_int(*v),
            Self::Long(v) => out.write_long(*v),
            Self::Float(v) => out.write_float(*v),
            Self::Double(v) => out.write_double(*v),
            Self::Compact(v) => out.write_compact_number(*v),
            Self::String(v) => out.write_string(v),
            Self::Bytes(v) => out.write_byte_array(v),
            Self::Shorts(v) => out.write_short_array(v),
            Self::Chars(v) => out.write_char_array(v),
            Self::Ints(v) => out.write_int_array(v),
            Self::Longs(v) => out.write_long_array(v),
            Self::Floats(v) => out.write_float_array(v),
            Self::Doubles(v) => out.write_double_array(v),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{v}"),
            Self::Byte(v) => write!(f, "{v}"),
            Self::Short(v) => write!(f, "{v}"),
            Self::Char(v) => match char::from_u32(u32::from(*v)) {
                Some(c) if !c.is_control() => write!(f, "{v} '{c}'"),
                _ => write!(f, "{v}"),
            },
            Self::Int(v) | Self::Compact(v) => write!(f, "{v}"),
            Self::Long(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Double(v) => write!(f, "{v}"),
            Self::String(v) => write!(f, "{v:?}"),
            Self::Bytes(v) => write!(f, "{} ({} bytes)", hex::encode(v), v.len()),
            Self::Shorts(v) => write!(f, "{v:?}"),
            Self::Chars(v) => write!(f, "{v:?}"),
            Self::Ints(v) => write!(f, "{v:?}"),
            Self::Longs(v) => write!(f, "{v:?}"),
            Self::Floats(v) => write!(f, "{v:?}"),
            Self::Doubles(v) => write!(f, "{v:?}"),
        }
    }
}

/// Parse `type:value`.
pub fn parse_field(field: &str) -> anyhow::Result<Value> {
    let (ty, text) = field
        .split_once(':')
        .ok_or_else(|| anyhow!("field `{field}` is not of the form type:value"))?;
    Value::parse(ty.trim().parse()?, text).with_context(|| format!("in field `{field}`"))
}

/// Parse a comma separated list of field types.
pub fn parse_layout(layout: &str) -> anyhow::Result<Vec<FieldType>> {
    let types = layout
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::parse)
        .collect::<anyhow::Result<Vec<FieldType>>>()?;
    if types.is_empty() {
        bail!("empty layout");
    }
    Ok(types)
}

/// Write `values` in order to `sink`. Returns the sink and the byte count.
pub fn write_fields<W: Write>(sink: W, values: &[Value]) -> SerialResult<(W, u64)> {
    let mut out = StreamExporter::new(sink);
    for value in values {
        value.export(&mut out)?;
    }
    out.flush()?;
    let written = out.bytes_written();
    Ok((out.into_inner(), written))
}

/// Fields decoded from a source, plus whatever the layout left unread.
#[derive(Debug, Serialize)]
pub struct Decoded {
    pub values: Vec<Value>,
    pub bytes_read: u64,
    pub leftover: usize,
}

/// Read one value per entry of `layout` from `source`.
pub fn read_fields<R: Read>(source: R, layout: &[FieldType]) -> anyhow::Result<Decoded> {
    let mut input = StreamImporter::new(source);
    let mut values = Vec::with_capacity(layout.len());
    for (i, ty) in layout.iter().enumerate() {
        let value = ty
            .read(&mut input)
            .with_context(|| format!("field {i} ({ty}) at byte {}", input.bytes_read()))?;
        values.push(value);
    }
    let bytes_read = input.bytes_read();
    let mut rest = Vec::new();
    let leftover = input.into_inner().read_to_end(&mut rest)?;
    Ok(Decoded {
        values,
        bytes_read,
        leftover,
    })
}

fn parse_bool(text: &str) -> anyhow::Result<bool> {
    match text.trim() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        other => bail!("invalid bool `{other}`"),
    }
}

fn parse_num<T>(text: &str) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let text = text.trim();
    text.parse()
        .with_context(|| format!("invalid number `{text}`"))
}

fn parse_list<T>(text: &str) -> anyhow::Result<Vec<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }
    text.split(',').map(parse_num).collect()
}
