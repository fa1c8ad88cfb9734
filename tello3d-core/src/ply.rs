//! PLY reader for ASCII and binary triangle meshes
use log::{debug, warn};
use nalgebra::{Point3, Vector3};
use nom::{
    branch::alt,
    bytes::complete::{tag, take_till1},
    character::complete::{digit1, space0, space1},
    combinator::{all_consuming, map, map_res, rest, value},
    sequence::{preceded, terminated},
    IResult,
};

use crate::error::PlyError;
use crate::geometry::TriangleMesh;

const END_HEADER: &[u8] = b"end_header";

/// Encoding of the PLY body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlyFormat {
    Ascii,
    BinaryLittleEndian,
    BinaryBigEndian,
}

/// Scalar property types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarType {
    Int8,
    UInt8,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Float32,
    Float64,
}

impl ScalarType {
    /// Inclusive bounds of an integer type, `None` for floats
    fn integer_range(self) -> Option<(f64, f64)> {
        Some(match self {
            ScalarType::Int8 => (i8::MIN as f64, i8::MAX as f64),
            ScalarType::UInt8 => (0.0, u8::MAX as f64),
            ScalarType::Int16 => (i16::MIN as f64, i16::MAX as f64),
            ScalarType::UInt16 => (0.0, u16::MAX as f64),
            ScalarType::Int32 => (i32::MIN as f64, i32::MAX as f64),
            ScalarType::UInt32 => (0.0, u32::MAX as f64),
            ScalarType::Float32 | ScalarType::Float64 => return None,
        })
    }

    /// Divisor that maps a stored color channel into `[0, 1]`
    fn color_scale(self) -> f64 {
        match self {
            ScalarType::Int8 => i8::MAX as f64,
            ScalarType::UInt8 => u8::MAX as f64,
            ScalarType::Int16 => i16::MAX as f64,
            ScalarType::UInt16 => u16::MAX as f64,
            ScalarType::Int32 => i32::MAX as f64,
            ScalarType::UInt32 => u32::MAX as f64,
            ScalarType::Float32 | ScalarType::Float64 => 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKind {
    Scalar(ScalarType),
    List { count: ScalarType, item: ScalarType },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyDef {
    pub name: String,
    pub kind: PropertyKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementDef {
    pub name: String,
    pub count: usize,
    pub properties: Vec<PropertyDef>,
}

impl ElementDef {
    fn property_index(&self, name: &str) -> Option<usize> {
        self.properties.iter().position(|p| p.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlyHeader {
    pub format: PlyFormat,
    pub elements: Vec<ElementDef>,
}

impl PlyHeader {
    fn element(&self, name: &str) -> Option<&ElementDef> {
        self.elements.iter().find(|e| e.name == name)
    }
}

/// Parse a PLY file held in memory into a triangle mesh.
///
/// Reads `x y z` and optional `red green blue` from the `vertex` element and
/// `vertex_indices` (or `vertex_index`) from the `face` element. Polygons are
/// fan-triangulated. Any other element or property is skipped.
pub fn parse_ply(data: &[u8]) -> Result<TriangleMesh, PlyError> {
    let (header_text, body) = split_header(data)?;
    let header = parse_header(header_text)?;
    debug!(
        "PLY header: {:?}, elements {:?}",
        header.format,
        header
            .elements
            .iter()
            .map(|e| (e.name.as_str(), e.count))
            .collect::<Vec<_>>()
    );

    let vertex_count = header
        .element("vertex")
        .ok_or(PlyError::MissingElement("vertex"))?
        .count;
    if header.element("face").is_none() {
        warn!("PLY data has no face element, mesh will have no triangles");
    }

    let mut reader = BodyReader::new(header.format, body)?;
    let mut mesh = TriangleMesh::default();

    for element in &header.elements {
        match element.name.as_str() {
            "vertex" => read_vertices(&mut reader, element, &mut mesh)?,
            "face" => read_faces(&mut reader, element, vertex_count, &mut mesh)?,
            _ => {
                for _ in 0..element.count {
                    read_row(&mut reader, element)?;
                }
            }
        }
    }

    Ok(mesh)
}

/// Split the raw bytes after the first line that reads exactly `end_header`
fn split_header(data: &[u8]) -> Result<(&str, &[u8]), PlyError> {
    let mut start = 0;
    let line_end = loop {
        if start >= data.len() {
            return Err(PlyError::Header {
                line: 0,
                message: "missing end_header".to_string(),
            });
        }
        let end = data[start..]
            .iter()
            .position(|&b| b == b'\n')
            .map_or(data.len(), |offset| start + offset + 1);
        if data[start..end].trim_ascii() == END_HEADER {
            break end;
        }
        start = end;
    };

    let header = std::str::from_utf8(&data[..line_end]).map_err(|_| PlyError::Header {
        line: 0,
        message: "header is not valid text".to_string(),
    })?;
    Ok((header, &data[line_end..]))
}

#[derive(Clone)]
enum HeaderLine<'a> {
    Format(&'a str),
    Element(ElementDef),
    Property(PropertyDef),
    Ignored,
    End,
}

fn parse_header(text: &str) -> Result<PlyHeader, PlyError> {
    let mut lines = text.lines().enumerate();
    match lines.next() {
        Some((_, line)) if line.trim() == "ply" => {}
        _ => {
            return Err(PlyError::Header {
                line: 1,
                message: "expected 'ply' magic".to_string(),
            })
        }
    }

    let mut format = None;
    let mut elements: Vec<ElementDef> = Vec::new();

    for (index, line) in lines {
        let line_no = index + 1;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let (_, parsed) = all_consuming(terminated(header_line, space0))(line).map_err(|e| {
            PlyError::Header {
                line: line_no,
                message: format!("could not parse '{}': {:?}", line, e),
            }
        })?;

        match parsed {
            HeaderLine::Format(name) => {
                format = Some(match name {
                    "ascii" => PlyFormat::Ascii,
                    "binary_little_endian" => PlyFormat::BinaryLittleEndian,
                    "binary_big_endian" => PlyFormat::BinaryBigEndian,
                    other => return Err(PlyError::UnsupportedFormat(other.to_string())),
                });
            }
            HeaderLine::Element(element) => elements.push(element),
            HeaderLine::Property(property) => match elements.last_mut() {
                Some(element) => element.properties.push(property),
                None => {
                    return Err(PlyError::Header {
                        line: line_no,
                        message: "property declared before any element".to_string(),
                    })
                }
            },
            HeaderLine::Ignored => {}
            HeaderLine::End => break,
        }
    }

    let format = format.ok_or_else(|| PlyError::Header {
        line: 0,
        message: "missing format line".to_string(),
    })?;
    Ok(PlyHeader { format, elements })
}

fn header_line(input: &str) -> IResult<&str, HeaderLine<'_>> {
    alt((
        format_line,
        map(element_line, HeaderLine::Element),
        map(property_line, HeaderLine::Property),
        value(HeaderLine::Ignored, preceded(alt((tag("comment"), tag("obj_info"))), rest)),
        value(HeaderLine::End, tag("end_header")),
    ))(input)
}

fn format_line(input: &str) -> IResult<&str, HeaderLine<'_>> {
    let (input, _) = tag("format")(input)?;
    let (input, name) = preceded(space1, word)(input)?;
    let (input, _) = preceded(space1, tag("1.0"))(input)?;
    Ok((input, HeaderLine::Format(name)))
}

fn element_line(input: &str) -> IResult<&str, ElementDef> {
    let (input, _) = tag("element")(input)?;
    let (input, name) = preceded(space1, word)(input)?;
    let (input, count) = preceded(space1, map_res(digit1, str::parse::<usize>))(input)?;
    Ok((
        input,
        ElementDef {
            name: name.to_string(),
            count,
            properties: Vec::new(),
        },
    ))
}

fn property_line(input: &str) -> IResult<&str, PropertyDef> {
    let (input, _) = tag("property")(input)?;
    let (input, kind) = preceded(
        space1,
        alt((list_kind, map(scalar_type, PropertyKind::Scalar))),
    )(input)?;
    let (input, name) = preceded(space1, word)(input)?;
    Ok((
        input,
        PropertyDef {
            name: name.to_string(),
            kind,
        },
    ))
}

fn list_kind(input: &str) -> IResult<&str, PropertyKind> {
    let (input, _) = tag("list")(input)?;
    let (input, count) = preceded(space1, scalar_type)(input)?;
    let (input, item) = preceded(space1, scalar_type)(input)?;
    Ok((input, PropertyKind::List { count, item }))
}

// Order matters: a bare "int" or "float" tag must not swallow the prefix of
// "int16" or "float64"
fn scalar_type(input: &str) -> IResult<&str, ScalarType> {
    alt((
        value(ScalarType::Int8, alt((tag("int8"), tag("char")))),
        value(ScalarType::UInt8, alt((tag("uint8"), tag("uchar")))),
        value(ScalarType::Int16, alt((tag("int16"), tag("short")))),
        value(ScalarType::UInt16, alt((tag("uint16"), tag("ushort")))),
        value(ScalarType::Int32, alt((tag("int32"), tag("int")))),
        value(ScalarType::UInt32, alt((tag("uint32"), tag("uint")))),
        value(ScalarType::Float64, alt((tag("float64"), tag("double")))),
        value(ScalarType::Float32, alt((tag("float32"), tag("float")))),
    ))(input)
}

fn word(input: &str) -> IResult<&str, &str> {
    take_till1(char::is_whitespace)(input)
}

/// Sequential reader over the element data that follows the header
enum BodyReader<'a> {
    Ascii(std::str::SplitAsciiWhitespace<'a>),
    Binary {
        data: &'a [u8],
        pos: usize,
        big_endian: bool,
    },
}

impl<'a> BodyReader<'a> {
    fn new(format: PlyFormat, body: &'a [u8]) -> Result<Self, PlyError> {
        Ok(match format {
            PlyFormat::Ascii => {
                let text = std::str::from_utf8(body)
                    .map_err(|_| PlyError::InvalidValue("non-text data in ASCII body".into()))?;
                BodyReader::Ascii(text.split_ascii_whitespace())
            }
            PlyFormat::BinaryLittleEndian => BodyReader::Binary {
                data: body,
                pos: 0,
                big_endian: false,
            },
            PlyFormat::BinaryBigEndian => BodyReader::Binary {
                data: body,
                pos: 0,
                big_endian: true,
            },
        })
    }

    fn read(&mut self, ty: ScalarType) -> Result<f64, PlyError> {
        match self {
            BodyReader::Ascii(tokens) => {
                let token = tokens.next().ok_or(PlyError::UnexpectedEof)?;
                let value: f64 = token
                    .parse()
                    .map_err(|_| PlyError::InvalidValue(token.to_string()))?;
                if let Some((min, max)) = ty.integer_range() {
                    if value.fract() != 0.0 || value < min || value > max {
                        return Err(PlyError::InvalidValue(token.to_string()));
                    }
                }
                Ok(value)
            }
            BodyReader::Binary {
                data,
                pos,
                big_endian,
            } => {
                macro_rules! decode {
                    ($t:ty) => {{
                        const N: usize = std::mem::size_of::<$t>();
                        let bytes = data.get(*pos..*pos + N).ok_or(PlyError::UnexpectedEof)?;
                        let mut buf = [0u8; N];
                        buf.copy_from_slice(bytes);
                        *pos += N;
                        if *big_endian {
                            <$t>::from_be_bytes(buf) as f64
                        } else {
                            <$t>::from_le_bytes(buf) as f64
                        }
                    }};
                }
                Ok(match ty {
                    ScalarType::Int8 => decode!(i8),
                    ScalarType::UInt8 => decode!(u8),
                    ScalarType::Int16 => decode!(i16),
                    ScalarType::UInt16 => decode!(u16),
                    ScalarType::Int32 => decode!(i32),
                    ScalarType::UInt32 => decode!(u32),
                    ScalarType::Float32 => decode!(f32),
                    ScalarType::Float64 => decode!(f64),
                })
            }
        }
    }

    fn read_count(&mut self, ty: ScalarType) -> Result<usize, PlyError> {
        let value = self.read(ty)?;
        if value < 0.0 {
            return Err(PlyError::InvalidValue(value.to_string()));
        }
        Ok(value as usize)
    }
}

enum PropertyValue {
    Scalar(f64),
    List(Vec<f64>),
}

impl PropertyValue {
    fn scalar(&self) -> Option<f64> {
        match self {
            PropertyValue::Scalar(v) => Some(*v),
            PropertyValue::List(_) => None,
        }
    }
}

fn read_row(reader: &mut BodyReader<'_>, element: &ElementDef) -> Result<Vec<PropertyValue>, PlyError> {
    element
        .properties
        .iter()
        .map(|property| match property.kind {
            PropertyKind::Scalar(ty) => reader.read(ty).map(PropertyValue::Scalar),
            PropertyKind::List { count, item } => {
                let len = reader.read_count(count)?;
                (0..len)
                    .map(|_| reader.read(item))
                    .collect::<Result<Vec<_>, _>>()
                    .map(PropertyValue::List)
            }
        })
        .collect()
}

fn read_vertices(
    reader: &mut BodyReader<'_>,
    element: &ElementDef,
    mesh: &mut TriangleMesh,
) -> Result<(), PlyError> {
    let required = |name: &'static str| {
        element
            .property_index(name)
            .ok_or_else(|| PlyError::MissingProperty {
                element: element.name.clone(),
                property: name,
            })
    };
    let position = [required("x")?, required("y")?, required("z")?];

    let color = match (
        element.property_index("red"),
        element.property_index("green"),
        element.property_index("blue"),
    ) {
        (Some(r), Some(g), Some(b)) => Some([r, g, b]),
        _ => None,
    };

    for _ in 0..element.count {
        let row = read_row(reader, element)?;
        let scalar = |index: usize| {
            row[index].scalar().ok_or_else(|| {
                PlyError::InvalidValue(format!(
                    "list in scalar property '{}'",
                    element.properties[index].name
                ))
            })
        };

        mesh.vertices.push(Point3::new(
            scalar(position[0])?,
            scalar(position[1])?,
            scalar(position[2])?,
        ));

        if let Some(channels) = color {
            let mut rgb = Vector3::zeros();
            for (slot, &index) in channels.iter().enumerate() {
                let scale = match element.properties[index].kind {
                    PropertyKind::Scalar(ty) => ty.color_scale(),
                    PropertyKind::List { .. } => 1.0,
                };
                rgb[slot] = scalar(index)? / scale;
            }
            mesh.vertex_colors.push(rgb);
        }
    }

    Ok(())
}

fn read_faces(
    reader: &mut BodyReader<'_>,
    element: &ElementDef,
    vertex_count: usize,
    mesh: &mut TriangleMesh,
) -> Result<(), PlyError> {
    let indices_at = element
        .property_index("vertex_indices")
        .or_else(|| element.property_index("vertex_index"))
        .ok_or_else(|| PlyError::MissingProperty {
            element: element.name.clone(),
            property: "vertex_indices",
        })?;

    let mut dropped = 0usize;
    for _ in 0..element.count {
        let row = read_row(reader, element)?;
        let polygon = match &row[indices_at] {
            PropertyValue::List(items) => items
                .iter()
                .map(|&raw| vertex_index(raw, vertex_count))
                .collect::<Result<Vec<_>, _>>()?,
            PropertyValue::Scalar(_) => {
                return Err(PlyError::InvalidValue(
                    "face vertex indices must be a list".to_string(),
                ))
            }
        };

        if polygon.len() < 3 {
            dropped += 1;
            continue;
        }
        for k in 1..polygon.len() - 1 {
            mesh.triangles.push([polygon[0], polygon[k], polygon[k + 1]]);
        }
    }

    if dropped > 0 {
        warn!("dropped {} faces with fewer than three vertices", dropped);
    }
    Ok(())
}

fn vertex_index(raw: f64, vertex_count: usize) -> Result<u32, PlyError> {
    if !raw.is_finite() || raw.fract() != 0.0 {
        return Err(PlyError::InvalidValue(format!("face vertex index {}", raw)));
    }
    if raw < 0.0 || raw >= vertex_count as f64 || raw > u32::MAX as f64 {
        return Err(PlyError::IndexOutOfRange {
            index: raw.max(0.0) as u64,
            vertex_count,
        });
    }
    Ok(raw as u32)
}
