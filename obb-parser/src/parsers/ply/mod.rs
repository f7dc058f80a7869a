use std::{
    fs::File,
    io::{BufRead, BufReader, Read},
    path::{Path, PathBuf},
};

use byteorder::{ByteOrder as _, LittleEndian};

use obb_core::pointcloud::point::{Point, PointCloud};

use super::{Parser, ParserProvider, PointCloudError};

pub struct PlyParserProvider {
    pub filenames: Vec<PathBuf>,
}

impl ParserProvider for PlyParserProvider {
    fn get_parser(&self) -> Box<dyn Parser> {
        Box::new(PlyParser {
            filenames: self.filenames.clone(),
        })
    }
}

pub struct PlyParser {
    pub filenames: Vec<PathBuf>,
}

impl Parser for PlyParser {
    fn parse(&self) -> Result<PointCloud, PointCloudError> {
        let mut points = Vec::new();
        for filename in &self.filenames {
            points.extend(read_ply_points(filename)?);
        }
        Ok(PointCloud::new(points))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum PlyFormat {
    Ascii,
    BinaryLittleEndian,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum ScalarType {
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
    fn parse(type_str: &str) -> Option<Self> {
        match type_str {
            "char" | "int8" => Some(ScalarType::Int8),
            "uchar" | "uint8" => Some(ScalarType::UInt8),
            "short" | "int16" => Some(ScalarType::Int16),
            "ushort" | "uint16" => Some(ScalarType::UInt16),
            "int" | "int32" => Some(ScalarType::Int32),
            "uint" | "uint32" => Some(ScalarType::UInt32),
            "float" | "float32" => Some(ScalarType::Float32),
            "double" | "float64" => Some(ScalarType::Float64),
            _ => None,
        }
    }

    fn size(self) -> usize {
        match self {
            ScalarType::Int8 | ScalarType::UInt8 => 1,
            ScalarType::Int16 | ScalarType::UInt16 => 2,
            ScalarType::Int32 | ScalarType::UInt32 | ScalarType::Float32 => 4,
            ScalarType::Float64 => 8,
        }
    }

    fn read_le(self, bytes: &[u8]) -> f64 {
        match self {
            ScalarType::Int8 => bytes[0] as i8 as f64,
            ScalarType::UInt8 => bytes[0] as f64,
            ScalarType::Int16 => LittleEndian::read_i16(bytes) as f64,
            ScalarType::UInt16 => LittleEndian::read_u16(bytes) as f64,
            ScalarType::Int32 => LittleEndian::read_i32(bytes) as f64,
            ScalarType::UInt32 => LittleEndian::read_u32(bytes) as f64,
            ScalarType::Float32 => LittleEndian::read_f32(bytes) as f64,
            ScalarType::Float64 => LittleEndian::read_f64(bytes),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct PlyProperty {
    name: String,
    scalar: ScalarType,
}

#[derive(Debug)]
struct PlyHeader {
    format: PlyFormat,
    vertex_count: usize,
    properties: Vec<PlyProperty>,
}

impl PlyHeader {
    fn index_of(&self, name: &str) -> Option<usize> {
        self.properties.iter().position(|p| p.name == name)
    }

    fn row_size(&self) -> usize {
        self.properties.iter().map(|p| p.scalar.size()).sum()
    }
}

// Only the vertex element is read, and it has to come first so binary bodies
// can be consumed without knowing the layout of the other elements.
fn parse_header<R: BufRead>(reader: &mut R) -> Result<PlyHeader, String> {
    let mut line = String::new();
    let mut is_ply = false;
    let mut format = None;
    let mut vertex_count = None;
    let mut in_vertex_element = false;
    let mut properties = Vec::new();

    loop {
        line.clear();
        if reader.read_line(&mut line).map_err(|e| e.to_string())? == 0 {
            return Err("unexpected end of file before end_header".to_string());
        }
        let trimmed = line.trim();
        let parts: Vec<&str> = trimmed.split_whitespace().collect();

        match parts.as_slice() {
            ["ply"] => is_ply = true,
            ["end_header"] => break,
            ["comment", ..] | ["obj_info", ..] | [] => {}
            ["format", "ascii", ..] => format = Some(PlyFormat::Ascii),
            ["format", "binary_little_endian", ..] => format = Some(PlyFormat::BinaryLittleEndian),
            ["format", other, ..] => return Err(format!("unsupported format {}", other)),
            ["element", "vertex", count] => {
                if vertex_count.is_some() || in_vertex_element {
                    return Err("duplicate vertex element".to_string());
                }
                let count = count
                    .parse::<usize>()
                    .map_err(|_| format!("invalid vertex count {:?}", count))?;
                vertex_count = Some(count);
                in_vertex_element = true;
            }
            ["element", name, _] => {
                if vertex_count.is_none() {
                    return Err(format!("element {:?} precedes the vertex element", name));
                }
                in_vertex_element = false;
            }
            ["property", "list", ..] if in_vertex_element => {
                return Err("list properties on vertices are not supported".to_string());
            }
            ["property", type_str, name] if in_vertex_element => {
                let scalar = ScalarType::parse(type_str)
                    .ok_or_else(|| format!("unsupported property type {:?}", type_str))?;
                properties.push(PlyProperty {
                    name: name.to_string(),
                    scalar,
                });
            }
            ["property", ..] => {}
            _ => return Err(format!("unexpected header line {:?}", trimmed)),
        }
    }

    if !is_ply {
        return Err("missing ply magic".to_string());
    }
    let format = format.ok_or("missing format line")?;
    let vertex_count = vertex_count.ok_or("missing vertex element")?;

    Ok(PlyHeader {
        format,
        vertex_count,
        properties,
    })
}

// Upper bound on the allocation made from the header's vertex count before any data is read.
const MAX_PREALLOCATED_VERTICES: usize = 1 << 20;

fn read_vertices<R: BufRead>(reader: &mut R, header: &PlyHeader) -> Result<Vec<Point>, String> {
    let missing = |axis: &str| format!("vertex property {:?} is missing", axis);
    let ix = header.index_of("x").ok_or_else(|| missing("x"))?;
    let iy = header.index_of("y").ok_or_else(|| missing("y"))?;
    let iz = header.index_of("z").ok_or_else(|| missing("z"))?;
    let intensity = header.index_of("intensity");

    let to_point = |values: &[f64]| {
        Point::new(
            values[ix],
            values[iy],
            values[iz],
            intensity.map(|i| values[i] as f32).unwrap_or(0.0),
        )
    };

    let mut points = Vec::with_capacity(header.vertex_count.min(MAX_PREALLOCATED_VERTICES));
    let mut values = vec![0.0; header.properties.len()];

    match header.format {
        PlyFormat::BinaryLittleEndian => {
            let mut buffer = vec![0u8; header.row_size()];
            for _ in 0..header.vertex_count {
                reader
                    .read_exact(&mut buffer)
                    .map_err(|e| format!("truncated vertex data: {}", e))?;
                let mut offset = 0;
                for (value, property) in values.iter_mut().zip(&header.properties) {
                    let size = property.scalar.size();
                    *value = property.scalar.read_le(&buffer[offset..offset + size]);
                    offset += size;
                }
                points.push(to_point(&values));
            }
        }
        PlyFormat::Ascii => {
            let mut line = String::new();
            while points.len() < header.vertex_count {
                line.clear();
                if reader.read_line(&mut line).map_err(|e| e.to_string())? == 0 {
                    return Err(format!(
                        "expected {} vertices, found {}",
                        header.vertex_count,
                        points.len()
                    ));
                }
                let tokens: Vec<&str> = line.split_whitespace().collect();
                if tokens.is_empty() {
                    continue;
                }
                if tokens.len() < values.len() {
                    return Err(format!("vertex {} has too few values", points.len()));
                }
                for (value, token) in values.iter_mut().zip(&tokens) {
                    *value = token
                        .parse::<f64>()
                        .map_err(|_| format!("invalid vertex value {:?}", token))?;
                }
                points.push(to_point(&values));
            }
        }
    }

    Ok(points)
}

fn read_ply_points(path: &Path) -> Result<Vec<Point>, PointCloudError> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    let ply_error = |message: String| PointCloudError::Ply {
        path: path.to_path_buf(),
        message,
    };

    let header = parse_header(&mut reader).map_err(ply_error)?;
    read_vertices(&mut reader, &header).map_err(ply_error)
}

/// Reads the vertices of an ASCII or little-endian binary PLY file.
///
/// `x`, `y` and `z` are required; `intensity` is used when present and
/// defaults to 0. Other vertex properties are skipped.
pub fn read_ply(path: &Path) -> Result<PointCloud, PointCloudError> {
    Ok(PointCloud::new(read_ply_points(path)?))
}
