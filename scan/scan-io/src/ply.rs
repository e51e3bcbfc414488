//! PLY (Polygon File Format) writers for clouds and meshes.
//!
//! Point clouds are written as a `vertex` element with `x`, `y`, `z` doubles
//! and `red`, `green`, `blue` uchars. Meshes add `nx`, `ny`, `nz` when the
//! mesh carries vertex normals (as floats), plus a `face` element with
//! `vertex_indices`.
//!
//! # Format Variants
//!
//! - **ASCII** - Written through `ply-rs`
//! - **Binary Little Endian** - Written directly, compact and fast
//!
//! # Example
//!
//! ```no_run
//! use scan_io::{load_mesh_ply, save_mesh_ply};
//!
//! let mesh = load_mesh_ply("output_mesh.ply").unwrap();
//! save_mesh_ply(&mesh, "copy.ply", true).unwrap(); // Binary
//! ```

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use nalgebra::Vector3;
use ply_rs::parser::Parser;
use ply_rs::ply::{
    Addable, DefaultElement, ElementDef, Encoding, Ply, Property, PropertyDef, PropertyType,
    ScalarType,
};
use ply_rs::writer::Writer;
use scan_types::{Point3, PointCloud, PointRecord, RecordColor, TriangleMesh};
use tracing::debug;

use crate::error::{IoError, IoResult};

const GENERATOR: &str = "Generated by scan2viz scan-io";

/// Save a colored point cloud to a PLY file.
///
/// Colors are stored as 8-bit channels, rounded from the normalized values.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn save_point_cloud_ply<P: AsRef<Path>>(
    cloud: &PointCloud,
    path: P,
    binary: bool,
) -> IoResult<()> {
    let path = path.as_ref();
    let mut writer = BufWriter::new(File::create(path)?);

    if binary {
        write_cloud_binary(cloud, &mut writer)?;
    } else {
        write_cloud_ascii(cloud, &mut writer)?;
    }
    writer.flush()?;

    debug!(path = %path.display(), points = cloud.len(), binary, "wrote point cloud PLY");
    Ok(())
}

/// Save a triangle mesh to a PLY file.
///
/// Vertex normals are written when present.
///
/// # Errors
///
/// Returns an error if the file cannot be written, or if a vertex index does
/// not fit the PLY `int` type.
pub fn save_mesh_ply<P: AsRef<Path>>(mesh: &TriangleMesh, path: P, binary: bool) -> IoResult<()> {
    let path = path.as_ref();
    let mut writer = BufWriter::new(File::create(path)?);

    if binary {
        write_mesh_binary(mesh, &mut writer)?;
    } else {
        write_mesh_ascii(mesh, &mut writer)?;
    }
    writer.flush()?;

    debug!(
        path = %path.display(),
        vertices = mesh.vertex_count(),
        triangles = mesh.triangle_count(),
        binary,
        "wrote mesh PLY"
    );
    Ok(())
}

/// Load a triangle mesh from a PLY file.
///
/// Polygons with more than three corners are fan-triangulated. Normals are
/// loaded when every vertex has `nx`, `ny`, `nz`.
///
/// # Errors
///
/// Returns an error if:
/// - The file cannot be read
/// - The file is not valid PLY
/// - A face references a missing vertex
pub fn load_mesh_ply<P: AsRef<Path>>(path: P) -> IoResult<TriangleMesh> {
    let payload = read_ply(path.as_ref())?.payload;
    let mut mesh = TriangleMesh::new();

    if let Some(vertex_elements) = payload.get("vertex") {
        mesh.vertices.reserve(vertex_elements.len());
        let mut normals = Vec::with_capacity(vertex_elements.len());
        for element in vertex_elements {
            mesh.vertices.push(read_position(element));
            normals.push(
                match (
                    get_float_property(element, "nx"),
                    get_float_property(element, "ny"),
                    get_float_property(element, "nz"),
                ) {
                    (Some(x), Some(y), Some(z)) => Some(Vector3::new(x, y, z)),
                    _ => None,
                },
            );
        }
        if !normals.is_empty() {
            mesh.vertex_normals = normals.into_iter().collect();
        }
    }

    if let Some(face_elements) = payload.get("face") {
        mesh.triangles.reserve(face_elements.len());
        for element in face_elements {
            let indices = get_index_list(element)?;
            if indices.len() >= 3 {
                for i in 1..indices.len() - 1 {
                    mesh.triangles.push([indices[0], indices[i], indices[i + 1]]);
                }
            }
        }
    }

    mesh.validate().map_err(|e| IoError::invalid_content(e.to_string()))?;
    Ok(mesh)
}

/// Load a colored point cloud from a PLY file.
///
/// Vertices without color properties get [`RecordColor::NEUTRAL`].
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not valid PLY.
pub fn load_point_cloud_ply<P: AsRef<Path>>(path: P) -> IoResult<PointCloud> {
    let payload = read_ply(path.as_ref())?.payload;
    let mut cloud = PointCloud::new();

    if let Some(vertex_elements) = payload.get("vertex") {
        cloud.reserve(vertex_elements.len());
        for element in vertex_elements {
            let color = match (
                get_uchar_property(element, "red"),
                get_uchar_property(element, "green"),
                get_uchar_property(element, "blue"),
            ) {
                (Some(r), Some(g), Some(b)) => RecordColor::new(r, g, b),
                _ => RecordColor::NEUTRAL,
            };
            cloud.push(PointRecord::new(read_position(element), color));
        }
    }

    Ok(cloud)
}

// =============================================================================
// Reading
// =============================================================================

fn read_ply(path: &Path) -> IoResult<Ply<DefaultElement>> {
    let file = File::open(path).map_err(|e| IoError::from_open(path, e))?;
    let mut reader = BufReader::new(file);

    Parser::<DefaultElement>::new()
        .read_ply(&mut reader)
        .map_err(|e| IoError::invalid_content(format!("failed to parse PLY: {e}")))
}

fn read_position(element: &DefaultElement) -> Point3<f64> {
    Point3::new(
        get_float_property(element, "x").unwrap_or(0.0),
        get_float_property(element, "y").unwrap_or(0.0),
        get_float_property(element, "z").unwrap_or(0.0),
    )
}

fn get_float_property(element: &DefaultElement, key: &str) -> Option<f64> {
    match element.get(key)? {
        Property::Float(v) => Some(f64::from(*v)),
        Property::Double(v) => Some(*v),
        _ => None,
    }
}

fn get_uchar_property(element: &DefaultElement, key: &str) -> Option<u8> {
    match element.get(key)? {
        Property::UChar(v) => Some(*v),
        _ => None,
    }
}

fn get_index_list(element: &DefaultElement) -> IoResult<Vec<u32>> {
    fn convert<T: Copy>(values: &[T]) -> IoResult<Vec<u32>>
    where
        u32: TryFrom<T>,
    {
        values
            .iter()
            .map(|&i| {
                u32::try_from(i).map_err(|_| IoError::invalid_content("negative face index"))
            })
            .collect()
    }

    for key in ["vertex_indices", "vertex_index"] {
        if let Some(prop) = element.get(key) {
            return match prop {
                Property::ListInt(v) => convert(v),
                Property::ListUInt(v) => Ok(v.clone()),
                Property::ListUChar(v) => convert(v),
                Property::ListChar(v) => convert(v),
                Property::ListShort(v) => convert(v),
                Property::ListUShort(v) => convert(v),
                _ => continue,
            };
        }
    }
    Ok(Vec::new())
}

// =============================================================================
// Writing
// =============================================================================

#[allow(clippy::cast_possible_truncation)]
fn f32_bytes(v: f64) -> [u8; 4] {
    (v as f32).to_le_bytes()
}

fn write_position<W: Write>(writer: &mut W, p: &Point3<f64>) -> IoResult<()> {
    writer.write_all(&p.x.to_le_bytes())?;
    writer.write_all(&p.y.to_le_bytes())?;
    writer.write_all(&p.z.to_le_bytes())?;
    Ok(())
}

fn face_indices(face: [u32; 3]) -> IoResult<[i32; 3]> {
    let convert = |i: u32| {
        i32::try_from(i)
            .map_err(|_| IoError::invalid_content(format!("vertex index {i} exceeds PLY int")))
    };
    Ok([convert(face[0])?, convert(face[1])?, convert(face[2])?])
}

/// Binary little-endian is written by hand: ply-rs writes the element count
/// instead of the list length for binary list properties.
fn write_cloud_binary<W: Write>(cloud: &PointCloud, writer: &mut W) -> IoResult<()> {
    writeln!(writer, "ply")?;
    writeln!(writer, "format binary_little_endian 1.0")?;
    writeln!(writer, "comment {GENERATOR}")?;
    writeln!(writer, "element vertex {}", cloud.len())?;
    for axis in ["x", "y", "z"] {
        writeln!(writer, "property double {axis}")?;
    }
    for channel in ["red", "green", "blue"] {
        writeln!(writer, "property uchar {channel}")?;
    }
    writeln!(writer, "end_header")?;

    for (p, c) in cloud.iter() {
        write_position(writer, p)?;
        let color = RecordColor::from_normalized(c);
        writer.write_all(&[color.r, color.g, color.b])?;
    }

    Ok(())
}

fn write_mesh_binary<W: Write>(mesh: &TriangleMesh, writer: &mut W) -> IoResult<()> {
    writeln!(writer, "ply")?;
    writeln!(writer, "format binary_little_endian 1.0")?;
    writeln!(writer, "comment {GENERATOR}")?;
    writeln!(writer, "element vertex {}", mesh.vertex_count())?;
    for axis in ["x", "y", "z"] {
        writeln!(writer, "property double {axis}")?;
    }
    if mesh.has_normals() {
        for axis in ["nx", "ny", "nz"] {
            writeln!(writer, "property float {axis}")?;
        }
    }
    writeln!(writer, "element face {}", mesh.triangle_count())?;
    writeln!(writer, "property list uchar int vertex_indices")?;
    writeln!(writer, "end_header")?;

    for (i, p) in mesh.vertices.iter().enumerate() {
        write_position(writer, p)?;
        if let Some(n) = mesh.vertex_normals.as_ref().and_then(|normals| normals.get(i)) {
            writer.write_all(&f32_bytes(n.x))?;
            writer.write_all(&f32_bytes(n.y))?;
            writer.write_all(&f32_bytes(n.z))?;
        }
    }

    for &face in &mesh.triangles {
        writer.write_all(&[3u8])?;
        for index in face_indices(face)? {
            writer.write_all(&index.to_le_bytes())?;
        }
    }

    Ok(())
}

fn scalar(name: &str, scalar_type: ScalarType) -> PropertyDef {
    PropertyDef::new(name.to_string(), PropertyType::Scalar(scalar_type))
}

fn ascii_ply() -> Ply<DefaultElement> {
    let mut ply = Ply::<DefaultElement>::new();
    ply.header.encoding = Encoding::Ascii;
    ply.header.comments.push(GENERATOR.to_string());
    ply
}

#[allow(clippy::cast_possible_truncation)]
fn float(v: f64) -> Property {
    Property::Float(v as f32)
}

fn write_ascii<W: Write>(ply: &mut Ply<DefaultElement>, writer: &mut W) -> IoResult<()> {
    Writer::new()
        .write_ply(writer, ply)
        .map_err(|e| IoError::invalid_content(format!("failed to write PLY: {e}")))?;
    Ok(())
}

fn write_cloud_ascii<W: Write>(cloud: &PointCloud, writer: &mut W) -> IoResult<()> {
    let mut ply = ascii_ply();

    let mut vertex_def = ElementDef::new("vertex".to_string());
    for axis in ["x", "y", "z"] {
        vertex_def.properties.add(scalar(axis, ScalarType::Double));
    }
    for channel in ["red", "green", "blue"] {
        vertex_def.properties.add(scalar(channel, ScalarType::UChar));
    }
    vertex_def.count = cloud.len();
    ply.header.elements.add(vertex_def);

    let vertex_elements = cloud
        .iter()
        .map(|(p, c)| {
            let color = RecordColor::from_normalized(c);
            let mut element = DefaultElement::new();
            element.insert("x".to_string(), Property::Double(p.x));
            element.insert("y".to_string(), Property::Double(p.y));
            element.insert("z".to_string(), Property::Double(p.z));
            element.insert("red".to_string(), Property::UChar(color.r));
            element.insert("green".to_string(), Property::UChar(color.g));
            element.insert("blue".to_string(), Property::UChar(color.b));
            element
        })
        .collect();
    ply.payload.insert("vertex".to_string(), vertex_elements);

    write_ascii(&mut ply, writer)
}

fn write_mesh_ascii<W: Write>(mesh: &TriangleMesh, writer: &mut W) -> IoResult<()> {
    let mut ply = ascii_ply();
    let normals = mesh.vertex_normals.as_deref();

    let mut vertex_def = ElementDef::new("vertex".to_string());
    for axis in ["x", "y", "z"] {
        vertex_def.properties.add(scalar(axis, ScalarType::Double));
    }
    if normals.is_some() {
        for axis in ["nx", "ny", "nz"] {
            vertex_def.properties.add(scalar(axis, ScalarType::Float));
        }
    }
    vertex_def.count = mesh.vertex_count();
    ply.header.elements.add(vertex_def);

    let mut face_def = ElementDef::new("face".to_string());
    face_def.properties.add(PropertyDef::new(
        "vertex_indices".to_string(),
        PropertyType::List(ScalarType::UChar, ScalarType::Int),
    ));
    face_def.count = mesh.triangle_count();
    ply.header.elements.add(face_def);

    let mut vertex_elements = Vec::with_capacity(mesh.vertex_count());
    for (i, p) in mesh.vertices.iter().enumerate() {
        let mut element = DefaultElement::new();
        element.insert("x".to_string(), Property::Double(p.x));
        element.insert("y".to_string(), Property::Double(p.y));
        element.insert("z".to_string(), Property::Double(p.z));
        if let Some(n) = normals.and_then(|normals| normals.get(i)) {
            element.insert("nx".to_string(), float(n.x));
            element.insert("ny".to_string(), float(n.y));
            element.insert("nz".to_string(), float(n.z));
        }
        vertex_elements.push(element);
    }
    ply.payload.insert("vertex".to_string(), vertex_elements);

    let mut face_elements = Vec::with_capacity(mesh.triangle_count());
    for &face in &mesh.triangles {
        let mut element = DefaultElement::new();
        element.insert(
            "vertex_indices".to_string(),
            Property::ListInt(face_indices(face)?.to_vec()),
        );
        face_elements.push(element);
    }
    ply.payload.insert("face".to_string(), face_elements);

    write_ascii(&mut ply, writer)
}
