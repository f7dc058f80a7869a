use std::{
    fs::{self, File},
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
};

use byteorder::{ByteOrder as _, LittleEndian, WriteBytesExt as _};

use obb_core::pointcloud::point::{Point, PointCloud};

use super::{Parser, ParserProvider, PointCloudError};

const FIELDS_PER_POINT: usize = 4;
const BYTES_PER_POINT: usize = FIELDS_PER_POINT * 4;

pub struct BinParserProvider {
    pub filenames: Vec<PathBuf>,
}

impl ParserProvider for BinParserProvider {
    fn get_parser(&self) -> Box<dyn Parser> {
        Box::new(BinParser {
            filenames: self.filenames.clone(),
        })
    }
}

/// Reads flat `x y z intensity` f32 scans; several files are concatenated.
pub struct BinParser {
    pub filenames: Vec<PathBuf>,
}

impl Parser for BinParser {
    fn parse(&self) -> Result<PointCloud, PointCloudError> {
        let mut points = Vec::new();
        for filename in &self.filenames {
            points.extend(read_bin_points(filename)?);
        }
        Ok(PointCloud::new(points))
    }
}

fn read_bin_points(path: &Path) -> Result<Vec<Point>, PointCloudError> {
    let bytes = fs::read(path)?;
    if bytes.len() % BYTES_PER_POINT != 0 {
        return Err(PointCloudError::TruncatedBin {
            path: path.to_path_buf(),
            len: bytes.len(),
        });
    }

    let mut values = vec![0f32; bytes.len() / 4];
    LittleEndian::read_f32_into(&bytes, &mut values);

    Ok(values
        .chunks_exact(FIELDS_PER_POINT)
        .map(|row| Point::new(row[0] as f64, row[1] as f64, row[2] as f64, row[3]))
        .collect())
}

pub fn read_bin(path: &Path) -> Result<PointCloud, PointCloudError> {
    Ok(PointCloud::new(read_bin_points(path)?))
}

pub fn write_points<W: Write>(writer: W, point_cloud: &PointCloud) -> io::Result<()> {
    let mut writer = BufWriter::new(writer);
    for point in &point_cloud.points {
        writer.write_f32::<LittleEndian>(point.x as f32)?;
        writer.write_f32::<LittleEndian>(point.y as f32)?;
        writer.write_f32::<LittleEndian>(point.z as f32)?;
        writer.write_f32::<LittleEndian>(point.intensity)?;
    }
    writer.flush()
}

pub fn write_bin(path: &Path, point_cloud: &PointCloud) -> Result<(), PointCloudError> {
    let file = File::create(path)?;
    write_points(file, point_cloud)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn f32_bytes(values: &[f32]) -> Vec<u8> {
        values.iter().flat_map(|v| v.to_le_bytes()).collect()
    }

    #[test]
    fn test_read_bin() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.bin");
        fs::write(
            &path,
            f32_bytes(&[1.0, 2.0, 3.0, 0.5, -1.0, -2.0, -3.0, 0.0]),
        )
        .unwrap();

        let pc = read_bin(&path).unwrap();
        assert_eq!(pc.len(), 2);
        assert_eq!(pc.points[0], Point::new(1.0, 2.0, 3.0, 0.5));
        assert_eq!(pc.points[1].xyz(), [-1.0, -2.0, -3.0]);
        assert_eq!(pc.z_range(), Some((-3.0, 3.0)));
    }

    #[test]
    fn test_read_bin_rejects_partial_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.bin");
        fs::write(&path, f32_bytes(&[1.0, 2.0, 3.0])).unwrap();

        assert!(matches!(
            read_bin(&path),
            Err(PointCloudError::TruncatedBin { len: 12, .. })
        ));
    }

    #[test]
    fn test_write_then_read_bin() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.bin");
        let pc = PointCloud::new(vec![
            Point::new(0.25, 0.5, 0.75, 1.0),
            Point::new(10.0, 20.0, 30.0, 0.0),
        ]);

        write_bin(&path, &pc).unwrap();
        assert_eq!(fs::metadata(&path).unwrap().len(), 32);
        assert_eq!(read_bin(&path).unwrap().points, pc.points);
    }

    #[test]
    fn test_provider_concatenates_files() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.bin");
        let b = dir.path().join("b.bin");
        fs::write(&a, f32_bytes(&[1.0, 1.0, 1.0, 0.0])).unwrap();
        fs::write(&b, f32_bytes(&[2.0, 2.0, 2.0, 0.0])).unwrap();

        let provider = BinParserProvider {
            filenames: vec![a, b],
        };
        let pc = provider.get_parser().parse().unwrap();
        assert_eq!(pc.len(), 2);
        assert_eq!(pc.points[1].x, 2.0);
    }
}
