//! File ingest and output. SDF is the only molecule format here; both ends of the
//! pipeline accept gzipped files, selected by a `.gz` extension.

use std::{
    fs::File,
    io,
    io::{BufRead, BufReader, BufWriter, Write},
    path::Path,
};

use flate2::{Compression, read::GzDecoder, write::GzEncoder};

pub mod sdf;

fn is_gzipped(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("gz"))
        .unwrap_or(false)
}

/// Open a file for reading, transparently decompressing if the path ends in `.gz`.
pub fn open_for_reading(path: &Path) -> io::Result<Box<dyn BufRead>> {
    let file = File::open(path)?;

    if is_gzipped(path) {
        Ok(Box::new(BufReader::new(GzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

/// Open a file for writing, compressing if the path ends in `.gz`.
pub fn open_for_writing(path: &Path) -> io::Result<Box<dyn Write>> {
    let file = File::create(path)?;

    if is_gzipped(path) {
        Ok(Box::new(BufWriter::new(GzEncoder::new(
            file,
            Compression::default(),
        ))))
    } else {
        Ok(Box::new(BufWriter::new(file)))
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn gz_by_extension() {
        assert!(is_gzipped(&PathBuf::from("ligands.sdf.gz")));
        assert!(is_gzipped(&PathBuf::from("ligands.SDF.GZ")));
        assert!(!is_gzipped(&PathBuf::from("ligands.sdf")));
        assert!(!is_gzipped(&PathBuf::from("ligands")));
    }

    #[test]
    fn gz_roundtrip() {
        let path = std::env::temp_dir().join("sucos_gz_roundtrip.txt.gz");

        {
            let mut w = open_for_writing(&path).unwrap();
            w.write_all(b"hello\n").unwrap();
            w.flush().unwrap();
        }

        let mut r = open_for_reading(&path).unwrap();
        let mut line = String::new();
        r.read_line(&mut line).unwrap();
        assert_eq!(line, "hello\n");

        std::fs::remove_file(&path).ok();
    }
}
