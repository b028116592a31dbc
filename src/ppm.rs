//! Binary (P6) and ASCII (P3) PPM reading and writing.
//!
//! Shared by the texture loader (`texture::Texture::load_ppm`, always P6)
//! and the image writer (`render::write_image`, P6 by default with an
//! ASCII P3 alternative).

use std::fmt;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::Path;

#[derive(Debug)]
pub enum PpmError {
    Io(io::Error),
    BadMagic(String),
    MalformedHeader,
    TruncatedData { expected: usize, got: usize },
}

impl fmt::Display for PpmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PpmError::Io(e) => write!(f, "I/O error: {e}"),
            PpmError::BadMagic(m) => write!(f, "unsupported PPM magic {m:?} (expected P6)"),
            PpmError::MalformedHeader => write!(f, "malformed PPM header"),
            PpmError::TruncatedData { expected, got } => {
                write!(f, "truncated PPM data: expected {expected} bytes, got {got}")
            }
        }
    }
}

impl std::error::Error for PpmError {}

impl From<io::Error> for PpmError {
    fn from(e: io::Error) -> Self {
        PpmError::Io(e)
    }
}

/// Reads the next whitespace-delimited token from a PPM header, skipping
/// `#`-prefixed comment lines as the format allows.
fn read_token(reader: &mut impl BufRead) -> Result<String, PpmError> {
    let mut token = String::new();
    loop {
        let mut byte = [0u8; 1];
        if reader.read(&mut byte)? == 0 {
            return Err(PpmError::MalformedHeader);
        }
        let c = byte[0] as char;
        if c == '#' {
            let mut line = String::new();
            reader.read_line(&mut line)?;
            continue;
        }
        if c.is_whitespace() {
            if token.is_empty() {
                continue;
            }
            return Ok(token);
        }
        token.push(c);
    }
}

/// Reads a binary P6 PPM from disk. Returns `(width, height, rgb_bytes)`.
pub fn read_ppm(path: &Path) -> Result<(u32, u32, Vec<u8>), PpmError> {
    let file = std::fs::File::open(path)?;
    let mut reader = BufReader::new(file);

    let magic = read_token(&mut reader)?;
    if magic != "P6" {
        return Err(PpmError::BadMagic(magic));
    }
    let width: u32 = read_token(&mut reader)?
        .parse()
        .map_err(|_| PpmError::MalformedHeader)?;
    let height: u32 = read_token(&mut reader)?
        .parse()
        .map_err(|_| PpmError::MalformedHeader)?;
    let maxval: u32 = read_token(&mut reader)?
        .parse()
        .map_err(|_| PpmError::MalformedHeader)?;
    if maxval != 255 {
        return Err(PpmError::MalformedHeader);
    }

    let expected = (width as usize) * (height as usize) * 3;
    let mut data = vec![0u8; expected];
    reader.read_exact(&mut data).map_err(|_| PpmError::TruncatedData {
        expected,
        got: 0,
    })?;

    Ok((width, height, data))
}

/// Writes a binary P6 PPM. `pixels` is a flat row-major RGB byte buffer,
/// top row first, left-to-right within a row.
pub fn write_ppm_binary(path: &Path, width: u32, height: u32, pixels: &[u8]) -> io::Result<()> {
    let mut file = io::BufWriter::new(std::fs::File::create(path)?);
    write!(file, "P6\n{width} {height}\n255\n")?;
    file.write_all(pixels)?;
    file.flush()
}

/// Writes an ASCII P3 PPM, the permitted alternative raster encoding.
pub fn write_ppm_ascii(path: &Path, width: u32, height: u32, pixels: &[u8]) -> io::Result<()> {
    let mut file = io::BufWriter::new(std::fs::File::create(path)?);
    writeln!(file, "P3")?;
    writeln!(file, "{width} {height}")?;
    writeln!(file, "255")?;
    for chunk in pixels.chunks_exact(3) {
        writeln!(file, "{} {} {}", chunk[0], chunk[1], chunk[2])?;
    }
    file.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn read_token_skips_comments() {
        let data = b"P6\n# a comment\n4 3\n255\n";
        let mut cursor = Cursor::new(&data[..]);
        assert_eq!(read_token(&mut cursor).unwrap(), "P6");
        assert_eq!(read_token(&mut cursor).unwrap(), "4");
        assert_eq!(read_token(&mut cursor).unwrap(), "3");
        assert_eq!(read_token(&mut cursor).unwrap(), "255");
    }

    #[test]
    fn round_trips_binary() {
        let dir = std::env::temp_dir();
        let path = dir.join(format!("photon_test_{}.ppm", std::process::id()));
        let pixels = vec![10u8, 20, 30, 40, 50, 60];
        write_ppm_binary(&path, 2, 1, &pixels).unwrap();
        let (w, h, data) = read_ppm(&path).unwrap();
        let _ = std::fs::remove_file(&path);
        assert_eq!((w, h), (2, 1));
        assert_eq!(data, pixels);
    }
}
