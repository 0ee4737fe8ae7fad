use crate::types::{SarComplex, SarError, SarImage, SarResult};
use ndarray::{Array2, ArrayViewMut1, Axis};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{ErrorKind, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Number of lines in the PALSAR L1.1 product variant
pub const PALSAR_L11_LINE_COUNT: usize = 18432;

/// Bytes per complex sample: one f32 for I, one for Q
const BYTES_PER_SAMPLE: usize = 8;

/// Byte order of the binary sample words
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ByteOrder {
    BigEndian,
    LittleEndian,
}

impl ByteOrder {
    fn decode_f32(self, word: [u8; 4]) -> f32 {
        match self {
            ByteOrder::BigEndian => f32::from_be_bytes(word),
            ByteOrder::LittleEndian => f32::from_le_bytes(word),
        }
    }
}

/// How the number of image lines is determined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LineCount {
    /// Read exactly this many records
    Fixed(usize),
    /// Trust the lines-per-data-set field of the file descriptor
    FromHeader,
    /// `(file_size - data_start_offset) / record_length`
    FromFileSize,
}

/// Record layout of a CEOS image file
///
/// The default is the ALOS-PALSAR Level-1.1 SLC layout. Offsets refer to the
/// image file descriptor record at the start of the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductLayout {
    /// Offset of the ASCII field holding the number of range pixels per line
    pub pixel_count_offset: u64,
    /// Offset of the ASCII field holding the number of lines per data set
    pub line_count_field_offset: u64,
    /// Width in bytes of the ASCII header fields
    pub header_field_width: usize,
    /// Offset of the first signal data record
    pub data_start_offset: u64,
    /// Per-record prefix skipped before the sample data
    pub prefix_bytes: usize,
    /// Byte order of the f32 sample words
    pub sample_byte_order: ByteOrder,
    /// Source of the line count
    pub line_count: LineCount,
}

impl Default for ProductLayout {
    fn default() -> Self {
        Self {
            pixel_count_offset: 248,
            line_count_field_offset: 236,
            header_field_width: 8,
            data_start_offset: 720,
            prefix_bytes: 412,
            sample_byte_order: ByteOrder::BigEndian,
            line_count: LineCount::Fixed(PALSAR_L11_LINE_COUNT),
        }
    }
}

impl ProductLayout {
    /// Length in bytes of one signal data record
    pub fn record_length(&self, pixel_count: usize) -> SarResult<usize> {
        pixel_count
            .checked_mul(BYTES_PER_SAMPLE)
            .and_then(|bytes| bytes.checked_add(self.prefix_bytes))
            .ok_or_else(|| SarError::InvalidFormat(format!(
                "Record length overflows for {} pixels", pixel_count
            )))
    }
}

/// Fields decoded from the image file descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductHeader {
    /// Range pixels per line
    pub pixel_count: usize,
    /// Lines per data set as recorded in the descriptor
    pub header_line_count: usize,
    /// Bytes per signal data record, prefix included
    pub record_length: usize,
}

/// ALOS-PALSAR L1.1 SLC image file reader
#[derive(Debug, Clone)]
pub struct PalsarReader {
    path: PathBuf,
    layout: ProductLayout,
}

impl PalsarReader {
    /// Create a reader using the PALSAR L1.1 layout
    pub fn new<P: AsRef<Path>>(path: P) -> SarResult<Self> {
        Self::with_layout(path, ProductLayout::default())
    }

    /// Create a reader for an alternate record layout
    pub fn with_layout<P: AsRef<Path>>(path: P, layout: ProductLayout) -> SarResult<Self> {
        let path = path.as_ref().to_path_buf();

        if !path.exists() {
            return Err(SarError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("File not found: {}", path.display()),
            )));
        }

        Ok(Self { path, layout })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn layout(&self) -> &ProductLayout {
        &self.layout
    }

    /// Decode the image file descriptor fields
    pub fn read_header(&self) -> SarResult<ProductHeader> {
        let mut file = File::open(&self.path)?;
        self.parse_header(&mut file)
    }

    /// Read the complete SLC image as a (line x pixel) complex matrix
    ///
    /// Either every line is decoded or an error is returned; a short file is
    /// never zero-padded.
    pub fn read_slc_data(&self) -> SarResult<SarImage> {
        log::info!("Reading SLC data from {}", self.path.display());
        let start_time = std::time::Instant::now();

        let (header, line_count, payload) = {
            let mut file = File::open(&self.path)?;
            let header = self.parse_header(&mut file)?;
            let file_size = file.metadata()?.len();
            let line_count = self.resolve_line_count(&header, file_size)?;
            log::debug!(
                "Layout: {} pixels/line, {} lines (descriptor says {}), record length {} bytes",
                header.pixel_count, line_count, header.header_line_count, header.record_length
            );

            let payload_len = self.payload_length(&header, line_count)?;
            let available = file_size.saturating_sub(self.layout.data_start_offset);
            if available < payload_len as u64 {
                return Err(SarError::TruncatedFile {
                    expected: payload_len as u64,
                    available,
                });
            }

            file.seek(SeekFrom::Start(self.layout.data_start_offset))?;
            let mut payload = vec![0u8; payload_len];
            file.read_exact(&mut payload).map_err(|e| match e.kind() {
                ErrorKind::UnexpectedEof => SarError::TruncatedFile {
                    expected: payload_len as u64,
                    available,
                },
                _ => SarError::Io(e),
            })?;

            (header, line_count, payload)
        };
        let read_time = start_time.elapsed();

        let slc = self.decode_records(&payload, &header, line_count);

        log::info!(
            "SLC data read complete: {} lines x {} pixels in {:?} (I/O {:?})",
            line_count, header.pixel_count, start_time.elapsed(), read_time
        );

        Ok(slc)
    }

    fn parse_header<R: Read + Seek>(&self, reader: &mut R) -> SarResult<ProductHeader> {
        let file_size = reader.seek(SeekFrom::End(0))?;
        let width = self.layout.header_field_width;

        let pixel_count = read_decimal_field(
            reader, file_size, self.layout.pixel_count_offset, width, "pixel count",
        )?;
        let header_line_count = read_decimal_field(
            reader, file_size, self.layout.line_count_field_offset, width, "line count",
        )?;
        let record_length = self.layout.record_length(pixel_count)?;

        Ok(ProductHeader {
            pixel_count,
            header_line_count,
            record_length,
        })
    }

    fn resolve_line_count(&self, header: &ProductHeader, file_size: u64) -> SarResult<usize> {
        match self.layout.line_count {
            LineCount::Fixed(lines) => Ok(lines),
            LineCount::FromHeader => Ok(header.header_line_count),
            LineCount::FromFileSize => {
                if header.record_length == 0 {
                    return Err(SarError::InvalidFormat(
                        "Zero-length records, cannot derive line count".to_string(),
                    ));
                }
                let available = file_size.saturating_sub(self.layout.data_start_offset);
                Ok((available / header.record_length as u64) as usize)
            }
        }
    }

    fn payload_length(&self, header: &ProductHeader, line_count: usize) -> SarResult<usize> {
        if self.layout.prefix_bytes % 4 != 0 {
            return Err(SarError::InvalidFormat(format!(
                "Record prefix of {} bytes is not a whole number of f32 words",
                self.layout.prefix_bytes
            )));
        }

        let payload_len = header
            .record_length
            .checked_mul(line_count)
            .ok_or_else(|| SarError::InvalidFormat(format!(
                "Payload size overflows for {} lines of {} bytes",
                line_count, header.record_length
            )))?;

        if payload_len % 4 != 0 {
            return Err(SarError::InvalidFormat(format!(
                "Payload of {} bytes is not a whole number of f32 words", payload_len
            )));
        }

        Ok(payload_len)
    }

    fn decode_records(&self, payload: &[u8], header: &ProductHeader, line_count: usize) -> SarImage {
        let mut slc = Array2::zeros((line_count, header.pixel_count));
        if line_count == 0 || header.pixel_count == 0 {
            return slc;
        }

        let prefix = self.layout.prefix_bytes;
        let order = self.layout.sample_byte_order;

        #[cfg(feature = "parallel")]
        {
            slc.axis_iter_mut(Axis(0))
                .into_par_iter()
                .zip(payload.par_chunks_exact(header.record_length))
                .for_each(|(line, record)| decode_line(record, prefix, order, line));
        }

        #[cfg(not(feature = "parallel"))]
        {
            for (line, record) in slc
                .axis_iter_mut(Axis(0))
                .zip(payload.chunks_exact(header.record_length))
            {
                decode_line(record, prefix, order, line);
            }
        }

        slc
    }
}

/// Read a PALSAR L1.1 SLC image file
pub fn read_product<P: AsRef<Path>>(path: P) -> SarResult<SarImage> {
    PalsarReader::new(path)?.read_slc_data()
}

/// Read an SLC image file with an alternate record layout
pub fn read_product_with_layout<P: AsRef<Path>>(path: P, layout: ProductLayout) -> SarResult<SarImage> {
    PalsarReader::with_layout(path, layout)?.read_slc_data()
}

/// Parse a right-justified ASCII decimal field
fn read_decimal_field<R: Read + Seek>(
    reader: &mut R,
    file_size: u64,
    offset: u64,
    width: usize,
    name: &str,
) -> SarResult<usize> {
    let end = offset + width as u64;
    if end > file_size {
        return Err(SarError::TruncatedFile {
            expected: end,
            available: file_size,
        });
    }

    reader.seek(SeekFrom::Start(offset))?;
    let mut field = vec![0u8; width];
    reader.read_exact(&mut field)?;

    std::str::from_utf8(&field)
        .ok()
        .map(str::trim)
        .and_then(|text| text.parse::<usize>().ok())
        .ok_or_else(|| SarError::InvalidFormat(format!(
            "{} field at offset {} is not a decimal integer: {:?}",
            name, offset, String::from_utf8_lossy(&field)
        )))
}

/// Deinterleave one record's I/Q words into a line of complex samples
fn decode_line(record: &[u8], prefix: usize, order: ByteOrder, mut line: ArrayViewMut1<SarComplex>) {
    let samples = &record[prefix..];
    for (pixel, word) in line.iter_mut().zip(samples.chunks_exact(BYTES_PER_SAMPLE)) {
        let i = order.decode_f32([word[0], word[1], word[2], word[3]]);
        let q = order.decode_f32([word[4], word[5], word[6], word[7]]);
        *pixel = SarComplex::new(i as f64, q as f64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn descriptor(pixels: &str, lines: &str) -> Vec<u8> {
        let mut bytes = vec![b' '; 720];
        bytes[236..244].copy_from_slice(lines.as_bytes());
        bytes[248..256].copy_from_slice(pixels.as_bytes());
        bytes
    }

    fn reader() -> PalsarReader {
        PalsarReader {
            path: PathBuf::from("unused"),
            layout: ProductLayout::default(),
        }
    }

    #[test]
    fn test_reader_creation_missing_file() {
        let result = PalsarReader::new("nonexistent.dat");
        assert!(matches!(result, Err(SarError::Io(_))));
    }

    #[test]
    fn test_parse_header_fields() {
        let mut cursor = Cursor::new(descriptor("   10400", "   18432"));
        let header = reader().parse_header(&mut cursor).unwrap();

        assert_eq!(header.pixel_count, 10400);
        assert_eq!(header.header_line_count, 18432);
        assert_eq!(header.record_length, 412 + 10400 * 8);
    }

    #[test]
    fn test_parse_header_rejects_non_numeric_field() {
        let mut cursor = Cursor::new(descriptor("   10x00", "   18432"));
        let result = reader().parse_header(&mut cursor);
        assert!(matches!(result, Err(SarError::InvalidFormat(_))));

        let mut cursor = Cursor::new(descriptor("        ", "   18432"));
        let result = reader().parse_header(&mut cursor);
        assert!(matches!(result, Err(SarError::InvalidFormat(_))));
    }

    #[test]
    fn test_parse_header_validates_line_count_field() {
        let mut cursor = Cursor::new(descriptor("      16", "  abc   "));
        let result = reader().parse_header(&mut cursor);
        assert!(matches!(result, Err(SarError::InvalidFormat(_))));
    }

    #[test]
    fn test_parse_header_short_file() {
        let mut cursor = Cursor::new(vec![b' '; 250]);
        let result = reader().parse_header(&mut cursor);
        assert!(matches!(
            result,
            Err(SarError::TruncatedFile { expected: 256, available: 250 })
        ));
    }

    #[test]
    fn test_decode_line_byte_orders() {
        let mut record = vec![0u8; 4];
        record.extend_from_slice(&1.5f32.to_be_bytes());
        record.extend_from_slice(&(-2.25f32).to_be_bytes());
        let mut line = ndarray::Array1::<SarComplex>::zeros(1);
        decode_line(&record, 4, ByteOrder::BigEndian, line.view_mut());
        assert_eq!(line[0], SarComplex::new(1.5, -2.25));

        let mut record = vec![0u8; 4];
        record.extend_from_slice(&0.5f32.to_le_bytes());
        record.extend_from_slice(&8.0f32.to_le_bytes());
        decode_line(&record, 4, ByteOrder::LittleEndian, line.view_mut());
        assert_eq!(line[0], SarComplex::new(0.5, 8.0));
    }

    #[test]
    fn test_payload_length_rejects_unaligned_prefix() {
        let layout = ProductLayout {
            prefix_bytes: 10,
            ..ProductLayout::default()
        };
        let reader = PalsarReader {
            path: PathBuf::from("unused"),
            layout,
        };
        let header = ProductHeader {
            pixel_count: 2,
            header_line_count: 4,
            record_length: 26,
        };
        assert!(matches!(
            reader.payload_length(&header, 4),
            Err(SarError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_record_length_overflow() {
        let layout = ProductLayout::default();
        assert!(matches!(
            layout.record_length(usize::MAX / 2),
            Err(SarError::InvalidFormat(_))
        ));
        assert_eq!(layout.record_length(8).unwrap(), 476);
    }
}
