//! Binary I/O helpers for embroidery file formats
//!
//! `ReadHelper` and `WriteHelper` wrap a stream with endian-aware accessors
//! and keep a running byte count for formats that backpatch offsets.

use byteorder::{BigEndian, LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{self, Read, Seek, SeekFrom, Write};

/// Helper for reading from binary streams
pub struct ReadHelper<R: Read> {
    reader: R,
}

impl<R: Read> ReadHelper<R> {
    /// Create a new ReadHelper
    pub fn new(reader: R) -> Self {
        Self { reader }
    }

    /// Read an exact number of bytes
    pub fn read_bytes(&mut self, count: usize) -> io::Result<Vec<u8>> {
        let mut buffer = vec![0u8; count];
        self.reader.read_exact(&mut buffer)?;
        Ok(buffer)
    }

    /// Read a single byte
    pub fn read_u8(&mut self) -> io::Result<u8> {
        self.reader.read_u8()
    }

    /// Read i8
    pub fn read_i8(&mut self) -> io::Result<i8> {
        self.reader.read_i8()
    }

    /// Read u16 little endian
    pub fn read_u16_le(&mut self) -> io::Result<u16> {
        self.reader.read_u16::<LittleEndian>()
    }

    /// Read i16 little endian
    pub fn read_i16_le(&mut self) -> io::Result<i16> {
        self.reader.read_i16::<LittleEndian>()
    }

    /// Read i16 big endian
    pub fn read_i16_be(&mut self) -> io::Result<i16> {
        self.reader.read_i16::<BigEndian>()
    }

    /// Read u32 little endian
    pub fn read_u32_le(&mut self) -> io::Result<u32> {
        self.reader.read_u32::<LittleEndian>()
    }

    /// Read u32 big endian
    pub fn read_u32_be(&mut self) -> io::Result<u32> {
        self.reader.read_u32::<BigEndian>()
    }

    /// Read i32 little endian
    pub fn read_i32_le(&mut self) -> io::Result<i32> {
        self.reader.read_i32::<LittleEndian>()
    }

    /// Read a string of the given byte length (lossy UTF-8)
    pub fn read_string(&mut self, length: usize) -> io::Result<String> {
        let bytes = self.read_bytes(length)?;
        Ok(String::from_utf8_lossy(&bytes).to_string())
    }

    /// Get the underlying reader back
    pub fn into_inner(self) -> R {
        self.reader
    }
}

/// Helper for writing to binary streams
pub struct WriteHelper<W: Write> {
    writer: W,
    bytes_written: usize,
}

impl<W: Write> WriteHelper<W> {
    /// Create a new WriteHelper
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            bytes_written: 0,
        }
    }

    /// Number of bytes written so far
    pub fn bytes_written(&self) -> usize {
        self.bytes_written
    }

    /// Write raw bytes
    pub fn write_bytes(&mut self, data: &[u8]) -> io::Result<()> {
        self.writer.write_all(data)?;
        self.bytes_written = self.bytes_written.saturating_add(data.len());
        Ok(())
    }

    /// Write a single byte
    pub fn write_u8(&mut self, value: u8) -> io::Result<()> {
        self.writer.write_u8(value)?;
        self.bytes_written = self.bytes_written.saturating_add(1);
        Ok(())
    }

    /// Write i8
    pub fn write_i8(&mut self, value: i8) -> io::Result<()> {
        self.writer.write_i8(value)?;
        self.bytes_written = self.bytes_written.saturating_add(1);
        Ok(())
    }

    /// Write u16 little endian
    pub fn write_u16_le(&mut self, value: u16) -> io::Result<()> {
        self.writer.write_u16::<LittleEndian>(value)?;
        self.bytes_written = self.bytes_written.saturating_add(2);
        Ok(())
    }

    /// Write i16 little endian
    pub fn write_i16_le(&mut self, value: i16) -> io::Result<()> {
        self.writer.write_i16::<LittleEndian>(value)?;
        self.bytes_written = self.bytes_written.saturating_add(2);
        Ok(())
    }

    /// Write i16 big endian
    pub fn write_i16_be(&mut self, value: i16) -> io::Result<()> {
        self.writer.write_i16::<BigEndian>(value)?;
        self.bytes_written = self.bytes_written.saturating_add(2);
        Ok(())
    }

    /// Write u32 little endian
    pub fn write_u32_le(&mut self, value: u32) -> io::Result<()> {
        self.writer.write_u32::<LittleEndian>(value)?;
        self.bytes_written = self.bytes_written.saturating_add(4);
        Ok(())
    }

    /// Write u32 big endian
    pub fn write_u32_be(&mut self, value: u32) -> io::Result<()> {
        self.writer.write_u32::<BigEndian>(value)?;
        self.bytes_written = self.bytes_written.saturating_add(4);
        Ok(())
    }

    /// Write i32 little endian
    pub fn write_i32_le(&mut self, value: i32) -> io::Result<()> {
        self.writer.write_i32::<LittleEndian>(value)?;
        self.bytes_written = self.bytes_written.saturating_add(4);
        Ok(())
    }

    /// Write a string as raw bytes
    pub fn write_string(&mut self, s: &str) -> io::Result<()> {
        self.write_bytes(s.as_bytes())
    }

    /// Get the underlying writer back
    pub fn into_inner(self) -> W {
        self.writer
    }

    /// Mutable access to the underlying writer
    pub fn inner_mut(&mut self) -> &mut W {
        &mut self.writer
    }
}

impl<W: Write + Seek> WriteHelper<W> {
    /// Seek the underlying writer; the running byte count is not adjusted,
    /// so callers must seek back before appending
    pub fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.writer.seek(pos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_write_then_read_back() {
        let mut buffer = Vec::new();
        {
            let mut w = WriteHelper::new(&mut buffer);
            w.write_u8(0x12).unwrap();
            w.write_u16_le(0x3456).unwrap();
            w.write_i32_le(-2).unwrap();
            w.write_string("ok").unwrap();
            assert_eq!(w.bytes_written(), 9);
        }
        let mut r = ReadHelper::new(Cursor::new(buffer));
        assert_eq!(r.read_u8().unwrap(), 0x12);
        assert_eq!(r.read_u16_le().unwrap(), 0x3456);
        assert_eq!(r.read_i32_le().unwrap(), -2);
        assert_eq!(r.read_string(2).unwrap(), "ok");
    }
}
