use crate::error::{ExportError, Result};

/// Fixed-length little-endian byte writer with a cursor.
///
/// The buffer is sized up front; writing past the end or finishing short of
/// it is a [`ExportError::SerializationMismatch`].
#[derive(Debug)]
pub struct BinaryWriter {
    buf: Vec<u8>,
    cursor: usize,
}

impl BinaryWriter {
    /// Zero-filled writer of exactly `len` bytes
    pub fn with_len(len: usize) -> Self {
        Self {
            buf: vec![0; len],
            cursor: 0,
        }
    }

    pub fn put_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        let end = self.cursor + bytes.len();
        if end > self.buf.len() {
            return Err(ExportError::SerializationMismatch {
                expected: self.buf.len(),
                written: end,
            });
        }
        self.buf[self.cursor..end].copy_from_slice(bytes);
        self.cursor = end;
        Ok(())
    }

    pub fn put_u16_le(&mut self, value: u16) -> Result<()> {
        self.put_bytes(&value.to_le_bytes())
    }

    pub fn put_u32_le(&mut self, value: u32) -> Result<()> {
        self.put_bytes(&value.to_le_bytes())
    }

    pub fn put_f32_le(&mut self, value: f32) -> Result<()> {
        self.put_bytes(&value.to_le_bytes())
    }

    pub fn put_vec3(&mut self, v: [f32; 3]) -> Result<()> {
        for c in v {
            self.put_f32_le(c)?;
        }
        Ok(())
    }

    pub fn position(&self) -> usize {
        self.cursor
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.cursor
    }

    /// Hand back the buffer, provided every byte was written
    pub fn finish(self) -> Result<Vec<u8>> {
        if self.cursor != self.buf.len() {
            return Err(ExportError::SerializationMismatch {
                expected: self.buf.len(),
                written: self.cursor,
            });
        }
        Ok(self.buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_little_endian_fields() {
        let mut writer = BinaryWriter::with_len(10);
        writer.put_u32_le(0x0403_0201).unwrap();
        writer.put_u16_le(0xBEEF).unwrap();
        writer.put_f32_le(1.0).unwrap();
        assert_eq!(writer.remaining(), 0);

        let buf = writer.finish().unwrap();
        assert_eq!(&buf[0..4], &[1, 2, 3, 4]);
        assert_eq!(&buf[4..6], &[0xEF, 0xBE]);
        assert_eq!(&buf[6..10], &1.0f32.to_le_bytes());
    }

    #[test]
    fn test_overrun_rejected() {
        let mut writer = BinaryWriter::with_len(6);
        writer.put_u32_le(7).unwrap();
        let err = writer.put_u32_le(8).unwrap_err();
        assert!(matches!(
            err,
            ExportError::SerializationMismatch {
                expected: 6,
                written: 8
            }
        ));
        // Failed write leaves the cursor alone
        assert_eq!(writer.position(), 4);
    }

    #[test]
    fn test_underrun_rejected() {
        let mut writer = BinaryWriter::with_len(16);
        writer.put_vec3([1.0, 2.0, 3.0]).unwrap();
        assert_eq!(writer.position(), 12);
        assert!(matches!(
            writer.finish(),
            Err(ExportError::SerializationMismatch {
                expected: 16,
                written: 12
            })
        ));
    }
}
