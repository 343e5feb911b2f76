use glam::Vec2;

pub const POSITION_SCALE: f32 = 10.0;
pub const VELOCITY_SCALE: f32 = 100.0;

#[derive(Debug, thiserror::Error)]
pub enum WireError {
    #[error("buffer truncated: wanted {wanted} bytes at offset {offset}, {remaining} remaining")]
    Truncated {
        offset: usize,
        wanted: usize,
        remaining: usize,
    },
    #[error("invalid utf-8 in length-prefixed string")]
    InvalidUtf8,
}

fn quantize(value: f32, scale: f32) -> i16 {
    let scaled = value * scale;
    scaled.clamp(i16::MIN as f32, i16::MAX as f32).round() as i16
}

/// Growable big-endian byte sink. Record lengths are not known until the
/// record body has been written, so `reserve_u16`/`patch_u16` back-fill the
/// prefix afterwards.
#[derive(Debug, Default)]
pub struct ByteWriter {
    buf: Vec<u8>,
}

impl ByteWriter {
    pub fn new() -> Self {
        Self {
            buf: Vec::with_capacity(512),
        }
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.buf
    }

    /// Rolls back to `len`; used to drop a partially written record.
    pub fn truncate(&mut self, len: usize) {
        self.buf.truncate(len);
    }

    pub fn write_u8(&mut self, value: u8) {
        self.buf.push(value);
    }

    pub fn write_u16(&mut self, value: u16) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    pub fn write_u32(&mut self, value: u32) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    pub fn write_u64(&mut self, value: u64) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    pub fn write_f64(&mut self, value: f64) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    pub fn write_bool(&mut self, value: bool) {
        self.buf.push(value as u8);
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// u32 length prefix + UTF-8 bytes.
    pub fn write_string(&mut self, value: &str) {
        self.write_u32(value.len() as u32);
        self.buf.extend_from_slice(value.as_bytes());
    }

    /// Two i16 at 0.1 world-unit resolution.
    pub fn write_position2(&mut self, value: Vec2) {
        self.buf
            .extend_from_slice(&quantize(value.x, POSITION_SCALE).to_be_bytes());
        self.buf
            .extend_from_slice(&quantize(value.y, POSITION_SCALE).to_be_bytes());
    }

    /// Two i16 at 0.01 unit/s resolution.
    pub fn write_velocity2(&mut self, value: Vec2) {
        self.buf
            .extend_from_slice(&quantize(value.x, VELOCITY_SCALE).to_be_bytes());
        self.buf
            .extend_from_slice(&quantize(value.y, VELOCITY_SCALE).to_be_bytes());
    }

    pub fn reserve_u8(&mut self) -> usize {
        let at = self.buf.len();
        self.buf.push(0);
        at
    }

    pub fn reserve_u16(&mut self) -> usize {
        let at = self.buf.len();
        self.buf.extend_from_slice(&[0, 0]);
        at
    }

    pub fn patch_u8(&mut self, at: usize, value: u8) {
        self.buf[at] = value;
    }

    pub fn patch_u16(&mut self, at: usize, value: u16) {
        self.buf[at..at + 2].copy_from_slice(&value.to_be_bytes());
    }
}

/// Cursor over a received buffer. Every read bounds-checks and fails with a
/// recoverable error instead of panicking; a corrupt frame aborts decoding,
/// never the process.
#[derive(Debug, Clone, Copy)]
pub struct ByteReader<'a> {
    buf: &'a [u8],
    cursor: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, cursor: 0 }
    }

    /// A new reader over the same buffer positioned at `offset`, leaving
    /// this one untouched. Used to peek ahead by a record's length prefix
    /// and then jump past it.
    pub fn at_offset(&self, offset: usize) -> Self {
        Self {
            buf: self.buf,
            cursor: offset.min(self.buf.len()),
        }
    }

    pub fn offset(&self) -> usize {
        self.cursor
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.cursor
    }

    pub fn seek(&mut self, offset: usize) {
        self.cursor = offset.min(self.buf.len());
    }

    fn take(&mut self, wanted: usize) -> Result<&'a [u8], WireError> {
        if self.remaining() < wanted {
            return Err(WireError::Truncated {
                offset: self.cursor,
                wanted,
                remaining: self.remaining(),
            });
        }
        let slice = &self.buf[self.cursor..self.cursor + wanted];
        self.cursor += wanted;
        Ok(slice)
    }

    pub fn read_u8(&mut self) -> Result<u8, WireError> {
        Ok(self.take(1)?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16, WireError> {
        let bytes = self.take(2)?;
        Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    pub fn read_u32(&mut self) -> Result<u32, WireError> {
        let bytes = self.take(4)?;
        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    pub fn read_u64(&mut self) -> Result<u64, WireError> {
        let bytes = self.take(8)?;
        let mut raw = [0u8; 8];
        raw.copy_from_slice(bytes);
        Ok(u64::from_be_bytes(raw))
    }

    pub fn read_i16(&mut self) -> Result<i16, WireError> {
        let bytes = self.take(2)?;
        Ok(i16::from_be_bytes([bytes[0], bytes[1]]))
    }

    pub fn read_f64(&mut self) -> Result<f64, WireError> {
        let bytes = self.take(8)?;
        let mut raw = [0u8; 8];
        raw.copy_from_slice(bytes);
        Ok(f64::from_be_bytes(raw))
    }

    pub fn read_bool(&mut self) -> Result<bool, WireError> {
        Ok(self.read_u8()? != 0)
    }

    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], WireError> {
        self.take(len)
    }

    pub fn read_string(&mut self) -> Result<String, WireError> {
        let len = self.read_u32()? as usize;
        let bytes = self.take(len)?;
        std::str::from_utf8(bytes)
            .map(str::to_owned)
            .map_err(|_| WireError::InvalidUtf8)
    }

    pub fn read_position2(&mut self) -> Result<Vec2, WireError> {
        let x = self.read_i16()? as f32 / POSITION_SCALE;
        let y = self.read_i16()? as f32 / POSITION_SCALE;
        Ok(Vec2::new(x, y))
    }

    pub fn read_velocity2(&mut self) -> Result<Vec2, WireError> {
        let x = self.read_i16()? as f32 / VELOCITY_SCALE;
        let y = self.read_i16()? as f32 / VELOCITY_SCALE;
        Ok(Vec2::new(x, y))
    }
}
