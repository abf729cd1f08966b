//! Sample and frame format descriptors.

/// Container format of one sample as stored in a stream buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FrameFormat {
    /// Signed 16-bit little endian.
    #[default]
    S16Le,
    /// Signed 24-bit in a 32-bit LSB-aligned container.
    S24_4Le,
    /// Signed 32-bit little endian.
    S32Le,
    /// IEEE-754 single precision.
    Float,
    /// Signed 24-bit packed in 3 bytes.
    S24_3Le,
    /// Signed 24-bit in a 32-bit MSB-aligned container.
    S24_4LeMsb,
    /// Unsigned 8-bit.
    U8,
    /// G.711 A-law.
    ALaw,
    /// G.711 mu-law.
    MuLaw,
}

/// Sample type carried in an IPC4 audio format record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ipc4SampleType {
    /// Signed or unsigned integer PCM.
    Integer,
    /// Floating point PCM.
    Float,
}

impl FrameFormat {
    /// Size of one sample container in bytes.
    pub const fn sample_bytes(self) -> u32 {
        self.width().bytes()
    }

    /// Copy granularity for this format.
    pub const fn width(self) -> SampleWidth {
        match self {
            FrameFormat::S16Le => SampleWidth::W16,
            FrameFormat::S24_3Le => SampleWidth::W24,
            FrameFormat::U8 | FrameFormat::ALaw | FrameFormat::MuLaw => SampleWidth::W8,
            FrameFormat::S24_4Le
            | FrameFormat::S32Le
            | FrameFormat::Float
            | FrameFormat::S24_4LeMsb => SampleWidth::W32,
        }
    }

    /// Map an IPC4 (bit depth, valid bit depth, sample type) triple to the
    /// container and valid-sample formats.
    ///
    /// Returns `None` for depths with no matching container.
    pub fn from_ipc4(
        depth: u32,
        valid_depth: u32,
        sample_type: Ipc4SampleType,
    ) -> Option<(FrameFormat, FrameFormat)> {
        let mut frame = Self::from_depth(depth)?;
        let mut valid = Self::from_depth(valid_depth)?;

        if valid_depth == 24 && depth == 24 {
            frame = FrameFormat::S24_3Le;
            valid = FrameFormat::S24_3Le;
        }

        if sample_type == Ipc4SampleType::Float && depth == 32 {
            frame = FrameFormat::Float;
            valid = FrameFormat::Float;
        }

        Some((frame, valid))
    }

    fn from_depth(depth: u32) -> Option<FrameFormat> {
        match depth {
            8 => Some(FrameFormat::U8),
            16 => Some(FrameFormat::S16Le),
            24 => Some(FrameFormat::S24_4Le),
            32 => Some(FrameFormat::S32Le),
            _ => None,
        }
    }
}

/// Sample container width, resolved once when the stream format is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleWidth {
    W8,
    W16,
    W24,
    W32,
}

impl SampleWidth {
    /// Width in bytes.
    pub const fn bytes(self) -> u32 {
        match self {
            SampleWidth::W8 => 1,
            SampleWidth::W16 => 2,
            SampleWidth::W24 => 3,
            SampleWidth::W32 => 4,
        }
    }
}

/// Sample layout inside a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BufferFormat {
    #[default]
    Interleaved,
    NonInterleaved,
}

/// Runtime stream parameters applied once before first use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StreamParams {
    pub frame_format: FrameFormat,
    pub valid_sample_format: FrameFormat,
    pub rate: u32,
    pub channels: u16,
    pub buffer_format: BufferFormat,
}

impl StreamParams {
    /// Interleaved parameters with matching container and valid formats.
    pub const fn new(frame_format: FrameFormat, rate: u32, channels: u16) -> Self {
        StreamParams {
            frame_format,
            valid_sample_format: frame_format,
            rate,
            channels,
            buffer_format: BufferFormat::Interleaved,
        }
    }
}

impl Default for StreamParams {
    fn default() -> Self {
        StreamParams::new(FrameFormat::S16Le, 48_000, 2)
    }
}

/// A sample type that can be read from and written to a byte buffer.
pub trait Sample: Copy {
    /// Container width of this sample type.
    const WIDTH: SampleWidth;

    /// Decode from exactly `WIDTH.bytes()` little-endian bytes.
    fn read_le(bytes: &[u8]) -> Self;

    /// Encode into exactly `WIDTH.bytes()` little-endian bytes.
    fn write_le(self, bytes: &mut [u8]);
}

impl Sample for i16 {
    const WIDTH: SampleWidth = SampleWidth::W16;

    #[inline]
    fn read_le(bytes: &[u8]) -> Self {
        i16::from_le_bytes([bytes[0], bytes[1]])
    }

    #[inline]
    fn write_le(self, bytes: &mut [u8]) {
        bytes[..2].copy_from_slice(&self.to_le_bytes());
    }
}

impl Sample for i32 {
    const WIDTH: SampleWidth = SampleWidth::W32;

    #[inline]
    fn read_le(bytes: &[u8]) -> Self {
        i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
    }

    #[inline]
    fn write_le(self, bytes: &mut [u8]) {
        bytes[..4].copy_from_slice(&self.to_le_bytes());
    }
}
