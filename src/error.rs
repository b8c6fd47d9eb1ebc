use thiserror::Error;

/// Which metadata block, or which payload phase, an LDPC failure happened
/// in, so callers can tell a master-metadata failure from a payload
/// failure without parsing the error message.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Phase {
    MasterMetadataPart1,
    MasterMetadataPart2,
    MasterMetadataPart3,
    SlaveMetadataPart1,
    SlaveMetadataPart2,
    SlaveMetadataPart3,
    Payload,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Phase::MasterMetadataPart1 => "master metadata part 1",
            Phase::MasterMetadataPart2 => "master metadata part 2",
            Phase::MasterMetadataPart3 => "master metadata part 3",
            Phase::SlaveMetadataPart1 => "slave metadata part 1",
            Phase::SlaveMetadataPart2 => "slave metadata part 2",
            Phase::SlaveMetadataPart3 => "slave metadata part 3",
            Phase::Payload => "payload",
        };
        f.write_str(s)
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("matrix dimensions {0}x{1} are invalid")]
    InvalidMatrixSize(usize, usize),
    #[error("unsupported bits_per_pixel: {0}, expected 24 or 32")]
    InvalidBitsPerPixel(u32),
    #[error("matrix size {0}x{1} does not match side size {2}x{3} from metadata")]
    SizeMismatch(usize, usize, usize, usize),
    #[error("invalid color count index Nc={0}, expected 0..=7")]
    InvalidColorCount(u8),
    #[error("LDPC decoding failed in {0}")]
    LdpcFailure(Phase),
    #[error("invalid error-correction parameters wc={0} wr={1}, require wc < wr")]
    InvalidEcl(u32, u32),
    #[error("invalid mask type {0}, expected 0..=7")]
    InvalidMaskType(u8),
    #[error("text demultiplexer read an invalid value {0} in mode {1:?}")]
    InvalidTextValue(u32, crate::text::Mode),
    #[error("text demultiplexer ran out of bits mid-character in mode {0:?}")]
    TextTruncated(crate::text::Mode),
    #[error("out of memory")]
    OutOfMemory(#[from] std::collections::TryReserveError),
    #[error("slave symbol has no decoded host metadata to inherit from")]
    MissingHostMetadata,
}

pub type Result<T> = std::result::Result<T, Error>;
