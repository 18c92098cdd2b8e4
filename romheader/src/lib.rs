//! `romheader` converts a raw ROM image into a C/C++ header which embeds the
//! image as a `uint8_t` array so an emulator can be built with the original
//! firmware compiled in.
//!
//! The generated header looks like:
//!
//! ```text
//! // Auto-generated from ATARIBAS.ROM
//! // Size: 8192 bytes
//! #ifndef ORIGINAL_BASIC_H
//! #define ORIGINAL_BASIC_H
//!
//! #include <cstdint>
//!
//! // Enable original ROM support
//! #define HAVE_ORIGINAL_BASIC_ROM 1
//!
//! alignas(4) static const uint8_t original_basic[8192] = {
//!     0xA5, 0xCA, ...
//! };
//!
//! #endif // ORIGINAL_BASIC_H
//! ```

use std::{
    fmt::{self, Display},
    fs::{read, write},
    io,
    path::{Path, PathBuf},
};
use thiserror::Error;


/// Images at least this large are OS sized and have their vectors reported.
pub const VECTOR_MIN_SIZE: usize = 16_384;

/// Number of byte literals emitted per line of array data.
pub const BYTES_PER_LINE: usize = 16;

/// Header included for the `uint8_t` type.
pub const INCLUDE: &str = "#include <cstdint>";

/// `VectorPair` holds the last two 16 bit vectors of an image.
///
/// For an OS ROM mapped at the top of memory these are the 6502 RESET and IRQ
/// vectors ($FFFC and $FFFE).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VectorPair {
    /// Little endian value from the 4th and 3rd to last bytes.
    pub reset: u16,

    /// Little endian value from the last 2 bytes.
    pub irq: u16,
}

impl VectorPair {
    /// Extracts the vectors from the end of `data`. Returns None for images
    /// smaller than `VECTOR_MIN_SIZE`.
    #[must_use]
    pub fn from_image(data: &[u8]) -> Option<Self> {
        if data.len() < VECTOR_MIN_SIZE {
            return None;
        }
        let end = data.len();
        Some(Self {
            reset: u16::from_le_bytes([data[end - 4], data[end - 3]]),
            irq: u16::from_le_bytes([data[end - 2], data[end - 1]]),
        })
    }
}

impl Display for VectorPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Reset vector: ${:04X}\nIRQ vector: ${:04X}",
            self.reset, self.irq
        )
    }
}

/// `Request` fully describes one conversion.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Request {
    /// The raw ROM image to read.
    pub input: PathBuf,

    /// Where the header gets written. Any existing file is replaced.
    pub output: PathBuf,

    /// Name of the generated array. Upper cased it also forms the include guard.
    pub array_name: String,

    /// Size the image should be. A mismatch is only reported.
    pub expected_size: Option<usize>,

    /// Optional macro defined to 1 in the header.
    pub feature_flag: Option<String>,
}

/// `Diagnostic` is a single line (or group of lines) of progress reported
/// while converting.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Diagnostic {
    /// The image was read and is `size` bytes.
    Size {
        /// Input as given in the request.
        input: String,
        /// Actual byte count.
        size: usize,
    },

    /// The image isn't the size the request expected.
    SizeMismatch {
        /// Size from the request.
        expected: usize,
        /// Actual byte count.
        actual: usize,
    },

    /// Vectors found at the end of an OS sized image.
    Vectors(VectorPair),

    /// The header was written.
    Created {
        /// Output as given in the request.
        output: String,
    },
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::Size { input, size } => write!(f, "{input}: {size} bytes"),
            Diagnostic::SizeMismatch { expected, actual } => {
                write!(f, "WARNING: Expected {expected} bytes, got {actual}")
            }
            Diagnostic::Vectors(v) => write!(f, "{v}"),
            Diagnostic::Created { output } => write!(f, "-> Created {output}"),
        }
    }
}

/// `Conversion` is the result of a successful `convert`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Conversion {
    /// Actual size of the image and of the emitted array.
    pub size: usize,

    /// Vectors if the image was OS sized.
    pub vectors: Option<VectorPair>,

    /// Everything reported during the conversion, in order.
    pub diagnostics: Vec<Diagnostic>,
}

impl Conversion {
    /// Returns true if the image didn't match the expected size.
    #[must_use]
    pub fn size_mismatch(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| matches!(d, Diagnostic::SizeMismatch { .. }))
    }
}

/// `ConvertError` defines the ways a conversion can fail.
#[derive(Error, Debug)]
pub enum ConvertError {
    /// The array name can't be used as a C identifier.
    #[error("invalid array name {0:?}: must be a non-empty C identifier")]
    InvalidName(String),

    /// The input image couldn't be opened or read.
    #[error("can't read {}: {source}", path.display())]
    Read {
        /// The input path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The header couldn't be created or written.
    #[error("can't write {}: {source}", path.display())]
    Write {
        /// The output path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
}

/// Returns the include guard token for `array_name`.
#[must_use]
pub fn guard_name(array_name: &str) -> String {
    format!("{}_H", array_name.to_ascii_uppercase())
}

/// Returns true if `name` is usable as a C identifier.
#[must_use]
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Renders the complete header text for `data`.
///
/// `source_name` is only used in the provenance comment. The declared array
/// size is always `data.len()`.
#[must_use]
pub fn render_header(
    data: &[u8],
    source_name: &str,
    array_name: &str,
    feature_flag: Option<&str>,
) -> String {
    let guard = guard_name(array_name);
    let size = data.len();

    let mut lines = vec![
        format!("// Auto-generated from {source_name}"),
        format!("// Size: {size} bytes"),
        format!("#ifndef {guard}"),
        format!("#define {guard}"),
        String::new(),
        INCLUDE.to_string(),
        String::new(),
    ];
    if let Some(flag) = feature_flag {
        lines.push("// Enable original ROM support".to_string());
        lines.push(format!("#define {flag} 1"));
        lines.push(String::new());
    }
    lines.push(format!(
        "alignas(4) static const uint8_t {array_name}[{size}] = {{"
    ));
    lines.extend(data_lines(data));
    lines.push("};".to_string());
    lines.push(String::new());
    lines.push(format!("#endif // {guard}"));
    lines.push(String::new());

    lines.join("\n")
}

// Each line is indented 4 spaces and every line but the last has a trailing comma.
fn data_lines(data: &[u8]) -> impl Iterator<Item = String> + '_ {
    let num_lines = data.len().div_ceil(BYTES_PER_LINE);
    data.chunks(BYTES_PER_LINE)
        .enumerate()
        .map(move |(i, chunk)| {
            let vals = chunk
                .iter()
                .map(|b| format!("0x{b:02X}"))
                .collect::<Vec<_>>()
                .join(", ");
            if i + 1 < num_lines {
                format!("    {vals},")
            } else {
                format!("    {vals}")
            }
        })
}

/// Converts the image named in `req` and writes the header.
///
/// # Errors
/// Fails if the array name isn't an identifier, the input can't be read or
/// the output can't be written. A size mismatch is not an error.
pub fn convert(req: &Request) -> Result<Conversion, ConvertError> {
    convert_with(req, |_| {})
}

/// `convert` but each diagnostic is also handed to `report` as soon as it
/// happens, so progress is visible even if the write later fails.
///
/// # Errors
/// See `convert`.
pub fn convert_with<F>(req: &Request, mut report: F) -> Result<Conversion, ConvertError>
where
    F: FnMut(&Diagnostic),
{
    if !is_identifier(&req.array_name) {
        return Err(ConvertError::InvalidName(req.array_name.clone()));
    }

    let mut diagnostics = Vec::new();
    let mut emit = |d: Diagnostic| {
        report(&d);
        diagnostics.push(d);
    };

    let data = read(&req.input).map_err(|source| ConvertError::Read {
        path: req.input.clone(),
        source,
    })?;
    let size = data.len();
    log::debug!("read {} bytes from {}", size, req.input.display());

    emit(Diagnostic::Size {
        input: req.input.display().to_string(),
        size,
    });

    if let Some(expected) = req.expected_size {
        if expected != size {
            log::debug!(
                "{} is {size} bytes but {expected} were expected",
                req.input.display()
            );
            emit(Diagnostic::SizeMismatch {
                expected,
                actual: size,
            });
        }
    }

    let vectors = VectorPair::from_image(&data);
    if let Some(v) = vectors {
        emit(Diagnostic::Vectors(v));
    }

    let header = render_header(
        &data,
        &source_name(&req.input),
        &req.array_name,
        req.feature_flag.as_deref(),
    );
    write(&req.output, header).map_err(|source| ConvertError::Write {
        path: req.output.clone(),
        source,
    })?;
    log::debug!("wrote {}", req.output.display());

    emit(Diagnostic::Created {
        output: req.output.display().to_string(),
    });

    Ok(Conversion {
        size,
        vectors,
        diagnostics,
    })
}

fn source_name(input: &Path) -> String {
    input.file_name().map_or_else(
        || input.display().to_string(),
        |n| n.to_string_lossy().into_owned(),
    )
}
