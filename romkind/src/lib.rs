//! `romkind` decides which of the supported Atari ROMs a file holds and
//! builds the matching `romheader` conversion for it. It also knows the file
//! names ROM dumps are usually distributed under so a directory can be
//! searched for them.

use romheader::{guard_name, Request};
use std::{
    fs, io,
    path::{Path, PathBuf},
};
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter};

#[cfg(test)]
mod tests;

/// Size of the Atari 800XL OS ROM.
pub const OS_XL_SIZE: usize = 16_384;

/// Size of the Atari BASIC cartridge ROM.
pub const BASIC_SIZE: usize = 8_192;

/// Size of the original Atari 400/800 OS ROM which isn't supported.
pub const OS_800_SIZE: usize = 10_240;

/// `RomKind` is one of the ROMs the emulator can embed.
#[derive(Clone, Copy, Debug, Display, EnumIter, PartialEq, Eq)]
pub enum RomKind {
    /// Atari 800XL operating system.
    #[strum(to_string = "OS ROM")]
    OsXl,

    /// Atari BASIC.
    #[strum(to_string = "BASIC ROM")]
    Basic,
}

impl RomKind {
    /// Name of the generated array.
    #[must_use]
    pub fn array_name(self) -> &'static str {
        match self {
            RomKind::OsXl => "original_os_xl",
            RomKind::Basic => "original_basic",
        }
    }

    /// Macro the emulator checks to use the embedded ROM.
    #[must_use]
    pub fn feature_flag(self) -> &'static str {
        match self {
            RomKind::OsXl => "HAVE_ORIGINAL_OS_ROM",
            RomKind::Basic => "HAVE_ORIGINAL_BASIC_ROM",
        }
    }

    /// Size a good dump should be.
    #[must_use]
    pub fn expected_size(self) -> usize {
        match self {
            RomKind::OsXl => OS_XL_SIZE,
            RomKind::Basic => BASIC_SIZE,
        }
    }

    /// File name of the generated header.
    #[must_use]
    pub fn output_name(self) -> String {
        format!("{}.h", self.array_name())
    }

    /// Full name of the ROM.
    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            RomKind::OsXl => "Atari 800XL OS ROM",
            RomKind::Basic => "Atari BASIC ROM",
        }
    }

    /// Inclusive address range the ROM is mapped at.
    #[must_use]
    pub fn memory_range(self) -> (u16, u16) {
        match self {
            RomKind::OsXl => (0xC000, 0xFFFF),
            RomKind::Basic => (0xA000, 0xBFFF),
        }
    }

    /// Known dump file names, the preferred one first. Matching is case
    /// insensitive.
    #[must_use]
    pub fn candidates(self) -> &'static [&'static str] {
        match self {
            RomKind::OsXl => &["ATARIXL.ROM", "ATARIOSB.ROM"],
            RomKind::Basic => &["ATARIBAS.ROM", "REVC.ROM", "REVB.ROM", "REVA.ROM"],
        }
    }

    /// Builds the conversion of `input` into this kind's header under `out_dir`.
    #[must_use]
    pub fn request(self, input: &Path, out_dir: &Path) -> Request {
        Request {
            input: input.to_path_buf(),
            output: out_dir.join(self.output_name()),
            array_name: self.array_name().to_string(),
            expected_size: Some(self.expected_size()),
            feature_flag: Some(self.feature_flag().to_string()),
        }
    }

    /// Renders the stub header shipped when no ROM has been converted. The
    /// feature macro is defined to 0 and the array is compiled out.
    #[must_use]
    pub fn placeholder_header(self) -> String {
        let guard = guard_name(self.array_name());
        let flag = self.feature_flag();
        let size = self.expected_size();
        let (start, end) = self.memory_range();
        let dump = self.candidates()[0];

        let mut lines = vec![
            "/*".to_string(),
            format!(" * {} - Original {}", self.output_name(), self.description()),
            " *".to_string(),
            " * PLACEHOLDER FILE - Replace with converted ROM data".to_string(),
            " *".to_string(),
            " * To use original Atari ROMs:".to_string(),
            format!(" * 1. Place your {dump} ({size} bytes) in this directory"),
            format!(" * 2. Run: convertroms {dump}"),
            " * 3. This will overwrite this file with the actual ROM data".to_string(),
            " * 4. Rebuild the project".to_string(),
            " *".to_string(),
            format!(" * The original {} has:", self.description()),
        ];
        if self == RomKind::OsXl {
            lines.push(" * - Reset vector: $C2AA".to_string());
        }
        lines.push(format!(" * - Size: {size} bytes ({}KB)", size / 1024));
        lines.push(format!(" * - Memory range: ${start:04X}-${end:04X}"));
        if self == RomKind::Basic {
            lines.push(" * - Revision C is recommended for best compatibility".to_string());
        }
        lines.extend([
            " */".to_string(),
            format!("#ifndef {guard}"),
            format!("#define {guard}"),
            String::new(),
            romheader::INCLUDE.to_string(),
            String::new(),
            "// Set to 1 when original ROM data is present".to_string(),
            format!("#define {flag} 0"),
            String::new(),
            format!("#if {flag}"),
            format!(
                "alignas(4) static const uint8_t {}[{size}] = {{",
                self.array_name()
            ),
            "    // ROM data will be inserted here by convertroms".to_string(),
            "    0".to_string(),
            "};".to_string(),
            "#endif".to_string(),
            String::new(),
            format!("#endif // {guard}"),
            String::new(),
        ]);
        lines.join("\n")
    }
}

/// `Classification` is what should happen to a candidate file.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Classification {
    /// Convert it as the given kind.
    Convert(RomKind),

    /// An Atari 400/800 OS which the emulator can't use.
    Atari800Os,

    /// Not a size or name we recognize.
    Unknown {
        /// Size of the file.
        size: u64,
    },
}

/// Classifies a file from its name and size.
///
/// Conditions are checked in a fixed order and the first match wins: OS
/// (exact size or an `XL`/`OSB`/`OSA` name), then BASIC (exact size or a
/// `BAS`/`REV` name), then the unsupported 10KB OS. Name hints are case
/// insensitive and only look at the final path component.
#[must_use]
pub fn classify(name: &Path, size: u64) -> Classification {
    let upper = name
        .file_name()
        .map(|n| n.to_string_lossy().to_ascii_uppercase())
        .unwrap_or_default();
    let hinted = |hints: &[&str]| hints.iter().any(|h| upper.contains(*h));

    if size == OS_XL_SIZE as u64 || hinted(&["XL", "OSB", "OSA"]) {
        Classification::Convert(RomKind::OsXl)
    } else if size == BASIC_SIZE as u64 || hinted(&["BAS", "REV"]) {
        Classification::Convert(RomKind::Basic)
    } else if size == OS_800_SIZE as u64 {
        Classification::Atari800Os
    } else {
        Classification::Unknown { size }
    }
}

/// Stats `path` and classifies it.
///
/// # Errors
/// Returns the I/O error if the file's metadata can't be read.
pub fn classify_path(path: &Path) -> io::Result<Classification> {
    let size = fs::metadata(path)?.len();
    let class = classify(path, size);
    log::debug!("{} ({size} bytes) classified as {class:?}", path.display());
    Ok(class)
}

/// `Discovered` holds the ROMs found by `discover`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Discovered {
    /// An OS ROM if one was found.
    pub os: Option<PathBuf>,

    /// A BASIC ROM if one was found.
    pub basic: Option<PathBuf>,
}

impl Discovered {
    /// Returns true if nothing was found.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.os.is_none() && self.basic.is_none()
    }

    /// The found files, OS first.
    #[must_use]
    pub fn files(&self) -> Vec<PathBuf> {
        self.os.iter().chain(self.basic.iter()).cloned().collect()
    }
}

/// Returns the kind whose candidate names include `name` (case insensitive).
#[must_use]
pub fn candidate_kind(name: &str) -> Option<RomKind> {
    let upper = name.to_ascii_uppercase();
    RomKind::iter().find(|k| k.candidates().contains(&upper.as_str()))
}

/// Searches `dir` (not recursively) for files named like known ROM dumps.
///
/// Entries are visited in name order and the first match for each kind is kept.
/// Symlinks are followed so a linked dump is found like a regular file.
///
/// # Errors
/// Returns any I/O error from listing the directory.
pub fn discover(dir: &Path) -> io::Result<Discovered> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() {
            entries.push(path);
        }
    }
    entries.sort();

    let mut found = Discovered::default();
    for path in entries {
        let Some(name) = path.file_name().map(|n| n.to_string_lossy().into_owned()) else {
            continue;
        };
        let slot = match candidate_kind(&name) {
            Some(RomKind::OsXl) => &mut found.os,
            Some(RomKind::Basic) => &mut found.basic,
            None => continue,
        };
        if slot.is_none() {
            log::debug!("discovered {name}");
            *slot = Some(path);
        }
    }
    Ok(found)
}
