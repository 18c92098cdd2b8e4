//! prelude exports the ROM conversion and classification libraries together.

/// prelude exports common items for converting Atari ROMs.
pub mod prelude {
    pub use romheader::*;
    pub use romkind::*;
}
