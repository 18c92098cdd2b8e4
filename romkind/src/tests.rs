use crate::{
    candidate_kind, classify, classify_path, discover, Classification, RomKind, BASIC_SIZE,
    OS_800_SIZE, OS_XL_SIZE,
};
use color_eyre::eyre::Result;
use std::fs::{create_dir, write};
use std::path::Path;
use strum::IntoEnumIterator;
use tempfile::tempdir;

macro_rules! classify_test {
    ($($name:ident: $file:literal, $size:expr => $want:expr,)*) => {
        $(
            #[test]
            fn $name() {
                let got = classify(Path::new($file), $size);
                assert!(got == $want, "{}: got {got:?} want {:?}", $file, $want);
            }
        )*
    }
}

classify_test!(
    os_by_size: "dump.bin", OS_XL_SIZE as u64 => Classification::Convert(RomKind::OsXl),
    os_by_xl_name: "atarixl.rom", 12_345 => Classification::Convert(RomKind::OsXl),
    os_by_osb_name: "ATARIOSB.ROM", 10_240 => Classification::Convert(RomKind::OsXl),
    os_by_osa_name: "my_osa_dump", 1 => Classification::Convert(RomKind::OsXl),
    basic_by_size: "dump.bin", BASIC_SIZE as u64 => Classification::Convert(RomKind::Basic),
    basic_by_bas_name: "AtariBas.rom", 8_000 => Classification::Convert(RomKind::Basic),
    basic_by_rev_name: "revc.rom", 4 => Classification::Convert(RomKind::Basic),
    // OS conditions are checked first so conflicting hints resolve to OS.
    xl_name_wins_over_basic_size: "XL.ROM", BASIC_SIZE as u64 =>
        Classification::Convert(RomKind::OsXl),
    os_size_wins_over_basic_name: "ATARIBAS.ROM", OS_XL_SIZE as u64 =>
        Classification::Convert(RomKind::OsXl),
    atari_800_os: "atari800.rom", OS_800_SIZE as u64 => Classification::Atari800Os,
    unknown: "game.car", 40_976 => Classification::Unknown { size: 40_976 },
    empty_unknown: "empty.bin", 0 => Classification::Unknown { size: 0 },
    // Only the final path component provides hints.
    directory_not_hinted: "/roms/xl/dump.bin", 3 => Classification::Unknown { size: 3 },
);

#[test]
fn kind_metadata() {
    let kinds: Vec<RomKind> = RomKind::iter().collect();
    assert!(kinds == vec![RomKind::OsXl, RomKind::Basic], "Got {kinds:?}");

    assert_eq!(RomKind::OsXl.to_string(), "OS ROM");
    assert_eq!(RomKind::Basic.to_string(), "BASIC ROM");
    assert_eq!(RomKind::OsXl.output_name(), "original_os_xl.h");
    assert_eq!(RomKind::Basic.output_name(), "original_basic.h");

    let req = RomKind::Basic.request(Path::new("in/ATARIBAS.ROM"), Path::new("out"));
    assert!(req.input == Path::new("in/ATARIBAS.ROM"), "Got {req:?}");
    assert!(req.output == Path::new("out/original_basic.h"), "Got {req:?}");
    assert_eq!(req.array_name, "original_basic");
    assert_eq!(req.expected_size, Some(8_192));
    assert_eq!(req.feature_flag.as_deref(), Some("HAVE_ORIGINAL_BASIC_ROM"));

    let req = RomKind::OsXl.request(Path::new("ATARIXL.ROM"), Path::new("."));
    assert_eq!(req.array_name, "original_os_xl");
    assert_eq!(req.expected_size, Some(16_384));
    assert_eq!(req.feature_flag.as_deref(), Some("HAVE_ORIGINAL_OS_ROM"));
}

#[test]
fn candidates() {
    assert_eq!(candidate_kind("atarixl.rom"), Some(RomKind::OsXl));
    assert_eq!(candidate_kind("AtariOSB.Rom"), Some(RomKind::OsXl));
    assert_eq!(candidate_kind("REVA.ROM"), Some(RomKind::Basic));
    assert_eq!(candidate_kind("ataribas.rom"), Some(RomKind::Basic));
    assert_eq!(candidate_kind("ATARIXL.BIN"), None);
    assert_eq!(candidate_kind("xATARIXL.ROM"), None);
}

#[test]
fn placeholder() {
    let got = RomKind::OsXl.placeholder_header();
    for want in [
        "/*\n * original_os_xl.h - Original Atari 800XL OS ROM\n",
        " * - Reset vector: $C2AA\n * - Size: 16384 bytes (16KB)\n",
        " * - Memory range: $C000-$FFFF\n */\n",
        "#ifndef ORIGINAL_OS_XL_H\n#define ORIGINAL_OS_XL_H\n\n#include <cstdint>\n",
        "#define HAVE_ORIGINAL_OS_ROM 0\n\n#if HAVE_ORIGINAL_OS_ROM\n",
        "alignas(4) static const uint8_t original_os_xl[16384] = {\n",
        "};\n#endif\n\n#endif // ORIGINAL_OS_XL_H\n",
    ] {
        assert!(got.contains(want), "Missing {want:?} in:\n{got}");
    }

    let got = RomKind::Basic.placeholder_header();
    assert!(!got.contains("Reset vector"), "BASIC has no vectors:\n{got}");
    for want in [
        " * - Memory range: $A000-$BFFF\n * - Revision C is recommended",
        "#define HAVE_ORIGINAL_BASIC_ROM 0\n",
        "original_basic[8192]",
    ] {
        assert!(got.contains(want), "Missing {want:?} in:\n{got}");
    }
}

#[test]
fn classify_files() -> Result<()> {
    let dir = tempdir()?;
    let os = dir.path().join("dump1.bin");
    write(&os, vec![0_u8; OS_XL_SIZE])?;
    let old = dir.path().join("dump2.bin");
    write(&old, vec![0_u8; OS_800_SIZE])?;

    assert_eq!(classify_path(&os)?, Classification::Convert(RomKind::OsXl));
    assert_eq!(classify_path(&old)?, Classification::Atari800Os);
    assert!(classify_path(&dir.path().join("missing.bin")).is_err());
    Ok(())
}

#[test]
fn discover_roms() -> Result<()> {
    let dir = tempdir()?;
    assert!(discover(dir.path())?.is_empty(), "Empty dir found ROMs?");

    write(dir.path().join("notes.txt"), "not a rom")?;
    write(dir.path().join("game.rom"), [0_u8; 4])?;
    assert!(discover(dir.path())?.is_empty(), "Found ROMs among non-candidates?");

    // Directories with candidate names are ignored.
    create_dir(dir.path().join("ATARIXL.ROM"))?;
    assert!(discover(dir.path())?.is_empty(), "Directory treated as a ROM?");

    write(dir.path().join("revb.rom"), [0_u8; 4])?;
    write(dir.path().join("REVC.ROM"), [0_u8; 4])?;
    let found = discover(dir.path())?;
    assert!(found.os.is_none(), "Found an OS ROM? {found:?}");
    // Name order picks REVC.ROM before revb.rom.
    assert!(
        found.basic == Some(dir.path().join("REVC.ROM")),
        "Wrong BASIC ROM {found:?}"
    );

    write(dir.path().join("atariosb.rom"), [0_u8; 4])?;
    let found = discover(dir.path())?;
    let files = found.files();
    assert!(
        files == vec![dir.path().join("atariosb.rom"), dir.path().join("REVC.ROM")],
        "Wrong files {files:?}"
    );
    Ok(())
}

#[cfg(unix)]
#[test]
fn discover_symlinked_roms() -> Result<()> {
    use std::os::unix::fs::symlink;

    let store = tempdir()?;
    let os = store.path().join("atarixl-real.bin");
    write(&os, vec![0_u8; OS_XL_SIZE])?;

    let dir = tempdir()?;
    let link = dir.path().join("ATARIXL.ROM");
    symlink(&os, &link)?;
    // A dangling link is skipped rather than failing the search.
    symlink(store.path().join("gone.bin"), dir.path().join("ATARIBAS.ROM"))?;

    let found = discover(dir.path())?;
    assert!(found.os == Some(link), "Linked OS ROM not found {found:?}");
    assert!(found.basic.is_none(), "Dangling link found {found:?}");
    Ok(())
}
