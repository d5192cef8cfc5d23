use jsys_rarc::{error::Error, write::SaveOptions, Archive, ByteOrder, File, FolderSource, Format};
use miette::{IntoDiagnostic, Result};
use pretty_assertions::assert_eq;
use std::io::Cursor;
use tracing::{info, instrument};
use tracing_test::traced_test;

fn stage() -> Result<Archive> {
    let mut archive = Archive::new("scene")?;
    let root = archive.root();

    let map = archive.add_folder(root, "map")?;
    let objects = archive.add_folder(root, "objects")?;
    let textures = archive.add_folder(objects, "textures")?;
    archive.add_folder(root, "empty")?;

    archive.add_file(root, File::new("scene.bin", b"scene".repeat(40))?)?;
    archive.add_file(map, File::new("map.col", vec![0xAB; 300])?)?;
    let model: Vec<u8> = (0..=255u8).cycle().take(1000).collect();
    archive.add_file(map, File::new("map.bmd", model)?)?;
    archive.add_file(objects, File::new("enemy.bmd", b"J3D2bmd3".to_vec())?)?;
    archive.add_file(textures, File::new("enemy.bti", vec![])?)?;
    // same name in a different folder shares its string
    archive.add_file(textures, File::new("map.col", vec![1, 2, 3])?)?;

    Ok(archive)
}

#[instrument(skip(archive))]
fn validate_round_trip(archive: &Archive, options: SaveOptions) -> Result<()> {
    let bytes = archive.save(options)?;
    info!("saved {} bytes", bytes.len());

    assert_eq!(Format::detect(&bytes), options.compression);
    if options.pad {
        assert_eq!(bytes.len() % 32, 0);
    }

    let actual = Archive::load(&bytes)?;
    assert_eq!(&actual, archive);
    Ok(())
}

#[traced_test]
#[test]
fn round_trip_all_formats() -> Result<()> {
    let archive = stage()?;

    for compression in [Format::None, Format::Yaz0, Format::Yay0] {
        for pad in [false, true] {
            let options = SaveOptions::builder()
                .compression(compression)
                .level(9)
                .pad(pad)
                .build();
            validate_round_trip(&archive, options)?;
        }
    }

    Ok(())
}

#[test]
fn round_trip_little_endian() -> Result<()> {
    let mut archive = stage()?;
    archive.set_byte_order(ByteOrder::Little);

    let bytes = archive.save(SaveOptions::default())?;
    assert_eq!(&bytes[..4], b"CRAR");

    let actual = Archive::load(&bytes)?;
    assert_eq!(actual.byte_order(), ByteOrder::Little);
    assert_eq!(actual, archive);

    // compression always wraps the archive big endian
    let compressed = archive.save(SaveOptions::builder().compression(Format::Yaz0).build())?;
    assert_eq!(&compressed[..4], b"Yaz0");
    assert_eq!(Archive::load(&compressed)?, archive);

    Ok(())
}

#[test]
fn saved_archive_is_consistent() -> Result<()> {
    let archive = stage()?;
    let layout = archive.layout()?;
    let bytes = archive.save(SaveOptions::default())?;

    assert_eq!(bytes.len() as u64, layout.total_size());
    assert_eq!(
        u32::from_be_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]) as u64,
        layout.total_size()
    );
    assert_eq!(layout.directories.offset % 32, 0);
    assert_eq!(layout.entries.offset % 32, 0);
    assert_eq!(layout.strings.offset % 32, 0);
    assert_eq!(layout.data.offset % 32, 0);

    // five folders, ten entries of their own and two navigation entries each
    assert_eq!(archive.folder_count(), 5);
    assert_eq!(layout.entry_count, 10 + 5 * 2);
    assert_eq!(layout.names().filter(|name| *name == "map.col").count(), 1);

    Ok(())
}

#[test]
fn save_and_open_file() -> Result<()> {
    let archive = stage()?;
    let dir = tempfile::tempdir().into_diagnostic()?;
    let path = dir.path().join("stage.szs");

    let options = SaveOptions::builder().compression(Format::Yaz0).build();
    archive.save_to_file(&path, options)?;
    assert_eq!(Archive::open(&path)?, archive);

    let written = archive.write(Cursor::new(Vec::new()), options)?;
    assert_eq!(written.into_inner(), std::fs::read(&path).into_diagnostic()?);

    Ok(())
}

#[test]
fn open_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
        Archive::open(dir.path().join("missing.arc")),
        Err(Error::IOError(_))
    ));
}

#[test]
fn copy_folder_between_archives() -> Result<()> {
    let source = stage()?;
    let objects = source
        .get_folder("objects")
        .ok_or(Error::FolderNotFound("objects".into()))?;

    let mut archive = Archive::new("pack")?;
    let root = archive.root();
    archive.attach(root, FolderSource::Foreign(&source, objects))?;

    let actual = Archive::load(&archive.save(SaveOptions::default())?)?;
    assert_eq!(actual.folder_count(), 3);
    assert_eq!(
        actual.get_file("objects/textures/map.col").map(|f| f.data()),
        Some(&[1u8, 2, 3][..])
    );
    assert!(source.get_file("objects/enemy.bmd").is_some());

    Ok(())
}

#[test]
fn move_folder_and_save() -> Result<()> {
    let mut archive = stage()?;
    let root = archive.root();
    let textures = archive
        .get_folder("objects/textures")
        .ok_or(Error::FolderNotFound("objects/textures".into()))?;

    archive.attach(root, FolderSource::Owned(textures))?;
    assert!(archive.get_folder("objects/textures").is_none());

    let actual = Archive::load(&archive.save(SaveOptions::default())?)?;
    assert_eq!(actual.get_folder("textures"), Some(textures));
    assert!(actual.get_file("textures/enemy.bti").is_some());

    Ok(())
}

#[test]
fn reroot_and_save() -> Result<()> {
    let mut archive = stage()?;
    archive.reroot("archive")?;

    let actual = Archive::load(&archive.save(SaveOptions::default())?)?;
    assert_eq!(actual.folder(actual.root()).map(|f| f.name()), Some("archive".into()));
    assert!(actual.get_file("scene/map/map.bmd").is_some());
    assert_eq!(actual, archive);

    Ok(())
}

#[test]
fn root_only_archive() -> Result<()> {
    let archive = Archive::new("root")?;
    let bytes = archive.save(SaveOptions::default())?;

    // headers, one directory record, two navigation entries, ".\0..\0root\0"
    assert_eq!(bytes.len(), 0x40 + 0x20 + 0x40 + 0x20);
    assert_eq!(Archive::load(&bytes)?, archive);

    Ok(())
}
