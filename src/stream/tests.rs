//! Tests for the streaming reader and writer.

use std::io::{Cursor, Read, Write};

use crate::header::{checksum, GNU_LONG_LINK};
use crate::{padding, EntryType, HeaderError, HeaderRecord, PaxAttributes, BLOCK_SIZE};

use super::*;

/// Helper to create a tar archive using the tar crate.
fn create_tar_with<F>(f: F) -> Vec<u8>
where
    F: FnOnce(&mut tar::Builder<&mut Vec<u8>>),
{
    let mut data = Vec::new();
    {
        let mut builder = tar::Builder::new(&mut data);
        f(&mut builder);
        builder.finish().unwrap();
    }
    data
}

/// Helper to append a file to a tar builder.
fn append_file(builder: &mut tar::Builder<&mut Vec<u8>>, path: &str, content: &[u8]) {
    let mut header = tar::Header::new_gnu();
    header.set_mode(0o644);
    header.set_uid(1000);
    header.set_gid(1000);
    header.set_mtime(1234567890);
    header.set_size(content.len() as u64);
    header.set_entry_type(tar::EntryType::Regular);
    builder.append_data(&mut header, path, content).unwrap();
}

/// Helper to create an archive with our own writer.
fn write_archive<F>(f: F) -> Vec<u8>
where
    F: FnOnce(&mut Writer<Sequential<Vec<u8>>>),
{
    let mut writer = Writer::sequential(Vec::new());
    f(&mut writer);
    writer.close().unwrap();
    writer.into_inner().into_inner()
}

fn add_file(writer: &mut Writer<Sequential<Vec<u8>>>, name: &str, content: &[u8]) {
    let meta = Metadata::new(0o644)
        .with_size(content.len() as u64)
        .with_mtime(1234567890)
        .with_owner(1000, 100);
    writer
        .add_file_simple(name, &meta, |out| out.write_all(content))
        .unwrap();
}

/// Read every entry, returning resolved headers and payloads.
fn read_all<S: ByteSource>(reader: &mut Reader<S>) -> Vec<(HeaderRecord, Vec<u8>)> {
    let mut entries = Vec::new();
    while let Some(mut entry) = reader.next_entry().unwrap() {
        let mut content = Vec::new();
        entry.read_to_end(&mut content).unwrap();
        entries.push((entry.header().clone(), content));
    }
    entries
}

fn raw_header(name: &[u8], entry_type: EntryType, size: i64) -> [u8; BLOCK_SIZE] {
    let mut header = HeaderRecord::new(entry_type);
    header.name = name.to_vec();
    header.mode = 0o644;
    header.size = size;
    header.encode().unwrap()
}

fn push_payload(archive: &mut Vec<u8>, data: &[u8]) {
    archive.extend_from_slice(data);
    archive.resize(archive.len() + padding(data.len() as u64) as usize, 0);
}

fn push_end(archive: &mut Vec<u8>) {
    archive.extend_from_slice(&[0u8; 2 * BLOCK_SIZE]);
}

fn fix_checksum(block: &mut [u8; BLOCK_SIZE]) {
    let sum = checksum(block);
    block[148..156].copy_from_slice(format!("{sum:06o}\0 ").as_bytes());
}

fn pax_entry(archive: &mut Vec<u8>, attrs: &PaxAttributes) {
    let data = attrs.format();
    archive.extend_from_slice(&raw_header(
        b"././@PaxHeader",
        EntryType::XHeader,
        data.len() as i64,
    ));
    push_payload(archive, &data);
}

fn long_name_entry(archive: &mut Vec<u8>, name: &[u8]) {
    let mut data = name.to_vec();
    data.push(0);
    archive.extend_from_slice(&raw_header(
        GNU_LONG_LINK,
        EntryType::GnuLongName,
        data.len() as i64,
    ));
    push_payload(archive, &data);
}

// =============================================================================
// Round trips through our own writer
// =============================================================================

#[test]
fn test_empty_archive() {
    let data = write_archive(|_| {});
    assert_eq!(data, vec![0u8; 1024]);

    let mut reader = Reader::sequential(data.as_slice());
    assert!(reader.next_entry().unwrap().is_none());
    // Stays terminated.
    assert!(reader.next_entry().unwrap().is_none());
}

#[test]
fn test_empty_stream() {
    let mut reader = Reader::sequential(std::io::empty());
    assert!(reader.next_entry().unwrap().is_none());
}

#[test]
fn test_single_file() {
    let data = write_archive(|w| add_file(w, "hello.txt", b"Hello, World!"));
    assert_eq!(data.len(), 3 * BLOCK_SIZE + 1024);

    let mut reader = Reader::sequential(data.as_slice());
    let mut entry = reader.next_entry().unwrap().expect("should have entry");
    let header = entry.header();
    assert_eq!(header.full_name().as_ref(), b"hello.txt");
    assert_eq!(header.entry_type, EntryType::Regular);
    assert_eq!(header.size, 13);
    assert_eq!(header.mode, 0o644);
    assert_eq!(header.uid, 1000);
    assert_eq!(header.gid, 100);
    assert_eq!(header.mtime, 1234567890);
    assert!(header.is_file());
    assert!(entry.pax().is_none());

    let mut content = String::new();
    entry.read_to_string(&mut content).unwrap();
    assert_eq!(content, "Hello, World!");
    assert!(entry.is_eof());
    assert_eq!(entry.bytes_read(), 13);
    let mut buf = [0u8; 8];
    assert_eq!(entry.read(&mut buf).unwrap(), 0);
    drop(entry);

    assert!(reader.next_entry().unwrap().is_none());
}

#[test]
fn test_unread_payloads_are_skipped() {
    let big = vec![0xa5u8; 3000];
    let data = write_archive(|w| {
        add_file(w, "big.bin", &big);
        add_file(w, "small.txt", b"small");
        add_file(w, "empty", b"");
        add_file(w, "last.txt", b"last");
    });

    for seekable in [false, true] {
        let names: Vec<Vec<u8>> = if seekable {
            let mut reader = Reader::seekable(Cursor::new(data.clone()));
            assert!(reader.is_seekable());
            collect_names_partial(&mut reader)
        } else {
            let mut reader = Reader::sequential(data.as_slice());
            assert!(!reader.is_seekable());
            collect_names_partial(&mut reader)
        };
        assert_eq!(
            names,
            vec![
                b"big.bin".to_vec(),
                b"small.txt".to_vec(),
                b"empty".to_vec(),
                b"last.txt".to_vec()
            ]
        );
    }
}

/// Read at most 10 bytes of each entry, then move on.
fn collect_names_partial<S: ByteSource>(reader: &mut Reader<S>) -> Vec<Vec<u8>> {
    let mut names = Vec::new();
    while let Some(mut entry) = reader.next_entry().unwrap() {
        let mut buf = [0u8; 10];
        let n = entry.read(&mut buf).unwrap();
        assert_eq!(n as u64, entry.size().min(10));
        names.push(entry.header().full_name().into_owned());
    }
    names
}

#[test]
fn test_reads_never_cross_entry_boundary() {
    let data = write_archive(|w| {
        add_file(w, "a", b"first");
        add_file(w, "b", b"second");
    });
    let mut reader = Reader::sequential(data.as_slice());
    let mut entry = reader.next_entry().unwrap().unwrap();
    let mut buf = [0u8; 4096];
    assert_eq!(entry.read(&mut buf).unwrap(), 5);
    assert_eq!(&buf[..5], b"first");
    assert_eq!(entry.read(&mut buf).unwrap(), 0);
}

#[test]
fn test_directory_symlink_and_link() {
    let data = write_archive(|w| {
        let meta = Metadata::new(0o755).with_mtime(1000);
        w.mkdir("dir", &meta).unwrap();
        add_file(w, "dir/file", b"content");
        w.symlink("dir/sym", "file", &Metadata::new(0o777)).unwrap();
        w.link("dir/hard", "dir/file", &Metadata::new(0o644)).unwrap();
    });

    let entries = read_all(&mut Reader::sequential(data.as_slice()));
    assert_eq!(entries.len(), 4);

    let (dir, content) = &entries[0];
    assert_eq!(dir.entry_type, EntryType::Directory);
    assert!(dir.is_directory());
    assert_eq!(dir.mode, 0o755);
    assert_eq!(dir.size, 0);
    assert!(content.is_empty());

    let (sym, _) = &entries[2];
    assert!(sym.is_symlink());
    assert_eq!(sym.link_name, b"file");

    let (hard, _) = &entries[3];
    assert_eq!(hard.entry_type, EntryType::Link);
    assert_eq!(hard.link_name, b"dir/file");
    assert_eq!(hard.size, 0);
}

#[test]
fn test_owner_names() {
    let data = write_archive(|w| {
        let meta = Metadata::new(0o600).with_owner_names("alice", "staff");
        w.add_file_simple("f", &meta, |_| Ok(())).unwrap();
    });
    let entries = read_all(&mut Reader::sequential(data.as_slice()));
    assert_eq!(entries[0].0.uname, b"alice");
    assert_eq!(entries[0].0.gname, b"staff");
}

// =============================================================================
// Name placement
// =============================================================================

#[test]
fn test_prefix_boundary_155_100() {
    let name = format!("{}/{}", "a".repeat(155), "b".repeat(100));
    let data = write_archive(|w| add_file(w, &name, b"x"));

    // No extension entry: the first block is the real header.
    let first: &[u8; BLOCK_SIZE] = data[..BLOCK_SIZE].try_into().unwrap();
    let header = HeaderRecord::decode(first).unwrap().unwrap();
    assert_eq!(header.entry_type, EntryType::Regular);
    assert_eq!(header.prefix, "a".repeat(155).into_bytes());
    assert_eq!(header.name, "b".repeat(100).into_bytes());

    let entries = read_all(&mut Reader::sequential(data.as_slice()));
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].0.full_name().as_ref(), name.as_bytes());
}

#[test]
fn test_gnu_long_name_written() {
    let name = "x".repeat(300);
    let data = write_archive(|w| add_file(w, &name, b"payload"));

    let first: &[u8; BLOCK_SIZE] = data[..BLOCK_SIZE].try_into().unwrap();
    let marker = HeaderRecord::decode(first).unwrap().unwrap();
    assert!(marker.is_long_name_marker());
    assert_eq!(marker.size, 301);
    assert_eq!(&data[BLOCK_SIZE..BLOCK_SIZE + 300], name.as_bytes());
    assert_eq!(data[BLOCK_SIZE + 300], 0);

    let real: &[u8; BLOCK_SIZE] = data[2 * BLOCK_SIZE..3 * BLOCK_SIZE].try_into().unwrap();
    let real = HeaderRecord::decode(real).unwrap().unwrap();
    assert_eq!(real.name, "x".repeat(100).into_bytes());

    let entries = read_all(&mut Reader::sequential(data.as_slice()));
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].0.full_name().as_ref(), name.as_bytes());
    assert!(entries[0].0.prefix.is_empty());
    assert_eq!(entries[0].1, b"payload");
}

#[test]
fn test_long_name_for_unsplittable_paths() {
    let names = [
        format!("{}/{}", "d".repeat(162), "e".repeat(10)),
        format!("{}/{}", "f".repeat(10), "g".repeat(110)),
        format!("{}/", "h".repeat(120)),
        format!("/{}", "i".repeat(100)),
    ];
    let data = write_archive(|w| {
        for name in &names {
            add_file(w, name, name.as_bytes());
        }
    });
    let entries = read_all(&mut Reader::sequential(data.as_slice()));
    assert_eq!(entries.len(), names.len());
    for ((header, content), name) in entries.iter().zip(&names) {
        assert_eq!(header.full_name().as_ref(), name.as_bytes());
        assert_eq!(content, name.as_bytes());
    }
}

#[test]
fn test_long_symlink_name() {
    let name = "s".repeat(180);
    let data = write_archive(|w| w.symlink(&name, "target", &Metadata::new(0o777)).unwrap());
    let entries = read_all(&mut Reader::sequential(data.as_slice()));
    assert_eq!(entries[0].0.full_name().as_ref(), name.as_bytes());
    assert_eq!(entries[0].0.link_name, b"target");
}

#[test]
fn test_symlink_target_too_long() {
    let mut writer = Writer::sequential(Vec::new());
    let err = writer
        .symlink("link", "t".repeat(101), &Metadata::new(0o777))
        .unwrap_err();
    assert!(matches!(
        err,
        StreamError::FileNameTooLong {
            len: 101,
            limit: 100
        }
    ));
    let err = writer
        .link("link", "t".repeat(150), &Metadata::new(0o644))
        .unwrap_err();
    assert!(matches!(err, StreamError::FileNameTooLong { len: 150, .. }));
    // Nothing was written.
    assert_eq!(writer.position(), 0);
}

#[test]
fn test_invalid_names() {
    let mut writer = Writer::sequential(Vec::new());
    assert!(matches!(
        writer.mkdir("", &Metadata::new(0o755)),
        Err(StreamError::InvalidName(_))
    ));
    assert!(matches!(
        writer.add_file_simple("a\0b", &Metadata::new(0o644), |_| Ok(())),
        Err(StreamError::InvalidName(_))
    ));
    assert_eq!(writer.position(), 0);
}

// =============================================================================
// Writer bounds
// =============================================================================

#[test]
fn test_write_boundary_overflow() {
    let mut writer = Writer::sequential(Vec::new());
    let meta = Metadata::new(0o644).with_size(5);
    let err = writer
        .add_file_simple("f", &meta, |out| {
            out.write_all(b"abc")?;
            assert_eq!(out.remaining(), Some(2));
            out.write_all(b"def")
        })
        .unwrap_err();
    assert!(matches!(err, StreamError::WriteBoundaryOverflow { size: 5 }));

    // Header plus the bytes that fit; none of the offending write.
    let data = writer.into_inner().into_inner();
    assert_eq!(data.len(), BLOCK_SIZE + 3);
    assert_eq!(&data[BLOCK_SIZE..], b"abc");
}

#[test]
fn test_swallowed_overflow_still_fails() {
    let mut writer = Writer::sequential(Vec::new());
    let meta = Metadata::new(0o644).with_size(2);
    let err = writer
        .add_file_simple("f", &meta, |out| {
            let _ = out.write(b"too long");
            Ok(())
        })
        .unwrap_err();
    assert!(matches!(err, StreamError::WriteBoundaryOverflow { size: 2 }));
}

#[test]
fn test_short_payload_is_padded() {
    let data = write_archive(|w| {
        let meta = Metadata::new(0o644).with_size(10);
        w.add_file_simple("short", &meta, |out| {
            out.write_all(b"abc")?;
            assert_eq!(out.bytes_written(), 3);
            Ok(())
        })
        .unwrap();
        add_file(w, "next", b"n");
    });
    assert_eq!(data.len(), 4 * BLOCK_SIZE + 1024);

    let entries = read_all(&mut Reader::sequential(data.as_slice()));
    assert_eq!(entries[0].1, b"abc\0\0\0\0\0\0\0");
    assert_eq!(entries[1].0.full_name().as_ref(), b"next");
}

#[test]
fn test_payload_error_propagates() {
    let mut writer = Writer::sequential(Vec::new());
    let meta = Metadata::new(0o644).with_size(1);
    let err = writer
        .add_file_simple("f", &meta, |_| {
            Err(std::io::Error::other("source failed"))
        })
        .unwrap_err();
    assert!(matches!(err, StreamError::Io(_)));
}

#[test]
fn test_closed_writer() {
    let mut writer = Writer::sequential(Vec::new());
    writer.close().unwrap();
    assert!(writer.is_closed());

    let meta = Metadata::new(0o644);
    assert!(matches!(
        writer.add_file_simple("f", &meta, |_| Ok(())),
        Err(StreamError::ClosedStream)
    ));
    assert!(matches!(writer.mkdir("d", &meta), Err(StreamError::ClosedStream)));
    assert!(matches!(
        writer.symlink("l", "t", &meta),
        Err(StreamError::ClosedStream)
    ));
    assert!(matches!(writer.flush(), Err(StreamError::ClosedStream)));
    assert!(matches!(writer.close(), Err(StreamError::ClosedStream)));
    assert_eq!(writer.into_inner().into_inner().len(), 1024);
}

#[test]
fn test_add_file_requires_seek() {
    let mut writer = Writer::sequential(Vec::new());
    let err = writer
        .add_file("f", &Metadata::new(0o644), |out| out.write_all(b"data"))
        .unwrap_err();
    assert!(matches!(err, StreamError::NonSeekableStream));
    assert_eq!(writer.position(), 0);
}

#[test]
fn test_add_file_patches_size() {
    let mut writer = Writer::seekable(Cursor::new(Vec::new()));
    let meta = Metadata::new(0o640).with_mtime(42);
    writer
        .add_file("streamed.log", &meta, |out| {
            for i in 0..100 {
                writeln!(out, "line {i}")?;
            }
            Ok(())
        })
        .unwrap();
    writer
        .add_file(format!("{}/tail", "p".repeat(120)), &meta, |out| {
            out.write_all(b"second")
        })
        .unwrap();
    writer.close().unwrap();
    let data = writer.into_inner().into_inner().into_inner();

    let expected: String = (0..100).map(|i| format!("line {i}\n")).collect();
    let entries = read_all(&mut Reader::sequential(data.as_slice()));
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].0.size, expected.len() as i64);
    assert_eq!(entries[0].0.mode, 0o640);
    assert_eq!(entries[0].0.mtime, 42);
    assert_eq!(entries[0].1, expected.into_bytes());
    assert_eq!(entries[1].1, b"second");
    assert_eq!(
        entries[1].0.full_name().into_owned(),
        format!("{}/tail", "p".repeat(120)).into_bytes()
    );
}

#[test]
fn test_add_file_tempfile() {
    let file = tempfile::tempfile().unwrap();
    let mut writer = Writer::seekable(file);
    writer
        .add_file("a.txt", &Metadata::new(0o644), |out| out.write_all(&[7u8; 700]))
        .unwrap();
    writer.close().unwrap();
    let mut file = writer.into_inner().into_inner();

    use std::io::{Seek, SeekFrom};
    file.seek(SeekFrom::Start(0)).unwrap();
    let mut reader = Reader::seekable(file);
    let entries = read_all(&mut reader);
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].0.size, 700);
    assert_eq!(entries[0].1, vec![7u8; 700]);
}

#[test]
fn test_negative_mtime_uses_pax() {
    let data = write_archive(|w| {
        let meta = Metadata::new(0o644).with_size(1).with_mtime(-86400);
        w.add_file_simple("old", &meta, |out| out.write_all(b"o"))
            .unwrap();
    });

    let first: &[u8; BLOCK_SIZE] = data[..BLOCK_SIZE].try_into().unwrap();
    assert!(HeaderRecord::decode(first).unwrap().unwrap().is_pax_header());

    let mut reader = Reader::sequential(data.as_slice());
    let entry = reader.next_entry().unwrap().unwrap();
    assert_eq!(entry.header().mtime, -86400);
    assert_eq!(entry.pax().and_then(|p| p.get("mtime")), Some("-86400"));
}

// =============================================================================
// Extension handling on read
// =============================================================================

#[test]
fn test_pax_size_takes_precedence() {
    let payload = vec![0x5au8; 1_048_576];
    let mut archive = Vec::new();
    let mut attrs = PaxAttributes::new();
    attrs.set_size(1_048_576);
    pax_entry(&mut archive, &attrs);
    archive.extend_from_slice(&raw_header(b"big", EntryType::Regular, 12345));
    push_payload(&mut archive, &payload);
    archive.extend_from_slice(&raw_header(b"after", EntryType::Regular, 0));
    push_end(&mut archive);

    let entries = read_all(&mut Reader::sequential(archive.as_slice()));
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].0.size, 1_048_576);
    assert!(entries[0].1 == payload);
    assert_eq!(entries[1].0.full_name().as_ref(), b"after");
}

#[test]
fn test_pax_path_overrides_long_name() {
    let mut archive = Vec::new();
    long_name_entry(&mut archive, b"from/long/name");
    let mut attrs = PaxAttributes::new();
    attrs.set_path("from/pax/path");
    attrs.insert("mtime", "1234567890.75");
    pax_entry(&mut archive, &attrs);
    archive.extend_from_slice(&raw_header(b"short", EntryType::Regular, 2));
    push_payload(&mut archive, b"ok");
    push_end(&mut archive);

    let mut reader = Reader::sequential(archive.as_slice());
    let mut entry = reader.next_entry().unwrap().unwrap();
    assert_eq!(entry.header().full_name().as_ref(), b"from/pax/path");
    assert_eq!(entry.header().mtime, 1234567890);
    assert_eq!(entry.pax().unwrap().path().unwrap(), Some("from/pax/path"));
    let mut content = Vec::new();
    entry.read_to_end(&mut content).unwrap();
    assert_eq!(content, b"ok");
}

#[test]
fn test_pax_fractional_negative_mtime_floors() {
    let mut archive = Vec::new();
    let mut attrs = PaxAttributes::new();
    attrs.insert("mtime", "-1.5");
    pax_entry(&mut archive, &attrs);
    archive.extend_from_slice(&raw_header(b"f", EntryType::Regular, 0));
    push_end(&mut archive);

    let entries = read_all(&mut Reader::sequential(archive.as_slice()));
    assert_eq!(entries[0].0.mtime, -2);
}

#[test]
fn test_pax_binary_xattr_is_kept() {
    let capability = b"\x01\x00\x00\x02\xff\xfe";
    let mut archive = Vec::new();
    let mut attrs = PaxAttributes::new();
    attrs.insert("SCHILY.xattr.security.capability", &capability[..]);
    pax_entry(&mut archive, &attrs);
    archive.extend_from_slice(&raw_header(b"ping", EntryType::Regular, 3));
    push_payload(&mut archive, b"bin");
    push_end(&mut archive);

    let mut reader = Reader::sequential(archive.as_slice());
    let mut entry = reader.next_entry().unwrap().unwrap();
    assert_eq!(entry.header().full_name().as_ref(), b"ping");
    let pax = entry.pax().unwrap();
    assert_eq!(
        pax.get_bytes("SCHILY.xattr.security.capability"),
        Some(&capability[..])
    );
    let mut content = Vec::new();
    entry.read_to_end(&mut content).unwrap();
    assert_eq!(content, b"bin");
    drop(entry);
    assert!(reader.next_entry().unwrap().is_none());
}

#[test]
fn test_long_name_without_nul_is_trimmed() {
    let mut archive = Vec::new();
    let data = b"spaced/name  \n";
    archive.extend_from_slice(&raw_header(
        GNU_LONG_LINK,
        EntryType::GnuLongName,
        data.len() as i64,
    ));
    push_payload(&mut archive, data);
    archive.extend_from_slice(&raw_header(b"short", EntryType::Regular, 0));
    push_end(&mut archive);

    let entries = read_all(&mut Reader::sequential(archive.as_slice()));
    assert_eq!(entries[0].0.full_name().as_ref(), b"spaced/name");
}

#[test]
fn test_extensions_cut_off_by_end_marker() {
    let mut archive = Vec::new();
    long_name_entry(&mut archive, b"orphan");
    push_end(&mut archive);

    let mut reader = Reader::sequential(archive.as_slice());
    assert!(reader.next_entry().unwrap().is_none());
}

#[test]
fn test_duplicate_long_name() {
    let mut archive = Vec::new();
    long_name_entry(&mut archive, b"one");
    long_name_entry(&mut archive, b"two");
    archive.extend_from_slice(&raw_header(b"f", EntryType::Regular, 0));
    push_end(&mut archive);

    let err = Reader::sequential(archive.as_slice())
        .next_entry()
        .unwrap_err();
    assert!(matches!(err, StreamError::DuplicateExtension(_)));
}

#[test]
fn test_too_many_extension_headers() {
    let mut archive = Vec::new();
    long_name_entry(&mut archive, b"one");
    pax_entry(&mut archive, &PaxAttributes::new());
    archive.extend_from_slice(&raw_header(b"f", EntryType::Regular, 0));
    push_end(&mut archive);

    let limits = Limits {
        max_pending_entries: 1,
        ..Default::default()
    };
    let mut reader = Reader::with_limits(Sequential::new(archive.as_slice()), limits);
    let err = reader.next_entry().unwrap_err();
    assert!(matches!(
        err,
        StreamError::TooManyExtensionHeaders { count: 2, limit: 1 }
    ));

    // Both extensions are fine under the default limits.
    let entries = read_all(&mut Reader::sequential(archive.as_slice()));
    assert_eq!(entries[0].0.full_name().as_ref(), b"one");
}

#[test]
fn test_long_name_too_large() {
    let name = "n".repeat(5000);
    let data = write_archive(|w| add_file(w, &name, b""));

    let err = Reader::sequential(data.as_slice())
        .next_entry()
        .unwrap_err();
    assert!(matches!(
        err,
        StreamError::ExtensionTooLarge {
            size: 5001,
            limit: 4097,
            ..
        }
    ));

    let mut reader = Reader::with_limits(Sequential::new(data.as_slice()), Limits::permissive());
    let entry = reader.next_entry().unwrap().unwrap();
    assert_eq!(entry.header().full_name().len(), 5000);
}

#[test]
fn test_longest_allowed_path_roundtrips() {
    let name = "x".repeat(4096);
    let data = write_archive(|w| add_file(w, &name, b"max"));

    let mut reader = Reader::sequential(data.as_slice());
    let mut entry = reader.next_entry().unwrap().unwrap();
    assert_eq!(entry.header().full_name().as_ref(), name.as_bytes());
    let mut content = Vec::new();
    entry.read_to_end(&mut content).unwrap();
    assert_eq!(content, b"max");
}

#[test]
fn test_path_too_long() {
    let name = "x".repeat(200);
    let data = write_archive(|w| add_file(w, &name, b"content"));

    let limits = Limits {
        max_path_len: 100,
        ..Default::default()
    };
    let err = Reader::with_limits(Sequential::new(data.as_slice()), limits)
        .next_entry()
        .unwrap_err();
    assert!(matches!(
        err,
        StreamError::PathTooLong {
            len: 200,
            limit: 100
        }
    ));
}

#[test]
fn test_pax_global_header_is_an_entry() {
    let mut archive = Vec::new();
    let data = PaxAttributes::new().format();
    archive.extend_from_slice(&raw_header(b"pax_global_header", EntryType::Other(b'g'), 0));
    push_payload(&mut archive, &data);
    archive.extend_from_slice(&raw_header(b"f", EntryType::Regular, 0));
    push_end(&mut archive);

    let entries = read_all(&mut Reader::sequential(archive.as_slice()));
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].0.entry_type, EntryType::Other(b'g'));
}

// =============================================================================
// Malformed archives
// =============================================================================

#[test]
fn test_invalid_magic() {
    let mut block = raw_header(b"f", EntryType::Regular, 0);
    block[257..263].copy_from_slice(b"notar\0");
    fix_checksum(&mut block);
    let mut archive = block.to_vec();
    push_end(&mut archive);

    let err = Reader::sequential(archive.as_slice())
        .next_entry()
        .unwrap_err();
    assert!(matches!(err, StreamError::InvalidTarStream(_)));
}

#[test]
fn test_checksum_mismatch() {
    let mut block = raw_header(b"f", EntryType::Regular, 0);
    block[0] = b'g';
    let mut archive = block.to_vec();
    push_end(&mut archive);

    let err = Reader::sequential(archive.as_slice())
        .next_entry()
        .unwrap_err();
    assert!(matches!(
        err,
        StreamError::Header(HeaderError::ChecksumMismatch { .. })
    ));
}

#[test]
fn test_invalid_numeric_field() {
    let mut block = raw_header(b"f", EntryType::Regular, 0);
    block[124..136].copy_from_slice(b"0000000001x\0");
    fix_checksum(&mut block);
    let mut archive = block.to_vec();
    push_end(&mut archive);

    let err = Reader::sequential(archive.as_slice())
        .next_entry()
        .unwrap_err();
    assert!(matches!(
        err,
        StreamError::Header(HeaderError::InvalidNumericField { field: "size", .. })
    ));
}

#[test]
fn test_negative_size() {
    let mut block = raw_header(b"f", EntryType::Regular, 0);
    block[124..136].copy_from_slice(&[0xff; 12]);
    fix_checksum(&mut block);
    let mut archive = block.to_vec();
    push_end(&mut archive);

    let err = Reader::sequential(archive.as_slice())
        .next_entry()
        .unwrap_err();
    assert!(matches!(err, StreamError::InvalidTarStream(_)));
}

#[test]
fn test_base256_size() {
    let mut block = raw_header(b"f", EntryType::Regular, 0);
    block[124..136].copy_from_slice(&[0x80, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 5]);
    fix_checksum(&mut block);
    let mut archive = block.to_vec();
    push_payload(&mut archive, b"12345");
    push_end(&mut archive);

    let entries = read_all(&mut Reader::sequential(archive.as_slice()));
    assert_eq!(entries[0].0.size, 5);
    assert_eq!(entries[0].1, b"12345");
}

#[test]
fn test_truncated_header() {
    let data = write_archive(|w| add_file(w, "f", b"x"));
    let mut reader = Reader::sequential(&data[..100]);
    let err = reader.next_entry().unwrap_err();
    assert!(matches!(err, StreamError::UnexpectedEof { pos: 100 }));
}

#[test]
fn test_truncated_payload_on_skip() {
    let data = write_archive(|w| {
        add_file(w, "big", &[1u8; 2000]);
        add_file(w, "next", b"n");
    });
    let truncated = &data[..BLOCK_SIZE + 1000];

    let mut reader = Reader::sequential(truncated);
    let entry = reader.next_entry().unwrap().unwrap();
    drop(entry);
    let err = reader.next_entry().unwrap_err();
    assert!(matches!(err, StreamError::UnexpectedEof { pos: 1512 }));
}

#[test]
fn test_truncated_payload_on_seek_skip() {
    let data = write_archive(|w| {
        add_file(w, "big", &[1u8; 2000]);
        add_file(w, "next", b"n");
    });
    let truncated = data[..BLOCK_SIZE + 1000].to_vec();

    let mut reader = Reader::seekable(Cursor::new(truncated.clone()));
    let entry = reader.next_entry().unwrap().unwrap();
    drop(entry);
    let err = reader.next_entry().unwrap_err();
    assert!(matches!(err, StreamError::UnexpectedEof { pos: 1512 }));

    // Positions stay relative to where the archive starts.
    let mut shifted = vec![0xaa; 100];
    shifted.extend_from_slice(&truncated);
    let mut cursor = Cursor::new(shifted);
    cursor.set_position(100);
    let mut reader = Reader::seekable(cursor);
    drop(reader.next_entry().unwrap().unwrap());
    let err = reader.next_entry().unwrap_err();
    assert!(matches!(err, StreamError::UnexpectedEof { pos: 1512 }));
}

#[test]
fn test_truncated_payload_on_read() {
    let data = write_archive(|w| add_file(w, "big", &[1u8; 2000]));
    let truncated = &data[..BLOCK_SIZE + 1000];

    let mut reader = Reader::sequential(truncated);
    let mut entry = reader.next_entry().unwrap().unwrap();
    let mut content = Vec::new();
    let err = entry.read_to_end(&mut content).unwrap_err();
    assert_eq!(err.kind(), std::io::ErrorKind::UnexpectedEof);
    assert_eq!(content.len(), 1000);
}

#[test]
fn test_old_format_header() {
    let mut block = raw_header(b"v7/file", EntryType::Regular, 3);
    block[156] = 0;
    block[257..BLOCK_SIZE].fill(0);
    fix_checksum(&mut block);
    let mut archive = block.to_vec();
    push_payload(&mut archive, b"old");
    push_end(&mut archive);

    let entries = read_all(&mut Reader::sequential(archive.as_slice()));
    assert_eq!(entries[0].0.format, crate::HeaderFormat::Old);
    assert_eq!(entries[0].1, b"old");
}

// =============================================================================
// Rewinding and closing
// =============================================================================

#[test]
fn test_reader_rewind() {
    let data = write_archive(|w| {
        add_file(w, "one", b"1");
        add_file(w, "two", b"22");
    });

    let mut reader = Reader::seekable(Cursor::new(data.clone()));
    let first = read_all(&mut reader);
    reader.rewind().unwrap();
    assert_eq!(reader.position(), 0);
    let second = read_all(&mut reader);
    similar_asserts::assert_eq!(first, second);

    let mut reader = Reader::sequential(data.as_slice());
    assert!(matches!(reader.rewind(), Err(StreamError::NonSeekableStream)));
}

#[test]
fn test_reader_rewind_returns_to_initial_position() {
    let archive = write_archive(|w| add_file(w, "f", b"content"));
    let mut data = b"leading garbage".to_vec();
    let offset = data.len() as u64;
    data.extend_from_slice(&archive);

    let mut cursor = Cursor::new(data);
    cursor.set_position(offset);
    let mut reader = Reader::seekable(cursor);
    let first = read_all(&mut reader);
    reader.rewind().unwrap();
    let second = read_all(&mut reader);
    assert_eq!(first.len(), 1);
    assert_eq!(first, second);
}

#[test]
fn test_entry_rewind() {
    let data = write_archive(|w| {
        add_file(w, "f", b"rewindable");
        add_file(w, "g", b"next");
    });
    let mut reader = Reader::seekable(Cursor::new(data.clone()));
    {
        let mut entry = reader.next_entry().unwrap().unwrap();
        let mut first = Vec::new();
        entry.read_to_end(&mut first).unwrap();
        entry.rewind().unwrap();
        assert_eq!(entry.bytes_read(), 0);
        let mut second = Vec::new();
        entry.read_to_end(&mut second).unwrap();
        assert_eq!(first, second);
        assert_eq!(first, b"rewindable");
    }
    let mut entry = reader.next_entry().unwrap().unwrap();
    let mut content = Vec::new();
    entry.read_to_end(&mut content).unwrap();
    assert_eq!(content, b"next");

    let mut reader = Reader::sequential(data.as_slice());
    let mut entry = reader.next_entry().unwrap().unwrap();
    assert!(matches!(entry.rewind(), Err(StreamError::NonSeekableStream)));
}

#[test]
fn test_entry_close() {
    let data = write_archive(|w| {
        add_file(w, "f", b"closed early");
        add_file(w, "g", b"next");
    });
    let mut reader = Reader::sequential(data.as_slice());
    {
        let mut entry = reader.next_entry().unwrap().unwrap();
        let mut buf = [0u8; 3];
        entry.read_exact(&mut buf).unwrap();
        entry.close().unwrap();
        assert!(entry.is_closed());
        let err = entry.read(&mut buf).unwrap_err();
        assert!(matches!(StreamError::from(err), StreamError::ClosedStream));
        assert!(matches!(entry.rewind(), Err(StreamError::ClosedStream)));
        entry.close().unwrap();
    }
    let entries = read_all(&mut reader);
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].1, b"next");
}

// =============================================================================
// Interop with the tar crate
// =============================================================================

#[test]
fn test_read_tar_crate_archive() {
    let long_path = format!("very/long/path/{}", "x".repeat(120));
    let data = create_tar_with(|b| {
        append_file(b, "hello.txt", b"Hello, World!");
        append_file(b, &long_path, b"content");
        let mut header = tar::Header::new_gnu();
        header.set_mode(0o755);
        header.set_entry_type(tar::EntryType::Directory);
        header.set_size(0);
        b.append_data(&mut header, "mydir/", std::io::empty()).unwrap();
    });

    let entries = read_all(&mut Reader::sequential(data.as_slice()));
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0].0.format, crate::HeaderFormat::Gnu);
    assert_eq!(entries[0].0.uid, 1000);
    assert_eq!(entries[0].0.mtime, 1234567890);
    assert_eq!(entries[0].1, b"Hello, World!");
    assert_eq!(entries[1].0.full_name().as_ref(), long_path.as_bytes());
    assert_eq!(entries[1].1, b"content");
    assert!(entries[2].0.is_directory());
    assert_eq!(entries[2].0.full_name().as_ref(), b"mydir/");
}

#[test]
fn test_tar_crate_reads_our_archive() {
    let paths = vec![
        "short.txt".to_string(),
        format!("medium/{}", "m".repeat(80)),
        format!("{}/{}", "p".repeat(120), "q".repeat(60)),
        format!("long/{}", "l".repeat(150)),
    ];
    let data = write_archive(|w| {
        for path in &paths {
            add_file(w, path, path.as_bytes());
        }
    });

    let mut archive = tar::Archive::new(Cursor::new(data));
    let mut seen = Vec::new();
    for entry in archive.entries().unwrap() {
        let mut entry = entry.unwrap();
        let path = entry.path_bytes().into_owned();
        assert_eq!(entry.header().mode().unwrap(), 0o644);
        assert_eq!(entry.header().uid().unwrap(), 1000);
        assert_eq!(entry.header().mtime().unwrap(), 1234567890);
        let mut content = Vec::new();
        entry.read_to_end(&mut content).unwrap();
        assert_eq!(content, path);
        seen.push(String::from_utf8(path).unwrap());
    }
    similar_asserts::assert_eq!(seen, paths);
}
