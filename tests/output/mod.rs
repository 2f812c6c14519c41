//! Serialization and file output

use crate::fixtures::{CATALOG, REPEATED};
use pretty_assertions::assert_eq;
use simplexml::{load_file, load_string, XmlError};

#[test]
fn serialization_round_trips() {
    for xml in [CATALOG, REPEATED, "<r>a &amp; b<![CDATA[<c>]]></r>"] {
        let first = load_string(xml).unwrap().as_xml().unwrap();
        let second = load_string(&first).unwrap().as_xml().unwrap();
        assert_eq!(first, second);
    }
}

#[test]
fn document_and_fragment_output() {
    let root = load_string(r#"<?xml version="1.0" encoding="UTF-8"?><r><a x="1">hi</a><b/></r>"#)
        .unwrap();
    assert_eq!(
        root.as_xml().unwrap(),
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<r><a x=\"1\">hi</a><b/></r>\n"
    );
    assert_eq!(
        root.get_field("a").unwrap().as_xml().unwrap(),
        r#"<a x="1">hi</a>"#
    );
    assert_eq!(
        root.get_field("a").unwrap().attributes(None, false).unwrap().as_xml().unwrap(),
        r#"x="1""#
    );
    assert_eq!(root.encoding(), "UTF-8");
}

#[test]
fn escaping() {
    let root = load_string("<r/>").unwrap();
    root.add_child("t", Some("<&>\"'"), None).unwrap();
    root.add_attribute("a", Some("x<y"), None).unwrap();
    assert_eq!(
        root.as_xml().unwrap(),
        "<?xml version=\"1.0\"?>\n<r a=\"x&lt;y\"><t>&lt;&amp;&gt;&quot;&apos;</t></r>\n"
    );
}

#[test]
fn write_file_and_load_back() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("catalog.xml");

    let root = load_string(CATALOG).unwrap();
    assert!(root.as_xml_to_file(&path, None));

    let written = std::fs::read_to_string(&path).unwrap();
    assert_eq!(written, root.as_xml().unwrap());

    let reloaded = load_file(&path).unwrap();
    assert_eq!(reloaded.get_field("book").unwrap().count(), 2);
}

#[test]
fn write_file_with_encoding() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("latin.xml");

    let root = load_string("<r>café</r>").unwrap();
    assert!(root.as_xml_to_file(&path, Some("ISO-8859-1")));

    let bytes = std::fs::read(&path).unwrap();
    assert!(bytes.contains(&0xE9));
    assert!(!bytes.windows(2).any(|w| w == [0xC3, 0xA9]));
    assert!(bytes.starts_with(b"<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?>"));

    let reloaded = load_file(&path).unwrap();
    assert_eq!(reloaded.to_string(), "café");
    assert_eq!(reloaded.encoding(), "ISO-8859-1");
}

#[test]
fn write_file_rewrites_declared_encoding() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("wide.xml");

    let root = load_string("<?xml version=\"1.0\" encoding=\"UTF-8\"?><r>a</r>").unwrap();
    assert!(root.as_xml_to_file(&path, Some("UTF-16LE")));

    let bytes = std::fs::read(&path).unwrap();
    assert_eq!(&bytes[..2], &[0xFF, 0xFE]);
    let units: Vec<u16> = bytes[2..]
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect();
    let text = String::from_utf16(&units).unwrap();
    assert_eq!(text, "<?xml version=\"1.0\" encoding=\"UTF-16LE\"?>\n<r>a</r>\n");

    let reloaded = load_file(&path).unwrap();
    assert_eq!(reloaded.to_string(), "a");
    assert_eq!(reloaded.encoding(), "UTF-16LE");

    // The in-memory document keeps its own declaration
    assert_eq!(root.encoding(), "UTF-8");
}

#[test]
fn write_file_in_declared_encoding_and_load_back() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("declared.xml");

    let root = load_string("<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?><r>café</r>").unwrap();
    assert!(root.as_xml_to_file(&path, None));
    assert!(std::fs::read(&path).unwrap().contains(&0xE9));

    let reloaded = load_file(&path).unwrap();
    assert_eq!(reloaded.to_string(), "café");
    assert_eq!(reloaded.as_xml().unwrap(), root.as_xml().unwrap());
}

#[test]
fn write_file_unmarked_utf16_is_big_endian() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("utf16.xml");

    let root = load_string("<r>é</r>").unwrap();
    assert!(root.as_xml_to_file(&path, Some("UTF-16")));

    let bytes = std::fs::read(&path).unwrap();
    assert_eq!(&bytes[..4], &[0xFE, 0xFF, 0x00, b'<']);
    let reloaded = load_file(&path).unwrap();
    assert_eq!(reloaded.to_string(), "é");
    assert_eq!(reloaded.encoding(), "UTF-16");
}

#[test]
fn write_file_failures_report_false() {
    let dir = tempfile::tempdir().unwrap();

    let root = load_string("<r>café</r>").unwrap();
    let ascii = dir.path().join("ascii.xml");
    assert!(!root.as_xml_to_file(&ascii, Some("US-ASCII")));
    assert!(!ascii.exists());

    let missing_dir = dir.path().join("no-such-dir").join("out.xml");
    assert!(!root.as_xml_to_file(&missing_dir, None));

    // No stray temporary files are left behind
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn load_errors() {
    assert!(matches!(load_string("<a><b></a>"), Err(XmlError::Parse(_))));
    assert!(matches!(load_string(""), Err(XmlError::Parse(_))));

    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
        load_file(dir.path().join("absent.xml")),
        Err(XmlError::Io(_))
    ));
}
