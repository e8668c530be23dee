use itemdedup::document::{load, LoadError, LoadOptions, LOOKAHEAD};

fn load_bytes(bytes: &[u8]) -> Result<itemdedup::document::Document, LoadError> {
    let mut input = bytes;
    load(&mut input, &LoadOptions::default())
}

fn message(bytes: &[u8]) -> String {
    load_bytes(bytes).unwrap_err().to_string()
}

#[test]
fn test_empty_input() {
    assert_eq!(message(b""), "content is empty");
}

#[test]
fn test_missing_declaration() {
    assert_eq!(message(b"<Root><Item id=\"a\"/></Root>"), "invalid xml format");
    assert_eq!(message(b"  <?xml version=\"1.0\"?><Root/>"), "invalid xml format");
    assert_eq!(message(b"<?XML version=\"1.0\"?><Root/>"), "invalid xml format");
}

#[test]
fn test_declaration_must_end_inside_lookahead() {
    let mut long = b"<?xml version=\"1.0\"".to_vec();
    long.extend(std::iter::repeat(b' ').take(LOOKAHEAD));
    long.extend_from_slice(b"?><Root/>");
    assert_eq!(message(&long), "invalid xml format");

    let mut fits = b"<?xml version=\"1.0\"".to_vec();
    fits.extend(std::iter::repeat(b' ').take(LOOKAHEAD - 40));
    fits.extend_from_slice(b"?><Root/>");
    assert!(load_bytes(&fits).is_ok());
}

#[test]
fn test_utf16_is_rejected() {
    let mut utf16 = vec![0xFF, 0xFE];
    for unit in "<?xml version=\"1.0\"?><R/>".encode_utf16() {
        utf16.extend_from_slice(&unit.to_le_bytes());
    }
    assert_eq!(message(&utf16), "unsupported encoding: utf-16");
}

#[test]
fn test_utf8_bom_is_accepted() {
    let doc = load_bytes(b"\xEF\xBB\xBF<?xml version=\"1.0\"?><Root/>").unwrap();
    assert_eq!(doc.declaration(), "<?xml version=\"1.0\"?>");
    assert_eq!(doc.root().name(), "Root");
}

#[test]
fn test_body_longer_than_lookahead() {
    let mut xml = String::from("<?xml version=\"1.0\"?>\n<Root>\n");
    for i in 0..200 {
        xml.push_str(&format!("  <Item id=\"k{i}\" text=\"value {i}\" />\n"));
    }
    xml.push_str("</Root>");
    assert!(xml.len() > LOOKAHEAD * 4);

    let doc = load_bytes(xml.as_bytes()).unwrap();
    assert_eq!(doc.root().elements().count(), 200);
}

#[test]
fn test_declaration_only_has_no_root() {
    let err = load_bytes(b"<?xml version=\"1.0\"?>").unwrap_err();
    assert!(matches!(err, LoadError::Parse(_)));
}

#[test]
fn test_invalid_utf8_body() {
    let err = load_bytes(b"<?xml version=\"1.0\"?><Root text=\"\xC3\x28\"/>").unwrap_err();
    assert_eq!(err.to_string(), "content is not valid utf-8");
}
