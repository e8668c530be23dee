use itemdedup::batch::{Batch, BatchOptions};
use itemdedup::document::{load, LoadOptions};
use itemdedup::duplicates::deduplicate;
use itemdedup::output::{Reporter, ReporterConfig};
use std::fs;
use std::io;
use tempfile::TempDir;

fn silent() -> Reporter {
    Reporter::with_writers(
        ReporterConfig::default(),
        Box::new(io::sink()),
        Box::new(io::sink()),
    )
}

#[test]
fn test_no_format_keeps_untouched_bytes() {
    let input = "<?xml version='1.0' encoding='UTF-8' standalone='yes'?>\r\n<Resources lang='de'>\r\n\t<!-- menu -->\r\n\t<Item id='open'   text=\"&#214;ffnen\"/>\r\n\t<Item id=\"close\" text='Schlie&#223;en' />\r\n\t<Item id='open'/>\r\n</Resources>\r\n";
    let expected = "<?xml version='1.0' encoding='UTF-8' standalone='yes'?>\r\n<Resources lang='de'>\r\n\t<!-- menu -->\r\n\t<Item id='open'   text=\"&#214;ffnen\"/>\r\n\t<Item id=\"close\" text='Schlie&#223;en' />\r\n\t\r\n</Resources>\r\n";

    let dir = TempDir::new().unwrap();
    let file = dir.path().join("de.xml");
    fs::write(&file, input).unwrap();

    let reporter = silent();
    let options = BatchOptions {
        backup: false,
        no_format: true,
        ..BatchOptions::default()
    };
    let result = Batch::new(options, &reporter).run(&[file.clone()], None).unwrap();

    assert_eq!(result.success, 1);
    assert_eq!(fs::read_to_string(&file).unwrap(), expected);
}

#[test]
fn test_no_format_clean_document_is_byte_identical() {
    let input = "<?xml version=\"1.0\"?>\n<R>\n    <Item id=\"a\" text=\"x &amp; y\"/>\n  <![CDATA[<raw>]]>\n</R>\n<!-- trailer -->\n";
    let mut reader = input.as_bytes();
    let options = LoadOptions::default().with_preserve_whitespace(true);
    let mut doc = load(&mut reader, &options).unwrap();
    assert!(deduplicate(&mut doc).is_clean());
    assert_eq!(doc.to_xml(false), input);
}

#[test]
fn test_default_format_reindents() {
    let input = "<?xml version=\"1.0\" encoding=\"utf-8\"?><Root><Group><Item id='a' text='1'/><Item id='a' text='2'/></Group><Item id='b'/></Root>";
    let mut reader = input.as_bytes();
    let mut doc = load(&mut reader, &LoadOptions::default()).unwrap();
    deduplicate(&mut doc);

    let expected = concat!(
        "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n",
        "<Root>\n",
        "  <Group>\n",
        "    <Item id=\"a\" text=\"2\" />\n",
        "  </Group>\n",
        "  <Item id=\"b\" />\n",
        "</Root>"
    );
    assert_eq!(doc.to_xml(true), expected);
}

#[test]
fn test_quotes_inside_single_quoted_values_are_escaped_when_formatting() {
    let input = "<?xml version=\"1.0\"?><R><Item id='q' text='say \"hi\"'/></R>";
    let mut reader = input.as_bytes();
    let doc = load(&mut reader, &LoadOptions::default()).unwrap();
    assert!(doc
        .to_xml(true)
        .contains("<Item id=\"q\" text=\"say &quot;hi&quot;\" />"));
}
