//! Integration tests for the wikigraph extraction pipeline.
//!
//! Every test starts from a BZ2-compressed XML file written to a temp file,
//! so the whole path (decompression, page reading, classification, link
//! cleaning, sinks) runs exactly as it does against a real dump.
//!
//! - **Reader Tests** -- Page reading and classification from a compressed archive
//! - **Sink Tests** -- Inspection, report, and edge-list output
//! - **Failure Tests** -- Missing files, corrupt archives, malformed XML
//! - **Resource Tests** -- Reader buffers stay bounded as the dump grows
//!
//! # Sample Data
//!
//! The `sample_xml()` fixture contains:
//! - 2 articles: "Dog", "Cat"
//! - 1 redirect: "Doggo" -> "Dog"
//! - 2 other pages: "Talk:Dog" (ns 1), "Category:Mammals" (ns 14)

use bzip2::write::BzEncoder;
use bzip2::Compression;
use std::io::Write;
use tempfile::{NamedTempFile, TempDir};
use wikigraph::edges::EdgeListSink;
use wikigraph::pipeline::{self, PageSink};
use wikigraph::{DumpError, FilterConfig, PageClass, WikiReader};

/// Helper: create a BZ2-compressed XML file from a string and return the temp file handle.
fn create_bz2_xml(xml: &str) -> NamedTempFile {
    let mut encoder = BzEncoder::new(Vec::new(), Compression::fast());
    encoder.write_all(xml.as_bytes()).unwrap();
    let compressed = encoder.finish().unwrap();
    write_temp(&compressed)
}

fn write_temp(bytes: &[u8]) -> NamedTempFile {
    let mut tmp = NamedTempFile::new().unwrap();
    tmp.write_all(bytes).unwrap();
    tmp.flush().unwrap();
    tmp
}

fn sample_xml() -> &'static str {
    r#"<mediawiki xmlns="http://www.mediawiki.org/xml/export-0.11/" version="0.11" xml:lang="en">
        <siteinfo>
            <sitename>Wikipedia</sitename>
            <namespaces>
                <namespace key="0" case="first-letter" />
                <namespace key="1" case="first-letter">Talk</namespace>
            </namespaces>
        </siteinfo>
        <page>
            <title>Dog</title>
            <ns>0</ns>
            <id>1</id>
            <revision>
                <id>100</id>
                <timestamp>2024-01-15T10:30:00Z</timestamp>
                <text>The dog is a [[Mammal|mammal]] related to the [[Wolf]].
See also [[Cat]], [[Dog]], [[Main Page]] and [[Wolf]].
[[File:Dog.jpg|thumb|A dog]]
[[Category:Mammals]]</text>
            </revision>
        </page>
        <page>
            <title>Doggo</title>
            <ns>0</ns>
            <id>2</id>
            <redirect title="Dog" />
            <revision>
                <id>200</id>
                <text>#REDIRECT [[Dog]]</text>
            </revision>
        </page>
        <page>
            <title>Talk:Dog</title>
            <ns>1</ns>
            <id>3</id>
            <revision>
                <id>300</id>
                <text>Discussion about [[Dog]].</text>
            </revision>
        </page>
        <page>
            <title>Category:Mammals</title>
            <ns>14</ns>
            <id>4</id>
            <revision>
                <id>400</id>
                <text>Mammals.</text>
            </revision>
        </page>
        <page>
            <title>Cat</title>
            <ns>0</ns>
            <id>5</id>
            <revision>
                <id>500</id>
                <text>The cat hunts the [[Mouse]] &amp; the [[Bird|birds]].</text>
            </revision>
        </page>
    </mediawiki>"#
}

fn config(only_articles: bool, exclude_redirects: bool, limit: Option<u64>) -> FilterConfig {
    FilterConfig::new(only_articles, exclude_redirects, 40, limit).unwrap()
}

fn page_xml(title: &str, ns: &str, text: &str) -> String {
    format!(
        "<page><title>{}</title><ns>{}</ns><revision><text>{}</text></revision></page>",
        title, ns, text
    )
}

// ---------------------------------------------------------------------------
// Reader tests
// ---------------------------------------------------------------------------

#[test]
fn reader_reads_all_pages() {
    let tmp = create_bz2_xml(sample_xml());
    let pages: Vec<_> = WikiReader::open(tmp.path())
        .unwrap()
        .map(|p| p.unwrap())
        .collect();
    assert_eq!(pages.len(), 5);
    assert_eq!(pages[0].title, "Dog");
    assert_eq!(pages[4].title, "Cat");
}

#[test]
fn reader_classifies_pages() {
    let tmp = create_bz2_xml(sample_xml());
    let classes: Vec<_> = WikiReader::open(tmp.path())
        .unwrap()
        .map(|p| wikigraph::classify::classify(&p.unwrap()))
        .collect();
    assert_eq!(
        classes,
        vec![
            PageClass::Article,
            PageClass::ArticleRedirect,
            PageClass::Other,
            PageClass::Other,
            PageClass::Article,
        ]
    );
}

#[test]
fn reader_exposes_text_and_namespace() {
    let tmp = create_bz2_xml(sample_xml());
    let pages: Vec<_> = WikiReader::open(tmp.path())
        .unwrap()
        .map(|p| p.unwrap())
        .collect();
    assert!(pages[0].raw_text.as_ref().unwrap().contains("related to the [[Wolf]]"));
    assert!(pages[1].is_redirect);
    assert!(pages[1].raw_text.as_ref().unwrap().starts_with("#REDIRECT"));
    assert_eq!(pages[2].namespace_id, "1");
}

// ---------------------------------------------------------------------------
// Sink tests
// ---------------------------------------------------------------------------

#[test]
fn inspect_prints_first_article_truncated() {
    let tmp = create_bz2_xml(sample_xml());
    let mut out = Vec::new();
    let summary = pipeline::inspect(tmp.path(), &config(true, true, Some(1)), &mut out).unwrap();
    assert_eq!(summary.pages_processed(), 1);

    let record: serde_json::Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(record["page"]["title"], "Dog");
    assert_eq!(record["page"]["ns"], "0");
    let text = record["page"]["revision"]["text"].as_str().unwrap();
    assert_eq!(text.chars().count(), 40 + 3);
    assert!(text.ends_with("..."));
    assert_eq!(record["page"]["revision"]["id"], "100");
}

#[test]
fn inspect_respects_limit_across_namespaces() {
    let tmp = create_bz2_xml(sample_xml());
    let mut out = Vec::new();
    let summary = pipeline::inspect(tmp.path(), &config(false, false, Some(3)), &mut out).unwrap();
    assert_eq!(summary.pages_processed(), 3);
    assert_eq!(summary.scanned(), 3);

    let text = String::from_utf8(out).unwrap();
    let records: Vec<serde_json::Value> = serde_json::Deserializer::from_str(&text)
        .into_iter()
        .map(|r| r.unwrap())
        .collect();
    assert_eq!(records.len(), 3);
    assert_eq!(records[1]["page"]["redirect"], "");
    assert_eq!(records[2]["page"]["title"], "Talk:Dog");
}

#[test]
fn report_lists_cleaned_links() {
    let tmp = create_bz2_xml(sample_xml());
    let mut out = Vec::new();
    let summary = pipeline::report(tmp.path(), &config(true, true, None), &mut out).unwrap();
    assert_eq!(summary.pages_processed(), 2);

    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("Page: Dog | Clean Links: 3\nSample: [\"Mammal\", \"Wolf\", \"Cat\"]\n"));
    assert!(text.contains("Page: Cat | Clean Links: 2\n"));
    assert!(!text.contains("Main Page"));
}

#[test]
fn export_writes_edge_list() {
    let tmp = create_bz2_xml(sample_xml());
    let output_dir = TempDir::new().unwrap();
    let output = output_dir.path().join("wiki_edges.csv");

    let summary = pipeline::export_edges(tmp.path(), &config(true, true, None), &output).unwrap();
    assert_eq!(summary.pages_processed(), 2);
    assert_eq!(summary.edges(), 5);

    let mut reader = csv::Reader::from_path(&output).unwrap();
    let headers: Vec<_> = reader.headers().unwrap().iter().map(str::to_string).collect();
    assert_eq!(headers, vec!["source", "target"]);
    let rows: Vec<(String, String)> = reader
        .records()
        .map(|r| {
            let r = r.unwrap();
            (r[0].to_string(), r[1].to_string())
        })
        .collect();
    assert_eq!(rows.len(), 5);
    assert!(rows.contains(&("Dog".to_string(), "Wolf".to_string())));
    assert!(rows.contains(&("Cat".to_string(), "Bird".to_string())));
    assert!(!rows.iter().any(|(s, t)| s == t));
    assert!(!rows.iter().any(|(_, t)| t.contains(':')));
}

#[test]
fn export_counts_pages_without_edges() {
    let xml = format!(
        "<mediawiki>{}{}</mediawiki>",
        page_xml("A", "0", "[[B]] and [[C]]"),
        page_xml("D", "0", "no links at all")
    );
    let tmp = create_bz2_xml(&xml);
    let output_dir = TempDir::new().unwrap();
    let output = output_dir.path().join("edges.csv");

    let summary = pipeline::export_edges(tmp.path(), &config(true, true, None), &output).unwrap();
    assert_eq!(summary.pages_processed(), 2);

    let content = std::fs::read_to_string(&output).unwrap();
    assert_eq!(content, "source,target\nA,B\nA,C\n");
}

#[test]
fn excluded_redirect_yields_no_pages() {
    let xml = r#"<mediawiki><page><title>Doggo</title><ns>0</ns><redirect title="Dog" />
        <revision><text>#REDIRECT [[Dog]]</text></revision></page></mediawiki>"#;
    let tmp = create_bz2_xml(xml);
    let mut out = Vec::new();
    let summary = pipeline::inspect(tmp.path(), &config(true, true, Some(5)), &mut out).unwrap();
    assert_eq!(summary.pages_processed(), 0);
    assert_eq!(summary.scanned(), 1);
    assert!(out.is_empty());
}

#[test]
fn composed_sinks_match_individual_runs() {
    let tmp = create_bz2_xml(sample_xml());
    let config = config(true, true, None);

    let mut combined = EdgeListSink::new(Vec::new()).unwrap();
    let mut report = wikigraph::report::ReportSink::new(Vec::new(), 3);
    let reader = WikiReader::open(tmp.path()).unwrap();
    {
        let mut sinks: [&mut dyn PageSink; 2] = [&mut combined, &mut report];
        pipeline::run(reader, &config, &mut sinks).unwrap();
    }

    let output_dir = TempDir::new().unwrap();
    let output = output_dir.path().join("edges.csv");
    pipeline::export_edges(tmp.path(), &config, &output).unwrap();

    let combined = String::from_utf8(combined.into_inner().unwrap()).unwrap();
    assert_eq!(combined, std::fs::read_to_string(&output).unwrap());
    assert_eq!(report.reported(), 2);
}

// ---------------------------------------------------------------------------
// Failure tests
// ---------------------------------------------------------------------------

#[test]
fn missing_archive_is_io_error() {
    let dir = TempDir::new().unwrap();
    let err = pipeline::inspect(&dir.path().join("missing.xml.bz2"), &config(true, true, None), Vec::new())
        .unwrap_err();
    assert!(matches!(err.error, DumpError::Io { .. }));
    assert_eq!(err.error.kind(), "IOError");
}

#[test]
fn non_bzip2_input_is_corrupt_archive() {
    let tmp = write_temp(b"<mediawiki>plain text, not compressed</mediawiki>");
    let err = pipeline::inspect(tmp.path(), &config(true, true, None), Vec::new()).unwrap_err();
    assert!(matches!(err.error, DumpError::CorruptArchive { .. }));
    assert_eq!(err.summary.pages_processed(), 0);
}

#[test]
fn truncated_archive_is_corrupt_archive() {
    let pages: String = (0..200)
        .map(|i| page_xml(&format!("Page {}", i), "0", "[[Somewhere]]"))
        .collect();
    let xml = format!("<mediawiki>{}</mediawiki>", pages);
    let mut encoder = BzEncoder::new(Vec::new(), Compression::fast());
    encoder.write_all(xml.as_bytes()).unwrap();
    let compressed = encoder.finish().unwrap();
    let tmp = write_temp(&compressed[..compressed.len() - 16]);

    let err = pipeline::inspect(tmp.path(), &config(true, true, None), std::io::sink()).unwrap_err();
    assert!(matches!(err.error, DumpError::CorruptArchive { .. }));
    assert!(err.error.offset().is_some());
}

#[test]
fn malformed_xml_keeps_earlier_pages() {
    let xml = format!(
        "<mediawiki>{}{}<page><title>Broken</ns></page></mediawiki>",
        page_xml("A", "0", "[[B]]"),
        page_xml("C", "0", "[[D]]")
    );
    let tmp = create_bz2_xml(&xml);
    let output_dir = TempDir::new().unwrap();
    let output = output_dir.path().join("edges.csv");

    let err = pipeline::export_edges(tmp.path(), &config(true, true, None), &output).unwrap_err();
    match &err.error {
        DumpError::MalformedXml { position, .. } => assert!(*position > 0),
        other => panic!("expected malformed XML, got {:?}", other),
    }
    assert_eq!(err.summary.pages_processed(), 2);
    assert!(err.to_string().contains("after 2 processed pages"));
}

#[test]
fn stream_ending_mid_document_is_malformed() {
    // A complete bz2 stream whose XML stops before the root element closes,
    // as when a multistream dump is cut at a stream boundary.
    let xml = format!("<mediawiki>{}", page_xml("A", "0", "[[B]]"));
    let tmp = create_bz2_xml(&xml);
    let output_dir = TempDir::new().unwrap();
    let output = output_dir.path().join("edges.csv");

    let err = pipeline::export_edges(tmp.path(), &config(true, true, None), &output).unwrap_err();
    assert!(matches!(err.error, DumpError::MalformedXml { .. }));
    assert_eq!(err.error.kind(), "MalformedXmlError");
    assert_eq!(err.summary.pages_processed(), 1);
}

#[test]
fn stream_ending_inside_siteinfo_is_malformed() {
    let tmp = create_bz2_xml("<mediawiki><siteinfo><sitename>Wikipedia");
    let err = pipeline::inspect(tmp.path(), &config(true, true, None), Vec::new()).unwrap_err();
    assert!(matches!(err.error, DumpError::MalformedXml { .. }));
    assert_eq!(err.summary.scanned(), 0);
}

// ---------------------------------------------------------------------------
// Resource tests
// ---------------------------------------------------------------------------

/// Peak event-buffer capacity and open-element count while reading `n` pages.
fn reader_footprint(n: usize) -> (usize, usize, u64) {
    let body = "[[Link]] ".repeat(200);
    let pages: String = (0..n)
        .map(|i| page_xml(&format!("Page {}", i), "0", &body))
        .collect();
    let tmp = create_bz2_xml(&format!("<mediawiki>{}</mediawiki>", pages));

    let mut reader = WikiReader::open(tmp.path()).unwrap();
    let mut peak_buffer = 0;
    let mut peak_open = 0;
    while let Some(page) = reader.next() {
        drop(page.unwrap());
        peak_buffer = peak_buffer.max(reader.buffer_capacity());
        peak_open = peak_open.max(reader.open_elements());
    }
    (peak_buffer, peak_open, reader.pages_read())
}

#[test]
fn reader_memory_does_not_grow_with_page_count() {
    let (small_buffer, small_open, small_pages) = reader_footprint(20);
    let (large_buffer, large_open, large_pages) = reader_footprint(2000);

    assert_eq!(small_pages, 20);
    assert_eq!(large_pages, 2000);
    assert_eq!(small_open, 0);
    assert_eq!(large_open, 0);
    // A single page is ~2KB; the buffer only ever holds one token of it.
    assert!(large_buffer <= 4 * 4096);
    assert!(large_buffer <= small_buffer.max(1) * 4);
}
