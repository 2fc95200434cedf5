//! Pipeline integration tests
//!
//! These tests drive discovery, parsing, collection, and dedup over real
//! fixture directories created on the fly.

use ddfscan::{dedupe, CommandCollector, CommandRecord, Config, DdfParser, FileFinder};
use std::fs;
use std::path::Path;

const REMOTE_WIPE: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<MgmtTree xmlns="syncml:dmddf1.2">
  <VerDTD>1.2</VerDTD>
  <Node>
    <NodeName>RemoteWipe</NodeName>
    <Path>./Device/Vendor/MSFT</Path>
    <DFProperties>
      <AccessType><Get /></AccessType>
    </DFProperties>
    <Node>
      <NodeName>doWipe</NodeName>
      <DFProperties>
        <AccessType><Exec /><Get /></AccessType>
        <Description>Exec on this node will perform a remote wipe on the device.</Description>
        <DFFormat><chr /></DFFormat>
        <Applicability>
          <OsBuildVersion>10.0.10586</OsBuildVersion>
        </Applicability>
      </DFProperties>
    </Node>
  </Node>
</MgmtTree>"#;

const REBOOT: &str = r#"<MgmtTree>
  <Node>
    <NodeName>Reboot</NodeName>
    <Path>./Device/Vendor/MSFT</Path>
    <DFProperties><AccessType><Get/></AccessType></DFProperties>
    <Node>
      <NodeName>RebootNow</NodeName>
      <DFProperties>
        <AccessType><Exec/></AccessType>
        <Description>Reboots the device immediately.</Description>
      </DFProperties>
    </Node>
    <Node>
      <NodeName>Schedule</NodeName>
      <DFProperties><AccessType><Get/><Replace/></AccessType></DFProperties>
    </Node>
  </Node>
</MgmtTree>"#;

/// Run the full extraction pipeline over a directory
fn run_pipeline(dir: &Path, config: &Config) -> Vec<CommandRecord> {
    let finder = FileFinder::new(config);
    let files = finder.find_files(dir).unwrap();

    let parser = DdfParser::new();
    let collector = CommandCollector::new()
        .with_inheritance(config.extraction.inherit_properties)
        .with_payloads(config.extraction.render_payloads);

    let mut records = Vec::new();
    for file in &files {
        let contents = file.read_contents().unwrap();
        match parser.parse(&file.name(), &contents) {
            Ok(tree) => collector.collect(&tree, &mut records),
            Err(_) => continue,
        }
    }
    dedupe(records)
}

#[test]
fn test_remote_wipe_scenario() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("RemoteWipe.xml"), REMOTE_WIPE).unwrap();

    let records = run_pipeline(dir.path(), &Config::default());

    assert_eq!(records.len(), 1);
    let rec = &records[0];
    assert_eq!(rec.oma_uri, "./Device/Vendor/MSFT/RemoteWipe/doWipe");
    assert_eq!(rec.node_name, "doWipe");
    assert_eq!(
        rec.description,
        "Exec on this node will perform a remote wipe on the device."
    );
    assert_eq!(rec.minimum_os, "10.0.10586");
    assert_eq!(rec.source_file, "RemoteWipe.xml");
    assert!(rec.exec_payload.is_none());
}

#[test]
fn test_every_exec_node_appears_exactly_once() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("Reboot.xml"), REBOOT).unwrap();
    fs::write(dir.path().join("RemoteWipe.xml"), REMOTE_WIPE).unwrap();

    let records = run_pipeline(dir.path(), &Config::default());

    let uris: Vec<_> = records.iter().map(|r| r.oma_uri.as_str()).collect();
    assert_eq!(
        uris,
        vec![
            "./Device/Vendor/MSFT/Reboot/RebootNow",
            "./Device/Vendor/MSFT/RemoteWipe/doWipe",
        ]
    );
}

#[test]
fn test_malformed_file_is_isolated() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("Broken.xml"), "<MgmtTree><Node><NodeName>").unwrap();
    fs::write(dir.path().join("RemoteWipe.xml"), REMOTE_WIPE).unwrap();

    let records = run_pipeline(dir.path(), &Config::default());

    // Only the valid file contributes; the run still completes
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].source_file, "RemoteWipe.xml");
}

#[test]
fn test_same_uri_across_files_survives_dedupe() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("WipeA.xml"), REMOTE_WIPE).unwrap();
    fs::write(dir.path().join("WipeB.xml"), REMOTE_WIPE).unwrap();

    let records = run_pipeline(dir.path(), &Config::default());

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].oma_uri, records[1].oma_uri);
    assert_ne!(records[0].source_file, records[1].source_file);
}

#[test]
fn test_redundant_nodes_in_one_file_collapse() {
    // Two identical Exec nodes in the same document collapse to one record
    let doc = r#"<MgmtTree>
      <Node>
        <NodeName>Wipe</NodeName>
        <Path>./Device/Vendor/MSFT</Path>
        <Node>
          <NodeName>doWipe</NodeName>
          <DFProperties><AccessType><Exec/></AccessType></DFProperties>
        </Node>
        <Node>
          <NodeName>doWipe</NodeName>
          <DFProperties><AccessType><Exec/></AccessType></DFProperties>
        </Node>
      </Node>
    </MgmtTree>"#;

    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("Wipe.xml"), doc).unwrap();

    let records = run_pipeline(dir.path(), &Config::default());
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].oma_uri, "./Device/Vendor/MSFT/Wipe/doWipe");
}

#[test]
fn test_idempotent_output() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("Reboot.xml"), REBOOT).unwrap();
    fs::write(dir.path().join("RemoteWipe.xml"), REMOTE_WIPE).unwrap();

    let config = Config::default();
    let first = serde_json::to_string_pretty(&run_pipeline(dir.path(), &config)).unwrap();
    let second = serde_json::to_string_pretty(&run_pipeline(dir.path(), &config)).unwrap();

    assert_eq!(first, second);
}

#[test]
fn test_empty_directory_yields_empty_catalog() {
    let dir = tempfile::tempdir().unwrap();
    let records = run_pipeline(dir.path(), &Config::default());
    assert!(records.is_empty());
}

#[test]
fn test_payload_rendering_enabled_by_config() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("RemoteWipe.xml"), REMOTE_WIPE).unwrap();

    let mut config = Config::default();
    config.extraction.render_payloads = true;

    let records = run_pipeline(dir.path(), &config);
    let payload = records[0].exec_payload.as_ref().unwrap();

    assert_eq!(payload.first().map(String::as_str), Some("<Exec>"));
    assert!(payload
        .iter()
        .any(|l| l.contains("<LocURI>./Device/Vendor/MSFT/RemoteWipe/doWipe</LocURI>")));
    // Declared chr format flows into the fragment
    assert!(payload
        .iter()
        .any(|l| l.contains("<Format xmlns=\"syncml:metinf\">chr</Format>")));
}
