//! Classification of sample and generated reports.

use cellex::config::HIGH_CONFIDENCE_SCORE;
use cellex::ingest::{LogicalReportProcessor, MemoryCase};
use cellex::sniff::{Classification, ReportSniffer, Unrecognized};
use cellex::{ReportCandidate, ReportKind};
use std::sync::Arc;

use crate::common::reports;
use crate::common::sample;
use crate::common::test_data::*;

fn processor() -> LogicalReportProcessor {
    LogicalReportProcessor::new(Arc::new(MemoryCase::new()))
}

/// `report.xml` with `report_type` "Cell" is a handset report with full score
#[test]
fn test_cell_report_is_handset() {
    let dir = tempfile::tempdir().unwrap();
    let path = reports::write(dir.path(), "report.xml", &reports::body("Cell"));

    let sniffer = ReportSniffer::default();
    assert_eq!(sniffer.classify_path(&path), ReportKind::HandsetLogical);
    assert_eq!(processor().can_process(&path), HIGH_CONFIDENCE_SCORE);
    assert_eq!(processor().can_process(&path), 100);
}

/// Same structure with "SIM" is a SIM report
#[test]
fn test_sim_report() {
    let dir = tempfile::tempdir().unwrap();
    let path = reports::write(dir.path(), "report.xml", &reports::body("SIM"));
    assert_eq!(
        ReportSniffer::default().classify_path(&path),
        ReportKind::SimLogical
    );
}

/// Wrong extension is Invalid regardless of content
#[test]
fn test_wrong_extension_is_invalid() {
    let dir = tempfile::tempdir().unwrap();
    let path = reports::write(dir.path(), "report.txt", &reports::body("Cell"));
    let sniffer = ReportSniffer::default();
    assert_eq!(sniffer.classify_path(&path), ReportKind::Invalid);
    assert_eq!(processor().can_process(&path), 0);
}

/// Well-formed XML missing `general_information` is Invalid
#[test]
fn test_missing_general_information() {
    let dir = tempfile::tempdir().unwrap();
    let path = reports::write(
        dir.path(),
        "report.xml",
        "<reports><report><case_information/></report></reports>",
    );
    let result = ReportSniffer::default().sniff(&ReportCandidate::new(&path));
    assert_eq!(result.kind(), ReportKind::Invalid);
    assert_eq!(result.reason(), Some(&Unrecognized::MissingReportType));
}

#[test]
fn test_case_insensitive_values() {
    let dir = tempfile::tempdir().unwrap();
    let sniffer = ReportSniffer::default();
    let cases = [
        ("sim", ReportKind::SimLogical),
        ("Sim", ReportKind::SimLogical),
        ("sIM", ReportKind::SimLogical),
        ("cell", ReportKind::HandsetLogical),
        ("CELL", ReportKind::HandsetLogical),
        ("cElL", ReportKind::HandsetLogical),
        ("", ReportKind::Invalid),
        ("phone", ReportKind::Invalid),
        ("cell phone", ReportKind::Invalid),
        ("simcard", ReportKind::Invalid),
    ];

    for (i, (value, expected)) in cases.iter().enumerate() {
        let path = reports::write(dir.path(), &format!("r{}.xml", i), &reports::body(value));
        assert_eq!(
            sniffer.classify_path(&path),
            *expected,
            "report_type {:?}",
            value
        );
    }
}

#[test]
fn test_uppercase_extension_accepted() {
    let dir = tempfile::tempdir().unwrap();
    let path = reports::write(dir.path(), "REPORT.XML", &reports::body("cell"));
    assert_eq!(
        ReportSniffer::default().classify_path(&path),
        ReportKind::HandsetLogical
    );
}

#[test]
fn test_sample_reports() {
    let sniffer = ReportSniffer::default();
    let cases = [
        (SAMPLE_HANDSET, ReportKind::HandsetLogical),
        (SAMPLE_SIM, ReportKind::SimLogical),
        (SAMPLE_HANDSET_TXT, ReportKind::Invalid),
        (SAMPLE_NO_GENERAL_INFO, ReportKind::Invalid),
        (SAMPLE_UNKNOWN_TYPE, ReportKind::Invalid),
        (SAMPLE_TRUNCATED, ReportKind::Invalid),
        (SAMPLE_HANDSET_LATIN1, ReportKind::HandsetLogical),
        (SAMPLE_SIM_UTF16LE, ReportKind::SimLogical),
    ];

    let processor = processor();
    for (file, expected) in cases {
        let path = sample(file);
        assert_eq!(sniffer.classify_path(&path), expected, "{}", file);

        let score = processor.can_process(&path);
        if expected.is_recognized() {
            assert_eq!(score, HIGH_CONFIDENCE_SCORE, "{}", file);
        } else {
            assert_eq!(score, 0, "{}", file);
        }
    }
}

#[test]
fn test_unrecognized_reasons() {
    let sniffer = ReportSniffer::default();
    let reason = |file: &str| {
        sniffer
            .sniff(&ReportCandidate::new(sample(file)))
            .reason()
            .cloned()
    };

    assert_eq!(reason(SAMPLE_HANDSET), None);
    assert_eq!(reason(SAMPLE_HANDSET_TXT), Some(Unrecognized::FilteredOut));
    assert_eq!(
        reason(SAMPLE_NO_GENERAL_INFO),
        Some(Unrecognized::MissingReportType)
    );
    assert_eq!(
        reason(SAMPLE_UNKNOWN_TYPE),
        Some(Unrecognized::UnknownReportType("tablet".into()))
    );
    assert!(matches!(
        reason(SAMPLE_TRUNCATED),
        Some(Unrecognized::Malformed(_))
    ));
}

#[test]
fn test_garbage_and_empty_files() {
    let dir = tempfile::tempdir().unwrap();
    let sniffer = ReportSniffer::default();

    let empty = reports::write(dir.path(), "empty.xml", "");
    let binary = dir.path().join("binary.xml");
    std::fs::write(&binary, [0x7f, b'E', b'L', b'F', 0, 1, 2, 3]).unwrap();
    let json = reports::write(dir.path(), "json.xml", r#"{"report_type": "cell"}"#);

    for path in [&empty, &binary, &json] {
        let result = sniffer.sniff(&ReportCandidate::new(path));
        assert!(
            matches!(
                result,
                Classification::Unrecognized(Unrecognized::Malformed(_))
            ),
            "{:?}: {:?}",
            path,
            result
        );
    }
}

#[test]
fn test_missing_file_scores_zero() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("gone.xml");
    assert_eq!(processor().can_process(&path), 0);
    assert!(matches!(
        ReportSniffer::default()
            .sniff(&ReportCandidate::new(&path))
            .reason(),
        Some(Unrecognized::Io { .. })
    ));
}

#[test]
fn test_report_file_on_disk_is_recognized() {
    let dir = tempfile::tempdir().unwrap();
    let path = reports::write(
        dir.path(),
        "report.xml",
        &format!("<?xml version=\"1.0\"?>\n{}\n", reports::body("Cell")),
    );

    let result = ReportSniffer::default().sniff(&ReportCandidate::new(&path));
    assert_eq!(result, Classification::Recognized(ReportKind::HandsetLogical));
}

#[test]
fn test_non_utf8_encodings() {
    let dir = tempfile::tempdir().unwrap();
    let sniffer = ReportSniffer::default();

    let mut latin1 = b"<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?>\
        <reports><report><general_information><report_type>Cell</report_type>\
        <examiner>Jos\xE9</examiner></general_information></report></reports>"
        .to_vec();
    latin1.push(b'\n');
    let latin1_path = dir.path().join("latin1.xml");
    std::fs::write(&latin1_path, &latin1).unwrap();
    assert_eq!(sniffer.classify_path(&latin1_path), ReportKind::HandsetLogical);
    assert_eq!(processor().can_process(&latin1_path), HIGH_CONFIDENCE_SCORE);

    let mut utf16 = vec![0xFF, 0xFE];
    for unit in reports::body("sim").encode_utf16() {
        utf16.extend_from_slice(&unit.to_le_bytes());
    }
    let utf16_path = dir.path().join("utf16.xml");
    std::fs::write(&utf16_path, &utf16).unwrap();
    assert_eq!(sniffer.classify_path(&utf16_path), ReportKind::SimLogical);
}

#[test]
fn test_text_split_by_cdata_is_joined() {
    let dir = tempfile::tempdir().unwrap();
    let path = reports::write(dir.path(), "report.xml", &reports::body("ce<![CDATA[ll]]>"));
    assert_eq!(
        ReportSniffer::default().classify_path(&path),
        ReportKind::HandsetLogical
    );
}
