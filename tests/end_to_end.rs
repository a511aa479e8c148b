//! End-to-end tests: configuration file to archived inputs and saved outputs
//!
//! Each test builds a dispatcher from a TOML configuration pointing at a
//! temporary inbound tree, drops partner files into the HEINZ inbox and checks
//! where everything ends up.

use chrono::NaiveDate;
use partner_etl::handler::{FixedClock, JsonLinesStatusRecorder};
use partner_etl::{Dispatcher, EtlConfig, FileRequest, Outcome, build_dispatcher};
use pretty_assertions::assert_eq;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

const CONFIG: &str = r#"
[directories]
inbox = "inbox"

[[file_types]]
code = "HEINZ_SALIDAS"
description = "Outbound orders"
skip_lines = 1
natural_key = ["ORDER_NUMBER", "PRODUCT_CODE"]
uppercase = ["UNIT_CODE"]
layout = { kind = "delimited", delimiter = ";" }
fields = [
    { name = "ORDER_PREFIX", type = "text", required = true, max = 3 },
    { name = "ORDER_NUMBER", type = "text", required = true },
    { name = "PRODUCT_CODE", type = "text", required = true },
    { name = "QUANTITY", type = "integer", required = true, min = 1 },
    { name = "UNIT_CODE", type = "text", required = true },
    { name = "ORIGIN_WAREHOUSE", type = "text", required = true },
    { name = "DESTINATION_WAREHOUSE", type = "text", required = true },
]

[[file_types.rules]]
rule = "one_of"
field = "UNIT_CODE"
values = ["UND", "CAJ"]

[[file_types.rules]]
rule = "not_equal"
field = "ORIGIN_WAREHOUSE"
other = "DESTINATION_WAREHOUSE"

[[file_types]]
code = "HEINZ_STOCK"
layout = { kind = "fixed_width" }
fields = [
    { name = "SKU", type = "text", width = 6, required = true },
    { name = "DATE", type = "date", width = 8, format = "%Y%m%d" },
    { name = "UNITS", type = "integer", width = 4 },
]

[[handlers]]
name = "heinz-salidas"
client = "HEINZ"
subdirectory = "SALIDAS"
file_type = "HEINZ_SALIDAS"
entity = "outbound_line"

[[handlers]]
name = "heinz-stock"
client = "HEINZ"
subdirectory = "STOCK"
file_pattern = 'stock_\d+\.txt'
file_type = "HEINZ_STOCK"
"#;

struct Fixture {
    dir: TempDir,
    config: EtlConfig,
    dispatcher: Dispatcher,
}

impl Fixture {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let config = EtlConfig::from_toml_str(CONFIG)
            .unwrap()
            .with_inbound_dir(dir.path());

        let clock = NaiveDate::from_ymd_opt(2024, 3, 15)
            .unwrap()
            .and_hms_opt(9, 5, 0)
            .unwrap();
        let status = Arc::new(JsonLinesStatusRecorder::new(config.status_journal_path()));
        let dispatcher = build_dispatcher(&config, status, Arc::new(FixedClock(clock))).unwrap();

        Self {
            dir,
            config,
            dispatcher,
        }
    }

    fn drop_file(&self, subdirectory: &str, name: &str, content: &[u8]) -> FileRequest {
        let inbox = self.config.client_inbox("HEINZ");
        let dir = inbox.join(subdirectory);
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        FileRequest::new(path, inbox, "HEINZ")
    }

    fn archived(&self, archive: &str, subdirectory: &str, name: &str) -> PathBuf {
        self.dir
            .path()
            .join("HEINZ")
            .join(archive)
            .join(subdirectory)
            .join("202403")
            .join("20240315")
            .join(format!("20240315-0905-{}", name))
    }

    fn outputs(&self, file_type: &str) -> Vec<Value> {
        let dir = self.config.outputs_dir().join(file_type);
        if !dir.exists() {
            return Vec::new();
        }
        let mut lines = Vec::new();
        for entry in std::fs::read_dir(dir).unwrap() {
            let content = std::fs::read_to_string(entry.unwrap().path()).unwrap();
            lines.extend(content.lines().map(|l| serde_json::from_str::<Value>(l).unwrap()));
        }
        lines
    }

    fn journal(&self) -> Vec<Value> {
        read_json_lines(&self.config.status_journal_path())
    }
}

fn read_json_lines(path: &Path) -> Vec<Value> {
    std::fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect()
}

#[test]
fn test_valid_outbound_file_is_saved_journaled_and_archived() {
    let fixture = Fixture::new();
    let request = fixture.drop_file(
        "SALIDAS",
        "orders_0315.csv",
        b"PREFIX;ORDER;PRODUCT;QTY;UNIT;FROM;TO\nPV;1001;SKU-1;12;und;B01;B02\nPV;1001;SKU-2;3;CAJ;B01;B03\n",
    );

    let report = fixture.dispatcher.dispatch(&request).unwrap();

    assert_eq!(report.handler, "heinz-salidas");
    assert_eq!(report.outcome, Outcome::Processed { records: 2 });
    assert!(!request.path().exists());
    assert!(fixture.archived("processed", "SALIDAS", "orders_0315.csv").exists());

    let saved = fixture.outputs("HEINZ_SALIDAS");
    assert_eq!(saved.len(), 2);
    assert_eq!(saved[0]["order_number"], "1001");
    assert_eq!(saved[0]["quantity"], 12);
    assert_eq!(saved[0]["unit_code"], "UND");
    assert_eq!(saved[0]["line_number"], 2);
    assert_eq!(saved[1]["destination_warehouse"], "B03");

    let journal = fixture.journal();
    assert_eq!(journal.len(), 1);
    assert_eq!(journal[0]["status"], "VALID");
    assert_eq!(journal[0]["records"], 2);
}

#[test]
fn test_single_bad_line_rejects_the_whole_file() {
    let fixture = Fixture::new();
    let request = fixture.drop_file(
        "SALIDAS",
        "orders_0316.csv",
        b"HEADER\nPV;1001;SKU-1;12;UND;B01;B02\nPV;1002;SKU-1;0;BOX;B01;B01\n",
    );

    let report = fixture.dispatcher.dispatch(&request).unwrap();

    match &report.outcome {
        Outcome::Structural { errors } => {
            assert!(errors.iter().all(|e| e.starts_with("line 3: ")));
            assert!(errors.iter().any(|e| e.contains("QUANTITY")));
        }
        other => panic!("unexpected outcome {:?}", other),
    }
    assert!(fixture.archived("errors", "SALIDAS", "orders_0316.csv").exists());
    assert!(fixture.outputs("HEINZ_SALIDAS").is_empty());

    let journal = fixture.journal();
    assert_eq!(journal[0]["status"], "INVALID_STRUCTURE");
}

#[test]
fn test_fixed_width_file_in_windows_1252() {
    let fixture = Fixture::new();
    // "CAFÉ01" with É encoded as 0xC9
    let mut content = b"CAF\xC901202403150012\n".to_vec();
    content.extend_from_slice(b"TEA002202403150007\n");
    let request = fixture.drop_file("STOCK", "stock_15.txt", &content);

    let report = fixture.dispatcher.dispatch(&request).unwrap();

    assert_eq!(report.handler, "heinz-stock");
    assert_eq!(report.outcome, Outcome::Processed { records: 2 });

    let saved = fixture.outputs("HEINZ_STOCK");
    assert_eq!(saved[0]["line_number"], 1);
    assert_eq!(saved[0]["fields"]["SKU"], "CAFÉ01");
    assert_eq!(saved[0]["fields"]["DATE"], "2024-03-15");
    assert_eq!(saved[0]["fields"]["UNITS"], 12);
    assert_eq!(saved[1]["fields"]["SKU"], "TEA002");
}

#[test]
fn test_unmatched_file_stays_in_the_inbox() {
    let fixture = Fixture::new();
    let request = fixture.drop_file("STOCK", "inventory.txt", b"anything\n");

    assert!(fixture.dispatcher.dispatch(&request).is_err());
    assert!(request.path().exists());
    assert!(!fixture.config.status_journal_path().exists());
}
