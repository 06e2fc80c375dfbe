use labware_console::{Command, ConsoleConfig, ConsoleError, ConsoleSession};
use labware_console::utils::validation::Validate;
use std::path::Path;
use tempfile::TempDir;

const INVENTORY: &str = "\
barcode,labware_type,num_rows,num_columns,occupied,location
STAN-0001,Tube,1,1,A1,STO-1
STAN-0002,Tube,1,1,A1,STO-1
STAN-0003,Slide,4,1,A1 B1,STO-2
";

fn write_fixture(dir: &Path, extra: &str) -> ConsoleConfig {
    let inventory_path = dir.join("inventory.csv");
    std::fs::write(&inventory_path, INVENTORY).unwrap();

    let config_path = dir.join("console.toml");
    let toml_content = format!(
        r#"
[scanner]
barcode_pattern = "^(STAN|STO)-[0-9]+$"
location_prefix = "STO-"

[lookup]
source = "inventory"
inventory_path = "{}"

[selection]
selectable = "non_empty"
mode = "multi"
{}
"#,
        inventory_path.display(),
        extra
    );
    std::fs::write(&config_path, toml_content).unwrap();

    let config = ConsoleConfig::from_file(&config_path).unwrap();
    config.validate().unwrap();
    config
}

fn lines(output: &[String]) -> Vec<&str> {
    output.iter().map(String::as_str).collect()
}

#[tokio::test]
async fn test_scan_then_select_slots_on_latest_labware() {
    let temp_dir = TempDir::new().unwrap();
    let config = write_fixture(temp_dir.path(), "");
    let mut session = ConsoleSession::from_config(&config, false).unwrap();

    let output = session.execute(Command::Scan("STAN-0003".to_string())).await;
    assert_eq!(lines(&output), vec!["Worklist: [STAN-0003]"]);

    let output = session.execute(Command::Select("A1".to_string())).await;
    assert_eq!(
        lines(&output),
        vec!["Selection is selectable.non_empty.multi", "Selected: [A1]"]
    );

    // C1 is empty and the filter only admits occupied slots
    let output = session.execute(Command::Select("C1".to_string())).await;
    assert_eq!(lines(&output), vec!["Selection is selectable.non_empty.multi"]);

    let output = session.execute(Command::SelectTo("D1".to_string())).await;
    assert_eq!(output.last().map(String::as_str), Some("Selected: [A1, B1, C1, D1]"));

    let grid = session.execute(Command::Grid).await;
    assert_eq!(grid[0], "STAN-0003 (Slide)");
    assert_eq!(grid.len(), 5);
    assert!(grid[1..].iter().all(|row| row.ends_with('*')));
}

#[tokio::test]
async fn test_switching_to_single_mode_keeps_last_selected() {
    let temp_dir = TempDir::new().unwrap();
    let config = write_fixture(temp_dir.path(), "");
    let mut session = ConsoleSession::from_config(&config, false).unwrap();

    session.execute(Command::Scan("STAN-0003".to_string())).await;
    session.execute(Command::Select("A1".to_string())).await;
    session.execute(Command::Select("B1".to_string())).await;

    let output = session
        .execute(Command::Mode {
            mode: "single".parse().unwrap(),
            selectable: None,
        })
        .await;
    assert_eq!(
        lines(&output),
        vec!["Selection is selectable.non_empty.single", "Selected: [B1]"]
    );

    let selection = session.selection().unwrap();
    assert_eq!(selection.last_selected(), Some("B1"));

    let output = session.execute(Command::Reset).await;
    assert_eq!(output.last().map(String::as_str), Some("Selected: []"));
}

#[tokio::test]
async fn test_location_scan_and_validation_messages() {
    let temp_dir = TempDir::new().unwrap();
    let config = write_fixture(temp_dir.path(), "");
    let mut session = ConsoleSession::from_config(&config, false).unwrap();

    let output = session.execute(Command::Scan("STO-1".to_string())).await;
    assert_eq!(lines(&output), vec!["Worklist: [STAN-0001, STAN-0002]"]);

    let output = session.execute(Command::Scan("plate-7".to_string())).await;
    assert_eq!(lines(&output), vec!["\"plate-7\" is not a valid barcode"]);

    let output = session.execute(Command::Remove("STAN-0001".to_string())).await;
    assert_eq!(
        lines(&output),
        vec!["\"STAN-0001\" removed", "Worklist: [STAN-0002]"]
    );

    let output = session.execute(Command::List).await;
    assert_eq!(lines(&output), vec!["  1. STAN-0002 (Tube)"]);
}

#[tokio::test]
async fn test_rules_from_config_are_enforced() {
    let temp_dir = TempDir::new().unwrap();
    let config = write_fixture(
        temp_dir.path(),
        r#"
[rules]
allowed_labware_types = ["Tube"]
"#,
    );
    let mut session = ConsoleSession::from_config(&config, false).unwrap();

    let output = session.execute(Command::Scan("STAN-0003".to_string())).await;
    assert_eq!(lines(&output), vec!["\"STAN-0003\" is a Slide; expected Tube"]);
    assert!(session.worklist().items().is_empty());

    let output = session.execute(Command::Select("A1".to_string())).await;
    assert_eq!(lines(&output), vec!["Scan labware before selecting slots"]);
}

#[tokio::test]
async fn test_locked_session_refuses_scans() {
    let temp_dir = TempDir::new().unwrap();
    let config = write_fixture(temp_dir.path(), "");
    let mut session = ConsoleSession::from_config(&config, true).unwrap();

    let output = session.execute(Command::Scan("STAN-0001".to_string())).await;
    assert_eq!(lines(&output), vec!["Worklist is locked"]);

    let output = session.execute(Command::Unlock).await;
    assert_eq!(lines(&output), vec!["Worklist is idle.normal"]);

    let output = session.execute(Command::Scan("STAN-0001".to_string())).await;
    assert_eq!(lines(&output), vec!["Worklist: [STAN-0001]"]);
}

#[test]
fn test_missing_inventory_file_fails_startup() {
    let temp_dir = TempDir::new().unwrap();
    let config = ConsoleConfig::from_toml_str(&format!(
        r#"
[lookup]
source = "inventory"
inventory_path = "{}"
"#,
        temp_dir.path().join("missing.csv").display()
    ))
    .unwrap();

    assert!(config.validate().is_ok());
    assert!(matches!(
        ConsoleSession::from_config(&config, false),
        Err(ConsoleError::IoError(_)) | Err(ConsoleError::CsvError(_))
    ));
}
