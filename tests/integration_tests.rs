//! Integration tests for the SGQ CLI
//!
//! These tests exercise the CLI commands end-to-end using assert_cmd.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

const RNC_TABLE: &str = "\
Número,Data,Descrição,Setor,Tipo,Fornecedor,Responsável,Status,Data Fechamento,Causa
RNC-001,05/03/2024,Bobina com furo,Extrusão,Interna,,Ana,Fechada,15/03/2024,Máquina desregulada
RNC-002,10/04/2024,Lote com umidade,compras,Fornecedor,Acme Embalagens,Bruno,Aberta,,Matéria-prima fora do padrão
RNC-003,22/04/2024,Impressão borrada,IMPRESSAO,Interna,,Ana,Aberta,,Erro de operador
S/N,,,,,,,,,
";

/// Helper to get an sgq command isolated from the user's global config
fn sgq(tmp: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("sgq").unwrap();
    cmd.current_dir(tmp.path())
        .env("XDG_CONFIG_HOME", tmp.path().join("xdg"))
        .env_remove("SGQ_STORE_ENABLED")
        .env_remove("SGQ_STORE_PATH")
        .env_remove("SGQ_FORMAT");
    cmd
}

/// Helper to create a test project in a temp directory
fn setup_test_project() -> TempDir {
    let tmp = TempDir::new().unwrap();
    sgq(&tmp).arg("init").assert().success();
    tmp
}

fn write_table(tmp: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = tmp.path().join(name);
    fs::write(&path, contents).unwrap();
    path
}

/// Project with the three sample RNCs imported
fn setup_imported_project() -> TempDir {
    let tmp = setup_test_project();
    write_table(&tmp, "rncs.csv", RNC_TABLE);
    sgq(&tmp).args(["import", "rncs.csv"]).assert().success();
    tmp
}

fn json_output(tmp: &TempDir, args: &[&str]) -> serde_json::Value {
    let output = sgq(tmp).args(args).output().unwrap();
    assert!(
        output.status.success(),
        "command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).unwrap()
}

// ============================================================================
// CLI Basic Tests
// ============================================================================

#[test]
fn test_help_displays() {
    let tmp = TempDir::new().unwrap();
    sgq(&tmp)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("import"))
        .stdout(predicate::str::contains("dashboard"));
}

#[test]
fn test_version_displays() {
    let tmp = TempDir::new().unwrap();
    sgq(&tmp)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("sgq"));
}

#[test]
fn test_completions_bash() {
    let tmp = TempDir::new().unwrap();
    sgq(&tmp)
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("sgq"));
}

#[test]
fn test_command_outside_project_fails() {
    let tmp = TempDir::new().unwrap();
    sgq(&tmp)
        .arg("list")
        .assert()
        .failure()
        .stderr(predicate::str::contains("not an SGQ project"));
}

// ============================================================================
// Init Tests
// ============================================================================

#[test]
fn test_init_creates_project_structure() {
    let tmp = setup_test_project();
    assert!(tmp.path().join(".sgq").is_dir());
    assert!(tmp.path().join(".sgq/config.yaml").is_file());
}

#[test]
fn test_init_twice_reports_existing_project() {
    let tmp = setup_test_project();
    sgq(&tmp)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));
}

// ============================================================================
// Import Tests
// ============================================================================

#[test]
fn test_import_csv_table() {
    let tmp = setup_test_project();
    write_table(&tmp, "rncs.csv", RNC_TABLE);

    sgq(&tmp)
        .args(["import", "rncs.csv"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Import Summary"))
        .stdout(predicate::str::contains("Records inserted: 3"))
        .stdout(predicate::str::contains("Total records:    3"));

    assert!(tmp.path().join(".sgq/cache.json").is_file());
    assert!(tmp.path().join(".sgq/store.db").is_file());
}

#[test]
fn test_import_again_updates_by_number() {
    let tmp = setup_imported_project();

    sgq(&tmp)
        .args(["import", "rncs.csv"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Records inserted: 0"))
        .stdout(predicate::str::contains("Records updated:  3"))
        .stdout(predicate::str::contains("Total records:    3"));
}

#[test]
fn test_import_dry_run_saves_nothing() {
    let tmp = setup_test_project();
    write_table(&tmp, "rncs.csv", RNC_TABLE);

    sgq(&tmp)
        .args(["import", "rncs.csv", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Valid records:    3"))
        .stdout(predicate::str::contains("Dry run complete"));

    assert!(!tmp.path().join(".sgq/cache.json").exists());
}

#[test]
fn test_import_unsupported_file_fails() {
    let tmp = setup_test_project();
    write_table(&tmp, "notes.txt", "hello");

    sgq(&tmp)
        .args(["import", "notes.txt"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unsupported file format"));
}

#[test]
fn test_import_skip_errors_continues() {
    let tmp = setup_test_project();
    write_table(&tmp, "notes.txt", "hello");
    write_table(&tmp, "rncs.csv", RNC_TABLE);

    sgq(&tmp)
        .args(["import", "notes.txt", "missing.xlsx", "rncs.csv", "--skip-errors"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Files failed:     2"))
        .stdout(predicate::str::contains("Records inserted: 3"));
}

#[test]
fn test_import_last_duplicate_in_batch_wins() {
    let tmp = setup_test_project();
    write_table(
        &tmp,
        "dups.csv",
        "Número,Data,Descrição,Setor\nRNC-9,01/02/2024,primeira,Picote\nRNC-9,02/02/2024,segunda,Picote\n",
    );

    sgq(&tmp).args(["import", "dups.csv"]).assert().success();

    let record = json_output(&tmp, &["show", "RNC-9", "--format", "json"]);
    assert_eq!(record["description"], "segunda");
    assert_eq!(record["open_date"], "2024-02-02");
}

#[test]
fn test_import_xlsx_form_and_table() {
    let tmp = setup_test_project();
    let fixtures = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures");

    sgq(&tmp)
        .arg("import")
        .arg(fixtures.join("rnc_form.xlsx"))
        .arg(fixtures.join("rnc_table.xlsx"))
        .assert()
        .success()
        .stdout(predicate::str::contains("Records inserted: 3"));

    let form = json_output(&tmp, &["show", "RNC-2024-031", "--format", "json"]);
    assert_eq!(form["open_date"], "2024-03-01");
    assert_eq!(form["responsible"], "Maria Souza");
    assert_eq!(form["days"], 10);

    let table = json_output(&tmp, &["show", "1042", "--format", "json"]);
    assert_eq!(table["sector"], "Corte e Solda");
}

#[test]
fn test_import_semicolon_csv() {
    let tmp = setup_test_project();
    write_table(
        &tmp,
        "excel.csv",
        "Número;Descrição;Setor\nRNC-1;Furo;Extrusão\nRNC-2;Risco;Picote\n",
    );

    sgq(&tmp)
        .args(["import", "excel.csv"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Records inserted: 2"));
}

// ============================================================================
// List / Show / Filters Tests
// ============================================================================

#[test]
fn test_list_json() {
    let tmp = setup_imported_project();
    let list = json_output(&tmp, &["list", "--format", "json"]);
    let records = list.as_array().unwrap();
    assert_eq!(records.len(), 3);
    assert_eq!(records[0]["number"], "RNC-001");
    assert_eq!(records[1]["sector"], "Compras");
    assert_eq!(records[2]["sector"], "Impressão");
}

#[test]
fn test_list_filters() {
    let tmp = setup_imported_project();

    sgq(&tmp)
        .args(["list", "--type", "supplier", "--format", "id"])
        .assert()
        .success()
        .stdout("RNC-002\n");

    sgq(&tmp)
        .args(["list", "--month", "abril", "--count"])
        .assert()
        .success()
        .stdout("2\n");

    sgq(&tmp)
        .args(["list", "--status", "closed", "--format", "id"])
        .assert()
        .success()
        .stdout("RNC-001\n");

    sgq(&tmp)
        .args(["list", "--search", "umidade", "--format", "id"])
        .assert()
        .success()
        .stdout("RNC-002\n");
}

#[test]
fn test_list_table_and_csv() {
    let tmp = setup_imported_project();

    sgq(&tmp)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("RNC-003"))
        .stdout(predicate::str::contains("3 RNC(s) found"));

    sgq(&tmp)
        .args(["list", "--format", "csv"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with(
            "number,open,type,sector,status,responsible,days,description\n",
        ))
        .stdout(predicate::str::contains(
            "RNC-001,05/03/2024,Interna,Extrusão,Fechada,Ana,10,Bobina com furo",
        ));
}

#[test]
fn test_show_record() {
    let tmp = setup_imported_project();
    let record = json_output(&tmp, &["show", "rnc-001", "--format", "json"]);
    assert_eq!(record["number"], "RNC-001");
    assert_eq!(record["status"], "Fechada");
    assert_eq!(record["days"], 10);
    assert_eq!(record["type"], "Interna");

    sgq(&tmp)
        .args(["show", "RNC-404"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No RNC found"));
}

#[test]
fn test_filters_options() {
    let tmp = setup_imported_project();
    let options = json_output(&tmp, &["filters", "--format", "json"]);
    assert_eq!(options["months"], serde_json::json!(["Março", "Abril"]));
    assert_eq!(
        options["sectors"],
        serde_json::json!(["Compras", "Extrusão", "Impressão"])
    );
    assert_eq!(options["responsibles"], serde_json::json!(["Ana", "Bruno"]));
}

// ============================================================================
// New Tests
// ============================================================================

#[test]
fn test_new_record_with_flags() {
    let tmp = setup_test_project();

    sgq(&tmp)
        .args([
            "new", "-n", "RNC-100", "-d", "Selagem fraca", "--sector", "corte e solda",
            "--open", "01/02/2024", "--close", "11/02/2024",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created RNC RNC-100"));

    let record = json_output(&tmp, &["show", "RNC-100", "--format", "json"]);
    assert_eq!(record["sector"], "Corte e Solda");
    assert_eq!(record["status"], "Fechada");
    assert_eq!(record["days"], 10);
}

#[test]
fn test_new_rejects_invalid_date() {
    let tmp = setup_test_project();
    sgq(&tmp)
        .args(["new", "-n", "RNC-101", "-d", "x", "--open", "32/13/2024"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid date"));
}

// ============================================================================
// Dashboard Tests
// ============================================================================

#[test]
fn test_dashboard_general_json() {
    let tmp = setup_imported_project();
    let view = json_output(&tmp, &["dashboard", "general", "--format", "json"]);
    assert_eq!(view["kpis"]["total"], 3);
    assert_eq!(view["kpis"]["closed"], 1);
    assert_eq!(view["kpis"]["open"], 2);
    assert_eq!(view["monthly"].as_array().unwrap().len(), 12);
    assert_eq!(view["monthly"][3]["value"], 2);
}

#[test]
fn test_dashboard_suppliers_with_filter() {
    let tmp = setup_imported_project();
    let view = json_output(&tmp, &["dashboard", "suppliers", "--format", "json"]);
    assert_eq!(view["kpis"]["total"], 1);
    assert_eq!(view["suppliers"][0]["name"], "Acme Embalagens");

    let view = json_output(
        &tmp,
        &["dashboard", "general", "--sector", "Extrusão", "--format", "json"],
    );
    assert_eq!(view["kpis"]["total"], 1);
}

#[test]
fn test_dashboard_deviation_table() {
    let tmp = setup_imported_project();
    sgq(&tmp)
        .args(["dashboard", "deviation"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Ishikawa"))
        .stdout(predicate::str::contains("Desvios"))
        .stdout(predicate::str::contains("Máquina"));
}

#[test]
fn test_dashboard_efficacy_csv() {
    let tmp = setup_imported_project();
    sgq(&tmp)
        .args(["dashboard", "efficacy", "--format", "csv"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Eficácia,Fechadas,1"));
}

// ============================================================================
// Store / Cache Tests
// ============================================================================

#[test]
fn test_offline_reads_local_cache() {
    let tmp = setup_imported_project();
    sgq(&tmp)
        .args(["list", "--count"])
        .env("SGQ_STORE_ENABLED", "false")
        .assert()
        .success()
        .stdout("3\n");
}

#[test]
fn test_sync_pull_restores_cache() {
    let tmp = setup_imported_project();
    fs::remove_file(tmp.path().join(".sgq/cache.json")).unwrap();

    sgq(&tmp)
        .arg("sync")
        .assert()
        .success()
        .stdout(predicate::str::contains("Pulled 3 record(s)"));

    sgq(&tmp)
        .args(["list", "--count"])
        .env("SGQ_STORE_ENABLED", "false")
        .assert()
        .success()
        .stdout("3\n");
}

#[test]
fn test_sync_push_uploads_offline_imports() {
    let tmp = setup_test_project();
    write_table(&tmp, "rncs.csv", RNC_TABLE);

    sgq(&tmp)
        .args(["import", "rncs.csv"])
        .env("SGQ_STORE_ENABLED", "false")
        .assert()
        .success();
    assert!(!tmp.path().join(".sgq/store.db").exists());

    sgq(&tmp)
        .args(["sync", "--push"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Pushed 3 record(s)"));
}

#[test]
fn test_offline_import_survives_next_online_command() {
    let tmp = setup_imported_project();
    write_table(
        &tmp,
        "late.csv",
        "Número,Descrição,Setor\nRNC-004,Selagem aberta,Picote\n",
    );

    sgq(&tmp)
        .args(["import", "late.csv"])
        .env("SGQ_STORE_ENABLED", "false")
        .assert()
        .success();

    sgq(&tmp)
        .args(["list", "--count"])
        .assert()
        .success()
        .stdout("4\n");

    sgq(&tmp)
        .args(["sync", "--push"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Pushed 4 record(s)"));

    fs::remove_file(tmp.path().join(".sgq/cache.json")).unwrap();
    sgq(&tmp)
        .arg("sync")
        .assert()
        .success()
        .stdout(predicate::str::contains("Pulled 4 record(s)"));
}

#[test]
fn test_sync_without_store_fails() {
    let tmp = setup_test_project();
    sgq(&tmp)
        .arg("sync")
        .env("SGQ_STORE_ENABLED", "false")
        .assert()
        .failure()
        .stderr(predicate::str::contains("No document store"));
}

#[test]
fn test_invalid_config_is_reported() {
    let tmp = setup_test_project();
    fs::write(
        tmp.path().join(".sgq/config.yaml"),
        "store:\n  batch_size: 900\n",
    )
    .unwrap();

    sgq(&tmp)
        .arg("list")
        .assert()
        .failure()
        .stderr(predicate::str::contains("batch_size"));
}

#[test]
fn test_watch_with_timeout() {
    let tmp = setup_imported_project();
    sgq(&tmp)
        .args(["watch", "--timeout", "1"])
        .env("SGQ_POLL_INTERVAL_MS", "100")
        .assert()
        .success()
        .stdout(predicate::str::contains("3 record(s)"));
}

#[test]
fn test_clear_with_yes() {
    let tmp = setup_imported_project();

    sgq(&tmp)
        .args(["clear", "--yes"])
        .assert()
        .success()
        .stdout(predicate::str::contains("3 stored record(s)"));

    sgq(&tmp)
        .args(["list", "--count"])
        .assert()
        .success()
        .stdout("0\n");
}
