use serde_json::Value;
use std::process::Command;

#[test]
fn med_lab_reports_admissions_and_examinations() {
    let output = Command::new(env!("CARGO_BIN_EXE_med_lab"))
        .args(["--seed", "5", "--runs", "2"])
        .output()
        .expect("run med_lab");
    assert!(
        output.status.success(),
        "med_lab failed: stderr={}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    let days: Vec<_> = stdout
        .lines()
        .filter(|l| l.starts_with("day run="))
        .collect();
    assert_eq!(days.len(), 2, "stdout={stdout}");
    assert!(stdout.contains("  busy[2]="));
    assert!(stdout.contains("mean examined="));
    assert!(stdout.contains("Simulation terminated"));
}

#[test]
fn med_lab_json_admits_and_examines_everyone() {
    let output = Command::new(env!("CARGO_BIN_EXE_med_lab"))
        .args(["--seed", "9", "--runs", "3", "--nurses", "3", "--json"])
        .output()
        .expect("run med_lab");
    assert!(
        output.status.success(),
        "med_lab failed: stderr={}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<Value> = stdout
        .lines()
        .map(|l| serde_json::from_str(l).expect("each line is JSON"))
        .collect();

    let days: Vec<&Value> = lines.iter().filter(|v| v["kind"] == "day").collect();
    assert_eq!(days.len(), 3);
    for day in &days {
        let report = &day["report"];
        assert_eq!(report["admitted"], report["examined"]);
        assert_eq!(
            report["nurse_busy_share"].as_array().expect("shares").len(),
            4
        );
    }

    let summary = lines.last().expect("summary line");
    assert_eq!(summary["kind"], "summary");
    assert_eq!(summary["summary"]["runs"], 3);
}

#[test]
fn med_lab_rejects_zero_nurses() {
    let output = Command::new(env!("CARGO_BIN_EXE_med_lab"))
        .args(["--nurses", "0"])
        .output()
        .expect("run med_lab");
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("At least one server is required"));
}
