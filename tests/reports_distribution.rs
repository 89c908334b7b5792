use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

fn spawn_sidecar() -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_assessd");
    let mut child = Command::new(exe)
        .env_remove("ASSESSD_CONFIG")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn assessd");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
}

fn read_response(reader: &mut BufReader<ChildStdout>) -> serde_json::Value {
    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    assert!(!line.trim().is_empty(), "empty response");
    serde_json::from_str(line.trim()).expect("parse response json")
}

fn request(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let payload = json!({
        "id": id,
        "method": method,
        "params": params,
    });
    writeln!(stdin, "{}", payload).expect("write request");
    stdin.flush().expect("flush request");
    let value = read_response(reader);
    assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
    value
}

fn request_ok(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let value = request(stdin, reader, id, method, params);
    assert!(
        value.get("ok").and_then(|v| v.as_bool()).unwrap_or(false),
        "{} failed: {}",
        method,
        value
    );
    value.get("result").cloned().unwrap_or_else(|| json!({}))
}

fn error_code(value: &serde_json::Value) -> Option<&str> {
    value
        .get("error")
        .and_then(|e| e.get("code"))
        .and_then(|v| v.as_str())
}

fn score(participant: &str, competency: &str, author: &str, level: &str) -> serde_json::Value {
    json!({
        "participantId": participant,
        "competencyId": competency,
        "authorId": author,
        "level": level
    })
}

fn load_cohort(stdin: &mut ChildStdin, reader: &mut BufReader<ChildStdout>) {
    request_ok(
        stdin,
        reader,
        "load",
        "snapshot.load",
        json!({
            "categories": [
                {
                    "id": "tech",
                    "name": "Technical excellence",
                    "weight": 1.0,
                    "competencies": [{ "id": "t1", "name": "Coding", "weight": 1.0 }]
                },
                {
                    "id": "soft",
                    "name": "Soft",
                    "weight": 1.0,
                    "competencies": [{ "id": "s1", "name": "Teamwork", "weight": 1.0 }]
                }
            ],
            "participants": [
                { "id": "p1", "name": "Ada", "gender": "female", "team": "red" },
                { "id": "p2", "name": "Bo", "gender": "male", "team": "blue" },
                { "id": "p3", "name": "Cy", "team": "red" },
                { "id": "p4", "name": "Di", "gender": "female", "team": "red" }
            ],
            "scores": [
                score("p1", "t1", "tutor-a", "veryGood"),
                score("p1", "s1", "tutor-a", "good"),
                score("p2", "t1", "tutor-b", "bad"),
                score("p3", "t1", "tutor-a", "ok"),
                score("p3", "s1", "tutor-b", "ok")
            ],
            "completions": [
                {
                    "participantId": "p1",
                    "assessmentType": "assessment",
                    "completed": true,
                    "gradeSuggestion": 1.3
                },
                { "participantId": "p2", "assessmentType": "assessment", "gradeSuggestion": 4.0 },
                { "participantId": "p3", "assessmentType": "assessment", "gradeSuggestion": 2.9 }
            ]
        }),
    );
}

fn counts(point: &serde_json::Value) -> Vec<u64> {
    point["counts"]
        .as_array()
        .expect("counts")
        .iter()
        .map(|c| c["count"].as_u64().expect("count"))
        .collect()
}

#[test]
fn team_distribution_groups_in_first_seen_order() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    load_cohort(&mut stdin, &mut reader);

    let r = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "reports.distribution",
        json!({ "dimension": "team" }),
    );
    assert_eq!(r["totalParticipants"], json!(4));
    let points = r["points"].as_array().expect("points");
    assert_eq!(points.len(), 2);

    let red = &points[0];
    assert_eq!(red["key"], json!("red"));
    // p1 = 4.5, p3 = 3.0, p4 unscored
    assert_eq!(red["count"], json!(2));
    assert_eq!(red["average"].as_f64(), Some(3.75));
    assert_eq!(red["lowerQuartile"].as_f64(), Some(3.375));
    assert_eq!(red["median"].as_f64(), Some(3.75));
    assert_eq!(red["upperQuartile"].as_f64(), Some(4.125));
    assert_eq!(red["notAssessed"], json!(1));
    assert_eq!(counts(red), vec![0, 0, 1, 0, 1]);

    let blue = &points[1];
    assert_eq!(blue["key"], json!("blue"));
    assert_eq!(blue["median"].as_f64(), Some(2.0));
    assert_eq!(blue["notAssessed"], json!(0));

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn gender_distribution_labels_missing_values() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    load_cohort(&mut stdin, &mut reader);

    let r = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "reports.distribution",
        json!({ "dimension": "gender" }),
    );
    let labels: Vec<&str> = r["points"]
        .as_array()
        .expect("points")
        .iter()
        .map(|p| p["longLabel"].as_str().unwrap_or(""))
        .collect();
    assert_eq!(labels, vec!["female", "male", "Unknown"]);

    request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "setup.update",
        json!({ "section": "reports", "patch": { "unknownGroupLabel": "n/a" } }),
    );
    let r = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "reports.distribution",
        json!({ "dimension": "gender" }),
    );
    assert_eq!(r["points"][2]["longLabel"], json!("n/a"));

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn category_and_author_distributions() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    load_cohort(&mut stdin, &mut reader);

    let r = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "reports.distribution",
        json!({ "dimension": "category" }),
    );
    let points = r["points"].as_array().expect("points");
    assert_eq!(points[0]["key"], json!("tech"));
    assert_eq!(points[0]["longLabel"], json!("Technical excellence"));
    assert_eq!(points[0]["shortLabel"], json!("Technical e…"));
    assert_eq!(points[0]["count"], json!(3));
    assert_eq!(points[0]["median"].as_f64(), Some(3.0));
    assert_eq!(points[0]["notAssessed"], json!(1));
    assert_eq!(points[1]["shortLabel"], json!("Soft"));
    assert_eq!(points[1]["notAssessed"], json!(2));

    let r = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "reports.distribution",
        json!({ "dimension": "author" }),
    );
    let points = r["points"].as_array().expect("points");
    assert_eq!(points.len(), 2);
    assert_eq!(points[0]["key"], json!("tutor-a"));
    assert_eq!(points[0]["count"], json!(3));
    assert_eq!(counts(&points[0]), vec![0, 0, 1, 1, 1]);
    assert_eq!(points[0]["notAssessed"], json!(2));
    assert_eq!(points[1]["key"], json!("tutor-b"));
    assert_eq!(points[1]["notAssessed"], json!(2));

    let bad = request(
        &mut stdin,
        &mut reader,
        "3",
        "reports.distribution",
        json!({ "dimension": "shoeSize" }),
    );
    assert_eq!(error_code(&bad), Some("bad_params"));

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn grade_report_buckets_and_refreshes_on_change() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    load_cohort(&mut stdin, &mut reader);

    let r = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "reports.grades",
        json!({ "assessmentType": "assessment" }),
    );
    let buckets = r["buckets"].as_array().expect("buckets");
    assert_eq!(buckets.len(), 11);
    assert_eq!(buckets[1]["key"], json!("1.3"));
    assert_eq!(buckets[1]["count"], json!(1));
    assert_eq!(buckets[9]["count"], json!(1));
    assert_eq!(r["offScale"], json!(1));
    assert_eq!(r["notAssessed"], json!(1));
    assert_eq!(r["count"], json!(2));

    request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "completion.setGradeSuggestion",
        json!({
            "participantId": "p4",
            "assessmentType": "assessment",
            "author": "tutor-a",
            "gradeSuggestion": "1.3"
        }),
    );
    let r = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "reports.grades",
        json!({ "assessmentType": "assessment" }),
    );
    assert_eq!(r["buckets"][1]["count"], json!(2));
    assert_eq!(r["notAssessed"], json!(0));

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn stats_summary_over_raw_values() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let r = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "stats.summary",
        json!({ "values": [4, 1, 3, 2], "q": 0.5 }),
    );
    assert_eq!(r["median"].as_f64(), Some(2.5));
    assert_eq!(r["quantile"].as_f64(), Some(2.5));
    assert_eq!(r["average"].as_f64(), Some(2.5));
    assert_eq!(r["count"], json!(4));

    let single = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "stats.summary",
        json!({ "values": [5], "q": 0.25 }),
    );
    assert_eq!(single["quantile"].as_f64(), Some(5.0));
    assert_eq!(single["lowerQuartile"].as_f64(), Some(5.0));

    // Empty input is explicitly undefined rather than an error.
    let empty = request_ok(&mut stdin, &mut reader, "3", "stats.summary", json!({ "values": [] }));
    assert_eq!(empty["count"], json!(0));
    assert!(empty["average"].is_null());
    assert!(empty["median"].is_null());

    let bad = request(
        &mut stdin,
        &mut reader,
        "4",
        "stats.summary",
        json!({ "values": [1, "two"] }),
    );
    assert_eq!(error_code(&bad), Some("bad_params"));

    drop(stdin);
    let _ = child.wait();
}
