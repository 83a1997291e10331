use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn tailor_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("tailor");
    path
}

fn resume_json() -> Value {
    json!({
        "name": "Jane Doe",
        "contact": {"email": "jane@example.com", "phone": "+49 30 1234", "location": "Berlin"},
        "summary": "Rust engineer with eight years of backend experience.",
        "skills": {"languages": ["Rust", "Go"], "cloud_platforms": ["AWS"]},
        "experience": [{
            "title": "Senior Engineer",
            "company": "Acme",
            "location": "Berlin",
            "duration": "2020 - present",
            "responsibilities": ["Led the storage team", "Cut p99 latency by 40%"]
        }],
        "education": [{"degree": "BSc Computer Science", "institution": "TU Berlin", "graduation_year": "2015"}]
    })
}

fn setup_test_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();

    let config_content = format!(
        r#"[embedding]
provider = "disabled"

[output]
dir = "{root}/generated"
cache_dir = "{root}/generated/cache"
"#,
        root = root.display()
    );
    let config_path = config_dir.join("tailor.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_tailor(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    run_tailor_with_env(config_path, args, &[])
}

fn run_tailor_with_env(
    config_path: &Path,
    args: &[&str],
    env: &[(&str, &str)],
) -> (String, String, bool) {
    let binary = tailor_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .arg("--progress")
        .arg("off")
        .args(args)
        .envs(env.iter().copied())
        .output()
        .unwrap_or_else(|e| panic!("Failed to run tailor binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

fn minimal_docx_with_text(phrase: &str) -> Vec<u8> {
    use std::io::Write;
    let mut buf = Vec::new();
    {
        let mut zip = zip::ZipWriter::new(std::io::Cursor::new(&mut buf));
        zip.start_file("word/document.xml", zip::write::SimpleFileOptions::default())
            .unwrap();
        let xml = format!(
            "<?xml version=\"1.0\"?><w:document xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\"><w:body><w:p><w:r><w:t>{}</w:t></w:r></w:p></w:body></w:document>",
            phrase
        );
        zip.write_all(xml.as_bytes()).unwrap();
        zip.finish().unwrap();
    }
    buf
}

#[test]
fn test_extract_text_file() {
    let (tmp, config_path) = setup_test_env();
    let path = tmp.path().join("cv.txt");
    fs::write(&path, "Jane Doe\nRust engineer").unwrap();

    let (stdout, stderr, success) = run_tailor(&config_path, &["extract", path.to_str().unwrap()]);
    assert!(success, "extract failed: stderr={}", stderr);
    assert!(stdout.contains("Jane Doe"));
    assert!(stdout.contains("Rust engineer"));
}

#[test]
fn test_extract_docx() {
    let (tmp, config_path) = setup_test_env();
    let path = tmp.path().join("cv.docx");
    fs::write(&path, minimal_docx_with_text("distributed systems engineer")).unwrap();

    let (stdout, stderr, success) = run_tailor(&config_path, &["extract", path.to_str().unwrap()]);
    assert!(success, "extract failed: stderr={}", stderr);
    assert!(stdout.contains("distributed systems engineer"));
}

#[test]
fn test_extract_unsupported_extension() {
    let (tmp, config_path) = setup_test_env();
    let path = tmp.path().join("cv.odt");
    fs::write(&path, "whatever").unwrap();

    let (_, stderr, success) = run_tailor(&config_path, &["extract", path.to_str().unwrap()]);
    assert!(!success);
    assert!(stderr.contains("unsupported"), "stderr={}", stderr);
}

#[test]
fn test_render_then_extract_pdf() {
    let (tmp, config_path) = setup_test_env();
    let json_path = tmp.path().join("cv.json");
    fs::write(&json_path, resume_json().to_string()).unwrap();
    let pdf_path = tmp.path().join("out").join("cv.pdf");

    let (stdout, stderr, success) = run_tailor(
        &config_path,
        &[
            "render",
            json_path.to_str().unwrap(),
            "--out",
            pdf_path.to_str().unwrap(),
        ],
    );
    assert!(success, "render failed: stderr={}", stderr);
    assert!(stdout.contains("Wrote"));
    assert!(pdf_path.exists());

    let doc = lopdf::Document::load(&pdf_path).unwrap();
    assert!(!doc.get_pages().is_empty());

    let (text, stderr, success) =
        run_tailor(&config_path, &["extract", pdf_path.to_str().unwrap()]);
    assert!(success, "extract failed: stderr={}", stderr);
    assert!(text.contains("Jane Doe"));
    assert!(text.contains("Senior Engineer"));
}

#[test]
fn test_render_rejects_invalid_json() {
    let (tmp, config_path) = setup_test_env();
    let json_path = tmp.path().join("cv.json");
    fs::write(&json_path, "not json at all").unwrap();

    let (_, _, success) = run_tailor(&config_path, &["render", json_path.to_str().unwrap()]);
    assert!(!success);
}

#[test]
fn test_score_errors_when_embeddings_disabled() {
    let (tmp, config_path) = setup_test_env();
    let json_path = tmp.path().join("cv.json");
    fs::write(&json_path, resume_json().to_string()).unwrap();
    let jd_path = tmp.path().join("jd.txt");
    fs::write(&jd_path, "Rust engineer wanted").unwrap();

    let (_, stderr, success) = run_tailor(
        &config_path,
        &[
            "score",
            json_path.to_str().unwrap(),
            "--job-file",
            jd_path.to_str().unwrap(),
        ],
    );
    assert!(!success);
    assert!(stderr.contains("embedding"), "stderr={}", stderr);
}

#[test]
fn test_score_requires_a_job() {
    let (tmp, config_path) = setup_test_env();
    let json_path = tmp.path().join("cv.json");
    fs::write(&json_path, resume_json().to_string()).unwrap();

    let (_, stderr, success) = run_tailor(&config_path, &["score", json_path.to_str().unwrap()]);
    assert!(!success);
    assert!(stderr.contains("--job-id"), "stderr={}", stderr);
}

#[test]
fn test_restructure_without_api_key() {
    let (tmp, config_path) = setup_test_env();
    fs::write(
        &config_path,
        "[llm]\nprovider = \"openai\"\napi_key_env = \"TAILOR_TEST_KEY_THAT_IS_NOT_SET\"\n",
    )
    .unwrap();
    let path = tmp.path().join("cv.txt");
    fs::write(&path, "Jane Doe").unwrap();

    let (_, stderr, success) = run_tailor(&config_path, &["restructure", path.to_str().unwrap()]);
    assert!(!success);
    assert!(
        stderr.contains("TAILOR_TEST_KEY_THAT_IS_NOT_SET"),
        "stderr={}",
        stderr
    );
}

#[test]
fn test_unknown_progress_mode() {
    let (tmp, config_path) = setup_test_env();
    let path = tmp.path().join("cv.txt");
    fs::write(&path, "Jane Doe").unwrap();

    let output = Command::new(tailor_binary())
        .arg("--config")
        .arg(&config_path)
        .arg("--progress")
        .arg("loud")
        .arg("extract")
        .arg(&path)
        .output()
        .unwrap();
    assert!(!output.status.success());
}

#[test]
fn test_invalid_config_is_reported() {
    let (tmp, config_path) = setup_test_env();
    fs::write(&config_path, "[llm]\nprovider = \"mystery\"\n").unwrap();
    let path = tmp.path().join("cv.txt");
    fs::write(&path, "Jane Doe").unwrap();

    let (_, stderr, success) = run_tailor(&config_path, &["restructure", path.to_str().unwrap()]);
    assert!(!success);
    assert!(stderr.contains("mystery"), "stderr={}", stderr);
}

// ============ Against a mock server ============

async fn start_mock() -> String {
    let app = Router::new()
        .route(
            "/v1/chat/completions",
            post(|Json(_body): Json<Value>| async {
                Json(json!({
                    "choices": [{"message": {"role": "assistant", "content": resume_json().to_string()}}]
                }))
            }),
        )
        .route(
            "/jobs-guest/jobs/api/seeMoreJobPostings/search",
            get(|| async {
                r#"<li><div class="base-search-card" data-entity-urn="urn:li:jobPosting:555">
  <a class="base-card__full-link" href="https://www.linkedin.com/jobs/view/rust-555"></a>
  <h3 class="base-search-card__title">Rust Engineer</h3>
  <h4 class="base-search-card__subtitle">Acme</h4>
  <span class="job-search-card__location">Remote</span>
</div></li>"#
            }),
        );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_restructure_writes_json_and_pdf() {
    let base = start_mock().await;
    let (tmp, config_path) = setup_test_env();
    fs::write(
        &config_path,
        format!(
            "[llm]\nurl = \"{base}\"\napi_key_env = \"TAILOR_IT_KEY\"\nmax_retries = 0\n\n[output]\ncache_dir = \"{}\"\n",
            tmp.path().join("cache").display()
        ),
    )
    .unwrap();
    let cv = tmp.path().join("cv.txt");
    fs::write(&cv, "Jane Doe, Rust engineer at Acme since 2020").unwrap();
    let json_out = tmp.path().join("cv.json");
    let pdf_out = tmp.path().join("cv.pdf");

    let args = vec![
        "restructure".to_string(),
        cv.display().to_string(),
        "--out".to_string(),
        json_out.display().to_string(),
        "--pdf".to_string(),
        pdf_out.display().to_string(),
    ];
    let (stdout, stderr, success) = tokio::task::spawn_blocking(move || {
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        run_tailor_with_env(&config_path, &args, &[("TAILOR_IT_KEY", "test-key")])
    })
    .await
    .unwrap();

    assert!(success, "restructure failed: stdout={} stderr={}", stdout, stderr);
    let saved: Value = serde_json::from_str(&fs::read_to_string(&json_out).unwrap()).unwrap();
    assert_eq!(saved["name"], "Jane Doe");
    assert_eq!(saved["experience"][0]["company"], "Acme");
    assert!(saved["projects"].as_array().unwrap().is_empty());
    assert!(pdf_out.exists());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_search_writes_csv() {
    let base = start_mock().await;
    let (tmp, config_path) = setup_test_env();
    fs::write(
        &config_path,
        format!("[scraper]\nbase_url = \"{base}\"\ndelay_ms = 0\nmax_pages = 1\n"),
    )
    .unwrap();
    let csv_path = tmp.path().join("listings.csv");

    let args = vec![
        "search".to_string(),
        "rust".to_string(),
        "--limit".to_string(),
        "5".to_string(),
        "--csv".to_string(),
        csv_path.display().to_string(),
    ];
    let (stdout, stderr, success) = tokio::task::spawn_blocking(move || {
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        run_tailor(&config_path, &args)
    })
    .await
    .unwrap();

    assert!(success, "search failed: stderr={}", stderr);
    assert!(stdout.contains("Rust Engineer at Acme"));
    assert!(stdout.contains("id: 555"));
    let csv = fs::read_to_string(&csv_path).unwrap();
    assert!(csv.contains("Rust Engineer,https://www.linkedin.com/jobs/view/rust-555,Acme,Remote,555"));
}
