use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::time::{Duration, Instant};

use bfg::export::EMPTY_PROFILE_JSON;
use bfg::lifecycle::FlameGraphController;
use bfg::profiling::SampleRecorder;
use bfg::server::ServerConfig;
use reqwest::blocking::Client;
use reqwest::StatusCode;

fn config(port: u16) -> ServerConfig {
    ServerConfig {
        port,
        open_browser: false,
        ..ServerConfig::default()
    }
}

fn client() -> Client {
    Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .timeout(Duration::from_secs(5))
        .build()
        .expect("Failed to build HTTP client")
}

fn start() -> (FlameGraphController, Arc<SampleRecorder>, SocketAddr) {
    let recorder = Arc::new(SampleRecorder::new());
    let controller = FlameGraphController::new(config(0), Arc::clone(&recorder));
    let addr = controller.start_server().expect("Failed to start server");
    (controller, recorder, addr)
}

fn free_port() -> u16 {
    TcpListener::bind("127.0.0.1:0")
        .and_then(|l| l.local_addr())
        .map(|a| a.port())
        .expect("No free port")
}

#[test]
fn test_root_redirects_to_index() {
    let (controller, _recorder, addr) = start();
    let resp = client().get(format!("http://{addr}/")).send().unwrap();

    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(resp.headers()["location"], "/index.html");
    controller.stop_server().unwrap();
}

#[test]
fn test_code_js_served_with_content_type() {
    let (controller, _recorder, addr) = start();
    let resp = client().get(format!("http://{addr}/code.js")).send().unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()["content-type"], "text/javascript");
    let expected_len = bfg::server::assets::lookup("code.js")
        .and_then(|asset| asset.embedded)
        .unwrap()
        .len();
    assert_eq!(
        resp.headers()["content-length"].to_str().unwrap(),
        expected_len.to_string()
    );
    controller.stop_server().unwrap();
}

#[test]
fn test_resource_dir_serves_optional_assets() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("progress.gif"), b"GIF89a").unwrap();
    let config = ServerConfig {
        resource_dir: Some(dir.path().to_path_buf()),
        ..config(0)
    };
    let controller = FlameGraphController::new(config, Arc::new(SampleRecorder::new()));
    let addr = controller.start_server().unwrap();
    let http = client();

    let gif = http.get(format!("http://{addr}/progress.gif")).send().unwrap();
    assert_eq!(gif.status(), StatusCode::OK);
    assert_eq!(gif.headers()["content-type"], "image/gif");
    assert_eq!(gif.bytes().unwrap().as_ref(), b"GIF89a");

    let index = http.get(format!("http://{addr}/index.html")).send().unwrap();
    assert_eq!(index.status(), StatusCode::OK);

    let missing = http.get(format!("http://{addr}/d3-scale.js")).send().unwrap();
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    controller.stop_server().unwrap();
}

#[test]
fn test_unknown_file_is_404() {
    let (controller, _recorder, addr) = start();
    let resp = client()
        .get(format!("http://{addr}/not-a-real-file.js"))
        .send()
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    controller.stop_server().unwrap();
}

#[test]
fn test_profile_before_recording_is_placeholder() {
    let (controller, _recorder, addr) = start();
    let resp = client()
        .get(format!("http://{addr}/profile.json"))
        .send()
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()["content-type"], "application/json");
    assert_eq!(resp.text().unwrap(), EMPTY_PROFILE_JSON);
    controller.stop_server().unwrap();
}

#[test]
fn test_record_stop_profile_round() {
    let (controller, recorder, addr) = start();
    let http = client();

    let resp = http.post(format!("http://{addr}/record")).send().unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(recorder.is_recording());

    {
        let _outer = recorder.frame("Application.mainWindowChanged");
        let _inner = recorder.frame("Scene.sceneChanged");
    }

    let resp = http.post(format!("http://{addr}/stop")).send().unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()["content-type"], "application/json");
    assert!(!recorder.is_recording());

    let body = http
        .get(format!("http://{addr}/profile.json"))
        .send()
        .unwrap()
        .text()
        .unwrap();
    let doc: serde_json::Value = serde_json::from_str(&body).expect("Invalid JSON");
    let c = doc.get("c").expect("Missing root key c");
    assert_eq!(c["totalSamples"], 2);
    let outer = &c["callStats"]["children"][0];
    assert_eq!(outer["stack"][0], "Application.mainWindowChanged");
    assert_eq!(outer["children"][0]["stack"][1], "sceneChanged");

    controller.stop_server().unwrap();
}

#[test]
fn test_double_start_on_fixed_port_keeps_one_listener() {
    let port = free_port();
    let recorder = Arc::new(SampleRecorder::new());
    let controller = FlameGraphController::new(config(port), recorder);

    let first = controller.start_server().unwrap();
    let second = controller.start_server().expect("Restart must release the first listener");
    assert_eq!(first, second);
    assert!(TcpStream::connect(second).is_ok());

    let started = Instant::now();
    controller.stop_server().unwrap();
    assert!(started.elapsed() < Duration::from_secs(5));
    assert!(TcpStream::connect(second).is_err());
}

#[test]
fn test_port_in_use_is_startup_error() {
    let taken = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = taken.local_addr().unwrap().port();

    let controller = FlameGraphController::new(config(port), Arc::new(SampleRecorder::new()));
    let err = controller.start_server().unwrap_err();

    assert!(matches!(err, bfg::domain::ServerError::Bind { .. }));
    assert!(!controller.is_running());
}

#[test]
fn test_shutdown_with_idle_keep_alive_connection_is_bounded() {
    let (controller, _recorder, addr) = start();
    let http = client();
    // Leaves a pooled keep-alive connection open on the server
    http.get(format!("http://{addr}/index.html")).send().unwrap();

    let started = Instant::now();
    controller.stop_server().unwrap();
    assert!(started.elapsed() < Duration::from_secs(5));
}
