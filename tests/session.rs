//! End-to-end retrieval sessions against a local mock origin.

use std::path::Path;
use std::sync::Arc;

use serde_json::json;
use sha1::{Digest, Sha1};
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use launcher_fetch::{ArtifactFetcher, LauncherConfig, Platform, ProgressTracker};

const CLIENT: &[u8] = b"client archive bytes";
const LIB: &[u8] = b"forge library 2.0";
const NATIVE: &[u8] = b"linux natives 1.0";
const ICON: &[u8] = b"icon";
const SOUND: &[u8] = b"sound";

fn sha1(data: &[u8]) -> String {
    hex::encode(Sha1::digest(data))
}

fn object_route(data: &[u8]) -> String {
    let hash = sha1(data);
    format!("/res/{}/{}", &hash[..2], hash)
}

async fn serve(server: &MockServer, route: &str, body: Vec<u8>, hits: u64) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body))
        .expect(hits)
        .mount(server)
        .await;
}

fn seed_child(config: &LauncherConfig) {
    let dir = config.versions_dir().join("forge-1.20.1");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(
        dir.join("forge-1.20.1.json"),
        json!({
            "id": "forge-1.20.1",
            "inheritsFrom": "1.20.1",
            "mainClass": "cpw.mods.bootstraplauncher.BootstrapLauncher",
            "libraries": [{"name": "X:Y:2.0"}],
            "arguments": {"game": ["--launchTarget", "forgeclient"]}
        })
        .to_string(),
    )
    .unwrap();
}

fn parent_manifest(origin: &str) -> serde_json::Value {
    json!({
        "id": "1.20.1",
        "type": "release",
        "mainClass": "net.minecraft.client.main.Main",
        "assetIndex": {"id": "5", "url": format!("{origin}/indexes/5.json")},
        "downloads": {"client": {"url": format!("{origin}/client.jar"), "sha1": sha1(CLIENT)}},
        "arguments": {"game": ["--username", "${auth_player_name}"]},
        "libraries": [
            {
                "name": "X:Y:1.0",
                "natives": {"linux": "natives-linux"},
                "downloads": {"classifiers": {"natives-linux": {
                    "path": "X/Y/1.0/Y-1.0-natives-linux.jar",
                    "url": format!("{origin}/natives-linux.jar"),
                    "sha1": sha1(NATIVE)
                }}}
            },
            {
                "name": "only:windows:1",
                "rules": [{"action": "allow", "os": {"name": "windows"}}]
            }
        ]
    })
}

fn asset_index() -> serde_json::Value {
    json!({"objects": {
        "icons/icon.png": {"hash": sha1(ICON), "size": ICON.len()},
        "icons/icon_copy.png": {"hash": sha1(ICON), "size": ICON.len()},
        "sounds/a.ogg": {"hash": sha1(SOUND), "size": SOUND.len()}
    }})
}

fn config_for(data_dir: &Path, server: &MockServer) -> LauncherConfig {
    let mut config = LauncherConfig::with_data_dir(data_dir);
    config.version_manifest_url = format!("{}/catalog.json", server.uri());
    config.resources_url = format!("{}/res", server.uri());
    config.libraries_url = format!("{}/maven", server.uri());
    config.concurrency = 4;
    config
}

#[tokio::test]
async fn loader_profile_session_downloads_everything_once() {
    let server = MockServer::start().await;
    let origin = server.uri();

    Mock::given(method("GET"))
        .and(path("/catalog.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "latest": {"release": "1.20.1", "snapshot": "1.20.1"},
            "versions": [{"id": "1.20.1", "type": "release", "url": format!("{origin}/v/1.20.1.json")}]
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v/1.20.1.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(parent_manifest(&origin)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/indexes/5.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(asset_index()))
        .expect(2)
        .mount(&server)
        .await;
    serve(&server, "/client.jar", CLIENT.to_vec(), 1).await;
    serve(&server, "/maven/X/Y/2.0/Y-2.0.jar", LIB.to_vec(), 1).await;
    serve(&server, "/natives-linux.jar", NATIVE.to_vec(), 1).await;
    serve(&server, &object_route(ICON), ICON.to_vec(), 1).await;
    serve(&server, &object_route(SOUND), SOUND.to_vec(), 1).await;

    let tmp = tempfile::tempdir().unwrap();
    let config = config_for(tmp.path(), &server);
    seed_child(&config);

    let fetcher = ArtifactFetcher::new(config.clone())
        .unwrap()
        .with_platform(Platform::new("linux", "x86_64"));

    let progress = Arc::new(ProgressTracker::default());
    let report = fetcher
        .download_version("forge-1.20.1", Arc::clone(&progress), CancellationToken::new())
        .await
        .unwrap();

    assert!(report.is_success(), "{:?}", report.failures);
    // client + library + native + two distinct asset objects
    assert_eq!((report.completed, report.total), (5, 5));
    assert_eq!(
        report.version.main_class.as_deref(),
        Some("cpw.mods.bootstraplauncher.BootstrapLauncher")
    );
    assert_eq!(report.version.jar_id(), "1.20.1");
    let xy: Vec<_> = report
        .version
        .libraries
        .iter()
        .filter(|lib| lib.name.starts_with("X:Y:"))
        .collect();
    assert_eq!(xy.len(), 1);
    assert_eq!(xy[0].name, "X:Y:2.0");
    assert_eq!(xy[0].natives.get("linux").map(String::as_str), Some("natives-linux"));
    assert_eq!(
        report.version.game_args(fetcher.platform()),
        vec!["--launchTarget", "forgeclient", "--username", "${auth_player_name}"]
    );

    let data = tmp.path();
    assert_eq!(std::fs::read(data.join("versions/1.20.1/1.20.1.jar")).unwrap(), CLIENT);
    assert_eq!(std::fs::read(data.join("libraries/X/Y/2.0/Y-2.0.jar")).unwrap(), LIB);
    assert_eq!(
        std::fs::read(data.join("libraries/X/Y/1.0/Y-1.0-natives-linux.jar")).unwrap(),
        NATIVE
    );
    let icon = sha1(ICON);
    assert_eq!(
        std::fs::read(data.join("assets/objects").join(&icon[..2]).join(&icon)).unwrap(),
        ICON
    );
    assert!(data.join("assets/indexes/5.json").exists());
    assert!(data.join("versions/1.20.1/1.20.1.json").exists());
    assert!(data.join("versions/version_manifest_v2.json").exists());
    assert!(!data.join("libraries/only").exists());

    assert!(fetcher.verify(&report.version).await.unwrap().is_empty());

    // Second session: everything is cached and valid, only the index is refetched.
    let again = fetcher
        .download_version("forge-1.20.1", Arc::new(ProgressTracker::default()), CancellationToken::new())
        .await
        .unwrap();
    assert!(again.is_success());
    assert_eq!((again.completed, again.total), (5, 5));
}

#[tokio::test]
async fn corrupted_file_is_repaired_on_rerun() {
    let server = MockServer::start().await;
    let origin = server.uri();
    serve(&server, "/client.jar", CLIENT.to_vec(), 1).await;

    let tmp = tempfile::tempdir().unwrap();
    let config = config_for(tmp.path(), &server);
    let dir = config.versions_dir().join("1.20.1");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(
        dir.join("1.20.1.json"),
        json!({
            "id": "1.20.1",
            "downloads": {"client": {"url": format!("{origin}/client.jar"), "sha1": sha1(CLIENT)}}
        })
        .to_string(),
    )
    .unwrap();
    std::fs::write(dir.join("1.20.1.jar"), b"truncated").unwrap();

    let fetcher = ArtifactFetcher::new(config)
        .unwrap()
        .with_platform(Platform::new("linux", "x86_64"));
    let report = fetcher
        .repair_version("1.20.1", Arc::new(ProgressTracker::default()), CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.completed, 1);
    assert_eq!(std::fs::read(dir.join("1.20.1.jar")).unwrap(), CLIENT);
}

#[tokio::test]
async fn unknown_version_fails_before_any_download() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/catalog.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"versions": []})))
        .mount(&server)
        .await;

    let tmp = tempfile::tempdir().unwrap();
    let fetcher = ArtifactFetcher::new(config_for(tmp.path(), &server)).unwrap();
    let err = fetcher
        .download_version("9.9.9", Arc::new(ProgressTracker::default()), CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, launcher_fetch::LauncherError::VersionNotFound(ref id) if id == "9.9.9"));
}
