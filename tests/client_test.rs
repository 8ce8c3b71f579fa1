//! HTTP client tests against a local mock server.

use glesys_server::config::Credentials;
use glesys_server::error::{ApiError, GlesysError};
use glesys_server::glesys::{
    CreateServerRequest, PowerAction, PowerState, UpdateFields, GENERATED_PASSWORD_LENGTH,
};
use glesys_server::{GlesysClient, ServerApi};
use serde_json::{json, Value};
use wiremock::matchers::{basic_auth, body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> GlesysClient {
    GlesysClient::new(&Credentials::new("cl12345", "secret"))
        .unwrap()
        .with_endpoint(server.uri())
}

fn details_body() -> Value {
    json!({
        "response": {
            "status": { "code": 200, "text": "OK" },
            "server": {
                "serverid": "wps1",
                "hostname": "web1",
                "datacenter": "Falkenberg",
                "platform": "VMware",
                "cpucores": 2,
                "memorysize": 4096,
                "disksize": 40,
                "bandwidth": 100,
                "state": "running",
                "iplist": [
                    { "ipaddress": "2a02:750:7::1", "version": 6 },
                    { "ipaddress": "192.0.2.10", "version": 4 }
                ],
                "supportedfeatures": { "editbandwidth": "no" }
            }
        }
    })
}

#[tokio::test]
async fn test_list_sends_basic_auth() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/server/list"))
        .and(basic_auth("cl12345", "secret"))
        .and(header("accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "response": {
                "servers": [
                    { "serverid": "wps1", "hostname": "web1", "datacenter": "Falkenberg", "platform": "VMware" },
                    { "serverid": "wps2", "hostname": "web2", "datacenter": "Stockholm", "platform": "KVM" }
                ]
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let servers = client(&server).list().await.unwrap();
    assert_eq!(servers.len(), 2);
    assert_eq!(servers[1].hostname, "web2");
}

#[tokio::test]
async fn test_details_encodes_params_as_path_segments() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/server/details/serverid/wps1/includestate/true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(details_body()))
        .expect(1)
        .mount(&server)
        .await;

    let snapshot = client(&server).details("wps1").await.unwrap();
    assert_eq!(snapshot.cpucores, Some(2));
    assert_eq!(snapshot.state, Some(PowerState::Running));
    assert!(!snapshot.supportedfeatures.editbandwidth);
    assert_eq!(snapshot.display_address(), Some("192.0.2.10"));
}

#[tokio::test]
async fn test_details_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/server/details/serverid/wps404/includestate/true"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "response": { "status": { "code": 404, "text": "Server not found" } }
        })))
        .mount(&server)
        .await;

    let err = client(&server).details("wps404").await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_status_reads_state() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/server/status/serverid/wps1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "response": { "server": { "state": "locked" } }
        })))
        .mount(&server)
        .await;

    let state = client(&server).status("wps1").await.unwrap();
    assert_eq!(state, PowerState::Locked);
}

#[tokio::test]
async fn test_provider_error_text_is_kept_verbatim() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/server/stop"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "response": {
                "status": { "code": 400, "text": "Server is locked, try again later" }
            }
        })))
        .mount(&server)
        .await;

    let err = client(&server)
        .power("wps1", PowerAction::Stop)
        .await
        .unwrap_err();
    match err {
        GlesysError::Api(ApiError::Provider { status, message }) => {
            assert_eq!(status, 400);
            assert_eq!(message, "Server is locked, try again later");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_edit_posts_only_changed_fields() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/server/edit"))
        .and(body_json(json!({ "serverid": "wps1", "cpucores": 4 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(details_body()))
        .expect(1)
        .mount(&server)
        .await;

    let fields = UpdateFields {
        cpucores: Some(4),
        ..UpdateFields::default()
    };
    client(&server).update("wps1", &fields).await.unwrap();
}

#[tokio::test]
async fn test_empty_edit_is_never_sent() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/server/edit"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = client(&server)
        .update("wps1", &UpdateFields::default())
        .await
        .unwrap_err();
    assert!(matches!(err, GlesysError::InvalidArgument(_)));
}

#[tokio::test]
async fn test_create_generates_root_password() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/server/create"))
        .respond_with(ResponseTemplate::new(200).set_body_json(details_body()))
        .expect(1)
        .mount(&server)
        .await;

    let request = CreateServerRequest {
        hostname: String::from("web1"),
        platform: String::from("VMware"),
        datacenter: String::from("Falkenberg"),
        templatename: String::from("Debian 9 64-bit"),
        disksize: 20,
        memorysize: 2048,
        cpucores: 1,
        bandwidth: 100,
        rootpassword: String::new(),
        description: None,
        users: None,
        sshkey: Some(String::from("ssh-ed25519 AAAA admin")),
    };
    let created = client(&server).create(&request).await.unwrap();
    assert_eq!(created.serverid, "wps1");

    let received = server.received_requests().await.unwrap();
    let body: Value = received[0].body_json().unwrap();
    assert_eq!(body["hostname"], "web1");
    assert_eq!(body["templatename"], "Debian 9 64-bit");
    assert_eq!(body["ssh_pub_key"], "ssh-ed25519 AAAA admin");
    assert!(body.get("description").is_none());
    let password = body["rootpassword"].as_str().unwrap();
    assert_eq!(password.len(), GENERATED_PASSWORD_LENGTH);
}

#[tokio::test]
async fn test_destroy_accepts_empty_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/server/destroy"))
        .and(body_json(json!({ "serverid": "wps1", "keepip": "false" })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    client(&server).destroy("wps1").await.unwrap();
}
