use std::net::IpAddr;

use chrono::{TimeZone, Utc};
use tempfile::TempDir;

use ertia_core::deployment::{Deployment, Provisioning};
use ertia_core::dns::Dns;
use ertia_core::error::CoreError;
use ertia_core::keys::{Ed25519KeyGenerator, SshKey};
use ertia_core::pool::ReservationPool;
use ertia_core::project::{Project, ProjectOptions, Projects};
use ertia_core::status::{DependencyStatus, KeyStatus, NodeStatus};
use ertia_core::store::{JsonProjectStore, ProjectRepository, read_project, write_project};

fn ip(text: &str) -> IpAddr {
    text.parse().unwrap()
}

fn populated_project() -> Project {
    let options = ProjectOptions::new()
        .with_id("p-42")
        .with_name("staging")
        .with_provider_id("cl12345")
        .with_provider_token("secret")
        .with_domain("staging.ertia.cloud")
        .with_k3s_channel("stable")
        .with_deployments(vec![
            Deployment::new("ingress").with_source("ertia-io", "ingress", "v1.2.0"),
        ])
        .with_provisionings(vec![Provisioning::new("base", "ertia")]);
    let mut project = Project::new(options, &Ed25519KeyGenerator::new()).unwrap();

    let master_id = project.add_node().id.clone();
    {
        let master = project.find_node_by_id_mut(&master_id).unwrap();
        master.ipv4 = Some(ip("10.1.0.10"));
        master.ipv6 = Some(ip("2001:db8::10"));
        master.node_token = "K10::server:abc".into();
        master.status = NodeStatus::Ready;
        master.set_feature("traefik", true);
        master.add_dependency("k3s").status = DependencyStatus::Ready;
    }
    project.add_node();
    if let Some(dns) = project.dns.as_mut() {
        dns.mark_ready(ip("10.1.0.10"));
    }
    project.tag(["warm", "eu-north"]);
    project.reserve().unwrap();
    project
}

#[test]
fn project_document_round_trips() {
    let project = populated_project();

    let json = project.to_json().unwrap();
    let parsed = Project::from_json(&json).unwrap();

    assert_eq!(parsed, project);
}

#[test]
fn wire_names_match_stored_documents() {
    let project = populated_project();

    let value = serde_json::to_value(&project).unwrap();

    assert_eq!(value["providerID"], "cl12345");
    assert_eq!(value["providerToken"], "secret");
    assert_eq!(value["k3sChannel"], "stable");
    assert!(value["delete"].is_string());
    assert_eq!(value["reserved"], true);
    assert_eq!(value["sshKey"]["status"], "NEW");
    assert_eq!(value["nodes"][0]["isMaster"], true);
    assert_eq!(value["nodes"][0]["masterIP"], "");
    assert_eq!(value["nodes"][0]["status"], "READY");
    assert_eq!(value["nodes"][0]["dependencies"][0]["status"], "READY");
    assert_eq!(value["nodes"][1]["masterIP"], "10.1.0.10");
    assert_eq!(value["nodes"][1]["ipv4"], "");
    assert_eq!(value["dns"]["ipv4"], "10.1.0.10");
}

#[test]
fn legacy_document_with_nulls_and_empty_addresses() {
    let json = r#"{
        "id": "legacy-1",
        "provider": "GLESYS",
        "providerID": "",
        "name": "legacy",
        "dns": null,
        "sshKey": {
            "id": "AbCdEf1234",
            "name": "AbCdEf1234",
            "status": "ACTIVE",
            "privateKey": "",
            "publicKey": "ssh-ed25519 AAAA",
            "created": "2021-06-01T10:00:00Z",
            "updated": "2021-06-01T10:00:00Z"
        },
        "nodes": [
            {
                "id": "n-1",
                "name": "quiet-falcon-ab12",
                "isMaster": true,
                "masterIP": "",
                "ipv4": "10.0.0.2",
                "ipv6": "",
                "tags": null,
                "features": null,
                "dependencies": null,
                "deployments": null,
                "deleted": null,
                "created": "2021-06-01T10:00:00Z",
                "updated": "2021-06-01T10:05:00Z"
            }
        ],
        "created": "2021-06-01T10:00:00Z",
        "updated": "2021-06-01T10:05:00Z",
        "deployments": null,
        "reserved": false,
        "delete": null,
        "tags": null,
        "provisionings": null
    }"#;

    let project = Project::from_json(json).unwrap();

    assert_eq!(project.id, "legacy-1");
    assert!(project.dns.is_none());
    assert!(project.deployments.is_empty());
    assert!(project.tags.is_empty());
    assert!(project.provisionings.is_empty());
    assert!(project.delete_at.is_none());
    assert!(project.is_reservable());
    assert_eq!(
        project.created,
        Utc.with_ymd_and_hms(2021, 6, 1, 10, 0, 0).unwrap()
    );

    let key = project.ssh_key.as_ref().unwrap();
    assert_eq!(key.status, KeyStatus::Active);
    assert!(key.fingerprint.is_empty());

    let node = &project.nodes[0];
    assert_eq!(node.status, NodeStatus::New);
    assert_eq!(node.ipv4, Some(ip("10.0.0.2")));
    assert!(node.master_ip.is_none());
    assert!(node.ipv6.is_none());
    assert!(node.features.is_empty());
    assert!(node.dependencies.is_empty());
    assert!(project.validate().is_ok());
}

#[test]
fn unknown_status_is_rejected() {
    let json = r#"{"id": "p", "nodes": [{"id": "n", "status": "EXPLODED"}]}"#;

    assert!(Project::from_json(json).is_err());
}

#[test]
fn null_pool_document_is_empty() {
    assert!(Projects::from_json("null").unwrap().is_empty());
    assert!(Projects::from_json("[]").unwrap().is_empty());
}

#[test]
fn store_round_trip_on_disk() {
    let temp = TempDir::new().unwrap();
    let store = JsonProjectStore::new(temp.path().join("pool").join("projects.json"));
    let projects: Projects = vec![
        populated_project(),
        Project::from_options(ProjectOptions::new().with_id("p-2")).unwrap(),
    ]
    .into();

    store.save_all(&projects).unwrap();
    let loaded = store.load_all().unwrap();

    assert_eq!(loaded, projects);
    assert_eq!(store.load("p-2").unwrap().id, "p-2");
}

#[test]
fn missing_store_file_is_an_empty_pool() {
    let temp = TempDir::new().unwrap();
    let store = JsonProjectStore::new(temp.path().join("projects.json"));

    assert!(store.load_all().unwrap().is_empty());
    assert!(store.load("anything").is_err());
}

#[test]
fn store_save_and_delete_single_projects() {
    let temp = TempDir::new().unwrap();
    let store = JsonProjectStore::new(temp.path().join("projects.json"));
    let mut project = Project::from_options(ProjectOptions::new().with_id("p-1")).unwrap();

    store.save(&project).unwrap();
    project.name = "renamed".into();
    store.save(&project).unwrap();

    let loaded = store.load_all().unwrap();
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded.get("p-1").unwrap().name, "renamed");

    let removed = store.delete("p-1").unwrap();
    assert_eq!(removed.name, "renamed");
    assert!(store.load_all().unwrap().is_empty());
    assert!(!store.lock_path().exists());
}

#[test]
fn inconsistent_project_does_not_block_the_pool() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("projects.json");
    let mut broken = Project::from_options(ProjectOptions::new().with_id("two-masters")).unwrap();
    broken.add_node();
    broken.add_node();
    broken.nodes[1].is_master = true;
    broken.nodes[1].master_ip = None;
    let healthy = Project::from_options(ProjectOptions::new().with_id("healthy")).unwrap();
    JsonProjectStore::new(path.clone())
        .save_all(&Projects::from(vec![broken.clone(), healthy]))
        .unwrap();

    let loaded = JsonProjectStore::new(path.clone()).load_all().unwrap();
    assert_eq!(loaded.len(), 2);
    assert_eq!(loaded.invalid().len(), 1);
    assert!(!loaded.get("two-masters").unwrap().is_reservable());

    let pool = ReservationPool::new(JsonProjectStore::new(path.clone()));
    assert_eq!(pool.available().unwrap(), 1);
    assert_eq!(pool.reserve().unwrap().id, "healthy");

    let stored = JsonProjectStore::new(path).load_all().unwrap();
    assert_eq!(stored.get("two-masters").unwrap(), &broken);
}

#[test]
fn duplicate_project_ids_fail_the_load() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("projects.json");
    let twin = Project::from_options(ProjectOptions::new().with_id("twin")).unwrap();
    JsonProjectStore::new(path.clone())
        .save_all(&Projects::from(vec![twin.clone(), twin]))
        .unwrap();

    let err = JsonProjectStore::new(path).load_all().unwrap_err();

    assert!(matches!(err, CoreError::InvalidDocument(_)));
}

#[test]
fn corrupt_store_file_is_reported_with_path() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("projects.json");
    std::fs::write(&path, "{ not json").unwrap();

    let err = JsonProjectStore::new(path).load_all().unwrap_err();

    assert!(format!("{err:#}").contains("projects.json"));
}

#[test]
fn single_project_file_round_trip() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("project.json");
    let project = populated_project();

    write_project(&path, &project).unwrap();
    let loaded = read_project(&path).unwrap();

    assert_eq!(loaded, project);
    assert!(std::fs::read_to_string(&path).unwrap().ends_with('\n'));
}

#[test]
fn key_wire_form_survives_round_trip() {
    let mut key = SshKey::new("priv".into(), "pub".into(), "SHA256:abc".into());
    key.provider_id = "4711".into();

    let json = serde_json::to_string(&key).unwrap();
    let parsed: SshKey = serde_json::from_str(&json).unwrap();

    assert_eq!(parsed, key);
    assert!(json.contains("\"providerId\":\"4711\""));
}

#[test]
fn dns_without_address_serializes_empty() {
    let dns = Dns::new("a.ertia.cloud");

    let value = serde_json::to_value(&dns).unwrap();

    assert_eq!(value["ipv4"], "");
    assert_eq!(value["status"], "NEW");
}
