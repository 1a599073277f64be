//! Device client end-to-end tests
//!
//! Real SubprocessRunner + PlistDecoder against fake tool scripts.

mod common;

use common::{FakeTools, LEGACY_UDID, UDID};
use imobile_core::domain::{DiagnosticsRequest, PackageScope, Points, PropertyQuery, PropertyValue};

#[tokio::test]
async fn test_list_devices_keeps_only_valid_identifiers() {
    let fakes = FakeTools::new();

    let devices = fakes.client().list_devices().await.unwrap();

    let ids: Vec<&str> = devices.iter().map(|d| d.as_str()).collect();
    assert_eq!(ids, vec![UDID, LEGACY_UDID]);
    assert_eq!(fakes.args("idevice_id").unwrap(), vec!["-l"]);
}

#[tokio::test]
async fn test_get_properties_decodes_plist() {
    let fakes = FakeTools::new();

    let props = fakes
        .client()
        .get_properties(UDID, &PropertyQuery::default())
        .await
        .unwrap();

    assert_eq!(props.string("DeviceName").unwrap(), Some("Test iPhone"));
    assert_eq!(props.string("ProductVersion").unwrap(), Some("17.2"));
    assert_eq!(fakes.args("ideviceinfo").unwrap(), vec!["-u", UDID, "-x"]);
}

#[tokio::test]
async fn test_get_properties_simple_domain_arguments() {
    let fakes = FakeTools::new();
    let query = PropertyQuery {
        simple: true,
        domain: Some("com.apple.mobile.battery".to_string()),
    };

    fakes.client().get_properties(UDID, &query).await.unwrap();

    assert_eq!(
        fakes.args("ideviceinfo").unwrap(),
        vec!["-u", UDID, "-x", "-s", "-q", "com.apple.mobile.battery"]
    );
}

#[tokio::test]
async fn test_get_packages_per_scope() {
    let fakes = FakeTools::new();
    let client = fakes.client();

    let packages = client.get_packages(UDID, PackageScope::User).await.unwrap();
    assert_eq!(packages, vec!["com.example.first", "com.example.second"]);
    assert_eq!(
        fakes.args("ideviceinstaller").unwrap(),
        vec!["-u", UDID, "-l", "-o", "xml"]
    );

    client.get_packages(UDID, PackageScope::System).await.unwrap();
    assert_eq!(
        fakes.args("ideviceinstaller").unwrap(),
        vec!["-u", UDID, "-l", "-o", "xml", "-o", "list_system"]
    );

    client.get_packages(UDID, PackageScope::All).await.unwrap();
    assert_eq!(
        fakes.args("ideviceinstaller").unwrap(),
        vec!["-u", UDID, "-l", "-o", "xml", "-o", "list_all"]
    );
}

#[tokio::test]
async fn test_diagnostics_default_request() {
    let fakes = FakeTools::new();

    let doc = fakes
        .client()
        .diagnostics(UDID, &DiagnosticsRequest::default())
        .await
        .unwrap();

    let gas_gauge = doc.as_dictionary().unwrap()["GasGauge"].as_dictionary().unwrap();
    assert_eq!(gas_gauge["CycleCount"], PropertyValue::Integer(412));
    assert_eq!(
        fakes.args("idevicediagnostics").unwrap(),
        vec!["-u", UDID, "diagnostics", "All"]
    );
}

#[tokio::test]
async fn test_power_and_recovery_commands() {
    let fakes = FakeTools::new();
    let client = fakes.client();

    client.reboot(UDID).await.unwrap();
    assert_eq!(
        fakes.args("idevicediagnostics").unwrap(),
        vec!["restart", "-u", UDID]
    );

    client.shutdown(UDID).await.unwrap();
    assert_eq!(
        fakes.args("idevicediagnostics").unwrap(),
        vec!["shutdown", "-u", UDID]
    );

    client.enter_recovery(UDID).await.unwrap();
    assert_eq!(fakes.args("ideviceenterrecovery").unwrap(), vec![UDID]);

    client.exit_recovery(UDID).await.unwrap();
    assert_eq!(
        fakes.args("irecovery").unwrap(),
        vec!["-n", "-i", "0x001a2c3e0e38802e"]
    );
}

#[tokio::test]
async fn test_name_get_and_set() {
    let fakes = FakeTools::new();
    let client = fakes.client();

    assert_eq!(client.name(UDID, None).await.unwrap(), "Test iPhone");
    assert_eq!(fakes.args("idevicename").unwrap(), vec!["-u", UDID]);

    let out = client.name(UDID, Some("Lab Phone 3")).await.unwrap();
    assert_eq!(out, "device name set to 'Lab Phone 3'");
    assert_eq!(
        fakes.args("idevicename").unwrap(),
        vec!["-u", UDID, "Lab Phone 3"]
    );
}

#[tokio::test]
async fn test_resolution_storage_battery() {
    let fakes = FakeTools::new();
    let client = fakes.client();

    let screen = client.get_resolution(UDID).await.unwrap();
    assert_eq!(screen.width, Some(1170));
    assert_eq!(screen.height, Some(2532));
    assert_eq!(screen.scale, Some(3));
    assert_eq!(
        screen.points,
        Some(Points {
            width: 390,
            height: 844
        })
    );

    let storage = client.get_storage(UDID).await.unwrap();
    assert_eq!(storage.size, Some(1000));
    assert_eq!(storage.free, Some(250));
    assert_eq!(storage.used, Some(750));
    assert_eq!(storage.free_percent, Some(25000.0 / 1002.0));

    let battery = client.get_battery(UDID).await.unwrap();
    assert_eq!(battery.get("level"), Some(&PropertyValue::Integer(87)));
    assert_eq!(
        battery.get("BatteryCurrentCapacity"),
        Some(&PropertyValue::Integer(87))
    );
    assert_eq!(battery.boolean("BatteryIsCharging").unwrap(), Some(true));
}

#[tokio::test]
async fn test_collect_logs_into_fresh_directory() {
    let fakes = FakeTools::new();

    let dir = fakes
        .client()
        .collect_logs(UDID, Some("Jetsam"))
        .await
        .unwrap();

    assert!(dir.starts_with(fakes.root()));
    assert!(dir.join("JetsamEvent.ips").is_file());
    assert_eq!(fakes.args("mktemp").unwrap(), vec!["-d"]);
    assert_eq!(
        fakes.args("idevicecrashreport").unwrap(),
        vec![
            "-u".to_string(),
            UDID.to_string(),
            "-f".to_string(),
            "Jetsam".to_string(),
            dir.to_string_lossy().into_owned(),
        ]
    );
}
