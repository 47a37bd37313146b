//! CLI command implementations — thin wrappers over the gRPC client.

use std::collections::HashMap;
use std::time::Duration;

use tonic::transport::Channel;

use fleet_grpc::proto;
use fleet_grpc::proto::fleet_manager_client::FleetManagerClient;

/// Action classification for software updates, the only action type the
/// CLI issues.
const SOFTWARE_UPDATE: i32 = 1;

pub async fn register(addr: &str, device_id: &str) -> anyhow::Result<()> {
    let mut client = connect(addr).await?;

    let resp = client
        .register_device(proto::RegisterDeviceRequest {
            device_id: device_id.to_string(),
        })
        .await?
        .into_inner();

    println!("Device registered:");
    if let Some(device) = resp.device {
        print_device(&device);
    }
    Ok(())
}

pub async fn info(addr: &str, device_id: &str) -> anyhow::Result<()> {
    let mut client = connect(addr).await?;

    let resp = client
        .get_device_info(proto::GetDeviceInfoRequest {
            device_id: device_id.to_string(),
        })
        .await?
        .into_inner();

    println!("Device info:");
    if let Some(device) = resp.device {
        print_device(&device);
    }
    Ok(())
}

pub async fn list(addr: &str) -> anyhow::Result<()> {
    let mut client = connect(addr).await?;

    let resp = client
        .list_devices(proto::ListDevicesRequest {})
        .await?
        .into_inner();

    println!("Devices:");
    for device in &resp.devices {
        println!("- {} {}", device.device_id, device_status_name(device.status));
    }
    Ok(())
}

pub async fn update(addr: &str, device_id: &str, version: &str) -> anyhow::Result<()> {
    let mut client = connect(addr).await?;

    let mut params = HashMap::new();
    params.insert("version".to_string(), version.to_string());

    let resp = client
        .initiate_device_action(proto::InitiateDeviceActionRequest {
            device_id: device_id.to_string(),
            action_type: SOFTWARE_UPDATE,
            action_params: params,
        })
        .await?
        .into_inner();

    println!("Action started. Action ID = {}", resp.action_id);
    Ok(())
}

pub async fn status(addr: &str, action_id: &str) -> anyhow::Result<()> {
    let mut client = connect(addr).await?;

    let resp = client
        .get_device_action_status(proto::GetDeviceActionStatusRequest {
            action_id: action_id.to_string(),
        })
        .await?
        .into_inner();

    if let Some(action) = resp.action {
        println!("Action status: {}", action_status_name(action.status));
    }
    Ok(())
}

/// Poll an action until it reaches a terminal status.
pub async fn poll(addr: &str, action_id: &str, interval_secs: u64) -> anyhow::Result<()> {
    let mut client = connect(addr).await?;

    loop {
        let resp = client
            .get_device_action_status(proto::GetDeviceActionStatusRequest {
                action_id: action_id.to_string(),
            })
            .await?
            .into_inner();

        let status = resp
            .action
            .map(|a| parse_action_status(a.status))
            .unwrap_or(proto::ActionStatus::Unspecified);
        println!("Status: {}", status.as_str_name());

        if action_is_terminal(status) {
            break;
        }
        tokio::time::sleep(Duration::from_secs(interval_secs)).await;
    }
    Ok(())
}

async fn connect(addr: &str) -> anyhow::Result<FleetManagerClient<Channel>> {
    let endpoint = format!("http://{addr}");
    let client = FleetManagerClient::connect(endpoint).await?;
    Ok(client)
}

fn print_device(device: &proto::Device) {
    println!("  id:        {}", device.device_id);
    println!("  status:    {}", device_status_name(device.status));
    println!("  last_seen: {}", device.last_seen_epoch);
    if !device.metadata.is_empty() {
        println!("  metadata:  {}", device.metadata);
    }
}

fn device_status_name(status: i32) -> &'static str {
    proto::DeviceStatus::try_from(status)
        .unwrap_or(proto::DeviceStatus::Unspecified)
        .as_str_name()
}

fn action_status_name(status: i32) -> &'static str {
    parse_action_status(status).as_str_name()
}

fn parse_action_status(status: i32) -> proto::ActionStatus {
    proto::ActionStatus::try_from(status).unwrap_or(proto::ActionStatus::Unspecified)
}

/// True once no further status transition will occur.
fn action_is_terminal(status: proto::ActionStatus) -> bool {
    matches!(
        status,
        proto::ActionStatus::Completed | proto::ActionStatus::Failed
    )
}
