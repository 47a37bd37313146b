//! Fleet gRPC server — the registry's remote call surface.
//!
//! Implements the generated `FleetManager` trait over a shared
//! `RegistryStore` and `ActionExecutor`. Device existence for
//! `InitiateDeviceAction` is validated here, not in the store — the
//! store itself accepts actions against unknown devices.

use tonic::{Request, Response, Status};
use tracing::info;

use fleet_registry::{ActionExecutor, RegistryError, RegistryStore};

use crate::proto;
use crate::proto::fleet_manager_server::FleetManager;

/// gRPC implementation of the fleet manager service.
pub struct FleetServer {
    store: RegistryStore,
    executor: ActionExecutor,
}

impl FleetServer {
    /// Create a new fleet server over shared registry state.
    pub fn new(store: RegistryStore, executor: ActionExecutor) -> Self {
        Self { store, executor }
    }

    /// Get the tonic service for mounting on a gRPC server.
    pub fn into_service(self) -> proto::fleet_manager_server::FleetManagerServer<Self> {
        proto::fleet_manager_server::FleetManagerServer::new(self)
    }
}

#[tonic::async_trait]
impl FleetManager for FleetServer {
    async fn register_device(
        &self,
        request: Request<proto::RegisterDeviceRequest>,
    ) -> Result<Response<proto::RegisterDeviceResponse>, Status> {
        let req = request.into_inner();

        let record = self
            .store
            .register_device(&req.device_id)
            .map_err(to_status)?;

        Ok(Response::new(proto::RegisterDeviceResponse {
            device: Some(device_to_proto(&record)),
        }))
    }

    async fn set_device_status(
        &self,
        request: Request<proto::SetDeviceStatusRequest>,
    ) -> Result<Response<proto::SetDeviceStatusResponse>, Status> {
        let req = request.into_inner();

        let status = proto::DeviceStatus::try_from(req.status)
            .unwrap_or(proto::DeviceStatus::Unspecified);
        let record = self
            .store
            .set_device_status(&req.device_id, device_status_from_proto(status))
            .map_err(to_status)?;

        Ok(Response::new(proto::SetDeviceStatusResponse {
            device: Some(device_to_proto(&record)),
        }))
    }

    async fn get_device_info(
        &self,
        request: Request<proto::GetDeviceInfoRequest>,
    ) -> Result<Response<proto::GetDeviceInfoResponse>, Status> {
        let req = request.into_inner();

        let record = self.store.get_device(&req.device_id).map_err(to_status)?;

        Ok(Response::new(proto::GetDeviceInfoResponse {
            device: Some(device_to_proto(&record)),
        }))
    }

    async fn list_devices(
        &self,
        _request: Request<proto::ListDevicesRequest>,
    ) -> Result<Response<proto::ListDevicesResponse>, Status> {
        let devices = self
            .store
            .list_devices()
            .iter()
            .map(device_to_proto)
            .collect();

        Ok(Response::new(proto::ListDevicesResponse { devices }))
    }

    async fn initiate_device_action(
        &self,
        request: Request<proto::InitiateDeviceActionRequest>,
    ) -> Result<Response<proto::InitiateDeviceActionResponse>, Status> {
        let req = request.into_inner();

        // The store is permissive about unknown devices; the RPC
        // surface is not.
        self.store.get_device(&req.device_id).map_err(to_status)?;

        let action_id =
            self.store
                .create_action(&req.device_id, req.action_type, req.action_params);
        self.executor.spawn(action_id.clone());

        info!(%action_id, device_id = %req.device_id, "device action initiated");

        Ok(Response::new(proto::InitiateDeviceActionResponse {
            action_id,
        }))
    }

    async fn get_device_action_status(
        &self,
        request: Request<proto::GetDeviceActionStatusRequest>,
    ) -> Result<Response<proto::GetDeviceActionStatusResponse>, Status> {
        let req = request.into_inner();

        let record = self.store.get_action(&req.action_id).map_err(to_status)?;

        Ok(Response::new(proto::GetDeviceActionStatusResponse {
            action: Some(action_to_proto(&record)),
        }))
    }
}

/// Map core errors to transport status codes.
fn to_status(err: RegistryError) -> Status {
    match &err {
        RegistryError::AlreadyExists(_) => Status::already_exists(err.to_string()),
        RegistryError::NotFound(_) => Status::not_found(err.to_string()),
    }
}

fn device_to_proto(record: &fleet_registry::DeviceRecord) -> proto::Device {
    proto::Device {
        device_id: record.device_id.clone(),
        status: device_status_to_proto(record.status).into(),
        metadata: record.metadata.clone(),
        last_seen_epoch: record.last_seen,
    }
}

fn action_to_proto(record: &fleet_registry::ActionRecord) -> proto::DeviceAction {
    proto::DeviceAction {
        action_id: record.action_id.clone(),
        device_id: record.device_id.clone(),
        action_type: record.action_type,
        status: action_status_to_proto(record.status).into(),
        status_message: record.status_message.clone(),
        started_at_epoch: record.started_at,
        finished_at_epoch: record.finished_at.unwrap_or(0),
        params: record.params.clone(),
    }
}

fn device_status_to_proto(status: fleet_registry::DeviceStatus) -> proto::DeviceStatus {
    match status {
        fleet_registry::DeviceStatus::Unknown => proto::DeviceStatus::Unspecified,
        fleet_registry::DeviceStatus::Idle => proto::DeviceStatus::Idle,
        fleet_registry::DeviceStatus::Busy => proto::DeviceStatus::Busy,
        fleet_registry::DeviceStatus::Offline => proto::DeviceStatus::Offline,
        fleet_registry::DeviceStatus::Maintenance => proto::DeviceStatus::Maintenance,
        fleet_registry::DeviceStatus::Updating => proto::DeviceStatus::Updating,
        fleet_registry::DeviceStatus::Recovering => proto::DeviceStatus::Recovering,
        fleet_registry::DeviceStatus::Error => proto::DeviceStatus::Error,
    }
}

fn device_status_from_proto(status: proto::DeviceStatus) -> fleet_registry::DeviceStatus {
    match status {
        // Unspecified falls back to Idle rather than rejecting.
        proto::DeviceStatus::Unspecified => fleet_registry::DeviceStatus::Idle,
        proto::DeviceStatus::Idle => fleet_registry::DeviceStatus::Idle,
        proto::DeviceStatus::Busy => fleet_registry::DeviceStatus::Busy,
        proto::DeviceStatus::Offline => fleet_registry::DeviceStatus::Offline,
        proto::DeviceStatus::Maintenance => fleet_registry::DeviceStatus::Maintenance,
        proto::DeviceStatus::Updating => fleet_registry::DeviceStatus::Updating,
        proto::DeviceStatus::Recovering => fleet_registry::DeviceStatus::Recovering,
        proto::DeviceStatus::Error => fleet_registry::DeviceStatus::Error,
    }
}

fn action_status_to_proto(status: fleet_registry::ActionStatus) -> proto::ActionStatus {
    match status {
        fleet_registry::ActionStatus::Queued => proto::ActionStatus::Queued,
        fleet_registry::ActionStatus::Running => proto::ActionStatus::Running,
        fleet_registry::ActionStatus::Completed => proto::ActionStatus::Completed,
        fleet_registry::ActionStatus::Failed => proto::ActionStatus::Failed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::time::Duration;
    use tonic::Code;

    fn test_server(success_rate: f64) -> (FleetServer, RegistryStore) {
        let store = RegistryStore::new();
        let executor = ActionExecutor::new(store.clone())
            .with_delay_range(Duration::from_millis(1), Duration::from_millis(2))
            .with_success_rate(success_rate);
        (FleetServer::new(store.clone(), executor), store)
    }

    #[tokio::test]
    async fn register_returns_idle_device() {
        let (server, _) = test_server(1.0);

        let resp = server
            .register_device(Request::new(proto::RegisterDeviceRequest {
                device_id: "dev1".to_string(),
            }))
            .await
            .unwrap()
            .into_inner();

        let device = resp.device.unwrap();
        assert_eq!(device.device_id, "dev1");
        assert_eq!(device.status, proto::DeviceStatus::Idle as i32);
        assert!(device.last_seen_epoch > 0);
    }

    #[tokio::test]
    async fn duplicate_registration_is_already_exists() {
        let (server, _) = test_server(1.0);

        let req = || {
            Request::new(proto::RegisterDeviceRequest {
                device_id: "dev1".to_string(),
            })
        };
        server.register_device(req()).await.unwrap();

        let err = server.register_device(req()).await.unwrap_err();
        assert_eq!(err.code(), Code::AlreadyExists);
    }

    #[tokio::test]
    async fn get_unknown_device_is_not_found() {
        let (server, _) = test_server(1.0);

        let err = server
            .get_device_info(Request::new(proto::GetDeviceInfoRequest {
                device_id: "ghost".to_string(),
            }))
            .await
            .unwrap_err();
        assert_eq!(err.code(), Code::NotFound);
    }

    #[tokio::test]
    async fn set_device_status_round_trips() {
        let (server, _) = test_server(1.0);
        server
            .register_device(Request::new(proto::RegisterDeviceRequest {
                device_id: "dev1".to_string(),
            }))
            .await
            .unwrap();

        let resp = server
            .set_device_status(Request::new(proto::SetDeviceStatusRequest {
                device_id: "dev1".to_string(),
                status: proto::DeviceStatus::Offline as i32,
            }))
            .await
            .unwrap()
            .into_inner();

        assert_eq!(
            resp.device.unwrap().status,
            proto::DeviceStatus::Offline as i32
        );
    }

    #[tokio::test]
    async fn set_status_unknown_device_is_not_found() {
        let (server, _) = test_server(1.0);

        let err = server
            .set_device_status(Request::new(proto::SetDeviceStatusRequest {
                device_id: "ghost".to_string(),
                status: proto::DeviceStatus::Idle as i32,
            }))
            .await
            .unwrap_err();
        assert_eq!(err.code(), Code::NotFound);
    }

    #[tokio::test]
    async fn list_devices_returns_all() {
        let (server, store) = test_server(1.0);
        store.register_device("dev1").unwrap();
        store.register_device("dev2").unwrap();

        let resp = server
            .list_devices(Request::new(proto::ListDevicesRequest {}))
            .await
            .unwrap()
            .into_inner();

        assert_eq!(resp.devices.len(), 2);
    }

    #[tokio::test]
    async fn initiate_action_on_unknown_device_is_not_found() {
        let (server, _) = test_server(1.0);

        let err = server
            .initiate_device_action(Request::new(proto::InitiateDeviceActionRequest {
                device_id: "ghost".to_string(),
                action_type: 1,
                action_params: HashMap::new(),
            }))
            .await
            .unwrap_err();
        assert_eq!(err.code(), Code::NotFound);
    }

    #[tokio::test]
    async fn initiated_action_runs_to_completion() {
        let (server, store) = test_server(1.0);
        store.register_device("dev1").unwrap();

        let resp = server
            .initiate_device_action(Request::new(proto::InitiateDeviceActionRequest {
                device_id: "dev1".to_string(),
                action_type: 1,
                action_params: HashMap::new(),
            }))
            .await
            .unwrap()
            .into_inner();
        assert!(!resp.action_id.is_empty());

        // Give the executor task time to report both statuses.
        tokio::time::sleep(Duration::from_millis(100)).await;

        let status = server
            .get_device_action_status(Request::new(proto::GetDeviceActionStatusRequest {
                action_id: resp.action_id,
            }))
            .await
            .unwrap()
            .into_inner();

        let action = status.action.unwrap();
        assert_eq!(action.status, proto::ActionStatus::Completed as i32);
        assert_eq!(action.status_message, "completed");
        assert!(action.finished_at_epoch > 0);

        assert_eq!(
            store.get_device("dev1").unwrap().status,
            fleet_registry::DeviceStatus::Idle
        );
    }

    #[tokio::test]
    async fn failing_action_errors_the_device() {
        let (server, store) = test_server(0.0);
        store.register_device("dev1").unwrap();

        let resp = server
            .initiate_device_action(Request::new(proto::InitiateDeviceActionRequest {
                device_id: "dev1".to_string(),
                action_type: 2,
                action_params: HashMap::new(),
            }))
            .await
            .unwrap()
            .into_inner();

        tokio::time::sleep(Duration::from_millis(100)).await;

        let action = store.get_action(&resp.action_id).unwrap();
        assert_eq!(action.status, fleet_registry::ActionStatus::Failed);
        assert_eq!(action.status_message, "failed");
        assert_eq!(
            store.get_device("dev1").unwrap().status,
            fleet_registry::DeviceStatus::Error
        );
    }

    #[tokio::test]
    async fn get_unknown_action_is_not_found() {
        let (server, _) = test_server(1.0);

        let err = server
            .get_device_action_status(Request::new(proto::GetDeviceActionStatusRequest {
                action_id: "nope".to_string(),
            }))
            .await
            .unwrap_err();
        assert_eq!(err.code(), Code::NotFound);
    }
}
