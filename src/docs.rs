use crate::api::device::{CommandRequest, UploaderConfig};
use crate::api::employee::EmployeeSyncResponse;
use crate::attendance::ReportFilter;
use crate::model::attendance::{AttendanceStatus, DailyAttendanceRecord, RangeSummaryRecord};
use crate::model::device::{Device, DevicePatch, NewDevice};
use crate::model::employee::{EmployeeIdentity, EmployeeUpdate};
use crate::model::punch::RawPunchEvent;
use crate::sync::{
    DeviceFailure, DeviceSyncOutcome, DirectorySyncOutcome, DirectorySyncReport, IngestOutcome,
    LogSyncReport,
};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Attendance Sync API",
        version = "1.0.0",
        description = r#"
## Attendance Synchronization & Time Accounting

Pulls punch logs and user identities from biometric terminals over their JSON
control protocol, stores them idempotently and turns them into daily and
date-range attendance reports.

### 🔹 Key Features
- **Devices**
  - Register terminals, proxy raw commands, configure push uploads
- **Sync**
  - Incremental, cursor-based log pulls and directory refreshes
- **Attendance**
  - Push ingestion, raw log listing, daily classification and range summaries
- **Employees**
  - Directory listing and field-wise merges

### 📦 Response Format
- JSON-based RESTful responses
- Proxy errors use the terminal envelope `{mid, result: "Error", payload: {code, details}}`

---
Built with **Rust**, **Actix Web**, **SQLx**, **reqwest** and **Utoipa**.
"#,
    ),
    paths(
        crate::api::device::list_devices,
        crate::api::device::get_device,
        crate::api::device::register_device,
        crate::api::device::update_device,
        crate::api::device::delete_device,
        crate::api::device::send_command,
        crate::api::device::configure_uploader,

        crate::api::attendance::upload_logs,
        crate::api::attendance::list_logs,
        crate::api::attendance::daily_report,
        crate::api::attendance::range_report,

        crate::api::employee::list_employees,
        crate::api::employee::sync_employees,

        crate::api::sync::sync_logs,
        crate::api::sync::sync_device_logs,
        crate::api::sync::sync_directory
    ),
    components(
        schemas(
            Device,
            NewDevice,
            DevicePatch,
            CommandRequest,
            UploaderConfig,
            RawPunchEvent,
            IngestOutcome,
            EmployeeIdentity,
            EmployeeUpdate,
            EmployeeSyncResponse,
            AttendanceStatus,
            DailyAttendanceRecord,
            RangeSummaryRecord,
            ReportFilter,
            LogSyncReport,
            DeviceSyncOutcome,
            DirectorySyncReport,
            DirectorySyncOutcome,
            DeviceFailure
        )
    ),
    tags(
        (name = "Device", description = "Terminal registry and command proxy"),
        (name = "Attendance", description = "Punch ingestion and attendance reports"),
        (name = "Employee", description = "Employee directory"),
        (name = "Sync", description = "On-demand synchronization runs"),
    )
)]
pub struct ApiDoc;
