//! Service JSON shapes and their conversion into domain types

use pan_core::{
    BatchTaskItem, BatchTaskStatus, Entity, Error, ItemFailure, MediaType, PathSegment, Result,
    SearchResult, TaskState,
};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Error code the service uses for a missing file
const FILE_NOT_FOUND: &str = "FileNotFound";

/// `taskStatus` values
const TASK_STATUS_FAILED: i64 = 2;
const TASK_STATUS_OK: i64 = 4;

/// Ids come back as numbers from some routes and strings from others
fn id_string<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<String, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    })
}

/// Flags come back as booleans or as 0/1
fn flag<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<bool, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Bool(b) => b,
        Value::Number(n) => n.as_i64().is_some_and(|n| n != 0),
        Value::String(s) => s == "1" || s.eq_ignore_ascii_case("true"),
        _ => false,
    })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireEntity {
    #[serde(deserialize_with = "id_string")]
    file_id: String,
    file_name: String,
    #[serde(default)]
    file_size: u64,
    #[serde(default)]
    file_type: String,
    #[serde(default, deserialize_with = "flag")]
    is_folder: bool,
    #[serde(default, deserialize_with = "id_string")]
    parent_id: String,
    #[serde(default)]
    create_time: Option<String>,
    #[serde(default)]
    last_op_time: Option<String>,
    #[serde(default)]
    download_url: Option<String>,
    #[serde(default, deserialize_with = "flag")]
    is_starred: bool,
    #[serde(default)]
    media_type: u32,
    #[serde(default)]
    sub_file_count: Option<u64>,
}

impl From<WireEntity> for Entity {
    fn from(wire: WireEntity) -> Self {
        let non_empty = |s: Option<String>| s.filter(|s| !s.is_empty());
        Entity {
            id: wire.file_id,
            name: wire.file_name,
            size: if wire.is_folder { 0 } else { wire.file_size },
            file_type: wire.file_type,
            is_folder: wire.is_folder,
            parent_id: wire.parent_id,
            created_at: non_empty(wire.create_time),
            modified_at: non_empty(wire.last_op_time),
            download_url: non_empty(wire.download_url),
            starred: wire.is_starred,
            media_type: MediaType::from(wire.media_type),
            child_count: if wire.is_folder { wire.sub_file_count } else { None },
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WirePathSegment {
    #[serde(deserialize_with = "id_string")]
    file_id: String,
    #[serde(default)]
    file_name: String,
    #[serde(default, deserialize_with = "flag")]
    is_co_share: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireSearch {
    #[serde(default)]
    data: Vec<WireEntity>,
    #[serde(default)]
    page_num: u32,
    #[serde(default)]
    page_size: u32,
    #[serde(default)]
    path: Vec<WirePathSegment>,
    #[serde(default)]
    record_count: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireFailure {
    #[serde(default, deserialize_with = "id_string")]
    file_id: String,
    #[serde(default)]
    error_code: String,
    #[serde(default)]
    error_message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireTaskStatus {
    task_status: i64,
    #[serde(default)]
    successed_count: u64,
    #[serde(default)]
    failed_count: u64,
    #[serde(default)]
    skip_count: u64,
    #[serde(default)]
    failed_list: Vec<WireFailure>,
}

/// One entry of the `taskInfos` form field
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WireTaskInfo<'a> {
    file_id: &'a str,
    file_name: &'a str,
    is_folder: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    src_parent_id: Option<&'a str>,
}

/// Reject bodies carrying the service's error envelope
///
/// Two shapes exist: `{errorCode, errorMsg}` and `{res_code, res_message}`.
pub(crate) fn check_envelope(body: &[u8]) -> Result<()> {
    let Ok(Value::Object(map)) = serde_json::from_slice::<Value>(body) else {
        return Ok(());
    };

    let text = |key: &str| map.get(key).and_then(Value::as_str).unwrap_or_default();

    let code = text("errorCode");
    if !code.is_empty() {
        return Err(remote_error(code, text("errorMsg")));
    }

    let res_code = match map.get("res_code") {
        Some(Value::Number(n)) => n.as_i64().unwrap_or(0),
        Some(Value::String(s)) => s.parse().unwrap_or(0),
        _ => 0,
    };
    if res_code != 0 {
        return Err(remote_error(&res_code.to_string(), text("res_message")));
    }

    Ok(())
}

fn remote_error(code: &str, message: &str) -> Error {
    if code == FILE_NOT_FOUND {
        return Error::NotFound(if message.is_empty() {
            code.to_string()
        } else {
            message.to_string()
        });
    }
    Error::Remote {
        code: code.to_string(),
        message: message.to_string(),
    }
}

pub(crate) fn decode_search(body: &[u8]) -> Result<SearchResult> {
    check_envelope(body)?;
    let wire: WireSearch = serde_json::from_slice(body)?;
    Ok(SearchResult {
        entities: wire.data.into_iter().map(Entity::from).collect(),
        page_num: wire.page_num,
        page_size: wire.page_size,
        path: wire
            .path
            .into_iter()
            .map(|s| PathSegment {
                id: s.file_id,
                name: s.file_name,
                shared: s.is_co_share,
            })
            .collect(),
        record_count: wire.record_count,
    })
}

pub(crate) fn decode_entity(body: &[u8]) -> Result<Entity> {
    check_envelope(body)?;
    let wire: WireEntity = serde_json::from_slice(body)?;
    Ok(wire.into())
}

/// The task id comes back as a bare string, a JSON string or `{"taskId": ...}`
pub(crate) fn decode_task_id(body: &[u8]) -> Result<String> {
    check_envelope(body)?;
    let text = std::str::from_utf8(body)
        .map_err(|e| Error::Decode(format!("task id is not UTF-8: {e}")))?
        .trim();

    let task_id = match text.chars().next() {
        Some('"') => serde_json::from_str::<String>(text)?,
        Some('{') => {
            let value: Value = serde_json::from_str(text)?;
            match value.get("taskId") {
                Some(Value::String(s)) => s.clone(),
                Some(Value::Number(n)) => n.to_string(),
                _ => return Err(Error::Decode(format!("no taskId in '{text}'"))),
            }
        }
        _ => text.to_string(),
    };

    if task_id.is_empty() {
        return Err(Error::Decode("empty task id".into()));
    }
    Ok(task_id)
}

pub(crate) fn decode_task_status(body: &[u8]) -> Result<BatchTaskStatus> {
    check_envelope(body)?;
    let wire: WireTaskStatus = serde_json::from_slice(body)?;
    let state = match wire.task_status {
        TASK_STATUS_OK => TaskState::Ok,
        TASK_STATUS_FAILED => TaskState::Failed,
        _ => TaskState::Pending,
    };
    Ok(BatchTaskStatus {
        state,
        success_count: wire.successed_count,
        failed_count: wire.failed_count,
        skip_count: wire.skip_count,
        failures: wire
            .failed_list
            .into_iter()
            .map(|f| ItemFailure {
                file_id: f.file_id,
                code: f.error_code,
                message: f.error_message,
            })
            .collect(),
    })
}

/// JSON array for the `taskInfos` form field
pub(crate) fn encode_task_infos(items: &[BatchTaskItem]) -> Result<String> {
    let infos: Vec<WireTaskInfo<'_>> = items
        .iter()
        .map(|item| WireTaskInfo {
            file_id: &item.file_id,
            file_name: &item.file_name,
            is_folder: u8::from(item.is_folder),
            src_parent_id: Some(item.src_parent_id.as_str()).filter(|id| !id.is_empty()),
        })
        .collect();
    Ok(serde_json::to_string(&infos)?)
}
