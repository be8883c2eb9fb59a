//! FFI use-case API for UI-host calls.
//!
//! # Responsibility
//! - Expose account, catalog, task and progress use-cases to the UI host.
//! - Keep error semantics simple: one envelope shape for every data call.
//!
//! # Invariants
//! - Exported functions never panic across the FFI boundary.
//! - Data calls are not `sync`; the host awaits them off the UI thread.
//! - Payloads are JSON strings of core records; password hashes never leave
//!   this crate.

use chrono::{DateTime, NaiveDate, Utc};
use log::warn;
use rusqlite::Connection;
use serde::Serialize;
use std::fmt::Display;
use std::path::PathBuf;
use std::sync::OnceLock;
use taskledger_core::db::open_db;
use taskledger_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    AuthService, AuthServiceError, CatalogService, CatalogServiceError, CreateTaskRequest,
    ItemProgressInput, RepoError, SqliteItemRepository, SqliteTaskRepository,
    SqliteUserRepository, TaskItemRequest, TaskPriority, TaskRepository, TaskService,
    TaskServiceError, TaskStatus, UpdateTaskRequest, User, UserId, UserRole,
};

const DB_FILE_NAME: &str = "taskledger.sqlite3";
static DB_PATH: OnceLock<PathBuf> = OnceLock::new();

/// Minimal health-check API for FFI smoke integration.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Core crate version.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes core logging once per process.
///
/// Returns an empty string on success and the error message otherwise.
/// Repeating the call with the same `level + log_dir` is a no-op.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// Pins the database file used by every data call.
///
/// Must run before the first data call; otherwise `TASKLEDGER_DB_PATH` or a
/// temp-dir default is used. Returns an empty string on success.
#[flutter_rust_bridge::frb(sync)]
pub fn configure_db_path(path: String) -> String {
    let trimmed = path.trim();
    if trimmed.is_empty() {
        return "db path cannot be empty".to_string();
    }
    let requested = PathBuf::from(trimmed);
    let active = DB_PATH.get_or_init(|| requested.clone());
    if *active == requested {
        String::new()
    } else {
        format!(
            "db path already set to `{}`; refusing to switch to `{}`",
            active.display(),
            requested.display()
        )
    }
}

/// Envelope returned by every data call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub ok: bool,
    /// Machine-readable failure kind (`duplicate`, `not_found`, `storage`,
    /// `invalid_input`, ...). `None` on success.
    pub error_code: Option<String>,
    /// Human-readable message for diagnostics/UI.
    pub message: String,
    /// JSON-encoded result on success.
    pub payload_json: Option<String>,
}

impl ApiResponse {
    fn success(message: impl Into<String>, payload: &impl Serialize) -> Self {
        match serde_json::to_string(payload) {
            Ok(json) => Self {
                ok: true,
                error_code: None,
                message: message.into(),
                payload_json: Some(json),
            },
            Err(err) => Self::failure("serialization", format!("payload encoding failed: {err}")),
        }
    }

    fn failure(code: &str, message: impl Into<String>) -> Self {
        Self {
            ok: false,
            error_code: Some(code.to_string()),
            message: message.into(),
            payload_json: None,
        }
    }
}

/// Checklist line for [`task_create`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskItemInput {
    pub item_id: i64,
    pub quantity: u32,
}

/// Progress line for [`task_add_progress`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressInput {
    pub item_id: i64,
    pub quantity_added: u32,
}

/// Partial task edit for [`task_update`]. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskUpdateInput {
    /// Empty string clears the title.
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<String>,
    pub status: Option<String>,
    pub assigned_to: Option<i64>,
    pub clear_assigned_to: bool,
    /// `YYYY-MM-DD`.
    pub due_date: Option<String>,
    pub clear_due_date: bool,
    pub items: Option<Vec<TaskItemInput>>,
}

/// Account projection without the password hash.
#[derive(Debug, Serialize)]
struct UserView {
    id: UserId,
    email: String,
    role: UserRole,
    created_at: DateTime<Utc>,
}

impl From<User> for UserView {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            role: user.role,
            created_at: user.created_at,
        }
    }
}

/// Registers an account. `role` defaults to `team`.
pub fn auth_sign_up(email: String, password: String, role: Option<String>) -> ApiResponse {
    let role = match role.as_deref().map(UserRole::parse) {
        None => UserRole::default(),
        Some(Some(role)) => role,
        Some(None) => return ApiResponse::failure("invalid_input", "unknown role"),
    };
    let result = with_connection(|conn| {
        let service = AuthService::new(SqliteUserRepository::try_new(conn)?);
        service.sign_up(&email, &password, role).map(UserView::from)
    });
    respond("auth_sign_up", "Account created.", result)
}

/// Verifies credentials; `invalid_credentials` on any mismatch.
pub fn auth_login(email: String, password: String) -> ApiResponse {
    let result = with_connection(|conn| {
        let service = AuthService::new(SqliteUserRepository::try_new(conn)?);
        service.authenticate_user(email.trim(), &password)
    });
    match result {
        Ok(Some(user)) => ApiResponse::success("Signed in.", &UserView::from(user)),
        Ok(None) => ApiResponse::failure("invalid_credentials", "Invalid email or password."),
        Err(err) => failure_response("auth_login", &err),
    }
}

/// Seeds demo accounts when no users exist; payload is the created count.
pub fn seed_demo_data() -> ApiResponse {
    let result = with_connection(|conn| {
        AuthService::new(SqliteUserRepository::try_new(conn)?).initialize_demo_data()
    });
    respond("seed_demo_data", "Demo data ready.", result)
}

pub fn users_list() -> ApiResponse {
    let result = with_connection(|conn| {
        let users = AuthService::new(SqliteUserRepository::try_new(conn)?).list_users()?;
        Ok::<_, RepoError>(users.into_iter().map(UserView::from).collect::<Vec<_>>())
    });
    respond("users_list", "Users loaded.", result)
}

/// Catalog listing; seeds default items on first use.
pub fn items_list() -> ApiResponse {
    let result = with_connection(|conn| {
        CatalogService::new(SqliteItemRepository::try_new(conn)?).list_items()
    });
    respond("items_list", "Items loaded.", result)
}

pub fn item_create(name: String, description: String) -> ApiResponse {
    let result = with_connection(|conn| {
        CatalogService::new(SqliteItemRepository::try_new(conn)?).create_item(&name, &description)
    });
    respond("item_create", "Item created.", result)
}

pub fn item_update(id: i64, name: String, description: String) -> ApiResponse {
    let result = with_connection(|conn| {
        CatalogService::new(SqliteItemRepository::try_new(conn)?)
            .update_item(id, &name, &description)
    });
    respond("item_update", "Item updated.", result)
}

pub fn item_delete(id: i64) -> ApiResponse {
    let result = with_connection(|conn| {
        CatalogService::new(SqliteItemRepository::try_new(conn)?).delete_item(id)
    });
    respond("item_delete", "Item deleted.", result)
}

/// All tasks, most urgent first.
pub fn tasks_list() -> ApiResponse {
    let result = with_connection(|conn| task_service(conn)?.list_tasks_by_priority());
    respond("tasks_list", "Tasks loaded.", result)
}

/// Creates a task. `priority` is `low|medium|high`; `due_date` is `YYYY-MM-DD`.
pub fn task_create(
    description: String,
    title: Option<String>,
    priority: String,
    assigned_to: Option<i64>,
    created_by: i64,
    due_date: Option<String>,
    items: Vec<TaskItemInput>,
) -> ApiResponse {
    let Some(priority) = TaskPriority::parse(&priority) else {
        return ApiResponse::failure("invalid_input", format!("unknown priority `{priority}`"));
    };
    let due_date = match parse_due_date(due_date.as_deref()) {
        Ok(value) => value,
        Err(message) => return ApiResponse::failure("invalid_input", message),
    };

    let request = CreateTaskRequest {
        title,
        description,
        priority,
        assigned_to,
        created_by,
        due_date,
        items: items
            .into_iter()
            .map(|line| TaskItemRequest {
                item_id: line.item_id,
                quantity: line.quantity,
            })
            .collect(),
    };
    let result = with_connection(|conn| task_service(conn)?.create_task_with_items(&request));
    respond("task_create", "Task created.", result)
}

/// Single task by id; `not_found` when absent.
pub fn task_get(task_id: i64) -> ApiResponse {
    let result = with_connection(|conn| {
        task_service(conn)?
            .get_task(task_id)?
            .ok_or(TaskServiceError::TaskNotFound(task_id))
    });
    respond("task_get", "Task loaded.", result)
}

/// Edits a task; a replaced checklist re-derives status unless `status` is set.
pub fn task_update(task_id: i64, input: TaskUpdateInput) -> ApiResponse {
    let request = match update_request(input) {
        Ok(request) => request,
        Err(message) => return ApiResponse::failure("invalid_input", message),
    };
    let result = with_connection(|conn| task_service(conn)?.update_task(task_id, &request));
    respond("task_update", "Task updated.", result)
}

/// Completion summary for one task.
pub fn task_progress(task_id: i64) -> ApiResponse {
    let result = with_connection(|conn| task_service(conn)?.task_progress(task_id));
    respond("task_progress", "Progress loaded.", result)
}

/// Explicit status override. `status` is `pending|in-progress|completed|cancelled`.
pub fn task_set_status(task_id: i64, status: String) -> ApiResponse {
    let Some(status) = TaskStatus::parse(&status) else {
        return ApiResponse::failure("invalid_input", format!("unknown status `{status}`"));
    };
    let result = with_connection(|conn| task_service(conn)?.set_status(task_id, status));
    respond("task_set_status", "Task status updated.", result)
}

pub fn task_delete(task_id: i64) -> ApiResponse {
    let result = with_connection(|conn| task_service(conn)?.delete_task(task_id));
    respond("task_delete", "Task deleted.", result)
}

/// Records progress; payload is the new audit record.
pub fn task_add_progress(
    task_id: i64,
    updates: Vec<ProgressInput>,
    updated_by: i64,
) -> ApiResponse {
    let updates = updates
        .into_iter()
        .map(|line| ItemProgressInput::new(line.item_id, line.quantity_added))
        .collect::<Vec<_>>();
    let result =
        with_connection(|conn| task_service(conn)?.record_progress(task_id, &updates, updated_by));
    respond("task_add_progress", "Progress recorded.", result)
}

/// Audit records, for one task or for all tasks when `task_id` is `None`.
pub fn task_progress_history(task_id: Option<i64>) -> ApiResponse {
    let result = with_connection(|conn| {
        SqliteTaskRepository::try_new(conn)?.get_task_item_updates(task_id)
    });
    respond("task_progress_history", "History loaded.", result)
}

/// Maps error types onto the envelope's `error_code`.
trait FailureCode: Display {
    fn failure_code(&self) -> &'static str;
}

impl FailureCode for RepoError {
    fn failure_code(&self) -> &'static str {
        self.code()
    }
}

impl FailureCode for AuthServiceError {
    fn failure_code(&self) -> &'static str {
        match self {
            Self::InvalidEmail(_) | Self::EmptyPassword => "invalid_input",
            Self::Repo(err) => err.code(),
        }
    }
}

impl FailureCode for CatalogServiceError {
    fn failure_code(&self) -> &'static str {
        match self {
            Self::EmptyName => "invalid_input",
            Self::Repo(err) => err.code(),
        }
    }
}

impl FailureCode for TaskServiceError {
    fn failure_code(&self) -> &'static str {
        match self {
            Self::EmptyDescription => "invalid_input",
            Self::UnknownItem(_) | Self::TaskNotFound(_) => "not_found",
            Self::Repo(err) => err.code(),
        }
    }
}

fn respond<T: Serialize, E: FailureCode>(
    operation: &str,
    message: &str,
    result: Result<T, E>,
) -> ApiResponse {
    match result {
        Ok(value) => ApiResponse::success(message, &value),
        Err(err) => failure_response(operation, &err),
    }
}

fn failure_response(operation: &str, err: &impl FailureCode) -> ApiResponse {
    let code = err.failure_code();
    warn!("event=ffi_call module=ffi status=error op={operation} error_code={code}");
    ApiResponse::failure(code, format!("{operation} failed: {err}"))
}

fn update_request(input: TaskUpdateInput) -> Result<UpdateTaskRequest, String> {
    let priority = match input.priority.as_deref() {
        None => None,
        Some(raw) => {
            Some(TaskPriority::parse(raw).ok_or_else(|| format!("unknown priority `{raw}`"))?)
        }
    };
    let status = match input.status.as_deref() {
        None => None,
        Some(raw) => Some(TaskStatus::parse(raw).ok_or_else(|| format!("unknown status `{raw}`"))?),
    };
    let assigned_to = if input.clear_assigned_to {
        Some(None)
    } else {
        input.assigned_to.map(Some)
    };
    let due_date = if input.clear_due_date {
        Some(None)
    } else {
        parse_due_date(input.due_date.as_deref())?.map(Some)
    };

    Ok(UpdateTaskRequest {
        title: input.title,
        description: input.description,
        priority,
        status,
        assigned_to,
        due_date,
        items: input.items.map(|lines| {
            lines
                .into_iter()
                .map(|line| TaskItemRequest {
                    item_id: line.item_id,
                    quantity: line.quantity,
                })
                .collect()
        }),
    })
}

fn parse_due_date(value: Option<&str>) -> Result<Option<NaiveDate>, String> {
    match value.map(str::trim).filter(|raw| !raw.is_empty()) {
        None => Ok(None),
        Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| format!("invalid due date `{raw}`; expected YYYY-MM-DD")),
    }
}

fn resolve_db_path() -> PathBuf {
    DB_PATH
        .get_or_init(|| {
            if let Ok(raw) = std::env::var("TASKLEDGER_DB_PATH") {
                let trimmed = raw.trim();
                if !trimmed.is_empty() {
                    return PathBuf::from(trimmed);
                }
            }
            std::env::temp_dir().join(DB_FILE_NAME)
        })
        .clone()
}

fn with_connection<T, E: From<RepoError>>(
    f: impl FnOnce(&Connection) -> Result<T, E>,
) -> Result<T, E> {
    let conn = open_db(resolve_db_path()).map_err(|err| E::from(RepoError::from(err)))?;
    f(&conn)
}

fn task_service(
    conn: &Connection,
) -> Result<TaskService<SqliteTaskRepository<'_>, SqliteItemRepository<'_>>, RepoError> {
    Ok(TaskService::new(
        SqliteTaskRepository::try_new(conn)?,
        SqliteItemRepository::try_new(conn)?,
    ))
}

#[cfg(test)]
mod tests {
    use super::{
        auth_login, auth_sign_up, configure_db_path, core_version, init_logging, item_create,
        item_delete, items_list, parse_due_date, ping, seed_demo_data, task_add_progress,
        task_create, task_get, task_progress, task_progress_history, task_set_status,
        task_update, tasks_list, update_request, users_list, ProgressInput, TaskItemInput,
        TaskUpdateInput, DB_PATH,
    };
    use serde_json::Value;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn use_test_db() {
        let path = DB_PATH.get_or_init(|| {
            std::env::temp_dir().join(format!(
                "taskledger-ffi-test-{}-{}.sqlite3",
                std::process::id(),
                unique_token("db")
            ))
        });
        assert_eq!(configure_db_path(path.display().to_string()), "");
    }

    fn unique_token(prefix: &str) -> String {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("time went backwards")
            .as_nanos();
        format!("{prefix}-{nanos}")
    }

    fn payload(response: &super::ApiResponse) -> Value {
        serde_json::from_str(response.payload_json.as_deref().expect("payload")).unwrap()
    }

    #[test]
    fn ping_and_version() {
        assert_eq!(ping(), "pong");
        assert!(!core_version().is_empty());
    }

    #[test]
    fn init_logging_rejects_bad_input() {
        assert!(!init_logging("info".to_string(), String::new()).is_empty());
        assert!(!init_logging("verbose".to_string(), "/tmp/logs".to_string()).is_empty());
    }

    #[test]
    fn configure_db_path_rejects_switching() {
        use_test_db();
        assert!(!configure_db_path("/elsewhere/other.sqlite3".to_string()).is_empty());
        assert!(!configure_db_path("  ".to_string()).is_empty());
    }

    #[test]
    fn sign_up_and_login_hide_password_hash() {
        use_test_db();
        let email = format!("{}@company.com", unique_token("member"));

        let created = auth_sign_up(email.clone(), "s3cret".to_string(), None);
        assert!(created.ok, "{}", created.message);
        let body = payload(&created);
        assert_eq!(body["role"], "team");
        assert!(body.get("password_hash").is_none());

        let duplicate = auth_sign_up(email.clone(), "s3cret".to_string(), None);
        assert_eq!(duplicate.error_code.as_deref(), Some("duplicate"));

        let login = auth_login(email.clone(), "s3cret".to_string());
        assert!(login.ok, "{}", login.message);
        let rejected = auth_login(email, "wrong".to_string());
        assert_eq!(rejected.error_code.as_deref(), Some("invalid_credentials"));

        let bad_role = auth_sign_up(
            "x@company.com".to_string(),
            "pw".to_string(),
            Some("owner".to_string()),
        );
        assert_eq!(bad_role.error_code.as_deref(), Some("invalid_input"));
    }

    #[test]
    fn demo_seed_and_catalog_are_available() {
        use_test_db();
        let first = seed_demo_data();
        assert!(first.ok, "{}", first.message);
        if payload(&first) == 2 {
            let login = auth_login("admin@company.com".to_string(), "password".to_string());
            assert!(login.ok, "{}", login.message);
        }
        assert_eq!(payload(&seed_demo_data()), 0);
        assert!(!payload(&users_list()).as_array().unwrap().is_empty());

        let items = items_list();
        assert!(items.ok, "{}", items.message);
        assert!(!payload(&items).as_array().unwrap().is_empty());
    }

    #[test]
    fn task_flow_records_progress() {
        use_test_db();
        let created_item = item_create(unique_token("Widgets"), String::new());
        assert!(created_item.ok, "{}", created_item.message);
        let item_id = payload(&created_item)["id"].as_i64().unwrap();

        let task = task_create(
            unique_token("task"),
            None,
            "High".to_string(),
            None,
            1,
            Some("2026-12-01".to_string()),
            vec![TaskItemInput {
                item_id,
                quantity: 10,
            }],
        );
        assert!(task.ok, "{}", task.message);
        let task_id = payload(&task)["id"].as_i64().unwrap();

        let first = task_add_progress(
            task_id,
            vec![ProgressInput {
                item_id,
                quantity_added: 4,
            }],
            1,
        );
        assert!(first.ok, "{}", first.message);
        let second = task_add_progress(
            task_id,
            vec![ProgressInput {
                item_id,
                quantity_added: 8,
            }],
            1,
        );
        assert_eq!(payload(&second)["item_updates"][0]["new_total"], 10);

        let history = task_progress_history(Some(task_id));
        assert_eq!(payload(&history).as_array().unwrap().len(), 2);

        let listed = tasks_list();
        let tasks = payload(&listed);
        let stored = tasks
            .as_array()
            .unwrap()
            .iter()
            .find(|task| task["id"] == task_id)
            .unwrap();
        assert_eq!(stored["status"], "completed");

        let summary = task_progress(task_id);
        assert_eq!(payload(&summary)["items_completed"], 1);

        let edited = task_update(
            task_id,
            TaskUpdateInput {
                title: Some("Restock".to_string()),
                priority: Some("low".to_string()),
                items: Some(vec![TaskItemInput {
                    item_id,
                    quantity: 20,
                }]),
                ..TaskUpdateInput::default()
            },
        );
        assert!(edited.ok, "{}", edited.message);
        let fetched = payload(&task_get(task_id));
        assert_eq!(fetched["title"], "Restock");
        assert_eq!(fetched["priority"], "low");
        assert_eq!(fetched["items"][0]["completed_quantity"], 10);
        assert_eq!(fetched["status"], "in-progress");

        assert!(item_delete(item_id).ok);
        assert!(task_set_status(task_id, "cancelled".to_string()).ok);
        assert_eq!(task_get(987_654_321).error_code.as_deref(), Some("not_found"));
    }

    #[test]
    fn task_update_input_is_validated() {
        let bad = update_request(TaskUpdateInput {
            status: Some("done".to_string()),
            ..TaskUpdateInput::default()
        });
        assert!(bad.is_err());

        let cleared = update_request(TaskUpdateInput {
            assigned_to: Some(3),
            clear_assigned_to: true,
            due_date: Some("2026-01-02".to_string()),
            ..TaskUpdateInput::default()
        })
        .unwrap();
        assert_eq!(cleared.assigned_to, Some(None));
        assert!(matches!(cleared.due_date, Some(Some(_))));

        let response = task_update(
            1,
            TaskUpdateInput {
                priority: Some("urgent".to_string()),
                ..TaskUpdateInput::default()
            },
        );
        assert_eq!(response.error_code.as_deref(), Some("invalid_input"));
    }

    #[test]
    fn task_inputs_are_validated() {
        use_test_db();
        let bad_priority = task_create(
            "x".to_string(),
            None,
            "urgent".to_string(),
            None,
            1,
            None,
            Vec::new(),
        );
        assert_eq!(bad_priority.error_code.as_deref(), Some("invalid_input"));

        let missing = task_set_status(987_654_321, "completed".to_string());
        assert_eq!(missing.error_code.as_deref(), Some("not_found"));
        let bad_status = task_set_status(1, "done".to_string());
        assert_eq!(bad_status.error_code.as_deref(), Some("invalid_input"));

        assert!(parse_due_date(Some("31/12/2026")).is_err());
        assert_eq!(parse_due_date(Some(" ")).unwrap(), None);
    }
}
