use crate::edit::validate_update;
use crate::errors::AppError;
use crate::life::{DEFAULT_LIFESPAN_YEARS, LifeProgress};
use crate::models::{
    ArchiveRequest, ChatMessage, ChatQuery, DayRecord, DeleteHabitResponse, Habit, HabitId,
    HabitUpdate, LifeQuery, MonthOverview, MonthQuery, NewHabitRequest, NewMessageRequest,
    NewTaskRequest, PageQuery, RecordKey, Task, TaskQuery, ThemeRequest, UpsertRecordRequest,
    UserQuery, YearMonth,
};
use crate::state::AppState;
use crate::stats::{build_month_overview, current_month, days_in_month};
use crate::storage::parse_date;
use crate::theme::{ThemeKey, ThemeSettings};
use crate::ui::render_month_page;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::Html,
};
use chrono::Local;
use tracing::{debug, info};

pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Html<String>, AppError> {
    let (current_year, current_month) = current_month();
    let user_id = query.user_id.unwrap_or(1);
    let year = query.year.unwrap_or(current_year);
    let month = query.month.unwrap_or(current_month);

    let data = state.data.lock().await;
    let overview = overview_or_reject(
        build_month_overview(&data, user_id, year, month),
        year,
        month,
    )?;
    let theme = ThemeSettings::load(&*data, user_id);
    Ok(Html(render_month_page(user_id, &overview, &theme)))
}

pub async fn list_habits(
    State(state): State<AppState>,
    Query(query): Query<UserQuery>,
) -> Json<Vec<Habit>> {
    let data = state.data.lock().await;
    Json(data.habits_for(query.user_id))
}

pub async fn create_habit(
    State(state): State<AppState>,
    Json(payload): Json<NewHabitRequest>,
) -> Result<(StatusCode, Json<Habit>), AppError> {
    let habit = state.mutate(|data| data.create_habit(payload)).await?;
    Ok((StatusCode::CREATED, Json(habit)))
}

pub async fn update_habit(
    State(state): State<AppState>,
    Path(habit_id): Path<HabitId>,
    Query(query): Query<UserQuery>,
    Json(payload): Json<HabitUpdate>,
) -> Result<Json<Habit>, AppError> {
    let update = validate_update(&payload)?;
    let habit = state
        .mutate(|data| data.update_habit(query.user_id, habit_id, &update))
        .await?;
    info!(habit_id, user_id = query.user_id, "habit updated");
    Ok(Json(habit))
}

pub async fn delete_habit(
    State(state): State<AppState>,
    Path(habit_id): Path<HabitId>,
    Query(query): Query<UserQuery>,
) -> Result<Json<DeleteHabitResponse>, AppError> {
    let records_removed = state
        .mutate(|data| data.delete_habit(query.user_id, habit_id))
        .await?;
    info!(habit_id, records_removed, "habit deleted");
    Ok(Json(DeleteHabitResponse {
        habit_id,
        records_removed,
    }))
}

pub async fn archive_habit(
    State(state): State<AppState>,
    Path(habit_id): Path<HabitId>,
    Json(payload): Json<ArchiveRequest>,
) -> Result<Json<Habit>, AppError> {
    check_month(payload.year, payload.month)?;
    let month = YearMonth {
        year: payload.year,
        month: payload.month,
    };
    let habit = state
        .mutate(|data| data.set_archived(payload.user_id, habit_id, month, payload.archived))
        .await?;
    Ok(Json(habit))
}

pub async fn list_records(
    State(state): State<AppState>,
    Query(query): Query<MonthQuery>,
) -> Result<Json<Vec<DayRecord>>, AppError> {
    check_month(query.year, query.month)?;
    let data = state.data.lock().await;
    Ok(Json(data.records_for(query.user_id, query.year, query.month)))
}

pub async fn upsert_record(
    State(state): State<AppState>,
    Json(payload): Json<UpsertRecordRequest>,
) -> Result<StatusCode, AppError> {
    let key = payload.key();
    let value = payload.value.normalized();
    state.mutate(|data| data.upsert_record(key, value)).await?;
    debug!(?key, value, "record written");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_record(
    State(state): State<AppState>,
    Query(key): Query<RecordKey>,
) -> Result<StatusCode, AppError> {
    let removed = state.mutate(|data| data.delete_record(key)).await?;
    debug!(?key, removed, "record deleted");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn month_stats(
    State(state): State<AppState>,
    Query(query): Query<MonthQuery>,
) -> Result<Json<MonthOverview>, AppError> {
    let data = state.data.lock().await;
    let overview = overview_or_reject(
        build_month_overview(&data, query.user_id, query.year, query.month),
        query.year,
        query.month,
    )?;
    Ok(Json(overview))
}

pub async fn get_theme(
    State(state): State<AppState>,
    Query(query): Query<UserQuery>,
) -> Json<ThemeSettings> {
    let data = state.data.lock().await;
    Json(ThemeSettings::load(&*data, query.user_id))
}

pub async fn put_theme(
    State(state): State<AppState>,
    Json(payload): Json<ThemeRequest>,
) -> Result<Json<ThemeSettings>, AppError> {
    let settings = ThemeSettings::new(ThemeKey::parse(&payload.theme)?);
    state
        .mutate(|data| {
            settings.save(data, payload.user_id);
            Ok::<_, AppError>(())
        })
        .await?;
    Ok(Json(settings))
}

pub async fn list_tasks(
    State(state): State<AppState>,
    Query(query): Query<TaskQuery>,
) -> Result<Json<Vec<Task>>, AppError> {
    let date = parse_date(&query.date)?;
    let data = state.data.lock().await;
    Ok(Json(data.tasks_for(query.user_id, date)))
}

pub async fn create_task(
    State(state): State<AppState>,
    Json(payload): Json<NewTaskRequest>,
) -> Result<(StatusCode, Json<Task>), AppError> {
    let date = parse_date(&payload.date)?;
    let task = state
        .mutate(|data| data.create_task(payload.user_id, date, &payload.title))
        .await?;
    Ok((StatusCode::CREATED, Json(task)))
}

pub async fn toggle_task(
    State(state): State<AppState>,
    Path(task_id): Path<u64>,
    Query(query): Query<UserQuery>,
) -> Result<Json<Task>, AppError> {
    let task = state
        .mutate(|data| data.toggle_task(query.user_id, task_id))
        .await?;
    Ok(Json(task))
}

pub async fn delete_task(
    State(state): State<AppState>,
    Path(task_id): Path<u64>,
    Query(query): Query<UserQuery>,
) -> Result<StatusCode, AppError> {
    state
        .mutate(|data| data.delete_task(query.user_id, task_id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn life_progress(Query(query): Query<LifeQuery>) -> Result<Json<LifeProgress>, AppError> {
    let birth = parse_date(&query.birth_date)?;
    let years = query.years.unwrap_or(DEFAULT_LIFESPAN_YEARS);
    let progress = LifeProgress::compute(birth, Local::now().date_naive(), years)?;
    Ok(Json(progress))
}

pub async fn list_messages(
    State(state): State<AppState>,
    Query(query): Query<ChatQuery>,
) -> Json<Vec<ChatMessage>> {
    let data = state.data.lock().await;
    Json(data.messages_after(query.after))
}

pub async fn post_message(
    State(state): State<AppState>,
    Json(payload): Json<NewMessageRequest>,
) -> Result<(StatusCode, Json<ChatMessage>), AppError> {
    let sent_at = Local::now().to_rfc3339();
    let message = state
        .mutate(|data| data.post_message(payload.user_id, &payload.text, sent_at))
        .await?;
    Ok((StatusCode::CREATED, Json(message)))
}

fn check_month(year: i32, month: u32) -> Result<u32, AppError> {
    days_in_month(year, month)
        .ok_or_else(|| AppError::bad_request(format!("invalid month {year}-{month:02}")))
}

fn overview_or_reject(
    overview: Option<MonthOverview>,
    year: i32,
    month: u32,
) -> Result<MonthOverview, AppError> {
    overview.ok_or_else(|| AppError::bad_request(format!("invalid month {year}-{month:02}")))
}
