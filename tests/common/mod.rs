#![allow(dead_code)] // Each test binary uses a subset of these helpers

use std::sync::Arc;

use axum::Router;
use chrono::{Duration, NaiveDate, Utc};

use repquest::config::ProgressionConfig;
use repquest::db::{create_memory_pool, DbPool};
use repquest::lifecycle::WorkoutLifecycle;
use repquest::migrations::run_migrations_for_tests;
use repquest::models::{Achievement, AchievementKind, Exercise, ExerciseKind, User, Workout};
use repquest::notify::{LogNotifier, NotificationEvent, Notifier, SharedNotifier};
use repquest::progression::{GrantCalculator, LevelCurve};
use repquest::repositories::{
    AchievementRepository, ExerciseRepository, ExperienceRepository, UserRepository,
    WorkoutRepository,
};

pub fn setup_test_db() -> DbPool {
    let pool = create_memory_pool().expect("Failed to create test database");
    run_migrations_for_tests(&pool).expect("Failed to run migrations");
    pool
}

pub struct TestEnv {
    pub pool: DbPool,
    pub users: UserRepository,
    pub exercises: ExerciseRepository,
    pub workouts: WorkoutRepository,
    pub achievements: AchievementRepository,
    pub experience: ExperienceRepository,
    pub lifecycle: WorkoutLifecycle,
}

/// Captures dispatched notifications for assertions.
#[derive(Default)]
pub struct RecordingNotifier {
    pub events: std::sync::Mutex<Vec<(String, NotificationEvent)>>,
}

impl Notifier for RecordingNotifier {
    fn notify(&self, user_id: &str, event: NotificationEvent) {
        self.events
            .lock()
            .unwrap()
            .push((user_id.to_string(), event));
    }
}

pub fn test_env() -> TestEnv {
    let pool = setup_test_db();
    test_env_with_pool(pool)
}

pub fn test_env_with_pool(pool: DbPool) -> TestEnv {
    test_env_with_notifier(pool, Arc::new(LogNotifier)).0
}

/// Environment wired to a recording notifier, for notification assertions.
pub fn recording_test_env() -> (TestEnv, Arc<RecordingNotifier>) {
    let recorder = Arc::new(RecordingNotifier::default());
    let (env, _) = test_env_with_notifier(setup_test_db(), recorder.clone());
    (env, recorder)
}

pub fn test_env_with_notifier(
    pool: DbPool,
    notifier: Arc<impl Notifier + 'static>,
) -> (TestEnv, SharedNotifier) {
    let users = UserRepository::new(pool.clone());
    let exercises = ExerciseRepository::new(pool.clone());
    let workouts = WorkoutRepository::new(pool.clone());
    let achievements = AchievementRepository::new(pool.clone());
    let experience = ExperienceRepository::new(pool.clone());

    let config = ProgressionConfig::default();
    let notifier: SharedNotifier = notifier;
    let grants = GrantCalculator::new(
        users.clone(),
        experience.clone(),
        config,
        notifier.clone(),
    );
    let lifecycle = WorkoutLifecycle::new(
        workouts.clone(),
        achievements.clone(),
        grants,
        notifier.clone(),
        chrono::FixedOffset::east_opt(0).unwrap(),
        config.stale_after_hours,
    );

    let env = TestEnv {
        pool,
        users,
        exercises,
        workouts,
        achievements,
        experience,
        lifecycle,
    };
    (env, notifier)
}

pub fn create_test_app(pool: DbPool) -> Router {
    use repquest::handlers::{achievements, exercises, progression, workouts};

    let env = test_env_with_pool(pool);
    let workouts_state = workouts::WorkoutsState {
        workout_repo: env.workouts.clone(),
        exercise_repo: env.exercises.clone(),
        lifecycle: env.lifecycle.clone(),
    };
    let exercises_state = exercises::ExercisesState {
        exercise_repo: env.exercises.clone(),
    };
    let progression_state = progression::ProgressionState {
        user_repo: env.users.clone(),
        experience_repo: env.experience.clone(),
        curve: LevelCurve::default(),
    };
    let achievements_state = achievements::AchievementsState {
        achievement_repo: env.achievements.clone(),
    };

    repquest::routes::create_router(
        workouts_state,
        exercises_state,
        progression_state,
        achievements_state,
    )
}

pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

pub fn days_ago(days: i64) -> NaiveDate {
    today() - Duration::days(days)
}

pub async fn create_test_user(env: &TestEnv, username: &str) -> User {
    env.users.create(username).await.unwrap()
}

/// A barbell exercise: scored with the recorded set weight.
pub async fn equipment_exercise(env: &TestEnv, name: &str) -> Exercise {
    let barbell = env
        .exercises
        .create_equipment(&format!("{name} barbell"))
        .await
        .unwrap();
    env.exercises
        .create(name, ExerciseKind::Standard, None, &[barbell.id], &[])
        .await
        .unwrap()
}

/// An equipment-free exercise: scored with the performer's bodyweight.
pub async fn bodyweight_exercise(env: &TestEnv, name: &str) -> Exercise {
    env.exercises
        .create(name, ExerciseKind::Standard, None, &[], &[])
        .await
        .unwrap()
}

pub async fn custom_exercise(env: &TestEnv, name: &str, user_id: &str) -> Exercise {
    env.exercises
        .create(name, ExerciseKind::Custom, Some(user_id), &[], &[])
        .await
        .unwrap()
}

pub async fn planned_workout(
    env: &TestEnv,
    user_id: &str,
    name: &str,
    date: NaiveDate,
) -> Workout {
    env.workouts
        .create(user_id, name, date, None, None)
        .await
        .unwrap()
}

/// Record sets of (reps, weight) for one exercise slot of the workout.
pub async fn add_sets(env: &TestEnv, workout_id: &str, exercise_id: &str, sets: &[(i32, f64)]) {
    let entry = env
        .workouts
        .add_exercise(workout_id, exercise_id)
        .await
        .unwrap();
    for (reps, weight) in sets {
        env.workouts
            .add_set(&entry.id, *reps, *weight)
            .await
            .unwrap();
    }
}

pub async fn create_achievement(
    env: &TestEnv,
    name: &str,
    kind: AchievementKind,
    target: f64,
    min: f64,
    exercise_id: Option<&str>,
    xp_reward: i64,
) -> Achievement {
    env.achievements
        .create(name, kind, target, min, exercise_id, xp_reward)
        .await
        .unwrap()
}

/// Test fixture escape hatch: move a workout to another calendar day.
pub fn rewrite_workout_date(pool: &DbPool, workout_id: &str, date: NaiveDate) {
    let conn = pool.get().unwrap();
    conn.execute(
        "UPDATE workouts SET date = ? WHERE id = ?",
        rusqlite::params![date, workout_id],
    )
    .unwrap();
}

/// Test fixture escape hatch: pretend the workout was started hours ago.
pub fn backdate_started_at(pool: &DbPool, workout_id: &str, hours_ago: i64) {
    let started = Utc::now() - Duration::hours(hours_ago);
    let conn = pool.get().unwrap();
    conn.execute(
        "UPDATE workouts SET started_at = ? WHERE id = ?",
        rusqlite::params![started, workout_id],
    )
    .unwrap();
}

/// Start and finish a workout scheduled today, returning the summary.
pub async fn complete_workout(
    env: &TestEnv,
    user_id: &str,
    workout_id: &str,
) -> repquest::lifecycle::FinishSummary {
    env.lifecycle.start(user_id, workout_id).await.unwrap();
    env.lifecycle.finish(user_id, workout_id).await.unwrap()
}
