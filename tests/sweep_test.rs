mod common;

use repquest::models::WorkoutStatus;

#[tokio::test]
async fn test_skip_sweep_closes_elapsed_planned_workouts() {
    let env = common::test_env();
    let user = common::create_test_user(&env, "alice").await;
    let old = common::planned_workout(&env, &user.id, "missed day", common::days_ago(2)).await;
    let current = common::planned_workout(&env, &user.id, "today", common::today()).await;

    let skipped = env.lifecycle.skip_elapsed().await.unwrap();
    assert_eq!(skipped, 1);

    let old = env.workouts.find_by_id(&old.id).await.unwrap().unwrap();
    assert_eq!(old.status, WorkoutStatus::Skipped);

    // Today's workout is untouched
    let current = env.workouts.find_by_id(&current.id).await.unwrap().unwrap();
    assert_eq!(current.status, WorkoutStatus::Planned);
}

#[tokio::test]
async fn test_skip_sweep_is_idempotent() {
    let env = common::test_env();
    let user = common::create_test_user(&env, "alice").await;
    common::planned_workout(&env, &user.id, "missed day", common::days_ago(1)).await;

    assert_eq!(env.lifecycle.skip_elapsed().await.unwrap(), 1);
    assert_eq!(env.lifecycle.skip_elapsed().await.unwrap(), 0);
}

#[tokio::test]
async fn test_skip_sweep_ignores_started_workouts() {
    let env = common::test_env();
    let user = common::create_test_user(&env, "alice").await;
    let workout = common::planned_workout(&env, &user.id, "push day", common::today()).await;
    env.lifecycle.start(&user.id, &workout.id).await.unwrap();

    assert_eq!(env.lifecycle.skip_elapsed().await.unwrap(), 0);
    let workout = env.workouts.find_by_id(&workout.id).await.unwrap().unwrap();
    assert_eq!(workout.status, WorkoutStatus::InProgress);
}

#[tokio::test]
async fn test_stale_sweep_force_finishes_and_grants() {
    let env = common::test_env();
    let user = common::create_test_user(&env, "alice").await;
    let bench = common::equipment_exercise(&env, "bench press").await;
    let workout = common::planned_workout(&env, &user.id, "push day", common::today()).await;
    common::add_sets(&env, &workout.id, &bench.id, &[(10, 50.0)]).await;

    env.lifecycle.start(&user.id, &workout.id).await.unwrap();
    common::backdate_started_at(&env.pool, &workout.id, 3);

    let finished = env.lifecycle.finish_stale().await.unwrap();
    assert_eq!(finished, 1);

    let workout = env.workouts.find_by_id(&workout.id).await.unwrap().unwrap();
    assert_eq!(workout.status, WorkoutStatus::Completed);
    assert!(workout.finished_at.is_some());

    // Settlement ran: the grant is in the ledger and on the user
    let history = env.experience.history_for_workout(&workout.id).await.unwrap();
    assert_eq!(history.len(), 1);
    let user = env.users.find_by_id(&user.id).await.unwrap().unwrap();
    assert_eq!(user.exp, 10);
}

#[tokio::test]
async fn test_stale_sweep_leaves_fresh_sessions_alone() {
    let env = common::test_env();
    let user = common::create_test_user(&env, "alice").await;
    let workout = common::planned_workout(&env, &user.id, "push day", common::today()).await;
    env.lifecycle.start(&user.id, &workout.id).await.unwrap();
    common::backdate_started_at(&env.pool, &workout.id, 1);

    assert_eq!(env.lifecycle.finish_stale().await.unwrap(), 0);
    let workout = env.workouts.find_by_id(&workout.id).await.unwrap().unwrap();
    assert_eq!(workout.status, WorkoutStatus::InProgress);
}

#[tokio::test]
async fn test_stale_sweep_is_idempotent() {
    let env = common::test_env();
    let user = common::create_test_user(&env, "alice").await;
    let workout = common::planned_workout(&env, &user.id, "push day", common::today()).await;
    env.lifecycle.start(&user.id, &workout.id).await.unwrap();
    common::backdate_started_at(&env.pool, &workout.id, 3);

    assert_eq!(env.lifecycle.finish_stale().await.unwrap(), 1);
    assert_eq!(env.lifecycle.finish_stale().await.unwrap(), 0);

    // Still exactly one ledger row
    let history = env.experience.history_for_workout(&workout.id).await.unwrap();
    assert_eq!(history.len(), 1);
}
