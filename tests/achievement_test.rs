mod common;

use repquest::models::AchievementKind;

#[tokio::test]
async fn test_exercise_weight_accumulates_across_workouts() {
    let env = common::test_env();
    let user = common::create_test_user(&env, "alice").await;
    let bench = common::equipment_exercise(&env, "bench press").await;
    common::create_achievement(
        &env,
        "bench ton",
        AchievementKind::ExerciseWeight,
        10_000.0,
        0.0,
        Some(&bench.id),
        100,
    )
    .await;

    let first = common::planned_workout(&env, &user.id, "day one", common::today()).await;
    common::add_sets(&env, &first.id, &bench.id, &[(4, 50.0), (4, 50.0), (4, 50.0)]).await;
    common::complete_workout(&env, &user.id, &first.id).await;

    let progress = env.achievements.progress_for_user(&user.id).await.unwrap();
    assert_eq!(progress.len(), 1);
    assert_eq!(progress[0].current_value, 600.0);
    assert!(!progress[0].achieved);

    common::rewrite_workout_date(&env.pool, &first.id, common::days_ago(1));
    let second = common::planned_workout(&env, &user.id, "day two", common::today()).await;
    common::add_sets(&env, &second.id, &bench.id, &[(4, 100.0)]).await;
    common::complete_workout(&env, &user.id, &second.id).await;

    let progress = env.achievements.progress_for_user(&user.id).await.unwrap();
    assert_eq!(progress[0].current_value, 1_000.0);
}

#[tokio::test]
async fn test_achieving_clamps_at_target_and_grants_reward() {
    let env = common::test_env();
    let user = common::create_test_user(&env, "alice").await;
    let bench = common::equipment_exercise(&env, "bench press").await;
    common::create_achievement(
        &env,
        "big session",
        AchievementKind::WorkoutWeight,
        500.0,
        0.0,
        None,
        50,
    )
    .await;

    let workout = common::planned_workout(&env, &user.id, "push day", common::today()).await;
    // 600 session weight overshoots the 500 target
    common::add_sets(&env, &workout.id, &bench.id, &[(4, 50.0), (4, 50.0), (4, 50.0)]).await;
    let summary = common::complete_workout(&env, &user.id, &workout.id).await;

    assert_eq!(summary.achievements.len(), 1);
    assert_eq!(summary.achievements[0].current_value, 500.0);
    assert!(summary.achievements[0].achieved);

    // Workout XP (600 raw / 50 = 12) plus the 50 XP reward
    let reloaded = env.users.find_by_id(&user.id).await.unwrap().unwrap();
    assert_eq!(reloaded.exp, 62);

    // Both grants landed in the ledger against this workout
    let history = env.experience.history_for_workout(&workout.id).await.unwrap();
    assert_eq!(history.len(), 2);
}

#[tokio::test]
async fn test_achieved_rows_are_immutable_and_reward_only_once() {
    let env = common::test_env();
    let user = common::create_test_user(&env, "alice").await;
    let bench = common::equipment_exercise(&env, "bench press").await;
    common::create_achievement(
        &env,
        "first workout",
        AchievementKind::WorkoutCount,
        1.0,
        0.0,
        None,
        25,
    )
    .await;

    let first = common::planned_workout(&env, &user.id, "day one", common::today()).await;
    common::add_sets(&env, &first.id, &bench.id, &[(10, 50.0)]).await;
    let summary = common::complete_workout(&env, &user.id, &first.id).await;
    assert!(summary.achievements[0].achieved);

    common::rewrite_workout_date(&env.pool, &first.id, common::days_ago(1));
    let second = common::planned_workout(&env, &user.id, "day two", common::today()).await;
    common::add_sets(&env, &second.id, &bench.id, &[(10, 50.0)]).await;
    let summary = common::complete_workout(&env, &user.id, &second.id).await;

    // No re-trigger: the achieved row is untouched and no update is emitted
    assert!(summary.achievements.is_empty());
    let progress = env.achievements.progress_for_user(&user.id).await.unwrap();
    assert_eq!(progress[0].current_value, 1.0);
    assert!(progress[0].achieved);

    // 10 + 25 reward + 10, nothing more
    let reloaded = env.users.find_by_id(&user.id).await.unwrap().unwrap();
    assert_eq!(reloaded.exp, 45);
}

#[tokio::test]
async fn test_personal_best_progress_tracks_heaviest_set() {
    let env = common::test_env();
    let user = common::create_test_user(&env, "alice").await;
    let bench = common::equipment_exercise(&env, "bench press").await;
    common::create_achievement(
        &env,
        "two plates",
        AchievementKind::ExercisePb,
        200.0,
        0.0,
        Some(&bench.id),
        0,
    )
    .await;

    let workout = common::planned_workout(&env, &user.id, "heavy day", common::today()).await;
    common::add_sets(&env, &workout.id, &bench.id, &[(5, 100.0), (1, 120.0)]).await;
    let summary = common::complete_workout(&env, &user.id, &workout.id).await;

    assert_eq!(summary.achievements[0].current_value, 120.0);
    assert!(!summary.achievements[0].achieved);
}

#[tokio::test]
async fn test_progress_below_minimum_is_not_recorded() {
    let env = common::test_env();
    let user = common::create_test_user(&env, "alice").await;
    let bench = common::equipment_exercise(&env, "bench press").await;
    common::create_achievement(
        &env,
        "million club",
        AchievementKind::TotalWeight,
        1_000_000.0,
        1_000.0,
        None,
        500,
    )
    .await;

    let workout = common::planned_workout(&env, &user.id, "push day", common::today()).await;
    common::add_sets(&env, &workout.id, &bench.id, &[(4, 50.0)]).await;
    let summary = common::complete_workout(&env, &user.id, &workout.id).await;

    // 200 <= 1000 minimum: nothing recorded yet
    assert!(summary.achievements.is_empty());
    assert!(env
        .achievements
        .progress_for_user(&user.id)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_achievements_for_unrelated_exercises_are_ignored() {
    let env = common::test_env();
    let user = common::create_test_user(&env, "alice").await;
    let bench = common::equipment_exercise(&env, "bench press").await;
    let squat = common::equipment_exercise(&env, "back squat").await;
    common::create_achievement(
        &env,
        "squat volume",
        AchievementKind::ExerciseWeight,
        10_000.0,
        0.0,
        Some(&squat.id),
        0,
    )
    .await;

    let workout = common::planned_workout(&env, &user.id, "push day", common::today()).await;
    common::add_sets(&env, &workout.id, &bench.id, &[(10, 50.0)]).await;
    let summary = common::complete_workout(&env, &user.id, &workout.id).await;

    assert!(summary.achievements.is_empty());
}

#[tokio::test]
async fn test_unlock_dispatches_notification() {
    let (env, recorder) = common::recording_test_env();
    let user = common::create_test_user(&env, "alice").await;
    let bench = common::equipment_exercise(&env, "bench press").await;
    common::create_achievement(
        &env,
        "first workout",
        AchievementKind::WorkoutCount,
        1.0,
        0.0,
        None,
        25,
    )
    .await;

    let workout = common::planned_workout(&env, &user.id, "push day", common::today()).await;
    common::add_sets(&env, &workout.id, &bench.id, &[(10, 50.0)]).await;
    common::complete_workout(&env, &user.id, &workout.id).await;

    let events = recorder.events.lock().unwrap();
    assert!(events.iter().any(|(uid, event)| {
        uid == &user.id
            && matches!(
                event,
                repquest::notify::NotificationEvent::AchievementUnlocked { name, .. } if name == "first workout"
            )
    }));
}
