mod common;

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use fixtura_core::{Depth, Overrides};
use fixtura_factory::{Batch, Factory, FactoryConfig, FactoryError};

use common::{Note, User, Widget, dream, factory, make_user, name};

#[tokio::test]
async fn builds_default_instance() {
    let factory = factory();
    let user = factory
        .build::<User>("User", Overrides::new())
        .await
        .expect("user");

    assert_eq!(user.depth(), Depth::Value);
    assert_eq!(user.name, "name");
    assert_eq!(user.dream.as_ref().map(|d| d.title.as_str()), Some("My Dream"));
}

#[tokio::test]
async fn applies_overrides_to_default_instance() {
    let factory = factory();
    let overrides = name("New Name")
        .try_set("dream", &dream("Conquer the world"))
        .expect("serializable");
    let user = factory
        .build::<User>("User", overrides)
        .await
        .expect("user");

    assert_eq!(user.name, "New Name");
    assert_eq!(
        user.dream.as_ref().map(|d| d.title.as_str()),
        Some("Conquer the world")
    );
}

#[tokio::test]
async fn reference_blueprint_yields_reference() {
    let factory = factory();
    let user = factory
        .build::<User>("Pointer User", name("New Name"))
        .await
        .expect("user");

    assert_eq!(user.depth(), Depth::Ref);
    assert!(user.shared().is_some());
    assert_eq!(user.name, "New Name");
}

#[tokio::test]
async fn marker_adds_one_level_of_indirection() {
    let factory = factory();

    let user = factory
        .build::<User>("*User", name("New Name"))
        .await
        .expect("user");
    assert_eq!(user.depth(), Depth::Ref);
    assert_eq!(user.name, "New Name");

    let user = factory
        .build::<User>("*Pointer User", name("Twice"))
        .await
        .expect("user");
    assert_eq!(user.depth(), Depth::RefRef);
    let nested = user.shared_twice().expect("reference to reference");
    assert_eq!(nested.name, "Twice");

    // Marked and unmarked requests share one ledger entry.
    assert_eq!(factory.tracked_count("User"), 1);
    assert_eq!(factory.tracked_count("Pointer User"), 1);
}

#[tokio::test]
async fn rejects_a_third_level_of_indirection() {
    let factory = factory();
    let result = factory
        .generate::<User>("**Pointer User", Vec::new())
        .await;
    assert!(matches!(result, Err(FactoryError::UnsupportedDepth { .. })));
    assert_eq!(factory.tracked_count("Pointer User"), 0);
}

#[tokio::test]
async fn widget_scenario_returns_instances_in_override_order() {
    let factory = factory();
    let batch = factory
        .generate::<Widget>(
            "Widget",
            vec![Overrides::new().set("color", "blue"), Overrides::new()],
        )
        .await
        .expect("widgets");

    let widgets = match batch {
        Batch::Many(widgets) => widgets,
        other => panic!("expected two widgets, got {} instance(s)", other.len()),
    };
    assert_eq!(widgets.len(), 2);
    assert_eq!(widgets[0].color, "blue");
    assert_eq!(widgets[1].color, "red");
    assert_ne!(widgets[0].id, widgets[1].id);

    let tracked: HashSet<_> = factory
        .tracked::<Widget>("Widget")
        .iter()
        .map(|widget| widget.id)
        .collect();
    let generated: HashSet<_> = widgets.iter().map(|widget| widget.id).collect();
    assert_eq!(tracked, generated);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn keeps_input_order_when_tasks_finish_out_of_order() {
    let factory = Factory::new(FactoryConfig::default());
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    factory.register("Slow User", move || {
        let call = counter.fetch_add(1, Ordering::SeqCst);
        std::thread::sleep(Duration::from_millis(((call * 7) % 5) as u64 * 3));
        make_user()
    });

    let lessons: Vec<Overrides> = (0..32).map(|i| name(&format!("user-{i}"))).collect();
    let users = factory
        .generate::<User>("Slow User", lessons)
        .await
        .expect("users")
        .into_vec();

    assert_eq!(users.len(), 32);
    for (i, user) in users.iter().enumerate() {
        assert_eq!(user.name, format!("user-{i}"));
    }
    // One default up front, then one per task after the first.
    assert_eq!(calls.load(Ordering::SeqCst), 32);
}

#[tokio::test]
async fn no_override_sets_means_one_instance() {
    let factory = factory();
    let batch = factory
        .generate::<User>("User", Vec::new())
        .await
        .expect("user");
    assert!(matches!(batch, Batch::One(_)));
    assert_eq!(factory.tracked_count("User"), 1);
}

#[tokio::test]
async fn overrides_sequences_and_arrays_per_instance() {
    let factory = factory();
    let users = factory
        .generate::<User>(
            "*Pointer User",
            vec![
                Overrides::new()
                    .try_set("visited_places", &["New York City"])
                    .expect("serializable"),
                Overrides::new()
                    .try_set("great_ideas", &["1", "2", "3"])
                    .expect("serializable"),
            ],
        )
        .await
        .expect("users")
        .into_vec();

    let defaults = make_user();
    assert_eq!(users[0].depth(), Depth::RefRef);
    assert_eq!(users[0].visited_places, vec!["New York City".to_string()]);
    assert_eq!(users[0].great_ideas, defaults.great_ideas);
    assert_eq!(users[1].visited_places, defaults.visited_places);
    assert_eq!(
        users[1].great_ideas,
        ["1".to_string(), "2".to_string(), "3".to_string()]
    );
}

#[tokio::test]
async fn tracks_every_generated_instance() {
    let factory = factory();
    factory
        .generate::<User>("User", Vec::new())
        .await
        .expect("one");
    factory
        .generate::<User>("User", vec![Overrides::new(); 3])
        .await
        .expect("three");
    assert_eq!(factory.tracked_count("User"), 4);
    assert_eq!(factory.tracked_names(), vec!["User".to_string()]);
}

#[tokio::test]
async fn unknown_override_fails_without_tracking_anything() {
    let factory = factory();
    let result = factory
        .generate::<User>(
            "User",
            vec![name("fine"), Overrides::new().set("nickname", "nope")],
        )
        .await;

    match result {
        Err(FactoryError::OverrideAttributeInvalid { blueprint, source }) => {
            assert_eq!(blueprint, "User");
            assert!(source.to_string().contains("nickname"));
        }
        other => panic!("expected invalid override, got {other:?}"),
    }
    assert_eq!(factory.tracked_count("User"), 0);
}

#[tokio::test]
async fn incompatible_override_value_is_rejected() {
    let factory = factory();
    let result = factory
        .generate::<User>("User", vec![Overrides::new().set("visited_places", 42)])
        .await;
    assert!(matches!(
        result,
        Err(FactoryError::OverrideAttributeInvalid { .. })
    ));
}

#[tokio::test]
async fn unknown_blueprint_is_reported() {
    let factory = factory();
    let result = factory.generate::<User>("Ghost", Vec::new()).await;
    assert!(matches!(result, Err(FactoryError::BlueprintNotFound(missing)) if missing == "Ghost"));
}

#[tokio::test]
async fn requesting_the_wrong_record_type_is_reported() {
    let factory = factory();
    let result = factory.generate::<Note>("User", Vec::new()).await;
    assert!(matches!(
        result,
        Err(FactoryError::RecordTypeMismatch { .. })
    ));
}

#[tokio::test]
async fn ascended_blueprint_layers_parent_and_explicit_overrides() {
    let factory = factory();

    let user = factory
        .build::<User>(
            "Super User",
            Overrides::new()
                .try_set("visited_places", &["Moon"])
                .expect("serializable"),
        )
        .await
        .expect("user");
    assert_eq!(user.name, "Super User");
    assert_eq!(user.visited_places, vec!["Moon".to_string()]);

    let user = factory
        .build::<User>("Super User", name("X"))
        .await
        .expect("user");
    assert_eq!(user.name, "X");
}

#[tokio::test]
async fn nested_ascension_applies_only_the_immediate_parent() {
    let factory = factory();
    factory
        .ascend("Traveling User", "User", || {
            Overrides::new()
                .try_set("visited_places", &["Moon"])
                .expect("serializable")
        })
        .expect("parent registered");
    factory
        .ascend("Super Traveling User", "Traveling User", || {
            Overrides::new()
                .set("name", "Super Traveling User")
                .try_set("dream", &dream("Super Dream"))
                .expect("serializable")
        })
        .expect("parent registered");

    let user = factory
        .build::<User>("*Super Traveling User", Overrides::new())
        .await
        .expect("user");
    assert_eq!(user.depth(), Depth::Ref);
    assert_eq!(user.name, "Super Traveling User");
    assert_eq!(
        user.dream.as_ref().map(|d| d.title.as_str()),
        Some("Super Dream")
    );
    assert_eq!(user.visited_places, make_user().visited_places);
}

#[tokio::test]
async fn ascending_from_a_missing_parent_fails() {
    let factory = factory();
    let result = factory.ascend("Orphan", "Nobody", Overrides::new);
    assert!(matches!(result, Err(FactoryError::BlueprintNotFound(missing)) if missing == "Nobody"));
    assert!(!factory.contains("Orphan"));
}

#[tokio::test]
async fn panicking_factory_becomes_an_error() {
    let factory = Factory::new(FactoryConfig::default());
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    factory.register("Fragile", move || {
        if counter.fetch_add(1, Ordering::SeqCst) > 0 {
            panic!("factory exhausted");
        }
        make_user()
    });

    let result = factory
        .generate::<User>("Fragile", vec![Overrides::new(), Overrides::new()])
        .await;
    match result {
        Err(FactoryError::Internal(message)) => assert!(message.contains("factory exhausted")),
        other => panic!("expected internal error, got {other:?}"),
    }
    assert_eq!(factory.tracked_count("Fragile"), 0);
}

#[tokio::test]
async fn slow_generation_hits_the_deadline() {
    let config = FactoryConfig {
        generation_timeout_ms: Some(20),
        ..FactoryConfig::default()
    };
    let factory = Factory::new(config);
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    factory.register("Sluggish", move || {
        if counter.fetch_add(1, Ordering::SeqCst) > 0 {
            std::thread::sleep(Duration::from_millis(300));
        }
        make_user()
    });

    let result = factory
        .generate::<User>("Sluggish", vec![Overrides::new(), Overrides::new()])
        .await;
    assert!(matches!(
        result,
        Err(FactoryError::Timeout { after_ms: 20, .. })
    ));
    assert_eq!(factory.tracked_count("Sluggish"), 0);
}

#[tokio::test]
async fn tracked_entries_snapshot_attributes() {
    let factory = factory();
    let user = factory
        .build::<User>("*User", name("Snapshot"))
        .await
        .expect("user");

    let entries = factory.tracked_entries("User");
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].depth, Depth::Ref);
    assert_eq!(
        entries[0].attributes.get("name"),
        Some(&serde_json::json!("Snapshot"))
    );

    let tracked = factory.tracked::<User>("User");
    assert!(tracked[0].shares_allocation(&user));
}
