//! Integration tests for the storage crate.
//!
//! Uses in-memory SQLite for fast, isolated tests.

use waypost_engine::EngineConfig;
use waypost_model::{Fence, FenceRepository, User, UserRepository};
use waypost_storage::{Database, StorageError};

fn create_test_db() -> Database {
    Database::open_in_memory().expect("Failed to create in-memory database")
}

fn create_test_user(user_id: &str) -> User {
    let mut user = User::new(user_id, "phone");
    user.lat = 52.1;
    user.lon = 4.3;
    user.timestamp = 1_700_000_000;
    user.fence = "home".to_string();
    user.battery = Some(85);
    user
}

fn create_test_fence(name: &str) -> Fence {
    Fence {
        name: name.to_string(),
        lat: 52.1,
        lon: 4.3,
        radius: 100.0,
        timestamp: 1_700_000_000,
    }
}

// =============================================================================
// Database Initialization Tests
// =============================================================================

mod initialization {
    use super::*;
    use std::path::PathBuf;
    use tempfile::tempdir;

    #[test]
    fn test_open_in_memory() {
        let db = Database::open_in_memory();
        assert!(db.is_ok(), "Should create in-memory database");
    }

    #[test]
    fn test_open_file_database() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");

        let db = Database::open(&db_path);
        assert!(db.is_ok(), "Should create file-based database");
        assert!(db_path.exists(), "Database file should exist");
    }

    #[test]
    fn test_reopen_existing_database() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");

        // Create and save a user
        {
            let db = Database::open(&db_path).unwrap();
            UserRepository::save(&db, &create_test_user("alice")).unwrap();
        }

        // Reopen and verify data persists
        {
            let db = Database::open(&db_path).unwrap();
            let users = UserRepository::list(&db).unwrap();
            assert_eq!(users.len(), 1, "User should persist after reopen");
        }
    }

    #[test]
    fn test_invalid_path_fails() {
        let result = Database::open(&PathBuf::from("/nonexistent/path/db.sqlite"));
        assert!(result.is_err(), "Should fail with invalid path");
    }
}

// =============================================================================
// User Repository Tests
// =============================================================================

mod users {
    use super::*;

    #[test]
    fn test_save_and_get_user() {
        let db = create_test_db();
        let user = create_test_user("alice");

        UserRepository::save(&db, &user).unwrap();

        let retrieved = UserRepository::get(&db, "alice").unwrap();
        assert_eq!(retrieved.user_id, "alice");
        assert_eq!(retrieved.fence, "home");
        assert_eq!(retrieved.battery, Some(85));
    }

    #[test]
    fn test_get_nonexistent_user() {
        let db = create_test_db();
        let result = UserRepository::get(&db, "ghost");
        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }

    #[test]
    fn test_list_users_empty() {
        let db = create_test_db();
        assert!(UserRepository::list(&db).unwrap().is_empty());
    }

    #[test]
    fn test_update_user() {
        let db = create_test_db();
        let mut user = create_test_user("alice");
        UserRepository::save(&db, &user).unwrap();

        user.fence = String::new();
        user.device_id = "tablet".to_string();
        UserRepository::save(&db, &user).unwrap();

        let retrieved = UserRepository::get(&db, "alice").unwrap();
        assert_eq!(retrieved.fence, "");
        assert_eq!(retrieved.device_id, "tablet");

        // Should still be only one record
        assert_eq!(UserRepository::list(&db).unwrap().len(), 1);
    }

    #[test]
    fn test_sticky_snapshot_flag_persists() {
        let db = create_test_db();
        let mut user = create_test_user("alice");
        user.inregions_supported = true;

        UserRepository::save(&db, &user).unwrap();
        assert!(UserRepository::get(&db, "alice").unwrap().inregions_supported);
    }

    #[test]
    fn test_purge_users() {
        let db = create_test_db();
        for id in ["alice", "bob", "carol"] {
            UserRepository::save(&db, &create_test_user(id)).unwrap();
        }
        assert_eq!(UserRepository::list(&db).unwrap().len(), 3);

        UserRepository::purge(&db).unwrap();
        assert!(UserRepository::list(&db).unwrap().is_empty());
    }
}

// =============================================================================
// Fence Repository Tests
// =============================================================================

mod fences {
    use super::*;

    #[test]
    fn test_save_and_get_fence() {
        let db = create_test_db();
        FenceRepository::save(&db, &create_test_fence("home")).unwrap();

        let retrieved = FenceRepository::get(&db, "home").unwrap();
        assert_eq!(retrieved.radius, 100.0);
        assert_eq!(retrieved.lat, 52.1);
    }

    #[test]
    fn test_upsert_replaces_by_name() {
        let db = create_test_db();
        FenceRepository::save(&db, &create_test_fence("home")).unwrap();

        let mut moved = create_test_fence("home");
        moved.lat = 53.0;
        moved.radius = 60.0;
        FenceRepository::save(&db, &moved).unwrap();

        let fences = FenceRepository::list(&db).unwrap();
        assert_eq!(fences.len(), 1);
        assert_eq!(fences[0].lat, 53.0);
        assert_eq!(fences[0].radius, 60.0);
    }

    #[test]
    fn test_list_fences_ordered_by_name() {
        let db = create_test_db();
        for name in ["office", "gym", "home"] {
            FenceRepository::save(&db, &create_test_fence(name)).unwrap();
        }

        let names: Vec<String> = FenceRepository::list(&db)
            .unwrap()
            .into_iter()
            .map(|f| f.name)
            .collect();
        assert_eq!(names, vec!["gym", "home", "office"]);
    }

    #[test]
    fn test_delete_fence() {
        let db = create_test_db();
        FenceRepository::save(&db, &create_test_fence("home")).unwrap();

        FenceRepository::delete(&db, "home").unwrap();
        assert!(matches!(
            FenceRepository::get(&db, "home"),
            Err(StorageError::NotFound(_))
        ));
    }

    #[test]
    fn test_delete_nonexistent_fence() {
        let db = create_test_db();
        let result = FenceRepository::delete(&db, "nowhere");
        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }
}

// =============================================================================
// Settings Tests
// =============================================================================

mod settings {
    use super::*;

    #[test]
    fn test_config_absent_by_default() {
        let db = create_test_db();
        assert!(db.load_config().unwrap().is_none());
    }

    #[test]
    fn test_config_round_trip() {
        let db = create_test_db();
        let config = EngineConfig {
            accuracy: 120,
            double_enter: false,
            double_leave: true,
            use_inregions: false,
        };

        db.save_config(&config).unwrap();
        assert_eq!(db.load_config().unwrap(), Some(config));
    }

    #[test]
    fn test_config_save_replaces() {
        let db = create_test_db();
        db.save_config(&EngineConfig::default()).unwrap();

        let changed = EngineConfig {
            accuracy: 50,
            ..Default::default()
        };
        db.save_config(&changed).unwrap();

        assert_eq!(db.load_config().unwrap().unwrap().accuracy, 50);
    }
}

// =============================================================================
// Concurrent Access Tests
// =============================================================================

mod concurrency {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_concurrent_reads() {
        let db = Arc::new(create_test_db());

        for i in 0..10 {
            UserRepository::save(db.as_ref(), &create_test_user(&format!("user-{i}"))).unwrap();
        }

        let handles: Vec<_> = (0..5)
            .map(|_| {
                let db_clone = Arc::clone(&db);
                thread::spawn(move || {
                    for _ in 0..10 {
                        let users = UserRepository::list(db_clone.as_ref()).unwrap();
                        assert_eq!(users.len(), 10);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().expect("Thread panicked");
        }
    }

    #[test]
    fn test_concurrent_writes() {
        let db = Arc::new(create_test_db());

        let handles: Vec<_> = (0..5)
            .map(|i| {
                let db_clone = Arc::clone(&db);
                thread::spawn(move || {
                    for j in 0..10 {
                        let user = create_test_user(&format!("thread-{i}-user-{j}"));
                        UserRepository::save(db_clone.as_ref(), &user).unwrap();
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().expect("Thread panicked");
        }

        let users = UserRepository::list(db.as_ref()).unwrap();
        assert_eq!(users.len(), 50, "All 50 users should be saved");
    }

    #[test]
    fn test_concurrent_fence_upserts_by_same_name() {
        let db = Arc::new(create_test_db());

        let handles: Vec<_> = (0..4)
            .map(|i| {
                let db_clone = Arc::clone(&db);
                thread::spawn(move || {
                    for _ in 0..25 {
                        let mut fence = create_test_fence("home");
                        fence.radius = f64::from(i * 10);
                        FenceRepository::save(db_clone.as_ref(), &fence).unwrap();
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().expect("Thread panicked");
        }

        // Last writer wins; exactly one row survives.
        assert_eq!(FenceRepository::list(db.as_ref()).unwrap().len(), 1);
    }
}

// =============================================================================
// Edge Cases
// =============================================================================

mod edge_cases {
    use super::*;

    #[test]
    fn test_user_outside_any_fence() {
        let db = create_test_db();
        let mut user = create_test_user("alice");
        user.fence = String::new();
        user.battery = None;

        UserRepository::save(&db, &user).unwrap();

        let retrieved = UserRepository::get(&db, "alice").unwrap();
        assert_eq!(retrieved.fence, "");
        assert_eq!(retrieved.battery, None);
    }

    #[test]
    fn test_fence_name_with_unicode() {
        let db = create_test_db();
        FenceRepository::save(&db, &create_test_fence("дом 🏠")).unwrap();

        let retrieved = FenceRepository::get(&db, "дом 🏠").unwrap();
        assert_eq!(retrieved.name, "дом 🏠");
    }

    #[test]
    fn test_many_users() {
        let db = create_test_db();

        for i in 0..1000 {
            UserRepository::save(&db, &create_test_user(&format!("user-{i:04}"))).unwrap();
        }

        let users = UserRepository::list(&db).unwrap();
        assert_eq!(users.len(), 1000);
        // Ordered by user id
        assert_eq!(users[0].user_id, "user-0000");
        assert_eq!(users[999].user_id, "user-0999");
    }
}
