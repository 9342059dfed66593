//! Repository Integration Tests
//!
//! Tests for the SQLite repositories with an in-memory database.

#[cfg(test)]
mod tests {
    use crate::domain::{
        default_settings, Bean, Brew, DomainError, OwnerId, Pour, ResourceKind, RoastLevel, SettingRule,
    };
    use crate::repository::{
        init_db, init_in_memory, sync_tags, BeanRepository, BrewRepository, BrewsByBean, DbState, Repository,
        SettingsRepository, SettingsStore, TagLinkOperations, TagRepository, TagStore,
    };
    use std::collections::BTreeSet;

    const ALICE: OwnerId = OwnerId(1);
    const BOB: OwnerId = OwnerId(2);

    struct Repos {
        db: DbState,
        beans: BeanRepository,
        brews: BrewRepository,
        tags: TagRepository,
        settings: SettingsRepository,
    }

    async fn setup_test_db() -> Repos {
        let db = init_in_memory().await.expect("Failed to init test DB");
        Repos {
            beans: BeanRepository::new(db.conn.clone()),
            brews: BrewRepository::new(db.conn.clone()),
            tags: TagRepository::new(db.conn.clone()),
            settings: SettingsRepository::new(db.conn.clone()),
            db,
        }
    }

    fn set(ids: &[u32]) -> BTreeSet<u32> {
        ids.iter().copied().collect()
    }

    async fn add_bean(repos: &Repos, owner: OwnerId, name: &str) -> Bean {
        repos
            .beans
            .create(owner, &Bean::new(owner, name.to_string()))
            .await
            .expect("Failed to create bean")
    }

    #[tokio::test]
    async fn test_create_and_find_bean() {
        let repos = setup_test_db().await;

        let mut bean = Bean::new(ALICE, "Yirgacheffe".to_string());
        bean.roast_level = Some(RoastLevel::Light);
        bean.roast_date = Some("2026-09-30".to_string());
        bean.process = Some("washed".to_string());
        let created = repos.beans.create(ALICE, &bean).await.expect("Failed to create");

        assert!(created.id > 0);
        let found = repos.beans.find_by_id(ALICE, created.id).await.unwrap().unwrap();
        assert_eq!(found.name, "Yirgacheffe");
        assert_eq!(found.roast_level, Some(RoastLevel::Light));
        assert_eq!(found.process.as_deref(), Some("washed"));
        assert!(found.tag_ids.is_empty());
    }

    #[tokio::test]
    async fn test_bean_is_invisible_to_other_owner() {
        let repos = setup_test_db().await;
        let bean = add_bean(&repos, ALICE, "Huila").await;

        assert!(repos.beans.find_by_id(BOB, bean.id).await.unwrap().is_none());
        assert!(repos.beans.list(BOB).await.unwrap().is_empty());
        assert!(matches!(
            repos.beans.delete(BOB, bean.id).await,
            Err(DomainError::NotFound(_))
        ));

        let mut renamed = bean.clone();
        renamed.name = "Stolen".to_string();
        assert!(matches!(
            repos.beans.update(BOB, &renamed).await,
            Err(DomainError::NotFound(_))
        ));
        assert_eq!(repos.beans.find_by_id(ALICE, bean.id).await.unwrap().unwrap().name, "Huila");
    }

    #[tokio::test]
    async fn test_update_and_delete_bean() {
        let repos = setup_test_db().await;
        let mut bean = add_bean(&repos, ALICE, "Original").await;

        bean.name = "Updated".to_string();
        bean.roaster = Some("Local Roasters".to_string());
        let updated = repos.beans.update(ALICE, &bean).await.expect("Update failed");
        assert_eq!(updated.name, "Updated");

        repos.beans.delete(ALICE, bean.id).await.expect("Delete failed");
        assert!(repos.beans.find_by_id(ALICE, bean.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_brew_requires_owned_bean() {
        let repos = setup_test_db().await;
        let bean = add_bean(&repos, ALICE, "Kenya AA").await;

        let brew = Brew::new(BOB, bean.id, 2);
        assert!(matches!(
            repos.brews.create(BOB, &brew).await,
            Err(DomainError::NotFound(_))
        ));
        assert!(repos.brews.list(BOB).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_brew_round_trip_with_pours() {
        let repos = setup_test_db().await;
        let bean = add_bean(&repos, ALICE, "Kenya AA").await;

        let mut brew = Brew::new(ALICE, bean.id, 2);
        brew.bean_amount = Some(30.0);
        brew.water_amount = Some(500.0);
        brew.grind_size = Some("medium-fine".to_string());
        brew.pours = vec![
            Pour { at_seconds: 0, water_amount: 60.0 },
            Pour { at_seconds: 45, water_amount: 440.0 },
        ];
        brew.taste.rating = Some(4);

        let created = repos.brews.create(ALICE, &brew).await.expect("Failed to create");
        let found = repos.brews.find_by_id(ALICE, created.id).await.unwrap().unwrap();

        assert_eq!(found.bean_id, bean.id);
        assert_eq!(found.cups, 2);
        assert_eq!(found.pours, brew.pours);
        assert_eq!(found.grind_size.as_deref(), Some("medium-fine"));
        assert_eq!(found.taste.rating, Some(4));
    }

    #[tokio::test]
    async fn test_list_brews_for_bean_in_id_order() {
        let repos = setup_test_db().await;
        let bean = add_bean(&repos, ALICE, "Sidamo").await;
        let other = add_bean(&repos, ALICE, "Guji").await;

        let first = repos.brews.create(ALICE, &Brew::new(ALICE, bean.id, 1)).await.unwrap();
        repos.brews.create(ALICE, &Brew::new(ALICE, other.id, 1)).await.unwrap();
        let second = repos.brews.create(ALICE, &Brew::new(ALICE, bean.id, 3)).await.unwrap();

        let brews = repos.brews.list_for_bean(ALICE, bean.id).await.unwrap();
        let ids: Vec<u32> = brews.iter().map(|b| b.id).collect();
        assert_eq!(ids, vec![first.id, second.id]);

        assert!(repos.brews.list_for_bean(BOB, bean.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_bean_with_brews_cannot_be_deleted_directly() {
        let repos = setup_test_db().await;
        let bean = add_bean(&repos, ALICE, "Sumatra").await;
        repos.brews.create(ALICE, &Brew::new(ALICE, bean.id, 1)).await.unwrap();

        assert!(matches!(
            repos.beans.delete(ALICE, bean.id).await,
            Err(DomainError::Persistence(_))
        ));
    }

    #[tokio::test]
    async fn test_tag_names_unique_per_owner() {
        let repos = setup_test_db().await;

        let fruity = repos.tags.create_tag(ALICE, "fruity").await.unwrap();
        assert!(fruity.is_persisted());
        assert!(matches!(
            repos.tags.create_tag(ALICE, "  fruity ").await,
            Err(DomainError::Validation(_))
        ));
        // Same name is fine for someone else
        repos.tags.create_tag(BOB, "fruity").await.unwrap();

        let found = repos.tags.find_tag_by_name(ALICE, "fruity").await.unwrap().unwrap();
        assert_eq!(found.id, fruity.id);
    }

    #[tokio::test]
    async fn test_list_and_rename_tags() {
        let repos = setup_test_db().await;
        let floral = repos.tags.create_tag(ALICE, "floral").await.unwrap();
        repos.tags.create_tag(ALICE, "chocolate").await.unwrap();

        let names: Vec<String> = repos.tags.list_tags(ALICE).await.unwrap().into_iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["chocolate", "floral"]);

        let id = floral.id.unwrap();
        let renamed = repos.tags.rename_tag(ALICE, id, "jasmine").await.unwrap();
        assert_eq!(renamed.name, "jasmine");
        assert!(matches!(
            repos.tags.rename_tag(BOB, id, "mine").await,
            Err(DomainError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_owned_tag_ids_filters_foreign_tags() {
        let repos = setup_test_db().await;
        let mine = repos.tags.create_tag(ALICE, "sweet").await.unwrap().id.unwrap();
        let theirs = repos.tags.create_tag(BOB, "sweet").await.unwrap().id.unwrap();

        let owned = repos.tags.owned_tag_ids(ALICE, &set(&[mine, theirs, 999])).await.unwrap();
        assert_eq!(owned, set(&[mine]));
    }

    #[tokio::test]
    async fn test_link_and_unlink_tags() {
        let repos = setup_test_db().await;
        let bean = add_bean(&repos, ALICE, "Gesha").await;
        let tag = repos.tags.create_tag(ALICE, "floral").await.unwrap().id.unwrap();

        repos.tags.link_tag(ALICE, ResourceKind::Bean, bean.id, tag).await.unwrap();
        // Linking twice is a no-op
        repos.tags.link_tag(ALICE, ResourceKind::Bean, bean.id, tag).await.unwrap();
        assert_eq!(
            repos.tags.linked_tag_ids(ALICE, ResourceKind::Bean, bean.id).await.unwrap(),
            set(&[tag])
        );
        assert_eq!(repos.beans.find_by_id(ALICE, bean.id).await.unwrap().unwrap().tag_ids, vec![tag]);

        repos.tags.unlink_tag(ALICE, ResourceKind::Bean, bean.id, tag).await.unwrap();
        assert!(repos.tags.linked_tag_ids(ALICE, ResourceKind::Bean, bean.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_link_rejects_foreign_tag_or_resource() {
        let repos = setup_test_db().await;
        let bean = add_bean(&repos, ALICE, "Gesha").await;
        let foreign_tag = repos.tags.create_tag(BOB, "stolen").await.unwrap().id.unwrap();
        let own_tag = repos.tags.create_tag(ALICE, "ok").await.unwrap().id.unwrap();

        assert!(matches!(
            repos.tags.link_tag(ALICE, ResourceKind::Bean, bean.id, foreign_tag).await,
            Err(DomainError::NotFound(_))
        ));
        assert!(matches!(
            repos.tags.link_tag(BOB, ResourceKind::Bean, bean.id, foreign_tag).await,
            Err(DomainError::NotFound(_))
        ));
        assert!(matches!(
            repos.tags.link_tag(ALICE, ResourceKind::Bean, 4242, own_tag).await,
            Err(DomainError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_bean_and_brew_links_are_separate() {
        let repos = setup_test_db().await;
        let bean = add_bean(&repos, ALICE, "Brazil").await;
        let brew = repos.brews.create(ALICE, &Brew::new(ALICE, bean.id, 1)).await.unwrap();
        let tag = repos.tags.create_tag(ALICE, "nutty").await.unwrap().id.unwrap();

        repos.tags.link_tag(ALICE, ResourceKind::Brew, brew.id, tag).await.unwrap();

        assert!(repos.tags.linked_tag_ids(ALICE, ResourceKind::Bean, bean.id).await.unwrap().is_empty());
        assert_eq!(repos.brews.find_by_id(ALICE, brew.id).await.unwrap().unwrap().tag_ids, vec![tag]);
    }

    #[tokio::test]
    async fn test_delete_tag_drops_links() {
        let repos = setup_test_db().await;
        let bean = add_bean(&repos, ALICE, "Rwanda").await;
        let tag = repos.tags.create_tag(ALICE, "berry").await.unwrap().id.unwrap();
        repos.tags.link_tag(ALICE, ResourceKind::Bean, bean.id, tag).await.unwrap();

        repos.tags.delete_tag(ALICE, tag).await.unwrap();

        assert!(repos.tags.find_tag(ALICE, tag).await.unwrap().is_none());
        assert!(repos.tags.linked_tag_ids(ALICE, ResourceKind::Bean, bean.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_sync_tags_applies_minimal_diff() {
        let repos = setup_test_db().await;
        let bean = add_bean(&repos, ALICE, "Colombia").await;
        let mut ids = Vec::new();
        for name in ["a", "b", "c"] {
            ids.push(repos.tags.create_tag(ALICE, name).await.unwrap().id.unwrap());
        }
        let (a, b, c) = (ids[0], ids[1], ids[2]);

        sync_tags(&repos.tags, ALICE, ResourceKind::Bean, bean.id, &set(&[a, b])).await.unwrap();
        let diff = sync_tags(&repos.tags, ALICE, ResourceKind::Bean, bean.id, &set(&[b, c])).await.unwrap();

        assert_eq!(diff.to_add, set(&[c]));
        assert_eq!(diff.to_remove, set(&[a]));
        assert_eq!(
            repos.tags.linked_tag_ids(ALICE, ResourceKind::Bean, bean.id).await.unwrap(),
            set(&[b, c])
        );

        // Already in the desired state
        let again = sync_tags(&repos.tags, ALICE, ResourceKind::Bean, bean.id, &set(&[b, c])).await.unwrap();
        assert!(again.is_empty());
    }

    #[tokio::test]
    async fn test_unlink_all_counts_links() {
        let repos = setup_test_db().await;
        let bean = add_bean(&repos, ALICE, "Peru").await;
        let brew = repos.brews.create(ALICE, &Brew::new(ALICE, bean.id, 1)).await.unwrap();
        for name in ["x", "y"] {
            let tag = repos.tags.create_tag(ALICE, name).await.unwrap().id.unwrap();
            repos.tags.link_tag(ALICE, ResourceKind::Brew, brew.id, tag).await.unwrap();
        }

        assert_eq!(repos.tags.unlink_all(BOB, ResourceKind::Brew, brew.id).await.unwrap(), 0);
        assert_eq!(repos.tags.unlink_all(ALICE, ResourceKind::Brew, brew.id).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_settings_round_trip_keeps_order() {
        let repos = setup_test_db().await;
        assert!(repos.settings.load_settings(ALICE).await.unwrap().is_none());

        let mut settings = default_settings();
        let water = settings.remove("water_amount").unwrap();
        settings.upsert(water);
        let expected: Vec<String> = settings.keys().map(String::from).collect();

        repos.settings.save_settings(ALICE, &settings).await.unwrap();
        let loaded = repos.settings.load_settings(ALICE).await.unwrap().unwrap();

        let keys: Vec<String> = loaded.iter().map(|e| e.key.clone()).collect();
        assert_eq!(keys, expected);
        assert_eq!(loaded.last().unwrap().rule, SettingRule::dynamic(250.0, 10.0, 5, 0.0));
        assert!(repos.settings.load_settings(BOB).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_corrupt_settings_document() {
        let repos = setup_test_db().await;
        {
            let guard = repos.db.conn.lock().await;
            let conn = guard.as_ref().unwrap();
            conn.execute(
                "INSERT INTO brew_settings (user_id, settings, updated_at) VALUES (?1, ?2, 0)",
                rusqlite::params![ALICE.0, "{ not json"],
            )
            .unwrap();
        }

        assert!(matches!(
            repos.settings.load_settings(ALICE).await,
            Err(DomainError::Persistence(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_settings() {
        let repos = setup_test_db().await;
        repos.settings.save_settings(ALICE, &default_settings()).await.unwrap();

        assert!(repos.settings.delete_settings(ALICE).await.unwrap());
        assert!(!repos.settings.delete_settings(ALICE).await.unwrap());
    }

    #[tokio::test]
    async fn test_closed_database_reports_not_initialized() {
        let repos = setup_test_db().await;
        repos.db.close().await;

        assert!(!repos.db.is_initialized().await);
        assert!(matches!(repos.beans.list(ALICE).await, Err(DomainError::Persistence(_))));
    }

    #[tokio::test]
    async fn test_file_database_migrates_twice() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("brew_log.db");

        {
            let db = init_db(&path).await.expect("first open");
            let beans = BeanRepository::new(db.conn.clone());
            beans.create(ALICE, &Bean::new(ALICE, "Persisted".to_string())).await.unwrap();
            db.close().await;
        }

        let db = init_db(&path).await.expect("reopen");
        let beans = BeanRepository::new(db.conn.clone());
        let listed = beans.list(ALICE).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].name, "Persisted");
    }
}
