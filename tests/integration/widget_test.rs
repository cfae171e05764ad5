//! Widget registration and settings lifecycle through the plugin manager.

use kiln_entity::plugin::NewPlugin;
use kiln_plugin::WidgetRegistry;

use crate::helpers::TestHost;

async fn host_with_widgets() -> TestHost {
    let host = TestHost::build(|b| b).await;
    host.install("blog", NewPlugin::new("blog", "BlogPlugin"), &[]).await;
    host.install("gallery", NewPlugin::new("gallery", "GalleryPlugin"), &[])
        .await;

    let widgets = host.manager.widgets();
    assert!(widgets.add("blog", "recent_posts", "limit=5").await.unwrap());
    assert!(widgets.add("gallery", "slideshow", "").await.unwrap());
    assert!(widgets.add("blog", "archive", "").await.unwrap());
    host
}

#[tokio::test]
async fn test_add_twice_stores_one_row() {
    let host = host_with_widgets().await;
    let widgets = host.manager.widgets();

    assert!(!widgets.add("blog", "recent_posts", "limit=5").await.unwrap());
    let rows = widgets.list_raw().await.unwrap().unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows.iter().filter(|r| r.function == "recent_posts").count(), 1);
    assert!(rows.iter().all(|r| r.updated_by == 7));
}

#[tokio::test]
async fn test_initialize_fills_defaults_in_row_order() {
    let host = host_with_widgets().await;
    let document = host.manager.widgets().initialize().await.unwrap().unwrap();

    let recent = document.widgets.get("recent_posts").unwrap();
    assert_eq!(recent.order, Some(1));
    assert_eq!(recent.block, Some(1));
    assert_eq!(recent.enabled, Some(true));
    assert_eq!(recent.class.as_deref(), Some("BlogPlugin"));
    assert_eq!(recent.args.as_deref(), Some("limit=5"));
    assert_eq!(document.widgets.get("slideshow").unwrap().order, Some(2));
    assert_eq!(document.widgets.get("archive").unwrap().order, Some(3));
}

#[tokio::test]
async fn test_customization_survives_and_inactive_owner_disables() {
    let host = host_with_widgets().await;
    let widgets = host.manager.widgets();
    widgets.initialize().await.unwrap();

    // An administrator moves the slideshow and puts it in block 3.
    let mut document = widgets.load_settings().await.unwrap();
    let slideshow = document.widgets.entry("slideshow");
    slideshow.order = Some(5);
    slideshow.block = Some(3);
    host.services
        .settings
        .set(
            "widgets",
            "widgets_settings",
            &serde_json::to_string(&document).unwrap(),
            1,
        )
        .await
        .unwrap();

    assert!(host.manager.set_enabled("gallery", false).await.unwrap());
    let document = widgets.initialize().await.unwrap().unwrap();
    let slideshow = document.widgets.get("slideshow").unwrap();
    assert_eq!(slideshow.order, Some(5));
    assert_eq!(slideshow.block, Some(3));
    assert_eq!(slideshow.enabled, Some(false));

    // Re-enabling the owner keeps the persisted `false`: enabled is sticky
    // once set and only forced off, never forced on.
    assert!(host.manager.set_enabled("gallery", true).await.unwrap());
    let document = widgets.initialize().await.unwrap().unwrap();
    assert_eq!(document.widgets.get("slideshow").unwrap().enabled, Some(false));

    let ordered = widgets.ordered_widgets().await.unwrap().unwrap();
    assert_eq!(
        ordered.keys().collect::<Vec<_>>(),
        vec!["recent_posts", "archive", "slideshow"]
    );
    assert_eq!(WidgetRegistry::highest_block(&ordered), 3);
}

#[tokio::test]
async fn test_initialize_keeps_foreign_entry_keys() {
    let host = host_with_widgets().await;
    host.services
        .settings
        .set(
            "widgets",
            "widgets_settings",
            r#"{"widgets": {"recent_posts": {"order": 5, "title": "Latest posts"}}, "theme": "dark"}"#,
            1,
        )
        .await
        .unwrap();

    host.manager.widgets().initialize().await.unwrap().unwrap();

    let raw = host
        .services
        .settings
        .get("widgets", "widgets_settings")
        .await
        .unwrap()
        .unwrap();
    let stored: serde_json::Value = serde_json::from_str(&raw).unwrap();
    let recent = &stored["widgets"]["recent_posts"];
    assert_eq!(recent["title"], "Latest posts");
    assert_eq!(recent["order"], 5);
    assert_eq!(recent["block"], 1);
    assert_eq!(recent["plugin"], "blog");
    assert_eq!(stored["theme"], "dark");
}

#[tokio::test]
async fn test_delete_and_owner_lookup() {
    let host = host_with_widgets().await;
    let widgets = host.manager.widgets();

    assert_eq!(widgets.owner_of("slideshow").await.unwrap().as_deref(), Some("gallery"));
    assert_eq!(widgets.delete("slideshow").await.unwrap(), 1);
    assert!(widgets.owner_of("slideshow").await.unwrap().is_none());
    assert_eq!(widgets.list_raw().await.unwrap().unwrap().len(), 2);
}

#[tokio::test]
async fn test_empty_and_missing_storage() {
    let host = TestHost::build(|b| b).await;
    let widgets = host.manager.widgets();

    assert!(widgets.initialize().await.unwrap().is_none());
    assert!(widgets.ordered_widgets().await.unwrap().is_none());
    assert!(
        host.services
            .settings
            .get("widgets", "widgets_settings")
            .await
            .unwrap()
            .is_none()
    );

    sqlx::query("DROP TABLE widgets")
        .execute(&host.pool)
        .await
        .unwrap();
    assert!(widgets.list_raw().await.unwrap().is_none());
    assert!(widgets.initialize().await.unwrap().is_none());
}
